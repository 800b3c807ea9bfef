//! Copyright 2025 - The Parcel Explorer Developers
//! SPDX-License-Identifier: GPL-3.0-or-later

use std::cell::RefCell;

use eframe::egui::Color32;

use crate::category_colors::CategoryColorTable;
use crate::feature_store::{Feature, FeatureStore};
use crate::style::{GroupingMode, StyleDescriptor, StyleResolver};

const MAX_SELECTION_HISTORY: usize = 20;

/// One loaded exploration session: the immutable feature store, the color
/// table built from it, and the single source of truth for which feature is
/// currently selected.
///
/// Selection is single-writer: interaction handlers stage a candidate into
/// `mut_selected` and the owner commits it once per frame via
/// [`ExplorerProject::update_selected`], so map and table events can never
/// race and a re-render is only requested on an actual change.
pub struct ExplorerProject {
    store: FeatureStore,
    colors: CategoryColorTable,
    resolver: StyleResolver,
    selected: Option<String>,
    mut_selected: RefCell<Option<String>>,
    back_selected_history: Vec<Option<String>>,
    forward_selected_history: Vec<Option<String>>,
}

impl ExplorerProject {
    /// Build a session from a loaded store. The color table is computed once
    /// here and never changes until the dataset is reloaded.
    pub fn new(
        store: FeatureStore,
        category_attribute: &str,
        palette: &[Color32],
        mode: GroupingMode,
    ) -> Self {
        let colors = CategoryColorTable::build(&store, category_attribute, palette);
        ExplorerProject {
            store,
            colors,
            resolver: StyleResolver::new(category_attribute, mode),
            selected: None,
            mut_selected: RefCell::new(None),
            back_selected_history: Vec::new(),
            forward_selected_history: Vec::new(),
        }
    }

    pub fn get_store(&self) -> &FeatureStore {
        &self.store
    }

    pub fn color_table(&self) -> &CategoryColorTable {
        &self.colors
    }

    pub fn resolver(&self) -> &StyleResolver {
        &self.resolver
    }

    pub fn set_grouping_mode(&mut self, mode: GroupingMode) {
        self.resolver.set_mode(mode);
    }

    pub fn set_highlight_fill(&mut self, fill: Color32) {
        self.resolver.set_highlight_fill(fill);
    }

    /// The currently selected feature id, or None when nothing is selected.
    pub fn current_selection(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Staging slot for the next selection.
    /// UI code holding only a shared reference writes the candidate here;
    /// it takes effect on the next [`ExplorerProject::update_selected`].
    pub fn get_mut_selected(&self) -> &RefCell<Option<String>> {
        &self.mut_selected
    }

    /// A feature on the map was activated. `id` is None when the click hit
    /// empty ground or a feature without an identifier, which never changes
    /// the selection. Returns whether the selection changed.
    pub fn on_map_feature_activated(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) => self.activate(id),
            None => false,
        }
    }

    /// A table row was activated. Returns whether the selection changed.
    pub fn on_table_row_activated(&mut self, id: &str) -> bool {
        self.activate(id)
    }

    /// Resolve the display style for one feature under the current selection.
    pub fn resolve_style(&self, feature: &Feature) -> StyleDescriptor {
        self.resolver
            .resolve(feature, self.selected.as_deref(), &self.colors)
    }

    fn activate(&mut self, id: &str) -> bool {
        if self.selected.as_deref() == Some(id) {
            // Re-activating the current selection must not signal a change,
            // otherwise a render echo would loop forever.
            return false;
        }
        // Ids absent from the store are accepted; they render as no
        // highlight, which is the intended degrade.
        self.mut_selected.replace(Some(id.to_owned()));
        self.update_selected()
    }

    /// Commit the staged selection if it differs from the current one.
    /// Returns true if the selection was updated, in which case the host
    /// should re-render map and table.
    pub fn update_selected(&mut self) -> bool {
        let staged = self.mut_selected.borrow().to_owned();
        if staged != self.selected {
            self.forward_selected_history.clear();
            if staged.is_some() {
                self.back_selected_history.push(self.selected.clone());
                if self.back_selected_history.len() > MAX_SELECTION_HISTORY {
                    self.back_selected_history
                        .drain(..self.back_selected_history.len() - MAX_SELECTION_HISTORY);
                }
            }
            self.selected = staged;
            return true;
        }
        false
    }

    /// Clear the selection without touching the history.
    pub fn reset_selection(&mut self) {
        self.selected = None;
        self.mut_selected.replace(None);
    }

    /// Go back to the previously selected feature.
    pub fn set_previous_selected(&mut self) {
        if let Some(selected) = self.back_selected_history.pop() {
            self.forward_selected_history.push(self.selected.clone());
            // Both are replaced so the jump itself is not recorded again.
            self.selected = selected.clone();
            self.mut_selected.replace(selected);
        }
    }

    /// Go forward again after [`ExplorerProject::set_previous_selected`].
    pub fn set_next_selected(&mut self) {
        if let Some(selected) = self.forward_selected_history.pop() {
            self.back_selected_history.push(self.selected.clone());
            self.selected = selected.clone();
            self.mut_selected.replace(selected);
        }
    }

    pub fn previous_selected_available(&self) -> bool {
        !self.back_selected_history.is_empty()
    }

    pub fn next_selected_available(&self) -> bool {
        !self.forward_selected_history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_store::{AttributeValue, Geometry};
    use crate::style::HIGHLIGHT_FILL;
    use std::collections::HashMap;

    fn store() -> FeatureStore {
        let parcels = ["P41", "P42", "P43"].iter().map(|id| {
            let mut attributes = HashMap::new();
            attributes.insert(
                "package".to_string(),
                AttributeValue::Text("east".to_string()),
            );
            Feature {
                id: Some(id.to_string()),
                geometry: Geometry::Polygon(vec![vec![
                    [0.0, 0.0],
                    [1.0, 0.0],
                    [1.0, 1.0],
                ]]),
                attributes,
            }
        });
        FeatureStore::new(parcels.collect())
    }

    fn project() -> ExplorerProject {
        ExplorerProject::new(
            store(),
            "package",
            &crate::category_colors::DEFAULT_PALETTE,
            GroupingMode::GroupingWithHighlight,
        )
    }

    #[test]
    fn table_then_map_activation_is_idempotent() {
        let mut project = project();
        assert_eq!(project.current_selection(), None);
        assert!(project.on_table_row_activated("P42"));
        assert_eq!(project.current_selection(), Some("P42"));
        // The echoing map click for the same parcel reports no change.
        assert!(!project.on_map_feature_activated(Some("P42")));
        assert_eq!(project.current_selection(), Some("P42"));
    }

    #[test]
    fn repeated_map_activation_reports_changed_once() {
        let mut project = project();
        assert!(project.on_map_feature_activated(Some("P41")));
        assert!(!project.on_map_feature_activated(Some("P41")));
    }

    #[test]
    fn null_map_click_never_changes_selection() {
        let mut project = project();
        assert!(!project.on_map_feature_activated(None));
        project.on_table_row_activated("P41");
        assert!(!project.on_map_feature_activated(None));
        assert_eq!(project.current_selection(), Some("P41"));
    }

    #[test]
    fn last_changed_activation_wins() {
        let mut project = project();
        project.on_table_row_activated("P41");
        project.on_map_feature_activated(Some("P42"));
        project.on_map_feature_activated(None);
        project.on_table_row_activated("P42");
        assert_eq!(project.current_selection(), Some("P42"));
    }

    #[test]
    fn unknown_id_is_accepted_and_highlights_nothing() {
        let mut project = project();
        assert!(project.on_table_row_activated("GHOST"));
        assert_eq!(project.current_selection(), Some("GHOST"));
        for feature in project.get_store().features().iter() {
            let style = project.resolve_style(feature);
            assert_ne!(style.fill_color, HIGHLIGHT_FILL);
        }
    }

    #[test]
    fn selected_feature_resolves_highlighted() {
        let mut project = project();
        project.on_table_row_activated("P42");
        let feature = project.get_store().feature_by_id("P42").cloned().unwrap();
        assert_eq!(project.resolve_style(&feature).fill_color, HIGHLIGHT_FILL);
    }

    #[test]
    fn staged_selection_commits_once() {
        let mut project = project();
        project.get_mut_selected().replace(Some("P43".to_string()));
        assert!(project.update_selected());
        assert!(!project.update_selected());
        assert_eq!(project.current_selection(), Some("P43"));
    }

    #[test]
    fn selection_history_moves_back_and_forward() {
        let mut project = project();
        project.on_table_row_activated("P41");
        project.on_table_row_activated("P42");
        assert!(project.previous_selected_available());
        project.set_previous_selected();
        assert_eq!(project.current_selection(), Some("P41"));
        assert!(project.next_selected_available());
        project.set_next_selected();
        assert_eq!(project.current_selection(), Some("P42"));
    }

    #[test]
    fn reset_clears_selection() {
        let mut project = project();
        project.on_table_row_activated("P41");
        project.reset_selection();
        assert_eq!(project.current_selection(), None);
        assert!(!project.update_selected());
    }
}
