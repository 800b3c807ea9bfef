//! Copyright 2025 - The Parcel Explorer Developers
//! SPDX-License-Identifier: GPL-3.0-or-later

use eframe::egui::Color32;

use crate::category_colors::CategoryColorTable;
use crate::feature_store::Feature;

/// Default fill used to highlight the selected parcel.
pub const HIGHLIGHT_FILL: Color32 = Color32::from_rgb(0xff, 0xff, 0x00);

const BASE_BORDER: Color32 = Color32::WHITE;
const BASE_BORDER_WEIGHT: f32 = 1.0;
const BASE_FILL_OPACITY: f32 = 0.4;
const SELECTED_BORDER_WEIGHT: f32 = 3.0;
const SELECTED_FILL_OPACITY: f32 = 0.75;

/// Resolved visual parameters for drawing one feature. Computed on demand,
/// never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleDescriptor {
    pub fill_color: Color32,
    pub border_color: Color32,
    pub border_weight: f32,
    pub fill_opacity: f32,
}

/// Whether the resolver applies the selection highlight on top of the
/// category color, or uses the grouping flag purely for layer routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingMode {
    GroupingOnly,
    GroupingWithHighlight,
}

/// Pure per-feature style computation.
///
/// Takes the selection and the color table as explicit parameters so it can
/// be evaluated for any number of features concurrently; it reads nothing
/// else and mutates nothing.
#[derive(Debug, Clone)]
pub struct StyleResolver {
    category_attribute: String,
    mode: GroupingMode,
    highlight_fill: Color32,
}

impl StyleResolver {
    pub fn new(category_attribute: impl Into<String>, mode: GroupingMode) -> Self {
        StyleResolver {
            category_attribute: category_attribute.into(),
            mode,
            highlight_fill: HIGHLIGHT_FILL,
        }
    }

    pub fn category_attribute(&self) -> &str {
        &self.category_attribute
    }

    pub fn mode(&self) -> GroupingMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: GroupingMode) {
        self.mode = mode;
    }

    pub fn highlight_fill(&self) -> Color32 {
        self.highlight_fill
    }

    pub fn set_highlight_fill(&mut self, fill: Color32) {
        self.highlight_fill = fill;
    }

    /// Resolve the style for one feature under the given selection.
    ///
    /// The base fill is the category color (table misses fall back to the
    /// table's default). When highlighting is enabled and the feature's id
    /// equals the selected id, the fill switches to the configured highlight
    /// color with a heavier, darkened border and raised opacity. A selected
    /// id that matches no feature simply highlights nothing.
    pub fn resolve(
        &self,
        feature: &Feature,
        selection: Option<&str>,
        colors: &CategoryColorTable,
    ) -> StyleDescriptor {
        let base_fill = colors.color_for(&feature.category(&self.category_attribute));

        let is_selected = self.mode == GroupingMode::GroupingWithHighlight
            && match (feature.id.as_deref(), selection) {
                (Some(id), Some(selected)) => id == selected,
                _ => false,
            };

        if is_selected {
            StyleDescriptor {
                fill_color: self.highlight_fill,
                border_color: darken(BASE_BORDER),
                border_weight: SELECTED_BORDER_WEIGHT,
                fill_opacity: SELECTED_FILL_OPACITY,
            }
        } else {
            StyleDescriptor {
                fill_color: base_fill,
                border_color: BASE_BORDER,
                border_weight: BASE_BORDER_WEIGHT,
                fill_opacity: BASE_FILL_OPACITY,
            }
        }
    }
}

fn darken(color: Color32) -> Color32 {
    Color32::from_rgb(color.r() / 2, color.g() / 2, color.b() / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_store::{AttributeValue, Geometry};
    use std::collections::HashMap;

    fn parcel(id: Option<&str>, package: &str) -> Feature {
        let mut attributes = HashMap::new();
        attributes.insert(
            "package".to_string(),
            AttributeValue::Text(package.to_string()),
        );
        Feature {
            id: id.map(str::to_string),
            geometry: Geometry::Point([0.0, 0.0]),
            attributes,
        }
    }

    fn two_color_table() -> CategoryColorTable {
        CategoryColorTable::from_values(
            ["east".to_string(), "west".to_string()],
            &crate::category_colors::DEFAULT_PALETTE,
        )
    }

    #[test]
    fn base_style_uses_category_color() {
        let resolver = StyleResolver::new("package", GroupingMode::GroupingWithHighlight);
        let colors = two_color_table();
        let style = resolver.resolve(&parcel(Some("P1"), "east"), None, &colors);
        assert_eq!(style.fill_color, colors.color_for("east"));
        assert_eq!(style.border_weight, BASE_BORDER_WEIGHT);
        assert_eq!(style.fill_opacity, BASE_FILL_OPACITY);
    }

    #[test]
    fn selected_feature_gets_highlight_override() {
        let resolver = StyleResolver::new("package", GroupingMode::GroupingWithHighlight);
        let colors = two_color_table();
        let style = resolver.resolve(&parcel(Some("P1"), "east"), Some("P1"), &colors);
        assert_eq!(style.fill_color, HIGHLIGHT_FILL);
        assert!(style.border_weight > BASE_BORDER_WEIGHT);
        assert!(style.fill_opacity > BASE_FILL_OPACITY);
        assert_ne!(style.border_color, BASE_BORDER);
    }

    #[test]
    fn grouping_only_mode_ignores_selection() {
        let resolver = StyleResolver::new("package", GroupingMode::GroupingOnly);
        let colors = two_color_table();
        let style = resolver.resolve(&parcel(Some("P1"), "east"), Some("P1"), &colors);
        assert_eq!(style.fill_color, colors.color_for("east"));
        assert_eq!(style.border_weight, BASE_BORDER_WEIGHT);
    }

    #[test]
    fn configured_highlight_color_overrides_default() {
        let mut resolver = StyleResolver::new("package", GroupingMode::GroupingWithHighlight);
        let magenta = Color32::from_rgb(0xff, 0x00, 0xff);
        resolver.set_highlight_fill(magenta);
        let colors = two_color_table();
        let style = resolver.resolve(&parcel(Some("P1"), "east"), Some("P1"), &colors);
        assert_eq!(style.fill_color, magenta);
        // Unselected features keep their category color.
        let other = resolver.resolve(&parcel(Some("P2"), "east"), Some("P1"), &colors);
        assert_eq!(other.fill_color, colors.color_for("east"));
    }

    #[test]
    fn missing_category_resolves_to_fallback_color() {
        let resolver = StyleResolver::new("package", GroupingMode::GroupingWithHighlight);
        let colors = two_color_table();
        let style = resolver.resolve(&parcel(Some("P1"), "north"), None, &colors);
        assert_eq!(
            style.fill_color,
            crate::category_colors::FALLBACK_COLOR
        );
    }

    #[test]
    fn feature_without_id_never_highlights() {
        let resolver = StyleResolver::new("package", GroupingMode::GroupingWithHighlight);
        let colors = two_color_table();
        let style = resolver.resolve(&parcel(None, "east"), Some("P1"), &colors);
        assert_eq!(style.fill_color, colors.color_for("east"));
    }
}
