//! Copyright 2025 - The Parcel Explorer Developers
//! SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::{BTreeSet, HashMap};

use eframe::egui::Color32;

use crate::feature_store::FeatureStore;

/// Neutral parcel blue used whenever a category has no table entry.
pub const FALLBACK_COLOR: Color32 = Color32::from_rgb(0x34, 0x98, 0xdb);

/// Default categorical palette, cycled over sorted category values.
pub const DEFAULT_PALETTE: [Color32; 8] = [
    Color32::from_rgb(0x1f, 0x77, 0xb4),
    Color32::from_rgb(0xff, 0x7f, 0x0e),
    Color32::from_rgb(0x2c, 0xa0, 0x2c),
    Color32::from_rgb(0xd6, 0x27, 0x28),
    Color32::from_rgb(0x94, 0x67, 0xbd),
    Color32::from_rgb(0x8c, 0x56, 0x4b),
    Color32::from_rgb(0xe3, 0x77, 0xc2),
    Color32::from_rgb(0xbc, 0xbd, 0x22),
];

/// Deterministic mapping from a categorical attribute value to a display color.
///
/// Built once per dataset load: the distinct observed values (nulls already
/// normalized to the `N/A` sentinel by the store) are sorted ascending,
/// case-sensitive, and assigned palette colors by position modulo the palette
/// length. The same value set always produces the same table.
#[derive(Debug, Clone, Default)]
pub struct CategoryColorTable {
    colors: HashMap<String, Color32>,
    ordered: Vec<String>,
}

impl CategoryColorTable {
    /// Build a table from the categories observed in the store under the
    /// given grouping attribute. An empty store yields an empty table.
    pub fn build(store: &FeatureStore, attribute: &str, palette: &[Color32]) -> Self {
        Self::from_values(store.distinct_categories(attribute), palette)
    }

    /// Build a table from an explicit value set. Duplicates are ignored and
    /// traversal order is irrelevant.
    pub fn from_values<I>(values: I, palette: &[Color32]) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let sorted: BTreeSet<String> = values.into_iter().collect();
        let ordered: Vec<String> = sorted.into_iter().collect();
        let mut colors = HashMap::with_capacity(ordered.len());
        for (i, value) in ordered.iter().enumerate() {
            let color = if palette.is_empty() {
                FALLBACK_COLOR
            } else {
                palette[i % palette.len()]
            };
            colors.insert(value.clone(), color);
        }
        CategoryColorTable { colors, ordered }
    }

    /// Color for a category. Values absent from the table resolve to
    /// [`FALLBACK_COLOR`]; a miss is never an error.
    pub fn color_for(&self, category: &str) -> Color32 {
        self.colors.get(category).copied().unwrap_or(FALLBACK_COLOR)
    }

    /// Categories in assignment order, for legend and filter display.
    pub fn categories(&self) -> &[String] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_store::NA_CATEGORY;

    #[test]
    fn palette_cycles_over_sorted_values() {
        let palette = [Color32::from_rgb(0x11, 0x11, 0x11), Color32::from_rgb(0x22, 0x22, 0x22)];
        let values = ["B", "A", "A", NA_CATEGORY]
            .iter()
            .map(|s| s.to_string());
        let table = CategoryColorTable::from_values(values, &palette);

        // Sorted order A, B, N/A wraps around the two-color palette.
        assert_eq!(table.color_for("A"), palette[0]);
        assert_eq!(table.color_for("B"), palette[1]);
        assert_eq!(table.color_for(NA_CATEGORY), palette[0]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn assignment_is_deterministic_across_runs() {
        let values = vec!["pine", "fir", "spruce", "aspen", "birch"];
        let first = CategoryColorTable::from_values(
            values.iter().map(|s| s.to_string()),
            &DEFAULT_PALETTE,
        );
        let mut shuffled = values.clone();
        shuffled.reverse();
        let second = CategoryColorTable::from_values(
            shuffled.iter().map(|s| s.to_string()),
            &DEFAULT_PALETTE,
        );
        for value in values {
            assert_eq!(first.color_for(value), second.color_for(value));
        }
        assert_eq!(first.categories(), second.categories());
    }

    #[test]
    fn unknown_category_falls_back() {
        let table = CategoryColorTable::from_values(
            ["A".to_string()],
            &DEFAULT_PALETTE,
        );
        assert_eq!(table.color_for("nowhere"), FALLBACK_COLOR);
    }

    #[test]
    fn empty_value_set_yields_empty_table() {
        let table = CategoryColorTable::from_values(std::iter::empty(), &DEFAULT_PALETTE);
        assert!(table.is_empty());
        assert_eq!(table.color_for("anything"), FALLBACK_COLOR);
    }
}
