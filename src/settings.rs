//! Copyright 2025 - The Parcel Explorer Developers
//! SPDX-License-Identifier: GPL-3.0-or-later

use eframe::egui::Color32;
use serde::{Deserialize, Serialize};

use crate::style::HIGHLIGHT_FILL;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerSettings {
    pub show_licensed_layer: bool,
    pub show_unlicensed_layer: bool,
    pub show_point_layer: bool,
    /// When false the map only groups parcels by package, without the
    /// selection highlight.
    pub highlight_selection: bool,
    /// Fill color for the selected parcel, as sRGB bytes.
    pub highlight_color: [u8; 3],
}

impl ExplorerSettings {
    pub fn highlight_fill(&self) -> Color32 {
        let [r, g, b] = self.highlight_color;
        Color32::from_rgb(r, g, b)
    }
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        ExplorerSettings {
            show_licensed_layer: true,
            show_unlicensed_layer: true,
            show_point_layer: true,
            highlight_selection: true,
            highlight_color: [
                HIGHLIGHT_FILL.r(),
                HIGHLIGHT_FILL.g(),
                HIGHLIGHT_FILL.b(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_keeps_highlight_color() {
        let mut settings = ExplorerSettings::default();
        settings.highlight_color = [0xff, 0x00, 0xff];
        settings.show_point_layer = false;
        let data = serde_json::to_string(&settings).unwrap();
        let restored: ExplorerSettings = serde_json::from_str(&data).unwrap();
        assert_eq!(restored, settings);
        assert_eq!(restored.highlight_fill(), Color32::from_rgb(0xff, 0x00, 0xff));
    }

    #[test]
    fn default_highlight_color_matches_default_fill() {
        assert_eq!(ExplorerSettings::default().highlight_fill(), HIGHLIGHT_FILL);
    }
}
