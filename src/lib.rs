//! Copyright 2025 - The Parcel Explorer Developers
//! SPDX-License-Identifier: GPL-3.0-or-later

mod category_colors;
mod dataset_file;
mod explorer_project;
mod feature_store;
mod map_rendering;
mod settings;
mod style;

pub use category_colors::{CategoryColorTable, DEFAULT_PALETTE, FALLBACK_COLOR};
pub use dataset_file::{load_features, ACRES_FIELD, CANONICAL_ID_FIELD};
pub use explorer_project::ExplorerProject;
pub use feature_store::{AttributeValue, Bounds, Feature, FeatureStore, Geometry, NA_CATEGORY};
pub use map_rendering::{render_map, MapClick, MapTransform};
pub use settings::ExplorerSettings;
pub use style::{GroupingMode, StyleDescriptor, StyleResolver, HIGHLIGHT_FILL};

#[cfg(not(target_arch = "wasm32"))]
pub use dataset_file::load_dataset_file;
