// Copyright 2025 - The Parcel Explorer Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use eframe::egui;
use std::future::Future;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::Sender;

use parcel_explorer::{
    load_features, render_map, AttributeValue, ExplorerProject, ExplorerSettings, Feature,
    GroupingMode, ACRES_FIELD, DEFAULT_PALETTE,
};

/// Categorical attribute parcels are grouped and colored by.
const PACKAGE_ATTRIBUTE: &str = "package";
/// Boolean attribute partitioning parcels into the licensed/unlicensed layers.
const LICENSED_ATTRIBUTE: &str = "licensed";

pub struct ExplorerApp {
    // Path to settings file
    settings_path: String,
    settings: ExplorerSettings,
    project: Option<ExplorerProject>,
    /// Set when the last dataset load failed; blocks map and table.
    load_error: Option<String>,
    file_channel: (Sender<Vec<u8>>, Receiver<Vec<u8>>),
    /// None means "All" packages.
    package_filter: Option<String>,
}

impl ExplorerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings_path = "explorer_settings.json".to_string();
        let mut settings = ExplorerSettings::default();
        match read_settings(&settings_path) {
            Ok(Some(loaded)) => settings = loaded,
            Ok(None) => {}
            Err(e) => {
                eprintln!("[ERROR] Failed to load settings file: {}", e);
            }
        }

        Self {
            settings_path,
            settings,
            project: None,
            load_error: None,
            file_channel: std::sync::mpsc::channel(),
            package_filter: None,
        }
    }

    fn open_dataset_dialog(&self) {
        let sender = self.file_channel.0.clone();
        let task = rfd::AsyncFileDialog::new()
            .add_filter("GeoJSON", &["geojson", "json"])
            .pick_file();
        execute(async move {
            if let Some(file) = task.await {
                let contents = file.read().await;
                _ = sender.send(contents);
            }
        });
    }

    fn grouping_mode(&self) -> GroupingMode {
        if self.settings.highlight_selection {
            GroupingMode::GroupingWithHighlight
        } else {
            GroupingMode::GroupingOnly
        }
    }

    fn save_settings(&self) {
        if let Err(e) = write_settings(&self.settings_path, &self.settings) {
            log::warn!("Failed to save settings: {}", e);
        }
    }

    /// Visibility predicate for the current filter and layer toggles.
    fn visible_filter(&self) -> impl Fn(&Feature) -> bool {
        let settings = self.settings.clone();
        let package_filter = self.package_filter.clone();
        move |feature: &Feature| {
            if feature.geometry.is_point() {
                return settings.show_point_layer;
            }
            if let Some(package) = &package_filter {
                if feature.category(PACKAGE_ATTRIBUTE) != *package {
                    return false;
                }
            }
            if feature.flag(LICENSED_ATTRIBUTE) {
                settings.show_licensed_layer
            } else {
                settings.show_unlicensed_layer
            }
        }
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        // Dataset bytes arriving from the file dialog.
        if let Ok(contents) = self.file_channel.1.try_recv() {
            match load_features(&contents) {
                Ok(store) => {
                    log::info!("Loaded dataset with {} features", store.len());
                    self.project = Some(ExplorerProject::new(
                        store,
                        PACKAGE_ATTRIBUTE,
                        &DEFAULT_PALETTE,
                        self.grouping_mode(),
                    ));
                    self.load_error = None;
                    self.package_filter = None;
                }
                Err(e) => {
                    log::warn!("Dataset load failed: {}", e);
                    // No partial store is ever substituted.
                    self.project = None;
                    self.load_error = Some(e);
                }
            }
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Cariboo Parcel Explorer");
                ui.separator();
                if ui.button("Open dataset…").clicked() {
                    self.open_dataset_dialog();
                }
            });
        });

        if let Some(error) = &self.load_error {
            let message = error.clone();
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(40.0);
                    ui.colored_label(egui::Color32::RED, "Failed to load dataset");
                    ui.label(message);
                });
            });
            return;
        }
        if self.project.is_none() {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(40.0);
                    ui.label("Open a .geojson dataset to start exploring parcels.");
                });
            });
            return;
        }

        let mode = self.grouping_mode();
        let highlight_fill = self.settings.highlight_fill();
        if let Some(project) = &mut self.project {
            project.set_grouping_mode(mode);
            project.set_highlight_fill(highlight_fill);
        }

        // Selection history shortcuts, in the manner of undo/redo.
        let mut nav_back = ctx.input(|i| i.modifiers.alt && i.key_pressed(egui::Key::ArrowLeft));
        let mut nav_forward =
            ctx.input(|i| i.modifiers.alt && i.key_pressed(egui::Key::ArrowRight));
        let mut settings_changed = false;
        let mut reset_selection = false;
        let mut map_click = None;

        if let Some(project) = &self.project {
            let visible = self.visible_filter();
            let settings = &mut self.settings;
            let package_filter = &mut self.package_filter;

            egui::SidePanel::left("filter_panel")
                .resizable(true)
                .default_width(280.0)
                .show(ctx, |ui| {
                    ui.heading("Filter Properties");

                    let selected_text = package_filter.as_deref().unwrap_or("All").to_string();
                    egui::ComboBox::from_label("Package")
                        .selected_text(selected_text)
                        .show_ui(ui, |ui| {
                            ui.selectable_value(package_filter, None, "All");
                            for category in project.color_table().categories() {
                                ui.selectable_value(
                                    package_filter,
                                    Some(category.clone()),
                                    category.as_str(),
                                );
                            }
                        });

                    ui.separator();
                    ui.label("Layers");
                    settings_changed |= ui
                        .checkbox(&mut settings.show_licensed_layer, "Licensed parcels")
                        .changed();
                    settings_changed |= ui
                        .checkbox(&mut settings.show_unlicensed_layer, "Unlicensed parcels")
                        .changed();
                    settings_changed |= ui
                        .checkbox(&mut settings.show_point_layer, "Points of interest")
                        .changed();
                    settings_changed |= ui
                        .checkbox(&mut settings.highlight_selection, "Highlight selection")
                        .changed();
                    ui.horizontal(|ui| {
                        ui.label("Highlight color");
                        settings_changed |= ui
                            .color_edit_button_srgb(&mut settings.highlight_color)
                            .changed();
                    });

                    ui.separator();
                    let store = project.get_store();
                    let parcels: Vec<&Feature> = store
                        .features()
                        .iter()
                        .filter(|f| !f.geometry.is_point() && visible(f))
                        .collect();
                    let total = parcels.len();
                    let acre_values: Vec<f64> = parcels
                        .iter()
                        .filter_map(|f| f.attribute(ACRES_FIELD).and_then(AttributeValue::as_number))
                        .collect();
                    ui.label(format!("Total parcels: {}", total));
                    if !acre_values.is_empty() {
                        let avg = acre_values.iter().sum::<f64>() / acre_values.len() as f64;
                        ui.label(format!("Avg parcel size: {:.2} acres", avg));
                    }

                    ui.separator();
                    ui.horizontal(|ui| {
                        ui.label("Property List");
                        if ui
                            .add_enabled(
                                project.previous_selected_available(),
                                egui::Button::new("◀"),
                            )
                            .on_hover_text("Previous selection (Alt+Left)")
                            .clicked()
                        {
                            nav_back = true;
                        }
                        if ui
                            .add_enabled(
                                project.next_selected_available(),
                                egui::Button::new("▶"),
                            )
                            .on_hover_text("Next selection (Alt+Right)")
                            .clicked()
                        {
                            nav_forward = true;
                        }
                        if ui.button("Clear").clicked() {
                            reset_selection = true;
                        }
                    });
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        for feature in &parcels {
                            // Features without an id are not selectable.
                            let Some(id) = &feature.id else {
                                continue;
                            };
                            let acres = feature
                                .attribute(ACRES_FIELD)
                                .and_then(AttributeValue::as_number)
                                .map(|a| format!(" ({:.2} ac)", a))
                                .unwrap_or_default();
                            let is_selected = project.current_selection() == Some(id.as_str());
                            let response =
                                ui.selectable_label(is_selected, format!("{}{}", id, acres));
                            if response.clicked() {
                                project.get_mut_selected().replace(Some(id.clone()));
                            }
                        }
                    });
                });

            egui::CentralPanel::default().show(ctx, |ui| {
                match project.current_selection() {
                    Some(id) if project.get_store().contains(id) => {
                        ui.label(format!("Selected parcel: {}", id));
                    }
                    Some(id) => {
                        ui.colored_label(
                            egui::Color32::RED,
                            format!("Selected parcel not in dataset: {}", id),
                        );
                    }
                    None => {
                        ui.label("No parcel selected");
                    }
                }
                map_click = render_map(ui, project, &visible);
            });
        }

        if settings_changed {
            self.save_settings();
        }

        if let Some(project) = &mut self.project {
            if let Some(click) = map_click {
                // A click on empty ground or an id-less feature never
                // changes the selection.
                if let Some(id) = click.feature_id {
                    project.get_mut_selected().replace(Some(id));
                }
            }
            if nav_back {
                project.set_previous_selected();
                ctx.request_repaint();
            } else if nav_forward {
                project.set_next_selected();
                ctx.request_repaint();
            }
            if reset_selection {
                project.reset_selection();
                ctx.request_repaint();
            }
            if project.update_selected() {
                ctx.request_repaint();
            }
        }
    }
}

fn read_settings(path: &str) -> Result<Option<ExplorerSettings>, String> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        match std::fs::read_to_string(path) {
            Ok(data) => serde_json::from_str::<ExplorerSettings>(&data)
                .map(Some)
                .map_err(|e| format!("Failed to parse settings file: {}", e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.to_string()),
        }
    }
    #[cfg(target_arch = "wasm32")]
    {
        let _ = path;
        Ok(None)
    }
}

fn write_settings(path: &str, settings: &ExplorerSettings) -> Result<(), String> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let data = serde_json::to_string_pretty(settings).map_err(|e| e.to_string())?;
        std::fs::write(path, data).map_err(|e| e.to_string())
    }
    #[cfg(target_arch = "wasm32")]
    {
        let _ = (path, settings);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn execute<F: Future<Output = ()> + Send + 'static>(f: F) {
    std::thread::spawn(move || futures::executor::block_on(f));
}

#[cfg(target_arch = "wasm32")]
fn execute<F: Future<Output = ()> + 'static>(f: F) {
    wasm_bindgen_futures::spawn_local(f);
}

// When compiling natively:
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    // Initialize logging for native builds
    env_logger::init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([700.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "ParcelExplorer",
        native_options,
        Box::new(|cc| Ok(Box::new(ExplorerApp::new(cc)))),
    )
    .ok();
}

// When compiling to web using trunk:
#[cfg(target_arch = "wasm32")]
fn main() {
    use eframe::wasm_bindgen::JsCast as _;

    let web_options = eframe::WebOptions::default();

    // Redirect `log` message to `console.log` and friends:
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    wasm_bindgen_futures::spawn_local(async {
        let document = web_sys::window()
            .expect("No window")
            .document()
            .expect("No document");

        let canvas = document
            .get_element_by_id("parcel_explorer_canvas_id")
            .expect("Failed to find parcel_explorer_canvas_id")
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .expect("parcel_explorer_canvas_id was not a HtmlCanvasElement");

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(ExplorerApp::new(cc)))),
            )
            .await;

        // Remove the loading text and spinner:
        if let Some(loading_text) = document.get_element_by_id("loading_text") {
            match start_result {
                Ok(_) => {
                    loading_text.remove();
                }
                Err(e) => {
                    loading_text.set_inner_html(
                        "<p> The app has crashed. See the developer console for details. </p>",
                    );
                    panic!("Failed to start eframe: {e:?}");
                }
            }
        }
    });
}
