//! Copyright 2025 - The Parcel Explorer Developers
//! SPDX-License-Identifier: GPL-3.0-or-later

use earcutr::earcut;
use eframe::egui;
use eframe::egui::Color32;

use crate::explorer_project::ExplorerProject;
use crate::feature_store::{Bounds, Feature, Geometry};
use crate::style::StyleDescriptor;

const MAP_PADDING: f32 = 12.0;
const MARKER_RADIUS: f32 = 5.0;

/// One click on the map canvas. `feature_id` is None when the click hit
/// empty ground or a feature that has no identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct MapClick {
    pub feature_id: Option<String>,
}

/// Projection from (lon, lat) into the map canvas rect, preserving aspect
/// ratio and centered on the bounding box of the visible features.
#[derive(Debug, Clone, Copy)]
pub struct MapTransform {
    world_center: [f64; 2],
    screen_center: egui::Pos2,
    scale: f32,
}

impl MapTransform {
    pub fn new(bounds: Bounds, rect: egui::Rect) -> Self {
        let span_x = bounds.width().max(1e-9) as f32;
        let span_y = bounds.height().max(1e-9) as f32;
        let avail_x = (rect.width() - 2.0 * MAP_PADDING).max(1.0);
        let avail_y = (rect.height() - 2.0 * MAP_PADDING).max(1.0);
        let scale = (avail_x / span_x).min(avail_y / span_y);
        MapTransform {
            world_center: bounds.center(),
            screen_center: rect.center(),
            scale,
        }
    }

    /// Project one (lon, lat) position. Latitude grows upward, screen y
    /// grows downward.
    pub fn to_screen(&self, p: [f64; 2]) -> egui::Pos2 {
        egui::pos2(
            self.screen_center.x + (p[0] - self.world_center[0]) as f32 * self.scale,
            self.screen_center.y - (p[1] - self.world_center[1]) as f32 * self.scale,
        )
    }
}

/// Draw all visible features with their resolved styles and report a click,
/// if any. The caller decides what "visible" means (package filter, layer
/// toggles) and feeds the returned click into the selection sync.
pub fn render_map<F>(
    ui: &mut egui::Ui,
    project: &ExplorerProject,
    visible: F,
) -> Option<MapClick>
where
    F: Fn(&Feature) -> bool,
{
    let (response, painter) =
        ui.allocate_painter(ui.available_size(), egui::Sense::click());
    let store = project.get_store();

    let Some(bounds) = store.bounds_where(&visible) else {
        painter.text(
            response.rect.center(),
            egui::Align2::CENTER_CENTER,
            "No features to display",
            egui::FontId::default(),
            ui.visuals().weak_text_color(),
        );
        return None;
    };
    let transform = MapTransform::new(bounds, response.rect);

    let pointer = response.interact_pointer_pos();
    // Later features draw on top, so the last hit wins.
    let mut hit: Option<Option<String>> = None;

    for feature in store.features().iter().filter(|f| visible(f)) {
        let style = project.resolve_style(feature);
        match &feature.geometry {
            Geometry::Polygon(rings) => {
                draw_polygon(&painter, rings, &transform, &style);
                if let Some(pos) = pointer {
                    if polygon_contains(rings, &transform, pos) {
                        hit = Some(feature.id.clone());
                    }
                }
            }
            Geometry::MultiPolygon(polygons) => {
                let mut contained = false;
                for rings in polygons {
                    draw_polygon(&painter, rings, &transform, &style);
                    if let Some(pos) = pointer {
                        contained |= polygon_contains(rings, &transform, pos);
                    }
                }
                if contained {
                    hit = Some(feature.id.clone());
                }
            }
            Geometry::Point(p) => {
                let center = transform.to_screen(*p);
                painter.circle(
                    center,
                    MARKER_RADIUS,
                    with_opacity(style.fill_color, style.fill_opacity.max(0.8)),
                    egui::Stroke::new(style.border_weight, style.border_color),
                );
                if let Some(pos) = pointer {
                    if pos.distance(center) <= MARKER_RADIUS + 2.0 {
                        hit = Some(feature.id.clone());
                    }
                }
            }
        }
    }

    if response.clicked() {
        Some(MapClick {
            feature_id: hit.flatten(),
        })
    } else {
        None
    }
}

fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0) as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

/// Fill one polygon (exterior plus holes) via earcut triangulation and
/// stroke its exterior ring.
fn draw_polygon(
    painter: &egui::Painter,
    rings: &[Vec<[f64; 2]>],
    transform: &MapTransform,
    style: &StyleDescriptor,
) {
    let Some(exterior) = rings.first() else {
        return;
    };
    if exterior.len() < 3 {
        return;
    }

    let mut points: Vec<egui::Pos2> = Vec::new();
    let mut coords: Vec<f64> = Vec::new();
    let mut hole_indices: Vec<usize> = Vec::new();
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            hole_indices.push(points.len());
        }
        for p in ring {
            let sp = transform.to_screen(*p);
            points.push(sp);
            coords.push(sp.x as f64);
            coords.push(sp.y as f64);
        }
    }

    let fill = with_opacity(style.fill_color, style.fill_opacity);
    if let Ok(indices) = earcut(&coords, &hole_indices, 2) {
        // One mesh per polygon keeps the translucent fill free of triangle
        // seams.
        let mut mesh = egui::Mesh::default();
        for pt in &points {
            mesh.colored_vertex(*pt, fill);
        }
        mesh.indices = indices.iter().map(|&i| i as u32).collect();
        painter.add(egui::Shape::mesh(mesh));
    }

    let exterior_points: Vec<egui::Pos2> =
        exterior.iter().map(|p| transform.to_screen(*p)).collect();
    painter.add(egui::Shape::closed_line(
        exterior_points,
        egui::Stroke::new(style.border_weight, style.border_color),
    ));
}

/// Hit test in screen space: inside the exterior ring and outside every
/// hole, matching what the triangulated fill draws.
fn polygon_contains(
    rings: &[Vec<[f64; 2]>],
    transform: &MapTransform,
    pos: egui::Pos2,
) -> bool {
    let Some(exterior) = rings.first() else {
        return false;
    };
    if !ring_contains(exterior, transform, pos) {
        return false;
    }
    !rings[1..].iter().any(|hole| ring_contains(hole, transform, pos))
}

/// Ray-cast test against one projected ring.
fn ring_contains(ring: &[[f64; 2]], transform: &MapTransform, pos: egui::Pos2) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let points: Vec<egui::Pos2> = ring.iter().map(|p| transform.to_screen(*p)).collect();
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > pos.y) != (b.y > pos.y)
            && pos.x < (b.x - a.x) * (pos.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_bounds() -> Bounds {
        let mut b = Bounds::of_point([0.0, 0.0]);
        b.merge(Bounds::of_point([10.0, 10.0]));
        b
    }

    #[test]
    fn transform_centers_and_preserves_aspect() {
        let rect = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(200.0, 100.0));
        let transform = MapTransform::new(unit_bounds(), rect);
        let center = transform.to_screen([5.0, 5.0]);
        assert_eq!(center, rect.center());
        // The vertical axis is the tight one: 100 - 2*padding over 10 units.
        let top = transform.to_screen([5.0, 10.0]);
        assert!((center.y - top.y - (100.0 - 2.0 * MAP_PADDING) / 2.0).abs() < 0.5);
    }

    #[test]
    fn latitude_grows_upward_on_screen() {
        let rect = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(100.0, 100.0));
        let transform = MapTransform::new(unit_bounds(), rect);
        let south = transform.to_screen([5.0, 0.0]);
        let north = transform.to_screen([5.0, 10.0]);
        assert!(north.y < south.y);
    }

    #[test]
    fn hit_test_rejects_points_inside_holes() {
        let rect = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(100.0, 100.0));
        let transform = MapTransform::new(unit_bounds(), rect);
        let rings = vec![
            vec![[1.0, 1.0], [9.0, 1.0], [9.0, 9.0], [1.0, 9.0]],
            vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0]],
        ];
        let in_hole = transform.to_screen([5.0, 5.0]);
        let in_solid = transform.to_screen([2.0, 2.0]);
        assert!(!polygon_contains(&rings, &transform, in_hole));
        assert!(polygon_contains(&rings, &transform, in_solid));
    }

    #[test]
    fn hit_test_matches_polygon_interior() {
        let rect = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(100.0, 100.0));
        let transform = MapTransform::new(unit_bounds(), rect);
        let rings = vec![vec![[2.0, 2.0], [8.0, 2.0], [8.0, 8.0], [2.0, 8.0]]];
        let inside = transform.to_screen([5.0, 5.0]);
        let outside = transform.to_screen([9.5, 9.5]);
        assert!(polygon_contains(&rings, &transform, inside));
        assert!(!polygon_contains(&rings, &transform, outside));
    }
}
