use std::collections::HashMap;

use eframe::egui::{
    self, Color32, Pos2, Rect, Sense, Shape, Stroke, StrokeKind, TextureHandle, Ui, Vec2,
};
use rusty_fourier::state::AppState;
use rusty_fourier::{NormalizedBox, ShapeKind, View};

const PREVIEW: Color32 = Color32::from_rgb(255, 170, 0);

// ---------------------------------------------------------------------------
// Image panes (central panel)
// ---------------------------------------------------------------------------

/// Render the three views side by side; drags on the spectrum edit the mask.
pub fn views(ui: &mut Ui, state: &mut AppState, textures: &HashMap<View, TextureHandle>) {
    if state.active.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open an image to edit its spectrum  (File → Open image…)");
        });
        return;
    }

    ui.columns(View::ALL.len(), |columns| {
        for (col, view) in columns.iter_mut().zip(View::ALL) {
            col.vertical_centered(|ui: &mut Ui| {
                ui.strong(view.title());
                let Some(texture) = textures.get(&view) else {
                    ui.spinner();
                    return;
                };
                let size = fit(texture.size_vec2(), ui.available_size());
                if view == View::Spectrum {
                    spectrum_pane(ui, state, texture, size);
                } else {
                    ui.add(egui::Image::new((texture.id(), size)));
                }
            });
        }
    });
}

/// Largest size with the texture's aspect ratio that fits `avail`.
fn fit(tex: Vec2, avail: Vec2) -> Vec2 {
    if tex.x <= 0.0 || tex.y <= 0.0 {
        return Vec2::ZERO;
    }
    let scale = (avail.x / tex.x).min(avail.y / tex.y).max(0.0);
    tex * scale
}

fn spectrum_pane(ui: &mut Ui, state: &mut AppState, texture: &TextureHandle, size: Vec2) {
    let response = ui.add(egui::Image::new((texture.id(), size)).sense(Sense::drag()));
    let rect = response.rect;

    let to_normalized = |p: Pos2| -> [f64; 2] {
        let rel = (p - rect.min) / rect.size();
        [rel.x.clamp(0.0, 1.0) as f64, rel.y.clamp(0.0, 1.0) as f64]
    };

    if response.drag_started() {
        if let Some(p) = response.interact_pointer_pos() {
            let n = to_normalized(p);
            state.drag = Some((n, n));
        }
    } else if response.dragged() {
        if let (Some(p), Some((start, _))) = (response.interact_pointer_pos(), state.drag) {
            state.drag = Some((start, to_normalized(p)));
        }
    }

    if let Some((start, end)) = state.drag {
        let px_per_sample = rect.width() / texture.size_vec2().x.max(1.0);
        draw_preview(ui, rect, start, end, state.shape, state.thickness as f32 * px_per_sample);
    }

    if response.drag_stopped() {
        if let Some((start, end)) = state.drag.take() {
            let applied = NormalizedBox::new(start[0], start[1], end[0], end[1])
                .map_err(anyhow::Error::from)
                .and_then(|bbox| state.apply_box(bbox));
            state.report(applied);
        }
    }
}

/// Outline of the shape about to be applied, in screen space.
fn draw_preview(ui: &Ui, rect: Rect, a: [f64; 2], b: [f64; 2], shape: ShapeKind, thickness: f32) {
    let at = |n: [f64; 2]| rect.min + Vec2::new(n[0] as f32, n[1] as f32) * rect.size();
    let outline = Rect::from_two_pos(at(a), at(b));
    let stroke = Stroke::new(1.5, PREVIEW);
    let painter = ui.painter_at(rect);

    match shape {
        ShapeKind::Rectangle => {
            painter.rect_stroke(outline, 0.0, stroke, StrokeKind::Middle);
        }
        ShapeKind::HollowRectangle => {
            painter.rect_stroke(outline, 0.0, stroke, StrokeKind::Middle);
            let inner = outline.shrink(thickness);
            if inner.is_positive() {
                painter.rect_stroke(inner, 0.0, stroke, StrokeKind::Middle);
            }
        }
        ShapeKind::Ellipse => {
            painter.add(Shape::ellipse_stroke(outline.center(), outline.size() / 2.0, stroke));
        }
        ShapeKind::Ring => {
            let radius = outline.size() / 2.0;
            painter.add(Shape::ellipse_stroke(outline.center(), radius, stroke));
            let inner = radius - Vec2::splat(thickness);
            if inner.x > 0.0 && inner.y > 0.0 {
                painter.add(Shape::ellipse_stroke(outline.center(), inner, stroke));
            }
        }
    }
}
