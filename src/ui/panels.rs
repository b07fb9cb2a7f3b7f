use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use rusty_fourier::data::loader::SUPPORTED_EXTENSIONS;
use rusty_fourier::render::SpectrumPalette;
use rusty_fourier::state::AppState;
use rusty_fourier::{ShapeKind, View};

// ---------------------------------------------------------------------------
// Left side panel – mask tools and open sessions
// ---------------------------------------------------------------------------

/// Render the left tool panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Mask");
    ui.separator();

    ui.strong("Shape");
    egui::ComboBox::from_id_salt("shape_kind")
        .selected_text(state.shape.label())
        .show_ui(ui, |ui: &mut Ui| {
            for kind in ShapeKind::ALL {
                ui.selectable_value(&mut state.shape, kind, kind.label());
            }
        });

    ui.add_enabled(
        state.shape.uses_thickness(),
        egui::Slider::new(&mut state.thickness, 1..=64).text("thickness (px)"),
    );

    ui.add_space(4.0);
    ui.strong("Spectrum colours");
    let mut palette = state.palette;
    egui::ComboBox::from_id_salt("palette")
        .selected_text(palette.label())
        .show_ui(ui, |ui: &mut Ui| {
            for p in SpectrumPalette::ALL {
                ui.selectable_value(&mut palette, p, p.label());
            }
        });
    if palette != state.palette {
        let changed = state.set_palette(palette);
        state.report(changed);
    }

    ui.add_space(4.0);
    ui.add_enabled_ui(state.active.is_some(), |ui: &mut Ui| {
        if ui.button("Reset mask").clicked() {
            let reset = state.reset_mask();
            state.report(reset);
        }
    });
    if state.active.is_some() {
        ui.label(format!("{:.1}% of the spectrum suppressed", state.suppressed * 100.0));
    }

    ui.add_space(8.0);
    ui.heading("Images");
    ui.separator();

    if state.sessions.is_empty() {
        ui.label("No image loaded.");
        return;
    }

    // Clone so we can mutate state inside the loop.
    let entries = state.sessions.clone();
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for entry in &entries {
                ui.horizontal(|ui: &mut Ui| {
                    if ui.small_button("✕").on_hover_text("Close").clicked() {
                        let closed = state.close(entry.id);
                        state.report(closed);
                        return;
                    }
                    let (h, w, _) = entry.dim;
                    let label = format!("{}  ({w}×{h})", entry.name);
                    if ui
                        .selectable_label(state.active == Some(entry.id), label)
                        .clicked()
                    {
                        let selected = state.select(entry.id);
                        state.report(selected);
                    }
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open image…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            ui.add_enabled_ui(state.active.is_some(), |ui: &mut Ui| {
                ui.menu_button("Export", |ui: &mut Ui| {
                    for view in View::ALL {
                        if ui.button(view.title()).clicked() {
                            export_file_dialog(state, view);
                            ui.close_menu();
                        }
                    }
                });
            });
        });

        ui.separator();

        if let Some(entry) = state.active_entry() {
            let (h, w, c) = entry.dim;
            let kind = if c == 1 { "grayscale" } else { "RGB" };
            ui.label(format!("{}: {w}×{h} {kind}", entry.name));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open image")
        .add_filter("Images", &SUPPORTED_EXTENSIONS)
        .pick_file();

    if let Some(path) = file {
        let opened = state.open_path(&path);
        if let Some(id) = state.report(opened) {
            log::info!("Opened {} as session {id}", path.display());
        }
    }
}

fn export_file_dialog(state: &mut AppState, view: View) {
    let file = rfd::FileDialog::new()
        .set_title("Export view")
        .set_file_name(format!("{view}.png"))
        .add_filter("PNG", &["png"])
        .save_file();

    if let Some(path) = file {
        let exported = state.export(view, &path);
        state.report(exported);
    }
}
