use std::collections::HashMap;

use eframe::egui::{self, TextureHandle, TextureOptions};
use rusty_fourier::config::AppConfig;
use rusty_fourier::render;
use rusty_fourier::state::AppState;
use rusty_fourier::View;

use crate::ui::{canvas, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyFourierApp {
    pub state: AppState,
    textures: HashMap<View, TextureHandle>,
    /// `state.revision` the textures were built from.
    texture_revision: Option<u64>,
}

impl RustyFourierApp {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            state: AppState::new(config),
            textures: HashMap::new(),
            texture_revision: None,
        }
    }

    /// Re-upload the rendered views when the state has changed.
    fn sync_textures(&mut self, ctx: &egui::Context) {
        if self.texture_revision == Some(self.state.revision) {
            return;
        }
        self.textures.clear();
        for (view, img) in &self.state.views {
            let handle = ctx.load_texture(
                format!("view-{view}"),
                render::to_color_image(img),
                TextureOptions::NEAREST,
            );
            self.textures.insert(*view, handle);
        }
        self.texture_revision = Some(self.state.revision);
    }
}

impl eframe::App for RustyFourierApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: shape tools and sessions ----
        egui::SidePanel::left("tool_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        self.sync_textures(ctx);

        // ---- Central panel: original / spectrum / reconstruction ----
        egui::CentralPanel::default().show(ctx, |ui| {
            canvas::views(ui, &mut self.state, &self.textures);
        });
    }
}
