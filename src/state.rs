use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use image::RgbImage;

use crate::config::AppConfig;
use crate::data::loader;
use crate::data::mask::suppressed_fraction;
use crate::data::model::{NormalizedBox, PixelBuffer, ShapeKind, View};
use crate::render::{self, SpectrumPalette};
use crate::session::{SessionId, SessionStore, ShapeRequest};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// An open image as listed in the side panel.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEntry {
    pub id: SessionId,
    pub name: String,
    /// (height, width, channels)
    pub dim: (usize, usize, usize),
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub store: Arc<SessionStore>,

    /// Open images in the order they were opened.
    pub sessions: Vec<SessionEntry>,

    /// Session shown in the central panel.
    pub active: Option<SessionId>,

    /// Shape drawn by the next drag on the spectrum.
    pub shape: ShapeKind,

    /// Border thickness in spectrum pixels.
    pub thickness: u32,

    pub palette: SpectrumPalette,

    /// Rendered views of the active session.
    pub views: BTreeMap<View, RgbImage>,

    /// Bumped whenever `views` changes so textures can be re-uploaded.
    pub revision: u64,

    /// Share of the active mask that is suppressed.
    pub suppressed: f64,

    /// Normalized drag start / current position on the spectrum pane.
    pub drag: Option<([f64; 2], [f64; 2])>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(SessionStore::new(config.store.clone())),
            sessions: Vec::new(),
            active: None,
            shape: config.default_shape,
            thickness: config.default_thickness.max(1),
            palette: config.palette,
            views: BTreeMap::new(),
            revision: 0,
            suppressed: 0.0,
            drag: None,
            status_message: None,
        }
    }

    pub fn active_entry(&self) -> Option<&SessionEntry> {
        let id = self.active?;
        self.sessions.iter().find(|e| e.id == id)
    }

    /// Decode an image file and open it as a new session.
    pub fn open_path(&mut self, path: &Path) -> Result<SessionId> {
        let pixels = loader::load_image(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.open_pixels(name, pixels)
    }

    /// Open already decoded pixels as a new session and show it.
    pub fn open_pixels(&mut self, name: String, pixels: PixelBuffer) -> Result<SessionId> {
        let dim = pixels.dim();
        let id = self.store.create(pixels)?;
        self.sessions.push(SessionEntry { id, name, dim });
        // The store may have evicted older sessions to make room.
        let store = Arc::clone(&self.store);
        self.sessions.retain(|e| store.contains(&e.id));
        self.select(id)?;
        Ok(id)
    }

    /// Show another open session.
    pub fn select(&mut self, id: SessionId) -> Result<()> {
        self.active = Some(id);
        self.drag = None;
        self.refresh(&View::ALL)
    }

    /// Suppress the current shape inside `bbox` on the active session.
    pub fn apply_box(&mut self, bbox: NormalizedBox) -> Result<()> {
        let id = self.active_id()?;
        let request = ShapeRequest::new(self.shape, bbox, self.thickness);
        self.store.apply_shape(&id, &request)?;
        self.refresh(&[View::Spectrum, View::Reconstruction])
    }

    pub fn reset_mask(&mut self) -> Result<()> {
        let id = self.active_id()?;
        self.store.reset_mask(&id)?;
        self.refresh(&[View::Spectrum, View::Reconstruction])
    }

    pub fn set_palette(&mut self, palette: SpectrumPalette) -> Result<()> {
        self.palette = palette;
        if self.active.is_some() {
            self.refresh(&[View::Spectrum])?;
        }
        Ok(())
    }

    /// Close a session; the most recently opened remaining one becomes active.
    pub fn close(&mut self, id: SessionId) -> Result<()> {
        self.store.remove(&id)?;
        self.sessions.retain(|e| e.id != id);
        if self.active == Some(id) {
            self.active = None;
            self.views.clear();
            self.suppressed = 0.0;
            self.revision += 1;
            if let Some(last) = self.sessions.last().map(|e| e.id) {
                self.select(last)?;
            }
        }
        Ok(())
    }

    /// Write the rendered `view` of the active session as PNG.
    pub fn export(&self, view: View, path: &Path) -> Result<()> {
        let img = self
            .views
            .get(&view)
            .with_context(|| format!("no {view} image to export"))?;
        render::save_png(img, path)?;
        log::info!("Exported {view} to {}", path.display());
        Ok(())
    }

    /// Surface a failed action in the status bar.
    pub fn report<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.status_message = None;
                Some(value)
            }
            Err(e) => {
                log::error!("{e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
                None
            }
        }
    }

    fn active_id(&self) -> Result<SessionId> {
        self.active.context("no image is open")
    }

    fn refresh(&mut self, views: &[View]) -> Result<()> {
        let id = self.active_id()?;
        for &view in views {
            let buffer = self.store.render(&id, view)?;
            let img = render::to_rgb_image(&buffer, self.palette)?;
            self.views.insert(view, img);
        }
        self.suppressed = suppressed_fraction(self.store.get(&id)?.mask());
        self.revision += 1;
        Ok(())
    }
}
