//! In-memory session store.
//!
//! Each uploaded image becomes an [`ImageSession`] addressed by a
//! [`SessionId`]. The map itself sits behind a `RwLock` that is only held to
//! look up, insert or remove entries; every session carries its own `Mutex`,
//! so operations on one session are serialized while different sessions
//! never wait on each other.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::data::mask;
use crate::data::model::{
    MaskBuffer, NormalizedBox, PixelBuffer, ShapeKind, SpectrumBuffer, View, ViewBuffer,
};
use crate::data::spectrum;
use crate::error::{Result, SpectralError};

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Opaque, randomly generated session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for SessionId {
    type Err = SpectralError;

    /// A string that is not a valid id cannot name a stored session.
    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(SessionId)
            .map_err(|_| SpectralError::NotFound(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ShapeRequest – body of a shape edit
// ---------------------------------------------------------------------------

fn default_thickness() -> u32 {
    5
}

/// One shape edit as submitted by a client. Coordinates are normalized to
/// [0, 1]; `shape` is validated when the request is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRequest {
    pub shape: String,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    #[serde(default = "default_thickness")]
    pub thickness: u32,
}

impl ShapeRequest {
    pub fn new(shape: ShapeKind, bbox: NormalizedBox, thickness: u32) -> Self {
        Self {
            shape: shape.as_str().to_string(),
            x0: bbox.x0,
            y0: bbox.y0,
            x1: bbox.x1,
            y1: bbox.y1,
            thickness,
        }
    }

    /// Parse and range-check every field.
    pub fn validate(&self) -> Result<(ShapeKind, NormalizedBox)> {
        let shape: ShapeKind = self.shape.parse()?;
        let bbox = NormalizedBox::new(self.x0, self.y0, self.x1, self.y1)?;
        mask::validate_thickness(shape, self.thickness)?;
        Ok((shape, bbox))
    }
}

// ---------------------------------------------------------------------------
// ImageSession
// ---------------------------------------------------------------------------

/// Per-image state. `original` and `spectrum` never change after creation and
/// are shared by snapshots; only the mask is mutable.
#[derive(Debug, Clone)]
pub struct ImageSession {
    id: SessionId,
    original: Arc<PixelBuffer>,
    spectrum: Arc<SpectrumBuffer>,
    mask: MaskBuffer,
}

impl ImageSession {
    /// Run the forward transform and start with an all-keep mask.
    pub fn new(id: SessionId, original: PixelBuffer) -> Self {
        let (spectrum, _) = spectrum::forward_transform(&original);
        let mask = mask::reset_mask(spectrum.dim());
        Self {
            id,
            original: Arc::new(original),
            spectrum: Arc::new(spectrum),
            mask,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn original(&self) -> &PixelBuffer {
        &self.original
    }

    pub fn spectrum(&self) -> &SpectrumBuffer {
        &self.spectrum
    }

    pub fn mask(&self) -> &MaskBuffer {
        &self.mask
    }

    /// (height, width, channels)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.original.dim()
    }

    pub fn apply_shape(&mut self, shape: ShapeKind, bbox: &NormalizedBox, thickness: u32) -> Result<()> {
        self.mask = mask::apply_shape(&self.mask, shape, bbox, thickness)?;
        Ok(())
    }

    pub fn reset_mask(&mut self) {
        self.mask = mask::reset_mask(self.spectrum.dim());
    }

    /// Compute the numeric buffer behind `view`.
    pub fn view(&self, view: View) -> Result<ViewBuffer> {
        match view {
            View::Original => Ok(ViewBuffer::Original((*self.original).clone())),
            View::Spectrum => {
                spectrum::masked_magnitude(&self.spectrum, &self.mask).map(ViewBuffer::Magnitude)
            }
            View::Reconstruction => spectrum::inverse_transform(&self.spectrum, &self.mask)
                .map(ViewBuffer::Reconstruction),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

struct Slot {
    session: Mutex<ImageSession>,
    /// Logical clock value of the last operation, for LRU eviction.
    last_used: AtomicU64,
}

/// Thread-safe keyed store of image sessions with a capacity bound.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Slot>>>,
    clock: AtomicU64,
    config: StoreConfig,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl SessionStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Transform `pixels`, store the new session and return its id.
    ///
    /// When the store is full the least recently used session is evicted.
    pub fn create(&self, pixels: PixelBuffer) -> Result<SessionId> {
        self.validate_dimensions(&pixels)?;

        let started = Instant::now();
        let id = SessionId::new();
        let (h, w, c) = pixels.dim();
        let session = ImageSession::new(id, pixels);
        log::debug!("create: forward transform of {w}x{h}x{c} took {:?}", started.elapsed());

        let slot = Arc::new(Slot {
            session: Mutex::new(session),
            last_used: AtomicU64::new(self.tick()),
        });

        let mut sessions = self.sessions.write();
        while sessions.len() >= self.config.max_sessions.max(1) {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, slot)| slot.last_used.load(Ordering::Relaxed))
                .map(|(id, _)| *id);
            match oldest {
                Some(old) => {
                    sessions.remove(&old);
                    log::info!("Evicted least recently used session {old}");
                }
                None => break,
            }
        }
        sessions.insert(id, slot);
        log::info!("Created session {id} ({w}x{h}, {c} channel(s)), {} live", sessions.len());
        Ok(id)
    }

    /// Drop a session and its buffers.
    pub fn remove(&self, id: &SessionId) -> Result<()> {
        match self.sessions.write().remove(id) {
            Some(_) => {
                log::info!("Removed session {id}");
                Ok(())
            }
            None => Err(SpectralError::NotFound(id.to_string())),
        }
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// Consistent snapshot of a session.
    pub fn get(&self, id: &SessionId) -> Result<ImageSession> {
        let slot = self.slot(id)?;
        let session = slot.session.lock().clone();
        Ok(session)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.read().contains_key(id)
    }

    /// Ids of all live sessions, least recently used first.
    pub fn ids(&self) -> Vec<SessionId> {
        let sessions = self.sessions.read();
        let mut ids: Vec<(u64, SessionId)> = sessions
            .iter()
            .map(|(id, slot)| (slot.last_used.load(Ordering::Relaxed), *id))
            .collect();
        ids.sort();
        ids.into_iter().map(|(_, id)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    // ========================================================================
    // Mask operations
    // ========================================================================

    /// Validate `request` and suppress its shape in the session's mask.
    /// Nothing is mutated when validation fails.
    pub fn apply_shape(&self, id: &SessionId, request: &ShapeRequest) -> Result<()> {
        let (shape, bbox) = request.validate()?;
        let slot = self.slot(id)?;
        let mut session = slot.session.lock();
        session.apply_shape(shape, &bbox, request.thickness)?;
        log::debug!(
            "Session {id}: applied {shape} ({:.3}, {:.3})-({:.3}, {:.3}) t={}, {:.1}% suppressed",
            bbox.x0,
            bbox.y0,
            bbox.x1,
            bbox.y1,
            request.thickness,
            mask::suppressed_fraction(session.mask()) * 100.0
        );
        Ok(())
    }

    /// Restore the all-keep mask.
    pub fn reset_mask(&self, id: &SessionId) -> Result<()> {
        let slot = self.slot(id)?;
        slot.session.lock().reset_mask();
        log::debug!("Session {id}: mask reset");
        Ok(())
    }

    /// Numeric buffer for one view. Computed from a snapshot, so the session
    /// lock is not held during the transform.
    pub fn render(&self, id: &SessionId, view: View) -> Result<ViewBuffer> {
        let snapshot = self.get(id)?;
        let started = Instant::now();
        let buffer = snapshot.view(view)?;
        log::debug!("Session {id}: rendered {view} in {:?}", started.elapsed());
        Ok(buffer)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn slot(&self, id: &SessionId) -> Result<Arc<Slot>> {
        let slot = self
            .sessions
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| SpectralError::NotFound(id.to_string()))?;
        slot.last_used.store(self.tick(), Ordering::Relaxed);
        Ok(slot)
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn validate_dimensions(&self, pixels: &PixelBuffer) -> Result<()> {
        let (h, w, c) = pixels.dim();
        if h == 0 || w == 0 {
            return Err(SpectralError::validation("image has no pixels"));
        }
        if c != 1 && c != 3 {
            return Err(SpectralError::validation(format!(
                "expected 1 or 3 channels, got {c}"
            )));
        }
        let max = self.config.max_dimension;
        if h > max || w > max {
            return Err(SpectralError::ImageTooLarge {
                width: w,
                height: h,
                max,
            });
        }
        Ok(())
    }
}
