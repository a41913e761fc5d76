pub mod artifact;
pub mod config;
pub mod slot;
pub mod subscriber;
pub mod web;

use std::sync::Arc;
use std::time::Instant;

use crate::artifact::{ArtifactRenderer, QrPngRenderer};
use crate::config::Config;
use crate::slot::SlotManager;

// ========================================
// ENGINE
// ========================================

/// Shared handle given to the subscriber and to every HTTP handler.
/// Cheap to clone (all fields are Arcs or Copy).
#[derive(Clone)]
pub struct QrFlashEngine {
    pub slots: Arc<SlotManager>,
    pub start_time: Instant,
}

impl QrFlashEngine {
    /// Must be called inside a Tokio runtime.
    pub fn new(config: &Config) -> Self {
        let renderer = Arc::new(QrPngRenderer::new(&config.artifact));
        Self::with_renderer(config, renderer)
    }

    pub fn with_renderer(config: &Config, renderer: Arc<dyn ArtifactRenderer>) -> Self {
        Self {
            slots: Arc::new(SlotManager::new(&config.slot, config.artifact.strategy, renderer)),
            start_time: Instant::now(),
        }
    }
}
