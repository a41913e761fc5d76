//! Slot Manager: binds the expiring slot, its scheduler and the renderer.
//! This is the handle the subscriber writes through and the HTTP layer reads through.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use super::entry::{Entry, Generation};
use super::expiring_slot::{ClearOutcome, ExpiringSlot};
use super::scheduler::ExpiryScheduler;
use super::snapshot::{CurrentDetail, SlotSnapshot};
use crate::artifact::{Artifact, ArtifactError, ArtifactRenderer, RenderStrategy};
use crate::config::SlotConfig;

const PREVIEW_CHARS: usize = 50;

// ========================================
// ERRORS
// ========================================

#[derive(Debug, Clone, PartialEq)]
pub enum ReadError {
    /// Slot empty, or its entry is past the deadline.
    NoCurrentPayload,
    Artifact(ArtifactError),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::NoCurrentPayload => write!(f, "no current payload"),
            ReadError::Artifact(e) => write!(f, "artifact unavailable: {}", e),
        }
    }
}

impl std::error::Error for ReadError {}

impl From<ArtifactError> for ReadError {
    fn from(error: ArtifactError) -> Self {
        ReadError::Artifact(error)
    }
}

// ========================================
// SLOT MANAGER
// ========================================

pub struct SlotManager {
    slot: Arc<ExpiringSlot>,
    scheduler: ExpiryScheduler,
    renderer: Arc<dyn ArtifactRenderer>,
    strategy: RenderStrategy,
}

impl SlotManager {
    /// Must be called inside a Tokio runtime: the expiry actor is spawned here.
    pub fn new(
        config: &SlotConfig,
        strategy: RenderStrategy,
        renderer: Arc<dyn ArtifactRenderer>,
    ) -> Self {
        let slot = Arc::new(ExpiringSlot::new(config.visibility_window));
        let scheduler = ExpiryScheduler::spawn(&slot);
        Self { slot, scheduler, renderer, strategy }
    }

    pub fn slot(&self) -> &Arc<ExpiringSlot> {
        &self.slot
    }

    // ========================================
    // WRITE PATH
    // ========================================

    /// Accepts a payload from the subscription. This is the set that arms expiry.
    ///
    /// The renderer runs before the lock is taken. A payload it rejects is never
    /// committed and the previous entry stays exactly as it was.
    pub fn accept(&self, payload: Bytes) -> Result<Generation, ArtifactError> {
        let artifact = match self.strategy {
            RenderStrategy::Lazy => {
                self.renderer.validate(&payload)?;
                None
            }
            RenderStrategy::Eager => Some(self.renderer.render(&payload)?),
        };

        let entry = self.slot.set(payload, artifact);
        self.scheduler.arm(entry.generation, entry.expires_at);

        tracing::debug!(
            generation = %entry.generation,
            bytes = entry.payload.len(),
            "Payload accepted"
        );
        Ok(entry.generation)
    }

    /// Drops the entry if `generation` is still the stored one.
    pub fn clear_if_current(&self, generation: Generation) -> ClearOutcome {
        self.slot.clear_if_current(generation)
    }

    // ========================================
    // READ PATH
    // ========================================

    pub fn is_available(&self) -> bool {
        self.slot.is_available()
    }

    pub fn payload(&self) -> Option<Bytes> {
        self.slot.get()
    }

    /// The image for the live payload. Lazy strategy renders it on every call,
    /// always from a copy taken under the lock and encoded after releasing it.
    pub fn artifact(&self) -> Result<Artifact, ReadError> {
        let entry = self.slot.current().ok_or(ReadError::NoCurrentPayload)?;
        match entry.artifact {
            Some(artifact) => Ok(artifact),
            None => Ok(self.renderer.render(&entry.payload)?),
        }
    }

    pub fn snapshot(&self) -> SlotSnapshot {
        let current = self.slot.current();
        SlotSnapshot {
            available: current.is_some(),
            generation: self.slot.generation().0,
            window_secs: self.slot.window().as_secs(),
            strategy: self.strategy.as_str(),
            current: current.as_ref().map(detail),
        }
    }
}

fn detail(entry: &Entry) -> CurrentDetail {
    let remaining = entry.remaining();
    let expires_at = chrono::Duration::from_std(remaining)
        .map(|d| (chrono::Utc::now() + d).to_rfc3339())
        .unwrap_or_else(|_| "Expired".to_string());

    CurrentDetail {
        generation: entry.generation.0,
        payload_preview: preview(&entry.payload),
        received_at: entry.received_at.to_rfc3339(),
        expires_at,
        remaining_ms: remaining.as_millis() as u64,
        prerendered: entry.artifact.is_some(),
    }
}

fn preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(s) if s.chars().count() > PREVIEW_CHARS => {
            format!("{}...", s.chars().take(PREVIEW_CHARS).collect::<String>())
        }
        Ok(s) => s.to_string(),
        Err(_) => format!("[Binary {} bytes]", payload.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundaries() {
        let long = "é".repeat(60);
        let p = preview(long.as_bytes());
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 3);

        assert_eq!(preview(b"short"), "short");
        assert_eq!(preview(&[0xff, 0xfe]), "[Binary 2 bytes]");
    }
}
