//! Expiring Slot: holds at most one live entry behind a single lock.
//! Readers check the deadline themselves; the scheduler sweeps the entry afterwards.

use std::time::Duration;

use bytes::Bytes;
use parking_lot::RwLock;

use super::entry::{Entry, Generation};
use crate::artifact::Artifact;
use crate::config::MAX_VISIBILITY_WINDOW;

/// What a `clear_if_current` call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared,
    /// A newer set superseded the generation; nothing was touched.
    Stale,
    AlreadyEmpty,
}

#[derive(Debug, Default)]
struct SlotState {
    entry: Option<Entry>,
    // Outlives the entry so generations keep increasing across clears.
    generation: Generation,
}

#[derive(Debug)]
pub struct ExpiringSlot {
    window: Duration,
    state: RwLock<SlotState>,
}

impl ExpiringSlot {
    /// Windows above `MAX_VISIBILITY_WINDOW` are clamped to it.
    pub fn new(window: Duration) -> Self {
        let window = if window > MAX_VISIBILITY_WINDOW {
            tracing::warn!(
                requested_secs = window.as_secs(),
                max_secs = MAX_VISIBILITY_WINDOW.as_secs(),
                "Visibility window clamped"
            );
            MAX_VISIBILITY_WINDOW
        } else {
            window
        };
        Self {
            window,
            state: RwLock::new(SlotState::default()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Replaces the entry wholesale and returns a copy of it, deadline included.
    ///
    /// Does not arm the scheduler; `SlotManager::accept` is the set that does.
    pub(crate) fn set(&self, payload: Bytes, artifact: Option<Artifact>) -> Entry {
        let mut state = self.state.write();
        let generation = state.generation.next();
        state.generation = generation;
        let entry = Entry::new(payload, artifact, generation, self.window);
        state.entry = Some(entry.clone());
        entry
    }

    pub fn get(&self) -> Option<Bytes> {
        self.current().map(|entry| entry.payload)
    }

    /// The live entry, if any. Expired entries read as absent even before they are swept.
    pub fn current(&self) -> Option<Entry> {
        let state = self.state.read();
        state
            .entry
            .as_ref()
            .filter(|entry| entry.is_live())
            .cloned()
    }

    pub fn is_available(&self) -> bool {
        let state = self.state.read();
        state.entry.as_ref().is_some_and(|entry| entry.is_live())
    }

    pub fn clear_if_current(&self, generation: Generation) -> ClearOutcome {
        let mut state = self.state.write();
        let outcome = match &state.entry {
            None => ClearOutcome::AlreadyEmpty,
            Some(entry) if entry.generation != generation => ClearOutcome::Stale,
            Some(_) => ClearOutcome::Cleared,
        };
        if outcome == ClearOutcome::Cleared {
            state.entry = None;
        }
        outcome
    }

    /// Latest generation handed out, whether or not its entry is still stored.
    pub fn generation(&self) -> Generation {
        self.state.read().generation
    }

    /// True while an entry is stored, including one past its deadline that
    /// the scheduler has not swept yet.
    pub fn holds_entry(&self) -> bool {
        self.state.read().entry.is_some()
    }
}
