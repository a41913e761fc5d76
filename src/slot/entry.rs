use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::artifact::Artifact;

/// Version stamp handed out by every set. Strictly increasing, never reused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl Generation {
    pub const ZERO: Generation = Generation(0);

    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct Entry {
    pub payload: Bytes,
    pub artifact: Option<Artifact>,
    pub generation: Generation,
    pub created_at: Instant,
    pub expires_at: Instant,
    pub received_at: DateTime<Utc>,
}

impl Entry {
    pub(crate) fn new(
        payload: Bytes,
        artifact: Option<Artifact>,
        generation: Generation,
        window: Duration,
    ) -> Self {
        let created_at = Instant::now();
        Self {
            payload,
            artifact,
            generation,
            created_at,
            expires_at: created_at + window,
            received_at: Utc::now(),
        }
    }

    pub fn is_live_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    pub fn is_live(&self) -> bool {
        self.is_live_at(Instant::now())
    }

    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
