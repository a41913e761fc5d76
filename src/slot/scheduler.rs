//! Expiry Scheduler: one background actor that sweeps the slot when the newest
//! entry's window elapses.
//!
//! Each set sends an `Arm` command carrying its generation and deadline. The actor
//! keeps only the newest pending deadline (older ones are superseded and dropped)
//! and sleeps without touching the slot lock. When the deadline passes it calls
//! `clear_if_current`, so a clear that races with a newer set is a no-op.

use std::sync::{Arc, Weak};

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use super::entry::Generation;
use super::expiring_slot::{ClearOutcome, ExpiringSlot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Deadline {
    pub(crate) generation: Generation,
    pub(crate) at: Instant,
}

#[derive(Debug)]
pub(crate) enum SchedulerCommand {
    Arm(Deadline),
}

/// Handle to the scheduler actor. Dropping it stops the actor.
#[derive(Debug, Clone)]
pub struct ExpiryScheduler {
    tx: mpsc::UnboundedSender<SchedulerCommand>,
}

impl ExpiryScheduler {
    /// Spawns the actor on the current Tokio runtime.
    pub fn spawn(slot: &Arc<ExpiringSlot>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = SchedulerActor {
            slot: Arc::downgrade(slot),
            rx,
        };
        tokio::spawn(actor.run());
        Self { tx }
    }

    /// Schedules a sweep of `generation` at `at`. Never blocks.
    pub fn arm(&self, generation: Generation, at: Instant) {
        if self.tx.send(SchedulerCommand::Arm(Deadline { generation, at })).is_err() {
            tracing::warn!(%generation, "Expiry scheduler is gone, entry will only expire lazily");
        }
    }
}

struct SchedulerActor {
    // Weak so the actor never keeps a dropped slot alive.
    slot: Weak<ExpiringSlot>,
    rx: mpsc::UnboundedReceiver<SchedulerCommand>,
}

impl SchedulerActor {
    async fn run(mut self) {
        tracing::debug!("Expiry scheduler started");
        let mut pending: Option<Deadline> = None;

        loop {
            // Evaluated even when the branch is disabled, so it must not assume `pending`.
            let wake_at = pending.map_or_else(Instant::now, |d| d.at);

            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(SchedulerCommand::Arm(deadline)) => {
                        pending = Some(supersede(pending, deadline));
                    }
                    None => break,
                },
                _ = sleep_until(wake_at), if pending.is_some() => {
                    let Some(deadline) = pending.take() else { continue };
                    let Some(slot) = self.slot.upgrade() else { break };
                    fire(&slot, deadline);
                }
            }
        }

        tracing::debug!("Expiry scheduler stopped");
    }
}

/// Keeps whichever deadline belongs to the newer generation.
fn supersede(pending: Option<Deadline>, incoming: Deadline) -> Deadline {
    match pending {
        Some(current) if current.generation > incoming.generation => current,
        Some(current) => {
            tracing::trace!(
                superseded = %current.generation,
                by = %incoming.generation,
                "Dropping superseded expiry"
            );
            incoming
        }
        None => incoming,
    }
}

fn fire(slot: &ExpiringSlot, deadline: Deadline) {
    match slot.clear_if_current(deadline.generation) {
        ClearOutcome::Cleared => {
            tracing::info!(generation = %deadline.generation, "Visibility window elapsed, slot cleared");
        }
        ClearOutcome::Stale => {
            tracing::trace!(generation = %deadline.generation, "Stale expiry ignored");
        }
        ClearOutcome::AlreadyEmpty => {
            tracing::trace!(generation = %deadline.generation, "Slot already empty at expiry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::time::Duration;

    const WINDOW: Duration = Duration::from_secs(30);

    fn deadline(generation: u64, secs: u64) -> Deadline {
        Deadline {
            generation: Generation(generation),
            at: Instant::now() + Duration::from_secs(secs),
        }
    }

    #[test]
    fn newer_generation_supersedes_pending() {
        let old = deadline(1, 30);
        let new = deadline(2, 40);
        assert_eq!(supersede(Some(old), new), new);
        assert_eq!(supersede(Some(new), old), new);
        assert_eq!(supersede(None, old), old);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeps_entry_after_window() {
        let slot = Arc::new(ExpiringSlot::new(WINDOW));
        let scheduler = ExpiryScheduler::spawn(&slot);

        let entry = slot.set(Bytes::from("order-123"), None);
        scheduler.arm(entry.generation, entry.expires_at);

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(slot.holds_entry());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!slot.holds_entry());
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_expiry_does_not_clear_newer_entry() {
        let slot = Arc::new(ExpiringSlot::new(WINDOW));
        let scheduler = ExpiryScheduler::spawn(&slot);

        let first = slot.set(Bytes::from("A"), None);
        scheduler.arm(first.generation, first.expires_at);

        tokio::time::sleep(Duration::from_secs(10)).await;
        let second = slot.set(Bytes::from("B"), None);
        scheduler.arm(second.generation, second.expires_at);

        // Past A's deadline, inside B's.
        tokio::time::sleep(Duration::from_secs(21)).await;
        assert_eq!(slot.get(), Some(Bytes::from("B")));
        assert!(slot.holds_entry());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(slot.get(), None);
        assert!(!slot.holds_entry());
    }
}
