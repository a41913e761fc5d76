pub mod entry;
pub mod expiring_slot;
pub mod scheduler;
pub mod slot_manager;
pub mod snapshot;

pub use entry::{Entry, Generation};
pub use expiring_slot::{ClearOutcome, ExpiringSlot};
pub use scheduler::ExpiryScheduler;
pub use slot_manager::*;
pub use snapshot::*;
