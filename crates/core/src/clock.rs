//! Clock collaborator hook (spec.md §6): a source of the current time for
//! block producers and test harnesses. Execution itself never consults a
//! wall clock directly — inside block processing "now" is always the
//! block's own timestamp (see `vela-runtime`), so this trait only matters
//! to whatever assembles blocks in the first place.

use crate::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The real wall clock.
#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Timestamp::new(secs)
    }
}

/// A clock a test harness can advance explicitly, for scenarios that need
/// to simulate the passage of time (e.g. staking's 24-hour unstake lock).
pub struct ManualClock {
    secs: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            secs: AtomicU64::new(start.secs()),
        }
    }

    pub fn advance(&self, delta_secs: u64) {
        self.secs.fetch_add(delta_secs, Ordering::SeqCst);
    }

    pub fn set(&self, t: Timestamp) {
        self.secs.store(t.secs(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.secs.load(Ordering::SeqCst))
    }
}
