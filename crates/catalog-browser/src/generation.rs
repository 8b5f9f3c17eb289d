use std::sync::atomic::{AtomicU64, Ordering};

use derive_more::Display;

/// Tag of one request batch, used to tell a fresh batch from a superseded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub struct Generation(u64);

/// Monotonically increasing source of [Generation]s.
///
/// Every new input advances the counter; results tagged with an older
/// generation are stale and get discarded on arrival instead of cancelled.
#[derive(Debug, Default)]
pub struct GenerationCounter(AtomicU64);

impl GenerationCounter {
    /// Start a new generation, invalidating all previous ones.
    pub fn advance(&self) -> Generation {
        Generation(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn current(&self) -> Generation {
        Generation(self.0.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }
}
