//! The seam between [`Logger`](crate::Logger) and whatever writes records.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::level::Level;
use crate::record::Record;

/// Destination for emitted records.
///
/// Implementations: `aloig::TracingBackend` (production), [`MemoryBackend`] (tests).
/// `emit` is fire-and-forget and must never panic or block on the network.
pub trait LogBackend: Send + Sync {
    /// Writes one record.
    fn emit(&self, record: &Record);

    /// Drains anything queued for asynchronous delivery, waiting at most `timeout`.
    ///
    /// Returns `true` if everything was delivered in time.
    fn flush(&self, _timeout: Duration) -> bool {
        true
    }
}

/// In-memory backend that captures records in emission order.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<Vec<Record>>,
    flushes: AtomicUsize,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record emitted so far.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    /// Removes and returns every captured record.
    pub fn take(&self) -> Vec<Record> {
        std::mem::take(&mut *self.records.lock())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// The most recently emitted record.
    #[must_use]
    pub fn last(&self) -> Option<Record> {
        self.records.lock().last().cloned()
    }

    /// Captured records at exactly `level`.
    #[must_use]
    pub fn at_level(&self, level: Level) -> Vec<Record> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .cloned()
            .collect()
    }

    /// Number of times [`LogBackend::flush`] was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::Relaxed)
    }
}

impl LogBackend for MemoryBackend {
    fn emit(&self, record: &Record) {
        self.records.lock().push(record.clone());
    }

    fn flush(&self, _timeout: Duration) -> bool {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        true
    }
}
