//! Reconciler events and results.

/// Events emitted while reconciling a sentence stream.
/// Fields are populated when events are created, even if consumers don't read all of them.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum ReconcileEvent {
    /// Run started
    Started {
        total_sentences: usize,
        total_batches: usize,
    },
    /// Batch handed to the strategy
    BatchStarted { index: usize, size: usize },
    /// Batch classified without repair
    BatchCompleted { index: usize, size: usize },
    /// Strategy returned an error; the batch was replaced with fallbacks
    BatchFailed {
        index: usize,
        size: usize,
        error: String,
    },
    /// Strategy returned the wrong number of records; the batch was padded or truncated
    BatchRepaired {
        index: usize,
        expected: usize,
        got: usize,
    },
    /// Run complete
    Complete { summary: ReconcileSummary },
}

/// Counters for a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub sentences: usize,
    pub batches: usize,
    pub failed_batches: usize,
    pub repaired_batches: usize,
    /// Records whose category is `"none"` (including every fallback)
    pub none_records: usize,
}
