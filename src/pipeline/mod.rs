//! Batched classification and reconciliation.
//!
//! The reconciler drives any `ClassificationStrategy` over a sentence stream
//! and guarantees one record per input sentence, in order, whatever the
//! strategy returns. Separated from UI concerns - emits events for progress
//! tracking.

mod types;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::models::{Annotation, ReconciledEntry, ReconciledOutput, Sentence};
use crate::strategy::ClassificationStrategy;

pub use types::{ReconcileEvent, ReconcileSummary};

/// Drives a strategy over fixed-size batches and repairs its output.
#[derive(Debug, Clone)]
pub struct BatchReconciler {
    batch_size: usize,
}

impl BatchReconciler {
    /// `batch_size` is clamped to at least 1.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Classify `sentences` batch by batch.
    ///
    /// The output always has one entry per input sentence, carrying its page
    /// index and text. Batches run strictly one after another.
    pub async fn run(
        &self,
        strategy: &dyn ClassificationStrategy,
        sentences: &[Sentence],
        event_tx: Option<mpsc::Sender<ReconcileEvent>>,
    ) -> (ReconciledOutput, ReconcileSummary) {
        let emit = |event: ReconcileEvent| {
            let tx = event_tx.clone();
            async move {
                if let Some(tx) = tx {
                    let _ = tx.send(event).await;
                }
            }
        };

        let total_batches = sentences.len().div_ceil(self.batch_size);
        let mut summary = ReconcileSummary {
            sentences: sentences.len(),
            batches: total_batches,
            ..Default::default()
        };

        emit(ReconcileEvent::Started {
            total_sentences: sentences.len(),
            total_batches,
        })
        .await;

        let mut output = Vec::with_capacity(sentences.len());

        for (index, batch) in sentences.chunks(self.batch_size).enumerate() {
            let size = batch.len();
            emit(ReconcileEvent::BatchStarted { index, size }).await;

            let texts: Vec<String> = batch.iter().map(|s| s.text.clone()).collect();
            let mut failed = false;
            let mut records = match strategy.classify_batch(&texts).await {
                Ok(records) => records,
                Err(e) => {
                    failed = true;
                    warn!(
                        "Strategy {} failed on batch {}: {}",
                        strategy.strategy_id(),
                        index,
                        e
                    );
                    summary.failed_batches += 1;
                    emit(ReconcileEvent::BatchFailed {
                        index,
                        size,
                        error: e.to_string(),
                    })
                    .await;
                    Annotation::error_batch(size, e)
                }
            };

            if records.len() != size {
                let got = records.len();
                warn!(
                    "Batch {} returned {} records for {} sentences, repairing",
                    index, got, size
                );
                records.resize_with(size, Annotation::mismatch);
                summary.repaired_batches += 1;
                emit(ReconcileEvent::BatchRepaired {
                    index,
                    expected: size,
                    got,
                })
                .await;
            } else if !failed {
                emit(ReconcileEvent::BatchCompleted { index, size }).await;
            }

            debug!("Batch {} reconciled ({} sentences)", index, size);

            output.extend(
                batch
                    .iter()
                    .zip(records)
                    .map(|(sentence, annotation)| ReconciledEntry {
                        page_index: sentence.page_index,
                        text: sentence.text.clone(),
                        annotation,
                    }),
            );
        }

        summary.none_records = output.iter().filter(|e| e.annotation.is_none()).count();

        emit(ReconcileEvent::Complete {
            summary: summary.clone(),
        })
        .await;

        (output, summary)
    }
}
