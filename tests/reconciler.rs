//! Batch Reconciler Tests
//!
//! Drives the reconciler with scripted strategies and checks that every input
//! sentence gets exactly one record, in order, whatever the strategy does.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use papermark::models::{Annotation, Sentence, MISMATCH_JUSTIFICATION};
use papermark::pipeline::BatchReconciler;
use papermark::strategy::{ClassificationStrategy, StrategyError};

/// Labels every sentence "method" and echoes its text as the justification.
#[derive(Default)]
struct EchoStrategy {
    calls: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
}

#[async_trait]
impl ClassificationStrategy for EchoStrategy {
    fn strategy_id(&self) -> &str {
        "echo"
    }

    fn display_name(&self) -> &str {
        "Echo"
    }

    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Annotation>, StrategyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batch_sizes.lock().unwrap().push(texts.len());
        Ok(texts
            .iter()
            .map(|t| Annotation::new("method", format!("echo: {}", t)))
            .collect())
    }
}

/// Fails on one batch index, echoes otherwise.
struct FailOnBatch {
    fail_at: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl ClassificationStrategy for FailOnBatch {
    fn strategy_id(&self) -> &str {
        "fail_on_batch"
    }

    fn display_name(&self) -> &str {
        "Fail On Batch"
    }

    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Annotation>, StrategyError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if index == self.fail_at {
            return Err(StrategyError::Failed("model crashed".to_string()));
        }
        Ok(texts
            .iter()
            .map(|t| Annotation::new("results", format!("echo: {}", t)))
            .collect())
    }
}

/// Returns one record fewer than asked for.
struct ShortByOne;

#[async_trait]
impl ClassificationStrategy for ShortByOne {
    fn strategy_id(&self) -> &str {
        "short"
    }

    fn display_name(&self) -> &str {
        "Short"
    }

    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Annotation>, StrategyError> {
        Ok(texts
            .iter()
            .take(texts.len().saturating_sub(1))
            .map(|t| Annotation::new("limitation", format!("echo: {}", t)))
            .collect())
    }
}

/// Returns one record more than asked for.
struct LongByOne;

#[async_trait]
impl ClassificationStrategy for LongByOne {
    fn strategy_id(&self) -> &str {
        "long"
    }

    fn display_name(&self) -> &str {
        "Long"
    }

    async fn classify_batch(&self, texts: &[String]) -> Result<Vec<Annotation>, StrategyError> {
        let mut records: Vec<Annotation> = texts
            .iter()
            .map(|t| Annotation::new("dataset", format!("echo: {}", t)))
            .collect();
        records.push(Annotation::new("dataset", "extra"));
        Ok(records)
    }
}

fn sentences(n: usize) -> Vec<Sentence> {
    (0..n)
        .map(|i| Sentence::new(i / 3, format!("Sentence number {} of the paper.", i)))
        .collect()
}

#[tokio::test]
async fn test_output_length_and_order_for_all_sizes() {
    for n in [0, 1, 2, 3, 4, 5, 7, 8, 9, 16, 31] {
        for batch_size in [1, 2, 3, 4, 32] {
            let input = sentences(n);
            let strategy = EchoStrategy::default();
            let (output, summary) = BatchReconciler::new(batch_size)
                .run(&strategy, &input, None)
                .await;

            assert_eq!(output.len(), n, "n={} batch_size={}", n, batch_size);
            assert_eq!(summary.sentences, n);
            for (entry, sentence) in output.iter().zip(&input) {
                assert_eq!(entry.page_index, sentence.page_index);
                assert_eq!(entry.text, sentence.text);
                assert_eq!(
                    entry.annotation.justification,
                    format!("echo: {}", sentence.text)
                );
            }
        }
    }
}

#[tokio::test]
async fn test_batches_partition_stream() {
    let input = sentences(10);
    let strategy = EchoStrategy::default();
    let (_, summary) = BatchReconciler::new(4).run(&strategy, &input, None).await;

    assert_eq!(*strategy.batch_sizes.lock().unwrap(), vec![4, 4, 2]);
    assert_eq!(summary.batches, 3);
    assert_eq!(summary.failed_batches, 0);
    assert_eq!(summary.repaired_batches, 0);
}

#[tokio::test]
async fn test_empty_input_makes_no_calls() {
    let strategy = EchoStrategy::default();
    let (output, summary) = BatchReconciler::new(4).run(&strategy, &[], None).await;

    assert!(output.is_empty());
    assert_eq!(summary.batches, 0);
    assert_eq!(strategy.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_zero_batch_size_is_clamped() {
    let input = sentences(3);
    let strategy = EchoStrategy::default();
    let (output, _) = BatchReconciler::new(0).run(&strategy, &input, None).await;

    assert_eq!(output.len(), 3);
    assert_eq!(*strategy.batch_sizes.lock().unwrap(), vec![1, 1, 1]);
}

#[tokio::test]
async fn test_failed_batch_is_isolated() {
    let input = sentences(9);
    let strategy = FailOnBatch {
        fail_at: 1,
        calls: AtomicUsize::new(0),
    };
    let (output, summary) = BatchReconciler::new(3).run(&strategy, &input, None).await;

    assert_eq!(output.len(), 9);
    assert_eq!(summary.failed_batches, 1);
    for (i, entry) in output.iter().enumerate() {
        if (3..6).contains(&i) {
            assert!(entry.annotation.is_none());
            assert!(entry.annotation.justification.starts_with("Error: "));
            assert!(entry.annotation.justification.contains("model crashed"));
        } else {
            assert_eq!(entry.annotation.category, "results");
            assert_eq!(
                entry.annotation.justification,
                format!("echo: {}", input[i].text)
            );
        }
    }
}

#[tokio::test]
async fn test_short_batch_is_padded() {
    let input = sentences(4);
    let (output, summary) = BatchReconciler::new(4).run(&ShortByOne, &input, None).await;

    assert_eq!(output.len(), 4);
    assert_eq!(summary.repaired_batches, 1);
    for entry in &output[..3] {
        assert_eq!(entry.annotation.category, "limitation");
    }
    assert!(output[3].annotation.is_none());
    assert_eq!(output[3].annotation.justification, MISMATCH_JUSTIFICATION);
    assert_eq!(output[3].text, input[3].text);
}

#[tokio::test]
async fn test_long_batch_is_truncated() {
    let input = sentences(5);
    let (output, summary) = BatchReconciler::new(2).run(&LongByOne, &input, None).await;

    assert_eq!(output.len(), 5);
    assert_eq!(summary.repaired_batches, 3);
    assert!(output
        .iter()
        .all(|e| e.annotation.justification.starts_with("echo: ")));
}

#[tokio::test]
async fn test_none_records_counted() {
    let input = sentences(6);
    let strategy = FailOnBatch {
        fail_at: 0,
        calls: AtomicUsize::new(0),
    };
    let (_, summary) = BatchReconciler::new(2).run(&strategy, &input, None).await;
    assert_eq!(summary.none_records, 2);
}
