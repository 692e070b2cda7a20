//! Contextual-Batch Strategy Tests
//!
//! Runs `LlmBatchStrategy` against a scripted generator to check prompt
//! budgeting, response parsing, and the whole-batch fallbacks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use papermark::labels::Taxonomy;
use papermark::llm::{LlmError, TextGenerator};
use papermark::models::{Annotation, Sentence};
use papermark::pipeline::BatchReconciler;
use papermark::strategy::{ClassificationStrategy, LlmBatchStrategy};

/// Requests seen by a `ScriptedGenerator`: prompt and completion budget.
type RequestLog = Arc<Mutex<Vec<(String, usize)>>>;

/// Replays canned replies and records every request.
struct ScriptedGenerator {
    replies: Mutex<Vec<Result<String, LlmError>>>,
    requests: RequestLog,
    context_window: usize,
    unloaded: Arc<AtomicBool>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().rev().collect()),
            requests: Arc::default(),
            context_window: 4096,
            unloaded: Arc::default(),
        }
    }

    fn with_window(mut self, context_window: usize) -> Self {
        self.context_window = context_window;
        self
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn context_window(&self) -> usize {
        self.context_window
    }

    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }

    async fn generate(&self, prompt: &str, max_new_tokens: usize) -> Result<String, LlmError> {
        self.requests
            .lock()
            .unwrap()
            .push((prompt.to_string(), max_new_tokens));
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(LlmError::Api("script exhausted".to_string())))
    }

    async fn unload(&self) -> Result<(), LlmError> {
        self.unloaded.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_valid_response_parsed() {
    let generator = ScriptedGenerator::new(vec![Ok(r#"Here you go:
[
  {"category": "Method", "justification": "Describes the architecture."},
  {"category": "results", "justification": ""}
]"#
    .to_string())]);
    let strategy = LlmBatchStrategy::new(generator, Taxonomy::default());

    let records = strategy
        .classify_batch(&texts(&[
            "We use a transformer encoder.",
            "Accuracy reaches 91%.",
        ]))
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].category, "method");
    assert_eq!(records[1].category, "results");
    assert_eq!(records[1].justification, "No justification provided.");
}

#[tokio::test]
async fn test_prompt_sent_once_per_batch() {
    let generator = ScriptedGenerator::new(vec![Ok(
        r#"[{"category": "none", "justification": "General."}]"#.to_string(),
    )]);
    let requests = generator.requests.clone();
    let strategy = LlmBatchStrategy::new(generator, Taxonomy::default());

    strategy
        .classify_batch(&texts(&["This paper is organized as follows."]))
        .await
        .unwrap();

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (prompt, max_new_tokens) = &requests[0];
    assert!(prompt.contains("1. \"This paper is organized as follows.\""));
    assert_eq!(*max_new_tokens, 80 + 256);
}

#[tokio::test]
async fn test_requested_tokens_follow_budget() {
    let generator = ScriptedGenerator::new(vec![Ok(r#"[
        {"category": "method", "justification": "a"},
        {"category": "method", "justification": "b"},
        {"category": "method", "justification": "c"}
    ]"#
    .to_string())]);
    let requests = generator.requests.clone();
    let strategy = LlmBatchStrategy::new(generator, Taxonomy::default()).with_budget(10, 5);
    let input = texts(&["One sentence here.", "Two sentence here.", "Three here."]);

    let records = strategy.classify_batch(&input).await.unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(requests.lock().unwrap()[0].1, 3 * 10 + 5);
}

#[tokio::test]
async fn test_prompt_too_long_skips_model() {
    let generator = ScriptedGenerator::new(vec![]).with_window(20);
    let requests = generator.requests.clone();
    let strategy = LlmBatchStrategy::new(generator, Taxonomy::default());

    let records = strategy
        .classify_batch(&texts(&["A sentence.", "Another sentence."]))
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    for record in &records {
        assert!(record.is_none());
        assert!(record.justification.starts_with("Error: Input too long ("));
        assert!(record.justification.ends_with(" tokens) for model."));
    }
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_output_falls_back_for_whole_batch() {
    let generator = ScriptedGenerator::new(vec![Ok("I think the first one is a method.".to_string())]);
    let strategy = LlmBatchStrategy::new(generator, Taxonomy::default());

    let records = strategy
        .classify_batch(&texts(&["First.", "Second.", "Third."]))
        .await
        .unwrap();

    assert_eq!(records.len(), 3);
    assert!(records.iter().all(Annotation::is_none));
    assert!(records[0].justification.starts_with(
        "Error: Parse error: No JSON array found in the response.. Raw output: I think"
    ));
    assert!(records[0].justification.ends_with("..."));
}

#[tokio::test]
async fn test_length_mismatch_falls_back() {
    let generator = ScriptedGenerator::new(vec![Ok(
        r#"[{"category": "method", "justification": "only one"}]"#.to_string(),
    )]);
    let strategy = LlmBatchStrategy::new(generator, Taxonomy::default());

    let records = strategy
        .classify_batch(&texts(&["First.", "Second."]))
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records[0]
        .justification
        .contains("Expected 2 items, but got 1."));
}

#[tokio::test]
async fn test_raw_output_snippet_is_capped() {
    let long = "x".repeat(500);
    let generator = ScriptedGenerator::new(vec![Ok(long)]);
    let strategy = LlmBatchStrategy::new(generator, Taxonomy::default());

    let records = strategy.classify_batch(&texts(&["One."])).await.unwrap();
    let snippet = records[0]
        .justification
        .split("Raw output: ")
        .nth(1)
        .unwrap();
    assert_eq!(snippet, format!("{}...", "x".repeat(200)));
}

#[tokio::test]
async fn test_generator_error_falls_back() {
    let generator = ScriptedGenerator::new(vec![Err(LlmError::Connection(
        "connection refused".to_string(),
    ))]);
    let strategy = LlmBatchStrategy::new(generator, Taxonomy::default());

    let records = strategy
        .classify_batch(&texts(&["First.", "Second."]))
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(
        records[1].justification,
        "Error: Connection error: connection refused"
    );
}

#[tokio::test]
async fn test_empty_batch_makes_no_call() {
    let generator = ScriptedGenerator::new(vec![]);
    let requests = generator.requests.clone();
    let strategy = LlmBatchStrategy::new(generator, Taxonomy::default());
    let records = strategy.classify_batch(&[]).await.unwrap();
    assert!(records.is_empty());
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_echoed_example_then_answer() {
    let generator = ScriptedGenerator::new(vec![Ok(r#"Example format:
[
  {"category": "innovation", "justification": "Discusses novel ideas."},
  {"category": "related_work", "justification": "Discusses prior work."}
]
Answer:
[
  {"category": "limitation", "justification": "Small sample."},
  {"category": "future_work", "justification": "Proposes follow-up."}
]"#
    .to_string())]);
    let strategy = LlmBatchStrategy::new(generator, Taxonomy::default());

    let records = strategy
        .classify_batch(&texts(&[
            "Our sample is small.",
            "We will extend this to video.",
        ]))
        .await
        .unwrap();

    assert_eq!(records[0].category, "limitation");
    assert_eq!(records[1].category, "future_work");
}

#[tokio::test]
async fn test_release_unloads_model() {
    let generator = ScriptedGenerator::new(vec![]);
    let unloaded = generator.unloaded.clone();
    let strategy = LlmBatchStrategy::new(generator, Taxonomy::default());
    strategy.release().await;
    assert!(unloaded.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_reconciled_through_pipeline() {
    let replies = vec![
        Ok(r#"[{"category": "method", "justification": "a"}, {"category": "dataset", "justification": "b"}]"#.to_string()),
        Ok("garbage".to_string()),
        Ok(r#"[{"category": "results", "justification": "c"}]"#.to_string()),
    ];
    let strategy = LlmBatchStrategy::new(ScriptedGenerator::new(replies), Taxonomy::default());
    let sentences: Vec<Sentence> = (0..5)
        .map(|i| Sentence::new(i, format!("Sentence {}.", i)))
        .collect();

    let (output, summary) = BatchReconciler::new(2)
        .run(&strategy, &sentences, None)
        .await;

    assert_eq!(output.len(), 5);
    assert_eq!(summary.none_records, 2);
    assert_eq!(output[0].annotation.category, "method");
    assert_eq!(output[1].annotation.category, "dataset");
    assert!(output[2].annotation.justification.starts_with("Error: Parse error"));
    assert!(output[3].annotation.is_none());
    assert_eq!(output[4].annotation.category, "results");
    assert_eq!(output[4].page_index, 4);
}
