//! Classification commands: extract, classify, reconcile, highlight.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use papermark::config::Config;
use papermark::highlight::Highlighter;
use papermark::models::{ReconciledOutput, Sentence};
use papermark::pipeline::{BatchReconciler, ReconcileEvent, ReconcileSummary};
use papermark::strategy::{ClassificationStrategy, LlmBatchStrategy, ZeroShotStrategy};

use super::extract::extract_sentences;
use crate::cli::helpers::{default_output, resolve_pdf};

/// Classify a PDF in contextual batches with a generative LLM.
#[allow(clippy::too_many_arguments)]
pub async fn cmd_llm(
    config: &Config,
    pdf: &Path,
    output: Option<PathBuf>,
    batch_size: Option<usize>,
    endpoint: Option<String>,
    model: Option<String>,
    json: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut llm_config = config.llm.clone();
    if let Some(ref ep) = endpoint {
        llm_config = llm_config.with_endpoint(ep);
    }
    if let Some(ref m) = model {
        llm_config = llm_config.with_model(m);
    }

    let pdf = resolve_pdf(pdf)?;
    let output = output.unwrap_or_else(|| default_output(&pdf, "_annotated_llm"));
    let batch_size = batch_size.unwrap_or(llm_config.batch_size);

    let strategy = LlmBatchStrategy::from_config(&llm_config, config.taxonomy.clone())?;
    if !strategy.is_available().await {
        println!("{} {}", style("✗").red(), strategy.availability_hint());
        return Ok(());
    }
    println!(
        "{} Connected to LLM at {} (model: {})",
        style("✓").green(),
        strategy.llm_config().endpoint,
        strategy.llm_config().model
    );

    run_pipeline(config, &strategy, &pdf, &output, batch_size, json).await
}

/// Classify a PDF one sentence at a time with the zero-shot scorer.
pub async fn cmd_zero_shot(
    config: &Config,
    pdf: &Path,
    output: Option<PathBuf>,
    batch_size: Option<usize>,
    model: Option<String>,
    json: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut zs_config = config.zero_shot.clone();
    if let Some(ref m) = model {
        zs_config = zs_config.with_model(m);
    }

    let pdf = resolve_pdf(pdf)?;
    let output = output.unwrap_or_else(|| default_output(&pdf, "_sentence_annotated"));
    let batch_size = batch_size.unwrap_or(zs_config.batch_size);

    let strategy = ZeroShotStrategy::from_config(&zs_config, &config.taxonomy)?;
    if !strategy.is_available().await {
        println!("{} {}", style("✗").red(), strategy.availability_hint());
        return Ok(());
    }
    println!(
        "{} Using embedding model {} at {}",
        style("✓").green(),
        strategy.zero_shot_config().model,
        strategy.zero_shot_config().endpoint
    );

    run_pipeline(config, &strategy, &pdf, &output, batch_size, json).await
}

async fn run_pipeline(
    config: &Config,
    strategy: &dyn ClassificationStrategy,
    pdf: &Path,
    output: &Path,
    batch_size: usize,
    json: Option<PathBuf>,
) -> anyhow::Result<()> {
    println!(
        "{} Extracting sentences from {}",
        style("→").cyan(),
        pdf.display()
    );
    let sentences = extract_sentences(config, pdf).await?;
    if sentences.is_empty() {
        println!("{} No valid sentences found", style("!").yellow());
        return Ok(());
    }
    println!(
        "{} Found {} valid sentences",
        style("✓").green(),
        sentences.len()
    );

    let (entries, summary) = classify(strategy, &sentences, batch_size).await;
    strategy.release().await;

    if let Some(json_path) = json {
        let body = serde_json::to_string_pretty(&entries)?;
        tokio::fs::write(&json_path, body).await?;
        println!(
            "{} Wrote annotations to {}",
            style("✓").green(),
            json_path.display()
        );
    }

    print_summary(&summary);

    println!("{} Adding highlights", style("→").cyan());
    let highlighter = Highlighter::new(config.taxonomy.clone(), config.highlight.clone());
    let (input, out) = (pdf.to_path_buf(), output.to_path_buf());
    let report =
        tokio::task::spawn_blocking(move || highlighter.highlight(&input, &out, &entries))
            .await??;

    println!(
        "{} Highlighted {} sentences ({} not found, {} unlabeled)",
        style("✓").green(),
        report.highlighted,
        report.not_found,
        report.skipped_none
    );
    println!(
        "{} Saved annotated PDF to {}",
        style("✓").green(),
        output.display()
    );
    Ok(())
}

/// Run the reconciler with a progress bar driven by its events.
async fn classify(
    strategy: &dyn ClassificationStrategy,
    sentences: &[Sentence],
    batch_size: usize,
) -> (ReconciledOutput, ReconcileSummary) {
    let (event_tx, mut event_rx) = mpsc::channel::<ReconcileEvent>(100);

    let pb = Arc::new(tokio::sync::Mutex::new(None::<ProgressBar>));
    let pb_clone = pb.clone();
    let label = strategy.display_name().to_string();

    // Spawn event handler for UI
    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                ReconcileEvent::Started {
                    total_sentences, ..
                } => {
                    let progress = ProgressBar::new(total_sentences as u64);
                    progress.set_style(
                        ProgressStyle::default_bar()
                            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                            .unwrap_or_else(|_| ProgressStyle::default_bar())
                            .progress_chars("█▓░"),
                    );
                    progress.set_message(label.clone());
                    *pb_clone.lock().await = Some(progress);
                }
                ReconcileEvent::BatchStarted { index, .. } => {
                    if let Some(ref progress) = *pb_clone.lock().await {
                        progress.set_message(format!("{} (batch {})", label, index + 1));
                    }
                }
                ReconcileEvent::BatchCompleted { size, .. } => {
                    if let Some(ref progress) = *pb_clone.lock().await {
                        progress.inc(size as u64);
                    }
                }
                ReconcileEvent::BatchFailed { size, error, .. } => {
                    if let Some(ref progress) = *pb_clone.lock().await {
                        progress.println(format!("{} {}", style("✗").red(), error));
                        progress.inc(size as u64);
                    }
                }
                ReconcileEvent::BatchRepaired {
                    index,
                    expected,
                    got,
                } => {
                    if let Some(ref progress) = *pb_clone.lock().await {
                        progress.println(format!(
                            "{} Batch {} returned {} of {} results, padded",
                            style("!").yellow(),
                            index + 1,
                            got,
                            expected
                        ));
                        progress.inc(expected as u64);
                    }
                }
                ReconcileEvent::Complete { .. } => {
                    if let Some(ref progress) = *pb_clone.lock().await {
                        progress.finish_and_clear();
                    }
                    *pb_clone.lock().await = None;
                }
            }
        }
    });

    let reconciler = BatchReconciler::new(batch_size);
    let result = reconciler.run(strategy, sentences, Some(event_tx)).await;

    // Wait for event handler to finish
    let _ = event_handler.await;
    result
}

fn print_summary(summary: &ReconcileSummary) {
    println!(
        "{} Classified {} sentences in {} batches",
        style("✓").green(),
        summary.sentences,
        summary.batches
    );
    if summary.failed_batches > 0 || summary.repaired_batches > 0 {
        println!(
            "  {} {} batches failed, {} repaired",
            style("!").yellow(),
            summary.failed_batches,
            summary.repaired_batches
        );
    }
    println!(
        "  {} {} sentences labeled none",
        style("→").dim(),
        summary.none_records
    );
}
