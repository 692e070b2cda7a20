//! Sentence extraction command.

use std::io::Write;
use std::path::Path;

use console::style;

use papermark::config::Config;
use papermark::extract::{PdfTextExtractor, SentenceExtractor};
use papermark::models::Sentence;

use crate::cli::helpers::resolve_pdf;

/// Extract sentences off the async runtime.
pub async fn extract_sentences(config: &Config, pdf: &Path) -> anyhow::Result<Vec<Sentence>> {
    let extractor = PdfTextExtractor::new(config.extraction.clone());
    if !extractor.is_available() {
        anyhow::bail!("pdftotext not found. Install poppler-utils.");
    }
    let path = pdf.to_path_buf();
    let sentences = tokio::task::spawn_blocking(move || extractor.extract(&path)).await??;
    Ok(sentences)
}

/// Print the extracted sentence stream as JSON lines.
pub async fn cmd_extract(config: &Config, pdf: &Path) -> anyhow::Result<()> {
    let pdf = resolve_pdf(pdf)?;
    let sentences = extract_sentences(config, &pdf).await?;

    if sentences.is_empty() {
        eprintln!("{} No valid sentences found", style("!").yellow());
        return Ok(());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for sentence in &sentences {
        writeln!(out, "{}", serde_json::to_string(sentence)?)?;
    }
    eprintln!(
        "{} {} sentences extracted",
        style("✓").green(),
        sentences.len()
    );
    Ok(())
}
