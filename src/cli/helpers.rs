//! Shared helper functions for CLI commands.

use std::path::{Path, PathBuf};

use papermark::config::expand_path;

/// Resolve and validate the input PDF path.
pub fn resolve_pdf(raw: &Path) -> anyhow::Result<PathBuf> {
    let path = expand_path(&raw.to_string_lossy());
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        anyhow::bail!("Not a PDF file: {}", path.display());
    }
    Ok(path)
}

/// `<dir>/<stem><suffix>.pdf` next to the input.
pub fn default_output(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}{}.pdf", stem, suffix))
}
