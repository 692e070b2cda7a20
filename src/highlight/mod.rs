//! PDF highlighting of reconciled sentences.
//!
//! Each non-`"none"` entry is located on its page from `pdftotext -bbox-layout`
//! word boxes and written as a Highlight annotation whose title is the
//! category and whose contents is the justification.

mod locate;
mod writer;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::extract::{find_pdftotext, ExtractionError};
use crate::labels::Taxonomy;
use crate::models::ReconciledEntry;

pub use locate::{parse_bbox_layout, read_page_layout, PageLayout, Quad, SentenceMatch, Word};
pub use writer::{add_highlight, media_box_origin, HighlightAnnotation};

/// Errors that can occur while writing highlights.
#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Failed to save {path}: {message}")]
    Save { path: PathBuf, message: String },

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Highlighter settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// Explicit path to `pdftotext` (searched on PATH otherwise)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdftotext_path: Option<String>,
    /// Skip stream compression when saving
    #[serde(default)]
    pub no_compress: bool,
}

/// Outcome counts of a highlighting pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HighlightReport {
    pub highlighted: usize,
    pub skipped_none: usize,
    pub not_found: usize,
}

/// Writes category highlights into a copy of the source PDF.
pub struct Highlighter {
    taxonomy: Taxonomy,
    config: HighlightConfig,
    binary: PathBuf,
}

/// Per-page layout plus the word after the previous match.
///
/// `layout` is `None` when the page's word boxes could not be read.
struct PageCursor {
    layout: Option<PageLayout>,
    next_word: usize,
}

impl Highlighter {
    pub fn new(taxonomy: Taxonomy, config: HighlightConfig) -> Self {
        let binary = find_pdftotext(config.pdftotext_path.as_deref())
            .unwrap_or_else(|| PathBuf::from("pdftotext"));
        Self {
            taxonomy,
            config,
            binary,
        }
    }

    /// Highlight `entries` in `input` and save the result to `output`.
    pub fn highlight(
        &self,
        input: &Path,
        output: &Path,
        entries: &[ReconciledEntry],
    ) -> Result<HighlightReport, HighlightError> {
        let mut doc = lopdf::Document::load(input)?;
        let pages = doc.get_pages();
        let mut cursors: HashMap<u32, PageCursor> = HashMap::new();
        let mut report = HighlightReport::default();

        for entry in entries {
            if entry.annotation.is_none() {
                report.skipped_none += 1;
                continue;
            }

            let page_number = entry.page_index as u32 + 1;
            let Some(&page_id) = pages.get(&page_number) else {
                warn!(
                    "Page {} out of range ({} pages), skipping sentence",
                    page_number,
                    pages.len()
                );
                report.not_found += 1;
                continue;
            };

            let cursor = match cursors.entry(page_number) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => {
                    let layout = match read_page_layout(&self.binary, input, page_number) {
                        Ok(layout) => Some(layout.with_origin(media_box_origin(&doc, page_id))),
                        Err(err) => {
                            warn!("Skipping highlights on page {}: {}", page_number, err);
                            None
                        }
                    };
                    e.insert(PageCursor {
                        layout,
                        next_word: 0,
                    })
                }
            };
            let Some(ref layout) = cursor.layout else {
                report.not_found += 1;
                continue;
            };

            // Sentences arrive in reading order; retry from the top for out-of-order text
            let found = layout
                .locate(&entry.text, cursor.next_word)
                .or_else(|| layout.locate(&entry.text, 0));
            let Some(found) = found else {
                warn!(
                    "Could not find sentence on page {}: '{}...'",
                    page_number,
                    entry.text.chars().take(50).collect::<String>()
                );
                report.not_found += 1;
                continue;
            };
            cursor.next_word = found.end_word;

            let category = &entry.annotation.category;
            let added = add_highlight(
                &mut doc,
                page_id,
                &HighlightAnnotation {
                    quads: &found.quads,
                    color: self.taxonomy.color_for(category),
                    title: category,
                    contents: &entry.annotation.justification,
                },
            )?;
            if added.is_some() {
                report.highlighted += 1;
            } else {
                report.not_found += 1;
            }
        }

        if !self.config.no_compress {
            doc.compress();
        }
        doc.save(output).map_err(|e| HighlightError::Save {
            path: output.to_path_buf(),
            message: e.to_string(),
        })?;

        debug!("Highlight report: {:?}", report);
        info!(
            "Saved {} highlights to {}",
            report.highlighted,
            output.display()
        );
        Ok(report)
    }
}
