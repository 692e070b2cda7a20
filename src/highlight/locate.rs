//! Locating sentences on a page from `pdftotext -bbox-layout` word boxes.

use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;

use super::HighlightError;
use crate::extract::ExtractionError;

static PAGE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<page\s+width="([\d.]+)"\s+height="([\d.]+)""#).unwrap()
});

/// `<line ...>` openers and `<word ...>text</word>` elements, in document order.
static LINE_OR_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<line\b|<word\s+xMin="([\d.]+)"\s+yMin="([\d.]+)"\s+xMax="([\d.]+)"\s+yMax="([\d.]+)">([^<]*)</word>"#,
    )
    .unwrap()
});

/// One word box, in `pdftotext` coordinates (origin top-left).
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
    /// Index of the text line the word belongs to.
    pub line: usize,
}

/// Word boxes of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub words: Vec<Word>,
    /// Lower-left corner of the page's MediaBox in PDF user space.
    pub origin: (f32, f32),
}

/// Rectangle in PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Quad {
    /// `QuadPoints` order: upper-left, upper-right, lower-left, lower-right.
    pub fn points(&self) -> [f32; 8] {
        [
            self.x0, self.y1, self.x1, self.y1, self.x0, self.y0, self.x1, self.y0,
        ]
    }

    pub fn union(&self, other: &Quad) -> Quad {
        Quad {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// A located sentence: one quad per text line it spans.
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceMatch {
    pub quads: Vec<Quad>,
    /// Index one past the last matched word.
    pub end_word: usize,
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Parse the XHTML written by `pdftotext -bbox-layout` for a single page.
pub fn parse_bbox_layout(xhtml: &str) -> Option<PageLayout> {
    let page = PAGE_TAG.captures(xhtml)?;
    let width: f32 = page[1].parse().ok()?;
    let height: f32 = page[2].parse().ok()?;
    let body = &xhtml[page.get(0)?.end()..];

    let mut words = Vec::new();
    let mut line = 0usize;
    let mut seen_line = false;
    for caps in LINE_OR_WORD.captures_iter(body) {
        let Some(x_min) = caps.get(1) else {
            if seen_line {
                line += 1;
            }
            seen_line = true;
            continue;
        };
        let coord = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f32>().ok());
        let (Some(x_min), Some(y_min), Some(x_max), Some(y_max)) =
            (x_min.as_str().parse().ok(), coord(2), coord(3), coord(4))
        else {
            continue;
        };
        words.push(Word {
            text: unescape(&caps[5]),
            x_min,
            y_min,
            x_max,
            y_max,
            line,
        });
    }

    Some(PageLayout {
        width,
        height,
        words,
        origin: (0.0, 0.0),
    })
}

/// Lowercased alphanumeric content of a token; punctuation is ignored.
fn match_key(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

impl PageLayout {
    /// Place the layout on a page whose MediaBox does not start at `(0, 0)`.
    pub fn with_origin(mut self, origin: (f32, f32)) -> Self {
        self.origin = origin;
        self
    }

    /// Find `sentence` as a contiguous word sequence, searching from `start_word`.
    pub fn locate(&self, sentence: &str, start_word: usize) -> Option<SentenceMatch> {
        let needle: Vec<String> = sentence
            .split_whitespace()
            .map(match_key)
            .filter(|k| !k.is_empty())
            .collect();
        if needle.is_empty() {
            return None;
        }

        // (word index, key) for words with alphanumeric content
        let haystack: Vec<(usize, String)> = self
            .words
            .iter()
            .enumerate()
            .skip(start_word)
            .map(|(i, w)| (i, match_key(&w.text)))
            .filter(|(_, k)| !k.is_empty())
            .collect();
        if haystack.len() < needle.len() {
            return None;
        }

        let start = haystack
            .windows(needle.len())
            .position(|window| window.iter().zip(&needle).all(|((_, k), n)| k == n))?;
        let matched = &haystack[start..start + needle.len()];
        let first = matched.first()?.0;
        let last = matched.last()?.0;

        Some(SentenceMatch {
            quads: self.line_quads(first, last),
            end_word: last + 1,
        })
    }

    /// One quad per line covering words `first..=last`, converted to PDF space.
    fn line_quads(&self, first: usize, last: usize) -> Vec<Quad> {
        let (ox, oy) = self.origin;
        let mut quads: Vec<(usize, Quad)> = Vec::new();
        for word in &self.words[first..=last] {
            let quad = Quad {
                x0: ox + word.x_min,
                y0: oy + self.height - word.y_max,
                x1: ox + word.x_max,
                y1: oy + self.height - word.y_min,
            };
            match quads.last_mut() {
                Some((line, existing)) if *line == word.line => *existing = existing.union(&quad),
                _ => quads.push((word.line, quad)),
            }
        }
        quads.into_iter().map(|(_, q)| q).collect()
    }
}

/// Run `pdftotext -bbox-layout` on one page (1-based) and parse the result.
pub fn read_page_layout(
    binary: &Path,
    pdf: &Path,
    page_number: u32,
) -> Result<PageLayout, HighlightError> {
    let page = page_number.to_string();
    let output = Command::new(binary)
        .args(["-bbox-layout", "-enc", "UTF-8", "-f", &page, "-l", &page])
        .arg(pdf)
        .arg("-")
        .output();

    let xhtml = crate::extract::handle_cmd_output(
        output,
        "pdftotext (install poppler-utils)",
        &format!("pdftotext -bbox-layout failed on page {}", page_number),
    )?;

    parse_bbox_layout(&xhtml).ok_or_else(|| {
        HighlightError::Extraction(ExtractionError::ExtractionFailed(format!(
            "No page layout for page {}",
            page_number
        )))
    })
}
