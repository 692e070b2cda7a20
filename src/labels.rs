//! Category taxonomy shared by prompt building, zero-shot labels, and highlight colors.
//!
//! The taxonomy is a single value passed explicitly to every consumer so the
//! label set and the palette cannot drift apart.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Sentinel category for sentences that should not be highlighted.
pub const NONE_CATEGORY: &str = "none";

/// Color used for categories missing from the palette.
pub const DEFAULT_COLOR: Rgb = Rgb(0.8, 0.8, 0.8);

/// RGB color with components in `0.0..=1.0` (PDF `DeviceRGB`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    /// Hex representation (`#RRGGBB`) for display.
    pub fn to_hex(self) -> String {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02X}{:02X}{:02X}", c(self.0), c(self.1), c(self.2))
    }
}

/// One category of the taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Normalized key (`related_work`), used in model output and annotation titles.
    pub key: String,
    /// Short description shown to the generative model.
    pub description: String,
    /// Highlight color.
    pub color: Rgb,
}

impl Category {
    fn new(key: &str, description: &str, color: Rgb) -> Self {
        Self {
            key: key.to_string(),
            description: description.to_string(),
            color,
        }
    }

    /// Human-readable label (`related work`) used in zero-shot hypotheses.
    pub fn label(&self) -> String {
        self.key.replace('_', " ")
    }
}

/// The closed category set plus the `"none"` sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,
    /// Description of the `"none"` sentinel shown to the generative model.
    #[serde(default = "default_none_description")]
    pub none_description: String,
    /// Fallback highlight color for unknown categories.
    #[serde(default = "default_color")]
    pub default_color: Rgb,
}

fn default_categories() -> Vec<Category> {
    vec![
        Category::new(
            "innovation",
            "novel ideas, key claims, originality, improvements",
            Rgb(0.65, 0.30, 0.95),
        ),
        Category::new(
            "related_work",
            "prior work, comparisons, literature discussion",
            Rgb(0.45, 0.60, 0.80),
        ),
        Category::new(
            "reason",
            "explanations or conceptual reasoning",
            Rgb(0.30, 0.80, 0.90),
        ),
        Category::new(
            "method",
            "approaches, architectures, algorithms, or procedural descriptions",
            Rgb(0.15, 0.45, 0.85),
        ),
        Category::new(
            "dataset",
            "data details, collection process, benchmarks used",
            Rgb(0.00, 0.65, 0.65),
        ),
        Category::new(
            "results",
            "performance analysis, metrics, evaluation",
            Rgb(0.20, 0.75, 0.30),
        ),
        Category::new(
            "limitation",
            "shortcomings, weaknesses, challenges",
            Rgb(0.95, 0.25, 0.25),
        ),
        Category::new(
            "future_work",
            "suggestions, open directions, next steps",
            Rgb(1.00, 0.60, 0.20),
        ),
    ]
}

fn default_none_description() -> String {
    "irrelevant or general statements".to_string()
}

fn default_color() -> Rgb {
    DEFAULT_COLOR
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            none_description: default_none_description(),
            default_color: default_color(),
        }
    }
}

impl Taxonomy {
    /// Look up a category by key (after normalization).
    pub fn get(&self, key: &str) -> Option<&Category> {
        let key = normalize_category(key);
        self.categories.iter().find(|c| c.key == key)
    }

    /// Whether `key` is a taxonomy member or the `"none"` sentinel.
    pub fn contains(&self, key: &str) -> bool {
        let key = normalize_category(key);
        key == NONE_CATEGORY || self.categories.iter().any(|c| c.key == key)
    }

    /// Labels offered to the zero-shot classifier: every category, then `"none"`.
    pub fn zero_shot_labels(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(Category::label)
            .chain(std::iter::once(NONE_CATEGORY.to_string()))
            .collect()
    }

    /// Highlight color for a category; unknown categories get the default with a warning.
    pub fn color_for(&self, key: &str) -> Rgb {
        match self.get(key) {
            Some(cat) => cat.color,
            None => {
                warn!(
                    "No color defined for category '{}', using {}",
                    key,
                    self.default_color.to_hex()
                );
                self.default_color
            }
        }
    }
}

/// Normalize a category as emitted by a model: lowercase, spaces/hyphens to underscores.
pub fn normalize_category(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category("Related Work"), "related_work");
        assert_eq!(normalize_category(" future-work "), "future_work");
        assert_eq!(normalize_category("results"), "results");
        assert_eq!(normalize_category("NONE"), "none");
    }

    #[test]
    fn test_zero_shot_labels_end_with_none() {
        let taxonomy = Taxonomy::default();
        let labels = taxonomy.zero_shot_labels();
        assert_eq!(labels.len(), taxonomy.categories.len() + 1);
        assert_eq!(labels.last().map(String::as_str), Some("none"));
        assert!(labels.contains(&"related work".to_string()));
    }

    #[test]
    fn test_color_lookup() {
        let taxonomy = Taxonomy::default();
        assert_eq!(taxonomy.color_for("method"), Rgb(0.15, 0.45, 0.85));
        assert_eq!(taxonomy.color_for("related work"), Rgb(0.45, 0.60, 0.80));
        assert_eq!(taxonomy.color_for("methodology"), DEFAULT_COLOR);
    }

    #[test]
    fn test_contains_sentinel() {
        let taxonomy = Taxonomy::default();
        assert!(taxonomy.contains("none"));
        assert!(taxonomy.contains("Limitation"));
        assert!(!taxonomy.contains("conclusion"));
    }

    #[test]
    fn test_hex() {
        assert_eq!(Rgb(1.0, 0.6, 0.2).to_hex(), "#FF9933");
    }
}
