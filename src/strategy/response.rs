//! Parsing of contextual-batch model output into annotation records.
//!
//! The model is asked for a JSON list but free text around it is common, and
//! models sometimes echo the example array from the prompt before answering.
//! Every `[ {` position outside an already parsed value is a candidate: one
//! JSON value is parsed from there with a streaming deserializer, and the last
//! candidate that passes every validation gate wins.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::models::Annotation;

static ARRAY_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\s*\{").unwrap());

/// Why a batch response was rejected.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("No JSON array found in the response.")]
    NoArray,

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("Response is not a list.")]
    NotAList,

    #[error("Expected {expected} items, but got {got}.")]
    LengthMismatch { expected: usize, got: usize },

    #[error("List item {index} is not a valid dictionary with required keys.")]
    InvalidItem { index: usize },
}

/// Extract and validate the answer array for a batch of `expected` sentences.
///
/// When no candidate validates, the error of the last candidate is returned.
pub fn parse_batch_response(text: &str, expected: usize) -> Result<Vec<Annotation>, ResponseError> {
    let mut accepted = None;
    let mut last_err = ResponseError::NoArray;
    let mut consumed_until = 0;

    for m in ARRAY_START.find_iter(text) {
        if m.start() < consumed_until {
            continue;
        }
        let mut stream = serde_json::Deserializer::from_str(&text[m.start()..]).into_iter::<Value>();
        let value = match stream.next() {
            Some(Ok(value)) => value,
            Some(Err(e)) => {
                last_err = ResponseError::Json(e);
                continue;
            }
            None => continue,
        };
        consumed_until = m.start() + stream.byte_offset();

        match validate(value, expected) {
            Ok(records) => accepted = Some(records),
            Err(e) => last_err = e,
        }
    }

    accepted.ok_or(last_err)
}

fn validate(value: Value, expected: usize) -> Result<Vec<Annotation>, ResponseError> {
    let Value::Array(items) = value else {
        return Err(ResponseError::NotAList);
    };
    if items.len() != expected {
        return Err(ResponseError::LengthMismatch {
            expected,
            got: items.len(),
        });
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| to_annotation(item).ok_or(ResponseError::InvalidItem { index }))
        .collect()
}

fn to_annotation(item: &Value) -> Option<Annotation> {
    let obj = item.as_object()?;
    let category = obj.get("category")?.as_str()?;
    let justification = obj.get("justification")?.as_str()?;

    let mut record = Annotation::new(category, justification);
    if let Some(confidence) = obj.get("confidence").and_then(Value::as_f64) {
        record = record.with_confidence(confidence as f32);
    }
    if let Some(evidence) = obj.get("evidence").and_then(Value::as_array) {
        let evidence: Vec<String> = evidence
            .iter()
            .filter_map(|e| e.as_str().map(str::to_string))
            .collect();
        if !evidence.is_empty() {
            record = record.with_evidence(evidence);
        }
    }
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_array() {
        let text = r#"[{"category": "method", "justification": "Describes the model."},
                       {"category": "results", "justification": "Reports accuracy."}]"#;
        let records = parse_batch_response(text, 2).unwrap();
        assert_eq!(records[0].category, "method");
        assert_eq!(records[1].justification, "Reports accuracy.");
    }

    #[test]
    fn test_surrounding_prose_and_fences() {
        let text = "Sure! Here is the labeling:\n```json\n[\n  {\"category\": \"Related Work\", \"justification\": \"Cites prior work.\"}\n]\n```\nLet me know.";
        let records = parse_batch_response(text, 1).unwrap();
        assert_eq!(records[0].category, "related_work");
    }

    #[test]
    fn test_echoed_example_is_skipped() {
        let text = r#"Example output: [ {"category": "method", "justification": "x"}, {"category": "dataset", "justification": "y"} ]
Answer:
[{"category": "limitation", "justification": "Weakness."}, {"category": "none", "justification": "Boilerplate."}, {"category": "results", "justification": "Metric."}]"#;
        let records = parse_batch_response(text, 3).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].category, "limitation");
    }

    #[test]
    fn test_echoed_example_of_same_length_is_skipped() {
        let text = r#"Example format: [{"category": "method", "justification": "a"}]
[{"category": "results", "justification": "b"}]"#;
        let records = parse_batch_response(text, 1).unwrap();
        assert_eq!(records[0].category, "results");
    }

    #[test]
    fn test_valid_answer_before_trailing_garbage() {
        let text = r#"[{"category": "results", "justification": "b"}] and [{"broken"#;
        let records = parse_batch_response(text, 1).unwrap();
        assert_eq!(records[0].category, "results");
    }

    #[test]
    fn test_nested_candidate_not_reparsed() {
        let text = r#"[{"category": "method", "justification": "see [{x}]", "evidence": [{"k": 1}]}]"#;
        let records = parse_batch_response(text, 1).unwrap();
        assert_eq!(records[0].category, "method");
        assert!(records[0].evidence.is_none());
    }

    #[test]
    fn test_no_array() {
        let err = parse_batch_response("I cannot help with that.", 2).unwrap_err();
        assert!(matches!(err, ResponseError::NoArray));
        assert_eq!(err.to_string(), "No JSON array found in the response.");
    }

    #[test]
    fn test_length_mismatch_reported() {
        let text = r#"[{"category": "method", "justification": "a"}]"#;
        let err = parse_batch_response(text, 2).unwrap_err();
        assert_eq!(err.to_string(), "Expected 2 items, but got 1.");
    }

    #[test]
    fn test_missing_key_rejects_batch() {
        let text = r#"[{"category": "method", "justification": "a"}, {"category": "results"}]"#;
        let err = parse_batch_response(text, 2).unwrap_err();
        assert!(matches!(err, ResponseError::InvalidItem { index: 1 }));
    }

    #[test]
    fn test_truncated_json() {
        let text = r#"[{"category": "method", "justification": "cut off"#;
        let err = parse_batch_response(text, 1).unwrap_err();
        assert!(matches!(err, ResponseError::Json(_)));
    }

    #[test]
    fn test_brackets_inside_strings() {
        let text = r#"[{"category": "method", "justification": "Uses [1] and {x}]"}]"#;
        let records = parse_batch_response(text, 1).unwrap();
        assert_eq!(records[0].justification, "Uses [1] and {x}]");
    }

    #[test]
    fn test_optional_fields_kept() {
        let text = r#"[{"category": "results", "justification": "j", "confidence": 0.75, "evidence": ["acc 91%"]}]"#;
        let records = parse_batch_response(text, 1).unwrap();
        assert_eq!(records[0].confidence, Some(0.75));
        assert_eq!(records[0].evidence.as_deref(), Some(&["acc 91%".to_string()][..]));
    }
}
