//! Parsing of model answers.
//!
//! Models wrap JSON in markdown fences and leave fields out, so parsing is
//! forgiving: missing fields take defaults, out-of-range values are clamped.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{HeadingEntry, ImageClassification};

/// Remove a surrounding ```/```json fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.strip_prefix("json").unwrap_or(rest);
        text = text.strip_suffix("```").unwrap_or(text);
    }
    text.trim()
}

/// Parse an enhanced classification answer.
pub fn parse_classification(text: &str) -> Result<ImageClassification> {
    let value: Value = serde_json::from_str(strip_code_fences(text))?;
    let Value::Object(obj) = value else {
        return Err(Error::ModelResponse(
            "classification is not a JSON object".to_string(),
        ));
    };

    let relevance_score = obj
        .get("relevance_score")
        .and_then(Value::as_f64)
        .map(|s| s.round().clamp(0.0, ImageClassification::MAX_SCORE as f64) as u8)
        .unwrap_or(ImageClassification::DEFAULT_SCORE);

    let tags = obj
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .take(ImageClassification::MAX_TAGS)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(ImageClassification {
        is_important: obj
            .get("is_important")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        image_type: obj
            .get("image_type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        description: obj
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        relevance_score,
        tags,
    })
}

/// Parse a heading list: a JSON array, or an object with a `headings` array.
///
/// Entries without a heading or a start page are skipped.
pub fn parse_headings(text: &str) -> Result<Vec<HeadingEntry>> {
    let value: Value = serde_json::from_str(strip_code_fences(text))?;
    let entries = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("headings") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::ModelResponse(
                    "expected a JSON array of headings".to_string(),
                ))
            }
        },
        _ => {
            return Err(Error::ModelResponse(
                "expected a JSON array of headings".to_string(),
            ))
        }
    };

    let mut headings = Vec::with_capacity(entries.len());
    for entry in entries {
        let heading = entry
            .get("heading")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|h| !h.is_empty());
        let start_page = entry.get("start_page").and_then(as_page);

        let (Some(heading), Some(start_page)) = (heading, start_page) else {
            log::warn!("Skipping malformed heading entry: {}", entry);
            continue;
        };

        let level = entry
            .get("level")
            .and_then(Value::as_u64)
            .map(|l| l.clamp(1, u8::MAX as u64) as u8)
            .unwrap_or(1);
        let context = entry
            .get("context")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let mut entry = HeadingEntry::new(heading, level, start_page);
        entry.context = context.to_string();
        headings.push(entry);
    }

    Ok(headings)
}

/// Page numbers arrive as integers, floats or numeric strings.
fn as_page(value: &Value) -> Option<u32> {
    let page: Option<u64> = match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    page.filter(|p| *p > 0)
        .map(|p| p.min(u32::MAX as u64) as u32)
}
