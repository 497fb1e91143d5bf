//! JSON rendering of command results.
//!
//! Every command prints one object with a `success` flag. On success the
//! report's fields sit next to it; on failure an `error` message and the
//! error's source chain do.

use serde::Serialize;

use crate::error::{Error, Result};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// A successful report, flattened next to `"success": true`.
#[derive(Debug, Serialize)]
pub struct Success<'a, T: Serialize> {
    success: bool,
    #[serde(flatten)]
    report: &'a T,
}

impl<'a, T: Serialize> Success<'a, T> {
    pub fn new(report: &'a T) -> Self {
        Self {
            success: true,
            report,
        }
    }
}

/// A failed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl Failure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: Vec::new(),
        }
    }

    pub fn from_error(err: &Error) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            details: err.source_chain(),
        }
    }
}

/// Serialize any value in the given format.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value)?,
        JsonFormat::Compact => serde_json::to_string(value)?,
    };
    Ok(json)
}

/// `{"success": true, ...report}`
pub fn success_json<T: Serialize>(report: &T, format: JsonFormat) -> Result<String> {
    to_json(&Success::new(report), format)
}

/// `{"success": false, "error": ..., "details": [...]}`
pub fn failure_json(failure: &Failure, format: JsonFormat) -> String {
    // A struct of strings always serializes
    to_json(failure, format).unwrap_or_else(|_| {
        format!(
            "{{\"success\": false, \"error\": {:?}}}",
            failure.error
        )
    })
}

/// Render a command outcome.
pub fn outcome_json<T: Serialize>(outcome: &Result<T>, format: JsonFormat) -> String {
    match outcome {
        Ok(report) => success_json(report, format)
            .unwrap_or_else(|e| failure_json(&Failure::from_error(&e), format)),
        Err(e) => failure_json(&Failure::from_error(e), format),
    }
}
