//! Output rendering.

mod json;

pub use json::{failure_json, outcome_json, success_json, to_json, Failure, JsonFormat, Success};
