//! Locates and parses the `ytInitialData` blob embedded in a rendered page.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ScraperError;

/// `ytInitialData = {` or `window["ytInitialData"] = {`; bare mentions of the
/// name (feature checks and the like) do not match.
static INITIAL_DATA_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"ytInitialData"?\]?\s*=\s*\{"#).expect("valid initial data regex")
});

/// Parses the initial-data JSON out of `payload`.
///
/// A payload that is already a JSON document is parsed as-is. Otherwise the
/// object assigned to `ytInitialData` is parsed; the script text after it
/// (`;</script>` and friends) is ignored.
///
/// # Errors
///
/// - [`ScraperError::InitialDataMissing`] if no object is assigned to
///   `ytInitialData`.
/// - [`ScraperError::Deserialize`] if the blob is not valid JSON.
pub fn extract_initial_data(payload: &str, context: &str) -> Result<Value, ScraperError> {
    let trimmed = payload.trim_start();
    let blob = if trimmed.starts_with('{') {
        trimmed
    } else {
        let assignment = INITIAL_DATA_ASSIGNMENT
            .find(payload)
            .ok_or_else(|| missing(context))?;
        // The match ends just past the opening brace.
        &payload[assignment.end() - 1..]
    };

    let mut stream = serde_json::Deserializer::from_str(blob).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(source)) => Err(ScraperError::Deserialize {
            context: format!("initial data from {context}"),
            source,
        }),
        None => Err(missing(context)),
    }
}

fn missing(context: &str) -> ScraperError {
    ScraperError::InitialDataMissing {
        context: context.to_owned(),
    }
}
