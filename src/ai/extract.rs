// src/ai/extract.rs

use std::sync::LazyLock;

use regex::Regex;

use super::AiError;

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap());
static ANY_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```\s*(.*?)\s*```").unwrap());

/// Isolates and parses the JSON payload inside arbitrary model output.
///
/// Candidate selection: a fenced block tagged `json`, else any fenced
/// block, else the raw text. The candidate is parsed strictly first; if
/// that fails, a bounded repair pass runs and parsing is retried exactly
/// once. A second failure is terminal here; retrying is the caller's
/// (i.e. the user's) decision.
pub fn extract_json(raw: &str) -> Result<serde_json::Value, AiError> {
    let candidate = JSON_FENCE
        .captures(raw)
        .or_else(|| ANY_FENCE.captures(raw))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw)
        .trim();

    match serde_json::from_str(candidate) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            let repaired = repair(candidate);
            serde_json::from_str(&repaired).map_err(|_| {
                AiError::Malformed(format!("unparseable even after repair: {}", first_err))
            })
        }
    }
}

static TRAILING_COMMA_BRACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*\}").unwrap());
static TRAILING_COMMA_BRACKET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*\]").unwrap());

/// The common AI formatting slips, fixed in a fixed order. Deliberately
/// not a general-purpose malformed-JSON parser.
fn repair(candidate: &str) -> String {
    let fixed = TRAILING_COMMA_BRACE.replace_all(candidate, "}");
    let fixed = TRAILING_COMMA_BRACKET.replace_all(&fixed, "]");
    fixed.replace('\'', "\"").replace(['\n', '\t'], " ")
}
