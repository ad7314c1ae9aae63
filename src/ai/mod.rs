// src/ai/mod.rs
//
// The boundary between untrusted AI text and typed application data.
// Raw model output passes through extract -> repair -> validate and only
// ever yields a fully typed value or a classified error.

pub mod client;
pub mod extract;
pub mod prompt;
pub mod research;
pub mod schema;

use std::fmt;

/// Failures at the AI boundary, classified for diagnostics.
/// All of them surface to the client as the same retryable error.
#[derive(Debug)]
pub enum AiError {
    /// Transport, auth, or rate-limit failure on an outbound call.
    Transport(String),
    /// The model returned a 2xx but no usable content.
    EmptyResponse,
    /// The extractor exhausted its repairs, or the validator found a
    /// structurally required field missing or out of range.
    Malformed(String),
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiError::Transport(msg) => write!(f, "AI transport error: {}", msg),
            AiError::EmptyResponse => write!(f, "AI returned empty content"),
            AiError::Malformed(msg) => write!(f, "malformed AI response: {}", msg),
        }
    }
}

impl std::error::Error for AiError {}
