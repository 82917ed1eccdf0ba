//! Summarization service seam.
//!
//! The pipeline only ever talks to a [`Summarizer`]; the OpenAI-compatible
//! client in [`openai`] is the production implementation.

pub mod openai;
pub mod prompt;

pub use openai::OpenAiSummarizer;

use thiserror::Error;

/// One completion call: a system message, a user prompt, and sampling options.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub temperature: Option<f32>,
}

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("response contained no message content")]
    EmptyResponse,

    #[error("malformed API response: {0}")]
    MalformedResponse(String),
}

/// External capability that turns a prompt into (hopefully) structured text.
pub trait Summarizer {
    fn model(&self) -> &str;
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, SummarizeError>;
}
