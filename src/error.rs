//! Error types shared across the crawler, generator and pipeline layers

use thiserror::Error;

use crate::runner::{PipelineArtifacts, Stage};

/// Failures raised by browser interaction while crawling
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Navigation to a URL failed (fatal for the entry page, skipped otherwise)
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// Every locator candidate for a required login control failed
    #[error("no {field} found")]
    LocatorExhausted { field: String },

    /// Browser could not be launched or a browser call failed outright
    #[error("browser error: {0}")]
    Browser(String),
}

/// Failures from the text-generation collaborator
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no API key configured (set QAGEN_API_KEY or GROQ_API_KEY)")]
    MissingApiKey,

    #[error("request to generator failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generator returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("generator returned an empty response")]
    EmptyResponse,

    /// The reply follows the error-string convention instead of carrying content
    #[error("generator reported an error: {0}")]
    ErrorText(String),
}

/// A pipeline stage failed; `partial` holds everything produced before it
#[derive(Debug, Error)]
#[error("stage {stage} failed: {detail}")]
pub struct PipelineFailure {
    pub stage: Stage,
    pub detail: String,
    pub partial: Box<PipelineArtifacts>,
}
