//! Prediction types: the result signal, its sink, the classifier seam, and errors.

use serde::Serialize;

/// User-facing message when the endpoint answers without a usable label.
pub const UNEXPECTED_RESPONSE: &str = "Unexpected response from server";
/// User-facing message for transport, status, and decoding failures.
pub const PREDICTION_FAILED: &str = "Failed to get prediction";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The endpoint returned a non-success HTTP status.
    #[error("response error: status {status}")]
    Status { status: u16, body: String },

    /// The response body is not JSON.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The response is JSON but carries no prediction label.
    #[error("response has no prediction label")]
    MissingLabel,
}

impl PredictError {
    /// The message surfaced to the user for this failure.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingLabel => UNEXPECTED_RESPONSE,
            _ => PREDICTION_FAILED,
        }
    }
}

// =============================================================================
// SIGNAL
// =============================================================================

/// Three-valued prediction state reported to the host.
///
/// At most one of `label`, `error`, `loading` is set. Build values through
/// the constructors to keep it that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionSignal {
    pub label: Option<String>,
    pub error: Option<String>,
    pub loading: bool,
}

impl PredictionSignal {
    /// Request in flight.
    #[must_use]
    pub fn loading() -> Self {
        Self { label: None, error: None, loading: true }
    }

    #[must_use]
    pub fn label(label: impl Into<String>) -> Self {
        Self { label: Some(label.into()), error: None, loading: false }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self { label: None, error: Some(message.into()), loading: false }
    }
}

/// Receives prediction state changes.
pub trait PredictionSink: Send + Sync {
    fn signal(&self, signal: PredictionSignal);
}

impl<F> PredictionSink for F
where
    F: Fn(PredictionSignal) + Send + Sync,
{
    fn signal(&self, signal: PredictionSignal) {
        self(signal);
    }
}

// =============================================================================
// CLASSIFIER
// =============================================================================

/// Turns an encoded image into a label.
#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, payload: Vec<u8>) -> Result<String, PredictError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
