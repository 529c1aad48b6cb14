//! HTTP classifier: posts the exported image as a single-file multipart form.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::debug;

use super::types::{Classifier, PredictError};
use crate::config::{AppConfig, Timeouts};

pub const FILE_FIELD: &str = "file";
pub const FILE_NAME: &str = "whiteboard.jpg";
pub const FILE_MIME: &str = "image/jpeg";
/// JSON field carrying the label in a successful response.
pub const LABEL_FIELD: &str = "prediction";

pub struct HttpClassifier {
    http: reqwest::Client,
    url: String,
}

impl HttpClassifier {
    /// # Errors
    ///
    /// Returns [`PredictError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(url: impl Into<String>, timeouts: Timeouts) -> Result<Self, PredictError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| PredictError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, url: url.into() })
    }

    /// # Errors
    ///
    /// Returns [`PredictError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn from_config(config: &AppConfig) -> Result<Self, PredictError> {
        Self::new(config.predict_url.clone(), config.timeouts)
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, payload: Vec<u8>) -> Result<String, PredictError> {
        let bytes = payload.len();
        let part = Part::bytes(payload)
            .file_name(FILE_NAME)
            .mime_str(FILE_MIME)
            .map_err(|e| PredictError::Request(e.to_string()))?;
        let form = Form::new().part(FILE_FIELD, part);

        debug!(url = %self.url, bytes, "submitting prediction request");
        let response = self
            .http
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PredictError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PredictError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(PredictError::Status { status: status.as_u16(), body: text });
        }
        parse_prediction(&text)
    }
}

/// Extract the label from a response body.
///
/// Strings and numbers are accepted as labels; an empty string, `null`, or
/// a missing field is [`PredictError::MissingLabel`].
///
/// # Errors
///
/// Returns [`PredictError::Parse`] when the body is not JSON.
pub fn parse_prediction(text: &str) -> Result<String, PredictError> {
    let value: Value = serde_json::from_str(text).map_err(|e| PredictError::Parse(e.to_string()))?;
    match value.get(LABEL_FIELD) {
        Some(Value::String(label)) if !label.is_empty() => Ok(label.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(PredictError::MissingLabel),
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
