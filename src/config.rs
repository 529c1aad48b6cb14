//! Whiteboard configuration parsed from environment variables.
//!
//! Every value has a default, so an empty environment yields a usable
//! config. Values that are present but malformed are rejected rather than
//! silently replaced by the default.

use std::str::FromStr;

pub const DEFAULT_PREDICT_URL: &str = "http://localhost:5000/predict";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_JPEG_QUALITY: u8 = 90;
pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but does not parse as the expected type.
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    /// A variable parsed but falls outside its allowed range.
    #[error("{key} out of range: {reason}")]
    OutOfRange { key: &'static str, reason: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Classification endpoint receiving the exported JPEG.
    pub predict_url: String,
    pub timeouts: Timeouts,
    /// JPEG quality for prediction payloads, 1..=100.
    pub jpeg_quality: u8,
    /// Initial canvas size.
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            predict_url: DEFAULT_PREDICT_URL.to_string(),
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl AppConfig {
    /// Build the config from environment variables.
    ///
    /// - `WHITEBOARD_PREDICT_URL`: default `http://localhost:5000/predict`
    /// - `WHITEBOARD_REQUEST_TIMEOUT_SECS`: default 30
    /// - `WHITEBOARD_CONNECT_TIMEOUT_SECS`: default 10
    /// - `WHITEBOARD_JPEG_QUALITY`: default 90
    /// - `WHITEBOARD_WIDTH` / `WHITEBOARD_HEIGHT`: default 800 x 600
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an unparsable or
    /// out-of-range value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let predict_url = std::env::var("WHITEBOARD_PREDICT_URL")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|_| DEFAULT_PREDICT_URL.to_string());

        let config = Self {
            predict_url,
            timeouts: Timeouts {
                request_secs: env_parse("WHITEBOARD_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
                connect_secs: env_parse("WHITEBOARD_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
            },
            jpeg_quality: env_parse("WHITEBOARD_JPEG_QUALITY", DEFAULT_JPEG_QUALITY)?,
            width: env_parse("WHITEBOARD_WIDTH", DEFAULT_WIDTH)?,
            height: env_parse("WHITEBOARD_HEIGHT", DEFAULT_HEIGHT)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field and range constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.predict_url.starts_with("http://") || self.predict_url.starts_with("https://")) {
            return Err(ConfigError::OutOfRange { key: "WHITEBOARD_PREDICT_URL", reason: "must be an http(s) URL" });
        }
        if self.timeouts.request_secs == 0 {
            return Err(ConfigError::OutOfRange { key: "WHITEBOARD_REQUEST_TIMEOUT_SECS", reason: "must be positive" });
        }
        if self.timeouts.connect_secs == 0 {
            return Err(ConfigError::OutOfRange { key: "WHITEBOARD_CONNECT_TIMEOUT_SECS", reason: "must be positive" });
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::OutOfRange { key: "WHITEBOARD_JPEG_QUALITY", reason: "must be 1..=100" });
        }
        if self.width == 0 {
            return Err(ConfigError::OutOfRange { key: "WHITEBOARD_WIDTH", reason: "must be positive" });
        }
        if self.height == 0 {
            return Err(ConfigError::OutOfRange { key: "WHITEBOARD_HEIGHT", reason: "must be positive" });
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
