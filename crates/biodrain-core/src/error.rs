//! Error types for the drainage decision engine.
//!
//! Only caller mistakes surface here. Missing upstream data is a regular
//! outcome (`AnalysisResult::DataUnavailable`), and numeric edge cases are
//! absorbed by per-formula guards.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid site geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn parameter(name: &'static str, value: f64, reason: &str) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
