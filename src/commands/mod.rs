// Command exports
pub mod assess;
pub mod content;
pub mod display;

use crate::models::{ApiResponse, ErrorBody};
use crate::services::{ApiClient, ApiError};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;

pub use assess::{assess, quick_check, sample_risk_data};
pub use content::{clear_history, education, emergency, health, home, last_result, risk_factors};

/// Errors that end a command
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{}", api_message(.0))]
    Api(#[from] ApiError),

    #[error("{0}")]
    Rejected(String),

    #[error("Input ended before the questionnaire was finished")]
    Aborted,
}

fn api_message(error: &ApiError) -> String {
    format!("{}: {}", error.title(), error)
}

impl CommandError {
    /// Envelope form of the error for JSON output
    pub fn to_error_body(&self) -> ErrorBody {
        match self {
            Self::Api(e) => e.to_error_body(),
            Self::Rejected(message) => ErrorBody {
                code: "VALIDATION_ERROR".to_string(),
                message: message.clone(),
                details: None,
            },
            other => ErrorBody {
                code: "UNKNOWN_ERROR".to_string(),
                message: other.to_string(),
                details: None,
            },
        }
    }
}

/// How command results are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Dependencies shared by every command
#[derive(Clone)]
pub struct AppContext {
    pub client: Arc<ApiClient>,
    pub format: OutputFormat,
}

impl AppContext {
    pub fn new(client: Arc<ApiClient>, format: OutputFormat) -> Self {
        Self { client, format }
    }

    /// Write data either as a success envelope or as rendered text
    pub(crate) fn emit<T, W, F>(&self, out: &mut W, data: &T, render: F) -> Result<(), CommandError>
    where
        T: Serialize,
        W: Write,
        F: FnOnce(&T) -> String,
    {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, &ApiResponse::ok(data))?;
                writeln!(out)?;
            }
            OutputFormat::Text => writeln!(out, "{}", render(data))?,
        }
        Ok(())
    }
}

/// Write a failure envelope for JSON output
pub fn write_error_json<W: Write>(out: &mut W, error: &CommandError) -> Result<(), CommandError> {
    let envelope: ApiResponse<()> = ApiResponse::failure(error.to_error_body());
    serde_json::to_writer_pretty(&mut *out, &envelope)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_has_title() {
        let err = CommandError::from(ApiError::Network);
        assert!(err.to_string().starts_with("No connection: "));
        assert_eq!(err.to_error_body().code, "NETWORK_ERROR");
    }

    #[test]
    fn test_error_envelope() {
        let mut out = Vec::new();
        write_error_json(&mut out, &CommandError::Rejected("Age must be between 35 and 65 years".into())).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert!(json.get("data").is_none());
    }
}
