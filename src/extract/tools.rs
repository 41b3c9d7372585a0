//! External tool invocation helpers.

use std::process::{ExitStatus, Output};

use thiserror::Error;

/// Tools the extraction pipeline can call.
pub const REQUIRED_TOOLS: [&str; 5] = ["pdfinfo", "pdftotext", "pdfimages", "pdftoppm", "tesseract"];

/// Errors that can occur during extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Not a PDF file: {0}")]
    NotAPdf(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize content: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Handle command output, extracting stdout on success or returning appropriate error.
pub(crate) fn handle_cmd_output(
    result: std::io::Result<Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::ExtractionFailed(format!(
                    "{}: {}",
                    error_prefix,
                    stderr.trim()
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Check command status, returning appropriate error on failure.
pub(crate) fn check_cmd_status(
    result: std::io::Result<ExitStatus>,
    tool_name: &str,
    error_msg: &str,
) -> Result<(), ExtractionError> {
    match result {
        Ok(s) if s.success() => Ok(()),
        Ok(_) => Err(ExtractionError::ExtractionFailed(error_msg.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Check which of the external tools are installed.
pub fn check_tools() -> Vec<(String, bool)> {
    REQUIRED_TOOLS
        .iter()
        .map(|tool| (tool.to_string(), check_binary(tool)))
        .collect()
}
