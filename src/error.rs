// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for Luminara

use thiserror::Error;

/// Result type alias for Luminara operations
pub type Result<T> = std::result::Result<T, LuminaraError>;

/// Luminara error types
#[derive(Error, Debug)]
pub enum LuminaraError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Ollama not available: {0}")]
    OllamaUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model output error: {0}")]
    ModelOutput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
