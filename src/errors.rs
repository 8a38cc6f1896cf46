// ABOUTME: Error types for the hyperslide application
// ABOUTME: Provides structured error handling for rendering, watching and serving

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlideError {
    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Layout error: {0}")]
    LayoutError(String),

    #[error("Invalid request body: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Watch error: {0}")]
    WatchError(String),

    #[error("Server error: {0}")]
    ServerError(String),
}

impl From<handlebars::RenderError> for SlideError {
    fn from(err: handlebars::RenderError) -> Self {
        SlideError::TemplateError(err.to_string())
    }
}

impl From<handlebars::TemplateError> for SlideError {
    fn from(err: handlebars::TemplateError) -> Self {
        SlideError::TemplateError(err.to_string())
    }
}

impl From<notify::Error> for SlideError {
    fn from(err: notify::Error) -> Self {
        SlideError::WatchError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SlideError>;
