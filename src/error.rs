//! Error handling for the TraceVis-RS engine
//!
//! This module defines the error type and Result alias used throughout the
//! crate. Only genuinely malformed input (a trace document that is not a step
//! array, an unreadable config file) becomes an error; ambiguity and truncation
//! are reported through [`crate::trace::TraceWarning`] and frame metadata.

use thiserror::Error;

/// Main error type for TraceVis-RS operations
#[derive(Error, Debug)]
pub enum TraceVisError {
    /// Errors related to configuration loading/validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// The trace document itself could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// TOML configuration could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No async runtime available for the playback driver
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Errors raised by the playback session
    #[error("Playback error: {0}")]
    Playback(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<TraceVisError>,
    },
}

impl TraceVisError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        TraceVisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for TraceVis-RS operations
pub type Result<T> = std::result::Result<T, TraceVisError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<TraceVisError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
