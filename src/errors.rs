/*!
 * Error types for the sheetlate application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with translation backends
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error payload returned inside a successful HTTP response
    #[error("Model returned error: {0}")]
    ModelError(String),

    /// Backend returned a different number of translations than it was given
    #[error("Expected {expected} translations, got {actual}")]
    CountMismatch {
        /// Number of units sent
        expected: usize,
        /// Number of strings received
        actual: usize,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur while setting up or running a translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the backend API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Missing or invalid configuration for a language; fatal for that language only
    #[error("Configuration error for '{language}': {message}")]
    Configuration {
        /// Language the configuration was resolved for
        language: String,
        /// What is wrong
        message: String,
    },
}

impl TranslationError {
    /// Shorthand for a configuration error
    pub fn configuration(language: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            language: language.into(),
            message: message.into(),
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a backend
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}
