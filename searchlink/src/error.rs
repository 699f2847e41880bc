//! Client error types

use thiserror::Error;

/// Errors that can interrupt a caller.
///
/// Protocol-level degradation (incomplete bulk responses, rejected scroll
/// pages, failed cursor cleanup) is never reported through this type; those
/// paths log and resolve to a count or an `Option` instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    #[error("Endpoint list can not be empty")]
    NoEndpoints,

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Get the error type as a string for metrics labeling
    pub fn error_type(&self) -> &'static str {
        match self {
            Error::ConnectionFailure(_) => "connection_failure",
            Error::NoEndpoints => "no_endpoints",
            Error::InvalidDocument(_) => "invalid_document",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Toml(_) => "toml",
            Error::Http(_) => "http",
        }
    }

    /// True when every endpoint of the cluster failed for one request round.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Error::ConnectionFailure(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
