use std::fmt;

use matrix_sdk::HttpError;
use thiserror::Error;

/// Errors that can occur when working with a joined room
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the room module
    #[error("Room error: {0}")]
    Room(#[from] RoomError),

    /// An error from the outbound API
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// An event could not be read
    #[error("Event error: {0}")]
    Event(#[from] EventError),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for room operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by room-level operations
#[derive(Error, Debug)]
pub enum RoomError {
    /// A payload could not be serialized for sending
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RoomError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Errors reported by the home-server API collaborator
#[derive(Error, Debug)]
pub enum ApiError {
    /// An error from the underlying Matrix SDK
    #[error("Matrix SDK error: {0}")]
    MatrixSdk(String),

    /// The client does not know the addressed room
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// The server refused the request
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// The spawned request task went away before reporting
    #[error("Request task closed unexpectedly")]
    TaskClosed,
}

impl ApiError {
    /// Create a new MatrixSdk error
    pub fn matrix_sdk<E: fmt::Display>(error: E) -> Self {
        Self::MatrixSdk(error.to_string())
    }

    /// Classify a home-server error response by its HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            403 => Self::PermissionDenied(message.into()),
            _ => Self::MatrixSdk(message.into()),
        }
    }
}

impl From<matrix_sdk::Error> for ApiError {
    fn from(error: matrix_sdk::Error) -> Self {
        if let matrix_sdk::Error::Http(HttpError::Reqwest(_)) = &error {
            return Self::Network(error.to_string());
        }

        match error.as_client_api_error() {
            Some(response) => Self::from_status(response.status_code.as_u16(), error.to_string()),
            None => Self::matrix_sdk(error),
        }
    }
}

/// Errors raised while reading an inbound event
#[derive(Error, Debug)]
pub enum EventError {
    /// The value is not an event object with a string `type`
    #[error("Malformed event: {0}")]
    Malformed(String),
}

/// A failure captured from a single observer during dispatch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObserverError {
    /// The observer returned an error
    #[error("Observer failed: {0}")]
    Failed(String),

    /// The observer panicked
    #[error("Observer panicked: {0}")]
    Panicked(String),
}

/// Errors raised while loading room configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File I/O error
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for a room config
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
