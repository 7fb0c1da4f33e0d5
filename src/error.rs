//! Error handling for the wardrobe client

use std::fmt;
use thiserror::Error;

use outfit_auth::AuthError;
use outfit_postgrest::PostgrestError;
use outfit_storage::StorageError;

use crate::validation::ValidationErrors;

/// Unified error type for the wardrobe client
#[derive(Error, Debug)]
pub enum Error {
    /// An operation that needs an owner ran without a signed-in user
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Form input failed a validation rule; displays the first message
    #[error("{0}")]
    Validation(ValidationErrors),

    /// The table API rejected or failed the request
    #[error("{}", .0.message())]
    Database(#[from] PostgrestError),

    /// Object storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Authentication service errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// A remote row did not have the expected shape
    #[error("{0}")]
    Decode(#[from] DecodeError),

    /// No row matched the id for the signed-in user
    #[error("Not found: {0}")]
    NotFound(String),

    /// A partial update would break an item invariant
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading local image files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed base64 image payloads
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new not-found error
    pub fn not_found<T: fmt::Display>(msg: T) -> Self {
        Error::NotFound(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// True for failures reported by the remote table or storage
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::Database(_) | Error::Storage(_) | Error::Auth(_) | Error::Http(_)
        )
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::Validation(errors)
    }
}

/// A remote row that could not be mapped onto a domain record
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Malformed {entity} row{}: {message}", row_suffix(.row))]
pub struct DecodeError {
    /// Which record type was being decoded
    pub entity: &'static str,
    /// Id of the offending row when it could be read
    pub row: Option<String>,
    pub message: String,
}

impl DecodeError {
    pub fn new<T: fmt::Display>(entity: &'static str, row: Option<String>, msg: T) -> Self {
        Self {
            entity,
            row,
            message: msg.to_string(),
        }
    }
}

fn row_suffix(row: &Option<String>) -> String {
    match row {
        Some(id) => format!(" {}", id),
        None => String::new(),
    }
}
