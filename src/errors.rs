use crate::api::OrderId;
use crate::cli::CLIError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the library can report.
///
/// Validation errors are raised before any backend call. Backend errors come out of the
/// `Database` implementations and are never retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("An order is already being processed")]
    Busy,
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Order {order_id} was created but its items were not stored: {source}")]
    PartialFailure {
        order_id: OrderId,
        #[source]
        source: Box<Error>,
    },
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Corrupted row: {0}")]
    CorruptedRow(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid identifier: {0}")]
    InvalidId(#[from] uuid::Error),
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(#[from] chrono::ParseError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed HTTP message: {0}")]
    Http(#[from] httparse::Error),
    #[error("Invalid route: {0}")]
    Routing(#[from] matchit::InsertError),
    #[error(transparent)]
    Cli(#[from] CLIError),
    #[error("Connection reset by peer")]
    ConnectionReset,
    #[error("No response from server")]
    NoResponse,
}

impl Error {
    /// HTTP status code used when this error reaches a client
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::BadRequest(_) | Error::Cli(_) => 400,
            Error::NotFound(_) => 404,
            Error::Busy => 409,
            _ => 500,
        }
    }
}
