use crate::TransactionId;
use thiserror::Error;

/// Terminal failure of a single query.
///
/// Message-level variants (`Decode`, `BadResponse`) only ever affect the one
/// query they belong to. `ConnectionLost` is fanned out to every pending and
/// queued query of a connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Query timeout")]
    Timeout,

    #[error("Response does not answer the query")]
    BadResponse,

    #[error("Failed to decode DNS response: {0}")]
    Decode(String),

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Failed to encode DNS query: {0}")]
    Encode(String),

    #[error("Transport write failed: {0}")]
    Transport(String),

    #[error("Transaction id {0} is already in flight")]
    DuplicateId(TransactionId),

    #[error("Query cancelled")]
    Cancelled,
}

impl QueryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::ConnectionLost(_))
    }
}
