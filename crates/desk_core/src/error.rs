//! Error types for the desk core.

use thiserror::Error;

use crate::lifecycle::TicketStatus;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("ticket not found: {0}")]
    NotFound(String),

    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition {
        from: TicketStatus,
        to: TicketStatus,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeskError>;
