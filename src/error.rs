use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Client,
    Quote,
    Invoice,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Client => "client",
            EntityKind::Quote => "quote",
            EntityKind::Invoice => "invoice",
        };
        f.write_str(name)
    }
}

/// Errors from store mutations. None of them change the snapshot.
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    #[error("Please fill out all required fields. Missing: {0}")]
    MissingField(&'static str),

    #[error("Line item {position} has an invalid unit price")]
    InvalidLineItem { position: usize },

    #[error("no {0} id left above the current maximum")]
    IdsExhausted(EntityKind),
}

/// Errors from the remote API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {path} returned {status}")]
    Status {
        method: String,
        path: String,
        status: reqwest::StatusCode,
    },
}
