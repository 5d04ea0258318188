//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias.
//! Variants cover invalid configuration, unknown stage/node kinds, pipeline
//! reordering failures, graph lookups, and IO.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown kind '{kind}'")]
    UnknownKind { kind: String },

    #[error("unknown node {id}")]
    UnknownNode { id: u32 },

    #[error("input slot {slot} out of range (node has {arity} inputs)")]
    InvalidSlot { slot: u32, arity: usize },

    #[error("stage not found in pipeline")]
    StageNotFound,

    #[error("stage '{name}' is not moveable")]
    StageNotMoveable { name: String },

    #[error("stage '{name}' is not removable")]
    StageNotRemovable { name: String },

    #[error("cannot move stage past the {0} of its list")]
    MoveOutOfBounds(&'static str),

    #[error("stage '{name}' failed: {message}")]
    StageFailed { name: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
