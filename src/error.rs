//! Error handling and custom error types
//!
//! Provides unified error handling across the resize pipeline and its
//! collaborators using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid width or height: {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    #[error("No images received")]
    NoItems,

    #[error("Failed to decode {name}: {reason}")]
    Decode { name: String, reason: String },

    #[error("Failed to encode {name}: {reason}")]
    Encode { name: String, reason: String },

    #[error("Image processing failed")]
    EmptyResult,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("File {name} is {size} bytes, limit is {limit}")]
    FileTooLarge { name: String, size: usize, limit: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
