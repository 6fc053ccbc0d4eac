//! Batch image resizer - resizes uploaded JPEG, PNG and GIF files to an
//! exact target size
//!
//! Each upload is classified by extension, decoded, resampled to the
//! requested dimensions and re-encoded in its original format. Outcomes are
//! written to flat-file storage and described in a JSON response.

pub mod app;
pub mod error;
pub mod models;
pub mod resize;
pub mod storage;

pub use error::{Error, Result};
