//! Batch image resizing
//!
//! Classifies uploads by file extension, decodes them with the matching
//! codec, resamples to the exact requested dimensions and re-encodes in the
//! original format.

pub mod batch;
pub mod format;

pub use batch::{validate_request, BatchResizer, ValidatedRequest};
pub use format::{classify_format, resized_name, ImageFormat};
