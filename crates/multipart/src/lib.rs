//! Incremental multipart/form-data encoding for artifact uploads.
//!
//! The encoder produces body bytes on demand (file contents are never
//! materialized in memory) and declares an exact content length before
//! the first byte is sent, so the body goes out non-chunked. It is
//! replayable: a `reset` rewinds all cursors for a retry attempt.

mod body;
mod encoder;
mod sniff;

pub use body::{DEFAULT_CHUNK_SIZE, EncoderBody};
pub use encoder::{MultipartEncoder, Part};
pub use sniff::sniff_content_type;

/// Errors produced by the multipart crate.
#[derive(Debug, thiserror::Error)]
pub enum MultipartError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoder closed")]
    Closed,
}
