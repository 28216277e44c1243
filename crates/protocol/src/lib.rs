//! Wire data model for the store publishing API.
//!
//! The server's JSON schema is the authority: remote app and version
//! records are carried as loose, order-preserving documents rather than
//! fixed structs, so unknown or extra fields survive a round trip.

pub mod choice;
pub mod document;
pub mod envelope;

pub use choice::{ArchiveMode, ReleaseStatus, Setting, UploadMode};
pub use document::Document;
pub use envelope::{ApiResult, STATUS_INVALID_RESPONSE, STATUS_OK};
