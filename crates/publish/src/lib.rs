//! Publish workflow: turns locally built artifacts into remote
//! application/version records.
//!
//! Two interchangeable strategies share the session: a single-request
//! strategy (one multipart POST per artifact carrying all fields) and a
//! multi-request strategy (upload assets, then metadata/create/archive
//! calls). Assets are processed strictly sequentially so archival
//! deletion observes a consistent, ordered view of prior versions.

pub mod artifact;
pub mod config;
pub mod connection;
pub mod host;
pub mod outcome;
pub mod publisher;
pub mod text;

mod multi;
mod single;

#[cfg(test)]
mod testing;

pub use artifact::Artifact;
pub use config::{Endpoint, PublicationRequest, ResolvedPublication};
pub use connection::StoreConnection;
pub use host::{BuildLog, FileFinder, GlobFinder, TracingLog};
pub use outcome::BuildOutcome;
pub use publisher::{Publisher, run_publication};
