//! HTTP client layer for the store publishing API.
//!
//! [`Transport`] executes one logical request with bounded retry on
//! transient faults; [`Session`] layers authentication state on top and
//! owns the session cookie and negotiated server version;
//! [`request`] holds the pure builders for the fixed set of API calls.

pub mod error;
pub mod request;
pub mod session;
pub mod transport;
pub mod version;

pub use error::ClientError;
pub use request::{ApiRequest, RequestBody};
pub use session::Session;
pub use transport::{MAX_RETRIES, ProxyConfig, ReplyMeta, Transport, TransportConfig};
pub use version::ServerVersion;
