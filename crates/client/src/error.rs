//! Client error types.

/// Errors produced by the transport and session layers.
///
/// Expected application-level failures (non-zero logical status in a
/// well-formed envelope) are not errors; they travel as
/// [`ApiResult`](relpush_protocol::ApiResult) values.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("multipart error: {0}")]
    Multipart(#[from] relpush_multipart::MultipartError),

    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("authentication rejected (HTTP {0})")]
    Forbidden(u16),

    #[error("proxy authentication required")]
    ProxyAuthRequired,

    #[error("already logged in")]
    AlreadyLoggedIn,

    #[error("not logged in")]
    NotLoggedIn,

    #[error("cancelled")]
    Cancelled,
}

impl ClientError {
    /// True for the fault classes the transport retries: connect
    /// timeout, socket timeout, and socket-level connection errors.
    ///
    /// Body faults are never transient: a failure while producing the
    /// request body (a truncated local file, for instance) surfaces as
    /// an I/O error too, and retrying cannot repair the input.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(e) => {
                e.is_timeout() || e.is_connect() || (!e.is_body() && has_connection_io_source(e))
            }
            _ => false,
        }
    }
}

/// Walks the source chain looking for a connection-level I/O error.
fn has_connection_io_source(e: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = e.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if is_connection_kind(io.kind()) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

fn is_connection_kind(kind: std::io::ErrorKind) -> bool {
    matches!(
        kind,
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::TimedOut
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Stand-in for reqwest's opaque wrapping of an underlying fault.
    #[derive(Debug, thiserror::Error)]
    #[error("request failed")]
    struct Wrapped(#[source] io::Error);

    #[test]
    fn connection_level_io_sources_are_transient() {
        for kind in [
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::TimedOut,
        ] {
            let e = Wrapped(io::Error::new(kind, "socket fault"));
            assert!(has_connection_io_source(&e), "{kind:?}");
        }
    }

    #[test]
    fn body_production_faults_are_not_transient() {
        // The encoder reports a file truncated mid-transfer as
        // UnexpectedEof; retrying cannot fix the local input.
        let e = Wrapped(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "file truncated during transfer",
        ));
        assert!(!has_connection_io_source(&e));

        let e = Wrapped(io::Error::new(io::ErrorKind::NotFound, "no such file"));
        assert!(!has_connection_io_source(&e));
    }

    #[test]
    fn non_http_variants_are_never_transient() {
        assert!(!ClientError::Cancelled.is_transient());
        assert!(!ClientError::Forbidden(401).is_transient());
        assert!(!ClientError::Io(io::Error::other("disk")).is_transient());
    }
}
