//! Authenticated session on top of the transport.
//!
//! `LOGGED_OUT → LOGGED_IN → LOGGED_OUT`. Logging in twice is an error;
//! logging out is best-effort and always clears the session state.

use tracing::{debug, warn};

use relpush_protocol::ApiResult;

use crate::error::ClientError;
use crate::request::{self, ApiRequest};
use crate::transport::Transport;
use crate::version::ServerVersion;

const SESSION_COOKIE: &str = "JSESSIONID";

struct AuthState {
    /// `None` when the login response carried no session cookie.
    token: Option<String>,
    server_version: ServerVersion,
}

impl AuthState {
    fn cookie_header(&self) -> Option<String> {
        self.token
            .as_ref()
            .map(|t| format!("{SESSION_COOKIE}={t}"))
    }
}

/// Transport plus authentication state.
pub struct Session {
    transport: Transport,
    auth: Option<AuthState>,
}

impl Session {
    pub fn new(transport: Transport) -> Session {
        Session {
            transport,
            auth: None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.auth.is_some()
    }

    /// Version reported by the server at login.
    pub fn server_version(&self) -> Option<&ServerVersion> {
        self.auth.as_ref().map(|a| &a.server_version)
    }

    /// Authenticates against the store.
    ///
    /// Fails when already logged in (guards against accidental session
    /// reuse). A well-formed failure envelope is returned to the caller
    /// without establishing a session.
    pub async fn log_in(
        &mut self,
        user_name: &str,
        password: &str,
    ) -> Result<ApiResult, ClientError> {
        if self.auth.is_some() {
            return Err(ClientError::AlreadyLoggedIn);
        }

        let req = request::login(user_name, password);
        let (result, meta) = self.transport.execute_with_meta(&req, None).await?;

        if result.is_ok() {
            let token = meta
                .set_cookies
                .iter()
                .find_map(|raw| parse_session_cookie(raw));
            let server_version = meta
                .server_version
                .as_deref()
                .map(ServerVersion::new)
                .unwrap_or_else(ServerVersion::unknown);
            if token.is_none() {
                warn!("login response carried no session cookie");
            }
            debug!(user = user_name, version = %server_version, "logged in");
            self.auth = Some(AuthState {
                token,
                server_version,
            });
        }

        Ok(result)
    }

    /// Executes a request within the session.
    pub async fn execute(&mut self, req: &ApiRequest) -> Result<ApiResult, ClientError> {
        let cookie = match &self.auth {
            Some(auth) => auth.cookie_header(),
            None => return Err(ClientError::NotLoggedIn),
        };
        self.transport.execute(req, cookie.as_deref()).await
    }

    /// Best-effort logout: network failures are logged and swallowed,
    /// session state is cleared no matter what.
    pub async fn log_out(&mut self) {
        if let Some(auth) = self.auth.take() {
            let req = request::logout();
            match self
                .transport
                .execute(&req, auth.cookie_header().as_deref())
                .await
            {
                Ok(result) if result.is_ok() => debug!("logged out"),
                Ok(result) => warn!(status = result.status, "logout rejected by server"),
                Err(e) => warn!(error = %e, "logout failed"),
            }
        }
    }

    /// Logs out, then releases the transport's client.
    pub async fn close(&mut self) {
        self.log_out().await;
        self.transport.close();
    }
}

/// Extracts the session token from a raw `Set-Cookie` value.
///
/// Matches `JSESSIONID=<token>;...`; anything else yields no token.
fn parse_session_cookie(raw: &str) -> Option<String> {
    let rest = raw.strip_prefix("JSESSIONID=")?;
    let (token, _) = rest.split_once(';')?;
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_cookie() {
        assert_eq!(
            parse_session_cookie("JSESSIONID=abc123; Path=/; HttpOnly"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn rejects_other_cookies() {
        assert_eq!(parse_session_cookie("OTHER=abc123; Path=/"), None);
        assert_eq!(parse_session_cookie(""), None);
        // No attribute separator, no match.
        assert_eq!(parse_session_cookie("JSESSIONID=abc123"), None);
    }

    #[test]
    fn cookie_header_round_trip() {
        let auth = AuthState {
            token: Some("t0k3n".into()),
            server_version: ServerVersion::unknown(),
        };
        assert_eq!(auth.cookie_header().as_deref(), Some("JSESSIONID=t0k3n"));
    }
}
