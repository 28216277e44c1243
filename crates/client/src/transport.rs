//! HTTP transport with bounded retry on transient faults.
//!
//! One lazily built `reqwest` client per transport. A request is retried
//! only on connect timeouts, socket timeouts, and socket-level connection
//! errors, up to [`MAX_RETRIES`] additional attempts, with the multipart
//! encoder rewound between attempts. Everything else, including
//! application-level failure envelopes, is terminal.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, COOKIE, SET_COOKIE};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use relpush_multipart::{EncoderBody, MultipartEncoder};
use relpush_protocol::ApiResult;

use crate::error::ClientError;
use crate::request::{ApiRequest, RequestBody};

/// Maximum retries after the first attempt (3 retries, 4 attempts total).
pub const MAX_RETRIES: u32 = 3;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Response header carrying the server build identifier.
pub const SERVER_VERSION_HEADER: &str = "X-Relution-Version";

/// Proxy settings for the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Connection settings, immutable once a publish run starts.
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    /// Base URL of the store, e.g. `https://store.example.com`.
    pub base_url: String,
    pub proxy: Option<ProxyConfig>,
}

/// Response metadata the session layer needs besides the envelope.
#[derive(Debug, Clone, Default)]
pub struct ReplyMeta {
    /// Raw `Set-Cookie` header values, in response order.
    pub set_cookies: Vec<String>,
    /// Raw server version header value, when present.
    pub server_version: Option<String>,
}

/// Executes single logical HTTP requests against the store.
pub struct Transport {
    config: TransportConfig,
    cancel: CancellationToken,
    client: Option<reqwest::Client>,
}

impl Transport {
    pub fn new(config: TransportConfig, cancel: CancellationToken) -> Transport {
        Transport {
            config,
            cancel,
            client: None,
        }
    }

    /// Token that aborts any in-flight call when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Executes a request and returns the parsed envelope.
    pub async fn execute(
        &mut self,
        req: &ApiRequest,
        cookie: Option<&str>,
    ) -> Result<ApiResult, ClientError> {
        let (result, _meta) = self.execute_with_meta(req, cookie).await?;
        Ok(result)
    }

    /// Executes a request, also returning response metadata (cookies,
    /// server version header) for the session layer.
    pub async fn execute_with_meta(
        &mut self,
        req: &ApiRequest,
        cookie: Option<&str>,
    ) -> Result<(ApiResult, ReplyMeta), ClientError> {
        let client = self.client()?;
        let url = join_url(&self.config.base_url, &req.path)?;

        // The encoder outlives all attempts; it is rewound, not rebuilt,
        // between them, and the mutex guards the reactor's polls against
        // this caller's resets.
        let encoder = match &req.body {
            RequestBody::Multipart(parts) => {
                Some(Arc::new(Mutex::new(MultipartEncoder::new(parts.clone()))))
            }
            _ => None,
        };

        let cancel = self.cancel.clone();
        let result = with_retry(
            MAX_RETRIES,
            |e: &ClientError| e.is_transient(),
            |attempt| {
                if attempt > 1 {
                    if let Some(enc) = &encoder {
                        if let Ok(mut guard) = enc.lock() {
                            guard.reset();
                        }
                    }
                }
                attempt_once(&client, url.clone(), req, cookie, encoder.as_ref(), &cancel)
            },
        )
        .await;

        if let Some(enc) = &encoder {
            if let Ok(mut guard) = enc.lock() {
                guard.close();
            }
        }
        result
    }

    /// Drops the underlying HTTP client and its connection pool.
    pub fn close(&mut self) {
        self.client = None;
    }

    /// Lazily builds the HTTP client on first use.
    fn client(&mut self) -> Result<reqwest::Client, ClientError> {
        match self.client.as_ref() {
            Some(client) => Ok(client.clone()),
            None => {
                let client = build_client(&self.config)?;
                debug!(base_url = %self.config.base_url, "transport client started");
                Ok(self.client.insert(client).clone())
            }
        }
    }
}

fn build_client(config: &TransportConfig) -> Result<reqwest::Client, ClientError> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(READ_TIMEOUT);

    if let Some(proxy) = &config.proxy {
        let mut p = reqwest::Proxy::all(format!("http://{}:{}", proxy.host, proxy.port))?;
        if let (Some(user), Some(pass)) = (&proxy.username, &proxy.password) {
            p = p.basic_auth(user, pass);
        }
        builder = builder.proxy(p);
    }

    Ok(builder.build()?)
}

fn join_url(base: &str, path: &str) -> Result<reqwest::Url, ClientError> {
    let joined = format!("{}{}", base.trim_end_matches('/'), path);
    reqwest::Url::parse(&joined).map_err(|_| ClientError::InvalidUrl(joined))
}

/// One attempt: send, classify auth failures, read the full body, parse
/// the envelope (or synthesize the invalid-response sentinel).
async fn attempt_once(
    client: &reqwest::Client,
    url: reqwest::Url,
    req: &ApiRequest,
    cookie: Option<&str>,
    encoder: Option<&Arc<Mutex<MultipartEncoder>>>,
    cancel: &CancellationToken,
) -> Result<(ApiResult, ReplyMeta), ClientError> {
    let mut builder = client.request(req.method.clone(), url);
    if !req.query.is_empty() {
        builder = builder.query(&req.query);
    }
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }

    builder = match (&req.body, encoder) {
        (RequestBody::Json(value), _) => builder.json(value),
        (RequestBody::Multipart(_), Some(enc)) => {
            let (boundary, content_length) = {
                let guard = enc.lock().map_err(|_| {
                    ClientError::Io(std::io::Error::other("multipart encoder poisoned"))
                })?;
                (guard.boundary().to_string(), guard.content_length())
            };
            builder
                .header(
                    CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                // Declared up front so the body goes out non-chunked.
                .header(CONTENT_LENGTH, content_length)
                .body(reqwest::Body::wrap_stream(EncoderBody::new(Arc::clone(
                    enc,
                ))))
        }
        _ => builder,
    };

    let work = async {
        let response = builder.send().await?;
        let http_status = response.status();

        if http_status == StatusCode::UNAUTHORIZED || http_status == StatusCode::FORBIDDEN {
            return Err(ClientError::Forbidden(http_status.as_u16()));
        }
        if http_status == StatusCode::PROXY_AUTHENTICATION_REQUIRED {
            return Err(ClientError::ProxyAuthRequired);
        }

        let meta = ReplyMeta {
            set_cookies: response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok().map(str::to_string))
                .collect(),
            server_version: response
                .headers()
                .get(SERVER_VERSION_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        };

        let body = response.text().await?;
        Ok((ApiResult::parse(http_status.as_u16(), &body), meta))
    };

    tokio::select! {
        result = work => result,
        _ = cancel.cancelled() => Err(ClientError::Cancelled),
    }
}

/// Retries `op` while `transient` holds, up to `max_retries` additional
/// attempts. The last failure is surfaced, never swallowed. Re-attempts
/// are immediate; there is no backoff.
async fn with_retry<T, E, F, Fut>(
    max_retries: u32,
    transient: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt <= max_retries && transient(&e) => {
                warn!(attempt, error = %e, "transient transport fault, retrying");
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug)]
    struct Fault {
        transient: bool,
        id: u32,
    }

    impl std::fmt::Display for Fault {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "fault {}", self.id)
        }
    }

    async fn run_faulty(fault_count: u32, transient: bool) -> (Result<u32, Fault>, u32) {
        let calls = Cell::new(0u32);
        let result = with_retry(
            MAX_RETRIES,
            |e: &Fault| e.transient,
            |attempt| {
                calls.set(calls.get() + 1);
                let fail = attempt <= fault_count;
                async move {
                    if fail {
                        Err(Fault {
                            transient,
                            id: attempt,
                        })
                    } else {
                        Ok(attempt)
                    }
                }
            },
        )
        .await;
        (result, calls.get())
    }

    #[tokio::test]
    async fn retries_exactly_up_to_the_bound() {
        // 0..=3 transient faults are absorbed.
        for faults in 0..=MAX_RETRIES {
            let (result, calls) = run_faulty(faults, true).await;
            assert_eq!(result.unwrap(), faults + 1);
            assert_eq!(calls, faults + 1);
        }
    }

    #[tokio::test]
    async fn fourth_consecutive_fault_exhausts_retries() {
        let (result, calls) = run_faulty(MAX_RETRIES + 1, true).await;
        // The surfaced failure is the last one, from attempt 4.
        assert_eq!(result.unwrap_err().id, MAX_RETRIES + 1);
        assert_eq!(calls, MAX_RETRIES + 1);
    }

    #[tokio::test]
    async fn non_transient_fault_is_never_retried() {
        let (result, calls) = run_faulty(2, false).await;
        assert_eq!(result.unwrap_err().id, 1);
        assert_eq!(calls, 1);
    }

    #[test]
    fn join_url_handles_trailing_slash() {
        let url = join_url("https://store.example.com/", "/relution/api/v1/files").unwrap();
        assert_eq!(
            url.as_str(),
            "https://store.example.com/relution/api/v1/files"
        );
        assert!(join_url("not a url", "/x").is_err());
    }
}
