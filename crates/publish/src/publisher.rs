//! Workflow entry points: strategy dispatch and session lifecycle.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use relpush_client::{ClientError, Session, Transport, TransportConfig};
use relpush_protocol::UploadMode;

use crate::artifact::Artifact;
use crate::connection::StoreConnection;
use crate::host::{BuildLog, FileFinder};
use crate::multi::MultiRequestStrategy;
use crate::outcome::BuildOutcome;
use crate::single::SingleRequestStrategy;

/// Publishes one artifact over an established connection.
///
/// The strategy is chosen from the resolved upload mode; transport-level
/// faults are folded into the build outcome here, so a run always ends
/// with an outcome rather than an unhandled fault.
pub struct Publisher<'a> {
    pub conn: &'a mut dyn StoreConnection,
    pub log: &'a dyn BuildLog,
    pub finder: &'a dyn FileFinder,
}

impl Publisher<'_> {
    pub async fn publish(&mut self, artifact: &mut Artifact) -> BuildOutcome {
        let resolved = artifact.request.resolve(&artifact.endpoint);
        debug!(
            glob = %resolved.artifact_glob,
            mode = ?resolved.upload_mode,
            "publishing artifact"
        );

        let run = match resolved.upload_mode {
            UploadMode::SingleRequest => {
                SingleRequestStrategy
                    .publish(artifact, &resolved, self.conn, self.log, self.finder)
                    .await
            }
            UploadMode::MultiRequest => {
                MultiRequestStrategy
                    .publish(artifact, &resolved, self.conn, self.log, self.finder)
                    .await
            }
        };

        match run {
            Ok(()) => {}
            Err(ClientError::Cancelled) => {
                self.log.line("Publication cancelled");
                artifact.escalate(BuildOutcome::Aborted);
            }
            Err(e) => {
                self.log.line(&format!("Publication failed: {e}"));
                artifact.escalate(BuildOutcome::Failure);
            }
        }
        artifact.outcome()
    }
}

/// Runs a complete publication: log in, publish, release the session.
///
/// The session and transport are released on every exit path: success,
/// terminal failure, or cancellation.
pub async fn run_publication(
    artifact: &mut Artifact,
    log: &dyn BuildLog,
    finder: &dyn FileFinder,
    cancel: CancellationToken,
) -> BuildOutcome {
    let config = TransportConfig {
        base_url: artifact.endpoint.url.clone(),
        proxy: artifact.endpoint.proxy_config(),
    };
    let mut session = Session::new(Transport::new(config, cancel));

    let user_name = artifact.endpoint.user_name.clone();
    let password = artifact.endpoint.password.clone();

    match session.log_in(&user_name, &password).await {
        Ok(result) if result.is_ok() => {
            if let Some(version) = session.server_version() {
                log.line(&format!("Connected to store, server version {version}"));
            }
            let mut publisher = Publisher {
                conn: &mut session,
                log,
                finder,
            };
            publisher.publish(artifact).await;
        }
        Ok(result) => {
            log.line(&format!(
                "Login rejected (status {}): {}",
                result.status, result.message
            ));
            artifact.escalate(BuildOutcome::Failure);
        }
        Err(ClientError::Cancelled) => {
            log.line("Publication cancelled during login");
            artifact.escalate(BuildOutcome::Aborted);
        }
        Err(e) => {
            log.line(&format!("Login failed: {e}"));
            artifact.escalate(BuildOutcome::Failure);
        }
    }

    session.close().await;
    artifact.outcome()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Endpoint, PublicationRequest};
    use crate::testing::{FixedFinder, MockConnection, NullLog, ok_envelope};
    use relpush_protocol::{Setting, UploadMode};
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn cancellation_aborts_the_outcome() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.zip");
        std::fs::write(&path, b"PK\x03\x04").unwrap();

        let mut artifact = Artifact::new(
            Endpoint::default(),
            dir.path(),
            PublicationRequest {
                artifact_glob: "*.zip".into(),
                upload_mode: Setting::Value(UploadMode::SingleRequest),
                ..PublicationRequest::default()
            },
            BuildOutcome::Success,
        );

        let mut conn = MockConnection::with_results(vec![Err(ClientError::Cancelled)]);
        let mut publisher = Publisher {
            conn: &mut conn,
            log: &NullLog,
            finder: &FixedFinder(vec![path]),
        };

        let outcome = publisher.publish(&mut artifact).await;
        assert_eq!(outcome, BuildOutcome::Aborted);
    }

    #[tokio::test]
    async fn transport_fault_ends_in_failure_not_a_panic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.zip");
        std::fs::write(&path, b"PK\x03\x04").unwrap();

        let mut artifact = Artifact::new(
            Endpoint::default(),
            dir.path(),
            PublicationRequest {
                artifact_glob: "*.zip".into(),
                upload_mode: Setting::Value(UploadMode::SingleRequest),
                ..PublicationRequest::default()
            },
            BuildOutcome::Success,
        );

        let mut conn = MockConnection::with_results(vec![Err(ClientError::InvalidUrl(
            "nope".into(),
        ))]);
        let mut publisher = Publisher {
            conn: &mut conn,
            log: &NullLog,
            finder: &FixedFinder(vec![path]),
        };

        let outcome = publisher.publish(&mut artifact).await;
        assert_eq!(outcome, BuildOutcome::Failure);
    }

    #[tokio::test]
    async fn strategy_dispatch_follows_resolved_upload_mode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.zip");
        std::fs::write(&path, b"PK\x03\x04").unwrap();

        let mut artifact = Artifact::new(
            Endpoint {
                upload_mode: UploadMode::MultiRequest,
                ..Endpoint::default()
            },
            dir.path(),
            PublicationRequest {
                artifact_glob: "*.zip".into(),
                ..PublicationRequest::default()
            },
            BuildOutcome::Success,
        );

        // Multi-request: the first call is a bare asset upload, the
        // second resolves the app from the uploaded asset.
        let mut conn = MockConnection::new([
            ok_envelope(json!([{"uuid": "asset-1"}])),
            ok_envelope(json!([{
                "uuid": "app-1",
                "versions": [{"uuid": null, "file": {"uuid": "asset-1"}, "versionCode": 1}]
            }])),
            ok_envelope(json!([{"name": "en"}])),
            ok_envelope(json!([{"uuid": "new"}])),
        ]);
        let mut publisher = Publisher {
            conn: &mut conn,
            log: &NullLog,
            finder: &FixedFinder(vec![path]),
        };

        let outcome = publisher.publish(&mut artifact).await;
        assert_eq!(outcome, BuildOutcome::Success);
        assert!(conn.paths()[1].starts_with("/relution/api/v1/apps/fromFile/"));
    }
}
