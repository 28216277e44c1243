//! Single-request publish strategy.
//!
//! One multipart POST per matched artifact, carrying the binary, the
//! optional changelog, and the scalar publication fields. One file's
//! failure never aborts the batch; the outcome is escalated and the
//! remaining files are still published.

use std::path::Path;

use tracing::debug;

use relpush_client::{ClientError, request};
use relpush_multipart::Part;
use relpush_protocol::ArchiveMode;

use crate::artifact::Artifact;
use crate::config::ResolvedPublication;
use crate::connection::StoreConnection;
use crate::host::{BuildLog, FileFinder};
use crate::outcome::BuildOutcome;

pub(crate) struct SingleRequestStrategy;

impl SingleRequestStrategy {
    pub(crate) async fn publish(
        &self,
        artifact: &mut Artifact,
        resolved: &ResolvedPublication,
        conn: &mut dyn StoreConnection,
        log: &dyn BuildLog,
        finder: &dyn FileFinder,
    ) -> Result<(), ClientError> {
        let files = match finder.find(
            artifact.base_dir(),
            &resolved.artifact_glob,
            resolved.exclude_glob.as_deref(),
        ) {
            Ok(files) => files,
            Err(e) => {
                log.line(&format!("Could not enumerate artifacts: {e}"));
                artifact.escalate(BuildOutcome::NotBuilt);
                return Ok(());
            }
        };

        if files.is_empty() {
            log.line(&format!(
                "No artifacts matched '{}', nothing to publish",
                resolved.artifact_glob
            ));
            artifact.escalate(BuildOutcome::NotBuilt);
            return Ok(());
        }

        for file in &files {
            self.publish_file(artifact, resolved, conn, log, file)
                .await?;
        }
        Ok(())
    }

    async fn publish_file(
        &self,
        artifact: &mut Artifact,
        resolved: &ResolvedPublication,
        conn: &mut dyn StoreConnection,
        log: &dyn BuildLog,
        file: &Path,
    ) -> Result<(), ClientError> {
        let mut parts = match Part::from_path("file", file) {
            Ok(part) => vec![part],
            Err(e) => {
                log.line(&format!("Skipping unreadable artifact {}: {e}", file.display()));
                artifact.escalate(BuildOutcome::Unstable);
                return Ok(());
            }
        };

        if let Some(changelog) = &resolved.changelog_path {
            let path = artifact.base_dir().join(changelog);
            match Part::from_path("changelog", &path) {
                Ok(part) => parts.push(part),
                Err(e) => log.line(&format!(
                    "Publishing without changelog, {} unreadable: {e}",
                    path.display()
                )),
            }
        }

        let mut query = vec![
            (
                "releaseStatus".to_string(),
                resolved.release_status.as_str().to_string(),
            ),
            (
                "archiveFormerVersions".to_string(),
                (resolved.archive_mode == ArchiveMode::Overwrite).to_string(),
            ),
        ];
        if let Some(environment) = &resolved.environment_uuid {
            query.push(("environmentUuid".to_string(), environment.clone()));
        }

        log.line(&format!("Publishing {}...", file.display()));
        debug!(file = %file.display(), parts = parts.len(), "single-request publish");

        let req = request::upload_files(parts).with_query(query);
        let result = conn.execute(req).await?;

        if result.is_ok() {
            log.line(&format!("Published {}", file.display()));
        } else {
            log.line(&format!(
                "Publishing {} failed (status {}): {}",
                file.display(),
                result.status,
                result.message
            ));
            artifact.escalate(BuildOutcome::Unstable);
        }
        Ok(())
    }
}
