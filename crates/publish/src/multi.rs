//! Multi-request publish strategy.
//!
//! Protocol per run: upload every matched artifact as a generic asset,
//! then for each asset resolve the implied application, locate its
//! version by file-asset identifier, inject metadata (fanned out to
//! every configured locale), persist app or version, and finally run
//! archive management. Assets are processed strictly sequentially;
//! one asset's failure skips only that asset's remaining steps.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use relpush_client::{ClientError, request};
use relpush_multipart::Part;
use relpush_protocol::{ArchiveMode, Document};

use crate::artifact::Artifact;
use crate::config::ResolvedPublication;
use crate::connection::StoreConnection;
use crate::host::{BuildLog, FileFinder};
use crate::outcome::BuildOutcome;
use crate::text;

/// Locale used when the server reports no configured languages.
const FALLBACK_LOCALE: &str = "en";

pub(crate) struct MultiRequestStrategy;

impl MultiRequestStrategy {
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
            // Escalation keeps an already-unstable build unstable.
            artifact.escalate(BuildOutcome::NotBuilt);
            return Ok(());
        }

        // Step 1: upload every artifact as a generic asset.
        let mut assets: Vec<(PathBuf, Document)> = Vec::new();
        for file in files {
            let part = match Part::from_path("file", &file) {
                Ok(part) => part,
                Err(e) => {
                    log.line(&format!(
                        "Skipping unreadable artifact {}: {e}",
                        file.display()
                    ));
                    artifact.escalate(BuildOutcome::Unstable);
                    continue;
                }
            };

            log.line(&format!("Uploading {}...", file.display()));
            let result = conn.execute(request::upload_files(vec![part])).await?;
            if !result.is_ok() {
                log.line(&format!(
                    "Upload of {} failed (status {}): {}",
                    file.display(),
                    result.status,
                    result.message
                ));
                artifact.escalate(BuildOutcome::Unstable);
                continue;
            }
            match result.results.into_iter().next() {
                Some(asset) => assets.push((file, asset)),
                None => {
                    log.line(&format!(
                        "Upload of {} returned no asset",
                        file.display()
                    ));
                    artifact.escalate(BuildOutcome::Unstable);
                }
            }
        }

        // Language list is fetched once per run, on first use.
        let mut locales: Option<Vec<String>> = None;

        // Steps 2-4, per asset.
        for (file, asset) in assets {
            let ok = self
                .process_asset(artifact, resolved, conn, log, &file, &asset, &mut locales)
                .await?;
            if !ok {
                artifact.escalate(BuildOutcome::Unstable);
            }
        }
        Ok(())
    }

    /// Runs the app/version pipeline for one uploaded asset.
    ///
    /// `Ok(false)` means this asset's remaining steps were abandoned;
    /// sibling assets are still processed by the caller.
    #[allow(clippy::too_many_arguments)]
    async fn process_asset(
        &self,
        artifact: &Artifact,
        resolved: &ResolvedPublication,
        conn: &mut dyn StoreConnection,
        log: &dyn BuildLog,
        file: &Path,
        asset: &Document,
        locales: &mut Option<Vec<String>>,
    ) -> Result<bool, ClientError> {
        let Some(asset_uuid) = asset.uuid().map(str::to_string) else {
            log.line(&format!(
                "Uploaded asset for {} carries no identifier",
                file.display()
            ));
            return Ok(false);
        };

        // Step 2: the application implied by the asset, and the version
        // holding the asset as its file.
        let result = conn.execute(request::app_from_file(&asset_uuid)).await?;
        if !result.is_ok() {
            log.line(&format!(
                "No application for {} (status {}): {}",
                file.display(),
                result.status,
                result.message
            ));
            return Ok(false);
        }
        let Some(mut app) = result.results.into_iter().next() else {
            log.line(&format!("Server returned no application for {}", file.display()));
            return Ok(false);
        };

        let versions = app.documents("versions");
        let Some(index) = versions.iter().position(|v| {
            v.document("file").as_ref().and_then(Document::uuid) == Some(asset_uuid.as_str())
        }) else {
            log.line(&format!(
                "No version referencing asset {asset_uuid} for {}",
                file.display()
            ));
            return Ok(false);
        };
        let mut version = versions[index].clone();

        // Step 3: metadata injection.
        let locales = match locales {
            Some(list) => list.clone(),
            None => {
                let Some(list) = self.fetch_locales(conn, log).await? else {
                    return Ok(false);
                };
                locales.insert(list).clone()
            }
        };

        version.set("releaseStatus", resolved.release_status.as_str());
        if let Some(name) = &resolved.display_name {
            version.set("name", localized(&locales, name));
        }
        if let Some(icon) = &resolved.icon_path {
            let icon_path = artifact.base_dir().join(icon);
            if !self
                .inject_icon(conn, log, &icon_path, &mut version)
                .await?
            {
                return Ok(false);
            }
        }
        if let Some(changelog) = &resolved.changelog_path {
            let path = artifact.base_dir().join(changelog);
            inject_text(&mut version, "changelog", &path, &locales, log);
        }
        if let Some(description) = &resolved.description_path {
            let path = artifact.base_dir().join(description);
            inject_text(&mut version, "description", &path, &locales, log);
        }
        if let Some(version_name) = &resolved.version_name {
            version.set("versionName", version_name.as_str());
        }

        // Step 4: persist.
        match app.uuid().map(str::to_string) {
            None => {
                // Unpersisted app: its embedded version is created with it.
                let mut items: Vec<Value> =
                    versions.into_iter().map(Value::from).collect();
                items[index] = version.into();
                app.set("versions", items);

                log.line("Creating application...");
                let result = conn.execute(request::create_app(&app)).await?;
                if !result.is_ok() {
                    log.line(&format!(
                        "Creating application failed (status {}): {}",
                        result.status, result.message
                    ));
                    return Ok(false);
                }
                log.line(&format!("Application created for {}", file.display()));
                Ok(true)
            }
            Some(app_uuid) => {
                let result = conn
                    .execute(request::create_version(&app_uuid, &version))
                    .await?;
                if !result.is_ok() {
                    log.line(&format!(
                        "Creating version failed (status {}): {}",
                        result.status, result.message
                    ));
                    return Ok(false);
                }
                let created = result.results.into_iter().next().unwrap_or(version);
                log.line(&format!("Version published for {}", file.display()));

                self.manage_archive(conn, log, resolved, &app_uuid, &created, &versions)
                    .await
            }
        }
    }

    async fn fetch_locales(
        &self,
        conn: &mut dyn StoreConnection,
        log: &dyn BuildLog,
    ) -> Result<Option<Vec<String>>, ClientError> {
        let result = conn.execute(request::languages()).await?;
        if !result.is_ok() {
            log.line(&format!(
                "Could not list languages (status {}): {}",
                result.status, result.message
            ));
            return Ok(None);
        }
        let mut list: Vec<String> = result
            .results
            .iter()
            .filter_map(|d| d.str_field("locale").or_else(|| d.str_field("name")))
            .map(str::to_string)
            .collect();
        if list.is_empty() {
            list.push(FALLBACK_LOCALE.to_string());
        }
        debug!(locales = ?list, "configured locales");
        Ok(Some(list))
    }

    /// Uploads the icon as its own single-asset upload. Exactly one
    /// asset must come back.
    async fn inject_icon(
        &self,
        conn: &mut dyn StoreConnection,
        log: &dyn BuildLog,
        icon_path: &Path,
        version: &mut Document,
    ) -> Result<bool, ClientError> {
        // The upload endpoint keys on the `file` field regardless of
        // what the asset is used for.
        let part = match Part::from_path("file", icon_path) {
            Ok(part) => part,
            Err(e) => {
                log.line(&format!(
                    "Publishing without icon, {} unreadable: {e}",
                    icon_path.display()
                ));
                return Ok(true);
            }
        };

        let result = conn.execute(request::upload_files(vec![part])).await?;
        if !result.is_ok() || result.results.len() != 1 {
            log.line(&format!(
                "Icon upload must return exactly one asset, got {} (status {})",
                result.results.len(),
                result.status
            ));
            return Ok(false);
        }
        version.set("icon", result.results[0].clone());
        Ok(true)
    }

    /// Deletes prior versions sharing the new version's release status
    /// under `Overwrite`; otherwise leaves them as archived history.
    async fn manage_archive(
        &self,
        conn: &mut dyn StoreConnection,
        log: &dyn BuildLog,
        resolved: &ResolvedPublication,
        app_uuid: &str,
        created: &Document,
        versions: &[Document],
    ) -> Result<bool, ClientError> {
        if resolved.archive_mode != ArchiveMode::Overwrite {
            return Ok(true);
        }

        let status = created
            .str_field("releaseStatus")
            .unwrap_or(resolved.release_status.as_str())
            .to_string();
        let code = created.i64_field("versionCode");

        let mut ok = true;
        for candidate in archive_candidates(versions, &status, code) {
            let Some(candidate_uuid) = candidate.uuid() else {
                continue;
            };
            log.line(&format!("Removing superseded version {candidate_uuid}"));
            let result = conn
                .execute(request::delete_version(app_uuid, candidate_uuid))
                .await?;
            if !result.is_ok() {
                // Keep archiving the remaining candidates.
                log.line(&format!(
                    "Removing version {candidate_uuid} failed (status {}): {}",
                    result.status, result.message
                ));
                ok = false;
            }
        }
        Ok(ok)
    }
}

/// Existing versions eligible for archival: same release status as the
/// new version, different version code (the new version itself is
/// excluded by its equal code).
fn archive_candidates<'a>(
    versions: &'a [Document],
    release_status: &str,
    version_code: Option<i64>,
) -> Vec<&'a Document> {
    versions
        .iter()
        .filter(|v| {
            v.str_field("releaseStatus") == Some(release_status)
                && match (v.i64_field("versionCode"), version_code) {
                    (Some(a), Some(b)) => a != b,
                    // Without both codes there is no proof this is a
                    // different version.
                    _ => false,
                }
        })
        .collect()
}

/// Reads a text file, truncates it to the character budget, fans it out
/// to every locale, and logs a break-tag preview.
fn inject_text(
    version: &mut Document,
    field: &str,
    path: &Path,
    locales: &[String],
    log: &dyn BuildLog,
) {
    match text::load_text(path) {
        Ok(raw) => {
            let value = text::truncate_with_ellipsis(&raw, text::TEXT_LIMIT);
            log.line(&format!("{field}: {}", text::newlines_to_br(&value)));
            version.set(field, localized(locales, &value));
        }
        Err(e) => log.line(&format!(
            "Publishing without {field}, {} unreadable: {e}",
            path.display()
        )),
    }
}

/// Replicates one text identically into every configured locale.
fn localized(locales: &[String], value: &str) -> Value {
    let mut map = serde_json::Map::new();
    for locale in locales {
        map.insert(locale.clone(), Value::String(value.to_string()));
    }
    Value::Object(map)
}
