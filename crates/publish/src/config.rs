//! Publication configuration: endpoint defaults and per-run overrides.

use serde::{Deserialize, Serialize};

use relpush_client::ProxyConfig;
use relpush_protocol::{ArchiveMode, ReleaseStatus, Setting, UploadMode};

/// A configured store endpoint with its default publication settings.
///
/// Owned by the job/global configuration; immutable once a publish run
/// starts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Endpoint {
    pub url: String,
    pub user_name: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxySettings>,
    #[serde(default)]
    pub release_status: ReleaseStatus,
    #[serde(default)]
    pub archive_mode: ArchiveMode,
    #[serde(default)]
    pub upload_mode: UploadMode,
}

/// Proxy form fields as stored in the endpoint configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Endpoint {
    pub fn proxy_config(&self) -> Option<ProxyConfig> {
        self.proxy.as_ref().map(|p| ProxyConfig {
            host: p.host.clone(),
            port: p.port,
            username: p.username.clone(),
            password: p.password.clone(),
        })
    }
}

/// Per-run publication settings; unset fields inherit the endpoint's
/// defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublicationRequest {
    /// Glob selecting the artifacts to publish, relative to the
    /// workspace base directory. May hold several comma-separated
    /// patterns.
    pub artifact_glob: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_glob: Option<String>,
    #[serde(default, skip_serializing_if = "Setting::is_inherit")]
    pub release_status: Setting<ReleaseStatus>,
    #[serde(default, skip_serializing_if = "Setting::is_inherit")]
    pub archive_mode: Setting<ArchiveMode>,
    #[serde(default, skip_serializing_if = "Setting::is_inherit")]
    pub upload_mode: Setting<UploadMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_uuid: Option<String>,
}

impl PublicationRequest {
    /// Resolves every inheritable setting against the endpoint, once,
    /// at workflow entry.
    pub fn resolve(&self, endpoint: &Endpoint) -> ResolvedPublication {
        ResolvedPublication {
            artifact_glob: self.artifact_glob.clone(),
            exclude_glob: self.exclude_glob.clone(),
            release_status: self.release_status.resolve(endpoint.release_status),
            archive_mode: self.archive_mode.resolve(endpoint.archive_mode),
            upload_mode: self.upload_mode.resolve(endpoint.upload_mode),
            display_name: self.display_name.clone(),
            icon_path: self.icon_path.clone(),
            changelog_path: self.changelog_path.clone(),
            description_path: self.description_path.clone(),
            version_name: self.version_name.clone(),
            environment_uuid: self.environment_uuid.clone(),
        }
    }
}

/// Publication settings with all inheritance resolved.
#[derive(Debug, Clone)]
pub struct ResolvedPublication {
    pub artifact_glob: String,
    pub exclude_glob: Option<String>,
    pub release_status: ReleaseStatus,
    pub archive_mode: ArchiveMode,
    pub upload_mode: UploadMode,
    pub display_name: Option<String>,
    pub icon_path: Option<String>,
    pub changelog_path: Option<String>,
    pub description_path: Option<String>,
    pub version_name: Option<String>,
    pub environment_uuid: Option<String>,
}
