//! Choice constants for publication settings.
//!
//! Per-request settings share a "fall back to the endpoint default"
//! idiom, modeled as [`Setting`] with an explicit `Inherit` variant and
//! resolved once when a publish run starts.

use serde::{Deserialize, Serialize};

/// Release status assigned to a published version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReleaseStatus {
    #[default]
    Development,
    Review,
    Release,
}

impl ReleaseStatus {
    /// Wire value used in version documents and query fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseStatus::Development => "DEVELOPMENT",
            ReleaseStatus::Review => "REVIEW",
            ReleaseStatus::Release => "RELEASE",
        }
    }
}

/// What happens to prior versions sharing the new version's release status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArchiveMode {
    /// Keep them as archived history.
    #[default]
    Archive,
    /// Delete them after the new version is created.
    Overwrite,
}

/// Which publish protocol to speak against the server.
///
/// Strategy selection is an explicit configuration choice; it is never
/// inferred from the server version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UploadMode {
    /// One multipart POST per artifact carrying all fields.
    SingleRequest,
    /// Upload assets individually, then metadata/create/archive calls.
    #[default]
    MultiRequest,
}

/// A per-request setting that may inherit the endpoint default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Setting<T> {
    /// No override configured; use the endpoint's value.
    #[default]
    Inherit,
    Value(T),
}

impl<T> Setting<T> {
    /// Resolves the setting against the endpoint default.
    pub fn resolve(self, default: T) -> T {
        match self {
            Setting::Inherit => default,
            Setting::Value(v) => v,
        }
    }

    pub fn is_inherit(&self) -> bool {
        matches!(self, Setting::Inherit)
    }
}
