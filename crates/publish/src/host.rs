//! Narrow collaborator interfaces toward the host build environment.
//!
//! The workflow never depends on the host's types directly: it gets a
//! console line sink and a file-enumeration service, with defaults
//! usable outside any build framework.

use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::info;
use walkdir::WalkDir;

/// Console sink for user-visible build log lines.
pub trait BuildLog: Send + Sync {
    fn line(&self, message: &str);
}

/// Default sink: forwards build lines to `tracing`.
#[derive(Debug, Default)]
pub struct TracingLog;

impl BuildLog for TracingLog {
    fn line(&self, message: &str) {
        info!(target: "relpush::console", "{message}");
    }
}

/// File-enumeration service matching globs under a base directory.
pub trait FileFinder: Send + Sync {
    /// Returns the files under `base` matching `include` and not
    /// matching `exclude`. Patterns may be comma-separated lists.
    fn find(
        &self,
        base: &Path,
        include: &str,
        exclude: Option<&str>,
    ) -> io::Result<Vec<PathBuf>>;
}

/// Default finder: `globset` patterns over a `walkdir` traversal.
///
/// Matching is against the path relative to `base`, normalized to
/// forward slashes. Results are sorted for a deterministic publish
/// order.
#[derive(Debug, Default)]
pub struct GlobFinder;

impl FileFinder for GlobFinder {
    fn find(
        &self,
        base: &Path,
        include: &str,
        exclude: Option<&str>,
    ) -> io::Result<Vec<PathBuf>> {
        let include_set = build_glob_set(include)?;
        let exclude_set = match exclude {
            Some(patterns) => Some(build_glob_set(patterns)?),
            None => None,
        };

        let mut matches = Vec::new();
        for entry in WalkDir::new(base) {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = match entry.path().strip_prefix(base) {
                Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };
            if !include_set.is_match(&rel) {
                continue;
            }
            if let Some(excluded) = &exclude_set {
                if excluded.is_match(&rel) {
                    continue;
                }
            }
            matches.push(entry.path().to_path_buf());
        }

        matches.sort();
        Ok(matches)
    }
}

/// Builds one matcher from a comma-separated pattern list.
fn build_glob_set(patterns: &str) -> io::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns.split(',') {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            continue;
        }
        builder.add(Glob::new(pattern).map_err(io::Error::other)?);
    }
    builder.build().map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("target/release")).unwrap();
        fs::write(root.join("target/release/app.zip"), b"PK\x03\x04").unwrap();
        fs::write(root.join("target/release/app-debug.zip"), b"PK\x03\x04").unwrap();
        fs::write(root.join("target/release/notes.txt"), b"notes").unwrap();
        fs::write(root.join("readme.md"), b"# hi").unwrap();
        dir
    }

    #[test]
    fn include_glob_matches_relative_paths() {
        let dir = workspace();
        let files = GlobFinder
            .find(dir.path(), "target/**/*.zip", None)
            .unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "zip"));
    }

    #[test]
    fn exclude_glob_filters_matches() {
        let dir = workspace();
        let files = GlobFinder
            .find(dir.path(), "target/**/*.zip", Some("**/*-debug.zip"))
            .unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("target/release/app.zip"));
    }

    #[test]
    fn comma_separated_patterns() {
        let dir = workspace();
        let files = GlobFinder
            .find(dir.path(), "**/*.zip, **/*.md", Some("**/*-debug.zip"))
            .unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn no_matches_is_empty_not_error() {
        let dir = workspace();
        let files = GlobFinder.find(dir.path(), "**/*.ipa", None).unwrap();
        assert!(files.is_empty());
    }
}
