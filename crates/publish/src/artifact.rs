//! One publish target and its running outcome.

use std::path::{Path, PathBuf};

use crate::config::{Endpoint, PublicationRequest};
use crate::outcome::BuildOutcome;

/// A single publish target: endpoint, workspace base path, per-run
/// request, and the build outcome as it evolves. Created once per
/// target, never shared across concurrent runs.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub endpoint: Endpoint,
    pub base_dir: PathBuf,
    pub request: PublicationRequest,
    outcome: BuildOutcome,
}

impl Artifact {
    pub fn new(
        endpoint: Endpoint,
        base_dir: impl Into<PathBuf>,
        request: PublicationRequest,
        incoming: BuildOutcome,
    ) -> Artifact {
        Artifact {
            endpoint,
            base_dir: base_dir.into(),
            request,
            outcome: incoming,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn outcome(&self) -> BuildOutcome {
        self.outcome
    }

    /// Escalates the run's outcome; never downgrades.
    pub fn escalate(&mut self, outcome: BuildOutcome) {
        self.outcome = self.outcome.escalate(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalation_never_downgrades() {
        let mut artifact = Artifact::new(
            Endpoint::default(),
            "/tmp/ws",
            PublicationRequest::default(),
            BuildOutcome::Unstable,
        );
        artifact.escalate(BuildOutcome::Success);
        assert_eq!(artifact.outcome(), BuildOutcome::Unstable);
        artifact.escalate(BuildOutcome::Failure);
        assert_eq!(artifact.outcome(), BuildOutcome::Failure);
    }
}
