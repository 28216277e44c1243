//! Build outcome of a publish run.

use std::fmt;

/// Ordered build outcome. Aggregation only escalates: once a run has
/// reached an outcome it is never downgraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildOutcome {
    Success,
    Aborted,
    NotBuilt,
    Unstable,
    Failure,
}

impl BuildOutcome {
    /// Monotone aggregation: the worse of the two outcomes.
    pub fn escalate(self, other: BuildOutcome) -> BuildOutcome {
        self.max(other)
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildOutcome::Success => "SUCCESS",
            BuildOutcome::Aborted => "ABORTED",
            BuildOutcome::NotBuilt => "NOT_BUILT",
            BuildOutcome::Unstable => "UNSTABLE",
            BuildOutcome::Failure => "FAILURE",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BuildOutcome::*;

    #[test]
    fn ordering_is_success_to_failure() {
        assert!(Success < Aborted);
        assert!(Aborted < NotBuilt);
        assert!(NotBuilt < Unstable);
        assert!(Unstable < Failure);
    }

    #[test]
    fn escalation_is_monotone() {
        let mut outcome = Success;
        for step in [Unstable, NotBuilt, Success, Aborted] {
            let before = outcome;
            outcome = outcome.escalate(step);
            assert!(outcome >= before);
        }
        assert_eq!(outcome, Unstable);
        assert_eq!(Failure.escalate(Success), Failure);
    }
}
