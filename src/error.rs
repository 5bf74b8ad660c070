//! Crate-boundary error types (§7, §10.2). A single `thiserror`-derived
//! enum per concern, mirroring `alpm-solve`'s `error.rs` and the workspace
//! convention of one error type per crate rather than ad-hoc `String`s.

use thiserror::Error;

use crate::diagnostics::Explanation;
use crate::rules::RuleError;
use crate::version::Requirement;

/// Everything that can keep a top-level `solve` call from producing a
/// [`crate::transaction::Transaction`].
#[derive(Debug, Error)]
pub enum SolveError {
    /// CDCL reached the empty-clause state (taxonomy entry 1).
    #[error("no installation satisfies the request:\n{0}")]
    Satisfiability(Explanation),

    /// Strict mode only: a package's `install_requires` has no candidate
    /// (taxonomy entry 2).
    #[error("{package} requires {requirement}, which no candidate in the repository provides")]
    MissingInstallRequires {
        package: String,
        requirement: Requirement,
    },

    /// A requested job names a requirement with no matching candidate.
    #[error("no candidate in the repository satisfies {0}")]
    NoCandidate(Requirement),
}

impl From<RuleError> for SolveError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::NoCandidate(requirement) => SolveError::NoCandidate(requirement),
            RuleError::MissingInstallRequires { package, requirement } => {
                SolveError::MissingInstallRequires { package, requirement }
            }
        }
    }
}

/// Scenario-file loading failures (§10.4) — CLI and test-fixture tooling
/// only; the library's solving API never produces or consumes this type.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("reading scenario file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing scenario YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("parsing package string {text:?}: {reason}")]
    PackageString { text: String, reason: String },
}
