//! The user-facing request: an ordered list of jobs plus ad-hoc constraints
//! relaxing the default "prefer installed, no unrelated upgrade" bias.

use std::collections::HashSet;

use crate::version::Requirement;

/// What a [`Job`] asks the solver to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Install,
    Remove,
    Update,
}

/// One entry in a [`Request`]: a requirement plus the action to take on it.
#[derive(Debug, Clone)]
pub struct Job {
    pub requirement: Requirement,
    pub kind: JobKind,
}

/// Three disjoint-intent sets of package names that relax the default
/// "no downgrade, no unrelated upgrade" policy bias (§3, §4.D.6).
#[derive(Debug, Clone, Default)]
pub struct AdhocConstraints {
    pub allow_newer: HashSet<String>,
    pub allow_any: HashSet<String>,
    pub allow_older: HashSet<String>,
}

impl AdhocConstraints {
    pub fn targets(&self) -> HashSet<String> {
        self.allow_newer
            .union(&self.allow_any)
            .chain(self.allow_older.iter())
            .cloned()
            .collect()
    }
}

/// An ordered list of jobs plus ad-hoc constraints: the full input to one
/// `solve` call.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub jobs: Vec<Job>,
    pub adhoc_constraints: AdhocConstraints,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&mut self, requirement: Requirement) -> &mut Self {
        self.jobs.push(Job {
            requirement,
            kind: JobKind::Install,
        });
        self
    }

    pub fn remove(&mut self, requirement: Requirement) -> &mut Self {
        self.jobs.push(Job {
            requirement,
            kind: JobKind::Remove,
        });
        self
    }

    pub fn update(&mut self, requirement: Requirement) -> &mut Self {
        self.jobs.push(Job {
            requirement,
            kind: JobKind::Update,
        });
        self
    }

    pub fn allow_newer(&mut self, name: impl Into<String>) -> &mut Self {
        self.adhoc_constraints.allow_newer.insert(name.into());
        self
    }

    pub fn allow_any(&mut self, name: impl Into<String>) -> &mut Self {
        self.adhoc_constraints.allow_any.insert(name.into());
        self
    }

    pub fn allow_older(&mut self, name: impl Into<String>) -> &mut Self {
        self.adhoc_constraints.allow_older.insert(name.into());
        self
    }
}
