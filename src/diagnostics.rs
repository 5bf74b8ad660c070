//! UNSAT-to-human-message rendering (component I). Purely advisory: this
//! module never drives solver control flow, it only explains a failure
//! the SAT core has already returned.

use std::collections::BTreeMap;
use std::fmt;

use crate::rules::ReasonTag;
use crate::sat::{ClauseId, SatSolver};

/// Every original rule transitively involved in an UNSAT conflict,
/// rendered one line per rule, grouped by kind.
#[derive(Debug, Clone)]
pub struct Explanation {
    lines: Vec<String>,
}

impl Explanation {
    /// Walk the learned-clause stack from `conflict` back to the original
    /// rules that produced it (via [`SatSolver::involved_original_clauses`])
    /// and render them. `solver` is the same instance that produced the
    /// conflict — original clause ids are stable for its whole lifetime
    /// (§4.E tombstoning), so its own clause database is the source of
    /// truth for every rule's [`ReasonTag`].
    pub fn build(solver: &SatSolver, conflict: ClauseId, learned_trail: &[ClauseId]) -> Self {
        let involved = solver.involved_original_clauses(conflict, learned_trail);
        let mut by_kind: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
        for id in involved {
            let reason = &solver.db().clause(id).reason;
            let (kind, text) = describe(reason);
            by_kind.entry(kind).or_default().push(text);
        }
        let mut lines = Vec::new();
        for (_, mut texts) in by_kind {
            texts.sort();
            texts.dedup();
            lines.extend(texts);
        }
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

fn describe(reason: &ReasonTag) -> (&'static str, String) {
    let kind = match reason {
        ReasonTag::PackageRule => "package",
        ReasonTag::DependencyRule { .. } => "dependency",
        ReasonTag::ConflictRule { .. } => "conflict",
        ReasonTag::JobRule { .. } => "job",
        ReasonTag::InstalledRule => "installed",
        ReasonTag::Learned => "derived",
    };
    (kind, reason.to_string())
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{Package, Repository};
    use crate::pool::Pool;
    use crate::request::Request;
    use crate::sat::{BranchingPolicy, DecisionView, Lit, SatOutcome};
    use crate::version::{Requirement, Version};

    fn pkg(name: &str, version: &str) -> Package {
        Package::new(name, Version::parse(version).unwrap())
    }

    struct FirstUnassigned;
    impl BranchingPolicy for FirstUnassigned {
        fn decide(&mut self, view: &DecisionView) -> Option<Lit> {
            for var in 1..=view.num_vars as u32 {
                if view.is_unassigned(var) {
                    return Some(var as Lit);
                }
            }
            None
        }
    }

    #[test]
    fn explanation_cites_the_conflicting_rules() {
        let mut repo = Repository::new();
        repo.add_package(pkg("mkl", "10.3.1").depends_on(Requirement::new("missing")));
        let mut pool = Pool::new();
        pool.intern_repository(&repo);
        let mut request = Request::new();
        request.install(Requirement::new("mkl"));
        let rules = crate::rules::generate(&pool, &request, false).unwrap();

        let mut solver = SatSolver::new(rules.clauses);
        let outcome = solver.solve(&mut FirstUnassigned);
        let SatOutcome::Unsatisfiable { conflict, learned_trail } = outcome else {
            panic!("expected unsatisfiable result");
        };
        let explanation = Explanation::build(&solver, conflict, &learned_trail);
        assert!(!explanation.lines().is_empty());
        assert!(explanation.lines().iter().any(|l| l.contains("mkl")));
    }
}
