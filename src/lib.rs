//! `depsolve`: a CDCL-based dependency solver for version-constrained
//! package universes.
//!
//! The crate is organized as a pipeline: [`pool`] interns packages from one
//! or more [`package::Repository`] values into dense ids, [`rules`]
//! compiles a [`request::Request`] against the pool into a [`sat::ClauseDb`],
//! [`sat`] searches for a satisfying assignment, [`policy`] drives its
//! branching decisions, and [`transaction`] (optionally filtered by
//! [`pruner`]) turns the result into an ordered list of operations. Both
//! [`version`] and [`sat`] are treated as self-contained building blocks:
//! the solving engine never branches on how a version comparison or a unit
//! propagation step is implemented, only on their results.

pub mod diagnostics;
pub mod error;
pub mod package;
pub mod policy;
pub mod pool;
pub mod pruner;
pub mod request;
pub mod rules;
pub mod sat;
pub mod scenario;
pub mod transaction;
pub mod version;

use std::collections::HashSet;

use log::{debug, info};

pub use error::SolveError;
pub use package::{Package, Repository};
pub use pool::Pool;
pub use request::Request;
pub use transaction::Transaction;
pub use version::{Requirement, Version};

use crate::policy::Policy;
use crate::sat::{SatOutcome, SatSolver};
use crate::transaction::Operation;

/// Knobs a library caller sets directly (§10.3) — the CLI's `Cli` struct is
/// the only thing that parses text into this.
#[derive(Debug, Clone, Copy)]
pub struct SolveOptions {
    /// Drop solver-introduced installs unreachable from any job
    /// requirement (§4.H). On by default.
    pub use_pruning: bool,
    /// Refuse to silently forbid a package whose `install_requires` has no
    /// candidate; raise `MissingInstallRequires` instead (§4.D, §7.2).
    pub strict: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            use_pruning: true,
            strict: false,
        }
    }
}

/// Solve `request` against the union of `remote_repos` and `installed_repo`,
/// returning the transaction to apply (§6).
pub fn solve(
    remote_repos: &[&Repository],
    installed_repo: &Repository,
    request: &Request,
    options: SolveOptions,
) -> Result<Transaction, SolveError> {
    let mut pool = Pool::new();
    for repo in remote_repos {
        pool.intern_repository(repo);
    }
    pool.intern_installed_repository(installed_repo);

    debug!("generating rules over {} pool ids", pool.num_ids());
    let rules = rules::generate(&pool, request, options.strict)?;
    let suppressed = rules.suppressed_bias_names.clone();
    let mut policy = Policy::new(&pool, &rules.job_disjunctions, &suppressed, &request.adhoc_constraints);
    let mut solver = SatSolver::new(rules.clauses);

    match solver.solve(&mut policy) {
        SatOutcome::Satisfied => {
            info!("solved: {} policy decisions", policy.decision_log().len());
            let transaction = Transaction::build(&pool, installed_repo, solver.assignment());
            Ok(if options.use_pruning {
                pruner::prune(&pool, request, solver.assignment(), &transaction)
            } else {
                transaction
            })
        }
        SatOutcome::Unsatisfiable { conflict, learned_trail } => {
            let explanation = diagnostics::Explanation::build(&solver, conflict, &learned_trail);
            Err(SolveError::Satisfiability(explanation))
        }
    }
}

/// `true` iff a fresh install request for `requirements` against `repos`
/// solves without raising (§6, P4).
pub fn requirements_are_satisfiable(repos: &[&Repository], requirements: &[Requirement]) -> bool {
    let mut request = Request::new();
    for req in requirements {
        request.install(req.clone());
    }
    let installed = Repository::new();
    solve(repos, &installed, &request, SolveOptions::default()).is_ok()
}

/// `true` iff `requirements` already closes over its own dependencies
/// inside `repos`: solving it installs nothing beyond what `requirements`
/// itself names (§6).
pub fn requirements_are_complete(repos: &[&Repository], requirements: &[Requirement]) -> bool {
    let mut request = Request::new();
    for req in requirements {
        request.install(req.clone());
    }
    let installed = Repository::new();
    let options = SolveOptions {
        use_pruning: false,
        strict: false,
    };
    let Ok(transaction) = solve(repos, &installed, &request, options) else {
        return false;
    };

    let installed_names: HashSet<&str> = transaction
        .operations()
        .iter()
        .filter_map(|op| match op {
            Operation::Install(p) => Some(p.name.as_str()),
            Operation::Remove(_) => None,
        })
        .collect();
    let requirement_names: HashSet<&str> = requirements.iter().map(|r| r.name.as_str()).collect();
    installed_names.is_subset(&requirement_names)
}

/// `true` iff every package in `repo` has a satisfiable `install_requires`
/// from within `repo` itself (§6).
pub fn repository_is_consistent(repo: &Repository) -> bool {
    repo.iter()
        .all(|pkg| pkg.install_requires.iter().all(|req| !repo.packages_matching(req).is_empty()))
}

/// Project `repos` down to exactly the packages reachable from
/// `requirements` by walking `install_requires` — idempotent (P5): running
/// it again over its own output with the same requirements changes
/// nothing.
pub fn repository_from_requirements(repos: &[&Repository], requirements: &[Requirement]) -> Repository {
    let mut pool = Pool::new();
    for repo in repos {
        pool.intern_repository(repo);
    }

    let mut reachable = HashSet::new();
    let mut frontier = Vec::new();
    for req in requirements {
        for id in pool.ids_matching(req) {
            if reachable.insert(id) {
                frontier.push(id);
            }
        }
    }
    while let Some(id) = frontier.pop() {
        for req in &pool.package_of(id).install_requires {
            for dep_id in pool.ids_matching(req) {
                if reachable.insert(dep_id) {
                    frontier.push(dep_id);
                }
            }
        }
    }

    let mut ids: Vec<_> = reachable.into_iter().collect();
    ids.sort_unstable();
    let mut projected = Repository::new();
    for id in ids {
        projected.add_package(pool.package_of(id).clone());
    }
    projected
}

/// One exact-version requirement per package in `repo` (§6).
pub fn requirements_from_repository(repo: &Repository) -> Vec<Requirement> {
    repo.iter()
        .map(|p| Requirement::new(p.name.clone()).with_constraint(version::Constraint::EqualTo(p.version.clone())))
        .collect()
}
