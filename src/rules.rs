//! Rules generator (component D): turns a [`Pool`] plus a [`Request`] plus
//! installed state into a [`ClauseDb`], deterministically.

use std::collections::HashSet;
use std::fmt;

use crate::pool::Pool;
use crate::request::{JobKind, Request};
use crate::sat::clause::ClauseDb;
use crate::sat::types::{Lit, mk_lit};
use crate::version::Requirement;

/// Why a clause exists. Never consulted by propagation or conflict
/// analysis — purely advisory, consumed by [`crate::diagnostics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReasonTag {
    /// Invariant I1: at most one installed version per name.
    PackageRule,
    /// A package's `install_requires` entry.
    DependencyRule { package: String, requirement: String },
    /// A package's `conflicts` entry against a specific other package.
    ConflictRule { from: String, to: String },
    /// A job from the request (`install`/`remove`/`update`).
    JobRule { description: String },
    /// Reserved for the installed-bias rule; never becomes a hard clause
    /// (§4.D.4 implements it as a policy bias instead), kept so
    /// diagnostics has a tag to attribute bias-driven choices to.
    InstalledRule,
    /// Produced by conflict analysis during search.
    Learned,
}

impl fmt::Display for ReasonTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReasonTag::PackageRule => write!(f, "at most one version of a package may be installed"),
            ReasonTag::DependencyRule { package, requirement } => {
                write!(f, "{package} requires {requirement}")
            }
            ReasonTag::ConflictRule { from, to } => write!(f, "{from} conflicts with {to}"),
            ReasonTag::JobRule { description } => write!(f, "requested: {description}"),
            ReasonTag::InstalledRule => write!(f, "already installed"),
            ReasonTag::Learned => write!(f, "derived during search"),
        }
    }
}

/// An install/update job's candidate disjunction, exposed to the policy so
/// it can implement decision step 1 of §4.F: branch `true` on the most
/// preferred still-unassigned candidate before falling back to VSIDS.
#[derive(Debug, Clone)]
pub struct JobDisjunction {
    pub description: String,
    pub literals: Vec<Lit>,
}

/// A rule-generation failure that must short-circuit the solve before CDCL
/// starts (§7 taxonomy entries 1 root cause and 2).
#[derive(Debug, Clone)]
pub enum RuleError {
    /// A job's requirement has no matching candidate in the pool at all.
    NoCandidate(Requirement),
    /// Strict mode: a package's dependency has no candidate, so the would-be
    /// unit "forbid this package" clause is refused in favor of surfacing
    /// the problem immediately.
    MissingInstallRequires {
        package: String,
        requirement: Requirement,
    },
}

/// The output of rule generation: every clause, plus the job disjunctions
/// the policy needs, plus the set of names an explicit `Remove`/`Update`
/// job targets (suppressing the installed-bias default for those names).
pub struct Rules {
    pub clauses: ClauseDb,
    pub job_disjunctions: Vec<JobDisjunction>,
    pub suppressed_bias_names: HashSet<String>,
}

/// Translate `pool` + `request` into clauses. Deterministic: identical pool
/// ordering and request produce an identical clause sequence.
pub fn generate(pool: &Pool, request: &Request, strict: bool) -> Result<Rules, RuleError> {
    let mut clauses = ClauseDb::new(pool.num_ids());
    let mut job_disjunctions = Vec::new();
    let mut suppressed_bias_names = HashSet::new();

    // 1. Dependency rules.
    for id in pool.all_ids() {
        let pkg = pool.package_of(id);
        for req in &pkg.install_requires {
            let candidates = pool.ids_matching(req);
            if candidates.is_empty() {
                if strict {
                    return Err(RuleError::MissingInstallRequires {
                        package: pkg.to_string(),
                        requirement: req.clone(),
                    });
                }
                clauses.add_clause(
                    vec![mk_lit(id, false)],
                    ReasonTag::DependencyRule {
                        package: pkg.to_string(),
                        requirement: req.to_string(),
                    },
                    false,
                );
                continue;
            }
            let mut lits = vec![mk_lit(id, false)];
            lits.extend(candidates.iter().map(|&c| mk_lit(c, true)));
            clauses.add_clause(
                lits,
                ReasonTag::DependencyRule {
                    package: pkg.to_string(),
                    requirement: req.to_string(),
                },
                false,
            );
        }
    }

    // 2. Conflict rules.
    for id in pool.all_ids() {
        let pkg = pool.package_of(id);
        for req in &pkg.conflicts {
            for other in pool.ids_matching(req) {
                if other == id {
                    continue;
                }
                clauses.add_clause(
                    vec![mk_lit(id, false), mk_lit(other, false)],
                    ReasonTag::ConflictRule {
                        from: pkg.to_string(),
                        to: pool.package_of(other).to_string(),
                    },
                    false,
                );
            }
        }
    }

    // 3. Same-name exclusion (invariant I1).
    let mut names: Vec<&str> = pool.names().collect();
    names.sort_unstable();
    for name in names {
        let ids = pool.ids_with_name(name);
        for i in 0..ids.len() {
            for &other in &ids[i + 1..] {
                clauses.add_clause(
                    vec![mk_lit(ids[i], false), mk_lit(other, false)],
                    ReasonTag::PackageRule,
                    false,
                );
            }
        }
    }

    // 5. Job rules.
    for job in &request.jobs {
        match job.kind {
            JobKind::Install => {
                let candidates = pool.ids_matching(&job.requirement);
                if candidates.is_empty() {
                    return Err(RuleError::NoCandidate(job.requirement.clone()));
                }
                let description = format!("install {}", job.requirement);
                let lits: Vec<Lit> = candidates.iter().map(|&c| mk_lit(c, true)).collect();
                job_disjunctions.push(JobDisjunction {
                    description: description.clone(),
                    literals: lits.clone(),
                });
                clauses.add_clause(lits, ReasonTag::JobRule { description }, false);
            }
            JobKind::Remove => {
                suppressed_bias_names.insert(job.requirement.name.clone());
                let description = format!("remove {}", job.requirement);
                for id in pool.ids_matching(&job.requirement) {
                    if pool.is_installed(id) {
                        clauses.add_clause(
                            vec![mk_lit(id, false)],
                            ReasonTag::JobRule {
                                description: description.clone(),
                            },
                            false,
                        );
                    }
                }
            }
            JobKind::Update => {
                suppressed_bias_names.insert(job.requirement.name.clone());
                let candidates = if job.requirement.constraints.is_empty() {
                    // No version given: update every installed package
                    // whose name matches (§4.D.5).
                    pool.ids_with_name(&job.requirement.name)
                } else {
                    pool.ids_matching(&job.requirement)
                };
                if candidates.is_empty() {
                    return Err(RuleError::NoCandidate(job.requirement.clone()));
                }
                let description = format!("update {}", job.requirement.name);
                let lits: Vec<Lit> = candidates.iter().map(|&c| mk_lit(c, true)).collect();
                job_disjunctions.push(JobDisjunction {
                    description: description.clone(),
                    literals: lits.clone(),
                });
                clauses.add_clause(lits, ReasonTag::JobRule { description }, false);
            }
        }
    }

    Ok(Rules {
        clauses,
        job_disjunctions,
        suppressed_bias_names,
    })
}
