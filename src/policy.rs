//! Decision heuristic (component F), consulted by the SAT core every time
//! a new branching literal is needed.

use std::collections::HashSet;

use log::trace;

use crate::pool::{Id, Pool};
use crate::request::AdhocConstraints;
use crate::rules::JobDisjunction;
use crate::sat::{BranchingPolicy, DecisionView, Lit, LitValue, Var, mk_lit, var_of};

/// One entry in the policy's decision log (§4.F), surfaced by the CLI's
/// `--debug` flag and by [`crate::diagnostics`].
#[derive(Debug, Clone)]
pub struct Decision {
    pub literal: Lit,
    pub reason: &'static str,
    pub sequence: u64,
}

/// The default branching policy described in §4.F: job-disjunction
/// candidates first, then VSIDS activity, with a default polarity that
/// favors the installed/preferred package.
pub struct Policy<'a> {
    pool: &'a Pool,
    job_disjunctions: &'a [JobDisjunction],
    suppressed_bias_names: &'a HashSet<String>,
    /// Union of `allow_newer`/`allow_any`/`allow_older` — names for which
    /// the default "prefer installed" polarity no longer applies (Open
    /// Question (a), recorded in `DESIGN.md`).
    adhoc_targets: HashSet<String>,
    log: Vec<Decision>,
    sequence: u64,
}

impl<'a> Policy<'a> {
    pub fn new(
        pool: &'a Pool,
        job_disjunctions: &'a [JobDisjunction],
        suppressed_bias_names: &'a HashSet<String>,
        adhoc_constraints: &AdhocConstraints,
    ) -> Self {
        Self {
            pool,
            job_disjunctions,
            suppressed_bias_names,
            adhoc_targets: adhoc_constraints.targets(),
            log: Vec::new(),
            sequence: 0,
        }
    }

    pub fn decision_log(&self) -> &[Decision] {
        &self.log
    }

    fn record(&mut self, literal: Lit, reason: &'static str) -> Lit {
        self.sequence += 1;
        trace!("policy decision #{}: {literal} ({reason})", self.sequence);
        self.log.push(Decision {
            literal,
            reason,
            sequence: self.sequence,
        });
        literal
    }

    /// Step 1 (§4.F): an install/update job whose candidates are all still
    /// unassigned — branch `true` on the most preferred one.
    fn job_disjunction_decision(&self, view: &DecisionView) -> Option<Lit> {
        for job in self.job_disjunctions {
            let all_unassigned = job
                .literals
                .iter()
                .all(|&lit| view.assignment.value_of(lit) == LitValue::Unassigned);
            if !all_unassigned {
                continue;
            }
            let candidates: Vec<Id> = job.literals.iter().map(|&lit| var_of(lit)).collect();
            let best = self.preferred_candidate(&candidates);
            return Some(mk_lit(best, true));
        }
        None
    }

    /// Already-installed (unless its name's bias is suppressed) beats
    /// newest-acceptable beats any — candidates arrive pre-sorted
    /// newest-first by [`Pool::ids_matching`], so "any" is just the head.
    fn preferred_candidate(&self, candidates: &[Id]) -> Id {
        for &id in candidates {
            let pkg = self.pool.package_of(id);
            if self.pool.is_installed(id) && !self.suppressed_bias_names.contains(&pkg.name) {
                return id;
            }
        }
        candidates[0]
    }

    /// Step 2 (§4.F): the highest-activity unassigned variable, pool order
    /// (smaller id, i.e. earlier ingestion) breaking ties.
    fn activity_decision(&self, view: &DecisionView) -> Option<Var> {
        (1..=view.num_vars as Var).filter(|&v| view.is_unassigned(v)).max_by(|&a, &b| {
            view.activity[a as usize]
                .partial_cmp(&view.activity[b as usize])
                .expect("activity is never NaN")
                .then_with(|| b.cmp(&a))
        })
    }

    /// Step 3 (§4.F): default to the installed polarity unless the
    /// package's name is a suppressed or ad-hoc-relaxed bias target.
    fn default_polarity(&self, id: Id) -> bool {
        let pkg = self.pool.package_of(id);
        if self.suppressed_bias_names.contains(&pkg.name) || self.adhoc_targets.contains(&pkg.name) {
            return false;
        }
        self.pool.is_installed(id)
    }
}

impl BranchingPolicy for Policy<'_> {
    fn decide(&mut self, view: &DecisionView) -> Option<Lit> {
        if let Some(lit) = self.job_disjunction_decision(view) {
            return Some(self.record(lit, "preferred job candidate"));
        }
        let var = self.activity_decision(view)?;
        let polarity = self.default_polarity(var);
        Some(self.record(mk_lit(var, polarity), "vsids fallback"))
    }
}
