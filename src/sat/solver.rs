//! The CDCL search loop (component E): unit propagation over watched
//! literals, conflict-driven backjumping, VSIDS activity, Luby restarts,
//! and periodic clause database reduction.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use super::clause::{ClauseDb, ClauseId, is_locked};
use super::types::{Assignment, Lit, LitValue, Var, var_of};
use crate::rules::ReasonTag;

/// Consulted by the search loop every time a new decision literal is
/// needed (§4.F). Implementations never touch clauses directly — only the
/// current assignment and the solver's per-variable activity scores.
pub trait BranchingPolicy {
    /// Return the next literal to branch `true` on, or `None` once every
    /// variable already has a value.
    fn decide(&mut self, view: &DecisionView) -> Option<Lit>;
}

/// The slice of solver state a [`BranchingPolicy`] is allowed to see.
pub struct DecisionView<'a> {
    pub assignment: &'a Assignment,
    pub activity: &'a [f64],
    pub num_vars: usize,
}

impl DecisionView<'_> {
    pub fn is_unassigned(&self, var: Var) -> bool {
        self.assignment.value_of_var(var).is_none()
    }
}

/// Terminal outcome of [`SatSolver::solve`].
pub enum SatOutcome {
    Satisfied,
    Unsatisfiable {
        /// The clause whose falsification produced the empty-clause state.
        conflict: ClauseId,
        /// Every clause learned during the search, oldest first, consumed
        /// by [`crate::diagnostics`].
        learned_trail: Vec<ClauseId>,
    },
}

const ACTIVITY_RESCALE_THRESHOLD: f64 = 1e100;
const ACTIVITY_DECAY: f64 = 0.95;
const RESTART_BASE: u64 = 100;
const REDUCE_BASE: usize = 2000;
const REDUCE_GROWTH: usize = 300;

/// An internal invariant was violated — this is always a solver bug, never
/// a property of the input, so it aborts rather than returning a `Result`
/// (§4.E failure semantics).
fn invariant(condition: bool, msg: &str) {
    if !condition {
        panic!("sat core invariant violated: {msg}");
    }
}

enum PropagateResult {
    Keep,
    Moved,
    Conflict,
}

/// Owns the clause database and the assignment for one `solve` call. Not
/// reused across calls — `rules::generate` builds a fresh [`ClauseDb`] per
/// request, and a fresh `SatSolver` wraps it (§5: single-threaded, no
/// shared state across solves).
pub struct SatSolver {
    db: ClauseDb,
    assign: Assignment,
    activity: Vec<f64>,
    activity_inc: f64,
    conflicts_since_restart: u64,
    luby_index: u64,
    reductions: usize,
    learned_trail: Vec<ClauseId>,
    qhead: usize,
    /// For each learned clause, the set of *original* (non-learned) clause
    /// ids resolved into it, transitively through any learned antecedents
    /// — consumed by [`crate::diagnostics`] to explain an UNSAT result.
    antecedents: HashMap<ClauseId, HashSet<ClauseId>>,
}

impl SatSolver {
    pub fn new(db: ClauseDb) -> Self {
        let num_vars = db.num_vars();
        Self {
            assign: Assignment::new(num_vars),
            activity: vec![0.0; num_vars + 1],
            activity_inc: 1.0,
            conflicts_since_restart: 0,
            luby_index: 1,
            reductions: 0,
            learned_trail: Vec::new(),
            qhead: 0,
            antecedents: HashMap::new(),
            db,
        }
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assign
    }

    pub fn db(&self) -> &ClauseDb {
        &self.db
    }

    pub fn activity(&self) -> &[f64] {
        &self.activity
    }

    /// Enqueue every clause that is a unit at construction time (single-
    /// literal job/dependency rules never get watches, so propagation alone
    /// would never see them). Returns the falsified clause on an immediate
    /// contradiction between two unit clauses.
    fn enqueue_initial_units(&mut self) -> Option<ClauseId> {
        for id in self.db.all_ids().collect::<Vec<_>>() {
            let lits = self.db.literals(id);
            if lits.len() == 1 {
                let lit = lits[0];
                match self.assign.value_of(lit) {
                    LitValue::True => {}
                    LitValue::False => return Some(id),
                    LitValue::Unassigned => self.assign.enqueue(lit, Some(id)),
                }
            }
        }
        None
    }

    /// Run the search to completion, consulting `policy` for every
    /// decision. States follow §4.E: `Ready → Propagating → (Satisfied |
    /// Conflict → Analysing → Backjumping → Propagating) → Unsatisfiable`.
    pub fn solve(&mut self, policy: &mut dyn BranchingPolicy) -> SatOutcome {
        if let Some(conflict) = self.enqueue_initial_units() {
            return self.unsat(conflict);
        }
        if let Some(conflict) = self.propagate() {
            return self.unsat(conflict);
        }

        loop {
            let view = DecisionView {
                assignment: &self.assign,
                activity: &self.activity,
                num_vars: self.db.num_vars(),
            };
            let Some(decision) = policy.decide(&view) else {
                return SatOutcome::Satisfied;
            };

            self.assign.new_decision_level();
            trace!("decide {decision} at level {}", self.assign.decision_level());
            self.assign.enqueue(decision, None);

            while let Some(conflict_id) = self.propagate() {
                self.conflicts_since_restart += 1;
                if self.assign.decision_level() == 0 {
                    return self.unsat(conflict_id);
                }

                let (learnt, backjump_level, involved) = self.analyze(conflict_id);
                let learnt_id = self.record_learned_clause(learnt);
                self.antecedents.insert(learnt_id, involved);
                self.learned_trail.push(learnt_id);
                debug!(
                    "conflict #{}: learned {} literal(s), backjump to level {backjump_level}",
                    self.conflicts_since_restart,
                    self.db.literals(learnt_id).len()
                );

                self.assign.cancel_until(backjump_level);
                self.qhead = self.assign.trail.len();
                let unit = self.db.literals(learnt_id)[0];
                self.assign.enqueue(unit, Some(learnt_id));

                if self.should_restart() {
                    trace!("restart after {} conflicts", self.conflicts_since_restart);
                    self.assign.cancel_until(0);
                    self.qhead = self.assign.trail.len();
                    self.conflicts_since_restart = 0;
                    self.luby_index += 1;
                }
                if self.db.learned_count() > self.reduce_threshold() {
                    self.reduce();
                }
            }
        }
    }

    /// Drain the propagation queue, returning the first falsified clause.
    fn propagate(&mut self) -> Option<ClauseId> {
        while self.qhead < self.assign.trail.len() {
            let lit = self.assign.trail[self.qhead];
            self.qhead += 1;
            if let Some(conflict) = self.propagate_literal(lit) {
                return Some(conflict);
            }
        }
        None
    }

    /// Revisit every clause watching `-lit` now that `lit` is true (so
    /// `-lit` just became false in each of them).
    fn propagate_literal(&mut self, lit: Lit) -> Option<ClauseId> {
        let watchers = self.db.take_watches(lit);
        let mut keep = Vec::with_capacity(watchers.len());
        let mut conflict = None;
        let mut idx = 0;
        while idx < watchers.len() {
            let clause_id = watchers[idx];
            idx += 1;
            if self.db.is_deleted(clause_id) {
                continue;
            }
            match self.propagate_clause(clause_id, lit) {
                PropagateResult::Keep => keep.push(clause_id),
                PropagateResult::Moved => {}
                PropagateResult::Conflict => {
                    keep.push(clause_id);
                    keep.extend_from_slice(&watchers[idx..]);
                    conflict = Some(clause_id);
                    break;
                }
            }
        }
        self.db.restore_watches(lit, keep);
        conflict
    }

    /// `false_lit` just became true, so `-false_lit` is now false in
    /// `clause_id`. Find a replacement watch, propagate the forced unit, or
    /// report a conflict.
    fn propagate_clause(&mut self, clause_id: ClauseId, false_lit: Lit) -> PropagateResult {
        let false_of = -false_lit;
        {
            let clause = self.db.clause_mut(clause_id);
            invariant(clause.literals.len() >= 2, "watched clause has fewer than two literals");
            if clause.literals[0] == false_of {
                clause.literals.swap(0, 1);
            }
            invariant(clause.literals[1] == false_of, "clause is not watching the falsified literal");
        }
        let other = self.db.literals(clause_id)[0];
        if self.assign.value_of(other) == LitValue::True {
            return PropagateResult::Keep;
        }

        let len = self.db.literals(clause_id).len();
        for i in 2..len {
            let candidate = self.db.literals(clause_id)[i];
            if self.assign.value_of(candidate) != LitValue::False {
                self.db.clause_mut(clause_id).literals.swap(1, i);
                let new_watch = self.db.literals(clause_id)[1];
                self.db.add_watch(new_watch, clause_id);
                return PropagateResult::Moved;
            }
        }

        if self.assign.value_of(other) == LitValue::False {
            PropagateResult::Conflict
        } else {
            self.assign.enqueue(other, Some(clause_id));
            PropagateResult::Keep
        }
    }

    fn record_learned_clause(&mut self, literals: Vec<Lit>) -> ClauseId {
        self.decay_activity();
        let len = literals.len();
        let id = self.db.add_clause(literals, ReasonTag::Learned, true);
        if len >= 2 {
            let l0 = self.db.literals(id)[0];
            let l1 = self.db.literals(id)[1];
            invariant(
                self.assign.value_of(l0) != LitValue::False || self.assign.value_of(l1) != LitValue::False,
                "learned clause is already falsified by both watches",
            );
        }
        id
    }

    pub(super) fn bump_var_activity(&mut self, var: Var) {
        self.activity[var as usize] += self.activity_inc;
        if self.activity[var as usize] > ACTIVITY_RESCALE_THRESHOLD {
            for a in &mut self.activity {
                *a *= 1e-100;
            }
            self.activity_inc *= 1e-100;
        }
    }

    fn decay_activity(&mut self) {
        self.activity_inc /= ACTIVITY_DECAY;
    }

    pub(super) fn bump_clause_activity(&mut self, id: ClauseId) {
        let clause = self.db.clause_mut(id);
        if clause.learned {
            clause.activity += 1.0;
        }
    }

    pub(super) fn antecedents_of(&self, learned_id: ClauseId) -> Option<&HashSet<ClauseId>> {
        self.antecedents.get(&learned_id)
    }

    fn should_restart(&self) -> bool {
        self.conflicts_since_restart >= RESTART_BASE * luby(self.luby_index)
    }

    fn reduce_threshold(&self) -> usize {
        REDUCE_BASE + REDUCE_GROWTH * self.reductions
    }

    /// Delete the lower-activity half of learned clauses that aren't
    /// currently locked as some variable's reason (§4.E).
    fn reduce(&mut self) {
        self.reductions += 1;
        let mut learned: Vec<ClauseId> = self.db.learned_ids().collect();
        learned.sort_by(|&a, &b| {
            self.db
                .clause(a)
                .activity
                .partial_cmp(&self.db.clause(b).activity)
                .expect("clause activity is never NaN")
        });

        let target = learned.len() / 2;
        let mut to_drop = HashSet::new();
        for &id in &learned {
            if to_drop.len() >= target {
                break;
            }
            if !is_locked(&self.db, id, |v| self.assign.reason_of(v)) {
                to_drop.insert(id);
            }
        }
        debug!("reduce #{}: dropping {} of {} learned clauses", self.reductions, to_drop.len(), learned.len());
        self.db.remove_clauses(&to_drop);
    }

    fn unsat(&mut self, conflict: ClauseId) -> SatOutcome {
        SatOutcome::Unsatisfiable {
            conflict,
            learned_trail: std::mem::take(&mut self.learned_trail),
        }
    }

    /// Every *original* (non-learned) clause id transitively involved in
    /// `conflict` and the clauses in `learned_trail`, resolving through
    /// learned antecedents recorded during [`Self::analyze`]. Consumed by
    /// [`crate::diagnostics`] (§4.I).
    pub fn involved_original_clauses(&self, conflict: ClauseId, learned_trail: &[ClauseId]) -> HashSet<ClauseId> {
        let mut involved = HashSet::new();
        let mut add = |id: ClauseId, involved: &mut HashSet<ClauseId>| {
            if self.db.clause(id).learned {
                if let Some(set) = self.antecedents.get(&id) {
                    involved.extend(set.iter().copied());
                }
            } else {
                involved.insert(id);
            }
        };
        add(conflict, &mut involved);
        for &id in learned_trail {
            add(id, &mut involved);
        }
        involved
    }
}

/// The standard Luby restart sequence (1-indexed), scaled by
/// [`RESTART_BASE`] in [`SatSolver::should_restart`].
fn luby(mut x: u64) -> u64 {
    let (mut size, mut seq) = (1u64, 0u32);
    while size < x + 1 {
        seq += 1;
        size = 2 * size + 1;
    }
    while size - 1 != x {
        size = (size - 1) / 2;
        seq -= 1;
        x %= size;
    }
    2u64.pow(seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::types::mk_lit;

    struct FirstUnassigned;

    impl BranchingPolicy for FirstUnassigned {
        fn decide(&mut self, view: &DecisionView) -> Option<Lit> {
            for var in 1..=view.num_vars as Var {
                if view.is_unassigned(var) {
                    return Some(mk_lit(var, true));
                }
            }
            None
        }
    }

    #[test]
    fn luby_sequence_matches_known_prefix() {
        let seq: Vec<u64> = (1..=12).map(luby).collect();
        assert_eq!(seq, vec![1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1]);
    }

    #[test]
    fn solves_trivial_satisfiable_formula() {
        let mut db = ClauseDb::new(2);
        db.add_clause(vec![1, 2], ReasonTag::Learned, false);
        let mut solver = SatSolver::new(db);
        let mut policy = FirstUnassigned;
        assert!(matches!(solver.solve(&mut policy), SatOutcome::Satisfied));
        assert!(solver.assignment().is_complete());
    }

    #[test]
    fn detects_unsatisfiable_unit_contradiction() {
        let mut db = ClauseDb::new(1);
        db.add_clause(vec![1], ReasonTag::Learned, false);
        db.add_clause(vec![-1], ReasonTag::Learned, false);
        let mut solver = SatSolver::new(db);
        let mut policy = FirstUnassigned;
        assert!(matches!(solver.solve(&mut policy), SatOutcome::Unsatisfiable { .. }));
    }

    #[test]
    fn learns_from_a_conflict_before_reporting_unsat() {
        // Deciding x1 true forces x3 true (clause 3) then immediately
        // conflicts with clause 4, at decision level 1 — analysis must
        // learn a clause and backjump before the (level-0) contradiction
        // between clauses 1 and 2 is found.
        let mut db = ClauseDb::new(3);
        db.add_clause(vec![1, 2], ReasonTag::Learned, false);
        db.add_clause(vec![1, -2], ReasonTag::Learned, false);
        db.add_clause(vec![-1, 3], ReasonTag::Learned, false);
        db.add_clause(vec![-1, -3], ReasonTag::Learned, false);
        let mut solver = SatSolver::new(db);
        let mut policy = FirstUnassigned;
        match solver.solve(&mut policy) {
            SatOutcome::Unsatisfiable { learned_trail, .. } => {
                assert!(!learned_trail.is_empty());
            }
            SatOutcome::Satisfied => panic!("formula is unsatisfiable"),
        }
    }
}
