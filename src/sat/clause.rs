//! The clause database: storage for original and learned clauses plus the
//! two-watched-literal index used by unit propagation.

use super::types::{Lit, Var, var_of};
use crate::rules::ReasonTag;

/// A stable index into the [`ClauseDb`].
pub type ClauseId = u32;

/// A disjunction of literals, tagged with why it exists.
///
/// Reason tags are never consulted by propagation or conflict analysis —
/// they exist purely for [`crate::diagnostics`].
#[derive(Debug, Clone)]
pub struct Clause {
    pub literals: Vec<Lit>,
    pub reason: ReasonTag,
    pub learned: bool,
    pub activity: f64,
    /// Tombstone set by [`ClauseDb::remove_clauses`]. `ClauseId`s are Vec
    /// indices held onto elsewhere (notably `Assignment::reasons`), so a
    /// removed clause is marked dead in place rather than compacted out —
    /// compacting would renumber every later id out from under them.
    deleted: bool,
}

impl Clause {
    fn new(literals: Vec<Lit>, reason: ReasonTag, learned: bool) -> Self {
        Self {
            literals,
            reason,
            learned,
            activity: 0.0,
            deleted: false,
        }
    }
}

/// Clause storage plus the watch lists that back two-watched-literal
/// propagation: `watches[lit]` lists every clause currently watching the
/// negation of `lit` (i.e. clauses that must be revisited when `lit`
/// becomes true).
#[derive(Debug)]
pub struct ClauseDb {
    clauses: Vec<Clause>,
    watches: Vec<Vec<ClauseId>>,
    num_vars: usize,
}

impl ClauseDb {
    pub fn new(num_vars: usize) -> Self {
        Self {
            clauses: Vec::new(),
            // two watch lists per variable, one per polarity
            watches: vec![Vec::new(); 2 * (num_vars + 1)],
            num_vars,
        }
    }

    fn watch_index(lit: Lit) -> usize {
        let var = var_of(lit) as usize;
        if lit > 0 { 2 * var } else { 2 * var + 1 }
    }

    /// Clauses watching `lit`'s negation: revisited when `lit` is assigned
    /// true, since that falsifies those watches.
    pub fn watches(&self, neg_of: Lit) -> &[ClauseId] {
        &self.watches[Self::watch_index(neg_of)]
    }

    pub fn take_watches(&mut self, neg_of: Lit) -> Vec<ClauseId> {
        std::mem::take(&mut self.watches[Self::watch_index(neg_of)])
    }

    pub fn restore_watches(&mut self, neg_of: Lit, list: Vec<ClauseId>) {
        self.watches[Self::watch_index(neg_of)] = list;
    }

    pub fn add_watch(&mut self, watched_lit: Lit, clause: ClauseId) {
        // Watch entries live under the *negation* of the watched literal:
        // the clause is revisited when that negation's complement is set,
        // i.e. when `watched_lit` itself is falsified.
        self.watches[Self::watch_index(-watched_lit)].push(clause);
    }

    /// Insert a clause (original or learned) and register its first two
    /// literals as watches. Clauses of length 0 or 1 are stored but carry no
    /// watches; the caller is responsible for handling them (an empty
    /// clause is an immediate conflict, a unit clause an immediate
    /// propagation).
    pub fn add_clause(&mut self, literals: Vec<Lit>, reason: ReasonTag, learned: bool) -> ClauseId {
        let id = self.clauses.len() as ClauseId;
        if literals.len() >= 2 {
            let l0 = literals[0];
            let l1 = literals[1];
            self.clauses.push(Clause::new(literals, reason, learned));
            self.add_watch(l0, id);
            self.add_watch(l1, id);
        } else {
            self.clauses.push(Clause::new(literals, reason, learned));
        }
        id
    }

    pub fn clause(&self, id: ClauseId) -> &Clause {
        &self.clauses[id as usize]
    }

    pub fn clause_mut(&mut self, id: ClauseId) -> &mut Clause {
        &mut self.clauses[id as usize]
    }

    pub fn literals(&self, id: ClauseId) -> &[Lit] {
        &self.clauses[id as usize].literals
    }

    /// Count of live (non-tombstoned) clauses. Not the same as the id space:
    /// ids run `0..capacity`, some of which may be deleted.
    pub fn len(&self) -> usize {
        self.clauses.iter().filter(|c| !c.deleted).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One past the highest `ClauseId` ever issued, i.e. the id space size
    /// including tombstoned clauses.
    pub fn capacity(&self) -> usize {
        self.clauses.len()
    }

    pub fn learned_count(&self) -> usize {
        self.clauses.iter().filter(|c| c.learned && !c.deleted).count()
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn is_deleted(&self, id: ClauseId) -> bool {
        self.clauses[id as usize].deleted
    }

    /// Iterate learned clause ids, used by reduction and diagnostics.
    /// Tombstoned clauses are skipped.
    pub fn learned_ids(&self) -> impl Iterator<Item = ClauseId> + '_ {
        (0..self.clauses.len() as ClauseId)
            .filter(|&id| self.clauses[id as usize].learned && !self.clauses[id as usize].deleted)
    }

    /// Every non-deleted clause id. Ids are stable for the lifetime of the
    /// database: a removed clause's id is never reassigned.
    pub fn all_ids(&self) -> impl Iterator<Item = ClauseId> + '_ {
        (0..self.clauses.len() as ClauseId).filter(|&id| !self.clauses[id as usize].deleted)
    }

    /// Tombstone the given clauses and rebuild every watch list, skipping
    /// deleted clauses. `ClauseId`s of surviving clauses never change —
    /// callers holding a `ClauseId` (e.g. `Assignment::reasons`) stay valid.
    pub fn remove_clauses(&mut self, ids: &std::collections::HashSet<ClauseId>) {
        if ids.is_empty() {
            return;
        }
        for &id in ids {
            self.clauses[id as usize].deleted = true;
        }
        for w in &mut self.watches {
            w.clear();
        }
        for (id, clause) in self.clauses.iter().enumerate() {
            if !clause.deleted && clause.literals.len() >= 2 {
                let id = id as ClauseId;
                let l0 = clause.literals[0];
                let l1 = clause.literals[1];
                self.watches[Self::watch_index(-l0)].push(id);
                self.watches[Self::watch_index(-l1)].push(id);
            }
        }
    }
}

/// `var` is "locked" (a learned clause reason may not be reduced away) when
/// it is the antecedent of the variable's current assignment.
pub fn is_locked(db: &ClauseDb, id: ClauseId, reason_of: impl Fn(Var) -> Option<ClauseId>) -> bool {
    let lits = db.literals(id);
    if lits.is_empty() {
        return false;
    }
    reason_of(var_of(lits[0])) == Some(id)
}
