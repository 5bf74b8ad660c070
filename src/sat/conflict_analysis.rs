//! 1-UIP conflict analysis (§4.E): resolves the conflicting clause against
//! its implication-graph ancestors until exactly one literal of the current
//! decision level remains.

use std::collections::HashSet;

use super::clause::ClauseId;
use super::solver::SatSolver;
use super::types::{Lit, var_of};

impl SatSolver {
    /// Returns the learned clause (its first literal is the asserting
    /// literal, the second the literal with the highest level among the
    /// rest), the decision level to backjump to, and the set of original
    /// clause ids resolved into the learned clause (for diagnostics).
    pub(super) fn analyze(&mut self, conflict: ClauseId) -> (Vec<Lit>, u32, HashSet<ClauseId>) {
        let num_vars = self.assignment().num_vars();
        let current_level = self.assignment().decision_level();
        let mut seen = vec![false; num_vars + 1];
        let mut learnt: Vec<Lit> = Vec::new();
        let mut counter = 0usize;
        let mut p: Option<Lit> = None;
        let mut reason_id = conflict;
        let mut trail_idx = self.assignment().trail.len();
        let mut involved: HashSet<ClauseId> = HashSet::new();

        loop {
            self.bump_clause_activity(reason_id);
            if self.db().clause(reason_id).learned {
                if let Some(ancestors) = self.antecedents_of(reason_id) {
                    involved.extend(ancestors);
                }
            } else {
                involved.insert(reason_id);
            }
            let lits: Vec<Lit> = self.db().literals(reason_id).to_vec();
            for q in lits {
                if Some(q) == p {
                    continue;
                }
                let var = var_of(q);
                if seen[var as usize] {
                    continue;
                }
                seen[var as usize] = true;
                self.bump_var_activity(var);
                let level = self.assignment().level_of(var);
                if level == current_level {
                    counter += 1;
                } else if level > 0 {
                    learnt.push(q);
                }
            }

            loop {
                trail_idx -= 1;
                let lit = self.assignment().trail[trail_idx];
                if seen[var_of(lit) as usize] {
                    p = Some(lit);
                    break;
                }
            }
            let var = var_of(p.expect("trail search always finds the UIP candidate"));
            seen[var as usize] = false;
            counter -= 1;
            if counter == 0 {
                break;
            }
            reason_id = self
                .assignment()
                .reason_of(var)
                .expect("1-UIP walk reached a decision literal before the counter emptied");
        }

        let uip_lit = -p.expect("p is set on every loop iteration");
        learnt.insert(0, uip_lit);

        let backjump_level = if learnt.len() == 1 {
            0
        } else {
            let mut max_idx = 1;
            let mut max_level = self.assignment().level_of(var_of(learnt[1]));
            for i in 2..learnt.len() {
                let level = self.assignment().level_of(var_of(learnt[i]));
                if level > max_level {
                    max_level = level;
                    max_idx = i;
                }
            }
            learnt.swap(1, max_idx);
            max_level
        };

        (learnt, backjump_level, involved)
    }
}
