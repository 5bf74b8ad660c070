//! Literal, variable, and assignment types shared by the clause database and
//! the solver loop.
//!
//! A [`Var`] is a 1-based index into the pool's package ids (id 0 is never
//! used, keeping the dense range of I5 intact). A [`Lit`] is a signed
//! variable: `+id` asserts "package `id` is installed", `-id` asserts
//! "not installed", mirroring §3 of the clause model.

use super::clause::ClauseId;

/// A SAT variable, equal to a pool package id.
pub type Var = u32;

/// A signed literal over a [`Var`].
pub type Lit = i32;

/// The variable a literal refers to.
#[inline]
pub fn var_of(lit: Lit) -> Var {
    lit.unsigned_abs()
}

/// Whether `lit` asserts the positive ("installed") polarity.
#[inline]
pub fn is_positive(lit: Lit) -> bool {
    lit > 0
}

/// Build the literal for `var` with the given polarity.
#[inline]
pub fn mk_lit(var: Var, positive: bool) -> Lit {
    if positive { var as Lit } else { -(var as Lit) }
}

/// A literal's truth value under the current (partial) assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitValue {
    True,
    False,
    Unassigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VarState {
    True,
    False,
    Unassigned,
}

/// The partial/total truth assignment built up by the solver, together with
/// the trail needed to undo it on backjump and the bookkeeping (decision
/// level, antecedent clause) conflict analysis needs per variable.
#[derive(Debug)]
pub struct Assignment {
    values: Vec<VarState>,
    levels: Vec<u32>,
    reasons: Vec<Option<ClauseId>>,
    /// Literals in assignment order; `trail_lim[d]` is the index of the
    /// first literal assigned at decision level `d + 1`.
    pub trail: Vec<Lit>,
    pub trail_lim: Vec<usize>,
}

impl Assignment {
    /// Create an assignment over variables `1..=num_vars`.
    pub fn new(num_vars: usize) -> Self {
        Self {
            values: vec![VarState::Unassigned; num_vars + 1],
            levels: vec![0; num_vars + 1],
            reasons: vec![None; num_vars + 1],
            trail: Vec::new(),
            trail_lim: Vec::new(),
        }
    }

    /// The number of variables this assignment was built for.
    pub fn num_vars(&self) -> usize {
        self.values.len() - 1
    }

    /// Current decision level (0 = no decisions made yet).
    pub fn decision_level(&self) -> u32 {
        self.trail_lim.len() as u32
    }

    /// Start a new decision level at the current trail position.
    pub fn new_decision_level(&mut self) {
        self.trail_lim.push(self.trail.len());
    }

    /// The truth value of `var` in the current assignment.
    pub fn value_of_var(&self, var: Var) -> Option<bool> {
        match self.values[var as usize] {
            VarState::True => Some(true),
            VarState::False => Some(false),
            VarState::Unassigned => None,
        }
    }

    /// The truth value of a literal: `True` if its variable is assigned so
    /// the literal is satisfied, `False` if assigned the other way.
    pub fn value_of(&self, lit: Lit) -> LitValue {
        match self.value_of_var(var_of(lit)) {
            None => LitValue::Unassigned,
            Some(v) => {
                if v == is_positive(lit) {
                    LitValue::True
                } else {
                    LitValue::False
                }
            }
        }
    }

    /// The decision level at which `var` was assigned. Meaningless if
    /// unassigned.
    pub fn level_of(&self, var: Var) -> u32 {
        self.levels[var as usize]
    }

    /// The clause that forced `var`'s assignment, or `None` for a decision.
    pub fn reason_of(&self, var: Var) -> Option<ClauseId> {
        self.reasons[var as usize]
    }

    /// Record that `lit` became true, at the current decision level, for the
    /// given antecedent (`None` for a branching decision).
    pub fn enqueue(&mut self, lit: Lit, reason: Option<ClauseId>) {
        let var = var_of(lit);
        self.values[var as usize] = if is_positive(lit) {
            VarState::True
        } else {
            VarState::False
        };
        self.levels[var as usize] = self.decision_level();
        self.reasons[var as usize] = reason;
        self.trail.push(lit);
    }

    /// Undo every assignment made at or above `level`, leaving the trail
    /// truncated to the start of `level`.
    pub fn cancel_until(&mut self, level: u32) {
        if self.decision_level() <= level {
            return;
        }
        let target = self.trail_lim[level as usize];
        for &lit in self.trail[target..].iter().rev() {
            self.values[var_of(lit) as usize] = VarState::Unassigned;
        }
        self.trail.truncate(target);
        self.trail_lim.truncate(level as usize);
    }

    /// `true` once every variable has a value.
    pub fn is_complete(&self) -> bool {
        self.trail.len() == self.num_vars()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_and_value() {
        let mut a = Assignment::new(3);
        a.enqueue(2, None);
        assert_eq!(a.value_of(2), LitValue::True);
        assert_eq!(a.value_of(-2), LitValue::False);
        assert_eq!(a.value_of(1), LitValue::Unassigned);
    }

    #[test]
    fn cancel_until_undoes_levels() {
        let mut a = Assignment::new(3);
        a.enqueue(1, None);
        a.new_decision_level();
        a.enqueue(2, None);
        a.new_decision_level();
        a.enqueue(-3, None);
        assert_eq!(a.decision_level(), 2);
        a.cancel_until(1);
        assert_eq!(a.decision_level(), 1);
        assert_eq!(a.value_of(3), LitValue::Unassigned);
        assert_eq!(a.value_of(2), LitValue::True);
    }

    #[test]
    fn mk_lit_roundtrip() {
        assert_eq!(var_of(mk_lit(5, true)), 5);
        assert!(is_positive(mk_lit(5, true)));
        assert!(!is_positive(mk_lit(5, false)));
    }
}
