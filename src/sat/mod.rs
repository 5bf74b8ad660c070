//! The CDCL SAT core (component E): clause storage and the watched-literal
//! index, the trail/assignment, conflict analysis, and the search loop.
//! Everything above the pool/rules layer treats this module as a closed
//! box — it never sees a [`crate::package::Package`] or [`crate::version::Version`].

pub mod clause;
mod conflict_analysis;
pub mod solver;
pub mod types;

pub use clause::{Clause, ClauseDb, ClauseId};
pub use solver::{BranchingPolicy, DecisionView, SatOutcome, SatSolver};
pub use types::{Assignment, Lit, LitValue, Var, is_positive, mk_lit, var_of};
