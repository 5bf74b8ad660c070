//! Version & requirement algebra (component A).
//!
//! Versions are an opaque total order per package name; the solver never
//! inspects their structure, only compares them. Backed by [`semver::Version`]
//! — the version-comparison library this crate treats as an external,
//! out-of-scope collaborator.

use std::fmt;

pub use semver::Version;

/// One interval constraint on a version. A [`Requirement`] conjoins several
/// of these.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    Any,
    EqualTo(Version),
    NotEqualTo(Version),
    GreaterThan(Version),
    GreaterEqual(Version),
    LessThan(Version),
    LessEqual(Version),
    /// Matches any `w >= v` in the same compatibility class as `v`: same
    /// major series when `major > 0`, same minor series when `major == 0
    /// && minor > 0`, exact patch series when `major == minor == 0`
    /// (Cargo caret-requirement semantics).
    CompatibleWith(Version),
}

impl Constraint {
    /// Whether `version` satisfies this single constraint.
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Constraint::Any => true,
            Constraint::EqualTo(v) => version == v,
            Constraint::NotEqualTo(v) => version != v,
            Constraint::GreaterThan(v) => version > v,
            Constraint::GreaterEqual(v) => version >= v,
            Constraint::LessThan(v) => version < v,
            Constraint::LessEqual(v) => version <= v,
            Constraint::CompatibleWith(v) => version >= v && version < &compat_upper_bound(v),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Any => write!(f, "*"),
            Constraint::EqualTo(v) => write!(f, "=={v}"),
            Constraint::NotEqualTo(v) => write!(f, "!={v}"),
            Constraint::GreaterThan(v) => write!(f, ">{v}"),
            Constraint::GreaterEqual(v) => write!(f, ">={v}"),
            Constraint::LessThan(v) => write!(f, "<{v}"),
            Constraint::LessEqual(v) => write!(f, "<={v}"),
            Constraint::CompatibleWith(v) => write!(f, "^={v}"),
        }
    }
}

/// The exclusive upper bound of `v`'s compatibility class.
fn compat_upper_bound(v: &Version) -> Version {
    if v.major > 0 {
        Version::new(v.major + 1, 0, 0)
    } else if v.minor > 0 {
        Version::new(0, v.minor + 1, 0)
    } else {
        Version::new(0, 0, v.patch + 1)
    }
}

/// A named requirement: a conjunction of [`Constraint`]s on a single
/// package name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement {
    pub name: String,
    pub constraints: Vec<Constraint>,
}

impl Requirement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraints: Vec::new(),
        }
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// `true` iff `version` satisfies every constraint.
    pub fn matches(&self, version: &Version) -> bool {
        self.constraints.iter().all(|c| c.matches(version))
    }

    /// Merge two requirements on the same name into their conjunction.
    /// Returns `None` if the result can be shown empty (§4.A `is_empty`).
    ///
    /// # Panics
    /// Panics if `self.name != other.name` — intersection is only defined
    /// within one package name.
    pub fn intersect(&self, other: &Requirement) -> Option<Requirement> {
        assert_eq!(self.name, other.name, "intersect requires matching names");
        let mut constraints = self.constraints.clone();
        constraints.extend(other.constraints.iter().cloned());
        let merged = Requirement {
            name: self.name.clone(),
            constraints,
        };
        if is_empty(&merged) { None } else { Some(merged) }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for c in &self.constraints {
            write!(f, " {c}")?;
        }
        Ok(())
    }
}

/// Normalized bound used by [`is_empty`] to decide satisfiability without
/// enumerating the (infinite) version space.
#[derive(Debug, Default)]
struct Bounds {
    lower: Option<(Version, bool)>, // (bound, inclusive)
    upper: Option<(Version, bool)>,
    equal: Option<Version>,
    not_equal: Vec<Version>,
}

fn tighten_lower(bounds: &mut Bounds, v: Version, inclusive: bool) {
    let tighter = match &bounds.lower {
        None => true,
        Some((cur, cur_incl)) => {
            v > *cur || (v == *cur && !inclusive && *cur_incl)
        }
    };
    if tighter {
        bounds.lower = Some((v, inclusive));
    }
}

fn tighten_upper(bounds: &mut Bounds, v: Version, inclusive: bool) {
    let tighter = match &bounds.upper {
        None => true,
        Some((cur, cur_incl)) => {
            v < *cur || (v == *cur && !inclusive && *cur_incl)
        }
    };
    if tighter {
        bounds.upper = Some((v, inclusive));
    }
}

/// `true` iff no version can satisfy `req` — detected structurally by
/// merging every constraint into a lower/upper bound pair (plus any exact
/// equalities and exclusions) and checking the result is contradictory.
pub fn is_empty(req: &Requirement) -> bool {
    let mut bounds = Bounds::default();
    for c in &req.constraints {
        match c {
            Constraint::Any => {}
            Constraint::EqualTo(v) => {
                if let Some(existing) = &bounds.equal {
                    if existing != v {
                        return true;
                    }
                } else {
                    bounds.equal = Some(v.clone());
                }
            }
            Constraint::NotEqualTo(v) => bounds.not_equal.push(v.clone()),
            Constraint::GreaterThan(v) => tighten_lower(&mut bounds, v.clone(), false),
            Constraint::GreaterEqual(v) => tighten_lower(&mut bounds, v.clone(), true),
            Constraint::LessThan(v) => tighten_upper(&mut bounds, v.clone(), false),
            Constraint::LessEqual(v) => tighten_upper(&mut bounds, v.clone(), true),
            Constraint::CompatibleWith(v) => {
                tighten_lower(&mut bounds, v.clone(), true);
                tighten_upper(&mut bounds, compat_upper_bound(v), false);
            }
        }
    }

    if let Some(eq) = &bounds.equal {
        if bounds.not_equal.iter().any(|n| n == eq) {
            return true;
        }
        if let Some((lo, incl)) = &bounds.lower {
            if eq < lo || (eq == lo && !incl) {
                return true;
            }
        }
        if let Some((hi, incl)) = &bounds.upper {
            if eq > hi || (eq == hi && !incl) {
                return true;
            }
        }
        return false;
    }

    if let (Some((lo, lo_incl)), Some((hi, hi_incl))) = (&bounds.lower, &bounds.upper) {
        if lo > hi {
            return true;
        }
        if lo == hi && !(*lo_incl && *hi_incl) {
            return true;
        }
    }
    false
}
