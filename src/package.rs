//! Package & repository (component B).

use std::fmt;

use crate::version::{Requirement, Version};

/// A single installable unit: a name, a version, and the requirements it
/// carries. Identity is `(name, version)` — two packages with equal
/// identity are the same package regardless of how their dependency lists
/// were constructed.
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub version: Version,
    pub install_requires: Vec<Requirement>,
    pub conflicts: Vec<Requirement>,
    pub provides: Vec<Requirement>,
}

impl Package {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            install_requires: Vec::new(),
            conflicts: Vec::new(),
            provides: Vec::new(),
        }
    }

    pub fn depends_on(mut self, req: Requirement) -> Self {
        self.install_requires.push(req);
        self
    }

    pub fn conflicts_with(mut self, req: Requirement) -> Self {
        self.conflicts.push(req);
        self
    }

    pub fn provides(mut self, req: Requirement) -> Self {
        self.provides.push(req);
        self
    }

    /// Whether `req` matches this package either directly by name/version
    /// or via one of its `provides` entries (§9 open question (b): provides
    /// contribute to matching, not to uniqueness).
    pub fn satisfies(&self, req: &Requirement) -> bool {
        if self.name == req.name && req.matches(&self.version) {
            return true;
        }
        self.provides
            .iter()
            .any(|p| p.name == req.name && req.matches(&p_effective_version(p)))
    }
}

/// `provides` entries carry their own constraint as the "advertised"
/// version; we treat the tightest bound they declare as the version a
/// requirement is matched against. Most `provides` use `EqualTo`.
fn p_effective_version(provided: &Requirement) -> Version {
    provided
        .constraints
        .iter()
        .find_map(|c| match c {
            crate::version::Constraint::EqualTo(v) => Some(v.clone()),
            crate::version::Constraint::CompatibleWith(v) => Some(v.clone()),
            crate::version::Constraint::GreaterEqual(v) => Some(v.clone()),
            _ => None,
        })
        .unwrap_or_else(|| Version::new(0, 0, 0))
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version
    }
}

impl Eq for Package {}

impl std::hash::Hash for Package {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version.hash(state);
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// An ordered collection of packages. Duplicate `(name, version)` pairs may
/// be inserted but are collapsed to a single entry, keeping the position of
/// the first insertion.
#[derive(Debug, Clone, Default)]
pub struct Repository {
    packages: Vec<Package>,
    by_name: std::collections::HashMap<String, Vec<usize>>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `package`, collapsing by identity; entries for one name are
    /// kept newest-first so policy tie-breaks see a deterministic order.
    pub fn add_package(&mut self, package: Package) {
        if let Some(indices) = self.by_name.get(&package.name) {
            if indices.iter().any(|&i| self.packages[i] == package) {
                return;
            }
        }
        let idx = self.packages.len();
        let name = package.name.clone();
        self.packages.push(package);
        let entry = self.by_name.entry(name).or_default();
        entry.push(idx);
        entry.sort_by(|&a, &b| self.packages[b].version.cmp(&self.packages[a].version));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn all_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn packages_named(&self, name: &str) -> Vec<&Package> {
        self.by_name
            .get(name)
            .map(|idxs| idxs.iter().map(|&i| &self.packages[i]).collect())
            .unwrap_or_default()
    }

    /// Packages (across all names) satisfying `req`, newest-first within a
    /// name, names otherwise in repository insertion order.
    pub fn packages_matching(&self, req: &Requirement) -> Vec<&Package> {
        self.packages
            .iter()
            .filter(|p| p.satisfies(req))
            .collect()
    }

    pub fn contains(&self, package: &Package) -> bool {
        self.packages_named(&package.name).contains(&package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Constraint;

    fn pkg(name: &str, version: &str) -> Package {
        Package::new(name, Version::parse(version).unwrap())
    }

    #[test]
    fn add_package_dedups_by_identity() {
        let mut repo = Repository::new();
        repo.add_package(pkg("mkl", "10.3.1"));
        repo.add_package(pkg("mkl", "10.3.1"));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn packages_named_is_newest_first() {
        let mut repo = Repository::new();
        repo.add_package(pkg("mkl", "10.3.1"));
        repo.add_package(pkg("mkl", "10.3.2"));
        let versions: Vec<_> = repo
            .packages_named("mkl")
            .iter()
            .map(|p| p.version.to_string())
            .collect();
        assert_eq!(versions, vec!["10.3.2", "10.3.1"]);
    }

    #[test]
    fn packages_matching_filters_by_requirement() {
        let mut repo = Repository::new();
        repo.add_package(pkg("mkl", "10.3.1"));
        repo.add_package(pkg("mkl", "10.3.2"));
        let req = crate::version::Requirement::new("mkl")
            .with_constraint(Constraint::GreaterThan(Version::parse("10.3.1").unwrap()));
        let matches = repo.packages_matching(&req);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].version.to_string(), "10.3.2");
    }
}
