//! Pool (component C): interns packages across one or more repositories
//! into stable positive integer ids and answers the two queries the rules
//! generator and policy need — "who matches this requirement" and "who
//! shares this name".

use std::collections::{HashMap, HashSet};

use crate::package::{Package, Repository};
use crate::version::Requirement;

/// A pool package id. Positive, dense, starting at 1 (invariant I5).
pub type Id = u32;

/// Arena mapping [`Package`]s to stable ids, built from one or more
/// repositories.
///
/// A repository given earlier to [`Pool::intern_repository`] has *higher*
/// priority than one given later: when [`Pool::ids_matching`] returns
/// several ids tied on version, the one from the earlier repository sorts
/// first. This ordering is directly observable through the policy (§4.F).
#[derive(Debug, Default)]
pub struct Pool {
    packages: Vec<Package>,
    identity_index: HashMap<(String, semver::Version), Id>,
    names: HashMap<String, Vec<Id>>,
    /// Ids of packages whose `provides` list mentions a given name, so
    /// `ids_matching` can find them even though their own name differs.
    provides_index: HashMap<String, Vec<Id>>,
    repo_rank: Vec<usize>,
    installed: HashSet<Id>,
    next_rank: usize,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern every package in `repo` at the next (lower) priority rank.
    pub fn intern_repository(&mut self, repo: &Repository) {
        let rank = self.next_rank;
        for pkg in repo.iter() {
            self.intern_package(pkg.clone(), rank);
        }
        self.next_rank += 1;
    }

    /// Intern every package in `repo` at the next priority rank, *and*
    /// record those ids as currently installed (component D.4's
    /// "installed rules" source of truth).
    pub fn intern_installed_repository(&mut self, repo: &Repository) {
        let rank = self.next_rank;
        for pkg in repo.iter() {
            let id = self.intern_package(pkg.clone(), rank);
            self.installed.insert(id);
        }
        self.next_rank += 1;
    }

    fn intern_package(&mut self, pkg: Package, rank: usize) -> Id {
        let key = (pkg.name.clone(), pkg.version.clone());
        if let Some(&id) = self.identity_index.get(&key) {
            return id;
        }
        let id = (self.packages.len() + 1) as Id;
        self.names.entry(pkg.name.clone()).or_default().push(id);
        for provided in &pkg.provides {
            self.provides_index
                .entry(provided.name.clone())
                .or_default()
                .push(id);
        }
        self.identity_index.insert(key, id);
        self.repo_rank.push(rank);
        self.packages.push(pkg);
        id
    }

    pub fn id_of(&self, package: &Package) -> Option<Id> {
        self.identity_index
            .get(&(package.name.clone(), package.version.clone()))
            .copied()
    }

    pub fn package_of(&self, id: Id) -> &Package {
        &self.packages[(id - 1) as usize]
    }

    pub fn is_installed(&self, id: Id) -> bool {
        self.installed.contains(&id)
    }

    pub fn installed_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.installed.iter().copied()
    }

    /// Every id whose own name equals `name` (not counting `provides`),
    /// newest-first then by repository priority then by ingestion order.
    pub fn ids_with_name(&self, name: &str) -> Vec<Id> {
        let mut ids = self.names.get(name).cloned().unwrap_or_default();
        self.sort_ids(&mut ids);
        ids
    }

    /// Every id matching `req`, whether by its own name or via `provides`,
    /// deduplicated and ordered newest-first then by repository priority
    /// then by ingestion order.
    pub fn ids_matching(&self, req: &Requirement) -> Vec<Id> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for &id in self.names.get(&req.name).into_iter().flatten() {
            if seen.insert(id) && self.package_of(id).satisfies(req) {
                ids.push(id);
            }
        }
        for &id in self.provides_index.get(&req.name).into_iter().flatten() {
            if seen.insert(id) && self.package_of(id).satisfies(req) {
                ids.push(id);
            }
        }
        self.sort_ids(&mut ids);
        ids
    }

    fn sort_ids(&self, ids: &mut [Id]) {
        ids.sort_by(|&a, &b| {
            let pa = self.package_of(a);
            let pb = self.package_of(b);
            pb.version
                .cmp(&pa.version)
                .then_with(|| self.repo_rank[(a - 1) as usize].cmp(&self.repo_rank[(b - 1) as usize]))
                .then_with(|| a.cmp(&b))
        });
    }

    pub fn num_ids(&self) -> usize {
        self.packages.len()
    }

    pub fn all_ids(&self) -> impl Iterator<Item = Id> {
        1..=(self.packages.len() as Id)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Package;
    use crate::version::{Constraint, Version};

    fn pkg(name: &str, version: &str) -> Package {
        Package::new(name, Version::parse(version).unwrap())
    }

    #[test]
    fn ids_are_dense_from_one() {
        let mut repo = Repository::new();
        repo.add_package(pkg("mkl", "10.3.1"));
        repo.add_package(pkg("libgfortran", "3.0.0"));
        let mut pool = Pool::new();
        pool.intern_repository(&repo);
        let ids: Vec<_> = pool.all_ids().collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn same_identity_across_repos_interns_once() {
        let mut remote = Repository::new();
        remote.add_package(pkg("mkl", "10.3.1"));
        let mut installed = Repository::new();
        installed.add_package(pkg("mkl", "10.3.1"));

        let mut pool = Pool::new();
        pool.intern_repository(&remote);
        pool.intern_installed_repository(&installed);

        assert_eq!(pool.num_ids(), 1);
        assert!(pool.is_installed(1));
    }

    #[test]
    fn ids_matching_orders_newest_first() {
        let mut repo = Repository::new();
        repo.add_package(pkg("mkl", "10.3.1"));
        repo.add_package(pkg("mkl", "10.3.2"));
        let mut pool = Pool::new();
        pool.intern_repository(&repo);

        let req = Requirement::new("mkl");
        let ids = pool.ids_matching(&req);
        assert_eq!(
            ids.iter().map(|&id| pool.package_of(id).version.to_string()).collect::<Vec<_>>(),
            vec!["10.3.2", "10.3.1"]
        );
    }

    #[test]
    fn earlier_repository_wins_tie_via_provides() {
        // Two differently-named packages both provide "openssl" at the
        // same version; the one from the higher-priority (earlier) repo
        // must sort first.
        let provided = || Requirement::new("openssl").with_constraint(Constraint::EqualTo(Version::parse("3.0.0").unwrap()));
        let mut high = Repository::new();
        high.add_package(pkg("openssl", "3.0.0").provides(provided()));
        let mut low = Repository::new();
        low.add_package(pkg("libressl", "3.0.0").provides(provided()));

        let mut pool = Pool::new();
        pool.intern_repository(&high);
        pool.intern_repository(&low);

        let ids = pool.ids_matching(&Requirement::new("openssl"));
        assert_eq!(ids.len(), 2);
        assert_eq!(pool.package_of(ids[0]).name, "openssl");
        assert_eq!(pool.package_of(ids[1]).name, "libressl");
    }

    #[test]
    fn ids_matching_includes_provides() {
        let mut repo = Repository::new();
        repo.add_package(
            pkg("openssl-compat", "1.0.0")
                .provides(Requirement::new("openssl").with_constraint(Constraint::EqualTo(Version::parse("1.0.0").unwrap()))),
        );
        let mut pool = Pool::new();
        pool.intern_repository(&repo);
        let req = Requirement::new("openssl");
        let ids = pool.ids_matching(&req);
        assert_eq!(ids.len(), 1);
    }
}
