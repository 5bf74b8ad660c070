//! Transaction builder (component G): turns a satisfying assignment into
//! an ordered list of install/remove operations.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::package::{Package, Repository};
use crate::pool::{Id, Pool};
use crate::sat::Assignment;

/// One step of a [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Install(Package),
    Remove(Package),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Install(p) => write!(f, "install {p}"),
            Operation::Remove(p) => write!(f, "remove {p}"),
        }
    }
}

/// Like [`Operation`] but with a same-name `(Remove, Install)` pair
/// collapsed into a single `Update`, for display purposes (§4.G).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrettyOperation {
    Install(Package),
    Remove(Package),
    Update { to: Package, from: Package },
}

impl fmt::Display for PrettyOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrettyOperation::Install(p) => write!(f, "install {p}"),
            PrettyOperation::Remove(p) => write!(f, "remove {p}"),
            PrettyOperation::Update { to, from } => write!(f, "update {from} -> {to}"),
        }
    }
}

/// The solver's final answer: what to install and what to remove, in an
/// order safe to apply top-to-bottom.
#[derive(Debug, Clone)]
pub struct Transaction {
    operations: Vec<Operation>,
}

impl Transaction {
    /// Build a transaction from a complete satisfying `assignment` against
    /// `pool` and the `installed` repository (§4.G).
    ///
    /// Installs are emitted in dependency-topological order: a package
    /// appears only after every other to-be-installed package its
    /// `install_requires` resolves to within the assignment. Removes are
    /// emitted in the reverse order. Ties at the same topological rank
    /// break lexicographically by name.
    pub fn build(pool: &Pool, installed: &Repository, assignment: &Assignment) -> Self {
        let mut to_install = Vec::new();
        let mut to_remove = Vec::new();
        for id in pool.all_ids() {
            let pkg = pool.package_of(id);
            let is_true = assignment.value_of_var(id) == Some(true);
            let was_installed = installed.contains(pkg);
            if is_true && !was_installed {
                to_install.push(id);
            } else if !is_true && was_installed {
                to_remove.push(id);
            }
        }

        let install_order = topological_order(pool, &to_install, assignment);
        let mut operations: Vec<Operation> = install_order
            .into_iter()
            .map(|id| Operation::Install(pool.package_of(id).clone()))
            .collect();

        to_remove.sort_by(|&a, &b| pool.package_of(a).name.cmp(&pool.package_of(b).name));
        operations.extend(to_remove.into_iter().rev().map(|id| Operation::Remove(pool.package_of(id).clone())));

        Self { operations }
    }

    /// Build a transaction from an already-ordered operation list — used by
    /// [`crate::pruner`] to rebuild a transaction after filtering.
    pub fn from_operations(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Collapse same-name `(Remove, Install)` pairs into `Update` (§4.G).
    /// The raw `operations()` view keeps them separate.
    pub fn pretty_operations(&self) -> Vec<PrettyOperation> {
        let mut removes: HashMap<&str, Package> = HashMap::new();
        for op in &self.operations {
            if let Operation::Remove(p) = op {
                removes.insert(&p.name, p.clone());
            }
        }
        let mut updated_names = HashSet::new();
        let mut pretty = Vec::new();
        for op in &self.operations {
            match op {
                Operation::Install(p) => {
                    if let Some(from) = removes.get(p.name.as_str()) {
                        pretty.push(PrettyOperation::Update {
                            to: p.clone(),
                            from: from.clone(),
                        });
                        updated_names.insert(p.name.clone());
                    } else {
                        pretty.push(PrettyOperation::Install(p.clone()));
                    }
                }
                Operation::Remove(p) => {
                    if !updated_names.contains(&p.name) {
                        pretty.push(PrettyOperation::Remove(p.clone()));
                    }
                }
            }
        }
        pretty
    }
}

/// Kahn's algorithm restricted to `ids`, ordering by each id's
/// `install_requires` edges to other members of `ids`; lexicographic by
/// name breaks ties among ids with no remaining unsatisfied predecessors.
fn topological_order(pool: &Pool, ids: &[Id], assignment: &Assignment) -> Vec<Id> {
    let member: HashSet<Id> = ids.iter().copied().collect();
    let mut in_degree: HashMap<Id, usize> = ids.iter().map(|&id| (id, 0)).collect();
    let mut dependents: HashMap<Id, Vec<Id>> = HashMap::new();

    for &id in ids {
        let pkg = pool.package_of(id);
        for req in &pkg.install_requires {
            for dep_id in pool.ids_matching(req) {
                if member.contains(&dep_id) && assignment.value_of_var(dep_id) == Some(true) {
                    *in_degree.get_mut(&id).unwrap() += 1;
                    dependents.entry(dep_id).or_default().push(id);
                    break; // one satisfying candidate per requirement is enough
                }
            }
        }
    }

    // Kept in descending-by-name order so `pop()` (back of the vec) yields
    // ascending output; `partition_point` below inserts newly-ready
    // dependents keeping that same descending order.
    let mut ready: Vec<Id> = in_degree.iter().filter(|&(_, &d)| d == 0).map(|(&id, _)| id).collect();
    ready.sort_by(|&a, &b| pool.package_of(b).name.cmp(&pool.package_of(a).name));

    let mut order = Vec::with_capacity(ids.len());
    while let Some(id) = ready.pop() {
        order.push(id);
        if let Some(deps) = dependents.get(&id) {
            for &dep in deps {
                let entry = in_degree.get_mut(&dep).unwrap();
                *entry -= 1;
                if *entry == 0 {
                    let pos = ready.partition_point(|&r| pool.package_of(r).name > pool.package_of(dep).name);
                    ready.insert(pos, dep);
                }
            }
        }
    }

    debug_assert_eq!(order.len(), ids.len(), "install set has a dependency cycle under a satisfying assignment");
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Package;
    use crate::pool::Pool;
    use crate::version::{Requirement, Version};

    fn pkg(name: &str, version: &str) -> Package {
        Package::new(name, Version::parse(version).unwrap())
    }

    #[test]
    fn installs_dependencies_before_dependents() {
        let mut repo = Repository::new();
        repo.add_package(pkg("mkl", "10.3.1"));
        repo.add_package(pkg("numpy", "1.9.2").depends_on(Requirement::new("mkl")));
        let mut pool = Pool::new();
        pool.intern_repository(&repo);

        let mut assignment = Assignment::new(pool.num_ids());
        for id in pool.all_ids() {
            assignment.enqueue(id as i32, None);
        }

        let installed = Repository::new();
        let tx = Transaction::build(&pool, &installed, &assignment);
        let names: Vec<String> = tx
            .operations()
            .iter()
            .map(|op| match op {
                Operation::Install(p) => p.name.clone(),
                Operation::Remove(p) => p.name.clone(),
            })
            .collect();
        assert_eq!(names, vec!["mkl", "numpy"]);
    }

    #[test]
    fn pretty_operations_collapses_update() {
        let mut repo = Repository::new();
        repo.add_package(pkg("mkl", "10.3.2"));
        let mut pool = Pool::new();
        pool.intern_repository(&repo);
        let new_id = pool.id_of(&pkg("mkl", "10.3.2")).unwrap();

        let mut old_repo = Repository::new();
        old_repo.add_package(pkg("mkl", "10.3.1"));
        pool.intern_installed_repository(&old_repo);
        let old_id = pool.id_of(&pkg("mkl", "10.3.1")).unwrap();

        let mut assignment = Assignment::new(pool.num_ids());
        assignment.enqueue(new_id as i32, None);
        assignment.enqueue(-(old_id as i32), None);

        let tx = Transaction::build(&pool, &old_repo, &assignment);
        let pretty = tx.pretty_operations();
        assert_eq!(pretty.len(), 1);
        assert!(matches!(&pretty[0], PrettyOperation::Update { .. }));
    }
}
