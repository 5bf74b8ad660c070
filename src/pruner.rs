//! Pruner (component H): an optional post-pass dropping install operations
//! the solver introduced but that nothing requested actually needs.

use std::collections::HashSet;

use crate::pool::{Id, Pool};
use crate::request::Request;
use crate::sat::Assignment;
use crate::transaction::{Operation, Transaction};

/// Recompute `transaction`'s install operations, keeping only those
/// reachable from a job-requirement match by walking `install_requires`
/// edges through the assignment. Remove operations are never pruned.
pub fn prune(pool: &Pool, request: &Request, assignment: &Assignment, transaction: &Transaction) -> Transaction {
    let reachable = reachable_ids(pool, request, assignment);
    let kept: Vec<Operation> = transaction
        .operations()
        .iter()
        .filter(|op| match op {
            Operation::Install(pkg) => {
                let id = pool.id_of(pkg).expect("transaction installs a pool-known package");
                reachable.contains(&id)
            }
            Operation::Remove(_) => true,
        })
        .cloned()
        .collect();
    Transaction::from_operations(kept)
}

fn reachable_ids(pool: &Pool, request: &Request, assignment: &Assignment) -> HashSet<Id> {
    let mut reachable = HashSet::new();
    let mut frontier: Vec<Id> = Vec::new();

    for job in &request.jobs {
        for id in pool.ids_matching(&job.requirement) {
            if assignment.value_of_var(id) == Some(true) && reachable.insert(id) {
                frontier.push(id);
            }
        }
    }

    while let Some(id) = frontier.pop() {
        let pkg = pool.package_of(id);
        for req in &pkg.install_requires {
            for dep_id in pool.ids_matching(req) {
                if assignment.value_of_var(dep_id) == Some(true) && reachable.insert(dep_id) {
                    frontier.push(dep_id);
                }
            }
        }
    }

    reachable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{Package, Repository};
    use crate::request::Request;
    use crate::version::{Requirement, Version};

    fn pkg(name: &str, version: &str) -> Package {
        Package::new(name, Version::parse(version).unwrap())
    }

    #[test]
    fn drops_unreachable_install() {
        let mut repo = Repository::new();
        repo.add_package(pkg("mkl", "10.3.1"));
        repo.add_package(pkg("orphan", "1.0.0"));
        let mut pool = Pool::new();
        pool.intern_repository(&repo);

        let mkl_id = pool.id_of(&pkg("mkl", "10.3.1")).unwrap();
        let orphan_id = pool.id_of(&pkg("orphan", "1.0.0")).unwrap();

        let mut assignment = Assignment::new(pool.num_ids());
        assignment.enqueue(mkl_id as i32, None);
        assignment.enqueue(orphan_id as i32, None);

        let mut request = Request::new();
        request.install(Requirement::new("mkl"));

        let installed = Repository::new();
        let tx = Transaction::build(&pool, &installed, &assignment);
        assert_eq!(tx.operations().len(), 2);

        let pruned = prune(&pool, &request, &assignment, &tx);
        assert_eq!(pruned.operations().len(), 1);
    }
}
