//! Integration suite over the nine literal scenarios and the determinism
//! property from §8.

use depsolve::transaction::{Operation, PrettyOperation};
use depsolve::version::{Constraint, Requirement, Version};
use depsolve::{
    Package, Repository, Request, SolveError, SolveOptions, repository_is_consistent, requirements_are_complete, solve,
};
use rstest::rstest;

fn pkg(name: &str, version: &str) -> Package {
    Package::new(name, Version::parse(version).unwrap())
}

fn names(operations: &[Operation]) -> Vec<String> {
    operations
        .iter()
        .map(|op| match op {
            Operation::Install(p) => p.name.clone(),
            Operation::Remove(p) => p.name.clone(),
        })
        .collect()
}

#[rstest]
fn scenario_1_simple_install() {
    let mut repo = Repository::new();
    repo.add_package(pkg("mkl", "10.3.1"));
    let installed = Repository::new();
    let mut request = Request::new();
    request.install(Requirement::new("mkl"));

    let tx = solve(&[&repo], &installed, &request, SolveOptions::default()).unwrap();
    assert_eq!(tx.operations().len(), 1);
    assert!(matches!(&tx.operations()[0], Operation::Install(p) if p.name == "mkl" && p.version.to_string() == "10.3.1"));
}

#[rstest]
fn scenario_2_multiple_installs_sorted() {
    let mut repo = Repository::new();
    repo.add_package(pkg("mkl", "10.3.1"));
    repo.add_package(pkg("libgfortran", "3.0.2"));
    let installed = Repository::new();
    let mut request = Request::new();
    request.install(Requirement::new("mkl"));
    request.install(Requirement::new("libgfortran"));

    let tx = solve(&[&repo], &installed, &request, SolveOptions::default()).unwrap();
    assert_eq!(names(tx.operations()), vec!["libgfortran", "mkl"]);
}

#[rstest]
fn scenario_3_dependency_pull() {
    let mut repo = Repository::new();
    repo.add_package(pkg("mkl", "10.3.1"));
    repo.add_package(pkg("libgfortran", "3.0.2"));
    repo.add_package(
        pkg("numpy", "1.9.2")
            .depends_on(Requirement::new("mkl").with_constraint(Constraint::EqualTo(Version::parse("10.3.1").unwrap())))
            .depends_on(Requirement::new("libgfortran").with_constraint(Constraint::CompatibleWith(Version::parse("3.0.0").unwrap()))),
    );
    let installed = Repository::new();
    let mut request = Request::new();
    request.install(Requirement::new("numpy"));

    let tx = solve(&[&repo], &installed, &request, SolveOptions::default()).unwrap();
    assert_eq!(names(tx.operations()), vec!["libgfortran", "mkl", "numpy"]);
}

#[rstest]
fn scenario_4_already_installed_is_a_no_op() {
    let mut repo = Repository::new();
    repo.add_package(pkg("mkl", "10.3.1"));
    repo.add_package(pkg("mkl", "10.3.2"));
    let mut installed = Repository::new();
    installed.add_package(pkg("mkl", "10.3.1"));
    let mut request = Request::new();
    request.install(Requirement::new("mkl"));

    let tx = solve(&[&repo], &installed, &request, SolveOptions::default()).unwrap();
    assert!(tx.is_empty());
}

#[rstest]
fn scenario_5_update_path() {
    let mut repo = Repository::new();
    repo.add_package(pkg("mkl", "10.3.1"));
    repo.add_package(pkg("mkl", "10.3.2"));
    let mut installed = Repository::new();
    installed.add_package(pkg("mkl", "10.3.1"));
    let mut request = Request::new();
    request.install(Requirement::new("mkl").with_constraint(Constraint::GreaterThan(Version::parse("10.3.1").unwrap())));

    let tx = solve(&[&repo], &installed, &request, SolveOptions::default()).unwrap();
    assert_eq!(tx.operations().len(), 2);
    assert!(matches!(&tx.operations()[0], Operation::Install(p) if p.version.to_string() == "10.3.2"));
    assert!(matches!(&tx.operations()[1], Operation::Remove(p) if p.version.to_string() == "10.3.1"));

    let pretty = tx.pretty_operations();
    assert_eq!(pretty.len(), 1);
    match &pretty[0] {
        PrettyOperation::Update { to, from } => {
            assert_eq!(to.version.to_string(), "10.3.2");
            assert_eq!(from.version.to_string(), "10.3.1");
        }
        other => panic!("expected an Update, got {other:?}"),
    }
}

#[rstest]
fn scenario_6_unsatisfiable_missing_transitive() {
    let mut repo = Repository::new();
    repo.add_package(pkg("mkl", "10.3.1").depends_on(Requirement::new("missing")));
    repo.add_package(pkg("numpy", "2.0.0").depends_on(Requirement::new("mkl")));
    repo.add_package(pkg("numpy", "1.9.2"));
    let installed = Repository::new();
    let mut request = Request::new();
    request.install(Requirement::new("numpy").with_constraint(Constraint::GreaterEqual(Version::parse("2.0.0").unwrap())));

    let err = solve(&[&repo], &installed, &request, SolveOptions::default()).unwrap_err();
    assert!(matches!(err, SolveError::Satisfiability(_)));
}

#[rstest]
fn scenario_7_strict_missing() {
    let mut repo = Repository::new();
    repo.add_package(pkg("mkl", "10.3.1").depends_on(Requirement::new("missing")));
    repo.add_package(pkg("numpy", "2.0.0").depends_on(Requirement::new("mkl")));
    let installed = Repository::new();
    let mut request = Request::new();
    request.install(Requirement::new("numpy").with_constraint(Constraint::EqualTo(Version::parse("2.0.0").unwrap())));

    let options = SolveOptions {
        use_pruning: true,
        strict: true,
    };
    let err = solve(&[&repo], &installed, &request, options).unwrap_err();
    assert!(matches!(err, SolveError::MissingInstallRequires { .. }));
}

#[rstest]
fn scenario_8_complete_check() {
    let mut repo = Repository::new();
    repo.add_package(pkg("mkl", "10.3.1"));
    repo.add_package(
        pkg("numpy", "1.8.1").depends_on(Requirement::new("mkl").with_constraint(Constraint::EqualTo(Version::parse("10.3.1").unwrap()))),
    );

    let complete = vec![
        Requirement::new("numpy").with_constraint(Constraint::CompatibleWith(Version::parse("1.8.1").unwrap())),
        Requirement::new("mkl").with_constraint(Constraint::EqualTo(Version::parse("10.3.1").unwrap())),
    ];
    assert!(requirements_are_complete(&[&repo], &complete));

    let incomplete = vec![Requirement::new("numpy")];
    assert!(!requirements_are_complete(&[&repo], &incomplete));
}

#[rstest]
fn scenario_9_consistency() {
    let mut repo = Repository::new();
    repo.add_package(
        pkg("numpy", "1.8.1").depends_on(Requirement::new("mkl").with_constraint(Constraint::EqualTo(Version::parse("10.3.1").unwrap()))),
    );
    assert!(!repository_is_consistent(&repo));

    repo.add_package(pkg("mkl", "10.3.1"));
    assert!(repository_is_consistent(&repo));
}

#[rstest]
fn determinism_repeated_solves_match() {
    let mut repo = Repository::new();
    repo.add_package(pkg("mkl", "10.3.1"));
    repo.add_package(pkg("libgfortran", "3.0.2"));
    repo.add_package(pkg("numpy", "1.9.2").depends_on(Requirement::new("mkl")).depends_on(Requirement::new("libgfortran")));
    let installed = Repository::new();
    let mut request = Request::new();
    request.install(Requirement::new("numpy"));

    let first = solve(&[&repo], &installed, &request, SolveOptions::default()).unwrap();
    let second = solve(&[&repo], &installed, &request, SolveOptions::default()).unwrap();
    assert_eq!(first.operations(), second.operations());
}
