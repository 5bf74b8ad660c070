//! Scenario loading (§10.4): test/CLI fixture format. A `Scenario` is
//! deserialized with `serde` + `serde_yaml`; its package entries use a
//! small pretty-package-string grammar, the Rust-native replacement for
//! the source's ad-hoc string-to-metadata parser. Neither half of this
//! module is touched by the solving API itself — both are CLI/test-only.

use std::path::Path;

use serde::Deserialize;

use crate::error::ScenarioError;
use crate::package::{Package, Repository};
use crate::request::Request;
use crate::version::{Constraint, Requirement, Version};

/// Top-level scenario file shape (§6): `packages`, optional `installed`,
/// optional `request`.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub packages: Vec<String>,
    #[serde(default)]
    pub installed: Vec<String>,
    #[serde(default)]
    pub request: Vec<ScenarioJob>,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioJob {
    pub operation: ScenarioOperation,
    pub requirement: String,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioOperation {
    Install,
    Remove,
    Update,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    pub fn repository(&self) -> Result<Repository, ScenarioError> {
        build_repository(&self.packages)
    }

    pub fn installed_repository(&self) -> Result<Repository, ScenarioError> {
        build_repository(&self.installed)
    }

    pub fn request(&self) -> Result<Request, ScenarioError> {
        let mut request = Request::new();
        for job in &self.request {
            let requirement = parse_requirement(&job.requirement)?;
            match job.operation {
                ScenarioOperation::Install => request.install(requirement),
                ScenarioOperation::Remove => request.remove(requirement),
                ScenarioOperation::Update => request.update(requirement),
            };
        }
        Ok(request)
    }
}

fn build_repository(entries: &[String]) -> Result<Repository, ScenarioError> {
    let mut repo = Repository::new();
    for text in entries {
        repo.add_package(parse_package(text)?);
    }
    Ok(repo)
}

fn malformed(text: &str, reason: impl Into<String>) -> ScenarioError {
    ScenarioError::PackageString {
        text: text.to_string(),
        reason: reason.into(),
    }
}

/// Parse `"name version[; depends (req, ...)][; conflicts (req, ...)][; provides (req, ...)]"`.
pub fn parse_package(text: &str) -> Result<Package, ScenarioError> {
    let mut segments = text.split(';').map(str::trim);
    let head = segments.next().filter(|s| !s.is_empty()).ok_or_else(|| malformed(text, "empty package string"))?;

    let mut head_parts = head.split_whitespace();
    let name = head_parts.next().ok_or_else(|| malformed(text, "missing package name"))?;
    let version_text = head_parts.next().ok_or_else(|| malformed(text, "missing package version"))?;
    let version = Version::parse(version_text).map_err(|e| malformed(text, e.to_string()))?;

    let mut package = Package::new(name, version);
    for clause in segments {
        let (kind, body) = clause.split_once('(').ok_or_else(|| malformed(text, format!("malformed clause {clause:?}")))?;
        let body = body.strip_suffix(')').ok_or_else(|| malformed(text, format!("unterminated clause {clause:?}")))?;
        for req_text in body.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let requirement = parse_requirement(req_text)?;
            package = match kind.trim() {
                "depends" => package.depends_on(requirement),
                "conflicts" => package.conflicts_with(requirement),
                "provides" => package.provides(requirement),
                other => return Err(malformed(text, format!("unknown clause kind {other:?}"))),
            };
        }
    }
    Ok(package)
}

const OPERATORS: [&str; 7] = [">=", "<=", "==", "!=", "^=", ">", "<"];

/// Parse `"name [op version]..."`, e.g. `"numpy >=1.0.0 <2.0.0"`, `"mkl *"`,
/// or the no-space-after-name form used by the `depends (...)` clause
/// grammar, `"mkl==10.3.1"`.
pub fn parse_requirement(text: &str) -> Result<Requirement, ScenarioError> {
    let (name, rest) = split_requirement_name(text).ok_or_else(|| malformed(text, "missing requirement name"))?;
    let mut requirement = Requirement::new(name);
    for token in rest.split_whitespace() {
        requirement = requirement.with_constraint(parse_constraint(token, text)?);
    }
    Ok(requirement)
}

/// The name ends at the first whitespace (`"numpy >=1.0.0"`) or, if none
/// comes first, at the first recognized operator with no separating space
/// (`"mkl==10.3.1"`).
fn split_requirement_name(text: &str) -> Option<(&str, &str)> {
    let whitespace_at = text.find(char::is_whitespace);
    let operator_at = OPERATORS.iter().filter_map(|op| text.find(op)).filter(|&i| i > 0).min();
    let boundary = match (whitespace_at, operator_at) {
        (Some(w), Some(o)) => w.min(o),
        (Some(w), None) => w,
        (None, Some(o)) => o,
        (None, None) => text.len(),
    };
    let name = text[..boundary].trim();
    if name.is_empty() { None } else { Some((name, text[boundary..].trim())) }
}

fn parse_constraint(token: &str, original: &str) -> Result<Constraint, ScenarioError> {
    if token == "*" {
        return Ok(Constraint::Any);
    }
    let (op, rest) = OPERATORS
        .iter()
        .find_map(|op| token.strip_prefix(op).map(|rest| (*op, rest)))
        .ok_or_else(|| malformed(original, format!("unrecognized constraint operator in {token:?}")))?;
    let version = Version::parse(rest).map_err(|e| malformed(original, e.to_string()))?;
    Ok(match op {
        ">=" => Constraint::GreaterEqual(version),
        "<=" => Constraint::LessEqual(version),
        "==" => Constraint::EqualTo(version),
        "!=" => Constraint::NotEqualTo(version),
        "^=" => Constraint::CompatibleWith(version),
        ">" => Constraint::GreaterThan(version),
        "<" => Constraint::LessThan(version),
        _ => unreachable!("operator list above is exhaustive"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_package() {
        let pkg = parse_package("mkl 10.3.1").unwrap();
        assert_eq!(pkg.name, "mkl");
        assert_eq!(pkg.version, Version::parse("10.3.1").unwrap());
        assert!(pkg.install_requires.is_empty());
    }

    #[test]
    fn parses_depends_clause() {
        let pkg = parse_package("numpy 1.9.2; depends (mkl==10.3.1, libgfortran^=3.0.0)").unwrap();
        assert_eq!(pkg.install_requires.len(), 2);
        assert_eq!(pkg.install_requires[0].name, "mkl");
        assert_eq!(pkg.install_requires[0].constraints, vec![Constraint::EqualTo(Version::parse("10.3.1").unwrap())]);
        assert_eq!(pkg.install_requires[1].name, "libgfortran");
        assert_eq!(
            pkg.install_requires[1].constraints,
            vec![Constraint::CompatibleWith(Version::parse("3.0.0").unwrap())]
        );
    }

    #[test]
    fn requirement_name_ends_at_operator_with_no_separating_space() {
        let req = parse_requirement("mkl==10.3.1").unwrap();
        assert_eq!(req.name, "mkl");
        assert_eq!(req.constraints, vec![Constraint::EqualTo(Version::parse("10.3.1").unwrap())]);
    }

    #[test]
    fn requirement_name_ends_at_whitespace_when_present() {
        let req = parse_requirement("numpy >=1.0.0 <2.0.0").unwrap();
        assert_eq!(req.name, "numpy");
        assert_eq!(
            req.constraints,
            vec![
                Constraint::GreaterEqual(Version::parse("1.0.0").unwrap()),
                Constraint::LessThan(Version::parse("2.0.0").unwrap())
            ]
        );
    }

    #[test]
    fn requirement_with_no_constraint_keeps_whole_text_as_name() {
        let req = parse_requirement("numpy").unwrap();
        assert_eq!(req.name, "numpy");
        assert!(req.constraints.is_empty());
    }

    #[test]
    fn parses_conflicts_and_provides() {
        let pkg = parse_package("libressl 3.0.0; conflicts (openssl); provides (openssl==3.0.0)").unwrap();
        assert_eq!(pkg.conflicts.len(), 1);
        assert_eq!(pkg.provides.len(), 1);
    }

    #[test]
    fn rejects_missing_version() {
        assert!(parse_package("mkl").is_err());
    }

    #[test]
    fn scenario_roundtrips_from_yaml() {
        let yaml = r#"
packages:
  - "mkl 10.3.1"
  - "numpy 1.9.2; depends (mkl==10.3.1)"
installed:
  - "mkl 10.3.1"
request:
  - operation: install
    requirement: "numpy"
"#;
        let scenario: Scenario = serde_yaml::from_str(yaml).unwrap();
        let repo = scenario.repository().unwrap();
        assert_eq!(repo.len(), 2);
        let installed = scenario.installed_repository().unwrap();
        assert_eq!(installed.len(), 1);
        let request = scenario.request().unwrap();
        assert_eq!(request.jobs.len(), 1);
    }
}
