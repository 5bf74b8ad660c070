//! `depsolve solve <scenario.yaml> [--no-prune] [--debug] [--print-ids]` (§6, §10.3).
//!
//! Drives the library's component pieces directly rather than calling
//! [`depsolve::solve`] wholesale, so `--debug` can surface the policy's
//! decision log and `--print-ids` can surface pool ids — neither of which
//! the high-level solving API exposes, by design (§10.3: the library stays
//! CLI-agnostic).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, error, LevelFilter};

use depsolve::diagnostics::Explanation;
use depsolve::error::SolveError;
use depsolve::policy::Policy;
use depsolve::pool::Pool;
use depsolve::pruner;
use depsolve::sat::{SatOutcome, SatSolver};
use depsolve::scenario::Scenario;
use depsolve::transaction::Transaction;

/// CDCL-based dependency solver.
#[derive(Debug, Parser)]
#[command(name = "depsolve", version, about)]
struct Cli {
    /// Scenario YAML file describing the repository, installed state, and request.
    scenario: PathBuf,

    /// Skip the pruning pass; keep every solver-introduced install.
    #[arg(long)]
    no_prune: bool,

    /// Emit the policy's decision log and solver internals to stderr.
    #[arg(long)]
    debug: bool,

    /// Print each package's pool id alongside its name and version.
    #[arg(long)]
    print_ids: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::from_default_env().filter_level(level).init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(true)` on a satisfiable request (transaction printed to
/// stdout), `Ok(false)` on an unsatisfiable one (diagnostic printed to
/// stderr) — only scenario loading and parsing failures are `Err`.
fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let scenario = Scenario::load(&cli.scenario)?;
    let repo = scenario.repository()?;
    let installed = scenario.installed_repository()?;
    let request = scenario.request()?;

    let mut pool = Pool::new();
    pool.intern_repository(&repo);
    pool.intern_installed_repository(&installed);

    debug!("interned {} package ids", pool.num_ids());
    let rules = depsolve::rules::generate(&pool, &request, false)?;
    let suppressed = rules.suppressed_bias_names.clone();
    let mut policy = Policy::new(&pool, &rules.job_disjunctions, &suppressed, &request.adhoc_constraints);
    let mut solver = SatSolver::new(rules.clauses);

    let outcome = solver.solve(&mut policy);

    if cli.debug {
        for decision in policy.decision_log() {
            debug!("decision #{}: {} ({})", decision.sequence, decision.literal, decision.reason);
        }
    }

    match outcome {
        SatOutcome::Satisfied => {
            let transaction = Transaction::build(&pool, &installed, solver.assignment());
            let transaction = if cli.no_prune {
                transaction
            } else {
                pruner::prune(&pool, &request, solver.assignment(), &transaction)
            };
            print_transaction(&pool, &transaction, cli.print_ids);
            Ok(true)
        }
        SatOutcome::Unsatisfiable { conflict, learned_trail } => {
            let explanation = Explanation::build(&solver, conflict, &learned_trail);
            eprintln!("{}", SolveError::Satisfiability(explanation));
            Ok(false)
        }
    }
}

fn print_transaction(pool: &Pool, transaction: &Transaction, print_ids: bool) {
    if transaction.is_empty() {
        println!("nothing to do");
        return;
    }
    for op in transaction.pretty_operations() {
        if print_ids {
            println!("{} {}", op, pretty_operation_ids(pool, &op));
        } else {
            println!("{op}");
        }
    }
}

fn pretty_operation_ids(pool: &Pool, op: &depsolve::transaction::PrettyOperation) -> String {
    use depsolve::transaction::PrettyOperation;
    match op {
        PrettyOperation::Install(p) => format!("(#{})", pool.id_of(p).expect("solved package is pool-known")),
        PrettyOperation::Remove(p) => format!("(#{})", pool.id_of(p).expect("solved package is pool-known")),
        PrettyOperation::Update { to, from } => format!(
            "(#{} -> #{})",
            pool.id_of(from).expect("solved package is pool-known"),
            pool.id_of(to).expect("solved package is pool-known")
        ),
    }
}
