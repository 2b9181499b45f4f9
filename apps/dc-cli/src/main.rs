mod error;
mod report;

use clap::{Parser, Subcommand, ValueEnum};
use dc_colloc::{CollocationScheme, NodeScheme};
use dc_sim::rollout_mismatch;
use dc_solver::AugmentedLagrangian;
use error::CliResult;
use report::SolveReport;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "dc-cli")]
#[command(about = "dircol CLI - direct-collocation optimal control", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate problem file syntax, dimensions and bounds
    Validate {
        /// Path to the problem YAML (or .json) file
        problem_path: PathBuf,
    },
    /// Print collocation nodes and C, D, B coefficients
    Coefficients {
        /// Number of collocation points per interval
        #[arg(long, default_value_t = 3)]
        degree: usize,
        #[arg(long, value_enum, default_value_t = NodeArg::Radau)]
        nodes: NodeArg,
        /// Emit JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Transcribe and solve a problem once
    Solve {
        /// Path to the problem YAML (or .json) file
        problem_path: PathBuf,
        /// Override the solver's outer iteration cap
        #[arg(long)]
        max_iterations: Option<usize>,
        /// Warm start from a rollout even if the file does not ask for one
        #[arg(long)]
        warm_start: bool,
        /// Emit JSON instead of tables
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum NodeArg {
    Radau,
    Legendre,
}

impl From<NodeArg> for NodeScheme {
    fn from(arg: NodeArg) -> Self {
        match arg {
            NodeArg::Radau => NodeScheme::Radau,
            NodeArg::Legendre => NodeScheme::Legendre,
        }
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { problem_path } => cmd_validate(&problem_path),
        Commands::Coefficients {
            degree,
            nodes,
            json,
        } => cmd_coefficients(degree, nodes.into(), json),
        Commands::Solve {
            problem_path,
            max_iterations,
            warm_start,
            json,
        } => cmd_solve(&problem_path, max_iterations, warm_start, json),
    }
}

fn cmd_validate(problem_path: &Path) -> CliResult<()> {
    println!("Validating problem: {}", problem_path.display());
    let problem = dc_project::load(problem_path)?;
    let compiled = dc_project::compile(&problem)?;
    let transcription = compiled.transcribe()?;
    println!("✓ Problem is valid: {}", problem.name);
    println!(
        "  Model: {} ({} states, {} controls, {} path constraints)",
        problem.model.kind(),
        compiled.dynamics.state_dim(),
        compiled.dynamics.control_dim(),
        compiled.dynamics.path_dim()
    );
    println!(
        "  Collocation: degree {} ({}), {} intervals",
        compiled.scheme.degree(),
        compiled.scheme.node_scheme().as_str(),
        compiled.plan.num_intervals()
    );
    println!(
        "  NLP: {} variables, {} constraints",
        transcription.num_variables(),
        transcription.num_constraints()
    );
    Ok(())
}

#[derive(Serialize)]
struct CoefficientReport {
    degree: usize,
    nodes: Vec<f64>,
    /// `c[j][r]`: derivative of basis `j` at node `r`
    c: Vec<Vec<f64>>,
    d: Vec<f64>,
    b: Vec<f64>,
}

fn cmd_coefficients(degree: usize, nodes: NodeScheme, json: bool) -> CliResult<()> {
    let scheme = CollocationScheme::build(degree, &nodes)?;
    let c = scheme.c();
    let report = CoefficientReport {
        degree,
        nodes: scheme.nodes().to_vec(),
        c: (0..c.nrows())
            .map(|j| c.row(j).iter().copied().collect())
            .collect(),
        d: scheme.d().to_vec(),
        b: scheme.b().to_vec(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} collocation, degree {}", nodes.as_str(), degree);
    println!("\n  {:>3}  {:>22}  {:>22}  {:>22}", "j", "tau", "D", "B");
    for j in 0..=degree {
        println!(
            "  {:>3}  {:>22.15e}  {:>22.15e}  {:>22.15e}",
            j, report.nodes[j], report.d[j], report.b[j]
        );
    }
    println!("\n  C[j][r]");
    for (j, row) in report.c.iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|v| format!("{:>12.5e}", v)).collect();
        println!("  {:>3}  {}", j, cells.join(" "));
    }
    println!(
        "\n  sum D = {:.15}, sum B = {:.15}",
        report.d.iter().sum::<f64>(),
        report.b.iter().sum::<f64>()
    );
    Ok(())
}

fn cmd_solve(
    problem_path: &Path,
    max_iterations: Option<usize>,
    warm_start: bool,
    json: bool,
) -> CliResult<()> {
    let problem = dc_project::load(problem_path)?;
    let mut compiled = dc_project::compile(&problem)?;
    if let Some(n) = max_iterations {
        compiled.solver.max_iterations = n;
    }
    let rollout_options = compiled.warm_start.unwrap_or_default();
    if warm_start && compiled.warm_start.is_none() {
        compiled.apply_warm_start(&rollout_options)?;
    }

    if !json {
        println!("Solving: {}", compiled.name);
    }
    let result = compiled.solve(&AugmentedLagrangian)?;
    let mismatch = rollout_mismatch(
        compiled.dynamics.as_ref(),
        &result.trajectories,
        &rollout_options,
    )?;

    let report = SolveReport::new(&compiled.name, &result, mismatch);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print();
    }
    Ok(())
}
