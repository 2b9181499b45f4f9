//! Plain-text and JSON rendering of solve results.

use dc_core::Real;
use dc_solver::Diagnostics;
use dc_transcribe::{SolveResult, Trajectories};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Series {
    pub name: String,
    pub values: Vec<Real>,
}

#[derive(Debug, Serialize)]
pub struct SolveReport {
    pub name: String,
    pub converged: bool,
    pub objective: Real,
    pub diagnostics: Diagnostics,
    pub times: Vec<Real>,
    pub states: Vec<Series>,
    pub controls: Vec<Series>,
    /// Largest relative gap between the collocated states and a rollout
    pub rollout_mismatch: Real,
}

impl SolveReport {
    pub fn new(name: &str, result: &SolveResult, rollout_mismatch: Real) -> Self {
        let t = &result.trajectories;
        Self {
            name: name.to_string(),
            converged: result.converged,
            objective: result.objective,
            diagnostics: result.diagnostics.clone(),
            times: t.times.clone(),
            states: series(t, t.state_names.names(), Trajectories::state),
            controls: series(t, t.control_names.names(), Trajectories::control),
            rollout_mismatch,
        }
    }

    pub fn print(&self) {
        let d = &self.diagnostics;
        if self.converged {
            println!("✓ Converged: {}", self.name);
        } else {
            println!("✗ Not converged ({}): {}", d.status, self.name);
        }
        println!("  Objective:   {:.6e}", self.objective);
        println!(
            "  Iterations:  {} outer, {} inner",
            d.iterations, d.inner_iterations
        );
        println!("  Violation:   {:.3e}", d.constraint_violation);
        if let Some(optimality) = d.optimality {
            println!("  Optimality:  {:.3e}", optimality);
        }
        println!(
            "  Evaluations: {} cost, {} constraints, {} jacobians, {} hessians",
            d.cost_evaluations,
            d.constraint_evaluations,
            d.jacobian_evaluations,
            d.hessian_evaluations
        );
        println!("  Solve time:  {:.3}s", d.elapsed_s);

        println!("\n  {:>10}  {}", "t", join_names(&self.states));
        for (k, t) in self.times.iter().enumerate() {
            let row: Vec<String> = self
                .states
                .iter()
                .map(|s| format!("{:>12.5e}", s.values[k]))
                .collect();
            println!("  {:>10.4}  {}", t, row.join(" "));
        }

        if !self.controls.is_empty() {
            println!("\n  {:>10}  {}", "t", join_names(&self.controls));
            for (k, t) in self.times.iter().take(self.times.len() - 1).enumerate() {
                let row: Vec<String> = self
                    .controls
                    .iter()
                    .map(|s| format!("{:>12.5e}", s.values[k]))
                    .collect();
                println!("  {:>10.4}  {}", t, row.join(" "));
            }
        }

        println!("\nRollout mismatch: {:.3e}", self.rollout_mismatch);
    }
}

fn series(
    t: &Trajectories,
    names: &[String],
    lookup: fn(&Trajectories, &str) -> Option<Vec<Real>>,
) -> Vec<Series> {
    names
        .iter()
        .filter_map(|name| {
            lookup(t, name).map(|values| Series {
                name: name.clone(),
                values,
            })
        })
        .collect()
}

fn join_names(series: &[Series]) -> String {
    series
        .iter()
        .map(|s| format!("{:>12}", s.name))
        .collect::<Vec<_>>()
        .join(" ")
}
