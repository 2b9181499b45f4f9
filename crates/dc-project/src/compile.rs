//! Turn a validated problem file into runnable parts.

use crate::ProjectResult;
use crate::schema::{ModelDef, ObjectiveDef, ProblemFile};
use crate::validate::{ValidationError, validate_problem};
use dc_colloc::CollocationScheme;
use dc_core::DcResult;
use dc_models::{ExponentialDecay, LuteinModel};
use dc_sim::{RolloutOptions, SimResult, warm_start};
use dc_solver::{NlpSolver, SolverOptions};
use dc_transcribe::{
    Dynamics, IntervalPlan, ObjectivePolicy, SolveResult, TerminalObjective, TranscribeOptions,
    TranscribeResult, Transcription, solve, transcribe,
};
use tracing::info;

/// Model, objective, plan and basis ready for transcription.
pub struct CompiledProblem {
    pub name: String,
    pub dynamics: Box<dyn Dynamics>,
    pub objective: Box<dyn ObjectivePolicy>,
    pub plan: IntervalPlan,
    pub scheme: CollocationScheme,
    pub solver: SolverOptions,
    pub warm_start: Option<RolloutOptions>,
    pub transcription: TranscribeOptions,
}

impl CompiledProblem {
    pub fn transcribe(&self) -> TranscribeResult<Transcription<'_>> {
        transcribe(
            self.dynamics.as_ref(),
            &self.scheme,
            &self.plan,
            self.objective.as_ref(),
            self.transcription,
        )
    }

    /// Replace the state guesses with a rollout of the control guesses.
    pub fn apply_warm_start(&mut self, options: &RolloutOptions) -> SimResult<()> {
        self.plan = warm_start(&self.plan, self.dynamics.as_ref(), &self.scheme, options)?;
        Ok(())
    }

    pub fn solve(&self, solver: &dyn NlpSolver) -> TranscribeResult<SolveResult> {
        solve(self.transcribe()?, solver, &self.solver)
    }
}

/// Validate `problem` and build its parts. The warm start, if configured, is
/// applied before returning.
pub fn compile(problem: &ProblemFile) -> ProjectResult<CompiledProblem> {
    validate_problem(problem)?;

    let dynamics = build_dynamics(&problem.model).map_err(ValidationError::from)?;
    let scheme = CollocationScheme::build(problem.collocation.degree, &problem.collocation.nodes)
        .map_err(ValidationError::from)?;
    let mut compiled = CompiledProblem {
        name: problem.name.clone(),
        dynamics,
        objective: build_objective(&problem.objective),
        plan: build_plan(problem),
        scheme,
        solver: problem.solver.clone(),
        warm_start: problem.warm_start,
        transcription: problem.transcription,
    };
    if let Some(options) = &problem.warm_start {
        compiled.apply_warm_start(options)?;
    }

    info!(
        name = %compiled.name,
        model = problem.model.kind(),
        intervals = problem.intervals,
        degree = problem.collocation.degree,
        nodes = problem.collocation.nodes.as_str(),
        warm_start = problem.warm_start.is_some(),
        "compiled problem"
    );
    Ok(compiled)
}

pub(crate) fn build_dynamics(model: &ModelDef) -> DcResult<Box<dyn Dynamics>> {
    let dynamics: Box<dyn Dynamics> = match model {
        ModelDef::Lutein { params, limits } => {
            Box::new(LuteinModel::new(params.clone(), limits.clone())?)
        }
        ModelDef::ExponentialDecay { rate } => Box::new(ExponentialDecay::new(*rate)?),
    };
    Ok(dynamics)
}

fn build_objective(objective: &ObjectiveDef) -> Box<dyn ObjectivePolicy> {
    match objective {
        ObjectiveDef::Lutein(objective) => Box::new(objective.clone()),
        ObjectiveDef::Terminal { weights, sense } => {
            Box::new(TerminalObjective::new(weights.clone(), *sense))
        }
    }
}

pub(crate) fn build_plan(problem: &ProblemFile) -> IntervalPlan {
    IntervalPlan::uniform(
        problem.horizon,
        problem.intervals,
        problem.initial_state.clone(),
        problem.control.clone(),
        problem.state.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CollocationDef;
    use dc_colloc::NodeScheme;
    use dc_transcribe::{Bounds, Sense};

    fn decay(warm_start: Option<RolloutOptions>) -> ProblemFile {
        ProblemFile {
            version: 1,
            name: "decay".to_string(),
            model: ModelDef::ExponentialDecay { rate: 1.0 },
            objective: ObjectiveDef::Terminal {
                weights: vec![1.0],
                sense: Sense::Maximize,
            },
            horizon: 1.0,
            intervals: 4,
            collocation: CollocationDef {
                degree: 2,
                nodes: NodeScheme::Legendre,
            },
            initial_state: vec![1.0],
            state: Bounds::new(vec![0.0], vec![2.0], vec![0.5]),
            control: Bounds::empty(),
            solver: SolverOptions::default(),
            warm_start,
            transcription: TranscribeOptions::default(),
        }
    }

    #[test]
    fn compiled_shape_follows_file() {
        let compiled = compile(&decay(None)).unwrap();
        assert_eq!(compiled.dynamics.state_dim(), 1);
        assert_eq!(compiled.scheme.degree(), 2);
        assert_eq!(compiled.plan.num_intervals(), 4);
        assert_eq!(compiled.objective.sense(), Sense::Maximize);

        let t = compiled.transcribe().unwrap();
        // 1 + 4 (2 + 1)
        assert_eq!(t.num_variables(), 13);
        // 4 (2 + 1), no path rows
        assert_eq!(t.num_constraints(), 12);
    }

    #[test]
    fn warm_start_applied_on_compile() {
        let compiled = compile(&decay(Some(RolloutOptions::default()))).unwrap();
        let end = compiled.plan.intervals()[3].end_state.guess[0];
        assert!((end - (-1.0f64).exp()).abs() < 1e-6, "{end}");
    }

    #[test]
    fn invalid_file_fails_before_building() {
        let mut problem = decay(None);
        problem.initial_state = vec![1.0, 2.0];
        assert!(matches!(
            compile(&problem),
            Err(crate::ProjectError::Validation(ValidationError::Plan(_)))
        ));
    }
}
