//! Direct-collocation transcription of an interval plan into an NLP.

use crate::builder::{ConstraintBlock, ConstraintExpr, ConstraintKernel, NlpBuilder, VarRange};
use crate::dynamics::Dynamics;
use crate::error::{TranscribeError, TranscribeResult};
use crate::extract::{IntervalLayout, Layout};
use crate::nlp::Nlp;
use crate::objective::ObjectivePolicy;
use crate::plan::{Bounds, IntervalPlan};
use dc_colloc::CollocationScheme;
use dc_core::Real;
use dc_solver::NlpProblem;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Switches that change the shape of the transcription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscribeOptions {
    /// Also enforce the path constraints at `(X_N, U_{N-1})`.
    pub terminal_path_row: bool,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            terminal_path_row: true,
        }
    }
}

/// An assembled program plus its initial guess.
pub struct Transcription<'a> {
    nlp: Nlp<'a>,
    guess: Vec<Real>,
}

impl<'a> Transcription<'a> {
    pub fn problem(&self) -> &Nlp<'a> {
        &self.nlp
    }

    pub fn layout(&self) -> &Layout {
        self.nlp.layout()
    }

    pub fn blocks(&self) -> &[ConstraintBlock] {
        self.nlp.blocks()
    }

    /// Decision vector made of the plan's guesses.
    pub fn guess(&self) -> &[Real] {
        &self.guess
    }

    pub fn num_variables(&self) -> usize {
        self.nlp.num_variables()
    }

    pub fn num_constraints(&self) -> usize {
        self.nlp.num_constraints()
    }

    pub fn into_parts(self) -> (Nlp<'a>, Vec<Real>) {
        (self.nlp, self.guess)
    }
}

/// Expected row count: `N (m + d (nd + m) + nd)` plus `m` for the terminal row.
pub fn expected_rows(
    intervals: usize,
    degree: usize,
    state_dim: usize,
    path_dim: usize,
    terminal_path_row: bool,
) -> usize {
    let terminal = if terminal_path_row { path_dim } else { 0 };
    intervals * (path_dim + degree * (state_dim + path_dim) + state_dim) + terminal
}

/// Build the NLP for `plan` under `dynamics` with the given collocation scheme.
///
/// Variables are ordered `X_0, U_0, Xc_{0,1..d}, X_1, U_1, ..., X_N`, with `X_0`
/// pinned to the initial state. Per interval the rows are: path at
/// `(X_k, U_k)`; for each collocation point the defect then the path rows; the
/// continuity rows; and on the last interval an extra path block at
/// `(X_N, U_{N-1})` when enabled. Path blocks are omitted when the model has
/// no path constraints.
pub fn transcribe<'a>(
    dynamics: &'a dyn Dynamics,
    scheme: &'a CollocationScheme,
    plan: &IntervalPlan,
    objective: &'a dyn ObjectivePolicy,
    options: TranscribeOptions,
) -> TranscribeResult<Transcription<'a>> {
    let nd = dynamics.state_dim();
    let nu = dynamics.control_dim();
    let m = dynamics.path_dim();
    let d = scheme.degree();
    plan.validate(nd, nu)?;

    let n = plan.num_intervals();
    let h = plan.width();
    debug!(intervals = n, degree = d, nd, nu, m, width = h, "transcribing");

    let mut builder = NlpBuilder::new(ConstraintKernel {
        dynamics,
        scheme,
        width: h,
    });
    let initial = builder.add_variable_block(&Bounds::fixed(plan.initial_state().to_vec()))?;

    let mut intervals = Vec::with_capacity(n);
    let mut start = initial;
    for (k, bounds) in plan.intervals().iter().enumerate() {
        let control = builder.add_variable_block(&bounds.control)?;
        if m > 0 {
            builder.add_constraint_block(
                ConstraintExpr::Path {
                    state: start,
                    control,
                },
                Real::NEG_INFINITY,
                0.0,
            )?;
        }

        let first = builder.add_variable_block(&bounds.collocation_state)?;
        for _ in 1..d {
            builder.add_variable_block(&bounds.collocation_state)?;
        }
        let collocation = VarRange {
            start: first.start,
            len: d * nd,
        };

        for point in 1..=d {
            builder.add_constraint_block(
                ConstraintExpr::Defect {
                    point,
                    start,
                    collocation,
                    control,
                },
                0.0,
                0.0,
            )?;
            if m > 0 {
                builder.add_constraint_block(
                    ConstraintExpr::Path {
                        state: collocation.chunk(point - 1, nd),
                        control,
                    },
                    Real::NEG_INFINITY,
                    0.0,
                )?;
            }
        }

        let next = builder.add_variable_block(&bounds.end_state)?;
        builder.add_constraint_block(
            ConstraintExpr::Continuity {
                start,
                collocation,
                next,
            },
            0.0,
            0.0,
        )?;

        if k + 1 == n && m > 0 && options.terminal_path_row {
            builder.add_constraint_block(
                ConstraintExpr::Path {
                    state: next,
                    control,
                },
                Real::NEG_INFINITY,
                0.0,
            )?;
        }

        intervals.push(IntervalLayout {
            start,
            control,
            collocation,
            end: next,
        });
        start = next;
    }

    debug_assert_eq!(
        builder.num_rows(),
        expected_rows(n, d, nd, m, options.terminal_path_row)
    );

    let layout = Layout {
        state_dim: nd,
        control_dim: nu,
        degree: d,
        width: h,
        num_variables: builder.num_variables(),
        initial,
        intervals,
        state_names: dynamics.state_names(),
        control_names: dynamics.control_names(),
    };
    let (nlp, guess) = Nlp::new(builder.into_parts(), objective, layout);
    nlp.objective(&guess)
        .map_err(|source| TranscribeError::InvalidObjective { source })?;

    info!(
        variables = nlp.num_variables(),
        constraints = nlp.num_constraints(),
        blocks = nlp.blocks().len(),
        "transcription assembled"
    );
    Ok(Transcription { nlp, guess })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::{Evaluation, FnDynamics};
    use crate::objective::{FnObjective, Sense, TerminalObjective};
    use dc_colloc::NodeScheme;

    fn decay() -> FnDynamics<impl Fn(&[Real], &[Real]) -> Evaluation + Send + Sync> {
        FnDynamics::new(1, 0, 0, |x: &[Real], _: &[Real]| {
            Evaluation::derivative_only(vec![-x[0]])
        })
    }

    fn decay_plan(intervals: usize) -> IntervalPlan {
        IntervalPlan::uniform(
            1.0,
            intervals,
            vec![1.0],
            Bounds::empty(),
            Bounds::new(vec![0.0], vec![2.0], vec![1.0]),
        )
    }

    #[test]
    fn decay_layout_without_path_rows() {
        let dynamics = decay();
        let scheme = CollocationScheme::build(3, &NodeScheme::Radau).unwrap();
        let objective = TerminalObjective::new(vec![1.0], Sense::Maximize);
        let t = transcribe(
            &dynamics,
            &scheme,
            &decay_plan(2),
            &objective,
            TranscribeOptions::default(),
        )
        .unwrap();

        // X0, Xc(3), X1, Xc(3), X2
        assert_eq!(t.num_variables(), 9);
        assert_eq!(t.num_constraints(), 2 * (3 + 1));
        assert_eq!(t.layout().intervals()[1].start, VarRange { start: 4, len: 1 });
        assert_eq!(t.problem().variable_lower()[0], 1.0);
        assert_eq!(t.problem().variable_upper()[0], 1.0);
    }

    #[test]
    fn cost_is_sign_adjusted_objective() {
        let dynamics = decay();
        let scheme = CollocationScheme::build(2, &NodeScheme::Radau).unwrap();
        let objective = TerminalObjective::new(vec![3.0], Sense::Maximize);
        let t = transcribe(
            &dynamics,
            &scheme,
            &decay_plan(1),
            &objective,
            TranscribeOptions::default(),
        )
        .unwrap();
        let nlp = t.problem();
        assert_eq!(nlp.objective(t.guess()).unwrap(), 3.0);
        assert_eq!(nlp.cost(t.guess()).unwrap(), -3.0);
    }

    #[test]
    fn invalid_plan_fails_before_assembly() {
        let dynamics = decay();
        let scheme = CollocationScheme::build(2, &NodeScheme::Radau).unwrap();
        let objective = TerminalObjective::new(vec![1.0], Sense::Minimize);
        let result = transcribe(
            &dynamics,
            &scheme,
            &decay_plan(0),
            &objective,
            TranscribeOptions::default(),
        );
        assert!(matches!(result, Err(TranscribeError::InvalidPlan { .. })));
    }

    #[test]
    fn non_finite_objective_at_guess_rejected() {
        let dynamics = decay();
        let scheme = CollocationScheme::build(2, &NodeScheme::Radau).unwrap();
        let objective = FnObjective::new(Sense::Minimize, |_| Real::NAN);
        let result = transcribe(
            &dynamics,
            &scheme,
            &decay_plan(1),
            &objective,
            TranscribeOptions::default(),
        );
        assert!(matches!(
            result,
            Err(TranscribeError::InvalidObjective { .. })
        ));
    }
}
