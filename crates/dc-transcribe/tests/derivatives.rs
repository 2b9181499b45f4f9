//! Block-assembled derivatives of a transcription against dense differences.

use dc_colloc::{CollocationScheme, NodeScheme};
use dc_core::Real;
use dc_solver::NlpProblem;
use dc_solver::jacobian::{
    SECOND_DIFFERENCE_STEP, central_difference_jacobian, forward_difference_hessian, free_indices,
};
use dc_transcribe::{
    Bounds, Evaluation, FnDynamics, FnObjective, IntervalPlan, Sense, TranscribeOptions,
    transcribe,
};

fn pendulum_like() -> FnDynamics<impl Fn(&[Real], &[Real]) -> Evaluation + Send + Sync> {
    FnDynamics::new(2, 1, 1, |x: &[Real], u: &[Real]| {
        Evaluation::new(
            vec![x[1] * u[0], -x[0] * x[0] + u[0].sin()],
            vec![x[0] * x[1] - 2.0],
        )
    })
}

fn plan() -> IntervalPlan {
    IntervalPlan::uniform(
        1.5,
        3,
        vec![0.3, -0.2],
        Bounds::new(vec![-2.0], vec![2.0], vec![0.4]),
        Bounds::new(vec![-5.0, -5.0], vec![5.0, 5.0], vec![0.5, 0.1]),
    )
}

fn objective() -> FnObjective {
    FnObjective::new(Sense::Maximize, |term| {
        let mut value = 0.0;
        if let Some(previous) = term.previous_control {
            value -= (term.control[0] - previous[0]).powi(2);
        }
        if term.is_last() {
            value += term.state[0];
        }
        value
    })
    .with_running(|x, u| x[1] * x[1] * u[0])
}

/// Guess moved off its symmetric values so every entry differs.
fn point(guess: &[Real]) -> Vec<Real> {
    guess
        .iter()
        .enumerate()
        .map(|(j, v)| v + 0.1 * (j as Real).sin())
        .collect()
}

#[test]
fn block_jacobian_matches_dense_differences() {
    let dynamics = pendulum_like();
    let scheme = CollocationScheme::build(2, &NodeScheme::Legendre).unwrap();
    let objective = objective();
    let t = transcribe(&dynamics, &scheme, &plan(), &objective, TranscribeOptions::default())
        .unwrap();
    let nlp = t.problem();
    let w = point(t.guess());
    let frozen: Vec<bool> = nlp
        .variable_lower()
        .iter()
        .zip(nlp.variable_upper())
        .map(|(lo, hi)| lo == hi)
        .collect();

    let blocks = nlp.constraint_jacobian(&w, 1e-6, &frozen).unwrap();
    let columns = free_indices(&frozen);
    let dense = central_difference_jacobian(
        &w,
        &columns,
        nlp.num_constraints(),
        |x, out| nlp.constraints(x, out),
        1e-6,
    )
    .unwrap();

    assert_eq!(blocks.shape(), (nlp.num_constraints(), nlp.num_variables()));
    for (a, &j) in columns.iter().enumerate() {
        for i in 0..nlp.num_constraints() {
            let (got, want) = (blocks[(i, j)], dense[(i, a)]);
            assert!((got - want).abs() < 1e-6, "J[{i}, {j}]: {got} vs {want}");
        }
    }
    // X_0 is pinned
    assert!(blocks.column(0).iter().all(|v| *v == 0.0));
}

#[test]
fn block_hessian_matches_dense_differences() {
    let dynamics = pendulum_like();
    let scheme = CollocationScheme::build(2, &NodeScheme::Legendre).unwrap();
    let objective = objective();
    let t = transcribe(&dynamics, &scheme, &plan(), &objective, TranscribeOptions::default())
        .unwrap();
    let nlp = t.problem();
    let w = point(t.guess());
    let frozen: Vec<bool> = nlp
        .variable_lower()
        .iter()
        .zip(nlp.variable_upper())
        .map(|(lo, hi)| lo == hi)
        .collect();
    // Some rows carry no weight at all
    let weights: Vec<Real> = (0..nlp.num_constraints())
        .map(|i| if i % 4 == 0 { 0.0 } else { 0.5 - 0.1 * (i % 7) as Real })
        .collect();

    let blocks = nlp.lagrangian_hessian(&w, &weights, &frozen).unwrap();
    let indices = free_indices(&frozen);
    let dense = forward_difference_hessian(
        &w,
        &indices,
        |x| {
            let mut g = vec![0.0; nlp.num_constraints()];
            nlp.constraints(x, &mut g)?;
            let weighted: Real = g.iter().zip(&weights).map(|(gi, wi)| gi * wi).sum();
            Ok(nlp.cost(x)? + weighted)
        },
        SECOND_DIFFERENCE_STEP,
    )
    .unwrap();

    for (a, &i) in indices.iter().enumerate() {
        for (b, &j) in indices.iter().enumerate() {
            let (got, want) = (blocks[(i, j)], dense[(a, b)]);
            assert!(
                (got - want).abs() < 1e-3 * (1.0 + want.abs()),
                "H[{i}, {j}]: {got} vs {want}"
            );
        }
    }

    // No term reads the states of two intervals that are not adjacent
    let intervals = t.layout().intervals();
    let (first, last) = (intervals[0].collocation.start, intervals[2].collocation.start);
    assert_eq!(blocks[(first, last)], 0.0);
    assert_eq!(blocks[(last, first)], 0.0);
}
