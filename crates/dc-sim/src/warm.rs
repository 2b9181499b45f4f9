//! Rollout-based initial guesses.

use crate::error::{SimError, SimResult};
use crate::integrator::integrate;
use crate::rollout::RolloutOptions;
use dc_colloc::CollocationScheme;
use dc_core::Real;
use dc_transcribe::{Bounds, Dynamics, IntervalPlan};
use tracing::debug;

/// Copy of `plan` whose state guesses follow a simulation of its control guesses.
///
/// Each interval is integrated from the previous end state through the
/// collocation node times; the state at node `j` becomes the guess of
/// collocation block `j` and the state at `tau = 1` the end-state guess. All
/// collocation blocks of an interval share one bounds entry, so its guess is
/// the node average. Guesses are clamped into their bounds.
pub fn warm_start(
    plan: &IntervalPlan,
    dynamics: &dyn Dynamics,
    scheme: &CollocationScheme,
    options: &RolloutOptions,
) -> SimResult<IntervalPlan> {
    plan.validate(dynamics.state_dim(), dynamics.control_dim())?;
    if options.substeps == 0 {
        return Err(SimError::InvalidArg {
            what: "substeps must be positive",
        });
    }

    let h = plan.width();
    let nd = dynamics.state_dim();
    let mut warmed = plan.clone();
    let mut x = plan.initial_state().to_vec();
    let mut clamped = 0;

    for k in 0..plan.num_intervals() {
        let Some(interval) = warmed.interval_mut(k) else {
            break;
        };
        let u = interval.control.guess.clone();
        let evaluation_failed = |source| SimError::Evaluation {
            interval: k,
            source,
        };

        let mut tau = 0.0;
        let mut node_sum = vec![0.0; nd];
        for &node in &scheme.nodes()[1..] {
            x = integrate(
                &options.integrator,
                dynamics,
                &x,
                &u,
                (node - tau) * h,
                options.substeps,
            )
            .map_err(evaluation_failed)?;
            tau = node;
            for (sum, xi) in node_sum.iter_mut().zip(&x) {
                *sum += xi;
            }
        }
        if tau < 1.0 {
            x = integrate(
                &options.integrator,
                dynamics,
                &x,
                &u,
                (1.0 - tau) * h,
                options.substeps,
            )
            .map_err(evaluation_failed)?;
        }

        let average: Vec<Real> = node_sum
            .iter()
            .map(|s| s / scheme.degree() as Real)
            .collect();
        clamped += set_guess(&mut interval.collocation_state, &average);
        clamped += set_guess(&mut interval.end_state, &x);
    }

    debug!(
        intervals = plan.num_intervals(),
        clamped, "warm start from rollout"
    );
    Ok(warmed)
}

/// Set a clamped guess; returns how many entries were clamped.
fn set_guess(bounds: &mut Bounds, values: &[Real]) -> usize {
    let mut clamped = 0;
    for (i, &v) in values.iter().enumerate() {
        let inside = v.clamp(bounds.lower[i], bounds.upper[i]);
        if inside != v {
            clamped += 1;
        }
        bounds.guess[i] = inside;
    }
    clamped
}
