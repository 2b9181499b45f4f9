//! The model boundary: state derivatives and path constraints.

use dc_core::{DcError, DcResult, NameMap, Real, ensure_all_finite, ensure_len};

/// Output of one dynamics evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    /// `dx/dt`, length `state_dim`
    pub derivative: Vec<Real>,
    /// Path constraint values, length `path_dim`; feasible when `<= 0`
    pub path: Vec<Real>,
}

impl Evaluation {
    pub fn new(derivative: Vec<Real>, path: Vec<Real>) -> Self {
        Self { derivative, path }
    }

    /// Evaluation of a model without path constraints.
    pub fn derivative_only(derivative: Vec<Real>) -> Self {
        Self {
            derivative,
            path: Vec::new(),
        }
    }
}

/// Continuous-time model `f(state, control) -> (derivative, path)`.
///
/// Implementations must be pure: the same inputs always give the same
/// outputs. They may be called concurrently.
pub trait Dynamics: Send + Sync {
    fn state_dim(&self) -> usize;

    fn control_dim(&self) -> usize;

    /// Number of path constraint rows (may be zero).
    fn path_dim(&self) -> usize;

    fn eval(&self, state: &[Real], control: &[Real]) -> DcResult<Evaluation>;

    fn state_names(&self) -> NameMap {
        NameMap::generic("x", self.state_dim())
    }

    fn control_names(&self) -> NameMap {
        NameMap::generic("u", self.control_dim())
    }
}

/// Evaluate `dynamics`, checking every length and that all outputs are finite.
///
/// A non-finite output reports the component index within `derivative` or
/// `path`.
pub fn evaluate_checked(
    dynamics: &dyn Dynamics,
    state: &[Real],
    control: &[Real],
) -> DcResult<Evaluation> {
    ensure_len(state, dynamics.state_dim(), "dynamics state input")?;
    ensure_len(control, dynamics.control_dim(), "dynamics control input")?;

    let evaluation = dynamics.eval(state, control)?;
    ensure_len(
        &evaluation.derivative,
        dynamics.state_dim(),
        "dynamics derivative output",
    )?;
    ensure_len(&evaluation.path, dynamics.path_dim(), "dynamics path output")?;
    ensure_all_finite(&evaluation.derivative, "state derivative")?;
    ensure_all_finite(&evaluation.path, "path constraint")?;
    Ok(evaluation)
}

/// Closure-backed [`Dynamics`] with declared dimensions.
pub struct FnDynamics<F> {
    state_dim: usize,
    control_dim: usize,
    path_dim: usize,
    f: F,
    state_names: Option<NameMap>,
    control_names: Option<NameMap>,
}

impl<F> FnDynamics<F>
where
    F: Fn(&[Real], &[Real]) -> Evaluation + Send + Sync,
{
    pub fn new(state_dim: usize, control_dim: usize, path_dim: usize, f: F) -> Self {
        Self {
            state_dim,
            control_dim,
            path_dim,
            f,
            state_names: None,
            control_names: None,
        }
    }

    /// Attach state and control names; lengths must match the dimensions.
    pub fn with_names(mut self, states: NameMap, controls: NameMap) -> DcResult<Self> {
        if states.len() != self.state_dim {
            return Err(DcError::DimensionMismatch {
                what: "state names",
                expected: self.state_dim,
                actual: states.len(),
            });
        }
        if controls.len() != self.control_dim {
            return Err(DcError::DimensionMismatch {
                what: "control names",
                expected: self.control_dim,
                actual: controls.len(),
            });
        }
        self.state_names = Some(states);
        self.control_names = Some(controls);
        Ok(self)
    }
}

impl<F> Dynamics for FnDynamics<F>
where
    F: Fn(&[Real], &[Real]) -> Evaluation + Send + Sync,
{
    fn state_dim(&self) -> usize {
        self.state_dim
    }

    fn control_dim(&self) -> usize {
        self.control_dim
    }

    fn path_dim(&self) -> usize {
        self.path_dim
    }

    fn eval(&self, state: &[Real], control: &[Real]) -> DcResult<Evaluation> {
        Ok((self.f)(state, control))
    }

    fn state_names(&self) -> NameMap {
        self.state_names
            .clone()
            .unwrap_or_else(|| NameMap::generic("x", self.state_dim))
    }

    fn control_names(&self) -> NameMap {
        self.control_names
            .clone()
            .unwrap_or_else(|| NameMap::generic("u", self.control_dim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tank() -> FnDynamics<impl Fn(&[Real], &[Real]) -> Evaluation + Send + Sync> {
        // dh/dt = q_in - sqrt(h), h <= 2
        FnDynamics::new(1, 1, 1, |x: &[Real], u: &[Real]| {
            Evaluation::new(vec![u[0] - x[0].sqrt()], vec![x[0] - 2.0])
        })
    }

    #[test]
    fn checked_evaluation_passes_values_through() {
        let e = evaluate_checked(&tank(), &[4.0], &[1.0]).unwrap();
        assert_eq!(e.derivative, vec![-1.0]);
        assert_eq!(e.path, vec![2.0]);
    }

    #[test]
    fn wrong_input_length_rejected() {
        let err = evaluate_checked(&tank(), &[4.0, 1.0], &[1.0]).unwrap_err();
        assert_eq!(
            err,
            DcError::DimensionMismatch {
                what: "dynamics state input",
                expected: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn non_finite_output_reports_component() {
        let err = evaluate_checked(&tank(), &[-1.0], &[0.0]).unwrap_err();
        assert!(matches!(
            err,
            DcError::NonFinite {
                what: "state derivative",
                index: 0,
                ..
            }
        ));
    }

    #[test]
    fn declared_path_width_enforced() {
        let lying = FnDynamics::new(1, 0, 2, |x: &[Real], _: &[Real]| {
            Evaluation::new(vec![-x[0]], vec![0.0])
        });
        assert!(matches!(
            evaluate_checked(&lying, &[1.0], &[]),
            Err(DcError::DimensionMismatch { expected: 2, .. })
        ));
    }

    #[test]
    fn default_and_custom_names() {
        assert_eq!(tank().state_names().names(), &["x0".to_string()]);
        let named = tank()
            .with_names(
                NameMap::new(["level"]).unwrap(),
                NameMap::new(["inflow"]).unwrap(),
            )
            .unwrap();
        assert_eq!(named.control_names().index_of("inflow"), Some(0));
        assert!(
            tank()
                .with_names(NameMap::new(["a", "b"]).unwrap(), NameMap::generic("u", 1))
                .is_err()
        );
    }
}
