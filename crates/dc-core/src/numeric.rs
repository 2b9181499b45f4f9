use crate::{DcError, DcResult};

/// Floating point type used throughout system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> DcResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(DcError::NonFinite {
            what,
            index: 0,
            value: v,
        })
    }
}

/// Reject the first non-finite entry of `values`, reporting its position.
pub fn ensure_all_finite(values: &[Real], what: &'static str) -> DcResult<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(DcError::NonFinite {
            what,
            index,
            value: values[index],
        }),
        None => Ok(()),
    }
}

pub fn ensure_len(values: &[Real], expected: usize, what: &'static str) -> DcResult<()> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(DcError::DimensionMismatch {
            what,
            expected,
            actual: values.len(),
        })
    }
}

/// Max-norm; zero for an empty slice.
pub fn inf_norm(values: &[Real]) -> Real {
    values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_all_finite_reports_position() {
        let err = ensure_all_finite(&[1.0, 2.0, Real::INFINITY], "row").unwrap_err();
        assert!(matches!(err, DcError::NonFinite { index: 2, .. }));
        assert!(ensure_all_finite(&[], "row").is_ok());
    }

    #[test]
    fn ensure_len_mismatch() {
        let err = ensure_len(&[1.0], 3, "guess").unwrap_err();
        assert_eq!(
            err,
            DcError::DimensionMismatch {
                what: "guess",
                expected: 3,
                actual: 1
            }
        );
    }

    #[test]
    fn inf_norm_picks_largest_magnitude() {
        assert_eq!(inf_norm(&[1.0, -4.0, 2.5]), 4.0);
        assert_eq!(inf_norm(&[]), 0.0);
    }

    proptest::proptest! {
        #[test]
        fn inf_norm_bounds_every_entry(values in proptest::collection::vec(-1e6..1e6f64, 0..20)) {
            let norm = inf_norm(&values);
            proptest::prop_assert!(values.iter().all(|v| v.abs() <= norm));
            proptest::prop_assert!(values.is_empty() || values.iter().any(|v| v.abs() == norm));
        }
    }
}
