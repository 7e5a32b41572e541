//! Golden-section search on a closed interval.
//!
//! Finds the optimum of a unimodal function by shrinking a bracket `[a, b]`
//! with two interior points placed at the golden ratio. Each step discards
//! the half that cannot contain the optimum and reuses one of the previous
//! evaluations, so every iteration costs a single function call.
//!
//! The search stops once `|b - a| <= tolerance` and returns the midpoint of
//! the final bracket. For brackets far from zero the tolerance is raised to
//! the spacing of adjacent floats there, and the search also stops as soon as
//! a step fails to narrow the bracket.

use crate::error::{Error, Result};

/// `2 - φ`, the fraction of the bracket between an end and the nearer interior point.
const RESPHI: f64 = 0.381_966_011_250_105_1;

/// Default absolute bracket width at which the search stops.
pub const DEFAULT_TOLERANCE: f64 = 1e-5;

/// Finds the minimizer of `objective` on `[lower, upper]`.
///
/// # Errors
///
/// Returns [`Error::InvalidBounds`] if `lower > upper` or either end is not
/// finite, and [`Error::InvalidParameter`] if `tolerance` is not a positive
/// finite number.
///
/// # Examples
///
/// ```
/// let x = pricer::golden::minimize(|x| (x - 2.0) * (x - 2.0), 0.0, 5.0, 1e-6).unwrap();
/// assert!((x - 2.0).abs() < 1e-6);
/// ```
pub fn minimize<F>(mut objective: F, lower: f64, upper: f64, tolerance: f64) -> Result<f64>
where
    F: FnMut(f64) -> f64,
{
    validate(lower, upper, tolerance)?;

    let (mut a, mut b) = (lower, upper);
    let mut x1 = a + RESPHI * (b - a);
    let mut x2 = b - RESPHI * (b - a);
    let mut f1 = objective(x1);
    let mut f2 = objective(x2);

    while b - a > tolerance.max(f64::EPSILON * a.abs().max(b.abs())) {
        let width = b - a;
        if f1 < f2 {
            b = x2;
            x2 = x1;
            f2 = f1;
            x1 = a + RESPHI * (b - a);
            f1 = objective(x1);
        } else {
            a = x1;
            x1 = x2;
            f1 = f2;
            x2 = b - RESPHI * (b - a);
            f2 = objective(x2);
        }
        if b - a >= width {
            break;
        }
    }

    Ok((a + b) / 2.0)
}

/// Finds the maximizer of `objective` on `[lower, upper]` by minimizing its
/// negation.
///
/// # Errors
///
/// Same conditions as [`minimize`].
pub fn maximize<F>(mut objective: F, lower: f64, upper: f64, tolerance: f64) -> Result<f64>
where
    F: FnMut(f64) -> f64,
{
    minimize(|x| -objective(x), lower, upper, tolerance)
}

fn validate(lower: f64, upper: f64, tolerance: f64) -> Result<()> {
    if !(lower.is_finite() && upper.is_finite()) || lower > upper {
        return Err(Error::InvalidBounds {
            low: lower,
            high: upper,
        });
    }
    if !(tolerance.is_finite() && tolerance > 0.0) {
        return Err(Error::InvalidParameter {
            name: "tolerance",
            reason: format!("must be positive and finite, got {tolerance}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resphi_constant() {
        let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
        assert!((RESPHI - (2.0 - phi)).abs() < 1e-15);
    }

    #[test]
    fn test_maximize_concave_quadratic() {
        let x = maximize(|x| -(x - 3.0).powi(2) + 10.0, 0.0, 10.0, DEFAULT_TOLERANCE).unwrap();
        assert!((x - 3.0).abs() <= DEFAULT_TOLERANCE, "x = {x}");
    }

    #[test]
    fn test_minimize_off_center() {
        let x = minimize(|x| (x - 17.25).powi(2), -3.0, 20.0, 1e-8).unwrap();
        assert!((x - 17.25).abs() < 1e-7, "x = {x}");
    }

    #[test]
    fn test_optimum_at_boundary_stays_inside() {
        let x = maximize(|x| x, 1.0, 2.0, 1e-5).unwrap();
        assert!(x < 2.0 && x > 2.0 - 1e-5, "x = {x}");
    }

    #[test]
    fn test_one_evaluation_per_iteration() {
        let mut calls = 0_u32;
        minimize(
            |x| {
                calls += 1;
                (x - 0.5).abs()
            },
            0.0,
            1.0,
            1e-5,
        )
        .unwrap();
        // ln(1e5) / ln(φ) ≈ 24 shrink steps, plus the two initial evaluations.
        assert!((24..=28).contains(&calls), "calls = {calls}");
    }

    #[test]
    fn test_terminates_far_from_zero() {
        let mut calls = 0_u32;
        let x = maximize(
            |x| {
                calls += 1;
                -(x - 1.1e12).powi(2)
            },
            1.0e12,
            1.2e12,
            DEFAULT_TOLERANCE,
        )
        .unwrap();
        assert!((x - 1.1e12).abs() / 1.1e12 < 1e-9, "x = {x}");
        assert!(calls < 200, "calls = {calls}");
    }

    #[test]
    fn test_tolerance_below_float_spacing() {
        let x = minimize(|x| (x - 3.0).abs(), 2.0, 4.0, 1e-300).unwrap();
        assert!((x - 3.0).abs() < 1e-12, "x = {x}");
    }

    #[test]
    fn test_zero_width_interval() {
        let x = minimize(|x| x * x, 4.0, 4.0, 1e-5).unwrap();
        assert_eq!(x, 4.0);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            minimize(|x| x, 2.0, 1.0, 1e-5),
            Err(Error::InvalidBounds { .. })
        ));
        assert!(matches!(
            minimize(|x| x, 0.0, 1.0, 0.0),
            Err(Error::InvalidParameter {
                name: "tolerance",
                ..
            })
        ));
        assert!(minimize(|x| x, f64::NEG_INFINITY, 1.0, 1e-5).is_err());
    }
}
