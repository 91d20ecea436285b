//! cost_minimizer::finite_diff — finite-difference gradient helpers.
//!
//! Purpose
//! -------
//! Provide finite-difference gradient approximations around a parameter
//! vector, together with error capture and validation, so that the rest of
//! the optimizer can request derivatives without depending directly on the
//! `finitediff` API.
//!
//! Key behaviors
//! -------------
//! - Compute central- and forward-difference gradients with error capture
//!   and post-hoc validation via [`run_central_diff`] / [`run_fd_diff`].
//! - Offer a fallible-objective entry point, [`fd_gradient`], that tries
//!   central differences first and retries with forward differences when
//!   the central result is unusable.
//!
//! Invariants & assumptions
//! ------------------------
//! - Any error raised by the objective during finite differencing is routed
//!   into the shared `closure_err` cell and treated as a hard failure for
//!   the gradient computation.
//! - Gradients returned from this module always satisfy [`validate_grad`].
//!
//! Downstream usage
//! ----------------
//! - The argmin adapter calls [`fd_gradient`] when an [`Objective`] does not
//!   provide a gradient.
//! - Objectives with local structure (the sweep) call [`fd_gradient`] on
//!   small sub-vectors to assemble their own gradient block by block.
//!
//! [`Objective`]: crate::optimization::cost_minimizer::Objective
use crate::optimization::{
    cost_minimizer::{Grad, Theta, validation::validate_grad},
    errors::{OptError, OptResult},
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// run_fd_diff — forward-difference gradient with error capture and validation.
///
/// Parameters
/// ----------
/// - `theta`: point at which the gradient is approximated; its length
///   defines the expected gradient dimension.
/// - `func`: scalar objective. It must route evaluation errors into
///   `closure_err` and return `NaN` in that case.
/// - `closure_err`: shared cell capturing the first error raised inside
///   `func`. Cleared on entry.
///
/// Errors
/// ------
/// - The error captured in `closure_err`, converted into `OptError`.
/// - `OptError::GradientDimMismatch` / `OptError::InvalidGradient` from
///   [`validate_grad`].
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    finish(theta, fd_grad, closure_err)
}

/// run_central_diff — central-difference counterpart of [`run_fd_diff`].
///
/// Same contract as [`run_fd_diff`], with twice the evaluations and
/// second-order accuracy.
pub fn run_central_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.central_diff(func);
    finish(theta, fd_grad, closure_err)
}

/// fd_gradient — finite-difference gradient of a fallible objective.
///
/// Tries central differences first. If the objective failed during the
/// central pass, or the central gradient fails validation, the gradient is
/// recomputed with forward differences, whose result (or error) is final.
///
/// # Errors
/// - Any `OptError` raised by `func` during the forward pass.
/// - Validation errors of the forward-difference gradient.
pub fn fd_gradient<F>(theta: &Theta, func: F) -> OptResult<Grad>
where
    F: Fn(&Theta) -> OptResult<f64>,
{
    let closure_err: RefCell<Option<Error>> = RefCell::new(None);
    let cost_func = |x: &Theta| -> f64 {
        match func(x) {
            Ok(val) => val,
            Err(e) => {
                let mut slot = closure_err.borrow_mut();
                if slot.is_none() {
                    *slot = Some(e.into());
                }
                f64::NAN
            }
        }
    };
    match run_central_diff(theta, &cost_func, &closure_err) {
        Ok(grad) => Ok(grad),
        Err(_) => run_fd_diff(theta, &cost_func, &closure_err),
    }
}

// ---- Helper methods ----

fn finish(theta: &Theta, fd_grad: Grad, closure_err: &RefCell<Option<Error>>) -> OptResult<Grad> {
    if let Some(err) = closure_err.take() {
        return Err(OptError::from(err));
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use argmin::core::ArgminError;
    use ndarray::{Array1, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Forward and central gradients with and without closure errors.
    // - Validation failures for non-finite gradients.
    // - The central → forward fallback of `fd_gradient`.
    //
    // They intentionally DO NOT cover:
    // - End-to-end optimizer behavior (handled in the runner tests).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that `run_fd_diff` returns a valid gradient for a simple quadratic
    // objective with no internal error path.
    //
    // Given
    // -----
    // - A parameter vector `theta` in ℝ².
    // - An objective `f(theta) = thetaᵀ theta` with no error side channel.
    //
    // Expect
    // ------
    // - `run_fd_diff` returns `Ok(grad)` with `grad.len() == theta.len()`.
    // - All gradient entries are finite.
    fn run_fd_diff_quadratic_returns_valid_gradient() {
        // Arrange
        let theta: Theta = Array1::from(vec![0.0_f64, 1.0]);
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |x: &Theta| x.dot(x);

        // Act
        let result = run_fd_diff(&theta, &f, &closure_err);

        // Assert
        let grad = result.expect("Gradient for quadratic should be computed successfully");
        assert_eq!(grad.len(), theta.len());
        assert!(grad.iter().all(|v| v.is_finite()));
    }

    #[test]
    // Purpose
    // -------
    // Ensure that `run_fd_diff` propagates an error captured in `closure_err`
    // as an `OptError` via the `From<Error>` implementation.
    //
    // Given
    // -----
    // - An objective closure that writes an `ArgminError` into `closure_err`
    //   and returns `NaN`.
    //
    // Expect
    // ------
    // - `run_fd_diff` returns `Err(OptError::NotImplemented { .. })`.
    fn run_fd_diff_closure_error_is_propagated() {
        // Arrange
        let theta: Theta = Array1::from(vec![1.0_f64]);
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);

        let f = |_: &Theta| {
            let argmin_err = ArgminError::NotImplemented { text: "fd test".to_string() };
            closure_err.replace(Some(argmin_err.into()));
            f64::NAN
        };

        // Act
        let result = run_fd_diff(&theta, &f, &closure_err);

        // Assert
        let err = result.expect_err("Error in closure should cause run_fd_diff to fail");
        assert!(matches!(err, OptError::NotImplemented { .. }), "got {err:?}");
    }

    #[test]
    fn run_central_diff_non_finite_gradient_yields_invalidgradient_error() {
        let theta: Theta = Array1::from(vec![0.0_f64, 1.0]);
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |_x: &Theta| f64::NAN;

        let err = run_central_diff(&theta, &f, &closure_err)
            .expect_err("Non-finite gradient should cause an error");
        assert!(matches!(err, OptError::InvalidGradient { .. }));
    }

    #[test]
    // Purpose
    // -------
    // Check that `fd_gradient` matches the analytic gradient of a smooth
    // function to central-difference accuracy.
    //
    // Given
    // -----
    // - `f(x, y) = x² + 3·y`, evaluated at `(2, -1)`.
    //
    // Expect
    // ------
    // - Gradient ≈ `(4, 3)`.
    fn fd_gradient_matches_analytic_gradient() {
        // Arrange
        let theta = array![2.0, -1.0];

        // Act
        let grad = fd_gradient(&theta, |x: &Theta| Ok(x[0] * x[0] + 3.0 * x[1]))
            .expect("smooth objective should differentiate");

        // Assert
        assert_abs_diff_eq!(grad[0], 4.0, epsilon = 1e-5);
        assert_abs_diff_eq!(grad[1], 3.0, epsilon = 1e-5);
    }

    #[test]
    fn fd_gradient_surfaces_objective_errors() {
        let theta = array![0.5];
        let err = fd_gradient(&theta, |_x: &Theta| Err(OptError::NonFiniteCost { value: 1.0 }))
            .expect_err("failing objective must not yield a gradient");
        assert_eq!(err, OptError::NonFiniteCost { value: 1.0 });
    }
}
