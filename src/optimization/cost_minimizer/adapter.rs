//! Adapter that exposes a user `Objective` as an `argmin` problem.
//!
//! The cost is passed through unchanged. Analytic gradients (if provided by
//! the objective) are validated and forwarded; otherwise the adapter
//! finite-differences its own `cost`, so the non-finite guard applies to
//! every evaluation the gradient makes.
use crate::optimization::{
    cost_minimizer::{
        finite_diff::fd_gradient,
        traits::Objective,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
    errors::{OptError, OptResult},
};
use argmin::core::{CostFunction, Error, Gradient};

/// Bridges a user `Objective` to `argmin`'s `CostFunction` and `Gradient`.
///
/// - `CostFunction::cost` returns `c(θ)`, rejecting non-finite values. The
///   rejection ends the current line search; `minimize` then restarts from
///   the best iterate.
/// - `Gradient::gradient` returns:
///   - the objective's own gradient when it implements `grad`, or
///   - a finite-difference gradient of the cost (central first, forward as
///     a fallback).
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: Objective> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: Objective> ArgMinAdapter<'a, F> {
    /// Construct a new adapter over a user `Objective` and its data.
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }

    /// Evaluate the cost with the crate error type.
    ///
    /// # Errors
    /// - Propagates errors from `Objective::value`.
    /// - [`OptError::NonFiniteCost`] when the value is `NaN` or infinite.
    pub fn checked_cost(&self, theta: &Theta) -> OptResult<Cost> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err(OptError::NonFiniteCost { value: output });
        }
        Ok(output)
    }

    /// Evaluate the gradient with the crate error type.
    ///
    /// # Errors
    /// - Propagates errors from `Objective::grad` other than
    ///   `GradientNotImplemented`.
    /// - Validation errors for the returned or finite-difference gradient.
    pub fn checked_gradient(&self, theta: &Theta) -> OptResult<Grad> {
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, theta.len())?;
                Ok(g)
            }
            Err(OptError::GradientNotImplemented) => {
                fd_gradient(theta, |x: &Theta| self.checked_cost(x))
            }
            Err(e) => Err(e),
        }
    }
}

impl<'a, F: Objective> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.checked_cost(theta)?)
    }
}

impl<'a, F: Objective> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        Ok(self.checked_gradient(theta)?)
    }
}
