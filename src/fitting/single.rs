//! fitting::single — objective for fitting one biquad to one target.
//!
//! Purpose
//! -------
//! Score a candidate [`BiquadFilter`] against one analog target response:
//!
//! ```text
//! error = scale · Σ_k w_k·|H(ω_k) − T_k|²  +  Σ_poles B(p)  +  Σ_zeros B(z)
//! ```
//!
//! where `B` is the [`BarrierPenalty`]. The same scoring is reused block by
//! block by the sweep objective.
//!
//! Key behaviors
//! -------------
//! - [`GridSamples`] precomputes `e^{−jω}` and the weights once per grid and
//!   is shared by every target of a sweep.
//! - [`SingleFitError::terms`] returns the fidelity and both barrier terms
//!   separately for diagnostics.
//! - The gradient is analytic. Fidelity uses `∂H/∂b_k = z^k/D` and
//!   `∂H/∂a_k = −H·z^k/D`; the barrier differentiates the closed-form roots
//!   ([`BarrierPenalty::pair_grad`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - A [`FitTarget`] always has exactly one finite response value per grid
//!   bin.
//! - Non-finite costs (e.g. a vanishing `b0` sending a zero to infinity) are
//!   reported as values, and rejected by the optimizer adapter.
use crate::{
    biquad::filter::{BiquadFilter, N_COEFFS},
    circuit::{grid::FrequencyGrid, response::TargetResponse},
    fitting::{
        errors::{FitError, FitResult},
        options::BarrierPenalty,
    },
    optimization::{
        cost_minimizer::{Cost, Grad, Objective, Theta, validation::validate_theta_input},
        errors::OptResult,
    },
};
use ndarray::Array1;
use num_complex::Complex64;
use std::sync::Arc;

/// Unit-circle samples `e^{−jω_k}` and weights of a frequency grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSamples {
    unit: Array1<Complex64>,
    weights: Array1<f64>,
}

impl GridSamples {
    pub fn new(grid: &FrequencyGrid) -> Self {
        let unit = grid.omegas().mapv(|w| Complex64::from_polar(1.0, -w));
        Self { unit, weights: grid.weights().clone() }
    }

    pub fn len(&self) -> usize {
        self.unit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unit.is_empty()
    }
}

/// One target response together with the grid it was sampled on.
#[derive(Debug, Clone, PartialEq)]
pub struct FitTarget {
    samples: Arc<GridSamples>,
    response: TargetResponse,
}

impl FitTarget {
    /// # Errors
    /// - [`FitError::TargetLengthMismatch`] when the response and grid differ in length.
    /// - [`FitError::NonFiniteTarget`] for the first non-finite response value.
    pub fn new(samples: Arc<GridSamples>, response: TargetResponse) -> FitResult<Self> {
        if response.len() != samples.len() {
            return Err(FitError::TargetLengthMismatch {
                expected: samples.len(),
                actual: response.len(),
            });
        }
        if let Some(index) = response.iter().position(|h| !h.is_finite()) {
            return Err(FitError::NonFiniteTarget { index });
        }
        Ok(Self { samples, response })
    }

    pub fn response(&self) -> &TargetResponse {
        &self.response
    }

    /// `Σ w_k·|T_k|²`, the fidelity of the all-zero filter up to the scale.
    pub fn weighted_energy(&self) -> f64 {
        self.samples.weights.iter().zip(self.response.iter()).map(|(w, t)| w * t.norm_sqr()).sum()
    }
}

/// Decomposition of the single-fit error.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SingleFitTerms {
    pub fidelity: f64,
    pub pole_barrier: f64,
    pub zero_barrier: f64,
}

impl SingleFitTerms {
    pub fn barrier(&self) -> f64 {
        self.pole_barrier + self.zero_barrier
    }

    pub fn total(&self) -> f64 {
        self.fidelity + self.barrier()
    }
}

/// Single-filter objective over `θ = (b0, b1, b2, a1, a2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingleFitError {
    pub fidelity_scale: f64,
    pub barrier: BarrierPenalty,
}

impl SingleFitError {
    pub fn new(fidelity_scale: f64, barrier: BarrierPenalty) -> Self {
        Self { fidelity_scale, barrier }
    }

    /// `scale · Σ w·|H − T|²`.
    pub fn fidelity(&self, filter: &BiquadFilter, target: &FitTarget) -> f64 {
        let sum: f64 = target
            .samples
            .unit
            .iter()
            .zip(target.samples.weights.iter())
            .zip(target.response.iter())
            .map(|((&z, &w), &t)| w * (filter.response_at_unit(z) - t).norm_sqr())
            .sum();
        self.fidelity_scale * sum
    }

    /// Analytic gradient of [`SingleFitError::fidelity`] w.r.t. the five coefficients.
    pub fn fidelity_grad(&self, filter: &BiquadFilter, target: &FitTarget) -> [f64; N_COEFFS] {
        let mut g = [0.0; N_COEFFS];
        let samples = &target.samples;
        for ((&z, &w), &t) in samples.unit.iter().zip(samples.weights.iter()).zip(&target.response)
        {
            let z2 = z * z;
            let den = z * filter.a1 + z2 * filter.a2 + 1.0;
            let inv_den = den.inv();
            let h = (z * filter.b1 + z2 * filter.b2 + filter.b0) * inv_den;
            // d|e|²/dθ = 2·Re(conj(e)·dH/dθ)
            let e_conj = (h - t).conj() * (2.0 * w);
            let dh_da = -h * inv_den;
            let partials = [inv_den, z * inv_den, z2 * inv_den, z * dh_da, z2 * dh_da];
            for (gj, dh) in g.iter_mut().zip(partials) {
                *gj += (e_conj * dh).re;
            }
        }
        g.map(|gj| self.fidelity_scale * gj)
    }

    /// Gradient of the pole and zero barriers w.r.t. the five coefficients.
    ///
    /// Non-finite when `b0 == 0`, where a zero sits at infinity.
    pub fn barrier_grad(&self, filter: &BiquadFilter) -> [f64; N_COEFFS] {
        let [db0, db1, db2] = self.barrier.pair_grad(filter.b0, filter.b1, filter.b2);
        let [_, da1, da2] = self.barrier.pair_grad(1.0, filter.a1, filter.a2);
        [db0, db1, db2, da1, da2]
    }

    /// Barrier penalties `(poles, zeros)`.
    pub fn barriers(&self, filter: &BiquadFilter) -> (f64, f64) {
        (self.barrier.pair(&filter.poles()), self.barrier.pair(&filter.zeros()))
    }

    pub fn terms(&self, filter: &BiquadFilter, target: &FitTarget) -> SingleFitTerms {
        let (pole_barrier, zero_barrier) = self.barriers(filter);
        SingleFitTerms { fidelity: self.fidelity(filter, target), pole_barrier, zero_barrier }
    }
}

impl Objective for SingleFitError {
    type Data = FitTarget;

    fn value(&self, theta: &Theta, data: &FitTarget) -> OptResult<Cost> {
        let filter = BiquadFilter::from_view(theta.view())?;
        Ok(self.terms(&filter, data).total())
    }

    fn check(&self, theta: &Theta, _data: &FitTarget) -> OptResult<()> {
        validate_theta_input(theta, N_COEFFS)
    }

    fn grad(&self, theta: &Theta, data: &FitTarget) -> OptResult<Grad> {
        let filter = BiquadFilter::from_view(theta.view())?;
        let fidelity = self.fidelity_grad(&filter, data);
        let barrier = self.barrier_grad(&filter);
        Ok(fidelity.iter().zip(barrier).map(|(f, b)| f + b).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        biquad::response::frequency_response,
        circuit::{ToneStack, grid::GridOptions, response::target_response},
    };
    use crate::optimization::cost_minimizer::finite_diff::fd_gradient;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Agreement of the precomputed evaluation with `frequency_response`.
    // - The fidelity term vanishing on an exact match.
    // - The analytic fidelity and full gradients against finite differences.
    // - Target validation.
    // -------------------------------------------------------------------------

    fn grid(n_bins: usize) -> FrequencyGrid {
        FrequencyGrid::new(&GridOptions::default().with_bins(n_bins).expect("valid bins"))
            .expect("valid grid")
    }

    fn circuit_target(tp: f64, grid: &FrequencyGrid) -> FitTarget {
        let samples = Arc::new(GridSamples::new(grid));
        let response = target_response(&ToneStack::default(), grid, tp).expect("valid tp");
        FitTarget::new(samples, response).expect("finite target")
    }

    #[test]
    // Purpose
    // -------
    // A target generated by a biquad is matched exactly by that biquad, so
    // only the barrier terms remain.
    //
    // Given
    // -----
    // - A stable min-phase filter and its own response as the target.
    //
    // Expect
    // ------
    // - `fidelity ≈ 0` and `total == barrier`.
    fn exact_match_leaves_only_barrier() {
        // Arrange
        let grid = grid(64);
        let filter = BiquadFilter::new(0.02, -0.005, -0.012, -1.9, 0.91);
        let response = frequency_response(&filter, &grid.omegas());
        let target =
            FitTarget::new(Arc::new(GridSamples::new(&grid)), response).expect("finite target");
        let objective = SingleFitError::new(10.0, BarrierPenalty::default());

        // Act
        let terms = objective.terms(&filter, &target);

        // Assert
        assert!(terms.fidelity < 1e-20);
        assert_relative_eq!(terms.total(), terms.barrier(), max_relative = 1e-12);
        assert!(terms.pole_barrier > 0.0 && terms.zero_barrier > 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Validate the closed-form fidelity gradient.
    //
    // Given
    // -----
    // - The tone-stack target at `tp = 0.3` on a 64-bin grid.
    // - The default initial guess.
    //
    // Expect
    // ------
    // - Analytic and central-difference gradients agree to 1e-5 relative.
    fn fidelity_gradient_matches_finite_differences() {
        // Arrange
        let grid = grid(64);
        let target = circuit_target(0.3, &grid);
        let objective = SingleFitError::new(10.0, BarrierPenalty::default());
        let theta = array![0.3, 0.1, 0.1, -0.3, 0.1];
        let filter = BiquadFilter::from_view(theta.view()).expect("five coefficients");

        // Act
        let analytic = objective.fidelity_grad(&filter, &target);
        let numeric = fd_gradient(&theta, |x: &Theta| {
            Ok(objective.fidelity(&BiquadFilter::from_view(x.view())?, &target))
        })
        .expect("smooth fidelity");

        // Assert
        for (a, n) in analytic.iter().zip(numeric.iter()) {
            assert_relative_eq!(*a, *n, max_relative = 1e-5, epsilon = 1e-6);
        }
    }

    #[test]
    fn full_gradient_includes_barrier() {
        let grid = grid(32);
        let target = circuit_target(0.5, &grid);
        let objective = SingleFitError::new(10.0, BarrierPenalty::default());
        // Poles at radius √1.05: the barrier dominates the a2 derivative.
        let theta = array![0.02, -0.005, -0.012, -1.9, 1.05];
        let filter = BiquadFilter::from_view(theta.view()).expect("five coefficients");

        let full = objective.grad(&theta, &target).expect("finite gradient");
        let fidelity_only = objective.fidelity_grad(&filter, &target);

        assert!(full[4] - fidelity_only[4] > 1.0);
    }

    #[test]
    // Purpose
    // -------
    // The full gradient (fidelity plus barrier) must match a finite
    // difference of the full cost where the barrier is steep.
    //
    // Given
    // -----
    // - The tone-stack target at `tp = 0.08` on a 64-bin grid.
    // - A filter with both poles at radius ≈ 0.97 and one zero at ≈ 0.95.
    //
    // Expect
    // ------
    // - Agreement to 1e-5 relative on every coefficient.
    fn full_gradient_matches_finite_differences_near_the_unit_circle() {
        // Arrange
        let grid = grid(64);
        let target = circuit_target(0.08, &grid);
        let objective = SingleFitError::new(10.0, BarrierPenalty::default());
        let theta = array![0.0103, -0.0029, -0.0066, -1.93, 0.94];

        // Act
        let analytic = objective.grad(&theta, &target).expect("finite gradient");
        let numeric =
            fd_gradient(&theta, |x: &Theta| objective.value(x, &target)).expect("smooth cost");

        // Assert
        let scale = numeric.iter().fold(1e-12_f64, |m, g| m.max(g.abs()));
        for (a, n) in analytic.iter().zip(numeric.iter()) {
            assert_relative_eq!(*a, *n, max_relative = 1e-5, epsilon = 1e-6 * scale);
        }
    }

    #[test]
    fn evaluation_matches_frequency_response() {
        let grid = grid(16);
        let samples = GridSamples::new(&grid);
        let filter = BiquadFilter::new(0.3, 0.1, 0.1, -0.3, 0.1);

        let direct = frequency_response(&filter, &grid.omegas());

        for (z, h) in samples.unit.iter().zip(direct.iter()) {
            assert!((filter.response_at_unit(*z) - h).norm() < 1e-12);
        }
    }

    #[test]
    fn target_validation_rejects_bad_responses() {
        let grid = grid(8);
        let samples = Arc::new(GridSamples::new(&grid));

        let short = Array1::from(vec![Complex64::new(1.0, 0.0); 4]);
        assert_eq!(
            FitTarget::new(Arc::clone(&samples), short),
            Err(FitError::TargetLengthMismatch { expected: 8, actual: 4 })
        );

        let mut bad = Array1::from(vec![Complex64::new(1.0, 0.0); 8]);
        bad[3] = Complex64::new(f64::NAN, 0.0);
        assert_eq!(FitTarget::new(samples, bad), Err(FitError::NonFiniteTarget { index: 3 }));
    }
}
