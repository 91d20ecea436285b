//! fitting::options — configuration for single-point and sweep fits.
//!
//! Purpose
//! -------
//! Collect the tuning constants of the fitting objective and the optimizer
//! settings of both fitting stages in one validated place.
//!
//! Key behaviors
//! -------------
//! - [`BarrierPenalty`] holds the soft stability/min-phase barrier
//!   `(scale·(|r| + offset))^exponent` applied to every pole and zero.
//! - [`SeedPolicy`] chooses how the joint sweep is initialized.
//! - [`SweepOptions`] bundles the fidelity scale, continuity weight, initial
//!   guess, optimizer options of the seed and joint stages, and the progress
//!   interval. `SweepOptions::default()` reproduces the reference tuning.
//!
//! Invariants & assumptions
//! ------------------------
//! - Builders (`with_*`) validate the field they change; [`SweepOptions::validate`]
//!   re-checks everything because fields are public.
//! - Optimizer options are validated by their own constructors.
use crate::{
    biquad::{
        filter::BiquadFilter,
        roots::{RootPair, quadratic_roots},
    },
    fitting::errors::{FitError, FitResult},
    optimization::cost_minimizer::{LineSearcher, MinimizeOptions, Tolerances},
};
use num_complex::Complex64;

pub const DEFAULT_FIDELITY_SCALE: f64 = 10.0;
pub const DEFAULT_CONTINUITY_WEIGHT: f64 = 100.0;
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;
pub const DEFAULT_INITIAL_GUESS: [f64; 5] = [0.3, 0.1, 0.1, -0.3, 0.1];

/// Relative gap below which two real roots are treated as a double root by
/// [`BarrierPenalty::pair_grad`].
const MERGED_ROOT_GAP: f64 = 1e-6;

/// Soft barrier `(scale·(|r| + offset))^exponent` on root moduli.
///
/// With the defaults the term is negligible for `|r| ≲ 0.95` and explodes
/// past the unit circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarrierPenalty {
    pub scale: f64,
    pub offset: f64,
    pub exponent: i32,
}

impl BarrierPenalty {
    /// # Errors
    /// - [`FitError::InvalidPenalty`] for a non-finite or non-positive scale,
    ///   a negative or non-finite offset, or a non-positive exponent.
    pub fn new(scale: f64, offset: f64, exponent: i32) -> FitResult<Self> {
        let penalty = Self { scale, offset, exponent };
        penalty.validate()?;
        Ok(penalty)
    }

    /// Penalty contributed by one root.
    pub fn term(&self, root: Complex64) -> f64 {
        (self.scale * (root.norm() + self.offset)).powi(self.exponent)
    }

    /// Penalty contributed by both roots of a pair.
    pub fn pair(&self, roots: &RootPair) -> f64 {
        self.term(roots.first) + self.term(roots.second)
    }

    /// Gradient of `pair(quadratic_roots(a, b, c))` w.r.t. `(a, b, c)`.
    ///
    /// Complex pairs depend only on `|r|² = c/a`. Real roots use
    /// `∂r/∂(a, b, c) = −(r², r, 1)/P'(r)`; the two contributions form a
    /// divided difference over `r₁ − r₂`, replaced by its derivative when
    /// the roots (nearly) coincide. Non-finite when `a == 0`.
    pub fn pair_grad(&self, a: f64, b: f64, c: f64) -> [f64; 3] {
        if a == 0.0 {
            return [f64::NAN; 3];
        }
        if b * b - 4.0 * a * c < 0.0 {
            let rho = (c / a).sqrt();
            let slope = self.slope(rho);
            return [-slope * rho / a, 0.0, slope / (a * rho)];
        }
        let roots = quadratic_roots(a, b, c);
        let (r1, r2) = (roots.first.re, roots.second.re);
        let gap = r1 - r2;
        let merged = gap.abs() <= MERGED_ROOT_GAP * (1.0 + r1.abs().max(r2.abs()));
        let mid = 0.5 * (r1 + r2);
        // Coefficient k multiplies z^(2−k).
        [2, 1, 0].map(|m: i32| {
            if merged {
                let mut dh = self.curvature(mid.abs()) * mid.powi(m);
                if m > 0 {
                    dh += self.signed_slope(mid) * f64::from(m) * mid.powi(m - 1);
                }
                -dh / a
            } else {
                let h = |r: f64| self.signed_slope(r) * r.powi(m);
                -(h(r1) - h(r2)) / (a * gap)
            }
        })
    }

    /// `d term / d|r|`.
    fn slope(&self, modulus: f64) -> f64 {
        let n = f64::from(self.exponent);
        n * self.scale * (self.scale * (modulus + self.offset)).powi(self.exponent - 1)
    }

    /// `d² term / d|r|²`.
    fn curvature(&self, modulus: f64) -> f64 {
        let n = f64::from(self.exponent);
        n * (n - 1.0)
            * self.scale.powi(2)
            * (self.scale * (modulus + self.offset)).powi(self.exponent - 2)
    }

    /// Derivative of the term of a real root `r` w.r.t. `r`.
    fn signed_slope(&self, r: f64) -> f64 {
        r.signum() * self.slope(r.abs())
    }

    pub fn validate(&self) -> FitResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(FitError::InvalidPenalty {
                name: "scale",
                value: self.scale,
                reason: "Scale must be finite and > 0.",
            });
        }
        if !self.offset.is_finite() || self.offset < 0.0 {
            return Err(FitError::InvalidPenalty {
                name: "offset",
                value: self.offset,
                reason: "Offset must be finite and >= 0.",
            });
        }
        if self.exponent <= 0 {
            return Err(FitError::InvalidPenalty {
                name: "exponent",
                value: f64::from(self.exponent),
                reason: "Exponent must be > 0.",
            });
        }
        Ok(())
    }
}

impl Default for BarrierPenalty {
    fn default() -> Self {
        Self { scale: 1.01, offset: 0.01, exponent: 64 }
    }
}

/// How the joint sweep is initialized.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SeedPolicy {
    /// One independent single-point fit per sweep point.
    #[default]
    IndependentFits,
    /// Warm start from an existing table, one filter per sweep point.
    Table(Vec<BiquadFilter>),
}

/// Options for [`fit_single`](crate::fitting::fit_single) and
/// [`fit_sweep`](crate::fitting::fit_sweep).
///
/// - `fidelity_scale`: factor on the weighted squared response error.
/// - `barrier`: pole/zero barrier penalty.
/// - `continuity_weight`: factor on adjacent continuity distances.
/// - `initial_guess`: start of every single-point fit.
/// - `seed_opts` / `sweep_opts`: optimizer settings of both stages.
/// - `progress_interval`: iterations between progress reports of the
///   joint run.
/// - `seed`: initialization policy of the joint run.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepOptions {
    pub fidelity_scale: f64,
    pub barrier: BarrierPenalty,
    pub continuity_weight: f64,
    pub initial_guess: BiquadFilter,
    pub seed_opts: MinimizeOptions,
    pub sweep_opts: MinimizeOptions,
    pub progress_interval: u64,
    pub seed: SeedPolicy,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            fidelity_scale: DEFAULT_FIDELITY_SCALE,
            barrier: BarrierPenalty::default(),
            continuity_weight: DEFAULT_CONTINUITY_WEIGHT,
            initial_guess: BiquadFilter::from(DEFAULT_INITIAL_GUESS),
            seed_opts: MinimizeOptions {
                tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(2000) },
                line_searcher: LineSearcher::MoreThuente,
                verbose: false,
                lbfgs_mem: None,
            },
            sweep_opts: MinimizeOptions {
                tols: Tolerances { tol_grad: Some(1e-5), tol_cost: None, max_iter: Some(2000) },
                line_searcher: LineSearcher::MoreThuente,
                verbose: false,
                lbfgs_mem: Some(20),
            },
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            seed: SeedPolicy::IndependentFits,
        }
    }
}

impl SweepOptions {
    /// # Errors
    /// - [`FitError::InvalidContinuityWeight`] for a negative or non-finite weight.
    pub fn with_continuity_weight(mut self, weight: f64) -> FitResult<Self> {
        self.continuity_weight = weight;
        self.validate()?;
        Ok(self)
    }

    /// # Errors
    /// - [`FitError::InvalidFidelityScale`] for a non-positive or non-finite scale.
    pub fn with_fidelity_scale(mut self, scale: f64) -> FitResult<Self> {
        self.fidelity_scale = scale;
        self.validate()?;
        Ok(self)
    }

    /// # Errors
    /// - [`FitError::InvalidProgressInterval`] when `interval == 0`.
    pub fn with_progress_interval(mut self, interval: u64) -> FitResult<Self> {
        self.progress_interval = interval;
        self.validate()?;
        Ok(self)
    }

    /// # Errors
    /// - [`FitError::InvalidInitialGuess`] for a non-finite coefficient.
    pub fn with_initial_guess(mut self, guess: BiquadFilter) -> FitResult<Self> {
        self.initial_guess = guess;
        self.validate()?;
        Ok(self)
    }

    pub fn with_barrier(mut self, barrier: BarrierPenalty) -> Self {
        self.barrier = barrier;
        self
    }

    pub fn with_seed(mut self, seed: SeedPolicy) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_seed_opts(mut self, opts: MinimizeOptions) -> Self {
        self.seed_opts = opts;
        self
    }

    pub fn with_sweep_opts(mut self, opts: MinimizeOptions) -> Self {
        self.sweep_opts = opts;
        self
    }

    /// Check every numeric field.
    ///
    /// # Errors
    /// The first failing check among those listed on the `with_*` builders
    /// and [`BarrierPenalty::validate`].
    pub fn validate(&self) -> FitResult<()> {
        let w = self.continuity_weight;
        if !w.is_finite() || w < 0.0 {
            return Err(FitError::InvalidContinuityWeight { value: w });
        }
        let s = self.fidelity_scale;
        if !s.is_finite() || s <= 0.0 {
            return Err(FitError::InvalidFidelityScale { value: s });
        }
        if self.progress_interval == 0 {
            return Err(FitError::InvalidProgressInterval);
        }
        if let Some((index, &value)) =
            self.initial_guess.to_array().iter().enumerate().find(|(_, v)| !v.is_finite())
        {
            return Err(FitError::InvalidInitialGuess { index, value });
        }
        self.barrier.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::cost_minimizer::{Grad, Theta, finite_diff::fd_gradient};
    use approx::assert_relative_eq;
    use ndarray::Array1;

    #[test]
    // Purpose
    // -------
    // Pin the shape of the barrier: negligible well inside the unit circle,
    // order one near it, dominant outside.
    //
    // Given
    // -----
    // - Default barrier `(1.01·(|r| + 0.01))^64`.
    //
    // Expect
    // ------
    // - `|r| = 0.5` → < 1e-18; `|r| = 0.98` → ≈ 0.9936; `|r| = 1.1` → > 1e3.
    fn barrier_is_flat_inside_and_steep_outside() {
        // Arrange
        let barrier = BarrierPenalty::default();

        // Act
        let inner = barrier.term(Complex64::new(0.5, 0.0));
        let edge = barrier.term(Complex64::new(0.0, 0.98));
        let outer = barrier.term(Complex64::new(-1.1, 0.0));

        // Assert
        assert!(inner < 1e-18);
        assert_relative_eq!(edge, (1.01_f64 * 0.99).powi(64), max_relative = 1e-12);
        assert!(outer > 1e3);
    }

    fn numeric_pair_grad(barrier: &BarrierPenalty, coeffs: [f64; 3]) -> Grad {
        fd_gradient(&Array1::from(coeffs.to_vec()), |x: &Theta| {
            Ok(barrier.pair(&quadratic_roots(x[0], x[1], x[2])))
        })
        .expect("smooth barrier")
    }

    #[test]
    // Purpose
    // -------
    // Validate the closed-form barrier gradient away from double roots.
    //
    // Given
    // -----
    // - A resonant complex pole pair, two real poles near the unit circle,
    //   and real zeros of mixed sign with a small leading coefficient.
    //
    // Expect
    // ------
    // - Agreement with central differences to 1e-5 relative.
    fn pair_gradient_matches_finite_differences() {
        // Arrange
        let barrier = BarrierPenalty::default();
        let cases = [[1.0, -1.8, 0.9], [1.0, -1.75, 0.76], [0.02, -0.005, -0.012]];

        for coeffs in cases {
            // Act
            let analytic = barrier.pair_grad(coeffs[0], coeffs[1], coeffs[2]);
            let numeric = numeric_pair_grad(&barrier, coeffs);

            // Assert
            let scale = numeric.iter().fold(1e-12_f64, |m, g| m.max(g.abs()));
            for (a, n) in analytic.iter().zip(numeric.iter()) {
                assert_relative_eq!(*a, *n, max_relative = 1e-5, epsilon = 1e-6 * scale);
            }
        }
    }

    #[test]
    fn pair_gradient_is_continuous_across_merged_root_switch() {
        let barrier = BarrierPenalty::default();
        // Double root at 0.95 for c = 0.9025; both offsets keep two real roots.
        let merged = barrier.pair_grad(1.0, -1.9, 0.9025 - 1e-13);
        let split = barrier.pair_grad(1.0, -1.9, 0.9025 - 1e-11);

        for (m, s) in merged.iter().zip(split.iter()) {
            assert!(m.is_finite());
            assert_relative_eq!(*m, *s, max_relative = 1e-3);
        }
    }

    #[test]
    fn pair_gradient_is_non_finite_when_degree_drops() {
        let grad = BarrierPenalty::default().pair_grad(0.0, 0.1, 0.1);
        assert!(grad.iter().all(|g| g.is_nan()));
    }

    #[test]
    fn defaults_reproduce_reference_tuning() {
        let opts = SweepOptions::default();

        assert_eq!(opts.fidelity_scale, 10.0);
        assert_eq!(opts.continuity_weight, 100.0);
        assert_eq!(opts.initial_guess.to_array(), [0.3, 0.1, 0.1, -0.3, 0.1]);
        assert_eq!(opts.progress_interval, 100);
        assert_eq!(opts.seed, SeedPolicy::IndependentFits);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn builders_reject_invalid_values() {
        let opts = SweepOptions::default();

        assert_eq!(
            opts.clone().with_continuity_weight(-1.0),
            Err(FitError::InvalidContinuityWeight { value: -1.0 })
        );
        assert_eq!(opts.clone().with_progress_interval(0), Err(FitError::InvalidProgressInterval));
        assert!(matches!(
            opts.clone().with_fidelity_scale(0.0),
            Err(FitError::InvalidFidelityScale { .. })
        ));
        let bad_guess = BiquadFilter::new(0.3, f64::NAN, 0.1, -0.3, 0.1);
        assert!(matches!(
            opts.with_initial_guess(bad_guess),
            Err(FitError::InvalidInitialGuess { index: 1, .. })
        ));
        assert!(BarrierPenalty::new(1.01, 0.01, 0).is_err());
    }
}
