//! fitting::sweep — joint objective over every filter of a sweep.
//!
//! Purpose
//! -------
//! Fit all `N` table entries at once over a flat parameter vector of length
//! `5·N` (block `i` holds `(b0, b1, b2, a1, a2)` of sweep point `i`):
//!
//! ```text
//! total = Σ_i SingleFitError(block_i, target_i)
//!       + w · Σ_{i=1}^{N−1} continuity_distance(block_i, block_{i−1})
//! ```
//!
//! Key behaviors
//! -------------
//! - The continuity term is a chain over adjacent sweep points only; with
//!   `N = 1` it is never evaluated.
//! - [`SweepObjective::decompose`] reports fidelity, barrier, and continuity
//!   separately for progress reporting.
//! - The gradient exploits the chain structure. For block `i` it adds the
//!   analytic fidelity and barrier gradients to a central finite difference
//!   of the local continuity cost
//!   `w·(d(block_i, block_{i−1}) + d(block_{i+1}, block_i))`, which is the
//!   only other part of the total that depends on block `i`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `theta.len() == 5 · data.len()`; checked before every run.
//! - Targets are index-aligned with the sweep points in [`SweepData`].
use crate::{
    biquad::filter::{BiquadFilter, N_COEFFS},
    circuit::{
        components::ToneStack, control::SweepPoints, grid::FrequencyGrid,
        response::target_response,
    },
    fitting::{
        continuity::continuity_distance,
        errors::FitResult,
        single::{FitTarget, GridSamples, SingleFitError},
    },
    optimization::{
        cost_minimizer::{
            Cost, Grad, Objective, Theta,
            finite_diff::fd_gradient,
            validation::{validate_theta_input, validate_value},
        },
        errors::{OptError, OptResult},
    },
};
use ndarray::{Array1, s};
use std::sync::Arc;

/// Sweep points and their target responses, index-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepData {
    controls: Vec<f64>,
    targets: Vec<FitTarget>,
}

impl SweepData {
    /// Evaluate the target of every sweep point on `grid`.
    ///
    /// # Errors
    /// - Circuit validation errors for the components or any control value.
    /// - Target validation errors from [`FitTarget::new`].
    pub fn build(
        grid: &FrequencyGrid, stack: &ToneStack, sweep: &SweepPoints,
    ) -> FitResult<Self> {
        let samples = Arc::new(GridSamples::new(grid));
        let targets = sweep
            .iter()
            .map(|&tp| {
                let response = target_response(stack, grid, tp)?;
                FitTarget::new(Arc::clone(&samples), response)
            })
            .collect::<FitResult<Vec<_>>>()?;
        Ok(Self { controls: sweep.as_slice().to_vec(), targets })
    }

    pub fn controls(&self) -> &[f64] {
        &self.controls
    }

    pub fn targets(&self) -> &[FitTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Decomposition of the sweep objective.
///
/// `continuity` is the unweighted chain sum; `total` applies the weight.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SweepTerms {
    pub fidelity: f64,
    pub barrier: f64,
    pub continuity: f64,
    pub total: f64,
}

/// Joint objective over the flat `5·N` coefficient vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepObjective {
    pub single: SingleFitError,
    pub continuity_weight: f64,
}

impl SweepObjective {
    pub fn new(single: SingleFitError, continuity_weight: f64) -> Self {
        Self { single, continuity_weight }
    }

    /// Split `theta` into its `N` filters.
    ///
    /// # Errors
    /// - [`OptError::ThetaLengthMismatch`] when `theta.len()` is not a
    ///   multiple of five.
    pub fn blocks(theta: &Theta) -> OptResult<Vec<BiquadFilter>> {
        if theta.len() % N_COEFFS != 0 {
            let expected = (theta.len() / N_COEFFS + 1) * N_COEFFS;
            return Err(OptError::ThetaLengthMismatch { expected, actual: theta.len() });
        }
        theta.exact_chunks(N_COEFFS).into_iter().map(BiquadFilter::from_view).collect()
    }

    /// Flatten filters into a sweep parameter vector.
    pub fn flatten(filters: &[BiquadFilter]) -> Theta {
        filters.iter().flat_map(|f| f.to_array()).collect()
    }

    /// Fidelity, barrier, and continuity contributions at `theta`.
    ///
    /// # Errors
    /// - [`OptError::ThetaLengthMismatch`] when `theta` does not hold one
    ///   block per target.
    pub fn decompose(&self, theta: &Theta, data: &SweepData) -> OptResult<SweepTerms> {
        let filters = self.checked_blocks(theta, data)?;
        let mut terms = SweepTerms::default();
        for (filter, target) in filters.iter().zip(data.targets()) {
            let single = self.single.terms(filter, target);
            terms.fidelity += single.fidelity;
            terms.barrier += single.barrier();
        }
        terms.continuity = filters.windows(2).map(|w| continuity_distance(&w[1], &w[0])).sum();
        terms.total = terms.fidelity + terms.barrier + self.continuity_weight * terms.continuity;
        Ok(terms)
    }

    /// Weighted continuity terms that involve block `i`.
    fn local_chain_cost(&self, i: usize, candidate: &BiquadFilter, filters: &[BiquadFilter]) -> f64 {
        let mut chain = 0.0;
        if i > 0 {
            chain += continuity_distance(candidate, &filters[i - 1]);
        }
        if let Some(next) = filters.get(i + 1) {
            chain += continuity_distance(next, candidate);
        }
        self.continuity_weight * chain
    }

    fn checked_blocks(&self, theta: &Theta, data: &SweepData) -> OptResult<Vec<BiquadFilter>> {
        let expected = N_COEFFS * data.len();
        if theta.len() != expected {
            return Err(OptError::ThetaLengthMismatch { expected, actual: theta.len() });
        }
        Self::blocks(theta)
    }
}

impl Objective for SweepObjective {
    type Data = SweepData;

    fn value(&self, theta: &Theta, data: &SweepData) -> OptResult<Cost> {
        Ok(self.decompose(theta, data)?.total)
    }

    fn check(&self, theta: &Theta, data: &SweepData) -> OptResult<()> {
        validate_theta_input(theta, N_COEFFS * data.len())
    }

    fn grad(&self, theta: &Theta, data: &SweepData) -> OptResult<Grad> {
        let filters = self.checked_blocks(theta, data)?;
        let mut grad = Array1::zeros(theta.len());
        for (i, (filter, target)) in filters.iter().zip(data.targets()).enumerate() {
            let range = s![i * N_COEFFS..(i + 1) * N_COEFFS];
            let mut local = if filters.len() > 1 {
                let block = theta.slice(range).to_owned();
                fd_gradient(&block, |x: &Theta| {
                    let candidate = BiquadFilter::from_view(x.view())?;
                    let value = self.local_chain_cost(i, &candidate, &filters);
                    validate_value(value)?;
                    Ok(value)
                })?
            } else {
                Array1::zeros(N_COEFFS)
            };
            let fidelity = self.single.fidelity_grad(filter, target);
            let barrier = self.single.barrier_grad(filter);
            for ((g, f), b) in local.iter_mut().zip(fidelity).zip(barrier) {
                *g += f + b;
            }
            grad.slice_mut(range).assign(&local);
        }
        Ok(grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{circuit::grid::GridOptions, fitting::options::BarrierPenalty};
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The decomposition adding up to the total and the chain structure.
    // - The single-point degenerate case (no continuity term).
    // - The block-local gradient against a full finite difference.
    // -------------------------------------------------------------------------

    fn data(points: Vec<f64>) -> SweepData {
        let grid = FrequencyGrid::new(&GridOptions::default().with_bins(48).expect("valid bins"))
            .expect("valid grid");
        let sweep = SweepPoints::new(points).expect("valid sweep");
        SweepData::build(&grid, &ToneStack::default(), &sweep).expect("valid targets")
    }

    fn objective() -> SweepObjective {
        SweepObjective::new(SingleFitError::new(10.0, BarrierPenalty::default()), 100.0)
    }

    fn filters() -> Vec<BiquadFilter> {
        vec![
            BiquadFilter::new(0.0103, -0.0029, -0.0066, -1.910, 0.911),
            BiquadFilter::new(0.0149, -0.0046, -0.0097, -1.923, 0.924),
            BiquadFilter::new(0.0735, -0.0232, -0.0479, -1.874, 0.877),
        ]
    }

    #[test]
    // Purpose
    // -------
    // Verify that the total equals the sum of the single-fit errors plus the
    // weighted adjacent-pair continuity distances.
    //
    // Given
    // -----
    // - Three sweep points and three hand-picked filters.
    //
    // Expect
    // ------
    // - `total == Σ single + 100·(d(f1, f0) + d(f2, f1))`.
    fn total_is_singles_plus_weighted_chain() {
        // Arrange
        let data = data(vec![0.0, 0.5, 1.0]);
        let obj = objective();
        let fs = filters();
        let theta = SweepObjective::flatten(&fs);

        // Act
        let terms = obj.decompose(&theta, &data).expect("valid theta");

        // Assert
        let singles: f64 =
            fs.iter().zip(data.targets()).map(|(f, t)| obj.single.terms(f, t).total()).sum();
        let chain = continuity_distance(&fs[1], &fs[0]) + continuity_distance(&fs[2], &fs[1]);
        assert_relative_eq!(terms.total, singles + 100.0 * chain, max_relative = 1e-12);
        assert_relative_eq!(terms.continuity, chain, max_relative = 1e-12);
        assert_eq!(obj.value(&theta, &data).expect("valid theta"), terms.total);
    }

    #[test]
    fn single_point_has_no_continuity_term() {
        let data = data(vec![0.4]);
        let obj = objective();
        let f = filters()[1];

        let terms = obj.decompose(&f.to_theta(), &data).expect("valid theta");

        assert_eq!(terms.continuity, 0.0);
        assert_relative_eq!(
            terms.total,
            obj.single.terms(&f, &data.targets()[0]).total(),
            max_relative = 1e-12
        );
    }

    #[test]
    // Purpose
    // -------
    // The block-local gradient must equal the gradient of the full objective.
    //
    // Given
    // -----
    // - Three sweep points, hand-picked filters.
    //
    // Expect
    // ------
    // - Agreement with a finite difference of `value` over all 15 entries.
    fn local_gradient_matches_full_finite_difference() {
        // Arrange
        let data = data(vec![0.0, 0.5, 1.0]);
        let obj = objective();
        let theta = SweepObjective::flatten(&filters());

        // Act
        let local = obj.grad(&theta, &data).expect("finite gradient");
        let full = fd_gradient(&theta, |x: &Theta| obj.value(x, &data)).expect("finite gradient");

        // Assert
        for (l, f) in local.iter().zip(full.iter()) {
            assert_relative_eq!(*l, *f, max_relative = 1e-4, epsilon = 1e-3);
        }
    }

    #[test]
    fn wrong_length_is_rejected() {
        let data = data(vec![0.0, 1.0]);
        let obj = objective();

        let err = obj.value(&filters()[0].to_theta(), &data).expect_err("5 != 10");

        assert_eq!(err, OptError::ThetaLengthMismatch { expected: 10, actual: 5 });
        assert!(obj.check(&Array1::zeros(7), &data).is_err());
    }
}
