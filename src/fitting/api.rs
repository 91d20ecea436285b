//! fitting::api — entry points for single-point and sweep fits.
//!
//! Purpose
//! -------
//! Tie the circuit model, the objectives, and the minimizer together:
//! [`fit_single`] fits one biquad to one control value, [`fit_sweep`]
//! produces the full [`CoefficientTable`].
//!
//! Key behaviors
//! -------------
//! - [`fit_sweep`] runs in two stages. The seed stage produces one filter per
//!   sweep point ([`SeedPolicy`]); the joint stage minimizes the sweep
//!   objective from the concatenated seeds and reports progress through a
//!   [`ProgressHook`].
//! - With the `parallel` feature the independent seed fits run on the rayon
//!   pool. They share no state, so the results do not depend on the feature.
//! - A single-point sweep seeded by independent fits has no continuity term;
//!   the seed result is returned without a joint run.
//! - The returned parameters are always the best iterate of the joint run.
//!   Non-converged runs and unstable entries are logged at `warn` level and
//!   reported in the result, never turned into errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - Options are validated before any target is evaluated.
//! - The table is index-aligned with the sweep points, in sweep order.
use crate::{
    biquad::filter::BiquadFilter,
    circuit::{
        components::ToneStack, control::SweepPoints, grid::FrequencyGrid,
        response::target_response,
    },
    fitting::{
        errors::{FitError, FitResult},
        options::{SeedPolicy, SweepOptions},
        progress::{ProgressCallback, ProgressHook},
        single::{FitTarget, GridSamples, SingleFitError, SingleFitTerms},
        sweep::{SweepData, SweepObjective, SweepTerms},
        table::CoefficientTable,
    },
    optimization::cost_minimizer::{OptimOutcome, minimize, minimize_with_hook},
};
use log::{debug, info, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::sync::Arc;

/// Result of a single-point fit.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleFit {
    pub filter: BiquadFilter,
    pub terms: SingleFitTerms,
    pub outcome: OptimOutcome,
}

/// Result of a sweep fit.
///
/// - `table`: best iterate of the joint run, one entry per sweep point.
/// - `terms`: error decomposition of `table`.
/// - `outcome`: optimizer outcome of the joint run (of the seed fit for a
///   single-point sweep).
/// - `seeds`: starting table of the joint run.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepFit {
    pub table: CoefficientTable,
    pub terms: SweepTerms,
    pub outcome: OptimOutcome,
    pub seeds: Vec<BiquadFilter>,
}

/// Fit one biquad to the target response at control value `tp`.
///
/// Starts from `opts.initial_guess` and uses `opts.seed_opts`.
///
/// # Errors
/// - Option validation errors.
/// - [`CircuitError`](crate::circuit::CircuitError) for an invalid `tp` or
///   invalid components.
/// - Optimizer errors raised before any iterate was recorded.
pub fn fit_single(
    grid: &FrequencyGrid, stack: &ToneStack, tp: f64, opts: &SweepOptions,
) -> FitResult<SingleFit> {
    opts.validate()?;
    let samples = Arc::new(GridSamples::new(grid));
    let target = FitTarget::new(samples, target_response(stack, grid, tp)?)?;
    let objective = SingleFitError::new(opts.fidelity_scale, opts.barrier);
    fit_target(&objective, &target, opts)
}

/// Fit the whole coefficient table over `sweep`.
///
/// `progress` receives a [`SweepProgress`](crate::fitting::SweepProgress)
/// every `opts.progress_interval` iterations of the joint run; without it
/// the reports are logged at `info` level.
///
/// # Errors
/// - Option validation errors.
/// - Circuit errors for invalid components.
/// - [`FitError::SeedLengthMismatch`] when a seed table does not match the sweep.
/// - Optimizer errors raised before any iterate was recorded.
pub fn fit_sweep(
    grid: &FrequencyGrid, stack: &ToneStack, sweep: &SweepPoints, opts: &SweepOptions,
    progress: Option<ProgressCallback>,
) -> FitResult<SweepFit> {
    opts.validate()?;
    let data = Arc::new(SweepData::build(grid, stack, sweep)?);
    let single = SingleFitError::new(opts.fidelity_scale, opts.barrier);
    let objective = SweepObjective::new(single, opts.continuity_weight);

    let (seeds, outcome) = match &opts.seed {
        SeedPolicy::IndependentFits => {
            let fits = seed_fits(&single, &data, opts)?;
            let seeds = fits.iter().map(|fit| fit.filter).collect::<Vec<_>>();
            match <[SingleFit; 1]>::try_from(fits) {
                Ok([only]) => (seeds, Some(only.outcome)),
                Err(_) => (seeds, None),
            }
        }
        SeedPolicy::Table(filters) => {
            if filters.len() != data.len() {
                return Err(FitError::SeedLengthMismatch {
                    expected: data.len(),
                    actual: filters.len(),
                });
            }
            (filters.clone(), None)
        }
    };

    let outcome = match outcome {
        Some(outcome) => outcome,
        None => {
            let theta0 = SweepObjective::flatten(&seeds);
            let hook =
                ProgressHook::new(objective, Arc::clone(&data), opts.progress_interval, progress);
            minimize_with_hook(&objective, theta0, &*data, &opts.sweep_opts, Some(Box::new(hook)))?
        }
    };

    let table = CoefficientTable::from_theta(data.controls(), &outcome.theta_hat)?;
    let terms = objective.decompose(&outcome.theta_hat, &data)?;
    report(&table, &terms, &outcome);
    Ok(SweepFit { table, terms, outcome, seeds })
}

fn fit_target(
    objective: &SingleFitError, target: &FitTarget, opts: &SweepOptions,
) -> FitResult<SingleFit> {
    let outcome = minimize(objective, opts.initial_guess.to_theta(), target, &opts.seed_opts)?;
    let filter = BiquadFilter::from_view(outcome.theta_hat.view())?;
    let terms = objective.terms(&filter, target);
    Ok(SingleFit { filter, terms, outcome })
}

fn seed_fits(
    objective: &SingleFitError, data: &SweepData, opts: &SweepOptions,
) -> FitResult<Vec<SingleFit>> {
    let fit_point = |(i, (tp, target)): (usize, (&f64, &FitTarget))| -> FitResult<SingleFit> {
        let fit = fit_target(objective, target, opts)?;
        debug!(
            "seed {i} (control {tp}): cost {:.6e}, converged {}, {} iterations, {} restarts",
            fit.outcome.value, fit.outcome.converged, fit.outcome.iterations, fit.outcome.restarts
        );
        Ok(fit)
    };
    #[cfg(feature = "parallel")]
    let fits = data
        .controls()
        .par_iter()
        .zip(data.targets().par_iter())
        .enumerate()
        .map(fit_point)
        .collect::<FitResult<Vec<_>>>();
    #[cfg(not(feature = "parallel"))]
    let fits = data
        .controls()
        .iter()
        .zip(data.targets())
        .enumerate()
        .map(fit_point)
        .collect::<FitResult<Vec<_>>>();
    fits
}

fn report(table: &CoefficientTable, terms: &SweepTerms, outcome: &OptimOutcome) {
    if !outcome.converged {
        warn!(
            "sweep did not converge ({}) after {} iterations and {} restarts; returning best iterate",
            outcome.status, outcome.iterations, outcome.restarts
        );
    }
    for i in table.unstable_indices() {
        let entry = &table.entries()[i];
        warn!(
            "entry {i} (control {}) has a pole on or outside the unit circle (max |p| = {:.6})",
            entry.control,
            entry.filter.poles().max_modulus()
        );
    }
    info!(
        "sweep finished: {} entries, total {:.6e} (fidelity {:.6e}, barrier {:.6e}, continuity {:.6e})",
        table.len(),
        terms.total,
        terms.fidelity,
        terms.barrier,
        terms.continuity
    );
}
