//! Public API surface for cost minimization.
//!
//! - [`Objective`]: trait users implement for their cost function.
//! - [`MinimizeOptions`] and [`Tolerances`]: configuration for the optimizer.
//! - [`LineSearcher`]: choice of line search used by L-BFGS.
//! - [`IterationHook`]: per-iteration callback that replaces global progress
//!   counters.
//! - [`OptimOutcome`]: normalized result returned by the high-level `minimize` API.
use crate::optimization::{
    cost_minimizer::{
        Cost, FnEvalMap, Grad, Theta,
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
    },
    errors::{OptError, OptResult},
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// User-implemented cost interface.
///
/// - `type Data`: per-problem data carried into `value`/`grad`/`check`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate `c(θ)`.
///   - Errors: return a descriptive `OptError` for invalid inputs.
/// - `check(&Theta, &Data) -> OptResult<()>`: validation hook to reject
///   obviously invalid `θ`/`data` pairs. Called once before optimization.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: gradient `∇c(θ)`.
///   If not implemented, finite differences of `value` are used automatically.
pub trait Objective {
    type Data: 'static;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Callback invoked after every solver iteration.
///
/// Receives the iteration counter together with the best parameter vector
/// and cost seen so far. Hooks are owned by the run and must be `Send`
/// because argmin stores observers behind a mutex.
pub trait IterationHook: Send {
    fn on_iteration(&mut self, iteration: u64, best_theta: &Theta, best_cost: Cost);
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"MoreThuente"`, `"HagerZhang"`). Unknown names return
/// `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `tols: Tolerances` — numerical tolerances and iteration limits.
/// - `line_searcher: LineSearcher` — line-search algorithm used by L-BFGS.
/// - `verbose: bool` — if `true`, attaches an observer (behind the `obs_slog`
///   feature) and prints progress.
/// - `lbfgs_mem: Option<usize>` — L-BFGS history size, `None` uses
///   [`DEFAULT_LBFGS_MEM`](crate::optimization::cost_minimizer::DEFAULT_LBFGS_MEM).
///
/// Default:
/// - `tols`: `tol_grad = 1e-5`, `tol_cost = None`, `max_iter = 500`
/// - `line_searcher`: `MoreThuente`
/// - `verbose`: `false`
/// - `lbfgs_mem`: `None`
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizeOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl MinimizeOptions {
    /// Create a new set of optimizer options.
    ///
    /// Numeric tolerances are validated inside [`Tolerances::new`]; this
    /// constructor only checks the L-BFGS memory.
    ///
    /// # Errors
    /// - [`OptError::InvalidLBFGSMem`] if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem
            && m == 0
        {
            return Err(OptError::InvalidLBFGSMem {
                mem: m,
                reason: "L-BFGS memory must be greater than zero.",
            });
        }
        Ok(Self { tols, line_searcher, verbose, lbfgs_mem })
    }

    /// Same options with a different iteration cap.
    ///
    /// # Errors
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn with_max_iter(mut self, max_iter: usize) -> OptResult<Self> {
        self.tols = Tolerances::new(self.tols.tol_grad, self.tols.tol_cost, Some(max_iter))?;
        Ok(self)
    }
}

impl Default for MinimizeOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-5), tol_cost: None, max_iter: Some(500) },
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold.
/// - `tol_cost`: terminate when the change in cost falls below this threshold.
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** of the three must be provided
/// (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_grad`, `tol_cost`, or `max_iter` must be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter
            && max_iter == 0
        {
            return Err(OptError::InvalidMaxIter {
                max_iter,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Canonical result returned by `minimize`.
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: best cost `c(θ̂)`.
/// - `converged`: `true` only if the solver reported `SolverConverged` or
///   `TargetCostReached`; iteration-cap exhaustion and aborted runs are
///   reported as not converged.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`
///   (empty for aborted runs).
/// - `grad_norm`: norm of the last available gradient, if present.
/// - `interrupted`: the run stopped because the line search or the objective
///   failed, not because a stopping rule fired. `theta_hat` is then the best
///   point seen, not a stationary point.
/// - `restarts`: number of runs restarted from the best iterate after an
///   interruption (see [`minimize`](crate::optimization::cost_minimizer::minimize)).
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
    pub interrupted: bool,
    pub restarts: usize,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// Performs:
    /// - `theta_hat` check via `validate_theta_hat` (present and all finite).
    /// - `value` check via `validate_value` (finite).
    /// - Maps `TerminationStatus` into `(converged, status)`.
    /// - Computes `grad_norm` if a gradient was provided.
    ///
    /// # Errors
    /// - Propagates any validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        // Hitting the iteration cap is a termination, not convergence.
        let (converged, interrupted, status) = match termination {
            TerminationStatus::NotTerminated => (false, false, "Not terminated".to_string()),
            TerminationStatus::Terminated(reason) => {
                let converged = matches!(
                    reason,
                    TerminationReason::SolverConverged | TerminationReason::TargetCostReached
                );
                // L-BFGS reports a failed line search as a solver exit.
                let interrupted = matches!(reason, TerminationReason::SolverExit(_));
                (converged, interrupted, format!("{reason:?}"))
            }
        };
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self {
            theta_hat,
            value,
            converged,
            status,
            iterations,
            fn_evals,
            grad_norm,
            interrupted,
            restarts: 0,
        })
    }

    /// Build an outcome from the best iterate recorded before the backend
    /// aborted the run.
    ///
    /// The outcome is never marked converged and is always `interrupted`;
    /// `status` carries the abort cause.
    ///
    /// # Errors
    /// - Propagates validation errors for `theta_hat` or `value`.
    pub fn aborted(
        theta_hat: Theta, value: f64, iterations: u64, cause: &OptError,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(Some(theta_hat))?;
        validate_value(value)?;
        Ok(Self {
            theta_hat,
            value,
            converged: false,
            status: format!("Aborted: {cause}"),
            iterations: iterations as usize,
            fn_evals: FnEvalMap::new(),
            grad_norm: None,
            interrupted: true,
            restarts: 0,
        })
    }

    /// Fold the outcome of a run restarted from `self.theta_hat` into `self`.
    ///
    /// Iterations and evaluation counters add up; the better of the two
    /// iterates is kept; the termination fields come from `next`.
    pub fn absorb_restart(mut self, next: OptimOutcome) -> Self {
        if next.value <= self.value {
            self.theta_hat = next.theta_hat;
            self.value = next.value;
            self.grad_norm = next.grad_norm;
        }
        for (name, count) in next.fn_evals {
            *self.fn_evals.entry(name).or_insert(0) += count;
        }
        self.iterations += next.iterations;
        self.converged = next.converged;
        self.interrupted = next.interrupted;
        self.status = next.status;
        self.restarts += 1;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Validation rules of `Tolerances::new` and `MinimizeOptions::new`.
    // - Line-search parsing.
    // - Mapping of termination status and abort causes into `OptimOutcome`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure that a configuration with no stopping rule at all is rejected.
    //
    // Given
    // -----
    // - `tol_grad = None`, `tol_cost = None`, `max_iter = None`.
    //
    // Expect
    // ------
    // - `Err(OptError::NoTolerancesProvided)`.
    fn tolerances_require_at_least_one_rule() {
        // Act
        let result = Tolerances::new(None, None, None);

        // Assert
        assert_eq!(result, Err(OptError::NoTolerancesProvided));
    }

    #[test]
    fn tolerances_reject_non_positive_values() {
        assert!(matches!(
            Tolerances::new(Some(0.0), None, None),
            Err(OptError::InvalidTolGrad { .. })
        ));
        assert!(matches!(
            Tolerances::new(None, Some(f64::NAN), None),
            Err(OptError::InvalidTolCost { .. })
        ));
        assert!(matches!(
            Tolerances::new(None, None, Some(0)),
            Err(OptError::InvalidMaxIter { max_iter: 0, .. })
        ));
    }

    #[test]
    fn minimize_options_reject_zero_memory() {
        let tols = Tolerances::new(Some(1e-6), None, Some(10)).expect("valid tolerances");
        let result = MinimizeOptions::new(tols, LineSearcher::MoreThuente, false, Some(0));
        assert!(matches!(result, Err(OptError::InvalidLBFGSMem { mem: 0, .. })));
    }

    #[test]
    fn with_max_iter_keeps_other_tolerances() {
        let opts = MinimizeOptions::default().with_max_iter(42).expect("valid cap");
        assert_eq!(opts.tols.max_iter, Some(42));
        assert_eq!(opts.tols.tol_grad, MinimizeOptions::default().tols.tol_grad);
    }

    #[test]
    fn line_searcher_parses_case_insensitively() {
        assert_eq!("hagerzhang".parse::<LineSearcher>(), Ok(LineSearcher::HagerZhang));
        assert_eq!("MORETHUENTE".parse::<LineSearcher>(), Ok(LineSearcher::MoreThuente));
        assert!(matches!(
            "bisection".parse::<LineSearcher>(),
            Err(OptError::InvalidLineSearch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify that a terminated solver state is reported as converged and
    // that the gradient norm is computed.
    //
    // Given
    // -----
    // - `TerminationStatus::Terminated(SolverConverged)`.
    // - A gradient `[3, 4]`.
    //
    // Expect
    // ------
    // - `converged == true` and `grad_norm == Some(5.0)`.
    fn outcome_maps_terminated_status_to_converged() {
        // Arrange
        let status = TerminationStatus::Terminated(TerminationReason::SolverConverged);

        // Act
        let out = OptimOutcome::new(
            Some(array![1.0, 2.0]),
            0.5,
            status,
            12,
            FnEvalMap::new(),
            Some(array![3.0, 4.0]),
        )
        .expect("outcome should validate");

        // Assert
        assert!(out.converged);
        assert_eq!(out.iterations, 12);
        assert_eq!(out.grad_norm, Some(5.0));
    }

    #[test]
    fn outcome_treats_iteration_cap_as_not_converged() {
        let status = TerminationStatus::Terminated(TerminationReason::MaxItersReached);
        let out =
            OptimOutcome::new(Some(array![1.0]), 0.5, status, 500, FnEvalMap::new(), None)
                .expect("outcome should validate");
        assert!(!out.converged);
        assert_eq!(out.status, "MaxItersReached");
    }

    #[test]
    fn aborted_outcome_is_never_converged() {
        let cause = OptError::NonFiniteCost { value: f64::NAN };
        let out = OptimOutcome::aborted(array![0.1, 0.2], 3.0, 7, &cause)
            .expect("finite best iterate should validate");
        assert!(!out.converged);
        assert!(out.interrupted);
        assert!(out.status.starts_with("Aborted"));
        assert_eq!(out.iterations, 7);
    }

    #[test]
    fn line_search_exit_is_reported_as_interrupted() {
        let status = TerminationStatus::Terminated(TerminationReason::SolverExit(
            "Line search terminated with: 'Non-finite cost value: inf'".to_string(),
        ));
        let out = OptimOutcome::new(Some(array![1.0]), 0.5, status, 1, FnEvalMap::new(), None)
            .expect("outcome should validate");
        assert!(out.interrupted);
        assert!(!out.converged);
    }

    #[test]
    // Purpose
    // -------
    // Verify how a restarted run is folded into the outcome it resumed from.
    //
    // Given
    // -----
    // - An interrupted outcome after 3 iterations with cost 2.
    // - A converged restart after 5 iterations with cost 1.
    //
    // Expect
    // ------
    // - Cost 1 and its iterate, 8 iterations, summed counters.
    // - Termination fields of the restart and `restarts == 1`.
    fn absorb_restart_keeps_best_iterate_and_sums_work() {
        // Arrange
        let exit = TerminationReason::SolverExit("line search".to_string());
        let mut evals = FnEvalMap::new();
        evals.insert("cost_count".to_string(), 4);
        let first = OptimOutcome::new(
            Some(array![0.0]),
            2.0,
            TerminationStatus::Terminated(exit),
            3,
            evals.clone(),
            None,
        )
        .expect("valid outcome");
        let done = TerminationStatus::Terminated(TerminationReason::SolverConverged);
        let second = OptimOutcome::new(Some(array![1.0]), 1.0, done, 5, evals, None)
            .expect("valid outcome");

        // Act
        let merged = first.absorb_restart(second);

        // Assert
        assert_eq!(merged.theta_hat, array![1.0]);
        assert_eq!(merged.value, 1.0);
        assert_eq!(merged.iterations, 8);
        assert_eq!(merged.fn_evals.get("cost_count"), Some(&8));
        assert!(merged.converged);
        assert!(!merged.interrupted);
        assert_eq!(merged.restarts, 1);
    }

    #[test]
    fn outcome_rejects_missing_theta_hat() {
        let result = OptimOutcome::new(
            None,
            0.0,
            TerminationStatus::NotTerminated,
            0,
            FnEvalMap::new(),
            None,
        );
        assert_eq!(result, Err(OptError::MissingThetaHat));
    }
}
