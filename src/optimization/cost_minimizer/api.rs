//! High-level entry points for minimizing a user-provided `Objective`.
//!
//! These select an L-BFGS solver with either Hager–Zhang or More–Thuente line
//! search, wrap the objective in an `ArgMinAdapter`, and delegate the run to
//! `run_lbfgs`.
//!
//! A run that the line search or the objective interrupts (for example a
//! trial step into a region where the cost is not finite) is restarted from
//! its best iterate with fresh L-BFGS memory. Every line search of the
//! restarted run starts from a trial step that moves `θ` by at most
//! [`RESTART_STEP`] along the first direction `−∇c` and extrapolates from
//! there; that bound shrinks tenfold after every restart that fails to lower
//! the cost. Restarts stop once the
//! iteration budget is spent, a run ends on a regular stopping rule,
//! [`MAX_STALLED_RESTARTS`] restarts in a row made no progress, or
//! [`MAX_RESTARTS`] is reached.
use crate::optimization::{
    cost_minimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        observer::{OffsetHook, SharedHook},
        run::run_lbfgs,
        traits::{IterationHook, LineSearcher, MinimizeOptions, Objective, Tolerances},
        validation::validate_theta_input,
    },
    errors::OptResult,
};
use argmin_math::ArgminL2Norm;
use log::{debug, warn};
use std::sync::{Arc, Mutex};

/// Upper bound on restarts within one minimization.
pub const MAX_RESTARTS: usize = 50;

/// Largest parameter-space length of the first trial step after a restart.
pub const RESTART_STEP: f64 = 1e-2;

/// Consecutive restarts without a lower cost before giving up.
pub const MAX_STALLED_RESTARTS: usize = 3;

/// Minimize a user-defined cost with L-BFGS.
///
/// Runs `Objective::check` and the finiteness checks on `theta0` before any
/// solver is built. The returned outcome always carries the best iterate
/// observed, including when the backend aborted mid-run; interrupted runs
/// are restarted as described in the module docs.
///
/// # Errors
/// - Validation errors from `check` or from `theta0`.
/// - Solver construction errors.
/// - Backend errors raised before any iterate was recorded.
pub fn minimize<F: Objective>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MinimizeOptions,
) -> OptResult<OptimOutcome> {
    minimize_with_hook(f, theta0, data, opts, None)
}

/// [`minimize`] with an [`IterationHook`] invoked after every iteration.
///
/// Iteration numbers passed to the hook keep counting across restarts.
///
/// # Errors
/// Same as [`minimize`].
pub fn minimize_with_hook<F: Objective>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MinimizeOptions,
    hook: Option<Box<dyn IterationHook>>,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    validate_theta_input(&theta0, theta0.len())?;
    let hook: Option<SharedHook> = hook.map(|h| Arc::new(Mutex::new(h)));
    let mut outcome = run_once(f, theta0, data, opts, hook.as_ref(), 0, None)?;

    let mut step = RESTART_STEP;
    let mut stalled = 0;
    while outcome.interrupted && outcome.restarts < MAX_RESTARTS && stalled < MAX_STALLED_RESTARTS
    {
        let max_iter = match opts.tols.max_iter {
            Some(cap) if outcome.iterations >= cap => break,
            Some(cap) => Some(cap - outcome.iterations),
            None => None,
        };
        let problem = ArgMinAdapter::new(f, data);
        let grad_norm = match problem.checked_gradient(&outcome.theta_hat) {
            Ok(g) => g.l2_norm(),
            Err(err) => {
                debug!("no restart: gradient unavailable at the best iterate ({err})");
                break;
            }
        };
        let initial_step = if grad_norm > step { Some(step / grad_norm) } else { None };
        let restart_opts =
            MinimizeOptions { tols: Tolerances { max_iter, ..opts.tols }, ..opts.clone() };
        let offset = outcome.iterations as u64;
        debug!(
            "restarting after {} iterations ({}); cost {:.6e}, first step at most {step:.1e}",
            outcome.iterations, outcome.status, outcome.value
        );
        let next = match run_once(
            f,
            outcome.theta_hat.clone(),
            data,
            &restart_opts,
            hook.as_ref(),
            offset,
            initial_step,
        ) {
            Ok(next) => next,
            Err(err) => {
                warn!("restart failed ({err}); keeping best iterate");
                break;
            }
        };
        if next.value < outcome.value {
            stalled = 0;
            step = RESTART_STEP;
        } else {
            stalled += 1;
            step *= 0.1;
        }
        outcome = outcome.absorb_restart(next);
    }
    Ok(outcome)
}

fn run_once<F: Objective>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MinimizeOptions, hook: Option<&SharedHook>,
    offset: u64, initial_step: Option<f64>,
) -> OptResult<OptimOutcome> {
    let problem = ArgMinAdapter::new(f, data);
    let hook = hook.map(|shared| {
        Box::new(OffsetHook::new(Arc::clone(shared), offset)) as Box<dyn IterationHook>
    });
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts, initial_step)?;
            run_lbfgs(theta0, opts, problem, solver, hook)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts, initial_step)?;
            run_lbfgs(theta0, opts, problem, solver, hook)
        }
    }
}
