//! Execution helper that runs an `argmin` solver on a cost problem and
//! returns a crate-friendly [`OptimOutcome`].
use crate::optimization::{
    cost_minimizer::{
        Grad, MinimizeOptions, Objective, OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        observer::{BestSlot, RunObserver, take_best},
        traits::IterationHook,
    },
    errors::{OptError, OptResult},
};
use argmin::core::{Executor, State, observers::ObserverMode};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;
use log::warn;
use std::sync::{Arc, Mutex};

/// Run an `argmin` optimization for a cost problem.
///
/// This is the shared runner used by both line-search variants. It wires up:
/// - the user objective via [`ArgMinAdapter`],
/// - the chosen `Solver` (L-BFGS with Hager–Zhang/More–Thuente),
/// - initial parameter `theta0`,
/// - the best-iterate observer (always) and the optional `hook`,
/// - optional slog observers (behind the `obs_slog` feature),
/// - optional `max_iters`,
///
/// then executes the solver and converts the result into [`OptimOutcome`].
///
/// # Abort handling
/// If the backend returns an error after at least the initial state was
/// observed, the best recorded iterate is returned as a non-converged
/// outcome whose `status` names the cause. Errors raised before any state
/// was recorded are propagated.
///
/// # Errors
/// - Backend errors with no recorded iterate, mapped into `OptError`.
/// - Validation errors encountered when constructing [`OptimOutcome`].
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &MinimizeOptions, problem: ArgMinAdapter<'a, F>, solver: S,
    hook: Option<Box<dyn IterationHook>>,
) -> OptResult<OptimOutcome>
where
    F: Objective,
    S: argmin::core::Solver<
            ArgMinAdapter<'a, F>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let best: BestSlot = Arc::new(Mutex::new(None));
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    optimizer =
        optimizer.add_observer(RunObserver::new(Arc::clone(&best), hook), ObserverMode::Always);
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    match optimizer.run() {
        Ok(res) => {
            let mut result = res.state().clone();
            let iterations = result.get_iter();
            let function_counts = result.get_func_counts().clone();
            let termination = result.get_termination_status().clone();
            let grad = result.take_gradient();
            OptimOutcome::new(
                result.take_best_param(),
                result.get_best_cost(),
                termination,
                iterations,
                function_counts,
                grad,
            )
        }
        Err(err) => {
            let cause = OptError::from(err);
            match take_best(&best) {
                Some(b) => {
                    warn!(
                        "optimizer aborted after {} iterations ({cause}); keeping best iterate with cost {:.6e}",
                        b.iteration, b.cost
                    );
                    OptimOutcome::aborted(b.theta, b.cost, b.iteration, &cause)
                }
                None => Err(cause),
            }
        }
    }
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state<F>(theta0: &Theta, problem: &ArgMinAdapter<'_, F>) -> OptResult<()>
where
    F: Objective,
{
    let c0 = problem.checked_cost(theta0)?;
    let g0n = problem.checked_gradient(theta0).ok().map(|g| g.l2_norm());

    eprintln!(
        "init: cost(theta0) = {:.6}{}",
        c0,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
    Ok(())
}
