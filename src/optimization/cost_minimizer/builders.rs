//! cost_minimizer::builders — L-BFGS solver construction helpers.
//!
//! Purpose
//! -------
//! Provide small, focused builders for the L-BFGS solvers used by the cost
//! minimizer. These helpers hide Argmin's generic wiring and apply
//! crate-level options (tolerances, memory size) so that higher-level code
//! can request a configured solver without touching Argmin-specific types.
//!
//! Key behaviors
//! -------------
//! - Construct L-BFGS solvers with either Hager–Zhang or More–Thuente
//!   line search.
//! - Apply optional gradient and cost-change tolerances from
//!   [`MinimizeOptions`] via [`configure_lbfgs`].
//! - Optionally set the first trial step length of every line search
//!   (used by restarted runs to bound their first step).
//! - Leave the initial parameter vector and maximum iterations to the
//!   runner, keeping these builders side-effect free.
//!
//! Invariants & assumptions
//! ------------------------
//! - The L-BFGS memory (`m`) is either `opts.lbfgs_mem` or
//!   [`DEFAULT_LBFGS_MEM`].
//! - Tolerances rejected by Argmin surface as [`OptError`] through the
//!   crate's `From<Error>` implementation.
//!
//! [`OptError`]: crate::optimization::errors::OptError
use argmin::{core::LineSearch, solver::quasinewton::LBFGS};

use crate::optimization::{
    cost_minimizer::{
        traits::MinimizeOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, Theta,
        },
    },
    errors::OptResult,
};

/// Construct L-BFGS with Hager–Zhang line search.
///
/// `initial_step` replaces the unit first trial step of each line search.
///
/// # Errors
/// Returns an `OptError` when Argmin rejects one of the tolerances or the
/// initial step.
pub fn build_optimizer_hager_zhang(
    opts: &MinimizeOptions, initial_step: Option<f64>,
) -> OptResult<LbfgsHagerZhang> {
    let mut hager_zhang = HagerZhangLS::new();
    if let Some(alpha) = initial_step {
        hager_zhang.initial_step_length(alpha)?;
    }
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsHagerZhang::new(hager_zhang, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Construct L-BFGS with More–Thuente line search.
///
/// `initial_step` replaces the unit first trial step of each line search;
/// the search still extrapolates from there.
///
/// # Errors
/// Returns an `OptError` when Argmin rejects one of the tolerances or a
/// non-positive initial step.
pub fn build_optimizer_more_thuente(
    opts: &MinimizeOptions, initial_step: Option<f64>,
) -> OptResult<LbfgsMoreThuente> {
    let mut more_thuente = MoreThuenteLS::new();
    if let Some(alpha) = initial_step {
        more_thuente.initial_step_length(alpha)?;
    }
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsMoreThuente::new(more_thuente, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Apply the optional tolerances of `opts` to an L-BFGS solver.
///
/// When a tolerance is `None` the corresponding `with_tolerance_*` method is
/// not called and Argmin's default stays in effect.
///
/// # Errors
/// Returns an `OptError` when `with_tolerance_grad` or `with_tolerance_cost`
/// rejects the value.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MinimizeOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}
