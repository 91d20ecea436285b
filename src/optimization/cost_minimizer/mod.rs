//! cost_minimizer — argmin-powered L-BFGS minimizer for scalar costs.
//!
//! Purpose
//! -------
//! Provide a high-level, Argmin-backed optimization layer for **minimizing**
//! a scalar cost `c(θ)` over an unconstrained parameter vector. Callers
//! implement a single trait, [`Objective`], and invoke [`minimize`] (or
//! [`minimize_with_hook`]) to run L-BFGS with a configurable line search,
//! tolerances, and finite-difference fallbacks.
//!
//! Key behaviors
//! -------------
//! - Bridge user objectives into Argmin via [`adapter::ArgMinAdapter`],
//!   rejecting non-finite costs.
//! - Expose [`minimize`], which:
//!   - validates the initial guess with [`Objective::check`],
//!   - selects an L-BFGS solver via [`builders`] based on [`LineSearcher`],
//!   - executes the solver via [`run::run_lbfgs`], and
//!   - normalizes results into an [`OptimOutcome`].
//! - Record the best iterate of every run ([`observer`]) so that a run the
//!   backend aborts still yields the best point seen.
//! - Restart interrupted runs (failed line search, non-finite trial cost)
//!   from that best iterate with fresh memory and a bounded first step.
//! - Provide finite-difference gradients in [`finite_diff`] when analytic
//!   derivatives are missing.
//!
//! Invariants & assumptions
//! ------------------------
//! - [`Objective::value`] and [`Objective::grad`] report invalid inputs as
//!   recoverable [`OptError`] values, not panics.
//! - Configuration types ([`Tolerances`], [`MinimizeOptions`]) are validated
//!   on construction.
//! - [`OptimOutcome::converged`] is `true` only for genuine solver
//!   convergence; iteration-cap exhaustion is not convergence.
//!
//! Downstream usage
//! ----------------
//! - The fitting layer implements [`Objective`] for the single-filter and
//!   sweep costs and calls [`minimize_with_hook`] for progress reporting.
//!
//! [`OptError`]: crate::optimization::errors::OptError

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod observer;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::{minimize, minimize_with_hook};
pub use self::traits::{
    IterationHook, LineSearcher, MinimizeOptions, Objective, OptimOutcome, Tolerances,
};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use tone_iir_fit::optimization::cost_minimizer::prelude::*;
//
// to import the main optimizer surface in a single line.

pub mod prelude {
    pub use super::api::{minimize, minimize_with_hook};
    pub use super::traits::{IterationHook, MinimizeOptions, Objective, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
