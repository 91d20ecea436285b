//! optimization — L-BFGS cost minimizer and unified error surface.
//!
//! Purpose
//! -------
//! Provide the numerical optimization layer used by the fitting code: an
//! Argmin-backed minimizer for scalar costs over unconstrained parameter
//! vectors, plus a single error/result surface for configuration issues,
//! numerical failures, and backend solver errors.
//!
//! Key behaviors
//! -------------
//! - Expose a high-level API for **minimizing costs** `c(θ)`
//!   (`cost_minimizer`), including solver configuration, stopping criteria,
//!   finite-difference gradients, and best-iterate recovery.
//! - Normalize every failure into `errors::OptError` with the common
//!   `OptResult<T>` alias.
//!
//! Conventions
//! -----------
//! - Parameters and gradients use the `ndarray` aliases `Theta` and `Grad`.
//! - Public entrypoints that can fail return `OptResult<T>`; callers never
//!   see raw Argmin errors.
//! - Diagnostics go through the `log` facade; the optional `obs_slog`
//!   feature adds Argmin's terminal observer for verbose runs.

pub mod cost_minimizer;
pub mod errors;

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::cost_minimizer::prelude::*;
    pub use super::errors::{OptError, OptResult};
}
