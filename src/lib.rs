//! tone_iir_fit — fit a table of biquads to an analog tone-control network.
//!
//! Purpose
//! -------
//! Produce the coefficient table a digital tone control steps or
//! interpolates through: one second-order IIR section per control position,
//! each matching the analog network's response on a log-spaced grid, with
//! adjacent sections kept close in the pole/zero domain so that moving the
//! control does not make the roots jump.
//!
//! Key behaviors
//! -------------
//! - [`circuit`] models the network (components, potentiometer taper,
//!   frequency grid) and evaluates its target response per control value.
//! - [`biquad`] holds the filter representation, its roots, and its
//!   frequency response.
//! - [`fitting`] defines the single-point and sweep objectives, the
//!   continuity metric, and the resulting [`fitting::CoefficientTable`].
//! - [`optimization`] wraps `argmin`'s L-BFGS behind a small `Objective`
//!   trait and always reports the best iterate reached.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every filter uses `a0 = 1`; coefficient order is `(b0, b1, b2, a1, a2)`
//!   throughout.
//! - Stability and minimum phase are encouraged by a soft barrier and
//!   reported per table entry, not enforced.
//!
//! Conventions
//! -----------
//! - Each subtree has its own error enum (`CircuitError`, `OptError`,
//!   `FitError`) with a `*Result` alias; the fitting layer wraps the others.
//! - Diagnostics go through the `log` facade; the `tone-iir-table` binary
//!   installs `env_logger`.
//!
//! Downstream usage
//! ----------------
//! ```no_run
//! use tone_iir_fit::{
//!     circuit::{FrequencyGrid, GridOptions, SweepPoints, ToneStack},
//!     fitting::{SweepOptions, fit_sweep},
//! };
//!
//! let grid = FrequencyGrid::new(&GridOptions::default())?;
//! let fit = fit_sweep(
//!     &grid,
//!     &ToneStack::default(),
//!     &SweepPoints::default(),
//!     &SweepOptions::default(),
//!     None,
//! )?;
//! print!("{}", fit.table.to_text());
//! # Ok::<(), tone_iir_fit::fitting::FitError>(())
//! ```
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; `tests/` runs reduced-size sweeps
//!   end to end.
pub mod biquad;
pub mod circuit;
pub mod fitting;
pub mod optimization;
