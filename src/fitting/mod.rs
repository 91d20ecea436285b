//! fitting — single-point fits, the joint sweep, and the coefficient table.
//!
//! Purpose
//! -------
//! Turn analog target responses into a table of biquads: per-point
//! objectives ([`single`]), the pole/zero continuity metric ([`continuity`]),
//! the joint sweep objective ([`sweep`]) and its progress reports
//! ([`progress`]), and the resulting [`CoefficientTable`] ([`table`]).
//!
//! Downstream usage
//! ----------------
//! - Most callers only need [`fit_sweep`] (or [`fit_single`]) with
//!   [`SweepOptions::default`], then [`CoefficientTable::to_text`] or
//!   [`CoefficientTable::to_json`].
//! - The objectives implement
//!   [`Objective`](crate::optimization::cost_minimizer::Objective) and can be
//!   minimized directly for custom workflows.
//!
//! Testing notes
//! -------------
//! - Each submodule carries its own unit tests; `tests/` exercises the
//!   end-to-end sweep on reduced grids.
pub mod api;
pub mod continuity;
pub mod errors;
pub mod options;
pub mod progress;
pub mod single;
pub mod sweep;
pub mod table;

pub use self::api::{SingleFit, SweepFit, fit_single, fit_sweep};
pub use self::continuity::{continuity_distance, matched, pair_distance};
pub use self::errors::{FitError, FitResult};
pub use self::options::{BarrierPenalty, SeedPolicy, SweepOptions};
pub use self::progress::{ProgressCallback, SweepProgress};
pub use self::single::{FitTarget, GridSamples, SingleFitError, SingleFitTerms};
pub use self::sweep::{SweepData, SweepObjective, SweepTerms};
pub use self::table::{CoefficientTable, FactoredRow, TableEntry};
