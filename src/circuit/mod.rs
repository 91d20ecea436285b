//! circuit — analog reference model of the passive tone stack.
//!
//! Purpose
//! -------
//! Produce the complex target responses the biquads are fitted against:
//! a log-spaced [`FrequencyGrid`] with per-bin weights, the tone-stack
//! component values ([`ToneStack`]), the control axis ([`SweepPoints`]),
//! and the closed-form transfer function ([`target_response`]).
//!
//! Conventions
//! -----------
//! - Frequencies are in Hz, resistances in ohms, capacitances in farads.
//! - Control values `tp` live in `[0, 1]`; anything else is rejected with
//!   [`CircuitError::InvalidControlValue`].
//! - All configuration is validated at construction and immutable after.

pub mod components;
pub mod control;
pub mod errors;
pub mod grid;
pub mod response;

pub use self::components::ToneStack;
pub use self::control::{DEFAULT_SWEEP, SweepPoints, validate_control};
pub use self::errors::{CircuitError, CircuitResult};
pub use self::grid::{FrequencyGrid, GridOptions};
pub use self::response::{TargetResponse, target_response};
