//! Errors for the analog reference model (grid, components, control axis).
//!
//! Every variant describes an invalid configuration detected at
//! construction time; none of them is retried.
use thiserror::Error;

/// Result alias for circuit-side construction and evaluation.
pub type CircuitResult<T> = Result<T, CircuitError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CircuitError {
    // ---- Control axis ----
    #[error("Control value must be finite and within [0, 1]; got: {value}")]
    InvalidControlValue { value: f64 },

    #[error("Sweep must contain at least one control value.")]
    EmptySweep,

    #[error("Sweep point at index {index} must be finite and within [0, 1]; got: {value}")]
    InvalidSweepPoint { index: usize, value: f64 },

    // ---- Frequency grid ----
    #[error("Sample rate must be finite and > 0; got: {value}")]
    InvalidSampleRate { value: f64 },

    #[error("Invalid frequency bounds [{f_min}, {f_max}] Hz: {reason}")]
    InvalidFrequencyBounds { f_min: f64, f_max: f64, reason: &'static str },

    #[error("Frequency grid needs at least 2 bins; got: {n_bins}")]
    InvalidBinCount { n_bins: usize },

    #[error("Invalid weighting ({value}): {reason}")]
    InvalidWeighting { value: f64, reason: &'static str },

    // ---- Components ----
    #[error("Component '{name}' must be finite and > 0; got: {value}")]
    InvalidComponent { name: &'static str, value: f64 },

    #[error("Pot taper must satisfy slope + offset <= 1; got slope {slope}, offset {offset}")]
    InvalidTaper { slope: f64, offset: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_value() {
        let err = CircuitError::InvalidControlValue { value: 1.5 };
        assert_eq!(err.to_string(), "Control value must be finite and within [0, 1]; got: 1.5");

        let err = CircuitError::InvalidComponent { name: "pot", value: -1.0 };
        assert!(err.to_string().contains("'pot'"));
    }
}
