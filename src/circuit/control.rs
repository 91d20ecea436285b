//! circuit::control — control values and the sweep axis.
use crate::circuit::errors::{CircuitError, CircuitResult};
use serde::{Deserialize, Serialize};

/// Sweep used for the deployed table: denser near both ends of travel.
pub const DEFAULT_SWEEP: [f64; 21] = [
    0.00, 0.02, 0.04, 0.06, 0.08, 0.1, 0.14, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.86, 0.9, 0.92,
    0.94, 0.96, 0.98, 1.0,
];

/// Validate a single control value `tp ∈ [0, 1]`.
///
/// # Errors
/// - [`CircuitError::InvalidControlValue`] for non-finite or out-of-range values.
pub fn validate_control(tp: f64) -> CircuitResult<f64> {
    if !tp.is_finite() || !(0.0..=1.0).contains(&tp) {
        return Err(CircuitError::InvalidControlValue { value: tp });
    }
    Ok(tp)
}

/// Ordered, non-empty sequence of control values (the table index axis).
///
/// Order is taken as given; the continuity chain follows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct SweepPoints(Vec<f64>);

impl SweepPoints {
    /// # Errors
    /// - [`CircuitError::EmptySweep`] for an empty sequence.
    /// - [`CircuitError::InvalidSweepPoint`] for the first value outside `[0, 1]`.
    pub fn new(points: Vec<f64>) -> CircuitResult<Self> {
        if points.is_empty() {
            return Err(CircuitError::EmptySweep);
        }
        for (index, &value) in points.iter().enumerate() {
            if validate_control(value).is_err() {
                return Err(CircuitError::InvalidSweepPoint { index, value });
            }
        }
        Ok(Self(points))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.0.iter()
    }

    pub fn is_strictly_increasing(&self) -> bool {
        self.0.windows(2).all(|w| w[1] > w[0])
    }
}

impl Default for SweepPoints {
    fn default() -> Self {
        Self(DEFAULT_SWEEP.to_vec())
    }
}

impl TryFrom<Vec<f64>> for SweepPoints {
    type Error = CircuitError;

    fn try_from(points: Vec<f64>) -> CircuitResult<Self> {
        Self::new(points)
    }
}

impl From<SweepPoints> for Vec<f64> {
    fn from(points: SweepPoints) -> Self {
        points.0
    }
}
