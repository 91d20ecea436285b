//! biquad::filter — the 5-coefficient second-order section.
//!
//! Purpose
//! -------
//! Represent one biquad `H(z) = (b0 + b1·z⁻¹ + b2·z⁻²) / (1 + a1·z⁻¹ + a2·z⁻²)`
//! (leading denominator coefficient fixed at 1), convert it to and from
//! flat parameter blocks, and expose its zeros and poles.
//!
//! Conventions
//! -----------
//! - Coefficient order is always `(b0, b1, b2, a1, a2)`, both in parameter
//!   blocks and in serialized tables.
//! - Zeros are the roots of `b0·z² + b1·z + b2`; poles are the roots of
//!   `z² + a1·z + a2`.
//! - Stability and minimum phase are diagnostics only; nothing here
//!   enforces them.
use crate::{
    biquad::roots::{RootPair, quadratic_roots},
    optimization::errors::{OptError, OptResult},
};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Number of free coefficients per biquad.
pub const N_COEFFS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadFilter {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadFilter {
    pub fn new(b0: f64, b1: f64, b2: f64, a1: f64, a2: f64) -> Self {
        Self { b0, b1, b2, a1, a2 }
    }

    /// Coefficients as `[b0, b1, b2, a1, a2]`.
    pub fn to_array(&self) -> [f64; N_COEFFS] {
        [self.b0, self.b1, self.b2, self.a1, self.a2]
    }

    pub fn to_theta(&self) -> Array1<f64> {
        Array1::from(self.to_array().to_vec())
    }

    /// Read one filter from a 5-element view (e.g. a block of a sweep vector).
    ///
    /// # Errors
    /// - [`OptError::ThetaLengthMismatch`] when the view does not hold
    ///   exactly five values.
    pub fn from_view(block: ArrayView1<'_, f64>) -> OptResult<Self> {
        if block.len() != N_COEFFS {
            return Err(OptError::ThetaLengthMismatch { expected: N_COEFFS, actual: block.len() });
        }
        Ok(Self::new(block[0], block[1], block[2], block[3], block[4]))
    }

    /// Rebuild a filter from its factored form `g·(z − z1)(z − z2) / (z − p1)(z − p2)`.
    ///
    /// Imaginary parts of the products are discarded; they vanish whenever
    /// each pair is real or conjugate.
    pub fn from_factored(poles: &RootPair, zeros: &RootPair, gain: f64) -> Self {
        let zero_sum = zeros.first + zeros.second;
        let zero_prod = zeros.first * zeros.second;
        let pole_sum = poles.first + poles.second;
        let pole_prod = poles.first * poles.second;
        Self::new(gain, -gain * zero_sum.re, gain * zero_prod.re, -pole_sum.re, pole_prod.re)
    }

    /// Roots of the numerator polynomial `b0·z² + b1·z + b2`.
    pub fn zeros(&self) -> RootPair {
        quadratic_roots(self.b0, self.b1, self.b2)
    }

    /// Roots of the denominator polynomial `z² + a1·z + a2`.
    pub fn poles(&self) -> RootPair {
        quadratic_roots(1.0, self.a1, self.a2)
    }

    /// Both poles strictly inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.poles().inside_unit_circle()
    }

    /// Both zeros strictly inside the unit circle.
    pub fn is_minimum_phase(&self) -> bool {
        self.zeros().inside_unit_circle()
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|c| c.is_finite())
    }
}

impl From<[f64; N_COEFFS]> for BiquadFilter {
    fn from(c: [f64; N_COEFFS]) -> Self {
        Self::new(c[0], c[1], c[2], c[3], c[4])
    }
}

impl TryFrom<&[f64]> for BiquadFilter {
    type Error = OptError;

    fn try_from(values: &[f64]) -> OptResult<Self> {
        Self::from_view(ArrayView1::from(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn block_length_is_checked() {
        let short: &[f64] = &[0.1, 0.2, 0.3];

        assert_eq!(
            BiquadFilter::try_from(short),
            Err(OptError::ThetaLengthMismatch { expected: 5, actual: 3 })
        );
        let ok = BiquadFilter::try_from(&[0.3, 0.1, 0.1, -0.3, 0.1][..]).expect("five values");
        assert_eq!(ok.to_array(), [0.3, 0.1, 0.1, -0.3, 0.1]);
    }

    #[test]
    // Purpose
    // -------
    // Verify stability and minimum-phase flags on a resonant filter and on
    // its pole-reflected counterpart.
    //
    // Given
    // -----
    // - Poles at radius √0.9 (a2 = 0.9), zeros at 0.5 (double).
    // - The same filter with a2 = 1.21 (poles at radius 1.1).
    //
    // Expect
    // ------
    // - The first is stable and minimum phase; the second is not stable.
    fn stability_follows_pole_radius() {
        // Arrange
        let good = BiquadFilter::new(1.0, -1.0, 0.25, -1.8, 0.9);
        let bad = BiquadFilter { a2: 1.21, ..good };

        // Act / Assert
        assert!(good.is_stable());
        assert!(good.is_minimum_phase());
        assert!(!bad.is_stable());
    }

    #[test]
    fn factored_form_round_trips_coefficients() {
        let filter = BiquadFilter::new(0.02, -0.005, -0.012, -1.96, 0.96);

        let rebuilt = BiquadFilter::from_factored(&filter.poles(), &filter.zeros(), filter.b0);

        for (a, b) in filter.to_array().iter().zip(rebuilt.to_array()) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn zero_leading_numerator_is_not_minimum_phase() {
        let filter = BiquadFilter::new(0.0, 0.1, 0.05, -0.3, 0.1);
        assert!(!filter.is_minimum_phase());
        assert!(filter.is_stable());
    }
}
