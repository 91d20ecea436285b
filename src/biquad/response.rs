//! biquad::response — frequency response on the unit circle.
use crate::biquad::filter::BiquadFilter;
use ndarray::Array1;
use num_complex::Complex64;

impl BiquadFilter {
    /// `H(e^{jω})` at a single normalized frequency (radians/sample).
    ///
    /// A zero denominator yields a non-finite value; it is not special-cased.
    pub fn response_at(&self, omega: f64) -> Complex64 {
        self.response_at_unit(Complex64::from_polar(1.0, -omega))
    }

    /// `H` evaluated from a precomputed `z⁻¹ = e^{−jω}`.
    pub fn response_at_unit(&self, z_inv: Complex64) -> Complex64 {
        let z2 = z_inv * z_inv;
        let num = z_inv * self.b1 + z2 * self.b2 + self.b0;
        let den = z_inv * self.a1 + z2 * self.a2 + 1.0;
        num / den
    }
}

/// Evaluate `filter` at every normalized frequency in `omegas`.
pub fn frequency_response(filter: &BiquadFilter, omegas: &Array1<f64>) -> Array1<Complex64> {
    omegas.mapv(|w| filter.response_at(w))
}
