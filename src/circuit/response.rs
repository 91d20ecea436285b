//! circuit::response — closed-form analog transfer function of the tone stack.
//!
//! Purpose
//! -------
//! Evaluate the target response `H(s)` the biquads are fitted against, at
//! `s = j·2π·f` for every grid frequency.
//!
//! Key behaviors
//! -------------
//! - [`ToneStack::transfer`] evaluates the bridged-divider expression
//!
//!   ```text
//!   Zp = R_shunt + 1/(s·C_shunt)
//!   X  = Zp·Rp / (Zp·Rp + Rp1·Rp2)
//!   Zs = 1 / (s·C_series + 1/R_series)
//!   H  = ((1 − X)/Rp2 + 1/Zf) / ((1 − X)/Rp1 + 1/Zs + 1/Zin)
//!   ```
//!
//! - [`target_response`] maps it over a [`FrequencyGrid`] for one control
//!   value.
//!
//! Invariants & assumptions
//! ------------------------
//! - Control values outside `[0, 1]` are rejected before evaluation.
//! - With validated components the pot offset keeps `Rp1, Rp2 > 0`, so the
//!   response is finite at every grid frequency for every accepted `tp`.
use crate::circuit::{components::ToneStack, errors::CircuitResult, grid::FrequencyGrid};
use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Complex target response aligned with a [`FrequencyGrid`].
pub type TargetResponse = Array1<Complex64>;

impl ToneStack {
    /// `H(s)` with the pot already split into `(rp1, rp2)`.
    pub fn transfer(&self, s: Complex64, rp1: f64, rp2: f64) -> Complex64 {
        let rp = self.pot_ohms;
        let zp = self.shunt_ohms + (s * self.shunt_farads).inv();
        let x = zp * rp / (zp * rp + rp1 * rp2);
        let zs = (s * self.series_farads + 1.0 / self.series_ohms).inv();
        let num = (1.0 - x) / rp2 + 1.0 / self.feedback_ohms;
        let den = (1.0 - x) / rp1 + zs.inv() + 1.0 / self.input_ohms;
        num / den
    }

    /// `H(j·2π·f)` at control value `tp`.
    ///
    /// # Errors
    /// - `CircuitError::InvalidControlValue` when `tp` is outside `[0, 1]`.
    pub fn response_at(&self, tp: f64, freq_hz: f64) -> CircuitResult<Complex64> {
        let (rp1, rp2) = self.split(tp)?;
        Ok(self.transfer(Complex64::new(0.0, 2.0 * PI * freq_hz), rp1, rp2))
    }
}

/// Target response of `stack` at control value `tp` over `grid`.
///
/// # Errors
/// - `CircuitError::InvalidControlValue` when `tp` is outside `[0, 1]`.
/// - Component validation errors from [`ToneStack::validate`].
pub fn target_response(
    stack: &ToneStack, grid: &FrequencyGrid, tp: f64,
) -> CircuitResult<TargetResponse> {
    stack.validate()?;
    let (rp1, rp2) = stack.split(tp)?;
    Ok(grid
        .frequencies()
        .mapv(|f| stack.transfer(Complex64::new(0.0, 2.0 * PI * f), rp1, rp2)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{control::DEFAULT_SWEEP, errors::CircuitError, grid::GridOptions};
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Finiteness over the whole default sweep.
    // - Rejection of out-of-range control values.
    // - The DC limit that follows from the topology.
    // -------------------------------------------------------------------------

    fn small_grid() -> FrequencyGrid {
        let opts = GridOptions::default().with_bins(128).expect("valid bins");
        FrequencyGrid::new(&opts).expect("valid grid")
    }

    #[test]
    // Purpose
    // -------
    // Ensure the target is finite at every grid frequency for every sweep
    // point, including both ends of travel.
    //
    // Given
    // -----
    // - Default components and the default 21-point sweep.
    //
    // Expect
    // ------
    // - Every value is finite and the length matches the grid.
    fn target_is_finite_across_default_sweep() {
        // Arrange
        let stack = ToneStack::default();
        let grid = small_grid();

        for &tp in DEFAULT_SWEEP.iter() {
            // Act
            let h = target_response(&stack, &grid, tp).expect("sweep point is valid");

            // Assert
            assert_eq!(h.len(), grid.len());
            assert!(h.iter().all(|z| z.re.is_finite() && z.im.is_finite()), "tp = {tp}");
        }
    }

    #[test]
    fn out_of_range_control_is_rejected() {
        let err = target_response(&ToneStack::default(), &small_grid(), 1.5)
            .expect_err("tp = 1.5 must be rejected");
        assert_eq!(err, CircuitError::InvalidControlValue { value: 1.5 });
    }

    #[test]
    // Purpose
    // -------
    // Check the closed form against its DC limit.
    //
    // Given
    // -----
    // - `s → 0`: `Zp → ∞` so `X → 1`, and `Zs → R_series`.
    //
    // Expect
    // ------
    // - `H → (1/Zf) / (1/R_series + 1/Zin)` = 1000/1100 with default values.
    fn dc_limit_matches_resistive_divider() {
        // Arrange
        let stack = ToneStack::default();

        // Act
        let h = stack.response_at(0.5, 1e-3).expect("valid control");

        // Assert
        let expected = (1.0 / 1_000.0) / (1.0 / 10_000.0 + 1.0 / 1_000.0);
        assert_relative_eq!(h.re, expected, max_relative = 1e-4);
        assert!(h.im.abs() < 1e-3);
    }

    #[test]
    fn knob_position_changes_the_response() {
        let stack = ToneStack::default();
        let grid = small_grid();

        let low = target_response(&stack, &grid, 0.0).expect("valid");
        let high = target_response(&stack, &grid, 1.0).expect("valid");

        let diff: f64 = low.iter().zip(high.iter()).map(|(a, b)| (a - b).norm()).sum();
        assert!(diff > 1e-3);
    }
}
