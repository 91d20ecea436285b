//! circuit::components — component values of the passive tone stack.
//!
//! The network is a potentiometer of total resistance `Rp` split into
//! `Rp1`/`Rp2` by the control value, bridged by a series R-C shunt branch
//! and loaded by a parallel R-C series branch, with fixed feedback and input
//! impedances. Values are fixed configuration, not fitted.
use crate::circuit::{
    control::validate_control,
    errors::{CircuitError, CircuitResult},
};

/// Tone-stack component values (ohms and farads).
///
/// - `pot_ohms`: total pot resistance `Rp`.
/// - `feedback_ohms` / `input_ohms`: `Zf` and `Zin`.
/// - `shunt_ohms` + `shunt_farads`: series R-C branch `Zp = R + 1/(sC)`.
/// - `series_ohms` ∥ `series_farads`: branch `Zs = 1/(sC + 1/R)`.
/// - `taper_slope` / `taper_offset`: pot law `Rp1 = (k·Tp + ε)·Rp`. The
///   offset keeps both pot halves non-zero at the ends of travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneStack {
    pub pot_ohms: f64,
    pub feedback_ohms: f64,
    pub input_ohms: f64,
    pub shunt_ohms: f64,
    pub shunt_farads: f64,
    pub series_ohms: f64,
    pub series_farads: f64,
    pub taper_slope: f64,
    pub taper_offset: f64,
}

impl Default for ToneStack {
    fn default() -> Self {
        Self {
            pot_ohms: 20_000.0,
            feedback_ohms: 1_000.0,
            input_ohms: 1_000.0,
            shunt_ohms: 220.0,
            shunt_farads: 220e-9,
            series_ohms: 10_000.0,
            series_farads: 220e-9,
            taper_slope: 0.99998,
            taper_offset: 1e-5,
        }
    }
}

impl ToneStack {
    /// Check that every component is finite and positive and that the pot
    /// law keeps `Rp2 > 0` over the whole travel.
    ///
    /// # Errors
    /// - [`CircuitError::InvalidComponent`] naming the first bad value.
    /// - [`CircuitError::InvalidTaper`] when `slope + offset >= 1`.
    pub fn validate(&self) -> CircuitResult<()> {
        let named = [
            ("pot", self.pot_ohms),
            ("feedback", self.feedback_ohms),
            ("input", self.input_ohms),
            ("shunt resistor", self.shunt_ohms),
            ("shunt capacitor", self.shunt_farads),
            ("series resistor", self.series_ohms),
            ("series capacitor", self.series_farads),
            ("taper slope", self.taper_slope),
            ("taper offset", self.taper_offset),
        ];
        for (name, value) in named {
            if !value.is_finite() || value <= 0.0 {
                return Err(CircuitError::InvalidComponent { name, value });
            }
        }
        if self.taper_slope + self.taper_offset >= 1.0 {
            return Err(CircuitError::InvalidTaper {
                slope: self.taper_slope,
                offset: self.taper_offset,
            });
        }
        Ok(())
    }

    /// Split the pot at control value `tp` into `(Rp1, Rp2)`.
    ///
    /// # Errors
    /// - [`CircuitError::InvalidControlValue`] when `tp` is outside `[0, 1]`.
    pub fn split(&self, tp: f64) -> CircuitResult<(f64, f64)> {
        let tp = validate_control(tp)?;
        let fraction = self.taper_slope * tp + self.taper_offset;
        Ok((fraction * self.pot_ohms, (1.0 - fraction) * self.pot_ohms))
    }
}
