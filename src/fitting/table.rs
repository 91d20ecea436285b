//! fitting::table — the fitted coefficient table and its consumers' views.
//!
//! Purpose
//! -------
//! Hold one [`BiquadFilter`] per sweep point, in sweep order, together with
//! per-entry diagnostics, and provide the views runtime consumers need:
//! factored rows, interpolation between rows, and serialized dumps.
//!
//! Key behaviors
//! -------------
//! - Every [`TableEntry`] records whether its poles (`stable`) and zeros
//!   (`minimum_phase`) lie strictly inside the unit circle. The table never
//!   rejects an entry for failing these checks.
//! - [`CoefficientTable::coefficients_at`] interpolates poles, zeros, and gain
//!   between the two bracketing rows, pairing roots with the same matching
//!   the continuity metric uses, then rebuilds the coefficients. A root pair
//!   that is real in one row and complex in the other is interpolated through
//!   its sum and product, so the result stays a real polynomial.
//! - [`CoefficientTable::to_text`] writes one `b0, b1, b2, a1, a2,` line per
//!   entry; JSON goes through `serde`.
//!
//! Invariants & assumptions
//! ------------------------
//! - A table is never empty and controls and filters are index-aligned.
//! - Interpolation requires a strictly increasing control axis; fitting does
//!   not.
use crate::{
    biquad::{
        filter::{BiquadFilter, N_COEFFS},
        roots::{RootPair, quadratic_roots},
    },
    circuit::errors::CircuitError,
    fitting::{
        continuity::{continuity_distance, matched},
        errors::{FitError, FitResult},
        sweep::SweepObjective,
    },
    optimization::cost_minimizer::Theta,
};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// One table row with its stability diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    pub control: f64,
    pub filter: BiquadFilter,
    pub stable: bool,
    pub minimum_phase: bool,
}

impl TableEntry {
    pub fn new(control: f64, filter: BiquadFilter) -> Self {
        Self {
            control,
            filter,
            stable: filter.is_stable(),
            minimum_phase: filter.is_minimum_phase(),
        }
    }
}

/// A row in factored form: `b0·(z − z1)(z − z2) / ((z − p1)(z − p2))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FactoredRow {
    pub poles: RootPair,
    pub zeros: RootPair,
    pub gain: f64,
    pub control: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientTable {
    entries: Vec<TableEntry>,
}

impl CoefficientTable {
    /// # Errors
    /// - [`FitError::EmptyTable`] when there are no filters.
    /// - [`FitError::TableLengthMismatch`] when the slices differ in length.
    pub fn new(controls: &[f64], filters: &[BiquadFilter]) -> FitResult<Self> {
        if controls.len() != filters.len() {
            return Err(FitError::TableLengthMismatch {
                controls: controls.len(),
                filters: filters.len(),
            });
        }
        if filters.is_empty() {
            return Err(FitError::EmptyTable);
        }
        let entries =
            controls.iter().zip(filters).map(|(&c, &f)| TableEntry::new(c, f)).collect();
        Ok(Self { entries })
    }

    /// Build a table from a flat sweep parameter vector.
    ///
    /// # Errors
    /// - Length errors from [`SweepObjective::blocks`] and [`CoefficientTable::new`].
    pub fn from_theta(controls: &[f64], theta: &Theta) -> FitResult<Self> {
        let filters = SweepObjective::blocks(theta)?;
        Self::new(controls, &filters)
    }

    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn filters(&self) -> Vec<BiquadFilter> {
        self.entries.iter().map(|e| e.filter).collect()
    }

    pub fn controls(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.control).collect()
    }

    /// Indices of entries with a pole on or outside the unit circle.
    pub fn unstable_indices(&self) -> Vec<usize> {
        self.entries.iter().enumerate().filter(|(_, e)| !e.stable).map(|(i, _)| i).collect()
    }

    pub fn all_stable(&self) -> bool {
        self.entries.iter().all(|e| e.stable)
    }

    /// Continuity distance between every pair of adjacent entries.
    pub fn adjacent_distances(&self) -> Vec<f64> {
        self.entries.windows(2).map(|w| continuity_distance(&w[1].filter, &w[0].filter)).collect()
    }

    pub fn factored(&self) -> Vec<FactoredRow> {
        self.entries
            .iter()
            .map(|e| FactoredRow {
                poles: e.filter.poles(),
                zeros: e.filter.zeros(),
                gain: e.filter.b0,
                control: e.control,
            })
            .collect()
    }

    /// Coefficients at an arbitrary control value.
    ///
    /// `param` is clamped to `[0, 1]` and then to the table's control range.
    /// Between two rows, poles, zeros, and gain are interpolated linearly.
    /// When either bracketing row has a root at infinity (vanishing `b0`),
    /// the coefficients are interpolated directly instead.
    ///
    /// # Errors
    /// - [`CircuitError::InvalidControlValue`] for a NaN `param`.
    /// - [`FitError::NonMonotonicAxis`] when the controls are not strictly increasing.
    pub fn coefficients_at(&self, param: f64) -> FitResult<BiquadFilter> {
        if param.is_nan() {
            return Err(CircuitError::InvalidControlValue { value: param }.into());
        }
        if let Some(index) = self.entries.windows(2).position(|w| w[1].control <= w[0].control) {
            return Err(FitError::NonMonotonicAxis { index: index + 1 });
        }
        let (first, last) = match (self.entries.first(), self.entries.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(FitError::EmptyTable),
        };
        let param = param.clamp(0.0, 1.0);
        if param <= first.control {
            return Ok(first.filter);
        }
        if param >= last.control {
            return Ok(last.filter);
        }
        // First entry with control >= param; index >= 1 after the end checks.
        let upper = self.entries.partition_point(|e| e.control < param);
        let hi = &self.entries[upper];
        if hi.control == param {
            return Ok(hi.filter);
        }
        let lo = &self.entries[upper - 1];
        let t = (param - lo.control) / (hi.control - lo.control);
        Ok(interpolate(&lo.filter, &hi.filter, t))
    }

    /// One `b0, b1, b2, a1, a2,` line per entry, in sweep order.
    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(|entry| {
                let c = entry.filter.to_array();
                format!("{}, {}, {}, {}, {},\n", c[0], c[1], c[2], c[3], c[4])
            })
            .collect::<String>()
    }

    pub fn to_json(&self) -> FitResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a table written by [`CoefficientTable::to_json`].
    ///
    /// Diagnostics are recomputed from the coefficients.
    ///
    /// # Errors
    /// - [`FitError::Serialization`] for malformed JSON.
    /// - Table construction errors from [`CoefficientTable::new`].
    pub fn from_json(text: &str) -> FitResult<Self> {
        let raw: Self = serde_json::from_str(text)?;
        Self::new(&raw.controls(), &raw.filters())
    }
}

fn interpolate(lo: &BiquadFilter, hi: &BiquadFilter, t: f64) -> BiquadFilter {
    let (lo_poles, lo_zeros) = (lo.poles(), lo.zeros());
    let (hi_poles, hi_zeros) = (hi.poles(), hi.zeros());
    if !(lo_zeros.is_finite() && hi_zeros.is_finite()) {
        let (a, b) = (lo.to_array(), hi.to_array());
        let mut c = [0.0; N_COEFFS];
        for (k, ck) in c.iter_mut().enumerate() {
            *ck = lerp(a[k], b[k], t);
        }
        return BiquadFilter::from(c);
    }
    let poles = lerp_roots(&lo_poles, &hi_poles, t);
    let zeros = lerp_roots(&lo_zeros, &hi_zeros, t);
    BiquadFilter::from_factored(&poles, &zeros, lerp(lo.b0, hi.b0, t))
}

/// Matched roots move linearly when both pairs are of the same kind. A real
/// pair against a conjugate pair has no conjugate-preserving matching; the
/// monic coefficients `(r₁ + r₂, r₁·r₂)` are interpolated instead.
fn lerp_roots(lo: &RootPair, hi: &RootPair, t: f64) -> RootPair {
    if lo.is_real() == hi.is_real() {
        return lerp_pair(lo, &matched(lo, hi), t);
    }
    let sum = lerp((lo.first + lo.second).re, (hi.first + hi.second).re, t);
    let product = lerp((lo.first * lo.second).re, (hi.first * hi.second).re, t);
    quadratic_roots(1.0, -sum, product)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_pair(a: &RootPair, b: &RootPair, t: f64) -> RootPair {
    let mix = |x: Complex64, y: Complex64| x + (y - x) * t;
    RootPair::new(mix(a.first, b.first), mix(a.second, b.second))
}
