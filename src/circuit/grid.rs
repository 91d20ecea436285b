//! circuit::grid — log-spaced frequency grid and per-bin weighting.
//!
//! Purpose
//! -------
//! Build the fixed set of frequencies at which the analog target and the
//! digital biquads are compared, together with the weight each bin carries
//! in the fidelity term.
//!
//! Key behaviors
//! -------------
//! - [`GridOptions`] validates the grid configuration once; the default is
//!   2048 bins from 40 Hz to Nyquist at 192 kHz.
//! - [`FrequencyGrid`] holds strictly increasing frequencies (Hz) and the
//!   parallel weight sequence: `1.0` up to the audible cutoff, the
//!   out-of-band weight strictly above it.
//! - [`FrequencyGrid::normalized_frequencies`] maps Hz to `ω = 2π·f/fs`
//!   (radians/sample) for digital evaluation.
//!
//! Invariants & assumptions
//! ------------------------
//! - `frequencies().len() == weights().len() == n_bins`.
//! - Frequencies are strictly increasing and within `(0, fs/2]`.
//! - The grid is immutable after construction and shared read-only.
use crate::circuit::errors::{CircuitError, CircuitResult};
use ndarray::Array1;
use std::f64::consts::PI;

pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 192_000.0;
pub const DEFAULT_F_MIN_HZ: f64 = 40.0;
pub const DEFAULT_N_BINS: usize = 2048;
pub const DEFAULT_AUDIBLE_CUTOFF_HZ: f64 = 20_000.0;
pub const DEFAULT_OUT_OF_BAND_WEIGHT: f64 = 0.2;

/// Validated frequency-grid configuration.
///
/// `f_max_hz = None` means "half the sample rate".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridOptions {
    pub f_min_hz: f64,
    pub f_max_hz: Option<f64>,
    pub n_bins: usize,
    pub sample_rate_hz: f64,
    pub audible_cutoff_hz: f64,
    pub out_of_band_weight: f64,
}

impl GridOptions {
    /// Construct validated grid options.
    ///
    /// # Errors
    /// - [`CircuitError::InvalidSampleRate`] for a non-finite or non-positive rate.
    /// - [`CircuitError::InvalidFrequencyBounds`] for non-positive bounds,
    ///   `f_min >= f_max`, or `f_max` above Nyquist.
    /// - [`CircuitError::InvalidBinCount`] when `n_bins < 2`.
    /// - [`CircuitError::InvalidWeighting`] for a negative or non-finite
    ///   weight or cutoff.
    pub fn new(
        f_min_hz: f64, f_max_hz: Option<f64>, n_bins: usize, sample_rate_hz: f64,
        audible_cutoff_hz: f64, out_of_band_weight: f64,
    ) -> CircuitResult<Self> {
        let opts = Self {
            f_min_hz,
            f_max_hz,
            n_bins,
            sample_rate_hz,
            audible_cutoff_hz,
            out_of_band_weight,
        };
        opts.validate()?;
        Ok(opts)
    }

    /// Upper grid bound in Hz after resolving the Nyquist default.
    pub fn upper_bound_hz(&self) -> f64 {
        self.f_max_hz.unwrap_or(self.sample_rate_hz / 2.0)
    }

    /// Same options with a different bin count.
    ///
    /// # Errors
    /// - [`CircuitError::InvalidBinCount`] when `n_bins < 2`.
    pub fn with_bins(mut self, n_bins: usize) -> CircuitResult<Self> {
        self.n_bins = n_bins;
        self.validate()?;
        Ok(self)
    }

    /// Same options at a different sample rate; an explicit `f_max` is kept.
    ///
    /// # Errors
    /// Same as [`GridOptions::new`].
    pub fn with_sample_rate(mut self, sample_rate_hz: f64) -> CircuitResult<Self> {
        self.sample_rate_hz = sample_rate_hz;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> CircuitResult<()> {
        let fs = self.sample_rate_hz;
        if !fs.is_finite() || fs <= 0.0 {
            return Err(CircuitError::InvalidSampleRate { value: fs });
        }
        let (f_min, f_max) = (self.f_min_hz, self.upper_bound_hz());
        let bounds_err = |reason| CircuitError::InvalidFrequencyBounds { f_min, f_max, reason };
        if !f_min.is_finite() || !f_max.is_finite() {
            return Err(bounds_err("Bounds must be finite."));
        }
        if f_min <= 0.0 {
            return Err(bounds_err("Lower bound must be > 0."));
        }
        if f_min >= f_max {
            return Err(bounds_err("Lower bound must be below upper bound."));
        }
        if f_max > fs / 2.0 {
            return Err(bounds_err("Upper bound must not exceed half the sample rate."));
        }
        if self.n_bins < 2 {
            return Err(CircuitError::InvalidBinCount { n_bins: self.n_bins });
        }
        let w = self.out_of_band_weight;
        if !w.is_finite() || w < 0.0 {
            return Err(CircuitError::InvalidWeighting {
                value: w,
                reason: "Out-of-band weight must be finite and >= 0.",
            });
        }
        let cutoff = self.audible_cutoff_hz;
        if !cutoff.is_finite() || cutoff <= 0.0 {
            return Err(CircuitError::InvalidWeighting {
                value: cutoff,
                reason: "Audible cutoff must be finite and > 0.",
            });
        }
        Ok(())
    }
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            f_min_hz: DEFAULT_F_MIN_HZ,
            f_max_hz: None,
            n_bins: DEFAULT_N_BINS,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            audible_cutoff_hz: DEFAULT_AUDIBLE_CUTOFF_HZ,
            out_of_band_weight: DEFAULT_OUT_OF_BAND_WEIGHT,
        }
    }
}

/// Log-spaced frequencies with matching weights.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyGrid {
    frequencies: Array1<f64>,
    weights: Array1<f64>,
    sample_rate_hz: f64,
}

impl FrequencyGrid {
    /// Build the grid described by `opts`.
    ///
    /// # Errors
    /// Re-validates `opts` (fields are public) and reports the same errors
    /// as [`GridOptions::new`].
    pub fn new(opts: &GridOptions) -> CircuitResult<Self> {
        opts.validate()?;
        let (f_min, f_max) = (opts.f_min_hz, opts.upper_bound_hz());
        let frequencies = Array1::logspace(10.0, f_min.log10(), f_max.log10(), opts.n_bins);
        let weights = frequencies
            .mapv(|f| if f > opts.audible_cutoff_hz { opts.out_of_band_weight } else { 1.0 });
        Ok(Self { frequencies, weights, sample_rate_hz: opts.sample_rate_hz })
    }

    /// Grid frequencies in Hz, strictly increasing.
    pub fn frequencies(&self) -> &Array1<f64> {
        &self.frequencies
    }

    /// Per-bin weights aligned with [`FrequencyGrid::frequencies`].
    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Digital angular frequencies `ω = 2π·f/sample_rate` (radians/sample).
    pub fn normalized_frequencies(&self, sample_rate_hz: f64) -> Array1<f64> {
        self.frequencies.mapv(|f| 2.0 * PI * f / sample_rate_hz)
    }

    /// [`FrequencyGrid::normalized_frequencies`] at the grid's own rate.
    pub fn omegas(&self) -> Array1<f64> {
        self.normalized_frequencies(self.sample_rate_hz)
    }
}
