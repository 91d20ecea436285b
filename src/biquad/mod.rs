//! biquad — second-order digital sections: coefficients, roots, response.
//!
//! - [`BiquadFilter`] holds `(b0, b1, b2, a1, a2)` with `a0 = 1` implied.
//! - [`quadratic_roots`] gives the closed-form zeros and poles as a
//!   [`RootPair`].
//! - [`frequency_response`] evaluates `H(e^{jω})` over normalized
//!   frequencies.

pub mod filter;
pub mod response;
pub mod roots;

pub use self::filter::{BiquadFilter, N_COEFFS};
pub use self::response::frequency_response;
pub use self::roots::{RootPair, quadratic_roots};
