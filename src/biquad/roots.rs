//! biquad::roots — closed-form roots of degree-2 polynomials.
//!
//! Roots are computed with the cancellation-free form of the quadratic
//! formula, so the enumeration order is deterministic for a given set of
//! coefficients:
//!
//! - real roots: `q = −(b + sign(b)·√Δ)/2`, roots `q/a` and `c/q`;
//! - complex roots: `(−b ± j·√−Δ)/(2a)`, positive imaginary part first.
//!
//! A vanishing leading coefficient drops the degree; the lost root is
//! reported at infinity so that downstream penalties and distances become
//! non-finite instead of silently wrong.
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Two roots of a quadratic, in the order produced by [`quadratic_roots`].
///
/// The pair is semantically unordered; distance computations match pairs
/// over both permutations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootPair {
    pub first: Complex64,
    pub second: Complex64,
}

impl RootPair {
    pub fn new(first: Complex64, second: Complex64) -> Self {
        Self { first, second }
    }

    /// Same roots, enumerated in the opposite order.
    pub fn swapped(self) -> Self {
        Self { first: self.second, second: self.first }
    }

    pub fn as_array(&self) -> [Complex64; 2] {
        [self.first, self.second]
    }

    /// Largest root modulus; `NaN` if either root is `NaN`.
    pub fn max_modulus(&self) -> f64 {
        let (a, b) = (self.first.norm(), self.second.norm());
        if a.is_nan() || b.is_nan() { f64::NAN } else { a.max(b) }
    }

    /// `true` when both roots lie strictly inside the unit circle.
    pub fn inside_unit_circle(&self) -> bool {
        self.max_modulus() < 1.0
    }

    pub fn is_finite(&self) -> bool {
        self.first.is_finite() && self.second.is_finite()
    }

    /// Both roots on the real axis.
    pub fn is_real(&self) -> bool {
        self.first.im == 0.0 && self.second.im == 0.0
    }
}

/// Roots of `a·z² + b·z + c`.
pub fn quadratic_roots(a: f64, b: f64, c: f64) -> RootPair {
    if a == 0.0 {
        let linear = if b != 0.0 { -c / b } else { f64::NAN };
        return RootPair::new(Complex64::new(linear, 0.0), Complex64::new(f64::INFINITY, 0.0));
    }
    let disc = b * b - 4.0 * a * c;
    if disc >= 0.0 {
        let q = -0.5 * (b + disc.sqrt().copysign(b));
        if q == 0.0 {
            return RootPair::new(Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0));
        }
        RootPair::new(Complex64::new(q / a, 0.0), Complex64::new(c / q, 0.0))
    } else {
        let re = -b / (2.0 * a);
        let im = ((-disc).sqrt() / (2.0 * a)).abs();
        RootPair::new(Complex64::new(re, im), Complex64::new(re, -im))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Real, complex-conjugate, and repeated roots.
    // - Accuracy when `b² ≫ 4ac` (the cancellation-prone case).
    // - Degree drop when the leading coefficient vanishes.
    // -------------------------------------------------------------------------

    fn residual(a: f64, b: f64, c: f64, z: Complex64) -> f64 {
        (z * z * a + z * b + c).norm()
    }

    #[test]
    fn real_roots_are_exact_for_simple_factors() {
        // (z − 2)(z + 3) = z² + z − 6
        let roots = quadratic_roots(1.0, 1.0, -6.0);

        let mut re = [roots.first.re, roots.second.re];
        re.sort_by(f64::total_cmp);
        assert_abs_diff_eq!(re[0], -3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(re[1], 2.0, epsilon = 1e-12);
        assert_eq!(roots.first.im, 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Verify complex-conjugate roots for a resonant pole pair.
    //
    // Given
    // -----
    // - `z² − 1.8·z + 0.9` (discriminant < 0).
    //
    // Expect
    // ------
    // - Conjugate pair with positive imaginary part first, modulus √0.9.
    fn complex_roots_come_as_conjugate_pair() {
        // Arrange / Act
        let roots = quadratic_roots(1.0, -1.8, 0.9);

        // Assert
        assert_abs_diff_eq!(roots.first.re, 0.9, epsilon = 1e-12);
        assert!(roots.first.im > 0.0);
        assert_eq!(roots.second, roots.first.conj());
        assert_abs_diff_eq!(roots.max_modulus(), 0.9_f64.sqrt(), epsilon = 1e-12);
        assert!(roots.inside_unit_circle());
    }

    #[test]
    fn small_root_survives_large_linear_term() {
        let (a, b, c) = (1.0, 1e8, 1.0);

        let roots = quadratic_roots(a, b, c);

        assert!(residual(a, b, c, roots.first) / 1e16 < 1e-12);
        assert_abs_diff_eq!(roots.second.re, -1e-8, epsilon = 1e-20);
    }

    #[test]
    fn repeated_and_zero_roots() {
        let double = quadratic_roots(1.0, -1.0, 0.25);
        assert_abs_diff_eq!(double.first.re, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(double.second.re, 0.5, epsilon = 1e-12);

        let zero = quadratic_roots(2.0, 0.0, 0.0);
        assert_eq!(zero.first, Complex64::new(0.0, 0.0));
        assert_eq!(zero.second, Complex64::new(0.0, 0.0));
    }

    #[test]
    fn vanishing_leading_coefficient_reports_root_at_infinity() {
        let roots = quadratic_roots(0.0, 2.0, -1.0);

        assert_abs_diff_eq!(roots.first.re, 0.5, epsilon = 1e-12);
        assert!(!roots.is_finite());
        assert!(!roots.inside_unit_circle());
    }
}
