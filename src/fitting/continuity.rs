//! fitting::continuity — distance between two filters' pole/zero constellations.
//!
//! Root pairs are unordered, so the distance between `{z1, z2}` and
//! `{u1, u2}` is the cheaper of the two possible matchings:
//!
//! ```text
//! pair_distance = min(|z1 − u1| + |z2 − u2|, |z1 − u2| + |z2 − u1|)
//! ```
//!
//! The filter distance adds the zero-pair and pole-pair distances. A
//! repeated root makes both matchings equal, which needs no special case.
use crate::biquad::{filter::BiquadFilter, roots::RootPair};

/// Minimum-cost matching distance between two unordered root pairs.
///
/// Non-finite roots give a non-finite distance.
pub fn pair_distance(a: &RootPair, b: &RootPair) -> f64 {
    let (straight, crossed) = matching_costs(a, b);
    if straight.is_nan() || crossed.is_nan() { f64::NAN } else { straight.min(crossed) }
}

/// `b` enumerated in the order that realizes [`pair_distance`] against `a`.
pub fn matched(a: &RootPair, b: &RootPair) -> RootPair {
    let (straight, crossed) = matching_costs(a, b);
    if crossed < straight { b.swapped() } else { *b }
}

/// Zero-pair distance plus pole-pair distance.
pub fn continuity_distance(a: &BiquadFilter, b: &BiquadFilter) -> f64 {
    pair_distance(&a.zeros(), &b.zeros()) + pair_distance(&a.poles(), &b.poles())
}

fn matching_costs(a: &RootPair, b: &RootPair) -> (f64, f64) {
    let straight = (a.first - b.first).norm() + (a.second - b.second).norm();
    let crossed = (a.first - b.second).norm() + (a.second - b.first).norm();
    (straight, crossed)
}
