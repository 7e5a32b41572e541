/// Generate a random `f64` in the range `[low, high]`.
///
/// Interpolates between the ends instead of scaling `high - low`, which
/// overflows for bounds wider than `f64::MAX`.
#[inline]
pub(crate) fn f64_range(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    let u = rng.f64();
    (low * (1.0 - u) + high * u).clamp(low, high)
}

/// Draw one point uniformly inside an axis-aligned box.
pub(crate) fn point_in_bounds(rng: &mut fastrand::Rng, bounds: &[(f64, f64)]) -> Vec<f64> {
    bounds
        .iter()
        .map(|&(lo, hi)| f64_range(rng, lo, hi))
        .collect()
}

/// Derive an independent child seed from a parent seed and a stream label.
///
/// Uses the `SplitMix64` finalizer so adjacent labels map to well-separated
/// seeds.
pub(crate) fn derive_seed(seed: u64, label: &str) -> u64 {
    let mut z = label.bytes().fold(seed, |acc, b| {
        acc.rotate_left(5) ^ u64::from(b).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    });
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
