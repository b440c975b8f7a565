const MIN_DISTANCE: f64 = 1e-6;

/// 12-6 Lennard-Jones pair energy, `4 eps [(sigma/r)^12 - (sigma/r)^6]`.
#[inline]
pub fn lennard_jones_12_6(dist: f64, sigma: f64, epsilon: f64) -> f64 {
    if dist < MIN_DISTANCE {
        return 1e10;
    }
    let sr6 = (sigma / dist).powi(6);
    4.0 * epsilon * (sr6 * sr6 - sr6)
}

/// Radial derivative `dV/dr` of [`lennard_jones_12_6`].
///
/// Negative inside the minimum (repulsive), positive outside (attractive).
#[inline]
pub fn lennard_jones_12_6_derivative(dist: f64, sigma: f64, epsilon: f64) -> f64 {
    if dist < MIN_DISTANCE {
        return -1e10;
    }
    let sr6 = (sigma / dist).powi(6);
    24.0 * epsilon * (sr6 - 2.0 * sr6 * sr6) / dist
}

/// Lorentz-Berthelot mixing: arithmetic mean of sigmas, geometric mean of epsilons.
#[inline]
pub fn lorentz_berthelot(sigma_a: f64, epsilon_a: f64, sigma_b: f64, epsilon_b: f64) -> (f64, f64) {
    (0.5 * (sigma_a + sigma_b), (epsilon_a * epsilon_b).sqrt())
}
