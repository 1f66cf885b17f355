//=====================================================================
// Numeric helpers used across the sampling stack (spec §4.10). No teacher
// analogue exists for these — they are standard continuous-energy Monte
// Carlo transport kernels, implemented here exactly as spec'd.
//=====================================================================

use crate::rng::RngStream;

/// Direct sampling from a Maxwellian spectrum at temperature `t`:
/// draw xi1, xi2, xi3 and return `-t * (ln(xi1) + ln(xi2) * cos^2(pi/2 * xi3))`.
pub fn maxwell(t: f64, rng: &mut impl RngStream) -> f64 {
    let xi1 = rng.rang().0;
    let xi2 = rng.rang().0;
    let xi3 = rng.rang().0;
    let c = (std::f64::consts::FRAC_PI_2 * xi3).cos();
    -t * (xi1.ln() + xi2.ln() * c * c)
}

/// Watt fission spectrum: `w = maxwell(a)`, then
/// `E = w + a^2*b/4 + (2*xi - 1) * sqrt(a^2*b*w)`.
pub fn watt(a: f64, b: f64, rng: &mut impl RngStream) -> f64 {
    let w = maxwell(a, rng);
    let xi = rng.rang().0;
    w + a * a * b / 4.0 + (2.0 * xi - 1.0) * (a * a * b * w).sqrt()
}

/// Wigner nearest-neighbor level-spacing distribution:
/// `D = sqrt(-(4 * d_bar^2 / pi) * ln(xi))`.
pub fn wigner(d_bar: f64, rng: &mut impl RngStream) -> f64 {
    let xi = rng.rang().0;
    (-(4.0 * d_bar * d_bar / std::f64::consts::PI) * xi.ln()).sqrt()
}

/// Porter-Thomas / chi-squared sampling with `n` degrees of freedom,
/// optionally scaled by a mean `g_bar`. Rule C45 for even `n`:
/// `x = -(2/n) * ln(prod_{i=1}^{n/2} xi_i)`. Rule C64 for odd `n` chains a
/// unit-normal-squared term onto the even-n product (the standard
/// Gamma(n/2, 2) construction via n-1 even draws plus one extra factor).
pub fn chi_squared(n: u32, g_bar: Option<f64>, rng: &mut impl RngStream) -> f64 {
    assert!(n >= 1, "chi_squared requires n >= 1 degrees of freedom");
    let x = if n.is_multiple_of(2) {
        let half = n / 2;
        let mut product = 1.0;
        for _ in 0..half {
            product *= rng.rang().0;
        }
        -(2.0 / n as f64) * product.ln()
    } else {
        // C64: odd n. Combine the even-n product over (n-1) degrees of
        // freedom with one extra normal-squared factor so the result is a
        // properly scaled chi-squared variate with n degrees of freedom.
        let half = (n - 1) / 2;
        let mut product = 1.0;
        for _ in 0..half {
            product *= rng.rang().0;
        }
        let even_part = if half > 0 {
            -(2.0 / (n - 1) as f64) * product.ln()
        } else {
            0.0
        };
        let xi_a = rng.rang().0;
        let xi_b = rng.rang().0;
        let extra = -2.0 * xi_a.ln() * (std::f64::consts::PI * xi_b).cos().powi(2);
        (even_part * (n - 1) as f64 + extra) / n as f64
    };
    match g_bar {
        Some(g) => x * g,
        None => x,
    }
}

/// Rotate a unit direction `(u, v, w)` by polar cosine `mu` and a uniform
/// azimuth, returning the new unit direction. Uses the standard formula with
/// denominator `b = sqrt(1 - w^2)`; pivots on `v` instead when `|w|` is too
/// close to 1 for that denominator to be numerically safe, so the result
/// stays a unit vector even right at the poles.
pub fn rotate_angle(u: f64, v: f64, w: f64, mu: f64, rng: &mut impl RngStream) -> (f64, f64, f64) {
    let phi = 2.0 * std::f64::consts::PI * rng.rang().0;
    let (sin_phi, cos_phi) = phi.sin_cos();
    let sqrt_term = (1.0 - mu * mu).max(0.0).sqrt();

    let b = (1.0 - w * w).max(0.0).sqrt();
    if b > 1e-10 {
        let u_new = mu * u + sqrt_term * (u * w * cos_phi - v * sin_phi) / b;
        let v_new = mu * v + sqrt_term * (v * w * cos_phi + u * sin_phi) / b;
        let w_new = mu * w - sqrt_term * b * cos_phi;
        (u_new, v_new, w_new)
    } else {
        let b = (1.0 - v * v).max(0.0).sqrt();
        let u_new = mu * u + sqrt_term * (u * v * cos_phi + w * sin_phi) / b;
        let w_new = mu * w + sqrt_term * (w * v * cos_phi - u * sin_phi) / b;
        let v_new = mu * v - sqrt_term * b * cos_phi;
        (u_new, v_new, w_new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::StdRngStream;
    use approx::assert_abs_diff_eq;

    #[test]
    fn maxwell_moment_converges_to_one_point_five_t() {
        let mut stream = StdRngStream::new_substream(1, 1);
        let t = 2.0;
        let n = 1_000_000;
        let sum: f64 = (0..n).map(|_| maxwell(t, &mut stream)).sum();
        let mean = sum / n as f64;
        assert_abs_diff_eq!(mean, 1.5 * t, epsilon = 1.5 * t * 0.01);
    }

    #[test]
    fn rotate_angle_pole_case_mu_one() {
        let mut stream = StdRngStream::new_substream(2, 2);
        let (u, v, w) = rotate_angle(0.0, 0.0, 1.0, 1.0, &mut stream);
        assert_abs_diff_eq!(u, 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(v, 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(w, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn rotate_angle_pole_case_mu_minus_one() {
        let mut stream = StdRngStream::new_substream(3, 3);
        let (u, v, w) = rotate_angle(0.0, 0.0, 1.0, -1.0, &mut stream);
        assert_abs_diff_eq!(u, 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(v, 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(w, -1.0, epsilon = 1e-10);
    }

    #[test]
    fn rotate_angle_preserves_unit_norm_near_pole() {
        let mut stream = StdRngStream::new_substream(4, 4);
        // A direction close to the pole but still properly normalized
        // (unlike (0, 0, 1 - 1e-12), whose u^2+v^2+w^2 != 1). b0 stays well
        // above the b > 1e-10 branch threshold so the standard formula's own
        // sqrt(1 - w^2) cancellation doesn't dominate the result.
        let b0 = 1e-3_f64;
        let u0 = b0 / std::f64::consts::SQRT_2;
        let v0 = b0 / std::f64::consts::SQRT_2;
        let w0 = (1.0 - b0 * b0).sqrt();
        for _ in 0..1000 {
            let (u, v, w) = rotate_angle(u0, v0, w0, 0.3, &mut stream);
            let norm = (u * u + v * v + w * w).sqrt();
            assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn rotate_angle_preserves_unit_norm_generic() {
        let mut stream = StdRngStream::new_substream(5, 5);
        for _ in 0..1000 {
            let mu = 2.0 * stream.rang().0 - 1.0;
            let (u, v, w) = rotate_angle(0.6, 0.6, 0.529_150_262_212_918, mu, &mut stream);
            let norm = (u * u + v * v + w * w).sqrt();
            assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-9);
        }
    }
}
