//=====================================================================
// AngleSampler (spec §4.3): sample the scattering cosine mu in [-1, 1] from
// a reaction's angular distribution.
//
// Grounded in the teacher's `ace::angular_distributions` module: the
// three-variant tagged enum (`Isotropic` / `Tabulated` / `EquiprobableBins`)
// and the `EnergyDependentAngularDistribution` wrapper (a per-reaction list
// of per-incoming-energy-bin distributions) are kept close to as-is. The
// per-bin *sampling* algorithm is rewritten: the teacher's
// `sample_cos_theta_at_energy` linearly interpolates the *sampled cosine
// values* of the two bracketing bins using one shared xi, which is a
// simplification this spec does not want. Spec §4.3 instead stochastically
// *selects* bin i or i+1 (probability weighted by the incoming-energy
// interpolation fraction) and samples from only the chosen bin, which is
// what real evaluated-data transport codes do.
//=====================================================================

use log::warn;

use crate::config::should_warn;
use crate::error::{Result, TransportError};
use crate::interpolation::{binary_search, InterpolationScheme};
use crate::rng::RngStream;

#[derive(Debug, Clone, PartialEq)]
pub enum AngularDistribution {
    Isotropic,
    EquiprobableBins { cosines: [f64; 33] },
    Tabular {
        mu: Vec<f64>,
        pdf: Vec<f64>,
        cdf: Vec<f64>,
        scheme: InterpolationScheme,
    },
}

impl AngularDistribution {
    pub fn tabular(mu: Vec<f64>, pdf: Vec<f64>, cdf: Vec<f64>, scheme: InterpolationScheme) -> Result<Self> {
        if mu.len() != pdf.len() || mu.len() != cdf.len() || mu.is_empty() {
            return Err(TransportError::EmptyTable);
        }
        if scheme != InterpolationScheme::Histogram && scheme != InterpolationScheme::LinLin {
            return Err(TransportError::UnknownInterpolationCode { code: scheme as usize });
        }
        Ok(Self::Tabular { mu, pdf, cdf, scheme })
    }

    pub fn equiprobable_bins(cosines: Vec<f64>) -> Result<Self> {
        let arr: [f64; 33] = cosines
            .try_into()
            .map_err(|_| TransportError::EmptyTable)?;
        Ok(Self::EquiprobableBins { cosines: arr })
    }

    fn sample(&self, rng: &mut impl RngStream, verbosity: u8) -> Result<f64> {
        match self {
            AngularDistribution::Isotropic => Ok(2.0 * rng.rang().0 - 1.0),
            AngularDistribution::EquiprobableBins { cosines } => {
                let xi = rng.rang().0;
                let scaled = 32.0 * xi;
                let k = (scaled.floor() as usize).min(31);
                let frac = scaled - k as f64;
                Ok(cosines[k] + frac * (cosines[k + 1] - cosines[k]))
            }
            AngularDistribution::Tabular { mu, pdf, cdf, scheme } => {
                let xi = rng.rang().0;
                // Linear scan to find k with cdf[k] <= xi < cdf[k+1].
                let k = match cdf.iter().position(|&c| c > xi) {
                    Some(0) => 0,
                    Some(idx) => idx - 1,
                    None => cdf.len() - 2,
                };
                let raw = match scheme {
                    InterpolationScheme::Histogram => mu[k] + (xi - cdf[k]) / pdf[k],
                    InterpolationScheme::LinLin => {
                        let m = (pdf[k + 1] - pdf[k]) / (mu[k + 1] - mu[k]);
                        if m == 0.0 {
                            mu[k] + (xi - cdf[k]) / pdf[k]
                        } else {
                            let discriminant = pdf[k] * pdf[k] + 2.0 * m * (xi - cdf[k]);
                            mu[k] + (discriminant.max(0.0).sqrt() - pdf[k]) / m
                        }
                    }
                    _ => unreachable!("validated at construction"),
                };
                if raw.abs() > 1.0 && should_warn(verbosity) {
                    warn!("sampled |mu| = {raw} strayed outside [-1, 1]; clamping");
                }
                Ok(raw.clamp(-1.0, 1.0))
            }
        }
    }
}

/// Per-reaction angular distribution: a list of incoming-energy breakpoints
/// each paired with an `AngularDistribution` (spec §3 `AngleDist`).
#[derive(Debug, Clone, PartialEq)]
pub struct AngleDist {
    energy: Vec<f64>,
    distributions: Vec<AngularDistribution>,
}

impl AngleDist {
    pub fn new(energy: Vec<f64>, distributions: Vec<AngularDistribution>) -> Result<Self> {
        if energy.len() != distributions.len() || energy.is_empty() {
            return Err(TransportError::EmptyTable);
        }
        Ok(Self { energy, distributions })
    }

    pub fn fully_isotropic() -> Self {
        Self {
            energy: vec![1.0e-11, 3.0e1],
            distributions: vec![AngularDistribution::Isotropic, AngularDistribution::Isotropic],
        }
    }

    /// Sample mu at incoming energy `e_in`, implementing the bin-selection
    /// rule of spec §4.3: locate the bracketing bin, compute the
    /// interpolation fraction, then *stochastically pick* bin i or i+1
    /// (probability `1 - frac` vs `frac`) before sampling only that bin.
    pub fn sample(&self, e_in: f64, rng: &mut impl RngStream, verbosity: u8) -> Result<f64> {
        if self.energy.len() == 1 {
            return self.distributions[0].sample(rng, verbosity);
        }
        let i = binary_search(&self.energy, e_in);
        let (e_lo, e_hi) = (self.energy[i], self.energy[i + 1]);
        let frac = if e_hi > e_lo {
            ((e_in - e_lo) / (e_hi - e_lo)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let xi = rng.rang().0;
        let chosen = if xi < frac { i + 1 } else { i };
        self.distributions[chosen].sample(rng, verbosity)
    }
}

/// Sample mu for a reaction that may have no angular distribution at all
/// (spec §4.3: "If r has no angular distribution -> mu = 2*xi - 1").
pub fn sample_mu(angle_dist: Option<&AngleDist>, e_in: f64, rng: &mut impl RngStream, verbosity: u8) -> Result<f64> {
    match angle_dist {
        None => Ok(2.0 * rng.rang().0 - 1.0),
        Some(dist) => dist.sample(e_in, rng, verbosity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MockRng;

    #[test]
    fn isotropic_maps_uniform_to_full_range() {
        let mut rng = MockRng::new(vec![0.0, 0.5, 1.0]);
        assert_eq!(AngularDistribution::Isotropic.sample(&mut rng, 1).unwrap(), -1.0);
        assert_eq!(AngularDistribution::Isotropic.sample(&mut rng, 1).unwrap(), 0.0);
        assert_eq!(AngularDistribution::Isotropic.sample(&mut rng, 1).unwrap(), 1.0);
    }

    #[test]
    fn equiprobable_bins_interpolates_within_bin() {
        let cosines: Vec<f64> = (0..33).map(|i| i as f64 / 32.0 * 2.0 - 1.0).collect();
        let dist = AngularDistribution::equiprobable_bins(cosines).unwrap();
        let mut rng = MockRng::new(vec![0.0, 0.5, 1.0 - 1e-15]);
        assert_eq!(dist.sample(&mut rng, 1).unwrap(), -1.0);
        assert_eq!(dist.sample(&mut rng, 1).unwrap(), 0.0);
        assert!(dist.sample(&mut rng, 1).unwrap() > 0.99);
    }

    #[test]
    fn tabular_linlin_inverts_cdf() {
        let dist = AngularDistribution::tabular(
            vec![-1.0, 0.0, 1.0],
            vec![0.5, 0.5, 0.5],
            vec![0.0, 0.5, 1.0],
            InterpolationScheme::LinLin,
        )
        .unwrap();
        let mut rng = MockRng::new(vec![0.0, 0.25, 0.5, 1.0 - 1e-15]);
        assert!((dist.sample(&mut rng, 1).unwrap() - (-1.0)).abs() < 1e-9);
        assert!((dist.sample(&mut rng, 1).unwrap() - (-0.5)).abs() < 1e-9);
        assert!((dist.sample(&mut rng, 1).unwrap() - 0.0).abs() < 1e-9);
    }

    #[test]
    fn no_angular_distribution_is_isotropic() {
        let mut rng = MockRng::new(vec![0.0, 1.0]);
        assert_eq!(sample_mu(None, 1.0, &mut rng, 1).unwrap(), -1.0);
        assert_eq!(sample_mu(None, 1.0, &mut rng, 1).unwrap(), 1.0);
    }

    #[test]
    fn energy_dependent_bin_selection_is_stochastic_not_interpolated() {
        // Bin 0 is pinned at mu=-1 (isotropic with xi=0), bin 1 pinned at
        // mu=+1 (isotropic with xi=1). At the midpoint energy, frac=0.5: a
        // low xi selects bin 0, a high xi selects bin 1 -- it never blends.
        let dist = AngleDist::new(
            vec![0.0, 2.0],
            vec![AngularDistribution::Isotropic, AngularDistribution::Isotropic],
        )
        .unwrap();
        let mut rng = MockRng::new(vec![0.1, 0.0]); // selects bin 0, samples xi=0 -> -1
        assert_eq!(dist.sample(1.0, &mut rng, 1).unwrap(), -1.0);
        let mut rng = MockRng::new(vec![0.9, 1.0]); // selects bin 1, samples xi=1 -> +1
        assert_eq!(dist.sample(1.0, &mut rng, 1).unwrap(), 1.0);
    }
}
