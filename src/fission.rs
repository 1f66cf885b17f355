//=====================================================================
// FissionSampler and FissionBank (spec §4.5, §4.9): nu-bar evaluation,
// prompt/delayed split, daughter banking.
//
// New code: the teacher's `blocks::nu`/`dnu`/`bdd` stop at decoding the
// ACE-format nu-bar and precursor tables (`Nu`, `Dnu`, `Bdd` structs), never
// sampling from them. Those field shapes are what this crate's
// `NuFormulation`/`PrecursorGroup` (data.rs) are grounded on; the sampling
// algorithm itself is new, taken straight from spec §4.5.
//=====================================================================

use crate::angle;
use crate::data::{FissionData, Nuclide, Particle, Reaction};
use crate::error::Result;
use crate::rng::RngStream;

const FISSION_DAUGHTER_ENERGY_CAP: f64 = 20.0;

#[derive(Debug, Clone)]
pub struct FissionSite {
    pub uid: u64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub u: f64,
    pub v: f64,
    pub w: f64,
    pub energy: f64,
}

/// Append-only bounded queue of next-generation source sites (spec §4.9).
/// Saturates silently: pushes past capacity are dropped rather than growing
/// the buffer, since generation-size stability is a correctness property of
/// the outer power-iteration (spec §9).
#[derive(Debug, Clone, Default)]
pub struct FissionBank {
    sites: Vec<FissionSite>,
    capacity: usize,
}

impl FissionBank {
    pub fn new(capacity: usize) -> Self {
        Self { sites: Vec::with_capacity(capacity.min(1024)), capacity }
    }

    pub fn push(&mut self, site: FissionSite) -> bool {
        if self.sites.len() >= self.capacity {
            return false;
        }
        self.sites.push(site);
        true
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn clear(&mut self) {
        self.sites.clear();
    }

    pub fn sites(&self) -> &[FissionSite] {
        &self.sites
    }
}

/// Sample a precursor group index by inverting the cumulative per-group
/// delayed-yield table at incoming energy `e_in` (spec §4.5 step 4).
fn sample_precursor_group(fission: &FissionData, e_in: f64, rng: &mut impl RngStream) -> Result<usize> {
    let yields: Vec<f64> = fission
        .precursors
        .iter()
        .map(|g| g.yield_fraction.interpolate(e_in).unwrap_or(0.0).max(0.0))
        .collect();
    let total: f64 = yields.iter().sum();
    if total <= 0.0 {
        return Ok(0);
    }
    let xi = rng.rang().0 * total;
    let mut acc = 0.0;
    for (j, y) in yields.iter().enumerate() {
        acc += y;
        if xi < acc {
            return Ok(j);
        }
    }
    Ok(fission.precursors.len() - 1)
}

/// Compute fission daughters for one collision and bank them (spec §4.5).
/// `actual_event` selects between the analog-collision weight formula and
/// the survival-biasing implicit-fission formula. Returns the number of
/// daughters actually banked (may be less than sampled, if the bank
/// saturates).
#[allow(clippy::too_many_arguments)]
pub fn create_fission_sites(
    particle: &mut Particle,
    nuclide: &Nuclide,
    reaction: &Reaction,
    sigma_f: f64,
    sigma_t: f64,
    keff: f64,
    actual_event: bool,
    bank: &mut FissionBank,
    rng: &mut impl RngStream,
    verbosity: u8,
) -> Result<usize> {
    let fission = match &nuclide.fission {
        Some(f) => f,
        None => return Ok(0),
    };

    let e_in = particle.energy;
    let nu_t = fission.nu_total.evaluate(e_in);
    let nu_p = fission.nu_prompt.evaluate(e_in);
    let nu_d = (nu_t - nu_p).max(0.0);
    let beta = if nu_t > 0.0 { nu_d / nu_t } else { 0.0 };

    let nu_bar = if actual_event {
        (particle.weight / keff) * nu_t
    } else {
        (particle.last_collision_weight * sigma_f / (keff * sigma_t)) * nu_t
    };

    let xi_round = rng.rang().0;
    let n = nu_bar.floor() as i64 + i64::from(xi_round < nu_bar.fract());
    let n = n.max(0) as usize;

    let mut banked = 0;
    for _ in 0..n {
        let mu = angle::sample_mu(reaction.angle_dist.as_ref(), e_in, rng, verbosity)?;

        let xi_delayed = rng.rang().0;
        let e_out = if xi_delayed < beta && !fission.precursors.is_empty() {
            let group = sample_precursor_group(fission, e_in, rng)?;
            loop {
                let (e, _) = fission.precursors[group].energy_dist.sample(e_in, rng, verbosity)?;
                if e < FISSION_DAUGHTER_ENERGY_CAP {
                    break e;
                }
            }
        } else {
            loop {
                let (e, _) = fission.chi_prompt.sample(e_in, rng, verbosity)?;
                if e < FISSION_DAUGHTER_ENERGY_CAP {
                    break e;
                }
            }
        };

        let phi = 2.0 * std::f64::consts::PI * rng.rang().0;
        let sqrt_term = (1.0 - mu * mu).max(0.0).sqrt();
        let (u, v, w) = (mu, sqrt_term * phi.cos(), sqrt_term * phi.sin());

        let site = FissionSite {
            uid: particle.id,
            x: particle.x,
            y: particle.y,
            z: particle.z,
            u,
            v,
            w,
            energy: e_out,
        };
        if bank.push(site) {
            banked += 1;
        }
    }

    if actual_event {
        particle.kill();
    }

    Ok(banked)
}
