//=====================================================================
// CollisionEngine (spec §4.7): pick nuclide, pick reaction, dispatch to
// scatter/absorb/fission, apply survival biasing.
//
// New code grounded in the teacher's `api::reaction::Reaction` MT-tag field
// (the reaction-family MT-range checks below mirror how the teacher's own
// `Reaction::new` classifies a block by its MT) plus the elastic/inelastic
// kinematics of spec §4.10, built on `numeric::rotate_angle`.
//=====================================================================

use log::warn;

use crate::angle;
use crate::config::TransportConfig;
use crate::data::{Material, Nuclide, Particle, Reaction, FISSION_MTS};
use crate::error::{Result, TransportError};
use crate::fission::{create_fission_sites, FissionBank};
use crate::numeric::rotate_angle;
use crate::rng::RngStream;
use crate::xs::XsCache;

const ENERGY_UNDERFLOW: f64 = 1e-100;
const GAS_PRODUCTION_MT: u32 = 200;
const TOTAL_INELASTIC_MT: u32 = 4;
const DISAPPEARANCE_RANGE: std::ops::RangeInclusive<u32> = 102..=117;

pub struct CollisionOutcome {
    pub scattered: bool,
    pub fission_daughters_banked: usize,
}

#[allow(clippy::too_many_arguments)]
pub fn collision(
    particle: &mut Particle,
    material: &Material,
    xs: &XsCache,
    config: &TransportConfig,
    bank: &mut FissionBank,
    rng: &mut impl RngStream,
) -> Result<CollisionOutcome> {
    particle.n_collisions += 1;
    let last_weight = particle.weight;
    let last_energy = particle.energy;

    let macro_xs = xs.micro.iter().zip(material.densities.iter()).fold(0.0, |acc, (m, &d)| acc + d * m.total);
    if macro_xs <= 0.0 {
        return Err(TransportError::NuclideSamplingExhausted { xi: 0.0, accumulated: 0.0, sigma_t: macro_xs });
    }

    let xi_nuc = rng.rang().0;
    let target_nuc = xi_nuc * macro_xs;
    let mut accumulated = 0.0;
    let mut nuclide_idx = None;
    for (idx, (nuc, &density)) in material.nuclides.iter().zip(material.densities.iter()).enumerate() {
        accumulated += density * xs.micro[idx].total;
        if accumulated > target_nuc {
            nuclide_idx = Some(idx);
            break;
        }
        let _ = nuc;
    }
    let nuclide_idx = nuclide_idx.ok_or(TransportError::NuclideSamplingExhausted {
        xi: xi_nuc,
        accumulated,
        sigma_t: macro_xs,
    })?;

    let nuc = &material.nuclides[nuclide_idx];
    let micro = &xs.micro[nuclide_idx];
    let (ie_n, f) = (micro.index_grid, micro.interp_factor);

    let mut scattered = false;
    let mut fission_daughters = 0;

    if config.survival_biasing {
        particle.weight *= 1.0 - micro.absorption / micro.total;

        if let Some(fission_rxn) = nuc.fission_reaction() {
            particle.last_collision_weight = last_weight;
            fission_daughters = create_fission_sites(
                particle,
                nuc,
                fission_rxn,
                micro.fission,
                micro.total,
                config.keff,
                false,
                bank,
                rng,
                config.verbosity,
            )?;
        }

        if particle.weight < config.weight_cutoff {
            let xi = rng.rang().0;
            if xi < particle.weight / config.weight_survive {
                particle.weight = config.weight_survive;
            } else {
                particle.kill();
            }
        }

        if particle.alive {
            let sigma_sc = micro.total - micro.absorption;
            let xi_scatter = rng.rang().0;
            if sigma_sc > 0.0 && xi_scatter < micro.elastic / sigma_sc {
                elastic_scatter(particle, nuc, find_elastic(nuc)?, rng, config.verbosity)?;
            } else {
                let rxn = sample_scatter_reaction(nuc, ie_n, f, rng)?;
                inelastic_scatter(particle, nuc, rxn, rng, config.verbosity)?;
            }
            scattered = true;
        }
    } else {
        let xi_rxn = rng.rang().0;
        let target = xi_rxn * micro.total;
        let mut acc = 0.0;
        let mut chosen: Option<&Reaction> = None;
        for rxn in nuc.reactions.iter().filter(|r| r.mt < GAS_PRODUCTION_MT && r.mt != TOTAL_INELASTIC_MT) {
            acc += rxn.xs_at(ie_n, f);
            if acc > target {
                chosen = Some(rxn);
                break;
            }
        }

        match chosen {
            Some(rxn) if rxn.mt == 2 => {
                elastic_scatter(particle, nuc, rxn, rng, config.verbosity)?;
                scattered = true;
            }
            Some(rxn) if FISSION_MTS.contains(&rxn.mt) => {
                particle.last_collision_weight = last_weight;
                fission_daughters =
                    create_fission_sites(particle, nuc, rxn, micro.fission, micro.total, config.keff, true, bank, rng, config.verbosity)?;
            }
            Some(rxn) if DISAPPEARANCE_RANGE.contains(&rxn.mt) => {
                particle.kill();
            }
            Some(rxn) => {
                inelastic_scatter(particle, nuc, rxn, rng, config.verbosity)?;
                scattered = true;
            }
            None => {
                if config.should_warn() {
                    warn!("reaction-sampling scan produced no MT match; treating as no-event");
                }
            }
        }
    }

    if particle.energy < ENERGY_UNDERFLOW {
        if config.should_warn() {
            warn!("particle {} killed on energy underflow ({:.3e})", particle.id, particle.energy);
        }
        particle.kill();
    }

    particle.last_collision_weight = last_weight;
    particle.last_collision_energy = last_energy;
    particle.last_E_xs = None; // force calculate_xs to refresh (IE, f) next step

    Ok(CollisionOutcome { scattered, fission_daughters_banked: fission_daughters })
}

fn find_elastic(nuc: &Nuclide) -> Result<&Reaction> {
    nuc.reactions.iter().find(|r| r.mt == 2).ok_or(TransportError::ReactionSamplingExhausted)
}

/// Sample among the non-elastic, non-fission reactions (spec §4.7 step 3d):
/// `target` is normalized against the sum of exactly the reactions the loop
/// scans, not the broader `sigma_sc = total - absorption` (which also
/// includes elastic and fission), or draws in the upper tail of `sigma_sc`
/// would exhaust the loop with no match.
fn sample_scatter_reaction<'a>(nuc: &'a Nuclide, ie: usize, f: f64, rng: &mut impl RngStream) -> Result<&'a Reaction> {
    let filtered = || {
        nuc.reactions
            .iter()
            .filter(|r| r.mt != 2 && !FISSION_MTS.contains(&r.mt) && r.mt < GAS_PRODUCTION_MT && r.mt != TOTAL_INELASTIC_MT)
    };
    let sigma_scan: f64 = filtered().map(|r| r.xs_at(ie, f)).sum();
    let xi = rng.rang().0;
    let target = xi * sigma_scan;
    let mut acc = 0.0;
    for rxn in filtered() {
        acc += rxn.xs_at(ie, f);
        if acc > target {
            return Ok(rxn);
        }
    }
    Err(TransportError::ReactionSamplingExhausted)
}

/// Elastic scatter (spec §4.10): boost to the center-of-mass frame assuming
/// the target is at rest, sample the CM scattering cosine, rotate, boost
/// back, and renormalize.
fn elastic_scatter(particle: &mut Particle, nuc: &Nuclide, rxn: &Reaction, rng: &mut impl RngStream, verbosity: u8) -> Result<()> {
    let awr = nuc.awr;
    let speed = particle.energy.sqrt();
    let cm_scale = speed / (awr + 1.0);
    let v_cm = (cm_scale * particle.u, cm_scale * particle.v, cm_scale * particle.w);
    let speed_cm = speed - cm_scale;

    let mu = angle::sample_mu(rxn.angle_dist.as_ref(), particle.energy, rng, verbosity)?;
    let (u2, v2, w2) = rotate_angle(particle.u, particle.v, particle.w, mu, rng);

    let vx = speed_cm * u2 + v_cm.0;
    let vy = speed_cm * v2 + v_cm.1;
    let vz = speed_cm * w2 + v_cm.2;
    let speed_new = (vx * vx + vy * vy + vz * vz).sqrt();

    particle.energy = speed_new * speed_new;
    particle.last_mu = mu;
    if speed_new > 0.0 {
        particle.u = vx / speed_new;
        particle.v = vy / speed_new;
        particle.w = vz / speed_new;
    }
    Ok(())
}

/// Inelastic scatter (spec §4.10): sample `(E_out, mu)` from the reaction's
/// energy distribution (correlated laws 44/61 supply `mu` directly;
/// otherwise fall back to the reaction's own angular distribution), convert
/// from the CM frame when `TY < 0`, rotate, and scale weight by the
/// secondary multiplicity.
fn inelastic_scatter(particle: &mut Particle, nuc: &Nuclide, rxn: &Reaction, rng: &mut impl RngStream, verbosity: u8) -> Result<()> {
    let e_in = particle.energy;
    let (e_sampled, mu_from_law) = match &rxn.energy_dist {
        Some(dist) => dist.sample(e_in, rng, verbosity)?,
        None => (e_in, None),
    };

    let is_correlated_law = matches!(
        rxn.energy_dist,
        Some(crate::energy::EnergyDist::Law44 { .. }) | Some(crate::energy::EnergyDist::Law61 { .. })
    );
    let mu = match mu_from_law {
        Some(m) => m,
        None if is_correlated_law => return Err(TransportError::MissingMuSlot(rxn.mt)),
        None => angle::sample_mu(rxn.angle_dist.as_ref(), e_in, rng, verbosity)?,
    };

    let awr = nuc.awr;
    let (e_lab, mu_lab) = if rxn.is_cm_frame() {
        let e_cm = e_sampled;
        let e_lab = e_cm + (e_in + 2.0 * mu * (awr + 1.0) * (e_in * e_cm).max(0.0).sqrt()) / (awr + 1.0).powi(2);
        let mu_lab = if e_lab > 0.0 {
            mu * (e_cm / e_lab).max(0.0).sqrt() + (e_in / e_lab).max(0.0).sqrt() / (awr + 1.0)
        } else {
            mu
        };
        (e_lab.max(0.0), mu_lab.clamp(-1.0, 1.0))
    } else {
        (e_sampled.max(0.0), mu)
    };

    let (u2, v2, w2) = rotate_angle(particle.u, particle.v, particle.w, mu_lab, rng);
    particle.u = u2;
    particle.v = v2;
    particle.w = w2;
    particle.energy = e_lab;
    particle.last_mu = mu_lab;
    particle.weight *= rxn.multiplicity() as f64;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Material;
    use crate::data::UnionizedGrid;
    use crate::utils::MockRng;

    fn pure_absorber() -> (Material, UnionizedGrid) {
        let grid_index = Nuclide::build_grid_index(&[1.0, 2.0], &[1.0, 2.0]);
        let nuc = Nuclide {
            name: "absorber".into(),
            awr: 10.0,
            energy: vec![1.0, 2.0],
            total_xs: vec![1.0, 1.0],
            elastic_xs: vec![0.0, 0.0],
            absorption_xs: vec![1.0, 1.0],
            fission_xs: vec![],
            reactions: vec![Reaction { mt: 102, threshold_idx: 0, xs: vec![1.0, 1.0], angle_dist: None, energy_dist: None, ty: 0 }],
            fission: None,
            grid_index,
        };
        (Material::new(vec![nuc], vec![1.0]), UnionizedGrid::new(vec![1.0, 2.0]))
    }

    #[test]
    fn pure_absorber_dies_on_first_collision() {
        let (material, grid) = pure_absorber();
        let mut xs = XsCache::new(1);
        let mut p = Particle::new(0, 0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.5, 1.0);
        xs.calculate_xs(&mut p, 0, &material, &grid);
        let config = TransportConfig { survival_biasing: false, ..TransportConfig::default() };
        let mut bank = FissionBank::new(10);
        let mut rng = MockRng::new(vec![0.0, 0.0]);
        collision(&mut p, &material, &xs, &config, &mut bank, &mut rng).unwrap();
        assert!(!p.alive);
        assert!(bank.is_empty());
    }

    #[test]
    fn survival_biasing_scatter_sampling_does_not_exhaust_on_high_xi() {
        // elastic=2, MT18 fission=3, absorption=1, total=10 -> sigma_sc=9 but
        // the non-elastic non-fission reactions (MT 51) only sum to 4. A
        // scatter-reaction draw normalized against the full 9 rather than the
        // scanned 4 would spuriously exhaust for any xi above ~0.44.
        let grid_index = Nuclide::build_grid_index(&[1.0, 2.0], &[1.0, 2.0]);
        let nuc = Nuclide {
            name: "fissionable".into(),
            awr: 235.0,
            energy: vec![1.0, 2.0],
            total_xs: vec![10.0, 10.0],
            elastic_xs: vec![2.0, 2.0],
            absorption_xs: vec![1.0, 1.0],
            fission_xs: vec![3.0, 3.0],
            reactions: vec![
                Reaction { mt: 2, threshold_idx: 0, xs: vec![2.0, 2.0], angle_dist: None, energy_dist: None, ty: -1 },
                Reaction { mt: 18, threshold_idx: 0, xs: vec![3.0, 3.0], angle_dist: None, energy_dist: None, ty: 1 },
                Reaction { mt: 51, threshold_idx: 0, xs: vec![4.0, 4.0], angle_dist: None, energy_dist: None, ty: 1 },
            ],
            fission: None,
            grid_index,
        };
        let material = Material::new(vec![nuc], vec![1.0]);
        let grid = UnionizedGrid::new(vec![1.0, 2.0]);
        let mut xs = XsCache::new(1);
        let mut p = Particle::new(0, 0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.5, 1.0);
        xs.calculate_xs(&mut p, 0, &material, &grid);
        let config = TransportConfig { survival_biasing: true, weight_cutoff: 0.0, ..TransportConfig::default() };
        let mut bank = FissionBank::new(10);
        // weight_cutoff=0.0 skips the roulette branch; xi_scatter=0.95 picks
        // the non-elastic branch, xi_reaction=0.95 used to exhaust the old
        // sigma_sc-normalized scan.
        let mut rng = MockRng::new(vec![0.0, 0.95, 0.95, 0.5, 0.25]);
        let result = collision(&mut p, &material, &xs, &config, &mut bank, &mut rng);
        assert!(result.is_ok());
    }

    #[test]
    fn pure_elastic_awr_one_mu_zero_halves_energy() {
        let grid_index = Nuclide::build_grid_index(&[1.0, 2.0], &[1.0, 2.0]);
        let nuc = Nuclide {
            name: "h1".into(),
            awr: 1.0,
            energy: vec![1.0, 2.0],
            total_xs: vec![1.0, 1.0],
            elastic_xs: vec![1.0, 1.0],
            absorption_xs: vec![0.0, 0.0],
            fission_xs: vec![],
            reactions: vec![Reaction { mt: 2, threshold_idx: 0, xs: vec![1.0, 1.0], angle_dist: None, energy_dist: None, ty: -1 }],
            fission: None,
            grid_index,
        };
        let material = Material::new(vec![nuc], vec![1.0]);
        let grid = UnionizedGrid::new(vec![1.0, 2.0]);
        let mut xs = XsCache::new(1);
        let mut p = Particle::new(0, 0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 1.0);
        xs.calculate_xs(&mut p, 0, &material, &grid);
        let config = TransportConfig { survival_biasing: false, ..TransportConfig::default() };
        let mut bank = FissionBank::new(10);
        // nuclide pick xi, reaction pick xi, mu=2*0.5-1=0, azimuth xi
        let mut rng = MockRng::new(vec![0.0, 0.0, 0.5, 0.25]);
        collision(&mut p, &material, &xs, &config, &mut bank, &mut rng).unwrap();
        assert!((p.energy - 1.0).abs() < 1e-9);
    }
}
