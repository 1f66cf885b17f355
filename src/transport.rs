//=====================================================================
// Transport (spec §4.8): the top-level per-particle loop, plus the
// `Geometry`/`Tally` collaborator traits the core consumes but does not
// implement (spec §6 — geometry and tallying are the driver's business).
//=====================================================================

use crate::collision::collision;
use crate::config::TransportConfig;
use crate::data::{Material, Particle, UnionizedGrid};
use crate::error::{Result, TransportError};
use crate::fission::FissionBank;
use crate::rng::RngStream;
use crate::xs::XsCache;

/// Geometric collaborator the core consumes; a real implementation resolves
/// cells, surfaces, and lattices (out of scope here, spec §1).
pub trait Geometry {
    /// Locate the particle's starting cell from its position. `false` means
    /// the particle could not be placed in any cell (fatal per spec §7).
    fn find_cell(&mut self, particle: &mut Particle) -> bool;
    /// Distance to the nearest boundary, the surface crossed, and whether
    /// that boundary is a lattice boundary.
    fn dist_to_boundary(&self, particle: &Particle) -> (f64, Option<u32>, bool);
    fn cross_surface(&mut self, particle: &mut Particle, last_cell: usize);
    fn cross_lattice(&mut self, particle: &mut Particle);
    /// Material index backing the particle's current cell.
    fn material_id(&self, cell: usize) -> usize;
}

/// Tally collaborator the core informs of every collision event.
pub trait Tally {
    fn score_tally(&mut self, particle: &Particle, scattered: bool);
}

#[allow(clippy::too_many_arguments)]
pub fn transport(
    particle: &mut Particle,
    materials: &[Material],
    grid: &UnionizedGrid,
    geometry: &mut impl Geometry,
    xs: &mut XsCache,
    config: &TransportConfig,
    bank: &mut FissionBank,
    tally: &mut impl Tally,
    rng: &mut impl RngStream,
) -> Result<()> {
    if particle.cell == 0 && !geometry.find_cell(particle) {
        return Err(TransportError::ParticleNotLocated);
    }
    particle.birth_cell = particle.cell;

    while particle.alive {
        let material_id = geometry.material_id(particle.cell);
        let material = &materials[material_id];
        let sigma_t = xs.calculate_xs(particle, material_id, material, grid).total;

        let (d_boundary, _surface, in_lattice) = geometry.dist_to_boundary(particle);
        let xi = rng.rang().0;
        let d_collision = if sigma_t > 0.0 { -xi.ln() / sigma_t } else { f64::INFINITY };
        let d = d_boundary.min(d_collision);
        particle.advance(d);

        if d_collision > d_boundary {
            let last_cell = particle.cell;
            if in_lattice {
                geometry.cross_lattice(particle);
            } else {
                geometry.cross_surface(particle, last_cell);
            }
            if !particle.alive {
                break;
            }
        } else {
            let outcome = collision(particle, material, xs, config, bank, rng)?;
            if config.tallies_on {
                tally.score_tally(particle, outcome.scattered);
            }
        }
    }
    Ok(())
}
