//=====================================================================
// XsCache (spec §4.6): per-nuclide microscopic cross sections and the
// aggregated per-material macroscopic cross section at a particle's current
// energy, with the fixed short-circuit cache.
//
// Grounded in the teacher's `api::cross_section::CrossSection` (the
// energy-grid-plus-parallel-array shape) and `blocks::esz` (the
// total/elastic/absorption/fission layout this mirrors). The caching
// strategy is new: the teacher is a parser with no notion of a hot sampling
// loop, so there is nothing to adapt for "per-worker scratch cache," only
// the underlying per-nuclide data shape to reuse.
//=====================================================================

use crate::data::{Material, Particle, UnionizedGrid};

#[derive(Debug, Clone, Default)]
pub struct MicroEntry {
    pub total: f64,
    pub elastic: f64,
    pub absorption: f64,
    pub fission: f64,
    pub nu_fission: f64,
    pub index_grid: usize,
    pub interp_factor: f64,
}

#[derive(Debug, Clone, Default)]
pub struct MacroXs {
    pub total: f64,
    pub elastic: f64,
    pub absorption: f64,
    pub fission: f64,
    pub nu_fission: f64,
}

/// Per-worker scratch: one `MicroEntry` per nuclide in the problem, overwritten
/// on every `calculate_xs` call (spec §3 `MicroXsCache`), plus the last
/// aggregated `MacroXs` this worker computed.
#[derive(Debug, Clone, Default)]
pub struct XsCache {
    pub micro: Vec<MicroEntry>,
    macro_xs: MacroXs,
}

impl XsCache {
    pub fn new(n_nuclides_total: usize) -> Self {
        Self {
            micro: vec![MicroEntry::default(); n_nuclides_total],
            macro_xs: MacroXs::default(),
        }
    }

    /// Compute (or reuse) the macroscopic cross section for `particle` in
    /// `material`, identified by `material_id`. The short-circuit compares
    /// *both* `material` and the particle's energy against the values cached
    /// at the last call — comparing material alone would silently reuse
    /// stale cross sections across a collision that changes energy but not
    /// material.
    pub fn calculate_xs(&mut self, particle: &mut Particle, material_id: usize, material: &Material, grid: &UnionizedGrid) -> &MacroXs {
        if particle.last_material == Some(material_id) && particle.last_E_xs == Some(particle.energy) {
            return &self.macro_xs;
        }

        let mut agg = MacroXs::default();
        let ie = grid.locate(particle.energy);

        for (nuc_idx, (nuc, &density)) in material.nuclides.iter().zip(material.densities.iter()).enumerate() {
            let (ie_n, f) = nuc.micro_index(ie, particle.energy);
            let total = lerp(&nuc.total_xs, ie_n, f);
            let elastic = lerp(&nuc.elastic_xs, ie_n, f);
            let absorption = lerp(&nuc.absorption_xs, ie_n, f);
            let (fission, nu_fission) = if let Some(fission_data) = &nuc.fission {
                let sigma_f = lerp(&nuc.fission_xs, ie_n, f);
                (sigma_f, fission_data.nu_total.evaluate(particle.energy) * sigma_f)
            } else {
                (0.0, 0.0)
            };

            if let Some(entry) = self.micro.get_mut(nuc_idx) {
                *entry = MicroEntry { total, elastic, absorption, fission, nu_fission, index_grid: ie_n, interp_factor: f };
            }

            agg.total += density * total;
            agg.elastic += density * elastic;
            agg.absorption += density * absorption;
            agg.fission += density * fission;
            agg.nu_fission += density * nu_fission;
        }

        particle.last_material = Some(material_id);
        particle.last_E_xs = Some(particle.energy);
        self.macro_xs = agg;
        &self.macro_xs
    }
}

fn lerp(xs: &[f64], ie: usize, f: f64) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    if ie + 1 >= xs.len() {
        return *xs.last().unwrap();
    }
    xs[ie] + f * (xs[ie + 1] - xs[ie])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FissionData, NuFormulation, Nuclide};

    fn nuclide(energy: Vec<f64>, total: Vec<f64>) -> Nuclide {
        let grid_index = Nuclide::build_grid_index(&energy, &energy);
        Nuclide {
            name: "n".into(),
            awr: 1.0,
            energy,
            total_xs: total.clone(),
            elastic_xs: total.clone(),
            absorption_xs: vec![0.0; total.len()],
            fission_xs: vec![],
            reactions: vec![],
            fission: None,
            grid_index,
        }
    }

    #[test]
    fn macro_is_sum_of_density_weighted_micro() {
        let grid = UnionizedGrid::new(vec![1.0, 2.0, 3.0]);
        let nuc = nuclide(vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]);
        let material = Material::new(vec![nuc], vec![0.5]);
        let mut cache = XsCache::new(1);
        let mut p = Particle::new(0, 0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 1.0);
        let result = cache.calculate_xs(&mut p, 0, &material, &grid);
        assert_eq!(result.total, 0.5 * 20.0);
    }

    #[test]
    fn short_circuit_requires_both_material_and_energy_match() {
        let grid = UnionizedGrid::new(vec![1.0, 2.0, 3.0]);
        let nuc = nuclide(vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]);
        let material = Material::new(vec![nuc.clone()], vec![1.0]);
        let material2 = Material::new(vec![nuc], vec![2.0]);
        let mut cache = XsCache::new(1);
        let mut p = Particle::new(0, 0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 1.0);

        let first = cache.calculate_xs(&mut p, 0, &material, &grid).total;
        assert_eq!(first, 20.0);

        // Same material, energy changed by a collision -- must recompute.
        p.energy = 1.0;
        let second = cache.calculate_xs(&mut p, 0, &material, &grid).total;
        assert_eq!(second, 10.0);

        // Energy unchanged, material id changed -- must recompute, not reuse
        // the cached value from a different material.
        let third = cache.calculate_xs(&mut p, 1, &material2, &grid).total;
        assert_eq!(third, 2.0 * 10.0);
    }

    #[test]
    fn fission_nuclide_contributes_nu_fission() {
        let grid = UnionizedGrid::new(vec![1.0, 2.0]);
        let grid_index = Nuclide::build_grid_index(&[1.0, 2.0], &[1.0, 2.0]);
        let nuc = Nuclide {
            name: "u235".into(),
            awr: 235.0,
            energy: vec![1.0, 2.0],
            total_xs: vec![10.0, 10.0],
            elastic_xs: vec![2.0, 2.0],
            absorption_xs: vec![1.0, 1.0],
            fission_xs: vec![3.0, 3.0],
            reactions: vec![],
            fission: Some(FissionData::new(
                NuFormulation::Polynomial(vec![2.5]),
                NuFormulation::Polynomial(vec![2.5]),
                vec![],
                crate::energy::EnergyDist::Law7 {
                    temperature: crate::interpolation::Tab1::new(vec![0.0, 10.0], vec![1.3, 1.3], crate::interpolation::InterpolationScheme::LinLin).unwrap(),
                },
                &[],
            )),
            grid_index,
        };
        let material = Material::new(vec![nuc], vec![1.0]);
        let mut cache = XsCache::new(1);
        let mut p = Particle::new(0, 0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.5, 1.0);
        let result = cache.calculate_xs(&mut p, 0, &material, &grid);
        assert_eq!(result.fission, 3.0);
        assert_eq!(result.nu_fission, 2.5 * 3.0);
    }
}
