//=====================================================================
// Shared data model (spec §3): Particle, Nuclide, Reaction, Material, and
// the unionized energy grid.
//
// Grounded in the teacher's `api::isotope::Isotope`, `api::reaction::Reaction`,
// and `api::cross_section::CrossSection` (field names and the
// energy-grid-plus-parallel-xs-array shape are kept), enriched with the
// nu-bar/delayed-neutron/yield shapes from `blocks::nu`, `blocks::dnu`,
// `blocks::bdd`, and `blocks::tyr` (here folded into `FissionData` and
// `Reaction::ty` rather than kept as standalone ACE-block structs, since the
// ACE-file-layout framing those blocks were named after is out of scope here).
//=====================================================================

use crate::angle::AngleDist;
use crate::energy::EnergyDist;
use crate::interpolation::{binary_search, Tab1};

/// ENDF MT identifiers for the fission family: total fission (18) plus the
/// partial first-/second-/third-/fourth-chance and long-range channels.
pub const FISSION_MTS: [u32; 5] = [18, 19, 20, 21, 38];

/// A single evaluated reaction channel on a nuclide (spec §3 `Reaction`).
#[derive(Debug, Clone)]
pub struct Reaction {
    /// ENDF reaction identifier, e.g. 2 (elastic), 18 (fission), 102 (capture).
    pub mt: u32,
    /// Threshold index into the nuclide's own energy grid; `xs[0]` corresponds
    /// to `nuclide.energy[threshold_idx]`.
    pub threshold_idx: usize,
    pub xs: Vec<f64>,
    pub angle_dist: Option<AngleDist>,
    pub energy_dist: Option<EnergyDist>,
    /// TY: signed yield/frame encoding. Sign gives the frame (negative = CM,
    /// positive/zero = LAB), magnitude gives the exiting-neutron multiplicity.
    pub ty: i32,
}

impl Reaction {
    pub fn is_cm_frame(&self) -> bool {
        self.ty < 0
    }

    pub fn multiplicity(&self) -> u32 {
        self.ty.unsigned_abs().max(1)
    }

    /// Microscopic cross section for this reaction at grid index `ie`
    /// (already located on the nuclide's own grid), or 0 below threshold.
    pub fn xs_at(&self, ie: usize, interp: f64) -> f64 {
        if ie < self.threshold_idx || self.xs.is_empty() {
            return 0.0;
        }
        let local = ie - self.threshold_idx;
        if local + 1 >= self.xs.len() {
            return *self.xs.last().unwrap_or(&0.0);
        }
        let (x0, x1) = (self.xs[local], self.xs[local + 1]);
        x0 + interp * (x1 - x0)
    }
}

/// Polynomial or tabulated total-nu-bar representation (spec §3 `NuFormulation`).
#[derive(Debug, Clone)]
pub enum NuFormulation {
    Polynomial(Vec<f64>),
    Tabulated(Tab1),
}

impl NuFormulation {
    pub fn evaluate(&self, e: f64) -> f64 {
        match self {
            NuFormulation::Polynomial(coeffs) => {
                coeffs.iter().rev().fold(0.0, |acc, &c| acc * e + c)
            }
            NuFormulation::Tabulated(table) => table.interpolate(e).unwrap_or(0.0),
        }
    }
}

/// A delayed-neutron precursor group: decay constant plus its share of the
/// total delayed yield as a function of incoming energy (spec §3).
#[derive(Debug, Clone)]
pub struct PrecursorGroup {
    pub decay_constant: f64,
    pub yield_fraction: Tab1,
    pub energy_dist: EnergyDist,
}

#[derive(Debug, Clone)]
pub struct FissionData {
    pub nu_prompt: NuFormulation,
    pub nu_total: NuFormulation,
    pub precursors: Vec<PrecursorGroup>,
    pub chi_prompt: EnergyDist,
    /// Number of reaction channels on the owning nuclide at the time this
    /// fission data was built (spec §3 `n_reaction`).
    pub n_reaction: usize,
    /// Index into the owning `Nuclide::reactions` of the channel to bank
    /// fission sites against: the total-fission MT 18 entry if present,
    /// otherwise the first partial-fission channel (spec §3 `index_fission`).
    pub index_fission: Option<usize>,
    /// Whether the owning nuclide has no MT 18 entry and fissions only
    /// through partial channels (MT 19/20/21/38) (spec §3 `has_partial_fission`).
    pub has_partial_fission: bool,
}

impl FissionData {
    /// Build fission metadata, locating `index_fission`/`has_partial_fission`
    /// from the owning nuclide's reaction list rather than assuming MT 18
    /// is always present.
    pub fn new(
        nu_prompt: NuFormulation,
        nu_total: NuFormulation,
        precursors: Vec<PrecursorGroup>,
        chi_prompt: EnergyDist,
        reactions: &[Reaction],
    ) -> Self {
        let index_total = reactions.iter().position(|r| r.mt == 18);
        let index_fission = index_total.or_else(|| reactions.iter().position(|r| FISSION_MTS.contains(&r.mt)));
        let has_partial_fission = index_total.is_none() && index_fission.is_some();
        Self {
            nu_prompt,
            nu_total,
            precursors,
            chi_prompt,
            n_reaction: reactions.len(),
            index_fission,
            has_partial_fission,
        }
    }

    pub fn nu_delayed(&self, e: f64) -> f64 {
        self.nu_total.evaluate(e) - self.nu_prompt.evaluate(e)
    }
}

/// The shared grid (spec §3 `UnionizedGrid`) every nuclide in a problem is
/// reindexed against, so `XsCache` locates an energy once per material
/// rather than once per nuclide.
#[derive(Debug, Clone)]
pub struct UnionizedGrid {
    pub e_grid: Vec<f64>,
}

impl UnionizedGrid {
    pub fn new(e_grid: Vec<f64>) -> Self {
        Self { e_grid }
    }

    /// Locate `e`, clamping at the domain ends per spec §4.6 rather than
    /// erroring: below the first point returns index 0 (the downstream
    /// interpolation factor comes out negative), above the last point
    /// returns `n_grid - 2` (factor comes out > 1).
    pub fn locate(&self, e: f64) -> usize {
        let n = self.e_grid.len();
        if e < self.e_grid[0] {
            return 0;
        }
        if e > self.e_grid[n - 1] {
            return n - 2;
        }
        binary_search(&self.e_grid, e)
    }
}

/// One nuclide's full evaluated data set (spec §3 `Nuclide`).
#[derive(Debug, Clone)]
pub struct Nuclide {
    pub name: String,
    pub awr: f64,
    pub energy: Vec<f64>,
    pub total_xs: Vec<f64>,
    pub elastic_xs: Vec<f64>,
    pub absorption_xs: Vec<f64>,
    pub fission_xs: Vec<f64>,
    pub reactions: Vec<Reaction>,
    pub fission: Option<FissionData>,
    /// Monotone non-decreasing map from a unionized-grid index to this
    /// nuclide's own grid index (spec §3 `grid_index[]`), built once at load.
    pub grid_index: Vec<usize>,
}

impl Nuclide {
    /// Build the `grid_index[]` map for a unionized grid against this
    /// nuclide's own energy grid (spec §3 invariant:
    /// `E_n[grid_index[k]] <= e_grid[k] < E_n[grid_index[k]+1]`, clamped).
    pub fn build_grid_index(e_grid: &[f64], e_n: &[f64]) -> Vec<usize> {
        e_grid.iter().map(|&e| binary_search(e_n, e)).collect()
    }

    /// Locate `e` on this nuclide's own grid directly, returning (index,
    /// interpolation fraction into the next point). Used where no unionized
    /// grid is in play (spec §4.2).
    pub fn locate(&self, e: f64) -> (usize, f64) {
        let i = binary_search(&self.energy, e);
        let (e0, e1) = (self.energy[i], self.energy[i + 1]);
        let frac = if e1 > e0 { ((e - e0) / (e1 - e0)).clamp(0.0, 1.0) } else { 0.0 };
        (i, frac)
    }

    /// Translate a unionized-grid index into this nuclide's own (index,
    /// interpolation fraction) pair (spec §4.6 step "translate unionized
    /// index to nuclide-own index").
    pub fn micro_index(&self, ie_unionized: usize, e: f64) -> (usize, f64) {
        let ie_n = self.grid_index[ie_unionized];
        let e0 = self.energy[ie_n];
        let e1 = self.energy.get(ie_n + 1).copied().unwrap_or(e0);
        let f = if e1 > e0 { (e - e0) / (e1 - e0) } else { 0.0 };
        (ie_n, f)
    }

    fn interp_at(xs: &[f64], ie: usize, interp: f64) -> f64 {
        if xs.is_empty() {
            return 0.0;
        }
        if ie + 1 >= xs.len() {
            return *xs.last().unwrap();
        }
        xs[ie] + interp * (xs[ie + 1] - xs[ie])
    }

    pub fn total_at(&self, ie: usize, interp: f64) -> f64 {
        Self::interp_at(&self.total_xs, ie, interp)
    }

    pub fn elastic_at(&self, ie: usize, interp: f64) -> f64 {
        Self::interp_at(&self.elastic_xs, ie, interp)
    }

    pub fn absorption_at(&self, ie: usize, interp: f64) -> f64 {
        Self::interp_at(&self.absorption_xs, ie, interp)
    }

    pub fn fission_at(&self, ie: usize, interp: f64) -> f64 {
        Self::interp_at(&self.fission_xs, ie, interp)
    }

    pub fn is_fissionable(&self) -> bool {
        self.fission.is_some()
    }

    /// Locate the reaction channel to bank fission sites against (spec §3
    /// `index_fission`): works whether the nuclide's only fission channel is
    /// total (MT 18) or partial (MT 19/20/21/38).
    pub fn fission_reaction(&self) -> Option<&Reaction> {
        let idx = self.fission.as_ref()?.index_fission?;
        self.reactions.get(idx)
    }
}

/// A homogeneous material: the nuclides present and their atom densities
/// (atoms/barn-cm), indexed in parallel (spec §3 `Material`).
#[derive(Debug, Clone)]
pub struct Material {
    pub nuclides: Vec<Nuclide>,
    pub densities: Vec<f64>,
}

impl Material {
    pub fn new(nuclides: Vec<Nuclide>, densities: Vec<f64>) -> Self {
        assert_eq!(nuclides.len(), densities.len(), "one density per nuclide");
        Self { nuclides, densities }
    }
}

/// A neutron's full mutable transport state (spec §3 `Particle`).
#[derive(Debug, Clone)]
pub struct Particle {
    pub id: u64,
    pub birth_cell: usize,

    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub u: f64,
    pub v: f64,
    pub w: f64,
    pub energy: f64,
    pub weight: f64,
    pub alive: bool,

    pub cell: usize,
    pub material: usize,

    /// Cache of the last material this particle computed a macroscopic total
    /// cross section for, paired with the energy it was computed at — the
    /// basis for the spec §4.6 `calculate_xs` short-circuit.
    pub last_material: Option<usize>,
    pub last_E_xs: Option<f64>,

    pub n_collisions: u32,
    pub last_collision_weight: f64,
    pub last_collision_energy: f64,
    pub last_mu: f64,
}

impl Particle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(id: u64, birth_cell: usize, x: f64, y: f64, z: f64, u: f64, v: f64, w: f64, energy: f64, weight: f64) -> Self {
        Self {
            id,
            birth_cell,
            x,
            y,
            z,
            u,
            v,
            w,
            energy,
            weight,
            alive: true,
            cell: birth_cell,
            material: 0,
            last_material: None,
            last_E_xs: None,
            n_collisions: 0,
            last_collision_weight: weight,
            last_collision_energy: energy,
            last_mu: 0.0,
        }
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }

    pub fn advance(&mut self, distance: f64) {
        self.x += self.u * distance;
        self.y += self.v * distance;
        self.z += self.w * distance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nu_polynomial_evaluates_at_zero_and_one() {
        let nu = NuFormulation::Polynomial(vec![2.0, 0.5]);
        assert_eq!(nu.evaluate(0.0), 2.0);
        assert_eq!(nu.evaluate(1.0), 2.5);
    }

    #[test]
    fn fission_reaction_falls_back_to_partial_channel_without_mt18() {
        let reactions = vec![
            Reaction { mt: 2, threshold_idx: 0, xs: vec![], angle_dist: None, energy_dist: None, ty: -1 },
            Reaction { mt: 19, threshold_idx: 0, xs: vec![1.0], angle_dist: None, energy_dist: None, ty: 1 },
        ];
        let fission = FissionData::new(
            NuFormulation::Polynomial(vec![2.5]),
            NuFormulation::Polynomial(vec![2.5]),
            vec![],
            EnergyDist::Law5,
            &reactions,
        );
        assert!(fission.has_partial_fission);
        assert_eq!(fission.index_fission, Some(1));

        let nuc = Nuclide {
            name: "partial-fissioner".into(),
            awr: 1.0,
            energy: vec![1.0, 2.0],
            total_xs: vec![],
            elastic_xs: vec![],
            absorption_xs: vec![],
            fission_xs: vec![],
            reactions,
            fission: Some(fission),
            grid_index: vec![],
        };
        assert!(nuc.is_fissionable());
        assert_eq!(nuc.fission_reaction().map(|r| r.mt), Some(19));
    }

    #[test]
    fn reaction_xs_is_zero_below_threshold() {
        let r = Reaction {
            mt: 16,
            threshold_idx: 3,
            xs: vec![0.1, 0.2, 0.3],
            angle_dist: None,
            energy_dist: None,
            ty: 2,
        };
        assert_eq!(r.xs_at(0, 0.0), 0.0);
        assert_eq!(r.xs_at(3, 0.0), 0.1);
    }

    #[test]
    fn ty_sign_encodes_frame_and_magnitude_encodes_multiplicity() {
        let elastic = Reaction { mt: 2, threshold_idx: 0, xs: vec![], angle_dist: None, energy_dist: None, ty: -1 };
        assert!(elastic.is_cm_frame());
        assert_eq!(elastic.multiplicity(), 1);

        let n2n = Reaction { mt: 16, threshold_idx: 0, xs: vec![], angle_dist: None, energy_dist: None, ty: 2 };
        assert!(!n2n.is_cm_frame());
        assert_eq!(n2n.multiplicity(), 2);
    }

    #[test]
    fn nuclide_locate_clamps_and_interpolates() {
        let nuc = Nuclide {
            name: "test".into(),
            awr: 1.0,
            energy: vec![1.0, 2.0, 3.0],
            total_xs: vec![10.0, 20.0, 30.0],
            elastic_xs: vec![],
            absorption_xs: vec![],
            fission_xs: vec![],
            reactions: vec![],
            fission: None,
            grid_index: vec![],
        };
        let (ie, frac) = nuc.locate(1.5);
        assert_eq!(ie, 0);
        assert_eq!(frac, 0.5);
        assert_eq!(nuc.total_at(ie, frac), 15.0);
    }

    #[test]
    fn particle_advance_moves_along_direction() {
        let mut p = Particle::new(0, 0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0);
        p.advance(2.0);
        assert_eq!((p.x, p.y, p.z), (2.0, 0.0, 0.0));
    }
}
