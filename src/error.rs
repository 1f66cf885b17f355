//=====================================================================
// Error taxonomy for the transport core (spec §7).
//
// The teacher (`pace-rs`) declares `thiserror` as a dependency but never
// puts it to use, instead hand-rolling `Display + Error` per error type
// (`AngularDistributionError`, `InterpolationError`). This core collects
// every *fatal* condition into one `thiserror`-derived enum so a caller can
// match on the specific failure; *recoverable* conditions (sampled |µ| > 1,
// an unmodelled reaction MT, a very-low-energy kill) are not errors at all —
// they are logged via `log::warn!` and the walk continues, matching the
// spec's three-way split into fatal / recoverable / silent.
//=====================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("particle could not be located in the geometry at birth")]
    ParticleNotLocated,

    #[error("cumulative nuclide-sampling scan exhausted without a hit (Sigma_t inconsistent with microscopic values): xi={xi}, accumulated={accumulated}, sigma_t={sigma_t}")]
    NuclideSamplingExhausted { xi: f64, accumulated: f64, sigma_t: f64 },

    #[error("cumulative reaction-sampling scan exhausted without a hit")]
    ReactionSamplingExhausted,

    #[error("tabulated function has NR={nr} interpolation regions; only NR <= 1 is supported")]
    TooManyInterpolationRegions { nr: usize },

    #[error("energy distribution law {law} requires a discrete-line flag (ND) of 0, got ND={nd}")]
    DiscreteLinesUnsupported { law: u32, nd: u32 },

    #[error("unknown interpolation code {code}")]
    UnknownInterpolationCode { code: usize },

    #[error("unknown angular distribution type tag")]
    UnknownAngularDistributionType,

    #[error("energy distribution law {0} is a recognized but unimplemented extension point")]
    UnimplementedLaw(u32),

    #[error("energy distribution law {0} requires a mu output slot and none was supplied")]
    MissingMuSlot(u32),

    #[error("interpolation table is empty")]
    EmptyTable,

    #[error("value {x} is out of the table's domain [{lo}, {hi}]")]
    OutOfDomain { x: f64, lo: f64, hi: f64 },
}

pub type Result<T> = std::result::Result<T, TransportError>;
