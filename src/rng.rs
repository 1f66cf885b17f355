//=====================================================================
// Uniform [0,1) draws for the transport core.
//
// The core never picks a PRNG algorithm itself (RNG-engine implementation is
// out of scope, see spec §1) — it only needs a stream of independent,
// reproducible draws per history. `RngStream` is the trait the rest of the
// core is generic over; `StdRngStream` is the production implementation
// wrapping any `rand::RngCore`, and `utils::MockRng` (via its own impl below)
// lets tests script an exact sequence of draws to hit specific branches of
// the law/angle dispatch tables.
//=====================================================================

use rand::{RngCore, SeedableRng};
use rand::rngs::StdRng;

use crate::unitf64::UnitF64;
use crate::utils::MockRng;

pub trait RngStream {
    /// Draw a uniform variate in [0, 1).
    fn rang(&mut self) -> UnitF64;
}

/// Production RNG stream: wraps any `rand::RngCore` and draws via its
/// standard uniform-float generator.
pub struct StdRngStream<R: RngCore> {
    inner: R,
}

impl<R: RngCore> StdRngStream<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl StdRngStream<StdRng> {
    /// Derive a reproducible per-history substream from a run seed and a
    /// history id. Each worker owns one `Particle` at a time, so one
    /// substream per history is sufficient to guarantee the reproducibility
    /// property in spec §8 (same seed + same history id -> bit-identical
    /// particle state and fission-bank contents).
    pub fn new_substream(seed: u64, history_id: u64) -> Self {
        // splitmix64-style decorrelation so adjacent history ids don't
        // produce adjacent (and thus correlated) StdRng seeds.
        let mut z = seed.wrapping_add(history_id.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        Self::new(StdRng::seed_from_u64(z))
    }
}

impl<R: RngCore> RngStream for StdRngStream<R> {
    fn rang(&mut self) -> UnitF64 {
        use rand::Rng;
        UnitF64::new_unchecked(self.inner.r#gen::<f64>())
    }
}

impl RngStream for MockRng {
    /// Replay the exact scripted float, bypassing `rand`'s uniform-float
    /// algorithm so tests can assert on specific sampled outcomes.
    fn rang(&mut self) -> UnitF64 {
        UnitF64::new_unchecked(f64::from_bits(self.next_u64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_rng_stream_draws_are_in_unit_interval() {
        let mut stream = StdRngStream::new_substream(42, 7);
        for _ in 0..10_000 {
            let x = stream.rang().0;
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn reproducible_given_same_seed_and_history_id() {
        let mut a = StdRngStream::new_substream(1, 99);
        let mut b = StdRngStream::new_substream(1, 99);
        for _ in 0..100 {
            assert_eq!(a.rang().0, b.rang().0);
        }
    }

    #[test]
    fn different_history_ids_decorrelate() {
        let mut a = StdRngStream::new_substream(1, 1);
        let mut b = StdRngStream::new_substream(1, 2);
        let seq_a: Vec<f64> = (0..20).map(|_| a.rang().0).collect();
        let seq_b: Vec<f64> = (0..20).map(|_| b.rang().0).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn mock_rng_replays_scripted_values() {
        let mut mock = MockRng::new(vec![0.1, 0.2, 0.3]);
        assert_eq!(mock.rang().0, 0.1);
        assert_eq!(mock.rang().0, 0.2);
        assert_eq!(mock.rang().0, 0.3);
    }
}
