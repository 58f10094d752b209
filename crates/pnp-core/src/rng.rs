//! Deterministic per-lane and run-level RNG wrappers.
//!
//! # Determinism strategy
//!
//! Each in-feed lane gets its own independent `SmallRng` seeded by:
//!
//!   seed = run_seed XOR (stream * MIXING_CONSTANT)
//!
//! where `stream` is the lane index plus one and the mixing constant is the
//! 64-bit fractional part of the golden ratio.  Out-feed package groups are
//! laid out deterministically and draw nothing.  Adding a lane never disturbs
//! the item stream of the others, and the whole run is reproducible from one
//! seed.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::LaneId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

// ── LaneRng ───────────────────────────────────────────────────────────────────

/// Per-lane deterministic RNG used for item jitter and bad-item draws.
pub struct LaneRng(SmallRng);

impl LaneRng {
    /// Seed an in-feed lane's stream.
    pub fn in_feed(run_seed: u64, lane: LaneId) -> Self {
        Self::from_stream(run_seed, lane.0 as u64 + 1)
    }

    fn from_stream(run_seed: u64, stream: u64) -> Self {
        let seed = run_seed ^ stream.wrapping_mul(MIXING_CONSTANT);
        LaneRng(SmallRng::seed_from_u64(seed))
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// One normally distributed sample with mean 0 (Box–Muller).
    ///
    /// Returns exactly 0.0 when `std_dev <= 0` without consuming randomness.
    pub fn gaussian(&mut self, std_dev: f64) -> f64 {
        if std_dev <= 0.0 {
            return 0.0;
        }
        // u1 ∈ (0, 1] so the logarithm stays finite.
        let u1: f64 = 1.0 - self.0.r#gen::<f64>();
        let u2: f64 = self.0.r#gen::<f64>();
        std_dev * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// Batch-level RNG: draws the per-run seeds of a multi-run batch.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Next run seed, kept within 32 bits so it prints and re-enters cleanly.
    #[inline]
    pub fn next_run_seed(&mut self) -> u64 {
        self.0.r#gen::<u32>() as u64
    }
}
