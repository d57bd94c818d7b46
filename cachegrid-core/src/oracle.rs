//! Deterministic hash oracle — the world's only source of randomness.
//!
//! `luck(key)` maps any string key to a reproducible value in `[0, 1)`:
//!
//! ```text
//!   h = FNV-1a-64(key bytes)
//!   z = SplitMix64-finalize(h)
//!   luck = (z >> 11) / 2^53
//! ```
//!
//! There is no seeding step and no state; the same key gives the same value
//! in every process on every platform. The world is therefore regenerated
//! from coordinates alone, and only cells the player has touched cost any
//! storage. The layout of the world is defined by this hash alone: a
//! different luck function (a seeded PRNG, say) would place caches
//! elsewhere, and the pinned values in the tests below guard against that.
//!
//! Two independent streams are derived per cell by composing different keys:
//! `"<i>,<j>"` decides whether a cache spawns, `"<i>,<j>,initialCoins"`
//! decides how many tokens it starts with. Keys are unambiguous per
//! coordinate, so two cells can never share a decision by construction.
//!
//! **Critical constraint: determinism.** Only integer wrapping arithmetic is
//! used before the final scaling, which is exact for 53-bit integers.

use serde::{Deserialize, Serialize};

use crate::types::Cell;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Suffix distinguishing the initial-token stream from the spawn stream.
pub const INITIAL_TOKENS_TAG: &str = "initialCoins";

/// 64-bit FNV-1a over the key's UTF-8 bytes.
#[must_use]
pub fn fnv1a64(key: &str) -> u64 {
    key.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// SplitMix64 output function, used as an avalanche finalizer.
#[must_use]
pub const fn splitmix64_mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Deterministic pseudo-random value in `[0, 1)` for `key`.
///
/// Uses the upper 53 bits of the mixed hash to fill an `f64` mantissa.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn luck(key: &str) -> f64 {
    let z = splitmix64_mix(fnv1a64(key));
    (z >> 11) as f64 / (1u64 << 53) as f64
}

/// Key for the "does this cell spawn a cache" decision.
#[must_use]
pub fn spawn_key(cell: Cell) -> String {
    format!("{},{}", cell.i, cell.j)
}

/// Key for the "how many tokens does this cache start with" decision.
#[must_use]
pub fn initial_tokens_key(cell: Cell) -> String {
    format!("{},{},{INITIAL_TOKENS_TAG}", cell.i, cell.j)
}

// ---------------------------------------------------------------------------
// SpawnRule
// ---------------------------------------------------------------------------

/// The world-generation rule: which cells hold caches and how full they start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRule {
    /// A cell spawns a cache when its spawn luck is strictly below this.
    pub spawn_probability: f64,
    /// Upper bound (inclusive) of the initial token count; the lower bound is 1.
    pub max_initial_tokens: u32,
}

impl Default for SpawnRule {
    fn default() -> Self {
        Self {
            spawn_probability: 0.1,
            max_initial_tokens: 5,
        }
    }
}

impl SpawnRule {
    /// Create a rule.
    #[must_use]
    pub const fn new(spawn_probability: f64, max_initial_tokens: u32) -> Self {
        Self {
            spawn_probability,
            max_initial_tokens,
        }
    }

    /// Whether `cell` holds a cache.
    #[must_use]
    pub fn spawns(&self, cell: Cell) -> bool {
        luck(&spawn_key(cell)) < self.spawn_probability
    }

    /// Number of tokens a freshly generated cache at `cell` starts with,
    /// in `1..=max_initial_tokens`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn initial_tokens(&self, cell: Cell) -> u32 {
        let max = self.max_initial_tokens.max(1);
        let drawn = (luck(&initial_tokens_key(cell)) * f64::from(max)).floor() as u32;
        drawn.min(max - 1) + 1
    }
}
