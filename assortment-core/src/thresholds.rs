//! Centralized constants for assortment variation and store geometry.
//!
//! These are the defaults behind the config structs in `config.rs`.
//! Changing a value here changes generated output for every store, so
//! any change invalidates previously published assortment snapshots.

/// Offset added to the character-code sum when seeding a store's RNG.
pub const RNG_SEED_OFFSET: f64 = 12345.0;

/// Scale applied to `sin(s)` in the RNG recurrence.
pub const RNG_SINE_SCALE: f64 = 10000.0;

/// Lower bound of the base variation fraction.
pub const BASE_VARIATION_MIN: f64 = 0.10;

/// Width of the base variation range (`[0.10, 0.15)`).
pub const BASE_VARIATION_SPREAD: f64 = 0.05;

/// Extra variation granted to tier3 templates.
pub const TIER3_VARIATION_BONUS: f64 = 0.05;

/// Probability that an eligible discounter store takes its aspirational SKU.
pub const ASPIRATIONAL_PROBABILITY: f64 = 0.05;

/// Extra candidates beyond `num_swaps` in the swap pool.
pub const SWAP_POOL_BUFFER: usize = 5;

/// Expected within-group overlap band (percent).
pub const CONSISTENCY_MIN_PCT: f64 = 80.0;
pub const CONSISTENCY_MAX_PCT: f64 = 90.0;

/// Diversity ratio below which a group's SKU pool is too narrow.
pub const DIVERSITY_NARROW: f64 = 1.2;
/// Diversity ratio above which a group's SKU pool is too wide.
pub const DIVERSITY_WIDE: f64 = 1.8;

/// Tier share targets (percent).
pub const PREMIUM_RETAILER_MIN_PREMIUM: f64 = 35.0;
pub const VALUE_RETAILER_MIN_VALUE: f64 = 60.0;
pub const VALUE_RETAILER_MAX_PREMIUM: f64 = 20.0;
pub const MAINSTREAM_RETAILER_MIN_MAINSTREAM: f64 = 40.0;
/// Points by which a share may miss its target and still only warn.
pub const TIER_WARN_MARGIN: f64 = 5.0;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Greedy clustering radius.
pub const CLUSTER_RADIUS_M: f64 = 1500.0;

/// Extra distance added to every spacing push.
pub const SPACING_BUFFER_M: f64 = 50.0;

/// Base competition radius, scaled per format.
pub const COMPETITION_BASE_RADIUS_M: f64 = 2000.0;

/// Competitors kept per store.
pub const MAX_COMPETITORS: usize = 5;
