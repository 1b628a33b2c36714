//! Explicit configuration tables.
//!
//! Every lookup the engine, analytics and passes need is carried in one of
//! these structs and passed in by the caller. Defaults come from
//! `thresholds.rs`; a JSON file may override any subset via `Config::from_json`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AssortmentResult;
use crate::thresholds::*;
use crate::types::{BrandTier, Format};

// ---------------------------------------------------------------------------
// Brand tiers
// ---------------------------------------------------------------------------

/// Brand → tier lookup. Unknown brands are mainstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct BrandTierTable {
    tiers: HashMap<String, BrandTier>,
}

impl BrandTierTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, brand: impl Into<String>, tier: BrandTier) -> Self {
        self.tiers.insert(brand.into(), tier);
        self
    }

    pub fn tier_of(&self, brand: &str) -> BrandTier {
        self.tiers
            .get(brand)
            .copied()
            .unwrap_or(BrandTier::Mainstream)
    }
}

// ---------------------------------------------------------------------------
// Tier3 parents
// ---------------------------------------------------------------------------

/// Tier3 retailer → the retailer whose templates it inherits.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ParentTemplateTable {
    parents: BTreeMap<String, String>,
}

impl ParentTemplateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, retailer: impl Into<String>, parent: impl Into<String>) -> Self {
        self.parents.insert(retailer.into(), parent.into());
        self
    }

    /// `(retailer, parent)` pairs in retailer order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parents.iter().map(|(r, p)| (r.as_str(), p.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Retailer positioning
// ---------------------------------------------------------------------------

/// Where a retailer sits on price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Positioning {
    Premium,
    Mainstream,
    Value,
}

impl fmt::Display for Positioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Positioning::Premium => write!(f, "premium"),
            Positioning::Mainstream => write!(f, "mainstream"),
            Positioning::Value => write!(f, "value"),
        }
    }
}

/// Retailer → positioning lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PositioningTable {
    retailers: HashMap<String, Positioning>,
}

impl PositioningTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, retailer: impl Into<String>, positioning: Positioning) -> Self {
        self.retailers.insert(retailer.into(), positioning);
        self
    }

    pub fn positioning_of(&self, retailer: &str) -> Option<Positioning> {
        self.retailers.get(retailer).copied()
    }
}

/// Tier-share targets per positioning, in percent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TierExpectations {
    pub premium_min_premium: f64,
    pub value_min_value: f64,
    pub value_max_premium: f64,
    pub mainstream_min_mainstream: f64,
    pub warn_margin: f64,
}

impl Default for TierExpectations {
    fn default() -> Self {
        Self {
            premium_min_premium: PREMIUM_RETAILER_MIN_PREMIUM,
            value_min_value: VALUE_RETAILER_MIN_VALUE,
            value_max_premium: VALUE_RETAILER_MAX_PREMIUM,
            mainstream_min_mainstream: MAINSTREAM_RETAILER_MIN_MAINSTREAM,
            warn_margin: TIER_WARN_MARGIN,
        }
    }
}

// ---------------------------------------------------------------------------
// Variation engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VariationConfig {
    pub base_min: f64,
    pub base_spread: f64,
    pub tier3_bonus: f64,
    pub aspirational_probability: f64,
    pub pool_buffer: usize,
}

impl Default for VariationConfig {
    fn default() -> Self {
        Self {
            base_min: BASE_VARIATION_MIN,
            base_spread: BASE_VARIATION_SPREAD,
            tier3_bonus: TIER3_VARIATION_BONUS,
            aspirational_probability: ASPIRATIONAL_PROBABILITY,
            pool_buffer: SWAP_POOL_BUFFER,
        }
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Distances for the clustering, spacing and competition passes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeoConfig {
    pub cluster_radius_m: f64,
    pub min_spacing_m: BTreeMap<Format, f64>,
    pub spacing_buffer_m: f64,
    pub competition_base_radius_m: f64,
    pub competition_multiplier: BTreeMap<Format, f64>,
    pub max_competitors: usize,
}

impl Default for GeoConfig {
    fn default() -> Self {
        let min_spacing_m = BTreeMap::from([
            (Format::Hypermarket, 5000.0),
            (Format::Supermarket, 1500.0),
            (Format::Discounter, 1500.0),
            (Format::Convenience, 300.0),
            (Format::Forecourt, 1000.0),
        ]);
        let competition_multiplier = BTreeMap::from([
            (Format::Hypermarket, 2.5),
            (Format::Supermarket, 1.5),
            (Format::Discounter, 1.5),
            (Format::Convenience, 0.5),
            (Format::Forecourt, 0.75),
        ]);
        Self {
            cluster_radius_m: CLUSTER_RADIUS_M,
            min_spacing_m,
            spacing_buffer_m: SPACING_BUFFER_M,
            competition_base_radius_m: COMPETITION_BASE_RADIUS_M,
            competition_multiplier,
            max_competitors: MAX_COMPETITORS,
        }
    }
}

impl GeoConfig {
    /// Minimum same-format spacing; formats without an entry are never pushed.
    pub fn min_spacing(&self, format: Format) -> Option<f64> {
        self.min_spacing_m.get(&format).copied()
    }

    pub fn competition_radius(&self, format: Format) -> f64 {
        let multiplier = self
            .competition_multiplier
            .get(&format)
            .copied()
            .unwrap_or(1.0);
        self.competition_base_radius_m * multiplier
    }
}

/// Thresholds for store-context classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContextRules {
    pub near_m: f64,
    pub mid_m: f64,
    pub far_m: f64,
    pub office_core_near: usize,
    pub office_core_diversity: usize,
    pub transit_near: usize,
    pub transit_mid: usize,
    pub transit_diversity: usize,
    pub mixed_mid: usize,
    pub mixed_far: usize,
}

impl Default for ContextRules {
    fn default() -> Self {
        Self {
            near_m: 500.0,
            mid_m: 1000.0,
            far_m: 2000.0,
            office_core_near: 5,
            office_core_diversity: 4,
            transit_near: 3,
            transit_mid: 6,
            transit_diversity: 3,
            mixed_mid: 2,
            mixed_far: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

/// Everything a run needs besides the data files.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub variation: VariationConfig,
    pub brand_tiers: BrandTierTable,
    pub positioning: PositioningTable,
    pub tier3_parents: ParentTemplateTable,
    pub tier_expectations: TierExpectations,
    pub geo: GeoConfig,
    pub context: ContextRules,
}

impl Config {
    /// Parse a (possibly partial) JSON config; missing sections take defaults.
    pub fn from_json(json: &str) -> AssortmentResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> AssortmentResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| crate::error::AssortmentError::io(path.display().to_string(), e))?;
        Self::from_json(&json)
    }
}
