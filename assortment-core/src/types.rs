use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Store types
// ---------------------------------------------------------------------------

/// Store format. Serialized with the variant names as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Format {
    Hypermarket,
    Supermarket,
    Convenience,
    Discounter,
    Forecourt,
}

impl Format {
    pub const ALL: [Format; 5] = [
        Format::Hypermarket,
        Format::Supermarket,
        Format::Convenience,
        Format::Discounter,
        Format::Forecourt,
    ];
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Hypermarket => write!(f, "Hypermarket"),
            Format::Supermarket => write!(f, "Supermarket"),
            Format::Convenience => write!(f, "Convenience"),
            Format::Discounter => write!(f, "Discounter"),
            Format::Forecourt => write!(f, "Forecourt"),
        }
    }
}

/// Trading context derived from nearby store density.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreContext {
    Residential,
    Mixed,
    Transit,
    OfficeCore,
}

impl fmt::Display for StoreContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreContext::Residential => write!(f, "residential"),
            StoreContext::Mixed => write!(f, "mixed"),
            StoreContext::Transit => write!(f, "transit"),
            StoreContext::OfficeCore => write!(f, "office_core"),
        }
    }
}

/// One entry in a store's nearby-competition list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Competitor {
    pub competitor_id: String,
    pub retailer: String,
    pub format: Format,
    pub distance_m: f64,
}

/// A store record (current schema).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Store {
    pub store_id: String,
    pub retailer: String,
    pub format: Format,
    pub latitude: f64,
    pub longitude: f64,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_context: Option<StoreContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    #[serde(default)]
    pub nearby_competition: Vec<Competitor>,
}

impl Store {
    /// Template key for this store: retailer with whitespace removed, then format.
    pub fn template_key(&self) -> String {
        template_key(&self.retailer, self.format)
    }
}

/// Build the `<retailer-without-whitespace><format>` template id.
pub fn template_key(retailer: &str, format: Format) -> String {
    let mut key: String = retailer.chars().filter(|c| !c.is_whitespace()).collect();
    key.push_str(&format.to_string());
    key
}

// ---------------------------------------------------------------------------
// SKU and template types
// ---------------------------------------------------------------------------

/// Price positioning of a brand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrandTier {
    Premium,
    Mainstream,
    Value,
}

impl fmt::Display for BrandTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrandTier::Premium => write!(f, "premium"),
            BrandTier::Mainstream => write!(f, "mainstream"),
            BrandTier::Value => write!(f, "value"),
        }
    }
}

/// A SKU as it appears in a template's ranked list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedSku {
    pub sku_id: String,
    pub brand: String,
    #[serde(default)]
    pub name: String,
    /// 1 = best-ranked.
    pub rank: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub occasion_shares: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub segment_shares: BTreeMap<String, f64>,
}

/// Ranked reference assortment for one (retailer, format).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub template_id: String,
    pub retailer: String,
    pub format: Format,
    pub ranked_skus: Vec<RankedSku>,
    pub baseline_sku_count: usize,
    #[serde(default)]
    pub is_tier3: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspirational_sku: Option<RankedSku>,
}

impl Template {
    /// The top `baseline_sku_count` ranked SKUs.
    pub fn baseline(&self) -> &[RankedSku] {
        let n = self.baseline_sku_count.min(self.ranked_skus.len());
        &self.ranked_skus[..n]
    }

    /// Whether this template can ever take an aspirational substitution.
    pub fn aspirational_eligible(&self) -> bool {
        self.format == Format::Discounter && self.aspirational_sku.is_some()
    }
}

// ---------------------------------------------------------------------------
// Assortment types
// ---------------------------------------------------------------------------

/// SKU counts per brand tier.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierBreakdown {
    pub premium: usize,
    pub mainstream: usize,
    pub value: usize,
}

impl TierBreakdown {
    pub fn add(&mut self, tier: BrandTier, count: usize) {
        match tier {
            BrandTier::Premium => self.premium += count,
            BrandTier::Mainstream => self.mainstream += count,
            BrandTier::Value => self.value += count,
        }
    }

    pub fn get(&self, tier: BrandTier) -> usize {
        match tier {
            BrandTier::Premium => self.premium,
            BrandTier::Mainstream => self.mainstream,
            BrandTier::Value => self.value,
        }
    }

    pub fn total(&self) -> usize {
        self.premium + self.mainstream + self.value
    }

    /// Share of `tier` in percent, 0 for an empty breakdown.
    pub fn share_pct(&self, tier: BrandTier) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.get(tier) as f64 / total as f64 * 100.0
    }

    pub fn merge(&mut self, other: &TierBreakdown) {
        self.premium += other.premium;
        self.mainstream += other.mainstream;
        self.value += other.value;
    }
}

/// Concrete SKU selection for one store. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assortment {
    pub store_id: String,
    pub template_id: String,
    pub sku_ids: Vec<String>,
    pub sku_count: usize,
    pub variation_percentage: f64,
    pub num_swaps: usize,
    pub aspirational_substitution: bool,
    pub brand_breakdown: BTreeMap<String, usize>,
    pub tier_breakdown: TierBreakdown,
}

impl Assortment {
    /// Number of distinct SKUs (duplicates from repeated swaps collapse).
    pub fn unique_sku_count(&self) -> usize {
        let mut ids: Vec<&str> = self.sku_ids.iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_key_strips_whitespace() {
        assert_eq!(
            template_key("Marks & Spencer", Format::Convenience),
            "Marks&SpencerConvenience"
        );
        assert_eq!(template_key("Tesco", Format::Hypermarket), "TescoHypermarket");
    }

    #[test]
    fn store_context_serializes_snake_case() {
        let json = serde_json::to_string(&StoreContext::OfficeCore).unwrap();
        assert_eq!(json, "\"office_core\"");
        let back: StoreContext = serde_json::from_str("\"transit\"").unwrap();
        assert_eq!(back, StoreContext::Transit);
    }

    #[test]
    fn store_deserializes_without_derived_fields() {
        let json = r#"{
            "store_id": "TES-0001",
            "retailer": "Tesco",
            "format": "Supermarket",
            "latitude": 51.5,
            "longitude": -0.12,
            "region": "London"
        }"#;
        let store: Store = serde_json::from_str(json).unwrap();
        assert!(store.store_context.is_none());
        assert!(store.cluster_id.is_none());
        assert!(store.nearby_competition.is_empty());
    }

    #[test]
    fn tier_share_handles_empty() {
        let t = TierBreakdown::default();
        assert_eq!(t.share_pct(BrandTier::Premium), 0.0);
        let t = TierBreakdown {
            premium: 1,
            mainstream: 2,
            value: 1,
        };
        assert!((t.share_pct(BrandTier::Mainstream) - 50.0).abs() < 1e-12);
    }

    #[test]
    fn unique_count_collapses_duplicates() {
        let a = Assortment {
            store_id: "S1".into(),
            template_id: "T".into(),
            sku_ids: vec!["A".into(), "B".into(), "A".into()],
            sku_count: 3,
            variation_percentage: 0.0,
            num_swaps: 0,
            aspirational_substitution: false,
            brand_breakdown: BTreeMap::new(),
            tier_breakdown: TierBreakdown::default(),
        };
        assert_eq!(a.unique_sku_count(), 2);
    }
}
