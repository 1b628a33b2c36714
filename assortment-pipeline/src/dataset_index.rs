//! Read-only lookups over the published dataset.
//!
//! Built once from the loaded files; every accessor is a map lookup. This is
//! the query surface the dashboard reads, so it never mutates anything.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use assortment_core::{AssortmentResult, Store};

use crate::loader::read_json;

/// A SKU in the product catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogSku {
    pub sku_id: String,
    pub brand: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub occasion_shares: BTreeMap<String, f64>,
    #[serde(default)]
    pub segment_shares: BTreeMap<String, f64>,
}

/// One category measure for one store, optionally cut by segment/occasion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceRecord {
    pub store_id: String,
    pub category: String,
    pub measure: String,
    pub value: f64,
    #[serde(default)]
    pub segment: Option<String>,
    #[serde(default)]
    pub occasion: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// A SKU a store could list, with its estimated uplift.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingOpportunity {
    pub store_id: String,
    pub sku_id: String,
    pub priority: Priority,
    pub estimated_uplift: f64,
    #[serde(default)]
    pub rationale: Option<String>,
}

/// O(1) accessors over stores, catalog, performance and opportunities.
#[derive(Debug, Default)]
pub struct DatasetIndex {
    stores: HashMap<String, Store>,
    skus: HashMap<String, CatalogSku>,
    performance: HashMap<String, Vec<PerformanceRecord>>,
    opportunities: HashMap<String, Vec<ListingOpportunity>>,
}

impl DatasetIndex {
    pub fn build(
        stores: Vec<Store>,
        skus: Vec<CatalogSku>,
        performance: Vec<PerformanceRecord>,
        opportunities: Vec<ListingOpportunity>,
    ) -> Self {
        let stores = stores.into_iter().map(|s| (s.store_id.clone(), s)).collect();
        let skus = skus.into_iter().map(|s| (s.sku_id.clone(), s)).collect();

        let mut by_store: HashMap<String, Vec<PerformanceRecord>> = HashMap::new();
        for record in performance {
            by_store.entry(record.store_id.clone()).or_default().push(record);
        }

        let mut opps: HashMap<String, Vec<ListingOpportunity>> = HashMap::new();
        for o in opportunities {
            opps.entry(o.store_id.clone()).or_default().push(o);
        }
        for list in opps.values_mut() {
            list.sort_by(compare_opportunities);
        }

        Self {
            stores,
            skus,
            performance: by_store,
            opportunities: opps,
        }
    }

    /// Load the catalog, performance and opportunity files around a store list.
    pub fn load(
        stores: Vec<Store>,
        catalog_path: impl AsRef<Path>,
        performance_path: impl AsRef<Path>,
        opportunities_path: impl AsRef<Path>,
    ) -> AssortmentResult<Self> {
        let skus: Vec<CatalogSku> = read_json(catalog_path)?;
        let performance: Vec<PerformanceRecord> = read_json(performance_path)?;
        let opportunities: Vec<ListingOpportunity> = read_json(opportunities_path)?;
        log::info!(
            "indexed {} stores, {} skus, {} performance records, {} opportunities",
            stores.len(),
            skus.len(),
            performance.len(),
            opportunities.len()
        );
        Ok(Self::build(stores, skus, performance, opportunities))
    }

    pub fn get_store(&self, store_id: &str) -> Option<&Store> {
        self.stores.get(store_id)
    }

    pub fn get_sku(&self, sku_id: &str) -> Option<&CatalogSku> {
        self.skus.get(sku_id)
    }

    pub fn get_performance_by_store(&self, store_id: &str) -> &[PerformanceRecord] {
        self.performance
            .get(store_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Value of `measure` for a store.
    ///
    /// With no segment/occasion filter, only the unsegmented record matches;
    /// with a filter, the record's cut must match exactly.
    pub fn get_measure_value(
        &self,
        store_id: &str,
        measure: &str,
        segment: Option<&str>,
        occasion: Option<&str>,
    ) -> Option<f64> {
        self.get_performance_by_store(store_id)
            .iter()
            .find(|r| {
                r.measure == measure
                    && r.segment.as_deref() == segment
                    && r.occasion.as_deref() == occasion
            })
            .map(|r| r.value)
    }

    /// Opportunities for a store, highest priority first, then largest uplift.
    pub fn get_listing_opportunities(&self, store_id: &str) -> &[ListingOpportunity] {
        self.opportunities
            .get(store_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn store_count(&self) -> usize {
        self.stores.len()
    }
}

fn compare_opportunities(a: &ListingOpportunity, b: &ListingOpportunity) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| b.estimated_uplift.total_cmp(&a.estimated_uplift))
        .then_with(|| a.sku_id.cmp(&b.sku_id))
}
