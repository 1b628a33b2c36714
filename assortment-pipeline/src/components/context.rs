use std::collections::HashSet;

use assortment_core::config::ContextRules;
use assortment_core::geo::haversine_m;
use assortment_core::{AssortmentResult, Format, Store, StoreContext};

use crate::pass::StorePass;

/// Competitor density around one store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContextCounts {
    pub near: usize,
    pub mid: usize,
    pub far: usize,
    /// Distinct competing retailers within the mid band.
    pub diversity: usize,
}

/// Reclassifies `store_context` from competitor density.
pub struct ContextPass {
    pub rules: ContextRules,
}

impl StorePass for ContextPass {
    fn apply(&self, stores: &[Store]) -> AssortmentResult<Vec<Store>> {
        Ok(reclassify_contexts(stores, &self.rules))
    }
}

pub fn reclassify_contexts(stores: &[Store], rules: &ContextRules) -> Vec<Store> {
    let mut changed = 0usize;
    let out: Vec<Store> = stores
        .iter()
        .map(|store| {
            let counts = count_competitors(store, stores, rules);
            let context = apply_format_override(store.format, classify(&counts, rules));
            if store.store_context != Some(context) {
                changed += 1;
            }
            Store {
                store_context: Some(context),
                ..store.clone()
            }
        })
        .collect();
    log::info!("context: {} of {} stores reclassified", changed, out.len());
    out
}

pub fn count_competitors(store: &Store, stores: &[Store], rules: &ContextRules) -> ContextCounts {
    let mut counts = ContextCounts::default();
    let mut retailers: HashSet<&str> = HashSet::new();
    for other in stores {
        if other.retailer == store.retailer {
            continue;
        }
        let d = haversine_m(store.latitude, store.longitude, other.latitude, other.longitude);
        if d <= rules.near_m {
            counts.near += 1;
        }
        if d <= rules.mid_m {
            counts.mid += 1;
            retailers.insert(other.retailer.as_str());
        }
        if d <= rules.far_m {
            counts.far += 1;
        }
    }
    counts.diversity = retailers.len();
    counts
}

/// Threshold rules, checked densest first.
pub fn classify(counts: &ContextCounts, rules: &ContextRules) -> StoreContext {
    if counts.near >= rules.office_core_near && counts.diversity >= rules.office_core_diversity {
        StoreContext::OfficeCore
    } else if counts.near >= rules.transit_near
        || (counts.mid >= rules.transit_mid && counts.diversity >= rules.transit_diversity)
    {
        StoreContext::Transit
    } else if counts.mid >= rules.mixed_mid || counts.far >= rules.mixed_far {
        StoreContext::Mixed
    } else {
        StoreContext::Residential
    }
}

/// Formats that cannot trade in some contexts.
pub fn apply_format_override(format: Format, context: StoreContext) -> StoreContext {
    match (format, context) {
        (Format::Hypermarket, StoreContext::Transit | StoreContext::OfficeCore) => {
            StoreContext::Residential
        }
        (Format::Forecourt, StoreContext::OfficeCore) => StoreContext::Transit,
        (_, context) => context,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::fixtures::store_at;

    fn counts(near: usize, mid: usize, far: usize, diversity: usize) -> ContextCounts {
        ContextCounts {
            near,
            mid,
            far,
            diversity,
        }
    }

    #[test]
    fn classification_thresholds() {
        let rules = ContextRules::default();
        assert_eq!(classify(&counts(5, 6, 8, 4), &rules), StoreContext::OfficeCore);
        assert_eq!(classify(&counts(5, 6, 8, 3), &rules), StoreContext::Transit);
        assert_eq!(classify(&counts(1, 6, 8, 3), &rules), StoreContext::Transit);
        assert_eq!(classify(&counts(1, 2, 2, 1), &rules), StoreContext::Mixed);
        assert_eq!(classify(&counts(0, 0, 5, 0), &rules), StoreContext::Mixed);
        assert_eq!(classify(&counts(0, 1, 4, 1), &rules), StoreContext::Residential);
    }

    #[test]
    fn hypermarkets_never_transit_or_office() {
        assert_eq!(
            apply_format_override(Format::Hypermarket, StoreContext::OfficeCore),
            StoreContext::Residential
        );
        assert_eq!(
            apply_format_override(Format::Hypermarket, StoreContext::Transit),
            StoreContext::Residential
        );
        assert_eq!(
            apply_format_override(Format::Hypermarket, StoreContext::Mixed),
            StoreContext::Mixed
        );
        assert_eq!(
            apply_format_override(Format::Forecourt, StoreContext::OfficeCore),
            StoreContext::Transit
        );
    }

    #[test]
    fn dense_centre_becomes_office_core() {
        let mut stores = vec![store_at("HOME", "Tesco", Format::Convenience, 0.0)];
        for (i, retailer) in ["Sainsbury's", "Co-op", "M&S", "Waitrose", "Spar"]
            .iter()
            .enumerate()
        {
            stores.push(store_at(
                &format!("N{}", i),
                retailer,
                Format::Convenience,
                80.0 * (i + 1) as f64,
            ));
        }
        let out = reclassify_contexts(&stores, &ContextRules::default());
        assert_eq!(out[0].store_context, Some(StoreContext::OfficeCore));
    }

    #[test]
    fn own_retailer_does_not_count() {
        let stores = vec![
            store_at("A", "Tesco", Format::Convenience, 0.0),
            store_at("B", "Tesco", Format::Convenience, 100.0),
            store_at("C", "Tesco", Format::Convenience, 200.0),
        ];
        let c = count_competitors(&stores[0], &stores, &ContextRules::default());
        assert_eq!(c, ContextCounts::default());
    }
}
