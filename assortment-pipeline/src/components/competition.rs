use assortment_core::config::GeoConfig;
use assortment_core::geo::haversine_m;
use assortment_core::{AssortmentResult, Competitor, Store};

use crate::pass::StorePass;

/// Rebuilds every store's `nearby_competition` from current coordinates.
///
/// Competitors are other retailers' stores within the store's
/// format-scaled radius, nearest first, capped at `max_competitors`.
pub struct CompetitionPass {
    pub geo: GeoConfig,
}

impl StorePass for CompetitionPass {
    fn apply(&self, stores: &[Store]) -> AssortmentResult<Vec<Store>> {
        Ok(recompute_competition(stores, &self.geo))
    }
}

pub fn recompute_competition(stores: &[Store], geo: &GeoConfig) -> Vec<Store> {
    stores
        .iter()
        .map(|store| {
            let radius = geo.competition_radius(store.format);
            let mut nearby: Vec<Competitor> = stores
                .iter()
                .filter(|other| other.retailer != store.retailer)
                .filter_map(|other| {
                    let d = haversine_m(
                        store.latitude,
                        store.longitude,
                        other.latitude,
                        other.longitude,
                    );
                    (d <= radius).then(|| Competitor {
                        competitor_id: other.store_id.clone(),
                        retailer: other.retailer.clone(),
                        format: other.format,
                        distance_m: d.round(),
                    })
                })
                .collect();
            nearby.sort_by(|a, b| {
                a.distance_m
                    .total_cmp(&b.distance_m)
                    .then_with(|| a.competitor_id.cmp(&b.competitor_id))
            });
            nearby.truncate(geo.max_competitors);

            Store {
                nearby_competition: nearby,
                ..store.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::fixtures::store_at;
    use assortment_core::Format;

    #[test]
    fn keeps_nearest_five_other_retailers() {
        let mut stores = vec![store_at("HOME", "Tesco", Format::Supermarket, 0.0)];
        stores.push(store_at("OWN", "Tesco", Format::Convenience, 50.0));
        for i in 0..7 {
            stores.push(store_at(
                &format!("C{}", i),
                "Asda",
                Format::Supermarket,
                200.0 * (7 - i) as f64,
            ));
        }
        let out = recompute_competition(&stores, &GeoConfig::default());
        let ids: Vec<&str> = out[0]
            .nearby_competition
            .iter()
            .map(|c| c.competitor_id.as_str())
            .collect();
        assert_eq!(ids, vec!["C6", "C5", "C4", "C3", "C2"]);
        assert!((out[0].nearby_competition[0].distance_m - 200.0).abs() < 1.0);
    }

    #[test]
    fn radius_scales_with_format() {
        let stores = vec![
            store_at("HYP", "Tesco", Format::Hypermarket, 0.0),
            store_at("CON", "Co-op", Format::Convenience, 0.0),
            store_at("FAR", "Asda", Format::Supermarket, 4000.0),
        ];
        let out = recompute_competition(&stores, &GeoConfig::default());
        // Hypermarket radius 5000m reaches FAR, convenience radius 1000m does not.
        assert!(out[0].nearby_competition.iter().any(|c| c.competitor_id == "FAR"));
        assert!(!out[1].nearby_competition.iter().any(|c| c.competitor_id == "FAR"));
    }

    #[test]
    fn stale_lists_are_replaced() {
        let mut stores = vec![store_at("A", "Tesco", Format::Supermarket, 0.0)];
        stores[0].nearby_competition.push(Competitor {
            competitor_id: "GONE".into(),
            retailer: "Morrisons".into(),
            format: Format::Supermarket,
            distance_m: 10.0,
        });
        let out = recompute_competition(&stores, &GeoConfig::default());
        assert!(out[0].nearby_competition.is_empty());
    }
}
