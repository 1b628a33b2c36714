use assortment_core::config::GeoConfig;
use assortment_core::geo::haversine_m;
use assortment_core::{AssortmentResult, Store};

use crate::pass::StorePass;

/// Greedy single-link clustering around seed stores.
///
/// Stores are visited in input order. Each unassigned store seeds a new
/// cluster and absorbs every still-unassigned store within `radius_m` of
/// the seed. Membership is not transitive: a store near an absorbed member
/// but beyond the radius from the seed starts its own cluster later.
pub struct GreedyClusterPass {
    pub radius_m: f64,
}

impl GreedyClusterPass {
    pub fn from_config(geo: &GeoConfig) -> Self {
        Self {
            radius_m: geo.cluster_radius_m,
        }
    }
}

impl StorePass for GreedyClusterPass {
    fn apply(&self, stores: &[Store]) -> AssortmentResult<Vec<Store>> {
        Ok(assign_clusters(stores, self.radius_m))
    }
}

/// Cluster id for the `n`th cluster (1-based).
pub fn cluster_label(n: usize) -> String {
    format!("cluster_{:04}", n)
}

pub fn assign_clusters(stores: &[Store], radius_m: f64) -> Vec<Store> {
    let mut out = stores.to_vec();
    let mut assigned = vec![false; out.len()];
    let mut clusters = 0;

    for seed in 0..out.len() {
        if assigned[seed] {
            continue;
        }
        clusters += 1;
        let label = cluster_label(clusters);
        assigned[seed] = true;

        let (lat, lon) = (out[seed].latitude, out[seed].longitude);
        for other in seed + 1..out.len() {
            if assigned[other] {
                continue;
            }
            if haversine_m(lat, lon, out[other].latitude, out[other].longitude) <= radius_m {
                assigned[other] = true;
                out[other].cluster_id = Some(label.clone());
            }
        }
        out[seed].cluster_id = Some(label);
    }

    log::info!("clustered {} stores into {} clusters", out.len(), clusters);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::fixtures::store_at;
    use assortment_core::Format;

    #[test]
    fn nearby_stores_share_a_cluster() {
        let stores = vec![
            store_at("A", "Tesco", Format::Supermarket, 0.0),
            store_at("B", "Aldi", Format::Discounter, 1000.0),
            store_at("C", "Lidl", Format::Discounter, 5000.0),
        ];
        let out = assign_clusters(&stores, 1500.0);
        assert_eq!(out[0].cluster_id.as_deref(), Some("cluster_0001"));
        assert_eq!(out[1].cluster_id.as_deref(), Some("cluster_0001"));
        assert_eq!(out[2].cluster_id.as_deref(), Some("cluster_0002"));
    }

    #[test]
    fn membership_is_measured_from_the_seed() {
        // B is within range of A, C is within range of B but not of A.
        let stores = vec![
            store_at("A", "Tesco", Format::Supermarket, 0.0),
            store_at("B", "Tesco", Format::Supermarket, 1400.0),
            store_at("C", "Tesco", Format::Supermarket, 2800.0),
        ];
        let out = assign_clusters(&stores, 1500.0);
        assert_eq!(out[1].cluster_id, out[0].cluster_id);
        assert_ne!(out[2].cluster_id, out[0].cluster_id);
    }

    #[test]
    fn input_is_untouched() {
        let stores = vec![store_at("A", "Tesco", Format::Supermarket, 0.0)];
        let out = assign_clusters(&stores, 1500.0);
        assert!(stores[0].cluster_id.is_none());
        assert!(out[0].cluster_id.is_some());
    }

    #[test]
    fn rerun_overwrites_stale_ids() {
        let mut stores = vec![
            store_at("A", "Tesco", Format::Supermarket, 0.0),
            store_at("B", "Aldi", Format::Discounter, 9000.0),
        ];
        stores[1].cluster_id = Some("cluster_0001".into());
        let out = assign_clusters(&stores, 1500.0);
        assert_eq!(out[1].cluster_id.as_deref(), Some("cluster_0002"));
    }
}
