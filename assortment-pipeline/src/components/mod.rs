pub mod clustering;
pub mod competition;
pub mod context;
pub mod spacing;

#[cfg(test)]
pub(crate) mod fixtures {
    use assortment_core::{Format, Store};

    /// Metres per degree of latitude on the haversine sphere.
    pub const M_PER_DEG_LAT: f64 = 6_371_000.0 * std::f64::consts::PI / 180.0;

    /// A store `north_m` metres north of a fixed origin in Leeds.
    pub fn store_at(id: &str, retailer: &str, format: Format, north_m: f64) -> Store {
        Store {
            store_id: id.to_string(),
            retailer: retailer.to_string(),
            format,
            latitude: 53.8 + north_m / M_PER_DEG_LAT,
            longitude: -1.55,
            region: "Yorkshire".to_string(),
            store_context: None,
            cluster_id: None,
            nearby_competition: Vec::new(),
        }
    }
}
