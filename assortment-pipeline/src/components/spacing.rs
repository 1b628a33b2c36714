use assortment_core::config::GeoConfig;
use assortment_core::geo::{bearing_rad, destination, haversine_m};
use assortment_core::{AssortmentResult, Format, Store};

use crate::pass::StorePass;

/// Pushes same-format stores apart when they sit closer than the format's
/// minimum spacing.
///
/// For each pair `(i, j)` with `i` before `j` in input order, store `j`
/// moves directly away from `i` by `(required - actual) / 2 + buffer`.
/// Later pairs see the already-moved coordinates. One sweep does not
/// guarantee every pair ends up compliant.
pub struct MinimumSpacingPass {
    pub geo: GeoConfig,
}

impl StorePass for MinimumSpacingPass {
    fn apply(&self, stores: &[Store]) -> AssortmentResult<Vec<Store>> {
        Ok(enforce_spacing(stores, &self.geo))
    }
}

pub fn enforce_spacing(stores: &[Store], geo: &GeoConfig) -> Vec<Store> {
    let mut out = stores.to_vec();
    let mut moves = 0usize;

    for format in Format::ALL {
        let Some(required) = geo.min_spacing(format) else {
            continue;
        };
        let members: Vec<usize> = out
            .iter()
            .enumerate()
            .filter(|(_, s)| s.format == format)
            .map(|(i, _)| i)
            .collect();

        for (a, &i) in members.iter().enumerate() {
            for &j in &members[a + 1..] {
                let (lat1, lon1) = (out[i].latitude, out[i].longitude);
                let (lat2, lon2) = (out[j].latitude, out[j].longitude);
                let actual = haversine_m(lat1, lon1, lat2, lon2);
                if actual >= required {
                    continue;
                }
                // Co-located stores have no bearing; push them north.
                let bearing = if actual < 1e-6 {
                    0.0
                } else {
                    bearing_rad(lat1, lon1, lat2, lon2)
                };
                let push = (required - actual) / 2.0 + geo.spacing_buffer_m;
                let (lat, lon) = destination(lat2, lon2, bearing, push);
                log::debug!(
                    "spacing: moved {} {:.0}m away from {} ({:.0}m < {:.0}m)",
                    out[j].store_id,
                    push,
                    out[i].store_id,
                    actual,
                    required
                );
                out[j].latitude = lat;
                out[j].longitude = lon;
                moves += 1;
            }
        }
    }

    log::info!("spacing: {} moves across {} stores", moves, out.len());
    out
}
