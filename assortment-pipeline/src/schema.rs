//! Versioned store snapshot schema.
//!
//! v1 is the legacy bare-array layout, where some records carry
//! `missions` and `micro_catchment_population`. v2 wraps the array in an
//! envelope with an explicit `schema_version` and drops both fields.
//! Reading either layout yields a v2 `StoreSnapshot`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use assortment_core::{AssortmentError, AssortmentResult, Competitor, Format, Store, StoreContext};

pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Legacy (v1) store record.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreV1 {
    pub store_id: String,
    pub retailer: String,
    pub format: Format,
    pub latitude: f64,
    pub longitude: f64,
    pub region: String,
    #[serde(default)]
    pub store_context: Option<StoreContext>,
    #[serde(default)]
    pub cluster_id: Option<String>,
    #[serde(default)]
    pub nearby_competition: Vec<Competitor>,
    #[serde(default)]
    pub missions: Option<serde_json::Value>,
    #[serde(default)]
    pub micro_catchment_population: Option<f64>,
}

/// Current on-disk layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreSnapshot {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    pub stores: Vec<Store>,
}

impl StoreSnapshot {
    pub fn new(stores: Vec<Store>, generated_at: Option<String>) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            generated_at,
            stores,
        }
    }
}

/// What a v1 → v2 migration dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub records: usize,
    pub dropped_missions: usize,
    pub dropped_catchment: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSnapshot {
    Legacy(Vec<serde_json::Value>),
    Versioned {
        schema_version: u32,
        #[serde(default)]
        generated_at: Option<String>,
        stores: Vec<serde_json::Value>,
    },
}

/// Migrate legacy records to the current schema.
pub fn migrate_v1(records: Vec<StoreV1>) -> (Vec<Store>, MigrationReport) {
    let mut report = MigrationReport {
        from_version: 1,
        records: records.len(),
        ..MigrationReport::default()
    };
    let stores = records
        .into_iter()
        .map(|r| {
            if r.missions.is_some() {
                report.dropped_missions += 1;
            }
            if r.micro_catchment_population.is_some() {
                report.dropped_catchment += 1;
            }
            Store {
                store_id: r.store_id,
                retailer: r.retailer,
                format: r.format,
                latitude: r.latitude,
                longitude: r.longitude,
                region: r.region,
                store_context: r.store_context,
                cluster_id: r.cluster_id,
                nearby_competition: r.nearby_competition,
            }
        })
        .collect();
    (stores, report)
}

/// Parse any supported layout into a current snapshot.
///
/// Returns the migration report when the input was not already current.
pub fn parse_snapshot(json: &str) -> AssortmentResult<(StoreSnapshot, Option<MigrationReport>)> {
    let raw: RawSnapshot = serde_json::from_str(json)?;
    let (version, generated_at, values) = match raw {
        RawSnapshot::Legacy(values) => (1, None, values),
        RawSnapshot::Versioned {
            schema_version,
            generated_at,
            stores,
        } => (schema_version, generated_at, stores),
    };

    let (stores, report) = match version {
        1 => {
            let records = values
                .into_iter()
                .map(serde_json::from_value::<StoreV1>)
                .collect::<Result<Vec<_>, _>>()?;
            let (stores, report) = migrate_v1(records);
            log::info!(
                "migrated {} v1 stores (dropped missions on {}, catchment on {})",
                report.records,
                report.dropped_missions,
                report.dropped_catchment
            );
            (stores, Some(report))
        }
        CURRENT_SCHEMA_VERSION => {
            let stores = values
                .into_iter()
                .map(serde_json::from_value::<Store>)
                .collect::<Result<Vec<_>, _>>()?;
            (stores, None)
        }
        other => return Err(AssortmentError::UnsupportedSchemaVersion(other)),
    };

    validate_stores(&stores)?;
    Ok((StoreSnapshot::new(stores, generated_at), report))
}

/// Reject records the passes cannot work with.
pub fn validate_stores(stores: &[Store]) -> AssortmentResult<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(stores.len());
    for store in stores {
        let invalid = |reason: &str| AssortmentError::InvalidStore {
            store_id: store.store_id.clone(),
            reason: reason.to_string(),
        };
        if store.store_id.trim().is_empty() {
            return Err(invalid("empty store_id"));
        }
        if !seen.insert(store.store_id.as_str()) {
            return Err(invalid("duplicate store_id"));
        }
        if !(-90.0..=90.0).contains(&store.latitude) || !(-180.0..=180.0).contains(&store.longitude)
        {
            return Err(invalid("coordinates out of range"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY: &str = r#"[
        {
            "store_id": "TES-0001", "retailer": "Tesco", "format": "Supermarket",
            "latitude": 51.5, "longitude": -0.12, "region": "London",
            "missions": ["top-up", "main shop"],
            "micro_catchment_population": 12000
        },
        {
            "store_id": "ALD-0001", "retailer": "Aldi", "format": "Discounter",
            "latitude": 52.48, "longitude": -1.89, "region": "West Midlands",
            "store_context": "mixed"
        }
    ]"#;

    #[test]
    fn legacy_array_is_migrated() {
        let (snapshot, report) = parse_snapshot(LEGACY).unwrap();
        assert_eq!(snapshot.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(snapshot.stores.len(), 2);
        let report = report.unwrap();
        assert_eq!(report.dropped_missions, 1);
        assert_eq!(report.dropped_catchment, 1);
        assert_eq!(snapshot.stores[1].store_context, Some(StoreContext::Mixed));

        let out = serde_json::to_string(&snapshot).unwrap();
        assert!(!out.contains("missions"));
        assert!(!out.contains("micro_catchment_population"));
    }

    #[test]
    fn current_envelope_round_trips() {
        let (snapshot, _) = parse_snapshot(LEGACY).unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let (again, report) = parse_snapshot(&json).unwrap();
        assert!(report.is_none());
        assert_eq!(again, snapshot);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let json = r#"{ "schema_version": 9, "stores": [] }"#;
        let err = parse_snapshot(json).unwrap_err();
        assert!(matches!(err, AssortmentError::UnsupportedSchemaVersion(9)));
    }

    #[test]
    fn duplicate_ids_fail_fast() {
        let json = r#"[
            { "store_id": "X", "retailer": "Tesco", "format": "Supermarket",
              "latitude": 51.5, "longitude": -0.1, "region": "London" },
            { "store_id": "X", "retailer": "Asda", "format": "Supermarket",
              "latitude": 51.6, "longitude": -0.1, "region": "London" }
        ]"#;
        let err = parse_snapshot(json).unwrap_err();
        assert!(matches!(err, AssortmentError::InvalidStore { .. }));
    }

    #[test]
    fn missing_required_field_fails() {
        let json = r#"[{ "store_id": "X", "retailer": "Tesco", "format": "Supermarket" }]"#;
        assert!(matches!(
            parse_snapshot(json).unwrap_err(),
            AssortmentError::Json(_)
        ));
    }

    #[test]
    fn unknown_format_fails() {
        let json = r#"[{ "store_id": "X", "retailer": "Tesco", "format": "Kiosk",
            "latitude": 51.5, "longitude": -0.1, "region": "London" }]"#;
        assert!(parse_snapshot(json).is_err());
    }
}
