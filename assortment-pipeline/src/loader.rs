//! JSON and CSV file I/O.
//!
//! Every input is a JSON document; outputs are pretty JSON, a CSV summary of
//! generated assortments, and Markdown written by `report`. Nothing here
//! recovers from malformed input: the first bad record fails the load.

use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use assortment_core::{Assortment, AssortmentError, AssortmentResult, TemplateRepository};

use crate::schema::{parse_snapshot, MigrationReport, StoreSnapshot};

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> AssortmentResult<T> {
    let path = path.as_ref();
    let json = read_text(path)?;
    serde_json::from_str(&json).map_err(AssortmentError::from)
}

/// Write a value as pretty JSON with a trailing newline.
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> AssortmentResult<()> {
    let path = path.as_ref();
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    write_text(path, &json)
}

pub fn read_text(path: &Path) -> AssortmentResult<String> {
    std::fs::read_to_string(path).map_err(|e| AssortmentError::io(path.display().to_string(), e))
}

pub fn write_text(path: &Path, text: &str) -> AssortmentResult<()> {
    std::fs::write(path, text).map_err(|e| AssortmentError::io(path.display().to_string(), e))
}

/// Load a store snapshot in any supported schema version.
pub fn load_stores_file(
    path: impl AsRef<Path>,
) -> AssortmentResult<(StoreSnapshot, Option<MigrationReport>)> {
    let json = read_text(path.as_ref())?;
    parse_snapshot(&json)
}

/// Load and validate a templates file (a JSON array of templates).
pub fn load_templates_file(path: impl AsRef<Path>) -> AssortmentResult<TemplateRepository> {
    let json = read_text(path.as_ref())?;
    TemplateRepository::from_json(&json)
}

pub fn load_assortments_file(path: impl AsRef<Path>) -> AssortmentResult<Vec<Assortment>> {
    read_json(path)
}

/// One CSV row per generated assortment.
#[derive(Debug, Serialize)]
struct AssortmentCsvRow<'a> {
    store_id: &'a str,
    template_id: &'a str,
    sku_count: usize,
    unique_skus: usize,
    variation_percentage: f64,
    num_swaps: usize,
    aspirational_substitution: bool,
    premium: usize,
    mainstream: usize,
    value: usize,
}

/// Write an assortment summary table as CSV.
pub fn write_assortment_csv<W: Write>(writer: W, assortments: &[Assortment]) -> AssortmentResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for a in assortments {
        csv_writer.serialize(AssortmentCsvRow {
            store_id: &a.store_id,
            template_id: &a.template_id,
            sku_count: a.sku_count,
            unique_skus: a.unique_sku_count(),
            variation_percentage: (a.variation_percentage * 100.0).round() / 100.0,
            num_swaps: a.num_swaps,
            aspirational_substitution: a.aspirational_substitution,
            premium: a.tier_breakdown.premium,
            mainstream: a.tier_breakdown.mainstream,
            value: a.tier_breakdown.value,
        })?;
    }
    csv_writer
        .flush()
        .map_err(|e| AssortmentError::io("<csv writer>", e))?;
    Ok(())
}

pub fn write_assortment_csv_file(path: impl AsRef<Path>, assortments: &[Assortment]) -> AssortmentResult<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .map_err(|e| AssortmentError::io(path.display().to_string(), e))?;
    write_assortment_csv(file, assortments)
}
