//! Batch passes over the store snapshot and the assortment outputs.
//!
//! Geometry repair runs as an ordered list of [`pass::StorePass`] trait
//! objects; assortment generation, reporting and file I/O sit alongside it.
//! Everything here is synchronous and single-threaded.

pub mod components;
pub mod dataset_index;
pub mod generation;
pub mod loader;
pub mod pass;
pub mod pipelines;
pub mod report;
pub mod schema;

pub use dataset_index::DatasetIndex;
pub use generation::{generate_assortments, GenerationRun};
pub use pipelines::geo_repair::{GeoRepairPipeline, RepairResult};
pub use schema::{StoreSnapshot, CURRENT_SCHEMA_VERSION};
