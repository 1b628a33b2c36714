//! Store-seeded assortment generation for a synthetic UK grocery estate.
//!
//! The leaf crate of the workspace: data model, deterministic RNG, template
//! repository, variation engine and the read-only analytics computed over
//! its output. Nothing here touches the filesystem except `Config::from_file`.

pub mod analytics;
pub mod config;
pub mod error;
pub mod geo;
pub mod rng;
pub mod template;
pub mod thresholds;
pub mod types;
pub mod variation;

pub use config::{
    BrandTierTable, Config, ParentTemplateTable, Positioning, PositioningTable, VariationConfig,
};
pub use error::{AssortmentError, AssortmentResult};
pub use rng::StoreRng;
pub use template::TemplateRepository;
pub use types::{
    Assortment, BrandTier, Competitor, Format, RankedSku, Store, StoreContext, Template,
    TierBreakdown,
};
pub use variation::apply_template_variation;
