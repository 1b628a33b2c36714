use std::collections::BTreeMap;

use assortment_core::config::{BrandTierTable, VariationConfig};
use assortment_core::variation::apply_template_variation;
use assortment_core::{Assortment, Store, TemplateRepository};

/// Output of one generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerationRun {
    pub assortments: Vec<Assortment>,
    /// Store ids skipped because no template matched.
    pub missing_template: Vec<String>,
    /// Skipped store counts per unmatched template key.
    pub missing_by_key: BTreeMap<String, usize>,
}

impl GenerationRun {
    pub fn aspirational_count(&self) -> usize {
        self.assortments
            .iter()
            .filter(|a| a.aspirational_substitution)
            .count()
    }

    pub fn average_variation_pct(&self) -> f64 {
        if self.assortments.is_empty() {
            return 0.0;
        }
        self.assortments
            .iter()
            .map(|a| a.variation_percentage)
            .sum::<f64>()
            / self.assortments.len() as f64
    }
}

/// Generate an assortment for every store with a matching template.
///
/// Stores without a template are skipped and counted, never fatal. Output
/// order follows input order.
pub fn generate_assortments(
    stores: &[Store],
    templates: &TemplateRepository,
    tiers: &BrandTierTable,
    config: &VariationConfig,
) -> GenerationRun {
    let mut run = GenerationRun::default();

    for store in stores {
        match templates.find_template(store) {
            Some(template) => {
                run.assortments
                    .push(apply_template_variation(store, template, tiers, config));
            }
            None => {
                run.missing_template.push(store.store_id.clone());
                *run.missing_by_key.entry(store.template_key()).or_insert(0) += 1;
            }
        }
    }

    if !run.missing_template.is_empty() {
        log::warn!(
            "{} stores skipped with no template: {:?}",
            run.missing_template.len(),
            run.missing_by_key
        );
    }
    log::info!(
        "generated {} assortments ({} aspirational, avg variation {:.2}%)",
        run.assortments.len(),
        run.aspirational_count(),
        run.average_variation_pct()
    );

    run
}
