//! Template-based assortment variation.
//!
//! Turns a store and its resolved template into a concrete SKU list. Every
//! random decision draws from a `StoreRng` seeded by the store id, in a fixed
//! order:
//!
//! 1. variation fraction (one draw)
//! 2. aspirational substitution (one draw, eligible discounter templates only)
//! 3. swaps (two draws per swap: slot to overwrite, then pool entry)
//!
//! Changing that order changes every generated assortment.

use std::collections::BTreeMap;

use crate::config::{BrandTierTable, VariationConfig};
use crate::rng::StoreRng;
use crate::types::{Assortment, BrandTier, RankedSku, Store, Template, TierBreakdown};

/// Build the assortment for `store` from `template`.
pub fn apply_template_variation(
    store: &Store,
    template: &Template,
    tiers: &BrandTierTable,
    config: &VariationConfig,
) -> Assortment {
    let mut rng = StoreRng::for_store(&store.store_id);
    apply_with_rng(&store.store_id, template, tiers, config, &mut rng)
}

/// Same as `apply_template_variation` with a caller-supplied stream.
pub fn apply_with_rng(
    store_id: &str,
    template: &Template,
    tiers: &BrandTierTable,
    config: &VariationConfig,
    rng: &mut StoreRng,
) -> Assortment {
    let variation = variation_fraction(template, config, rng);

    let baseline = template.baseline();
    let mut working: Vec<&RankedSku> = baseline.iter().collect();

    let aspirational_substitution = substitute_aspirational(template, tiers, config, &mut working, rng);

    let num_swaps = (baseline.len() as f64 * variation).floor() as usize;
    let pool_end = (baseline.len() + num_swaps + config.pool_buffer).min(template.ranked_skus.len());
    let pool = &template.ranked_skus[baseline.len()..pool_end];

    if pool.is_empty() {
        log::debug!(
            "store={} template={} has no swap candidates, keeping baseline",
            store_id,
            template.template_id
        );
        return build(store_id, template, &working, 0.0, 0, aspirational_substitution, tiers);
    }

    for _ in 0..num_swaps {
        let slot = rng.next_index(working.len());
        let pick = rng.next_index(pool.len());
        working[slot] = &pool[pick];
    }

    build(
        store_id,
        template,
        &working,
        variation * 100.0,
        num_swaps,
        aspirational_substitution,
        tiers,
    )
}

/// Draw the share of baseline slots to swap.
///
/// `[0.10, 0.15)` by default, shifted up by the tier3 bonus.
pub fn variation_fraction(template: &Template, config: &VariationConfig, rng: &mut StoreRng) -> f64 {
    let mut v = config.base_min + rng.next_f64() * config.base_spread;
    if template.is_tier3 {
        v += config.tier3_bonus;
    }
    v
}

/// Maybe replace the worst-ranked value-tier baseline slot with the
/// template's aspirational SKU. Returns whether the swap happened.
///
/// Templates that are not discounters, or have no aspirational SKU, consume
/// no draw.
fn substitute_aspirational<'a>(
    template: &'a Template,
    tiers: &BrandTierTable,
    config: &VariationConfig,
    working: &mut [&'a RankedSku],
    rng: &mut StoreRng,
) -> bool {
    if !template.aspirational_eligible() {
        return false;
    }
    let Some(aspirational) = template.aspirational_sku.as_ref() else {
        return false;
    };
    if rng.next_f64() >= config.aspirational_probability {
        return false;
    }

    let target = working
        .iter()
        .enumerate()
        .filter(|(_, sku)| tiers.tier_of(&sku.brand) == BrandTier::Value)
        .max_by_key(|(_, sku)| sku.rank)
        .map(|(idx, _)| idx);

    match target {
        Some(idx) => {
            working[idx] = aspirational;
            true
        }
        None => false,
    }
}

fn build(
    store_id: &str,
    template: &Template,
    skus: &[&RankedSku],
    variation_percentage: f64,
    num_swaps: usize,
    aspirational_substitution: bool,
    tiers: &BrandTierTable,
) -> Assortment {
    let mut brand_breakdown: BTreeMap<String, usize> = BTreeMap::new();
    let mut tier_breakdown = TierBreakdown::default();
    for sku in skus {
        *brand_breakdown.entry(sku.brand.clone()).or_insert(0) += 1;
        tier_breakdown.add(tiers.tier_of(&sku.brand), 1);
    }

    Assortment {
        store_id: store_id.to_string(),
        template_id: template.template_id.clone(),
        sku_ids: skus.iter().map(|s| s.sku_id.clone()).collect(),
        sku_count: skus.len(),
        variation_percentage,
        num_swaps,
        aspirational_substitution,
        brand_breakdown,
        tier_breakdown,
    }
}
