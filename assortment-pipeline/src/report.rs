//! Markdown diagnostic reports.
//!
//! Plain-text tables for humans; there is no machine-readable contract here.
//! Callers pass `generated_at` so output is reproducible in tests. Each
//! report has a `write_*` form over any `fmt::Write` and a `String` form.

use std::collections::BTreeMap;
use std::fmt::{self, Write};

use assortment_core::analytics::{
    consistency_by_template, cross_template_overlap, deviation_by_template,
    diversity_by_template, tier_distribution, Verdict,
};
use assortment_core::{Assortment, Config, Format, Store, StoreContext, TemplateRepository};

use crate::generation::GenerationRun;

/// Assortment validation report: consistency, diversity, deviation, tiers.
pub fn validation_report(
    assortments: &[Assortment],
    templates: &TemplateRepository,
    config: &Config,
    generated_at: &str,
) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_validation_report(&mut out, assortments, templates, config, generated_at);
    out
}

pub fn write_validation_report<W: Write>(
    out: &mut W,
    assortments: &[Assortment],
    templates: &TemplateRepository,
    config: &Config,
    generated_at: &str,
) -> fmt::Result {
    write_header(out, "Assortment Validation Report", generated_at)?;
    write_summary_section(out, assortments)?;
    write_consistency_section(out, assortments)?;
    write_cross_overlap_section(out, assortments, templates)?;
    write_diversity_section(out, assortments, templates)?;
    write_deviation_section(out, assortments, templates)?;
    write_tier_section(out, assortments, templates, config)
}

fn write_header<W: Write>(out: &mut W, title: &str, generated_at: &str) -> fmt::Result {
    writeln!(out, "# {}", title)?;
    writeln!(out)?;
    writeln!(out, "Generated: {}", generated_at)?;
    writeln!(out)
}

fn write_summary_section<W: Write>(out: &mut W, assortments: &[Assortment]) -> fmt::Result {
    let aspirational = assortments.iter().filter(|a| a.aspirational_substitution).count();
    let swaps: usize = assortments.iter().map(|a| a.num_swaps).sum();
    let duplicated = assortments
        .iter()
        .filter(|a| a.unique_sku_count() < a.sku_count)
        .count();
    writeln!(out, "## Summary")?;
    writeln!(out)?;
    writeln!(out, "- Stores: {}", assortments.len())?;
    writeln!(out, "- Templates in use: {}", distinct_templates(assortments))?;
    writeln!(out, "- Total swaps: {}", swaps)?;
    writeln!(out, "- Aspirational substitutions: {}", aspirational)?;
    writeln!(out, "- Stores carrying duplicate SKUs: {}", duplicated)?;
    writeln!(out)
}

fn write_consistency_section<W: Write>(out: &mut W, assortments: &[Assortment]) -> fmt::Result {
    writeln!(out, "## Within-template consistency (expected 80–90%)")?;
    writeln!(out)?;
    writeln!(out, "| Template | Stores | Mean overlap | Min overlap | Status |")?;
    writeln!(out, "|---|---:|---:|---:|---|")?;
    for stat in consistency_by_template(assortments) {
        writeln!(
            out,
            "| {} | {} | {:.1}% | {:.1}% | {} |",
            stat.template_id, stat.store_count, stat.mean_overlap_pct, stat.min_overlap_pct, stat.status
        )?;
    }
    writeln!(out)
}

fn write_cross_overlap_section<W: Write>(
    out: &mut W,
    assortments: &[Assortment],
    templates: &TemplateRepository,
) -> fmt::Result {
    // Overlap is asymmetric, so both directions are shown.
    writeln!(out, "## Cross-retailer overlap by format")?;
    writeln!(out)?;
    writeln!(out, "| Format | From | To | Overlap | Reverse |")?;
    writeln!(out, "|---|---|---|---:|---:|")?;
    let sorted = templates.iter_sorted();
    for (i, from) in sorted.iter().enumerate() {
        for to in sorted[i + 1..].iter().filter(|t| t.format == from.format) {
            let forward = cross_template_overlap(assortments, &from.template_id, &to.template_id);
            let reverse = cross_template_overlap(assortments, &to.template_id, &from.template_id);
            if let (Some(forward), Some(reverse)) = (forward, reverse) {
                writeln!(
                    out,
                    "| {} | {} | {} | {:.1}% | {:.1}% |",
                    from.format, from.template_id, to.template_id, forward, reverse
                )?;
            }
        }
    }
    writeln!(out)
}

fn write_diversity_section<W: Write>(
    out: &mut W,
    assortments: &[Assortment],
    templates: &TemplateRepository,
) -> fmt::Result {
    writeln!(out, "## SKU pool diversity (healthy 1.2–1.8)")?;
    writeln!(out)?;
    writeln!(out, "| Template | Stores | Unique SKUs | Baseline | Ratio | Status |")?;
    writeln!(out, "|---|---:|---:|---:|---:|---|")?;
    for stat in diversity_by_template(assortments, templates) {
        writeln!(
            out,
            "| {} | {} | {} | {} | {:.2} | {} |",
            stat.template_id, stat.store_count, stat.unique_skus, stat.baseline_sku_count, stat.ratio, stat.status
        )?;
    }
    writeln!(out)
}

fn write_deviation_section<W: Write>(
    out: &mut W,
    assortments: &[Assortment],
    templates: &TemplateRepository,
) -> fmt::Result {
    writeln!(out, "## Template deviation")?;
    writeln!(out)?;
    writeln!(
        out,
        "| Template | Stores | Avg retention | Avg deviation | Added | Removed | ≥95% | 85–95% | 75–85% | <75% |"
    )?;
    writeln!(out, "|---|---:|---:|---:|---:|---:|---:|---:|---:|---:|")?;
    for d in deviation_by_template(assortments, templates) {
        writeln!(
            out,
            "| {} | {} | {:.1}% | {:.1}% | {:.1} | {:.1} | {} | {} | {} | {} |",
            d.template_id,
            d.store_count,
            d.avg_retention_pct,
            d.avg_deviation_pct,
            d.avg_added,
            d.avg_removed,
            d.bands.high,
            d.bands.typical,
            d.bands.loose,
            d.bands.divergent
        )?;
    }
    writeln!(out)
}

fn write_tier_section<W: Write>(
    out: &mut W,
    assortments: &[Assortment],
    templates: &TemplateRepository,
    config: &Config,
) -> fmt::Result {
    let tiers = tier_distribution(
        assortments,
        templates,
        &config.positioning,
        &config.tier_expectations,
    );
    writeln!(out, "## Tier distribution by retailer")?;
    writeln!(out)?;
    writeln!(out, "| Retailer | Positioning | Stores | Premium | Mainstream | Value | Verdict | Notes |")?;
    writeln!(out, "|---|---|---:|---:|---:|---:|---|---|")?;
    for t in &tiers {
        let positioning = t
            .positioning
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "| {} | {} | {} | {:.1}% | {:.1}% | {:.1}% | {} | {} |",
            t.retailer,
            positioning,
            t.store_count,
            t.premium_pct,
            t.mainstream_pct,
            t.value_pct,
            t.verdict,
            t.notes.join("; ")
        )?;
    }
    let failing = tiers.iter().filter(|t| t.verdict == Verdict::Fail).count();
    let warning = tiers.iter().filter(|t| t.verdict == Verdict::Warn).count();
    writeln!(out)?;
    writeln!(out, "{} retailers failing, {} warning.", failing, warning)
}

/// Short Markdown summary of a generation run.
pub fn generation_summary(run: &GenerationRun, generated_at: &str) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_generation_summary(&mut out, run, generated_at);
    out
}

pub fn write_generation_summary<W: Write>(
    out: &mut W,
    run: &GenerationRun,
    generated_at: &str,
) -> fmt::Result {
    write_header(out, "Assortment Generation", generated_at)?;
    writeln!(out, "- Assortments: {}", run.assortments.len())?;
    writeln!(out, "- Average variation: {:.2}%", run.average_variation_pct())?;
    writeln!(out, "- Aspirational substitutions: {}", run.aspirational_count())?;
    writeln!(out, "- Stores with no template: {}", run.missing_template.len())?;
    if !run.missing_by_key.is_empty() {
        writeln!(out)?;
        writeln!(out, "| Missing template | Stores |")?;
        writeln!(out, "|---|---:|")?;
        for (key, count) in &run.missing_by_key {
            writeln!(out, "| {} | {} |", key, count)?;
        }
    }
    Ok(())
}

/// Geometry summary: clusters, context mix per format, competition depth.
pub fn geo_summary(stores: &[Store], generated_at: &str) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_geo_summary(&mut out, stores, generated_at);
    out
}

pub fn write_geo_summary<W: Write>(out: &mut W, stores: &[Store], generated_at: &str) -> fmt::Result {
    write_header(out, "Store Geometry Summary", generated_at)?;

    let mut cluster_sizes: BTreeMap<&str, usize> = BTreeMap::new();
    for s in stores {
        if let Some(id) = s.cluster_id.as_deref() {
            *cluster_sizes.entry(id).or_insert(0) += 1;
        }
    }
    let multi = cluster_sizes.values().filter(|&&n| n > 1).count();
    let largest = cluster_sizes.values().copied().max().unwrap_or(0);
    writeln!(out, "- Stores: {}", stores.len())?;
    writeln!(
        out,
        "- Clusters: {} ({} with more than one store, largest {})",
        cluster_sizes.len(),
        multi,
        largest
    )?;
    writeln!(out)?;

    let contexts = [
        StoreContext::Residential,
        StoreContext::Mixed,
        StoreContext::Transit,
        StoreContext::OfficeCore,
    ];
    writeln!(out, "## Store context by format")?;
    writeln!(out)?;
    writeln!(out, "| Format | Stores | residential | mixed | transit | office_core | Avg competitors |")?;
    writeln!(out, "|---|---:|---:|---:|---:|---:|---:|")?;
    for format in Format::ALL {
        let members: Vec<&Store> = stores.iter().filter(|s| s.format == format).collect();
        if members.is_empty() {
            continue;
        }
        let counts: Vec<usize> = contexts
            .iter()
            .map(|c| members.iter().filter(|s| s.store_context == Some(*c)).count())
            .collect();
        let avg_competitors = members
            .iter()
            .map(|s| s.nearby_competition.len())
            .sum::<usize>() as f64
            / members.len() as f64;
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {:.1} |",
            format,
            members.len(),
            counts[0],
            counts[1],
            counts[2],
            counts[3],
            avg_competitors
        )?;
    }
    Ok(())
}

fn distinct_templates(assortments: &[Assortment]) -> usize {
    let mut ids: Vec<&str> = assortments.iter().map(|a| a.template_id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::fixtures::store_at;

    /// Accepts `limit` writes, then fails every write after that.
    struct Budgeted {
        limit: usize,
        attempts: usize,
    }

    impl Budgeted {
        fn new(limit: usize) -> Self {
            Self { limit, attempts: 0 }
        }
    }

    impl Write for Budgeted {
        fn write_str(&mut self, _s: &str) -> fmt::Result {
            self.attempts += 1;
            if self.attempts > self.limit {
                return Err(fmt::Error);
            }
            Ok(())
        }
    }

    #[test]
    fn geo_summary_counts_contexts() {
        let mut stores = vec![
            store_at("A", "Tesco", Format::Supermarket, 0.0),
            store_at("B", "Asda", Format::Supermarket, 500.0),
            store_at("C", "Shell", Format::Forecourt, 9000.0),
        ];
        stores[0].store_context = Some(StoreContext::Mixed);
        stores[1].store_context = Some(StoreContext::Mixed);
        stores[2].store_context = Some(StoreContext::Transit);
        stores[0].cluster_id = Some("cluster_0001".into());
        stores[1].cluster_id = Some("cluster_0001".into());
        stores[2].cluster_id = Some("cluster_0002".into());

        let md = geo_summary(&stores, "2026-01-01T00:00:00Z");
        assert!(md.contains("- Clusters: 2 (1 with more than one store, largest 2)"));
        assert!(md.contains("| Supermarket | 2 | 0 | 2 | 0 | 0 | 0.0 |"));
        assert!(md.contains("| Forecourt | 1 | 0 | 0 | 1 | 0 | 0.0 |"));
        assert!(!md.contains("| Hypermarket"));
    }

    #[test]
    fn generation_summary_lists_missing_keys() {
        let mut run = GenerationRun::default();
        run.missing_template.push("X1".into());
        run.missing_by_key.insert("BoothsForecourt".into(), 1);
        let md = generation_summary(&run, "t");
        assert!(md.contains("| BoothsForecourt | 1 |"));
        assert!(md.contains("- Stores with no template: 1"));
    }

    #[test]
    fn writer_errors_stop_the_report() {
        let mut run = GenerationRun::default();
        run.missing_by_key.insert("BoothsForecourt".into(), 1);

        // "# {}\n" is three writes; the blank line after it is the first refused.
        let mut sink = Budgeted::new(3);
        assert!(write_generation_summary(&mut sink, &run, "t").is_err());
        assert_eq!(sink.attempts, 4);

        let mut sink = Budgeted::new(3);
        assert!(write_geo_summary(&mut sink, &[], "t").is_err());
        assert_eq!(sink.attempts, 4);

        let mut sink = Budgeted::new(3);
        let repo = TemplateRepository::default();
        assert!(write_validation_report(&mut sink, &[], &repo, &Config::default(), "t").is_err());
        assert_eq!(sink.attempts, 4);
    }

    #[test]
    fn written_form_matches_string_form() {
        let run = GenerationRun::default();
        let mut out = String::new();
        write_generation_summary(&mut out, &run, "t").unwrap();
        assert_eq!(out, generation_summary(&run, "t"));
    }
}
