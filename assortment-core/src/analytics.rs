//! Read-only aggregations over generated assortments.
//!
//! Each function is independent; none of them mutate their inputs. Groups
//! are keyed by template id, which is one-to-one with (retailer, format).

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::config::{Positioning, PositioningTable, TierExpectations};
use crate::template::TemplateRepository;
use crate::thresholds::{CONSISTENCY_MAX_PCT, CONSISTENCY_MIN_PCT, DIVERSITY_NARROW, DIVERSITY_WIDE};
use crate::types::{Assortment, BrandTier, Template, TierBreakdown};

// ---------------------------------------------------------------------------
// Overlap
// ---------------------------------------------------------------------------

/// Percentage of `a`'s entries that also appear in `b`.
///
/// Deliberately asymmetric: the denominator is `a.len()`, so
/// `overlap_pct(a, b) != overlap_pct(b, a)` whenever the lengths differ.
/// Duplicate entries in `a` count once per occurrence.
pub fn overlap_pct(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() {
        return 0.0;
    }
    let in_b: HashSet<&str> = b.iter().map(String::as_str).collect();
    let shared = a.iter().filter(|id| in_b.contains(id.as_str())).count();
    shared as f64 / a.len() as f64 * 100.0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ConsistencyStatus {
    BelowBand,
    InBand,
    AboveBand,
    /// Fewer than two stores, nothing to compare.
    Insufficient,
}

impl fmt::Display for ConsistencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyStatus::BelowBand => write!(f, "below band"),
            ConsistencyStatus::InBand => write!(f, "in band"),
            ConsistencyStatus::AboveBand => write!(f, "above band"),
            ConsistencyStatus::Insufficient => write!(f, "n/a"),
        }
    }
}

/// Within-template overlap summary.
#[derive(Clone, Debug, Serialize)]
pub struct ConsistencyStat {
    pub template_id: String,
    pub store_count: usize,
    pub mean_overlap_pct: f64,
    pub min_overlap_pct: f64,
    pub status: ConsistencyStatus,
}

/// Mean overlap across every ordered pair of stores sharing a template.
pub fn consistency_by_template(assortments: &[Assortment]) -> Vec<ConsistencyStat> {
    group_by_template(assortments)
        .into_iter()
        .map(|(template_id, group)| {
            if group.len() < 2 {
                return ConsistencyStat {
                    template_id,
                    store_count: group.len(),
                    mean_overlap_pct: 0.0,
                    min_overlap_pct: 0.0,
                    status: ConsistencyStatus::Insufficient,
                };
            }

            let mut total = 0.0;
            let mut min = f64::INFINITY;
            let mut pairs = 0usize;
            for (i, a) in group.iter().enumerate() {
                for (j, b) in group.iter().enumerate() {
                    if i == j {
                        continue;
                    }
                    let o = overlap_pct(&a.sku_ids, &b.sku_ids);
                    total += o;
                    min = min.min(o);
                    pairs += 1;
                }
            }
            let mean = total / pairs as f64;
            let status = if mean < CONSISTENCY_MIN_PCT {
                ConsistencyStatus::BelowBand
            } else if mean > CONSISTENCY_MAX_PCT {
                ConsistencyStatus::AboveBand
            } else {
                ConsistencyStatus::InBand
            };

            ConsistencyStat {
                template_id,
                store_count: group.len(),
                mean_overlap_pct: mean,
                min_overlap_pct: min,
                status,
            }
        })
        .collect()
}

/// Mean overlap of every store on template `from` against every store on `to`.
///
/// `None` when either side has no stores.
pub fn cross_template_overlap(assortments: &[Assortment], from: &str, to: &str) -> Option<f64> {
    let left: Vec<&Assortment> = assortments.iter().filter(|a| a.template_id == from).collect();
    let right: Vec<&Assortment> = assortments.iter().filter(|a| a.template_id == to).collect();
    if left.is_empty() || right.is_empty() {
        return None;
    }
    let mut total = 0.0;
    for a in &left {
        for b in &right {
            total += overlap_pct(&a.sku_ids, &b.sku_ids);
        }
    }
    Some(total / (left.len() * right.len()) as f64)
}

// ---------------------------------------------------------------------------
// Diversity
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiversityStatus {
    TooNarrow,
    Healthy,
    TooWide,
}

impl fmt::Display for DiversityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiversityStatus::TooNarrow => write!(f, "too narrow"),
            DiversityStatus::Healthy => write!(f, "healthy"),
            DiversityStatus::TooWide => write!(f, "too wide"),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct DiversityStat {
    pub template_id: String,
    pub store_count: usize,
    pub unique_skus: usize,
    pub baseline_sku_count: usize,
    pub ratio: f64,
    pub status: DiversityStatus,
}

/// Classify a diversity ratio against the narrow/wide thresholds.
pub fn classify_diversity(ratio: f64) -> DiversityStatus {
    if ratio < DIVERSITY_NARROW {
        DiversityStatus::TooNarrow
    } else if ratio > DIVERSITY_WIDE {
        DiversityStatus::TooWide
    } else {
        DiversityStatus::Healthy
    }
}

/// Unique SKUs used across each template's stores over its baseline size.
pub fn diversity_by_template(
    assortments: &[Assortment],
    templates: &TemplateRepository,
) -> Vec<DiversityStat> {
    group_by_template(assortments)
        .into_iter()
        .filter_map(|(template_id, group)| {
            let Some(template) = templates.get(&template_id) else {
                log::warn!("diversity: no template '{}' for {} stores", template_id, group.len());
                return None;
            };
            let unique: HashSet<&str> = group
                .iter()
                .flat_map(|a| a.sku_ids.iter().map(String::as_str))
                .collect();
            let ratio = unique.len() as f64 / template.baseline_sku_count as f64;
            Some(DiversityStat {
                template_id,
                store_count: group.len(),
                unique_skus: unique.len(),
                baseline_sku_count: template.baseline_sku_count,
                ratio,
                status: classify_diversity(ratio),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Template deviation
// ---------------------------------------------------------------------------

/// How one store's assortment differs from its template baseline.
#[derive(Clone, Debug, Serialize)]
pub struct StoreDeviation {
    pub store_id: String,
    pub template_id: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub retained: usize,
    pub retention_pct: f64,
}

pub fn store_deviation(assortment: &Assortment, template: &Template) -> StoreDeviation {
    let baseline_set: HashSet<&str> = template
        .baseline()
        .iter()
        .map(|s| s.sku_id.as_str())
        .collect();
    let actual: HashSet<&str> = assortment.sku_ids.iter().map(String::as_str).collect();

    let mut added: Vec<String> = actual
        .difference(&baseline_set)
        .map(|s| s.to_string())
        .collect();
    added.sort();
    let mut removed: Vec<String> = baseline_set
        .difference(&actual)
        .map(|s| s.to_string())
        .collect();
    removed.sort();
    let retained = baseline_set.intersection(&actual).count();
    let retention_pct = if baseline_set.is_empty() {
        0.0
    } else {
        retained as f64 / baseline_set.len() as f64 * 100.0
    };

    StoreDeviation {
        store_id: assortment.store_id.clone(),
        template_id: assortment.template_id.clone(),
        added,
        removed,
        retained,
        retention_pct,
    }
}

/// Store counts per retention band.
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct RetentionBands {
    /// >= 95 %
    pub high: usize,
    /// 85–95 %
    pub typical: usize,
    /// 75–85 %
    pub loose: usize,
    /// < 75 %
    pub divergent: usize,
}

impl RetentionBands {
    pub fn record(&mut self, retention_pct: f64) {
        if retention_pct >= 95.0 {
            self.high += 1;
        } else if retention_pct >= 85.0 {
            self.typical += 1;
        } else if retention_pct >= 75.0 {
            self.loose += 1;
        } else {
            self.divergent += 1;
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TemplateDeviation {
    pub template_id: String,
    pub store_count: usize,
    pub avg_retention_pct: f64,
    pub avg_deviation_pct: f64,
    pub avg_added: f64,
    pub avg_removed: f64,
    pub bands: RetentionBands,
}

pub fn deviation_by_template(
    assortments: &[Assortment],
    templates: &TemplateRepository,
) -> Vec<TemplateDeviation> {
    group_by_template(assortments)
        .into_iter()
        .filter_map(|(template_id, group)| {
            let Some(template) = templates.get(&template_id) else {
                log::warn!("deviation: no template '{}' for {} stores", template_id, group.len());
                return None;
            };
            let mut bands = RetentionBands::default();
            let mut retention = 0.0;
            let mut added = 0usize;
            let mut removed = 0usize;
            for a in &group {
                let d = store_deviation(a, template);
                bands.record(d.retention_pct);
                retention += d.retention_pct;
                added += d.added.len();
                removed += d.removed.len();
            }
            let n = group.len() as f64;
            let avg_retention_pct = retention / n;
            Some(TemplateDeviation {
                template_id,
                store_count: group.len(),
                avg_retention_pct,
                avg_deviation_pct: 100.0 - avg_retention_pct,
                avg_added: added as f64 / n,
                avg_removed: removed as f64 / n,
                bands,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tier distribution
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
    Unclassified,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Warn => write!(f, "WARN"),
            Verdict::Fail => write!(f, "FAIL"),
            Verdict::Unclassified => write!(f, "-"),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TierDistribution {
    pub retailer: String,
    pub positioning: Option<Positioning>,
    pub store_count: usize,
    pub totals: TierBreakdown,
    pub premium_pct: f64,
    pub mainstream_pct: f64,
    pub value_pct: f64,
    pub verdict: Verdict,
    pub notes: Vec<String>,
}

/// Sum tier counts per retailer and check them against positioning targets.
pub fn tier_distribution(
    assortments: &[Assortment],
    templates: &TemplateRepository,
    positioning: &PositioningTable,
    expectations: &TierExpectations,
) -> Vec<TierDistribution> {
    let mut by_retailer: BTreeMap<String, (usize, TierBreakdown)> = BTreeMap::new();
    for a in assortments {
        let Some(template) = templates.get(&a.template_id) else {
            continue;
        };
        let entry = by_retailer
            .entry(template.retailer.clone())
            .or_insert((0, TierBreakdown::default()));
        entry.0 += 1;
        entry.1.merge(&a.tier_breakdown);
    }

    by_retailer
        .into_iter()
        .map(|(retailer, (store_count, totals))| {
            let premium_pct = totals.share_pct(BrandTier::Premium);
            let mainstream_pct = totals.share_pct(BrandTier::Mainstream);
            let value_pct = totals.share_pct(BrandTier::Value);
            let pos = positioning.positioning_of(&retailer);

            let mut notes = Vec::new();
            let verdict = match pos {
                None => Verdict::Unclassified,
                Some(Positioning::Premium) => at_least(
                    "premium",
                    premium_pct,
                    expectations.premium_min_premium,
                    expectations.warn_margin,
                    &mut notes,
                ),
                Some(Positioning::Mainstream) => at_least(
                    "mainstream",
                    mainstream_pct,
                    expectations.mainstream_min_mainstream,
                    expectations.warn_margin,
                    &mut notes,
                ),
                Some(Positioning::Value) => {
                    let v = at_least(
                        "value",
                        value_pct,
                        expectations.value_min_value,
                        expectations.warn_margin,
                        &mut notes,
                    );
                    let p = at_most(
                        "premium",
                        premium_pct,
                        expectations.value_max_premium,
                        expectations.warn_margin,
                        &mut notes,
                    );
                    v.max(p)
                }
            };

            TierDistribution {
                retailer,
                positioning: pos,
                store_count,
                totals,
                premium_pct,
                mainstream_pct,
                value_pct,
                verdict,
                notes,
            }
        })
        .collect()
}

fn at_least(label: &str, actual: f64, min: f64, margin: f64, notes: &mut Vec<String>) -> Verdict {
    let shortfall = min - actual;
    if shortfall <= 0.0 {
        return Verdict::Pass;
    }
    notes.push(format!("{} share {:.1}% below {:.0}% target", label, actual, min));
    if shortfall <= margin {
        Verdict::Warn
    } else {
        Verdict::Fail
    }
}

fn at_most(label: &str, actual: f64, max: f64, margin: f64, notes: &mut Vec<String>) -> Verdict {
    let excess = actual - max;
    if excess <= 0.0 {
        return Verdict::Pass;
    }
    notes.push(format!("{} share {:.1}% above {:.0}% ceiling", label, actual, max));
    if excess <= margin {
        Verdict::Warn
    } else {
        Verdict::Fail
    }
}

fn group_by_template(assortments: &[Assortment]) -> BTreeMap<String, Vec<&Assortment>> {
    let mut groups: BTreeMap<String, Vec<&Assortment>> = BTreeMap::new();
    for a in assortments {
        groups.entry(a.template_id.clone()).or_default().push(a);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{template_key, Format, RankedSku};

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn assortment(store: &str, template: &str, skus: &[&str]) -> Assortment {
        Assortment {
            store_id: store.into(),
            template_id: template.into(),
            sku_ids: ids(skus),
            sku_count: skus.len(),
            variation_percentage: 0.0,
            num_swaps: 0,
            aspirational_substitution: false,
            brand_breakdown: BTreeMap::new(),
            tier_breakdown: TierBreakdown::default(),
        }
    }

    fn template(retailer: &str, format: Format, ranked: u32, baseline: usize) -> Template {
        Template {
            template_id: template_key(retailer, format),
            retailer: retailer.into(),
            format,
            ranked_skus: (1..=ranked)
                .map(|rank| RankedSku {
                    sku_id: format!("S{}", rank),
                    brand: "Brand".into(),
                    name: String::new(),
                    rank,
                    occasion_shares: Default::default(),
                    segment_shares: Default::default(),
                })
                .collect(),
            baseline_sku_count: baseline,
            is_tier3: false,
            aspirational_sku: None,
        }
    }

    /// Baseline S1..S10 with S9 and S10 both swapped for S11.
    fn swapped_store(store: &str, template_id: &str) -> Assortment {
        let mut a = assortment(
            store,
            template_id,
            &["S1", "S2", "S3", "S4", "S5", "S6", "S7", "S8", "S11", "S11"],
        );
        a.tier_breakdown = TierBreakdown {
            premium: 3,
            mainstream: 1,
            value: 6,
        };
        a
    }

    #[test]
    fn store_deviation_counts_against_baseline() {
        let t = template("Aldi", Format::Discounter, 15, 10);
        let d = store_deviation(&swapped_store("ALD-1", &t.template_id), &t);
        assert_eq!(d.added, vec!["S11"]);
        assert_eq!(d.removed, vec!["S10", "S9"]);
        assert_eq!(d.retained, 8);
        assert!((d.retention_pct - 80.0).abs() < 1e-9);
    }

    #[test]
    fn deviation_averages_and_bands_per_template() {
        let t = template("Aldi", Format::Discounter, 15, 10);
        let repo = TemplateRepository::from_templates(vec![t.clone()]).unwrap();
        let full = assortment(
            "ALD-2",
            &t.template_id,
            &["S1", "S2", "S3", "S4", "S5", "S6", "S7", "S8", "S9", "S10"],
        );
        let list = vec![swapped_store("ALD-1", &t.template_id), full];

        let stats = deviation_by_template(&list, &repo);
        assert_eq!(stats.len(), 1);
        let d = &stats[0];
        assert_eq!(d.store_count, 2);
        assert!((d.avg_retention_pct - 90.0).abs() < 1e-9);
        assert!((d.avg_deviation_pct - 10.0).abs() < 1e-9);
        assert!((d.avg_added - 0.5).abs() < 1e-9);
        assert!((d.avg_removed - 1.0).abs() < 1e-9);
        assert_eq!(
            d.bands,
            RetentionBands {
                high: 1,
                typical: 0,
                loose: 1,
                divergent: 0
            }
        );
    }

    #[test]
    fn diversity_is_unique_skus_over_baseline() {
        let t = template("Aldi", Format::Discounter, 15, 10);
        let repo = TemplateRepository::from_templates(vec![t.clone()]).unwrap();

        let alone = diversity_by_template(&[swapped_store("ALD-1", &t.template_id)], &repo);
        assert_eq!(alone[0].unique_skus, 9);
        assert!((alone[0].ratio - 0.9).abs() < 1e-9);
        assert_eq!(alone[0].status, DiversityStatus::TooNarrow);

        let wider = assortment(
            "ALD-2",
            &t.template_id,
            &["S1", "S2", "S3", "S4", "S5", "S11", "S12", "S13", "S14", "S15"],
        );
        let list = vec![swapped_store("ALD-1", &t.template_id), wider];
        let stats = diversity_by_template(&list, &repo);
        assert_eq!(stats[0].store_count, 2);
        assert_eq!(stats[0].unique_skus, 13);
        assert_eq!(stats[0].baseline_sku_count, 10);
        assert!((stats[0].ratio - 1.3).abs() < 1e-9);
        assert_eq!(stats[0].status, DiversityStatus::Healthy);
    }

    #[test]
    fn tier_distribution_verdicts_by_positioning() {
        let aldi = template("Aldi", Format::Discounter, 10, 10);
        let waitrose = template("Waitrose", Format::Supermarket, 10, 10);
        let nobody = template("Nobody", Format::Convenience, 10, 10);
        let list = vec![
            swapped_store("ALD-1", &aldi.template_id),
            swapped_store("WTR-1", &waitrose.template_id),
            swapped_store("NOB-1", &nobody.template_id),
        ];
        let repo = TemplateRepository::from_templates(vec![aldi, waitrose, nobody]).unwrap();
        let positioning = PositioningTable::new()
            .with("Aldi", Positioning::Value)
            .with("Waitrose", Positioning::Premium);

        let stats = tier_distribution(&list, &repo, &positioning, &TierExpectations::default());
        let retailers: Vec<&str> = stats.iter().map(|t| t.retailer.as_str()).collect();
        assert_eq!(retailers, vec!["Aldi", "Nobody", "Waitrose"]);

        // 60% value passes, 30% premium is 10 points over the 20% ceiling.
        assert_eq!(stats[0].verdict, Verdict::Fail);
        assert_eq!(stats[0].notes, vec!["premium share 30.0% above 20% ceiling"]);
        assert!((stats[0].value_pct - 60.0).abs() < 1e-9);

        assert_eq!(stats[1].verdict, Verdict::Unclassified);
        assert_eq!(stats[1].positioning, None);
        assert!(stats[1].notes.is_empty());

        // 30% premium is 5 points short of 35%, inside the warn margin.
        assert_eq!(stats[2].verdict, Verdict::Warn);
        assert_eq!(stats[2].store_count, 1);
        assert_eq!(stats[2].totals.total(), 10);
    }

    #[test]
    fn overlap_is_asymmetric() {
        let a = ids(&["A", "B"]);
        let b = ids(&["A", "B", "C", "D"]);
        assert_eq!(overlap_pct(&a, &b), 100.0);
        assert_eq!(overlap_pct(&b, &a), 50.0);
        assert_ne!(overlap_pct(&a, &b), overlap_pct(&b, &a));
    }

    #[test]
    fn overlap_of_empty_is_zero() {
        assert_eq!(overlap_pct(&[], &ids(&["A"])), 0.0);
        assert_eq!(overlap_pct(&ids(&["A"]), &[]), 0.0);
    }

    #[test]
    fn overlap_counts_duplicates_in_left() {
        let a = ids(&["A", "A", "X", "Y"]);
        let b = ids(&["A"]);
        assert_eq!(overlap_pct(&a, &b), 50.0);
    }

    #[test]
    fn consistency_bands() {
        let list = vec![
            assortment("1", "T", &["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"]),
            assortment("2", "T", &["A", "B", "C", "D", "E", "F", "G", "H", "X", "Y"]),
            assortment("3", "U", &["A"]),
        ];
        let stats = consistency_by_template(&list);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].template_id, "T");
        assert!((stats[0].mean_overlap_pct - 80.0).abs() < 1e-9);
        assert_eq!(stats[0].status, ConsistencyStatus::InBand);
        assert_eq!(stats[1].status, ConsistencyStatus::Insufficient);
    }

    #[test]
    fn cross_template_overlap_needs_both_sides() {
        let list = vec![
            assortment("1", "T", &["A", "B"]),
            assortment("2", "U", &["B", "C", "D", "E"]),
        ];
        assert_eq!(cross_template_overlap(&list, "T", "U"), Some(50.0));
        assert_eq!(cross_template_overlap(&list, "U", "T"), Some(25.0));
        assert_eq!(cross_template_overlap(&list, "T", "Z"), None);
    }

    #[test]
    fn diversity_thresholds() {
        assert_eq!(classify_diversity(1.0), DiversityStatus::TooNarrow);
        assert_eq!(classify_diversity(1.2), DiversityStatus::Healthy);
        assert_eq!(classify_diversity(1.8), DiversityStatus::Healthy);
        assert_eq!(classify_diversity(2.0), DiversityStatus::TooWide);
    }

    #[test]
    fn retention_bands_edges() {
        let mut bands = RetentionBands::default();
        for pct in [100.0, 95.0, 90.0, 85.0, 80.0, 75.0, 74.9] {
            bands.record(pct);
        }
        assert_eq!(
            bands,
            RetentionBands {
                high: 2,
                typical: 2,
                loose: 2,
                divergent: 1
            }
        );
    }

    #[test]
    fn value_retailer_fails_on_premium_ceiling() {
        let mut notes = Vec::new();
        assert_eq!(at_most("premium", 30.0, 20.0, 5.0, &mut notes), Verdict::Fail);
        assert_eq!(at_most("premium", 23.0, 20.0, 5.0, &mut notes), Verdict::Warn);
        assert_eq!(at_most("premium", 20.0, 20.0, 5.0, &mut notes), Verdict::Pass);
        assert_eq!(notes.len(), 2);
    }
}
