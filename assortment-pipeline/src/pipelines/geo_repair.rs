use assortment_core::{AssortmentResult, Config, Store};

use crate::components::clustering::GreedyClusterPass;
use crate::components::competition::CompetitionPass;
use crate::components::context::ContextPass;
use crate::components::spacing::MinimumSpacingPass;
use crate::pass::StorePass;

/// What one pass did to the snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassSummary {
    pub name: String,
    pub enabled: bool,
    /// Stores whose record differs from the previous snapshot.
    pub changed: usize,
}

#[derive(Clone, Debug)]
pub struct RepairResult {
    pub stores: Vec<Store>,
    pub passes: Vec<PassSummary>,
}

/// The store geometry repair pipeline.
///
/// Pass order is significant:
/// 1. GreedyClusterPass assigns `cluster_id`
/// 2. MinimumSpacingPass moves stores that sit too close
/// 3. CompetitionPass rebuilds `nearby_competition` from the moved coordinates
/// 4. ContextPass reclassifies `store_context` from competitor density
pub struct GeoRepairPipeline {
    passes: Vec<Box<dyn StorePass>>,
}

impl GeoRepairPipeline {
    pub fn new(config: &Config) -> Self {
        let passes: Vec<Box<dyn StorePass>> = vec![
            Box::new(GreedyClusterPass::from_config(&config.geo)),
            Box::new(MinimumSpacingPass {
                geo: config.geo.clone(),
            }),
            Box::new(CompetitionPass {
                geo: config.geo.clone(),
            }),
            Box::new(ContextPass {
                rules: config.context.clone(),
            }),
        ];
        Self { passes }
    }

    /// Build a pipeline from an explicit pass list.
    pub fn with_passes(passes: Vec<Box<dyn StorePass>>) -> Self {
        Self { passes }
    }

    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run every enabled pass in order, threading the snapshot through.
    pub fn run(&self, stores: &[Store]) -> AssortmentResult<RepairResult> {
        let mut current = stores.to_vec();
        let mut summaries = Vec::with_capacity(self.passes.len());

        for pass in &self.passes {
            if !pass.enable(&current) {
                log::debug!("pass {} disabled, skipping", pass.name());
                summaries.push(PassSummary {
                    name: pass.name().to_string(),
                    enabled: false,
                    changed: 0,
                });
                continue;
            }
            let next = pass.apply(&current)?;
            let changed = current
                .iter()
                .zip(next.iter())
                .filter(|(before, after)| before != after)
                .count();
            log::info!("pass {} changed {} stores", pass.name(), changed);
            summaries.push(PassSummary {
                name: pass.name().to_string(),
                enabled: true,
                changed,
            });
            current = next;
        }

        Ok(RepairResult {
            stores: current,
            passes: summaries,
        })
    }
}
