//! Template repository.
//!
//! Templates are keyed by `<retailer-without-whitespace><format>`. A store
//! whose key has no template is a soft miss: `find_template` returns `None`
//! and the caller decides how to count it.

use std::collections::HashMap;

use crate::config::ParentTemplateTable;
use crate::error::{AssortmentError, AssortmentResult};
use crate::types::{template_key, Store, Template};

/// Immutable set of validated templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateRepository {
    templates: HashMap<String, Template>,
}

impl TemplateRepository {
    /// Validate and index templates.
    ///
    /// Rejects a template whose ranked list is shorter than its baseline,
    /// whose id disagrees with its retailer/format, or whose id repeats.
    pub fn from_templates(templates: Vec<Template>) -> AssortmentResult<Self> {
        let mut indexed = HashMap::with_capacity(templates.len());
        for template in templates {
            validate(&template)?;
            if indexed.contains_key(&template.template_id) {
                return Err(AssortmentError::DuplicateTemplate(template.template_id));
            }
            indexed.insert(template.template_id.clone(), template);
        }
        log::debug!("indexed {} templates", indexed.len());
        Ok(Self { templates: indexed })
    }

    /// Parse a JSON array of templates.
    pub fn from_json(json: &str) -> AssortmentResult<Self> {
        let templates: Vec<Template> = serde_json::from_str(json)?;
        Self::from_templates(templates)
    }

    /// Add tier3 templates inherited from each retailer's parent.
    ///
    /// Every parent template is copied under the tier3 retailer's key with
    /// `is_tier3` set. A template already present for that key is kept.
    pub fn with_tier3_children(mut self, parents: &ParentTemplateTable) -> Self {
        let mut derived = Vec::new();
        for (retailer, parent) in parents.iter() {
            let inherited: Vec<&Template> = self
                .templates
                .values()
                .filter(|t| t.retailer == parent)
                .collect();
            if inherited.is_empty() {
                log::warn!("tier3 retailer {} has no templates under parent {}", retailer, parent);
            }
            for parent_template in inherited {
                let id = template_key(retailer, parent_template.format);
                if self.templates.contains_key(&id) {
                    continue;
                }
                derived.push(Template {
                    template_id: id,
                    retailer: retailer.to_string(),
                    is_tier3: true,
                    ..parent_template.clone()
                });
            }
        }
        log::debug!("derived {} tier3 templates", derived.len());
        for template in derived {
            self.templates.insert(template.template_id.clone(), template);
        }
        self
    }

    /// Template for a store's (retailer, format), if one exists.
    pub fn find_template(&self, store: &Store) -> Option<&Template> {
        self.templates.get(&store.template_key())
    }

    pub fn get(&self, template_id: &str) -> Option<&Template> {
        self.templates.get(template_id)
    }

    /// Templates in id order.
    pub fn iter_sorted(&self) -> Vec<&Template> {
        let mut all: Vec<&Template> = self.templates.values().collect();
        all.sort_by(|a, b| a.template_id.cmp(&b.template_id));
        all
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn validate(template: &Template) -> AssortmentResult<()> {
    let invalid = |reason: String| AssortmentError::InvalidTemplate {
        template_id: template.template_id.clone(),
        reason,
    };

    if template.ranked_skus.len() < template.baseline_sku_count {
        return Err(invalid(format!(
            "ranked_skus has {} entries but baseline_sku_count is {}",
            template.ranked_skus.len(),
            template.baseline_sku_count
        )));
    }
    if template.baseline_sku_count == 0 {
        return Err(invalid("baseline_sku_count must be positive".into()));
    }
    let expected = template_key(&template.retailer, template.format);
    if template.template_id != expected {
        return Err(invalid(format!(
            "id does not match retailer/format (expected '{}')",
            expected
        )));
    }
    Ok(())
}
