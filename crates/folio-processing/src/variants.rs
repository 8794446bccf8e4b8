//! Variant policy table
//!
//! An immutable, ordered list of [`VariantSpec`]s shared by every ingestion. The
//! table is built once (from configuration or [`VariantPolicy::default`]) and
//! injected into the ingestion service.

use folio_core::models::{SkipReason, VariantSpec};
use folio_core::Config;
use std::collections::HashSet;
use std::sync::Arc;

/// What to do with one policy entry for a given source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantPlan<'a> {
    Render(&'a VariantSpec),
    Skip(&'a VariantSpec, SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantPolicy {
    specs: Arc<[VariantSpec]>,
}

impl VariantPolicy {
    /// Build a policy, rejecting empty tables, invalid entries and duplicate names.
    pub fn new(specs: Vec<VariantSpec>) -> Result<Self, anyhow::Error> {
        if specs.is_empty() {
            return Err(anyhow::anyhow!("Variant policy must contain at least one entry"));
        }

        let mut seen = HashSet::new();
        for spec in &specs {
            spec.validate()?;
            if !seen.insert(spec.name.as_str()) {
                return Err(anyhow::anyhow!(
                    "Variant policy contains duplicate variant '{}'",
                    spec.name
                ));
            }
        }

        Ok(Self {
            specs: specs.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, anyhow::Error> {
        Self::new(config.variant_policy().to_vec())
    }

    pub fn specs(&self) -> &[VariantSpec] {
        &self.specs
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// A fit entry is skipped when the source already fits inside its box.
    /// Crop entries always render.
    pub fn should_skip(spec: &VariantSpec, source_width: u32, source_height: u32) -> bool {
        !spec.crop && source_width <= spec.width && source_height <= spec.height
    }

    /// Plan every entry, in table order, for a source of the given dimensions.
    pub fn plan(&self, source_width: u32, source_height: u32) -> Vec<VariantPlan<'_>> {
        self.specs
            .iter()
            .map(|spec| {
                if Self::should_skip(spec, source_width, source_height) {
                    VariantPlan::Skip(
                        spec,
                        SkipReason::SourceWithinBounds {
                            width: source_width,
                            height: source_height,
                        },
                    )
                } else {
                    VariantPlan::Render(spec)
                }
            })
            .collect()
    }
}

impl Default for VariantPolicy {
    fn default() -> Self {
        Self {
            specs: vec![
                VariantSpec::new("thumbnail", 150, 150, true),
                VariantSpec::new("small", 400, 300, false),
                VariantSpec::new("medium", 800, 600, false),
                VariantSpec::new("large", 1920, 1080, false),
            ]
            .into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::config::DEFAULT_VARIANT_POLICY;

    #[test]
    fn test_default_matches_default_config_string() {
        let parsed = VariantSpec::parse_list(DEFAULT_VARIANT_POLICY).unwrap();
        assert_eq!(VariantPolicy::default(), VariantPolicy::new(parsed).unwrap());
    }

    #[test]
    fn test_default_table() {
        let policy = VariantPolicy::default();
        let entries: Vec<String> = policy.specs().iter().map(|s| s.to_string()).collect();
        assert_eq!(
            entries,
            vec![
                "thumbnail:150x150:crop",
                "small:400x300:fit",
                "medium:800x600:fit",
                "large:1920x1080:fit",
            ]
        );
    }

    #[test]
    fn test_skip_rule_fit_400x300() {
        let spec = VariantSpec::new("small", 400, 300, false);
        assert!(VariantPolicy::should_skip(&spec, 400, 300));
        assert!(VariantPolicy::should_skip(&spec, 100, 100));
        assert!(!VariantPolicy::should_skip(&spec, 401, 300));
        assert!(!VariantPolicy::should_skip(&spec, 400, 301));
        assert!(!VariantPolicy::should_skip(&spec, 200, 1000));
    }

    #[test]
    fn test_crop_never_skipped() {
        let spec = VariantSpec::new("thumbnail", 150, 150, true);
        assert!(!VariantPolicy::should_skip(&spec, 1, 1));
        assert!(!VariantPolicy::should_skip(&spec, 150, 150));
    }

    #[test]
    fn test_plan_small_source_renders_only_thumbnail() {
        let policy = VariantPolicy::default();
        let plan = policy.plan(100, 100);

        assert_eq!(plan.len(), 4);
        assert!(matches!(plan[0], VariantPlan::Render(s) if s.name == "thumbnail"));
        for entry in &plan[1..] {
            assert!(matches!(
                entry,
                VariantPlan::Skip(_, SkipReason::SourceWithinBounds { width: 100, height: 100 })
            ));
        }
    }

    #[test]
    fn test_plan_large_source_renders_everything_in_order() {
        let policy = VariantPolicy::default();
        let names: Vec<&str> = policy
            .plan(2400, 1600)
            .iter()
            .map(|p| match p {
                VariantPlan::Render(s) => s.name.as_str(),
                VariantPlan::Skip(s, _) => panic!("unexpected skip of {}", s.name),
            })
            .collect();
        assert_eq!(names, vec!["thumbnail", "small", "medium", "large"]);
    }

    #[test]
    fn test_new_rejects_invalid_tables() {
        assert!(VariantPolicy::new(vec![]).is_err());
        assert!(VariantPolicy::new(vec![
            VariantSpec::new("a", 10, 10, false),
            VariantSpec::new("a", 20, 20, true),
        ])
        .is_err());
        assert!(VariantPolicy::new(vec![VariantSpec::new("originals", 10, 10, false)]).is_err());
        assert!(VariantPolicy::new(vec![VariantSpec::new("Big One", 10, 10, false)]).is_err());
    }
}
