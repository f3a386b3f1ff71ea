//! # Dependency Rules
//!
//! Name-keyed prerequisite rules, grouped into three disjoint pools:
//!
//! ```text
//! RuleRegistry
//! ├── general:   rules that apply regardless of equipment
//! ├── equipment: rules keyed by equipment type ("vessel", "pump", ...)
//! └── cross:     relationships spanning categories (models, isometrics)
//! ```
//!
//! Within one pool there is at most one rule per `(deliverable_name, scope)`.
//! The registry is an ordinary value: pass the one you want into the resolver
//! and graph builder. [`standard_rules`] returns the bundled table.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::rules::{DependencyRule, RulePool, RuleRegistry};
//!
//! let mut registry = RuleRegistry::new();
//! registry
//!     .add_rule(RulePool::General, DependencyRule::new("Loop Drawings", ["P&ID"]))
//!     .unwrap();
//!
//! assert_eq!(registry.resolve("Loop Drawings", None), vec!["P&ID".to_string()]);
//! ```

pub mod resolver;

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{EstimateError, EstimateResult};

pub use resolver::{dependency_rules, resolve_required_predecessors};

const STANDARD_RULES_TOML: &str = include_str!("../../data/dependency_rules.toml");

static STANDARD_RULES: Lazy<EstimateResult<RuleRegistry>> =
    Lazy::new(|| RuleRegistry::from_toml_str(STANDARD_RULES_TOML, "dependency_rules.toml"));

/// The bundled standard rule registry, parsed on first use.
pub fn standard_rules() -> EstimateResult<&'static RuleRegistry> {
    STANDARD_RULES.as_ref().map_err(Clone::clone)
}

/// A prerequisite rule for one deliverable name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRule {
    pub deliverable_name: String,
    /// Ordered, duplicate-free prerequisite names
    pub prerequisites: Vec<String>,
    /// Equipment type for rules in the equipment pool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DependencyRule {
    pub fn new<I, S>(deliverable_name: impl Into<String>, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rule = DependencyRule {
            deliverable_name: deliverable_name.into(),
            prerequisites: Vec::new(),
            scope: None,
            description: None,
        };
        for p in prerequisites {
            let p = p.into();
            if !rule.prerequisites.contains(&p) {
                rule.prerequisites.push(p);
            }
        }
        rule
    }

    pub fn scoped(mut self, equipment_type: impl Into<String>) -> Self {
        self.scope = Some(equipment_type.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Which pool a rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RulePool {
    General,
    Equipment,
    Cross,
}

impl RulePool {
    pub fn as_str(&self) -> &'static str {
        match self {
            RulePool::General => "general",
            RulePool::Equipment => "equipment",
            RulePool::Cross => "cross",
        }
    }
}

#[derive(Debug, Deserialize)]
struct RuleEntry {
    deliverable_name: String,
    prerequisites: Vec<String>,
    #[serde(default)]
    description: Option<String>,
}

impl RuleEntry {
    fn into_rule(self, scope: Option<&str>) -> DependencyRule {
        let mut rule = DependencyRule::new(self.deliverable_name, self.prerequisites);
        rule.scope = scope.map(str::to_string);
        rule.description = self.description;
        rule
    }
}

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    general: Vec<RuleEntry>,
    #[serde(default)]
    equipment: BTreeMap<String, Vec<RuleEntry>>,
    #[serde(default)]
    cross: Vec<RuleEntry>,
}

/// The three rule pools.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleRegistry {
    general: Vec<DependencyRule>,
    equipment: BTreeMap<String, Vec<DependencyRule>>,
    cross: Vec<DependencyRule>,
}

impl RuleRegistry {
    /// An empty registry
    pub fn new() -> Self {
        RuleRegistry::default()
    }

    /// Parse and validate a rule table from TOML.
    ///
    /// The document has `[[general]]`, `[[equipment.<type>]]` and `[[cross]]`
    /// arrays of `{ deliverable_name, prerequisites, description }`.
    pub fn from_toml_str(source: &str, source_name: &str) -> EstimateResult<RuleRegistry> {
        let file: RulesFile = toml::from_str(source)
            .map_err(|e| EstimateError::config_error(source_name, e.to_string()))?;

        let mut registry = RuleRegistry::new();
        for entry in file.general {
            registry.add_rule(RulePool::General, entry.into_rule(None))?;
        }
        for (equipment_type, entries) in file.equipment {
            for entry in entries {
                registry.add_rule(RulePool::Equipment, entry.into_rule(Some(&equipment_type)))?;
            }
        }
        for entry in file.cross {
            registry.add_rule(RulePool::Cross, entry.into_rule(None))?;
        }

        tracing::debug!(
            source = source_name,
            general = registry.general.len(),
            equipment_types = registry.equipment.len(),
            cross = registry.cross.len(),
            "loaded dependency rules"
        );
        Ok(registry)
    }

    /// Add a rule to a pool.
    ///
    /// Equipment rules must carry a scope. A second rule for the same
    /// `(deliverable_name, scope)` in the same pool is rejected.
    pub fn add_rule(&mut self, pool: RulePool, rule: DependencyRule) -> EstimateResult<&mut Self> {
        let target = match pool {
            RulePool::General => &mut self.general,
            RulePool::Cross => &mut self.cross,
            RulePool::Equipment => {
                let Some(scope) = rule.scope.clone() else {
                    return Err(EstimateError::config_error(
                        "equipment",
                        format!("rule '{}' has no equipment type", rule.deliverable_name),
                    ));
                };
                self.equipment.entry(scope).or_default()
            }
        };

        if target
            .iter()
            .any(|r| r.deliverable_name == rule.deliverable_name && r.scope == rule.scope)
        {
            return Err(EstimateError::duplicate_template_name(
                pool.as_str(),
                rule.deliverable_name,
                rule.scope.as_deref(),
            ));
        }
        target.push(rule);
        Ok(self)
    }

    /// Rule for `name` in the general pool
    pub fn general_rule(&self, name: &str) -> Option<&DependencyRule> {
        self.general.iter().find(|r| r.deliverable_name == name)
    }

    /// Rule for `name` in the equipment pool under `equipment_type`
    pub fn equipment_rule(&self, equipment_type: &str, name: &str) -> Option<&DependencyRule> {
        self.equipment
            .get(equipment_type)?
            .iter()
            .find(|r| r.deliverable_name == name)
    }

    /// Rule for `name` in the cross-deliverable pool
    pub fn cross_rule(&self, name: &str) -> Option<&DependencyRule> {
        self.cross.iter().find(|r| r.deliverable_name == name)
    }

    pub fn equipment_types(&self) -> impl Iterator<Item = &str> {
        self.equipment.keys().map(String::as_str)
    }

    /// Total number of rules across all pools
    pub fn len(&self) -> usize {
        self.general.len() + self.equipment.values().map(Vec::len).sum::<usize>() + self.cross.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shorthand for [`resolve_required_predecessors`]
    pub fn resolve(&self, name: &str, equipment_type: Option<&str>) -> Vec<String> {
        resolve_required_predecessors(self, name, equipment_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_rules_load() {
        let registry = standard_rules().unwrap();
        assert_eq!(registry.general.len(), 7);
        assert_eq!(registry.cross.len(), 4);
        assert_eq!(
            registry.equipment_types().collect::<Vec<_>>(),
            vec!["compressor", "heat_exchanger", "pump", "tank", "vessel"]
        );
        let rule = registry.equipment_rule("vessel", "Nozzle Orientation Drawing").unwrap();
        assert_eq!(rule.scope.as_deref(), Some("vessel"));
        assert!(rule.description.is_some());
    }

    #[test]
    fn test_same_name_allowed_across_pools() {
        // Motor Specification appears in general and under pump
        let registry = standard_rules().unwrap();
        assert!(registry.general_rule("Motor Specification").is_some());
        assert!(registry.equipment_rule("pump", "Motor Specification").is_some());
    }

    #[test]
    fn test_duplicate_in_pool_rejected() {
        let mut registry = RuleRegistry::new();
        registry
            .add_rule(RulePool::Cross, DependencyRule::new("3D Model", ["P&ID"]))
            .unwrap();
        let err = registry
            .add_rule(RulePool::Cross, DependencyRule::new("3D Model", ["Equipment Layout"]))
            .unwrap_err();
        assert_eq!(
            err,
            EstimateError::duplicate_template_name("cross", "3D Model", None)
        );
    }

    #[test]
    fn test_duplicate_equipment_scope() {
        let mut registry = RuleRegistry::new();
        registry
            .add_rule(RulePool::Equipment, DependencyRule::new("A", ["B"]).scoped("pump"))
            .unwrap();
        // Different scope is fine
        registry
            .add_rule(RulePool::Equipment, DependencyRule::new("A", ["C"]).scoped("tank"))
            .unwrap();
        let err = registry
            .add_rule(RulePool::Equipment, DependencyRule::new("A", ["D"]).scoped("pump"))
            .unwrap_err();
        assert!(err.to_string().contains("pump"));
    }

    #[test]
    fn test_equipment_rule_requires_scope() {
        let mut registry = RuleRegistry::new();
        let err = registry
            .add_rule(RulePool::Equipment, DependencyRule::new("A", ["B"]))
            .unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_toml_duplicate_rejected_at_load() {
        let toml = r#"
            [[general]]
            deliverable_name = "Mechanical Datasheet"
            prerequisites = ["Process Datasheet"]

            [[general]]
            deliverable_name = "Mechanical Datasheet"
            prerequisites = ["P&ID"]
        "#;
        let err = RuleRegistry::from_toml_str(toml, "test").unwrap_err();
        assert!(matches!(err, EstimateError::DuplicateTemplateName { .. }));
    }

    #[test]
    fn test_rule_prerequisites_deduplicated() {
        let rule = DependencyRule::new("X", ["A", "B", "A"]);
        assert_eq!(rule.prerequisites, vec!["A", "B"]);
    }

    #[test]
    fn test_len() {
        let registry = standard_rules().unwrap();
        assert_eq!(registry.len(), 7 + 12 + 4);
        assert!(RuleRegistry::new().is_empty());
    }
}
