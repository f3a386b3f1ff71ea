//! # Prerequisite Resolution
//!
//! Pure lookups from a deliverable name (and optional equipment type) to the
//! prerequisite names the rules require. Pools are consulted in a fixed order:
//! general, then equipment-specific (only when an equipment type is given),
//! then cross-deliverable. Results are concatenated in that order and
//! de-duplicated keeping the first occurrence.
//!
//! A name with no matching rule resolves to an empty list; that is not an
//! error.

use super::{DependencyRule, RuleRegistry};

/// Rules matching `name`, in pool order (general, equipment, cross).
///
/// Useful for explaining *why* a prerequisite is suggested.
pub fn dependency_rules<'a>(
    registry: &'a RuleRegistry,
    name: &str,
    equipment_type: Option<&str>,
) -> Vec<&'a DependencyRule> {
    let general = registry.general_rule(name);
    let equipment = equipment_type.and_then(|t| registry.equipment_rule(t, name));
    let cross = registry.cross_rule(name);

    [general, equipment, cross].into_iter().flatten().collect()
}

/// Ordered, de-duplicated prerequisite names for a deliverable.
///
/// # Example
///
/// ```rust
/// use estimate_core::rules::{resolve_required_predecessors, standard_rules};
///
/// let registry = standard_rules().unwrap();
/// assert_eq!(
///     resolve_required_predecessors(registry, "Nozzle Orientation Drawing", Some("vessel")),
///     vec!["Pressure Calculations", "Instrumentation Hookup"],
/// );
/// ```
pub fn resolve_required_predecessors(
    registry: &RuleRegistry,
    name: &str,
    equipment_type: Option<&str>,
) -> Vec<String> {
    let mut required: Vec<String> = Vec::new();
    for rule in dependency_rules(registry, name, equipment_type) {
        for prerequisite in &rule.prerequisites {
            if !required.contains(prerequisite) {
                required.push(prerequisite.clone());
            }
        }
    }
    required
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{standard_rules, RulePool};

    fn fixture() -> RuleRegistry {
        let mut registry = RuleRegistry::new();
        registry
            .add_rule(
                RulePool::General,
                DependencyRule::new("Motor Specification", ["Mechanical Datasheet"]),
            )
            .unwrap()
            .add_rule(
                RulePool::Equipment,
                DependencyRule::new(
                    "Motor Specification",
                    ["Pump Curve Analysis", "Mechanical Datasheet"],
                )
                .scoped("pump"),
            )
            .unwrap()
            .add_rule(
                RulePool::Cross,
                DependencyRule::new(
                    "Motor Specification",
                    ["Electrical Load List", "Pump Curve Analysis"],
                ),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_general_only() {
        let registry = standard_rules().unwrap();
        assert_eq!(
            resolve_required_predecessors(registry, "Mechanical Datasheet", None),
            vec!["Process Datasheet"]
        );
    }

    #[test]
    fn test_vessel_nozzle_orientation() {
        let registry = standard_rules().unwrap();
        assert_eq!(
            resolve_required_predecessors(registry, "Nozzle Orientation Drawing", Some("vessel")),
            vec!["Pressure Calculations", "Instrumentation Hookup"]
        );
        // Without an equipment type, only general and cross pools apply
        let unscoped = resolve_required_predecessors(registry, "Nozzle Orientation Drawing", None);
        assert!(unscoped.is_empty());
    }

    #[test]
    fn test_pool_order_and_dedup() {
        let registry = fixture();
        assert_eq!(
            resolve_required_predecessors(&registry, "Motor Specification", Some("pump")),
            vec!["Mechanical Datasheet", "Pump Curve Analysis", "Electrical Load List"]
        );
        assert_eq!(
            resolve_required_predecessors(&registry, "Motor Specification", Some("tank")),
            vec!["Mechanical Datasheet", "Electrical Load List", "Pump Curve Analysis"]
        );
    }

    #[test]
    fn test_unknown_name_is_empty() {
        let registry = standard_rules().unwrap();
        let required = resolve_required_predecessors(registry, "Progress Reports", Some("pump"));
        assert!(required.is_empty());
        assert!(resolve_required_predecessors(&RuleRegistry::new(), "P&ID", None).is_empty());
    }

    #[test]
    fn test_dependency_rules_carry_descriptions() {
        let registry = standard_rules().unwrap();
        let rules = dependency_rules(registry, "Motor Specification", Some("pump"));
        assert_eq!(rules.len(), 2);
        assert!(rules[0].scope.is_none());
        assert_eq!(rules[1].scope.as_deref(), Some("pump"));
        assert!(rules.iter().all(|r| r.description.is_some()));
    }

    #[test]
    fn test_deterministic() {
        let registry = standard_rules().unwrap();
        let a = resolve_required_predecessors(registry, "3D Model", Some("vessel"));
        let b = resolve_required_predecessors(registry, "3D Model", Some("vessel"));
        assert_eq!(a, b);
        assert_eq!(a, vec!["P&ID", "Equipment Layout", "Nozzle Orientation Drawing"]);
    }
}
