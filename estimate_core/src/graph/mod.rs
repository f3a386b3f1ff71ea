//! # Dependency Graph Builder
//!
//! Turns rule-derived prerequisite *names* into concrete ID edges between the
//! deliverables of a project.
//!
//! Binding happens in two explicit phases for each deliverable of a batch:
//!
//! 1. **Resolve**: the rule registry yields prerequisite names, held as
//!    [`ResolvedRef::ByName`].
//! 2. **Bind**: each name is matched against the existing deliverables and the
//!    entries that appear *earlier* in the same batch. Every match is frozen
//!    into a [`ResolvedRef::ById`] and becomes a prerequisite edge. Names with
//!    no match are reported in [`Materialization::unresolved_prerequisites`];
//!    no placeholder edge is created.
//!
//! Edges are only ever appended. Edges already on a deliverable are kept and an
//! identical `(deliverable_id, dependency_type)` pair is never added twice, so
//! running materialization again over its own output changes nothing.
//! Cycles are not rejected here; see [`dependency_cycles`].
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::deliverable::Deliverable;
//! use estimate_core::graph::materialize_dependencies;
//! use estimate_core::rules::standard_rules;
//!
//! let registry = standard_rules().unwrap();
//! let batch = vec![
//!     Deliverable::new("Process Datasheet", "Process", 40.0),
//!     Deliverable::new("Mechanical Datasheet", "Mechanical", 50.0),
//! ];
//!
//! let result = materialize_dependencies(batch, &[], registry);
//! let process_id = result.deliverables[0].id;
//! assert_eq!(result.deliverables[1].dependencies[0].deliverable_id, process_id);
//! assert!(result.unresolved_prerequisites.is_empty());
//! ```

pub mod cycles;
pub mod suggestions;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::deliverable::{Deliverable, DeliverableDependency, DeliverableId};
use crate::rules::{resolve_required_predecessors, RuleRegistry};

pub use cycles::{dependency_cycles, DependencyCycle};
pub use suggestions::{materialize_with_suggestions, suggested_prerequisites};

/// A prerequisite reference during binding
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResolvedRef {
    /// Required by name, not yet bound
    ByName(String),
    /// Bound to a concrete deliverable
    ById(DeliverableId),
}

/// Output of [`materialize_dependencies`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Materialization {
    /// The batch, in input order, with edges added
    pub deliverables: Vec<Deliverable>,
    /// Prerequisite names that matched nothing, keyed by the dependent
    pub unresolved_prerequisites: BTreeMap<DeliverableId, Vec<String>>,
}

impl Materialization {
    /// Number of unresolved prerequisite names across the batch
    pub fn unresolved_count(&self) -> usize {
        self.unresolved_prerequisites.values().map(Vec::len).sum()
    }

    /// Unresolved names for one deliverable
    pub fn unresolved_for(&self, id: DeliverableId) -> &[String] {
        self.unresolved_prerequisites
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Phase 1: prerequisite names for one deliverable
pub fn resolve_refs(deliverable: &Deliverable, registry: &RuleRegistry) -> Vec<ResolvedRef> {
    let equipment_type = deliverable.equipment_type.as_deref();
    resolve_required_predecessors(registry, &deliverable.name, equipment_type)
        .into_iter()
        .map(ResolvedRef::ByName)
        .collect()
}

/// Phase 2: bind name references against the candidate pools.
///
/// Returns the bound references (existing matches first, then earlier batch
/// matches, in candidate order) and the names that matched nothing. `self_id`
/// is never bound.
pub fn bind_refs(
    refs: Vec<ResolvedRef>,
    self_id: DeliverableId,
    existing: &[Deliverable],
    earlier: &[Deliverable],
) -> (Vec<ResolvedRef>, Vec<String>) {
    let mut bound = Vec::new();
    let mut unresolved = Vec::new();

    for r in refs {
        let name = match r {
            ResolvedRef::ByName(name) => name,
            already @ ResolvedRef::ById(_) => {
                bound.push(already);
                continue;
            }
        };

        let matches: Vec<DeliverableId> = existing
            .iter()
            .chain(earlier.iter())
            .filter(|c| c.name == name && c.id != self_id)
            .map(|c| c.id)
            .collect();

        if matches.is_empty() {
            unresolved.push(name);
        } else {
            bound.extend(matches.into_iter().map(ResolvedRef::ById));
        }
    }

    (bound, unresolved)
}

/// Materialize rule-derived prerequisite edges for a batch of deliverables.
///
/// Entries are processed in batch order. A deliverable may depend on anything
/// in `existing` and on batch entries before it; later entries never satisfy
/// it.
pub fn materialize_dependencies(
    batch: Vec<Deliverable>,
    existing: &[Deliverable],
    registry: &RuleRegistry,
) -> Materialization {
    let mut done: Vec<Deliverable> = Vec::with_capacity(batch.len());
    let mut unresolved_prerequisites = BTreeMap::new();
    let mut edges_added = 0usize;

    for mut deliverable in batch {
        let refs = resolve_refs(&deliverable, registry);
        let (bound, unresolved) = bind_refs(refs, deliverable.id, existing, &done);

        for r in bound {
            if let ResolvedRef::ById(id) = r {
                if deliverable.push_dependency(DeliverableDependency::prerequisite(id)) {
                    edges_added += 1;
                }
            }
        }

        if !unresolved.is_empty() {
            unresolved_prerequisites.insert(deliverable.id, unresolved);
        }
        done.push(deliverable);
    }

    tracing::debug!(
        deliverables = done.len(),
        edges_added,
        unresolved = unresolved_prerequisites.len(),
        "materialized dependencies"
    );

    Materialization {
        deliverables: done,
        unresolved_prerequisites,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deliverable::DependencyType;
    use crate::rules::{standard_rules, DependencyRule, RulePool};

    fn vessel(name: &str, hours: f64) -> Deliverable {
        Deliverable::new(name, "Mechanical", hours).with_equipment_type("vessel")
    }

    #[test]
    fn test_lone_nozzle_orientation_unresolved() {
        let registry = standard_rules().unwrap();
        let nozzle = vessel("Nozzle Orientation Drawing", 40.0);
        let id = nozzle.id;

        let result = materialize_dependencies(vec![nozzle], &[], registry);

        assert!(result.deliverables[0].dependencies.is_empty());
        assert_eq!(
            result.unresolved_for(id),
            &["Pressure Calculations".to_string(), "Instrumentation Hookup".to_string()]
        );
        assert_eq!(result.unresolved_count(), 2);
    }

    #[test]
    fn test_existing_satisfies_prerequisite() {
        let registry = standard_rules().unwrap();
        let pressure = vessel("Pressure Calculations", 60.0);
        let hookup = Deliverable::new("Instrumentation Hookup", "Electrical/Instrumentation", 50.0);
        let existing = vec![pressure.clone(), hookup.clone()];

        let batch = vec![vessel("Nozzle Orientation Drawing", 40.0)];
        let result = materialize_dependencies(batch, &existing, registry);

        let deps: Vec<DeliverableId> = result.deliverables[0].prerequisite_ids().collect();
        assert_eq!(deps, vec![pressure.id, hookup.id]);
        assert!(result.unresolved_prerequisites.is_empty());
    }

    #[test]
    fn test_later_batch_entries_do_not_satisfy() {
        let registry = standard_rules().unwrap();
        let batch = vec![
            Deliverable::new("Mechanical Datasheet", "Mechanical", 50.0),
            Deliverable::new("Process Datasheet", "Process", 40.0),
        ];
        let mech_id = batch[0].id;

        let result = materialize_dependencies(batch, &[], registry);

        assert!(result.deliverables[0].dependencies.is_empty());
        assert_eq!(result.unresolved_for(mech_id), &["Process Datasheet".to_string()]);
    }

    #[test]
    fn test_every_same_named_match_binds() {
        let registry = standard_rules().unwrap();
        let a = Deliverable::new("Process Datasheet", "Process", 40.0);
        let b = Deliverable::new("Process Datasheet", "Process", 16.0);
        let existing = vec![a.clone()];
        let batch = vec![b.clone(), Deliverable::new("Mechanical Datasheet", "Mechanical", 50.0)];

        let result = materialize_dependencies(batch, &existing, registry);
        let deps: Vec<DeliverableId> = result.deliverables[1].prerequisite_ids().collect();
        assert_eq!(deps, vec![a.id, b.id]);
    }

    #[test]
    fn test_existing_edges_kept_and_not_duplicated() {
        let registry = standard_rules().unwrap();
        let process = Deliverable::new("Process Datasheet", "Process", 40.0);
        let other = DeliverableId::new();
        let mut mech = Deliverable::new("Mechanical Datasheet", "Mechanical", 50.0);
        mech.push_dependency(DeliverableDependency::corequisite(other));
        mech.push_dependency(DeliverableDependency::prerequisite(process.id));

        let result = materialize_dependencies(vec![mech], &[process.clone()], registry);
        let deps = &result.deliverables[0].dependencies;
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].dependency_type, DependencyType::Corequisite);
        assert_eq!(deps[1].deliverable_id, process.id);
    }

    #[test]
    fn test_materialization_is_idempotent() {
        let registry = standard_rules().unwrap();
        let batch = vec![
            Deliverable::new("Process Datasheet", "Process", 40.0),
            Deliverable::new("Mechanical Datasheet", "Mechanical", 50.0),
            vessel("Pressure Calculations", 60.0),
            vessel("Nozzle Orientation Drawing", 40.0),
        ];

        let first = materialize_dependencies(batch, &[], registry);
        let second = materialize_dependencies(first.deliverables.clone(), &[], registry);
        assert_eq!(first, second);
    }

    #[test]
    fn test_self_named_rule_never_binds_self() {
        let mut registry = RuleRegistry::new();
        registry
            .add_rule(
                RulePool::General,
                DependencyRule::new("Progress Reports", ["Progress Reports"]),
            )
            .unwrap();
        let report = Deliverable::new("Progress Reports", "Project Management", 30.0);
        let id = report.id;

        let result = materialize_dependencies(vec![report.clone()], &[report], &registry);
        assert!(result.deliverables[0].dependencies.is_empty());
        assert_eq!(result.unresolved_for(id), &["Progress Reports".to_string()]);
    }

    #[test]
    fn test_bind_refs_passes_bound_through() {
        let id = DeliverableId::new();
        let (bound, unresolved) = bind_refs(
            vec![ResolvedRef::ById(id), ResolvedRef::ByName("P&ID".into())],
            DeliverableId::new(),
            &[],
            &[],
        );
        assert_eq!(bound, vec![ResolvedRef::ById(id)]);
        assert_eq!(unresolved, vec!["P&ID".to_string()]);
    }
}
