//! Suggested prerequisites.
//!
//! When a user adds deliverables whose prerequisites are not yet in the
//! project, the missing names are offered as suggestions. Selected suggestions
//! are created from the catalog ahead of the batch so the batch can bind to
//! them in a single materialization pass.

use crate::catalog::Catalog;
use crate::deliverable::{Deliverable, DeliverableDefaults};
use crate::rules::{resolve_required_predecessors, RuleRegistry};

use super::{materialize_dependencies, Materialization};

/// Prerequisite names required by `batch` that nothing in `existing` or
/// `batch` provides, in first-seen order.
pub fn suggested_prerequisites(
    batch: &[Deliverable],
    existing: &[Deliverable],
    registry: &RuleRegistry,
) -> Vec<String> {
    let present = |name: &str| existing.iter().chain(batch.iter()).any(|d| d.name == name);

    let mut out: Vec<String> = Vec::new();
    for d in batch {
        for name in resolve_required_predecessors(registry, &d.name, d.equipment_type.as_deref()) {
            if !present(&name) && !out.contains(&name) {
                out.push(name);
            }
        }
    }
    out
}

/// Create the selected suggestions from the catalog, then materialize them
/// together with the batch.
///
/// Selected names already present in `batch` or `existing` are skipped, as are
/// names the catalog does not know. Created deliverables come first in the
/// result and use `defaults` for their issue states and review settings.
///
/// # Example
///
/// ```rust
/// use estimate_core::catalog::standard_catalog;
/// use estimate_core::deliverable::{Deliverable, DeliverableDefaults};
/// use estimate_core::graph::materialize_with_suggestions;
/// use estimate_core::rules::standard_rules;
///
/// let batch = vec![Deliverable::new("Mechanical Datasheet", "Mechanical", 50.0)];
/// let result = materialize_with_suggestions(
///     batch,
///     &[],
///     &["Process Datasheet".to_string()],
///     standard_catalog().unwrap(),
///     standard_rules().unwrap(),
///     &DeliverableDefaults::ad_hoc(),
/// );
///
/// assert_eq!(result.deliverables[0].name, "Process Datasheet");
/// assert_eq!(result.deliverables[1].dependencies[0].deliverable_id, result.deliverables[0].id);
/// ```
pub fn materialize_with_suggestions(
    batch: Vec<Deliverable>,
    existing: &[Deliverable],
    selected: &[String],
    catalog: &Catalog,
    registry: &RuleRegistry,
    defaults: &DeliverableDefaults,
) -> Materialization {
    let mut created: Vec<Deliverable> = Vec::new();

    for name in selected {
        let already_present = existing
            .iter()
            .chain(batch.iter())
            .chain(created.iter())
            .any(|d| &d.name == name);
        if already_present {
            continue;
        }

        match catalog.find_template(name) {
            Some(template) => {
                let deliverable = Deliverable::from_template(template, defaults)
                    .with_category(template.category.clone());
                created.push(deliverable);
            }
            None => {
                tracing::debug!(name = %name, "suggested prerequisite not in catalog, skipping");
            }
        }
    }

    created.extend(batch);
    materialize_dependencies(created, existing, registry)
}
