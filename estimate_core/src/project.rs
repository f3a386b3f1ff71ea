//! # Project Data Structures
//!
//! The `Project` struct is the root container for an estimate. It owns the
//! team roster, project settings and the ordered list of deliverables, and it
//! is the place where edits that must keep the dependency graph consistent
//! happen: batch additions go through the graph builder, and removing a
//! deliverable also removes every edge that pointed at it.
//!
//! Projects serialize to human-readable JSON. Storage is the host's concern.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (schema version, estimator, job info, timestamps)
//! ├── settings: ProjectSettings (project type, client profile, rate overrides)
//! ├── team: Vec<TeamMember> (roster used for RACI and rates)
//! └── deliverables: Vec<Deliverable> (insertion ordered)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::deliverable::Deliverable;
//! use estimate_core::project::Project;
//! use estimate_core::rules::standard_rules;
//!
//! let mut project = Project::new("Jane Estimator", "25-042", "ACME Chemicals");
//! let report = project
//!     .add_deliverables(
//!         vec![
//!             Deliverable::new("Process Datasheet", "Process", 40.0),
//!             Deliverable::new("Mechanical Datasheet", "Mechanical", 50.0),
//!         ],
//!         standard_rules().unwrap(),
//!     );
//!
//! assert_eq!(report.added.len(), 2);
//! assert!(report.unresolved_prerequisites.is_empty());
//!
//! let json = project.to_json().unwrap();
//! let restored = estimate_core::project::Project::from_json(&json).unwrap();
//! assert_eq!(restored.deliverables.len(), 2);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{
    generate_equipment_deliverables, generate_package_deliverables, Catalog, EquipmentItem,
};
use crate::deliverable::{
    Deliverable, DeliverableDefaults, DeliverableDependency, DeliverableId, DependencyType,
    IssueState, ProjectType, RegulatoryOverlay,
};
use crate::effort::{validate_effort_inputs, ClientComplexityProfile};
use crate::errors::{EstimateError, EstimateResult};
use crate::estimate::{estimate_project, ProjectEstimate};
use crate::graph::{
    dependency_cycles, materialize_dependencies, materialize_with_suggestions, DependencyCycle,
    Materialization,
};
use crate::raci::{RaciAssignment, RateTable, TeamMember};
use crate::rules::RuleRegistry;

/// Current schema version for serialized projects
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root project container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project metadata (version, estimator, job info)
    pub meta: ProjectMetadata,

    pub settings: ProjectSettings,

    /// Team roster
    #[serde(default)]
    pub team: Vec<TeamMember>,

    /// All deliverables, in insertion order
    #[serde(default)]
    pub deliverables: Vec<Deliverable>,
}

/// Outcome of adding a batch of deliverables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// IDs of the deliverables added, in order
    pub added: Vec<DeliverableId>,
    pub unresolved_prerequisites: BTreeMap<DeliverableId, Vec<String>>,
}

/// A partial update of a deliverable's effort configuration.
///
/// Fields left as `None` are unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliverableConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_states: Option<BTreeSet<IssueState>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_cycles: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rework_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulatory_overlay: Option<RegulatoryOverlay>,
}

impl Project {
    /// Create a new empty project.
    ///
    /// # Arguments
    ///
    /// * `estimator` - Name of the responsible estimator
    /// * `job_id` - Job/project number (e.g., "25-001")
    /// * `client` - Client name
    pub fn new(
        estimator: impl Into<String>,
        job_id: impl Into<String>,
        client: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                estimator: estimator.into(),
                job_id: job_id.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            settings: ProjectSettings::default(),
            team: Vec::new(),
            deliverables: Vec::new(),
        }
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    /// Defaults for deliverables created under this project's type
    pub fn defaults(&self) -> DeliverableDefaults {
        self.settings.project_type.defaults()
    }

    pub fn get(&self, id: DeliverableId) -> Option<&Deliverable> {
        self.deliverables.iter().find(|d| d.id == id)
    }

    fn get_mut(&mut self, id: DeliverableId) -> EstimateResult<&mut Deliverable> {
        self.deliverables
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| EstimateError::deliverable_not_found(id))
    }

    /// Deliverables with this exact name
    pub fn find_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Deliverable> + 'a {
        self.deliverables.iter().filter(move |d| d.name == name)
    }

    pub fn deliverable_count(&self) -> usize {
        self.deliverables.len()
    }

    fn absorb(&mut self, materialized: Materialization) -> BatchReport {
        let added = materialized.deliverables.iter().map(|d| d.id).collect();
        self.deliverables.extend(materialized.deliverables);
        self.touch();
        BatchReport {
            added,
            unresolved_prerequisites: materialized.unresolved_prerequisites,
        }
    }

    /// Add a batch of deliverables, materializing rule-derived prerequisite
    /// edges against the deliverables already in the project.
    pub fn add_deliverables(
        &mut self,
        batch: Vec<Deliverable>,
        registry: &RuleRegistry,
    ) -> BatchReport {
        let materialized = materialize_dependencies(batch, &self.deliverables, registry);
        self.absorb(materialized)
    }

    /// Add a batch together with selected suggested prerequisites from the catalog.
    pub fn add_with_suggestions(
        &mut self,
        batch: Vec<Deliverable>,
        selected: &[String],
        catalog: &Catalog,
        registry: &RuleRegistry,
    ) -> BatchReport {
        let defaults = self.defaults();
        let materialized = materialize_with_suggestions(
            batch,
            &self.deliverables,
            selected,
            catalog,
            registry,
            &defaults,
        );
        self.absorb(materialized)
    }

    /// Generate and add the deliverables for a piece of equipment.
    pub fn add_equipment(
        &mut self,
        item: &EquipmentItem,
        catalog: &Catalog,
        registry: &RuleRegistry,
    ) -> EstimateResult<BatchReport> {
        let batch = generate_equipment_deliverables(item, catalog, &self.defaults())?;
        Ok(self.add_deliverables(batch, registry))
    }

    /// Add a discipline package, optionally attached to a piece of equipment.
    ///
    /// Fails with `CatalogEntryNotFound` if the package is unknown or does not
    /// apply to the equipment's type.
    pub fn add_package(
        &mut self,
        package_id: &str,
        equipment: Option<&EquipmentItem>,
        catalog: &Catalog,
        registry: &RuleRegistry,
    ) -> EstimateResult<BatchReport> {
        let package = catalog.package(package_id)?;
        if let Some(item) = equipment {
            if !package.applies_to(&item.equipment_type) {
                return Err(EstimateError::catalog_entry_not_found(
                    format!("packages for {}", item.equipment_type),
                    package_id,
                ));
            }
        }
        let batch = generate_package_deliverables(package, equipment, &self.defaults());
        Ok(self.add_deliverables(batch, registry))
    }

    /// Remove a deliverable and every edge pointing at it.
    pub fn remove_deliverable(&mut self, id: DeliverableId) -> EstimateResult<Deliverable> {
        let position = self
            .deliverables
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| EstimateError::deliverable_not_found(id))?;
        let removed = self.deliverables.remove(position);

        let dangling: usize = self
            .deliverables
            .iter_mut()
            .map(|d| d.remove_dependencies_on(id))
            .sum();
        tracing::debug!(id = %id, name = %removed.name, dangling, "removed deliverable");

        self.touch();
        Ok(removed)
    }

    /// Add a manual dependency edge from `from` onto `to`.
    ///
    /// Both deliverables must exist. Self-edges and exact duplicates are
    /// rejected. Cycles are allowed; see [`Project::cycles`].
    pub fn add_dependency(
        &mut self,
        from: DeliverableId,
        to: DeliverableId,
        dependency_type: DependencyType,
    ) -> EstimateResult<()> {
        if from == to {
            return Err(EstimateError::invalid_dependency(
                from,
                to,
                "a deliverable cannot depend on itself",
            ));
        }
        if self.get(to).is_none() {
            return Err(EstimateError::deliverable_not_found(to));
        }
        let edge = DeliverableDependency {
            deliverable_id: to,
            dependency_type,
        };
        let dependent = self.get_mut(from)?;
        if !dependent.push_dependency(edge) {
            return Err(EstimateError::invalid_dependency(from, to, "dependency already exists"));
        }
        self.touch();
        Ok(())
    }

    /// Remove one edge. Returns false if there was no such edge.
    pub fn remove_dependency(
        &mut self,
        from: DeliverableId,
        to: DeliverableId,
        dependency_type: DependencyType,
    ) -> EstimateResult<bool> {
        let dependent = self.get_mut(from)?;
        let before = dependent.dependencies.len();
        dependent
            .dependencies
            .retain(|d| !(d.deliverable_id == to && d.dependency_type == dependency_type));
        let removed = dependent.dependencies.len() != before;
        if removed {
            self.touch();
        }
        Ok(removed)
    }

    /// Apply a partial effort configuration to a deliverable.
    ///
    /// The update is validated as a whole; on error the deliverable is left
    /// unchanged.
    pub fn configure(
        &mut self,
        id: DeliverableId,
        config: DeliverableConfig,
    ) -> EstimateResult<()> {
        let deliverable = self.get_mut(id)?;
        let mut updated = deliverable.clone();
        if let Some(hours) = config.base_hours {
            updated.base_hours = hours;
        }
        if let Some(states) = config.issue_states {
            updated.issue_states = states;
        }
        if let Some(cycles) = config.review_cycles {
            updated.review_cycles = cycles;
        }
        if let Some(factor) = config.rework_factor {
            updated.rework_factor = factor;
        }
        if let Some(overlay) = config.regulatory_overlay {
            updated.regulatory_overlay = overlay;
        }
        validate_effort_inputs(&updated)?;

        *deliverable = updated;
        self.touch();
        Ok(())
    }

    /// Store a user-edited RACI assignment on a deliverable.
    pub fn set_raci_override(
        &mut self,
        id: DeliverableId,
        assignment: RaciAssignment,
    ) -> EstimateResult<()> {
        self.get_mut(id)?.raci_override = Some(assignment);
        self.touch();
        Ok(())
    }

    /// Drop a stored RACI override, returning it if there was one.
    pub fn clear_raci_override(
        &mut self,
        id: DeliverableId,
    ) -> EstimateResult<Option<RaciAssignment>> {
        let previous = self.get_mut(id)?.raci_override.take();
        self.touch();
        Ok(previous)
    }

    /// Rate table: standard rates, then project overrides, then roster rates
    pub fn rate_table(&self) -> RateTable {
        RateTable::standard()
            .with_overrides(&self.settings.rate_overrides)
            .with_roster_rates(&self.team)
    }

    /// Dependency cycles among the project's deliverables
    pub fn cycles(&self) -> Vec<DependencyCycle> {
        dependency_cycles(&self.deliverables)
    }

    /// Estimate the whole project under its current settings.
    pub fn estimate(&self) -> EstimateResult<ProjectEstimate> {
        estimate_project(
            &self.deliverables,
            &self.team,
            self.settings.client_profile.as_ref(),
            &self.rate_table(),
        )
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> EstimateResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a project from JSON and check its schema version.
    pub fn from_json(json: &str) -> EstimateResult<Project> {
        let project: Project = serde_json::from_str(json)?;
        validate_version(&project.meta.version)?;
        Ok(project)
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "", "")
    }
}

/// Validate that a document version is compatible with the current schema.
fn validate_version(file_version: &str) -> EstimateResult<()> {
    let mismatch = || EstimateError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let parse = |version: &str| -> Vec<u32> {
        version.split('.').filter_map(|p| p.parse().ok()).collect()
    };
    let file_parts = parse(file_version);
    let current_parts = parse(SCHEMA_VERSION);

    let (Some(file_major), Some(current_major)) = (file_parts.first(), current_parts.first()) else {
        return Err(mismatch());
    };

    // Major version must match
    if file_major != current_major {
        return Err(mismatch());
    }

    // For 0.x versions, a newer minor version is not readable
    if *current_major == 0 {
        if let (Some(file_minor), Some(current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }

    Ok(())
}

/// Project metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Name of the responsible estimator
    pub estimator: String,

    /// Job/project number
    pub job_id: String,

    /// Client name
    pub client: String,

    /// When the project was created
    pub created: DateTime<Utc>,

    /// When the project was last modified
    pub modified: DateTime<Utc>,
}

/// Project-level estimating settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Delivery model; sets defaults for new deliverables
    #[serde(default)]
    pub project_type: ProjectType,

    /// Client complexity profile applied at calculation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_profile: Option<ClientComplexityProfile>,

    /// Hourly rate overrides by role
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rate_overrides: BTreeMap<String, f64>,
}
