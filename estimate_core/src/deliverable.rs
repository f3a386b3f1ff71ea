//! # Deliverables
//!
//! Project-scoped deliverable instances and the small value types they carry.
//!
//! A [`Deliverable`] is created when a user (or a template) adds it to a
//! project. Its [`DeliverableId`] is assigned at creation and is the only handle
//! other deliverables use to reference it: once dependencies are materialized
//! they store IDs, never names. A deliverable owns its own dependency list and
//! nothing else.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::deliverable::{Deliverable, IssueState};
//!
//! let datasheet = Deliverable::new("Process Datasheet", "Process", 40.0)
//!     .with_issue_states([IssueState::Ifr, IssueState::Ifc])
//!     .with_review(2, 0.20);
//!
//! assert_eq!(datasheet.review_cycles, 2);
//! assert!(datasheet.issue_states.contains(&IssueState::Ifc));
//! ```

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::DeliverableTemplate;
use crate::raci::RaciAssignment;

/// Opaque, unique deliverable handle.
///
/// IDs are only ever allocated explicitly with [`DeliverableId::new`] or
/// restored with [`DeliverableId::from_uuid`]; there is no `Default`.
///
/// ```compile_fail
/// let _ = estimate_core::deliverable::DeliverableId::default();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliverableId(Uuid);

#[allow(clippy::new_without_default)]
impl DeliverableId {
    /// Allocate a fresh random ID
    pub fn new() -> Self {
        DeliverableId(Uuid::new_v4())
    }

    /// Wrap an existing UUID (e.g. one read back from storage)
    pub fn from_uuid(uuid: Uuid) -> Self {
        DeliverableId(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DeliverableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Document release milestone.
///
/// Each state carries a fixed effort multiplier relative to the
/// issued-for-construction baseline. A deliverable holds a *set* of states;
/// every selected state contributes effort independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueState {
    /// Issued for Design
    Ifd,
    /// Issued for Review
    Ifr,
    /// Issued for Approval
    Ifa,
    /// Issued for Bid
    Ifb,
    /// Issued for Construction
    Ifc,
    /// Issued for Information
    Ifi,
    /// Issued for Permit
    Ifp,
    /// Issued for Manufacture
    Ifm,
}

impl IssueState {
    /// All issue states in display order
    pub const ALL: [IssueState; 8] = [
        IssueState::Ifd,
        IssueState::Ifr,
        IssueState::Ifa,
        IssueState::Ifb,
        IssueState::Ifc,
        IssueState::Ifi,
        IssueState::Ifp,
        IssueState::Ifm,
    ];

    /// Effort multiplier relative to IFC
    pub fn multiplier(&self) -> f64 {
        match self {
            IssueState::Ifd => 0.4,
            IssueState::Ifr => 0.6,
            IssueState::Ifa => 0.7,
            IssueState::Ifb => 0.9,
            IssueState::Ifc => 1.0,
            IssueState::Ifi => 0.3,
            IssueState::Ifp => 0.8,
            IssueState::Ifm => 0.9,
        }
    }

    /// Short code (e.g. "IFC")
    pub fn code(&self) -> &'static str {
        match self {
            IssueState::Ifd => "IFD",
            IssueState::Ifr => "IFR",
            IssueState::Ifa => "IFA",
            IssueState::Ifb => "IFB",
            IssueState::Ifc => "IFC",
            IssueState::Ifi => "IFI",
            IssueState::Ifp => "IFP",
            IssueState::Ifm => "IFM",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            IssueState::Ifd => "Issued for Design",
            IssueState::Ifr => "Issued for Review",
            IssueState::Ifa => "Issued for Approval",
            IssueState::Ifb => "Issued for Bid",
            IssueState::Ifc => "Issued for Construction",
            IssueState::Ifi => "Issued for Information",
            IssueState::Ifp => "Issued for Permit",
            IssueState::Ifm => "Issued for Manufacture",
        }
    }

    /// Parse a code, case-insensitively
    pub fn from_code(code: &str) -> Option<Self> {
        IssueState::ALL
            .into_iter()
            .find(|s| s.code().eq_ignore_ascii_case(code.trim()))
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Compliance requirement that adds a fixed effort surcharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegulatoryOverlay {
    #[default]
    None,
    Hazop,
    Sil,
    Fda,
    Haccp,
}

impl RegulatoryOverlay {
    /// Additional effort as a fraction of base hours.
    ///
    /// Only HAZOP carries a surcharge today; the other overlays are tracked
    /// for reporting.
    pub fn surcharge_fraction(&self) -> f64 {
        match self {
            RegulatoryOverlay::Hazop => 0.25,
            RegulatoryOverlay::None
            | RegulatoryOverlay::Sil
            | RegulatoryOverlay::Fda
            | RegulatoryOverlay::Haccp => 0.0,
        }
    }
}

/// How strongly one deliverable depends on another
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    /// Must be complete before this deliverable starts
    Prerequisite,
    /// Progresses alongside this deliverable
    Corequisite,
}

/// A dependency edge, stored on the dependent deliverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliverableDependency {
    pub deliverable_id: DeliverableId,
    pub dependency_type: DependencyType,
}

impl DeliverableDependency {
    pub fn prerequisite(deliverable_id: DeliverableId) -> Self {
        DeliverableDependency {
            deliverable_id,
            dependency_type: DependencyType::Prerequisite,
        }
    }

    pub fn corequisite(deliverable_id: DeliverableId) -> Self {
        DeliverableDependency {
            deliverable_id,
            dependency_type: DependencyType::Corequisite,
        }
    }
}

/// Issue-state and review configuration applied to newly created deliverables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliverableDefaults {
    pub issue_states: BTreeSet<IssueState>,
    pub review_cycles: i32,
    pub rework_factor: f64,
}

impl DeliverableDefaults {
    /// Defaults for deliverables added one at a time: IFR + IFC, one review
    /// cycle, 25% rework.
    pub fn ad_hoc() -> Self {
        DeliverableDefaults {
            issue_states: [IssueState::Ifr, IssueState::Ifc].into_iter().collect(),
            review_cycles: 1,
            rework_factor: 0.25,
        }
    }
}

impl Default for DeliverableDefaults {
    fn default() -> Self {
        DeliverableDefaults::ad_hoc()
    }
}

/// Delivery model of a project; determines default issue-state progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectType {
    #[default]
    PhaseGate,
    FastTrack,
    Campaign,
}

impl ProjectType {
    pub fn defaults(&self) -> DeliverableDefaults {
        let (states, review_cycles, rework_factor): (&[IssueState], i32, f64) = match self {
            ProjectType::PhaseGate => (
                &[
                    IssueState::Ifd,
                    IssueState::Ifr,
                    IssueState::Ifa,
                    IssueState::Ifb,
                    IssueState::Ifc,
                ],
                3,
                0.25,
            ),
            ProjectType::FastTrack => (&[IssueState::Ifr, IssueState::Ifc], 1, 0.20),
            ProjectType::Campaign => (&[IssueState::Ifc], 0, 0.10),
        };
        DeliverableDefaults {
            issue_states: states.iter().copied().collect(),
            review_cycles,
            rework_factor,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProjectType::PhaseGate => "Phase Gate",
            ProjectType::FastTrack => "Fast Track",
            ProjectType::Campaign => "Campaign",
        }
    }
}

/// A deliverable instance within a project.
///
/// ## JSON Example
///
/// ```json
/// {
///   "id": "6f1c2d4e-8a7b-4c3d-9e2f-1a2b3c4d5e6f",
///   "name": "Nozzle Orientation Drawing",
///   "discipline": "Mechanical",
///   "equipment_type": "vessel",
///   "base_hours": 40.0,
///   "issue_states": ["IFR", "IFC"],
///   "review_cycles": 1,
///   "rework_factor": 0.25,
///   "dependencies": [
///     { "deliverable_id": "0d9a...", "dependency_type": "prerequisite" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deliverable {
    pub id: DeliverableId,

    pub name: String,

    pub discipline: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Equipment type used to scope dependency rules (e.g. "vessel")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_type: Option<String>,

    /// Tag of the equipment item this deliverable was generated for (e.g. "V-101")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_tag: Option<String>,

    /// Base effort in hours at the IFC baseline
    pub base_hours: f64,

    #[serde(default)]
    pub issue_states: BTreeSet<IssueState>,

    /// Expected review/rework iterations. Signed so that out-of-range values
    /// coming from callers are reported instead of failing to deserialize.
    #[serde(default)]
    pub review_cycles: i32,

    /// Fraction of issue-state effort re-spent per review cycle, 0..=1
    #[serde(default)]
    pub rework_factor: f64,

    #[serde(default)]
    pub regulatory_overlay: RegulatoryOverlay,

    /// Outgoing dependency edges, insertion ordered, no duplicates
    #[serde(default)]
    pub dependencies: Vec<DeliverableDependency>,

    /// User-edited RACI assignment; replaces the derived default when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raci_override: Option<RaciAssignment>,
}

impl Deliverable {
    /// Create a deliverable with a fresh ID and ad-hoc defaults.
    pub fn new(name: impl Into<String>, discipline: impl Into<String>, base_hours: f64) -> Self {
        Deliverable::with_defaults(name, discipline, base_hours, &DeliverableDefaults::ad_hoc())
    }

    /// Create a deliverable with a fresh ID and the given configuration defaults.
    pub fn with_defaults(
        name: impl Into<String>,
        discipline: impl Into<String>,
        base_hours: f64,
        defaults: &DeliverableDefaults,
    ) -> Self {
        Deliverable {
            id: DeliverableId::new(),
            name: name.into(),
            discipline: discipline.into(),
            category: None,
            equipment_type: None,
            equipment_tag: None,
            base_hours,
            issue_states: defaults.issue_states.clone(),
            review_cycles: defaults.review_cycles,
            rework_factor: defaults.rework_factor,
            regulatory_overlay: RegulatoryOverlay::None,
            dependencies: Vec::new(),
            raci_override: None,
        }
    }

    /// Instantiate a catalog template.
    pub fn from_template(template: &DeliverableTemplate, defaults: &DeliverableDefaults) -> Self {
        Deliverable::with_defaults(
            template.name.clone(),
            template.discipline.clone(),
            template.base_hours,
            defaults,
        )
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_equipment_type(mut self, equipment_type: impl Into<String>) -> Self {
        self.equipment_type = Some(equipment_type.into());
        self
    }

    pub fn with_equipment_tag(mut self, tag: impl Into<String>) -> Self {
        self.equipment_tag = Some(tag.into());
        self
    }

    pub fn with_issue_states(mut self, states: impl IntoIterator<Item = IssueState>) -> Self {
        self.issue_states = states.into_iter().collect();
        self
    }

    pub fn with_review(mut self, review_cycles: i32, rework_factor: f64) -> Self {
        self.review_cycles = review_cycles;
        self.rework_factor = rework_factor;
        self
    }

    pub fn with_overlay(mut self, overlay: RegulatoryOverlay) -> Self {
        self.regulatory_overlay = overlay;
        self
    }

    /// Toggle membership of an issue state. Returns true if the state is now selected.
    pub fn toggle_issue_state(&mut self, state: IssueState) -> bool {
        if self.issue_states.remove(&state) {
            false
        } else {
            self.issue_states.insert(state);
            true
        }
    }

    /// Whether an identical `(deliverable_id, dependency_type)` edge exists
    pub fn has_dependency(&self, edge: &DeliverableDependency) -> bool {
        self.dependencies.contains(edge)
    }

    /// Append an edge unless an identical one is already present.
    ///
    /// Returns true if the edge was added.
    pub fn push_dependency(&mut self, edge: DeliverableDependency) -> bool {
        if self.has_dependency(&edge) {
            return false;
        }
        self.dependencies.push(edge);
        true
    }

    /// Drop every edge pointing at `target`. Returns the number removed.
    pub fn remove_dependencies_on(&mut self, target: DeliverableId) -> usize {
        let before = self.dependencies.len();
        self.dependencies.retain(|d| d.deliverable_id != target);
        before - self.dependencies.len()
    }

    /// IDs of prerequisite edges, in insertion order
    pub fn prerequisite_ids(&self) -> impl Iterator<Item = DeliverableId> + '_ {
        self.dependencies
            .iter()
            .filter(|d| d.dependency_type == DependencyType::Prerequisite)
            .map(|d| d.deliverable_id)
    }
}
