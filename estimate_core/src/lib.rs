//! # estimate_core - Deliverable Effort & Dependency Engine
//!
//! `estimate_core` turns catalog entries into concrete, cost-allocated
//! engineering deliverables. It infers which deliverables must exist before
//! another can start, composes effort hours from issue states, review cycles
//! and rework, splits those hours across RACI roles, and prices the result.
//! All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Pure**: synchronous functions over data the caller owns; no I/O
//! - **Explicit tables**: rule registries and catalogs are values passed in,
//!   with bundled standard tables available on demand
//! - **Rich Errors**: structured error types, with advisory findings returned
//!   as data rather than errors
//!
//! ## Quick Start
//!
//! ```rust
//! use estimate_core::catalog::{standard_catalog, EquipmentItem};
//! use estimate_core::project::Project;
//! use estimate_core::rules::standard_rules;
//!
//! let mut project = Project::new("Jane Estimator", "25-001", "Acme Refining");
//! let vessel = EquipmentItem::new("V-101", "vessel");
//! project.add_equipment(&vessel, standard_catalog()?, standard_rules()?)?;
//! project.add_package("insulation", Some(&vessel), standard_catalog()?, standard_rules()?)?;
//!
//! let estimate = project.estimate()?;
//! assert!(estimate.summary.total_hours > 0);
//! # Ok::<(), estimate_core::errors::EstimateError>(())
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - Deliverable templates, equipment templates, subtypes and
//!   discipline packages
//! - [`rules`] - Dependency rule registry and prerequisite resolution
//! - [`graph`] - Name-to-ID dependency materialization and cycle reports
//! - [`effort`] - Effort hour calculation and client complexity profiles
//! - [`raci`] - RACI allocation, rate tables and pricing
//! - [`estimate`] - Project-wide rollups
//! - [`project`] - Project container, metadata and settings
//! - [`deliverable`] - Deliverable instances and their value types
//! - [`errors`] - Structured error types

pub mod catalog;
pub mod deliverable;
pub mod effort;
pub mod errors;
pub mod estimate;
pub mod graph;
pub mod project;
pub mod raci;
pub mod rules;

// Re-export commonly used types at crate root for convenience
pub use deliverable::{Deliverable, DeliverableId, DependencyType, IssueState};
pub use errors::{EstimateError, EstimateResult};
pub use project::{Project, ProjectMetadata, ProjectSettings};
pub use rules::RuleRegistry;
