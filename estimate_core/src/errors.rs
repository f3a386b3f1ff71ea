//! # Error Types
//!
//! Structured error types for estimate_core. Errors carry enough context for a
//! caller (UI layer, script, or LLM) to point at the offending field or table
//! entry without parsing the message.
//!
//! Only domain-validation failures are errors. Advisory conditions such as an
//! unresolved prerequisite or a roster gap are returned as data by the
//! operation that detects them.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::errors::{EstimateError, EstimateResult};
//!
//! fn validate_rework(rework_factor: f64) -> EstimateResult<()> {
//!     if !(0.0..=1.0).contains(&rework_factor) {
//!         return Err(EstimateError::invalid_effort_input(
//!             "rework_factor",
//!             rework_factor.to_string(),
//!             "Rework factor must be between 0 and 1",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_rework(1.2).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for estimate_core operations
pub type EstimateResult<T> = Result<T, EstimateError>;

/// Structured error type for estimating operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum EstimateError {
    /// An effort calculator input is outside its domain
    #[error("Invalid effort input for '{field}': {value} - {reason}")]
    InvalidEffortInput {
        field: String,
        value: String,
        reason: String,
    },

    /// Two entries in one rule pool or catalog table claim the same key
    #[error(
        "Duplicate entry '{deliverable_name}' in {pool} (scope: {})",
        .scope.as_deref().unwrap_or("none")
    )]
    DuplicateTemplateName {
        pool: String,
        deliverable_name: String,
        scope: Option<String>,
    },

    /// A catalog table or entry does not exist
    #[error("Catalog entry not found: {table} / {key}")]
    CatalogEntryNotFound { table: String, key: String },

    /// A deliverable ID is not part of the project
    #[error("Deliverable not found: {id}")]
    DeliverableNotFound { id: String },

    /// A manual dependency edge is not allowed
    #[error("Invalid dependency {from} -> {to}: {reason}")]
    InvalidDependency {
        from: String,
        to: String,
        reason: String,
    },

    /// A rule or catalog table could not be parsed
    #[error("Configuration error in {source_name}: {reason}")]
    ConfigError { source_name: String, reason: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// An hour total does not fit in the hour counter
    #[error("Hour total overflows in {context}")]
    HoursOverflow { context: String },

    /// Schema version mismatch
    #[error("Version mismatch: document version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EstimateError {
    /// Create an InvalidEffortInput error
    pub fn invalid_effort_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        EstimateError::InvalidEffortInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a DuplicateTemplateName error
    pub fn duplicate_template_name(
        pool: impl Into<String>,
        deliverable_name: impl Into<String>,
        scope: Option<&str>,
    ) -> Self {
        EstimateError::DuplicateTemplateName {
            pool: pool.into(),
            deliverable_name: deliverable_name.into(),
            scope: scope.map(str::to_string),
        }
    }

    /// Create a CatalogEntryNotFound error
    pub fn catalog_entry_not_found(table: impl Into<String>, key: impl Into<String>) -> Self {
        EstimateError::CatalogEntryNotFound {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Create a DeliverableNotFound error
    pub fn deliverable_not_found(id: impl ToString) -> Self {
        EstimateError::DeliverableNotFound { id: id.to_string() }
    }

    /// Create an InvalidDependency error
    pub fn invalid_dependency(
        from: impl ToString,
        to: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        EstimateError::InvalidDependency {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a ConfigError
    pub fn config_error(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        EstimateError::ConfigError {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a HoursOverflow error
    pub fn hours_overflow(context: impl Into<String>) -> Self {
        EstimateError::HoursOverflow {
            context: context.into(),
        }
    }

    /// The field named by an `InvalidEffortInput`, if this is one
    pub fn offending_field(&self) -> Option<&str> {
        match self {
            EstimateError::InvalidEffortInput { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Errors raised while loading tables rather than while estimating
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            EstimateError::DuplicateTemplateName { .. } | EstimateError::ConfigError { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            EstimateError::InvalidEffortInput { .. } => "INVALID_EFFORT_INPUT",
            EstimateError::DuplicateTemplateName { .. } => "DUPLICATE_TEMPLATE_NAME",
            EstimateError::CatalogEntryNotFound { .. } => "CATALOG_ENTRY_NOT_FOUND",
            EstimateError::DeliverableNotFound { .. } => "DELIVERABLE_NOT_FOUND",
            EstimateError::InvalidDependency { .. } => "INVALID_DEPENDENCY",
            EstimateError::ConfigError { .. } => "CONFIG_ERROR",
            EstimateError::SerializationError { .. } => "SERIALIZATION_ERROR",
            EstimateError::HoursOverflow { .. } => "HOURS_OVERFLOW",
            EstimateError::VersionMismatch { .. } => "VERSION_MISMATCH",
            EstimateError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for EstimateError {
    fn from(err: serde_json::Error) -> Self {
        EstimateError::SerializationError {
            reason: err.to_string(),
        }
    }
}
