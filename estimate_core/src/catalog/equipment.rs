//! # Equipment Templates and Subtypes
//!
//! Each equipment type (vessel, pump, heat exchanger, tank, compressor) carries
//! a list of deliverables with nominal hours plus size and complexity factors.
//! Adding a piece of equipment to a project generates one deliverable per
//! template entry with
//!
//! ```text
//! base_hours = round(template_hours × size_factor × complexity_factor)
//! ```
//!
//! Subtypes (e.g. "2-Phase Separator") refine a category into basic, typical
//! and complex scope buckets with their own deliverable lists and optional
//! sheet counts. When an item names a subtype, the bucket's hours are used as
//! given. Some categories ("tower", "pd_pump") exist only as subtypes and
//! have no equipment template; items of those types must name a subtype.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::catalog::{standard_catalog, generate_equipment_deliverables};
//! use estimate_core::catalog::{EquipmentComplexity, EquipmentItem, EquipmentSize};
//! use estimate_core::deliverable::DeliverableDefaults;
//!
//! let catalog = standard_catalog().unwrap();
//! let item = EquipmentItem::new("V-101", "vessel")
//!     .with_size(EquipmentSize::Large)
//!     .with_complexity(EquipmentComplexity::Complex);
//!
//! let deliverables =
//!     generate_equipment_deliverables(&item, catalog, &DeliverableDefaults::ad_hoc()).unwrap();
//! let pressure = deliverables.iter().find(|d| d.name == "Pressure Calculations").unwrap();
//! assert_eq!(pressure.base_hours, 36.0); // 20 × 1.3 × 1.4 = 36.4
//! assert_eq!(pressure.equipment_tag.as_deref(), Some("V-101"));
//! ```

use serde::{Deserialize, Serialize};

use super::Catalog;
use crate::deliverable::{Deliverable, DeliverableDefaults};
use crate::errors::EstimateResult;

/// Equipment size bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// Equipment complexity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentComplexity {
    Simple,
    #[default]
    Standard,
    Complex,
}

/// Subtype scope bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentScope {
    Basic,
    #[default]
    Typical,
    Complex,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeFactors {
    pub small: f64,
    pub medium: f64,
    pub large: f64,
}

impl SizeFactors {
    pub fn factor(&self, size: EquipmentSize) -> f64 {
        match size {
            EquipmentSize::Small => self.small,
            EquipmentSize::Medium => self.medium,
            EquipmentSize::Large => self.large,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexityFactors {
    pub simple: f64,
    pub standard: f64,
    pub complex: f64,
}

impl ComplexityFactors {
    pub fn factor(&self, complexity: EquipmentComplexity) -> f64 {
        match complexity {
            EquipmentComplexity::Simple => self.simple,
            EquipmentComplexity::Standard => self.standard,
            EquipmentComplexity::Complex => self.complex,
        }
    }
}

/// One deliverable line of an equipment template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentTemplateDeliverable {
    pub name: String,
    pub discipline: String,
    pub base_hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Deliverable set and scaling factors for one equipment type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentTemplate {
    /// Display name (e.g. "Pressure Vessel")
    pub type_name: String,
    #[serde(default)]
    pub description: String,
    pub size_factors: SizeFactors,
    pub complexity_factors: ComplexityFactors,
    pub deliverables: Vec<EquipmentTemplateDeliverable>,
}

impl EquipmentTemplate {
    /// Scaled, rounded hours for one template line
    pub fn scaled_hours(
        &self,
        line: &EquipmentTemplateDeliverable,
        size: EquipmentSize,
        complexity: EquipmentComplexity,
    ) -> f64 {
        let factor = self.size_factors.factor(size) * self.complexity_factors.factor(complexity);
        (line.base_hours * factor).round()
    }
}

/// A deliverable within a subtype scope bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliverableDefinition {
    pub name: String,
    pub discipline: String,
    pub hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typical_sheets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_per_sheet: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeGuidance {
    pub basic: String,
    pub typical: String,
    pub complex: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeDeliverables {
    pub basic: Vec<DeliverableDefinition>,
    pub typical: Vec<DeliverableDefinition>,
    pub complex: Vec<DeliverableDefinition>,
}

/// Equipment subtype with per-scope deliverable lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSubtype {
    /// Equipment category this subtype refines (e.g. "vessel")
    pub category: String,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recommended_scope: EquipmentScope,
    pub guidance: ScopeGuidance,
    pub deliverables: ScopeDeliverables,
}

impl EquipmentSubtype {
    pub fn deliverables(&self, scope: EquipmentScope) -> &[DeliverableDefinition] {
        match scope {
            EquipmentScope::Basic => &self.deliverables.basic,
            EquipmentScope::Typical => &self.deliverables.typical,
            EquipmentScope::Complex => &self.deliverables.complex,
        }
    }

    pub fn guidance(&self, scope: EquipmentScope) -> &str {
        match scope {
            EquipmentScope::Basic => &self.guidance.basic,
            EquipmentScope::Typical => &self.guidance.typical,
            EquipmentScope::Complex => &self.guidance.complex,
        }
    }
}

/// A piece of equipment being added to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentItem {
    /// Equipment tag (e.g. "V-101")
    pub tag: String,
    /// Catalog equipment key (e.g. "vessel")
    pub equipment_type: String,
    #[serde(default)]
    pub size: EquipmentSize,
    #[serde(default)]
    pub complexity: EquipmentComplexity,
    /// Optional subtype; when set, the subtype's scope bucket replaces the
    /// scaled template list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default)]
    pub scope: EquipmentScope,
}

impl EquipmentItem {
    pub fn new(tag: impl Into<String>, equipment_type: impl Into<String>) -> Self {
        EquipmentItem {
            tag: tag.into(),
            equipment_type: equipment_type.into(),
            size: EquipmentSize::default(),
            complexity: EquipmentComplexity::default(),
            subtype: None,
            scope: EquipmentScope::default(),
        }
    }

    pub fn with_size(mut self, size: EquipmentSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_complexity(mut self, complexity: EquipmentComplexity) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>, scope: EquipmentScope) -> Self {
        self.subtype = Some(subtype.into());
        self.scope = scope;
        self
    }
}

/// Generate the deliverables for one equipment item.
///
/// Every generated deliverable is tagged with the item's equipment type and
/// tag so that equipment-scoped dependency rules apply to it. Dependencies are
/// not materialized here; pass the result through the graph builder.
///
/// The category label is the equipment template's display name, or the
/// subtype's name for types that have no template.
pub fn generate_equipment_deliverables(
    item: &EquipmentItem,
    catalog: &Catalog,
    defaults: &DeliverableDefaults,
) -> EstimateResult<Vec<Deliverable>> {
    let (category, deliverables) = match &item.subtype {
        Some(subtype_id) => {
            let subtype = catalog.subtype(&item.equipment_type, subtype_id)?;
            let category = match catalog.equipment_template(&item.equipment_type) {
                Ok(template) => template.type_name.clone(),
                Err(_) => subtype.name.clone(),
            };
            let deliverables = subtype
                .deliverables(item.scope)
                .iter()
                .map(|def| {
                    let (name, discipline) = (def.name.clone(), def.discipline.clone());
                    Deliverable::with_defaults(name, discipline, def.hours, defaults)
                })
                .collect::<Vec<_>>();
            (category, deliverables)
        }
        None => {
            let template = catalog.equipment_template(&item.equipment_type)?;
            let deliverables = template
                .deliverables
                .iter()
                .map(|line| {
                    let hours = template.scaled_hours(line, item.size, item.complexity);
                    let (name, discipline) = (line.name.clone(), line.discipline.clone());
                    Deliverable::with_defaults(name, discipline, hours, defaults)
                })
                .collect::<Vec<_>>();
            (template.type_name.clone(), deliverables)
        }
    };

    Ok(deliverables
        .into_iter()
        .map(|d| {
            d.with_category(category.clone())
                .with_equipment_type(item.equipment_type.clone())
                .with_equipment_tag(item.tag.clone())
        })
        .collect())
}
