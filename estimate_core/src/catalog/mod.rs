//! # Deliverable Catalog
//!
//! Immutable reference tables: ad-hoc deliverable templates grouped by
//! category and discipline, equipment templates, equipment subtype scope
//! buckets and discipline packages. The catalog is a leaf module; it knows
//! nothing about projects or dependency rules.
//!
//! The standard catalog is bundled as TOML and parsed once on first access.
//! Callers can also load their own tables with [`Catalog::from_toml_str`].
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::catalog::standard_catalog;
//!
//! let catalog = standard_catalog().unwrap();
//! let pid = catalog.find_template("P&ID").unwrap();
//! assert_eq!(pid.base_hours, 120.0);
//! assert_eq!(pid.discipline, "Process");
//! ```

pub mod equipment;
pub mod packages;

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{EstimateError, EstimateResult};

pub use equipment::{
    generate_equipment_deliverables, DeliverableDefinition, EquipmentComplexity, EquipmentItem,
    EquipmentScope, EquipmentSize, EquipmentSubtype, EquipmentTemplate,
    EquipmentTemplateDeliverable,
};
pub use packages::{generate_package_deliverables, DisciplinePackage, PackageDeliverable};

const STANDARD_CATALOG_TOML: &str = include_str!("../../data/catalog.toml");

static STANDARD_CATALOG: Lazy<EstimateResult<Catalog>> =
    Lazy::new(|| Catalog::from_toml_str(STANDARD_CATALOG_TOML, "catalog.toml"));

/// The bundled standard catalog, parsed on first use.
pub fn standard_catalog() -> EstimateResult<&'static Catalog> {
    STANDARD_CATALOG.as_ref().map_err(Clone::clone)
}

// ============================================================================
// Templates
// ============================================================================

/// An immutable catalog entry for an ad-hoc deliverable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliverableTemplate {
    pub name: String,
    pub base_hours: f64,
    pub discipline: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    templates: Vec<TemplateGroup>,
    #[serde(default)]
    equipment: BTreeMap<String, EquipmentTemplate>,
    #[serde(default)]
    subtypes: Vec<EquipmentSubtype>,
    #[serde(default)]
    packages: Vec<DisciplinePackage>,
}

#[derive(Debug, Deserialize)]
struct TemplateGroup {
    category: String,
    discipline: String,
    entries: Vec<TemplateEntry>,
}

#[derive(Debug, Deserialize)]
struct TemplateEntry {
    name: String,
    base_hours: f64,
    #[serde(default)]
    description: Option<String>,
}

/// Reference tables for templates, equipment, subtypes and packages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    templates: Vec<DeliverableTemplate>,
    equipment: BTreeMap<String, EquipmentTemplate>,
    subtypes: Vec<EquipmentSubtype>,
    packages: Vec<DisciplinePackage>,
}

impl Catalog {
    /// Parse and validate a catalog from TOML.
    ///
    /// Fails with `ConfigError` if the document does not parse and with
    /// `DuplicateTemplateName` if a template name repeats within a category,
    /// a deliverable repeats within an equipment template or package, a
    /// subtype ID repeats within an equipment category, or a package ID
    /// repeats.
    pub fn from_toml_str(source: &str, source_name: &str) -> EstimateResult<Catalog> {
        let file: CatalogFile = toml::from_str(source)
            .map_err(|e| EstimateError::config_error(source_name, e.to_string()))?;

        let mut templates = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        for group in file.templates {
            for entry in group.entries {
                if !seen.insert((group.category.clone(), entry.name.clone())) {
                    return Err(EstimateError::duplicate_template_name(
                        "templates",
                        entry.name,
                        Some(&group.category),
                    ));
                }
                templates.push(DeliverableTemplate {
                    name: entry.name,
                    base_hours: entry.base_hours,
                    discipline: group.discipline.clone(),
                    category: group.category.clone(),
                    description: entry.description,
                });
            }
        }

        for (key, template) in &file.equipment {
            let mut names = HashSet::new();
            for deliverable in &template.deliverables {
                if !names.insert(deliverable.name.as_str()) {
                    return Err(EstimateError::duplicate_template_name(
                        "equipment",
                        deliverable.name.clone(),
                        Some(key),
                    ));
                }
            }
        }

        let mut subtype_keys = HashSet::new();
        for subtype in &file.subtypes {
            if !subtype_keys.insert((subtype.category.as_str(), subtype.id.as_str())) {
                return Err(EstimateError::duplicate_template_name(
                    "subtypes",
                    subtype.id.clone(),
                    Some(&subtype.category),
                ));
            }
        }

        let mut package_ids = HashSet::new();
        for package in &file.packages {
            if !package_ids.insert(package.id.as_str()) {
                return Err(EstimateError::duplicate_template_name(
                    "packages",
                    package.id.clone(),
                    None,
                ));
            }
            let mut names = HashSet::new();
            for deliverable in &package.deliverables {
                if !names.insert(deliverable.name.as_str()) {
                    return Err(EstimateError::duplicate_template_name(
                        "packages",
                        deliverable.name.clone(),
                        Some(&package.id),
                    ));
                }
            }
        }

        tracing::debug!(
            source = source_name,
            templates = templates.len(),
            equipment = file.equipment.len(),
            subtypes = file.subtypes.len(),
            packages = file.packages.len(),
            "loaded deliverable catalog"
        );

        Ok(Catalog {
            templates,
            equipment: file.equipment,
            subtypes: file.subtypes,
            packages: file.packages,
        })
    }

    /// All ad-hoc templates in table order
    pub fn templates(&self) -> &[DeliverableTemplate] {
        &self.templates
    }

    /// Distinct template categories, in table order
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for t in &self.templates {
            if !out.contains(&t.category.as_str()) {
                out.push(&t.category);
            }
        }
        out
    }

    /// Templates for one `(category, discipline)` group
    pub fn templates_for<'a>(
        &'a self,
        category: &'a str,
        discipline: &'a str,
    ) -> impl Iterator<Item = &'a DeliverableTemplate> + 'a {
        self.templates
            .iter()
            .filter(move |t| t.category == category && t.discipline == discipline)
    }

    /// First template with this name across all categories
    pub fn find_template(&self, name: &str) -> Option<&DeliverableTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Template lookup within one category.
    pub fn template(&self, category: &str, name: &str) -> EstimateResult<&DeliverableTemplate> {
        self.templates
            .iter()
            .find(|t| t.category == category && t.name == name)
            .ok_or_else(|| EstimateError::catalog_entry_not_found(category, name))
    }

    /// Equipment type keys (e.g. "vessel", "pump"), sorted
    pub fn equipment_types(&self) -> impl Iterator<Item = &str> {
        self.equipment.keys().map(String::as_str)
    }

    pub fn equipment_template(&self, equipment_type: &str) -> EstimateResult<&EquipmentTemplate> {
        self.equipment
            .get(equipment_type)
            .ok_or_else(|| EstimateError::catalog_entry_not_found("equipment", equipment_type))
    }

    /// Distinct subtype categories, in table order. Includes categories
    /// such as "tower" that have subtypes but no equipment template.
    pub fn subtype_categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for s in &self.subtypes {
            if !out.contains(&s.category.as_str()) {
                out.push(&s.category);
            }
        }
        out
    }

    /// Subtypes registered for an equipment category
    pub fn subtypes_for<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a EquipmentSubtype> + 'a {
        self.subtypes.iter().filter(move |s| s.category == category)
    }

    pub fn subtype(&self, category: &str, subtype_id: &str) -> EstimateResult<&EquipmentSubtype> {
        self.subtypes
            .iter()
            .find(|s| s.category == category && s.id == subtype_id)
            .ok_or_else(|| {
                let key = format!("{}/{}", category, subtype_id);
                EstimateError::catalog_entry_not_found("subtypes", key)
            })
    }

    /// Deliverable definitions for `(category, subtype_id, scope)`.
    ///
    /// ```rust
    /// use estimate_core::catalog::{standard_catalog, EquipmentScope};
    ///
    /// let catalog = standard_catalog().unwrap();
    /// let defs = catalog
    ///     .subtype_deliverables("vessel", "separator_2phase", EquipmentScope::Basic)
    ///     .unwrap();
    /// assert_eq!(defs.len(), 3);
    /// ```
    pub fn subtype_deliverables(
        &self,
        category: &str,
        subtype_id: &str,
        scope: EquipmentScope,
    ) -> EstimateResult<&[DeliverableDefinition]> {
        Ok(self.subtype(category, subtype_id)?.deliverables(scope))
    }

    /// All discipline packages in table order
    pub fn packages(&self) -> &[DisciplinePackage] {
        &self.packages
    }

    pub fn package(&self, package_id: &str) -> EstimateResult<&DisciplinePackage> {
        self.packages
            .iter()
            .find(|p| p.id == package_id)
            .ok_or_else(|| EstimateError::catalog_entry_not_found("packages", package_id))
    }

    /// Packages that may be attached to this equipment type, in table order
    pub fn applicable_packages<'a>(
        &'a self,
        equipment_type: &'a str,
    ) -> impl Iterator<Item = &'a DisciplinePackage> + 'a {
        self.packages.iter().filter(move |p| p.applies_to(equipment_type))
    }
}
