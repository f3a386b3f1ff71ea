//! # Discipline Packages
//!
//! A discipline package is a fixed bundle of deliverables (instrumentation,
//! piping, insulation and so on) that can be attached to a piece of
//! equipment. Packages that list `applicable_to` only apply to those
//! equipment types; the rest apply everywhere. Package hours are used as
//! listed and are not scaled by equipment size or complexity.
//!
//! ```rust
//! use estimate_core::catalog::standard_catalog;
//!
//! let catalog = standard_catalog().unwrap();
//! let ids: Vec<&str> = catalog
//!     .applicable_packages("pump")
//!     .map(|p| p.id.as_str())
//!     .collect();
//! assert!(ids.contains(&"electrical"));
//! assert!(!ids.contains(&"safety"));
//! ```

use serde::{Deserialize, Serialize};

use super::EquipmentItem;
use crate::deliverable::{Deliverable, DeliverableDefaults};

/// One deliverable line of a discipline package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDeliverable {
    pub name: String,
    pub base_hours: f64,
}

/// A named bundle of deliverables for one discipline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisciplinePackage {
    pub id: String,
    /// Display name (e.g. "Piping Package"); also the category of the
    /// deliverables it generates
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub discipline: String,
    /// Equipment types this package is limited to; `None` means all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicable_to: Option<Vec<String>>,
    pub deliverables: Vec<PackageDeliverable>,
}

impl DisciplinePackage {
    pub fn applies_to(&self, equipment_type: &str) -> bool {
        match &self.applicable_to {
            Some(types) => types.iter().any(|t| t == equipment_type),
            None => true,
        }
    }

    /// Sum of the listed deliverable hours
    pub fn total_hours(&self) -> f64 {
        self.deliverables.iter().map(|d| d.base_hours).sum()
    }
}

/// Generate the deliverables of one package.
///
/// When attached to equipment, each deliverable carries the item's type and
/// tag so that equipment-scoped dependency rules apply to it.
pub fn generate_package_deliverables(
    package: &DisciplinePackage,
    equipment: Option<&EquipmentItem>,
    defaults: &DeliverableDefaults,
) -> Vec<Deliverable> {
    package
        .deliverables
        .iter()
        .map(|line| {
            let deliverable = Deliverable::with_defaults(
                line.name.clone(),
                package.discipline.clone(),
                line.base_hours,
                defaults,
            )
            .with_category(package.name.clone());

            match equipment {
                Some(item) => deliverable
                    .with_equipment_type(item.equipment_type.clone())
                    .with_equipment_tag(item.tag.clone()),
                None => deliverable,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::standard_catalog;

    fn package_ids(equipment_type: &'static str) -> Vec<&'static str> {
        standard_catalog()
            .unwrap()
            .applicable_packages(equipment_type)
            .map(|p| p.id.as_str())
            .collect()
    }

    const UNIVERSAL: [&str; 5] =
        ["instrumentation", "civil_structural", "piping", "layout", "controls"];

    #[test]
    fn test_universal_packages_apply_everywhere() {
        for equipment_type in ["vessel", "pump", "tank", "compressor", "skid"] {
            let ids = package_ids(equipment_type);
            for universal in UNIVERSAL {
                assert!(ids.contains(&universal), "{} missing for {}", universal, equipment_type);
            }
        }
    }

    #[test]
    fn test_pump_packages() {
        let ids = package_ids("pump");
        assert!(ids.contains(&"electrical"));
        assert!(ids.contains(&"insulation"));
        assert!(!ids.contains(&"safety"));
        assert_eq!(ids.len(), 7);
    }

    #[test]
    fn test_vessel_packages() {
        let ids = package_ids("vessel");
        assert!(ids.contains(&"safety"));
        assert!(ids.contains(&"insulation"));
        assert!(!ids.contains(&"electrical"));
    }

    #[test]
    fn test_tower_gets_every_package() {
        assert_eq!(package_ids("tower").len(), 8);
    }

    #[test]
    fn test_compressor_skips_insulation_and_safety() {
        let ids = package_ids("compressor");
        assert!(ids.contains(&"electrical"));
        assert!(!ids.contains(&"insulation"));
        assert!(!ids.contains(&"safety"));
    }

    #[test]
    fn test_package_totals() {
        let catalog = standard_catalog().unwrap();
        assert_eq!(catalog.package("instrumentation").unwrap().total_hours(), 24.0);
        assert_eq!(catalog.package("layout").unwrap().total_hours(), 12.0);
        assert_eq!(catalog.package("insulation").unwrap().total_hours(), 8.0);
    }

    #[test]
    fn test_generated_deliverables_are_tagged() {
        let catalog = standard_catalog().unwrap();
        let package = catalog.package("safety").unwrap();
        let item = EquipmentItem::new("V-101", "vessel");
        let deliverables =
            generate_package_deliverables(package, Some(&item), &DeliverableDefaults::ad_hoc());

        assert_eq!(deliverables.len(), 3);
        assert_eq!(deliverables[0].name, "Relief Valve Sizing Calculations");
        assert_eq!(deliverables[0].base_hours, 6.0);
        assert!(deliverables.iter().all(|d| {
            d.discipline == "Safety"
                && d.category.as_deref() == Some("Safety & Relief Package")
                && d.equipment_tag.as_deref() == Some("V-101")
        }));
    }

    #[test]
    fn test_standalone_package_has_no_equipment() {
        let catalog = standard_catalog().unwrap();
        let package = catalog.package("piping").unwrap();
        let deliverables =
            generate_package_deliverables(package, None, &DeliverableDefaults::ad_hoc());
        assert_eq!(deliverables.len(), 4);
        assert!(deliverables.iter().all(|d| d.equipment_type.is_none()));
    }
}
