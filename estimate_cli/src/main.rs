//! # Estimate CLI
//!
//! Interactive demo for the deliverable estimating engine. Builds a small
//! project around one piece of equipment and its applicable discipline
//! packages, then writes the estimate as JSON to stdout. Prompts, the
//! human-readable report and logs go to stderr (`RUST_LOG` overrides the
//! default `estimate_core=info` filter), so stdout can be piped.

use std::io::{self, BufRead, Write};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use estimate_core::catalog::{
    standard_catalog, EquipmentComplexity, EquipmentItem, EquipmentSize,
};
use estimate_core::deliverable::Deliverable;
use estimate_core::effort::ClientComplexityProfile;
use estimate_core::estimate::{EstimateWarning, ProjectEstimate};
use estimate_core::graph::suggested_prerequisites;
use estimate_core::raci::TeamMember;
use estimate_core::rules::standard_rules;
use estimate_core::{EstimateResult, Project};

const RULE: &str = "═══════════════════════════════════════════════════════════";

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "estimate_core=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn prompt(label: &str, default: &str) -> String {
    eprint!("{}", label);
    if io::stderr().flush().is_err() {
        return default.to_string();
    }

    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input).is_err() {
        return default.to_string();
    }

    let trimmed = input.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

fn parse_size(s: &str) -> EquipmentSize {
    match s.to_ascii_lowercase().as_str() {
        "small" | "s" => EquipmentSize::Small,
        "large" | "l" => EquipmentSize::Large,
        _ => EquipmentSize::Medium,
    }
}

fn parse_complexity(s: &str) -> EquipmentComplexity {
    match s.to_ascii_lowercase().as_str() {
        "simple" => EquipmentComplexity::Simple,
        "complex" => EquipmentComplexity::Complex,
        _ => EquipmentComplexity::Standard,
    }
}

fn build_project(
    equipment: &EquipmentItem,
    profile: Option<ClientComplexityProfile>,
) -> EstimateResult<Project> {
    let catalog = standard_catalog()?;
    let registry = standard_rules()?;

    let mut project = Project::new("CLI Demo", "DEMO-001", "Demo Client");
    project.settings.client_profile = profile;
    project.team = vec![
        TeamMember::new("Lead Engineer"),
        TeamMember::new("Process Engineer"),
        TeamMember::new("Mechanical Engineer"),
        TeamMember::new("Electrical Engineer"),
        TeamMember::new("Civil Engineer"),
    ];

    let report = project.add_equipment(equipment, catalog, registry)?;
    eprintln!(
        "Added {} deliverables for {} ({})",
        report.added.len(),
        equipment.tag,
        equipment.equipment_type
    );

    for package in catalog.applicable_packages(&equipment.equipment_type) {
        let report = project.add_package(&package.id, Some(equipment), catalog, registry)?;
        eprintln!(
            "Added {} deliverables from package {}",
            report.added.len(),
            package.name
        );
    }

    // A cross-discipline deliverable, accepting whatever the rules suggest
    let model = Deliverable::from_template(
        catalog.template("Design Deliverables", "3D Model")?,
        &project.defaults(),
    );
    let suggestions =
        suggested_prerequisites(std::slice::from_ref(&model), &project.deliverables, registry);
    if !suggestions.is_empty() {
        eprintln!(
            "Suggested prerequisites for 3D Model: {}",
            suggestions.join(", ")
        );
    }
    let report = project.add_with_suggestions(vec![model], &suggestions, catalog, registry);

    for (id, names) in &report.unresolved_prerequisites {
        let name = project.get(*id).map(|d| d.name.as_str()).unwrap_or("?");
        eprintln!("  unresolved: {} needs {}", name, names.join(", "));
    }

    Ok(project)
}

fn print_estimate(estimate: &ProjectEstimate) {
    eprintln!();
    eprintln!("{}", RULE);
    eprintln!("  DELIVERABLES");
    eprintln!("{}", RULE);
    for d in &estimate.deliverables {
        let responsible = d
            .raci
            .responsible
            .first()
            .map(|e| e.member.as_str())
            .unwrap_or("-");
        eprintln!(
            "  {:<32} {:>6} h  ${:>10.2}  (R: {})",
            d.name, d.effort.total_hours, d.cost.total_cost, responsible
        );
    }

    eprintln!();
    eprintln!("By role:");
    for r in &estimate.by_role {
        eprintln!(
            "  {:<24} {:>6} h ({:>5.1}%) = ${:>10.2}",
            r.role, r.hours, r.percentage, r.cost
        );
    }

    eprintln!();
    eprintln!("By discipline:");
    for d in &estimate.by_discipline {
        eprintln!(
            "  {:<32} {:>6} h  ({} deliverables)",
            d.discipline, d.hours, d.deliverable_count
        );
    }

    if !estimate.warnings.is_empty() {
        eprintln!();
        eprintln!("Warnings:");
        for w in &estimate.warnings {
            match w {
                EstimateWarning::NoIssueStates { name, .. } => {
                    eprintln!("  {} has no issue states", name)
                }
                EstimateWarning::DependencyCycle(cycle) => {
                    eprintln!("  dependency cycle: {}", cycle.names.join(" -> "))
                }
                EstimateWarning::DefaultedRate { role } => {
                    eprintln!("  no rate for {}, fallback used", role)
                }
            }
        }
    }

    eprintln!();
    eprintln!("{}", RULE);
    eprintln!(
        "  TOTAL: {} h, ${:.2} (avg ${:.2}/h)",
        estimate.summary.total_hours,
        estimate.summary.total_cost,
        estimate.summary.average_cost_per_hour
    );
    eprintln!("{}", RULE);
}

fn main() {
    init_tracing();

    eprintln!("Deliverable Estimator CLI");
    eprintln!("=========================");
    eprintln!();

    let equipment_type = prompt(
        "Equipment type (vessel/pump/heat_exchanger/tank/compressor) [vessel]: ",
        "vessel",
    );
    let tag = prompt("Equipment tag [V-101]: ", "V-101");
    let size = parse_size(&prompt("Size (small/medium/large) [medium]: ", "medium"));
    let complexity = parse_complexity(&prompt(
        "Complexity (simple/standard/complex) [standard]: ",
        "standard",
    ));
    let profile_name = prompt("Client profile (TYPE_A/TYPE_B/TYPE_C) [TYPE_B]: ", "TYPE_B");
    eprintln!();

    let profile = ClientComplexityProfile::preset(&profile_name);
    if profile.is_none() {
        tracing::warn!(profile = %profile_name, "unknown client profile, estimating without one");
    }

    let equipment = EquipmentItem::new(tag, equipment_type)
        .with_size(size)
        .with_complexity(complexity);

    match build_project(&equipment, profile).and_then(|project| project.estimate()) {
        Ok(estimate) => {
            print_estimate(&estimate);

            match serde_json::to_string_pretty(&estimate) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
        }
    }
}
