//! # Project Estimate
//!
//! Rolls effort, RACI allocation and pricing up over a set of deliverables.
//!
//! For each deliverable the pipeline is:
//!
//! ```text
//! compute_effort ──► effective_raci (override or default split) ──► cost_assignment
//! ```
//!
//! The rollup then sums hours and cost, groups RACI hours and cost by role
//! (largest first, with each role's share of the project hours), groups hours
//! by discipline, and collects advisory warnings: deliverables without issue
//! states, dependency cycles, and roles priced at the fallback rate.
//!
//! Any `InvalidEffortInput` aborts the rollup and is returned as-is. Hour sums
//! are checked; a total past `u64::MAX` is a `HoursOverflow` error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::deliverable::{Deliverable, DeliverableId};
use crate::effort::{
    add_hours, compute_effort, sum_hours, ClientComplexityProfile, EffortBreakdown, EffortWarning,
};
use crate::errors::EstimateResult;
use crate::graph::{dependency_cycles, DependencyCycle};
use crate::raci::{
    cost_assignment, effective_raci, is_customized, AssignmentCost, RaciAssignment, RateTable,
    TeamMember,
};

/// Estimate for one deliverable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliverableEstimate {
    pub id: DeliverableId,
    pub name: String,
    pub discipline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_tag: Option<String>,
    pub effort: EffortBreakdown,
    pub raci: RaciAssignment,
    /// True when a stored override differs from the default split
    pub raci_customized: bool,
    pub cost: AssignmentCost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateSummary {
    pub total_hours: u64,
    pub total_cost: f64,
    pub deliverable_count: usize,
    /// Total cost over total hours, 0 when there are no hours
    pub average_cost_per_hour: f64,
}

/// RACI hours and cost for one role across the project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRollup {
    pub role: String,
    pub hours: u64,
    pub cost: f64,
    /// Share of project hours, one decimal place
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisciplineRollup {
    pub discipline: String,
    pub hours: u64,
    pub deliverable_count: usize,
}

/// Advisory findings from a rollup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum EstimateWarning {
    NoIssueStates { id: DeliverableId, name: String },
    DependencyCycle(DependencyCycle),
    DefaultedRate { role: String },
}

/// Full project estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEstimate {
    pub summary: EstimateSummary,
    pub by_role: Vec<RoleRollup>,
    pub by_discipline: Vec<DisciplineRollup>,
    pub deliverables: Vec<DeliverableEstimate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<EstimateWarning>,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Estimate every deliverable and roll the results up.
///
/// Rates supplied by roster members take precedence over `rates`.
///
/// # Example
///
/// ```rust
/// use estimate_core::deliverable::{Deliverable, IssueState};
/// use estimate_core::estimate::estimate_project;
/// use estimate_core::raci::{RateTable, TeamMember};
///
/// let deliverables = vec![
///     Deliverable::new("P&ID", "Process", 100.0)
///         .with_issue_states([IssueState::Ifc])
///         .with_review(0, 0.0),
/// ];
/// let roster = vec![TeamMember::new("Process Engineer")];
///
/// let estimate = estimate_project(&deliverables, &roster, None, &RateTable::standard()).unwrap();
/// assert_eq!(estimate.summary.total_hours, 100);
/// assert_eq!(estimate.by_role[0].role, "Process Engineer");
/// assert_eq!(estimate.by_role[0].percentage, 60.0);
/// ```
pub fn estimate_project(
    deliverables: &[Deliverable],
    roster: &[TeamMember],
    profile: Option<&ClientComplexityProfile>,
    rates: &RateTable,
) -> EstimateResult<ProjectEstimate> {
    let rates = rates.clone().with_roster_rates(roster);

    let mut estimates = Vec::with_capacity(deliverables.len());
    let mut warnings = Vec::new();
    let mut defaulted: Vec<String> = Vec::new();
    let mut role_hours: BTreeMap<String, u64> = BTreeMap::new();
    let mut role_cost: BTreeMap<String, f64> = BTreeMap::new();
    let mut disciplines: BTreeMap<String, (u64, usize)> = BTreeMap::new();

    for d in deliverables {
        let effort = compute_effort(d, profile)?;
        for w in &effort.warnings {
            match w {
                EffortWarning::NoIssueStates { .. } => {
                    warnings.push(EstimateWarning::NoIssueStates {
                        id: d.id,
                        name: d.name.clone(),
                    })
                }
            }
        }

        let raci = effective_raci(d, effort.total_hours, roster);
        let raci_customized = is_customized(d, effort.total_hours, roster);
        let cost = cost_assignment(&raci, &rates)?;

        for line in &cost.lines {
            let hours = role_hours.entry(line.member.clone()).or_default();
            *hours = add_hours(*hours, line.hours, "role rollup")?;
            *role_cost.entry(line.member.clone()).or_default() += line.cost;
        }
        for role in &cost.defaulted_roles {
            if !defaulted.contains(role) {
                defaulted.push(role.clone());
            }
        }

        let entry = disciplines.entry(d.discipline.clone()).or_default();
        entry.0 = add_hours(entry.0, effort.total_hours, "discipline rollup")?;
        entry.1 += 1;

        estimates.push(DeliverableEstimate {
            id: d.id,
            name: d.name.clone(),
            discipline: d.discipline.clone(),
            equipment_tag: d.equipment_tag.clone(),
            effort,
            raci,
            raci_customized,
            cost,
        });
    }

    let total_hours = sum_hours(
        estimates.iter().map(|e| e.effort.total_hours),
        "project total",
    )?;
    let total_cost: f64 = estimates.iter().map(|e| e.cost.total_cost).sum();

    let mut by_role: Vec<RoleRollup> = role_hours
        .into_iter()
        .map(|(role, hours)| RoleRollup {
            cost: round_to(role_cost.get(&role).copied().unwrap_or(0.0), 2),
            percentage: if total_hours > 0 {
                round_to(hours as f64 / total_hours as f64 * 100.0, 1)
            } else {
                0.0
            },
            role,
            hours,
        })
        .collect();
    by_role.sort_by(|a, b| b.hours.cmp(&a.hours));

    let by_discipline = disciplines
        .into_iter()
        .map(|(discipline, (hours, deliverable_count))| DisciplineRollup {
            discipline,
            hours,
            deliverable_count,
        })
        .collect();

    for cycle in dependency_cycles(deliverables) {
        tracing::warn!(members = ?cycle.names, "dependency cycle");
        warnings.push(EstimateWarning::DependencyCycle(cycle));
    }
    warnings.extend(
        defaulted
            .into_iter()
            .map(|role| EstimateWarning::DefaultedRate { role }),
    );

    let summary = EstimateSummary {
        total_hours,
        total_cost: round_to(total_cost, 2),
        deliverable_count: estimates.len(),
        average_cost_per_hour: if total_hours > 0 {
            round_to(total_cost / total_hours as f64, 2)
        } else {
            0.0
        },
    };

    tracing::info!(
        deliverables = summary.deliverable_count,
        total_hours = summary.total_hours,
        total_cost = summary.total_cost,
        "project estimate complete"
    );

    Ok(ProjectEstimate {
        summary,
        by_role,
        by_discipline,
        deliverables: estimates,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deliverable::{DeliverableDependency, IssueState};
    use crate::raci::RaciEntry;

    fn ifc_only(name: &str, discipline: &str, hours: f64) -> Deliverable {
        Deliverable::new(name, discipline, hours)
            .with_issue_states([IssueState::Ifc])
            .with_review(0, 0.0)
    }

    fn roster() -> Vec<TeamMember> {
        vec![
            TeamMember::new("Process Engineer"),
            TeamMember::new("Mechanical Engineer"),
        ]
    }

    fn standard_estimate(deliverables: &[Deliverable]) -> ProjectEstimate {
        estimate_project(deliverables, &roster(), None, &RateTable::standard()).unwrap()
    }

    #[test]
    fn test_totals_and_average() {
        let deliverables = vec![
            ifc_only("Process Datasheet", "Process", 40.0),
            ifc_only("Mechanical Datasheet", "Mechanical", 60.0),
        ];
        let estimate = standard_estimate(&deliverables);

        assert_eq!(estimate.summary.total_hours, 100);
        assert_eq!(estimate.summary.deliverable_count, 2);
        // 60 h at 100 + 25 h at 160 + 10 h at 95 + 5 h at 65
        assert_eq!(estimate.summary.total_cost, 11_275.0);
        assert_eq!(estimate.summary.average_cost_per_hour, 112.75);
        assert!(estimate.warnings.is_empty());
    }

    #[test]
    fn test_by_role_sorted_by_hours() {
        let deliverables = vec![
            ifc_only("Process Datasheet", "Process", 40.0),
            ifc_only("Mechanical Datasheet", "Mechanical", 60.0),
        ];
        let estimate = standard_estimate(&deliverables);

        let roles: Vec<(&str, u64)> = estimate
            .by_role
            .iter()
            .map(|r| (r.role.as_str(), r.hours))
            .collect();
        assert_eq!(
            roles,
            vec![
                ("Mechanical Engineer", 36),
                ("Project Manager", 25),
                ("Process Engineer", 24),
                ("QA/QC Manager", 10),
                ("Document Control", 5),
            ]
        );
        assert_eq!(estimate.by_role[0].percentage, 36.0);
        assert_eq!(estimate.by_role[0].cost, 3600.0);
    }

    #[test]
    fn test_by_discipline() {
        let deliverables = vec![
            ifc_only("Process Datasheet", "Process", 40.0),
            ifc_only("P&ID", "Process", 120.0),
            ifc_only("Mechanical Datasheet", "Mechanical", 60.0),
        ];
        let estimate = standard_estimate(&deliverables);
        assert_eq!(
            estimate.by_discipline,
            vec![
                DisciplineRollup {
                    discipline: "Mechanical".to_string(),
                    hours: 60,
                    deliverable_count: 1
                },
                DisciplineRollup {
                    discipline: "Process".to_string(),
                    hours: 160,
                    deliverable_count: 2
                },
            ]
        );
    }

    #[test]
    fn test_override_is_used_and_flagged() {
        let mut d = ifc_only("P&ID", "Process", 100.0);
        d.raci_override = Some(RaciAssignment {
            responsible: vec![RaciEntry::new("Senior Engineer", 100)],
            ..RaciAssignment::default()
        });
        let estimate = estimate_project(&[d], &roster(), None, &RateTable::standard()).unwrap();

        let e = &estimate.deliverables[0];
        assert!(e.raci_customized);
        assert_eq!(e.cost.total_cost, 12_500.0);
        assert_eq!(estimate.by_role.len(), 1);
        assert_eq!(estimate.by_role[0].percentage, 100.0);
    }

    #[test]
    fn test_warnings_collected() {
        let a = Deliverable::new("Utility Summary", "Process", 30.0)
            .with_issue_states(Vec::<IssueState>::new());
        let mut b = ifc_only("3D Model", "Mechanical", 160.0);
        let mut c = ifc_only("Piping Isometric", "Mechanical", 90.0);
        b.push_dependency(DeliverableDependency::prerequisite(c.id));
        c.push_dependency(DeliverableDependency::prerequisite(b.id));

        let roster = vec![TeamMember::new("Piping Designer")];
        let estimate =
            estimate_project(&[a.clone(), b, c], &roster, None, &RateTable::empty()).unwrap();

        assert!(estimate.warnings.contains(&EstimateWarning::NoIssueStates {
            id: a.id,
            name: a.name.clone()
        }));
        assert!(estimate
            .warnings
            .iter()
            .any(|w| matches!(w, EstimateWarning::DependencyCycle(c) if c.names.len() == 2)));
        assert!(estimate.warnings.contains(&EstimateWarning::DefaultedRate {
            role: "Project Manager".to_string()
        }));
    }

    #[test]
    fn test_invalid_input_propagates() {
        let bad = Deliverable::new("P&ID", "Process", 100.0).with_review(-2, 0.25);
        let err = estimate_project(&[bad], &[], None, &RateTable::standard()).unwrap_err();
        assert_eq!(err.offending_field(), Some("review_cycles"));
    }

    #[test]
    fn test_large_hours_roll_up_without_overflow() {
        let deliverables = vec![
            ifc_only("Site Survey", "Civil", 3e9),
            ifc_only("Site Grading Plan", "Civil", 3e9),
        ];
        let estimate = standard_estimate(&deliverables);
        assert_eq!(estimate.summary.total_hours, 6_000_000_000);
        assert_eq!(estimate.by_discipline[0].hours, 6_000_000_000);
        assert_eq!(estimate.by_role[0].hours, 3_600_000_000);
    }

    #[test]
    fn test_role_rollup_overflow_is_an_error() {
        let mut a = ifc_only("Site Survey", "Civil", 10.0);
        let mut b = ifc_only("Geotechnical Report", "Civil", 10.0);
        for d in [&mut a, &mut b] {
            d.raci_override = Some(RaciAssignment {
                responsible: vec![RaciEntry::new("Lead Engineer", u64::MAX / 2 + 1)],
                ..RaciAssignment::default()
            });
        }
        let err = estimate_project(&[a, b], &roster(), None, &RateTable::standard()).unwrap_err();
        assert_eq!(err.error_code(), "HOURS_OVERFLOW");
    }

    #[test]
    fn test_empty_project() {
        let estimate = estimate_project(&[], &[], None, &RateTable::standard()).unwrap();
        assert_eq!(estimate.summary.total_hours, 0);
        assert_eq!(estimate.summary.average_cost_per_hour, 0.0);
        assert!(estimate.by_role.is_empty());
    }
}
