//! # RACI Allocation and Pricing
//!
//! Splits a deliverable's total hours across four roles and prices the result
//! against a rate table.
//!
//! ## Default split
//!
//! | Role        | Share | Member                                   |
//! |-------------|-------|------------------------------------------|
//! | Responsible | 60%   | selected from the roster by name keyword |
//! | Accountable | 25%   | Project Manager                          |
//! | Consulted   | 10%   | QA/QC Manager                            |
//! | Informed    | 5%    | Document Control                         |
//!
//! Each bucket is rounded on its own, so the buckets may sum to one hour more
//! or less than the total.
//!
//! ## Responsible selection
//!
//! The lowercased deliverable name is checked against keyword groups in order;
//! the first group that matches picks role keywords, and the first roster
//! member whose role contains one of them is responsible. If no member
//! matches, the first roster member is used, and with an empty roster the
//! placeholder "Unassigned". Names that match no group go to "Lead Engineer".
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::raci::{allocate_raci, price_assignment, RateTable, TeamMember};
//!
//! let roster = vec![TeamMember::new("Process Engineer"), TeamMember::new("Mechanical Engineer")];
//! let assignment = allocate_raci("Piping Isometric", 100, &roster);
//!
//! assert_eq!(assignment.responsible[0].member, "Mechanical Engineer");
//! assert_eq!(assignment.total_hours()?, 100);
//!
//! // 60×100 + 25×160 + 10×95 + 5×65
//! assert_eq!(price_assignment(&assignment, &RateTable::standard())?, 11_275.0);
//! # Ok::<(), estimate_core::errors::EstimateError>(())
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::deliverable::Deliverable;
use crate::effort::sum_hours;
use crate::errors::EstimateResult;

pub const UNASSIGNED: &str = "Unassigned";
pub const DEFAULT_RESPONSIBLE: &str = "Lead Engineer";
pub const DEFAULT_ACCOUNTABLE: &str = "Project Manager";
pub const DEFAULT_CONSULTED: &str = "QA/QC Manager";
pub const DEFAULT_INFORMED: &str = "Document Control";

/// Hourly rate used for roles missing from a rate table
pub const FALLBACK_HOURLY_RATE: f64 = 100.0;

/// (name keywords, role keywords), checked in order
const KEYWORD_GROUPS: &[(&[&str], &[&str])] = &[
    (&["civil", "site"], &["civil"]),
    (&["mechanical", "hvac", "piping"], &["mechanical"]),
    (&["electrical", "instrument"], &["electrical"]),
    (&["structural"], &["structural"]),
    (&["process", "p&id"], &["process", "chemical"]),
];

/// A member of the project team roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Overrides the rate table for this role when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
}

impl TeamMember {
    pub fn new(role: impl Into<String>) -> Self {
        TeamMember {
            role: role.into(),
            name: None,
            hourly_rate: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_rate(mut self, hourly_rate: f64) -> Self {
        self.hourly_rate = Some(hourly_rate);
        self
    }
}

/// The four RACI roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaciRole {
    Responsible,
    Accountable,
    Consulted,
    Informed,
}

impl RaciRole {
    pub const ALL: [RaciRole; 4] = [
        RaciRole::Responsible,
        RaciRole::Accountable,
        RaciRole::Consulted,
        RaciRole::Informed,
    ];

    /// Percentage of total hours in the default split
    pub fn default_percent(&self) -> u64 {
        match self {
            RaciRole::Responsible => 60,
            RaciRole::Accountable => 25,
            RaciRole::Consulted => 10,
            RaciRole::Informed => 5,
        }
    }
}

impl fmt::Display for RaciRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RaciRole::Responsible => "R",
            RaciRole::Accountable => "A",
            RaciRole::Consulted => "C",
            RaciRole::Informed => "I",
        };
        write!(f, "{}", s)
    }
}

/// Hours assigned to one member (identified by role)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaciEntry {
    pub member: String,
    pub hours: u64,
}

impl RaciEntry {
    pub fn new(member: impl Into<String>, hours: u64) -> Self {
        RaciEntry {
            member: member.into(),
            hours,
        }
    }
}

/// Hours split across the four RACI roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaciAssignment {
    #[serde(default)]
    pub responsible: Vec<RaciEntry>,
    #[serde(default)]
    pub accountable: Vec<RaciEntry>,
    #[serde(default)]
    pub consulted: Vec<RaciEntry>,
    #[serde(default)]
    pub informed: Vec<RaciEntry>,
}

impl RaciAssignment {
    pub fn entries_for(&self, role: RaciRole) -> &[RaciEntry] {
        match role {
            RaciRole::Responsible => &self.responsible,
            RaciRole::Accountable => &self.accountable,
            RaciRole::Consulted => &self.consulted,
            RaciRole::Informed => &self.informed,
        }
    }

    /// All entries, tagged with their RACI role, in R-A-C-I order
    pub fn entries(&self) -> impl Iterator<Item = (RaciRole, &RaciEntry)> {
        RaciRole::ALL
            .into_iter()
            .flat_map(move |role| self.entries_for(role).iter().map(move |e| (role, e)))
    }

    /// Sum of hours over every bucket
    pub fn total_hours(&self) -> EstimateResult<u64> {
        sum_hours(self.entries().map(|(_, e)| e.hours), "RACI assignment")
    }
}

fn find_member(role_keywords: &[&str], roster: &[TeamMember]) -> String {
    if let Some(member) = roster.iter().find(|m| {
        let role = m.role.to_lowercase();
        role_keywords.iter().any(|k| role.contains(k))
    }) {
        return member.role.clone();
    }

    match roster.first() {
        Some(first) => {
            tracing::warn!(
                keywords = ?role_keywords,
                fallback = %first.role,
                "no roster member matches, using first roster member"
            );
            first.role.clone()
        }
        None => {
            tracing::warn!(
                keywords = ?role_keywords,
                "empty roster, responsible role unassigned"
            );
            UNASSIGNED.to_string()
        }
    }
}

/// Role responsible for a deliverable, chosen from the roster by name keyword.
pub fn responsible_role(deliverable_name: &str, roster: &[TeamMember]) -> String {
    let name = deliverable_name.to_lowercase();
    KEYWORD_GROUPS
        .iter()
        .find(|(name_keywords, _)| name_keywords.iter().any(|k| name.contains(k)))
        .map(|(_, role_keywords)| find_member(role_keywords, roster))
        .unwrap_or_else(|| DEFAULT_RESPONSIBLE.to_string())
}

/// Bucket hours, rounded half up in integer arithmetic so large totals stay exact
fn share(total_hours: u64, role: RaciRole) -> u64 {
    let scaled = (u128::from(total_hours) * u128::from(role.default_percent()) + 50) / 100;
    // At most `total_hours`, so the conversion cannot fail
    u64::try_from(scaled).unwrap_or(total_hours)
}

fn bucket(member: impl Into<String>, total_hours: u64, role: RaciRole) -> Vec<RaciEntry> {
    vec![RaciEntry::new(member, share(total_hours, role))]
}

/// Default RACI split for a deliverable.
///
/// A pure function of the name, total hours and roster.
pub fn allocate_raci(
    deliverable_name: &str,
    total_hours: u64,
    roster: &[TeamMember],
) -> RaciAssignment {
    let responsible = responsible_role(deliverable_name, roster);
    RaciAssignment {
        responsible: bucket(responsible, total_hours, RaciRole::Responsible),
        accountable: bucket(DEFAULT_ACCOUNTABLE, total_hours, RaciRole::Accountable),
        consulted: bucket(DEFAULT_CONSULTED, total_hours, RaciRole::Consulted),
        informed: bucket(DEFAULT_INFORMED, total_hours, RaciRole::Informed),
    }
}

/// The stored override if there is one, otherwise the default split.
pub fn effective_raci(
    deliverable: &Deliverable,
    total_hours: u64,
    roster: &[TeamMember],
) -> RaciAssignment {
    match &deliverable.raci_override {
        Some(assignment) => assignment.clone(),
        None => allocate_raci(&deliverable.name, total_hours, roster),
    }
}

/// Whether the deliverable carries an override that differs from the default.
pub fn is_customized(deliverable: &Deliverable, total_hours: u64, roster: &[TeamMember]) -> bool {
    deliverable
        .raci_override
        .as_ref()
        .is_some_and(|o| *o != allocate_raci(&deliverable.name, total_hours, roster))
}

// ============================================================================
// Rates
// ============================================================================

/// Hourly rates by role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub rates: BTreeMap<String, f64>,
    #[serde(default = "default_fallback_rate")]
    pub fallback_rate: f64,
}

fn default_fallback_rate() -> f64 {
    FALLBACK_HOURLY_RATE
}

impl RateTable {
    /// An empty table; every role prices at the fallback rate
    pub fn empty() -> Self {
        RateTable {
            rates: BTreeMap::new(),
            fallback_rate: FALLBACK_HOURLY_RATE,
        }
    }

    /// Standard engineering-services rates
    pub fn standard() -> Self {
        let rates = [
            ("Lead Engineer", 150.0),
            ("Senior Engineer", 125.0),
            ("Engineer", 100.0),
            ("Designer", 85.0),
            ("QA/QC Manager", 95.0),
            ("Technical Reviewer", 115.0),
            ("Document Control", 65.0),
            ("Project Manager", 160.0),
            ("CAD Technician", 75.0),
            ("Cost Estimator", 110.0),
            ("Scheduler", 105.0),
            ("Civil Engineer", 100.0),
            ("Mechanical Engineer", 100.0),
            ("Electrical Engineer", 100.0),
            ("Structural Engineer", 100.0),
            ("Process Engineer", 100.0),
            ("Chemical Engineer", 100.0),
        ]
        .into_iter()
        .map(|(role, rate)| (role.to_string(), rate))
        .collect();

        RateTable {
            rates,
            fallback_rate: FALLBACK_HOURLY_RATE,
        }
    }

    pub fn with_rate(mut self, role: impl Into<String>, rate: f64) -> Self {
        self.rates.insert(role.into(), rate);
        self
    }

    /// Apply per-role overrides
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, f64>) -> Self {
        for (role, rate) in overrides {
            self.rates.insert(role.clone(), *rate);
        }
        self
    }

    /// Apply rates carried by roster members
    pub fn with_roster_rates(mut self, roster: &[TeamMember]) -> Self {
        for member in roster {
            if let Some(rate) = member.hourly_rate {
                self.rates.insert(member.role.clone(), rate);
            }
        }
        self
    }

    pub fn rate(&self, role: &str) -> Option<f64> {
        self.rates.get(role).copied()
    }

    /// Rate for a role, falling back when missing. The flag is true when the
    /// fallback was used.
    pub fn rate_or_fallback(&self, role: &str) -> (f64, bool) {
        match self.rate(role) {
            Some(rate) => (rate, false),
            None => (self.fallback_rate, true),
        }
    }
}

impl Default for RateTable {
    fn default() -> Self {
        RateTable::standard()
    }
}

/// One priced RACI entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub raci_role: RaciRole,
    pub member: String,
    pub hours: u64,
    pub rate: f64,
    pub cost: f64,
}

/// A priced assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentCost {
    pub lines: Vec<CostLine>,
    pub total_hours: u64,
    pub total_cost: f64,
    /// Roles priced at the fallback rate, in first-seen order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaulted_roles: Vec<String>,
}

/// Price every entry of an assignment.
///
/// # Errors
///
/// `HoursOverflow` when the entries' hours do not fit in one total.
pub fn cost_assignment(
    assignment: &RaciAssignment,
    rates: &RateTable,
) -> EstimateResult<AssignmentCost> {
    let mut lines = Vec::new();
    let mut defaulted_roles: Vec<String> = Vec::new();

    for (raci_role, entry) in assignment.entries() {
        let (rate, defaulted) = rates.rate_or_fallback(&entry.member);
        if defaulted && !defaulted_roles.contains(&entry.member) {
            tracing::warn!(
                role = %entry.member,
                rate,
                "no rate for role, using fallback rate"
            );
            defaulted_roles.push(entry.member.clone());
        }
        lines.push(CostLine {
            raci_role,
            member: entry.member.clone(),
            hours: entry.hours,
            rate,
            cost: entry.hours as f64 * rate,
        });
    }

    Ok(AssignmentCost {
        total_hours: sum_hours(lines.iter().map(|l| l.hours), "RACI assignment")?,
        total_cost: lines.iter().map(|l| l.cost).sum(),
        lines,
        defaulted_roles,
    })
}

/// Total cost of an assignment.
pub fn price_assignment(assignment: &RaciAssignment, rates: &RateTable) -> EstimateResult<f64> {
    Ok(cost_assignment(assignment, rates)?.total_cost)
}
