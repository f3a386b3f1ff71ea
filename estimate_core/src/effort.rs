//! # Effort Calculation
//!
//! Composes a deliverable's total effort from its base hours, selected issue
//! states, review cycles, rework factor and regulatory overlay, optionally
//! scaled by a client complexity profile.
//!
//! ## Method
//!
//! ```text
//! issue_state_effort = Σ base_hours × multiplier(state)      over selected states
//! adjusted_cycles    = ceil(review_cycles × review_cycle_multiplier)
//! adjusted_rework    = rework_factor × rework_factor_multiplier
//! rework_hours       = issue_state_effort × adjusted_cycles × adjusted_rework
//! regulatory_hours   = base_hours × surcharge(overlay)       (HAZOP: 0.25)
//! total              = round(issue_state_effort + rework_hours + regulatory_hours)
//! ```
//!
//! Cycles are rounded *up* after scaling; the total is rounded to the nearest
//! hour with halves away from zero. Hours are counted in `u64`; a total that
//! does not fit is reported against `base_hours`. The profile is applied at
//! calculation time only and never written back to the deliverable.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::deliverable::{Deliverable, IssueState};
//! use estimate_core::effort::{compute_effort_hours, ClientComplexityProfile};
//!
//! let d = Deliverable::new("P&ID", "Process", 120.0)
//!     .with_issue_states([
//!         IssueState::Ifd,
//!         IssueState::Ifr,
//!         IssueState::Ifa,
//!         IssueState::Ifb,
//!         IssueState::Ifc,
//!     ])
//!     .with_review(3, 0.30);
//!
//! // 432 + 432 × 3 × 0.30 = 820.8
//! assert_eq!(compute_effort_hours(&d, None).unwrap(), 821);
//! assert_eq!(compute_effort_hours(&d, Some(&ClientComplexityProfile::type_b())).unwrap(), 821);
//! ```

use serde::{Deserialize, Serialize};

use crate::deliverable::Deliverable;
use crate::errors::{EstimateError, EstimateResult};

/// Client-level scaling of review cycles and rework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientComplexityProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub review_cycle_multiplier: f64,
    pub rework_factor_multiplier: f64,
}

impl ClientComplexityProfile {
    pub fn new(review_cycle_multiplier: f64, rework_factor_multiplier: f64) -> Self {
        ClientComplexityProfile {
            name: None,
            review_cycle_multiplier,
            rework_factor_multiplier,
        }
    }

    /// Demanding client: more review rounds, heavier rework
    pub fn type_a() -> Self {
        ClientComplexityProfile {
            name: Some("TYPE_A".to_string()),
            review_cycle_multiplier: 1.5,
            rework_factor_multiplier: 1.3,
        }
    }

    /// Baseline client
    pub fn type_b() -> Self {
        ClientComplexityProfile {
            name: Some("TYPE_B".to_string()),
            review_cycle_multiplier: 1.0,
            rework_factor_multiplier: 1.0,
        }
    }

    /// Streamlined client
    pub fn type_c() -> Self {
        ClientComplexityProfile {
            name: Some("TYPE_C".to_string()),
            review_cycle_multiplier: 0.7,
            rework_factor_multiplier: 0.8,
        }
    }

    /// Look up a preset by name ("TYPE_A", "type_b", ...)
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "TYPE_A" => Some(Self::type_a()),
            "TYPE_B" => Some(Self::type_b()),
            "TYPE_C" => Some(Self::type_c()),
            _ => None,
        }
    }

    pub fn validate(&self) -> EstimateResult<()> {
        if !self.review_cycle_multiplier.is_finite() || self.review_cycle_multiplier < 0.0 {
            return Err(EstimateError::invalid_effort_input(
                "review_cycle_multiplier",
                self.review_cycle_multiplier.to_string(),
                "Multiplier must be a finite, non-negative number",
            ));
        }
        if !self.rework_factor_multiplier.is_finite() || self.rework_factor_multiplier < 0.0 {
            return Err(EstimateError::invalid_effort_input(
                "rework_factor_multiplier",
                self.rework_factor_multiplier.to_string(),
                "Multiplier must be a finite, non-negative number",
            ));
        }
        Ok(())
    }
}

impl Default for ClientComplexityProfile {
    fn default() -> Self {
        ClientComplexityProfile::type_b()
    }
}

/// Non-fatal configuration problems noticed during calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum EffortWarning {
    /// No issue states selected, so the deliverable contributes zero issue effort
    NoIssueStates { deliverable: String },
}

/// Every term of an effort calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffortBreakdown {
    pub issue_state_effort_hours: f64,
    pub adjusted_review_cycles: u64,
    pub adjusted_rework_factor: f64,
    pub rework_hours: f64,
    pub regulatory_hours: f64,
    /// Rounded total; this is the figure used for allocation and costing
    pub total_hours: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<EffortWarning>,
}

/// 2^64; counts must stay strictly below it to convert without saturating
const MAX_COUNT: f64 = u64::MAX as f64;

/// Convert a rounded, non-negative count, rejecting values `u64` cannot hold.
fn to_count(value: f64, field: &str, reason: &str) -> EstimateResult<u64> {
    if value.is_finite() && (0.0..MAX_COUNT).contains(&value) {
        Ok(value as u64)
    } else {
        Err(EstimateError::invalid_effort_input(field, value.to_string(), reason))
    }
}

/// Add hours, failing instead of wrapping.
pub(crate) fn add_hours(total: u64, hours: u64, context: &str) -> EstimateResult<u64> {
    total
        .checked_add(hours)
        .ok_or_else(|| EstimateError::hours_overflow(context))
}

/// Sum hours, failing instead of wrapping.
pub(crate) fn sum_hours(
    hours: impl IntoIterator<Item = u64>,
    context: &str,
) -> EstimateResult<u64> {
    hours
        .into_iter()
        .try_fold(0, |total, h| add_hours(total, h, context))
}

/// Check a deliverable's effort inputs.
pub fn validate_effort_inputs(deliverable: &Deliverable) -> EstimateResult<()> {
    if !deliverable.base_hours.is_finite() || deliverable.base_hours < 0.0 {
        return Err(EstimateError::invalid_effort_input(
            "base_hours",
            deliverable.base_hours.to_string(),
            "Base hours must be a finite, non-negative number",
        ));
    }
    if deliverable.review_cycles < 0 {
        return Err(EstimateError::invalid_effort_input(
            "review_cycles",
            deliverable.review_cycles.to_string(),
            "Review cycles cannot be negative",
        ));
    }
    if !(0.0..=1.0).contains(&deliverable.rework_factor) {
        return Err(EstimateError::invalid_effort_input(
            "rework_factor",
            deliverable.rework_factor.to_string(),
            "Rework factor must be between 0 and 1",
        ));
    }
    Ok(())
}

/// Full effort breakdown for a deliverable.
///
/// # Errors
///
/// `InvalidEffortInput` naming the field when base hours, review cycles,
/// rework factor or a profile multiplier is out of range, or when the total
/// is too large to count in whole hours (reported as `base_hours`).
pub fn compute_effort(
    deliverable: &Deliverable,
    profile: Option<&ClientComplexityProfile>,
) -> EstimateResult<EffortBreakdown> {
    validate_effort_inputs(deliverable)?;
    if let Some(p) = profile {
        p.validate()?;
    }

    let mut warnings = Vec::new();
    if deliverable.issue_states.is_empty() {
        tracing::warn!(
            deliverable = %deliverable.name,
            id = %deliverable.id,
            "deliverable has no issue states"
        );
        warnings.push(EffortWarning::NoIssueStates {
            deliverable: deliverable.name.clone(),
        });
    }

    let cycle_multiplier = profile.map_or(1.0, |p| p.review_cycle_multiplier);
    let rework_multiplier = profile.map_or(1.0, |p| p.rework_factor_multiplier);

    let issue_state_effort_hours: f64 = deliverable
        .issue_states
        .iter()
        .map(|s| deliverable.base_hours * s.multiplier())
        .sum();

    let cycles = (f64::from(deliverable.review_cycles) * cycle_multiplier).ceil();
    let adjusted_review_cycles = to_count(
        cycles,
        "review_cycles",
        "Adjusted review cycles are too large to count",
    )?;
    let adjusted_rework_factor = deliverable.rework_factor * rework_multiplier;
    let rework_hours = issue_state_effort_hours * cycles * adjusted_rework_factor;
    let regulatory_hours =
        deliverable.base_hours * deliverable.regulatory_overlay.surcharge_fraction();

    let total_hours = to_count(
        (issue_state_effort_hours + rework_hours + regulatory_hours).round(),
        "base_hours",
        "Total effort is too large to count in whole hours",
    )?;

    Ok(EffortBreakdown {
        issue_state_effort_hours,
        adjusted_review_cycles,
        adjusted_rework_factor,
        rework_hours,
        regulatory_hours,
        total_hours,
        warnings,
    })
}

/// Rounded total effort hours for a deliverable.
pub fn compute_effort_hours(
    deliverable: &Deliverable,
    profile: Option<&ClientComplexityProfile>,
) -> EstimateResult<u64> {
    Ok(compute_effort(deliverable, profile)?.total_hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deliverable::{IssueState, RegulatoryOverlay};

    fn phase_gate_pid() -> Deliverable {
        Deliverable::new("P&ID", "Process", 120.0)
            .with_issue_states([
                IssueState::Ifd,
                IssueState::Ifr,
                IssueState::Ifa,
                IssueState::Ifb,
                IssueState::Ifc,
            ])
            .with_review(3, 0.30)
    }

    #[test]
    fn test_reference_example() {
        let breakdown = compute_effort(&phase_gate_pid(), None).unwrap();
        assert!((breakdown.issue_state_effort_hours - 432.0).abs() < 1e-9);
        assert_eq!(breakdown.adjusted_review_cycles, 3);
        assert!((breakdown.rework_hours - 388.8).abs() < 1e-9);
        assert_eq!(breakdown.regulatory_hours, 0.0);
        assert_eq!(breakdown.total_hours, 821);
        assert!(breakdown.warnings.is_empty());
    }

    #[test]
    fn test_neutral_profile_matches_no_profile() {
        let d = phase_gate_pid();
        let neutral = ClientComplexityProfile::new(1.0, 1.0);
        assert_eq!(
            compute_effort(&d, Some(&neutral)).unwrap(),
            compute_effort(&d, None).unwrap()
        );
    }

    #[test]
    fn test_type_a_profile() {
        let profile = ClientComplexityProfile::type_a();
        let breakdown = compute_effort(&phase_gate_pid(), Some(&profile)).unwrap();
        // ceil(3 × 1.5) = 5 cycles; 0.30 × 1.3 = 0.39
        assert_eq!(breakdown.adjusted_review_cycles, 5);
        assert!((breakdown.adjusted_rework_factor - 0.39).abs() < 1e-9);
        // 432 + 432 × 5 × 0.39 = 1274.4
        assert_eq!(breakdown.total_hours, 1274);
    }

    #[test]
    fn test_type_c_profile_ceils_cycles() {
        let profile = ClientComplexityProfile::type_c();
        let breakdown = compute_effort(&phase_gate_pid(), Some(&profile)).unwrap();
        // ceil(3 × 0.7) = ceil(2.1) = 3
        assert_eq!(breakdown.adjusted_review_cycles, 3);
        // 432 + 432 × 3 × 0.24 = 743.04
        assert_eq!(breakdown.total_hours, 743);
    }

    #[test]
    fn test_profile_does_not_mutate_deliverable() {
        let d = phase_gate_pid();
        let before = d.clone();
        compute_effort(&d, Some(&ClientComplexityProfile::type_a())).unwrap();
        assert_eq!(d, before);
    }

    #[test]
    fn test_zero_cycles_means_no_rework() {
        let d = phase_gate_pid().with_review(0, 0.30);
        let breakdown = compute_effort(&d, Some(&ClientComplexityProfile::type_a())).unwrap();
        assert_eq!(breakdown.rework_hours, 0.0);
        assert_eq!(breakdown.total_hours, 432);
    }

    #[test]
    fn test_hazop_surcharge() {
        let d = Deliverable::new("HAZOP Study", "Safety", 200.0)
            .with_issue_states([IssueState::Ifc])
            .with_review(0, 0.0)
            .with_overlay(RegulatoryOverlay::Hazop);
        let breakdown = compute_effort(&d, None).unwrap();
        assert_eq!(breakdown.regulatory_hours, 50.0);
        assert_eq!(breakdown.total_hours, 250);

        // Other overlays carry no surcharge
        let sil = d.clone().with_overlay(RegulatoryOverlay::Sil);
        assert_eq!(compute_effort_hours(&sil, None).unwrap(), 200);
    }

    #[test]
    fn test_empty_issue_states_warns() {
        let d = Deliverable::new("Utility Summary", "Process", 30.0)
            .with_issue_states(Vec::<IssueState>::new())
            .with_overlay(RegulatoryOverlay::Hazop);
        let breakdown = compute_effort(&d, None).unwrap();
        assert_eq!(breakdown.issue_state_effort_hours, 0.0);
        // Regulatory hours still apply
        assert_eq!(breakdown.total_hours, 8);
        assert_eq!(
            breakdown.warnings,
            vec![EffortWarning::NoIssueStates {
                deliverable: "Utility Summary".to_string()
            }]
        );
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        // 5 × 0.3 = 1.5
        let d = Deliverable::new("Memo", "Process", 5.0)
            .with_issue_states([IssueState::Ifi])
            .with_review(0, 0.0);
        assert_eq!(compute_effort_hours(&d, None).unwrap(), 2);
    }

    #[test]
    fn test_invalid_inputs_name_field() {
        let bad_hours = Deliverable::new("X", "Process", -1.0);
        let err = compute_effort(&bad_hours, None).unwrap_err();
        assert_eq!(err.offending_field(), Some("base_hours"));

        let nan_hours = Deliverable::new("X", "Process", f64::NAN);
        assert_eq!(
            compute_effort(&nan_hours, None).unwrap_err().offending_field(),
            Some("base_hours")
        );

        let bad_cycles = Deliverable::new("X", "Process", 10.0).with_review(-1, 0.25);
        assert_eq!(
            compute_effort(&bad_cycles, None).unwrap_err().offending_field(),
            Some("review_cycles")
        );

        let bad_rework = Deliverable::new("X", "Process", 10.0).with_review(1, 1.5);
        assert_eq!(
            compute_effort(&bad_rework, None).unwrap_err().offending_field(),
            Some("rework_factor")
        );

        let bad_profile = ClientComplexityProfile::new(-1.0, 1.0);
        let ok = Deliverable::new("X", "Process", 10.0);
        assert_eq!(
            compute_effort(&ok, Some(&bad_profile)).unwrap_err().offending_field(),
            Some("review_cycle_multiplier")
        );
        let inf_profile = ClientComplexityProfile::new(1.0, f64::INFINITY);
        assert_eq!(
            compute_effort(&ok, Some(&inf_profile)).unwrap_err().offending_field(),
            Some("rework_factor_multiplier")
        );
    }

    #[test]
    fn test_zero_base_hours() {
        let d = Deliverable::new("Placeholder", "Process", 0.0);
        assert_eq!(compute_effort_hours(&d, None).unwrap(), 0);
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(
            ClientComplexityProfile::preset("type_a"),
            Some(ClientComplexityProfile::type_a())
        );
        assert_eq!(ClientComplexityProfile::preset("TYPE_D"), None);
    }

    #[test]
    fn test_large_totals_are_not_capped() {
        let d = Deliverable::new("Site Survey", "Civil", 1e10)
            .with_issue_states([IssueState::Ifc])
            .with_review(0, 0.0);
        let breakdown = compute_effort(&d, None).unwrap();
        assert_eq!(breakdown.total_hours, 10_000_000_000);
        assert_eq!(breakdown.total_hours as f64, breakdown.issue_state_effort_hours);
    }

    #[test]
    fn test_uncountable_total_names_base_hours() {
        let d = Deliverable::new("Site Survey", "Civil", 1e20)
            .with_issue_states([IssueState::Ifc])
            .with_review(0, 0.0);
        let err = compute_effort(&d, None).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_EFFORT_INPUT");
        assert_eq!(err.offending_field(), Some("base_hours"));

        let huge_cycles = ClientComplexityProfile::new(1e300, 1.0);
        let d = Deliverable::new("Site Survey", "Civil", 10.0).with_review(1, 0.25);
        assert_eq!(
            compute_effort(&d, Some(&huge_cycles))
                .unwrap_err()
                .offending_field(),
            Some("review_cycles")
        );
    }

    #[test]
    fn test_checked_hour_sums() {
        assert_eq!(sum_hours([1, 2, 3], "test").unwrap(), 6);
        let err = sum_hours([u64::MAX, 1], "test").unwrap_err();
        assert_eq!(err.error_code(), "HOURS_OVERFLOW");
        assert!(add_hours(u64::MAX - 1, 1, "test").is_ok());
    }
}
