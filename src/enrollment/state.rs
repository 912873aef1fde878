//! Enrollment state: the step enum and the per-conversation snapshot.
//!
//! A snapshot is never mutated in place by the machine. Every transition
//! clones the previous value and applies `with_*` updates, so "stay on the
//! current step" is simply returning the unmodified snapshot.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::funds;

/// Age assumed when the caller never supplied one.
pub const DEFAULT_CURRENT_AGE: i32 = 34;
/// Youngest accepted current age.
pub const MIN_CURRENT_AGE: i32 = 14;
/// Oldest accepted age, current or retirement.
pub const MAX_AGE: i32 = 100;

/// The discrete positions of the enrollment conversation.
///
/// INTENT → [ELIGIBILITY] → CURRENT_AGE → RETIREMENT_AGE → LOCATION →
/// PLAN_RECOMMENDATION → CONTRIBUTION → MONEY_HANDLING →
/// {REVIEW | MANUAL_RISK → MANUAL_FUNDS → MANUAL_ALLOCATION → REVIEW} →
/// {CONFIRMED | INELIGIBLE}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStep {
    Intent,
    Eligibility,
    CurrentAge,
    RetirementAge,
    Location,
    PlanRecommendation,
    Contribution,
    MoneyHandling,
    ManualRisk,
    ManualFunds,
    ManualAllocation,
    Review,
    Confirmed,
    Ineligible,
}

impl EnrollmentStep {
    /// Every step, in flow order.
    pub const ALL: [EnrollmentStep; 14] = [
        Self::Intent,
        Self::Eligibility,
        Self::CurrentAge,
        Self::RetirementAge,
        Self::Location,
        Self::PlanRecommendation,
        Self::Contribution,
        Self::MoneyHandling,
        Self::ManualRisk,
        Self::ManualFunds,
        Self::ManualAllocation,
        Self::Review,
        Self::Confirmed,
        Self::Ineligible,
    ];

    /// Whether this step absorbs all further input.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Ineligible)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intent => "INTENT",
            Self::Eligibility => "ELIGIBILITY",
            Self::CurrentAge => "CURRENT_AGE",
            Self::RetirementAge => "RETIREMENT_AGE",
            Self::Location => "LOCATION",
            Self::PlanRecommendation => "PLAN_RECOMMENDATION",
            Self::Contribution => "CONTRIBUTION",
            Self::MoneyHandling => "MONEY_HANDLING",
            Self::ManualRisk => "MANUAL_RISK",
            Self::ManualFunds => "MANUAL_FUNDS",
            Self::ManualAllocation => "MANUAL_ALLOCATION",
            Self::Review => "REVIEW",
            Self::Confirmed => "CONFIRMED",
            Self::Ineligible => "INELIGIBLE",
        }
    }
}

impl Default for EnrollmentStep {
    fn default() -> Self {
        Self::Intent
    }
}

impl std::fmt::Display for EnrollmentStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tax treatment of contributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanChoice {
    /// Contributions are taxed now, withdrawals are tax-free (Roth).
    PayTaxNow,
    /// Contributions are pre-tax, withdrawals are taxed (Traditional).
    PayTaxLater,
}

impl PlanChoice {
    /// Display label of the plan this choice enrolls into.
    pub fn plan_type(&self) -> &'static str {
        match self {
            Self::PayTaxNow => "Roth 401(k)",
            Self::PayTaxLater => "401(k)",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PayTaxNow => "Pay tax now (Roth)",
            Self::PayTaxLater => "Pay tax later (Traditional)",
        }
    }
}

/// Who manages the invested money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentStrategy {
    /// System-managed default portfolio.
    Default,
    /// The participant picks funds and allocations.
    Manual,
    /// An advisor follows up.
    Advisor,
}

impl InvestmentStrategy {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Default => "Managed automatically by the plan's default portfolio",
            Self::Manual => "You choose your own funds",
            Self::Advisor => "An advisor will help you choose",
        }
    }
}

/// The 4-point risk scale offered to participants who invest manually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Conservative,
    Moderate,
    Growth,
    Aggressive,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        Self::Conservative,
        Self::Moderate,
        Self::Growth,
        Self::Aggressive,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Conservative => "Conservative",
            Self::Moderate => "Moderate",
            Self::Growth => "Growth",
            Self::Aggressive => "Aggressive",
        }
    }
}

/// Display-oriented mirror of the typed state, submitted once enrollment
/// is confirmed.
///
/// Fields are only ever set, never cleared. An edit from review overwrites
/// the edited field when the participant answers again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retirement_age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_to_retirement: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_plan_choice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_plan_choice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contribution_percentage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment_strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_risk_level: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manual_selected_funds: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manual_allocations: Vec<String>,
}

/// Optional facts the caller already knows when a conversation starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitOptions {
    #[serde(default)]
    pub is_eligible: Option<bool>,
    #[serde(default)]
    pub current_age: Option<i32>,
}

/// Snapshot of one enrollment conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentState {
    pub step: EnrollmentStep,
    /// `None` means "not checked yet, assume eligible".
    #[serde(default)]
    pub is_eligible: Option<bool>,
    #[serde(default)]
    pub current_age: Option<i32>,
    #[serde(default)]
    pub retirement_age: Option<i32>,
    #[serde(default)]
    pub years_to_retirement: Option<i32>,
    #[serde(default)]
    pub work_country: Option<String>,
    #[serde(default)]
    pub recommended_plan_choice: Option<PlanChoice>,
    #[serde(default)]
    pub selected_plan_choice: Option<PlanChoice>,
    #[serde(default)]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub contribution_percentage: Option<Decimal>,
    #[serde(default)]
    pub investment_strategy: Option<InvestmentStrategy>,
    #[serde(default)]
    pub manual_risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub manual_selected_fund_ids: Vec<String>,
    #[serde(default)]
    pub manual_allocations: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub collected_data: CollectedData,
}

/// Create the INTENT-step seed for a new conversation.
pub fn initialize(options: InitOptions) -> EnrollmentState {
    let mut state = EnrollmentState::default();
    if let Some(eligible) = options.is_eligible {
        state = state.with_eligibility(eligible);
    }
    // A seed must leave room for a retirement age; anything else is dropped
    // and the default applies at INTENT.
    if let Some(age) = options.current_age.filter(|age| is_valid_seed_age(*age)) {
        state = state.with_current_age(age);
    }
    state
}

fn is_valid_seed_age(age: i32) -> bool {
    (MIN_CURRENT_AGE..MAX_AGE).contains(&age)
}

impl EnrollmentState {
    /// The current age, falling back to [`DEFAULT_CURRENT_AGE`].
    pub fn effective_current_age(&self) -> i32 {
        self.current_age.unwrap_or(DEFAULT_CURRENT_AGE)
    }

    /// Allocations in fund-selection order.
    pub fn allocation_lines(&self) -> Vec<(&str, Decimal)> {
        self.manual_selected_fund_ids
            .iter()
            .filter_map(|id| {
                self.manual_allocations
                    .get(id)
                    .map(|pct| (id.as_str(), *pct))
            })
            .collect()
    }

    pub fn at(mut self, step: EnrollmentStep) -> Self {
        self.step = step;
        self
    }

    pub fn with_eligibility(mut self, eligible: bool) -> Self {
        self.is_eligible = Some(eligible);
        self.collected_data.eligibility = Some(
            if eligible { "Eligible" } else { "Not eligible" }.to_string(),
        );
        self
    }

    pub fn with_current_age(mut self, age: i32) -> Self {
        self.current_age = Some(age);
        self.collected_data.current_age = Some(age);
        self.recompute_years()
    }

    pub fn with_retirement_age(mut self, age: i32) -> Self {
        self.retirement_age = Some(age);
        self.collected_data.retirement_age = Some(age);
        self.recompute_years()
    }

    fn recompute_years(mut self) -> Self {
        if let (Some(current), Some(retirement)) = (self.current_age, self.retirement_age) {
            let years = retirement.checked_sub(current);
            self.years_to_retirement = years;
            if years.is_some() {
                self.collected_data.years_to_retirement = years;
            }
        }
        self
    }

    pub fn with_work_country(mut self, country: &str) -> Self {
        self.work_country = Some(country.to_string());
        self.collected_data.work_country = Some(country.to_string());
        self
    }

    pub fn with_recommendation(mut self, choice: PlanChoice) -> Self {
        self.recommended_plan_choice = Some(choice);
        self.collected_data.recommended_plan_choice = Some(choice.label().to_string());
        self
    }

    /// Record the chosen tax treatment and its derived plan label.
    pub fn with_selected_plan(mut self, choice: PlanChoice) -> Self {
        self.selected_plan_choice = Some(choice);
        self.plan_type = Some(choice.plan_type().to_string());
        self.collected_data.selected_plan_choice = Some(choice.label().to_string());
        self.collected_data.plan_type = Some(choice.plan_type().to_string());
        self
    }

    pub fn with_contribution(mut self, percentage: Decimal) -> Self {
        self.contribution_percentage = Some(percentage);
        self.collected_data.contribution_percentage = Some(format_percent(percentage));
        self
    }

    /// Record who manages the money. Leaving the manual strategy drops the
    /// typed manual answers; the submission mirror keeps them.
    pub fn with_strategy(mut self, strategy: InvestmentStrategy) -> Self {
        if strategy != InvestmentStrategy::Manual {
            self.manual_risk_level = None;
            self.manual_selected_fund_ids.clear();
            self.manual_allocations.clear();
        }
        self.investment_strategy = Some(strategy);
        self.collected_data.investment_strategy = Some(strategy.description().to_string());
        self
    }

    pub fn with_risk_level(mut self, level: RiskLevel) -> Self {
        self.manual_risk_level = Some(level);
        self.collected_data.manual_risk_level = Some(level.label().to_string());
        self
    }

    pub fn with_selected_funds(mut self, fund_ids: Vec<String>) -> Self {
        self.collected_data.manual_selected_funds = fund_ids
            .iter()
            .map(|id| funds::fund_name(id).to_string())
            .collect();
        self.manual_selected_fund_ids = fund_ids;
        self
    }

    /// Keep a parsed allocation that has not been accepted yet.
    ///
    /// Only the typed field changes; the submission mirror keeps the last
    /// accepted allocation.
    pub fn with_allocation_draft(mut self, allocations: BTreeMap<String, Decimal>) -> Self {
        self.manual_allocations = allocations;
        self
    }

    /// Record an accepted allocation.
    pub fn with_allocations(self, allocations: BTreeMap<String, Decimal>) -> Self {
        let mut state = self.with_allocation_draft(allocations);
        state.collected_data.manual_allocations = state
            .allocation_lines()
            .into_iter()
            .map(|(id, pct)| format!("{}: {}", funds::fund_name(id), format_percent(pct)))
            .collect();
        state
    }
}

/// Render a percentage without trailing zeros, e.g. `8%` or `8.5%`.
pub fn format_percent(value: Decimal) -> String {
    format!("{}%", value.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_state_starts_at_intent() {
        let state = EnrollmentState::default();
        assert_eq!(state.step, EnrollmentStep::Intent);
        assert!(state.is_eligible.is_none());
        assert_eq!(state.collected_data, CollectedData::default());
    }

    #[test]
    fn initialize_mirrors_seeded_fields() {
        let state = initialize(InitOptions {
            is_eligible: Some(true),
            current_age: Some(41),
        });
        assert_eq!(state.step, EnrollmentStep::Intent);
        assert_eq!(state.is_eligible, Some(true));
        assert_eq!(state.current_age, Some(41));
        assert_eq!(state.collected_data.eligibility.as_deref(), Some("Eligible"));
        assert_eq!(state.collected_data.current_age, Some(41));
    }

    #[test]
    fn years_recomputed_when_either_age_changes() {
        let state = EnrollmentState::default()
            .with_current_age(30)
            .with_retirement_age(65);
        assert_eq!(state.years_to_retirement, Some(35));

        let state = state.with_current_age(40);
        assert_eq!(state.years_to_retirement, Some(25));
        assert_eq!(state.collected_data.years_to_retirement, Some(25));
    }

    #[test]
    fn effective_age_falls_back_to_default() {
        assert_eq!(EnrollmentState::default().effective_current_age(), 34);
        let state = EnrollmentState::default().with_current_age(50);
        assert_eq!(state.effective_current_age(), 50);
    }

    #[test]
    fn selected_plan_sets_plan_type() {
        let state = EnrollmentState::default().with_selected_plan(PlanChoice::PayTaxNow);
        assert_eq!(state.plan_type.as_deref(), Some("Roth 401(k)"));
        assert_eq!(state.collected_data.plan_type.as_deref(), Some("Roth 401(k)"));

        let state = state.with_selected_plan(PlanChoice::PayTaxLater);
        assert_eq!(state.plan_type.as_deref(), Some("401(k)"));
    }

    #[test]
    fn allocation_draft_does_not_touch_mirror() {
        let ids = vec!["us-lg".to_string(), "bond-ag".to_string()];
        let accepted = BTreeMap::from([
            ("us-lg".to_string(), dec!(60)),
            ("bond-ag".to_string(), dec!(40)),
        ]);
        let state = EnrollmentState::default()
            .with_selected_funds(ids)
            .with_allocations(accepted);
        let mirrored = state.collected_data.manual_allocations.clone();
        assert_eq!(mirrored.len(), 2);
        assert!(mirrored[0].ends_with("60%"));

        let draft = BTreeMap::from([
            ("us-lg".to_string(), dec!(60)),
            ("bond-ag".to_string(), dec!(30)),
        ]);
        let state = state.with_allocation_draft(draft);
        assert_eq!(state.manual_allocations["bond-ag"], dec!(30));
        assert_eq!(state.collected_data.manual_allocations, mirrored);
    }

    #[test]
    fn allocation_lines_follow_selection_order() {
        let state = EnrollmentState::default()
            .with_selected_funds(vec!["us-sm".into(), "bond-ag".into(), "us-lg".into()])
            .with_allocations(BTreeMap::from([
                ("us-lg".to_string(), dec!(33)),
                ("us-sm".to_string(), dec!(34)),
                ("bond-ag".to_string(), dec!(33)),
            ]));
        let ids: Vec<&str> = state.allocation_lines().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec!["us-sm", "bond-ag", "us-lg"]);
    }

    #[test]
    fn format_percent_strips_trailing_zeros() {
        assert_eq!(format_percent(dec!(8.00)), "8%");
        assert_eq!(format_percent(dec!(8.5)), "8.5%");
    }

    #[test]
    fn step_display_matches_serde() {
        for step in EnrollmentStep::ALL {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{step}\""), json, "mismatch for {step:?}");
        }
    }

    #[test]
    fn only_confirmed_and_ineligible_are_terminal() {
        for step in EnrollmentStep::ALL {
            let expected = matches!(step, EnrollmentStep::Confirmed | EnrollmentStep::Ineligible);
            assert_eq!(step.is_terminal(), expected, "{step}");
        }
    }

    #[test]
    fn state_serde_roundtrip_keeps_decimals() {
        let state = EnrollmentState::default()
            .with_contribution(dec!(7.5))
            .at(EnrollmentStep::MoneyHandling);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["step"], "MONEY_HANDLING");
        assert_eq!(json["contribution_percentage"], "7.5");

        let parsed: EnrollmentState = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn out_of_range_seed_age_is_dropped() {
        for age in [i32::MIN, -1, 13, 100, i32::MAX] {
            let state = initialize(InitOptions {
                is_eligible: None,
                current_age: Some(age),
            });
            assert_eq!(state.current_age, None, "{age}");
            assert_eq!(state.collected_data.current_age, None, "{age}");
        }
        let state = initialize(InitOptions {
            is_eligible: None,
            current_age: Some(99),
        });
        assert_eq!(state.current_age, Some(99));
    }

    #[test]
    fn years_to_retirement_does_not_overflow() {
        let state = EnrollmentState::default()
            .with_current_age(i32::MIN)
            .with_retirement_age(67);
        assert_eq!(state.years_to_retirement, None);
        assert_eq!(state.retirement_age, Some(67));
    }

    #[test]
    fn leaving_manual_strategy_clears_typed_manual_fields() {
        let mut allocations = BTreeMap::new();
        allocations.insert("us-lg".to_string(), dec!(100));
        let state = EnrollmentState::default()
            .with_strategy(InvestmentStrategy::Manual)
            .with_risk_level(RiskLevel::Growth)
            .with_selected_funds(vec!["us-lg".to_string()])
            .with_allocations(allocations)
            .with_strategy(InvestmentStrategy::Default);

        assert_eq!(state.manual_risk_level, None);
        assert!(state.manual_selected_fund_ids.is_empty());
        assert!(state.manual_allocations.is_empty());
        assert_eq!(state.collected_data.manual_risk_level.as_deref(), Some("Growth"));
        assert_eq!(state.collected_data.manual_allocations.len(), 1);
    }
}
