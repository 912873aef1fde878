//! User-facing messages, keyed by step and rejection kind.
//!
//! Every literal the machine emits lives here so a caller that needs to
//! localize has one place to swap.

use rust_decimal::Decimal;

use super::funds;
use super::state::{
    EnrollmentState, EnrollmentStep, InvestmentStrategy, PlanChoice, RiskLevel, format_percent,
};

pub const INELIGIBLE_MESSAGE: &str = "Thanks for your interest. Based on your employment \
record you aren't eligible to join the retirement plan yet. Please reach out to your \
benefits team if you think this is a mistake.";

pub const CONFIRMED_MESSAGE: &str = "You're all set! Your retirement plan enrollment has \
been submitted. You'll receive a confirmation once your first contribution is scheduled.";

pub const UNSURE_CONTRIBUTION_NOTE: &str = "No problem, I'll start you at 6%, which is a \
common starting point. You can change it any time.";

/// Why a turn was rejected. The machine never fails; it answers with the
/// matching corrective message and stays on the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Nothing usable in the input.
    Unparseable,
    /// Numeric value under the step's lower bound.
    TooLow,
    /// Numeric value over the step's upper bound.
    TooHigh,
    /// A widget payload with the wrong prefix or shape.
    MalformedPayload,
    /// Allocation payload omitted some selected funds.
    MissingFunds(Vec<String>),
    /// Allocation payload named funds that were never selected.
    UnknownFunds(Vec<String>),
    /// An allocation outside 0-100%.
    AllocationOutOfRange(String),
    /// Allocations parsed but do not total 100%.
    AllocationTotal(Decimal),
}

impl Rejection {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unparseable => "unparseable",
            Self::TooLow => "out_of_range_low",
            Self::TooHigh => "out_of_range_high",
            Self::MalformedPayload
            | Self::MissingFunds(_)
            | Self::UnknownFunds(_)
            | Self::AllocationOutOfRange(_) => "malformed_payload",
            Self::AllocationTotal(_) => "allocation_total",
        }
    }
}

/// The canonical question asked at `step`.
pub fn step_prompt(step: EnrollmentStep, state: &EnrollmentState) -> String {
    match step {
        EnrollmentStep::Intent => "Hi! I can help you enroll in your company's retirement \
plan. Just say \"I want to enroll\" to get started."
            .to_string(),
        EnrollmentStep::Eligibility => "Before we set anything up, I'll confirm that you're \
eligible for the plan. Say \"continue\" when you're ready."
            .to_string(),
        EnrollmentStep::CurrentAge => "How old are you today?".to_string(),
        EnrollmentStep::RetirementAge => format!(
            "Since you're {}, at what age would you like to retire?",
            state.effective_current_age()
        ),
        EnrollmentStep::Location => "Which country do you work in?".to_string(),
        EnrollmentStep::PlanRecommendation => recommendation_prompt(state),
        EnrollmentStep::Contribution => format!(
            "You chose the {}. What percentage of each paycheck would you like to save? \
Many people start around 6%. If you're not sure, just say so.",
            state.plan_type.as_deref().unwrap_or("plan")
        ),
        EnrollmentStep::MoneyHandling => "How should your savings be invested? I can let the \
system handle it automatically, you can pick funds yourself, or an advisor can help you later."
            .to_string(),
        EnrollmentStep::ManualRisk => format!(
            "How much investment risk are you comfortable with: {}?",
            risk_options()
        ),
        EnrollmentStep::ManualFunds => format!(
            "Pick the funds you'd like to hold, one per category:\n{}",
            fund_catalog_lines()
        ),
        EnrollmentStep::ManualAllocation => format!(
            "Here's your current split:\n{}\nAdjust the percentages so they add up to 100%.",
            allocation_lines(state)
        ),
        EnrollmentStep::Review => review_summary(state),
        EnrollmentStep::Confirmed => CONFIRMED_MESSAGE.to_string(),
        EnrollmentStep::Ineligible => INELIGIBLE_MESSAGE.to_string(),
    }
}

/// Corrective message for a rejected turn at `step`.
pub fn rejection_message(step: EnrollmentStep, rejection: &Rejection, state: &EnrollmentState) -> String {
    match (step, rejection) {
        (EnrollmentStep::Intent, _) => "I can help with retirement plan enrollment. Say \
\"I want to enroll\" whenever you're ready."
            .to_string(),
        (EnrollmentStep::CurrentAge, Rejection::TooLow) => {
            "You need to be at least 14 to enroll. How old are you?".to_string()
        }
        (EnrollmentStep::CurrentAge, Rejection::TooHigh) => {
            "That seems a bit high. Please enter an age of 100 or less.".to_string()
        }
        (EnrollmentStep::CurrentAge, _) => {
            "Sorry, I didn't catch that. Please tell me your age as a number, like 34.".to_string()
        }
        (EnrollmentStep::RetirementAge, Rejection::TooLow) => format!(
            "Your retirement age needs to be after your current age of {}. When would you like to retire?",
            state.effective_current_age()
        ),
        (EnrollmentStep::RetirementAge, Rejection::TooHigh) => {
            "Please choose a retirement age of 100 or less.".to_string()
        }
        (EnrollmentStep::RetirementAge, _) => {
            "Sorry, I didn't catch that. At what age would you like to retire? For example, 67."
                .to_string()
        }
        (EnrollmentStep::Location, _) => {
            "Please tell me the country where you work, for example \"USA\".".to_string()
        }
        (EnrollmentStep::Contribution, Rejection::TooLow) => {
            "Contributions start at 1%. What percentage would you like to save?".to_string()
        }
        (EnrollmentStep::Contribution, Rejection::TooHigh) => {
            "You can contribute at most 100% of your paycheck. What percentage would you like?"
                .to_string()
        }
        (EnrollmentStep::Contribution, _) => {
            "Please give me a percentage, like 6%, or say \"not sure\" and I'll suggest one."
                .to_string()
        }
        (EnrollmentStep::ManualFunds, _) => format!(
            "Please choose your funds with the fund picker.\n{}",
            fund_catalog_lines()
        ),
        (EnrollmentStep::ManualAllocation, Rejection::MissingFunds(ids)) => format!(
            "Please give a percentage for every fund you picked. Missing: {}.",
            fund_names(ids)
        ),
        (EnrollmentStep::ManualAllocation, Rejection::UnknownFunds(ids)) => format!(
            "These funds aren't in your selection: {}. Adjust the funds you picked instead.",
            fund_names(ids)
        ),
        (EnrollmentStep::ManualAllocation, Rejection::AllocationOutOfRange(id)) => format!(
            "Each fund needs between 0% and 100%. Check {}.",
            funds::fund_name(id)
        ),
        (EnrollmentStep::ManualAllocation, Rejection::AllocationTotal(total)) => format!(
            "Those percentages total {}, which doesn't add up to 100%. Please adjust them.",
            format_percent(*total)
        ),
        (EnrollmentStep::ManualAllocation, _) => format!(
            "Please set your allocation with the sliders.\n{}",
            allocation_lines(state)
        ),
        (step, _) => format!("Sorry, I didn't catch that. {}", step_prompt(step, state)),
    }
}

pub fn recommendation_prompt(state: &EnrollmentState) -> String {
    let choice = state
        .recommended_plan_choice
        .unwrap_or(PlanChoice::PayTaxNow);
    let reason = match (state.current_age, state.years_to_retirement) {
        (Some(age), Some(years)) => {
            format!("At {age}, with {years} years until retirement")
        }
        _ => "Based on your answers".to_string(),
    };
    format!(
        "{reason}, I recommend the {} option: {}. Would you like to pay tax now (Roth) or pay tax later (Traditional)?",
        choice.plan_type(),
        choice.label().to_lowercase()
    )
}

pub fn review_summary(state: &EnrollmentState) -> String {
    let mut lines = vec!["Here's your enrollment summary:".to_string()];
    lines.push(format!(
        "- Plan: {}",
        state.plan_type.as_deref().unwrap_or("not chosen")
    ));
    lines.push(format!(
        "- Savings: {}",
        state
            .contribution_percentage
            .map(|p| format!("{} of each paycheck", format_percent(p)))
            .unwrap_or_else(|| "not set".to_string())
    ));
    lines.push(format!(
        "- Investments: {}",
        state
            .investment_strategy
            .map(|s| s.description())
            .unwrap_or("not chosen")
    ));
    if state.investment_strategy == Some(InvestmentStrategy::Manual) {
        if let Some(level) = state.manual_risk_level {
            lines.push(format!("- Risk level: {}", level.label()));
        }
        if !state.manual_allocations.is_empty() {
            lines.push(allocation_lines(state));
        }
    }
    if let Some(age) = state.retirement_age {
        lines.push(format!("- Retirement age: {age}"));
    }
    if let Some(country) = &state.work_country {
        lines.push(format!("- Work location: {country}"));
    }
    lines.push(
        "Shall I submit your enrollment? You can also say \"edit retirement age\", \
\"edit location\", \"edit plan\", or \"edit\" to change how your money is invested."
            .to_string(),
    );
    lines.join("\n")
}

pub fn review_reminder() -> String {
    "No problem. Your choices are saved here; just say \"confirm\" when you're ready to \
submit, or \"edit\" to change something."
        .to_string()
}

fn risk_options() -> String {
    RiskLevel::ALL
        .iter()
        .map(|r| r.label())
        .collect::<Vec<_>>()
        .join(", ")
}

fn fund_catalog_lines() -> String {
    funds::CATALOG
        .iter()
        .map(|f| format!("  {} ({})", f.name, f.id))
        .collect::<Vec<_>>()
        .join("\n")
}

fn allocation_lines(state: &EnrollmentState) -> String {
    state
        .allocation_lines()
        .into_iter()
        .map(|(id, pct)| format!("  {}: {}", funds::fund_name(id), format_percent(pct)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn fund_names(ids: &[String]) -> String {
    ids.iter()
        .map(|id| funds::fund_name(id))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrollment::state::InvestmentStrategy;
    use rust_decimal_macros::dec;

    #[test]
    fn every_step_has_a_prompt() {
        let state = EnrollmentState::default();
        for step in EnrollmentStep::ALL {
            assert!(!step_prompt(step, &state).is_empty(), "{step}");
        }
    }

    #[test]
    fn age_rejections_differ_by_bound() {
        let state = EnrollmentState::default();
        let low = rejection_message(EnrollmentStep::CurrentAge, &Rejection::TooLow, &state);
        let high = rejection_message(EnrollmentStep::CurrentAge, &Rejection::TooHigh, &state);
        let generic = rejection_message(EnrollmentStep::CurrentAge, &Rejection::Unparseable, &state);
        assert_ne!(low, high);
        assert_ne!(low, generic);
        assert_ne!(high, generic);
    }

    #[test]
    fn recommendation_prompt_echoes_choice() {
        let state = EnrollmentState::default()
            .with_current_age(50)
            .with_retirement_age(65)
            .with_recommendation(PlanChoice::PayTaxLater);
        let prompt = recommendation_prompt(&state);
        assert!(prompt.contains("401(k)"));
        assert!(prompt.contains("15 years"));
        assert!(prompt.contains("pay tax later"));
    }

    #[test]
    fn summary_lists_plan_savings_and_handling() {
        let state = EnrollmentState::default()
            .with_selected_plan(PlanChoice::PayTaxNow)
            .with_contribution(dec!(8))
            .with_strategy(InvestmentStrategy::Default);
        let summary = review_summary(&state);
        assert!(summary.contains("Roth 401(k)"));
        assert!(summary.contains("8% of each paycheck"));
        assert!(summary.contains(InvestmentStrategy::Default.description()));
        assert!(!summary.contains("Risk level"));
    }

    #[test]
    fn summary_shows_manual_lines_only_for_manual_strategy() {
        let manual = EnrollmentState::default()
            .with_strategy(InvestmentStrategy::Manual)
            .with_risk_level(RiskLevel::Aggressive);
        assert!(review_summary(&manual).contains("Risk level: Aggressive"));

        let mut stale = manual.with_strategy(InvestmentStrategy::Advisor);
        stale.manual_risk_level = Some(RiskLevel::Aggressive);
        assert!(!review_summary(&stale).contains("Risk level"));
    }

    #[test]
    fn allocation_total_message_says_it_does_not_add_up() {
        let msg = rejection_message(
            EnrollmentStep::ManualAllocation,
            &Rejection::AllocationTotal(dec!(90)),
            &EnrollmentState::default(),
        );
        assert!(msg.contains("doesn't add up"));
        assert!(msg.contains("90%"));
    }

    #[test]
    fn rejection_kinds() {
        assert_eq!(Rejection::TooLow.kind(), "out_of_range_low");
        assert_eq!(Rejection::MissingFunds(vec![]).kind(), "malformed_payload");
        assert_eq!(Rejection::AllocationTotal(dec!(1)).kind(), "allocation_total");
    }
}
