//! Enrollment state machine: one transition handler per step.
//!
//! `advance` is pure. It never errors; input it cannot use leaves the step
//! unchanged and answers with a corrective prompt.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{debug, trace};

use super::input::{Utterance, even_split, parse_allocations, parse_fund_ids};
use super::prompts::{self, Rejection};
use super::review;
use super::state::{
    DEFAULT_CURRENT_AGE, EnrollmentState, EnrollmentStep, InvestmentStrategy, MAX_AGE,
    MIN_CURRENT_AGE, PlanChoice, RiskLevel, format_percent,
};

const INTENT_KEYWORDS: &[&str] = &[
    "enroll",
    "sign up",
    "signup",
    "retirement plan",
    "join",
    "get started",
    "start saving",
];

const MIN_LOCATION_CHARS: usize = 2;

// Plan choice keywords, checked in this order. "roth 401k" must land on
// pay-tax-now before the bare "401" catches it.
const PAY_NOW_SPECIFIC: &[&str] = &["roth", "pay tax now", "tax now"];
const PAY_LATER: &[&str] = &["later", "traditional", "401", "pre-tax", "pretax"];
const PAY_NOW_GENERIC: &[&str] = &["now"];

const UNSURE_KEYWORDS: &[&str] = &[
    "not sure",
    "unsure",
    "don't know",
    "dont know",
    "no idea",
    "you decide",
    "recommend",
];
const UNSURE_CONTRIBUTION: Decimal = dec!(6);
const MIN_CONTRIBUTION: Decimal = dec!(1);
const MAX_CONTRIBUTION: Decimal = dec!(100);

// Money handling keywords, checked manual, advisor, system. "handle it
// myself" must not fall through to the system-managed branch.
const MANUAL_KEYWORDS: &[&str] = &["myself", "manual", "my own", "diy"];
const ADVISOR_KEYWORDS: &[&str] = &["advisor", "adviser", "later", "professional", "talk to someone"];
const SYSTEM_KEYWORDS: &[&str] = &["system", "automatic", "auto", "default", "for me"];

const MAX_ALLOCATION: Decimal = dec!(100);
const ALLOCATION_TOLERANCE: Decimal = dec!(0.01);

/// Outcome of one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub next_state: EnrollmentState,
    pub message: String,
    pub is_complete: bool,
}

impl Transition {
    /// Move to `state` (already carrying its new step).
    pub(crate) fn to(state: EnrollmentState, message: impl Into<String>) -> Self {
        let is_complete = state.step.is_terminal();
        Self {
            next_state: state,
            message: message.into(),
            is_complete,
        }
    }

    /// Stay on the current step with a corrective message.
    pub(crate) fn reject(state: EnrollmentState, rejection: Rejection) -> Self {
        debug!(
            step = %state.step,
            reason = rejection.kind(),
            "Input rejected, reprompting"
        );
        let message = prompts::rejection_message(state.step, &rejection, &state);
        Self::to(state, message)
    }
}

/// Apply one user utterance to `state`.
pub fn advance(state: &EnrollmentState, utterance: &str) -> Transition {
    let input = Utterance::new(utterance);

    let transition = if state.step.is_terminal() {
        handle_terminal(state)
    } else if state.step == EnrollmentStep::Review {
        // Review intents take precedence over generic per-step handling.
        review::handle(state, &input)
    } else {
        dispatch(state, &input)
    };

    if transition.next_state.step != state.step {
        debug!(
            from = %state.step,
            to = %transition.next_state.step,
            complete = transition.is_complete,
            "Enrollment step advanced"
        );
    } else {
        trace!(step = %state.step, "Enrollment step unchanged");
    }

    transition
}

fn dispatch(state: &EnrollmentState, input: &Utterance) -> Transition {
    match state.step {
        EnrollmentStep::Intent => handle_intent(state, input),
        EnrollmentStep::Eligibility => handle_eligibility(state, input),
        EnrollmentStep::CurrentAge => handle_current_age(state, input),
        EnrollmentStep::RetirementAge => handle_retirement_age(state, input),
        EnrollmentStep::Location => handle_location(state, input),
        EnrollmentStep::PlanRecommendation => handle_plan_recommendation(state, input),
        EnrollmentStep::Contribution => handle_contribution(state, input),
        EnrollmentStep::MoneyHandling => handle_money_handling(state, input),
        EnrollmentStep::ManualRisk => handle_manual_risk(state, input),
        EnrollmentStep::ManualFunds => handle_manual_funds(state, input),
        EnrollmentStep::ManualAllocation => handle_manual_allocation(state, input),
        EnrollmentStep::Review => review::handle(state, input),
        EnrollmentStep::Confirmed | EnrollmentStep::Ineligible => handle_terminal(state),
    }
}

/// Pay tax now when young or far from retirement, otherwise later.
pub fn recommend_plan(current_age: i32, years_to_retirement: i32) -> PlanChoice {
    if current_age <= 35 || years_to_retirement >= 25 {
        PlanChoice::PayTaxNow
    } else {
        PlanChoice::PayTaxLater
    }
}

fn handle_terminal(state: &EnrollmentState) -> Transition {
    Transition {
        next_state: state.clone(),
        message: prompts::step_prompt(state.step, state),
        is_complete: true,
    }
}

fn handle_intent(state: &EnrollmentState, input: &Utterance) -> Transition {
    if !input.contains_any(INTENT_KEYWORDS) {
        return Transition::reject(state.clone(), Rejection::Unparseable);
    }
    check_eligibility(state)
}

fn handle_eligibility(state: &EnrollmentState, input: &Utterance) -> Transition {
    if input.is_noise() {
        return Transition::reject(state.clone(), Rejection::Unparseable);
    }
    check_eligibility(state)
}

/// Shared by INTENT and ELIGIBILITY: only an explicit `false` rejects.
fn check_eligibility(state: &EnrollmentState) -> Transition {
    if state.is_eligible == Some(false) {
        let next = state.clone().at(EnrollmentStep::Ineligible);
        return Transition::to(next, prompts::INELIGIBLE_MESSAGE);
    }

    let age = state.current_age.unwrap_or(DEFAULT_CURRENT_AGE);
    let next = state
        .clone()
        .with_current_age(age)
        .at(EnrollmentStep::RetirementAge);
    let message = format!(
        "Great, let's get you enrolled. {}",
        prompts::step_prompt(EnrollmentStep::RetirementAge, &next)
    );
    Transition::to(next, message)
}

fn handle_current_age(state: &EnrollmentState, input: &Utterance) -> Transition {
    let Some(age) = input.first_whole_number() else {
        return Transition::reject(state.clone(), Rejection::Unparseable);
    };
    if age < i64::from(MIN_CURRENT_AGE) {
        return Transition::reject(state.clone(), Rejection::TooLow);
    }
    if age > i64::from(MAX_AGE) {
        return Transition::reject(state.clone(), Rejection::TooHigh);
    }

    let next = state
        .clone()
        .with_current_age(age as i32)
        .at(EnrollmentStep::RetirementAge);
    let message = prompts::step_prompt(EnrollmentStep::RetirementAge, &next);
    Transition::to(next, message)
}

fn handle_retirement_age(state: &EnrollmentState, input: &Utterance) -> Transition {
    let Some(age) = input.first_whole_number() else {
        return Transition::reject(state.clone(), Rejection::Unparseable);
    };
    let current = state.effective_current_age();
    if age <= i64::from(current) {
        return Transition::reject(state.clone(), Rejection::TooLow);
    }
    if age > i64::from(MAX_AGE) {
        return Transition::reject(state.clone(), Rejection::TooHigh);
    }

    let next = state
        .clone()
        .with_current_age(current)
        .with_retirement_age(age as i32)
        .at(EnrollmentStep::Location);
    let message = prompts::step_prompt(EnrollmentStep::Location, &next);
    Transition::to(next, message)
}

fn handle_location(state: &EnrollmentState, input: &Utterance) -> Transition {
    let country = input.raw.as_str();
    let long_enough = country.chars().count() >= MIN_LOCATION_CHARS;
    if !long_enough || !country.chars().any(char::is_alphabetic) {
        return Transition::reject(state.clone(), Rejection::Unparseable);
    }

    let current = state.effective_current_age();
    let years = state.years_to_retirement.unwrap_or(0);
    let next = state
        .clone()
        .with_work_country(country)
        .with_recommendation(recommend_plan(current, years))
        .at(EnrollmentStep::PlanRecommendation);
    let message = prompts::recommendation_prompt(&next);
    Transition::to(next, message)
}

fn handle_plan_recommendation(state: &EnrollmentState, input: &Utterance) -> Transition {
    let choice = if input.contains_any(PAY_NOW_SPECIFIC) {
        PlanChoice::PayTaxNow
    } else if input.contains_any(PAY_LATER) {
        PlanChoice::PayTaxLater
    } else if input.contains_any(PAY_NOW_GENERIC) {
        PlanChoice::PayTaxNow
    } else {
        return Transition::reject(state.clone(), Rejection::Unparseable);
    };

    let next = state
        .clone()
        .with_selected_plan(choice)
        .at(EnrollmentStep::Contribution);
    let message = prompts::step_prompt(EnrollmentStep::Contribution, &next);
    Transition::to(next, message)
}

fn handle_contribution(state: &EnrollmentState, input: &Utterance) -> Transition {
    if input.contains_any(UNSURE_KEYWORDS) {
        let next = state
            .clone()
            .with_contribution(UNSURE_CONTRIBUTION)
            .at(EnrollmentStep::MoneyHandling);
        let message = format!(
            "{} {}",
            prompts::UNSURE_CONTRIBUTION_NOTE,
            prompts::step_prompt(EnrollmentStep::MoneyHandling, &next)
        );
        return Transition::to(next, message);
    }

    let Some(pct) = input.percent_number().or_else(|| input.first_number()) else {
        return Transition::reject(state.clone(), Rejection::Unparseable);
    };
    if pct < MIN_CONTRIBUTION {
        return Transition::reject(state.clone(), Rejection::TooLow);
    }
    if pct > MAX_CONTRIBUTION {
        return Transition::reject(state.clone(), Rejection::TooHigh);
    }

    let next = state
        .clone()
        .with_contribution(pct)
        .at(EnrollmentStep::MoneyHandling);
    let message = format!(
        "Got it, {} of each paycheck. {}",
        format_percent(pct),
        prompts::step_prompt(EnrollmentStep::MoneyHandling, &next)
    );
    Transition::to(next, message)
}

fn handle_money_handling(state: &EnrollmentState, input: &Utterance) -> Transition {
    let strategy = if input.contains_any(MANUAL_KEYWORDS) {
        InvestmentStrategy::Manual
    } else if input.contains_any(ADVISOR_KEYWORDS) {
        InvestmentStrategy::Advisor
    } else if input.contains_any(SYSTEM_KEYWORDS) {
        InvestmentStrategy::Default
    } else {
        return Transition::reject(state.clone(), Rejection::Unparseable);
    };

    let next_step = match strategy {
        InvestmentStrategy::Manual => EnrollmentStep::ManualRisk,
        InvestmentStrategy::Default | InvestmentStrategy::Advisor => EnrollmentStep::Review,
    };
    let next = state.clone().with_strategy(strategy).at(next_step);
    let message = match strategy {
        InvestmentStrategy::Advisor => format!(
            "An advisor will reach out to help you choose investments.\n{}",
            prompts::step_prompt(next_step, &next)
        ),
        _ => prompts::step_prompt(next_step, &next),
    };
    Transition::to(next, message)
}

fn handle_manual_risk(state: &EnrollmentState, input: &Utterance) -> Transition {
    let Some(level) = RiskLevel::ALL
        .into_iter()
        .find(|level| input.normalized.contains(&level.label().to_lowercase()))
    else {
        return Transition::reject(state.clone(), Rejection::Unparseable);
    };

    let next = state
        .clone()
        .with_risk_level(level)
        .at(EnrollmentStep::ManualFunds);
    let message = prompts::step_prompt(EnrollmentStep::ManualFunds, &next);
    Transition::to(next, message)
}

fn handle_manual_funds(state: &EnrollmentState, input: &Utterance) -> Transition {
    let Some(ids) = parse_fund_ids(&input.raw) else {
        return Transition::reject(state.clone(), Rejection::MalformedPayload);
    };
    let mut selected: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !selected.contains(&id) {
            selected.push(id);
        }
    }
    if selected.is_empty() {
        return Transition::reject(state.clone(), Rejection::MalformedPayload);
    }

    let split = even_split(&selected);
    let next = state
        .clone()
        .with_selected_funds(selected)
        .with_allocation_draft(split)
        .at(EnrollmentStep::ManualAllocation);
    let message = prompts::step_prompt(EnrollmentStep::ManualAllocation, &next);
    Transition::to(next, message)
}

fn handle_manual_allocation(state: &EnrollmentState, input: &Utterance) -> Transition {
    let Ok(pairs) = parse_allocations(&input.raw) else {
        return Transition::reject(state.clone(), Rejection::MalformedPayload);
    };

    let selected = &state.manual_selected_fund_ids;
    let unknown: Vec<String> = pairs
        .iter()
        .map(|(id, _)| id)
        .filter(|id| !selected.contains(id))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Transition::reject(state.clone(), Rejection::UnknownFunds(unknown));
    }

    if let Some((id, _)) = pairs
        .iter()
        .find(|(_, pct)| *pct < Decimal::ZERO || *pct > MAX_ALLOCATION)
    {
        return Transition::reject(state.clone(), Rejection::AllocationOutOfRange(id.clone()));
    }

    let allocations: BTreeMap<String, Decimal> = pairs.into_iter().collect();
    let missing: Vec<String> = selected
        .iter()
        .filter(|id| !allocations.contains_key(*id))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Transition::reject(state.clone(), Rejection::MissingFunds(missing));
    }

    let total: Decimal = allocations.values().copied().sum();
    if (total - dec!(100)).abs() > ALLOCATION_TOLERANCE {
        // Keep the parsed draft so the widget can show what was entered.
        let draft = state.clone().with_allocation_draft(allocations);
        return Transition::reject(draft, Rejection::AllocationTotal(total));
    }

    let next = state
        .clone()
        .with_allocations(allocations)
        .at(EnrollmentStep::Review);
    let message = prompts::review_summary(&next);
    Transition::to(next, message)
}
