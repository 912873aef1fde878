//! REVIEW step filter.
//!
//! Review input is classified before any generic handling, in a fixed
//! priority: targeted edits, generic edit, confirm, decline, then anything
//! else re-renders the summary. A negated reply counts as a decline even
//! when it also contains a confirm word.

use super::input::Utterance;
use super::machine::Transition;
use super::prompts;
use super::state::{EnrollmentState, EnrollmentStep, InvestmentStrategy};

const EDIT_VERBS: &[&str] = &["edit", "change", "update", "modify", "fix", "go back"];

const RETIREMENT_AGE_TARGETS: &[&str] = &["retirement age", "retire at"];
// Whole word only; "manage" and "message" contain it.
const AGE_WORDS: &[&str] = &["age"];
const LOCATION_TARGETS: &[&str] = &["location", "country", "where i work"];
const PLAN_TARGETS: &[&str] = &["plan", "roth", "traditional", "tax"];

const CONFIRM_PHRASES: &[&str] = &[
    "confirm",
    "submit",
    "looks good",
    "sounds good",
    "go ahead",
    "enroll me",
    "that's right",
];
const CONFIRM_WORDS: &[&str] = &["yes", "yep", "yeah", "ok", "okay", "sure"];

const DECLINE_PHRASES: &[&str] = &["not yet", "later", "hold on", "wait", "not now"];
// Any negation declines, so "not sure" or "don't submit" never confirms.
const DECLINE_WORDS: &[&str] = &[
    "no", "nope", "nah", "not", "don't", "dont", "never", "cancel", "stop",
];

/// A field the participant can jump back to from review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    RetirementAge,
    Location,
    Plan,
}

impl EditTarget {
    pub fn step(&self) -> EnrollmentStep {
        match self {
            Self::RetirementAge => EnrollmentStep::RetirementAge,
            Self::Location => EnrollmentStep::Location,
            Self::Plan => EnrollmentStep::PlanRecommendation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewIntent {
    EditField(EditTarget),
    /// "edit" without a recognised target: revisit how money is invested.
    EditInvestments,
    Confirm,
    Decline,
    Other,
}

/// Classify review input. Order matters: "change my plan" is a targeted
/// edit, not a generic one, and a negated reply never confirms.
pub fn classify(input: &Utterance) -> ReviewIntent {
    if input.contains_any(EDIT_VERBS) {
        let target = if input.contains_any(RETIREMENT_AGE_TARGETS) || input.has_any_word(AGE_WORDS) {
            Some(EditTarget::RetirementAge)
        } else if input.contains_any(LOCATION_TARGETS) {
            Some(EditTarget::Location)
        } else if input.contains_any(PLAN_TARGETS) {
            Some(EditTarget::Plan)
        } else {
            None
        };
        return match target {
            Some(target) => ReviewIntent::EditField(target),
            None => ReviewIntent::EditInvestments,
        };
    }

    // Checked before confirm so a negated reply never confirms.
    if input.contains_any(DECLINE_PHRASES) || input.has_any_word(DECLINE_WORDS) {
        return ReviewIntent::Decline;
    }
    if input.contains_any(CONFIRM_PHRASES) || input.has_any_word(CONFIRM_WORDS) {
        return ReviewIntent::Confirm;
    }
    ReviewIntent::Other
}

/// Handle one turn at REVIEW. Jumps keep every collected field; only the
/// answers given after the jump overwrite anything.
pub fn handle(state: &EnrollmentState, input: &Utterance) -> Transition {
    match classify(input) {
        ReviewIntent::EditField(target) => jump_to(state, target.step()),
        ReviewIntent::EditInvestments => {
            let step = if state.investment_strategy == Some(InvestmentStrategy::Manual) {
                EnrollmentStep::ManualAllocation
            } else {
                EnrollmentStep::MoneyHandling
            };
            jump_to(state, step)
        }
        ReviewIntent::Confirm => {
            let next = state.clone().at(EnrollmentStep::Confirmed);
            Transition::to(next, prompts::CONFIRMED_MESSAGE)
        }
        ReviewIntent::Decline => Transition::to(state.clone(), prompts::review_reminder()),
        ReviewIntent::Other => Transition::to(state.clone(), prompts::review_summary(state)),
    }
}

fn jump_to(state: &EnrollmentState, step: EnrollmentStep) -> Transition {
    let next = state.clone().at(step);
    let message = format!("Sure, let's update that. {}", prompts::step_prompt(step, &next));
    Transition::to(next, message)
}
