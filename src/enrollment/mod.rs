//! Enrollment dialogue: a deterministic, turn-by-turn controller that walks
//! a participant through eligibility, ages, plan choice, contribution rate,
//! investment strategy and a final review.
//!
//! The caller owns the [`EnrollmentState`]. Each turn it calls [`advance`]
//! with the user's utterance, shows the returned message, and keeps the new
//! state for the next turn.

pub mod funds;
pub mod input;
pub mod machine;
pub mod prompts;
pub mod review;
pub mod state;
pub mod widget;

pub use machine::{Transition, advance, recommend_plan};
pub use state::{
    CollectedData, EnrollmentState, EnrollmentStep, InitOptions, InvestmentStrategy, PlanChoice,
    RiskLevel, initialize,
};
pub use widget::DecisionWidget;
