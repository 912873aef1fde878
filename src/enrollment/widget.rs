//! Decision widget hints for the UI layer.

use serde::Serialize;

use super::state::EnrollmentStep;

/// Structured widget the UI can render next to a step's message. Widget
/// clicks come back as ordinary utterances (`funds:...`, `alloc:...`), so
/// the machine never depends on which widget was shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionWidget {
    PlanChoice,
    ContributionSlider,
    StrategyCards,
    RiskScale,
    FundPicker,
    AllocationSliders,
    ReviewCard,
}

impl DecisionWidget {
    pub fn for_step(step: EnrollmentStep) -> Option<Self> {
        match step {
            EnrollmentStep::PlanRecommendation => Some(Self::PlanChoice),
            EnrollmentStep::Contribution => Some(Self::ContributionSlider),
            EnrollmentStep::MoneyHandling => Some(Self::StrategyCards),
            EnrollmentStep::ManualRisk => Some(Self::RiskScale),
            EnrollmentStep::ManualFunds => Some(Self::FundPicker),
            EnrollmentStep::ManualAllocation => Some(Self::AllocationSliders),
            EnrollmentStep::Review => Some(Self::ReviewCard),
            EnrollmentStep::Intent
            | EnrollmentStep::Eligibility
            | EnrollmentStep::CurrentAge
            | EnrollmentStep::RetirementAge
            | EnrollmentStep::Location
            | EnrollmentStep::Confirmed
            | EnrollmentStep::Ineligible => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_text_steps_have_no_widget() {
        assert_eq!(DecisionWidget::for_step(EnrollmentStep::Location), None);
        assert_eq!(DecisionWidget::for_step(EnrollmentStep::Confirmed), None);
    }

    #[test]
    fn manual_steps_map_to_pickers() {
        assert_eq!(
            DecisionWidget::for_step(EnrollmentStep::ManualFunds),
            Some(DecisionWidget::FundPicker)
        );
        assert_eq!(
            serde_json::to_string(&DecisionWidget::AllocationSliders).unwrap(),
            "\"allocation_sliders\""
        );
    }
}
