//! Ordered wizard steps and the draft fields each one owns

use std::fmt;

use super::draft::DraftField;

/// Number of steps in the report wizard
pub const TOTAL_STEPS: usize = 6;

/// One page of the report wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    BasicInfo,
    Location,
    Category,
    Photos,
    Severity,
    Contact,
}

/// Display state of a step in the progress tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Current,
    Upcoming,
}

impl WizardStep {
    pub fn all() -> &'static [WizardStep] {
        &[
            WizardStep::BasicInfo,
            WizardStep::Location,
            WizardStep::Category,
            WizardStep::Photos,
            WizardStep::Severity,
            WizardStep::Contact,
        ]
    }

    pub fn first() -> WizardStep {
        WizardStep::BasicInfo
    }

    pub fn last() -> WizardStep {
        WizardStep::Contact
    }

    /// 1-based position of the step
    pub fn number(&self) -> usize {
        match self {
            WizardStep::BasicInfo => 1,
            WizardStep::Location => 2,
            WizardStep::Category => 3,
            WizardStep::Photos => 4,
            WizardStep::Severity => 5,
            WizardStep::Contact => 6,
        }
    }

    /// Step at a 1-based position
    pub fn from_number(number: usize) -> Option<WizardStep> {
        number
            .checked_sub(1)
            .and_then(|i| Self::all().get(i))
            .copied()
    }

    pub fn next(&self) -> Option<WizardStep> {
        Self::from_number(self.number() + 1)
    }

    pub fn prev(&self) -> Option<WizardStep> {
        Self::from_number(self.number() - 1)
    }

    pub fn is_last(&self) -> bool {
        *self == Self::last()
    }

    pub fn label(&self) -> &'static str {
        match self {
            WizardStep::BasicInfo => "Basic Info",
            WizardStep::Location => "Location",
            WizardStep::Category => "Category",
            WizardStep::Photos => "Photos",
            WizardStep::Severity => "Severity",
            WizardStep::Contact => "Contact",
        }
    }

    /// Draft fields this step owns and validates
    pub fn fields(&self) -> &'static [DraftField] {
        match self {
            WizardStep::BasicInfo => &[DraftField::Title, DraftField::Description],
            WizardStep::Location => &[DraftField::Location],
            WizardStep::Category => &[DraftField::Category],
            WizardStep::Photos => &[DraftField::Photos],
            WizardStep::Severity => &[DraftField::Severity],
            WizardStep::Contact => &[DraftField::FullName, DraftField::Email, DraftField::Phone],
        }
    }

    /// Tracker state of this step relative to `current`
    pub fn status(&self, current: WizardStep) -> StepStatus {
        match self.cmp(&current) {
            std::cmp::Ordering::Less => StepStatus::Completed,
            std::cmp::Ordering::Equal => StepStatus::Current,
            std::cmp::Ordering::Greater => StepStatus::Upcoming,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.label())
    }
}
