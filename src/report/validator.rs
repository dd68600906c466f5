//! Step-local presence validation for the report draft
//!
//! Rules only check that required fields are filled in (and that the two
//! pickers hold one of their fixed values). There is no format checking and
//! no rule looks outside the step being validated.

use std::collections::BTreeMap;

use serde::Serialize;

use super::draft::{Category, DraftField, IssueDraft, Severity};
use super::steps::WizardStep;

/// Field name to message for every field of a step that failed its rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<DraftField, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: DraftField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    /// Drop the entry for one field, returning whether it was present
    pub fn clear_field(&mut self, field: DraftField) -> bool {
        self.0.remove(&field).is_some()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn get(&self, field: DraftField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: DraftField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = DraftField> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DraftField, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn require_text(errors: &mut ValidationErrors, field: DraftField, value: &str, message: &str) {
    if is_blank(value) {
        errors.insert(field, message);
    }
}

/// Validate the fields owned by `step`
pub fn validate_step(step: WizardStep, draft: &IssueDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    match step {
        WizardStep::BasicInfo => {
            require_text(
                &mut errors,
                DraftField::Title,
                &draft.title,
                "Please enter issue title.",
            );
            require_text(
                &mut errors,
                DraftField::Description,
                &draft.description,
                "Please enter description.",
            );
        }
        WizardStep::Location => {
            require_text(
                &mut errors,
                DraftField::Location,
                &draft.location,
                "Please enter location.",
            );
        }
        WizardStep::Category => {
            if is_blank(&draft.category) {
                errors.insert(DraftField::Category, "Please select category.");
            } else if Category::parse(&draft.category).is_none() {
                errors.insert(DraftField::Category, "Please select a valid category.");
            }
        }
        WizardStep::Photos => {
            if draft.photos.is_empty() {
                errors.insert(DraftField::Photos, "Please upload at least one photo.");
            }
        }
        WizardStep::Severity => {
            if is_blank(&draft.severity) {
                errors.insert(DraftField::Severity, "Please select severity level.");
            } else if Severity::parse(&draft.severity).is_none() {
                errors.insert(
                    DraftField::Severity,
                    "Please select a valid severity level.",
                );
            }
        }
        WizardStep::Contact => {
            require_text(
                &mut errors,
                DraftField::FullName,
                &draft.full_name,
                "Please enter your full name.",
            );
            require_text(
                &mut errors,
                DraftField::Email,
                &draft.email,
                "Please enter your email.",
            );
            require_text(
                &mut errors,
                DraftField::Phone,
                &draft.phone,
                "Please enter your phone number.",
            );
        }
    }

    errors
}
