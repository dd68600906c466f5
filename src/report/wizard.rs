//! State controller for the multi-step issue report wizard
//!
//! The wizard owns the current step, the accumulated draft and the error
//! mapping for the current step. Every operation runs to completion; the only
//! suspension point is the network call made by `submit`, bracketed by
//! `begin_submit` / `finish_submit` so a UI can drive it from its own task.

use thiserror::Error;
use tracing::{debug, info, warn};

use super::draft::{FieldUpdate, IssueDraft};
use super::packager::{package, PackagingError, SubmissionPayload};
use super::steps::{StepStatus, WizardStep, TOTAL_STEPS};
use super::validator::{validate_step, ValidationErrors};
use crate::api::client::{IssueReceipt, SubmissionClient};
use crate::api::error::SubmissionError;

/// Lifecycle of a reporting session
#[derive(Debug, Clone, PartialEq)]
pub enum WizardPhase {
    /// Accepting edits and navigation
    Editing,
    /// Payload handed to the submission client, awaiting its outcome
    Submitting,
    /// Report accepted; the draft has been discarded
    Submitted(IssueReceipt),
    /// Reporter abandoned the report; the draft has been discarded
    Cancelled,
}

impl WizardPhase {
    pub fn is_closed(&self) -> bool {
        matches!(self, WizardPhase::Submitted(_) | WizardPhase::Cancelled)
    }
}

/// Reasons a submission attempt did not produce a receipt
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("submission is only possible from the final step (currently on step {0})")]
    NotAtFinalStep(usize),

    #[error("{} field(s) on the final step need attention", .0.len())]
    Invalid(ValidationErrors),

    #[error("a submission is already in flight")]
    InFlight,

    #[error("no submission is in flight")]
    NotSubmitting,

    #[error("the report has already been closed")]
    Closed,

    #[error("could not package report: {0}")]
    Packaging(#[from] PackagingError),

    #[error("submission failed: {0}")]
    Submission(#[from] SubmissionError),
}

impl SubmitError {
    /// Single message suitable for showing to the reporter
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Submission(e) => e.user_message(),
            SubmitError::Packaging(_) => {
                "Error: Could not prepare your photos for upload.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Multi-step report wizard for one reporting session
#[derive(Debug, Clone)]
pub struct ReportWizard {
    step: WizardStep,
    draft: IssueDraft,
    errors: ValidationErrors,
    phase: WizardPhase,
    last_failure: Option<SubmissionError>,
}

impl Default for ReportWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportWizard {
    /// Start a session on step 1 with an empty draft
    pub fn new() -> Self {
        Self::with_draft(IssueDraft::default())
    }

    /// Start a session from a prepared (possibly partial) draft
    pub fn with_draft(draft: IssueDraft) -> Self {
        Self {
            step: WizardStep::first(),
            draft,
            errors: ValidationErrors::new(),
            phase: WizardPhase::Editing,
            last_failure: None,
        }
    }

    pub fn current_step(&self) -> WizardStep {
        self.step
    }

    /// 1-based index of the current step
    pub fn step_number(&self) -> usize {
        self.step.number()
    }

    pub fn total_steps(&self) -> usize {
        TOTAL_STEPS
    }

    pub fn draft(&self) -> &IssueDraft {
        &self.draft
    }

    /// Errors for the current step
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn phase(&self) -> &WizardPhase {
        &self.phase
    }

    /// Failure from the most recent submission attempt, if it failed
    pub fn last_failure(&self) -> Option<&SubmissionError> {
        self.last_failure.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == WizardPhase::Submitting
    }

    /// Progress tracker entries for every step
    pub fn step_statuses(&self) -> Vec<(WizardStep, StepStatus)> {
        WizardStep::all()
            .iter()
            .map(|s| (*s, s.status(self.step)))
            .collect()
    }

    fn is_editable(&self) -> bool {
        self.phase == WizardPhase::Editing
    }

    /// Write one field and drop any error shown for it.
    ///
    /// The error is cleared without re-validating. Returns false when the
    /// wizard is not accepting edits.
    pub fn update_field(&mut self, update: FieldUpdate) -> bool {
        if !self.is_editable() {
            warn!(phase = ?self.phase, "Ignoring field update outside editing phase");
            return false;
        }

        let field = update.field();
        self.draft.apply(update);
        self.errors.clear_field(field);
        if let Some(failure) = self.last_failure.as_mut() {
            failure.clear_field(field);
        }

        true
    }

    /// Validate the current step and move forward when it passes.
    ///
    /// Returns whether the step changed. On the last step a passing
    /// validation clears errors but stays put.
    pub fn advance(&mut self) -> bool {
        if !self.is_editable() {
            return false;
        }

        let errors = validate_step(self.step, &self.draft);
        if !errors.is_empty() {
            debug!(
                step = self.step.number(),
                invalid = errors.len(),
                "Step validation failed"
            );
            self.errors = errors;
            return false;
        }

        self.errors.clear();
        match self.step.next() {
            Some(next) => {
                debug!(from = self.step.number(), to = next.number(), "Advancing");
                self.step = next;
                true
            }
            None => false,
        }
    }

    /// Step back without validating. No-op on the first step.
    pub fn retreat(&mut self) -> bool {
        if !self.is_editable() {
            return false;
        }

        match self.step.prev() {
            Some(prev) => {
                debug!(from = self.step.number(), to = prev.number(), "Retreating");
                self.step = prev;
                self.errors.clear();
                true
            }
            None => false,
        }
    }

    /// Discard the draft and close the session.
    ///
    /// The caller confirms with the reporter first. Refused while a
    /// submission is in flight.
    pub fn cancel(&mut self) -> bool {
        match self.phase {
            WizardPhase::Editing => {
                info!(step = self.step.number(), "Report cancelled");
                self.draft = IssueDraft::with_update_frequency(self.draft.update_frequency.clone());
                self.errors.clear();
                self.last_failure = None;
                self.phase = WizardPhase::Cancelled;
                true
            }
            WizardPhase::Submitting => {
                warn!("Cancel requested while submission in flight; ignoring");
                false
            }
            WizardPhase::Submitted(_) | WizardPhase::Cancelled => false,
        }
    }

    /// Validate the final step and package the draft for sending.
    ///
    /// On success the wizard enters `Submitting` and further calls are
    /// rejected with `SubmitError::InFlight` until `finish_submit`.
    pub fn begin_submit(&mut self) -> Result<SubmissionPayload, SubmitError> {
        match self.phase {
            WizardPhase::Editing => {}
            WizardPhase::Submitting => return Err(SubmitError::InFlight),
            WizardPhase::Submitted(_) | WizardPhase::Cancelled => return Err(SubmitError::Closed),
        }

        if !self.step.is_last() {
            return Err(SubmitError::NotAtFinalStep(self.step.number()));
        }

        let errors = validate_step(self.step, &self.draft);
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(SubmitError::Invalid(errors));
        }
        self.errors.clear();

        let payload = package(&self.draft)?;

        info!(
            photos = payload.file_parts.len(),
            "Submitting issue report"
        );
        self.last_failure = None;
        self.phase = WizardPhase::Submitting;
        Ok(payload)
    }

    /// Record the outcome of the submission started by `begin_submit`.
    ///
    /// Success discards the draft. Failure returns to editing on the final
    /// step with the draft untouched.
    pub fn finish_submit(
        &mut self,
        outcome: Result<IssueReceipt, SubmissionError>,
    ) -> Result<IssueReceipt, SubmitError> {
        if !self.is_submitting() {
            return Err(SubmitError::NotSubmitting);
        }

        match outcome {
            Ok(receipt) => {
                info!(id = %receipt.id, "Issue report submitted");
                self.draft = IssueDraft::with_update_frequency(self.draft.update_frequency.clone());
                self.phase = WizardPhase::Submitted(receipt.clone());
                Ok(receipt)
            }
            Err(err) => {
                warn!(error = %err, "Issue report submission failed");
                self.phase = WizardPhase::Editing;
                self.last_failure = Some(err.clone());
                Err(SubmitError::Submission(err))
            }
        }
    }

    /// Validate, package, send through `client` and record the outcome
    pub async fn submit(
        &mut self,
        client: &dyn SubmissionClient,
    ) -> Result<IssueReceipt, SubmitError> {
        let payload = self.begin_submit()?;
        debug!(client = client.name(), "Handing payload to submission client");
        let outcome = client.submit(payload).await;
        self.finish_submit(outcome)
    }
}
