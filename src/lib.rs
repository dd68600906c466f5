//! civic-report - multi-step civic issue report wizard
//!
//! The `report` module holds the wizard core (draft, steps, validation,
//! packaging). The `api` module is the submission boundary. Any UI layer,
//! including the bundled CLI, drives a `ReportWizard` and hands it a
//! `SubmissionClient`.

pub mod api;
pub mod config;
pub mod env_vars;
pub mod logging;
pub mod report;

pub use api::{AuthSession, HttpSubmissionClient, IssueReceipt, SubmissionClient, SubmissionError};
pub use report::{FieldUpdate, IssueDraft, ReportWizard, SubmitError, WizardStep};
