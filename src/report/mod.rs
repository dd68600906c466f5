//! Multi-step issue report wizard
//!
//! Leaf to root: `draft` and `steps` define the record and its pages,
//! `validator` checks one step at a time, `wizard` drives navigation and
//! submission, and `packager` turns the finished draft into a payload.

pub mod draft;
pub mod packager;
pub mod steps;
pub mod validator;
pub mod wizard;

pub use draft::{
    Category, DraftField, FieldUpdate, IssueDraft, NotificationChannel, Notifications, Photo,
    PhotoSource, Severity, DEFAULT_UPDATE_FREQUENCY,
};
pub use packager::{package, FilePart, PackagingError, SubmissionPayload, TextPart};
pub use steps::{StepStatus, WizardStep, TOTAL_STEPS};
pub use validator::{validate_step, ValidationErrors};
pub use wizard::{ReportWizard, SubmitError, WizardPhase};
