//! Client side of the issue reporting API
//!
//! This module provides:
//! - The `SubmissionClient` boundary and its HTTP implementation
//! - An explicit `AuthSession` passed to clients at construction
//! - Submission error taxonomy and server error body parsing

pub mod client;
pub mod error;
pub mod mock;
pub mod session;

pub use client::{AiAnnotations, HttpSubmissionClient, IssueReceipt, SubmissionClient};
pub use error::{FieldErrors, SubmissionError};
pub use mock::MockSubmissionClient;
pub use session::{login, AuthScheme, AuthSession, LoginIdentity};

/// Join an API base URL and a relative endpoint path
pub(crate) fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
