//! Submission error types and parsing of server error bodies

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::report::draft::DraftField;

/// Server-reported field messages keyed by wire field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Errors that can occur when sending a report to the submission endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionError {
    /// Transport failure: connection refused, DNS, timeout
    Network { message: String },
    /// 401 Unauthorized - missing, invalid or expired credentials
    Unauthorized { message: Option<String> },
    /// 403 Forbidden - credentials lack permission to report issues
    Forbidden { message: Option<String> },
    /// 429 Rate Limited
    RateLimited { retry_after_secs: Option<u64> },
    /// Any other non-2xx reply
    Rejected {
        status: u16,
        message: String,
        field_errors: FieldErrors,
    },
    /// 2xx reply whose body could not be understood
    InvalidResponse { message: String },
}

impl SubmissionError {
    pub fn network(message: impl Into<String>) -> Self {
        SubmissionError::Network {
            message: message.into(),
        }
    }

    pub fn rejected(status: u16, message: impl Into<String>, field_errors: FieldErrors) -> Self {
        SubmissionError::Rejected {
            status,
            message: message.into(),
            field_errors,
        }
    }

    /// Check if this is an authentication error (401 or 403)
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            SubmissionError::Unauthorized { .. } | SubmissionError::Forbidden { .. }
        )
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SubmissionError::RateLimited { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            SubmissionError::Unauthorized { .. } => Some(401),
            SubmissionError::Forbidden { .. } => Some(403),
            SubmissionError::RateLimited { .. } => Some(429),
            SubmissionError::Rejected { status, .. } => Some(*status),
            SubmissionError::Network { .. }
            | SubmissionError::InvalidResponse { .. } => None,
        }
    }

    /// Field-level detail from the server, empty when none was given
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            SubmissionError::Rejected { field_errors, .. } if !field_errors.is_empty() => {
                Some(field_errors)
            }
            _ => None,
        }
    }

    /// Server messages for a draft field, matched by wire name
    pub fn messages_for(&self, field: DraftField) -> &[String] {
        self.field_errors()
            .and_then(|errors| errors.get(field.wire_name()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drop server detail for a field once the user edits it
    pub fn clear_field(&mut self, field: DraftField) -> bool {
        match self {
            SubmissionError::Rejected { field_errors, .. } => {
                field_errors.remove(field.wire_name()).is_some()
            }
            _ => false,
        }
    }

    /// Single message suitable for showing to the reporter
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::Network { .. } => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            SubmissionError::Unauthorized { .. } => {
                "Your session has expired. Please log in again.".to_string()
            }
            SubmissionError::Forbidden { .. } => {
                "You do not have permission to report issues.".to_string()
            }
            SubmissionError::RateLimited { .. } => {
                "Too many reports submitted. Please wait and try again.".to_string()
            }
            SubmissionError::Rejected { .. }
            | SubmissionError::InvalidResponse { .. } => {
                "Error: Could not submit issue.".to_string()
            }
        }
    }
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionError::Network { message } => write!(f, "Network error - {}", message),
            SubmissionError::Unauthorized { message } => match message {
                Some(m) => write!(f, "Unauthorized (401) - {}", m),
                None => write!(f, "Unauthorized (401)"),
            },
            SubmissionError::Forbidden { message } => match message {
                Some(m) => write!(f, "Forbidden (403) - {}", m),
                None => write!(f, "Forbidden (403) - insufficient permissions"),
            },
            SubmissionError::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "Rate limited - retry after {}s", secs)
                } else {
                    write!(f, "Rate limited")
                }
            }
            SubmissionError::Rejected {
                status,
                message,
                field_errors,
            } => {
                write!(f, "HTTP {} - {}", status, message)?;
                if !field_errors.is_empty() {
                    let fields: Vec<&str> = field_errors.keys().map(String::as_str).collect();
                    write!(f, " (fields: {})", fields.join(", "))?;
                }
                Ok(())
            }
            SubmissionError::InvalidResponse { message } => {
                write!(f, "Invalid response - {}", message)
            }
        }
    }
}

impl std::error::Error for SubmissionError {}

fn messages_from(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(messages_from).collect(),
        Value::Object(map) => map.values().flat_map(messages_from).collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

/// Parse an error body into a summary message and per-field messages.
///
/// Understands the shapes the issue API returns:
/// `{"field": ["msg"]}`, `{"error": "msg", "details": {...}}` and
/// `{"detail": "msg"}`. Non-JSON bodies become the message verbatim.
pub fn parse_error_body(body: &str) -> (Option<String>, FieldErrors) {
    let mut field_errors = FieldErrors::new();

    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => {
            let trimmed = body.trim();
            let message = (!trimmed.is_empty()).then(|| trimmed.to_string());
            return (message, field_errors);
        }
    };

    let map = match value {
        Value::Object(map) => map,
        other => {
            let messages = messages_from(&other);
            return (
                (!messages.is_empty()).then(|| messages.join("; ")),
                field_errors,
            );
        }
    };

    let mut message = None;
    for (key, entry) in &map {
        match key.as_str() {
            "detail" | "error" | "message" | "non_field_errors" => {
                let messages = messages_from(entry);
                if !messages.is_empty() && message.is_none() {
                    message = Some(messages.join("; "));
                }
            }
            "details" => {
                if let Value::Object(details) = entry {
                    for (field, messages) in details {
                        field_errors.insert(field.clone(), messages_from(messages));
                    }
                }
            }
            _ => {
                field_errors.insert(key.clone(), messages_from(entry));
            }
        }
    }

    (message, field_errors)
}
