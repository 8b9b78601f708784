//! # Error Module
//!
//! Every fallible operation in this crate returns [`ApiError`]. The variants follow the
//! lifecycle of an endpoint:
//!
//! - [`ApiError::Configuration`] - a named spec document is missing or malformed (load time)
//! - [`ApiError::Validation`] - a spec is structurally invalid (registration time)
//! - [`ApiError::BadRequest`] - a command payload is malformed or violates its schemas (request time)
//! - [`ApiError::Internal`] - anything else raised by business logic
//!
//! A lookup that finds no implementation is not an error; it yields `None`.

use http::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

use crate::command::CommandErrorReport;

/// A single structural problem found while validating a specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Where in the spec the problem sits (e.g. `url.parts.id`)
    pub location: String,
    /// Short machine-readable category (e.g. `UnknownPart`)
    pub kind: String,
    /// Human-readable description
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        location: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ValidationIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.location, self.message)
    }
}

/// Failure to compile one command schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("schema for command '{command}' does not compile: {message}")]
pub struct SchemaCompileError {
    pub command: String,
    pub message: String,
}

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed spec resource. Fatal, not retried.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Structurally invalid spec; the registration is not committed.
    #[error("invalid API specification: {message}")]
    Validation {
        message: String,
        issues: Vec<ValidationIssue>,
        #[source]
        source: Option<SchemaCompileError>,
    },

    /// Malformed command payload or one-or-more schema violations.
    ///
    /// `errors` holds one entry per failing command so a client sees every
    /// failure from a single round trip.
    #[error("{message}")]
    BadRequest {
        message: String,
        errors: Vec<CommandErrorReport>,
    },

    /// Untyped failure from business logic.
    #[error(transparent)]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn configuration(message: impl Into<String>) -> Self {
        ApiError::Configuration {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Build a validation error from a non-empty list of issues.
    ///
    /// A single issue keeps its own message; several are summarised.
    pub fn from_issues(issues: Vec<ValidationIssue>, source: Option<SchemaCompileError>) -> Self {
        let message = match issues.as_slice() {
            [only] => only.message.clone(),
            many => format!(
                "{} issues found: {}",
                many.len(),
                many.iter()
                    .map(|i| i.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            ),
        };
        ApiError::Validation {
            message,
            issues,
            source,
        }
    }

    /// Propagate a typed error unchanged, wrap anything else as `Internal`.
    #[must_use]
    pub fn wrap(err: anyhow::Error) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(other) => ApiError::Internal(other),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Issues carried by a `Validation` error, empty otherwise.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            ApiError::Validation { issues, .. } => issues,
            _ => &[],
        }
    }

    /// Per-command entries carried by a `BadRequest`, empty otherwise.
    #[must_use]
    pub fn command_errors(&self) -> &[CommandErrorReport] {
        match self {
            ApiError::BadRequest { errors, .. } => errors,
            _ => &[],
        }
    }

    /// JSON body for an error response.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::BadRequest { message, errors } if !errors.is_empty() => {
                json!({ "error": message, "details": errors })
            }
            ApiError::Validation { message, issues, .. } => {
                json!({ "error": message, "details": issues })
            }
            other => json!({ "error": other.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_keeps_typed_errors() {
        let err = anyhow::Error::new(ApiError::bad_request("no body"));
        match ApiError::wrap(err) {
            ApiError::BadRequest { message, .. } => assert_eq!(message, "no body"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn wrap_boxes_foreign_errors() {
        let err = anyhow::anyhow!("disk on fire");
        let wrapped = ApiError::wrap(err);
        assert!(matches!(wrapped, ApiError::Internal(_)));
        assert_eq!(wrapped.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(wrapped.to_json()["error"], "disk on fire");
    }

    #[test]
    fn several_issues_are_summarised() {
        let err = ApiError::from_issues(
            vec![
                ValidationIssue::new("methods", "EmptyMethods", "methods must not be empty"),
                ValidationIssue::new("url.parts.x", "UnknownPart", "x is not a valid part"),
            ],
            None,
        );
        let text = err.to_string();
        assert!(text.contains("2 issues found"));
        assert!(text.contains("x is not a valid part"));
        assert_eq!(err.issues().len(), 2);
    }
}
