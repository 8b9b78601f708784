use super::types::{ApiSpecification, KNOWN_PARAM_TYPES, KNOWN_PART_TYPES, SUPPORTED_METHODS};
use crate::command::CompiledSchemas;
use crate::error::{ApiError, SchemaCompileError, ValidationIssue};
use crate::router::Template;
use std::collections::BTreeSet;
use tracing::debug;

/// Structural checks a spec must pass before any of it reaches the routing table.
///
/// Every check runs over the whole spec and all issues are reported together;
/// nothing is registered by the validator itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpecValidator;

impl SpecValidator {
    #[must_use]
    pub fn new() -> Self {
        SpecValidator
    }

    /// Validate `spec` and return its compiled command schemas.
    ///
    /// # Errors
    ///
    /// `ApiError::Validation` listing every issue found. A schema that fails to
    /// compile is attached as the error source.
    pub fn validate(&self, spec: &ApiSpecification) -> Result<CompiledSchemas, ApiError> {
        let mut issues = Vec::new();

        check_methods(spec, &mut issues);
        check_url(spec, &mut issues);

        let (schemas, compile_error) = match CompiledSchemas::compile(spec) {
            Ok(schemas) => (schemas, None),
            Err(e) => {
                issues.push(ValidationIssue::new(
                    format!("commands.{}", e.command),
                    "InvalidSchema",
                    e.to_string(),
                ));
                (CompiledSchemas::default(), Some(e))
            }
        };

        if issues.is_empty() {
            debug!(
                methods = ?spec.methods,
                paths = ?spec.paths(),
                commands = schemas.len(),
                "API specification validated"
            );
            Ok(schemas)
        } else {
            Err(ApiError::from_issues(issues, compile_error))
        }
    }
}

fn check_methods(spec: &ApiSpecification, issues: &mut Vec<ValidationIssue>) {
    if spec.methods.is_empty() {
        issues.push(ValidationIssue::new(
            "methods",
            "MissingMethods",
            "methods must list at least one verb",
        ));
    }
    for method in &spec.methods {
        if !SUPPORTED_METHODS.contains(&method.as_str()) {
            issues.push(ValidationIssue::new(
                "methods",
                "UnsupportedMethod",
                format!("{method} is not one of {SUPPORTED_METHODS:?}"),
            ));
        }
    }
}

fn check_url(spec: &ApiSpecification, issues: &mut Vec<ValidationIssue>) {
    let Some(url) = spec.url.as_ref() else {
        issues.push(ValidationIssue::new("url", "MissingUrl", "url is missing"));
        return;
    };

    if url.paths.is_empty() {
        issues.push(ValidationIssue::new(
            "url.paths",
            "MissingPaths",
            "url.paths must list at least one template",
        ));
    }

    for (name, meta) in url.params.iter().flatten() {
        if let Some(kind) = meta.kind.as_deref() {
            if !KNOWN_PARAM_TYPES.contains(&kind) {
                issues.push(ValidationIssue::new(
                    format!("url.params.{name}"),
                    "UnknownType",
                    format!("{kind} is not a valid type for param {name}, expected one of {KNOWN_PARAM_TYPES:?}"),
                ));
            }
        }
    }

    let mut wildcards = BTreeSet::new();
    for path in &url.paths {
        match Template::parse(path) {
            Ok(template) => wildcards.extend(template.wildcard_names().map(str::to_owned)),
            Err(e) => issues.push(ValidationIssue::new(
                format!("url.paths[{path}]"),
                "InvalidTemplate",
                e.to_string(),
            )),
        }
    }

    for (name, meta) in url.parts.iter().flatten() {
        if !wildcards.contains(name) {
            issues.push(ValidationIssue::new(
                format!("url.parts.{name}"),
                "UnknownPart",
                format!("{name} is not a valid part"),
            ));
        }
        if let Some(kind) = meta.kind.as_deref() {
            if !KNOWN_PART_TYPES.contains(&kind) {
                issues.push(ValidationIssue::new(
                    format!("url.parts.{name}"),
                    "UnknownType",
                    format!("{kind} is not a valid type for part {name}, expected one of {KNOWN_PART_TYPES:?}"),
                ));
            }
        }
    }
}

/// Compile failures are reported through `ApiError::Validation`; this keeps the
/// conversion in one place for callers compiling schemas outside the validator.
impl From<SchemaCompileError> for ApiError {
    fn from(e: SchemaCompileError) -> Self {
        ApiError::from_issues(
            vec![ValidationIssue::new(
                format!("commands.{}", e.command),
                "InvalidSchema",
                e.to_string(),
            )],
            Some(e),
        )
    }
}
