use super::operation::{CommandErrorReport, CommandOperation, CommandParser, JsonCommandParser};
use super::schema::CompiledSchemas;
use crate::error::ApiError;
use std::sync::Arc;
use tracing::{debug, warn};

/// Parses a batch of commands and checks each one against its schema.
///
/// Validation never stops at the first failing command: every operation is
/// checked and all failures are returned in one [`ApiError::BadRequest`].
#[derive(Clone)]
pub struct CommandValidationPipeline {
    parser: Arc<dyn CommandParser>,
    enabled: bool,
}

impl Default for CommandValidationPipeline {
    fn default() -> Self {
        Self::new(true)
    }
}

impl std::fmt::Debug for CommandValidationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandValidationPipeline")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl CommandValidationPipeline {
    /// Pipeline using the JSON payload parser.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            parser: Arc::new(JsonCommandParser),
            enabled,
        }
    }

    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn CommandParser>) -> Self {
        self.parser = parser;
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// # Errors
    ///
    /// `ApiError::BadRequest` if the payload cannot be parsed.
    pub fn parse(&self, payload: &str) -> Result<Vec<CommandOperation>, ApiError> {
        self.parser.parse(payload).map_err(|e| {
            debug!(error = %e, "Malformed command payload");
            ApiError::bad_request(format!("malformed command payload: {e}"))
        })
    }

    /// Check every operation against `schemas`.
    ///
    /// When validation is disabled or there are no schemas the operations are
    /// returned as given. Otherwise the returned operations are copies; the
    /// input is never modified.
    ///
    /// # Errors
    ///
    /// `ApiError::BadRequest` carrying one report entry per failing operation.
    pub fn validate(
        &self,
        operations: &[CommandOperation],
        schemas: Option<&CompiledSchemas>,
    ) -> Result<Vec<CommandOperation>, ApiError> {
        let schemas = match schemas {
            Some(s) if self.enabled && !s.is_empty() => s,
            _ => return Ok(operations.to_vec()),
        };

        let mut checked = operations.to_vec();
        for op in &mut checked {
            match schemas.get(&op.name) {
                None => {
                    let message = format!(
                        "Unknown operation '{}' available ops are '[{}]'",
                        op.name,
                        schemas.names().join(", ")
                    );
                    op.add_error(message);
                }
                Some(schema) => {
                    for message in schema.validate(&op.data) {
                        op.add_error(message);
                    }
                }
            }
        }

        let errors: Vec<CommandErrorReport> =
            checked.iter().filter_map(CommandOperation::error_report).collect();
        if errors.is_empty() {
            return Ok(checked);
        }

        warn!(
            operations = checked.len(),
            failing = errors.len(),
            "Command payload failed validation"
        );
        Err(ApiError::BadRequest {
            message: "Error in command payload".to_owned(),
            errors,
        })
    }

    /// `parse` followed by `validate`.
    ///
    /// # Errors
    ///
    /// See [`CommandValidationPipeline::parse`] and [`CommandValidationPipeline::validate`].
    pub fn run(
        &self,
        payload: &str,
        schemas: Option<&CompiledSchemas>,
    ) -> Result<Vec<CommandOperation>, ApiError> {
        let operations = self.parse(payload)?;
        self.validate(&operations, schemas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ApiSpecification;
    use serde_json::json;

    fn schemas() -> CompiledSchemas {
        let spec: ApiSpecification = serde_json::from_value(json!({
            "methods": ["POST"],
            "url": { "paths": ["/c"] },
            "commands": {
                "add": {
                    "type": "object",
                    "properties": { "id": { "type": "string" } },
                    "required": ["id"]
                },
                "delete": { "type": "string" }
            }
        }))
        .unwrap();
        CompiledSchemas::compile(&spec).unwrap()
    }

    #[test]
    fn valid_batch_passes_through() {
        let ops = CommandValidationPipeline::new(true)
            .run(r#"{ "add": {"id": "a"}, "delete": "b" }"#, Some(&schemas()))
            .unwrap();
        assert_eq!(ops.len(), 2);
        assert!(ops.iter().all(|o| !o.has_errors()));
    }

    #[test]
    fn collects_every_failing_command() {
        let err = CommandValidationPipeline::new(true)
            .run(
                r#"{ "add": {"id": 5}, "frobnicate": {}, "delete": "ok" }"#,
                Some(&schemas()),
            )
            .unwrap_err();

        let report = err.command_errors();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].name, "add");
        assert_eq!(report[1].name, "frobnicate");
        assert_eq!(
            report[1].error_messages,
            vec!["Unknown operation 'frobnicate' available ops are '[add, delete]'"]
        );
    }

    #[test]
    fn disabled_or_schemaless_skips_validation() {
        let payload = r#"{ "anything": 1 }"#;
        let s = schemas();
        assert_eq!(
            CommandValidationPipeline::new(false).run(payload, Some(&s)).unwrap().len(),
            1
        );
        assert_eq!(
            CommandValidationPipeline::new(true).run(payload, None).unwrap().len(),
            1
        );
        assert_eq!(
            CommandValidationPipeline::new(true)
                .run(payload, Some(&CompiledSchemas::default()))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn input_operations_are_not_modified() {
        let pipeline = CommandValidationPipeline::new(true);
        let ops = pipeline.parse(r#"{ "add": {} }"#).unwrap();
        assert!(pipeline.validate(&ops, Some(&schemas())).is_err());
        assert!(!ops[0].has_errors());
    }

    #[test]
    fn malformed_payload_is_a_bad_request() {
        let err = CommandValidationPipeline::new(true).parse("not json").unwrap_err();
        assert_eq!(err.status(), http::StatusCode::BAD_REQUEST);
        assert!(err.command_errors().is_empty());
    }
}
