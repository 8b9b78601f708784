use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One named operation of a batched command payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOperation {
    pub name: String,
    pub data: Value,
    errors: Vec<String>,
}

impl CommandOperation {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Report entry for this operation, `None` if it has no errors.
    #[must_use]
    pub fn error_report(&self) -> Option<CommandErrorReport> {
        self.has_errors().then(|| CommandErrorReport {
            name: self.name.clone(),
            data: self.data.clone(),
            error_messages: self.errors.clone(),
        })
    }
}

/// Structured entry of a batch validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandErrorReport {
    pub name: String,
    pub data: Value,
    #[serde(rename = "errorMessages")]
    pub error_messages: Vec<String>,
}

/// Turns a raw request body into named operations.
pub trait CommandParser: Send + Sync {
    /// # Errors
    ///
    /// Any failure to read the payload as a command batch.
    fn parse(&self, payload: &str) -> anyhow::Result<Vec<CommandOperation>>;
}

/// Parses a JSON object whose keys are command names.
///
/// Keys may repeat and keep their order. An array value expands to one
/// operation per element, so `{"add": [a, b]}` is the same as `{"add": a, "add": b}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCommandParser;

impl CommandParser for JsonCommandParser {
    fn parse(&self, payload: &str) -> anyhow::Result<Vec<CommandOperation>> {
        let batch: CommandBatch = serde_json::from_str(payload)?;
        Ok(batch.0)
    }
}

struct CommandBatch(Vec<CommandOperation>);

impl<'de> Deserialize<'de> for CommandBatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BatchVisitor;

        impl<'de> Visitor<'de> for BatchVisitor {
            type Value = CommandBatch;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object mapping command names to command data")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut ops = Vec::new();
                while let Some((name, data)) = map.next_entry::<String, Value>()? {
                    if name.is_empty() {
                        return Err(de::Error::custom("command name must not be empty"));
                    }
                    match data {
                        Value::Array(items) => ops.extend(
                            items
                                .into_iter()
                                .map(|item| CommandOperation::new(name.clone(), item)),
                        ),
                        other => ops.push(CommandOperation::new(name, other)),
                    }
                }
                Ok(CommandBatch(ops))
            }
        }

        deserializer.deserialize_map(BatchVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_duplicate_names_in_order() {
        let ops = JsonCommandParser
            .parse(r#"{ "add": {"id": 1}, "delete": "x", "add": {"id": 2} }"#)
            .unwrap();
        let names: Vec<&str> = ops.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["add", "delete", "add"]);
        assert_eq!(ops[2].data, json!({"id": 2}));
    }

    #[test]
    fn arrays_expand_to_one_operation_per_element() {
        let ops = JsonCommandParser
            .parse(r#"{ "add": [{"id": 1}, {"id": 2}] }"#)
            .unwrap();
        assert_eq!(ops.len(), 2);
        assert!(ops.iter().all(|o| o.name == "add"));
    }

    #[test]
    fn rejects_non_objects() {
        assert!(JsonCommandParser.parse("[1, 2]").is_err());
        assert!(JsonCommandParser.parse("{ broken").is_err());
        assert!(JsonCommandParser.parse(r#"{ "": 1 }"#).is_err());
    }

    #[test]
    fn error_report_shape() {
        let mut op = CommandOperation::new("add", json!({"id": 1}));
        assert!(op.error_report().is_none());
        op.add_error("id must be a string");
        let report = serde_json::to_value(op.error_report().unwrap()).unwrap();
        assert_eq!(
            report,
            json!({ "name": "add", "data": {"id": 1}, "errorMessages": ["id must be a string"] })
        );
    }
}
