use crate::error::SchemaCompileError;
use crate::spec::ApiSpecification;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Compiled JSON schema of one command.
#[derive(Clone)]
pub struct CommandSchema {
    validator: Arc<jsonschema::Validator>,
}

impl fmt::Debug for CommandSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSchema").finish_non_exhaustive()
    }
}

impl CommandSchema {
    /// # Errors
    ///
    /// `SchemaCompileError` if `schema` is not a valid JSON schema.
    pub fn compile(command: &str, schema: &Value) -> Result<Self, SchemaCompileError> {
        let validator = jsonschema::validator_for(schema).map_err(|e| SchemaCompileError {
            command: command.to_owned(),
            message: e.to_string(),
        })?;
        Ok(Self {
            validator: Arc::new(validator),
        })
    }

    /// Every violation of the schema by `data`, empty when valid.
    #[must_use]
    pub fn validate(&self, data: &Value) -> Vec<String> {
        self.validator
            .iter_errors(data)
            .map(|e| e.to_string())
            .collect()
    }
}

/// Compiled schemas of every command in a spec, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct CompiledSchemas {
    schemas: Vec<(String, CommandSchema)>,
}

impl CompiledSchemas {
    /// Compile every `commands` entry of `spec`.
    ///
    /// # Errors
    ///
    /// The first schema that fails to compile.
    pub fn compile(spec: &ApiSpecification) -> Result<Self, SchemaCompileError> {
        let mut schemas = Vec::new();
        for (name, schema) in spec.commands.iter().flatten() {
            schemas.push((name.clone(), CommandSchema::compile(name, schema)?));
        }
        Ok(Self { schemas })
    }

    #[must_use]
    pub fn get(&self, command: &str) -> Option<&CommandSchema> {
        self.schemas
            .iter()
            .find(|(name, _)| name == command)
            .map(|(_, schema)| schema)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.schemas.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
