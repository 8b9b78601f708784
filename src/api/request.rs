use crate::command::{CommandOperation, CommandValidationPipeline, CompiledSchemas};
use crate::error::ApiError;
use crate::ids::RequestId;
use crate::router::PartVec;
use http::Method;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Key of the accumulating introspection list on a response.
pub const SPEC_KEY: &str = "spec";

/// Query parameter selecting one command on an introspection request.
pub const COMMAND_PARAM: &str = "command";

/// Query parameters as decoded from the query string, in order.
pub type ParamVec = SmallVec<[(String, String); 8]>;

/// A request as seen by an implementation.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub request_id: RequestId,
    pub method: Method,
    pub path: String,
    /// Path parts captured by the template that matched
    pub parts: PartVec,
    pub params: ParamVec,
    pub body: Option<String>,
    schemas: Option<Arc<CompiledSchemas>>,
    pipeline: CommandValidationPipeline,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            parts: PartVec::new(),
            params: ParamVec::new(),
            body: None,
            schemas: None,
            pipeline: CommandValidationPipeline::default(),
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, id: RequestId) -> Self {
        self.request_id = id;
        self
    }

    #[must_use]
    pub fn with_parts(mut self, parts: PartVec) -> Self {
        self.parts = parts;
        self
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Schemas that [`ApiRequest::command_operations`] validates against.
    #[must_use]
    pub fn with_schemas(mut self, schemas: Option<Arc<CompiledSchemas>>) -> Self {
        self.schemas = schemas;
        self
    }

    #[must_use]
    pub fn with_validate_commands(mut self, enabled: bool) -> Self {
        self.pipeline = self.pipeline.with_enabled(enabled);
        self
    }

    /// Pipeline used by [`ApiRequest::command_operations`], including its payload parser.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: CommandValidationPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Path part by name.
    #[must_use]
    pub fn part(&self, name: &str) -> Option<&str> {
        self.parts
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Query parameter by name; the last occurrence wins.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The body parsed as a command batch and validated against the endpoint's schemas.
    ///
    /// # Errors
    ///
    /// `ApiError::BadRequest` for a missing or malformed body, or one entry per
    /// failing command.
    pub fn command_operations(&self) -> Result<Vec<CommandOperation>, ApiError> {
        let body = self
            .body
            .as_deref()
            .ok_or_else(|| ApiError::bad_request("missing command payload"))?;
        self.pipeline.run(body, self.schemas.as_deref())
    }
}

/// Values an implementation produces for a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiResponse {
    values: Map<String, Value>,
}

impl ApiResponse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any previous value.
    pub fn add(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Append to the `spec` list, creating it on first use.
    pub fn add_spec(&mut self, spec: Value) {
        let entry = self
            .values
            .entry(SPEC_KEY)
            .or_insert_with(|| Value::Array(Vec::new()));
        match entry {
            Value::Array(list) => list.push(spec),
            other => *other = Value::Array(vec![other.take(), spec]),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Entries of the `spec` list, empty if nothing was introspected.
    #[must_use]
    pub fn specs(&self) -> &[Value] {
        match self.values.get(SPEC_KEY) {
            Some(Value::Array(list)) => list,
            _ => &[],
        }
    }

    #[must_use]
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }
}

/// What an authorization check knows about a request.
#[derive(Debug, Clone)]
pub struct AuthorizationContext {
    pub method: Method,
    pub path: String,
    pub principal: Option<String>,
}

impl AuthorizationContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            principal: None,
        }
    }

    #[must_use]
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }
}

/// Permission a request needs, as named by the handler serving it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PermissionName(pub String);

impl PermissionName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PermissionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
