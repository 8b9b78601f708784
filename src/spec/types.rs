use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Verbs an endpoint may declare, also the priority order for method-less lookups.
pub const SUPPORTED_METHODS: [&str; 4] = ["GET", "POST", "PUT", "DELETE"];

/// Types accepted for `url.params[*].type`.
pub const KNOWN_PARAM_TYPES: [&str; 6] = ["string", "boolean", "list", "int", "double", "object"];

/// Types accepted for `url.parts[*].type`.
pub const KNOWN_PART_TYPES: [&str; 5] = ["enum", "string", "int", "number", "boolean"];

/// Marker key of a command entry that pulls its body from another spec document.
pub const INCLUDE_KEY: &str = "#include";

/// Declarative contract of one endpoint.
///
/// Values are shared as `Arc<ApiSpecification>` once loaded, so nothing downstream
/// can mutate a spec another consumer is reading. Unknown top-level fields such as
/// `documentation` or `description` are kept in `extra` and survive introspection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiSpecification {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<UrlSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Command schemas by name, in document order
    pub commands: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlSpec {
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<BTreeMap<String, TypeMeta>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, TypeMeta>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Metadata of a path part or query param; only `type` is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeMeta {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiSpecification {
    /// The spec declared by implementations that have none of their own.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn paths(&self) -> &[String] {
        self.url.as_ref().map(|u| u.paths.as_slice()).unwrap_or_default()
    }

    #[must_use]
    pub fn command_names(&self) -> Vec<&str> {
        self.commands
            .iter()
            .flat_map(|c| c.keys())
            .map(String::as_str)
            .collect()
    }

    /// Copy of this spec whose `commands` keeps only `command` (empty if unknown).
    #[must_use]
    pub fn with_single_command(&self, command: &str) -> Self {
        let mut copy = self.clone();
        if let Some(commands) = copy.commands.as_mut() {
            commands.retain(|name, _| name == command);
        }
        copy
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// How an implementation obtains its spec.
#[derive(Debug, Clone)]
pub enum SpecProvider {
    /// [`ApiSpecification::empty`]
    Empty,
    /// A spec value supplied directly
    Inline(std::sync::Arc<ApiSpecification>),
    /// A named document resolved through a [`SpecLoader`](super::SpecLoader) on first use
    Named {
        loader: std::sync::Arc<super::SpecLoader>,
        name: String,
    },
}

/// Plugin registration data consumed by lazy registration.
#[derive(Debug, Clone, Default)]
pub struct PluginInfo {
    /// Plugin name; bound to `$handlerName` in templates
    pub name: String,
    /// Optional `spec` attribute: a spec name or an inline spec object
    pub spec: Option<Value>,
}

impl PluginInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spec: None,
        }
    }

    #[must_use]
    pub fn with_spec(mut self, spec: Value) -> Self {
        self.spec = Some(spec);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let raw = json!({
            "documentation": "https://example.org/things",
            "methods": ["GET"],
            "url": { "paths": ["/things/{id}"], "parts": { "id": { "type": "string", "description": "thing id" } } },
            "commands": {}
        });
        let spec: ApiSpecification = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(spec.to_value(), raw);
    }

    #[test]
    fn single_command_filter() {
        let spec: ApiSpecification = serde_json::from_value(json!({
            "methods": ["POST"],
            "url": { "paths": ["/c"] },
            "commands": { "foo": { "type": "object" }, "bar": { "type": "object" } }
        }))
        .unwrap();

        assert_eq!(spec.with_single_command("foo").command_names(), vec!["foo"]);
        assert!(spec.with_single_command("nope").command_names().is_empty());
        assert_eq!(spec.command_names(), vec!["foo", "bar"]);
    }
}
