use super::types::{ApiSpecification, PluginInfo, SpecProvider, INCLUDE_KEY};
use crate::error::ApiError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};

/// Name of the spec used by plugins that declare none.
pub const EMPTY_SPEC_NAME: &str = "emptySpec";

const EMPTY_SPEC_DOCUMENT: &str = r#"{"methods":["GET","POST"],"url":{"paths":["$handlerName"]}}"#;

/// Storage that spec documents are read from by name.
pub trait SpecSource: Send + Sync {
    /// Raw text of the named document, `None` if it does not exist.
    fn read(&self, name: &str) -> anyhow::Result<Option<SpecDocument>>;

    /// Where documents come from, for log and error messages.
    fn describe(&self) -> String;
}

/// Raw document text plus the syntax it is written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDocument {
    pub text: String,
    pub yaml: bool,
}

impl SpecDocument {
    pub fn json(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            yaml: false,
        }
    }

    pub fn yaml(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            yaml: true,
        }
    }

    fn parse(&self) -> anyhow::Result<Value> {
        let value = if self.yaml {
            serde_yaml::from_str(&self.text)?
        } else {
            serde_json::from_str(&self.text)?
        };
        Ok(value)
    }
}

/// Reads `<root>/<name>.json`, falling back to `.yaml` then `.yml`.
#[derive(Debug, Clone)]
pub struct DirSpecSource {
    root: PathBuf,
}

impl DirSpecSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SpecSource for DirSpecSource {
    fn read(&self, name: &str) -> anyhow::Result<Option<SpecDocument>> {
        for ext in ["json", "yaml", "yml"] {
            let path = self.root.join(format!("{name}.{ext}"));
            if path.is_file() {
                let text = std::fs::read_to_string(&path)?;
                return Ok(Some(SpecDocument {
                    text,
                    yaml: ext != "json",
                }));
            }
        }
        Ok(None)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Named documents held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySpecSource {
    docs: HashMap<String, SpecDocument>,
}

impl MemorySpecSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a JSON document.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, json: impl Into<String>) -> Self {
        self.docs.insert(name.into(), SpecDocument::json(json));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, doc: SpecDocument) {
        self.docs.insert(name.into(), doc);
    }
}

impl SpecSource for MemorySpecSource {
    fn read(&self, name: &str) -> anyhow::Result<Option<SpecDocument>> {
        Ok(self.docs.get(name).cloned())
    }

    fn describe(&self) -> String {
        format!("memory({} documents)", self.docs.len())
    }
}

/// Resolves named spec documents and their command includes.
pub struct SpecLoader {
    source: Box<dyn SpecSource>,
}

impl fmt::Debug for SpecLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecLoader")
            .field("source", &self.source.describe())
            .finish()
    }
}

impl SpecLoader {
    pub fn new(source: impl SpecSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Loader over a directory of `<name>.json` / `<name>.yaml` documents.
    pub fn from_dir(root: impl Into<PathBuf>) -> Self {
        Self::new(DirSpecSource::new(root))
    }

    /// Read and parse the named document as raw JSON.
    ///
    /// # Errors
    ///
    /// `ApiError::Configuration` if the document is absent, unreadable, not valid
    /// JSON/YAML, or empty.
    pub fn load_document(&self, name: &str) -> Result<Value, ApiError> {
        let doc = match self.source.read(name) {
            Ok(Some(doc)) => doc,
            Ok(None) if name == EMPTY_SPEC_NAME => SpecDocument::json(EMPTY_SPEC_DOCUMENT),
            Ok(None) => {
                return Err(ApiError::configuration(format!(
                    "invalid API spec: {name} (not found in {})",
                    self.source.describe()
                )))
            }
            Err(e) => {
                error!(spec = %name, error = %e, "Unable to read API spec");
                return Err(ApiError::configuration(format!(
                    "unable to read API spec {name}: {e}"
                )));
            }
        };

        let value = doc.parse().map_err(|e| {
            error!(spec = %name, error = %e, "Error in JSON of API spec");
            ApiError::configuration(format!("error in API spec {name}: {e}"))
        })?;
        if value.is_null() {
            return Err(ApiError::configuration(format!("empty value for {name}")));
        }
        Ok(value)
    }

    /// Load the named spec without resolving includes.
    ///
    /// # Errors
    ///
    /// `ApiError::Configuration` if the document cannot be loaded or does not have
    /// the shape of a spec.
    pub fn load(&self, name: &str) -> Result<ApiSpecification, ApiError> {
        let value = self.load_document(name)?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::configuration(format!("malformed API spec {name}: {e}")))
    }

    /// Merge every `#include` command fragment into its command entry.
    ///
    /// Fragment fields win on key conflicts, local-only fields are kept, and the
    /// marker is dropped. Only one level is resolved: fragments are taken as-is.
    ///
    /// # Errors
    ///
    /// `ApiError::Configuration` if a fragment is missing or is not an object.
    pub fn resolve_includes(&self, spec: &ApiSpecification) -> Result<ApiSpecification, ApiError> {
        let Some(commands) = spec.commands.as_ref() else {
            return Ok(spec.clone());
        };

        let mut resolved = commands.clone();
        for (command, entry) in resolved.iter_mut() {
            let Some(local) = entry.as_object() else {
                continue;
            };
            let Some(include) = local.get(INCLUDE_KEY).and_then(Value::as_str) else {
                continue;
            };

            let fragment = match self.load_document(include)? {
                Value::Object(map) => map,
                _ => {
                    return Err(ApiError::configuration(format!(
                        "included spec {include} for command {command} is not an object"
                    )))
                }
            };
            debug!(command = %command, include = %include, "Resolved command include");

            let mut merged: Map<String, Value> = local.clone();
            merged.remove(INCLUDE_KEY);
            merged.extend(fragment);
            *entry = Value::Object(merged);
        }

        Ok(ApiSpecification {
            commands: Some(resolved),
            ..spec.clone()
        })
    }

    /// `load` followed by `resolve_includes`, frozen behind an `Arc`.
    ///
    /// # Errors
    ///
    /// See [`SpecLoader::load`] and [`SpecLoader::resolve_includes`].
    pub fn get_spec(&self, name: &str) -> Result<Arc<ApiSpecification>, ApiError> {
        let spec = self.load(name)?;
        Ok(Arc::new(self.resolve_includes(&spec)?))
    }
}

impl SpecProvider {
    /// Provider for a named spec.
    pub fn named(loader: &Arc<SpecLoader>, name: impl Into<String>) -> Self {
        SpecProvider::Named {
            loader: Arc::clone(loader),
            name: name.into(),
        }
    }

    pub fn inline(spec: ApiSpecification) -> Self {
        SpecProvider::Inline(Arc::new(spec))
    }

    /// Produce the spec this provider stands for.
    ///
    /// # Errors
    ///
    /// `ApiError::Configuration` when a named spec cannot be loaded.
    pub fn resolve(&self) -> Result<Arc<ApiSpecification>, ApiError> {
        match self {
            SpecProvider::Empty => Ok(Arc::new(ApiSpecification::empty())),
            SpecProvider::Inline(spec) => Ok(Arc::clone(spec)),
            SpecProvider::Named { loader, name } => loader.get_spec(name),
        }
    }
}

/// Spec provider for a plugin: its `spec` attribute names a document or holds
/// one inline; without it the built-in `emptySpec` is used.
///
/// # Errors
///
/// `ApiError::Configuration` if the attribute is neither a string nor a spec object.
pub fn construct_spec(
    loader: &Arc<SpecLoader>,
    plugin: &PluginInfo,
) -> Result<SpecProvider, ApiError> {
    match &plugin.spec {
        None => Ok(SpecProvider::named(loader, EMPTY_SPEC_NAME)),
        Some(Value::String(name)) => Ok(SpecProvider::named(loader, name.as_str())),
        Some(inline @ Value::Object(_)) => serde_json::from_value(inline.clone())
            .map(SpecProvider::inline)
            .map_err(|e| {
                ApiError::configuration(format!(
                    "malformed inline spec for plugin {}: {e}",
                    plugin.name
                ))
            }),
        Some(other) => Err(ApiError::configuration(format!(
            "spec attribute of plugin {} must be a name or an object, got {other}",
            plugin.name
        ))),
    }
}
