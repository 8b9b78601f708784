//! # Registry Module
//!
//! [`ApiRegistry`] owns the routing table and admits implementations into it.
//!
//! Registration of one implementation is transactional: its spec is resolved and
//! validated, every `(method, template)` binding and its `_introspect` sibling is
//! built, and only then are all bindings committed in one step. A failure at any
//! point leaves the table exactly as it was.
//!
//! ```rust
//! use apireg::api::Api;
//! use apireg::registry::ApiRegistry;
//! use apireg::router::Substitutions;
//! use apireg::spec::{MemorySpecSource, SpecLoader, SpecProvider};
//! use http::Method;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let loader = Arc::new(SpecLoader::new(MemorySpecSource::new().with(
//!     "things",
//!     r#"{ "methods": ["GET"], "url": { "paths": ["/things/{id}"] } }"#,
//! )));
//! let registry = ApiRegistry::new(Arc::clone(&loader));
//!
//! let api = Api::direct(SpecProvider::named(&loader, "things"), |req, rsp| {
//!     rsp.add("id", json!(req.part("id")));
//!     Ok(())
//! });
//! registry.register(Arc::new(api), &Substitutions::new()).unwrap();
//!
//! let m = registry.lookup("/things/42", Some(&Method::GET)).unwrap();
//! assert_eq!(m.part("id"), Some("42"));
//! assert!(registry.lookup("/things/42/_introspect", Some(&Method::GET)).is_some());
//! ```

use crate::api::{Api, AuthorizationContext, LazyHandler, PermissionName, RequestHandler};
use crate::error::{ApiError, ValidationIssue};
use crate::router::{RouteEntry, RouteMatch, RoutingTable, Substitutions, Template};
use crate::runtime_config::RuntimeConfig;
use crate::spec::{construct_spec, PluginInfo, SpecLoader, SpecProvider, SpecValidator};
use http::Method;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info};

/// Substitution key bound to a plugin's name by [`ApiRegistry::register_lazy`].
pub const HANDLER_NAME: &str = "handlerName";

/// Result of [`ApiRegistry::lookup`]: the implementation and the captured parts.
pub type ApiMatch = RouteMatch<Api>;

#[derive(Debug)]
pub struct ApiRegistry {
    routes: RoutingTable<Api>,
    loader: Arc<SpecLoader>,
    validator: SpecValidator,
    registering: Mutex<()>,
}

impl ApiRegistry {
    #[must_use]
    pub fn new(loader: Arc<SpecLoader>) -> Self {
        Self {
            routes: RoutingTable::new(),
            loader,
            validator: SpecValidator::new(),
            registering: Mutex::new(()),
        }
    }

    /// Registry reading named specs from `config.spec_dir`.
    #[must_use]
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(Arc::new(SpecLoader::from_dir(config.spec_dir.clone())))
    }

    #[must_use]
    pub fn loader(&self) -> &Arc<SpecLoader> {
        &self.loader
    }

    /// Validate `api`'s spec and bind every declared path under every declared method.
    ///
    /// Re-registering a `(method, template)` replaces the previous binding.
    ///
    /// # Errors
    ///
    /// `ApiError::Configuration` if the spec cannot be loaded, `ApiError::Validation`
    /// if it is structurally invalid or a template cannot be bound. Nothing is
    /// registered in either case.
    pub fn register(&self, api: Arc<Api>, substitutions: &Substitutions) -> Result<(), ApiError> {
        let _guard = self
            .registering
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match self.bind(&api, substitutions) {
            Ok(entries) => {
                let bindings = entries.len();
                self.routes.insert_all(entries);
                info!(api = %api.describe(), bindings, "API registered");
                Ok(())
            }
            Err(e) => {
                error!(
                    api = %api.describe(),
                    spec = %spec_dump(&api),
                    error = %e,
                    "Unable to register API"
                );
                Err(e)
            }
        }
    }

    fn bind(&self, api: &Arc<Api>, substitutions: &Substitutions) -> Result<Vec<RouteEntry<Api>>, ApiError> {
        let spec = api.resolve_specification()?;
        let schemas = self.validator.validate(&spec)?;
        api.spec_handle().prime_schemas(schemas);

        let introspect = Arc::new(Api::introspect(Arc::clone(api)));
        let mut entries = Vec::with_capacity(2 * spec.methods.len() * spec.paths().len());
        for name in &spec.methods {
            let method = Method::from_bytes(name.as_bytes()).map_err(|e| {
                ApiError::from_issues(
                    vec![ValidationIssue::new("methods", "UnsupportedMethod", e.to_string())],
                    None,
                )
            })?;
            for raw in spec.paths() {
                let template = Template::bind(raw, substitutions).map_err(|e| {
                    ApiError::from_issues(
                        vec![ValidationIssue::new("url.paths", "InvalidTemplate", e.to_string())],
                        None,
                    )
                })?;
                let sibling = template.introspect();
                entries.push(RouteEntry {
                    method: method.clone(),
                    template,
                    value: Arc::clone(api),
                });
                entries.push(RouteEntry {
                    method: method.clone(),
                    template: sibling,
                    value: Arc::clone(&introspect),
                });
            }
        }
        Ok(entries)
    }

    /// Register a plugin's lazily instantiated handler.
    ///
    /// The plugin's `spec` attribute selects the spec (see [`construct_spec`]) and
    /// its name is bound to `$handlerName` in the spec's templates.
    ///
    /// # Errors
    ///
    /// As for [`ApiRegistry::register`].
    pub fn register_lazy(
        &self,
        holder: Arc<dyn LazyHandler>,
        plugin: &PluginInfo,
    ) -> Result<Arc<Api>, ApiError> {
        let provider = construct_spec(&self.loader, plugin)?;
        let api = Arc::new(Api::lazy(provider, holder));
        let substitutions = Substitutions::from([(HANDLER_NAME.to_owned(), plugin.name.clone())]);
        self.register(Arc::clone(&api), &substitutions)?;
        Ok(api)
    }

    /// One handler adapter per named spec, all sharing `handler`. Not registered.
    #[must_use]
    pub fn wrap_request_handlers(
        &self,
        handler: &Arc<dyn RequestHandler>,
        spec_names: &[&str],
    ) -> Vec<Arc<Api>> {
        spec_names
            .iter()
            .map(|name| {
                Arc::new(Api::handler(
                    SpecProvider::named(&self.loader, *name),
                    Arc::clone(handler),
                ))
            })
            .collect()
    }

    /// Implementation bound to a template matching `path`.
    ///
    /// Without a method the per-method tables are searched in the order
    /// GET, POST, PUT, DELETE.
    #[must_use]
    pub fn lookup(&self, path: &str, method: Option<&Method>) -> Option<ApiMatch> {
        self.routes.lookup(path, method)
    }

    /// Permission the implementation at `(method, path)` requires.
    #[must_use]
    pub fn required_permission(
        &self,
        path: &str,
        method: &Method,
        ctx: &AuthorizationContext,
    ) -> Option<PermissionName> {
        self.lookup(path, Some(method))
            .and_then(|m| m.value.permission_name(ctx))
    }

    /// Templates bound under `method`, introspection siblings included.
    #[must_use]
    pub fn templates(&self, method: &Method) -> Vec<String> {
        self.routes.templates(method)
    }

    #[must_use]
    pub fn methods(&self) -> Vec<Method> {
        self.routes.methods()
    }
}

fn spec_dump(api: &Api) -> String {
    match api.resolve_specification() {
        Ok(spec) => spec.to_value().to_string(),
        Err(e) => format!("<unresolved: {e}>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ApiSpecification, MemorySpecSource};
    use serde_json::json;

    fn registry() -> ApiRegistry {
        ApiRegistry::new(Arc::new(SpecLoader::new(MemorySpecSource::new())))
    }

    fn inline(spec: serde_json::Value) -> Arc<Api> {
        let spec: ApiSpecification = serde_json::from_value(spec).unwrap();
        Arc::new(Api::direct(SpecProvider::inline(spec), |_, _| Ok(())))
    }

    #[test]
    fn failed_binding_commits_nothing() {
        let reg = registry();
        let api = inline(json!({
            "methods": ["GET", "POST"],
            "url": { "paths": ["/ok", "/$missing"] }
        }));

        let err = reg.register(api, &Substitutions::new()).unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
        assert!(reg.methods().is_empty());
        assert!(reg.lookup("/ok", None).is_none());
    }

    #[test]
    fn every_method_and_path_gets_a_sibling() {
        let reg = registry();
        let api = inline(json!({
            "methods": ["GET", "DELETE"],
            "url": { "paths": ["/a", "/b/{id}"] }
        }));
        reg.register(api, &Substitutions::new()).unwrap();

        for method in [Method::GET, Method::DELETE] {
            let mut templates = reg.templates(&method);
            templates.sort();
            assert_eq!(
                templates,
                vec!["/a", "/a/_introspect", "/b/{id}", "/b/{id}/_introspect"]
            );
        }
        let sibling = reg.lookup("/b/7/_introspect", Some(&Method::DELETE)).unwrap();
        assert_eq!(sibling.value.kind(), "IntrospectionAdapter");
        assert_eq!(sibling.part("id"), Some("7"));
    }

    #[test]
    fn invalid_spec_is_rejected_before_binding() {
        let reg = registry();
        let api = inline(json!({
            "methods": ["GET"],
            "url": { "paths": ["/things/{id}"], "parts": { "name": { "type": "string" } } }
        }));
        let err = reg.register(api, &Substitutions::new()).unwrap_err();
        assert!(err.to_string().contains("name is not a valid part"));
        assert!(reg.templates(&Method::GET).is_empty());
    }
}
