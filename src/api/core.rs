use super::request::{ApiRequest, ApiResponse, AuthorizationContext, PermissionName};
use crate::command::CompiledSchemas;
use crate::error::ApiError;
use crate::spec::{ApiSpecification, SpecProvider};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::introspect::IntrospectApi;

/// Business logic of a [`DirectApi`].
pub type DirectFn = dyn Fn(&ApiRequest, &mut ApiResponse) -> anyhow::Result<()> + Send + Sync;

/// A request handler built outside this crate and adapted into an [`Api`].
pub trait RequestHandler: Send + Sync {
    /// # Errors
    ///
    /// Whatever the handler's business logic reports.
    fn handle_request(&self, req: &ApiRequest, rsp: &mut ApiResponse) -> anyhow::Result<()>;

    /// Permission this request requires, `None` when no permission applies.
    fn permission_name(&self, _ctx: &AuthorizationContext) -> Option<PermissionName> {
        None
    }

    /// Identity used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Deferred handle to a handler that is instantiated on demand.
pub trait LazyHandler: Send + Sync {
    fn is_loaded(&self) -> bool;

    /// Instantiate (if needed) and return the handler.
    ///
    /// # Errors
    ///
    /// Instantiation failures.
    fn get(&self) -> anyhow::Result<Arc<dyn RequestHandler>>;
}

/// Spec of an implementation, resolved on first use and then cached.
pub struct SpecHandle {
    provider: SpecProvider,
    resolved: OnceCell<Arc<ApiSpecification>>,
    schemas: OnceCell<Arc<CompiledSchemas>>,
}

impl fmt::Debug for SpecHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecHandle")
            .field("provider", &self.provider)
            .field("resolved", &self.resolved.get().is_some())
            .finish_non_exhaustive()
    }
}

impl SpecHandle {
    #[must_use]
    pub fn new(provider: SpecProvider) -> Self {
        Self {
            provider,
            resolved: OnceCell::new(),
            schemas: OnceCell::new(),
        }
    }

    /// # Errors
    ///
    /// `ApiError::Configuration` when the provider cannot produce the spec.
    pub fn spec(&self) -> Result<Arc<ApiSpecification>, ApiError> {
        self.resolved
            .get_or_try_init(|| self.provider.resolve())
            .map(Arc::clone)
    }

    /// # Errors
    ///
    /// Spec resolution failures, or a command schema that does not compile.
    pub fn schemas(&self) -> Result<Arc<CompiledSchemas>, ApiError> {
        self.schemas
            .get_or_try_init(|| {
                let spec = self.spec()?;
                Ok::<_, ApiError>(Arc::new(CompiledSchemas::compile(&spec)?))
            })
            .map(Arc::clone)
    }

    /// Seed the schema cache with schemas compiled during validation.
    pub(crate) fn prime_schemas(&self, compiled: CompiledSchemas) {
        self.schemas.get_or_init(|| Arc::new(compiled));
    }
}

/// An implementation that owns its spec and runs a closure.
pub struct DirectApi {
    spec: SpecHandle,
    logic: Arc<DirectFn>,
}

/// A [`RequestHandler`] exposed under a spec of its own.
pub struct HandlerApi {
    spec: SpecHandle,
    handler: Arc<dyn RequestHandler>,
}

/// A handler that is instantiated on its first call.
///
/// The declared spec comes from the registration, not from the handler; the
/// handler itself runs behind a [`HandlerApi`] with an empty spec.
pub struct LazyApi {
    spec: SpecHandle,
    holder: Arc<dyn LazyHandler>,
    delegate: OnceCell<Arc<Api>>,
}

/// A dispatch target stored in the routing table.
pub enum Api {
    Direct(DirectApi),
    Handler(HandlerApi),
    Lazy(LazyApi),
    Introspect(IntrospectApi),
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Api").field(&self.describe()).finish()
    }
}

impl Api {
    pub fn direct<F>(spec: SpecProvider, logic: F) -> Self
    where
        F: Fn(&ApiRequest, &mut ApiResponse) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Api::Direct(DirectApi {
            spec: SpecHandle::new(spec),
            logic: Arc::new(logic),
        })
    }

    #[must_use]
    pub fn handler(spec: SpecProvider, handler: Arc<dyn RequestHandler>) -> Self {
        Api::Handler(HandlerApi {
            spec: SpecHandle::new(spec),
            handler,
        })
    }

    #[must_use]
    pub fn lazy(spec: SpecProvider, holder: Arc<dyn LazyHandler>) -> Self {
        Api::Lazy(LazyApi {
            spec: SpecHandle::new(spec),
            holder,
            delegate: OnceCell::new(),
        })
    }

    /// Introspection view of `base`.
    #[must_use]
    pub fn introspect(base: Arc<Api>) -> Self {
        Api::Introspect(IntrospectApi::new(base))
    }

    pub(crate) fn spec_handle(&self) -> &SpecHandle {
        match self {
            Api::Direct(api) => &api.spec,
            Api::Handler(api) => &api.spec,
            Api::Lazy(api) => &api.spec,
            Api::Introspect(api) => api.spec_handle(),
        }
    }

    /// The spec this implementation declares.
    ///
    /// # Errors
    ///
    /// `ApiError::Configuration` when a named spec cannot be loaded.
    pub fn resolve_specification(&self) -> Result<Arc<ApiSpecification>, ApiError> {
        self.spec_handle().spec()
    }

    /// Compiled schemas of the declared commands.
    ///
    /// # Errors
    ///
    /// Spec resolution failures, or a command schema that does not compile.
    pub fn command_schemas(&self) -> Result<Arc<CompiledSchemas>, ApiError> {
        self.spec_handle().schemas()
    }

    /// Serve one request.
    ///
    /// # Errors
    ///
    /// Errors raised by the business logic; typed [`ApiError`]s pass through
    /// unchanged and anything else becomes `ApiError::Internal`.
    pub fn call(&self, req: &ApiRequest, rsp: &mut ApiResponse) -> Result<(), ApiError> {
        match self {
            Api::Direct(api) => (api.logic)(req, rsp).map_err(ApiError::wrap),
            Api::Handler(api) => api.handler.handle_request(req, rsp).map_err(ApiError::wrap),
            Api::Lazy(api) => api.delegate()?.call(req, rsp),
            Api::Introspect(api) => api.call(req, rsp),
        }
    }

    /// Permission required to serve a request, `None` when none applies.
    #[must_use]
    pub fn permission_name(&self, ctx: &AuthorizationContext) -> Option<PermissionName> {
        match self {
            Api::Handler(api) => api.handler.permission_name(ctx),
            Api::Lazy(api) => api
                .delegate
                .get()
                .and_then(|delegate| delegate.permission_name(ctx)),
            Api::Direct(_) | Api::Introspect(_) => None,
        }
    }

    /// Variant name.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Api::Direct(_) => "Direct",
            Api::Handler(_) => "HandlerAdapter",
            Api::Lazy(_) => "LazyHandlerAdapter",
            Api::Introspect(_) => "IntrospectionAdapter",
        }
    }

    /// Identity used in logs, e.g. `HandlerAdapter(my_crate::Things)`.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Api::Handler(api) => format!("{}({})", self.kind(), api.handler.name()),
            Api::Introspect(api) => format!("{}({})", self.kind(), api.base().describe()),
            Api::Direct(_) | Api::Lazy(_) => self.kind().to_owned(),
        }
    }
}

impl LazyApi {
    /// The instantiated handler, created exactly once even under concurrent first calls.
    fn delegate(&self) -> Result<&Arc<Api>, ApiError> {
        self.delegate.get_or_try_init(|| {
            let was_loaded = self.holder.is_loaded();
            let handler = self.holder.get().map_err(ApiError::wrap)?;
            if was_loaded {
                debug!(handler = handler.name(), "Lazy handler already loaded");
            } else {
                info!(handler = handler.name(), "Lazy handler instantiated");
            }
            Ok(Arc::new(Api::handler(SpecProvider::Empty, handler)))
        })
    }

    #[must_use]
    pub fn is_instantiated(&self) -> bool {
        self.delegate.get().is_some()
    }
}
