//! # apireg
//!
//! **apireg** maps an incoming `(HTTP method, path)` pair to a pluggable
//! implementation, publishes a machine-readable contract for every mapping and
//! validates batched JSON commands against per-endpoint schemas before they reach
//! business logic.
//!
//! ## Architecture
//!
//! - **[`spec`]** - loading named spec documents, `#include` resolution and structural validation
//! - **[`router`]** - per-method routing tables over wildcard path templates
//! - **[`api`]** - the dispatch targets: direct, handler-adapting, lazy and introspective
//! - **[`command`]** - parsing and schema validation of batched command payloads
//! - **[`registry`]** - transactional registration and lookup
//! - **[`dispatcher`]** - request dispatch producing a status and a JSON body
//! - **[`cli`]** - the `apireg` command-line tools
//!
//! ### Registration Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant Registry as registry::ApiRegistry
//!     participant Loader as spec::SpecLoader
//!     participant Validator as spec::SpecValidator
//!     participant Table as router::RoutingTable
//!
//!     Caller->>Registry: register(api, substitutions)
//!     Registry->>Loader: resolve spec (load + #include)
//!     Loader-->>Registry: Arc<ApiSpecification>
//!     Registry->>Validator: validate(spec)
//!     Validator-->>Registry: CompiledSchemas
//!     Registry->>Registry: bind every (method, template)<br/>plus its _introspect sibling
//!     Registry->>Table: insert_all(entries)
//!     Table-->>Caller: one published snapshot
//! ```
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Server
//!     participant Dispatcher as dispatcher::Dispatcher
//!     participant Table as router::RoutingTable
//!     participant Api as api::Api
//!     participant Pipeline as command::CommandValidationPipeline
//!
//!     Server->>Dispatcher: dispatch(method, path, query, body)
//!     Dispatcher->>Table: lookup(path, method)
//!     Table-->>Dispatcher: Api + captured parts
//!     Dispatcher->>Api: call(request, response)
//!     Api->>Pipeline: request.command_operations()
//!     Pipeline-->>Api: operations or BadRequest with every failure
//!     Api-->>Dispatcher: response values
//!     Dispatcher-->>Server: status + JSON body
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use apireg::api::Api;
//! use apireg::dispatcher::Dispatcher;
//! use apireg::registry::ApiRegistry;
//! use apireg::router::Substitutions;
//! use apireg::spec::{MemorySpecSource, SpecLoader, SpecProvider};
//! use http::{Method, StatusCode};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let loader = Arc::new(SpecLoader::new(MemorySpecSource::new().with(
//!     "fields",
//!     r#"{
//!         "methods": ["POST"],
//!         "url": { "paths": ["/c/{collection}/schema"] },
//!         "commands": {
//!             "add-field": {
//!                 "type": "object",
//!                 "properties": { "name": { "type": "string" } },
//!                 "required": ["name"]
//!             }
//!         }
//!     }"#,
//! )));
//! let registry = Arc::new(ApiRegistry::new(Arc::clone(&loader)));
//!
//! let api = Api::direct(SpecProvider::named(&loader, "fields"), |req, rsp| {
//!     let ops = req.command_operations()?;
//!     rsp.add("applied", json!(ops.len()));
//!     Ok(())
//! });
//! registry.register(Arc::new(api), &Substitutions::new()).unwrap();
//!
//! let dispatcher = Dispatcher::new(Arc::clone(&registry));
//! let ok = dispatcher.dispatch(
//!     &Method::POST,
//!     "/c/books/schema",
//!     None,
//!     Some(r#"{ "add-field": { "name": "title" } }"#),
//! );
//! assert_eq!(ok.status, StatusCode::OK);
//! assert_eq!(ok.body["applied"], 1);
//!
//! let bad = dispatcher.dispatch(&Method::POST, "/c/books/schema", None, Some(r#"{ "add-field": {} }"#));
//! assert_eq!(bad.status, StatusCode::BAD_REQUEST);
//! ```
//!
//! ## Configuration
//!
//! | Variable | Default | Used by |
//! |----------|---------|---------|
//! | `APIREG_SPEC_DIR` | `apispec` | [`runtime_config`] |
//! | `APIREG_VALIDATE_COMMANDS` | `true` | [`runtime_config`] |
//! | `APIREG_LOG_LEVEL` / `APIREG_LOG_FORMAT` / `APIREG_LOG_TARGETS` | `info` / `json` / unset | [`logging`] |

pub mod api;
pub mod cli;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod registry;
pub mod router;
pub mod runtime_config;
pub mod spec;

pub use api::{Api, ApiRequest, ApiResponse, LazyHandler, RequestHandler};
pub use dispatcher::{DispatchResponse, Dispatcher};
pub use error::ApiError;
pub use registry::{ApiMatch, ApiRegistry};
pub use spec::{construct_spec, ApiSpecification, PluginInfo, SpecLoader, SpecProvider, SpecValidator};
