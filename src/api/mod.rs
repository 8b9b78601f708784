//! # Api Module
//!
//! The dispatch targets stored in the routing table. [`Api`] is a closed set of
//! variants sharing two capabilities, resolving the declared spec and serving a call:
//!
//! - [`Api::direct`] owns its spec and runs a closure
//! - [`Api::handler`] adapts a [`RequestHandler`] and forwards its permission query
//! - [`Api::lazy`] instantiates a [`LazyHandler`] on its first call, exactly once
//! - [`Api::introspect`] answers with the spec of the implementation it wraps
//!
//! Specs are resolved on first use through a [`SpecHandle`] and shared as `Arc`s.

mod core;
mod introspect;
mod request;

pub use core::{Api, DirectApi, DirectFn, HandlerApi, LazyApi, LazyHandler, RequestHandler, SpecHandle};
pub use introspect::IntrospectApi;
pub use request::{
    ApiRequest, ApiResponse, AuthorizationContext, ParamVec, PermissionName, COMMAND_PARAM,
    SPEC_KEY,
};
