use super::core::{Api, SpecHandle};
use super::request::{ApiRequest, ApiResponse, COMMAND_PARAM};
use crate::error::ApiError;
use crate::spec::SpecProvider;
use std::sync::Arc;
use tracing::debug;

/// Read-only view of another implementation's spec, served at `<template>/_introspect`.
///
/// Declares an empty spec of its own. Each call appends one entry to the
/// response's `spec` list: the base spec, or a copy narrowed to the command
/// named by the `command` parameter.
pub struct IntrospectApi {
    spec: SpecHandle,
    base: Arc<Api>,
}

impl IntrospectApi {
    pub(crate) fn new(base: Arc<Api>) -> Self {
        Self {
            spec: SpecHandle::new(SpecProvider::Empty),
            base,
        }
    }

    pub(crate) fn spec_handle(&self) -> &SpecHandle {
        &self.spec
    }

    #[must_use]
    pub fn base(&self) -> &Arc<Api> {
        &self.base
    }

    pub(crate) fn call(&self, req: &ApiRequest, rsp: &mut ApiResponse) -> Result<(), ApiError> {
        let spec = self.base.resolve_specification()?;
        let view = match req.param(COMMAND_PARAM) {
            None => spec.to_value(),
            Some(command) => {
                debug!(command = %command, api = %self.base.describe(), "Introspecting one command");
                spec.with_single_command(command).to_value()
            }
        };
        rsp.add_spec(view);
        Ok(())
    }
}
