//! Dispatcher core - request path from `(method, path)` to a JSON response.

use crate::api::{ApiRequest, ApiResponse, ParamVec};
use crate::command::{CommandParser, CommandValidationPipeline};
use crate::error::ApiError;
use crate::ids::RequestId;
use crate::registry::ApiRegistry;
use crate::runtime_config::RuntimeConfig;
use http::{Method, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info_span, warn};

/// Outcome of one dispatched request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchResponse {
    #[serde(serialize_with = "serialize_status")]
    pub status: StatusCode,
    pub body: Value,
    pub request_id: RequestId,
}

fn serialize_status<S: serde::Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u16(status.as_u16())
}

impl DispatchResponse {
    fn ok(body: Value, request_id: RequestId) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            request_id,
        }
    }

    fn not_found(method: &Method, path: &str, request_id: RequestId) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: json!({
                "error": "No API found",
                "method": method.as_str(),
                "path": path,
            }),
            request_id,
        }
    }

    fn error(err: &ApiError, request_id: RequestId) -> Self {
        Self {
            status: err.status(),
            body: err.to_json(),
            request_id,
        }
    }
}

/// Resolves requests against an [`ApiRegistry`] and calls the matched implementation.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ApiRegistry>,
    pipeline: CommandValidationPipeline,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: Arc<ApiRegistry>) -> Self {
        Self {
            registry,
            pipeline: CommandValidationPipeline::default(),
        }
    }

    #[must_use]
    pub fn from_config(registry: Arc<ApiRegistry>, config: &RuntimeConfig) -> Self {
        Self::new(registry).with_validate_commands(config.validate_commands)
    }

    #[must_use]
    pub fn with_validate_commands(mut self, enabled: bool) -> Self {
        self.pipeline = self.pipeline.with_enabled(enabled);
        self
    }

    /// Parser for command payloads, handed to every request. Defaults to JSON.
    #[must_use]
    pub fn with_command_parser(mut self, parser: Arc<dyn CommandParser>) -> Self {
        self.pipeline = self.pipeline.with_parser(parser);
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ApiRegistry> {
        &self.registry
    }

    /// Dispatch one request.
    ///
    /// `query` is the raw query string without the leading `?`. A path with no
    /// implementation yields a 404 response, never an error.
    pub fn dispatch(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
        body: Option<&str>,
    ) -> DispatchResponse {
        self.dispatch_with_request_id(method, path, query, body, None)
    }

    /// Like [`Dispatcher::dispatch`], reusing an inbound request id when it is a valid ULID.
    pub fn dispatch_with_request_id(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
        body: Option<&str>,
        request_id: Option<&str>,
    ) -> DispatchResponse {
        let request_id = RequestId::from_str_or_new(request_id);
        let span = info_span!("dispatch", request_id = %request_id, method = %method, path = %path);
        let _entered = span.enter();
        let start = Instant::now();

        let Some(matched) = self.registry.lookup(path, Some(method)) else {
            debug!("No API bound to path");
            return DispatchResponse::not_found(method, path, request_id);
        };

        let schemas = match matched.value.command_schemas() {
            Ok(schemas) => schemas,
            Err(e) => {
                error!(api = %matched.value.describe(), error = %e, "Command schemas unavailable");
                return DispatchResponse::error(&e, request_id);
            }
        };

        let mut req = ApiRequest::new(method.clone(), path)
            .with_request_id(request_id)
            .with_parts(matched.parts)
            .with_schemas(Some(schemas))
            .with_pipeline(self.pipeline.clone());
        req.params = parse_query(query);
        req.body = body.map(str::to_owned);

        let mut rsp = ApiResponse::new();
        let result = matched.value.call(&req, &mut rsp);
        let elapsed_us = start.elapsed().as_micros();

        match result {
            Ok(()) => {
                debug!(api = %matched.value.describe(), elapsed_us, "Request served");
                DispatchResponse::ok(rsp.into_value(), request_id)
            }
            Err(e) if e.status().is_client_error() => {
                warn!(api = %matched.value.describe(), error = %e, elapsed_us, "Request rejected");
                DispatchResponse::error(&e, request_id)
            }
            Err(e) => {
                error!(api = %matched.value.describe(), error = %e, elapsed_us, "Request failed");
                DispatchResponse::error(&e, request_id)
            }
        }
    }
}

/// Decode a raw query string into ordered `(name, value)` pairs.
#[must_use]
pub fn parse_query(query: Option<&str>) -> ParamVec {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.trim_start_matches('?').as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_decoded_in_order() {
        let params = parse_query(Some("?command=add%20field&wt=json&wt=xml"));
        assert_eq!(
            params.as_slice(),
            &[
                ("command".to_owned(), "add field".to_owned()),
                ("wt".to_owned(), "json".to_owned()),
                ("wt".to_owned(), "xml".to_owned()),
            ]
        );
        assert!(parse_query(None).is_empty());
    }

    #[test]
    fn status_serializes_as_a_number() {
        let rsp = DispatchResponse::ok(json!({}), RequestId::new());
        let v = serde_json::to_value(&rsp).unwrap();
        assert_eq!(v["status"], 200);
    }
}
