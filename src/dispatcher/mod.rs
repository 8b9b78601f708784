//! # Dispatcher Module
//!
//! The contract with a surrounding server: given a method, a path, a query
//! string and an optional body, find the implementation, run it and return a
//! status plus a JSON body.
//!
//! ## Request Flow
//!
//! 1. The registry resolves `(method, path)` to an implementation and its captured parts
//! 2. The query string is decoded into parameters
//! 3. An [`ApiRequest`](crate::api::ApiRequest) is built carrying the parts, parameters,
//!    body and the implementation's compiled command schemas
//! 4. The implementation is called and its response values become the body
//!
//! ## Error Handling
//!
//! - No implementation: 404 with `{"error": "No API found", ...}`
//! - `ApiError::BadRequest`: 400 with every failing command under `details`
//! - Anything else: 500
//!
//! Each dispatch runs inside a `dispatch` tracing span carrying a ULID request id.

mod core;

pub use core::{parse_query, DispatchResponse, Dispatcher};
