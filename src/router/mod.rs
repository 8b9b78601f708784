//! # Router Module
//!
//! Per-method routing tables mapping path templates to implementations.
//!
//! ## Overview
//!
//! - [`Template`] parses `/things/{id}`-style templates, applying registration-time
//!   substitutions to `$key` segments and wildcard names
//! - [`PathTrie`] is the routing structure of a single method
//! - [`RoutingTable`] holds one trie per method behind a lock-free snapshot
//!
//! ## Matching
//!
//! A concrete path matches a template when both have the same number of non-empty
//! segments, every literal is equal byte for byte, and every wildcard captures one
//! segment. There are no optional or trailing segments. When several templates
//! could match, literals are preferred to wildcards at each position and otherwise
//! the one inserted first wins; this is an insertion-order dependency, not a
//! priority scheme.
//!
//! ```rust
//! use apireg::router::{RoutingTable, Template};
//! use http::Method;
//! use std::sync::Arc;
//!
//! let table = RoutingTable::new();
//! table.insert(Method::GET, Template::parse("/things/{id}").unwrap(), Arc::new("thing"));
//!
//! let m = table.lookup("/things/42", Some(&Method::GET)).unwrap();
//! assert_eq!(*m.value, "thing");
//! assert_eq!(m.part("id"), Some("42"));
//! ```

mod core;
mod template;
mod trie;

pub use core::{RouteEntry, RouteMatch, RoutingTable};
pub use template::{
    path_segments, wildcard_name, Segment, Substitutions, Template, TemplateError,
    INTROSPECT_SEGMENT,
};
pub use trie::{PartVec, PathTrie, MAX_INLINE_PARTS};
