//! # Spec Module
//!
//! Loading, include resolution and structural validation of endpoint specifications.
//!
//! A spec document names the verbs an endpoint answers, its path templates, the
//! types of its path parts and query params, and a JSON schema per command it accepts:
//!
//! ```json
//! {
//!   "methods": ["GET", "POST"],
//!   "url": {
//!     "paths": ["/things/{id}"],
//!     "parts": { "id": { "type": "string" } },
//!     "params": { "wt": { "type": "string" } }
//!   },
//!   "commands": {
//!     "touch": { "#include": "things.touch" }
//!   }
//! }
//! ```
//!
//! [`SpecLoader`] reads documents by name and merges `#include` fragments one level
//! deep; [`SpecValidator`] rejects anything structurally wrong before registration.

mod load;
mod types;
mod validate;

pub use load::*;
pub use types::*;
pub use validate::SpecValidator;
