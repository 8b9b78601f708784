//! # Command Module
//!
//! Batched JSON commands: a request body such as
//!
//! ```json
//! { "add-field": { "name": "title", "type": "string" }, "delete-field": { "name": "old" } }
//! ```
//!
//! is parsed into [`CommandOperation`]s and each one is checked against the schema
//! its endpoint declares under `commands`. All failing operations are reported
//! together, so a client fixes every problem from one round trip.

mod operation;
mod pipeline;
mod schema;

pub use operation::{
    CommandErrorReport, CommandOperation, CommandParser, JsonCommandParser,
};
pub use pipeline::CommandValidationPipeline;
pub use schema::{CommandSchema, CompiledSchemas};
