//! # CLI Module
//!
//! Command-line tools over a directory of spec documents, available as the
//! `apireg` binary.
//!
//! ## Commands
//!
//! ### `validate`
//!
//! ```bash
//! apireg validate --spec-dir apispec --name things
//! ```
//!
//! Loads the spec, resolves `#include`s and runs every structural check.
//!
//! ### `introspect`
//!
//! ```bash
//! apireg introspect --name things --command touch
//! ```
//!
//! Prints what `<template>/_introspect` would answer.
//!
//! ### `route`
//!
//! ```bash
//! apireg route --name things --method GET --path /things/42 --subst handlerName=/things
//! ```
//!
//! Registers the spec and reports the matching implementation and captured parts.
//!
//! `--spec-dir` defaults to `APIREG_SPEC_DIR`, then `apispec`.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, Cli, Commands};
