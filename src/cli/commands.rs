use crate::api::{Api, ApiRequest, ApiResponse, COMMAND_PARAM};
use crate::registry::ApiRegistry;
use crate::router::Substitutions;
use crate::runtime_config::DEFAULT_SPEC_DIR;
use crate::spec::{SpecLoader, SpecProvider, SpecValidator};
use anyhow::Context;
use clap::{Parser, Subcommand};
use http::Method;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line interface for apireg
///
/// Checks spec documents, prints their introspection view and shows how a
/// path is routed once a spec is registered.
#[derive(Parser, Debug)]
#[command(name = "apireg")]
#[command(about = "API spec registry tools", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load, resolve includes and validate a named spec
    Validate {
        /// Directory of spec documents
        #[arg(long, env = "APIREG_SPEC_DIR", default_value = DEFAULT_SPEC_DIR)]
        spec_dir: PathBuf,

        /// Spec name, without extension
        #[arg(short, long)]
        name: String,
    },
    /// Print the introspection output of a named spec
    Introspect {
        #[arg(long, env = "APIREG_SPEC_DIR", default_value = DEFAULT_SPEC_DIR)]
        spec_dir: PathBuf,

        #[arg(short, long)]
        name: String,

        /// Narrow the output to one command
        #[arg(short, long)]
        command: Option<String>,
    },
    /// Register a named spec and report how a path is routed
    Route {
        #[arg(long, env = "APIREG_SPEC_DIR", default_value = DEFAULT_SPEC_DIR)]
        spec_dir: PathBuf,

        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "GET")]
        method: String,

        #[arg(short, long)]
        path: String,

        /// Template substitution as key=value (repeatable)
        #[arg(long = "subst", value_parser = parse_substitution)]
        substitutions: Vec<(String, String)>,
    },
}

fn parse_substitution(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_owned(), v.to_owned())),
        _ => Err(format!("expected key=value, got {raw}")),
    }
}

/// Run a parsed command and return what it prints.
///
/// # Errors
///
/// Load, validation or registration failures of the named spec.
pub fn run_cli(cli: Cli) -> anyhow::Result<String> {
    match cli.command {
        Commands::Validate { spec_dir, name } => validate(SpecLoader::from_dir(spec_dir), &name),
        Commands::Introspect {
            spec_dir,
            name,
            command,
        } => introspect(
            Arc::new(SpecLoader::from_dir(spec_dir)),
            &name,
            command.as_deref(),
        ),
        Commands::Route {
            spec_dir,
            name,
            method,
            path,
            substitutions,
        } => {
            let method = Method::from_bytes(method.to_uppercase().as_bytes())
                .with_context(|| format!("invalid method {method}"))?;
            route(
                Arc::new(SpecLoader::from_dir(spec_dir)),
                &name,
                &method,
                &path,
                &substitutions.into_iter().collect(),
            )
        }
    }
}

pub(crate) fn validate(loader: SpecLoader, name: &str) -> anyhow::Result<String> {
    let spec = loader.get_spec(name)?;
    let schemas = SpecValidator::new().validate(&spec)?;
    Ok(format!(
        "{name}: OK ({} methods, {} paths, {} commands)",
        spec.methods.len(),
        spec.paths().len(),
        schemas.len()
    ))
}

pub(crate) fn introspect(
    loader: Arc<SpecLoader>,
    name: &str,
    command: Option<&str>,
) -> anyhow::Result<String> {
    let base = Arc::new(Api::direct(SpecProvider::named(&loader, name), |_, _| Ok(())));
    let view = Api::introspect(base);

    let mut req = ApiRequest::new(Method::GET, format!("/{name}/_introspect"));
    if let Some(command) = command {
        req = req.with_param(COMMAND_PARAM, command);
    }
    let mut rsp = ApiResponse::new();
    view.call(&req, &mut rsp)?;
    Ok(serde_json::to_string_pretty(&rsp.into_value())?)
}

pub(crate) fn route(
    loader: Arc<SpecLoader>,
    name: &str,
    method: &Method,
    path: &str,
    substitutions: &Substitutions,
) -> anyhow::Result<String> {
    let registry = ApiRegistry::new(Arc::clone(&loader));
    let api = Api::direct(SpecProvider::named(&loader, name), |_, _| Ok(()));
    registry.register(Arc::new(api), substitutions)?;

    let Some(m) = registry.lookup(path, Some(method)) else {
        return Ok(format!("no match for {method} {path}"));
    };
    let report = json!({
        "method": m.method.as_str(),
        "path": path,
        "api": m.value.kind(),
        "parts": m.parts_map(),
    });
    Ok(serde_json::to_string_pretty(&report)?)
}
