//! Unit tests for CLI commands

use super::commands::{introspect, route, validate};
use crate::cli::{Cli, Commands};
use crate::router::Substitutions;
use crate::spec::{MemorySpecSource, SpecLoader};
use clap::Parser;
use http::Method;
use serde_json::Value;
use std::sync::Arc;

fn loader() -> SpecLoader {
    SpecLoader::new(
        MemorySpecSource::new()
            .with(
                "things",
                r#"{
                    "methods": ["GET", "POST"],
                    "url": { "paths": ["/things/{id}", "/$handlerName"] },
                    "commands": { "touch": { "type": "object" }, "drop": { "type": "object" } }
                }"#,
            )
            .with("broken", r#"{ "methods": [], "url": { "paths": ["/b"] } }"#),
    )
}

#[test]
fn test_route_command_parses_substitutions() {
    let cli = Cli::try_parse_from([
        "apireg", "route", "--name", "things", "--path", "/x", "--subst", "handlerName=/x",
    ])
    .unwrap();

    match cli.command {
        Commands::Route {
            method,
            substitutions,
            ..
        } => {
            assert_eq!(method, "GET");
            assert_eq!(substitutions, vec![("handlerName".to_owned(), "/x".to_owned())]);
        }
        other => panic!("Expected Route command, got {other:?}"),
    }

    assert!(Cli::try_parse_from(["apireg", "route", "--name", "t", "--path", "/", "--subst", "novalue"]).is_err());
}

#[test]
fn test_validate_reports_summary_or_error() {
    assert_eq!(
        validate(loader(), "things").unwrap(),
        "things: OK (2 methods, 2 paths, 2 commands)"
    );
    assert!(validate(loader(), "broken").is_err());
    assert!(validate(loader(), "absent").is_err());
}

#[test]
fn test_introspect_narrows_to_command() {
    let out = introspect(Arc::new(loader()), "things", Some("touch")).unwrap();
    let v: Value = serde_json::from_str(&out).unwrap();
    let commands = v["spec"][0]["commands"].as_object().unwrap();
    assert_eq!(commands.keys().collect::<Vec<_>>(), vec!["touch"]);
}

#[test]
fn test_route_reports_parts() {
    let subs = Substitutions::from([("handlerName".to_owned(), "/plugin".to_owned())]);
    let out = route(Arc::new(loader()), "things", &Method::POST, "/things/42", &subs).unwrap();
    let v: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(v["parts"]["id"], "42");
    assert_eq!(v["api"], "Direct");

    let out = route(Arc::new(loader()), "things", &Method::GET, "/plugin", &subs).unwrap();
    assert!(out.contains("\"parts\""));

    let out = route(Arc::new(loader()), "things", &Method::GET, "/nothing/here/at/all", &subs).unwrap();
    assert_eq!(out, "no match for GET /nothing/here/at/all");

    assert!(route(Arc::new(loader()), "things", &Method::GET, "/plugin", &Substitutions::new()).is_err());
}
