#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use apireg::cli::{run_cli, Cli};
use clap::Parser;
use common::{spec_dir, FIELDS_SPEC};
use serde_json::Value;

fn run(args: &[&str]) -> anyhow::Result<String> {
    let mut argv = vec!["apireg"];
    argv.extend_from_slice(args);
    run_cli(Cli::try_parse_from(argv)?)
}

#[test]
fn test_validate_from_spec_dir() {
    let dir = spec_dir(&[
        ("fields.json", FIELDS_SPEC),
        ("bad.yaml", "methods: [GET]\nurl:\n  paths: [/a]\n  parts:\n    id: { type: string }\n"),
    ]);
    let root = dir.path().to_str().unwrap();

    let out = run(&["validate", "--spec-dir", root, "--name", "fields"]).unwrap();
    assert_eq!(out, "fields: OK (1 methods, 1 paths, 2 commands)");

    let err = run(&["validate", "--spec-dir", root, "--name", "bad"]).unwrap_err();
    assert!(err.to_string().contains("id is not a valid part"));
}

#[test]
fn test_introspect_and_route_from_spec_dir() {
    let dir = spec_dir(&[("fields.json", FIELDS_SPEC)]);
    let root = dir.path().to_str().unwrap();

    let out = run(&["introspect", "--spec-dir", root, "--name", "fields", "--command", "add-field"]).unwrap();
    let v: Value = serde_json::from_str(&out).unwrap();
    assert!(v["spec"][0]["commands"]["add-field"].is_object());
    assert!(v["spec"][0]["commands"].get("delete-field").is_none());

    let out = run(&[
        "route", "--spec-dir", root, "--name", "fields", "--method", "post", "--path", "/c/films/schema",
    ])
    .unwrap();
    let v: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(v["method"], "POST");
    assert_eq!(v["parts"]["collection"], "films");
}
