#![allow(dead_code)]

use apireg::api::{
    ApiRequest, ApiResponse, AuthorizationContext, LazyHandler, PermissionName, RequestHandler,
};
use apireg::spec::{MemorySpecSource, SpecLoader};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Writes `(file name, contents)` pairs into a fresh directory.
pub fn spec_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

pub fn memory_loader(docs: &[(&str, &str)]) -> Arc<SpecLoader> {
    let source = docs
        .iter()
        .fold(MemorySpecSource::new(), |src, (name, json)| src.with(*name, *json));
    Arc::new(SpecLoader::new(source))
}

pub const THINGS_SPEC: &str = r#"{
    "methods": ["GET"],
    "url": { "paths": ["/things/{id}"] },
    "commands": {}
}"#;

pub const FIELDS_SPEC: &str = r#"{
    "documentation": "https://example.org/fields",
    "methods": ["POST"],
    "url": {
        "paths": ["/c/{collection}/schema"],
        "parts": { "collection": { "type": "string" } },
        "params": { "wt": { "type": "string" } }
    },
    "commands": {
        "add-field": {
            "type": "object",
            "properties": { "name": { "type": "string" }, "stored": { "type": "boolean" } },
            "required": ["name"]
        },
        "delete-field": {
            "type": "object",
            "properties": { "name": { "type": "string" } },
            "required": ["name"]
        }
    }
}"#;

/// Records what it was called with and optionally names a permission.
pub struct EchoHandler {
    pub permission: Option<&'static str>,
    pub calls: AtomicUsize,
}

impl EchoHandler {
    pub fn new(permission: Option<&'static str>) -> Self {
        Self {
            permission,
            calls: AtomicUsize::new(0),
        }
    }
}

impl RequestHandler for EchoHandler {
    fn handle_request(&self, req: &ApiRequest, rsp: &mut ApiResponse) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        rsp.add("path", json!(req.path));
        rsp.add(
            "parts",
            json!(req
                .parts
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<std::collections::BTreeMap<_, _>>()),
        );
        Ok(())
    }

    fn permission_name(&self, _ctx: &AuthorizationContext) -> Option<PermissionName> {
        self.permission.map(PermissionName::new)
    }

    fn name(&self) -> &str {
        "EchoHandler"
    }
}

/// Lazy handle that counts instantiations and takes `delay` to instantiate.
pub struct CountingHolder {
    pub instantiations: AtomicUsize,
    pub delay: Duration,
    pub handler: Arc<EchoHandler>,
}

impl CountingHolder {
    pub fn new(delay: Duration) -> Self {
        Self {
            instantiations: AtomicUsize::new(0),
            delay,
            handler: Arc::new(EchoHandler::new(Some("lazy-perm"))),
        }
    }

    pub fn count(&self) -> usize {
        self.instantiations.load(Ordering::SeqCst)
    }
}

impl LazyHandler for CountingHolder {
    fn is_loaded(&self) -> bool {
        self.count() > 0
    }

    fn get(&self) -> anyhow::Result<Arc<dyn RequestHandler>> {
        self.instantiations.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        Ok(Arc::clone(&self.handler) as Arc<dyn RequestHandler>)
    }
}
