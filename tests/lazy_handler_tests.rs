#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use apireg::api::{Api, ApiRequest, ApiResponse, AuthorizationContext};
use apireg::registry::ApiRegistry;
use apireg::spec::PluginInfo;
use common::{memory_loader, CountingHolder};
use http::Method;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn test_concurrent_first_calls_instantiate_once() {
    let registry = ApiRegistry::new(memory_loader(&[]));
    let holder = Arc::new(CountingHolder::new(Duration::from_millis(50)));
    registry
        .register_lazy(Arc::clone(&holder) as _, &PluginInfo::new("/lazy"))
        .unwrap();

    let api: Arc<Api> = registry.lookup("/lazy", Some(&Method::GET)).unwrap().value;
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let api = Arc::clone(&api);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut rsp = ApiResponse::new();
                api.call(&ApiRequest::new(Method::GET, "/lazy"), &mut rsp)
                    .unwrap();
                rsp
            })
        })
        .collect();

    for h in handles {
        let rsp = h.join().unwrap();
        assert_eq!(rsp.get("path").unwrap(), "/lazy");
    }
    assert_eq!(holder.count(), 1);
    assert_eq!(holder.handler.calls.load(Ordering::SeqCst), threads);

    match api.as_ref() {
        Api::Lazy(lazy) => assert!(lazy.is_instantiated()),
        other => panic!("expected a lazy adapter, got {other:?}"),
    }
}

#[test]
fn test_permission_is_forwarded_once_instantiated() {
    let registry = ApiRegistry::new(memory_loader(&[]));
    let holder = Arc::new(CountingHolder::new(Duration::ZERO));
    let api = registry
        .register_lazy(Arc::clone(&holder) as _, &PluginInfo::new("/perm"))
        .unwrap();
    let ctx = AuthorizationContext::new(Method::POST, "/perm");

    assert!(api.permission_name(&ctx).is_none());
    assert_eq!(holder.count(), 0);

    api.call(&ApiRequest::new(Method::POST, "/perm"), &mut ApiResponse::new())
        .unwrap();
    assert_eq!(
        registry
            .required_permission("/perm", &Method::POST, &ctx)
            .unwrap()
            .as_str(),
        "lazy-perm"
    );
}

#[test]
fn test_failed_instantiation_is_retried() {
    struct Flaky {
        attempts: std::sync::atomic::AtomicUsize,
    }

    impl apireg::api::LazyHandler for Flaky {
        fn is_loaded(&self) -> bool {
            false
        }

        fn get(&self) -> anyhow::Result<Arc<dyn apireg::api::RequestHandler>> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                anyhow::bail!("plugin jar not ready");
            }
            Ok(Arc::new(common::EchoHandler::new(None)))
        }
    }

    let registry = ApiRegistry::new(memory_loader(&[]));
    let api = registry
        .register_lazy(
            Arc::new(Flaky {
                attempts: std::sync::atomic::AtomicUsize::new(0),
            }),
            &PluginInfo::new("/flaky"),
        )
        .unwrap();

    let req = ApiRequest::new(Method::GET, "/flaky");
    assert!(api.call(&req, &mut ApiResponse::new()).is_err());
    assert!(api.call(&req, &mut ApiResponse::new()).is_ok());
}
