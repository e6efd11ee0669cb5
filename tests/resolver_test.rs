//! Caching Resolver Tests
//!
//! Covers `CachingHostResolver` with scripted backends:
//! - IP-literal fast path
//! - Cache population, hits, and the bypass flag
//! - Cache-only lookups
//! - Backend selection (DNS client toggle and per-request flag)
//! - Cancellation of in-flight lookups

use detournet::base::neterror::NetError;
use detournet::dns::{
    Addrs, AddressSlot, CachingHostResolver, CompletionSink, HostResolver, Name, NetLog,
    RequestPriority, Resolve, ResolutionRequest, ResolveStatus, Resolving,
};
use detournet::runner::TaskRunner;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Backend answering every lookup with one fixed address.
struct ScriptedBackend {
    ip: Ipv4Addr,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Resolve for ScriptedBackend {
    fn resolve(&self, name: Name) -> Resolving {
        self.calls.lock().unwrap().push(name.as_str().to_string());
        let addr = SocketAddr::new(IpAddr::V4(self.ip), 0);
        Box::pin(async move { Ok(Box::new(std::iter::once(addr)) as Addrs) })
    }
}

/// Backend whose lookups never finish.
struct HangingBackend {
    calls: Mutex<Vec<String>>,
}

impl HangingBackend {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl Resolve for HangingBackend {
    fn resolve(&self, name: Name) -> Resolving {
        self.calls.lock().unwrap().push(name.as_str().to_string());
        Box::pin(std::future::pending::<Result<Addrs, NetError>>())
    }
}

fn sink() -> (
    CompletionSink,
    mpsc::UnboundedReceiver<Result<(), NetError>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sink = CompletionSink::new(move |result| {
        let _ = tx.send(result);
    });
    (sink, rx)
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<Result<(), NetError>>) -> Result<(), NetError> {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("completion never delivered")
        .expect("completion channel closed")
}

async fn drain(runner: &TaskRunner) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    runner.post(move || {
        let _ = tx.send(());
    });
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("runner never drained");
}

#[tokio::test]
async fn test_network_result_fills_slot_and_cache() {
    let io = TaskRunner::new("io");
    let system = Arc::new(ScriptedBackend::new(Ipv4Addr::new(10, 1, 0, 1)));
    let resolver = CachingHostResolver::with_backends(
        system.clone(),
        Arc::new(ScriptedBackend::new(Ipv4Addr::new(10, 2, 0, 1))),
        io.clone(),
    );
    resolver.set_dns_client_enabled(false);

    let request = ResolutionRequest::new("cached.example", 443);
    let slot = AddressSlot::new();
    let (completion, mut rx) = sink();

    let status = resolver.resolve(
        &request,
        RequestPriority::default(),
        &slot,
        completion,
        &NetLog::new(),
    );
    assert!(status.is_pending());
    assert_eq!(recv(&mut rx).await, Ok(()));
    // Cached addresses get the request port applied.
    assert_eq!(
        slot.snapshot().endpoints(),
        &[SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 1, 0, 1)), 443)]
    );

    // Second lookup is served synchronously from the cache.
    let slot = AddressSlot::new();
    let completion = CompletionSink::new(|_| panic!("cache hit must not invoke the sink"));
    let status = resolver.resolve(
        &request,
        RequestPriority::default(),
        &slot,
        completion,
        &NetLog::new(),
    );
    assert!(matches!(status, ResolveStatus::Finished(Ok(()))));
    assert_eq!(system.calls().len(), 1);
}

#[tokio::test]
async fn test_cache_bypass_flag_forces_lookup() {
    let io = TaskRunner::new("io");
    let system = Arc::new(ScriptedBackend::new(Ipv4Addr::new(10, 1, 0, 2)));
    let resolver = CachingHostResolver::with_backends(
        system.clone(),
        Arc::new(ScriptedBackend::new(Ipv4Addr::new(10, 2, 0, 2))),
        io.clone(),
    );
    resolver.set_dns_client_enabled(false);

    let mut request = ResolutionRequest::new("fresh.example", 80);
    request.set_allow_cached_response(false);

    for _ in 0..2 {
        let (completion, mut rx) = sink();
        let status = resolver.resolve(
            &request,
            RequestPriority::default(),
            &AddressSlot::new(),
            completion,
            &NetLog::new(),
        );
        assert!(status.is_pending());
        assert_eq!(recv(&mut rx).await, Ok(()));
    }

    assert_eq!(system.calls().len(), 2);
}

#[tokio::test]
async fn test_resolve_from_cache_miss_then_hit() {
    let io = TaskRunner::new("io");
    let system = Arc::new(ScriptedBackend::new(Ipv4Addr::new(10, 1, 0, 3)));
    let resolver = CachingHostResolver::with_backends(
        system.clone(),
        Arc::new(ScriptedBackend::new(Ipv4Addr::new(10, 2, 0, 3))),
        io.clone(),
    );
    resolver.set_dns_client_enabled(false);

    let request = ResolutionRequest::new("later.example", 8080);
    let slot = AddressSlot::new();

    assert_eq!(
        resolver.resolve_from_cache(&request, &slot, &NetLog::new()),
        Err(NetError::DnsCacheMiss)
    );
    // A cache-only lookup never reaches a backend.
    assert!(system.calls().is_empty());

    let (completion, mut rx) = sink();
    resolver.resolve(
        &request,
        RequestPriority::default(),
        &AddressSlot::new(),
        completion,
        &NetLog::new(),
    );
    assert_eq!(recv(&mut rx).await, Ok(()));

    assert_eq!(
        resolver.resolve_from_cache(&request, &slot, &NetLog::new()),
        Ok(())
    );
    assert_eq!(
        slot.snapshot().endpoints(),
        &[SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 1, 0, 3)), 8080)]
    );
}

#[tokio::test]
async fn test_ip_literal_skips_cache_and_backends() {
    let io = TaskRunner::new("io");
    let system = Arc::new(ScriptedBackend::new(Ipv4Addr::new(10, 1, 0, 4)));
    let resolver = CachingHostResolver::with_backends(
        system.clone(),
        Arc::new(ScriptedBackend::new(Ipv4Addr::new(10, 2, 0, 4))),
        io.clone(),
    );

    let request = ResolutionRequest::new("192.0.2.1", 53);
    let slot = AddressSlot::new();

    assert_eq!(
        resolver.resolve_from_cache(&request, &slot, &NetLog::new()),
        Ok(())
    );
    assert_eq!(
        slot.snapshot().endpoints(),
        &[SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 53)]
    );
    assert!(system.calls().is_empty());
}

#[tokio::test]
async fn test_dns_client_toggle_selects_backend() {
    let io = TaskRunner::new("io");
    let system = Arc::new(ScriptedBackend::new(Ipv4Addr::new(10, 1, 0, 5)));
    let dns_client = Arc::new(ScriptedBackend::new(Ipv4Addr::new(10, 2, 0, 5)));
    let resolver =
        CachingHostResolver::with_backends(system.clone(), dns_client.clone(), io.clone());

    // Enabled by default: the async DNS client takes the lookup.
    let mut request = ResolutionRequest::new("first.example", 80);
    request.set_allow_cached_response(false);
    let (completion, mut rx) = sink();
    resolver.resolve(
        &request,
        RequestPriority::default(),
        &AddressSlot::new(),
        completion,
        &NetLog::new(),
    );
    assert_eq!(recv(&mut rx).await, Ok(()));
    assert_eq!(dns_client.calls(), vec!["first.example"]);

    resolver.set_dns_client_enabled(false);
    let mut request = ResolutionRequest::new("second.example", 80);
    request.set_allow_cached_response(false);
    let (completion, mut rx) = sink();
    resolver.resolve(
        &request,
        RequestPriority::default(),
        &AddressSlot::new(),
        completion,
        &NetLog::new(),
    );
    assert_eq!(recv(&mut rx).await, Ok(()));
    assert_eq!(system.calls(), vec!["second.example"]);
}

#[tokio::test]
async fn test_request_flag_opts_out_of_dns_client() {
    let io = TaskRunner::new("io");
    let system = Arc::new(ScriptedBackend::new(Ipv4Addr::new(10, 1, 0, 6)));
    let dns_client = Arc::new(ScriptedBackend::new(Ipv4Addr::new(10, 2, 0, 6)));
    let resolver =
        CachingHostResolver::with_backends(system.clone(), dns_client.clone(), io.clone());

    let mut request = ResolutionRequest::new("legacy.example", 80);
    request.set_use_dns_client(false);
    let (completion, mut rx) = sink();
    resolver.resolve(
        &request,
        RequestPriority::default(),
        &AddressSlot::new(),
        completion,
        &NetLog::new(),
    );
    assert_eq!(recv(&mut rx).await, Ok(()));

    assert_eq!(system.calls(), vec!["legacy.example"]);
    assert!(dns_client.calls().is_empty());
}

#[tokio::test]
async fn test_cancel_aborts_pending_lookup() {
    let io = TaskRunner::new("io");
    let hanging = Arc::new(HangingBackend::new());
    let resolver = CachingHostResolver::with_backends(
        hanging.clone(),
        Arc::new(ScriptedBackend::new(Ipv4Addr::new(10, 2, 0, 7))),
        io.clone(),
    );
    resolver.set_dns_client_enabled(false);

    let request = ResolutionRequest::new("hung.example", 80);
    let (completion, mut rx) = sink();
    let status = resolver.resolve(
        &request,
        RequestPriority::default(),
        &AddressSlot::new(),
        completion,
        &NetLog::new(),
    );

    let handle = status.handle().expect("lookup must be pending").clone();
    resolver.cancel_request(&handle);

    // A cancelled request delivers nothing.
    drain(&io).await;
    assert!(rx.try_recv().is_err());
    assert!(handle.is_cancelled());
}
