//! The callback-style resolver contract and the bundled underlying resolver.
//!
//! [`HostResolver`] is the caller-facing contract of the whole stack:
//! resolve with pending/immediate completion, synchronous cache-only lookup,
//! cancellation, and configuration introspection. Roughly equivalent to
//! net::HostResolver.
//!
//! [`CachingHostResolver`] is the concrete implementation the delegate wraps
//! by default: an IP-literal fast path, a TTL host cache, and two
//! interchangeable lookup backends (getaddrinfo and hickory-dns).

use crate::base::loadstate::LoadState;
use crate::base::neterror::NetError;
use crate::dns::cache::HostCache;
use crate::dns::gai::{GaiResolver, SocketAddrs};
use crate::dns::hickory::HickoryResolver;
use crate::dns::request::{
    AddressList, AddressSlot, CompletionSink, NetLog, RequestPriority, ResolutionHandle,
    ResolutionRequest,
};
use crate::dns::resolve::{Name, Resolve};
use crate::runner::TaskRunner;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How a call to [`HostResolver::resolve`] started.
#[derive(Debug)]
pub enum ResolveStatus {
    /// The request completed synchronously. On `Ok` the address slot has
    /// been filled. The completion sink was not and will not be invoked.
    Finished(Result<(), NetError>),
    /// The request is in flight; the completion sink will be invoked on the
    /// I/O context unless the handle is cancelled first.
    Pending(ResolutionHandle),
}

impl ResolveStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, ResolveStatus::Pending(_))
    }

    /// The handle of a pending request, if any.
    pub fn handle(&self) -> Option<&ResolutionHandle> {
        match self {
            ResolveStatus::Pending(handle) => Some(handle),
            ResolveStatus::Finished(_) => None,
        }
    }
}

/// Contract of an asynchronous host resolver.
///
/// All methods must be called from the I/O context; completion sinks are
/// invoked there too. Implementations share themselves via `Arc`, so a
/// request can outlive the call that started it.
pub trait HostResolver: Send + Sync {
    /// Starts resolving `request` into `addresses`.
    ///
    /// Returns [`ResolveStatus::Finished`] when the answer was produced
    /// synchronously (the sink is not invoked), or
    /// [`ResolveStatus::Pending`] with a cancellation handle; the sink then
    /// fires exactly once on the I/O context, unless the request is
    /// cancelled first.
    fn resolve(
        &self,
        request: &ResolutionRequest,
        priority: RequestPriority,
        addresses: &AddressSlot,
        completion: CompletionSink,
        net_log: &NetLog,
    ) -> ResolveStatus;

    /// Answers `request` from cached state only, synchronously.
    ///
    /// `Err(DnsCacheMiss)` when nothing usable is cached.
    fn resolve_from_cache(
        &self,
        request: &ResolutionRequest,
        addresses: &AddressSlot,
        net_log: &NetLog,
    ) -> Result<(), NetError>;

    /// Cancels a pending request. A cancelled request delivers nothing.
    fn cancel_request(&self, handle: &ResolutionHandle) {
        handle.cancel();
    }

    /// Toggles the async DNS client backend on or off resolver-wide.
    fn set_dns_client_enabled(&self, enabled: bool);

    /// The resolver's host cache, if it keeps one.
    fn cache(&self) -> Option<HostCache>;

    /// A JSON snapshot of the resolver configuration, if available.
    fn dns_config_as_value(&self) -> Option<serde_json::Value>;
}

/// Default TTL for cached resolutions.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct DnsConfigSnapshot {
    dns_client_enabled: bool,
    cache_entries: usize,
    cache_ttl_secs: u64,
}

/// The bundled underlying resolver.
///
/// Resolution order: IP literals complete synchronously, then the host
/// cache, then an asynchronous lookup on the selected backend. Successful
/// lookups are cached with port-zero addresses; the request port is applied
/// when filling the caller's slot.
///
/// The backend is chosen per request: the hickory-dns client when both the
/// resolver-wide toggle and the request's `use_dns_client` flag allow it,
/// getaddrinfo otherwise.
pub struct CachingHostResolver {
    system: Arc<dyn Resolve>,
    dns_client: Arc<dyn Resolve>,
    dns_client_enabled: AtomicBool,
    cache: HostCache,
    cache_ttl: Duration,
    io: TaskRunner,
}

impl CachingHostResolver {
    /// Creates a resolver with the stock backends.
    ///
    /// `io` is the context completion sinks are invoked on.
    pub fn new(io: TaskRunner) -> Self {
        Self::with_backends(Arc::new(GaiResolver::new()), Arc::new(HickoryResolver::new()), io)
    }

    /// Creates a resolver over explicit backends. Mostly useful in tests.
    pub fn with_backends(
        system: Arc<dyn Resolve>,
        dns_client: Arc<dyn Resolve>,
        io: TaskRunner,
    ) -> Self {
        Self {
            system,
            dns_client,
            dns_client_enabled: AtomicBool::new(true),
            cache: HostCache::new(),
            cache_ttl: DEFAULT_CACHE_TTL,
            io,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    fn backend_for(&self, request: &ResolutionRequest) -> Arc<dyn Resolve> {
        if request.use_dns_client() && self.dns_client_enabled.load(Ordering::SeqCst) {
            Arc::clone(&self.dns_client)
        } else {
            Arc::clone(&self.system)
        }
    }
}

impl HostResolver for CachingHostResolver {
    fn resolve(
        &self,
        request: &ResolutionRequest,
        priority: RequestPriority,
        addresses: &AddressSlot,
        completion: CompletionSink,
        net_log: &NetLog,
    ) -> ResolveStatus {
        let host = request.host();

        if let Some(literal) = SocketAddrs::try_parse(host, request.port()) {
            tracing::debug!(source = net_log.source_id(), host = %host, "host is an IP literal");
            addresses.fill(AddressList::from(literal.collect::<Vec<_>>()));
            return ResolveStatus::Finished(Ok(()));
        }

        if request.allow_cached_response() {
            if let Some(hit) = self.cache.lookup(host, Instant::now()) {
                tracing::debug!(source = net_log.source_id(), host = %host, "served from host cache");
                addresses.fill(hit.copy_with_port(request.port()));
                return ResolveStatus::Finished(Ok(()));
            }
        }

        tracing::debug!(
            source = net_log.source_id(),
            host = %host,
            ?priority,
            "starting asynchronous lookup"
        );

        let handle = ResolutionHandle::new();
        handle.set_load_state(LoadState::ResolvingHost);

        let backend = self.backend_for(request);
        let name = Name::new(host);
        let cache_host = host.to_string();
        let port = request.port();
        let slot = addresses.clone();
        let cache = self.cache.clone();
        let ttl = self.cache_ttl;
        let io = self.io.clone();
        let done_handle = handle.clone();

        let lookup = tokio::spawn(async move {
            let result = backend.resolve(name).await;
            io.post(move || {
                if done_handle.is_cancelled() {
                    return;
                }
                done_handle.set_load_state(LoadState::Idle);
                let outcome = match result {
                    Ok(addrs) => {
                        let list = AddressList::from(addrs.collect::<Vec<_>>());
                        cache.set(cache_host, list.clone(), ttl, Instant::now());
                        slot.fill(list.copy_with_port(port));
                        Ok(())
                    }
                    Err(e) => Err(e),
                };
                completion.complete(outcome);
            });
        });

        handle.set_canceler(move || lookup.abort());
        ResolveStatus::Pending(handle)
    }

    fn resolve_from_cache(
        &self,
        request: &ResolutionRequest,
        addresses: &AddressSlot,
        net_log: &NetLog,
    ) -> Result<(), NetError> {
        let host = request.host();

        if let Some(literal) = SocketAddrs::try_parse(host, request.port()) {
            addresses.fill(AddressList::from(literal.collect::<Vec<_>>()));
            return Ok(());
        }

        match self.cache.lookup(host, Instant::now()) {
            Some(hit) => {
                addresses.fill(hit.copy_with_port(request.port()));
                Ok(())
            }
            None => {
                tracing::debug!(source = net_log.source_id(), host = %host, "host cache miss");
                Err(NetError::DnsCacheMiss)
            }
        }
    }

    fn set_dns_client_enabled(&self, enabled: bool) {
        tracing::debug!(enabled, "DNS client toggled");
        self.dns_client_enabled.store(enabled, Ordering::SeqCst);
    }

    fn cache(&self) -> Option<HostCache> {
        Some(self.cache.clone())
    }

    fn dns_config_as_value(&self) -> Option<serde_json::Value> {
        let snapshot = DnsConfigSnapshot {
            dns_client_enabled: self.dns_client_enabled.load(Ordering::SeqCst),
            cache_entries: self.cache.size(),
            cache_ttl_secs: self.cache_ttl.as_secs(),
        };
        serde_json::to_value(snapshot).ok()
    }
}
