//! Request-side types shared by every resolver in the stack.
//!
//! These model the caller-facing half of the resolution contract: the request
//! descriptor, the caller-owned address output buffer, the single-use
//! completion sink, and the cancellation handle a pending request hands back.

use crate::base::loadstate::LoadState;
use crate::base::neterror::NetError;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Priority hint for a resolution request.
///
/// Matches Chromium's `RequestPriority` ordering; higher sorts later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum RequestPriority {
    Idle,
    Lowest,
    #[default]
    Low,
    Medium,
    Highest,
}

/// Descriptor for one resolution request.
///
/// Host and port plus the per-request flags. The priority travels separately
/// (see [`HostResolver::resolve`]); a request is cheap to clone, and the
/// detour keeps a mutable clone so the host can be rewritten after the hook
/// answers.
///
/// [`HostResolver::resolve`]: crate::dns::HostResolver::resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    host: String,
    port: u16,
    allow_cached_response: bool,
    use_dns_client: bool,
}

impl ResolutionRequest {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            allow_cached_response: true,
            use_dns_client: true,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Replaces the hostname, keeping every other field.
    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = host.into();
    }

    /// Whether the resolver may answer from its cache. Defaults to `true`.
    pub fn allow_cached_response(&self) -> bool {
        self.allow_cached_response
    }

    pub fn set_allow_cached_response(&mut self, allow: bool) {
        self.allow_cached_response = allow;
    }

    /// Whether the resolver may use the async DNS client for this request
    /// (subject to the resolver-wide toggle). Defaults to `true`.
    pub fn use_dns_client(&self) -> bool {
        self.use_dns_client
    }

    pub fn set_use_dns_client(&mut self, use_dns_client: bool) {
        self.use_dns_client = use_dns_client;
    }
}

/// An ordered list of resolved socket addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressList {
    addrs: Vec<SocketAddr>,
}

impl AddressList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, addr: SocketAddr) {
        self.addrs.push(addr);
    }

    pub fn endpoints(&self) -> &[SocketAddr] {
        &self.addrs
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// Returns a copy of this list with every address rewritten to `port`.
    pub fn copy_with_port(&self, port: u16) -> AddressList {
        let addrs = self
            .addrs
            .iter()
            .map(|addr| SocketAddr::new(addr.ip(), port))
            .collect();
        AddressList { addrs }
    }
}

impl From<Vec<SocketAddr>> for AddressList {
    fn from(addrs: Vec<SocketAddr>) -> Self {
        Self { addrs }
    }
}

impl IntoIterator for AddressList {
    type Item = SocketAddr;
    type IntoIter = std::vec::IntoIter<SocketAddr>;

    fn into_iter(self) -> Self::IntoIter {
        self.addrs.into_iter()
    }
}

/// Caller-owned output buffer for resolved addresses.
///
/// The caller keeps a clone and reads it once the request settles; resolvers
/// fill it before returning a synchronous result or invoking the completion
/// sink. Intermediaries thread clones through without taking ownership.
#[derive(Debug, Clone, Default)]
pub struct AddressSlot {
    inner: Arc<Mutex<AddressList>>,
}

impl AddressSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill(&self, addresses: AddressList) {
        *self.inner.lock().unwrap() = addresses;
    }

    /// A copy of the current contents.
    pub fn snapshot(&self) -> AddressList {
        self.inner.lock().unwrap().clone()
    }
}

type CompletionFn = Box<dyn FnOnce(Result<(), NetError>) + Send>;

/// Single-use completion callback for a pending request.
///
/// A request settles at most once: the first call to [`complete`] consumes
/// the callback, later calls are ignored and logged. Clones share the same
/// underlying callback, so the sink can be threaded through intermediaries
/// without weakening the once-only guarantee.
///
/// [`complete`]: CompletionSink::complete
#[derive(Clone)]
pub struct CompletionSink {
    callback: Arc<Mutex<Option<CompletionFn>>>,
}

impl CompletionSink {
    pub fn new(callback: impl FnOnce(Result<(), NetError>) + Send + 'static) -> Self {
        Self {
            callback: Arc::new(Mutex::new(Some(Box::new(callback)))),
        }
    }

    /// Delivers the result to the caller. Returns `false` if the sink was
    /// already consumed.
    pub fn complete(&self, result: Result<(), NetError>) -> bool {
        let callback = self.callback.lock().unwrap().take();
        match callback {
            Some(callback) => {
                callback(result);
                true
            }
            None => {
                tracing::warn!("completion delivered more than once; ignoring");
                false
            }
        }
    }

    pub fn is_settled(&self) -> bool {
        self.callback.lock().unwrap().is_none()
    }
}

impl std::fmt::Debug for CompletionSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionSink")
            .field("settled", &self.is_settled())
            .finish()
    }
}

struct HandleState {
    cancelled: AtomicBool,
    load_state: Mutex<LoadState>,
    canceler: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

/// Cancellation token for a pending request.
///
/// Live from the moment the request is dispatched, including while it is
/// parked waiting on the resolve hook. Cancelling runs the currently
/// installed canceler (abort a lookup task, consume a parked hook reply, or
/// forward to an adopted inner handle) and marks the handle; a canceler
/// installed after cancellation runs immediately.
///
/// A cancelled request delivers nothing to its completion sink: the caller
/// has abandoned it.
#[derive(Clone)]
pub struct ResolutionHandle {
    state: Arc<HandleState>,
}

impl ResolutionHandle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(HandleState {
                cancelled: AtomicBool::new(false),
                load_state: Mutex::new(LoadState::Idle),
                canceler: Mutex::new(None),
            }),
        }
    }

    pub fn cancel(&self) {
        if self.state.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.state.load_state.lock().unwrap() = LoadState::Idle;
        let canceler = self.state.canceler.lock().unwrap().take();
        if let Some(canceler) = canceler {
            canceler();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Where the request currently is in its lifecycle.
    pub fn load_state(&self) -> LoadState {
        *self.state.load_state.lock().unwrap()
    }

    pub(crate) fn set_load_state(&self, load_state: LoadState) {
        *self.state.load_state.lock().unwrap() = load_state;
    }

    /// Installs the action that `cancel` runs, replacing any previous one.
    /// Runs it immediately if the handle is already cancelled.
    pub(crate) fn set_canceler(&self, canceler: impl FnOnce() + Send + 'static) {
        if self.is_cancelled() {
            canceler();
            return;
        }
        *self.state.canceler.lock().unwrap() = Some(Box::new(canceler));
        // cancel() may have raced in between the check and the store
        if self.is_cancelled() {
            let canceler = self.state.canceler.lock().unwrap().take();
            if let Some(canceler) = canceler {
                canceler();
            }
        }
    }

    /// Chains cancellation through to a handle produced further down the
    /// stack.
    pub(crate) fn adopt(&self, inner: ResolutionHandle) {
        self.set_canceler(move || inner.cancel());
    }
}

impl Default for ResolutionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResolutionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionHandle")
            .field("cancelled", &self.is_cancelled())
            .field("load_state", &self.load_state())
            .finish()
    }
}

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Logging context threaded through a request.
///
/// Carries a process-unique source id so every log line emitted on behalf of
/// one request can be correlated, the way Chromium's bound NetLog does.
#[derive(Debug, Clone, Copy)]
pub struct NetLog {
    source_id: u64,
}

impl NetLog {
    pub fn new() -> Self {
        Self {
            source_id: NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn source_id(&self) -> u64 {
        self.source_id
    }
}

impl Default for NetLog {
    fn default() -> Self {
        Self::new()
    }
}
