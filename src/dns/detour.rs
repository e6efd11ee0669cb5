//! Hostname resolution detour through an application-supplied hook.
//!
//! [`HostResolverWithHook`] wraps any [`HostResolver`] and, when a hook is
//! registered, consults it before every resolution: the hook may pass a
//! replacement hostname back, or reject the name outright with the
//! [`NOT_FOUND`] sentinel. With no hook registered the wrapper is a
//! transparent pass-through, so it can sit in front of the real resolver
//! unconditionally.
//!
//! # Execution contexts
//!
//! The hook runs on the control context; everything that touches resolver
//! state or caller-visible buffers runs on the I/O context. The detour is a
//! round trip: `resolve` posts the hook invocation to the control runner and
//! returns `Pending` at once, and the hook's answer hops back to the I/O
//! runner before the request is failed or re-entered into the wrapped
//! resolver.
//!
//! # Cancellation and teardown
//!
//! The handle returned by `resolve` is live from dispatch time: cancelling
//! while the request is parked on the hook consumes the parked reply (the
//! hook's eventual answer is ignored), and cancelling after re-entry
//! forwards to the wrapped resolver. The detour state owns an `Arc` of the
//! wrapped resolver, so dropping the wrapper while requests are parked is
//! safe; they complete against the still-live resolver.
//!
//! # Hook protocol
//!
//! A hook must call [`HookReply::deliver`] exactly once. A second delivery
//! is ignored and logged. A hook that never delivers strands its request
//! unless a deadline was configured with
//! [`HostResolverWithHook::with_hook_timeout`], in which case the request
//! fails with `TimedOut` when the deadline expires.

use crate::base::loadstate::LoadState;
use crate::base::neterror::NetError;
use crate::dns::cache::HostCache;
use crate::dns::request::{
    AddressSlot, CompletionSink, NetLog, RequestPriority, ResolutionHandle, ResolutionRequest,
};
use crate::dns::resolver::{HostResolver, ResolveStatus};
use crate::runner::TaskRunner;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Reserved hook result that rejects the hostname outright.
///
/// Delivering this value fails the request with
/// [`NetError::NameNotResolved`] without ever touching the wrapped resolver.
pub const NOT_FOUND: &str = "-NOTFOUND";

/// An application-supplied resolve hook.
///
/// Called with the hostname being resolved and the reply to answer through.
/// Runs on the control context; it may answer synchronously or hold on to
/// the reply and answer later from anywhere.
pub type ResolveHook = Arc<dyn Fn(&str, HookReply) + Send + Sync>;

/// Everything needed to resume one detoured request once the hook answers.
struct DetourState {
    inner: Arc<dyn HostResolver>,
    request: ResolutionRequest,
    priority: RequestPriority,
    addresses: AddressSlot,
    completion: CompletionSink,
    handle: ResolutionHandle,
    io: TaskRunner,
    net_log: NetLog,
}

impl DetourState {
    /// Routes the hook's answer. May run on any context; hops to the I/O
    /// runner before touching anything the caller can see.
    fn on_hook_result(mut self, result: String) {
        let io = self.io.clone();
        if result == NOT_FOUND {
            tracing::debug!(
                source = self.net_log.source_id(),
                host = %self.request.host(),
                "hook rejected hostname"
            );
            io.post(move || self.fail(NetError::NameNotResolved));
        } else {
            tracing::debug!(
                source = self.net_log.source_id(),
                from = %self.request.host(),
                to = %result,
                "hook rewrote hostname"
            );
            self.request.set_host(result);
            io.post(move || self.reenter());
        }
    }

    /// Re-enters the wrapped resolver with the rewritten request. I/O
    /// context only.
    fn reenter(self) {
        if self.handle.is_cancelled() {
            return;
        }
        self.handle.set_load_state(LoadState::ResolvingHost);
        let status = self.inner.resolve(
            &self.request,
            self.priority,
            &self.addresses,
            self.completion.clone(),
            &self.net_log,
        );
        match status {
            ResolveStatus::Pending(inner_handle) => self.handle.adopt(inner_handle),
            // A synchronous answer after the detour still has to reach the
            // caller through the sink; the caller only ever saw Pending.
            ResolveStatus::Finished(result) => {
                self.handle.set_load_state(LoadState::Idle);
                self.completion.complete(result);
            }
        }
    }

    /// Fails the request without consulting the wrapped resolver. I/O
    /// context only.
    fn fail(self, error: NetError) {
        if self.handle.is_cancelled() {
            return;
        }
        self.handle.set_load_state(LoadState::Idle);
        self.completion.complete(Err(error));
    }
}

/// Single-use reply a hook answers through.
///
/// The first of {hook delivery, deadline expiry, cancellation} consumes the
/// underlying detour state; whatever comes later finds it gone and is
/// ignored, so a request settles at most once no matter how the hook
/// misbehaves.
#[derive(Clone)]
pub struct HookReply {
    state: Arc<Mutex<Option<DetourState>>>,
}

impl HookReply {
    fn new(detour: DetourState) -> Self {
        Self {
            state: Arc::new(Mutex::new(Some(detour))),
        }
    }

    fn take(&self) -> Option<DetourState> {
        self.state.lock().unwrap().take()
    }

    /// Answers the detour with a replacement hostname, or with [`NOT_FOUND`]
    /// to reject it.
    pub fn deliver(&self, result: impl Into<String>) {
        match self.take() {
            Some(detour) => detour.on_hook_result(result.into()),
            None => {
                tracing::warn!("hook reply delivered after the request settled; ignoring");
            }
        }
    }
}

impl std::fmt::Debug for HookReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookReply")
            .field("settled", &self.state.lock().unwrap().is_none())
            .finish()
    }
}

/// A [`HostResolver`] that detours requests through a resolve hook.
///
/// Drop-in substitute for the resolver it wraps: identical behavior with no
/// hook registered, and an extra control-context round trip per request with
/// one. Cache-only lookups and every other contract method bypass the hook
/// entirely.
pub struct HostResolverWithHook {
    inner: Arc<dyn HostResolver>,
    hook: Mutex<Option<ResolveHook>>,
    io: TaskRunner,
    control: TaskRunner,
    hook_timeout: Option<Duration>,
}

impl HostResolverWithHook {
    /// Wraps `inner`. `io` must be the context `resolve` is called on;
    /// `control` is where hooks run.
    pub fn new(inner: Arc<dyn HostResolver>, io: TaskRunner, control: TaskRunner) -> Self {
        Self {
            inner,
            hook: Mutex::new(None),
            io,
            control,
            hook_timeout: None,
        }
    }

    /// Bounds how long a detoured request may wait for its hook to answer.
    ///
    /// Without a deadline, a hook that never delivers strands the request.
    pub fn with_hook_timeout(mut self, timeout: Duration) -> Self {
        self.hook_timeout = Some(timeout);
        self
    }

    /// Installs or clears the resolve hook.
    ///
    /// Replacing the hook does not affect requests already dispatched; they
    /// keep the hook value captured at dispatch time.
    pub fn set_resolve_hook(&self, hook: Option<ResolveHook>) {
        *self.hook.lock().unwrap() = hook;
    }
}

impl HostResolver for HostResolverWithHook {
    fn resolve(
        &self,
        request: &ResolutionRequest,
        priority: RequestPriority,
        addresses: &AddressSlot,
        completion: CompletionSink,
        net_log: &NetLog,
    ) -> ResolveStatus {
        let hook = self.hook.lock().unwrap().clone();
        let Some(hook) = hook else {
            return self
                .inner
                .resolve(request, priority, addresses, completion, net_log);
        };

        let handle = ResolutionHandle::new();
        handle.set_load_state(LoadState::WaitingForDelegate);

        let detour = DetourState {
            inner: Arc::clone(&self.inner),
            request: request.clone(),
            priority,
            addresses: addresses.clone(),
            completion,
            handle: handle.clone(),
            io: self.io.clone(),
            net_log: *net_log,
        };
        let reply = HookReply::new(detour);

        // Cancelling while parked consumes the reply, so the hook's
        // eventual answer has nowhere to land.
        {
            let parked = reply.clone();
            let source = net_log.source_id();
            handle.set_canceler(move || {
                if parked.take().is_some() {
                    tracing::debug!(source, "request cancelled while awaiting hook");
                }
            });
        }

        if let Some(timeout) = self.hook_timeout {
            let expiry = reply.clone();
            self.io.post_delayed(timeout, move || {
                if let Some(detour) = expiry.take() {
                    tracing::warn!(
                        source = detour.net_log.source_id(),
                        host = %detour.request.host(),
                        "hook deadline expired"
                    );
                    // Already on the I/O context via the runner.
                    detour.fail(NetError::TimedOut);
                }
            });
        }

        let host = request.host().to_owned();
        tracing::debug!(source = net_log.source_id(), host = %host, "dispatching resolve hook");
        self.control.post(move || hook(&host, reply));

        ResolveStatus::Pending(handle)
    }

    fn resolve_from_cache(
        &self,
        request: &ResolutionRequest,
        addresses: &AddressSlot,
        net_log: &NetLog,
    ) -> Result<(), NetError> {
        // Cache-only lookups are synchronous and never detour.
        self.inner.resolve_from_cache(request, addresses, net_log)
    }

    fn set_dns_client_enabled(&self, enabled: bool) {
        self.inner.set_dns_client_enabled(enabled);
    }

    fn cache(&self) -> Option<HostCache> {
        self.inner.cache()
    }

    fn dns_config_as_value(&self) -> Option<serde_json::Value> {
        self.inner.dns_config_as_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_value() {
        // The sentinel is part of the hook protocol; hooks compare against
        // the exported constant.
        assert_eq!(NOT_FOUND, "-NOTFOUND");
    }

    #[test]
    fn test_settled_reply_ignores_delivery() {
        // A reply with no live detour behaves like an already-settled one.
        let reply = HookReply {
            state: Arc::new(Mutex::new(None)),
        };
        // Must not panic, just log and ignore.
        reply.deliver("anything.example");
    }
}
