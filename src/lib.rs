//! # detournet
//!
//! A pluggable host-name resolution delegate for Rust, with a
//! Chromium-inspired architecture.
//!
//! `detournet` sits in front of an asynchronous DNS resolver and gives the
//! embedding application the chance to intercept, rewrite, or veto a
//! hostname before the underlying resolver is invoked, while preserving the
//! wrapped resolver's exact asynchronous contract: pending and immediate
//! completion, cancellation handles, and synchronous cache-only lookups.
//!
//! ## Features
//!
//! - **Drop-in delegate**: with no hook registered, requests pass through
//!   bit-identically; callers cannot tell the wrapper from the real thing
//! - **Detour hooks**: rewrite `alias.example` to `real.example`, or reject
//!   `blocked.example` outright, from an application callback that may
//!   itself be slow or asynchronous
//! - **Two execution contexts**: hooks run on a control context; resolver
//!   state and completion callbacks stay on the I/O context
//! - **Bundled resolver**: TTL host cache, IP-literal fast path, and
//!   switchable getaddrinfo / hickory-dns backends
//! - **Guaranteed delivery**: every request settles exactly once, including
//!   synchronous completions after a rewrite, double-delivering hooks, and
//!   hooks that never answer (with a configured deadline)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use detournet::dns::{
//!     AddressSlot, CachingHostResolver, CompletionSink, HostResolver,
//!     HostResolverWithHook, NetLog, RequestPriority, ResolutionRequest,
//! };
//! use detournet::runner::TaskRunner;
//!
//! #[tokio::main]
//! async fn main() {
//!     let io = TaskRunner::new("io");
//!     let control = TaskRunner::new("control");
//!     let inner = Arc::new(CachingHostResolver::new(io.clone()));
//!     let resolver = HostResolverWithHook::new(inner, io, control);
//!
//!     resolver.set_resolve_hook(Some(Arc::new(|host, reply| {
//!         reply.deliver(host.replace(".internal", ".example.com"));
//!     })));
//!
//!     let request = ResolutionRequest::new("api.internal", 443);
//!     let addresses = AddressSlot::new();
//!     let completion = CompletionSink::new(|result| {
//!         println!("resolved: {result:?}");
//!     });
//!     resolver.resolve(
//!         &request,
//!         RequestPriority::default(),
//!         &addresses,
//!         completion,
//!         &NetLog::new(),
//!     );
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Core types and error definitions
//! - [`dns`] - The resolution stack: contract, delegate, cache, backends
//! - [`runner`] - Sequenced task-queue execution contexts

pub mod base;
pub mod dns;
pub mod runner;
