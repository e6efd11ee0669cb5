//! Host Resolution Module
//!
//! A pluggable resolution stack with application-controlled hostname
//! overrides:
//! - Callback-style [`HostResolver`] contract (pending/immediate completion,
//!   cancellation handles, cache-only lookups)
//! - [`HostResolverWithHook`], a delegate that lets the embedder rewrite or
//!   veto hostnames before resolution
//! - [`CachingHostResolver`], the bundled underlying resolver with a TTL
//!   host cache and two backends (getaddrinfo via thread pool, async
//!   hickory-dns)
//!
//! # Architecture
//!
//! This module mirrors Chromium's `HostResolver` concept. The future-based
//! [`Resolve`] trait is the backend seam; everything above it speaks the
//! callback contract so a wrapper can be inserted in front of the real
//! resolver without callers noticing.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use detournet::dns::{
//!     CachingHostResolver, HostResolver, HostResolverWithHook, NOT_FOUND,
//! };
//! use detournet::runner::TaskRunner;
//!
//! let io = TaskRunner::new("io");
//! let control = TaskRunner::new("control");
//! let inner = Arc::new(CachingHostResolver::new(io.clone()));
//! let resolver = HostResolverWithHook::new(inner, io, control);
//!
//! resolver.set_resolve_hook(Some(Arc::new(|host, reply| {
//!     match host {
//!         "blocked.example" => reply.deliver(NOT_FOUND),
//!         "alias.example" => reply.deliver("real.example"),
//!         other => reply.deliver(other),
//!     }
//! })));
//! ```

mod cache;
mod detour;
mod gai;
mod hickory;
mod request;
mod resolve;
mod resolver;

pub use cache::{HostCache, DEFAULT_MAX_ENTRIES};
pub use detour::{HookReply, HostResolverWithHook, ResolveHook, NOT_FOUND};
pub use gai::{GaiResolver, SocketAddrs};
pub use hickory::HickoryResolver;
pub use request::{
    AddressList, AddressSlot, CompletionSink, NetLog, RequestPriority, ResolutionHandle,
    ResolutionRequest,
};
pub use resolve::{Addrs, Name, Resolve, Resolving};
pub use resolver::{CachingHostResolver, HostResolver, ResolveStatus, DEFAULT_CACHE_TTL};
