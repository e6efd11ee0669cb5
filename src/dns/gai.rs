//! System DNS backend using getaddrinfo.
//!
//! Uses the operating system's native resolution via `getaddrinfo`, executed
//! in a blocking thread so the async runtime never stalls.
//!
//! # When to Use
//!
//! - When system DNS configuration must be respected (/etc/resolv.conf, etc.)
//! - As the fallback when the async DNS client is disabled

use super::{Addrs, Name, Resolve, Resolving};
use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6, ToSocketAddrs};

/// System DNS backend wrapping `ToSocketAddrs` in
/// `tokio::task::spawn_blocking`.
///
/// Each lookup occupies a blocking-pool thread for its duration. For
/// high-throughput use, prefer [`HickoryResolver`], which is fully async.
///
/// [`HickoryResolver`]: crate::dns::HickoryResolver
#[derive(Clone, Debug, Default)]
pub struct GaiResolver;

impl GaiResolver {
    pub fn new() -> Self {
        Self
    }
}

impl Resolve for GaiResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let domain = name.as_str().to_string();
            let host = domain.clone();

            let joined = tokio::task::spawn_blocking(move || {
                tracing::debug!(host = %host, "resolving via getaddrinfo");
                (host.as_str(), 0u16)
                    .to_socket_addrs()
                    .map(|iter| iter.collect::<Vec<_>>())
            })
            .await;

            // Task join failure means cancellation or a panic in the pool.
            let addrs = joined
                .map_err(|e| {
                    tracing::error!(error = %e, "getaddrinfo task failed");
                    NetError::NameNotResolved
                })?
                .dns_context(&domain)?;

            if addrs.is_empty() {
                tracing::debug!(domain = %domain, "getaddrinfo returned no addresses");
                return Err(NetError::NameNotResolved);
            }

            tracing::debug!(domain = %domain, count = addrs.len(), "getaddrinfo resolution complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

/// Addresses parsed directly from an IP-literal host string.
///
/// Lets callers bypass DNS entirely when the host is already an address.
pub struct SocketAddrs {
    addrs: Vec<SocketAddr>,
}

impl SocketAddrs {
    pub fn new(addrs: Vec<SocketAddr>) -> Self {
        Self { addrs }
    }

    /// Attempts to parse `host` as an IPv4 or IPv6 literal.
    ///
    /// Returns `None` for anything that needs actual resolution.
    pub fn try_parse(host: &str, port: u16) -> Option<Self> {
        if let Ok(addr) = host.parse::<Ipv4Addr>() {
            return Some(Self {
                addrs: vec![SocketAddr::V4(SocketAddrV4::new(addr, port))],
            });
        }

        if let Ok(addr) = host.parse::<Ipv6Addr>() {
            return Some(Self {
                addrs: vec![SocketAddr::V6(SocketAddrV6::new(addr, port, 0, 0))],
            });
        }

        None
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.addrs.len()
    }
}

impl Iterator for SocketAddrs {
    type Item = SocketAddr;

    fn next(&mut self) -> Option<Self::Item> {
        if self.addrs.is_empty() {
            None
        } else {
            Some(self.addrs.remove(0))
        }
    }
}
