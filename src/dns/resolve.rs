//! The future-based backend seam.
//!
//! [`Resolve`] is the low-level lookup abstraction the bundled underlying
//! resolver is built on: hand in a [`Name`], get back a future of socket
//! addresses. Backends are interchangeable behind it.

use crate::base::neterror::NetError;
use std::{fmt, future::Future, net::SocketAddr, pin::Pin, sync::Arc};

/// A domain name to resolve into IP addresses.
///
/// Lightweight wrapper around the hostname string, so backends take a
/// type-safe name rather than a bare `&str`.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Name {
    host: Box<str>,
}

impl Name {
    #[inline]
    pub fn new(host: impl Into<Box<str>>) -> Self {
        Self { host: host.into() }
    }

    /// View the hostname as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.host
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::new(value)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.host, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.host, f)
    }
}

/// Alias for an `Iterator` trait object over `SocketAddr`.
pub type Addrs = Box<dyn Iterator<Item = SocketAddr> + Send>;

/// Alias for the `Future` type returned by a DNS backend.
pub type Resolving = Pin<Box<dyn Future<Output = Result<Addrs, NetError>> + Send>>;

/// Trait for DNS lookup backends.
///
/// Implementations must be thread-safe; `&self` allows concurrent lookups,
/// and the boxed future keeps the trait object-safe. Returned addresses
/// carry port 0; callers apply the port they need.
pub trait Resolve: Send + Sync {
    /// Resolves a domain name to IP addresses.
    fn resolve(&self, name: Name) -> Resolving;
}

/// Blanket implementation for Arc-wrapped backends.
impl<R: Resolve + ?Sized> Resolve for Arc<R> {
    fn resolve(&self, name: Name) -> Resolving {
        (**self).resolve(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_name_from_str_and_string() {
        let name = Name::from("example.com");
        assert_eq!(name.as_str(), "example.com");
        assert_eq!(name.to_string(), "example.com");

        let owned = Name::from(String::from("test.example.com"));
        assert_eq!(owned.as_str(), "test.example.com");
    }

    #[test]
    fn test_name_equality_and_hash() {
        use std::collections::HashSet;

        assert_eq!(Name::new("example.com"), Name::new("example.com"));
        assert_ne!(Name::new("example.com"), Name::new("other.com"));

        let mut set = HashSet::new();
        set.insert(Name::new("example.com"));
        set.insert(Name::new("example.com"));
        assert_eq!(set.len(), 1);
    }

    struct MockBackend {
        response: Vec<SocketAddr>,
    }

    impl Resolve for MockBackend {
        fn resolve(&self, _name: Name) -> Resolving {
            let addrs = self.response.clone();
            Box::pin(async move { Ok(Box::new(addrs.into_iter()) as Addrs) })
        }
    }

    #[tokio::test]
    async fn test_arc_blanket_impl() {
        let backend: Arc<dyn Resolve> = Arc::new(MockBackend {
            response: vec![SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 0)],
        });

        let addrs: Vec<_> = backend
            .resolve(Name::new("example.com"))
            .await
            .unwrap()
            .collect();
        assert_eq!(addrs.len(), 1);
    }
}
