//! Address policy for the frontend fetch.
//!
//! A URL is fetched only if it is HTTP(S) and every address its host resolves
//! to is public. Any port is allowed. The URL check runs on every redirect
//! hop. Name resolution happens once per connection inside
//! [`PolicyResolver`], so the addresses checked are the ones connected to.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use tracing::warn;
use url::{Host, Url};

use crate::errors::AcquisitionError;

/// Cloud metadata service address.
pub const METADATA_ADDRESS: Ipv4Addr = Ipv4Addr::new(169, 254, 169, 254);

/// Decides which fetch targets are reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressPolicy {
    allow_loopback: bool,
}

impl AddressPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow loopback targets (for tests against a local mock server).
    #[cfg(test)]
    pub fn allow_loopback(mut self) -> Self {
        self.allow_loopback = true;
        self
    }

    /// Check scheme and literal host, without DNS.
    pub fn check_url(&self, url: &Url) -> Result<(), AcquisitionError> {
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(AcquisitionError::UnsupportedScheme(other.to_string())),
        }

        match url.host() {
            None => Err(AcquisitionError::InvalidUrl(format!("{url}: missing host"))),
            Some(Host::Ipv4(ip)) => self.check_ip(IpAddr::V4(ip)),
            Some(Host::Ipv6(ip)) => self.check_ip(IpAddr::V6(ip)),
            Some(Host::Domain(domain)) => {
                if is_local_hostname(domain) && !(self.allow_loopback && is_localhost(domain)) {
                    return Err(AcquisitionError::Blocked(domain.to_string()));
                }
                Ok(())
            }
        }
    }

    pub fn check_ip(&self, ip: IpAddr) -> Result<(), AcquisitionError> {
        if self.allow_loopback && ip.is_loopback() {
            return Ok(());
        }
        if is_blocked_ip(&ip) {
            return Err(AcquisitionError::Blocked(ip.to_string()));
        }
        Ok(())
    }
}

/// Host name lookup used by [`PolicyResolver`].
#[async_trait]
pub trait HostLookup: Send + Sync {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// System resolver through tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLookup;

#[async_trait]
impl HostLookup for SystemLookup {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addresses = tokio::net::lookup_host((host, 0)).await?;
        Ok(addresses.map(|address| address.ip()).collect())
    }
}

/// reqwest resolver that refuses hosts resolving to a blocked address.
///
/// A host with any blocked address is refused as a whole.
#[derive(Clone)]
pub struct PolicyResolver {
    policy: AddressPolicy,
    lookup: Arc<dyn HostLookup>,
}

impl PolicyResolver {
    pub fn new(policy: AddressPolicy, lookup: Arc<dyn HostLookup>) -> Self {
        Self { policy, lookup }
    }

    /// Resolve `host` and check every address. Ports are left at 0 for the
    /// connector to fill in.
    pub async fn resolve_checked(&self, host: &str) -> Result<Vec<SocketAddr>, AcquisitionError> {
        let addresses = self
            .lookup
            .lookup(host)
            .await
            .map_err(|e| AcquisitionError::Resolution(format!("{host}: {e}")))?;
        if addresses.is_empty() {
            return Err(AcquisitionError::Resolution(format!("{host}: no addresses")));
        }

        for ip in &addresses {
            self.policy.check_ip(*ip).map_err(|err| {
                warn!(host = %host, address = %ip, "Host resolves to a blocked address");
                err
            })?;
        }
        Ok(addresses.into_iter().map(|ip| SocketAddr::new(ip, 0)).collect())
    }
}

impl Resolve for PolicyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.clone();
        Box::pin(async move {
            match resolver.resolve_checked(name.as_str()).await {
                Ok(addresses) => Ok(Box::new(addresses.into_iter()) as Addrs),
                Err(err) => Err(Box::new(err) as Box<dyn std::error::Error + Send + Sync>),
            }
        })
    }
}

/// Loopback, private, link-local, metadata and otherwise non-public addresses.
pub fn is_blocked_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_blocked_v4(v4),
        IpAddr::V6(v6) => is_blocked_v6(v6),
    }
}

fn is_blocked_v4(v4: &Ipv4Addr) -> bool {
    let octets = v4.octets();
    *v4 == METADATA_ADDRESS
        || v4.is_loopback()
        || v4.is_private()
        || v4.is_link_local()
        || v4.is_broadcast()
        || v4.is_unspecified()
        // 100.64.0.0/10 (Carrier-grade NAT)
        || (octets[0] == 100 && (octets[1] & 0xC0) == 64)
        // 192.0.0.0/24
        || (octets[0] == 192 && octets[1] == 0 && octets[2] == 0)
        // 198.18.0.0/15 (benchmarking)
        || (octets[0] == 198 && (octets[1] & 0xFE) == 18)
        // 224.0.0.0/4 (multicast) and 240.0.0.0/4 (reserved)
        || octets[0] >= 224
}

fn is_blocked_v6(v6: &Ipv6Addr) -> bool {
    if let Some(mapped) = v6.to_ipv4_mapped() {
        return is_blocked_v4(&mapped);
    }
    let segments = v6.segments();
    // 64:ff9b::/96 (NAT64) embeds an IPv4 address in the low 32 bits
    if segments[..6] == [0x64, 0xff9b, 0, 0, 0, 0] {
        let [.., a, b, c, d] = v6.octets();
        return is_blocked_v4(&Ipv4Addr::new(a, b, c, d));
    }
    let first = segments[0];
    v6.is_loopback()
        || v6.is_unspecified()
        || v6.is_multicast()
        // fc00::/7 (unique local)
        || (first & 0xFE00) == 0xFC00
        // fe80::/10 (link local)
        || (first & 0xFFC0) == 0xFE80
}

fn is_localhost(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    host == "localhost" || host.ends_with(".localhost")
}

fn is_local_hostname(host: &str) -> bool {
    let lower = host.trim_end_matches('.').to_ascii_lowercase();
    is_localhost(&lower) || lower.ends_with(".local") || lower.ends_with(".internal")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(url: &str) -> Result<(), AcquisitionError> {
        AddressPolicy::new().check_url(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_blocks_loopback_and_metadata() {
        assert!(matches!(check("http://127.0.0.1/"), Err(AcquisitionError::Blocked(_))));
        assert!(matches!(check("http://[::1]:8080/"), Err(AcquisitionError::Blocked(_))));
        assert!(matches!(
            check("http://169.254.169.254/latest/meta-data"),
            Err(AcquisitionError::Blocked(_))
        ));
        assert!(matches!(check("http://localhost:3000/"), Err(AcquisitionError::Blocked(_))));
        assert!(matches!(
            check("http://metadata.google.internal/"),
            Err(AcquisitionError::Blocked(_))
        ));
    }

    #[test]
    fn test_blocks_private_ranges() {
        for url in [
            "http://10.0.0.5/",
            "http://192.168.1.1/",
            "http://172.16.0.1/",
            "http://100.64.0.1/",
            "http://0.0.0.0/",
            "http://[fd00::1]/",
            "http://[fe80::1]/",
            "http://[::ffff:127.0.0.1]/",
            "http://198.18.0.1/",
            "http://198.19.255.254/",
            "http://224.0.0.251/",
            "http://239.255.255.250/",
            "http://240.0.0.1/",
            "http://[ff02::1]/",
            "http://[64:ff9b::7f00:1]/",
            "http://[64:ff9b::a9fe:a9fe]/",
        ] {
            assert!(check(url).is_err(), "{url} should be blocked");
        }
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        assert!(matches!(
            check("file:///etc/passwd"),
            Err(AcquisitionError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            check("ftp://example.com/file"),
            Err(AcquisitionError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            check("gopher://example.com/"),
            Err(AcquisitionError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_allows_public_hosts_on_any_port() {
        assert!(check("https://example.com/page").is_ok());
        assert!(check("http://example.com:8443/page").is_ok());
        assert!(check("http://93.184.216.34/").is_ok());
        assert!(check("http://198.20.0.1/").is_ok());
        assert!(check("http://[64:ff9b::5db8:d822]/").is_ok());
    }

    #[test]
    fn test_allow_loopback_only_relaxes_loopback() {
        let policy = AddressPolicy::new().allow_loopback();
        assert!(policy.check_url(&Url::parse("http://127.0.0.1:9000/").unwrap()).is_ok());
        assert!(policy.check_url(&Url::parse("http://localhost:9000/").unwrap()).is_ok());
        assert!(policy
            .check_url(&Url::parse("http://169.254.169.254/").unwrap())
            .is_err());
        assert!(policy.check_url(&Url::parse("http://10.0.0.1/").unwrap()).is_err());
    }

    struct StaticLookup(Vec<IpAddr>);

    #[async_trait]
    impl HostLookup for StaticLookup {
        async fn lookup(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
            Ok(self.0.clone())
        }
    }

    fn resolver(policy: AddressPolicy, addresses: &[&str]) -> PolicyResolver {
        let addresses = addresses.iter().map(|a| a.parse().unwrap()).collect();
        PolicyResolver::new(policy, Arc::new(StaticLookup(addresses)))
    }

    #[tokio::test]
    async fn test_resolver_refuses_blocked_addresses() {
        let loopback = resolver(AddressPolicy::new(), &["127.0.0.1"]);
        assert!(matches!(
            loopback.resolve_checked("cms.example").await,
            Err(AcquisitionError::Blocked(_))
        ));

        let mixed = resolver(AddressPolicy::new(), &["93.184.216.34", "169.254.169.254"]);
        assert!(matches!(
            mixed.resolve_checked("cms.example").await,
            Err(AcquisitionError::Blocked(_))
        ));

        let empty = resolver(AddressPolicy::new(), &[]);
        assert!(matches!(
            empty.resolve_checked("cms.example").await,
            Err(AcquisitionError::Resolution(_))
        ));
    }

    #[tokio::test]
    async fn test_resolver_returns_checked_addresses() {
        let public = resolver(AddressPolicy::new(), &["93.184.216.34", "2606:2800:220:1::"]);
        let addresses = public.resolve_checked("cms.example").await.unwrap();
        assert_eq!(addresses.len(), 2);
        assert!(addresses.iter().all(|address| address.port() == 0));
        assert_eq!(addresses[0].ip().to_string(), "93.184.216.34");
    }
}
