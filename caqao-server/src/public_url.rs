//! Absolute image URLs handed to clients

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, UdpSocket};

use tracing::warn;

/// Builds `http://<host>:<port>/detections/<filename>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrls {
    base: String,
}

impl ImageUrls {
    pub fn new(host: &str, port: u16) -> Self {
        let base = if host.parse::<Ipv6Addr>().is_ok() {
            format!("http://[{}]:{}/detections", host, port)
        } else {
            format!("http://{}:{}/detections", host, port)
        };
        Self { base }
    }

    pub fn image_url(&self, filename: &str) -> String {
        format!("{}/{}", self.base, filename)
    }
}

/// Host to advertise in image URLs.
///
/// A configured host is used as is. Otherwise a concrete bind address is
/// used, and a wildcard bind falls back to the address of the interface
/// carrying outbound traffic.
pub fn resolve_public_host(configured: Option<&str>, bind_host: &str) -> String {
    if let Some(host) = configured.map(str::trim).filter(|h| !h.is_empty()) {
        return host.to_string();
    }

    match bind_host.parse::<IpAddr>() {
        Ok(ip) if !ip.is_unspecified() => return ip.to_string(),
        Err(_) if !bind_host.is_empty() => return bind_host.to_string(),
        _ => {}
    }

    match outbound_interface_ip() {
        Some(ip) => ip.to_string(),
        None => {
            warn!("Could not determine outbound interface address, advertising 127.0.0.1");
            Ipv4Addr::LOCALHOST.to_string()
        }
    }
}

/// Local address the OS would route external traffic from. Connecting a UDP
/// socket sends nothing.
fn outbound_interface_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80)).ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then_some(ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url_format() {
        let urls = ImageUrls::new("192.168.72.32", 5000);
        assert_eq!(
            urls.image_url("2024-03-01_10-15-30-123456.jpg"),
            "http://192.168.72.32:5000/detections/2024-03-01_10-15-30-123456.jpg"
        );
    }

    #[test]
    fn test_ipv6_host_bracketed() {
        let urls = ImageUrls::new("::1", 5000);
        assert_eq!(urls.image_url("a.jpg"), "http://[::1]:5000/detections/a.jpg");

        let urls = ImageUrls::new("fe80::1c2:3", 8080);
        assert_eq!(
            urls.image_url("a.jpg"),
            "http://[fe80::1c2:3]:8080/detections/a.jpg"
        );
    }

    #[test]
    fn test_configured_host_wins() {
        assert_eq!(resolve_public_host(Some("caqao.local"), "0.0.0.0"), "caqao.local");
        assert_eq!(resolve_public_host(Some("10.0.0.5"), "127.0.0.1"), "10.0.0.5");
    }

    #[test]
    fn test_concrete_bind_host_used() {
        assert_eq!(resolve_public_host(None, "127.0.0.1"), "127.0.0.1");
        assert_eq!(resolve_public_host(Some("  "), "10.1.2.3"), "10.1.2.3");
    }

    #[test]
    fn test_wildcard_bind_resolves_to_some_address() {
        let host = resolve_public_host(None, "0.0.0.0");
        let ip: IpAddr = host.parse().unwrap();
        assert!(!ip.is_unspecified());
    }
}
