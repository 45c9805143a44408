//! Origin address parsing and classification.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use serde::Serialize;

/// Coarse network class of a request origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressClass {
    Loopback,
    /// RFC 1918, IPv4 link-local, carrier-grade NAT, IPv6 unique-local.
    Private,
    LinkLocalV6,
    PublicV4,
    /// IPv6 that is neither loopback, link-local nor unique-local.
    GlobalV6,
    /// Missing, unparseable or unspecified.
    Unknown,
}

impl AddressClass {
    pub fn of(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => classify_v4(v4),
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => classify_v4(v4),
                None => classify_v6(v6),
            },
        }
    }

    pub fn of_origin(origin: Option<&str>) -> Self {
        origin
            .and_then(parse_origin)
            .map(Self::of)
            .unwrap_or(AddressClass::Unknown)
    }
}

/// Parse an origin as reported by a transport: a bare address, a socket
/// address (`1.2.3.4:5678`, `[::1]:80`) or a bracketed IPv6 literal.
pub fn parse_origin(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    if let Ok(ip) = raw.parse::<IpAddr>() {
        return Some(ip);
    }
    if let Ok(sock) = raw.parse::<SocketAddr>() {
        return Some(sock.ip());
    }
    raw.strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .and_then(|s| s.parse::<IpAddr>().ok())
}

fn classify_v4(ip: Ipv4Addr) -> AddressClass {
    let [a, b, ..] = ip.octets();
    if ip.is_loopback() {
        AddressClass::Loopback
    } else if ip.is_unspecified() {
        AddressClass::Unknown
    } else if ip.is_private() || ip.is_link_local() || (a == 100 && (b & 0xc0) == 64) {
        AddressClass::Private
    } else {
        AddressClass::PublicV4
    }
}

fn classify_v6(ip: Ipv6Addr) -> AddressClass {
    let first = ip.segments()[0];
    if ip.is_loopback() {
        AddressClass::Loopback
    } else if ip.is_unspecified() {
        AddressClass::Unknown
    } else if first & 0xffc0 == 0xfe80 {
        AddressClass::LinkLocalV6
    } else if first & 0xfe00 == 0xfc00 {
        AddressClass::Private
    } else {
        AddressClass::GlobalV6
    }
}
