use core::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Peer address on the data link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataLinkAddress {
    Ip(SocketAddr),
}

impl DataLinkAddress {
    pub const BACNET_IP_DEFAULT_PORT: u16 = 47808;

    pub fn local_broadcast(port: u16) -> Self {
        Self::Ip(SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), port))
    }

    pub fn as_socket_addr(self) -> SocketAddr {
        match self {
            Self::Ip(addr) => addr,
        }
    }

    pub fn is_broadcast(self) -> bool {
        matches!(self.as_socket_addr().ip(), IpAddr::V4(v4) if v4.is_broadcast())
    }
}

impl From<SocketAddr> for DataLinkAddress {
    fn from(addr: SocketAddr) -> Self {
        Self::Ip(addr)
    }
}

impl fmt::Display for DataLinkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(addr) => write!(f, "{addr}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DataLinkAddress;
    use std::net::{Ipv4Addr, SocketAddr};

    #[test]
    fn broadcast_detection() {
        assert!(DataLinkAddress::local_broadcast(47808).is_broadcast());
        let unicast: DataLinkAddress = SocketAddr::from((Ipv4Addr::LOCALHOST, 47808)).into();
        assert!(!unicast.is_broadcast());
        assert_eq!(unicast.to_string(), "127.0.0.1:47808");
    }
}
