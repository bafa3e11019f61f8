use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Address family of a textual IP address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    /// Classify a textual address. Anything that is not a bare IPv4 or IPv6
    /// literal (ports, brackets, zone ids, hostnames) is `None`.
    pub fn classify(addr: &str) -> Option<Self> {
        if addr.parse::<Ipv4Addr>().is_ok() {
            Some(IpFamily::V4)
        } else if addr.parse::<Ipv6Addr>().is_ok() {
            Some(IpFamily::V6)
        } else {
            None
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => write!(f, "IPv4"),
            IpFamily::V6 => write!(f, "IPv6"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4() {
        assert_eq!(IpFamily::classify("203.0.113.5"), Some(IpFamily::V4));
        assert_eq!(IpFamily::classify("0.0.0.0"), Some(IpFamily::V4));
    }

    #[test]
    fn test_ipv6() {
        assert_eq!(IpFamily::classify("2001:db8::1"), Some(IpFamily::V6));
        assert_eq!(IpFamily::classify("::1"), Some(IpFamily::V6));
        // v4-mapped addresses are still IPv6 literals
        assert_eq!(IpFamily::classify("::ffff:203.0.113.5"), Some(IpFamily::V6));
    }

    #[test]
    fn test_unclassifiable() {
        for addr in ["", "localhost", "203.0.113", "203.0.113.5:443", "[::1]", "256.1.1.1", " 1.2.3.4"] {
            assert_eq!(IpFamily::classify(addr), None, "{:?}", addr);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(IpFamily::V4.to_string(), "IPv4");
        assert_eq!(IpFamily::V6.to_string(), "IPv6");
    }
}
