//! Probe targets.
//!
//! A host is either a raw IP address (probed with an ICMP echo) or an
//! http(s) URL (probed with a GET). The probe method is decided once, from
//! the syntax of the configured string.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// How a host is probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Icmp,
    Http,
}

impl fmt::Display for ProbeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeMethod::Icmp => f.write_str("icmp"),
            ProbeMethod::Http => f.write_str("http"),
        }
    }
}

/// A configured reachability target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Host {
    /// Raw IP address, probed via ICMP echo.
    Icmp(IpAddr),
    /// Absolute http(s) URL, probed via HTTP GET.
    Http(String),
}

impl Host {
    /// Classify a host string.
    pub fn parse(s: &str) -> ConfigResult<Self> {
        let s = s.trim();
        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Host::Icmp(ip));
        }

        let authority = s
            .strip_prefix("https://")
            .or_else(|| s.strip_prefix("http://"))
            .map(|rest| rest.split(['/', '?', '#']).next().unwrap_or_default());

        match authority {
            Some(authority) if !authority.is_empty() && !authority.contains(char::is_whitespace) => {
                Ok(Host::Http(s.to_string()))
            }
            _ => Err(ConfigError::InvalidHost(s.to_string())),
        }
    }

    /// The probe method implied by the host's syntax.
    pub fn method(&self) -> ProbeMethod {
        match self {
            Host::Icmp(_) => ProbeMethod::Icmp,
            Host::Http(_) => ProbeMethod::Http,
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Icmp(ip) => write!(f, "{ip}"),
            Host::Http(url) => f.write_str(url),
        }
    }
}

impl TryFrom<String> for Host {
    type Error = ConfigError;

    fn try_from(value: String) -> ConfigResult<Self> {
        Host::parse(&value)
    }
}

impl From<Host> for String {
    fn from(host: Host) -> Self {
        host.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_is_icmp() {
        let host = Host::parse("1.1.1.1").unwrap();
        assert_eq!(host.method(), ProbeMethod::Icmp);
        assert_eq!(host.to_string(), "1.1.1.1");
    }

    #[test]
    fn ipv6_is_icmp() {
        let host = Host::parse("2606:4700:4700::1111").unwrap();
        assert_eq!(host.method(), ProbeMethod::Icmp);
    }

    #[test]
    fn url_is_http() {
        let host = Host::parse("https://www.google.com").unwrap();
        assert_eq!(host, Host::Http("https://www.google.com".to_string()));
        assert_eq!(host.method(), ProbeMethod::Http);

        let host = Host::parse("http://192.168.1.1/status?x=1").unwrap();
        assert_eq!(host.method(), ProbeMethod::Http);
    }

    #[test]
    fn bare_hostname_is_rejected() {
        assert!(matches!(
            Host::parse("example.com"),
            Err(ConfigError::InvalidHost(_))
        ));
    }

    #[test]
    fn url_without_authority_is_rejected() {
        assert!(Host::parse("https://").is_err());
        assert!(Host::parse("http:///path").is_err());
        assert!(Host::parse("ftp://example.com").is_err());
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let host = Host::parse("  8.8.8.8 ").unwrap();
        assert_eq!(host, Host::Icmp("8.8.8.8".parse().unwrap()));
    }
}
