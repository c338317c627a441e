//! Server address configuration and URL normalization.
//!
//! The dashboard talks to one monitoring server over two surfaces: the
//! WebSocket channel (`ws://host:port/ws`) and the media HTTP endpoints on the
//! same host and port. This module turns whatever the user typed into a
//! validated channel URL and derives the HTTP base from it.
//!
//! # Address Resolution Precedence
//!
//! 1. Command line (`--server`)
//! 2. Configuration (file or `SECURITY_DASHBOARD_SERVER`)
//! 3. Default: `ws://127.0.0.1:8000/ws`
//!
//! # URL Normalization
//!
//! - Bare host:port (e.g., `192.168.1.20:8000` → `ws://192.168.1.20:8000/ws`)
//! - HTTP schemes are mapped to their WebSocket counterparts (`https` → `wss`)
//! - Missing port gets the server default (8000)
//! - Missing path gets `/ws`
//!
//! # Example
//!
//! ```
//! use security_dashboard::address::{AddressSource, ServerAddress};
//!
//! let addr = ServerAddress::parse("192.168.1.20:8000", AddressSource::CommandLine)?;
//! assert_eq!(addr.as_str(), "ws://192.168.1.20:8000/ws");
//! assert_eq!(addr.http_base().as_str(), "http://192.168.1.20:8000/");
//! # Ok::<(), security_dashboard::address::AddressError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Default port the monitoring server listens on.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Path of the WebSocket endpoint on the monitoring server.
pub const CHANNEL_PATH: &str = "/ws";

/// Server address used when nothing is configured.
pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:8000/ws";

/// Where the server address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressSource {
    /// Hardcoded default
    Default,
    /// Configuration file or environment override
    Config,
    /// `--server` on the command line
    CommandLine,
}

impl AddressSource {
    /// Returns a short label for log output.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Config => "config",
            Self::CommandLine => "cli",
        }
    }
}

impl fmt::Display for AddressSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "Default"),
            Self::Config => write!(f, "Configuration"),
            Self::CommandLine => write!(f, "Command line"),
        }
    }
}

/// Validated server channel address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    /// The normalized channel URL (always has ws/wss scheme, port and path)
    url: Url,
    /// Where this address came from
    source: AddressSource,
    /// Original input string (for display/debugging)
    original: String,
}

impl ServerAddress {
    /// Parse and normalize a server address.
    pub fn parse(input: &str, source: AddressSource) -> Result<Self, AddressError> {
        let url = normalize_url(input)?;
        Ok(Self {
            url,
            source,
            original: input.to_string(),
        })
    }

    /// Returns the normalized channel URL string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Returns the normalized channel URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns where this address came from.
    #[must_use]
    pub fn source(&self) -> AddressSource {
        self.source
    }

    /// Returns the original input string before normalization.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Returns `true` if the channel uses TLS (`wss`).
    #[must_use]
    pub fn is_tls(&self) -> bool {
        self.url.scheme() == "wss"
    }

    /// Base URL for the media HTTP endpoints on the same server.
    ///
    /// `ws` maps to `http` and `wss` to `https`; the path is reset to `/`.
    #[must_use]
    pub fn http_base(&self) -> Url {
        let mut base = self.url.clone();
        let scheme = if self.is_tls() { "https" } else { "http" };
        // ws/wss and http/https are all special schemes, so this cannot fail.
        let _ = base.set_scheme(scheme);
        base.set_path("/");
        base.set_query(None);
        base.set_fragment(None);
        base
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl FromStr for ServerAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, AddressSource::Default)
    }
}

impl Default for ServerAddress {
    fn default() -> Self {
        let url = Url::parse(DEFAULT_SERVER_URL)
            .unwrap_or_else(|_| unreachable!("default server URL is a valid literal"));
        Self {
            url,
            source: AddressSource::Default,
            original: DEFAULT_SERVER_URL.to_string(),
        }
    }
}

/// URL validation error with user-friendly messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Input was empty or whitespace-only
    EmptyInput,
    /// URL parsing failed
    InvalidUrl(String),
    /// No host was found in the URL
    MissingHost,
    /// Port could not be set
    InvalidPort(String),
    /// Unsupported URL scheme
    UnsupportedScheme(String),
}

impl std::error::Error for AddressError {}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "Address cannot be empty"),
            Self::InvalidUrl(e) => write!(f, "Invalid URL: {e}"),
            Self::MissingHost => write!(f, "URL must include a host"),
            Self::InvalidPort(e) => write!(f, "Invalid port: {e}"),
            Self::UnsupportedScheme(s) => {
                write!(f, "Unsupported scheme '{s}' (use ws, wss, http or https)")
            }
        }
    }
}

/// Normalize a server address into a channel URL.
///
/// - Trims whitespace
/// - Adds `ws://` if no scheme is given
/// - Maps `http` → `ws` and `https` → `wss`
/// - Adds the default port (8000) if missing
/// - Uses `/ws` when no path is given
///
/// Like any `url`-based parser, an explicit port equal to the scheme default
/// (80 for `ws`, 443 for `wss`) is indistinguishable from no port and gets
/// replaced by 8000.
pub fn normalize_url(input: &str) -> Result<Url, AddressError> {
    let input = input.trim();

    if input.is_empty() {
        return Err(AddressError::EmptyInput);
    }

    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("ws://{input}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| AddressError::InvalidUrl(e.to_string()))?;

    let channel_scheme = match url.scheme().to_lowercase().as_str() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        other => return Err(AddressError::UnsupportedScheme(other.to_string())),
    };
    if url.scheme() != channel_scheme {
        url.set_scheme(channel_scheme)
            .map_err(|()| AddressError::UnsupportedScheme(url.scheme().to_string()))?;
    }

    if url.host().is_none() {
        return Err(AddressError::MissingHost);
    }

    if url.port().is_none() {
        url.set_port(Some(DEFAULT_SERVER_PORT))
            .map_err(|()| AddressError::InvalidPort("Cannot set port on this URL".to_string()))?;
    }

    if url.path().is_empty() || url.path() == "/" {
        url.set_path(CHANNEL_PATH);
    }

    Ok(url)
}

/// Resolve the server address from command line and configuration.
///
/// Invalid higher-priority inputs are skipped with a warning so that a typo
/// on the command line still leaves a working dashboard.
pub fn resolve_address(cli: Option<&str>, configured: Option<&str>) -> ServerAddress {
    if let Some(input) = cli.filter(|s| !s.trim().is_empty()) {
        match ServerAddress::parse(input, AddressSource::CommandLine) {
            Ok(addr) => return addr,
            Err(e) => tracing::warn!("Ignoring --server '{}': {}", input, e),
        }
    }

    if let Some(input) = configured.filter(|s| !s.trim().is_empty()) {
        match ServerAddress::parse(input, AddressSource::Config) {
            Ok(addr) => return addr,
            Err(e) => tracing::warn!("Ignoring configured server '{}': {}", input, e),
        }
    }

    ServerAddress::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bare_host_port() {
        let url = normalize_url("127.0.0.1:8000").unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:8000/ws");
    }

    #[test]
    fn test_normalize_maps_http_schemes() {
        let url = normalize_url("http://camera.local:9000").unwrap();
        assert_eq!(url.as_str(), "ws://camera.local:9000/ws");

        let url = normalize_url("https://camera.example.com:8443").unwrap();
        assert_eq!(url.as_str(), "wss://camera.example.com:8443/ws");
    }

    #[test]
    fn test_normalize_adds_default_port() {
        let url = normalize_url("ws://localhost").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8000/ws");
    }

    #[test]
    fn test_normalize_keeps_explicit_path() {
        let url = normalize_url("ws://localhost:8000/live").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8000/live");
    }

    #[test]
    fn test_normalize_ipv6() {
        let url = normalize_url("[::1]:8080").unwrap();
        assert_eq!(url.as_str(), "ws://[::1]:8080/ws");
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        let url = normalize_url("  localhost:5000  ").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:5000/ws");
    }

    #[test]
    fn test_normalize_empty_input() {
        assert_eq!(normalize_url("").unwrap_err(), AddressError::EmptyInput);
        assert_eq!(normalize_url("   ").unwrap_err(), AddressError::EmptyInput);
    }

    #[test]
    fn test_normalize_unsupported_scheme() {
        let err = normalize_url("ftp://example.com").unwrap_err();
        assert!(matches!(err, AddressError::UnsupportedScheme(_)));
    }

    #[test]
    fn test_http_base() {
        let addr = ServerAddress::parse("wss://cam.example.com:8443/ws", AddressSource::Config)
            .unwrap();
        assert!(addr.is_tls());
        assert_eq!(addr.http_base().as_str(), "https://cam.example.com:8443/");
    }

    #[test]
    fn test_server_address_default() {
        let addr = ServerAddress::default();
        assert_eq!(addr.as_str(), DEFAULT_SERVER_URL);
        assert_eq!(addr.source(), AddressSource::Default);
        assert!(!addr.is_tls());
    }

    #[test]
    fn test_resolve_address_precedence() {
        let addr = resolve_address(Some("cli.local:7000"), Some("cfg.local:6000"));
        assert_eq!(addr.as_str(), "ws://cli.local:7000/ws");
        assert_eq!(addr.source(), AddressSource::CommandLine);

        let addr = resolve_address(None, Some("cfg.local:6000"));
        assert_eq!(addr.as_str(), "ws://cfg.local:6000/ws");
        assert_eq!(addr.source(), AddressSource::Config);

        let addr = resolve_address(Some("ftp://bad"), None);
        assert_eq!(addr.source(), AddressSource::Default);
    }

    #[test]
    fn test_address_source_labels() {
        assert_eq!(AddressSource::Default.label(), "default");
        assert_eq!(AddressSource::Config.label(), "config");
        assert_eq!(AddressSource::CommandLine.label(), "cli");
    }
}
