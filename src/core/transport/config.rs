//! Transport selection.
//!
//! `MCP_TRANSPORT` picks the transport (`stdio` unless set); `tcp` reads
//! `MCP_TCP_HOST` and `MCP_TCP_PORT`.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which transport the server listens on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// One session over the process's stdin and stdout.
    #[cfg(feature = "stdio")]
    Stdio,

    /// One session per accepted socket, newline-delimited frames.
    #[cfg(feature = "tcp")]
    Tcp(TcpConfig),
}

/// Listener address for the TCP transport.
#[cfg(feature = "tcp")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpConfig {
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

#[cfg(feature = "tcp")]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "tcp")]
const DEFAULT_TCP_PORT: u16 = 3000;

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            Self::Stdio
        }

        #[cfg(all(not(feature = "stdio"), feature = "tcp"))]
        {
            Self::Tcp(TcpConfig::default())
        }

        #[cfg(not(any(feature = "stdio", feature = "tcp")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio or tcp");
        }
    }
}

#[cfg(feature = "tcp")]
impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_TCP_PORT,
            host: default_host(),
        }
    }
}

#[cfg(feature = "tcp")]
impl TcpConfig {
    /// `host:port` to bind.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl TransportConfig {
    /// Read the transport selection from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the transport selection through an arbitrary variable lookup.
    ///
    /// Unknown or disabled transports fall back to the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let transport = lookup("MCP_TRANSPORT").unwrap_or_default().to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "tcp")]
            "tcp" => {
                let mut tcp = TcpConfig::default();
                if let Some(port) = lookup("MCP_TCP_PORT") {
                    match port.parse() {
                        Ok(port) => tcp.port = port,
                        Err(_) => warn!("Ignoring invalid MCP_TCP_PORT '{}'", port),
                    }
                }
                if let Some(host) = lookup("MCP_TCP_HOST") {
                    tcp.host = host;
                }
                Self::Tcp(tcp)
            }
            "" => Self::default(),
            other => {
                warn!("Unsupported MCP_TRANSPORT '{}'; using the default", other);
                Self::default()
            }
        }
    }

    /// Human-readable name for logs.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "stdin/stdout".to_string(),
            #[cfg(feature = "tcp")]
            Self::Tcp(cfg) => format!("TCP on {}", cfg.address()),
        }
    }
}
