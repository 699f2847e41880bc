//! Client configuration
//!
//! A [`ClientConfig`] can be deserialized from TOML or assembled in code,
//! then adjusted with [`ClientOption`] values. Every option is independent
//! of the others and a later option of the same kind replaces an earlier one.
//!
//! ```toml
//! hosts = ["http://es1:9200/", "http://es2:9200/"]
//! request_timeout_ms = 6000
//! connect_timeout_ms = 1000
//!
//! [proxies]
//! http = "http://proxy.local:8080"
//!
//! [tls]
//! verify_peer = true
//! ca_cert_path = "/etc/ssl/cluster-ca.pem"
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Base URLs of the cluster nodes
    pub hosts: Vec<String>,

    /// Whole-request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// TCP connect timeout in milliseconds
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,

    /// Proxy URL per scheme ("http", "https" or "all")
    #[serde(default)]
    pub proxies: HashMap<String, String>,

    /// TLS settings
    #[serde(default)]
    pub tls: TlsConfig,
}

fn default_request_timeout() -> u64 {
    6000
}

impl ClientConfig {
    /// Configuration for the given hosts with default transport settings
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
            request_timeout_ms: default_request_timeout(),
            connect_timeout_ms: None,
            proxies: HashMap::new(),
            tls: TlsConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply a sequence of options in order
    pub fn with_options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = ClientOption>,
    {
        for option in options {
            apply_option(&mut self, option);
        }
        self
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    /// Validate host URLs and make sure each ends with `/`.
    ///
    /// Request paths are appended verbatim to the selected host, so the
    /// trailing slash is required.
    pub fn normalized_hosts(&self) -> Result<Vec<String>> {
        if self.hosts.is_empty() {
            return Err(Error::NoEndpoints);
        }

        self.hosts
            .iter()
            .map(|host| {
                let parsed = url::Url::parse(host)
                    .map_err(|e| Error::Config(format!("Invalid host URL '{}': {}", host, e)))?;
                if parsed.cannot_be_a_base() {
                    return Err(Error::Config(format!("Host URL '{}' can not be a base", host)));
                }
                let mut normalized = host.clone();
                if !normalized.ends_with('/') {
                    normalized.push('/');
                }
                Ok(normalized)
            })
            .collect()
    }
}

/// TLS configuration for the HTTP transport
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Check that the server certificate matches the host name
    #[serde(default = "default_true")]
    pub verify_host: bool,

    /// Verify the server certificate chain
    #[serde(default = "default_true")]
    pub verify_peer: bool,

    /// Additional CA bundle (PEM format)
    pub ca_cert_path: Option<PathBuf>,

    /// Client certificate (PEM format)
    pub cert_path: Option<PathBuf>,

    /// Client private key (PEM format)
    pub key_path: Option<PathBuf>,

    /// Passphrase of the client private key
    pub key_passphrase: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            verify_host: true,
            verify_peer: true,
            ca_cert_path: None,
            cert_path: None,
            key_path: None,
            key_passphrase: None,
        }
    }
}

/// A single configuration setting applied on top of a [`ClientConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientOption {
    Timeout(Duration),
    ConnectTimeout(Duration),
    Proxies(HashMap<String, String>),
    VerifyHost(bool),
    VerifyPeer(bool),
    CaBundle(PathBuf),
    ClientCert(PathBuf),
    ClientKey {
        path: PathBuf,
        passphrase: Option<String>,
    },
}

/// Apply one option to the configuration, replacing any earlier value of the same kind
pub fn apply_option(config: &mut ClientConfig, option: ClientOption) {
    match option {
        ClientOption::Timeout(timeout) => {
            config.request_timeout_ms = duration_ms(timeout);
        }
        ClientOption::ConnectTimeout(timeout) => {
            config.connect_timeout_ms = Some(duration_ms(timeout));
        }
        ClientOption::Proxies(proxies) => {
            config.proxies = proxies;
        }
        ClientOption::VerifyHost(verify) => {
            config.tls.verify_host = verify;
        }
        ClientOption::VerifyPeer(verify) => {
            config.tls.verify_peer = verify;
        }
        ClientOption::CaBundle(path) => {
            config.tls.ca_cert_path = Some(path);
        }
        ClientOption::ClientCert(path) => {
            config.tls.cert_path = Some(path);
        }
        ClientOption::ClientKey { path, passphrase } => {
            config.tls.key_path = Some(path);
            config.tls.key_passphrase = passphrase;
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
