//! Blocking reqwest executor

use super::{HttpExecutor, HttpMethod, HttpRequest, HttpResponse, TransportError};
use crate::config::{ClientConfig, TlsConfig};
use crate::error::{Error, Result};
use reqwest::blocking::{Client, ClientBuilder};
use std::collections::HashMap;
use std::fs;
use tracing::{debug, warn};

/// [`HttpExecutor`] backed by `reqwest::blocking`
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
        })
    }
}

impl HttpExecutor for ReqwestExecutor {
    fn execute(&mut self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let mut builder = self.client.request(to_reqwest_method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn configure(&mut self, config: &ClientConfig) -> Result<()> {
        self.client = build_client(config)?;
        Ok(())
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
    }
}

fn build_client(config: &ClientConfig) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(concat!("searchlink/", env!("CARGO_PKG_VERSION")))
        .timeout(config.request_timeout());

    if let Some(connect_timeout) = config.connect_timeout() {
        builder = builder.connect_timeout(connect_timeout);
    }

    for (scheme, proxy_url) in &config.proxies {
        let proxy = match scheme.as_str() {
            "http" => reqwest::Proxy::http(proxy_url)?,
            "https" => reqwest::Proxy::https(proxy_url)?,
            "all" => reqwest::Proxy::all(proxy_url)?,
            other => {
                return Err(Error::Config(format!(
                    "Unsupported proxy scheme '{}' (expected http, https or all)",
                    other
                )))
            }
        };
        debug!(scheme = %scheme, proxy = %proxy_url, "Using proxy");
        builder = builder.proxy(proxy);
    }

    builder = apply_tls(builder, &config.tls)?;
    Ok(builder.build()?)
}

fn apply_tls(mut builder: ClientBuilder, tls: &TlsConfig) -> Result<ClientBuilder> {
    if !tls.verify_peer {
        warn!("TLS peer verification disabled");
        builder = builder.danger_accept_invalid_certs(true);
    } else if !tls.verify_host {
        // rustls has no hostname-only switch
        warn!("TLS host verification disabled, certificate verification is relaxed as well");
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(ca_path) = &tls.ca_cert_path {
        let pem = fs::read(ca_path)?;
        let certificate = reqwest::Certificate::from_pem(&pem).map_err(|e| {
            Error::Config(format!("Invalid CA bundle {}: {}", ca_path.display(), e))
        })?;
        builder = builder.add_root_certificate(certificate);
    }

    match (&tls.cert_path, &tls.key_path) {
        (Some(cert_path), Some(key_path)) => {
            if tls.key_passphrase.is_some() {
                return Err(Error::Config(
                    "Encrypted client keys are not supported, provide an unencrypted PEM key"
                        .to_string(),
                ));
            }
            let mut pem = fs::read(cert_path)?;
            pem.push(b'\n');
            pem.extend(fs::read(key_path)?);
            let identity = reqwest::Identity::from_pem(&pem).map_err(|e| {
                Error::Config(format!(
                    "Invalid client identity {} / {}: {}",
                    cert_path.display(),
                    key_path.display(),
                    e
                ))
            })?;
            builder = builder.identity(identity);
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(Error::Config(
                "Client certificate and client key must be configured together".to_string(),
            ));
        }
        (None, None) => {}
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientOption;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_build_default_executor() {
        let config = ClientConfig::new(["http://localhost:9200/"]);
        assert!(ReqwestExecutor::new(&config).is_ok());
    }

    #[test]
    fn test_build_with_timeouts_and_proxy() {
        let mut proxies = HashMap::new();
        proxies.insert("http".to_string(), "http://proxy.local:8080".to_string());
        let config = ClientConfig::new(["http://localhost:9200/"]).with_options([
            ClientOption::Timeout(Duration::from_secs(30)),
            ClientOption::ConnectTimeout(Duration::from_secs(1)),
            ClientOption::Proxies(proxies),
        ]);
        assert!(ReqwestExecutor::new(&config).is_ok());
    }

    #[test]
    fn test_unknown_proxy_scheme_rejected() {
        let mut proxies = HashMap::new();
        proxies.insert("gopher".to_string(), "http://proxy.local:8080".to_string());
        let config = ClientConfig::new(["http://localhost:9200/"])
            .with_options([ClientOption::Proxies(proxies)]);
        assert!(matches!(ReqwestExecutor::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_cert_without_key_rejected() {
        let config = ClientConfig::new(["http://localhost:9200/"])
            .with_options([ClientOption::ClientCert(PathBuf::from("cert.pem"))]);
        assert!(matches!(ReqwestExecutor::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_ca_bundle_is_io_error() {
        let config = ClientConfig::new(["http://localhost:9200/"])
            .with_options([ClientOption::CaBundle(PathBuf::from("/nonexistent/ca.pem"))]);
        assert!(matches!(ReqwestExecutor::new(&config), Err(Error::Io(_))));
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        let config = ClientConfig::new(["http://127.0.0.1:1/"])
            .with_options([ClientOption::ConnectTimeout(Duration::from_millis(200))]);
        let mut executor = ReqwestExecutor::new(&config).unwrap();
        let request = HttpRequest::new(HttpMethod::Get, "http://127.0.0.1:1/".into(), "");
        assert!(executor.execute(&request).is_err());
    }
}
