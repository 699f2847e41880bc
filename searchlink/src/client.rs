//! Cluster client
//!
//! Document-level REST operations on top of the [`Dispatcher`]. All paths
//! are relative to whichever node the rotation currently selects.

use crate::config::{apply_option, ClientConfig, ClientOption};
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::rotation::{EndpointRotation, RandomIndex};
use crate::transport::{HttpExecutor, HttpMethod, HttpResponse, ReqwestExecutor};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Client shared by [`Bulk`](crate::Bulk) and [`Scroll`](crate::Scroll) instances.
///
/// The mutex serializes whole dispatch rounds, so rotation state is never
/// observed half-updated.
pub type SharedClient = Arc<Mutex<Client>>;

/// Client for the nodes of one cluster
pub struct Client {
    config: ClientConfig,
    dispatcher: Dispatcher,
}

impl Client {
    /// Create a client for the given node URLs with default settings
    pub fn new<I, S>(hosts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_config(ClientConfig::new(hosts))
    }

    /// Create a client for the given node URLs and options
    pub fn with_options<I, S, O>(hosts: I, options: O) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        O: IntoIterator<Item = ClientOption>,
    {
        Self::with_config(ClientConfig::new(hosts).with_options(options))
    }

    /// Create a client backed by the reqwest transport
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let hosts = config.normalized_hosts()?;
        let executor = ReqwestExecutor::new(&config)?;
        Self::assemble(config, hosts, Box::new(executor), RandomIndex::new())
    }

    /// Create a client with a custom transport
    pub fn with_executor(config: ClientConfig, executor: Box<dyn HttpExecutor>) -> Result<Self> {
        Self::with_executor_and_random(config, executor, RandomIndex::new())
    }

    /// Create a client with a custom transport and start-node generator
    pub fn with_executor_and_random(
        config: ClientConfig,
        executor: Box<dyn HttpExecutor>,
        random: RandomIndex,
    ) -> Result<Self> {
        let hosts = config.normalized_hosts()?;
        Self::assemble(config, hosts, executor, random)
    }

    fn assemble(
        config: ClientConfig,
        hosts: Vec<String>,
        executor: Box<dyn HttpExecutor>,
        random: RandomIndex,
    ) -> Result<Self> {
        let rotation = EndpointRotation::with_random(hosts, random)?;
        debug!(
            hosts = rotation.len(),
            start = rotation.current(),
            "Cluster client created"
        );
        Ok(Self {
            config,
            dispatcher: Dispatcher::new(rotation, executor),
        })
    }

    /// Wrap the client for sharing between bulk and scroll helpers
    pub fn into_shared(self) -> SharedClient {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Normalised node URLs in rotation order
    pub fn hosts(&self) -> &[String] {
        self.dispatcher.rotation().endpoints()
    }

    /// Node the next request is sent to
    pub fn current_host(&self) -> &str {
        self.dispatcher.rotation().current()
    }

    /// Change one setting after construction and rebuild the transport
    pub fn set_client_option(&mut self, option: ClientOption) -> Result<()> {
        let mut config = self.config.clone();
        apply_option(&mut config, option);
        self.dispatcher.executor_mut().configure(&config)?;
        self.config = config;
        Ok(())
    }

    /// Perform a request on cluster nodes until one of them answers.
    ///
    /// `path` is the part of the URL following `scheme://host/`.
    pub fn perform_request(
        &mut self,
        method: HttpMethod,
        path: &str,
        body: &str,
    ) -> Result<HttpResponse> {
        self.dispatcher.dispatch(method, path, body)
    }

    /// Search `[{index}/][{doc_type}/]_search`
    pub fn search(
        &mut self,
        index: Option<&str>,
        doc_type: Option<&str>,
        body: &str,
        routing: Option<&str>,
    ) -> Result<HttpResponse> {
        let mut path = String::new();
        push_optional_segment(&mut path, index);
        push_optional_segment(&mut path, doc_type);
        path.push_str("_search");
        push_routing(&mut path, routing);
        self.perform_request(HttpMethod::Post, &path, body)
    }

    /// Retrieve a document by id
    pub fn get(
        &mut self,
        index: &str,
        doc_type: &str,
        id: &str,
        routing: Option<&str>,
    ) -> Result<HttpResponse> {
        let path = document_path(index, doc_type, Some(id), routing)?;
        self.perform_request(HttpMethod::Get, &path, "")
    }

    /// Index a document; with no id the cluster generates one
    pub fn index(
        &mut self,
        index: &str,
        doc_type: &str,
        id: Option<&str>,
        body: &str,
        routing: Option<&str>,
    ) -> Result<HttpResponse> {
        let id = id.unwrap_or_default();
        let path = if id.is_empty() {
            let mut path = type_prefix(index, doc_type)?;
            push_routing(&mut path, routing);
            path
        } else {
            document_path(index, doc_type, Some(id), routing)?
        };
        self.perform_request(HttpMethod::Post, &path, body)
    }

    /// Delete a document by id
    pub fn remove(
        &mut self,
        index: &str,
        doc_type: &str,
        id: &str,
        routing: Option<&str>,
    ) -> Result<HttpResponse> {
        let path = document_path(index, doc_type, Some(id), routing)?;
        self.perform_request(HttpMethod::Delete, &path, "")
    }
}

fn required<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    if value.is_empty() {
        return Err(Error::InvalidArgument(format!("Argument {} can not be empty", name)));
    }
    Ok(value)
}

fn push_optional_segment(path: &mut String, segment: Option<&str>) {
    if let Some(segment) = segment.filter(|s| !s.is_empty()) {
        path.push_str(segment);
        path.push('/');
    }
}

fn type_prefix(index: &str, doc_type: &str) -> Result<String> {
    Ok(format!(
        "{}/{}/",
        required("index", index)?,
        required("doc_type", doc_type)?
    ))
}

fn document_path(
    index: &str,
    doc_type: &str,
    id: Option<&str>,
    routing: Option<&str>,
) -> Result<String> {
    let mut path = type_prefix(index, doc_type)?;
    path.push_str(required("id", id.unwrap_or_default())?);
    push_routing(&mut path, routing);
    Ok(path)
}

fn push_routing(path: &mut String, routing: Option<&str>) {
    if let Some(routing) = routing.filter(|r| !r.is_empty()) {
        path.push_str("?routing=");
        path.extend(url::form_urlencoded::byte_serialize(routing.as_bytes()));
    }
}
