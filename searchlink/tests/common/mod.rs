//! Shared helpers: an in-memory cluster standing in for the HTTP transport

#![allow(dead_code)]

use searchlink::{
    Client, ClientConfig, HttpExecutor, HttpRequest, HttpResponse, RandomIndex, TransportError,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

pub type Handler =
    Box<dyn FnMut(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + 'static>;

/// Every request seen by a [`MockExecutor`], in order
#[derive(Clone, Default)]
pub struct RequestLog {
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    configures: Arc<Mutex<usize>>,
}

impl RequestLog {
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn configure_calls(&self) -> usize {
        *self.configures.lock().unwrap()
    }
}

pub struct MockExecutor {
    handler: Handler,
    log: RequestLog,
}

impl HttpExecutor for MockExecutor {
    fn execute(&mut self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.log.requests.lock().unwrap().push(request.clone());
        (self.handler)(request)
    }

    fn configure(&mut self, _config: &ClientConfig) -> searchlink::Result<()> {
        *self.log.configures.lock().unwrap() += 1;
        Ok(())
    }
}

/// Node URLs `http://node0:9200/` .. `http://node{n-1}:9200/`
pub fn hosts(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("http://node{}:9200/", i)).collect()
}

/// Client over `n` mocked nodes answering through `handler`
pub fn mock_client<F>(n: usize, handler: F) -> (Client, RequestLog)
where
    F: FnMut(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + 'static,
{
    let log = RequestLog::default();
    let executor = MockExecutor {
        handler: Box::new(handler),
        log: log.clone(),
    };
    let client = Client::with_executor_and_random(
        ClientConfig::new(hosts(n)),
        Box::new(executor),
        RandomIndex::seeded(11),
    )
    .unwrap();
    (client, log)
}

/// Part of the URL after `scheme://host/`
pub fn path_of(request: &HttpRequest) -> &str {
    request.url.splitn(4, '/').nth(3).unwrap_or("")
}

/// Host part of the URL, including trailing slash
pub fn host_of(request: &HttpRequest) -> String {
    let path = path_of(request);
    request.url[..request.url.len() - path.len()].to_string()
}

/// Scroll response body in the shape the cluster produces
pub fn scroll_response(scroll_id: &str, hits: usize, failed_shards: u64) -> String {
    json!({
        "_scroll_id": scroll_id,
        "took": 22,
        "timed_out": false,
        "_shards": {"total": 2 + failed_shards, "successful": 2, "failed": failed_shards},
        "hits": {"total": hits, "hits": vec![json!({"_source": {}}); hits]}
    })
    .to_string()
}

/// `scroll_id` carried by a continue or clear request body
pub fn scroll_id_of(request: &HttpRequest) -> Option<String> {
    let body: Value = serde_json::from_str(&request.body).ok()?;
    match &body["scroll_id"] {
        Value::String(id) => Some(id.clone()),
        Value::Array(ids) => ids.first().and_then(Value::as_str).map(String::from),
        _ => None,
    }
}
