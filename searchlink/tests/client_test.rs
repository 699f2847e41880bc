//! Dispatch and document operations against a mocked cluster

mod common;

use common::{host_of, mock_client, path_of};
use searchlink::transport::JSON_CONTENT_TYPE;
use searchlink::{
    Bulk, Client, ClientConfig, ClientOption, Error, HttpMethod, HttpResponse, Scroll,
    TransportError,
};
use std::collections::HashSet;
use std::time::Duration;

fn echo(status: u16) -> impl FnMut(&searchlink::HttpRequest) -> Result<HttpResponse, TransportError> {
    move |request| Ok(HttpResponse::new(status, request.body.clone()))
}

#[test]
fn test_search_paths() {
    let (mut client, log) = mock_client(1, echo(201));
    let body = r#"{"search": "A"}"#;

    let response = client.search(Some("indexA"), Some("typeA"), body, None).unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(response.body, body);

    client.search(None, None, body, Some("r1")).unwrap();
    client.search(Some("indexA"), None, body, None).unwrap();

    let requests = log.requests();
    assert_eq!(path_of(&requests[0]), "indexA/typeA/_search");
    assert_eq!(path_of(&requests[1]), "_search?routing=r1");
    assert_eq!(path_of(&requests[2]), "indexA/_search");
    assert!(requests.iter().all(|r| r.method == HttpMethod::Post));
}

#[test]
fn test_document_operations() {
    let (mut client, log) = mock_client(1, echo(200));

    client.get("indexA", "typeA", "123", None).unwrap();
    client
        .index("indexA", "typeA", Some("321"), r#"{"name": "John"}"#, Some("u1"))
        .unwrap();
    client.index("indexA", "typeA", None, "{}", None).unwrap();
    client.remove("indexA", "typeA", "321", None).unwrap();

    let requests = log.requests();
    assert_eq!(requests[0].method, HttpMethod::Get);
    assert_eq!(path_of(&requests[0]), "indexA/typeA/123");
    assert_eq!(requests[1].method, HttpMethod::Post);
    assert_eq!(path_of(&requests[1]), "indexA/typeA/321?routing=u1");
    assert_eq!(requests[1].body, r#"{"name": "John"}"#);
    assert_eq!(path_of(&requests[2]), "indexA/typeA/");
    assert_eq!(requests[3].method, HttpMethod::Delete);
    assert_eq!(path_of(&requests[3]), "indexA/typeA/321");
}

#[test]
fn test_content_type_only_with_body() {
    let (mut client, log) = mock_client(1, echo(200));

    client.get("i", "t", "1", None).unwrap();
    client.index("i", "t", Some("1"), "{}", None).unwrap();

    let requests = log.requests();
    assert!(requests[0].header("Content-Type").is_none());
    assert!(requests[0].body.is_empty());
    assert_eq!(requests[1].header("Content-Type"), Some(JSON_CONTENT_TYPE));
}

#[test]
fn test_missing_arguments_fail_before_network() {
    let (mut client, log) = mock_client(1, echo(200));

    assert!(matches!(client.get("", "t", "1", None), Err(Error::InvalidArgument(_))));
    assert!(matches!(client.get("i", "t", "", None), Err(Error::InvalidArgument(_))));
    assert!(matches!(client.remove("i", "", "1", None), Err(Error::InvalidArgument(_))));
    assert!(matches!(
        client.index("", "t", None, "{}", None),
        Err(Error::InvalidArgument(_))
    ));
    assert_eq!(log.len(), 0);
}

#[test]
fn test_hosts_failed() {
    let (mut client, log) = mock_client(2, |_| Err(TransportError::new("connection refused")));

    let err = client.search(Some("fake"), Some("fake"), "{}", None).unwrap_err();
    assert!(matches!(err, Error::ConnectionFailure(_)));
    assert_eq!(log.len(), 2);
}

#[test]
fn test_round_visits_each_host_once_and_next_round_is_full() {
    let (mut client, log) = mock_client(3, |_| Ok(HttpResponse::new(503, "overloaded")));

    assert!(client.perform_request(HttpMethod::Get, "x", "").is_err());
    let first_round: HashSet<String> = log.requests().iter().map(host_of).collect();
    assert_eq!(first_round.len(), 3);
    assert_eq!(log.len(), 3);

    assert!(client.perform_request(HttpMethod::Get, "x", "").is_err());
    let second_round: HashSet<String> = log.requests()[3..].iter().map(host_of).collect();
    assert_eq!(second_round.len(), 3);
    assert_eq!(log.len(), 6);
}

#[test]
fn test_failover_then_sticky_success() {
    let mut calls = 0;
    let (mut client, log) = mock_client(3, move |_| {
        calls += 1;
        if calls == 1 {
            Err(TransportError::new("timeout"))
        } else {
            Ok(HttpResponse::new(200, "ok"))
        }
    });

    client.perform_request(HttpMethod::Get, "a", "").unwrap();
    client.perform_request(HttpMethod::Get, "b", "").unwrap();

    let requests = log.requests();
    assert_eq!(requests.len(), 3);
    assert_ne!(host_of(&requests[0]), host_of(&requests[1]));
    // the node that answered keeps serving
    assert_eq!(host_of(&requests[1]), host_of(&requests[2]));
    assert_eq!(client.current_host(), host_of(&requests[2]));
}

#[test]
fn test_not_found_is_an_answer() {
    let (mut client, log) = mock_client(3, |_| Ok(HttpResponse::new(404, "Not Found")));

    let response = client.get("i", "t", "missing", None).unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(log.len(), 1);
}

#[test]
fn test_empty_host_list_rejected_everywhere() {
    assert!(matches!(Client::new(Vec::<String>::new()), Err(Error::NoEndpoints)));
    assert!(matches!(
        Client::with_config(ClientConfig::new(Vec::<String>::new())),
        Err(Error::NoEndpoints)
    ));
    assert!(matches!(
        Bulk::with_hosts(Vec::<String>::new(), Duration::from_secs(6)),
        Err(Error::NoEndpoints)
    ));
    assert!(matches!(
        Scroll::with_hosts(Vec::<String>::new(), 100, "1m", Duration::from_secs(6)),
        Err(Error::NoEndpoints)
    ));
    assert!(matches!(
        Scroll::scan_with_hosts(Vec::<String>::new(), 100, "1m", 5, Duration::from_secs(6)),
        Err(Error::NoEndpoints)
    ));
}

#[test]
fn test_hosts_are_normalized() {
    let client = Client::new(["http://es1:9200", "https://es2:9243/"]).unwrap();
    assert_eq!(client.hosts(), ["http://es1:9200/", "https://es2:9243/"]);
}

#[test]
fn test_set_client_option_reconfigures_transport() {
    let (mut client, log) = mock_client(1, echo(200));

    client
        .set_client_option(ClientOption::Timeout(Duration::from_secs(30)))
        .unwrap();
    client
        .set_client_option(ClientOption::ConnectTimeout(Duration::from_millis(500)))
        .unwrap();

    assert_eq!(log.configure_calls(), 2);
    assert_eq!(client.config().request_timeout_ms, 30_000);
    assert_eq!(client.config().connect_timeout_ms, Some(500));
}
