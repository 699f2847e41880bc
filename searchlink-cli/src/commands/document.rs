//! Single-request commands: get, search, index, delete

use anyhow::{Context, Result};
use searchlink::{Client, HttpResponse};

/// Print a response as `HTTP <status>` followed by the (pretty-printed when JSON) body
fn print_response(response: &HttpResponse) {
    println!("HTTP {}", response.status);
    match serde_json::from_str::<serde_json::Value>(&response.body) {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(pretty) => println!("{}", pretty),
            Err(_) => println!("{}", response.body),
        },
        Err(_) if response.body.is_empty() => {}
        Err(_) => println!("{}", response.body),
    }
    if !response.is_success() {
        tracing::warn!(status = response.status, "Cluster answered with an error status");
    }
}

pub fn run_get(
    client: &mut Client,
    index: &str,
    doc_type: &str,
    id: &str,
    routing: Option<&str>,
) -> Result<()> {
    let response = client
        .get(index, doc_type, id, routing)
        .with_context(|| format!("Failed to get {}/{}/{}", index, doc_type, id))?;
    print_response(&response);
    Ok(())
}

pub fn run_search(
    client: &mut Client,
    index: Option<&str>,
    doc_type: Option<&str>,
    query: &str,
    routing: Option<&str>,
) -> Result<()> {
    check_json(query)?;
    let response = client
        .search(index, doc_type, query, routing)
        .context("Search failed")?;
    print_response(&response);
    Ok(())
}

pub fn run_index(
    client: &mut Client,
    index: &str,
    doc_type: &str,
    id: Option<&str>,
    body: &str,
    routing: Option<&str>,
) -> Result<()> {
    check_json(body)?;
    let response = client
        .index(index, doc_type, id, body, routing)
        .with_context(|| format!("Failed to index document into {}/{}", index, doc_type))?;
    print_response(&response);
    Ok(())
}

pub fn run_delete(
    client: &mut Client,
    index: &str,
    doc_type: &str,
    id: &str,
    routing: Option<&str>,
) -> Result<()> {
    let response = client
        .remove(index, doc_type, id, routing)
        .with_context(|| format!("Failed to delete {}/{}/{}", index, doc_type, id))?;
    print_response(&response);
    Ok(())
}

fn check_json(body: &str) -> Result<()> {
    serde_json::from_str::<serde_json::Value>(body)
        .with_context(|| format!("Body is not valid JSON: {}", preview(body)))?;
    Ok(())
}

/// First 100 characters of a document, for error messages
pub fn preview(text: &str) -> String {
    text.chars().take(100).collect()
}
