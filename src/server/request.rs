use may_minihttp::Request;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;
use tracing::{debug, info};

/// Request data extracted from a `may_minihttp::Request`.
#[derive(Debug, PartialEq)]
pub struct ParsedRequest {
    pub method: String,
    /// Request path without the query string
    pub path: String,
    /// HTTP headers (lowercase keys)
    pub headers: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    /// Body parsed as JSON; `None` when the request had no body
    pub body: Option<Value>,
    /// Parse error for a non-empty body that is not valid JSON
    pub body_error: Option<String>,
}

/// Parse query string parameters from a URL path.
///
/// Everything after `?` is form-urlencoded; names and values are decoded.
pub fn parse_query_params(path: &str) -> HashMap<String, String> {
    match path.split_once('?') {
        Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        None => HashMap::new(),
    }
}

/// Decode a JSON body. Empty (or whitespace) bodies are treated as absent.
pub fn parse_body(raw: &str) -> (Option<Value>, Option<String>) {
    if raw.trim().is_empty() {
        return (None, None);
    }
    match serde_json::from_str(raw) {
        Ok(value) => (Some(value), None),
        Err(err) => (None, Some(err.to_string())),
    }
}

/// Extract method, path, headers, query and JSON body.
///
/// Reading the body consumes the request, so everything else is copied out first.
pub fn parse_request(req: Request) -> ParsedRequest {
    let method = req.method().to_string();
    let raw_path = req.path().to_string();
    let path = raw_path.split('?').next().unwrap_or("/").to_string();

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();
    debug!(
        header_count = headers.len(),
        header_names = ?headers.keys().take(20).collect::<Vec<_>>(),
        "Headers extracted"
    );

    let query_params = parse_query_params(&raw_path);

    let mut raw_body = String::new();
    let (body, body_error) = match req.body().read_to_string(&mut raw_body) {
        Ok(size) if size > 0 => {
            debug!(body_size_bytes = size, "Request body read");
            parse_body(&raw_body)
        }
        Ok(_) => (None, None),
        Err(err) => (None, Some(err.to_string())),
    };

    info!(
        method = %method,
        path = %path,
        query_count = query_params.len(),
        has_body = body.is_some(),
        "HTTP request parsed"
    );

    ParsedRequest {
        method,
        path,
        headers,
        query_params,
        body,
        body_error,
    }
}
