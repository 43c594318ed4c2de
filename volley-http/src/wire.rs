//! Best-effort HTTP/1.1 framing estimates used for byte accounting.

use super::{Error, HttpRequest, Result};

const HTTP11: &str = "HTTP/1.1";

/// Estimated request size on the wire: request line, headers (including the
/// implicit `host`/`content-length` the client adds), blank line and body.
pub fn request_wire_bytes(req: &HttpRequest) -> Result<u64> {
    let parsed = parse_url(&req.url)?;
    let uri: hyper::Uri = req
        .url
        .parse()
        .map_err(|_| Error::InvalidUrl(req.url.clone()))?;
    let path = uri.path_and_query().map_or("/", |p| p.as_str());

    // "METHOD SP path SP HTTP/1.1 CRLF"
    let mut total = line_bytes(&[req.method.as_str(), path, HTTP11]);
    for (k, v) in &req.headers {
        total = total.saturating_add(header_bytes(k.as_bytes(), v.as_bytes()));
    }
    if !has_header(&req.headers, "host")
        && let Some(host) = host_header_value(&parsed)
    {
        total = total.saturating_add(header_bytes(b"host", host.as_bytes()));
    }
    let body_len = req.body.len() as u64;
    if body_len != 0 && !has_header(&req.headers, "content-length") {
        total = total.saturating_add(header_bytes(
            b"content-length",
            body_len.to_string().as_bytes(),
        ));
    }

    Ok(total.saturating_add(2).saturating_add(body_len))
}

/// Estimated response head size: status line (no reason phrase), headers, blank line.
pub(super) fn response_head_bytes(status: http::StatusCode, headers: &http::HeaderMap) -> u64 {
    let mut total = line_bytes(&[HTTP11, status.as_str()]);
    for (name, value) in headers {
        total = total.saturating_add(header_bytes(name.as_str().as_bytes(), value.as_bytes()));
    }
    total.saturating_add(2)
}

pub(super) fn parse_url(raw: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(raw).map_err(|_| Error::InvalidUrl(raw.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(Error::UnsupportedScheme(raw.to_string())),
    }
}

pub(super) fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
}

pub(super) fn host_header_value(parsed: &url::Url) -> Option<String> {
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{host}:{port}")),
        None => Some(host.to_string()),
    }
}

fn line_bytes(parts: &[&str]) -> u64 {
    let words: u64 = parts.iter().map(|p| p.len() as u64).sum();
    let spaces = parts.len().saturating_sub(1) as u64;
    words + spaces + 2
}

// "name: value\r\n"
fn header_bytes(name: &[u8], value: &[u8]) -> u64 {
    (name.len() + value.len() + 4) as u64
}
