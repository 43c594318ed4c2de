use std::time::{Duration, Instant};

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, HOST, HeaderMap, HeaderName, HeaderValue};
use http::response::Parts;
use http_body_util::{BodyExt as _, Full};
use hyper::Request;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

use super::wire::{
    has_header, host_header_value, parse_url, request_wire_bytes, response_head_bytes,
};
use super::{Error, HttpRequest, HttpResponse, Result};

/// Unreachable hosts otherwise hang on the OS connect timeout, which can
/// exceed a short run's whole duration.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

type Pooled = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Pooled HTTP/1.1 client shared by every VU of a run.
#[derive(Debug, Clone)]
pub struct HttpClient {
    pool: Pooled,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(Some(DEFAULT_CONNECT_TIMEOUT))
    }
}

impl HttpClient {
    #[must_use]
    pub fn new(connect_timeout: Option<Duration>) -> Self {
        let mut tcp = HttpConnector::new();
        tcp.enforce_http(false);
        tcp.set_nodelay(true);
        tcp.set_connect_timeout(connect_timeout);

        let tls = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(tcp);

        Self {
            pool: Client::builder(TokioExecutor::new()).build(tls),
        }
    }

    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.request(HttpRequest::get(url)).await
    }

    /// Sends `req` and reads the whole body. `req.timeout`, when set, bounds
    /// the exchange from send until the last body byte.
    pub async fn request(&self, req: HttpRequest) -> Result<HttpResponse> {
        let bytes_sent = request_wire_bytes(&req)?;
        let timeout = req.timeout;
        let outgoing = build_request(req)?;

        let started = Instant::now();
        let (parts, body) = match timeout {
            None => self.exchange(outgoing).await?,
            Some(limit) => tokio::time::timeout(limit, self.exchange(outgoing))
                .await
                .map_err(|_| Error::Timeout(limit))??,
        };
        let latency = started.elapsed();

        let head = response_head_bytes(parts.status, &parts.headers);
        Ok(HttpResponse {
            status: parts.status.as_u16(),
            headers: flatten_headers(&parts.headers),
            bytes_received: head.saturating_add(body.len() as u64),
            body,
            latency,
            bytes_sent,
        })
    }

    async fn exchange(&self, outgoing: Request<Full<Bytes>>) -> Result<(Parts, Bytes)> {
        let (parts, incoming) = self.pool.request(outgoing).await?.into_parts();
        let body = incoming.collect().await?.to_bytes();
        Ok((parts, body))
    }
}

// Implicit headers are made explicit so byte accounting matches what is sent.
fn build_request(req: HttpRequest) -> Result<Request<Full<Bytes>>> {
    let parsed = parse_url(&req.url)?;
    let uri: hyper::Uri = req
        .url
        .parse()
        .map_err(|_| Error::InvalidUrl(req.url.clone()))?;

    let mut builder = Request::builder().method(req.method).uri(uri);
    if !has_header(&req.headers, "host")
        && let Some(host) = host_header_value(&parsed)
    {
        builder = builder.header(HOST, host);
    }
    if !req.body.is_empty() && !has_header(&req.headers, "content-length") {
        builder = builder.header(CONTENT_LENGTH, req.body.len());
    }
    for (name, value) in &req.headers {
        builder = builder.header(
            HeaderName::from_bytes(name.as_bytes())?,
            HeaderValue::from_str(value)?,
        );
    }
    Ok(builder.body(Full::new(req.body))?)
}

/// Lowercased names in first-seen order; repeats are joined with ", ".
fn flatten_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::with_capacity(headers.keys_len());
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()))
            .collect::<Vec<_>>()
            .join(", ");
        out.push((name.as_str().to_owned(), joined));
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn connect_timeout_bounds_unreachable_hosts() {
        // TEST-NET-1 never answers.
        let client = HttpClient::new(Some(Duration::from_millis(200)));
        let started = Instant::now();
        client.get("http://192.0.2.1:81/").await.unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_connecting() {
        let client = HttpClient::default();
        let err = client.get("localhost:8000/api").await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidUrl(_) | Error::UnsupportedScheme(_)
        ));
    }

    #[test]
    fn repeated_headers_are_joined_in_order() {
        let mut headers = HeaderMap::new();
        headers.append("Set-Cookie", HeaderValue::from_static("a=1"));
        headers.append("content-type", HeaderValue::from_static("text/plain"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));

        let flat = flatten_headers(&headers);
        assert_eq!(
            flat,
            vec![
                ("set-cookie".to_owned(), "a=1, b=2".to_owned()),
                ("content-type".to_owned(), "text/plain".to_owned()),
            ]
        );
    }

    #[test]
    fn implicit_host_and_content_length_are_added() {
        let req = HttpRequest::post("http://example.test:8080/x", Bytes::from_static(b"abc"));
        let built = build_request(req).unwrap();
        assert_eq!(built.headers()[HOST], "example.test:8080");
        assert_eq!(built.headers()[CONTENT_LENGTH], "3");
    }
}
