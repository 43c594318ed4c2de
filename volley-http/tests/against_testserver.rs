use std::time::Duration;

use volley_http::{Error, HttpClient, HttpRequest};
use volley_testserver::TestServer;

#[tokio::test]
async fn tracks_page_reports_latency_and_bytes() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start().await?;
    let client = HttpClient::default();

    let res = client.get(&server.urls().tracks).await?;
    assert_eq!(res.status, 200);
    assert!(res.body_utf8().is_some_and(|b| b.contains("\"title\"")));
    assert_eq!(res.header("content-type"), Some("application/json"));
    assert!(res.latency > Duration::ZERO);
    assert!(res.bytes_sent > 0);
    assert!(res.bytes_received as usize > res.body.len());

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn status_route_echoes_requested_code() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start().await?;
    let client = HttpClient::default();

    let res = client.get(&server.urls().status(503)).await?;
    assert_eq!(res.status, 503);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn request_timeout_surfaces_as_timeout_error() -> Result<(), Box<dyn std::error::Error>> {
    let server = TestServer::start().await?;
    let client = HttpClient::default();

    let req = HttpRequest::get(server.urls().delay(Duration::from_millis(500)))
        .with_timeout(Duration::from_millis(50));
    let err = match client.request(req).await {
        Ok(res) => return Err(format!("expected timeout, got status {}", res.status).into()),
        Err(err) => err,
    };
    assert!(matches!(err, Error::Timeout(_)));
    assert_eq!(err.transport_error_kind().to_string(), "timeout");

    server.shutdown().await;
    Ok(())
}
