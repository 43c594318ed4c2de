//! Local HTTP target for exercising volley end to end.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};

pub const PATH_HELLO: &str = "/hello";
pub const PATH_TRACKS: &str = "/api/tracks/";
pub const PATH_SLOW: &str = "/slow";
pub const PATH_FLAKY: &str = "/flaky";
const PATH_DELAY: &str = "/delay/{ms}";
const PATH_STATUS: &str = "/status/{code}";

/// Upper bound for `/delay/{ms}` so a typo can't park a test forever.
const MAX_DELAY_MS: u64 = 10_000;

#[derive(Debug, Default)]
struct Counters {
    all: AtomicU64,
    tracks: AtomicU64,
}

/// Request counters shared between the router and the test that owns it.
#[derive(Debug, Clone, Default)]
pub struct TestServerStats(Arc<Counters>);

impl TestServerStats {
    /// Counts a request and returns how many came before it.
    fn hit(&self) -> u64 {
        self.0.all.fetch_add(1, Ordering::Relaxed)
    }

    pub fn requests_total(&self) -> u64 {
        self.0.all.load(Ordering::Relaxed)
    }

    pub fn tracks_total(&self) -> u64 {
        self.0.tracks.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct TestServerUrls {
    pub base_url: String,
    pub hello: String,
    pub tracks: String,
    pub slow: String,
    pub flaky: String,
}

impl TestServerUrls {
    pub fn new(base_url: String) -> Self {
        let at = |path: &str| format!("{base_url}{path}");
        Self {
            hello: at(PATH_HELLO),
            tracks: at(PATH_TRACKS),
            slow: at(PATH_SLOW),
            flaky: at(PATH_FLAKY),
            base_url,
        }
    }

    /// Route answering with the given status code.
    pub fn status(&self, code: u16) -> String {
        format!("{}/status/{code}", self.base_url)
    }

    /// Route answering 200 after sleeping for `delay`.
    pub fn delay(&self, delay: Duration) -> String {
        format!("{}/delay/{}", self.base_url, delay.as_millis())
    }
}

#[derive(Debug, Serialize)]
struct Track {
    id: u64,
    title: &'static str,
    album: &'static str,
    duration_seconds: u32,
}

#[derive(Debug, Serialize)]
struct TrackPage {
    count: usize,
    next: Option<String>,
    previous: Option<String>,
    results: Vec<Track>,
}

const CATALOG: [(&str, &str, u32); 3] = [
    ("Blue in Green", "Kind of Blue", 337),
    ("So What", "Kind of Blue", 562),
    ("Naima", "Giant Steps", 261),
];

fn track_page() -> TrackPage {
    let results: Vec<Track> = CATALOG
        .iter()
        .zip(1u64..)
        .map(|(&(title, album, duration_seconds), id)| Track {
            id,
            title,
            album,
            duration_seconds,
        })
        .collect();
    TrackPage {
        count: results.len(),
        next: None,
        previous: None,
        results,
    }
}

async fn hello(State(stats): State<TestServerStats>) -> &'static str {
    stats.hit();
    "Hello World!"
}

async fn tracks(State(stats): State<TestServerStats>) -> Json<TrackPage> {
    stats.hit();
    stats.0.tracks.fetch_add(1, Ordering::Relaxed);
    Json(track_page())
}

async fn slow(State(stats): State<TestServerStats>) -> &'static str {
    stats.hit();
    sleep(Duration::from_millis(50)).await;
    "slow"
}

async fn delayed(State(stats): State<TestServerStats>, Path(ms): Path<u64>) -> &'static str {
    stats.hit();
    sleep(Duration::from_millis(ms.min(MAX_DELAY_MS))).await;
    "delayed"
}

async fn with_status(
    State(stats): State<TestServerStats>,
    Path(code): Path<u16>,
) -> (StatusCode, &'static str) {
    stats.hit();
    match StatusCode::from_u16(code) {
        Ok(status) => (status, "status"),
        Err(_) => (StatusCode::BAD_REQUEST, "bad status code"),
    }
}

// Odd-numbered requests fail.
async fn flaky(State(stats): State<TestServerStats>) -> (StatusCode, &'static str) {
    if stats.hit() % 2 == 0 {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "boom")
    }
}

pub fn router(stats: TestServerStats) -> Router {
    Router::new()
        .route(PATH_HELLO, get(hello))
        .route(PATH_TRACKS, get(tracks))
        .route(PATH_SLOW, get(slow))
        .route(PATH_FLAKY, get(flaky))
        .route(PATH_DELAY, get(delayed))
        .route(PATH_STATUS, get(with_status))
        .with_state(stats)
}

/// Router bound to an ephemeral loopback port, serving on a background task.
pub struct TestServer {
    addr: SocketAddr,
    urls: TestServerUrls,
    stats: TestServerStats,
    stop: Option<oneshot::Sender<()>>,
    serving: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;
        let stats = TestServerStats::default();

        let (stop, stopped) = oneshot::channel::<()>();
        let app = router(stats.clone());
        let serving = tokio::spawn(async move {
            let shutdown = async move {
                stopped.await.ok();
            };
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                eprintln!("volley-testserver: serve failed: {err}");
            }
        });

        Ok(Self {
            addr,
            urls: TestServerUrls::new(format!("http://{addr}")),
            stats,
            stop: Some(stop),
            serving: Some(serving),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.urls.base_url
    }

    pub fn urls(&self) -> &TestServerUrls {
        &self.urls
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    /// Stops accepting connections and waits for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            stop.send(()).ok();
        }
        if let Some(serving) = self.serving.take() {
            serving.await.ok();
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(serving) = self.serving.take() {
            serving.abort();
        }
    }
}
