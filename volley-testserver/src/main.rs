use std::net::SocketAddr;

use clap::Parser;
use tokio::net::TcpListener;
use volley_testserver::{TestServerStats, TestServerUrls, router};

/// Serves the volley test routes until Ctrl-C.
///
/// Prints `HTTP_URL=<url>` to stdout once the listener is bound.
#[derive(Debug, Parser)]
#[command(name = "volley-testserver", version)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let listener = TcpListener::bind(args.bind).await?;
    let urls = TestServerUrls::new(format!("http://{}", listener.local_addr()?));
    println!("HTTP_URL={}", urls.base_url);

    axum::serve(listener, router(TestServerStats::default()))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
