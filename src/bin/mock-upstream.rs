//! Stand-in upstream for manual testing. Toggle failures with
//! `POST /fail` and `POST /recover`.

use axum::{extract::State, http::StatusCode, routing::{get, post}, Router};
use clap::Parser;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "mock-upstream")]
struct Args {
    #[arg(short, long, default_value = "127.0.0.1:6060")]
    bind: String,

    /// Start in the failing state.
    #[arg(long)]
    fail: bool,
}

#[derive(Default)]
struct Upstream {
    failing: AtomicBool,
    hits: AtomicU64,
}

async fn service2(State(state): State<Arc<Upstream>>) -> (StatusCode, String) {
    let hit = state.hits.fetch_add(1, Ordering::SeqCst) + 1;
    if state.failing.load(Ordering::SeqCst) {
        tracing::info!(hit, "Responding with 500");
        (StatusCode::INTERNAL_SERVER_ERROR, String::new())
    } else {
        tracing::info!(hit, "Responding with 200");
        (StatusCode::OK, "Response From Server".to_string())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    resilient_fetch::observability::logging::init("info");

    let state = Arc::new(Upstream::default());
    state.failing.store(args.fail, Ordering::SeqCst);

    let app = Router::new()
        .route("/service2", get(service2))
        .route(
            "/fail",
            post(|State(s): State<Arc<Upstream>>| async move { s.failing.store(true, Ordering::SeqCst) }),
        )
        .route(
            "/recover",
            post(|State(s): State<Arc<Upstream>>| async move { s.failing.store(false, Ordering::SeqCst) }),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    tracing::info!(address = %listener.local_addr()?, "Mock upstream listening");
    axum::serve(listener, app).await?;
    Ok(())
}
