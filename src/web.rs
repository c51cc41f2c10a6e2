mod basic;
mod commission;
mod reth_apr;

use crate::Result;
use crate::commission::cache::CommissionChartCache;
use crate::config;
use crate::jsonrpc::{self, StandardRpcClient};
use crate::logging::*;
use crate::persistence::PgSampleStore;
use crate::rocketpool::RocketPool;
use axum::Router;
use axum::http::StatusCode;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

struct AppState {
    rocketpool: RocketPool<StandardRpcClient>,
    store: PgSampleStore,
    commission_cache: Mutex<CommissionChartCache>,
    apr_sample_count: usize,
}

impl AppState {
    fn from_config() -> Self {
        let apr_sample_count = config::get("APR_SAMPLE_COUNT")
            .and_then(|v| Ok(v.parse()?))
            .unwrap_or(30);
        Self {
            rocketpool: RocketPool::from_config(jsonrpc::new_client()),
            store: PgSampleStore,
            commission_cache: Mutex::new(CommissionChartCache::new()),
            apr_sample_count,
        }
    }
}

pub async fn run() -> Result<()> {
    let log = DEFAULT.new(o!("function" => "web::run"));

    let state = Arc::new(AppState::from_config());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = add_routes(
        Router::new(),
        &[basic::add_route, reth_apr::add_route, commission::add_route],
    )
    .with_state(state)
    .layer(cors);

    let address =
        config::get("WEB_BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(log, "listening"; "address" => &address);
    axum::serve(listener, app).await?;
    Ok(())
}

fn add_routes<T>(app: Router<T>, funcs: &[fn(Router<T>) -> Router<T>]) -> Router<T> {
    let mut app = app;
    for func in funcs {
        app = func(app);
    }
    app
}

/// ハンドラ内の失敗を 500 にする
fn internal_error(name: &str, err: anyhow::Error) -> (StatusCode, String) {
    let log = DEFAULT.new(o!("function" => "web::internal_error", "handler" => name.to_owned()));
    error!(log, "request failed"; "error" => ?err);
    (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {err}"))
}
