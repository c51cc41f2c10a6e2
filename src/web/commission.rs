use super::reth_apr::png_response;
use super::{AppState, internal_error};
use crate::commission;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use std::sync::Arc;

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route("/commission/chart.png", get(commission_chart))
}

async fn commission_chart(
    State(state): State<Arc<AppState>>,
) -> Result<Response, (StatusCode, String)> {
    let mut cache = state.commission_cache.lock().await;
    let image = commission::commission_chart(&state.rocketpool, &mut cache)
        .await
        .map_err(|e| internal_error("commission_chart", e))?;
    Ok(png_response(image.map(|i| Bytes::copy_from_slice(&i))))
}
