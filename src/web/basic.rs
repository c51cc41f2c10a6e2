use super::AppState;
use crate::dev_time;
use crate::embed::Embed;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use std::sync::Arc;

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route("/healthcheck", get(|| async { "OK" }))
        .route("/dev_time", get(dev_time_embed))
}

async fn dev_time_embed() -> Json<Embed> {
    Json(dev_time::dev_time(Utc::now()))
}
