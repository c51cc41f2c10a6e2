use super::{AppState, internal_error};
use crate::apr::{self, AprHeadline, AprReport, TRAILING_WINDOW};
use crate::embed::Embed;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;


pub const CHART_PATH: &str = "/reth_apr/chart.png";

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route("/reth_apr", get(current_reth_apr))
        .route(CHART_PATH, get(reth_apr_chart))
}

pub fn apr_embed(report: &AprReport) -> Embed {
    let embed = Embed::titled("Current rETH APR");
    match report.headline {
        AprHeadline::NoData => embed.description("No data available yet."),
        AprHeadline::InsufficientData { points } => embed.description(format!(
            "Not enough data for a {} day average yet ({} of {} points).",
            TRAILING_WINDOW, points, TRAILING_WINDOW
        )),
        AprHeadline::Available { trailing_7_apr } => embed
            .field(
                "Observed rETH APR (7 day average):",
                format!(
                    "{} (Commissions Fees accounted for)",
                    apr::format_percent(trailing_7_apr)
                ),
                false,
            )
            .image(CHART_PATH),
    }
}

async fn current_reth_apr(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Embed>, (StatusCode, String)> {
    let report = apr::current_apr(&state.store, state.apr_sample_count)
        .await
        .map_err(|e| internal_error("current_reth_apr", e))?;
    Ok(Json(apr_embed(&report)))
}

async fn reth_apr_chart(
    State(state): State<Arc<AppState>>,
) -> Result<Response, (StatusCode, String)> {
    let report = apr::current_apr(&state.store, state.apr_sample_count)
        .await
        .map_err(|e| internal_error("reth_apr_chart", e))?;
    let image =
        apr::chart::render(&report.series).map_err(|e| internal_error("reth_apr_chart", e))?;
    Ok(png_response(image.map(Bytes::from)))
}

/// PNG を返す。画像がなければ 404
pub fn png_response(image: Option<Bytes>) -> Response {
    match image {
        Some(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        None => (StatusCode::NOT_FOUND, "No chart available").into_response(),
    }
}
