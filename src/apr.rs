pub mod chart;

use crate::Result;
use crate::logging::*;
use crate::persistence::{Sample, SampleStore};
use serde::Serialize;


pub const SECONDS_PER_YEAR: f64 = (365 * 24 * 60 * 60) as f64;

/// 移動平均を取る点数
pub const TRAILING_WINDOW: usize = 7;

/// 隣り合う 2 サンプルから求めた年率
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AprPoint {
    /// unix 秒 (後側のサンプルの時刻)
    pub time: i64,
    pub instantaneous_apr: f64,
    /// 直近 7 点の平均。7 点そろうまでは `None`
    pub trailing_7_apr: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AprHeadline {
    NoData,
    InsufficientData { points: usize },
    Available { trailing_7_apr: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AprReport {
    pub series: Vec<AprPoint>,
    pub headline: AprHeadline,
}

/// `prev` から `cur` までの変化を年率に換算する
///
/// 時間差が 0 以下、または `cur.value` が 0 の場合は計算できないので `None`。
pub fn instantaneous_apr(prev: &Sample, cur: &Sample) -> Option<f64> {
    let duration = cur.time - prev.time;
    if duration <= 0 || cur.value == 0.0 {
        return None;
    }
    let period_change = cur.value - prev.value;
    let period_change_over_year = period_change / duration as f64 * SECONDS_PER_YEAR;
    let apr = (cur.value + period_change_over_year) / cur.value - 1.0;
    apr.is_finite().then_some(apr)
}

/// 時刻の昇順に並んだサンプルから年率の系列を作る
///
/// 先頭のサンプルは基準にしか使わないので、結果は高々 `samples.len() - 1` 点。
pub fn compute_apr_series(samples: &[Sample]) -> Vec<AprPoint> {
    let log = DEFAULT.new(o!(
        "function" => "compute_apr_series",
        "samples" => samples.len(),
    ));

    let mut aprs: Vec<f64> = Vec::with_capacity(samples.len().saturating_sub(1));
    let mut points = Vec::with_capacity(aprs.capacity());
    for pair in samples.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let Some(apr) = instantaneous_apr(prev, cur) else {
            warn!(log, "skipping sample pair";
                "prev_block" => prev.block,
                "cur_block" => cur.block,
                "duration" => cur.time - prev.time,
                "cur_value" => cur.value,
            );
            continue;
        };
        aprs.push(apr);
        points.push(AprPoint {
            time: cur.time,
            instantaneous_apr: apr,
            trailing_7_apr: trailing_average(&aprs),
        });
    }
    points
}

fn trailing_average(aprs: &[f64]) -> Option<f64> {
    if aprs.len() < TRAILING_WINDOW {
        return None;
    }
    let window = &aprs[aprs.len() - TRAILING_WINDOW..];
    Some(window.iter().sum::<f64>() / TRAILING_WINDOW as f64)
}

/// 系列の最後の移動平均を見出しにする
pub fn headline(series: &[AprPoint]) -> AprHeadline {
    match series.last().and_then(|p| p.trailing_7_apr) {
        Some(trailing_7_apr) => AprHeadline::Available { trailing_7_apr },
        None => AprHeadline::InsufficientData {
            points: series.len(),
        },
    }
}

/// 直近 `count` 件のサンプルから現在の APR を求める
pub async fn current_apr<S: SampleStore>(store: &S, count: usize) -> Result<AprReport> {
    let mut samples = store.find_recent(count).await?;
    if samples.is_empty() {
        return Ok(AprReport {
            series: vec![],
            headline: AprHeadline::NoData,
        });
    }
    samples.sort_by_key(|s| s.time);

    let series = compute_apr_series(&samples);
    let headline = headline(&series);
    Ok(AprReport { series, headline })
}

pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}
