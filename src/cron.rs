use crate::Result;
use crate::config;
use crate::jsonrpc;
use crate::logging::*;
use crate::persistence::PgSampleStore;
use crate::reporter;
use crate::rocketpool::RocketPool;
use crate::sampler::{Sampler, SystemClock};
use chrono::Utc;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

const DEFAULT_SAMPLER_SCHEDULE: &str = "0 * * * * *"; // 毎分

pub async fn run() {
    let log = DEFAULT.new(o!("function" => "cron::run"));

    let schedule = match sampler_schedule() {
        Ok(schedule) => schedule,
        Err(err) => {
            error!(log, "invalid sampler schedule"; "error" => ?err);
            reporter::report_error(&err);
            return;
        }
    };

    let sampler = Arc::new(Sampler::from_config(
        RocketPool::from_config(jsonrpc::new_client()),
        PgSampleStore,
        SystemClock,
    ));
    let job = move || {
        let sampler = Arc::clone(&sampler);
        async move { sampler.sync().await.map(|_| ()) }
    };

    tokio::spawn(cronjob(schedule, job, "reth_apr_sampler"));
}

fn sampler_schedule() -> Result<cron::Schedule> {
    let conf = config::get("SAMPLER_CRON_SCHEDULE")
        .unwrap_or_else(|_| DEFAULT_SAMPLER_SCHEDULE.to_string());
    Ok(cron::Schedule::from_str(&conf)?)
}

/// `schedule` の時刻ごとに `func` を実行する
///
/// 前の実行が終わるまで次の時刻は計算しないので、同じジョブが重なることはない。
async fn cronjob<F, Fut>(schedule: cron::Schedule, func: F, name: &str)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    for next in schedule.upcoming(Utc) {
        if let Ok(wait) = (next - Utc::now()).to_std() {
            tokio::time::sleep(wait).await;
            let log = DEFAULT.new(o!("function" => "cronjob", "name" => name.to_owned()));
            match func().await {
                Ok(_) => info!(log, "success"),
                Err(err) => {
                    error!(log, "failure"; "error" => ?err);
                    reporter::report_error(&err);
                }
            }
        }
    }
}
