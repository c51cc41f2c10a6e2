mod apr;
mod chart;
mod commission;
mod config;
mod cron;
mod dev_time;
mod embed;
mod errors;
mod jsonrpc;
mod logging;
mod persistence;
mod reporter;
mod rocketpool;
mod sampler;
mod web;

type Result<T> = anyhow::Result<T>;

#[tokio::main]
async fn main() {
    use logging::*;

    let log = DEFAULT.new(o!("function" => "main"));
    info!(log, "Starting up");
    debug!(log, "log level check");
    trace!(log, "log level check");

    cron::run().await;
    if let Err(err) = web::run().await {
        crit!(log, "web server stopped"; "error" => ?err);
        std::process::exit(1);
    }
}
