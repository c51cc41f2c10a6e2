use crate::Result;
use crate::errors::Error;
use crate::jsonrpc::abi;
use crate::jsonrpc::{BlockHeader, BlockId, BlockInfo, EthCall};
use crate::logging::*;
use anyhow::anyhow;
use rand::Rng;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;


#[derive(Debug)]
pub struct StandardRpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,

    retry_limit: u16,
    delay_limit: Duration,
    delay_fluctuation: f32,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl RpcResponse {
    fn into_result(self) -> Result<Value> {
        if let Some(err) = self.error {
            return Err(Error::RpcResponse {
                code: err.code,
                message: err.message,
            }
            .into());
        }
        self.result
            .ok_or_else(|| Error::MissingField("result").into())
    }
}

impl StandardRpcClient {
    pub fn new(
        url: String,
        retry_limit: u16,
        delay_limit: Duration,
        delay_fluctuation: f32,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            url,
            next_id: AtomicU64::new(1),
            retry_limit,
            delay_limit,
            delay_fluctuation,
        }
    }

    async fn call_maybe_retry(&self, method: &str, params: &Value) -> MaybeRetry<Value> {
        let log = DEFAULT.new(o!(
            "function" => "jsonrpc::Client::call_maybe_retry",
            "method" => method.to_owned(),
        ));
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });
        debug!(log, "calling");

        let res = match self.http.post(&self.url).json(&body).send().await {
            Ok(res) => res,
            Err(err) => {
                debug!(log, "transport error"; "error" => %err);
                if err.is_timeout() || err.is_connect() || err.is_request() {
                    return MaybeRetry::Retry {
                        msg: err.to_string(),
                        err: err.into(),
                        min_dur: Duration::from_secs_f32(0.5),
                    };
                }
                return MaybeRetry::Through(Err(err.into()));
            }
        };

        let status = res.status();
        if let Some(min_dur) = retry_delay_for_status(status) {
            debug!(log, "response status error"; "status" => %status);
            return MaybeRetry::Retry {
                err: anyhow!("response status: {}", status),
                msg: format!("status {}", status),
                min_dur,
            };
        }
        if !status.is_success() {
            // 認証エラーなどはリトライしても解決しない
            return MaybeRetry::Through(Err(anyhow!("response status: {}", status)));
        }

        match res.json::<RpcResponse>().await {
            Ok(response) => {
                trace!(log, "success");
                MaybeRetry::Through(response.into_result())
            }
            Err(err) => {
                // 一時的な不完全レスポンスの可能性
                debug!(log, "payload parse error"; "error" => %err);
                MaybeRetry::Retry {
                    msg: err.to_string(),
                    err: err.into(),
                    min_dur: Duration::from_secs(2),
                }
            }
        }
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let log = DEFAULT.new(o!(
            "function" => "jsonrpc::Client::request",
            "method" => method.to_owned(),
            "retry_limit" => format!("{}", self.retry_limit),
        ));
        let calc_delay =
            calc_retry_duration(self.delay_limit, self.retry_limit, self.delay_fluctuation);
        let mut retry_count: u16 = 0;

        loop {
            match self.call_maybe_retry(method, &params).await {
                MaybeRetry::Through(res) => return res,
                MaybeRetry::Retry { err, msg, min_dur } => {
                    retry_count += 1;
                    if self.retry_limit < retry_count {
                        warn!(log, "retry limit reached"; "reason" => msg);
                        return Err(err);
                    }
                    let delay = calc_delay(retry_count).max(min_dur);
                    debug!(log, "retrying";
                        "retry_count" => retry_count,
                        "delay" => format!("{:?}", delay),
                        "reason" => msg,
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl BlockInfo for StandardRpcClient {
    async fn get_block(&self, block: BlockId) -> Result<BlockHeader> {
        let value = self
            .request("eth_getBlockByNumber", json!([block.to_param(), false]))
            .await?;
        parse_block_header(&value)
    }
}

impl EthCall for StandardRpcClient {
    async fn eth_call(&self, to: &str, data: &[u8], block: BlockId) -> Result<Vec<u8>> {
        let value = self
            .request(
                "eth_call",
                json!([{ "to": to, "data": abi::to_hex(data) }, block.to_param()]),
            )
            .await?;
        let hex = value.as_str().ok_or(Error::MissingField("eth_call result"))?;
        abi::parse_data(hex)
    }
}

fn parse_block_header(value: &Value) -> Result<BlockHeader> {
    if value.is_null() {
        return Err(Error::MissingField("block").into());
    }
    let number = value
        .get("number")
        .and_then(Value::as_str)
        .ok_or(Error::MissingField("number"))?;
    let timestamp = value
        .get("timestamp")
        .and_then(Value::as_str)
        .ok_or(Error::MissingField("timestamp"))?;
    let timestamp = abi::parse_quantity(timestamp)?;
    Ok(BlockHeader {
        number: abi::parse_quantity(number)?,
        timestamp: i64::try_from(timestamp).map_err(|_| Error::Overflow(timestamp.to_string()))?,
    })
}

/// リトライすべきステータスなら最小待ち時間を返す
fn retry_delay_for_status(status: StatusCode) -> Option<Duration> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        Some(Duration::from_secs(1))
    } else if status.is_server_error() {
        Some(Duration::from_secs_f32(0.5))
    } else {
        None
    }
}

enum MaybeRetry<A> {
    Through(Result<A>),
    Retry {
        err: anyhow::Error,
        msg: String,
        min_dur: Duration,
    },
}

fn calc_retry_duration(upper: Duration, retry_limit: u16, fr: f32) -> impl Fn(u16) -> Duration {
    const N: f32 = 1.0 / std::f32::consts::E;
    move |retry_count: u16| -> Duration {
        if retry_count == 0 || retry_limit < retry_count {
            return Duration::ZERO;
        }
        if retry_limit <= 1 {
            return fluctuate_duration(upper, fr);
        }
        let b = (retry_count - 1) as f32 / (retry_limit - 1) as f32;
        let y = (upper.as_millis() as f32) / (1.0 / b).powf(N);
        let y = fluctuate(y, fr);
        Duration::from_millis(y as u64)
    }
}

fn fluctuate_duration(d: Duration, fr: f32) -> Duration {
    Duration::from_millis(fluctuate(d.as_millis() as f32, fr) as u64)
}

fn fluctuate(y: f32, fr: f32) -> f32 {
    let r = y * fr;
    if r > 0.0 {
        let mut rng = rand::rng();
        let v = rng.random_range(0.0..(r * 2.0)) - r;
        y + v
    } else {
        y
    }
}
