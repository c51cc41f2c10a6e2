use crate::Result;
use crate::config;
use crate::jsonrpc::{BlockId, BlockInfo, ContractCall};
use crate::logging::*;
use crate::persistence::{Sample, SampleStore};
use crate::rocketpool;
use anyhow::bail;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;


pub const DEFAULT_RETENTION_DAYS: u32 = 30;
pub const DEFAULT_STEP_PAUSE: Duration = Duration::from_millis(10);

/// 現在時刻と待機の差し替え口
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await
    }
}

/// チェーンの先頭から保存済みのブロックまで遡って rETH のサンプルを集める
pub struct Sampler<C, S, K> {
    client: C,
    store: S,
    clock: K,
    retention: chrono::Duration,
    step_pause: Duration,
}

fn retention_days() -> u32 {
    config::get("SAMPLER_RETENTION_DAYS")
        .and_then(|v| Ok(v.parse()?))
        .unwrap_or(DEFAULT_RETENTION_DAYS)
}

fn step_pause() -> Duration {
    config::get("SAMPLER_STEP_PAUSE")
        .and_then(|v| Ok(humantime::parse_duration(&v)?))
        .unwrap_or(DEFAULT_STEP_PAUSE)
}

impl<C, S, K> Sampler<C, S, K> {
    pub fn new(client: C, store: S, clock: K, retention_days: u32, step_pause: Duration) -> Self {
        Self {
            client,
            store,
            clock,
            retention: chrono::Duration::days(i64::from(retention_days)),
            step_pause,
        }
    }

    pub fn from_config(client: C, store: S, clock: K) -> Self {
        Self::new(client, store, clock, retention_days(), step_pause())
    }
}

impl<C, S, K> Sampler<C, S, K>
where
    C: BlockInfo + ContractCall + Sync,
    S: SampleStore + Sync,
    K: Clock + Sync,
{
    /// 1 回分の同期。挿入した件数を返す
    ///
    /// 途中で失敗したらそこで打ち切る。次の回は最初からやり直す。
    pub async fn sync(&self) -> Result<usize> {
        let log = DEFAULT.new(o!("function" => "Sampler::sync"));

        let latest_stored = self.store.find_latest().await?.map_or(0, |s| s.block);
        let head = self.client.get_block(BlockId::Latest).await?;
        let horizon = (self.clock.now() - self.retention).timestamp();
        info!(log, "start";
            "latest_stored" => latest_stored,
            "head" => head.number,
            "horizon" => horizon,
        );

        let mut cursor = head.number;
        let mut inserted = 0;
        loop {
            let balances_block = rocketpool::balances_block(&self.client, cursor.into()).await?;
            if balances_block == latest_stored {
                debug!(log, "caught up"; "block" => balances_block);
                break;
            }
            if balances_block == 0 {
                debug!(log, "no balances recorded"; "cursor" => cursor);
                break;
            }
            if balances_block < latest_stored {
                warn!(log, "store is ahead of chain";
                    "balances_block" => balances_block,
                    "latest_stored" => latest_stored,
                );
                break;
            }
            if balances_block > cursor {
                bail!(
                    "balances block {} is ahead of cursor {}",
                    balances_block,
                    cursor
                );
            }

            let block = self.client.get_block(balances_block.into()).await?;
            if block.timestamp < horizon {
                debug!(log, "reached retention horizon";
                    "block" => balances_block,
                    "time" => block.timestamp,
                );
                break;
            }

            let value = rocketpool::reth_exchange_rate(&self.client, cursor.into()).await?;
            let sample = Sample {
                block: balances_block,
                time: block.timestamp,
                value,
            };
            if self.store.insert(sample).await? {
                inserted += 1;
                trace!(log, "inserted"; "block" => sample.block, "value" => sample.value);
            }

            cursor = balances_block - 1;
            self.clock.sleep(self.step_pause).await;
        }

        info!(log, "finished"; "inserted" => inserted);
        Ok(inserted)
    }
}
