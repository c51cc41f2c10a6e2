mod connection_pool;
pub mod reth_apr;
pub mod schema;

use crate::Result;
use std::future::Future;

pub use reth_apr::{PgSampleStore, Sample};

/// rETH 交換レートのサンプル置き場
///
/// ブロック番号ごとに高々 1 件。`insert` は同じブロックが既にあれば何もしない。
pub trait SampleStore {
    /// ブロック番号が最大のサンプル
    fn find_latest(&self) -> impl Future<Output = Result<Option<Sample>>> + Send;

    /// ブロック番号の降順で最大 `n` 件
    fn find_recent(&self, n: usize) -> impl Future<Output = Result<Vec<Sample>>> + Send;

    /// 挿入したら `true`、既存ブロックなら `false`
    fn insert(&self, sample: Sample) -> impl Future<Output = Result<bool>> + Send;
}
