use crate::Result;
use crate::errors::Error;
use crate::logging::*;
use crate::persistence::SampleStore;
use crate::persistence::connection_pool;
use crate::persistence::schema::reth_apr;
use anyhow::anyhow;
use diesel::prelude::*;
use serde::Serialize;


/// 残高ブロック時点の rETH 交換レート
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub block: u64,
    /// unix 秒
    pub time: i64,
    pub value: f64,
}

// データベース用モデル
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = reth_apr)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct DbSample {
    pub block: i64,
    pub time: i64,
    pub value: f64,
}

impl TryFrom<DbSample> for Sample {
    type Error = Error;

    fn try_from(db: DbSample) -> std::result::Result<Self, Self::Error> {
        Ok(Sample {
            block: u64::try_from(db.block).map_err(|_| Error::Overflow(db.block.to_string()))?,
            time: db.time,
            value: db.value,
        })
    }
}

impl TryFrom<&Sample> for DbSample {
    type Error = Error;

    fn try_from(sample: &Sample) -> std::result::Result<Self, Self::Error> {
        Ok(DbSample {
            block: i64::try_from(sample.block)
                .map_err(|_| Error::Overflow(sample.block.to_string()))?,
            time: sample.time,
            value: sample.value,
        })
    }
}

/// PostgreSQL の `reth_apr` テーブル
#[derive(Debug, Clone, Copy, Default)]
pub struct PgSampleStore;

impl SampleStore for PgSampleStore {
    async fn find_latest(&self) -> Result<Option<Sample>> {
        let conn = connection_pool::get().await?;
        let row = conn
            .interact(|conn| {
                reth_apr::table
                    .order_by(reth_apr::block.desc())
                    .select(DbSample::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;
        Ok(row.map(Sample::try_from).transpose()?)
    }

    async fn find_recent(&self, n: usize) -> Result<Vec<Sample>> {
        let limit = i64::try_from(n).map_err(|_| Error::Overflow(n.to_string()))?;
        let conn = connection_pool::get().await?;
        let rows = conn
            .interact(move |conn| {
                reth_apr::table
                    .order_by(reth_apr::block.desc())
                    .limit(limit)
                    .select(DbSample::as_select())
                    .load(conn)
            })
            .await
            .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;
        Ok(rows
            .into_iter()
            .map(Sample::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }

    async fn insert(&self, sample: Sample) -> Result<bool> {
        let log = DEFAULT.new(o!(
            "function" => "PgSampleStore::insert",
            "block" => sample.block,
        ));
        let row = DbSample::try_from(&sample)?;
        let conn = connection_pool::get().await?;
        let inserted = conn
            .interact(move |conn| {
                diesel::insert_into(reth_apr::table)
                    .values(&row)
                    .on_conflict(reth_apr::block)
                    .do_nothing()
                    .execute(conn)
            })
            .await
            .map_err(|e| anyhow!("Database interaction error: {:?}", e))??;
        if inserted == 0 {
            debug!(log, "already stored");
        }
        Ok(inserted > 0)
    }
}
