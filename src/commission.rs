pub mod cache;
pub mod chart;
pub mod curve;

use crate::Result;
use crate::jsonrpc::ContractCall;
use crate::logging::*;
use crate::rocketpool;
use cache::CommissionChartCache;
use chart::ChartPlan;
use curve::{CommissionCurve, FeeParameters};
use std::sync::Arc;

#[cfg(test)]
mod tests;

pub async fn fetch_fee_parameters<C: ContractCall>(client: &C) -> Result<FeeParameters> {
    Ok(FeeParameters {
        min_fee: rocketpool::minimum_node_fee(client).await?,
        max_fee: rocketpool::maximum_node_fee(client).await?,
        target_fee: rocketpool::target_node_fee(client).await?,
        demand_range: rocketpool::node_fee_demand_range(client).await?,
    })
}

/// 現在の需要とパラメータから描画計画を作る。曲線が描けなければ `None`
pub async fn fetch_chart_plan<C: ContractCall>(
    client: &C,
    current_commission: f64,
) -> Result<Option<ChartPlan>> {
    let log = DEFAULT.new(o!("function" => "commission::fetch_chart_plan"));

    let params = fetch_fee_parameters(client).await?;
    let Some(curve) = CommissionCurve::new(params) else {
        info!(log, "commission curve unavailable";
            "min_fee" => params.min_fee,
            "max_fee" => params.max_fee,
            "demand_range" => params.demand_range,
        );
        return Ok(None);
    };
    let demand = rocketpool::node_demand(client).await?;
    debug!(log, "plan";
        "demand" => demand,
        "commission" => current_commission,
    );
    Ok(Some(ChartPlan::new(&curve, demand, current_commission)))
}

/// 現在のコミッションに対するチャート (PNG)
///
/// コミッションが前回と同じならキャッシュを返すので、パラメータは取りに行かない。
pub async fn commission_chart<C: ContractCall>(
    client: &C,
    cache: &mut CommissionChartCache,
) -> Result<Option<Arc<[u8]>>> {
    let log = DEFAULT.new(o!("function" => "commission::commission_chart"));

    let commission = rocketpool::node_fee(client).await?;
    if cache.cached_commission() == Some(commission) {
        debug!(log, "cache hit"; "commission" => commission);
    } else {
        info!(log, "rendering"; "commission" => commission);
    }
    cache
        .get_or_render(commission, || async move {
            match fetch_chart_plan(client, commission).await? {
                Some(plan) => Ok(Some(chart::render(&plan)?)),
                None => Ok(None),
            }
        })
        .await
}
