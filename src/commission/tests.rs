use super::*;
use crate::jsonrpc::BlockId;
use crate::jsonrpc::abi::Word;
use chart::MarkerKind;
use curve::{CUBIC_SAMPLES, FLAT_SAMPLES, Side};
use num_bigint::BigInt;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

fn params(min_fee: f64, max_fee: f64, target_fee: f64, demand_range: f64) -> FeeParameters {
    FeeParameters {
        min_fee,
        max_fee,
        target_fee,
        demand_range,
    }
}

/// 曲線の式そのものの値
fn fee_at(p: &FeeParameters, demand: f64) -> f64 {
    let r = p.demand_range;
    if demand <= -r {
        p.min_fee
    } else if demand >= r {
        p.max_fee
    } else if demand < 0.0 {
        (p.target_fee - p.min_fee) * (demand / r).powi(3) + p.target_fee
    } else {
        (p.max_fee - p.target_fee) * (demand / r).powi(3) + p.target_fee
    }
}

/// `value * 10^decimals` のワード
fn fixed(value: i64, decimals: u32) -> Word {
    Word::from(&(BigInt::from(value) * BigInt::from(10).pow(decimals)))
}

/// メソッド名ごとに固定の値を返すモッククライアント
struct MockClient {
    values: HashMap<&'static str, Word>,
    calls: Mutex<Vec<String>>,
}

impl MockClient {
    fn new(min: i64, max: i64, target: i64, range: i64, demand: i64, fee: i64) -> Self {
        let values = HashMap::from([
            (
                "rocketDAOProtocolSettingsNetwork.getMinimumNodeFee",
                fixed(min, 16),
            ),
            (
                "rocketDAOProtocolSettingsNetwork.getMaximumNodeFee",
                fixed(max, 16),
            ),
            (
                "rocketDAOProtocolSettingsNetwork.getTargetNodeFee",
                fixed(target, 16),
            ),
            (
                "rocketDAOProtocolSettingsNetwork.getNodeFeeDemandRange",
                fixed(range, 18),
            ),
            ("rocketNetworkFees.getNodeDemand", fixed(demand, 18)),
            ("rocketNetworkFees.getNodeFee", fixed(fee, 16)),
        ]);
        Self {
            values,
            calls: Mutex::new(vec![]),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ContractCall for MockClient {
    async fn call(&self, method: &str, _block: BlockId) -> Result<Word> {
        self.calls.lock().unwrap().push(method.to_string());
        self.values
            .get(method)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("unexpected method: {}", method))
    }
}

#[test]
fn test_degenerate_curve_is_unavailable() {
    assert!(CommissionCurve::new(params(10.0, 10.0, 10.0, 1000.0)).is_none());
    assert!(CommissionCurve::new(params(5.0, 20.0, 14.0, 0.0)).is_none());
    assert!(CommissionCurve::new(params(5.0, 20.0, 14.0, -1.0)).is_none());
}

#[test]
fn test_curve_points() {
    let curve = CommissionCurve::new(params(5.0, 20.0, 14.0, 1000.0)).unwrap();
    let points = curve.points();
    assert_eq!(points.len(), 2 * CUBIC_SAMPLES + 2 * FLAT_SAMPLES);

    assert_eq!(points.first().copied(), Some((-1200.0, 5.0)));
    assert_eq!(points.last().copied(), Some((1200.0, 20.0)));

    // 左の 3 次部分は min から target へ、右は target から max へ
    let left = &points[FLAT_SAMPLES..FLAT_SAMPLES + CUBIC_SAMPLES];
    assert_eq!(left.first().copied(), Some((-1000.0, 5.0)));
    assert_eq!(left.last().copied(), Some((0.0, 14.0)));
    let right = &points[FLAT_SAMPLES + CUBIC_SAMPLES..FLAT_SAMPLES + 2 * CUBIC_SAMPLES];
    assert_eq!(right.first().copied(), Some((0.0, 14.0)));
    assert_eq!(right.last().copied(), Some((1000.0, 20.0)));

    for window in points.windows(2) {
        assert!(window[0].0 <= window[1].0);
        assert!(window[0].1 <= window[1].1);
    }
    for &(x, y) in points {
        assert!((fee_at(curve.params(), x) - y).abs() < 1e-9, "x = {}", x);
    }
}

#[test]
fn test_curve_ranges() {
    let curve = CommissionCurve::new(params(5.0, 20.0, 14.0, 1000.0)).unwrap();
    assert_eq!(curve.x_range(), (-1200.0, 1200.0));
    assert_eq!(curve.y_range(), (0.0, 25.0));
}

#[test]
fn test_nearest_point() {
    let curve = CommissionCurve::new(params(5.0, 20.0, 14.0, 1000.0)).unwrap();
    assert_eq!(curve.nearest_point(1500.0), (1200.0, 20.0));
    assert_eq!(curve.nearest_point(-5000.0), (-1200.0, 5.0));
    // 0 は左右の 3 次部分の両方に含まれるが先の方を選ぶ
    assert_eq!(curve.nearest_point(0.0), (0.0, 14.0));
    assert_eq!(curve.nearest_point(1.0).0, 0.0);
}

#[test]
fn test_out_of_range() {
    let curve = CommissionCurve::new(params(5.0, 20.0, 14.0, 1000.0)).unwrap();
    assert_eq!(curve.out_of_range(1500.0), Some(Side::Right));
    assert_eq!(curve.out_of_range(1000.0), Some(Side::Right));
    assert_eq!(curve.out_of_range(-1000.0), Some(Side::Left));
    assert_eq!(curve.out_of_range(999.0), None);
    assert_eq!(curve.out_of_range(0.0), None);
}

#[test]
fn test_plan_out_of_range_right() {
    let curve = CommissionCurve::new(params(5.0, 20.0, 14.0, 1000.0)).unwrap();
    let plan = ChartPlan::new(&curve, 1500.0, 20.0);

    let out = plan.out_of_range.as_ref().unwrap();
    assert_eq!(out.side, Side::Right);
    let ((x0, y0), (x1, y1)) = out.rect;
    assert!((x0 - 1000.0).abs() < 1e-9);
    assert!((x1 - 1200.0).abs() < 1e-9);
    assert_eq!((y0, y1), (0.0, 25.0));
    assert_eq!(out.label, "20.00%");
    assert_eq!(out.label_at, (0.0, 20.0));
    assert!(!out.hatch.is_empty());
    for &((ax, ay), (bx, by)) in &out.hatch {
        for (x, y) in [(ax, ay), (bx, by)] {
            assert!(x >= x0 - 1e-9 && x <= x1 + 1e-9);
            assert!(y >= y0 - 1e-9 && y <= y1 + 1e-9);
        }
    }

    assert_eq!(plan.dot, (1500.0, 20.0));
    let kinds: Vec<_> = plan.markers.iter().map(|m| (m.kind, m.x)).collect();
    assert_eq!(
        kinds,
        vec![
            (MarkerKind::CurrentDemand, 1500.0),
            (MarkerKind::LowerBound, -1000.0),
            (MarkerKind::UpperBound, 1000.0),
        ]
    );
}

#[test]
fn test_plan_out_of_range_left() {
    let curve = CommissionCurve::new(params(5.0, 20.0, 14.0, 1000.0)).unwrap();
    let plan = ChartPlan::new(&curve, -1100.0, 5.0);

    let out = plan.out_of_range.unwrap();
    assert_eq!(out.side, Side::Left);
    let ((x0, _), (x1, _)) = out.rect;
    assert!((x0 + 1200.0).abs() < 1e-9);
    assert!((x1 + 1000.0).abs() < 1e-9);
    assert_eq!(out.label, "5.00%");
}

#[test]
fn test_plan_in_range() {
    let curve = CommissionCurve::new(params(5.0, 20.0, 14.0, 1000.0)).unwrap();
    let plan = ChartPlan::new(&curve, 10.0, 14.0);
    assert!(plan.out_of_range.is_none());
    assert_eq!(plan.dot.0, 10.0);
    assert_eq!(plan.curve.len(), curve.points().len());
}

#[test]
fn test_hatch_lines_degenerate() {
    assert!(chart::hatch_lines((1.0, 0.0), (1.0, 1.0), 10).is_empty());
    assert!(chart::hatch_lines((0.0, 0.0), (1.0, 1.0), 0).is_empty());
}

#[tokio::test]
async fn test_fetch_chart_plan() {
    let client = MockClient::new(5, 20, 14, 1000, 1500, 20);
    let plan = fetch_chart_plan(&client, 20.0).await.unwrap().unwrap();
    assert_eq!(plan.x_range, (-1200.0, 1200.0));
    assert!(plan.out_of_range.is_some());
}

#[tokio::test]
async fn test_fetch_chart_plan_degenerate() {
    let client = MockClient::new(10, 10, 10, 1000, 0, 10);
    assert!(fetch_chart_plan(&client, 10.0).await.unwrap().is_none());
    // 需要は取りに行かない
    assert!(
        !client
            .calls()
            .contains(&"rocketNetworkFees.getNodeDemand".to_string())
    );
}

#[tokio::test]
async fn test_cache_same_commission_renders_once() {
    let mut cache = CommissionChartCache::new();
    let counter = AtomicUsize::new(0);
    let renders = &counter;
    let render = move || async move {
        renders.fetch_add(1, Ordering::SeqCst);
        Ok::<_, anyhow::Error>(Some(vec![1u8, 2, 3]))
    };

    let first = cache.get_or_render(14.0, render).await.unwrap().unwrap();
    let second = cache.get_or_render(14.0, render).await.unwrap().unwrap();
    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.cached_commission(), Some(14.0));
}

#[tokio::test]
async fn test_cache_different_commission_replaces_image() {
    let mut cache = CommissionChartCache::new();
    let first = cache
        .get_or_render(14.0, || async { Ok(Some(vec![1])) })
        .await
        .unwrap()
        .unwrap();
    let second = cache
        .get_or_render(15.0, || async { Ok(Some(vec![2])) })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(&*second, &[2]);
    assert_eq!(cache.cached_commission(), Some(15.0));
    // 古い画像はキャッシュから手放されている
    assert_eq!(Arc::strong_count(&first), 1);
    assert_eq!(Arc::strong_count(&second), 2);
}

#[tokio::test]
async fn test_cache_cleared_when_unavailable() {
    let mut cache = CommissionChartCache::new();
    cache
        .get_or_render(14.0, || async { Ok(Some(vec![1])) })
        .await
        .unwrap();

    let result = cache
        .get_or_render(15.0, || async { Ok(None) })
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(cache.cached_commission(), None);
}

#[tokio::test]
async fn test_cache_cleared_on_render_error() {
    let mut cache = CommissionChartCache::new();
    cache
        .get_or_render(14.0, || async { Ok(Some(vec![1])) })
        .await
        .unwrap();

    let result = cache
        .get_or_render(15.0, || async { Err(anyhow::anyhow!("boom")) })
        .await;
    assert!(result.is_err());
    assert_eq!(cache.cached_commission(), None);
}

#[tokio::test]
async fn test_commission_chart_uses_cache_without_fetching_parameters() {
    let client = MockClient::new(5, 20, 14, 1000, 1500, 20);
    let mut cache = CommissionChartCache::new();
    cache
        .get_or_render(20.0, || async { Ok(Some(vec![9, 9])) })
        .await
        .unwrap();

    let image = commission_chart(&client, &mut cache).await.unwrap().unwrap();
    assert_eq!(&*image, &[9, 9]);
    assert_eq!(client.calls(), vec!["rocketNetworkFees.getNodeFee".to_string()]);
}

#[tokio::test]
async fn test_commission_chart_unavailable() {
    let client = MockClient::new(10, 10, 10, 1000, 0, 10);
    let mut cache = CommissionChartCache::new();
    assert!(commission_chart(&client, &mut cache).await.unwrap().is_none());
    assert_eq!(cache.cached_commission(), None);
}

#[test]
fn test_render_out_of_range_chart_png() {
    let curve = CommissionCurve::new(params(5.0, 20.0, 14.0, 1000.0)).unwrap();
    let png = chart::render(&ChartPlan::new(&curve, 1500.0, 20.0)).unwrap();
    assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));
}

#[tokio::test]
async fn test_commission_chart_fetches_parameters_once() {
    let client = MockClient::new(5, 20, 14, 1000, 1500, 20);
    let mut cache = CommissionChartCache::new();

    let first = commission_chart(&client, &mut cache).await.unwrap().unwrap();
    assert!(first.starts_with(b"\x89PNG"));
    let second = commission_chart(&client, &mut cache).await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let calls = client.calls();
    let count = |method: &str| calls.iter().filter(|c| *c == method).count();
    assert_eq!(count("rocketNetworkFees.getNodeFee"), 2);
    for method in [
        "rocketDAOProtocolSettingsNetwork.getMinimumNodeFee",
        "rocketDAOProtocolSettingsNetwork.getMaximumNodeFee",
        "rocketDAOProtocolSettingsNetwork.getTargetNodeFee",
        "rocketDAOProtocolSettingsNetwork.getNodeFeeDemandRange",
        "rocketNetworkFees.getNodeDemand",
    ] {
        assert_eq!(count(method), 1, "{}", method);
    }
    assert_eq!(cache.cached_commission(), Some(20.0));
}
