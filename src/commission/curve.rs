use serde::Serialize;

/// 3 次曲線部分の標本数
pub const CUBIC_SAMPLES: usize = 20;
/// 平坦な延長部分の標本数
pub const FLAT_SAMPLES: usize = 2;
/// 需要レンジの外側に描く幅の倍率
pub const EXTENSION: f64 = 1.2;

/// コミッション曲線を決めるプロトコルのパラメータ (手数料は %)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeeParameters {
    pub min_fee: f64,
    pub max_fee: f64,
    pub target_fee: f64,
    pub demand_range: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// 需要に対する手数料の区分的 3 次曲線
#[derive(Debug, Clone, PartialEq)]
pub struct CommissionCurve {
    params: FeeParameters,
    points: Vec<(f64, f64)>,
}

/// `numpy.linspace` と同じく両端を含む等間隔の `n` 点
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

impl CommissionCurve {
    /// 最小と最大が同じ (定数関数) か、需要レンジが正でなければ `None`
    pub fn new(params: FeeParameters) -> Option<Self> {
        if params.min_fee == params.max_fee {
            return None;
        }
        if !(params.demand_range > 0.0 && params.demand_range.is_finite()) {
            return None;
        }

        let r = params.demand_range;
        let left_multiplier = params.target_fee - params.min_fee;
        let right_multiplier = params.max_fee - params.target_fee;
        let cubic = |multiplier: f64, x: f64| multiplier * (x / r).powi(3) + params.target_fee;

        let extended_left = linspace(-r * EXTENSION, -r, FLAT_SAMPLES)
            .into_iter()
            .map(|x| (x, params.min_fee));
        let left = linspace(-r, 0.0, CUBIC_SAMPLES)
            .into_iter()
            .map(|x| (x, cubic(left_multiplier, x)));
        let right = linspace(0.0, r, CUBIC_SAMPLES)
            .into_iter()
            .map(|x| (x, cubic(right_multiplier, x)));
        let extended_right = linspace(r, r * EXTENSION, FLAT_SAMPLES)
            .into_iter()
            .map(|x| (x, params.max_fee));

        let points = extended_left
            .chain(left)
            .chain(right)
            .chain(extended_right)
            .collect();

        Some(Self { params, points })
    }

    pub fn params(&self) -> &FeeParameters {
        &self.params
    }

    /// 左から右へ連結した標本点
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn x_range(&self) -> (f64, f64) {
        let r = self.params.demand_range;
        (-r * EXTENSION, r * EXTENSION)
    }

    pub fn y_range(&self) -> (f64, f64) {
        (self.params.min_fee - 5.0, self.params.max_fee + 5.0)
    }

    /// `demand` に最も近い x を持つ標本点 (同距離なら先のもの)
    pub fn nearest_point(&self, demand: f64) -> (f64, f64) {
        let mut best = self.points[0];
        for &point in &self.points[1..] {
            if (point.0 - demand).abs() < (best.0 - demand).abs() {
                best = point;
            }
        }
        best
    }

    /// 需要がレンジの端に達していればその側
    pub fn out_of_range(&self, demand: f64) -> Option<Side> {
        let r = self.params.demand_range;
        if demand <= -r {
            Some(Side::Left)
        } else if demand >= r {
            Some(Side::Right)
        } else {
            None
        }
    }
}
