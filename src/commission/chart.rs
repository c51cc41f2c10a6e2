use crate::Result;
use crate::chart::{DEFAULT_SIZE, drawing_error, render_png};
use crate::commission::curve::{CommissionCurve, EXTENSION, Side};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontStyle;
use plotters::style::text_anchor::{HPos, Pos, VPos};

/// ハッチングの本数の目安
const HATCH_LINES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    CurrentDemand,
    LowerBound,
    UpperBound,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub x: f64,
    pub kind: MarkerKind,
}

/// レンジ外を示す斜線付きの矩形と中央のラベル
#[derive(Debug, Clone, PartialEq)]
pub struct OutOfRange {
    pub side: Side,
    /// (x0, y0), (x1, y1)
    pub rect: ((f64, f64), (f64, f64)),
    pub hatch: Vec<((f64, f64), (f64, f64))>,
    pub label: String,
    pub label_at: (f64, f64),
}

/// 描画する要素をデータ座標で並べたもの
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPlan {
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub curve: Vec<(f64, f64)>,
    pub markers: Vec<Marker>,
    pub dot: (f64, f64),
    pub out_of_range: Option<OutOfRange>,
}

impl ChartPlan {
    pub fn new(curve: &CommissionCurve, current_demand: f64, current_commission: f64) -> Self {
        let params = curve.params();
        let r = params.demand_range;
        let (y0, y1) = curve.y_range();

        let out_of_range = curve.out_of_range(current_demand).map(|side| {
            let x0 = match side {
                Side::Left => -r * EXTENSION,
                Side::Right => r,
            };
            let x1 = x0 + r * (EXTENSION - 1.0);
            OutOfRange {
                side,
                rect: ((x0, y0), (x1, y1)),
                hatch: hatch_lines((x0, y0), (x1, y1), HATCH_LINES),
                label: format!("{:.2}%", current_commission),
                label_at: (0.0, params.max_fee),
            }
        });

        Self {
            x_range: curve.x_range(),
            y_range: (y0, y1),
            curve: curve.points().to_vec(),
            markers: vec![
                Marker {
                    x: current_demand,
                    kind: MarkerKind::CurrentDemand,
                },
                Marker {
                    x: -r,
                    kind: MarkerKind::LowerBound,
                },
                Marker {
                    x: r,
                    kind: MarkerKind::UpperBound,
                },
            ],
            dot: (current_demand, curve.nearest_point(current_demand).1),
            out_of_range,
        }
    }
}

/// 矩形の内側に収まる右上がりの斜線
///
/// 各線は下辺から上辺まで、矩形の幅の半分だけ右にずれる。はみ出した部分は切り取る。
pub fn hatch_lines(
    (x0, y0): (f64, f64),
    (x1, y1): (f64, f64),
    count: usize,
) -> Vec<((f64, f64), (f64, f64))> {
    let width = x1 - x0;
    if width <= 0.0 || count == 0 {
        return vec![];
    }
    let slant = width / 2.0;
    let step = (width + slant) / count as f64;

    (0..=count)
        .filter_map(|k| {
            let xa = x0 - slant + step * k as f64;
            let t0 = ((x0 - xa) / slant).max(0.0);
            let t1 = ((x1 - xa) / slant).min(1.0);
            (t0 < t1).then(|| {
                let at = |t: f64| (xa + slant * t, y0 + (y1 - y0) * t);
                (at(t0), at(t1))
            })
        })
        .collect()
}

fn marker_color(kind: MarkerKind) -> RGBColor {
    match kind {
        MarkerKind::CurrentDemand => BLACK,
        MarkerKind::LowerBound => RED,
        MarkerKind::UpperBound => GREEN,
    }
}

pub fn render(plan: &ChartPlan) -> Result<Vec<u8>> {
    render_png(DEFAULT_SIZE, |root| draw(root, plan))
}

fn draw<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, plan: &ChartPlan) -> Result<()> {
    let (x0, x1) = plan.x_range;
    let (y0, y1) = plan.y_range;

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(drawing_error)?;

    chart
        .configure_mesh()
        .x_desc("Node Demand (ETH)")
        .y_desc("Commission Fee (%)")
        .draw()
        .map_err(drawing_error)?;

    for marker in &plan.markers {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(marker.x, y0), (marker.x, y1)],
                marker_color(marker.kind),
            )))
            .map_err(drawing_error)?;
    }

    chart
        .draw_series(std::iter::once(Circle::new(plan.dot, 5, BLACK.filled())))
        .map_err(drawing_error)?;

    if let Some(out) = &plan.out_of_range {
        let ((rx0, ry0), (rx1, ry1)) = out.rect;
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(rx0, ry0), (rx1, ry1)],
                BLACK.stroke_width(1),
            )))
            .map_err(drawing_error)?;
        chart
            .draw_series(
                out.hatch
                    .iter()
                    .map(|&(a, b)| PathElement::new(vec![a, b], BLACK.stroke_width(1))),
            )
            .map_err(drawing_error)?;

        let style = ("sans-serif", 32)
            .into_font()
            .style(FontStyle::Bold)
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart
            .draw_series(std::iter::once(Text::new(
                out.label.clone(),
                out.label_at,
                style,
            )))
            .map_err(drawing_error)?;
    }

    chart
        .draw_series(LineSeries::new(
            plan.curve.iter().copied(),
            BLUE.stroke_width(2),
        ))
        .map_err(drawing_error)?;

    Ok(())
}
