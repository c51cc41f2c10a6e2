use crate::Result;
use crate::apr::AprPoint;
use crate::chart::{DEFAULT_SIZE, drawing_error, render_png};
use chrono::{DateTime, Duration, Utc};
use plotters::chart::SeriesLabelPosition;
use plotters::coord::Shift;
use plotters::prelude::*;

const LINE_COLOR: RGBColor = RGBColor(235, 142, 85);

/// APR チャートに載せる値 (%)
#[derive(Debug, Clone, PartialEq)]
pub struct AprChartData {
    pub daily: Vec<(DateTime<Utc>, f64)>,
    pub trailing: Vec<(DateTime<Utc>, f64)>,
    pub time_range: (DateTime<Utc>, DateTime<Utc>),
    pub max_value: f64,
}

impl AprChartData {
    /// 点が 1 つもなければ `None`
    pub fn new(series: &[AprPoint]) -> Option<Self> {
        let daily: Vec<_> = series
            .iter()
            .filter_map(|p| {
                let time = DateTime::from_timestamp(p.time, 0)?;
                Some((time, p.instantaneous_apr * 100.0))
            })
            .collect();
        let trailing: Vec<_> = series
            .iter()
            .filter_map(|p| {
                let apr = p.trailing_7_apr?;
                Some((DateTime::from_timestamp(p.time, 0)?, apr * 100.0))
            })
            .collect();

        let start = daily.first()?.0;
        let mut end = daily.last()?.0;
        if end <= start {
            end = start + Duration::days(1);
        }

        let max_value = daily
            .iter()
            .chain(trailing.iter())
            .map(|(_, v)| *v)
            .fold(0.0, f64::max);

        Some(Self {
            daily,
            trailing,
            time_range: (start, end),
            max_value,
        })
    }

    /// 縦軸は 0 から。上端は最大値に余白を足す
    pub fn y_range(&self) -> (f64, f64) {
        if self.max_value > 0.0 {
            (0.0, self.max_value * 1.1)
        } else {
            (0.0, 1.0)
        }
    }
}

/// APR の系列を PNG にする。点がなければ `None`
pub fn render(series: &[AprPoint]) -> Result<Option<Vec<u8>>> {
    let Some(data) = AprChartData::new(series) else {
        return Ok(None);
    };
    render_png(DEFAULT_SIZE, |root| draw(root, &data)).map(Some)
}

fn draw<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, data: &AprChartData) -> Result<()> {
    let (start, end) = data.time_range;
    let (y0, y1) = data.y_range();

    let mut chart = ChartBuilder::on(root)
        .caption("Observed rETH APR values", ("sans-serif", 24).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(start..end, y0..y1)
        .map_err(drawing_error)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("APR")
        .x_label_formatter(&|dt| dt.format("%b %d").to_string())
        .y_label_formatter(&|v| format!("{:.0}%", v))
        .draw()
        .map_err(drawing_error)?;

    chart
        .draw_series(LineSeries::new(
            data.daily.iter().copied(),
            LINE_COLOR.stroke_width(2),
        ))
        .map_err(drawing_error)?
        .label("Daily Average")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], LINE_COLOR));
    chart
        .draw_series(
            data.daily
                .iter()
                .map(|&point| Circle::new(point, 3, LINE_COLOR.filled())),
        )
        .map_err(drawing_error)?;

    if !data.trailing.is_empty() {
        chart
            .draw_series(DashedLineSeries::new(
                data.trailing.iter().copied(),
                8,
                4,
                LINE_COLOR.stroke_width(2),
            ))
            .map_err(drawing_error)?
            .label("7 Day Average")
            .legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 8, y)], LINE_COLOR.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(drawing_error)?;

    Ok(())
}
