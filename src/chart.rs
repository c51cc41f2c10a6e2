use crate::Result;
use crate::errors::Error;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fmt::Display;

pub const DEFAULT_SIZE: (u32, u32) = (640, 480);

pub fn drawing_error<E: Display>(e: E) -> anyhow::Error {
    Error::ChartGeneration(e.to_string()).into()
}

/// メモリ上のビットマップに描画して PNG にエンコードする
pub fn render_png<F>(size: (u32, u32), draw: F) -> Result<Vec<u8>>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<()>,
{
    let (width, height) = size;
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
        root.fill(&WHITE).map_err(drawing_error)?;
        draw(&root)?;
        root.present().map_err(drawing_error)?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&buffer, width, height, ExtendedColorType::Rgb8)
        .map_err(drawing_error)?;
    Ok(png)
}
