use std::ops::Range;

use super::{
    braille,
    grid::{GlyphCell, GlyphGrid},
};
use crate::image_pipeline::{
    dither::{self, LumaField, Quantizer},
    luminance,
    resize::{block_span, TargetGeometry},
};
use crate::{AicError, ColorMode, ConversionOptions, GlyphStrategy, PixelGrid};

/// Turns one source frame into a glyph grid under a fixed set of options.
pub struct GlyphMapper<'a> {
    options: &'a ConversionOptions,
}

impl<'a> GlyphMapper<'a> {
    pub fn new(options: &'a ConversionOptions) -> Self {
        Self { options }
    }

    pub fn map(&self, source: &PixelGrid, geometry: TargetGeometry) -> Result<GlyphGrid, AicError> {
        if source.width() == 0 || source.height() == 0 {
            return Err(AicError::Input("source image has zero width or height".into()));
        }
        if geometry.columns == 0 || geometry.rows == 0 {
            return Err(AicError::Config("target dimensions must be at least 1x1".into()));
        }

        let (field_width, field_height) = geometry
            .sample_dimensions(self.options.glyphs.samples_per_cell())
            .ok_or_else(|| {
                AicError::Config(format!(
                    "{}x{} characters exceed the sample limit",
                    geometry.columns, geometry.rows
                ))
            })?;

        let chars: Vec<char> = match &self.options.glyphs {
            GlyphStrategy::Ramp(ramp) => {
                let mut field = self.sample_field(source, field_width, field_height);
                if self.options.dither {
                    dither::diffuse(&mut field, Quantizer::Levels(ramp.len()));
                }
                field.values.iter().map(|&value| ramp.char_for(value)).collect()
            },
            GlyphStrategy::Braille { threshold } => {
                let mut field = self.sample_field(source, field_width, field_height);
                if self.options.dither {
                    dither::diffuse(&mut field, Quantizer::Threshold(*threshold));
                }
                braille_chars(&field, geometry, *threshold)
            },
        };

        let cells = chars
            .into_iter()
            .enumerate()
            .map(|(index, ch)| {
                let x = index as u32 % geometry.columns;
                let y = index as u32 / geometry.columns;
                self.color_cell(source, geometry, x, y, ch)
            })
            .collect();

        let grid = GlyphGrid::new(geometry.columns, geometry.rows, cells)?;
        Ok(grid.flipped(self.options.flip_x, self.options.flip_y))
    }

    /// Brightness of every block when `source` is split into `columns` x `rows` blocks.
    fn sample_field(&self, source: &PixelGrid, columns: u32, rows: u32) -> LumaField {
        let (width, height) = source.dimensions();
        let mut values = Vec::with_capacity(columns as usize * rows as usize);
        for y in 0..rows {
            let ys = block_span(y, rows, height);
            for x in 0..columns {
                let xs = block_span(x, columns, width);
                let average = block_average(source, xs, ys.clone());
                values.push(luminance::brightness(average, self.options.negative) as f32);
            }
        }
        LumaField::new(columns as usize, rows as usize, values)
    }

    fn color_cell(
        &self,
        source: &PixelGrid,
        geometry: TargetGeometry,
        x: u32,
        y: u32,
        ch: char,
    ) -> GlyphCell {
        if self.options.color == ColorMode::None {
            return GlyphCell::plain(ch);
        }

        let xs = block_span(x, geometry.columns, source.width());
        let ys = block_span(y, geometry.rows, source.height());
        let color = luminance::reported_color(
            block_average(source, xs, ys),
            self.options.negative,
            self.options.grayscale,
        );

        match self.options.color {
            ColorMode::Foreground => GlyphCell { ch, fg: Some(color), bg: None },
            ColorMode::Background => GlyphCell { ch, fg: None, bg: Some(color) },
            ColorMode::None => GlyphCell::plain(ch),
        }
    }
}

fn braille_chars(field: &LumaField, geometry: TargetGeometry, threshold: u8) -> Vec<char> {
    let mut chars = Vec::with_capacity(geometry.cells());
    for cy in 0..geometry.rows as usize {
        for cx in 0..geometry.columns as usize {
            let mut dots = [[false; 4]; 2];
            for (dx, column) in dots.iter_mut().enumerate() {
                for (dy, dot) in column.iter_mut().enumerate() {
                    *dot = field.get(cx * 2 + dx, cy * 4 + dy) >= threshold as f32;
                }
            }
            chars.push(braille::pack(dots));
        }
    }
    chars
}

/// Mean composited color over a block of source pixels.
fn block_average(source: &PixelGrid, xs: Range<u32>, ys: Range<u32>) -> [f32; 3] {
    let mut sum = [0.0f32; 3];
    let mut count = 0u32;
    for y in ys {
        for x in xs.clone() {
            let rgb = luminance::composite(*source.get_pixel(x, y));
            for (total, channel) in sum.iter_mut().zip(rgb) {
                *total += channel;
            }
            count += 1;
        }
    }
    sum.map(|total| total / count.max(1) as f32)
}
