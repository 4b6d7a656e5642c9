use std::time::Duration;

use image::RgbaImage;
use rayon::prelude::*;

use super::grid::GlyphGrid;
use crate::image_pipeline::{loader::SourceFrame, resize::TargetGeometry};
use crate::{AicError, Converter};

/// What each frame of a sequence is converted into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutput {
    /// Glyph grids only, for terminal playback or text files.
    Text,
    /// Glyph grids plus a rendered raster per frame, for GIF output.
    Raster,
}

#[derive(Clone, Debug)]
pub struct ConvertedFrame {
    pub grid: GlyphGrid,
    pub raster: Option<RgbaImage>,
    /// Delay copied from the source frame.
    pub delay: Duration,
}

/// Converted frames in their original order, all sharing one geometry.
#[derive(Clone, Debug, Default)]
pub struct GlyphGridSeries {
    frames: Vec<ConvertedFrame>,
    total_duration: Duration,
    geometry: Option<TargetGeometry>,
}

impl GlyphGridSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn geometry(&self) -> Option<TargetGeometry> {
        self.geometry
    }

    pub fn push_frame(&mut self, frame: ConvertedFrame) -> Result<(), AicError> {
        let columns = frame.grid.width;
        let rows = frame.grid.height;
        match self.geometry {
            Some(geometry) if geometry.columns != columns || geometry.rows != rows => {
                return Err(AicError::Frame {
                    frame: self.frames.len() + 1,
                    source: Box::new(AicError::Input(format!(
                        "glyph grid {columns}x{rows} differs from series geometry {}x{}",
                        geometry.columns, geometry.rows
                    ))),
                });
            },
            Some(_) => (),
            None => self.geometry = Some(TargetGeometry { columns, rows }),
        }

        self.total_duration += frame.delay;
        self.frames.push(frame);
        Ok(())
    }

    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    pub fn frames(&self) -> &[ConvertedFrame] {
        &self.frames
    }
}

/// Converts every frame with the geometry derived from the first one.
///
/// Frames are converted in parallel but the series keeps source order. Any failure aborts
/// the whole sequence and reports the lowest failing frame, counting from 1.
pub(crate) fn convert_sequence(
    converter: &Converter<'_>,
    frames: &[SourceFrame],
    output: FrameOutput,
) -> Result<GlyphGridSeries, AicError> {
    let Some(first) = frames.first() else {
        return Err(AicError::Input("animation contains no frames".into()));
    };

    let first_dimensions = first.grid.dimensions();
    let geometry = converter
        .geometry(first_dimensions.0, first_dimensions.1)
        .map_err(|err| err.in_frame(1))?;

    for (index, frame) in frames.iter().enumerate().skip(1) {
        let dimensions = frame.grid.dimensions();
        if dimensions != first_dimensions {
            return Err(AicError::Input(format!(
                "frame is {}x{} but the first frame is {}x{}",
                dimensions.0, dimensions.1, first_dimensions.0, first_dimensions.1
            ))
            .in_frame(index + 1));
        }
    }

    if output == FrameOutput::Raster && !converter.has_rasterizer() {
        return Err(AicError::Resource("rendering frames requires a font".into()));
    }

    let results: Vec<Result<ConvertedFrame, AicError>> = frames
        .par_iter()
        .enumerate()
        .map(|(index, frame)| {
            convert_one(converter, frame, geometry, output).map_err(|err| err.in_frame(index + 1))
        })
        .collect();

    let mut series = GlyphGridSeries::new();
    for result in results {
        series.push_frame(result?)?;
    }
    Ok(series)
}

fn convert_one(
    converter: &Converter<'_>,
    frame: &SourceFrame,
    geometry: TargetGeometry,
    output: FrameOutput,
) -> Result<ConvertedFrame, AicError> {
    let grid = converter.convert_with_geometry(&frame.grid, geometry)?;
    let raster = match output {
        FrameOutput::Text => None,
        FrameOutput::Raster => Some(converter.render_frame(&grid)?),
    };
    Ok(ConvertedFrame { grid, raster, delay: frame.delay })
}
