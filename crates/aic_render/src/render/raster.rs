use fontdue::{Font, FontSettings, Metrics};
use image::{Rgba, RgbaImage};

use crate::{AicError, GlyphGrid};

/// Font size used when the caller does not pick one.
pub const DEFAULT_FONT_PX: f32 = 14.0;

// DejaVu Sans Mono has no braille patterns; DejaVu Sans supplies them.
const BUILTIN_FONT: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");
const BUILTIN_FALLBACK: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Anti-aliased coverage of one glyph, positioned relative to the top-left of its cell.
#[derive(Clone, Debug, Default)]
pub struct GlyphCoverage {
    pub width: usize,
    pub height: usize,
    pub left: i32,
    pub top: i32,
    /// Row-major coverage, 0 = untouched, 255 = fully inked.
    pub data: Vec<u8>,
}

impl GlyphCoverage {
    fn at(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}

/// Source of glyph shapes for the raster renderer. Shared read-only across frames.
pub trait GlyphRasterizer: Send + Sync {
    /// Pixel size of one character cell, `(width, height)`.
    fn cell_size(&self) -> (u32, u32);

    fn rasterize(&self, ch: char) -> GlyphCoverage;
}

/// A parsed TrueType/OpenType face at a fixed pixel size.
///
/// Characters the face lacks are taken from the fallback face when one is attached. Cell
/// metrics always come from the primary face.
pub struct FontFace {
    font: Font,
    fallback: Option<Font>,
    px: f32,
    cell: (u32, u32),
    baseline: i32,
}

impl FontFace {
    pub fn from_bytes(bytes: &[u8], px: f32) -> Result<Self, AicError> {
        if !(px.is_finite() && px > 0.0) {
            return Err(AicError::Config(format!("font size must be positive, got {px}")));
        }

        let font = parse(bytes, px)?;
        let line = font
            .horizontal_line_metrics(px)
            .ok_or_else(|| AicError::Resource("font has no horizontal metrics".into()))?;
        let advance = font.metrics('M', px).advance_width;

        let cell = (
            (advance.ceil() as u32).max(1),
            ((line.ascent - line.descent).ceil() as u32).max(1),
        );

        Ok(Self { font, fallback: None, px, cell, baseline: line.ascent.ceil() as i32 })
    }

    /// The bundled DejaVu Sans Mono face, with DejaVu Sans for braille.
    pub fn builtin(px: f32) -> Result<Self, AicError> {
        Self::from_bytes(BUILTIN_FONT, px)?.with_fallback(BUILTIN_FALLBACK)
    }

    pub fn with_fallback(mut self, bytes: &[u8]) -> Result<Self, AicError> {
        self.fallback = Some(parse(bytes, self.px)?);
        Ok(self)
    }

    fn face_for(&self, ch: char) -> &Font {
        match &self.fallback {
            Some(fallback) if !self.font.has_glyph(ch) && fallback.has_glyph(ch) => fallback,
            _ => &self.font,
        }
    }
}

fn parse(bytes: &[u8], px: f32) -> Result<Font, AicError> {
    Font::from_bytes(bytes, FontSettings { scale: px, ..FontSettings::default() })
        .map_err(|err| AicError::Resource(format!("unable to parse font: {err}")))
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("px", &self.px)
            .field("cell", &self.cell)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl GlyphRasterizer for FontFace {
    fn cell_size(&self) -> (u32, u32) {
        self.cell
    }

    fn rasterize(&self, ch: char) -> GlyphCoverage {
        let (metrics, data) = self.face_for(ch).rasterize(ch, self.px);
        place(&metrics, data, self.baseline)
    }
}

/// Positions a glyph bitmap so its origin sits `baseline` rows below the top of the cell.
///
/// `ymin` is the bitmap's bottom edge relative to the baseline, negative for descenders.
fn place(metrics: &Metrics, data: Vec<u8>, baseline: i32) -> GlyphCoverage {
    GlyphCoverage {
        width: metrics.width,
        height: metrics.height,
        left: metrics.xmin,
        top: baseline - metrics.height as i32 - metrics.ymin,
        data,
    }
}

/// Colors used for cells that do not carry their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterStyle {
    pub font_color: [u8; 3],
    /// RGBA; alpha 255 is fully opaque.
    pub background: [u8; 4],
}

impl Default for RasterStyle {
    fn default() -> Self {
        Self { font_color: [255, 255, 255], background: [0, 0, 0, 255] }
    }
}

/// Draws `grid` one fixed-size cell per character: background first, then the glyph.
pub fn render(
    grid: &GlyphGrid,
    rasterizer: &dyn GlyphRasterizer,
    style: &RasterStyle,
) -> Result<RgbaImage, AicError> {
    let (cell_width, cell_height) = rasterizer.cell_size();
    if cell_width == 0 || cell_height == 0 {
        return Err(AicError::Resource("font produced an empty glyph cell".into()));
    }

    let width = grid.width.checked_mul(cell_width);
    let height = grid.height.checked_mul(cell_height);
    let (Some(width), Some(height)) = (width, height) else {
        return Err(AicError::Config("rendered image would be too large".into()));
    };

    let mut image = RgbaImage::new(width, height);
    for (index, cell) in grid.cells.iter().enumerate() {
        let origin_x = (index as u32 % grid.width) * cell_width;
        let origin_y = (index as u32 / grid.width) * cell_height;

        let background = match cell.bg {
            Some([r, g, b]) => [r, g, b, 255],
            None => style.background,
        };
        for y in 0..cell_height {
            for x in 0..cell_width {
                image.put_pixel(origin_x + x, origin_y + y, Rgba(background));
            }
        }

        if cell.ch.is_whitespace() {
            continue;
        }

        let foreground = cell.fg.unwrap_or(style.font_color);
        let coverage = rasterizer.rasterize(cell.ch);
        for gy in 0..coverage.height {
            let y = coverage.top + gy as i32;
            if y < 0 || y >= cell_height as i32 {
                continue;
            }
            for gx in 0..coverage.width {
                let x = coverage.left + gx as i32;
                if x < 0 || x >= cell_width as i32 {
                    continue;
                }

                let amount = coverage.at(gx, gy);
                if amount == 0 {
                    continue;
                }
                let pixel = image.get_pixel_mut(origin_x + x as u32, origin_y + y as u32);
                *pixel = blend(*pixel, foreground, amount);
            }
        }
    }

    Ok(image)
}

fn blend(below: Rgba<u8>, color: [u8; 3], coverage: u8) -> Rgba<u8> {
    let t = coverage as f32 / 255.0;
    let [r, g, b, a] = below.0;
    let mix = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * t).round() as u8;
    Rgba([mix(r, color[0]), mix(g, color[1]), mix(b, color[2]), mix(a, 255)])
}
