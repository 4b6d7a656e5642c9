mod ascii;
mod image_pipeline;
mod render;

use image::RgbaImage;

pub use ascii::{
    braille::{is_braille, BRAILLE_BASE},
    gradient::Ramp,
    grid::{GlyphCell, GlyphGrid},
    mapping::GlyphMapper,
    series::{ConvertedFrame, FrameOutput, GlyphGridSeries},
};
pub use image_pipeline::{
    dither::{diffuse, LumaField, Quantizer},
    loader::{decode, sniff, SourceFormat, SourceFrame},
    luminance::{brightness, pixel_brightness},
    resize::{Sizing, TargetGeometry, CHAR_ASPECT, DEFAULT_COLUMNS, MAX_SAMPLES},
};
pub use render::raster::{
    FontFace, GlyphCoverage, GlyphRasterizer, RasterStyle, DEFAULT_FONT_PX,
};

/// Decoded RGBA pixels of one frame.
pub type PixelGrid = RgbaImage;

#[derive(Debug, thiserror::Error)]
pub enum AicError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid input: {0}")]
    Input(String),
    #[error("missing resource: {0}")]
    Resource(String),
    #[error("frame {frame}: {source}")]
    Frame {
        /// Position of the failing frame, counting from 1.
        frame: usize,
        #[source]
        source: Box<AicError>,
    },
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}

impl AicError {
    /// Attributes the error to a frame of a sequence unless it already is.
    pub fn in_frame(self, frame: usize) -> Self {
        match self {
            AicError::Frame { .. } => self,
            other => AicError::Frame { frame, source: Box::new(other) },
        }
    }
}

/// How a brightness value becomes a character. Chosen once per conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GlyphStrategy {
    Ramp(Ramp),
    /// 2x4 sub-samples per cell; a dot is lit when its brightness reaches `threshold`.
    Braille { threshold: u8 },
}

impl GlyphStrategy {
    pub const DEFAULT_THRESHOLD: u8 = 128;

    pub fn braille(threshold: i64) -> Result<Self, AicError> {
        let threshold = u8::try_from(threshold).map_err(|_| {
            AicError::Config(format!("threshold must be within 0..=255, got {threshold}"))
        })?;
        Ok(GlyphStrategy::Braille { threshold })
    }

    /// Brightness samples taken per glyph cell, `(across, down)`.
    pub fn samples_per_cell(&self) -> (u32, u32) {
        match self {
            GlyphStrategy::Ramp(_) => (1, 1),
            GlyphStrategy::Braille { .. } => (2, 4),
        }
    }
}

impl Default for GlyphStrategy {
    fn default() -> Self {
        GlyphStrategy::Ramp(Ramp::simple())
    }
}

/// Where sampled colors go.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    #[default]
    None,
    Foreground,
    /// Color the cell background and leave the character in the default text color.
    Background,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConversionOptions {
    pub sizing: Sizing,
    pub glyphs: GlyphStrategy,
    pub negative: bool,
    pub color: ColorMode,
    /// Desaturate sampled colors.
    pub grayscale: bool,
    pub flip_x: bool,
    pub flip_y: bool,
    /// Floyd-Steinberg error diffusion before glyph selection.
    pub dither: bool,
    pub style: RasterStyle,
}

impl ConversionOptions {
    pub fn validate(&self) -> Result<(), AicError> {
        if !self.sizing.is_valid() {
            return Err(AicError::Config(format!(
                "target dimensions must be at least 1x1, got {:?}",
                self.sizing
            )));
        }
        if let GlyphStrategy::Ramp(ramp) = &self.glyphs {
            if ramp.len() < 2 {
                return Err(AicError::Config("character map needs at least two entries".into()));
            }
        }

        // Only the requested dimensions are known here; derived ones are checked per frame.
        let requested = match self.sizing {
            Sizing::Dimensions { columns, rows } => Some(TargetGeometry { columns, rows }),
            Sizing::Width(columns) => Some(TargetGeometry { columns, rows: 1 }),
            Sizing::Height(rows) => Some(TargetGeometry { columns: 1, rows }),
            Sizing::Full { .. } | Sizing::Default => None,
        };
        if let Some(geometry) = requested {
            self.check_geometry(geometry)?;
        }
        Ok(())
    }

    /// Rejects geometries whose brightness field would not fit in memory.
    pub fn check_geometry(&self, geometry: TargetGeometry) -> Result<(), AicError> {
        match geometry.sample_dimensions(self.glyphs.samples_per_cell()) {
            Some(_) => Ok(()),
            None => Err(AicError::Config(format!(
                "{}x{} characters exceed the limit of {MAX_SAMPLES} samples per frame",
                geometry.columns, geometry.rows
            ))),
        }
    }
}

/// Entry point for converting frames under one immutable set of options.
#[derive(Clone, Copy)]
pub struct Converter<'f> {
    options: &'f ConversionOptions,
    rasterizer: Option<&'f dyn GlyphRasterizer>,
}

impl<'f> Converter<'f> {
    pub fn new(options: &'f ConversionOptions) -> Result<Self, AicError> {
        options.validate()?;
        Ok(Self { options, rasterizer: None })
    }

    /// Attaches the font used by [`Converter::render_frame`].
    pub fn with_rasterizer(mut self, rasterizer: &'f dyn GlyphRasterizer) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn has_rasterizer(&self) -> bool {
        self.rasterizer.is_some()
    }

    pub fn geometry(
        &self,
        source_width: u32,
        source_height: u32,
    ) -> Result<TargetGeometry, AicError> {
        if source_width == 0 || source_height == 0 {
            return Err(AicError::Input(format!(
                "source image is {source_width}x{source_height}"
            )));
        }
        let geometry = self
            .options
            .sizing
            .derive(source_width, source_height)
            .ok_or_else(|| AicError::Config(format!("unusable sizing {:?}", self.options.sizing)))?;
        self.options.check_geometry(geometry)?;
        Ok(geometry)
    }

    pub fn convert_frame(&self, source: &PixelGrid) -> Result<GlyphGrid, AicError> {
        let geometry = self.geometry(source.width(), source.height())?;
        self.convert_with_geometry(source, geometry)
    }

    pub fn convert_with_geometry(
        &self,
        source: &PixelGrid,
        geometry: TargetGeometry,
    ) -> Result<GlyphGrid, AicError> {
        GlyphMapper::new(self.options).map(source, geometry)
    }

    pub fn render_frame(&self, grid: &GlyphGrid) -> Result<RgbaImage, AicError> {
        let rasterizer = self
            .rasterizer
            .ok_or_else(|| AicError::Resource("rendering an image requires a font".into()))?;
        render::raster::render(grid, rasterizer, &self.options.style)
    }

    pub fn convert_sequence(
        &self,
        frames: &[SourceFrame],
        output: FrameOutput,
    ) -> Result<GlyphGridSeries, AicError> {
        ascii::series::convert_sequence(self, frames, output)
    }
}

impl std::fmt::Debug for Converter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("options", self.options)
            .field("has_rasterizer", &self.rasterizer.is_some())
            .finish()
    }
}
