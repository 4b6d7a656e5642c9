use std::io::Cursor;
use std::time::Duration;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageFormat};

use crate::{AicError, PixelGrid};

/// Formats the converter accepts, detected from content rather than file names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
    Tiff,
    Bmp,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 6] = [
        SourceFormat::Png,
        SourceFormat::Jpeg,
        SourceFormat::Gif,
        SourceFormat::Webp,
        SourceFormat::Tiff,
        SourceFormat::Bmp,
    ];

    pub fn mime_type(self) -> &'static str {
        match self {
            SourceFormat::Png => "image/png",
            SourceFormat::Jpeg => "image/jpeg",
            SourceFormat::Gif => "image/gif",
            SourceFormat::Webp => "image/webp",
            SourceFormat::Tiff => "image/tiff",
            SourceFormat::Bmp => "image/bmp",
        }
    }

    pub fn is_animated(self) -> bool {
        self == SourceFormat::Gif
    }

    fn image_format(self) -> ImageFormat {
        match self {
            SourceFormat::Png => ImageFormat::Png,
            SourceFormat::Jpeg => ImageFormat::Jpeg,
            SourceFormat::Gif => ImageFormat::Gif,
            SourceFormat::Webp => ImageFormat::WebP,
            SourceFormat::Tiff => ImageFormat::Tiff,
            SourceFormat::Bmp => ImageFormat::Bmp,
        }
    }

    fn from_image_format(format: ImageFormat) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.image_format() == format)
    }
}

/// One decoded frame together with how long it stays on screen.
#[derive(Clone, Debug)]
pub struct SourceFrame {
    pub grid: PixelGrid,
    /// Zero for still images.
    pub delay: Duration,
}

impl SourceFrame {
    pub fn still(grid: PixelGrid) -> Self {
        Self { grid, delay: Duration::ZERO }
    }
}

pub fn sniff(bytes: &[u8]) -> Result<SourceFormat, AicError> {
    let format = image::guess_format(bytes)
        .map_err(|_| AicError::Input("unrecognised image content".into()))?;
    SourceFormat::from_image_format(format)
        .ok_or_else(|| AicError::Input(format!("unsupported image format {format:?}")))
}

/// Decodes `bytes` into frames, one for still images and one per animation frame for GIFs.
pub fn decode(bytes: &[u8]) -> Result<Vec<SourceFrame>, AicError> {
    let format = sniff(bytes)?;

    let frames = if format.is_animated() {
        let decoder = GifDecoder::new(Cursor::new(bytes))?;
        decoder
            .into_frames()
            .collect_frames()?
            .into_iter()
            .map(|frame| {
                let (numer, denom) = frame.delay().numer_denom_ms();
                let nanos = numer as u64 * 1_000_000 / denom.max(1) as u64;
                SourceFrame { grid: frame.into_buffer(), delay: Duration::from_nanos(nanos) }
            })
            .collect()
    } else {
        let image = image::load_from_memory_with_format(bytes, format.image_format())?;
        vec![SourceFrame::still(image.into_rgba8())]
    };

    if frames.is_empty() {
        return Err(AicError::Input("image contains no frames".into()));
    }
    if let Some(frame) = frames.iter().find(|f| f.grid.width() == 0 || f.grid.height() == 0) {
        return Err(AicError::Input(format!(
            "image has zero-sized frame {}x{}",
            frame.grid.width(),
            frame.grid.height()
        )));
    }

    Ok(frames)
}
