use std::time::Duration;

use aic_render::{
    is_braille, AicError, ColorMode, ConversionOptions, Converter, FrameOutput, GlyphCoverage,
    FontFace, GlyphRasterizer, GlyphStrategy, PixelGrid, Ramp, Sizing, SourceFrame,
    TargetGeometry, DEFAULT_FONT_PX,
};
use image::Rgba;

/// Fills the whole cell for every printable character.
struct BlockRasterizer;

impl GlyphRasterizer for BlockRasterizer {
    fn cell_size(&self) -> (u32, u32) {
        (3, 5)
    }

    fn rasterize(&self, _ch: char) -> GlyphCoverage {
        GlyphCoverage { width: 3, height: 5, left: 0, top: 0, data: vec![255; 15] }
    }
}

fn solid(width: u32, height: u32, value: u8) -> PixelGrid {
    PixelGrid::from_pixel(width, height, Rgba([value, value, value, 255]))
}

fn noisy(width: u32, height: u32, seed: u32) -> PixelGrid {
    PixelGrid::from_fn(width, height, |x, y| {
        let v = (x.wrapping_mul(31) ^ y.wrapping_mul(17) ^ seed).wrapping_mul(2654435761) >> 24;
        Rgba([v as u8, (v as u8).wrapping_mul(3), 255 - v as u8, 255])
    })
}

#[test]
fn white_image_selects_brightest_character() {
    let options = ConversionOptions {
        sizing: Sizing::Dimensions { columns: 2, rows: 2 },
        ..ConversionOptions::default()
    };
    let converter = Converter::new(&options).unwrap();
    let grid = converter.convert_frame(&solid(2, 2, 255)).unwrap();

    let brightest = *Ramp::simple().chars().last().unwrap();
    assert_eq!(grid.cells.len(), 4);
    assert!(grid.cells.iter().all(|cell| cell.ch == brightest));
}

#[test]
fn solid_gray_braille_is_all_or_nothing() {
    let options = ConversionOptions {
        sizing: Sizing::Width(1),
        glyphs: GlyphStrategy::braille(128).unwrap(),
        ..ConversionOptions::default()
    };
    let converter = Converter::new(&options).unwrap();

    let bright = converter.convert_frame(&solid(4, 8, 200)).unwrap();
    assert_eq!((bright.width, bright.height), (1, 1));
    assert_eq!(bright.cells[0].ch, '\u{28FF}');

    let dark = converter.convert_frame(&solid(4, 8, 60)).unwrap();
    assert_eq!(dark.cells[0].ch, '\u{2800}');
}

#[test]
fn custom_ramp_maps_extremes() {
    let ramp = Ramp::new(" .:-=+*#%@").unwrap();
    let options = ConversionOptions {
        sizing: Sizing::Dimensions { columns: 2, rows: 1 },
        glyphs: GlyphStrategy::Ramp(ramp),
        ..ConversionOptions::default()
    };
    let source = PixelGrid::from_fn(2, 1, |x, _| {
        if x == 0 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    let grid = Converter::new(&options).unwrap().convert_frame(&source).unwrap();
    assert_eq!(grid.rows().collect::<Vec<_>>(), vec![" @"]);
}

#[test]
fn grid_size_matches_geometry_for_every_mode() {
    let source = noisy(37, 23, 7);
    let sizings = [
        Sizing::Dimensions { columns: 9, rows: 4 },
        Sizing::Width(20),
        Sizing::Height(6),
        Sizing::Full { columns: 40, rows: 10 },
        Sizing::Default,
    ];
    let strategies = [GlyphStrategy::Ramp(Ramp::complex()), GlyphStrategy::braille(90).unwrap()];

    for sizing in sizings {
        for glyphs in strategies.clone() {
            for dither in [false, true] {
                let options = ConversionOptions {
                    sizing,
                    glyphs: glyphs.clone(),
                    dither,
                    color: ColorMode::Foreground,
                    ..ConversionOptions::default()
                };
                let converter = Converter::new(&options).unwrap();
                let geometry = converter.geometry(37, 23).unwrap();
                let grid = converter.convert_frame(&source).unwrap();
                assert_eq!((grid.width, grid.height), (geometry.columns, geometry.rows));
                assert_eq!(grid.cells.len(), geometry.cells());
                if matches!(glyphs, GlyphStrategy::Braille { .. }) {
                    assert!(grid.cells.iter().all(|cell| is_braille(cell.ch)));
                }
            }
        }
    }
}

#[test]
fn double_flip_restores_grid() {
    let source = noisy(16, 16, 3);
    let plain = ConversionOptions {
        sizing: Sizing::Dimensions { columns: 8, rows: 4 },
        ..ConversionOptions::default()
    };
    let flipped = ConversionOptions { flip_x: true, flip_y: true, ..plain.clone() };

    let original = Converter::new(&plain).unwrap().convert_frame(&source).unwrap();
    let once = Converter::new(&flipped).unwrap().convert_frame(&source).unwrap();
    assert_eq!(once.flipped(true, true), original);
}

#[test]
fn conversion_is_repeatable() {
    let source = noisy(30, 12, 11);
    let options = ConversionOptions {
        sizing: Sizing::Width(15),
        dither: true,
        color: ColorMode::Foreground,
        ..ConversionOptions::default()
    };
    let converter = Converter::new(&options).unwrap();
    let first = converter.convert_frame(&source).unwrap();
    let second = converter.convert_frame(&source).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.ansi_rows(), second.ansi_rows());
}

#[test]
fn invalid_options_are_config_errors() {
    assert!(matches!(Ramp::new("x"), Err(AicError::Config(_))));
    assert!(matches!(GlyphStrategy::braille(256), Err(AicError::Config(_))));
    assert!(matches!(GlyphStrategy::braille(-1), Err(AicError::Config(_))));

    let options = ConversionOptions {
        sizing: Sizing::Dimensions { columns: 0, rows: 3 },
        ..ConversionOptions::default()
    };
    assert!(matches!(Converter::new(&options), Err(AicError::Config(_))));
}

#[test]
fn oversized_dimensions_are_config_errors() {
    let braille = ConversionOptions {
        sizing: Sizing::Dimensions { columns: 3_000_000_000, rows: 1 },
        glyphs: GlyphStrategy::braille(128).unwrap(),
        ..ConversionOptions::default()
    };
    assert!(matches!(Converter::new(&braille), Err(AicError::Config(_))));

    let ramp = ConversionOptions { glyphs: GlyphStrategy::default(), ..braille.clone() };
    assert!(matches!(Converter::new(&ramp), Err(AicError::Config(_))));

    // The width alone is fine; the rows it implies for a tall source are not.
    let tall = ConversionOptions { sizing: Sizing::Width(1 << 20), ..ConversionOptions::default() };
    let converter = Converter::new(&tall).unwrap();
    let err = converter.convert_frame(&solid(1, 4096, 128)).unwrap_err();
    assert!(matches!(err, AicError::Config(_)));

    let options = ConversionOptions::default();
    let converter = Converter::new(&options).unwrap();
    let huge = TargetGeometry { columns: u32::MAX, rows: u32::MAX };
    let err = converter.convert_with_geometry(&solid(2, 2, 0), huge).unwrap_err();
    assert!(matches!(err, AicError::Config(_)));
}

#[test]
fn empty_source_is_an_input_error() {
    let options = ConversionOptions::default();
    let converter = Converter::new(&options).unwrap();
    let err = converter.convert_frame(&PixelGrid::new(0, 4)).unwrap_err();
    assert!(matches!(err, AicError::Input(_)));
}

#[test]
fn rendering_without_font_is_a_resource_error() {
    let options = ConversionOptions::default();
    let converter = Converter::new(&options).unwrap();
    let grid = converter.convert_frame(&solid(4, 4, 255)).unwrap();
    assert!(matches!(converter.render_frame(&grid), Err(AicError::Resource(_))));
}

#[test]
fn rendered_frame_has_cell_multiple_size() {
    let options = ConversionOptions {
        sizing: Sizing::Dimensions { columns: 4, rows: 2 },
        ..ConversionOptions::default()
    };
    let converter = Converter::new(&options).unwrap().with_rasterizer(&BlockRasterizer);
    let grid = converter.convert_frame(&solid(8, 8, 255)).unwrap();
    let image = converter.render_frame(&grid).unwrap();
    assert_eq!(image.dimensions(), (12, 10));
    assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);
}

#[test]
fn builtin_font_renders_braille_frames() {
    let options = ConversionOptions {
        sizing: Sizing::Dimensions { columns: 3, rows: 2 },
        glyphs: GlyphStrategy::braille(128).unwrap(),
        ..ConversionOptions::default()
    };
    let face = FontFace::builtin(DEFAULT_FONT_PX).unwrap();
    let converter = Converter::new(&options).unwrap().with_rasterizer(&face);
    let grid = converter.convert_frame(&solid(6, 8, 255)).unwrap();
    assert!(grid.cells.iter().all(|cell| cell.ch == '\u{28FF}'));

    let image = converter.render_frame(&grid).unwrap();
    let (cell_width, cell_height) = face.cell_size();
    assert_eq!(image.dimensions(), (3 * cell_width, 2 * cell_height));
    assert!(image.pixels().any(|pixel| pixel.0 != [0, 0, 0, 255]));
}

fn animation(dimensions: &[(u32, u32)]) -> Vec<SourceFrame> {
    dimensions
        .iter()
        .enumerate()
        .map(|(index, &(width, height))| SourceFrame {
            grid: noisy(width, height, index as u32),
            delay: Duration::from_millis(40 * (index as u64 + 1)),
        })
        .collect()
}

#[test]
fn sequence_keeps_order_and_delays() {
    let options = ConversionOptions {
        sizing: Sizing::Width(6),
        ..ConversionOptions::default()
    };
    let frames = animation(&[(12, 8); 5]);
    let converter = Converter::new(&options).unwrap().with_rasterizer(&BlockRasterizer);
    let series = converter.convert_sequence(&frames, FrameOutput::Raster).unwrap();

    assert_eq!(series.len(), 5);
    assert_eq!(series.total_duration(), Duration::from_millis(600));
    for (index, (converted, source)) in series.frames().iter().zip(&frames).enumerate() {
        assert_eq!(converted.delay, source.delay);
        assert_eq!(converted.grid, converter.convert_frame(&source.grid).unwrap(), "frame {index}");
        let raster = converted.raster.as_ref().unwrap();
        assert_eq!(raster.dimensions(), (6 * 3, converted.grid.height * 5));
    }
}

#[test]
fn mismatched_frame_aborts_sequence() {
    let options = ConversionOptions::default();
    let frames = animation(&[(10, 10), (12, 10), (10, 10)]);
    let converter = Converter::new(&options).unwrap();

    let err = converter.convert_sequence(&frames, FrameOutput::Text).unwrap_err();
    match err {
        AicError::Frame { frame, source } => {
            assert_eq!(frame, 2);
            assert!(matches!(*source, AicError::Input(_)));
        },
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn raster_sequence_requires_font() {
    let options = ConversionOptions::default();
    let frames = animation(&[(10, 10), (10, 10)]);
    let converter = Converter::new(&options).unwrap();
    let err = converter.convert_sequence(&frames, FrameOutput::Raster).unwrap_err();
    assert!(matches!(err, AicError::Resource(_)));
}

#[test]
fn empty_sequence_is_an_input_error() {
    let options = ConversionOptions::default();
    let converter = Converter::new(&options).unwrap();
    let err = converter.convert_sequence(&[], FrameOutput::Text).unwrap_err();
    assert!(matches!(err, AicError::Input(_)));
}
