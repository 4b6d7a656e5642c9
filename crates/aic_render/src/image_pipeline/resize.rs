use std::ops::Range;

/// Height of a terminal glyph cell relative to its width.
///
/// Matches the 2x4 braille sub-sampling: two sub-samples across, four down, square on screen.
pub const CHAR_ASPECT: f32 = 2.0;

/// Column count used when no sizing was requested.
pub const DEFAULT_COLUMNS: u32 = 100;

/// Most brightness samples a single frame may be split into.
pub const MAX_SAMPLES: u64 = 1 << 26;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetGeometry {
    pub columns: u32,
    pub rows: u32,
}

impl TargetGeometry {
    pub fn cells(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Size of the brightness field when every cell takes `per_cell` (across, down) samples,
    /// or `None` once it would exceed [`MAX_SAMPLES`].
    pub fn sample_dimensions(&self, per_cell: (u32, u32)) -> Option<(u32, u32)> {
        let width = self.columns.checked_mul(per_cell.0)?;
        let height = self.rows.checked_mul(per_cell.1)?;
        (width as u64 * height as u64 <= MAX_SAMPLES).then_some((width, height))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Sizing {
    /// Both dimensions given; used as-is with no aspect correction.
    Dimensions { columns: u32, rows: u32 },
    Width(u32),
    Height(u32),
    /// Fit inside the caller's terminal viewport.
    Full { columns: u32, rows: u32 },
    #[default]
    Default,
}

impl Sizing {
    pub fn is_valid(&self) -> bool {
        match *self {
            Sizing::Dimensions { columns, rows } | Sizing::Full { columns, rows } => {
                columns > 0 && rows > 0
            },
            Sizing::Width(value) | Sizing::Height(value) => value > 0,
            Sizing::Default => true,
        }
    }

    pub fn derive(&self, source_width: u32, source_height: u32) -> Option<TargetGeometry> {
        if source_width == 0 || source_height == 0 || !self.is_valid() {
            return None;
        }

        let image_ratio = source_height as f32 / source_width as f32;
        let rows_for = |columns: u32| {
            ((image_ratio * columns as f32 / CHAR_ASPECT).round() as u32).max(1)
        };
        let columns_for =
            |rows: u32| ((rows as f32 * CHAR_ASPECT / image_ratio).round() as u32).max(1);

        let geometry = match *self {
            Sizing::Dimensions { columns, rows } => TargetGeometry { columns, rows },
            Sizing::Width(columns) => TargetGeometry { columns, rows: rows_for(columns) },
            Sizing::Height(rows) => TargetGeometry { columns: columns_for(rows), rows },
            Sizing::Full { columns, rows } => {
                let wanted_rows = rows_for(columns);
                if wanted_rows <= rows {
                    TargetGeometry { columns, rows: wanted_rows }
                } else {
                    TargetGeometry { columns: columns_for(rows).min(columns), rows }
                }
            },
            Sizing::Default => {
                TargetGeometry { columns: DEFAULT_COLUMNS, rows: rows_for(DEFAULT_COLUMNS) }
            },
        };

        Some(geometry)
    }
}

/// Source pixel span aggregated by output slot `index` out of `count` along an axis of
/// `source` pixels.
///
/// Consecutive spans tile the axis without gaps. When upscaling, neighbouring slots share
/// the single nearest source pixel.
pub fn block_span(index: u32, count: u32, source: u32) -> Range<u32> {
    debug_assert!(count > 0 && source > 0 && index < count);

    let start = (index as u64 * source as u64 / count as u64) as u32;
    let end = ((index as u64 + 1) * source as u64 / count as u64) as u32;
    let start = start.min(source - 1);
    let end = end.max(start + 1).min(source);
    start..end
}
