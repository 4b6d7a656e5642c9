/// Row-major brightness values in `0.0..=255.0`.
#[derive(Clone, Debug, PartialEq)]
pub struct LumaField {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f32>,
}

impl LumaField {
    pub fn new(width: usize, height: usize, values: Vec<f32>) -> Self {
        debug_assert_eq!(width * height, values.len());
        Self { width, height, values }
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }
}

/// Output levels a cell can be quantized to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quantizer {
    /// One level per ramp character, binned exactly as the ramp picks characters.
    Levels(usize),
    /// Two levels split at a brightness threshold, as used for braille dots.
    Threshold(u8),
}

impl Quantizer {
    fn quantize(&self, value: f32) -> f32 {
        match *self {
            Quantizer::Levels(count) => {
                let count = count.max(2);
                level_value(level_index(value, count), count)
            },
            Quantizer::Threshold(threshold) => {
                if value >= threshold as f32 {
                    255.0
                } else {
                    0.0
                }
            },
        }
    }
}

/// Bin of `brightness` when `0..=255` is cut into `count` equal bins of width `256 / count`.
pub fn level_index(brightness: f32, count: usize) -> usize {
    let scaled = brightness.clamp(0.0, 255.0) * count as f32 / 256.0;
    (scaled as usize).min(count - 1)
}

/// Brightness a quantized cell takes for bin `index`.
///
/// This is the evenly spaced level `index * 255 / (count - 1)` whenever that level falls in
/// the bin, which holds for up to 256 bins. Longer ramps use the bin's midpoint instead.
pub fn level_value(index: usize, count: usize) -> f32 {
    let even = index as f32 * 255.0 / (count - 1) as f32;
    if level_index(even, count) == index {
        return even;
    }
    let midpoint = (index as f32 + 0.5) * 256.0 / count as f32;
    midpoint.min(255.0)
}

// Floyd-Steinberg weights: right, below-left, below, below-right.
const RIGHT: f32 = 7.0 / 16.0;
const BELOW_LEFT: f32 = 3.0 / 16.0;
const BELOW: f32 = 5.0 / 16.0;
const BELOW_RIGHT: f32 = 1.0 / 16.0;

/// Error-diffuses `field` in raster order, replacing each value with its quantized level.
///
/// Error pushed past the right or bottom edge is dropped.
pub fn diffuse(field: &mut LumaField, quantizer: Quantizer) {
    let (width, height) = (field.width, field.height);
    let values = &mut field.values;

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let old = values[idx];
            let new = quantizer.quantize(old);
            let error = old - new;
            values[idx] = new;

            if x + 1 < width {
                values[idx + 1] += error * RIGHT;
            }

            if y + 1 < height {
                let below = idx + width;
                if x > 0 {
                    values[below - 1] += error * BELOW_LEFT;
                }
                values[below] += error * BELOW;
                if x + 1 < width {
                    values[below + 1] += error * BELOW_RIGHT;
                }
            }
        }
    }
}
