use image::Rgba;

/// Rec. 601 weights, summing to exactly one so that white maps to 255.
const WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Composites a sample over black and returns its RGB channels as floats.
pub fn composite(pixel: Rgba<u8>) -> [f32; 3] {
    let [r, g, b, a] = pixel.0;
    let alpha = a as f32 / 255.0;
    [r as f32 * alpha, g as f32 * alpha, b as f32 * alpha]
}

pub fn luminance(rgb: [f32; 3]) -> f32 {
    rgb[0] * WEIGHTS[0] + rgb[1] * WEIGHTS[1] + rgb[2] * WEIGHTS[2]
}

/// Brightness of an already composited color in `0..=255`.
///
/// `negative` returns the exact complement, so `brightness(c, false) + brightness(c, true)`
/// is always 255.
pub fn brightness(rgb: [f32; 3], negative: bool) -> u8 {
    let value = luminance(rgb).round().clamp(0.0, 255.0) as u8;
    if negative {
        255 - value
    } else {
        value
    }
}

pub fn pixel_brightness(pixel: Rgba<u8>, negative: bool) -> u8 {
    brightness(composite(pixel), negative)
}

/// Resolves the color reported for a cell from its averaged block color.
pub fn reported_color(rgb: [f32; 3], negative: bool, grayscale: bool) -> [u8; 3] {
    let mut color = if grayscale {
        let value = luminance(rgb);
        [value; 3]
    } else {
        rgb
    };

    if negative {
        for channel in &mut color {
            *channel = 255.0 - *channel;
        }
    }

    color.map(|channel| channel.round().clamp(0.0, 255.0) as u8)
}
