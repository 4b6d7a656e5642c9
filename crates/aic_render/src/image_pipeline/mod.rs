pub mod dither;
pub mod loader;
pub mod luminance;
pub mod resize;
