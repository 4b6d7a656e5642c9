pub mod braille;
pub mod gradient;
pub mod grid;
pub mod mapping;
pub mod series;
