use crate::image_pipeline::dither::level_index;
use crate::AicError;

const SIMPLE: &str = " .:-=+*#%@";
const COMPLEX: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|\\/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// Characters ordered from darkest-appearing to brightest-appearing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ramp {
    chars: Vec<char>,
}

impl Ramp {
    pub fn new(chars: impl AsRef<str>) -> Result<Self, AicError> {
        let chars: Vec<char> = chars.as_ref().chars().collect();
        if chars.len() < 2 {
            return Err(AicError::Config(format!(
                "character map must contain at least two characters, got {}",
                chars.len()
            )));
        }
        Ok(Self { chars })
    }

    /// Ten-level ramp used unless a complex or custom map is requested.
    pub fn simple() -> Self {
        Self { chars: SIMPLE.chars().collect() }
    }

    pub fn complex() -> Self {
        Self { chars: COMPLEX.chars().collect() }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// `floor(brightness / 256 * len)`, clamped to the last index.
    pub fn index_for(&self, brightness: f32) -> usize {
        level_index(brightness, self.chars.len())
    }

    pub fn char_for(&self, brightness: f32) -> char {
        self.chars[self.index_for(brightness)]
    }
}

impl Default for Ramp {
    fn default() -> Self {
        Self::simple()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_have_expected_lengths() {
        assert_eq!(Ramp::simple().len(), 10);
        assert_eq!(Ramp::complex().len(), 70);
        assert_eq!(Ramp::complex().chars()[0], ' ');
    }

    #[test]
    fn short_custom_maps_are_rejected() {
        assert!(matches!(Ramp::new("#"), Err(AicError::Config(_))));
        assert!(matches!(Ramp::new(""), Err(AicError::Config(_))));
        assert!(Ramp::new("01").is_ok());
    }

    #[test]
    fn extremes_map_to_ends() {
        let ramp = Ramp::new(" .:-=+*#%@").unwrap();
        assert_eq!(ramp.char_for(0.0), ' ');
        assert_eq!(ramp.char_for(255.0), '@');
        assert_eq!(ramp.char_for(300.0), '@');
        assert_eq!(ramp.char_for(-4.0), ' ');
    }

    #[test]
    fn index_is_monotonic() {
        for ramp in [Ramp::simple(), Ramp::complex(), Ramp::new("ab").unwrap()] {
            let mut previous = 0;
            for value in 0..=255 {
                let index = ramp.index_for(value as f32);
                assert!(index >= previous);
                previous = index;
            }
            assert_eq!(previous, ramp.len() - 1);
        }
    }

    #[test]
    fn multibyte_characters_count_once() {
        let ramp = Ramp::new("░▒▓█").unwrap();
        assert_eq!(ramp.len(), 4);
        assert_eq!(ramp.char_for(255.0), '█');
    }
}
