use std::fmt::Write;

use crossterm::style::{Color, ResetColor, SetBackgroundColor, SetForegroundColor};

use super::braille;
use crate::AicError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphCell {
    pub ch: char,
    /// Foreground color encoded as RGB bytes.
    pub fg: Option<[u8; 3]>,
    /// Optional background color encoded as RGB bytes.
    pub bg: Option<[u8; 3]>,
}

impl GlyphCell {
    pub fn plain(ch: char) -> Self {
        Self { ch, fg: None, bg: None }
    }

    pub fn is_colored(&self) -> bool {
        self.fg.is_some() || self.bg.is_some()
    }

    fn mirrored(self, flip_x: bool, flip_y: bool) -> Self {
        let mut ch = self.ch;
        if flip_x {
            ch = braille::mirror_x(ch);
        }
        if flip_y {
            ch = braille::mirror_y(ch);
        }
        Self { ch, ..self }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphGrid {
    pub width: u32,
    pub height: u32,
    pub cells: Vec<GlyphCell>,
}

impl GlyphGrid {
    pub fn new(width: u32, height: u32, cells: Vec<GlyphCell>) -> Result<Self, AicError> {
        if width == 0 || height == 0 || width as usize * height as usize != cells.len() {
            return Err(AicError::Input(format!(
                "{} cells cannot fill a {width}x{height} glyph grid",
                cells.len()
            )));
        }
        Ok(Self { width, height, cells })
    }

    pub fn cell(&self, x: u32, y: u32) -> Option<&GlyphCell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y as usize * self.width as usize + x as usize)
    }

    /// Plain text rows with no color sequences.
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        let width = self.width as usize;
        self.cells.chunks(width).map(|row| row.iter().map(|cell| cell.ch).collect::<String>())
    }

    /// Terminal rows with truecolor sequences before every colored cell and a reset at the
    /// end of each row that used color.
    pub fn ansi_rows(&self) -> Vec<String> {
        let width = self.width as usize;
        self.cells
            .chunks(width)
            .map(|row| {
                let mut line = String::with_capacity(row.len());
                let mut colored = false;
                for cell in row {
                    if let Some(fg) = cell.fg {
                        let _ = write!(line, "{}", SetForegroundColor(rgb(fg)));
                    }
                    if let Some(bg) = cell.bg {
                        let _ = write!(line, "{}", SetBackgroundColor(rgb(bg)));
                    }
                    colored |= cell.is_colored();
                    line.push(cell.ch);
                }
                if colored {
                    let _ = write!(line, "{}", ResetColor);
                }
                line
            })
            .collect()
    }

    /// Reorders columns and/or rows, mirroring braille dot patterns to match.
    pub fn flipped(&self, flip_x: bool, flip_y: bool) -> Self {
        if !flip_x && !flip_y {
            return self.clone();
        }

        let (width, height) = (self.width, self.height);
        let mut cells = Vec::with_capacity(self.cells.len());
        for y in 0..height {
            let source_y = if flip_y { height - 1 - y } else { y };
            for x in 0..width {
                let source_x = if flip_x { width - 1 - x } else { x };
                let cell = self.cells[(source_y * width + source_x) as usize];
                cells.push(cell.mirrored(flip_x, flip_y));
            }
        }

        Self { width, height, cells }
    }
}

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb { r, g, b }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> GlyphGrid {
        let cells = "abcdef".chars().map(GlyphCell::plain).collect();
        GlyphGrid::new(3, 2, cells).unwrap()
    }

    #[test]
    fn rejects_mismatched_cell_count() {
        let cells = vec![GlyphCell::plain('x'); 5];
        assert!(matches!(GlyphGrid::new(3, 2, cells), Err(AicError::Input(_))));
    }

    #[test]
    fn plain_rows() {
        let rows: Vec<String> = sample_grid().rows().collect();
        assert_eq!(rows, vec!["abc", "def"]);
        assert_eq!(sample_grid().ansi_rows(), vec!["abc", "def"]);
    }

    #[test]
    fn colored_rows_wrap_each_cell_and_reset() {
        let cells = vec![
            GlyphCell { ch: 'a', fg: Some([255, 0, 0]), bg: None },
            GlyphCell { ch: 'b', fg: None, bg: Some([0, 0, 255]) },
        ];
        let grid = GlyphGrid::new(2, 1, cells).unwrap();
        let rows = grid.ansi_rows();
        assert_eq!(rows, vec!["\x1b[38;2;255;0;0ma\x1b[48;2;0;0;255mb\x1b[0m"]);
        assert_eq!(grid.ansi_rows(), rows);
    }

    #[test]
    fn flips_reorder_cells() {
        let grid = sample_grid();
        let rows: Vec<String> = grid.flipped(true, false).rows().collect();
        assert_eq!(rows, vec!["cba", "fed"]);
        let rows: Vec<String> = grid.flipped(false, true).rows().collect();
        assert_eq!(rows, vec!["def", "abc"]);

        let both = grid.flipped(true, true);
        assert_eq!(both.cell(0, 0).map(|cell| cell.ch), Some('f'));
        assert_eq!(both.cell(2, 1).map(|cell| cell.ch), Some('a'));
        assert_eq!(both.cell(3, 0), None);
    }

    #[test]
    fn flips_are_involutions() {
        let grid = sample_grid();
        assert_eq!(grid.flipped(true, false).flipped(true, false), grid);
        assert_eq!(grid.flipped(false, true).flipped(false, true), grid);
        assert_eq!(grid.flipped(true, true).flipped(true, true), grid);
    }

    #[test]
    fn braille_cells_are_mirrored() {
        let grid = GlyphGrid::new(1, 1, vec![GlyphCell::plain('\u{2801}')]).unwrap();
        assert_eq!(grid.flipped(true, false).cells[0].ch, '\u{2808}');
    }
}
