//! Packing of 2x4 dot matrices into Unicode braille patterns.

/// Empty braille pattern, U+2800.
pub const BRAILLE_BASE: char = '\u{2800}';

/// Bit for each dot, indexed `[column][row]`.
///
/// ```text
/// 0x01 0x08
/// 0x02 0x10
/// 0x04 0x20
/// 0x40 0x80
/// ```
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

pub fn pack(dots: [[bool; 4]; 2]) -> char {
    let mut code = 0u8;
    for (column, rows) in dots.iter().enumerate() {
        for (row, &lit) in rows.iter().enumerate() {
            if lit {
                code |= DOT_BITS[column][row];
            }
        }
    }
    from_bits(code)
}

pub fn is_braille(ch: char) -> bool {
    (BRAILLE_BASE..='\u{28FF}').contains(&ch)
}

/// Swaps the left and right dot columns.
pub fn mirror_x(ch: char) -> char {
    remap(ch, |column, row| (1 - column, row))
}

/// Reverses the dot rows.
pub fn mirror_y(ch: char) -> char {
    remap(ch, |column, row| (column, 3 - row))
}

fn remap(ch: char, target: impl Fn(usize, usize) -> (usize, usize)) -> char {
    if !is_braille(ch) {
        return ch;
    }

    let code = (ch as u32 - BRAILLE_BASE as u32) as u8;
    let mut mirrored = 0u8;
    for column in 0..2 {
        for row in 0..4 {
            if code & DOT_BITS[column][row] != 0 {
                let (to_column, to_row) = target(column, row);
                mirrored |= DOT_BITS[to_column][to_row];
            }
        }
    }
    from_bits(mirrored)
}

fn from_bits(code: u8) -> char {
    char::from_u32(BRAILLE_BASE as u32 + code as u32).unwrap_or(BRAILLE_BASE)
}
