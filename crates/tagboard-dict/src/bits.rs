//! Square payload grids packed into a `u64`.

use crate::{rotate_code_u64, DictError};

/// A square grid of payload bits.
///
/// Bits are stored row-major (`idx = row * side + col`) with **white = 1** and
/// **black = 0**. This matches how code lists are written in dictionary files
/// and how the bitmap generator paints cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BitMatrix {
    side: usize,
    code: u64,
}

impl BitMatrix {
    /// Largest supported side; `8 × 8 = 64` bits fill the packed word.
    pub const MAX_SIDE: usize = 8;

    /// Grid with every bit set to `white`.
    pub fn filled(side: usize, white: bool) -> Result<Self, DictError> {
        check_side(side)?;
        let code = if white { mask(side) } else { 0 };
        Ok(Self { side, code })
    }

    /// Grid from a packed code. Bits beyond `side * side` are ignored.
    pub fn from_code(side: usize, code: u64) -> Result<Self, DictError> {
        check_side(side)?;
        Ok(Self {
            side,
            code: code & mask(side),
        })
    }

    /// Parse a row-major string of `'0'`/`'1'` whose length is a perfect square.
    ///
    /// ASCII whitespace is ignored so that multi-line grids can be pasted.
    pub fn from_bit_str(s: &str) -> Result<Self, DictError> {
        let digits: Vec<char> = s.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let side = (1..=Self::MAX_SIDE)
            .find(|n| n * n == digits.len())
            .ok_or_else(|| DictError::MalformedBits(s.to_string()))?;

        let mut code = 0u64;
        for (idx, c) in digits.iter().enumerate() {
            match c {
                '0' => {}
                '1' => code |= 1 << idx,
                _ => return Err(DictError::MalformedBits(s.to_string())),
            }
        }
        Ok(Self { side, code })
    }

    /// Parse one string per row; every row must have `rows.len()` digits.
    pub fn from_rows<R: AsRef<str>>(rows: &[R]) -> Result<Self, DictError> {
        let side = rows.len();
        for row in rows {
            let row = row.as_ref();
            if row.chars().count() != side {
                return Err(DictError::MalformedBits(row.to_string()));
            }
        }
        let joined: String = rows.iter().map(AsRef::as_ref).collect();
        Self::from_bit_str(&joined)
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    /// Packed row-major code.
    #[inline]
    pub fn code(&self) -> u64 {
        self.code
    }

    #[inline]
    pub fn bit_count(&self) -> usize {
        self.side * self.side
    }

    /// True if the cell holds a `1` (white).
    ///
    /// # Panics
    /// If `row` or `col` is not below `side`.
    #[inline]
    pub fn is_white(&self, row: usize, col: usize) -> bool {
        assert!(row < self.side && col < self.side, "bit index out of range");
        (self.code >> (row * self.side + col)) & 1 == 1
    }

    #[inline]
    pub fn is_black(&self, row: usize, col: usize) -> bool {
        !self.is_white(row, col)
    }

    /// # Panics
    /// If `row` or `col` is not below `side`.
    pub fn set_white(&mut self, row: usize, col: usize, white: bool) {
        assert!(row < self.side && col < self.side, "bit index out of range");
        let bit = 1u64 << (row * self.side + col);
        if white {
            self.code |= bit;
        } else {
            self.code &= !bit;
        }
    }

    /// Rotate by `rot * 90°` clockwise.
    pub fn rotated(&self, rot: u8) -> Self {
        Self {
            side: self.side,
            code: rotate_code_u64(self.code, self.side, rot),
        }
    }

    /// Quarter turn counter-clockwise: `new[i][j] = old[j][n-1-i]`.
    pub fn rotate_left(&self) -> Self {
        self.rotated(3)
    }

    /// Quarter turn clockwise: `new[i][j] = old[n-1-j][i]`.
    pub fn rotate_right(&self) -> Self {
        self.rotated(1)
    }

    /// Number of differing bits; `None` if the sides differ.
    pub fn hamming(&self, other: &BitMatrix) -> Option<u32> {
        (self.side == other.side).then(|| (self.code ^ other.code).count_ones())
    }

    /// Row-major `'0'`/`'1'` string, the inverse of [`BitMatrix::from_bit_str`].
    pub fn to_bit_string(&self) -> String {
        (0..self.bit_count())
            .map(|idx| if (self.code >> idx) & 1 == 1 { '1' } else { '0' })
            .collect()
    }
}

fn check_side(side: usize) -> Result<(), DictError> {
    if side == 0 || side > BitMatrix::MAX_SIDE {
        return Err(DictError::UnsupportedMarkSize(side + 2));
    }
    Ok(())
}

fn mask(side: usize) -> u64 {
    let bits = side * side;
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}
