/// Intensity used for black cells.
pub const BLACK: u8 = 0;
/// Intensity used for white cells and the raster background.
pub const WHITE: u8 = 255;

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

impl GrayImageView<'_> {
    /// Pixel at `(x, y)`, `None` outside the raster.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> Option<u8> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        self.data.get(y as usize * self.width + x as usize).copied()
    }
}

/// Owned row-major 8-bit raster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    /// Raster of `width × height` pixels, every pixel set to `value`.
    pub fn new_filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        self.view().get(x as i64, y as i64)
    }

    /// Paint the axis-aligned block `[x, x+w) × [y, y+h)`, clipped to the raster.
    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, value: u8) {
        let x1 = (x + w).min(self.width);
        let y1 = (y + h).min(self.height);
        for row in y.min(self.height)..y1 {
            let start = row * self.width;
            self.data[start + x.min(x1)..start + x1].fill(value);
        }
    }

    /// True if every pixel of the block equals `value`.
    pub fn block_is(&self, x: usize, y: usize, w: usize, h: usize, value: u8) -> bool {
        if x + w > self.width || y + h > self.height {
            return false;
        }
        (y..y + h).all(|row| {
            let start = row * self.width;
            self.data[start + x..start + x + w]
                .iter()
                .all(|&v| v == value)
        })
    }
}
