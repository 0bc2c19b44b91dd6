//! Marker bitmap generation.
//!
//! Two strategies exist, one per [`MarkerCode`](crate::MarkerCode) variant:
//! - dictionary codes: a `mark_size × mark_size` cell grid whose outer ring is
//!   a solid black border and whose interior follows the payload bits,
//! - text codes: a module matrix painted as-is, with the cell size rounded
//!   down so the raster may come out slightly smaller than requested.

use tagboard_core::{GrayImage, BLACK, WHITE};
use tagboard_dict::{BitMatrix, ModuleMatrix};

use crate::placement::MAX_MARKER_PX;
use crate::BitmapError;

/// Pixel budget of one marker raster.
pub const MAX_BITMAP_PIXELS: usize = (MAX_MARKER_PX as usize) * (MAX_MARKER_PX as usize);

fn blank_square(side: usize) -> Result<GrayImage, BitmapError> {
    match side.checked_mul(side) {
        Some(pixels) if pixels <= MAX_BITMAP_PIXELS => Ok(GrayImage::new_filled(side, side, WHITE)),
        _ => Err(BitmapError::TooLarge {
            side,
            max_pixels: MAX_BITMAP_PIXELS,
        }),
    }
}

/// Edge length of one cell when `pixel_size` is split into `cells` cells.
///
/// Fails unless the split is exact.
pub fn exact_cell_size(pixel_size: u32, cells: usize) -> Result<u32, BitmapError> {
    let cells_u32 = u32::try_from(cells).unwrap_or(u32::MAX);
    if cells == 0 || pixel_size < cells_u32 {
        return Err(BitmapError::TooSmall { pixel_size, cells });
    }
    if pixel_size % cells_u32 != 0 {
        return Err(BitmapError::NotAMultiple { pixel_size, cells });
    }
    Ok(pixel_size / cells_u32)
}

/// Render a dictionary code as a `pixel_size × pixel_size` raster.
///
/// `code` is the `(mark_size-2)²` payload. Cells whose bit is `0` are black,
/// the rest stay white. `pixel_size` must be a multiple of `mark_size`.
pub fn fixed_grid_bitmap(
    code: &BitMatrix,
    mark_size: usize,
    pixel_size: u32,
) -> Result<GrayImage, BitmapError> {
    if mark_size < 3 || code.side() + 2 != mark_size {
        return Err(BitmapError::PayloadSide {
            mark_size,
            got: code.side(),
        });
    }
    let cell = exact_cell_size(pixel_size, mark_size)? as usize;
    let side = pixel_size as usize;
    let last = (mark_size - 1) * cell;

    let mut img = blank_square(side)?;

    // Border ring.
    img.fill_rect(0, 0, side, cell, BLACK);
    img.fill_rect(0, last, side, cell, BLACK);
    img.fill_rect(0, 0, cell, side, BLACK);
    img.fill_rect(last, 0, cell, side, BLACK);

    for row in 0..code.side() {
        for col in 0..code.side() {
            if code.is_black(row, col) {
                img.fill_rect((col + 1) * cell, (row + 1) * cell, cell, cell, BLACK);
            }
        }
    }
    Ok(img)
}

/// Render a text-code module matrix at roughly `requested_px` pixels.
///
/// The cell size is `floor(requested_px / size)` and the output side is
/// `cell * size`, which may be below `requested_px`.
pub fn module_bitmap(modules: &ModuleMatrix, requested_px: u32) -> Result<GrayImage, BitmapError> {
    let count = modules.size();
    let count_u32 = u32::try_from(count).unwrap_or(u32::MAX);
    if requested_px < count_u32 {
        return Err(BitmapError::TooSmall {
            pixel_size: requested_px,
            cells: count,
        });
    }
    let cell = (requested_px / count_u32) as usize;
    let side = cell * count;

    let mut img = blank_square(side)?;
    for row in 0..count {
        for col in 0..count {
            if modules.is_dark(row, col) {
                img.fill_rect(col * cell, row * cell, cell, cell, BLACK);
            }
        }
    }
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> BitMatrix {
        BitMatrix::from_rows(&["0110", "0111", "0100", "1010"]).expect("bits")
    }

    #[test]
    fn border_ring_is_black_and_cells_are_exact() {
        for (mark_size, pixel_size) in [(6usize, 90u32), (6, 6), (7, 91), (10, 200)] {
            let code = BitMatrix::filled(mark_size - 2, true).expect("bits");
            let img = fixed_grid_bitmap(&code, mark_size, pixel_size).expect("bitmap");
            let cell = (pixel_size as usize) / mark_size;
            assert_eq!(cell * mark_size, pixel_size as usize);
            assert_eq!((img.width, img.height), (pixel_size as usize, pixel_size as usize));

            for k in 0..mark_size {
                for (cx, cy) in [(k, 0), (k, mark_size - 1), (0, k), (mark_size - 1, k)] {
                    assert!(
                        img.block_is(cx * cell, cy * cell, cell, cell, BLACK),
                        "border cell ({cx},{cy}) at {mark_size}/{pixel_size}"
                    );
                }
            }
            // All-white payload leaves the interior white.
            assert!(img.block_is(cell, cell, cell * (mark_size - 2), cell * (mark_size - 2), WHITE));
        }
    }

    #[test]
    fn payload_zero_bits_are_black() {
        let code = payload();
        let img = fixed_grid_bitmap(&code, 6, 60).expect("bitmap");
        for row in 0..4 {
            for col in 0..4 {
                let expected = if code.is_black(row, col) { BLACK } else { WHITE };
                assert!(
                    img.block_is((col + 1) * 10, (row + 1) * 10, 10, 10, expected),
                    "cell ({row},{col})"
                );
            }
        }
    }

    #[test]
    fn rejects_inexact_sizes() {
        let code = payload();
        assert_eq!(
            fixed_grid_bitmap(&code, 6, 91),
            Err(BitmapError::NotAMultiple {
                pixel_size: 91,
                cells: 6
            })
        );
        assert_eq!(
            fixed_grid_bitmap(&code, 6, 5),
            Err(BitmapError::TooSmall {
                pixel_size: 5,
                cells: 6
            })
        );
        assert_eq!(
            fixed_grid_bitmap(&code, 7, 70),
            Err(BitmapError::PayloadSide {
                mark_size: 7,
                got: 4
            })
        );
    }

    #[test]
    fn oversized_rasters_are_refused_before_allocating() {
        let code = payload();
        assert_eq!(
            fixed_grid_bitmap(&code, 6, 10_000_002),
            Err(BitmapError::TooLarge {
                side: 10_000_002,
                max_pixels: MAX_BITMAP_PIXELS
            })
        );
        let max = MAX_MARKER_PX - MAX_MARKER_PX % 6;
        assert!(fixed_grid_bitmap(&code, 6, max).is_ok());

        let modules = ModuleMatrix::new(21, vec![false; 21 * 21]).expect("modules");
        assert!(matches!(
            module_bitmap(&modules, u32::MAX),
            Err(BitmapError::TooLarge { .. })
        ));
    }

    #[test]
    fn module_bitmap_rounds_cell_size_down() {
        let dark = (0..21 * 21).map(|i| i % 3 == 0).collect();
        let modules = ModuleMatrix::new(21, dark).expect("modules");
        let img = module_bitmap(&modules, 100).expect("bitmap");
        assert_eq!((img.width, img.height), (84, 84));
        assert!(img.block_is(0, 0, 4, 4, BLACK));
        assert!(img.block_is(4, 0, 4, 4, WHITE));
        assert!(module_bitmap(&modules, 20).is_err());
    }
}
