//! Scroll engine: shifts a region's pixels up by one text row.

use crate::glyph::{CELL_HEIGHT_PX, CELL_WIDTH_PX, Canvas};
use crate::region::RegionBounds;
use crate::surface::{BYTES_PER_PIXEL, SurfaceError};

/// Moves rows `first_row + 1 ..= last_row` of `bounds` up by one text row
/// and blanks the vacated last row across the region's full width.
///
/// Only the region's own columns are moved, so neighbouring pixels on the
/// same scanlines are left alone. When the region spans whole scanlines the
/// move is a single block copy.
pub fn scroll_up<M>(canvas: &mut Canvas<'_, M>, bounds: &RegionBounds) -> Result<(), SurfaceError>
where
    M: AsRef<[u8]> + AsMut<[u8]>,
{
    if bounds.height() > 1 {
        let surface = canvas.surface();
        let stride = surface.geometry().stride;
        let line_len = bounds.width() * CELL_WIDTH_PX * BYTES_PER_PIXEL;
        let dst = surface.cell_offset(bounds.first_row, bounds.first_col);
        let src = surface.cell_offset(bounds.first_row + 1, bounds.first_col);

        if line_len == stride {
            let len = (bounds.height() - 1) * CELL_HEIGHT_PX * stride;
            surface.copy_within(src, dst, len)?;
        } else {
            for line in 0..(bounds.height() - 1) * CELL_HEIGHT_PX {
                surface.copy_within(src + line * stride, dst + line * stride, line_len)?;
            }
        }
    }

    for col in bounds.first_col..bounds.end_col {
        canvas.blank(bounds.last_row, col)?;
    }
    Ok(())
}
