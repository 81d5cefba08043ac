//! Screen layout: where the output log, the separator and the input line
//! sit on the text grid.
//!
//! ```text
//! row 0          ****************  border
//! rows 1..=R-5   output log
//! row R-4        ----------------  separator
//! rows R-3..=R-2 input line (two rows)
//! row R-1        ****************  border
//! ```

use crate::region::RegionBounds;
use crate::surface::SurfaceGeometry;
use thiserror::Error;

/// Smallest grid with at least one output row.
pub const MIN_ROWS: usize = 6;
pub const INPUT_ROWS: usize = 2;

pub const BORDER_GLYPH: u8 = b'*';
pub const SEPARATOR_GLYPH: u8 = b'-';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("grid of {rows}x{cols} is too small (need at least {min} rows and 1 column)", min = MIN_ROWS)]
    GridTooSmall { rows: usize, cols: usize },
    #[error("grid of {rows}x{cols} does not fit a surface holding {max_rows}x{max_cols} cells")]
    GridTooLarge {
        rows: usize,
        cols: usize,
        max_rows: usize,
        max_cols: usize,
    },
    #[error("empty region: rows {first_row}..={last_row}, cols {first_col}..{end_col}")]
    EmptyRegion {
        first_row: usize,
        last_row: usize,
        first_col: usize,
        end_col: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    rows: usize,
    cols: usize,
}

impl Layout {
    pub fn new(rows: usize, cols: usize) -> Result<Self, LayoutError> {
        if rows < MIN_ROWS || cols == 0 {
            return Err(LayoutError::GridTooSmall { rows, cols });
        }
        Ok(Self { rows, cols })
    }

    /// A `rows x cols` grid checked against the surface's text capacity.
    pub fn fit(geometry: &SurfaceGeometry, rows: usize, cols: usize) -> Result<Self, LayoutError> {
        let (max_rows, max_cols) = (geometry.text_rows(), geometry.text_cols());
        if rows > max_rows || cols > max_cols {
            return Err(LayoutError::GridTooLarge {
                rows,
                cols,
                max_rows,
                max_cols,
            });
        }
        Self::new(rows, cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn border_rows(&self) -> [usize; 2] {
        [0, self.rows - 1]
    }

    pub fn separator_row(&self) -> usize {
        self.rows - 4
    }

    pub fn output_bounds(&self) -> RegionBounds {
        RegionBounds {
            first_row: 1,
            last_row: self.separator_row() - 1,
            first_col: 0,
            end_col: self.cols,
        }
    }

    pub fn input_bounds(&self) -> RegionBounds {
        let first_row = self.separator_row() + 1;
        RegionBounds {
            first_row,
            last_row: first_row + INPUT_ROWS - 1,
            first_col: 0,
            end_col: self.cols,
        }
    }
}
