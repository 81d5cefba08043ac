//! Pixel surface addressing.
//!
//! The surface is a flat, row-major byte buffer (normally the mapped
//! framebuffer) at a fixed depth of 4 bytes per pixel. Text cells are laid
//! over it at a fixed 16x32 pixel pitch, shifted by the panning origin the
//! display reports.

use crate::glyph::{CELL_HEIGHT_PX, CELL_WIDTH_PX};
use std::ops::Range;
use thiserror::Error;

/// Pixel depth. Only 32bpp surfaces are supported.
pub const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("{len} bytes at offset {offset} exceed mapped length {mapped}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        mapped: usize,
    },
    #[error("surface needs {needed} bytes (stride x height) but only {mapped} are mapped")]
    TooSmall { needed: usize, mapped: usize },
}

/// Shape of the surface as reported by the display device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceGeometry {
    /// Visible width in pixels.
    pub width: usize,
    /// Visible height in pixels.
    pub height: usize,
    /// Bytes per pixel row.
    pub stride: usize,
    /// Horizontal pixel origin applied to every text coordinate.
    pub x_origin: usize,
    /// Vertical pixel origin applied to every text coordinate.
    pub y_origin: usize,
}

impl SurfaceGeometry {
    /// Tightly packed geometry with no origin offset.
    pub fn packed(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            stride: width * BYTES_PER_PIXEL,
            x_origin: 0,
            y_origin: 0,
        }
    }

    /// Number of whole text rows that fit below the origin.
    pub fn text_rows(&self) -> usize {
        self.height.saturating_sub(self.y_origin) / CELL_HEIGHT_PX
    }

    /// Number of whole text columns that fit right of the origin.
    pub fn text_cols(&self) -> usize {
        self.width.saturating_sub(self.x_origin) / CELL_WIDTH_PX
    }

    /// Byte offset of the top-left pixel of text cell (`row`, `col`).
    ///
    /// Pure arithmetic; callers range-check the result against the mapped
    /// length before writing.
    pub fn cell_offset(&self, row: usize, col: usize) -> usize {
        (row * CELL_HEIGHT_PX + self.y_origin) * self.stride
            + (col * CELL_WIDTH_PX + self.x_origin) * BYTES_PER_PIXEL
    }
}

/// Owns the pixel memory and its geometry.
///
/// `M` is anything byte-addressable: the mapped framebuffer in production,
/// a plain `Vec<u8>` in tests.
pub struct PixelSurface<M> {
    mem: M,
    geometry: SurfaceGeometry,
}

impl<M> std::fmt::Debug for PixelSurface<M>
where
    M: AsRef<[u8]>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelSurface")
            .field("geometry", &self.geometry)
            .field("mapped", &self.mem.as_ref().len())
            .finish()
    }
}

impl<M> PixelSurface<M>
where
    M: AsRef<[u8]> + AsMut<[u8]>,
{
    pub fn new(mem: M, geometry: SurfaceGeometry) -> Result<Self, SurfaceError> {
        let needed = geometry.stride * geometry.height;
        let mapped = mem.as_ref().len();
        if needed > mapped {
            return Err(SurfaceError::TooSmall { needed, mapped });
        }
        Ok(Self { mem, geometry })
    }

    pub fn geometry(&self) -> &SurfaceGeometry {
        &self.geometry
    }

    pub fn mapped_len(&self) -> usize {
        self.mem.as_ref().len()
    }

    pub fn bytes(&self) -> &[u8] {
        self.mem.as_ref()
    }

    pub fn into_inner(self) -> M {
        self.mem
    }

    pub fn cell_offset(&self, row: usize, col: usize) -> usize {
        self.geometry.cell_offset(row, col)
    }

    /// Range-checked byte span starting at `offset`.
    pub fn span(&self, offset: usize, len: usize) -> Result<Range<usize>, SurfaceError> {
        let mapped = self.mapped_len();
        match offset.checked_add(len) {
            Some(end) if end <= mapped => Ok(offset..end),
            _ => Err(SurfaceError::OutOfBounds {
                offset,
                len,
                mapped,
            }),
        }
    }

    /// Byte span touched when drawing one text cell: from the cell's first
    /// pixel to the last pixel of its last pixel row.
    pub fn cell_span(&self, row: usize, col: usize) -> Result<Range<usize>, SurfaceError> {
        let len = (CELL_HEIGHT_PX - 1) * self.geometry.stride + CELL_WIDTH_PX * BYTES_PER_PIXEL;
        self.span(self.cell_offset(row, col), len)
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.mem.as_mut()
    }

    /// Reads the pixel at (`x`, `y`) in surface pixel coordinates (origin
    /// not applied).
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; BYTES_PER_PIXEL]> {
        let offset = y * self.geometry.stride + x * BYTES_PER_PIXEL;
        let bytes = self.bytes().get(offset..offset + BYTES_PER_PIXEL)?;
        let mut px = [0u8; BYTES_PER_PIXEL];
        px.copy_from_slice(bytes);
        Some(px)
    }

    /// Moves `len` bytes from `src` to `dst` within the surface. Ranges may
    /// overlap.
    pub fn copy_within(&mut self, src: usize, dst: usize, len: usize) -> Result<(), SurfaceError> {
        let from = self.span(src, len)?;
        self.span(dst, len)?;
        self.mem.as_mut().copy_within(from, dst);
        Ok(())
    }
}
