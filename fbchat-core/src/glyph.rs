//! Glyph rasterizer.
//!
//! Glyphs are 8x16 one-bit bitmaps (one byte per bitmap row, MSB on the
//! left). Every bit is drawn as a 2x2 pixel block, so a text cell covers
//! 16x32 pixels on the surface.

use crate::surface::{BYTES_PER_PIXEL, PixelSurface, SurfaceError};
use thiserror::Error;

pub const GLYPH_WIDTH: usize = 8;
pub const GLYPH_HEIGHT: usize = 16;
/// Enlargement along both axes.
pub const SCALE: usize = 2;
pub const CELL_WIDTH_PX: usize = GLYPH_WIDTH * SCALE;
pub const CELL_HEIGHT_PX: usize = GLYPH_HEIGHT * SCALE;

/// Number of entries in a glyph table; the index is the character code.
pub const GLYPH_COUNT: usize = 256;

/// Opaque white, R G B then the unused byte.
pub const FOREGROUND: [u8; BYTES_PER_PIXEL] = [255, 255, 255, 0];
pub const BACKGROUND: [u8; BYTES_PER_PIXEL] = [0, 0, 0, 0];

pub type GlyphBitmap = [u8; GLYPH_HEIGHT];

/// An all-background cell.
pub const BLANK: GlyphBitmap = [0; GLYPH_HEIGHT];

/// 8x16 console font (lat0-16), codes 0-127. The upper half is blank.
static BUILTIN: &[u8; GLYPH_COUNT * GLYPH_HEIGHT] = include_bytes!("../assets/console-8x16.bin");

const PSF1_MAGIC: [u8; 2] = [0x36, 0x04];
const PSF1_HEADER_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FontError {
    #[error("not a PSF1 font (bad magic)")]
    BadMagic,
    #[error("unsupported glyph height {0}, expected 16")]
    UnsupportedHeight(u8),
    #[error("font data truncated: {got} bytes, need {needed}")]
    Truncated { got: usize, needed: usize },
}

/// Read-only glyph table shared by everything that draws.
#[derive(Clone)]
pub struct Font {
    table: Vec<GlyphBitmap>,
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font").field("glyphs", &self.table.len()).finish()
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Font {
    pub fn builtin() -> Self {
        Self::from_table(BUILTIN)
    }

    fn from_table(bytes: &[u8]) -> Self {
        let table = bytes
            .chunks_exact(GLYPH_HEIGHT)
            .take(GLYPH_COUNT)
            .map(|chunk| {
                let mut glyph = BLANK;
                glyph.copy_from_slice(chunk);
                glyph
            })
            .collect();
        Self { table }
    }

    /// Loads the first 256 glyphs of a PSF1 console font with 16-row glyphs.
    pub fn from_psf(bytes: &[u8]) -> Result<Self, FontError> {
        if bytes.len() < PSF1_HEADER_LEN || bytes[..2] != PSF1_MAGIC {
            return Err(FontError::BadMagic);
        }
        let height = bytes[3];
        if height as usize != GLYPH_HEIGHT {
            return Err(FontError::UnsupportedHeight(height));
        }
        let needed = PSF1_HEADER_LEN + GLYPH_COUNT * GLYPH_HEIGHT;
        if bytes.len() < needed {
            return Err(FontError::Truncated {
                got: bytes.len(),
                needed,
            });
        }
        Ok(Self::from_table(&bytes[PSF1_HEADER_LEN..needed]))
    }

    pub fn glyph(&self, code: u8) -> &GlyphBitmap {
        &self.table[code as usize]
    }
}

/// Paints one glyph into text cell (`row`, `col`).
///
/// Writes the full 16x32 pixel cell. Fails without touching the surface if
/// any part of the cell lies past the mapped length.
pub fn draw_glyph<M>(
    surface: &mut PixelSurface<M>,
    bitmap: &GlyphBitmap,
    row: usize,
    col: usize,
) -> Result<(), SurfaceError>
where
    M: AsRef<[u8]> + AsMut<[u8]>,
{
    let span = surface.cell_span(row, col)?;
    let stride = surface.geometry().stride;
    let bytes = surface.bytes_mut();

    for y in 0..CELL_HEIGHT_PX {
        let bits = bitmap[y / SCALE];
        let line = span.start + y * stride;
        for x in 0..GLYPH_WIDTH {
            let px = if bits & (0x80 >> x) != 0 {
                FOREGROUND
            } else {
                BACKGROUND
            };
            for dx in 0..SCALE {
                let at = line + (x * SCALE + dx) * BYTES_PER_PIXEL;
                bytes[at..at + BYTES_PER_PIXEL].copy_from_slice(&px);
            }
        }
    }
    Ok(())
}

/// A surface paired with the font used to draw on it.
pub struct Canvas<'a, M> {
    surface: &'a mut PixelSurface<M>,
    font: &'a Font,
}

impl<'a, M> Canvas<'a, M>
where
    M: AsRef<[u8]> + AsMut<[u8]>,
{
    pub fn new(surface: &'a mut PixelSurface<M>, font: &'a Font) -> Self {
        Self { surface, font }
    }

    /// Draws character `code` at (`row`, `col`).
    pub fn put(&mut self, row: usize, col: usize, code: u8) -> Result<(), SurfaceError> {
        draw_glyph(self.surface, self.font.glyph(code), row, col)
    }

    pub fn blank(&mut self, row: usize, col: usize) -> Result<(), SurfaceError> {
        draw_glyph(self.surface, &BLANK, row, col)
    }

    pub fn surface(&mut self) -> &mut PixelSurface<M> {
        &mut *self.surface
    }
}
