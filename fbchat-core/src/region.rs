//! Text regions and their cursor model.
//!
//! A region is a fixed rectangle of text cells with its own write cursor,
//! edit cursor and bounded character buffer. The output log and the input
//! line are both regions; they differ only in the rules below:
//!
//! - The output region scrolls when writing past its last row. Its buffer
//!   records the current logical line and never blocks drawing.
//! - The input region never scrolls. Its buffer is the pending message, and
//!   typing stops once the buffer is full or the last cell is used. The write
//!   cursor always sits at buffer position `len`, the edit cursor at
//!   `edit_index`, so both are derived from buffer indices.
//!
//! The write cursor may rest one row past `last_row` after the final cell of
//! the region was written. No cell is ever drawn there: the output region
//! scrolls before its next character, the input region refuses it.

use crate::glyph::Canvas;
use crate::layout::LayoutError;
use crate::scroll;
use crate::surface::SurfaceError;
use tracing::trace;

/// A text cell coordinate. Ordering is lexicographic on (row, col).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

impl CellPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Text-cell rectangle: rows `first_row ..= last_row`, columns
/// `first_col .. end_col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionBounds {
    pub first_row: usize,
    pub last_row: usize,
    pub first_col: usize,
    pub end_col: usize,
}

impl RegionBounds {
    pub fn new(
        first_row: usize,
        last_row: usize,
        first_col: usize,
        end_col: usize,
    ) -> Result<Self, LayoutError> {
        if first_row > last_row || first_col >= end_col {
            return Err(LayoutError::EmptyRegion {
                first_row,
                last_row,
                first_col,
                end_col,
            });
        }
        Ok(Self {
            first_row,
            last_row,
            first_col,
            end_col,
        })
    }

    pub fn width(&self) -> usize {
        self.end_col - self.first_col
    }

    pub fn height(&self) -> usize {
        self.last_row - self.first_row + 1
    }

    pub fn cells(&self) -> usize {
        self.width() * self.height()
    }

    pub fn home(&self) -> CellPos {
        CellPos::new(self.first_row, self.first_col)
    }

    pub fn last_cell(&self) -> CellPos {
        CellPos::new(self.last_row, self.end_col - 1)
    }

    pub fn contains(&self, pos: CellPos) -> bool {
        (self.first_row..=self.last_row).contains(&pos.row)
            && (self.first_col..self.end_col).contains(&pos.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Output,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct TextRegion {
    kind: RegionKind,
    bounds: RegionBounds,
    write_cursor: CellPos,
    edit_cursor: CellPos,
    edit_index: usize,
    buffer: Vec<u8>,
    capacity: usize,
    blinking: bool,
}

impl TextRegion {
    pub fn new(kind: RegionKind, bounds: RegionBounds, capacity: usize) -> Self {
        let home = bounds.home();
        Self {
            kind,
            bounds,
            write_cursor: home,
            edit_cursor: home,
            edit_index: 0,
            buffer: Vec::with_capacity(capacity),
            capacity,
            blinking: false,
        }
    }

    /// Output log region; its line record holds one row's worth of text.
    pub fn output(bounds: RegionBounds) -> Self {
        Self::new(RegionKind::Output, bounds, bounds.width())
    }

    pub fn input(bounds: RegionBounds, capacity: usize) -> Self {
        Self::new(RegionKind::Input, bounds, capacity)
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    pub fn bounds(&self) -> &RegionBounds {
        &self.bounds
    }

    pub fn home(&self) -> CellPos {
        self.bounds.home()
    }

    pub fn write_cursor(&self) -> CellPos {
        self.write_cursor
    }

    pub fn edit_cursor(&self) -> CellPos {
        self.edit_cursor
    }

    pub fn edit_index(&self) -> usize {
        self.edit_index
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.capacity
    }

    pub fn is_blinking(&self) -> bool {
        self.blinking
    }

    fn overflowed(&self) -> bool {
        self.write_cursor.row > self.bounds.last_row
    }

    fn step_forward(&self, pos: CellPos) -> CellPos {
        if pos.col + 1 >= self.bounds.end_col {
            CellPos::new(pos.row + 1, self.bounds.first_col)
        } else {
            CellPos::new(pos.row, pos.col + 1)
        }
    }

    /// Previous cell, wrapping to the end of the row above. Callers check
    /// for the home cell first.
    fn step_back(&self, pos: CellPos) -> CellPos {
        if pos.col == self.bounds.first_col {
            CellPos::new(pos.row - 1, self.bounds.end_col - 1)
        } else {
            CellPos::new(pos.row, pos.col - 1)
        }
    }

    /// Cell holding buffer position `index` (input region layout).
    fn cell_at(&self, index: usize) -> CellPos {
        let width = self.bounds.width();
        CellPos::new(
            self.bounds.first_row + index / width,
            self.bounds.first_col + index % width,
        )
    }

    fn sync_edit_to_write(&mut self) {
        self.edit_cursor = self.write_cursor;
        self.edit_index = self.buffer.len();
    }

    /// Writes `ch` at the write cursor and advances it.
    ///
    /// Returns `false` when the input region refused the character because
    /// it is full. In the input region, typing with the edit cursor inside
    /// the text overwrites the character under it instead.
    pub fn put_char<M>(&mut self, canvas: &mut Canvas<'_, M>, ch: u8) -> Result<bool, SurfaceError>
    where
        M: AsRef<[u8]> + AsMut<[u8]>,
    {
        match self.kind {
            RegionKind::Output => {
                if self.overflowed() {
                    self.scroll(canvas)?;
                }
                canvas.put(self.write_cursor.row, self.write_cursor.col, ch)?;
                if self.buffer.len() < self.capacity {
                    self.buffer.push(ch);
                } else {
                    trace!(ch, "output line record full");
                }
                self.write_cursor = self.step_forward(self.write_cursor);
                self.sync_edit_to_write();
                Ok(true)
            }
            RegionKind::Input if self.edit_index < self.buffer.len() => {
                canvas.put(self.edit_cursor.row, self.edit_cursor.col, ch)?;
                self.buffer[self.edit_index] = ch;
                self.edit_index += 1;
                self.edit_cursor = self.cell_at(self.edit_index);
                Ok(true)
            }
            RegionKind::Input => {
                if self.is_full() || self.overflowed() {
                    trace!(ch, len = self.buffer.len(), "input full, character dropped");
                    return Ok(false);
                }
                canvas.put(self.write_cursor.row, self.write_cursor.col, ch)?;
                self.buffer.push(ch);
                self.write_cursor = self.cell_at(self.buffer.len());
                self.sync_edit_to_write();
                Ok(true)
            }
        }
    }

    /// Feeds inbound text: `\n` starts a new line, `\r` and NUL are
    /// ignored, every other byte is drawn.
    pub fn write_bytes<M>(&mut self, canvas: &mut Canvas<'_, M>, bytes: &[u8]) -> Result<(), SurfaceError>
    where
        M: AsRef<[u8]> + AsMut<[u8]>,
    {
        for &b in bytes {
            match b {
                b'\n' => {
                    self.newline(canvas)?;
                }
                b'\r' | 0 => {}
                _ => {
                    self.put_char(canvas, b)?;
                }
            }
        }
        Ok(())
    }

    /// Moves the write cursor to the start of the next row.
    ///
    /// The input region holds a single message and has no line breaks, so
    /// this is a no-op there (returns `false`).
    pub fn newline<M>(&mut self, canvas: &mut Canvas<'_, M>) -> Result<bool, SurfaceError>
    where
        M: AsRef<[u8]> + AsMut<[u8]>,
    {
        if self.kind == RegionKind::Input {
            return Ok(false);
        }
        if self.overflowed() {
            self.scroll(canvas)?;
        }
        self.write_cursor = CellPos::new(self.write_cursor.row + 1, self.bounds.first_col);
        self.buffer.clear();
        self.sync_edit_to_write();
        Ok(true)
    }

    /// Shifts the region's content up one row, blanks the last row and
    /// pulls the cursors up with it.
    pub fn scroll<M>(&mut self, canvas: &mut Canvas<'_, M>) -> Result<(), SurfaceError>
    where
        M: AsRef<[u8]> + AsMut<[u8]>,
    {
        scroll::scroll_up(canvas, &self.bounds)?;
        if self.write_cursor.row > self.bounds.first_row {
            self.write_cursor.row -= 1;
        }
        self.edit_cursor = self.write_cursor;
        Ok(())
    }

    /// Removes the last character.
    ///
    /// With the edit cursor on the home cell nothing is removed; the home
    /// cell is only blanked.
    pub fn backspace<M>(&mut self, canvas: &mut Canvas<'_, M>) -> Result<bool, SurfaceError>
    where
        M: AsRef<[u8]> + AsMut<[u8]>,
    {
        let home = self.home();
        if self.edit_cursor == home {
            canvas.blank(home.row, home.col)?;
            return Ok(false);
        }

        let target = self.step_back(self.write_cursor);
        canvas.blank(target.row, target.col)?;
        self.buffer.pop();
        self.write_cursor = target;
        self.sync_edit_to_write();
        Ok(true)
    }

    /// Arrow-key navigation of the edit cursor (input region only).
    ///
    /// The edit cursor never passes the write cursor. Returns whether it
    /// moved.
    pub fn move_cursor(&mut self, direction: Direction) -> bool {
        if self.kind != RegionKind::Input {
            return false;
        }
        let width = self.bounds.width();
        let len = self.buffer.len();
        let before = self.edit_index;

        self.edit_index = match direction {
            Direction::Left => before.saturating_sub(1),
            Direction::Right => (before + 1).min(len),
            Direction::Up if self.edit_cursor.row == self.bounds.first_row => 0,
            Direction::Up => before - width,
            Direction::Down if len - before >= width => before + width,
            Direction::Down => len,
        };
        self.edit_cursor = self.cell_at(self.edit_index);
        self.edit_index != before
    }

    /// Takes the pending message for transmission and resets the region.
    ///
    /// The message is the buffer plus a trailing `\n`; a full buffer loses
    /// its last character to the terminator.
    pub fn send<M>(&mut self, canvas: &mut Canvas<'_, M>) -> Result<Vec<u8>, SurfaceError>
    where
        M: AsRef<[u8]> + AsMut<[u8]>,
    {
        let mut message = std::mem::take(&mut self.buffer);
        if self.capacity > 0 {
            message.truncate(self.capacity - 1);
        }
        message.push(b'\n');
        self.clear(canvas)?;
        Ok(message)
    }

    /// Blanks every cell and returns both cursors to the home cell.
    pub fn clear<M>(&mut self, canvas: &mut Canvas<'_, M>) -> Result<(), SurfaceError>
    where
        M: AsRef<[u8]> + AsMut<[u8]>,
    {
        for row in self.bounds.first_row..=self.bounds.last_row {
            for col in self.bounds.first_col..self.bounds.end_col {
                canvas.blank(row, col)?;
            }
        }
        self.buffer.clear();
        self.write_cursor = self.home();
        self.sync_edit_to_write();
        self.blinking = false;
        Ok(())
    }

    /// Cell the cursor glyph is shown in, and the character that belongs
    /// there. A cursor resting past the last row is shown on the last cell.
    fn cursor_cell(&self) -> (CellPos, Option<u8>) {
        if self.edit_cursor.row > self.bounds.last_row {
            (self.bounds.last_cell(), self.buffer.last().copied())
        } else {
            (self.edit_cursor, self.buffer.get(self.edit_index).copied())
        }
    }

    fn paint_cursor_cell<M>(&self, canvas: &mut Canvas<'_, M>, show: bool) -> Result<(), SurfaceError>
    where
        M: AsRef<[u8]> + AsMut<[u8]>,
    {
        let (cell, under) = self.cursor_cell();
        match (show, under) {
            (true, _) => canvas.put(cell.row, cell.col, b'_'),
            (false, Some(ch)) => canvas.put(cell.row, cell.col, ch),
            (false, None) => canvas.blank(cell.row, cell.col),
        }
    }

    /// Toggles the cursor glyph at the edit cursor (input region only).
    pub fn blink<M>(&mut self, canvas: &mut Canvas<'_, M>) -> Result<(), SurfaceError>
    where
        M: AsRef<[u8]> + AsMut<[u8]>,
    {
        if self.kind != RegionKind::Input {
            return Ok(());
        }
        self.paint_cursor_cell(canvas, !self.blinking)?;
        self.blinking = !self.blinking;
        Ok(())
    }

    /// Restores the cell under a visible cursor glyph.
    pub fn hide_cursor<M>(&mut self, canvas: &mut Canvas<'_, M>) -> Result<(), SurfaceError>
    where
        M: AsRef<[u8]> + AsMut<[u8]>,
    {
        if self.blinking {
            self.paint_cursor_cell(canvas, false)?;
            self.blinking = false;
        }
        Ok(())
    }
}
