use crate::TermEvent;
use crate::glyph::{Canvas, Font};
use crate::keyboard::{HidReport, KeyDecoder, KeyEvent, TogglePolicy};
use crate::layout::{BORDER_GLYPH, Layout, LayoutError, SEPARATOR_GLYPH};
use crate::region::TextRegion;
use crate::surface::{PixelSurface, SurfaceError};
use tracing::{debug, warn};

/// Default input capacity in bytes, terminator included.
pub const DEFAULT_MESSAGE_SIZE: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalOptions {
    pub message_size: usize,
    pub toggle_policy: TogglePolicy,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        Self {
            message_size: DEFAULT_MESSAGE_SIZE,
            toggle_policy: TogglePolicy::Edge,
        }
    }
}

/// What the session has to do after an event was applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reaction {
    /// A finished message to transmit, `\n` terminated.
    pub outbound: Option<Vec<u8>>,
    pub quit: bool,
}

/// All mutable terminal state: the surface, both regions and the decoder.
///
/// One owner applies every event, so keyboard edits, blink redraws and
/// inbound text never interleave inside an operation.
pub struct Terminal<M> {
    surface: PixelSurface<M>,
    font: Font,
    layout: Layout,
    output: TextRegion,
    input: TextRegion,
    decoder: KeyDecoder,
}

impl<M> std::fmt::Debug for Terminal<M>
where
    M: AsRef<[u8]>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal")
            .field("surface", &self.surface)
            .field("layout", &self.layout)
            .field("output", &self.output.write_cursor())
            .field("input", &self.input.write_cursor())
            .finish()
    }
}

impl<M> Terminal<M>
where
    M: AsRef<[u8]> + AsMut<[u8]>,
{
    pub fn new(
        surface: PixelSurface<M>,
        font: Font,
        layout: Layout,
        options: TerminalOptions,
    ) -> Result<Self, LayoutError> {
        Layout::fit(surface.geometry(), layout.rows(), layout.cols())?;
        Ok(Self {
            output: TextRegion::output(layout.output_bounds()),
            input: TextRegion::input(layout.input_bounds(), options.message_size),
            decoder: KeyDecoder::new(options.toggle_policy),
            surface,
            font,
            layout,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn output(&self) -> &TextRegion {
        &self.output
    }

    pub fn input(&self) -> &TextRegion {
        &self.input
    }

    pub fn decoder(&self) -> &KeyDecoder {
        &self.decoder
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    pub fn surface(&self) -> &PixelSurface<M> {
        &self.surface
    }

    pub fn into_surface(self) -> PixelSurface<M> {
        self.surface
    }

    /// Fills grid row `row` with `ch`.
    pub fn draw_line(&mut self, ch: u8, row: usize) -> Result<(), SurfaceError> {
        let mut canvas = Canvas::new(&mut self.surface, &self.font);
        for col in 0..self.layout.cols() {
            canvas.put(row, col, ch)?;
        }
        Ok(())
    }

    /// Draws `text` from (`row`, `col`), clipped at the right edge of the
    /// grid. No wrapping.
    pub fn draw_text(&mut self, text: &[u8], row: usize, col: usize) -> Result<(), SurfaceError> {
        let mut canvas = Canvas::new(&mut self.surface, &self.font);
        for (at, &ch) in (col..self.layout.cols()).zip(text) {
            canvas.put(row, at, ch)?;
        }
        Ok(())
    }

    /// Blanks the grid, then draws the borders and the separator.
    pub fn draw_chrome(&mut self) -> Result<(), SurfaceError> {
        for row in 0..self.layout.rows() {
            self.draw_line(b' ', row)?;
        }
        for row in self.layout.border_rows() {
            self.draw_line(BORDER_GLYPH, row)?;
        }
        self.draw_line(SEPARATOR_GLYPH, self.layout.separator_row())
    }

    pub fn handle(&mut self, event: TermEvent) -> Result<Reaction, SurfaceError> {
        match event {
            TermEvent::Report(bytes) => self.handle_report(&bytes),
            TermEvent::Inbound(bytes) => {
                self.receive(&bytes)?;
                Ok(Reaction::default())
            }
            TermEvent::BlinkTick => {
                self.blink()?;
                Ok(Reaction::default())
            }
            TermEvent::KeyboardLost(reason) => {
                warn!(%reason, "keyboard lost");
                Ok(Reaction {
                    outbound: None,
                    quit: true,
                })
            }
            TermEvent::NetworkClosed => {
                warn!("chat server closed the connection");
                Ok(Reaction::default())
            }
        }
    }

    /// Decodes one raw keyboard transfer and applies its events in order.
    /// Partial transfers are dropped.
    pub fn handle_report(&mut self, bytes: &[u8]) -> Result<Reaction, SurfaceError> {
        let report = match HidReport::parse(bytes) {
            Ok(report) => report,
            Err(e) => {
                debug!(error = %e, "keyboard report discarded");
                return Ok(Reaction::default());
            }
        };
        debug!(
            modifiers = report.modifiers.bits(),
            key0 = report.keycodes[0],
            key1 = report.keycodes[1],
            "keyboard report"
        );

        let mut reaction = Reaction::default();
        for key in self.decoder.decode(&report) {
            let step = self.apply_key(key)?;
            if step.outbound.is_some() {
                reaction.outbound = step.outbound;
            }
            if step.quit {
                reaction.quit = true;
                break;
            }
        }
        Ok(reaction)
    }

    /// Applies one decoded key to the input region. Enter sends, escape
    /// asks the session to stop.
    pub fn apply_key(&mut self, key: KeyEvent) -> Result<Reaction, SurfaceError> {
        if key == KeyEvent::Escape {
            return Ok(Reaction {
                outbound: None,
                quit: true,
            });
        }

        let mut canvas = Canvas::new(&mut self.surface, &self.font);
        self.input.hide_cursor(&mut canvas)?;
        match key {
            KeyEvent::Char(b'\n') => {
                let message = self.input.send(&mut canvas)?;
                debug!(len = message.len(), "message ready");
                return Ok(Reaction {
                    outbound: Some(message),
                    quit: false,
                });
            }
            KeyEvent::Char(ch) => {
                self.input.put_char(&mut canvas, ch)?;
            }
            KeyEvent::Backspace => {
                self.input.backspace(&mut canvas)?;
            }
            KeyEvent::Arrow(direction) => {
                self.input.move_cursor(direction);
            }
            KeyEvent::Escape => {}
        }
        Ok(Reaction::default())
    }

    /// Appends inbound text to the output log.
    pub fn receive(&mut self, bytes: &[u8]) -> Result<(), SurfaceError> {
        let mut canvas = Canvas::new(&mut self.surface, &self.font);
        self.output.write_bytes(&mut canvas, bytes)
    }

    pub fn blink(&mut self) -> Result<(), SurfaceError> {
        let mut canvas = Canvas::new(&mut self.surface, &self.font);
        self.input.blink(&mut canvas)
    }

    /// Clears the output log.
    pub fn clear_output(&mut self) -> Result<(), SurfaceError> {
        let mut canvas = Canvas::new(&mut self.surface, &self.font);
        self.output.clear(&mut canvas)
    }
}
