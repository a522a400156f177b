//! Display Capability Seam
//!
//! The scheduler never talks to a concrete display stack. It drives two
//! narrow capabilities: a [`Presenter`] that can open a surface, and the
//! resulting [`Canvas`] that measures, renders and presents frames. A
//! real backend (SDL window, framebuffer, LED panel) plugs in behind
//! these traits; the crate ships a headless implementation so the daemon
//! runs and the state machine is testable without any display at all.

use async_trait::async_trait;
use thiserror::Error;

use crate::scheduler::timeline;
use crate::wire::{BlinkMode, ColorSpec, NotificationRequest};

/// Result type for display operations
pub type DisplayResult<T> = Result<T, DisplayError>;

/// Errors from the presentation capabilities
#[derive(Debug, Error)]
pub enum DisplayError {
    /// The surface could not be created; the notification is dropped, not retried
    #[error("failed to acquire display surface: {0}")]
    Acquisition(String),

    /// The surface went away mid-animation (external teardown)
    #[error("display surface no longer available")]
    SurfaceLost,

    /// Rendering one frame failed
    #[error("render failed: {0}")]
    Render(String),
}

/// Presentation style for one message, carried from the wire record
#[derive(Debug, Clone)]
pub struct Style {
    pub color: ColorSpec,
    pub bg_color: ColorSpec,
    pub blink_mode: BlinkMode,
    /// Whether the text contains pictographic glyphs or ASCII emoticons;
    /// backends use this to pick glyph fallbacks
    pub has_pictographs: bool,
}

impl Style {
    pub fn for_request(request: &NotificationRequest) -> Self {
        Self {
            color: request.color.clone(),
            bg_color: request.bg_color.clone(),
            blink_mode: request.blink_mode,
            has_pictographs: timeline::contains_pictographs(&request.text),
        }
    }
}

/// One composited frame: the glyph run with blink-hidden glyphs blanked,
/// plus its rendered width in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub glyphs: String,
    pub width: u32,
}

/// Opens display surfaces on demand
#[async_trait]
pub trait Presenter: Send + Sync {
    /// Open (or resize) the presentation target and hand back a canvas.
    async fn acquire(&self) -> DisplayResult<Box<dyn Canvas>>;
}

/// An open display surface
pub trait Canvas: Send {
    /// Surface width in pixels; the scroll starts at this offset
    fn width(&self) -> u32;

    /// Rendered width of `text` in pixels
    fn measure(&self, text: &str, style: &Style) -> u32;

    /// Compose one frame for the current blink phase
    fn render(&mut self, text: &str, style: &Style, blink_visible: bool) -> DisplayResult<Frame>;

    /// Show a frame at a horizontal offset
    fn present(&mut self, frame: &Frame, offset: i32) -> DisplayResult<()>;

    /// False once the surface has been torn down externally
    fn is_available(&self) -> bool;

    /// Release the surface; idempotent
    fn release(&mut self);
}

/// Headless presenter used when no display backend is wired in. Frames
/// are composed for real (so blink masking and widths are exercised) and
/// presentation is a trace log.
#[derive(Debug, Clone)]
pub struct HeadlessPresenter {
    surface_width: u32,
    glyph_width: u32,
}

impl HeadlessPresenter {
    pub fn new(surface_width: u32) -> Self {
        Self {
            surface_width,
            glyph_width: 35,
        }
    }
}

#[async_trait]
impl Presenter for HeadlessPresenter {
    async fn acquire(&self) -> DisplayResult<Box<dyn Canvas>> {
        Ok(Box::new(HeadlessCanvas {
            surface_width: self.surface_width,
            glyph_width: self.glyph_width,
            released: false,
        }))
    }
}

struct HeadlessCanvas {
    surface_width: u32,
    glyph_width: u32,
    released: bool,
}

impl Canvas for HeadlessCanvas {
    fn width(&self) -> u32 {
        self.surface_width
    }

    fn measure(&self, text: &str, _style: &Style) -> u32 {
        timeline::glyph_clusters(text).len() as u32 * self.glyph_width
    }

    fn render(&mut self, text: &str, style: &Style, blink_visible: bool) -> DisplayResult<Frame> {
        let glyphs = timeline::masked_glyphs(text, style.blink_mode, blink_visible);
        let width = self.measure(text, style);
        Ok(Frame { glyphs, width })
    }

    fn present(&mut self, frame: &Frame, offset: i32) -> DisplayResult<()> {
        if self.released {
            return Err(DisplayError::SurfaceLost);
        }
        log::trace!("frame at x={}: {:?}", offset, frame.glyphs);
        Ok(())
    }

    fn is_available(&self) -> bool {
        !self.released
    }

    fn release(&mut self) {
        self.released = true;
    }
}
