//! Scroll and Blink Timeline
//!
//! Pure timeline math for the marquee animation, independent of how a
//! frame is drawn. The scroll starts at the surface's right edge and
//! advances left a fixed pixel step per frame; the blink phase flips on a
//! fixed frame cadence. Which glyphs a blink phase hides depends on the
//! message's blink mode and on a symbolic/pictographic classification of
//! each glyph.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::wire::BlinkMode;

/// Horizontal advance per frame, in pixels
pub const SCROLL_STEP_PX: i32 = 5;

/// Frames between blink phase flips
pub const BLINK_TOGGLE_FRAMES: u32 = 30;

/// Variation selector that turns the preceding char into an emoji glyph
const VARIATION_SELECTOR: char = '\u{FE0F}';

/// One frame of the animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStep {
    /// Horizontal offset to present at
    pub offset: i32,
    /// Whether blinking glyphs are in their visible phase
    pub blink_visible: bool,
}

/// Drives the scroll offset and blink phase frame by frame. The loop
/// terminates once the whole rendered text width has moved past the left
/// edge.
#[derive(Debug)]
pub struct ScrollTimeline {
    offset: i32,
    text_width: i32,
    frame_delay: Duration,
    blink_visible: bool,
    blink_counter: u32,
}

impl ScrollTimeline {
    pub fn new(surface_width: u32, text_width: u32, speed_secs: f64) -> Self {
        Self {
            offset: surface_width as i32,
            text_width: text_width as i32,
            frame_delay: Duration::from_secs_f64(speed_secs),
            blink_visible: true,
            blink_counter: 0,
        }
    }

    /// Sleep between frames; `speed` seconds per step
    pub fn frame_delay(&self) -> Duration {
        self.frame_delay
    }

    pub fn is_complete(&self) -> bool {
        self.offset <= -self.text_width
    }

    /// Produce the next frame and advance, or `None` once the text has
    /// fully scrolled off.
    pub fn next_frame(&mut self) -> Option<FrameStep> {
        if self.is_complete() {
            return None;
        }

        self.blink_counter += 1;
        if self.blink_counter >= BLINK_TOGGLE_FRAMES {
            self.blink_visible = !self.blink_visible;
            self.blink_counter = 0;
        }

        let step = FrameStep {
            offset: self.offset,
            blink_visible: self.blink_visible,
        };
        self.offset -= SCROLL_STEP_PX;
        Some(step)
    }
}

/// Split text into glyph clusters: a base character followed by U+FE0F
/// counts as one glyph, matching how the wire text is displayed.
pub fn glyph_clusters(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut clusters = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        if i + 1 < chars.len() && chars[i + 1] == VARIATION_SELECTOR {
            clusters.push(chars[i..i + 2].iter().collect());
            i += 2;
        } else {
            clusters.push(chars[i].to_string());
            i += 1;
        }
    }
    clusters
}

/// Whether a glyph cluster is symbolic/pictographic (emoji, dingbats,
/// arrows, technical symbols) rather than plain text.
pub fn is_pictographic(cluster: &str) -> bool {
    cluster.chars().any(|c| {
        matches!(c,
            '\u{1F300}'..='\u{1F5FF}'   // symbols & pictographs
            | '\u{1F600}'..='\u{1F64F}' // emoticons
            | '\u{1F680}'..='\u{1F6FF}' // transport & map symbols
            | '\u{1F700}'..='\u{1F77F}' // alchemical symbols
            | '\u{1F780}'..='\u{1F8FF}' // geometric shapes ext, arrows-C
            | '\u{1F900}'..='\u{1F9FF}' // supplemental symbols
            | '\u{1FA00}'..='\u{1FAFF}' // chess, extended-A
            | '\u{1F1E6}'..='\u{1F1FF}' // regional indicators (flags)
            | '\u{2300}'..='\u{23FF}'   // miscellaneous technical
            | '\u{24C2}'..='\u{24FF}'   // enclosed alphanumerics
            | '\u{2600}'..='\u{26FF}'   // miscellaneous symbols
            | '\u{2700}'..='\u{27BF}'   // dingbats
            | '\u{2B50}'..='\u{2B55}'   // stars
            | '\u{2194}'..='\u{2199}'   // arrows
            | '\u{FE00}'..='\u{FE0F}'   // variation selectors
            | '\u{203C}'                // double exclamation
            | '\u{2049}'                // exclamation question
            | '\u{20E3}'                // combining keycap
            | '\u{2122}'                // trade mark
            | '\u{2139}'                // information
        )
    })
}

fn emoticon_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(:-?\)|:-?\(|:-?D|:-?P|;-?\)|:-?\||>:-?\(|\^_\^|:3|<3|:o|:O|:v|:V|=\))")
            .expect("emoticon pattern is valid")
    })
}

/// Whether the text carries pictographic glyphs or ASCII emoticons.
pub fn contains_pictographs(text: &str) -> bool {
    glyph_clusters(text).iter().any(|c| is_pictographic(c)) || emoticon_pattern().is_match(text)
}

/// Whether one glyph is visible in the given blink phase.
///
/// Mode `None` never blinks; `All` blinks the whole run; `Text` blinks
/// only non-symbolic glyphs, leaving pictographs lit; `Symbols` is the
/// inverse.
pub fn glyph_visible(mode: BlinkMode, blink_visible: bool, pictographic: bool) -> bool {
    match mode {
        BlinkMode::None => true,
        BlinkMode::All => blink_visible,
        BlinkMode::Text => pictographic || blink_visible,
        BlinkMode::Symbols => !pictographic || blink_visible,
    }
}

/// Compose the glyph run for one frame, blanking hidden glyphs with a
/// width-preserving space.
pub fn masked_glyphs(text: &str, mode: BlinkMode, blink_visible: bool) -> String {
    glyph_clusters(text)
        .iter()
        .map(|cluster| {
            if glyph_visible(mode, blink_visible, is_pictographic(cluster)) {
                cluster.clone()
            } else {
                " ".to_string()
            }
        })
        .collect()
}
