//! Per-step video/audio exchange between the host and the active game

use std::fmt::{Display, Formatter};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    #[default]
    Xrgb8888,
    Xbgr8888,
    Rgb565,
}

impl PixelFormat {
    /// Pack an RGB color into this format's 32-bit pixel representation.
    #[must_use]
    pub fn pack(self, r: u8, g: u8, b: u8) -> u32 {
        let (r, g, b) = (u32::from(r), u32::from(g), u32::from(b));
        match self {
            Self::Xrgb8888 => (r << 16) | (g << 8) | b,
            Self::Xbgr8888 => (b << 16) | (g << 8) | r,
            Self::Rgb565 => ((r >> 3) << 11) | ((g >> 2) << 5) | (b >> 3),
        }
    }
}

impl Display for PixelFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Xrgb8888 => write!(f, "XRGB8888"),
            Self::Xbgr8888 => write!(f, "XBGR8888"),
            Self::Rgb565 => write!(f, "RGB565"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const EMPTY: Self = Self { x: 0, y: 0, w: 0, h: 0 };

    #[must_use]
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

/// Video output target. Pixels are stored one per `u32` regardless of format.
#[derive(Debug, Clone)]
pub struct Surface {
    pixels: Vec<u32>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl Surface {
    #[must_use]
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self { pixels: vec![0; width as usize * height as usize], width, height, format }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn set_format(&mut self, format: PixelFormat) {
        self.format = format;
    }

    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// # Panics
    ///
    /// Panics if `y` is outside of the surface.
    #[must_use]
    pub fn row(&self, y: u32) -> &[u32] {
        let start = y as usize * self.width as usize;
        &self.pixels[start..start + self.width as usize]
    }

    /// # Panics
    ///
    /// Panics if `y` is outside of the surface.
    pub fn row_mut(&mut self, y: u32) -> &mut [u32] {
        let start = y as usize * self.width as usize;
        &mut self.pixels[start..start + self.width as usize]
    }

    pub fn fill(&mut self, rect: Rect, color: u32) {
        let x_end = (rect.x + rect.w).min(self.width) as usize;
        for y in rect.y..(rect.y + rect.h).min(self.height) {
            let row = self.row_mut(y);
            if let Some(span) = row.get_mut(rect.x as usize..x_end) {
                span.fill(color);
            }
        }
    }
}

/// Interleaved signed 16-bit samples with a fixed frame capacity.
#[derive(Debug, Clone)]
pub struct SoundBuffer {
    samples: Vec<i16>,
    channels: usize,
    capacity_frames: usize,
}

impl SoundBuffer {
    /// # Panics
    ///
    /// Panics if `channels` is 0.
    #[must_use]
    pub fn new(channels: u8, capacity_frames: usize) -> Self {
        assert_ne!(channels, 0, "sound buffer must have at least one channel");

        let channels = usize::from(channels);
        Self { samples: Vec::with_capacity(channels * capacity_frames), channels, capacity_frames }
    }

    #[must_use]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[must_use]
    pub fn capacity_frames(&self) -> usize {
        self.capacity_frames
    }

    #[must_use]
    pub fn len_frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    #[must_use]
    pub fn remaining_frames(&self) -> usize {
        self.capacity_frames - self.len_frames()
    }

    /// Append one frame (one sample per channel). Returns `false` and drops the frame if the
    /// buffer is already full.
    pub fn push_frame(&mut self, frame: &[i16]) -> bool {
        debug_assert_eq!(frame.len(), self.channels);

        if self.len_frames() >= self.capacity_frames {
            return false;
        }

        self.samples.extend_from_slice(&frame[..self.channels]);
        true
    }

    #[must_use]
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Samples for the given range of frames.
    #[must_use]
    pub fn frames(&self, frames: Range<usize>) -> &[i16] {
        &self.samples[frames.start * self.channels..frames.end * self.channels]
    }

    pub fn frames_mut(&mut self, frames: Range<usize>) -> &mut [i16] {
        &mut self.samples[frames.start * self.channels..frames.end * self.channels]
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldParity {
    Even,
    Odd,
}

impl FieldParity {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Even => Self::Odd,
            Self::Odd => Self::Even,
        }
    }
}

/// Everything exchanged between the host and the active game for one emulation step.
///
/// The host owns one context for the lifetime of a session and reuses it across steps.
#[derive(Debug, Clone)]
pub struct FrameContext {
    pub surface: Surface,
    /// Area of `surface` written by the last step
    pub display_rect: Rect,
    /// Per-line widths within `display_rect`; empty means every line is `display_rect.w` wide
    pub line_widths: Vec<u32>,
    pub video_format_changed: bool,
    pub sound_format_changed: bool,
    /// Requested output sample rate in Hz, or 0 for no sound
    pub sound_rate: f64,
    pub sound: SoundBuffer,
    /// Set by the game when the step produced a single interlaced field
    pub interlace: Option<FieldParity>,
    /// Set by the caller when video output for this step will not be presented
    pub skip: bool,
    pub rewind_requested: bool,
    /// Master clock cycles elapsed during the step, maintained by the game
    pub master_cycles: u64,
    /// Sound frames already delivered by a mid-step sync
    pub sound_frames_synced: usize,
    /// Master cycles already accounted for by a mid-step sync
    pub master_cycles_synced: u64,
}

impl FrameContext {
    #[must_use]
    pub fn new(surface: Surface, sound: SoundBuffer, sound_rate: f64) -> Self {
        Self {
            surface,
            display_rect: Rect::EMPTY,
            line_widths: Vec::new(),
            video_format_changed: false,
            sound_format_changed: false,
            sound_rate,
            sound,
            interlace: None,
            skip: false,
            rewind_requested: false,
            master_cycles: 0,
            sound_frames_synced: 0,
            master_cycles_synced: 0,
        }
    }
}

/// Hook that a game calls in the middle of a step to flush the output produced so far.
pub trait MidSync {
    fn mid_sync(&mut self, ctx: &mut FrameContext);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sound_buffer_capacity() {
        let mut buffer = SoundBuffer::new(2, 3);
        assert!(buffer.push_frame(&[1, -1]));
        assert!(buffer.push_frame(&[2, -2]));
        assert!(buffer.push_frame(&[3, -3]));
        assert!(!buffer.push_frame(&[4, -4]));

        assert_eq!(buffer.len_frames(), 3);
        assert_eq!(buffer.remaining_frames(), 0);
        assert_eq!(buffer.frames(1..3), &[2, -2, 3, -3]);

        buffer.clear();
        assert_eq!(buffer.len_frames(), 0);
    }

    #[test]
    fn surface_fill_clips() {
        let mut surface = Surface::new(4, 2, PixelFormat::Xrgb8888);
        surface.fill(Rect::new(2, 1, 10, 10), 7);

        assert_eq!(surface.row(0), &[0, 0, 0, 0]);
        assert_eq!(surface.row(1), &[0, 0, 7, 7]);
    }

    #[test]
    fn pack_colors() {
        assert_eq!(PixelFormat::Xrgb8888.pack(0x12, 0x34, 0x56), 0x12_3456);
        assert_eq!(PixelFormat::Xbgr8888.pack(0x12, 0x34, 0x56), 0x56_3412);
        assert_eq!(PixelFormat::Rgb565.pack(0xFF, 0xFF, 0xFF), 0xFFFF);
    }
}
