//! Track progress display

use polyemu_common::{PixelFormat, Rect, Surface};

pub const SCREEN_WIDTH: u32 = 384;
pub const SCREEN_HEIGHT: u32 = 288;

const MARGIN: u32 = 16;
const TRACK_ROW_Y: u32 = 64;
const TRACK_ROW_HEIGHT: u32 = 24;
const TRACK_GAP: u32 = 2;
const PROGRESS_Y: u32 = 160;
const PROGRESS_HEIGHT: u32 = 16;
const DISC_ROW_Y: u32 = 240;
const DISC_SIZE: u32 = 12;

#[derive(Debug, Clone, Copy)]
pub struct ProgressView {
    pub track_count: usize,
    /// Index of the playing track and the fraction of it played, or `None` when stopped
    pub position: Option<(usize, f64)>,
    pub disc_idx: usize,
    pub disc_count: usize,
}

struct Palette {
    background: u32,
    outline: u32,
    played: u32,
    current: u32,
    upcoming: u32,
}

impl Palette {
    fn new(format: PixelFormat) -> Self {
        Self {
            background: format.pack(0x10, 0x10, 0x20),
            outline: format.pack(0xC0, 0xC0, 0xC0),
            played: format.pack(0x30, 0x80, 0x30),
            current: format.pack(0x60, 0xF0, 0x60),
            upcoming: format.pack(0x50, 0x50, 0x60),
        }
    }
}

/// Draw the player screen and return the rectangle that was written.
pub fn render(surface: &mut Surface, view: ProgressView) -> Rect {
    let rect = Rect::new(
        0,
        0,
        SCREEN_WIDTH.min(surface.width()),
        SCREEN_HEIGHT.min(surface.height()),
    );
    let palette = Palette::new(surface.format());

    surface.fill(rect, palette.background);

    let current_track = view.position.map_or(view.track_count, |(idx, _)| idx);

    // One block per audio track
    if view.track_count != 0 {
        let row_width = SCREEN_WIDTH - 2 * MARGIN;
        let block_width = (row_width / view.track_count as u32).max(TRACK_GAP + 1);
        for idx in 0..view.track_count {
            let color = match idx.cmp(&current_track) {
                std::cmp::Ordering::Less => palette.played,
                std::cmp::Ordering::Equal => palette.current,
                std::cmp::Ordering::Greater => palette.upcoming,
            };
            let x = MARGIN + idx as u32 * block_width;
            surface.fill(Rect::new(x, TRACK_ROW_Y, block_width - TRACK_GAP, TRACK_ROW_HEIGHT), color);
        }
    }

    // Progress through the current track
    let bar_width = SCREEN_WIDTH - 2 * MARGIN;
    surface.fill(Rect::new(MARGIN, PROGRESS_Y, bar_width, PROGRESS_HEIGHT), palette.outline);
    surface.fill(
        Rect::new(MARGIN + 1, PROGRESS_Y + 1, bar_width - 2, PROGRESS_HEIGHT - 2),
        palette.background,
    );
    if let Some((_, fraction)) = view.position {
        let filled = ((f64::from(bar_width - 2)) * fraction.clamp(0.0, 1.0)).round() as u32;
        surface.fill(
            Rect::new(MARGIN + 1, PROGRESS_Y + 1, filled, PROGRESS_HEIGHT - 2),
            palette.current,
        );
    }

    for idx in 0..view.disc_count {
        let color = if idx == view.disc_idx { palette.current } else { palette.upcoming };
        let x = MARGIN + idx as u32 * (DISC_SIZE + 4);
        surface.fill(Rect::new(x, DISC_ROW_Y, DISC_SIZE, DISC_SIZE), color);
    }

    rect
}
