use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::models::SplitLines;

/// Distance of the default split lines from the page edges
pub const DEFAULT_MARGIN: i64 = 250;

/// Left split line colour
pub const LEFT_LINE_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
/// Right split line colour
pub const RIGHT_LINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

pub const LINE_THICKNESS: u32 = 2;

fn clamp_offset(value: i64, width: u32) -> u32 {
    value.clamp(0, width as i64) as u32
}

impl SplitLines {
    /// Clamp a requested pair into `[0, width]`. Never fails and does not
    /// reorder crossed lines.
    pub fn clamped(left: i64, right: i64, width: u32) -> Self {
        Self {
            left: clamp_offset(left, width),
            right: clamp_offset(right, width),
        }
    }

    /// Defaults for a page `width` pixels wide
    pub fn for_width(width: u32) -> Self {
        Self::clamped(DEFAULT_MARGIN, width as i64 - DEFAULT_MARGIN, width)
    }

    /// Re-clamp already chosen lines against another page width
    pub fn fit_to(self, width: u32) -> Self {
        Self::clamped(self.left as i64, self.right as i64, width)
    }

    pub fn is_crossed(&self) -> bool {
        self.left > self.right
    }
}

fn vertical_band(x: u32, height: u32) -> Option<Rect> {
    if height == 0 {
        return None;
    }
    // Centre the band on x; a line at the right edge still shows one column.
    let start = x as i32 - (LINE_THICKNESS as i32 / 2);
    Some(Rect::at(start, 0).of_size(LINE_THICKNESS, height))
}

/// Overlay the two split lines on a copy of `image`
pub fn draw_lines(image: &RgbImage, lines: SplitLines) -> RgbImage {
    let height = image.height();
    let mut out = image.clone();
    if let Some(rect) = vertical_band(lines.left, height) {
        draw_filled_rect_mut(&mut out, rect, LEFT_LINE_COLOR);
    }
    if let Some(rect) = vertical_band(lines.right, height) {
        draw_filled_rect_mut(&mut out, rect, RIGHT_LINE_COLOR);
    }
    out
}
