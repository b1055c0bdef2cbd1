use image::RgbImage;

use crate::error::{Error, Result};
use crate::geometry::draw_lines;
use crate::models::{PageImage, SplitLines};
use crate::ordering;
use crate::preprocess::downscale;

/// Preview size relative to the original page
pub const DEFAULT_PREVIEW_PERCENT: u32 = 50;

/// Operator preview of one page: the split lines drawn on a copy, shrunk to
/// `percent` of its size.
///
/// `page_index` counts pages in natural order, starting at 0.
pub fn render_preview(
    pages: &[PageImage],
    page_index: usize,
    lines: SplitLines,
    percent: u32,
) -> Result<RgbImage> {
    let ordered = ordering::order(pages.to_vec());
    let page = ordered.get(page_index).ok_or(Error::PageIndexOutOfRange {
        index: page_index,
        len: ordered.len(),
    })?;
    let marked = draw_lines(page.image(), lines.fit_to(page.width()));
    downscale(&marked, percent)
}

/// Caption shown under a preview, numbering pages from 1
pub fn preview_caption(page_index: usize) -> String {
    format!("Preview with Split Lines - Page {}", page_index + 1)
}
