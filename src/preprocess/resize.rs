//! Area-averaging resize.
//!
//! `image::imageops` has no area filter, so this one computes each target
//! pixel as the coverage-weighted mean of the source pixels under it. When
//! enlarging, a target pixel sits inside a single source pixel most of the
//! time and only blends at source pixel borders.

use image::{ImageBuffer, Pixel};

/// Source pixels overlapping each target pixel along one axis
fn axis_weights(src_len: u32, dst_len: u32) -> Vec<Vec<(u32, f32)>> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|d| {
            let start = d as f64 * scale;
            let end = ((d + 1) as f64 * scale).min(src_len as f64);
            let mut weights = Vec::new();
            let mut s = start.floor() as u32;
            while (s as f64) < end && s < src_len {
                let overlap = (end.min((s + 1) as f64) - start.max(s as f64)) as f32;
                if overlap > 0.0 {
                    weights.push((s, overlap));
                }
                s += 1;
            }
            let total: f32 = weights.iter().map(|(_, w)| w).sum();
            for (_, w) in &mut weights {
                *w /= total;
            }
            weights
        })
        .collect()
}

/// Resize to exactly `width` x `height` using area interpolation.
///
/// Both target dimensions must be non-zero.
pub fn resize_area<P>(
    image: &ImageBuffer<P, Vec<u8>>,
    width: u32,
    height: u32,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let (src_w, src_h) = image.dimensions();
    if (src_w, src_h) == (width, height) {
        return image.clone();
    }
    if src_w == 0 || src_h == 0 {
        return ImageBuffer::new(width, height);
    }

    let xs = axis_weights(src_w, width);
    let ys = axis_weights(src_h, height);
    let channels = P::CHANNEL_COUNT as usize;
    let mut out = ImageBuffer::<P, Vec<u8>>::new(width, height);
    let mut acc = vec![0f32; channels];

    for (dy, y_weights) in ys.iter().enumerate() {
        for (dx, x_weights) in xs.iter().enumerate() {
            acc.iter_mut().for_each(|a| *a = 0.0);
            for &(sy, wy) in y_weights {
                for &(sx, wx) in x_weights {
                    let w = wx * wy;
                    let src = image.get_pixel(sx, sy).channels();
                    for (a, &v) in acc.iter_mut().zip(src) {
                        *a += v as f32 * w;
                    }
                }
            }
            let target = out.get_pixel_mut(dx as u32, dy as u32);
            for (c, a) in target.channels_mut().iter_mut().zip(&acc) {
                *c = a.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    out
}

/// Target size for a uniform scale, rounded and never below one pixel
pub fn scaled_dimensions(width: u32, height: u32, factor: f64) -> (u32, u32) {
    let scale = |v: u32| ((v as f64 * factor).round() as u32).max(1);
    (scale(width), scale(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn test_halving_averages_blocks() {
        let img = GrayImage::from_fn(4, 2, |x, _| if x < 2 { Luma([0]) } else { Luma([200]) });
        let half = resize_area(&img, 2, 1);
        assert_eq!(half.get_pixel(0, 0)[0], 0);
        assert_eq!(half.get_pixel(1, 0)[0], 200);

        let checker = GrayImage::from_fn(2, 2, |x, y| Luma([if (x + y) % 2 == 0 { 0 } else { 100 }]));
        assert_eq!(resize_area(&checker, 1, 1).get_pixel(0, 0)[0], 50);
    }

    #[test]
    fn test_doubling_repeats_pixels() {
        let img = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 0 } else { 255 }]));
        let double = resize_area(&img, 4, 2);
        let row: Vec<u8> = (0..4).map(|x| double.get_pixel(x, 1)[0]).collect();
        assert_eq!(row, vec![0, 0, 255, 255]);
    }

    #[test]
    fn test_colour_channels_kept_apart() {
        let img = RgbImage::from_pixel(3, 3, Rgb([10, 120, 250]));
        let small = resize_area(&img, 2, 2);
        assert!(small.pixels().all(|p| *p == Rgb([10, 120, 250])));
    }

    #[test]
    fn test_scaled_dimensions() {
        assert_eq!(scaled_dimensions(100, 41, 1.5), (150, 62));
        assert_eq!(scaled_dimensions(3, 3, 0.1), (1, 1));
    }
}
