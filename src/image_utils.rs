use image::{imageops::invert, GenericImageView, GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::{contrast::threshold, filter::separable_filter_equal};

use crate::geometry::PixelRect;
use crate::types::Size;

pub const WHITE: Luma<u8> = Luma([u8::MAX]);
pub const BLACK: Luma<u8> = Luma([u8::MIN]);

/// Value of ink pixels in a binarized sheet.
pub const FOREGROUND: Luma<u8> = WHITE;
pub const BACKGROUND: Luma<u8> = BLACK;

pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);

/// Binomial 5-tap kernel; its outer product is the 5x5 gaussian used to
/// smooth scans before thresholding.
pub const GAUSSIAN_KERNEL_5: [f32; 5] = [
    1.0 / 16.0,
    4.0 / 16.0,
    6.0 / 16.0,
    4.0 / 16.0,
    1.0 / 16.0,
];

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PreprocessOptions {
    /// Blurred pixels at or below this value become foreground.
    pub threshold: u8,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self { threshold: 40 }
    }
}

/// Converts to gray with the BT.601 weights in 14-bit fixed point, rounding
/// to nearest.
pub fn rgb_to_luma(img: &RgbImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b] = img.get_pixel(x, y).0;
        let weighted = 4899 * r as u32 + 9617 * g as u32 + 1868 * b as u32;
        Luma([((weighted + (1 << 13)) >> 14) as u8])
    })
}

/// Maps an out-of-range index back into `0..len` by mirroring around the
/// edge pixels without repeating them (`-1` → `1`, `len` → `len - 2`).
fn reflect_101(index: i64, len: u32) -> u32 {
    let len = len as i64;
    if len == 1 {
        return 0;
    }
    let mut index = index;
    while index < 0 || index >= len {
        index = if index < 0 { -index } else { 2 * len - 2 - index };
    }
    index as u32
}

/// Smooths with the 5x5 binomial gaussian, mirroring the border and rounding
/// the result to the nearest gray level. A flat image is left unchanged.
pub fn gaussian_blur_5x5(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    let pad = (GAUSSIAN_KERNEL_5.len() / 2) as u32;
    let padded: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(width + 2 * pad, height + 2 * pad, |x, y| {
            let source_x = reflect_101(x as i64 - pad as i64, width);
            let source_y = reflect_101(y as i64 - pad as i64, height);
            Luma([img.get_pixel(source_x, source_y).0[0] as f32])
        });
    let blurred = separable_filter_equal(&padded, &GAUSSIAN_KERNEL_5);

    GrayImage::from_fn(width, height, |x, y| {
        let value = blurred.get_pixel(x + pad, y + pad).0[0];
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

/// Blurs a grayscale scan and inverse-thresholds it: blurred pixels above the
/// threshold become `BACKGROUND`, the rest (dark ink) `FOREGROUND`.
pub fn blur_and_threshold(img: &GrayImage, options: &PreprocessOptions) -> GrayImage {
    let blurred = gaussian_blur_5x5(img);
    let mut binary = threshold(&blurred, options.threshold);
    invert(&mut binary);
    binary
}

pub fn image_size(img: &GrayImage) -> Size<u32> {
    let (width, height) = img.dimensions();
    Size { width, height }
}

/// Counts the pixels inside `rect` that match the given luma, along with the
/// number of pixels considered. Parts of `rect` outside the image are ignored.
pub fn count_pixels_in_rect(img: &GrayImage, rect: &PixelRect, luma: &Luma<u8>) -> (u64, u64) {
    let rect = rect.clamp_to(image_size(img));
    if rect.is_empty() {
        return (0, 0);
    }

    let matching = img
        .view(rect.x1, rect.y1, rect.width(), rect.height())
        .pixels()
        .filter(|(_, _, p)| p == luma)
        .count() as u64;
    (matching, rect.area())
}
