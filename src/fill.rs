use image::GrayImage;

use crate::geometry::PixelRect;
use crate::image_utils::{count_pixels_in_rect, FOREGROUND};

/// Fraction of foreground pixels within `rect` of a binarized sheet. A
/// rectangle covering no pixels has a ratio of 0.
pub fn fill_ratio(binary: &GrayImage, rect: &PixelRect) -> f64 {
    let (marked, total) = count_pixels_in_rect(binary, rect, &FOREGROUND);
    if total == 0 {
        return 0.0;
    }
    marked as f64 / total as f64
}

/// A cell counts as filled only when its ratio is strictly above the threshold.
pub fn is_filled(ratio: f64, threshold: f64) -> bool {
    ratio > threshold
}
