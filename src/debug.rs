use std::path::{Path, PathBuf};

use image::{GrayImage, ImageResult, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};

use crate::{
    geometry::{section_cells, PixelRect},
    image_utils::{BLUE, GREEN},
    layout::SheetLayout,
    scanner::ScanResult,
    types::{Detection, Size},
};

/// Creates a path for a debug image.
pub fn debug_image_path(base: &Path, label: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut result = PathBuf::from(base);
    result.set_file_name(format!("{}_debug_{}.png", stem, label));
    result
}

/// Writes intermediate images next to the input image when enabled.
pub struct ImageDebugWriter {
    input_path: Option<PathBuf>,
}

impl ImageDebugWriter {
    pub fn new(input_path: PathBuf) -> Self {
        Self {
            input_path: Some(input_path),
        }
    }

    pub fn disabled() -> Self {
        Self { input_path: None }
    }

    /// Saves `img` as `<stem>_debug_<label>.png`, returning the path written.
    pub fn write(&self, label: &str, img: &GrayImage) -> ImageResult<Option<PathBuf>> {
        let Some(input_path) = &self.input_path else {
            return Ok(None);
        };

        let path = debug_image_path(input_path, label);
        img.save(&path)?;
        Ok(Some(path))
    }
}

/// Outlines every cell of every section in blue and every detected cell with
/// a thicker green border.
pub fn draw_sheet_overlay_mut(canvas: &mut RgbImage, layout: &SheetLayout, scan: &ScanResult) {
    let (width, height) = canvas.dimensions();
    let size = Size { width, height };

    for spec in layout.sections() {
        let detections = scan.detections(spec.name().as_str());
        for cell in section_cells(spec, size) {
            draw_hollow_rect_mut(canvas, cell.rect.outline(), BLUE);

            let detected = Detection {
                row: cell.row,
                option: cell.option.clone(),
            };
            if detections.contains(&detected) {
                draw_highlight_mut(canvas, &cell.rect);
            }
        }
    }
}

fn draw_highlight_mut(canvas: &mut RgbImage, rect: &PixelRect) {
    let outline = rect.outline();
    draw_hollow_rect_mut(canvas, outline, GREEN);
    if outline.width() > 2 && outline.height() > 2 {
        draw_hollow_rect_mut(
            canvas,
            Rect::at(outline.left() + 1, outline.top() + 1)
                .of_size(outline.width() - 2, outline.height() - 2),
            GREEN,
        );
    }
}

#[cfg(test)]
mod test {
    use image::{GrayImage, Rgb};

    use super::*;
    use crate::geometry::{cell_rect, map_section};
    use crate::image_utils::{BACKGROUND, WHITE};
    use crate::scanner::scan_sheet;

    #[test]
    fn test_debug_image_path() {
        assert_eq!(
            debug_image_path(Path::new("/scans/sheet-01.jpg"), "binary"),
            PathBuf::from("/scans/sheet-01_debug_binary.png")
        );
    }

    #[test]
    fn test_disabled_writer_writes_nothing() {
        let writer = ImageDebugWriter::disabled();
        let img = GrayImage::new(4, 4);
        assert_eq!(writer.write("binary", &img).unwrap(), None);
    }

    #[test]
    fn test_writer_saves_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ImageDebugWriter::new(dir.path().join("sheet.jpg"));
        let img = GrayImage::from_pixel(4, 4, WHITE);

        let path = writer.write("grayscale", &img).unwrap().unwrap();
        assert_eq!(path, dir.path().join("sheet_debug_grayscale.png"));
        assert_eq!(image::open(&path).unwrap().into_luma8(), img);
    }

    #[test]
    fn test_overlay_highlights_detected_cells() {
        let layout = SheetLayout::reference();
        let mcq = layout.section("MCQ Section 1").unwrap();
        let size = Size {
            width: 400,
            height: 400,
        };
        let marked = cell_rect(mcq, &map_section(mcq, size), 0, 1);
        let plain = cell_rect(mcq, &map_section(mcq, size), 0, 2);

        let mut binary = GrayImage::from_pixel(400, 400, BACKGROUND);
        for y in marked.y1..marked.y2 {
            for x in marked.x1..marked.x2 {
                binary.put_pixel(x, y, WHITE);
            }
        }
        let scan = scan_sheet(&binary, &layout);

        let mut canvas = RgbImage::from_pixel(400, 400, Rgb([255, 255, 255]));
        draw_sheet_overlay_mut(&mut canvas, &layout, &scan);

        // the inner border of a highlighted cell is green
        assert_eq!(*canvas.get_pixel(marked.x1 + 1, marked.y1 + 1), GREEN);
        assert_eq!(*canvas.get_pixel(plain.x2, plain.y2), BLUE);
        assert_eq!(*canvas.get_pixel(plain.x1 + 1, plain.y1 + 1), Rgb([255, 255, 255]));
    }
}
