use image::GrayImage;
use serde::Serialize;

use crate::fill::{fill_ratio, is_filled};
use crate::geometry::{section_cells, PixelRect};
use crate::image_utils::image_size;
use crate::layout::{SectionSpec, SheetLayout};
use crate::types::{Detection, OptionLabel, SectionName};

/// A single cell after measuring how much of it is inked.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredCell {
    pub row: u32,
    pub option: OptionLabel,
    pub rect: PixelRect,
    pub fill_ratio: f64,
    pub filled: bool,
}

/// Measures every cell of a section, in row-major order.
pub fn score_section_cells(binary: &GrayImage, spec: &SectionSpec) -> Vec<ScoredCell> {
    section_cells(spec, image_size(binary))
        .map(|cell| {
            let ratio = fill_ratio(binary, &cell.rect);
            ScoredCell {
                row: cell.row,
                option: cell.option.clone(),
                rect: cell.rect,
                fill_ratio: ratio,
                filled: is_filled(ratio, spec.fill_threshold()),
            }
        })
        .collect()
}

/// The filled cells of one section, in row-major scan order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SectionDetections {
    pub name: SectionName,
    pub detections: Vec<Detection>,
}

/// Detections for every section that had at least one filled cell. Sections
/// without any are absent rather than present with an empty list.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScanResult {
    sections: Vec<SectionDetections>,
}

impl ScanResult {
    /// Builds a result from per-section detections, dropping sections that
    /// have none.
    pub fn new(sections: Vec<SectionDetections>) -> Self {
        Self {
            sections: sections
                .into_iter()
                .filter(|s| !s.detections.is_empty())
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[Detection]> {
        self.sections
            .iter()
            .find(|s| s.name.as_str() == name)
            .map(|s| s.detections.as_slice())
    }

    /// Like `get`, treating an absent section as having no detections.
    pub fn detections(&self, name: &str) -> &[Detection] {
        self.get(name).unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionDetections> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Finds the filled bubbles of every section in a binarized sheet. Multiple
/// marks in one row are all kept.
pub fn scan_sheet(binary: &GrayImage, layout: &SheetLayout) -> ScanResult {
    let sections = layout
        .sections()
        .iter()
        .filter_map(|spec| {
            let detections = score_section_cells(binary, spec)
                .into_iter()
                .filter(|cell| cell.filled)
                .map(|cell| Detection {
                    row: cell.row,
                    option: cell.option,
                })
                .collect::<Vec<_>>();

            if detections.is_empty() {
                None
            } else {
                Some(SectionDetections {
                    name: spec.name().clone(),
                    detections,
                })
            }
        })
        .collect();

    ScanResult { sections }
}

#[cfg(test)]
mod test {
    use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};
    use proptest::prelude::*;

    use super::*;
    use crate::geometry::{cell_rect, map_section};
    use crate::image_utils::{BACKGROUND, FOREGROUND};
    use crate::layout::{test::definition, SectionSpec};

    fn fill_cell(img: &mut GrayImage, spec: &SectionSpec, row: u32, column: usize) {
        let size = image_size(img);
        let rect = cell_rect(spec, &map_section(spec, size), row, column);
        draw_filled_rect_mut(
            img,
            Rect::at(rect.x1 as i32, rect.y1 as i32).of_size(rect.width(), rect.height()),
            FOREGROUND,
        );
    }

    #[test]
    fn test_single_mark_on_reference_sheet() {
        let layout = SheetLayout::reference();
        let mut img = GrayImage::from_pixel(100, 100, BACKGROUND);
        fill_cell(&mut img, layout.section("MCQ Section 1").unwrap(), 0, 1);

        let result = scan_sheet(&img, &layout);
        assert_eq!(result.len(), 1);
        assert_eq!(
            result.get("MCQ Section 1"),
            Some(&[Detection::new(1, "B")][..])
        );
        for name in [
            "MCQ Section 2",
            "Roll Number",
            "Registration",
            "Subject Code",
            "Set Code",
        ] {
            assert!(!result.contains(name), "{} should be absent", name);
        }
    }

    #[test]
    fn test_blank_sheet_has_no_sections() {
        let img = GrayImage::from_pixel(100, 100, BACKGROUND);
        let result = scan_sheet(&img, &SheetLayout::reference());
        assert!(result.is_empty());
        assert!(result.detections("Roll Number").is_empty());
    }

    #[test]
    fn test_detections_are_row_major() {
        let spec = SectionSpec::try_from(definition("Q")).unwrap();
        let layout = SheetLayout::new(vec![spec.clone()]).unwrap();
        let mut img = GrayImage::from_pixel(100, 100, BACKGROUND);
        fill_cell(&mut img, &spec, 1, 0);
        fill_cell(&mut img, &spec, 0, 1);
        fill_cell(&mut img, &spec, 1, 1);

        let result = scan_sheet(&img, &layout);
        assert_eq!(
            result.detections("Q"),
            &[
                Detection::new(1, "B"),
                Detection::new(2, "A"),
                Detection::new(2, "B"),
            ]
        );
    }

    #[test]
    fn test_threshold_is_per_section() {
        let mut loose = definition("Loose");
        loose.fill_threshold = 0.1;
        let mut strict = definition("Strict");
        strict.fill_threshold = 0.9;
        let layout = SheetLayout::from_definitions(vec![loose, strict]).unwrap();

        // both sections share the same box; the top fifth of every cell is inked
        let mut img = GrayImage::from_pixel(100, 100, BACKGROUND);
        for y in [10, 11, 12, 13, 30, 31, 32, 33] {
            for x in 10..50 {
                img.put_pixel(x, y, FOREGROUND);
            }
        }

        let result = scan_sheet(&img, &layout);
        assert_eq!(result.detections("Loose").len(), 4);
        assert!(!result.contains("Strict"));
    }

    #[test]
    fn test_score_section_cells_reports_ratios() {
        let spec = SectionSpec::try_from(definition("Q")).unwrap();
        let mut img = GrayImage::from_pixel(100, 100, BACKGROUND);
        fill_cell(&mut img, &spec, 0, 0);

        let cells = score_section_cells(&img, &spec);
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].fill_ratio, 1.0);
        assert!(cells[0].filled);
        assert!(cells[1..].iter().all(|c| c.fill_ratio == 0.0 && !c.filled));
    }

    #[test]
    fn test_new_drops_empty_sections() {
        let result = ScanResult::new(vec![
            SectionDetections {
                name: SectionName::from("Empty".to_string()),
                detections: vec![],
            },
            SectionDetections {
                name: SectionName::from("Marked".to_string()),
                detections: vec![Detection::new(2, "C")],
            },
        ]);
        assert_eq!(result.len(), 1);
        assert!(!result.contains("Empty"));
        assert_eq!(result.detections("Marked"), &[Detection::new(2, "C")]);
    }

    #[test]
    fn test_degenerate_image() {
        let img = GrayImage::new(0, 0);
        assert!(scan_sheet(&img, &SheetLayout::reference()).is_empty());
    }

    proptest! {
        #[test]
        fn prop_scan_is_idempotent(
            pixels in proptest::collection::vec(any::<bool>(), 40 * 40),
        ) {
            let img = GrayImage::from_fn(40, 40, |x, y| {
                if pixels[(y * 40 + x) as usize] { FOREGROUND } else { BACKGROUND }
            });
            let layout = SheetLayout::reference();
            prop_assert_eq!(scan_sheet(&img, &layout), scan_sheet(&img, &layout));
        }

        #[test]
        fn prop_every_cell_is_scored(width in 0u32..300, height in 0u32..300) {
            let img = GrayImage::new(width, height);
            for spec in SheetLayout::reference().sections() {
                prop_assert_eq!(score_section_cells(&img, spec).len(), spec.cell_count());
            }
        }
    }
}
