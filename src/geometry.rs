use imageproc::rect::Rect;

use crate::layout::SectionSpec;
use crate::types::{OptionLabel, Size};

/// An axis-aligned pixel rectangle. `x1`/`y1` are inclusive, `x2`/`y2` are
/// exclusive, so a rectangle with `x1 == x2` covers no pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PixelRect {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    /// Restricts the rectangle to an image of the given size.
    pub fn clamp_to(&self, size: Size<u32>) -> PixelRect {
        PixelRect {
            x1: self.x1.min(size.width),
            y1: self.y1.min(size.height),
            x2: self.x2.min(size.width),
            y2: self.y2.min(size.height),
        }
    }

    /// The rectangle outlined by treating both corners as inclusive points,
    /// which is how cell outlines are drawn on the overlay.
    pub fn outline(&self) -> Rect {
        Rect::at(self.x1 as i32, self.y1 as i32).of_size(
            self.x2.saturating_sub(self.x1) + 1,
            self.y2.saturating_sub(self.y1) + 1,
        )
    }
}

/// Converts the section's percentage box to pixels. Each edge is truncated
/// toward zero independently.
pub fn map_section(spec: &SectionSpec, size: Size<u32>) -> PixelRect {
    let (x1, x2) = spec.x_range();
    let (y1, y2) = spec.y_range();
    PixelRect {
        x1: percent_of(x1, size.width),
        x2: percent_of(x2, size.width),
        y1: percent_of(y1, size.height),
        y2: percent_of(y2, size.height),
    }
}

fn percent_of(percent: f64, dimension: u32) -> u32 {
    (percent / 100.0 * dimension as f64) as u32
}

/// Computes the pixel rectangle of the cell at the zero-based `row` and
/// `column` of a section whose box has already been mapped to pixels.
///
/// Row height and column width are real-valued; every cell edge is truncated
/// on its own, so neighboring cells may differ in size by a pixel.
pub fn cell_rect(spec: &SectionSpec, section_box: &PixelRect, row: u32, column: usize) -> PixelRect {
    let row_height = section_box.height() as f64 / spec.rows() as f64;
    let column_width = section_box.width() as f64 / spec.options().len() as f64;
    let edge = |origin: u32, step: f64, index: f64| (origin as f64 + index * step) as u32;

    PixelRect {
        x1: edge(section_box.x1, column_width, column as f64),
        x2: edge(section_box.x1, column_width, column as f64 + 1.0),
        y1: edge(section_box.y1, row_height, row as f64),
        y2: edge(section_box.y1, row_height, row as f64 + 1.0),
    }
}

/// One bubble cell of a section.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell<'a> {
    /// 1-based row number as printed on the sheet.
    pub row: u32,
    pub option: &'a OptionLabel,
    pub rect: PixelRect,
}

/// Iterates every cell of a section in row-major order: all options of row 1,
/// then row 2, and so on.
pub fn section_cells(spec: &SectionSpec, size: Size<u32>) -> impl Iterator<Item = Cell<'_>> {
    let section_box = map_section(spec, size);
    (0..spec.rows()).flat_map(move |row| {
        spec.options()
            .iter()
            .enumerate()
            .map(move |(column, option)| Cell {
                row: row + 1,
                option,
                rect: cell_rect(spec, &section_box, row, column),
            })
    })
}
