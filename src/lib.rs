//! Optical mark recognition for fixed-layout answer sheets.
//!
//! A sheet is described by a [`layout::SheetLayout`], a table of bubble grids
//! positioned in percent of the page. Scanning binarizes the photo, measures
//! how much of every grid cell is inked, and reports the filled cells per
//! section. Sections that encode one digit per column (roll numbers and the
//! like) can then be reconciled into exactly one answer per column.

pub mod debug;
pub mod fill;
pub mod geometry;
pub mod image_utils;
pub mod interpret;
pub mod layout;
pub mod reconcile;
pub mod scanner;
pub mod types;
