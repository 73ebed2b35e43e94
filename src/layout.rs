use std::collections::HashSet;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{OptionLabel, SectionName};

/// The unvalidated form of a section, as written in a layout file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDefinition {
    pub name: String,
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
    pub options: Vec<OptionLabel>,
    pub rows: u32,
    pub fill_threshold: f64,
    #[serde(default)]
    pub column_answers: bool,
}

/// A named rectangular bubble grid on the sheet. The bounding box is given in
/// percent of the image width (`x1`, `x2`) and height (`y1`, `y2`).
///
/// Only constructible through validation, so every `SectionSpec` has at least
/// one row and one option and a non-empty box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SectionDefinition")]
pub struct SectionSpec {
    name: SectionName,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
    options: Vec<OptionLabel>,
    rows: u32,
    fill_threshold: f64,
    column_answers: bool,
}

impl SectionSpec {
    pub fn name(&self) -> &SectionName {
        &self.name
    }

    /// Horizontal extent in percent, `(x1, x2)`.
    pub fn x_range(&self) -> (f64, f64) {
        (self.x1, self.x2)
    }

    /// Vertical extent in percent, `(y1, y2)`.
    pub fn y_range(&self) -> (f64, f64) {
        (self.y1, self.y2)
    }

    pub fn options(&self) -> &[OptionLabel] {
        &self.options
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn fill_threshold(&self) -> f64 {
        self.fill_threshold
    }

    /// Whether each option column encodes a single answer (one digit of a roll
    /// number, say) rather than each row.
    pub fn column_answers(&self) -> bool {
        self.column_answers
    }

    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.options.len()
    }
}

#[derive(Debug)]
pub enum LayoutError {
    EmptyName,
    DuplicateSection(String),
    InvalidPercentage(String, f64),
    EmptyBox(String),
    NoOptions(String),
    DuplicateOption(String, OptionLabel),
    NoRows(String),
    InvalidThreshold(String, f64),
    Read(PathBuf, std::io::Error),
    Parse(PathBuf, serde_json::Error),
}

impl Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::EmptyName => write!(f, "section name must not be empty"),
            LayoutError::DuplicateSection(name) => {
                write!(f, "section {:?} is defined more than once", name)
            }
            LayoutError::InvalidPercentage(name, value) => write!(
                f,
                "section {:?}: coordinate {} is not a percentage in [0, 100]",
                name, value
            ),
            LayoutError::EmptyBox(name) => write!(
                f,
                "section {:?}: bounding box needs x1 < x2 and y1 < y2",
                name
            ),
            LayoutError::NoOptions(name) => write!(f, "section {:?} has no options", name),
            LayoutError::DuplicateOption(name, option) => {
                write!(f, "section {:?}: option {} is repeated", name, option)
            }
            LayoutError::NoRows(name) => write!(f, "section {:?} has no rows", name),
            LayoutError::InvalidThreshold(name, value) => write!(
                f,
                "section {:?}: fill threshold {} is not in (0, 1]",
                name, value
            ),
            LayoutError::Read(path, e) => {
                write!(f, "unable to read layout {}: {}", path.display(), e)
            }
            LayoutError::Parse(path, e) => {
                write!(f, "unable to parse layout {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for LayoutError {}

impl TryFrom<SectionDefinition> for SectionSpec {
    type Error = LayoutError;

    fn try_from(definition: SectionDefinition) -> Result<Self, Self::Error> {
        let SectionDefinition {
            name,
            x1,
            x2,
            y1,
            y2,
            options,
            rows,
            fill_threshold,
            column_answers,
        } = definition;

        if name.is_empty() {
            return Err(LayoutError::EmptyName);
        }

        for value in [x1, x2, y1, y2] {
            if !(0.0..=100.0).contains(&value) {
                return Err(LayoutError::InvalidPercentage(name, value));
            }
        }

        if x1 >= x2 || y1 >= y2 {
            return Err(LayoutError::EmptyBox(name));
        }

        if options.is_empty() {
            return Err(LayoutError::NoOptions(name));
        }

        let mut seen = HashSet::new();
        for option in &options {
            if !seen.insert(option) {
                return Err(LayoutError::DuplicateOption(name, option.clone()));
            }
        }

        if rows == 0 {
            return Err(LayoutError::NoRows(name));
        }

        if !(fill_threshold > 0.0 && fill_threshold <= 1.0) {
            return Err(LayoutError::InvalidThreshold(name, fill_threshold));
        }

        Ok(SectionSpec {
            name: SectionName::from(name),
            x1,
            x2,
            y1,
            y2,
            options,
            rows,
            fill_threshold,
            column_answers,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SheetLayoutDefinition {
    sections: Vec<SectionSpec>,
}

/// The full set of sections scanned on one sheet, in scan order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SheetLayoutDefinition")]
pub struct SheetLayout {
    sections: Vec<SectionSpec>,
}

impl TryFrom<SheetLayoutDefinition> for SheetLayout {
    type Error = LayoutError;

    fn try_from(definition: SheetLayoutDefinition) -> Result<Self, Self::Error> {
        SheetLayout::new(definition.sections)
    }
}

impl SheetLayout {
    pub fn new(sections: Vec<SectionSpec>) -> Result<Self, LayoutError> {
        let mut names = HashSet::new();
        for section in &sections {
            if !names.insert(section.name()) {
                return Err(LayoutError::DuplicateSection(section.name().to_string()));
            }
        }
        Ok(Self { sections })
    }

    pub fn from_definitions(definitions: Vec<SectionDefinition>) -> Result<Self, LayoutError> {
        let sections = definitions
            .into_iter()
            .map(SectionSpec::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(sections)
    }

    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| LayoutError::Read(path.to_path_buf(), e))?;
        serde_json::from_str(&json).map_err(|e| LayoutError::Parse(path.to_path_buf(), e))
    }

    pub fn sections(&self) -> &[SectionSpec] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&SectionSpec> {
        self.sections.iter().find(|s| s.name().as_str() == name)
    }

    /// The six-section answer sheet: two 25-question A–D blocks, six-digit roll
    /// and registration numbers, a three-digit subject code and a set code.
    pub fn reference() -> Self {
        fn section(
            name: &str,
            (x1, x2, y1, y2): (f64, f64, f64, f64),
            options: Vec<OptionLabel>,
            rows: u32,
            fill_threshold: f64,
            column_answers: bool,
        ) -> SectionDefinition {
            SectionDefinition {
                name: name.to_string(),
                x1,
                x2,
                y1,
                y2,
                options,
                rows,
                fill_threshold,
                column_answers,
            }
        }

        let letters = || ["A", "B", "C", "D"].map(OptionLabel::from).to_vec();
        let digits = |n: u32| (1..=n).map(OptionLabel::from).collect::<Vec<_>>();

        let definitions = vec![
            section("MCQ Section 1", (8.0, 24.0, 19.0, 90.5), letters(), 25, 0.05, false),
            section("MCQ Section 2", (31.0, 46.5, 19.0, 90.5), letters(), 25, 0.05, false),
            section("Roll Number", (49.0, 61.5, 24.0, 38.5), digits(6), 10, 0.3, true),
            section("Registration", (49.0, 61.5, 45.5, 60.2), digits(6), 10, 0.3, true),
            section("Subject Code", (67.5, 74.0, 45.5, 60.2), digits(3), 10, 0.25, true),
            section("Set Code", (67.5, 74.0, 24.0, 34.0), vec!["Set".into()], 4, 0.01, false),
        ];

        Self::from_definitions(definitions).expect("reference layout is valid")
    }
}
