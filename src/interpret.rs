use std::fmt::Display;
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageError, RgbImage};
use logging_timer::time;
use serde::Serialize;

use crate::debug::{debug_image_path, draw_sheet_overlay_mut, ImageDebugWriter};
use crate::image_utils::{blur_and_threshold, image_size, rgb_to_luma, PreprocessOptions};
use crate::layout::SheetLayout;
use crate::reconcile::ReconciledSection;
use crate::scanner::{scan_sheet, ScanResult};
use crate::types::Size;

#[derive(Debug, Clone)]
pub struct InterpretOptions {
    pub debug: bool,
    pub layout: SheetLayout,
    pub preprocess: PreprocessOptions,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretedSheet {
    pub size: Size<u32>,
    pub detections: ScanResult,
    pub columns: Vec<ReconciledSection>,
}

pub type LoadedSheet = (GrayImage, RgbImage);
pub type InterpretSheetResult = Result<InterpretedSheet, InterpretSheetError>;

#[derive(Debug)]
pub enum InterpretSheetError {
    ImageOpenError(PathBuf, ImageError),
    ImageWriteError(PathBuf, ImageError),
    MismatchedDimensions(PathBuf, (u32, u32), (u32, u32)),
}

impl Display for InterpretSheetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterpretSheetError::ImageOpenError(path, e) => {
                write!(f, "unable to read image at path {}: {}", path.display(), e)
            }
            InterpretSheetError::ImageWriteError(path, e) => {
                write!(f, "unable to write image to path {}: {}", path.display(), e)
            }
            InterpretSheetError::MismatchedDimensions(path, gray, color) => write!(
                f,
                "grayscale ({:?}) and color ({:?}) renditions of {} differ in size",
                gray,
                color,
                path.display()
            ),
        }
    }
}

impl std::error::Error for InterpretSheetError {}

#[time]
/// Loads an image as 8-bit gray, weighting color channels with BT.601.
pub fn load_grayscale_image(image_path: &Path) -> Result<GrayImage, InterpretSheetError> {
    match image::open(image_path) {
        Ok(img) => Ok(rgb_to_luma(&img.into_rgb8())),
        Err(e) => Err(InterpretSheetError::ImageOpenError(
            image_path.to_path_buf(),
            e,
        )),
    }
}

#[time]
pub fn load_color_image(image_path: &Path) -> Result<RgbImage, InterpretSheetError> {
    match image::open(image_path) {
        Ok(img) => Ok(img.into_rgb8()),
        Err(e) => Err(InterpretSheetError::ImageOpenError(
            image_path.to_path_buf(),
            e,
        )),
    }
}

#[time]
/// Load the grayscale rendition to scan and the color rendition to annotate.
fn load_sheet_images(image_path: &Path) -> Result<LoadedSheet, InterpretSheetError> {
    let (gray_result, color_result) = rayon::join(
        || load_grayscale_image(image_path),
        || load_color_image(image_path),
    );

    let gray = gray_result?;
    let color = color_result?;

    if gray.dimensions() != color.dimensions() {
        return Err(InterpretSheetError::MismatchedDimensions(
            image_path.to_path_buf(),
            gray.dimensions(),
            color.dimensions(),
        ));
    }

    Ok((gray, color))
}

#[time]
fn preprocess(gray: &GrayImage, options: &PreprocessOptions) -> GrayImage {
    blur_and_threshold(gray, options)
}

/// Loads, binarizes and scans a sheet without producing any other output.
pub fn scan_sheet_image(
    image_path: &Path,
    layout: &SheetLayout,
    options: &PreprocessOptions,
) -> Result<ScanResult, InterpretSheetError> {
    let gray = load_grayscale_image(image_path)?;
    Ok(scan_sheet(&preprocess(&gray, options), layout))
}

/// Reconciles every section flagged as holding one answer per column, using
/// the section's options as the expected columns.
pub fn reconcile_column_sections(layout: &SheetLayout, scan: &ScanResult) -> Vec<ReconciledSection> {
    layout
        .sections()
        .iter()
        .filter(|spec| spec.column_answers())
        .map(|spec| ReconciledSection {
            name: spec.name().clone(),
            entries: scan.reconcile(spec.name().as_str(), spec.options()),
        })
        .collect()
}

#[time]
pub fn interpret_sheet(image_path: &Path, options: &InterpretOptions) -> InterpretSheetResult {
    let (gray, mut color) = load_sheet_images(image_path)?;
    let size = image_size(&gray);
    log::debug!(
        "loaded {} ({}x{})",
        image_path.display(),
        size.width,
        size.height
    );

    let debug = if options.debug {
        ImageDebugWriter::new(image_path.to_path_buf())
    } else {
        ImageDebugWriter::disabled()
    };

    let binary = preprocess(&gray, &options.preprocess);
    for (label, img) in [("grayscale", &gray), ("binary", &binary)] {
        match debug.write(label, img) {
            Ok(Some(path)) => log::debug!("wrote {} snapshot to {}", label, path.display()),
            Ok(None) => {}
            Err(e) => {
                return Err(InterpretSheetError::ImageWriteError(
                    debug_image_path(image_path, label),
                    e,
                ))
            }
        }
    }

    let detections = scan_sheet(&binary, &options.layout);
    for section in detections.iter() {
        log::debug!(
            "{}: {} filled cell(s)",
            section.name,
            section.detections.len()
        );
    }

    let columns = reconcile_column_sections(&options.layout, &detections);

    draw_sheet_overlay_mut(&mut color, &options.layout, &detections);
    color
        .save(&options.output_path)
        .map_err(|e| InterpretSheetError::ImageWriteError(options.output_path.clone(), e))?;
    log::info!("scanned sheet saved as {}", options.output_path.display());

    Ok(InterpretedSheet {
        size,
        detections,
        columns,
    })
}
