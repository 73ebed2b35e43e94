extern crate pretty_env_logger;

use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{arg, command, value_parser, Command};

use omr_scan::image_utils::PreprocessOptions;
use omr_scan::interpret::{interpret_sheet, InterpretOptions, InterpretedSheet};
use omr_scan::layout::SheetLayout;

fn main() {
    pretty_env_logger::init_custom_env("LOG");

    let matches = cli().get_matches();
    let debug = matches.get_flag("debug");
    let json = matches.get_flag("json");
    let image_path = matches
        .get_one::<String>("image_path")
        .expect("image path is required");
    let output_path = matches
        .get_one::<String>("output")
        .expect("output path has a default");
    let threshold = *matches
        .get_one::<u8>("threshold")
        .expect("threshold has a default");

    let layout = match matches.get_one::<String>("layout") {
        Some(layout_path) => match SheetLayout::load(Path::new(layout_path)) {
            Ok(layout) => layout,
            Err(e) => {
                eprintln!("Error loading layout: {}", e);
                exit(1);
            }
        },
        None => SheetLayout::reference(),
    };

    let options = InterpretOptions {
        debug,
        layout,
        preprocess: PreprocessOptions {
            threshold,
            ..PreprocessOptions::default()
        },
        output_path: PathBuf::from(output_path),
    };

    match interpret_sheet(Path::new(image_path), &options) {
        Ok(sheet) => {
            if json {
                match serde_json::to_string_pretty(&sheet) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing result: {}", e);
                        exit(1);
                    }
                }
            } else {
                print!("{}", format_report(&sheet, &options.layout));
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(1);
        }
    }
}

/// Renders the plain-text report: sections scored per row in layout order,
/// then each column-answer section with missing columns shown as X.
fn format_report(sheet: &InterpretedSheet, layout: &SheetLayout) -> String {
    let mut report = String::from("OMR Results:\n");
    for spec in layout.sections().iter().filter(|s| !s.column_answers()) {
        report += &format!(
            "{}: [{}]\n",
            spec.name(),
            join(sheet.detections.detections(spec.name().as_str()))
        );
    }

    for section in &sheet.columns {
        report += &format!(
            "\n{} (by column, missing shown as X):\n[{}]\n",
            section.name,
            join(section.entries.as_slice())
        );
    }
    report
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[allow(clippy::cognitive_complexity)]
fn cli() -> Command {
    command!()
        .arg(arg!(-l --layout <PATH> "Path to a layout.json file (defaults to the built-in sheet)"))
        .arg(
            arg!(-o --output <PATH> "Path to write the annotated sheet image to")
                .default_value("scanned_omr.png"),
        )
        .arg(arg!(-d --debug "Write grayscale and binary snapshots next to the input image"))
        .arg(
            arg!(-t --threshold <VALUE> "Pixels at or below this gray level count as ink")
                .value_parser(value_parser!(u8))
                .default_value("40"),
        )
        .arg(arg!(--json "Print the result as JSON"))
        .arg(arg!(image_path: <IMAGE> "Path to the scanned answer sheet").required(true))
}

#[cfg(test)]
mod test {
    use omr_scan::interpret::reconcile_column_sections;
    use omr_scan::scanner::{ScanResult, SectionDetections};
    use omr_scan::types::{Detection, SectionName, Size};

    use super::*;

    #[test]
    fn test_cli_defaults() {
        let matches = cli().get_matches_from(["omr-scan", "sheet.jpg"]);
        assert_eq!(
            matches.get_one::<String>("image_path").map(String::as_str),
            Some("sheet.jpg")
        );
        assert_eq!(
            matches.get_one::<String>("output").map(String::as_str),
            Some("scanned_omr.png")
        );
        assert_eq!(matches.get_one::<u8>("threshold"), Some(&40));
        assert!(matches.get_one::<String>("layout").is_none());
        assert!(!matches.get_flag("debug"));
        assert!(!matches.get_flag("json"));
    }

    #[test]
    fn test_cli_rejects_out_of_range_threshold() {
        assert!(cli()
            .try_get_matches_from(["omr-scan", "-t", "300", "sheet.jpg"])
            .is_err());
    }

    #[test]
    fn test_cli_verifies() {
        cli().debug_assert();
    }

    #[test]
    fn test_format_report() {
        let layout = SheetLayout::reference();
        let detections = ScanResult::new(vec![
            SectionDetections {
                name: SectionName::from("Set Code".to_string()),
                detections: vec![Detection::new(2, "Set")],
            },
            SectionDetections {
                name: SectionName::from("MCQ Section 1".to_string()),
                detections: vec![Detection::new(1, "B"), Detection::new(1, "C")],
            },
            SectionDetections {
                name: SectionName::from("Roll Number".to_string()),
                detections: vec![Detection::new(4, 2u32), Detection::new(1, 2u32)],
            },
        ]);
        let sheet = InterpretedSheet {
            size: Size {
                width: 100,
                height: 100,
            },
            columns: reconcile_column_sections(&layout, &detections),
            detections,
        };

        assert_eq!(
            format_report(&sheet, &layout),
            "OMR Results:\n\
             MCQ Section 1: [(1, B), (1, C)]\n\
             MCQ Section 2: []\n\
             Set Code: [(2, Set)]\n\
             \n\
             Roll Number (by column, missing shown as X):\n\
             [X, (1, 2), X, X, X, X]\n\
             \n\
             Registration (by column, missing shown as X):\n\
             [X, X, X, X, X, X]\n\
             \n\
             Subject Code (by column, missing shown as X):\n\
             [X, X, X]\n"
        );
    }

    #[test]
    fn test_join() {
        assert_eq!(join::<u32>(&[]), "");
        assert_eq!(join(&[1, 2, 3]), "1, 2, 3");
    }
}
