use std::collections::HashMap;
use std::fmt::Display;

use serde::Serialize;

use crate::scanner::ScanResult;
use crate::types::{Detection, OptionLabel, SectionName};

/// The answer recorded for one column of a single-answer-per-column section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReconciledEntry {
    Detected(Detection),
    /// No bubble in the column was filled.
    Missing,
}

impl ReconciledEntry {
    pub fn detection(&self) -> Option<&Detection> {
        match self {
            ReconciledEntry::Detected(detection) => Some(detection),
            ReconciledEntry::Missing => None,
        }
    }
}

impl Display for ReconciledEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconciledEntry::Detected(detection) => write!(f, "{}", detection),
            ReconciledEntry::Missing => write!(f, "X"),
        }
    }
}

/// Resolves the raw detections of a section into exactly one entry per
/// expected column, in the order of `expected_columns`.
///
/// When a column has several marks the one on the topmost row wins; among
/// marks on the same row the first one seen is kept. Columns without any mark
/// become `Missing`.
pub fn reconcile_columns(
    detections: &[Detection],
    expected_columns: &[OptionLabel],
) -> Vec<ReconciledEntry> {
    let mut best: HashMap<&OptionLabel, &Detection> = HashMap::new();
    for detection in detections {
        best.entry(&detection.option)
            .and_modify(|current| {
                if detection.row < current.row {
                    *current = detection;
                }
            })
            .or_insert(detection);
    }

    expected_columns
        .iter()
        .map(|column| match best.get(column) {
            Some(detection) => ReconciledEntry::Detected((*detection).clone()),
            None => ReconciledEntry::Missing,
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReconciledSection {
    pub name: SectionName,
    pub entries: Vec<ReconciledEntry>,
}

impl ScanResult {
    /// Reconciles one section of the scan. A section with no detections yields
    /// a `Missing` entry for every expected column.
    pub fn reconcile(&self, name: &str, expected_columns: &[OptionLabel]) -> Vec<ReconciledEntry> {
        reconcile_columns(self.detections(name), expected_columns)
    }
}
