//! Copy-number normalization against universal single-copy marker genes.
//!

use super::pangene::PangeneCoverage;
use crate::utils::{math::median, open_text_reader, CnvError, Result};
use itertools::Itertools;
use std::io::BufRead;
use std::path::Path;

/// Universal single-copy phylogenetic marker families used as the coverage baseline.
pub const PHYECO_MARKERS: [&str; 14] = [
    "B000039", "B000041", "B000062", "B000063", "B000065", "B000071", "B000079", "B000080",
    "B000081", "B000082", "B000086", "B000096", "B000103", "B000114",
];

/// Pangenes of one cluster that belong to a universal marker family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerSet {
    pangenes: Vec<String>,
}

impl MarkerSet {
    pub fn new(pangenes: Vec<String>) -> Self {
        Self { pangenes }
    }

    /// Parses a `pangene_id marker_id` table (first line is a header), keeping universal markers.
    pub fn from_reader<R: BufRead>(reader: R) -> std::result::Result<Self, CnvError> {
        let mut pangenes = Vec::new();
        for line in reader.lines().skip(1) {
            let line =
                line.map_err(|e| CnvError::malformed("unreadable marker table", e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (pangene_id, marker_id) = match (fields.next(), fields.next()) {
                (Some(pangene_id), Some(marker_id)) => (pangene_id, marker_id),
                _ => return Err(CnvError::malformed("expected pangene and marker id", line)),
            };
            if PHYECO_MARKERS.contains(&marker_id) {
                pangenes.push(pangene_id.to_string());
            }
        }
        Ok(Self { pangenes })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = open_text_reader(path)?;
        Self::from_reader(reader).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn len(&self) -> usize {
        self.pangenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pangenes.is_empty()
    }

    /// Median marker coverage. Markers never covered count as zero; `None` without markers.
    pub fn baseline(&self, coverage: &PangeneCoverage) -> Option<f64> {
        let marker_covs: Vec<f64> = self
            .pangenes
            .iter()
            .map(|id| coverage.get(id).unwrap_or(0.0))
            .collect();
        median(&marker_covs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CopyNumberRow {
    pub pangene_id: String,
    pub coverage: f64,
    pub copy_number: f64,
}

/// Copy number of every pangene relative to `baseline`, sorted by pangene id.
///
/// A non-positive baseline yields copy number 0 for every pangene.
pub fn copy_numbers(coverage: &PangeneCoverage, baseline: f64) -> Vec<CopyNumberRow> {
    coverage
        .iter()
        .sorted_unstable_by(|a, b| a.0.cmp(b.0))
        .map(|(pangene_id, cov)| CopyNumberRow {
            pangene_id: pangene_id.to_string(),
            coverage: cov,
            copy_number: if baseline > 0.0 { cov / baseline } else { 0.0 },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn coverage(entries: &[(&str, f64)]) -> PangeneCoverage {
        let mut cov = PangeneCoverage::default();
        for (id, amount) in entries {
            cov.add(id, *amount);
        }
        cov
    }

    #[test]
    fn reads_only_universal_markers() {
        let data = "pangene\tphyeco_id\np1\tB000039\np2\tB999999\np3\tB000114\n";
        let markers = MarkerSet::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(markers, MarkerSet::new(vec!["p1".into(), "p3".into()]));
    }

    #[test]
    fn rejects_single_column_rows() {
        let data = "pangene\tphyeco_id\np1\n";
        assert!(MarkerSet::from_reader(Cursor::new(data)).is_err());
    }

    #[test]
    fn baseline_is_median_with_missing_markers_as_zero() {
        let markers = MarkerSet::new(vec!["m1".into(), "m2".into(), "m3".into()]);
        let cov = coverage(&[("m1", 10.0), ("m2", 4.0), ("other", 100.0)]);
        assert_eq!(markers.baseline(&cov), Some(4.0));
        assert_eq!(MarkerSet::default().baseline(&cov), None);
    }

    #[test]
    fn copy_numbers_sorted_and_normalized() {
        let cov = coverage(&[("p2", 8.0), ("p1", 2.0)]);
        let rows = copy_numbers(&cov, 4.0);
        assert_eq!(
            rows,
            vec![
                CopyNumberRow {
                    pangene_id: "p1".into(),
                    coverage: 2.0,
                    copy_number: 0.5
                },
                CopyNumberRow {
                    pangene_id: "p2".into(),
                    coverage: 8.0,
                    copy_number: 2.0
                },
            ]
        );
    }

    #[test]
    fn zero_baseline_gives_zero_copy_numbers() {
        let cov = coverage(&[("p1", 3.0), ("p2", 0.0)]);
        let rows = copy_numbers(&cov, 0.0);
        assert!(rows.iter().all(|r| r.copy_number == 0.0));
        assert!(rows.iter().all(|r| !r.copy_number.is_nan()));
    }
}
