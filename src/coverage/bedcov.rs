//! Parsing of the per-gene overlap lines emitted by the coverage tool.
//!

use super::pangene::PangeneCoverage;
use crate::utils::CnvError;
use std::io::BufRead;

/// Reads overlapping one gene interval of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapRecord {
    pub sequence_id: String,
    pub start: u64,
    pub end: u64,
    pub gene_id: String,
    pub pangene_id: String,
    pub read_count: u64,
    pub covered_positions: u64,
    pub gene_length: u64,
    pub fraction_covered: f64,
}

impl OverlapRecord {
    pub fn from_line(line: &str) -> Result<Self, CnvError> {
        const EXPECTED_FIELD_COUNT: usize = 9;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != EXPECTED_FIELD_COUNT {
            return Err(CnvError::malformed(
                format!(
                    "expected {} coverage fields, found {}",
                    EXPECTED_FIELD_COUNT,
                    fields.len()
                ),
                line,
            ));
        }
        let int = |index: usize, name: &str| {
            fields[index]
                .parse::<u64>()
                .map_err(|_| CnvError::malformed(format!("invalid {}", name), line))
        };

        let gene_length = int(7, "gene length")?;
        if gene_length == 0 {
            return Err(CnvError::malformed("zero gene length", line));
        }
        let fraction_covered = fields[8]
            .parse::<f64>()
            .map_err(|_| CnvError::malformed("invalid fraction covered", line))?;

        Ok(Self {
            sequence_id: fields[0].to_string(),
            start: int(1, "start")?,
            end: int(2, "end")?,
            gene_id: fields[3].to_string(),
            pangene_id: fields[4].to_string(),
            read_count: int(5, "read count")?,
            covered_positions: int(6, "covered positions")?,
            gene_length,
            fraction_covered,
        })
    }

    /// Read depth this gene contributes, given the batch's mean read length.
    pub fn coverage(&self, read_length: f64) -> f64 {
        self.read_count as f64 * read_length / self.gene_length as f64
    }
}

/// Folds every overlap line of `reader` into `coverage`, returning the number of lines used.
///
/// The first malformed line aborts the fold; the caller discards the partial result.
pub fn accumulate_overlaps<R: BufRead>(
    reader: R,
    read_length: f64,
    coverage: &mut PangeneCoverage,
) -> Result<usize, CnvError> {
    let mut num_records = 0;
    for line in reader.lines() {
        let line = line
            .map_err(|e| CnvError::malformed("unreadable coverage output", e.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = OverlapRecord::from_line(&line)?;
        coverage.add(&record.pangene_id, record.coverage(read_length));
        num_records += 1;
    }
    Ok(num_records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_overlap_line() {
        let record =
            OverlapRecord::from_line("scaf1\t0\t1000\tgene1\tpan1\t10\t800\t1000\t0.8").unwrap();
        assert_eq!(record.pangene_id, "pan1");
        assert_eq!(record.read_count, 10);
        assert_eq!(record.gene_length, 1000);
        assert_eq!(record.coverage(100.0), 1.0);
    }

    #[test]
    fn rejects_zero_gene_length() {
        let err = OverlapRecord::from_line("scaf1\t0\t0\tgene1\tpan1\t10\t0\t0\t0.0").unwrap_err();
        assert!(
            matches!(err, CnvError::MalformedRecord { ref reason, .. } if reason == "zero gene length")
        );
    }

    #[test]
    fn rejects_short_or_unparseable_lines() {
        assert!(OverlapRecord::from_line("scaf1\t0\t1000\tgene1\tpan1\t10").is_err());
        assert!(
            OverlapRecord::from_line("scaf1\t0\t1000\tgene1\tpan1\tten\t800\t1000\t0.8").is_err()
        );
    }

    #[test]
    fn accumulates_genes_of_same_pangene() {
        let data = "\
scaf1\t0\t1000\tgene1\tpan1\t10\t800\t1000\t0.8
scaf1\t1000\t1500\tgene2\tpan1\t5\t500\t500\t1.0

scaf2\t0\t200\tgene3\tpan2\t0\t0\t200\t0.0
";
        let mut coverage = PangeneCoverage::default();
        let used = accumulate_overlaps(Cursor::new(data), 100.0, &mut coverage).unwrap();
        assert_eq!(used, 3);
        assert_eq!(coverage.get("pan1"), Some(2.0));
        assert_eq!(coverage.get("pan2"), Some(0.0));
    }
}
