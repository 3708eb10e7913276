//! Masking of alignments to a read's own source genome, for simulated benchmarks.
//!

use super::alignment::ReadPairUnit;
use crate::utils::{open_text_reader, CnvError, Result};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct TaxMask {
    run_to_genome: HashMap<String, String>,
    scaffold_to_genome: HashMap<String, String>,
}

impl TaxMask {
    pub fn new(
        run_to_genome: HashMap<String, String>,
        scaffold_to_genome: HashMap<String, String>,
    ) -> Self {
        Self {
            run_to_genome,
            scaffold_to_genome,
        }
    }

    /// Loads the `run_accession<TAB>genome_id` truth map and every cluster's
    /// `genome_id<TAB>scaffold_id` table.
    pub fn from_paths(tax_map: &Path, genome_to_scaffold: &[PathBuf]) -> Result<Self> {
        let run_to_genome = read_pairs(open_text_reader(tax_map)?, false)
            .map_err(|e| format!("{}: {}", tax_map.display(), e))?;
        let mut scaffold_to_genome = HashMap::new();
        for path in genome_to_scaffold {
            if !path.exists() {
                log::warn!("Scaffold map not found: {}", path.display());
                continue;
            }
            let map = read_pairs(open_text_reader(path)?, true)
                .map_err(|e| format!("{}: {}", path.display(), e))?;
            scaffold_to_genome.extend(map);
        }
        log::debug!(
            "Loaded {} read sources and {} scaffolds for masking",
            run_to_genome.len(),
            scaffold_to_genome.len()
        );
        Ok(Self::new(run_to_genome, scaffold_to_genome))
    }

    /// True when the unit aligned to a scaffold of the genome the read was simulated from.
    pub fn is_masked(&self, unit: &ReadPairUnit) -> bool {
        let read_genome = self.run_to_genome.get(run_accession(unit.read_id()));
        let scaffold_genome = self.scaffold_to_genome.get(unit.reference_id());
        match (read_genome, scaffold_genome) {
            (Some(read), Some(scaffold)) => read == scaffold,
            _ => false,
        }
    }
}

/// Simulated read names are `<run_accession>.<n>`.
pub fn run_accession(read_id: &str) -> &str {
    read_id.split('.').next().unwrap_or(read_id)
}

fn read_pairs<R: BufRead>(
    reader: R,
    swap: bool,
) -> std::result::Result<HashMap<String, String>, CnvError> {
    let mut map = HashMap::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            CnvError::malformed(format!("read error at line {}", line_number + 1), e.to_string())
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let (first, second) = line.trim_end().split_once('\t').ok_or_else(|| {
            CnvError::malformed(format!("expected two columns at line {}", line_number + 1), &line)
        })?;
        if swap {
            map.insert(second.to_string(), first.to_string());
        } else {
            map.insert(first.to_string(), second.to_string());
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reassign::alignment::test_utils::make_record;
    use std::io::Cursor;

    fn unit(read_id: &str, scaffold: &str) -> ReadPairUnit {
        let mut rec = make_record(read_id, "gc1", 100, 0);
        rec.reference_id = scaffold.to_string();
        ReadPairUnit::new(0, vec![rec]).unwrap()
    }

    #[test]
    fn test_run_accession() {
        assert_eq!(run_accession("SRR123.45"), "SRR123");
        assert_eq!(run_accession("SRR123"), "SRR123");
    }

    #[test]
    fn masks_alignments_to_source_genome() {
        let runs = read_pairs(Cursor::new("SRR1\tg1\nSRR2\tg2\n"), false).unwrap();
        let scaffolds = read_pairs(Cursor::new("g1\tscaf1\ng2\tscaf2\n"), true).unwrap();
        let mask = TaxMask::new(runs, scaffolds);
        assert!(mask.is_masked(&unit("SRR1.7", "scaf1")));
        assert!(!mask.is_masked(&unit("SRR1.7", "scaf2")));
        assert!(!mask.is_masked(&unit("SRR3.1", "scaf1")));
        assert!(!mask.is_masked(&unit("SRR2.1", "unknown")));
    }

    #[test]
    fn rejects_single_column_lines() {
        assert!(read_pairs(Cursor::new("SRR1 g1\n"), false).is_err());
    }
}
