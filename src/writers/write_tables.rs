//! Gzipped tab-delimited output tables.
//!
use crate::coverage::CopyNumberRow;
use crate::snps::AlleleCall;
use crate::utils::Result;
use flate2::{write::GzEncoder, Compression};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

struct GzTable {
    path: PathBuf,
    encoder: GzEncoder<BufWriter<File>>,
}

impl GzTable {
    fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        Ok(Self {
            path: path.to_path_buf(),
            encoder: GzEncoder::new(BufWriter::new(file), Compression::default()),
        })
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.encoder, "{}", line).map_err(|e| format!("{}: {}", self.path.display(), e))
    }

    fn finish(self) -> Result<()> {
        let path = self.path;
        self.encoder
            .finish()
            .and_then(|mut w| w.flush())
            .map_err(|e| format!("{}: {}", path.display(), e))
    }
}

/// Per-cluster `<cluster>.cov.gz`: `pangene_id coverage copy_number`, no header.
pub struct CoverageTableWriter {
    table: GzTable,
}

impl CoverageTableWriter {
    pub fn new(path: &Path) -> Result<Self> {
        Ok(Self {
            table: GzTable::create(path)?,
        })
    }

    pub fn write_all(mut self, rows: &[CopyNumberRow]) -> Result<()> {
        for row in rows {
            self.table.write_line(&format!(
                "{}\t{}\t{}",
                row.pangene_id, row.coverage, row.copy_number
            ))?;
        }
        self.table.finish()
    }
}

/// Per-cluster `<cluster>.snps.gz` with a header line.
pub struct AlleleTableWriter {
    table: GzTable,
}

impl AlleleTableWriter {
    pub const HEADER: [&'static str; 10] = [
        "ref_id",
        "ref_pos",
        "ref_allele",
        "alt_allele",
        "cons_allele",
        "count_alleles",
        "count_ref",
        "count_alt",
        "depth",
        "ref_freq",
    ];

    pub fn new(path: &Path) -> Result<Self> {
        let mut table = GzTable::create(path)?;
        table.write_line(&Self::HEADER.join("\t"))?;
        Ok(Self { table })
    }

    pub fn write(&mut self, call: &AlleleCall) -> Result<()> {
        self.table.write_line(&call.to_row())
    }

    pub fn finish(self) -> Result<()> {
        self.table.finish()
    }
}
