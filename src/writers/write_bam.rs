//! Defines the `ReassignedBamWriter` used to store the reads committed to one cluster.
//!
use crate::cli;
use crate::utils::Result;
use rust_htslib::bam::{self, header::HeaderRecord};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes the alignments of reassigned reads for one (cluster, batch).
///
/// Records go to a temporary file that is only moved into place by [`finish`], so an
/// aborted batch never leaves a partial BAM under the final name.
///
/// [`finish`]: ReassignedBamWriter::finish
pub struct ReassignedBamWriter {
    writer: bam::Writer,
    tmp_path: PathBuf,
    output_path: PathBuf,
    num_written: usize,
}

impl ReassignedBamWriter {
    /// Constructs a new `ReassignedBamWriter`.
    ///
    /// # Arguments
    /// * `output_bam_path` - Final path of the output BAM file.
    /// * `template_header` - Header of the aligner BAM the records come from.
    pub fn new(output_bam_path: &Path, template_header: bam::Header) -> Result<Self> {
        let header = Self::create_header(template_header);
        let tmp_path = output_bam_path.with_extension("bam.tmp");
        let writer = bam::Writer::from_path(&tmp_path, &header, bam::Format::Bam)
            .map_err(|e| format!("{}: {}", tmp_path.display(), e))?;
        Ok(Self {
            writer,
            tmp_path,
            output_path: output_bam_path.to_path_buf(),
            num_written: 0,
        })
    }

    fn create_header(template_header: bam::Header) -> bam::Header {
        let mut header = template_header;
        let args: Vec<String> = env::args().collect();
        let command_line = args.join(" ");

        let mut record = HeaderRecord::new(b"PG");
        record.push_tag(b"ID", env!("CARGO_PKG_NAME"));
        record.push_tag(b"PN", env!("CARGO_PKG_NAME"));
        record.push_tag(b"CL", command_line);
        record.push_tag(b"VN", (*cli::FULL_VERSION).to_string());
        header.push_record(&record);

        header
    }

    pub fn write(&mut self, record: &bam::Record) -> Result<()> {
        self.writer
            .write(record)
            .map_err(|e| format!("{}: {}", self.tmp_path.display(), e))?;
        self.num_written += 1;
        Ok(())
    }

    /// Closes the file and moves it to its final name, returning the number of records written.
    pub fn finish(self) -> Result<usize> {
        let Self {
            writer,
            tmp_path,
            output_path,
            num_written,
        } = self;
        drop(writer);
        fs::rename(&tmp_path, &output_path).map_err(|e| {
            format!(
                "Failed to move {} to {}: {}",
                tmp_path.display(),
                output_path.display(),
                e
            )
        })?;
        Ok(num_written)
    }
}
