use crate::utils::{math::mean, open_bam_reader, Result};
use rust_htslib::bam::{self, Read};
use std::path::PathBuf;

/// At most this many alignments are sampled per batch.
pub const MAX_READ_LENGTH_SAMPLES: usize = 50_000;

/// Mean query length over the first `max_reads` alignments of the given BAM files.
///
/// Files that do not exist are skipped. Returns `None` when no alignment was seen.
pub fn estimate_read_length(bam_paths: &[PathBuf], max_reads: usize) -> Result<Option<f64>> {
    let mut lengths = Vec::new();
    let mut record = bam::Record::new();
    for path in bam_paths.iter().filter(|p| p.exists()) {
        if lengths.len() >= max_reads {
            break;
        }
        let mut reader = open_bam_reader(path)?;
        while lengths.len() < max_reads {
            match reader.read(&mut record) {
                None => break,
                Some(Ok(())) => lengths.push(record.seq_len() as f64),
                Some(Err(e)) => return Err(format!("{}: {}", path.display(), e)),
            }
        }
    }
    Ok(mean(&lengths))
}
