mod write_bam;
mod write_fastq;
mod write_tables;

pub use write_bam::ReassignedBamWriter;
pub use write_fastq::{encode_qualities, FastqWriter};
pub use write_tables::{AlleleTableWriter, CoverageTableWriter};
