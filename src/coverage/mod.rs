mod bedcov;
mod cluster;
mod markers;
mod pangene;
mod read_length;
mod tool;

pub use bedcov::{accumulate_overlaps, OverlapRecord};
pub use cluster::{batch_read_lengths, cluster_coverage, normalize_cluster, CoverageParams};
pub use markers::{copy_numbers, CopyNumberRow, MarkerSet, PHYECO_MARKERS};
pub use pangene::PangeneCoverage;
pub use read_length::{estimate_read_length, MAX_READ_LENGTH_SAMPLES};
pub use tool::CoverageTool;
