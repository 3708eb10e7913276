//! Per-cluster coverage: run the coverage tool over every batch, merge, normalize.
//!

use super::{
    markers::{copy_numbers, CopyNumberRow, MarkerSet},
    pangene::PangeneCoverage,
    read_length::estimate_read_length,
    tool::CoverageTool,
};
use crate::utils::{CnvError, Layout, Result};
use rayon::prelude::*;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CoverageParams {
    pub tool: CoverageTool,
    /// Alignments sampled per batch when estimating read length.
    pub max_read_samples: usize,
}

/// Mean read length of each batch, measured on the aligner output of the given clusters.
///
/// Batches without any alignment are dropped with a warning.
pub fn batch_read_lengths(
    layout: &Layout,
    cluster_ids: &[String],
    batches: &[usize],
    params: &CoverageParams,
) -> Result<Vec<(usize, f64)>> {
    let mut read_lengths = Vec::with_capacity(batches.len());
    for &batch in batches {
        let bam_paths: Vec<PathBuf> = cluster_ids
            .iter()
            .map(|id| layout.aligned_bam(id, batch))
            .collect();
        match estimate_read_length(&bam_paths, params.max_read_samples)? {
            Some(read_length) => {
                log::debug!("Batch {}: mean read length {:.1}", batch, read_length);
                read_lengths.push((batch, read_length));
            }
            None => log::warn!("Batch {}: no alignments to estimate read length, skipping", batch),
        }
    }
    Ok(read_lengths)
}

/// Pangene coverage of one cluster summed over batches.
///
/// Missing batch files are skipped with a warning. A batch whose tool run fails
/// fails the whole cluster, so no table is built from the remaining batches.
pub fn cluster_coverage(
    layout: &Layout,
    cluster_id: &str,
    read_lengths: &[(usize, f64)],
    params: &CoverageParams,
) -> Result<PangeneCoverage> {
    let bed = layout.gene_to_pangene_bed(cluster_id);
    if !bed.exists() {
        return Err(CnvError::Configuration {
            cluster_id: cluster_id.to_string(),
            reason: format!("gene map not found: {}", bed.display()),
        }
        .into());
    }

    let coverage = read_lengths
        .par_iter()
        .filter_map(|&(batch, read_length)| {
            let bam = layout.reassigned_bam(cluster_id, batch);
            if !bam.exists() {
                log::warn!(
                    "{}",
                    CnvError::MissingInput {
                        cluster_id: cluster_id.to_string(),
                        batch,
                        path: bam.display().to_string(),
                    }
                );
                return None;
            }
            let batch_coverage = params
                .tool
                .batch_coverage(&bam, &bed, read_length)
                .map_err(|e| format!("Cluster {} batch {}: {}", cluster_id, batch, e));
            Some(batch_coverage)
        })
        .try_reduce(PangeneCoverage::default, |a, b| Ok(a.merge(b)))?;
    Ok(coverage)
}

/// Copy-number rows of one cluster, normalized by its marker baseline.
pub fn normalize_cluster(
    cluster_id: &str,
    coverage: &PangeneCoverage,
    markers: &MarkerSet,
) -> std::result::Result<Vec<CopyNumberRow>, CnvError> {
    let baseline = markers
        .baseline(coverage)
        .ok_or_else(|| CnvError::Configuration {
            cluster_id: cluster_id.to_string(),
            reason: "no universal marker genes, copy number is undefined".to_string(),
        })?;
    log::debug!("Cluster {}: marker baseline {:.3}", cluster_id, baseline);
    Ok(copy_numbers(coverage, baseline))
}
