//! Per-batch reassignment workflow: score every cluster's alignments, resolve, write.
//!

use super::{
    alignment::{AlignmentRecord, ReadPairUnit, ReadPairs},
    best_hits::{AssignedRead, BestHitResolver, TieSummary},
    mask::TaxMask,
};
use crate::clusters::ClusterPriors;
use crate::utils::{batch_file_name, create_writer, open_bam_reader, CnvError, Layout, Result};
use crate::writers::ReassignedBamWriter;
use rand::{rngs::StdRng, SeedableRng};
use rust_htslib::bam::{self, Read};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

pub struct MapParams {
    /// Minimum percent identity of an alignment to compete.
    pub pid_min: f64,
    pub seed: u64,
}

impl MapParams {
    /// Each batch gets its own generator so batches can run in any order.
    fn batch_rng(&self, batch: usize) -> StdRng {
        StdRng::seed_from_u64(self.seed.wrapping_add(batch as u64))
    }
}

#[derive(Debug)]
pub struct BatchAssignment {
    pub batch: usize,
    /// Read id to the cluster it was committed to.
    pub assigned: HashMap<String, AssignedRead>,
    pub summary: TieSummary,
}

impl BatchAssignment {
    /// Stream positions of the units committed to `cluster_id`.
    pub fn ordinals_for(&self, cluster_id: &str) -> HashSet<usize> {
        self.assigned
            .values()
            .filter(|read| read.cluster_id == cluster_id)
            .map(|read| read.unit.ordinal)
            .collect()
    }
}

/// Finds the best hit of every read in `batch` across the aligner output of all clusters.
pub fn find_best_hits(
    layout: &Layout,
    cluster_ids: &[String],
    priors: &ClusterPriors,
    batch: usize,
    params: &MapParams,
    mask: Option<&TaxMask>,
) -> Result<BatchAssignment> {
    let mut resolver = BestHitResolver::new(params.pid_min);
    for cluster_id in cluster_ids {
        let bam_path = layout.aligned_bam(cluster_id, batch);
        if !bam_path.exists() {
            log::warn!(
                "{}",
                CnvError::MissingInput {
                    cluster_id: cluster_id.clone(),
                    batch,
                    path: bam_path.display().to_string(),
                }
            );
            continue;
        }
        let (num_units, num_masked) = offer_cluster(&bam_path, cluster_id, &mut resolver, mask)?;
        log::debug!(
            "Batch {}: {} read units from cluster {} ({} masked)",
            batch,
            num_units,
            cluster_id,
            num_masked
        );
    }

    let mut rng = params.batch_rng(batch);
    let (assigned, summary) = resolver.resolve(priors, &mut rng);
    Ok(BatchAssignment {
        batch,
        assigned,
        summary,
    })
}

fn offer_cluster(
    bam_path: &Path,
    cluster_id: &str,
    resolver: &mut BestHitResolver,
    mask: Option<&TaxMask>,
) -> Result<(usize, usize)> {
    let mut reader = open_bam_reader(bam_path)?;
    let header = reader.header().clone();
    let records = reader
        .records()
        .map(|r| r.map_err(|e| format!("{}: {}", bam_path.display(), e)));

    let mut num_units = 0;
    let mut num_masked = 0;
    for (ordinal, group) in ReadPairs::new(records).enumerate() {
        let group = group?;
        let records = group
            .iter()
            .map(|rec| AlignmentRecord::from_hts_rec(rec, &header, cluster_id))
            .collect::<std::result::Result<Vec<_>, CnvError>>()?;
        let unit = ReadPairUnit::new(ordinal, records)?;
        num_units += 1;
        if mask.is_some_and(|m| m.is_masked(&unit)) {
            num_masked += 1;
            continue;
        }
        resolver.offer(unit)?;
    }
    Ok((num_units, num_masked))
}

/// Writes, per cluster, the aligner records of the units committed to that cluster.
pub fn write_best_hits(
    layout: &Layout,
    cluster_ids: &[String],
    assignment: &BatchAssignment,
) -> Result<()> {
    for cluster_id in cluster_ids {
        let bam_path = layout.aligned_bam(cluster_id, assignment.batch);
        if !bam_path.exists() {
            continue;
        }
        let ordinals = assignment.ordinals_for(cluster_id);

        let mut reader = open_bam_reader(&bam_path)?;
        let header = bam::Header::from_template(reader.header());
        let mut writer = create_writer(
            &layout.reassigned_dir(),
            &batch_file_name(cluster_id, assignment.batch),
            |path| ReassignedBamWriter::new(path, header),
        )?;

        let records = reader
            .records()
            .map(|r| r.map_err(|e| format!("{}: {}", bam_path.display(), e)));
        for (ordinal, group) in ReadPairs::new(records).enumerate() {
            let group = group?;
            if ordinals.contains(&ordinal) {
                for rec in &group {
                    writer.write(rec)?;
                }
            }
        }
        let num_written = writer.finish()?;
        log::debug!(
            "Batch {}: wrote {} alignments for cluster {}",
            assignment.batch,
            num_written,
            cluster_id
        );
    }
    Ok(())
}

/// Removes every reassigned BAM (final or temporary) of `batch`.
pub fn discard_batch(layout: &Layout, cluster_ids: &[String], batch: usize) {
    for cluster_id in cluster_ids {
        let bam_path = layout.reassigned_bam(cluster_id, batch);
        for path in [bam_path.with_extension("bam.tmp"), bam_path] {
            if path.exists() {
                if let Err(e) = fs::remove_file(&path) {
                    log::warn!("Failed to remove {}: {}", path.display(), e);
                }
            }
        }
    }
}
