use super::initialize_thread_pool;
use crate::cli::ExtractArgs;
use crate::clusters::{load_clusters, sorted_cluster_ids};
use crate::utils::{create_writer, discover_batches, open_bam_reader, Layout, Result};
use crate::writers::FastqWriter;
use rayon::prelude::*;
use rust_htslib::bam::{self, Read};
use std::fs;

pub fn extract(args: ExtractArgs) -> Result<()> {
    let layout = Layout::new(&args.common.out_dir, &args.common.db_dir);
    let priors = load_clusters(&layout, &args.selection.selection())?;
    let cluster_ids = sorted_cluster_ids(&priors);

    let reassigned_dir = layout.reassigned_dir();
    if !reassigned_dir.is_dir() {
        return Err(format!(
            "Could not locate reassigned reads: {}",
            reassigned_dir.display()
        ));
    }
    let batches = discover_batches(&reassigned_dir)?;

    let pool = initialize_thread_pool(args.common.num_threads)?;
    pool.install(|| {
        cluster_ids.par_iter().for_each(|cluster_id| {
            match extract_cluster(&layout, cluster_id, &batches) {
                Ok(num_reads) => log::info!("Cluster {}: wrote {} reads", cluster_id, num_reads),
                Err(e) => {
                    log::error!("Cluster {}: {}", cluster_id, e);
                    let _ = fs::remove_file(layout.fastq_dir().join(fastq_name(cluster_id)));
                }
            }
        })
    });
    Ok(())
}

fn fastq_name(cluster_id: &str) -> String {
    format!("{}.fastq.gz", cluster_id)
}

/// Writes every reassigned read of `cluster_id` to `<out>/fastq/<cluster>.fastq.gz`.
///
/// The read index restarts at zero for each batch file.
fn extract_cluster(layout: &Layout, cluster_id: &str, batches: &[usize]) -> Result<usize> {
    let mut writer = create_writer(
        &layout.fastq_dir(),
        &fastq_name(cluster_id),
        FastqWriter::new,
    )?;
    let mut num_reads = 0;
    let mut record = bam::Record::new();
    for &batch in batches {
        let bam_path = layout.reassigned_bam(cluster_id, batch);
        if !bam_path.exists() {
            log::debug!("Cluster {}: no reads in batch {}", cluster_id, batch);
            continue;
        }
        let mut reader = open_bam_reader(&bam_path)?;
        let mut index = 0;
        while let Some(result) = reader.read(&mut record) {
            result.map_err(|e| format!("{}: {}", bam_path.display(), e))?;
            writer.write(&record, index)?;
            index += 1;
        }
        num_reads += index;
    }
    writer.finish()?;
    Ok(num_reads)
}
