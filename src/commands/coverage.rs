use super::{initialize_thread_pool, CHANNEL_BUFFER_SIZE};
use crate::cli::CovArgs;
use crate::clusters::{load_clusters, sorted_cluster_ids};
use crate::coverage::{
    batch_read_lengths, cluster_coverage, normalize_cluster, CopyNumberRow, CoverageParams,
    CoverageTool, MarkerSet, MAX_READ_LENGTH_SAMPLES,
};
use crate::utils::{create_writer, discover_batches, Layout, Result};
use crate::writers::CoverageTableWriter;
use crossbeam_channel::bounded;
use rayon::prelude::*;
use std::thread;

pub fn coverage(args: CovArgs) -> Result<()> {
    let layout = Layout::new(&args.common.out_dir, &args.common.db_dir);
    let priors = load_clusters(&layout, &args.selection.selection())?;
    let cluster_ids = sorted_cluster_ids(&priors);

    let params = CoverageParams {
        tool: CoverageTool::from_command_line(&args.bedcov)?,
        max_read_samples: MAX_READ_LENGTH_SAMPLES,
    };

    let reassigned_dir = layout.reassigned_dir();
    if !reassigned_dir.is_dir() {
        return Err(format!(
            "Could not locate reassigned reads: {}",
            reassigned_dir.display()
        ));
    }
    let batches = discover_batches(&reassigned_dir)?;
    let read_lengths = batch_read_lengths(&layout, &cluster_ids, &batches, &params)?;
    if read_lengths.is_empty() {
        return Err("No batches with alignments to estimate read length".into());
    }

    let coverage_dir = layout.coverage_dir();
    let (sender_table, receiver_table) =
        bounded::<(String, Vec<CopyNumberRow>)>(CHANNEL_BUFFER_SIZE);
    let writer_thread = thread::spawn(move || {
        let mut num_written = 0;
        for (cluster_id, rows) in &receiver_table {
            let result = create_writer(&coverage_dir, &format!("{}.cov.gz", cluster_id), |path| {
                CoverageTableWriter::new(path)
            })
            .and_then(|writer| writer.write_all(&rows));
            match result {
                Ok(()) => num_written += 1,
                Err(e) => log::error!("Cluster {}: {}", cluster_id, e),
            }
        }
        num_written
    });

    let pool = initialize_thread_pool(args.common.num_threads)?;
    pool.install(|| {
        cluster_ids
            .par_iter()
            .for_each_with(sender_table.clone(), |s, cluster_id| {
                match process_cluster(&layout, cluster_id, &read_lengths, &params) {
                    Ok(rows) => {
                        if let Err(e) = s.send((cluster_id.clone(), rows)) {
                            log::error!("Failed to send coverage table to writer thread: {}", e);
                        }
                    }
                    Err(e) => log::error!("{}", e),
                }
            });
    });

    drop(sender_table);
    let num_written = writer_thread.join().expect("Writer thread panicked");
    log::trace!("Writer thread finished");

    if num_written == 0 {
        return Err("Copy number could not be estimated for any genome-cluster".into());
    }
    log::info!(
        "Wrote coverage tables for {} of {} genome-clusters",
        num_written,
        cluster_ids.len()
    );
    Ok(())
}

fn process_cluster(
    layout: &Layout,
    cluster_id: &str,
    read_lengths: &[(usize, f64)],
    params: &CoverageParams,
) -> Result<Vec<CopyNumberRow>> {
    let coverage = cluster_coverage(layout, cluster_id, read_lengths, params)?;
    let markers = MarkerSet::from_path(&layout.pangene_to_phyeco(cluster_id))?;
    let rows = normalize_cluster(cluster_id, &coverage, &markers)?;
    log::info!(
        "Cluster {}: {} pangenes, {} marker genes",
        cluster_id,
        rows.len(),
        markers.len()
    );
    Ok(rows)
}
