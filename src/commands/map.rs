use super::initialize_thread_pool;
use crate::cli::MapArgs;
use crate::clusters::{load_clusters, sorted_cluster_ids, ClusterPriors};
use crate::reassign::{discard_batch, find_best_hits, write_best_hits, MapParams, TaxMask};
use crate::utils::{discover_batches, Layout, Result};
use rayon::prelude::*;
use std::path::PathBuf;

pub fn map(args: MapArgs) -> Result<()> {
    let layout = Layout::new(&args.common.out_dir, &args.common.db_dir);
    let priors = load_clusters(&layout, &args.selection.selection())?;
    let cluster_ids = sorted_cluster_ids(&priors);

    let mask = if args.tax_mask {
        let tax_map = args
            .tax_map
            .as_ref()
            .ok_or("--tax-mask requires --tax-map")?;
        let scaffold_maps: Vec<PathBuf> = cluster_ids
            .iter()
            .map(|id| layout.genome_to_scaffold(id))
            .collect();
        Some(TaxMask::from_paths(tax_map, &scaffold_maps)?)
    } else {
        None
    };

    let params = MapParams {
        pid_min: args.pid_min,
        seed: args.seed,
    };

    let aligned_dir = layout.aligned_dir();
    if !aligned_dir.is_dir() {
        return Err(format!(
            "Could not locate aligned reads: {}",
            aligned_dir.display()
        ));
    }
    let batches = discover_batches(&aligned_dir)?;
    if batches.is_empty() {
        return Err(format!("No alignment batches in {}", aligned_dir.display()));
    }
    log::info!(
        "Reassigning reads from {} batches across {} genome-clusters",
        batches.len(),
        cluster_ids.len()
    );

    let pool = initialize_thread_pool(args.common.num_threads)?;
    let num_failed = pool.install(|| {
        batches
            .par_iter()
            .filter(|&&batch| {
                let result =
                    process_batch(&layout, &cluster_ids, &priors, batch, &params, mask.as_ref());
                match result {
                    Ok(()) => false,
                    Err(e) => {
                        log::error!("Batch {}: {}", batch, e);
                        discard_batch(&layout, &cluster_ids, batch);
                        true
                    }
                }
            })
            .count()
    });

    if num_failed == batches.len() {
        return Err("Reassignment failed for every batch".into());
    }
    if num_failed > 0 {
        log::warn!("{} of {} batches failed", num_failed, batches.len());
    }
    Ok(())
}

fn process_batch(
    layout: &Layout,
    cluster_ids: &[String],
    priors: &ClusterPriors,
    batch: usize,
    params: &MapParams,
    mask: Option<&TaxMask>,
) -> Result<()> {
    let assignment = find_best_hits(layout, cluster_ids, priors, batch, params, mask)?;
    assignment.summary.log(batch);
    write_best_hits(layout, cluster_ids, &assignment)
}
