use super::initialize_thread_pool;
use crate::cli::SnpsArgs;
use crate::clusters::{load_clusters, sorted_cluster_ids};
use crate::snps::allele_calls;
use crate::utils::{create_writer, open_text_reader, Layout, Result};
use crate::writers::AlleleTableWriter;
use rayon::prelude::*;
use std::fs;

pub fn snps(args: SnpsArgs) -> Result<()> {
    let layout = Layout::new(&args.common.out_dir, &args.common.db_dir);
    let priors = load_clusters(&layout, &args.selection.selection())?;
    let cluster_ids = sorted_cluster_ids(&priors);

    let pool = initialize_thread_pool(args.common.num_threads)?;
    let num_written: usize = pool.install(|| {
        cluster_ids
            .par_iter()
            .map(|cluster_id| match call_cluster(&layout, cluster_id) {
                Ok(Some(num_sites)) => {
                    log::info!("Cluster {}: {} sites", cluster_id, num_sites);
                    1
                }
                Ok(None) => 0,
                Err(e) => {
                    log::error!("Cluster {}: {}", cluster_id, e);
                    0
                }
            })
            .sum()
    });

    log::info!(
        "Wrote allele tables for {} of {} genome-clusters",
        num_written,
        cluster_ids.len()
    );
    Ok(())
}

/// Converts `<out>/vcf/<cluster>.vcf` into `<out>/snps/<cluster>.snps.gz`.
///
/// Returns `None` when the cluster has no pileup.
fn call_cluster(layout: &Layout, cluster_id: &str) -> Result<Option<usize>> {
    let vcf_path = layout.pileup_vcf(cluster_id);
    if !vcf_path.exists() {
        log::warn!(
            "Cluster {}: pileup not found: {}",
            cluster_id,
            vcf_path.display()
        );
        return Ok(None);
    }

    let reader = open_text_reader(&vcf_path)?;
    let snps_dir = layout.snps_dir();
    let file_name = format!("{}.snps.gz", cluster_id);
    let mut writer = create_writer(&snps_dir, &file_name, AlleleTableWriter::new)?;
    let mut num_sites = 0;
    for call in allele_calls(reader) {
        let written = call
            .map_err(|e| format!("{}: {}", vcf_path.display(), e))
            .and_then(|call| writer.write(&call));
        if let Err(e) = written {
            let _ = fs::remove_file(snps_dir.join(&file_name));
            return Err(e);
        }
        num_sites += 1;
    }
    writer.finish()?;
    Ok(Some(num_sites))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;

    const VCF: &str = "\
##fileformat=VCFv4.1
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
scaf1\t10\t.\tA\tT,<X>\t0\t.\tDP=20;I16=10,8,1,1,0,0,0,0,0,0,0,0,0,0,0,0
scaf1\t11\t.\tC\t<X>\t0\t.\tDP=0;I16=0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0
";

    #[test]
    fn writes_allele_table() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path().join("out"), dir.path().join("db"));
        fs::create_dir_all(layout.pileup_vcf("c1").parent().unwrap()).unwrap();
        fs::write(layout.pileup_vcf("c1"), VCF).unwrap();

        assert_eq!(call_cluster(&layout, "c1").unwrap(), Some(2));
        let reader = open_text_reader(&layout.snps_dir().join("c1.snps.gz")).unwrap();
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], AlleleTableWriter::HEADER.join("\t"));
        assert_eq!(lines[1], "scaf1\t10\tA\tT\tA\t2\t18\t2\t20\t0.9");
        assert_eq!(lines[2], "scaf1\t11\tC\tNA\tNA\t1\t0\t0\t0\tNA");
    }

    #[test]
    fn missing_pileup_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path().join("out"), dir.path().join("db"));
        assert_eq!(call_cluster(&layout, "c1").unwrap(), None);
    }

    #[test]
    fn malformed_pileup_fails_cluster() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path().join("out"), dir.path().join("db"));
        fs::create_dir_all(layout.pileup_vcf("c1").parent().unwrap()).unwrap();
        fs::write(layout.pileup_vcf("c1"), "scaf1\t10\t.\tA\tT\n").unwrap();
        assert!(call_cluster(&layout, "c1").is_err());
        assert!(!layout.snps_dir().join("c1.snps.gz").exists());
    }
}
