//! File-system layout of the output and reference-database directories.
//!
use crate::utils::Result;
use itertools::Itertools;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Layout {
    out_dir: PathBuf,
    db_dir: PathBuf,
}

impl Layout {
    pub fn new(out_dir: impl Into<PathBuf>, db_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            db_dir: db_dir.into(),
        }
    }

    pub fn abundance_table(&self) -> PathBuf {
        self.out_dir.join("genome_clusters.abundance")
    }

    pub fn cluster_db_dir(&self, cluster_id: &str) -> PathBuf {
        self.db_dir.join(cluster_id)
    }

    pub fn gene_to_pangene_bed(&self, cluster_id: &str) -> PathBuf {
        self.cluster_db_dir(cluster_id).join("gene_to_pangene.bed")
    }

    pub fn pangene_to_phyeco(&self, cluster_id: &str) -> PathBuf {
        self.cluster_db_dir(cluster_id).join("pangene_to_phyeco.gz")
    }

    pub fn genome_to_scaffold(&self, cluster_id: &str) -> PathBuf {
        self.cluster_db_dir(cluster_id).join("genome_to_scaffold.gz")
    }

    pub fn aligned_dir(&self) -> PathBuf {
        self.out_dir.join("bam")
    }

    pub fn aligned_bam(&self, cluster_id: &str, batch: usize) -> PathBuf {
        self.aligned_dir().join(batch_file_name(cluster_id, batch))
    }

    pub fn reassigned_dir(&self) -> PathBuf {
        self.out_dir.join("reassigned")
    }

    pub fn reassigned_bam(&self, cluster_id: &str, batch: usize) -> PathBuf {
        self.reassigned_dir().join(batch_file_name(cluster_id, batch))
    }

    pub fn coverage_dir(&self) -> PathBuf {
        self.out_dir.join("coverage")
    }

    pub fn fastq_dir(&self) -> PathBuf {
        self.out_dir.join("fastq")
    }

    pub fn pileup_vcf(&self, cluster_id: &str) -> PathBuf {
        self.out_dir.join("vcf").join(format!("{}.vcf", cluster_id))
    }

    pub fn snps_dir(&self) -> PathBuf {
        self.out_dir.join("snps")
    }
}

pub fn batch_file_name(cluster_id: &str, batch: usize) -> String {
    format!("{}.{}.bam", cluster_id, batch)
}

/// Splits `<cluster>.<batch>.bam` into its cluster id and batch index.
pub fn parse_batch_file_name(file_name: &str) -> Option<(&str, usize)> {
    let stem = file_name.strip_suffix(".bam")?;
    let (cluster_id, batch) = stem.rsplit_once('.')?;
    if cluster_id.is_empty() {
        return None;
    }
    Some((cluster_id, batch.parse().ok()?))
}

/// Batch indexes present in a directory of per-batch BAM files, ascending.
pub fn discover_batches(dir: &Path) -> Result<Vec<usize>> {
    let entries =
        fs::read_dir(dir).map_err(|e| format!("Failed to list {}: {}", dir.display(), e))?;
    let mut batches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| e.to_string())?;
        let file_name = entry.file_name();
        match parse_batch_file_name(&file_name.to_string_lossy()) {
            Some((_, batch)) => batches.push(batch),
            None => log::debug!("Ignoring {}", entry.path().display()),
        }
    }
    Ok(batches.into_iter().sorted().dedup().collect())
}
