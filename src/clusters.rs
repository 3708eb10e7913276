//! Genome-cluster abundance table and selection of the clusters to map against.
//!

use crate::utils::{open_text_reader, CnvError, Layout, Result};
use itertools::Itertools;
use std::collections::HashMap;
use std::io::BufRead;

/// Relative-abundance weight per selected cluster, used as the tie-breaking prior.
pub type ClusterPriors = HashMap<String, f64>;

/// One row of the species profile written by the abundance estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAbundance {
    pub cluster_id: String,
    pub reads: f64,
    pub bp: f64,
    pub rpkg: f64,
    pub coverage: f64,
    pub prop_cov: f64,
    pub rel_abun: f64,
}

impl ClusterAbundance {
    fn from_line(line: &str) -> std::result::Result<Self, CnvError> {
        const EXPECTED_FIELD_COUNT: usize = 7;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < EXPECTED_FIELD_COUNT {
            return Err(CnvError::malformed(
                format!(
                    "expected {} abundance fields, found {}",
                    EXPECTED_FIELD_COUNT,
                    fields.len()
                ),
                line,
            ));
        }
        let parse = |index: usize| {
            fields[index].parse::<f64>().map_err(|_| {
                CnvError::malformed(format!("invalid number '{}'", fields[index]), line)
            })
        };
        Ok(Self {
            cluster_id: fields[0].to_string(),
            reads: parse(1)?,
            bp: parse(2)?,
            rpkg: parse(3)?,
            coverage: parse(4)?,
            prop_cov: parse(5)?,
            rel_abun: parse(6)?,
        })
    }
}

/// Parses the abundance table; the first line is a header.
pub fn read_abundance_table<R: BufRead>(reader: R) -> Result<Vec<ClusterAbundance>> {
    let mut rows = Vec::new();
    for (line_number, line) in reader.lines().enumerate().skip(1) {
        let line = line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(ClusterAbundance::from_line(&line)?);
    }
    Ok(rows)
}

/// How the user restricted the set of clusters.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterSelection {
    All,
    Id(String),
    List(Vec<String>),
    MinCoverage(f64),
    MinRelAbundance(f64),
    TopN(usize),
}

pub fn select_clusters(
    abundances: &[ClusterAbundance],
    selection: &ClusterSelection,
) -> std::result::Result<ClusterPriors, CnvError> {
    let lookup = |cluster_id: &str| {
        abundances
            .iter()
            .find(|a| a.cluster_id == cluster_id)
            .map(|a| (a.cluster_id.clone(), a.rel_abun))
            .ok_or_else(|| CnvError::Configuration {
                cluster_id: cluster_id.to_string(),
                reason: "specified genome-cluster id not found".to_string(),
            })
    };

    let selected: ClusterPriors = match selection {
        ClusterSelection::All => abundances
            .iter()
            .map(|a| (a.cluster_id.clone(), a.rel_abun))
            .collect(),
        ClusterSelection::Id(cluster_id) => [lookup(cluster_id)?].into_iter().collect(),
        ClusterSelection::List(ids) => ids
            .iter()
            .map(|id| lookup(id))
            .collect::<std::result::Result<_, _>>()?,
        ClusterSelection::MinCoverage(min_cov) => abundances
            .iter()
            .filter(|a| a.coverage >= *min_cov)
            .map(|a| (a.cluster_id.clone(), a.rel_abun))
            .collect(),
        ClusterSelection::MinRelAbundance(min_abun) => abundances
            .iter()
            .filter(|a| a.rel_abun >= *min_abun)
            .map(|a| (a.cluster_id.clone(), a.rel_abun))
            .collect(),
        ClusterSelection::TopN(n) => abundances
            .iter()
            .sorted_by(|a, b| b.rel_abun.total_cmp(&a.rel_abun))
            .take(*n)
            .map(|a| (a.cluster_id.clone(), a.rel_abun))
            .collect(),
    };

    if selected.is_empty() {
        return Err(CnvError::NoClustersSelected);
    }
    Ok(selected)
}

/// Reads the abundance table, drops clusters absent from the database and applies `selection`.
pub fn load_clusters(layout: &Layout, selection: &ClusterSelection) -> Result<ClusterPriors> {
    let path = layout.abundance_table();
    if !path.exists() {
        return Err(format!(
            "Could not locate species profile: {}",
            path.display()
        ));
    }
    let abundances = read_abundance_table(open_text_reader(&path)?)?;
    let (present, missing): (Vec<_>, Vec<_>) = abundances
        .into_iter()
        .partition(|a| layout.cluster_db_dir(&a.cluster_id).is_dir());
    for cluster in &missing {
        log::warn!(
            "Genome-cluster {} is missing from the database, skipping",
            cluster.cluster_id
        );
    }

    let priors = select_clusters(&present, selection)?;
    for (cluster_id, abundance) in priors
        .iter()
        .sorted_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)))
    {
        log::info!("cluster_id: {} abundance: {:.2}", cluster_id, abundance);
    }
    Ok(priors)
}

/// Selected cluster ids in a stable order.
pub fn sorted_cluster_ids(priors: &ClusterPriors) -> Vec<String> {
    priors.keys().sorted().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TABLE: &str = "\
cluster_id\treads\tbp\trpkg\tcov\tprop_cov\trel_abun
57955\t1000\t100000\t10.5\t12.0\t0.8\t0.50
56116\t500\t50000\t5.2\t3.0\t0.6\t0.30
59620\t100\t10000\t1.0\t0.5\t0.2\t0.20
";

    fn table() -> Vec<ClusterAbundance> {
        read_abundance_table(Cursor::new(TABLE)).unwrap()
    }

    #[test]
    fn test_read_abundance_table() {
        let rows = table();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].cluster_id, "57955");
        assert_eq!(rows[0].coverage, 12.0);
        assert_eq!(rows[2].rel_abun, 0.2);
    }

    #[test]
    fn test_read_abundance_table_bad_number() {
        let data = "header\n57955\t1\t2\t3\tx\t5\t6\n";
        assert!(read_abundance_table(Cursor::new(data)).is_err());
    }

    #[test]
    fn test_select_all() {
        let priors = select_clusters(&table(), &ClusterSelection::All).unwrap();
        assert_eq!(priors.len(), 3);
        assert_eq!(priors["56116"], 0.3);
    }

    #[test]
    fn test_select_by_id_and_list() {
        let priors = select_clusters(&table(), &ClusterSelection::Id("56116".into())).unwrap();
        assert_eq!(sorted_cluster_ids(&priors), vec!["56116"]);

        let list = ClusterSelection::List(vec!["59620".into(), "57955".into()]);
        let priors = select_clusters(&table(), &list).unwrap();
        assert_eq!(sorted_cluster_ids(&priors), vec!["57955", "59620"]);

        let missing = ClusterSelection::List(vec!["57955".into(), "00000".into()]);
        assert_eq!(
            select_clusters(&table(), &missing),
            Err(CnvError::Configuration {
                cluster_id: "00000".into(),
                reason: "specified genome-cluster id not found".into()
            })
        );
    }

    #[test]
    fn test_select_by_thresholds() {
        let priors = select_clusters(&table(), &ClusterSelection::MinCoverage(3.0)).unwrap();
        assert_eq!(sorted_cluster_ids(&priors), vec!["56116", "57955"]);

        let priors =
            select_clusters(&table(), &ClusterSelection::MinRelAbundance(0.4)).unwrap();
        assert_eq!(sorted_cluster_ids(&priors), vec!["57955"]);

        let priors = select_clusters(&table(), &ClusterSelection::TopN(2)).unwrap();
        assert_eq!(sorted_cluster_ids(&priors), vec!["56116", "57955"]);
    }

    #[test]
    fn test_empty_selection_is_fatal() {
        assert_eq!(
            select_clusters(&table(), &ClusterSelection::MinCoverage(100.0)),
            Err(CnvError::NoClustersSelected)
        );
        assert_eq!(
            select_clusters(&[], &ClusterSelection::All),
            Err(CnvError::NoClustersSelected)
        );
    }

    #[test]
    fn test_load_clusters_prunes_missing_db_dirs() {
        let out = tempfile::tempdir().unwrap();
        let db = tempfile::tempdir().unwrap();
        std::fs::write(out.path().join("genome_clusters.abundance"), TABLE).unwrap();
        std::fs::create_dir(db.path().join("57955")).unwrap();
        std::fs::create_dir(db.path().join("59620")).unwrap();

        let layout = Layout::new(out.path(), db.path());
        let priors = load_clusters(&layout, &ClusterSelection::All).unwrap();
        assert_eq!(sorted_cluster_ids(&priors), vec!["57955", "59620"]);

        let err = load_clusters(&layout, &ClusterSelection::Id("56116".into()));
        assert!(err.is_err());
    }
}
