//! Competitive best-hit selection of reads across genome clusters.
//!

use super::{
    alignment::ReadPairUnit,
    sampling::weighted_choice,
    score::{score_unit, AlignmentScore},
};
use crate::clusters::ClusterPriors;
use crate::utils::CnvError;
use itertools::Itertools;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};

/// Best alignments observed so far for one read.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub score: i64,
    /// Every cluster reaching `score`, keyed by cluster id.
    pub alternatives: BTreeMap<String, ReadPairUnit>,
}

impl Hit {
    fn new(score: i64, unit: ReadPairUnit) -> Self {
        let mut alternatives = BTreeMap::new();
        alternatives.insert(unit.cluster_id().to_string(), unit);
        Self {
            score,
            alternatives,
        }
    }
}

/// A read committed to exactly one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignedRead {
    pub cluster_id: String,
    pub unit: ReadPairUnit,
}

/// Outcome of offering one unit to the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    BelowIdentity,
    New,
    Replaced,
    Tied,
    Outscored,
}

/// How many reads had one, two, or three or more tied clusters before resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TieSummary {
    pub unique: usize,
    pub two_clusters: usize,
    pub three_or_more: usize,
}

impl TieSummary {
    pub fn total(&self) -> usize {
        self.unique + self.two_clusters + self.three_or_more
    }

    fn count(&mut self, num_alternatives: usize) {
        match num_alternatives {
            0 => {}
            1 => self.unique += 1,
            2 => self.two_clusters += 1,
            _ => self.three_or_more += 1,
        }
    }

    pub fn log(&self, batch: usize) {
        log::info!(
            "Batch {}: {} reads assigned to any cluster; {} to 1, {} to 2, {} to 3 or more",
            batch,
            self.total(),
            self.unique,
            self.two_clusters,
            self.three_or_more
        );
    }
}

/// Tracks the best-scoring alignment(s) per read id within one batch.
#[derive(Debug)]
pub struct BestHitResolver {
    pid_min: f64,
    hits: HashMap<String, Hit>,
}

impl BestHitResolver {
    pub fn new(pid_min: f64) -> Self {
        Self {
            pid_min,
            hits: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn get(&self, read_id: &str) -> Option<&Hit> {
        self.hits.get(read_id)
    }

    /// Offers a unit aligned to one cluster.
    ///
    /// Units below the identity threshold are discarded outright. Otherwise a higher
    /// score replaces the stored hit, an equal score adds the cluster as an alternative
    /// and a lower score is dropped.
    pub fn offer(&mut self, unit: ReadPairUnit) -> Result<Offer, CnvError> {
        let AlignmentScore {
            score,
            percent_identity,
        } = score_unit(&unit)?;
        if percent_identity < self.pid_min {
            return Ok(Offer::BelowIdentity);
        }

        let offer = match self.hits.get_mut(unit.read_id()) {
            None => {
                self.hits
                    .insert(unit.read_id().to_string(), Hit::new(score, unit));
                Offer::New
            }
            Some(hit) if score > hit.score => {
                *hit = Hit::new(score, unit);
                Offer::Replaced
            }
            Some(hit) if score == hit.score => {
                hit.alternatives
                    .insert(unit.cluster_id().to_string(), unit);
                Offer::Tied
            }
            Some(_) => Offer::Outscored,
        };
        Ok(offer)
    }

    /// Commits every read to one cluster, drawing among tied clusters by prior weight.
    ///
    /// Reads are visited in name order so that a seeded `rng` gives reproducible draws.
    pub fn resolve<R: Rng>(
        self,
        priors: &ClusterPriors,
        rng: &mut R,
    ) -> (HashMap<String, AssignedRead>, TieSummary) {
        let mut summary = TieSummary::default();
        let mut assigned = HashMap::with_capacity(self.hits.len());
        let hits = self
            .hits
            .into_iter()
            .sorted_unstable_by(|(a, _), (b, _)| a.cmp(b));
        for (read_id, hit) in hits {
            summary.count(hit.alternatives.len());
            if let Some(read) = resolve_hit(hit, priors, rng) {
                assigned.insert(read_id, read);
            }
        }
        (assigned, summary)
    }
}

fn resolve_hit<R: Rng>(hit: Hit, priors: &ClusterPriors, rng: &mut R) -> Option<AssignedRead> {
    let mut alternatives = hit.alternatives;
    let cluster_id = if alternatives.len() == 1 {
        alternatives.keys().next()?.clone()
    } else {
        let weights: Vec<f64> = alternatives
            .keys()
            .map(|id| priors.get(id).copied().unwrap_or(0.0))
            .collect();
        let index = weighted_choice(&weights, rng)?;
        alternatives.keys().nth(index)?.clone()
    };
    let unit = alternatives.remove(&cluster_id)?;
    Some(AssignedRead { cluster_id, unit })
}
