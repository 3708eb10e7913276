//! Typed alignment records and their grouping into read-pair units.
//!

use crate::utils::{get_nm_tag, scaffold_id, CnvError, Result};
use rust_htslib::bam;
use std::str;

/// A single alignment as reported by the aligner for one genome cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    /// Query (read) name.
    pub read_id: String,
    pub is_paired: bool,
    pub is_mate_unmapped: bool,
    /// Genome cluster whose index the read was aligned to.
    pub cluster_id: String,
    /// Scaffold within the cluster.
    pub reference_id: String,
    pub query_length: u32,
    /// Value of the NM tag.
    pub edit_distance: u32,
}

impl AlignmentRecord {
    /// Builds a record from an HTSlib alignment, resolving the scaffold name through `header`.
    pub fn from_hts_rec(
        rec: &bam::Record,
        header: &bam::HeaderView,
        cluster_id: &str,
    ) -> std::result::Result<Self, CnvError> {
        let read_id = str::from_utf8(rec.qname())
            .map_err(|_| {
                CnvError::malformed("read name is not UTF-8", String::from_utf8_lossy(rec.qname()))
            })?
            .to_string();

        if rec.is_unmapped() || rec.tid() < 0 {
            return Err(CnvError::malformed("alignment is unmapped", read_id));
        }
        let reference_name = String::from_utf8_lossy(header.tid2name(rec.tid() as u32));
        let reference_id = scaffold_id(&reference_name).to_string();

        let edit_distance = get_nm_tag(rec)
            .ok_or_else(|| CnvError::malformed("missing NM tag", read_id.clone()))?;

        Ok(AlignmentRecord {
            read_id,
            is_paired: rec.is_paired(),
            is_mate_unmapped: rec.is_mate_unmapped(),
            cluster_id: cluster_id.to_string(),
            reference_id,
            query_length: rec.seq_len() as u32,
            edit_distance,
        })
    }
}

/// Name and flags needed to group an alignment stream into units.
pub trait PairingFlags {
    fn name(&self) -> &[u8];
    fn unmapped(&self) -> bool;
    fn paired(&self) -> bool;
    fn mate_unmapped(&self) -> bool;
}

impl PairingFlags for AlignmentRecord {
    fn name(&self) -> &[u8] {
        self.read_id.as_bytes()
    }

    // Built only from mapped alignments
    fn unmapped(&self) -> bool {
        false
    }

    fn paired(&self) -> bool {
        self.is_paired
    }

    fn mate_unmapped(&self) -> bool {
        self.is_mate_unmapped
    }
}

impl PairingFlags for bam::Record {
    fn name(&self) -> &[u8] {
        self.qname()
    }

    fn unmapped(&self) -> bool {
        self.is_unmapped()
    }

    fn paired(&self) -> bool {
        self.is_paired()
    }

    fn mate_unmapped(&self) -> bool {
        self.is_mate_unmapped()
    }
}

/// Groups a name-collated alignment stream into single reads, half pairs and full pairs.
///
/// Unmapped records are skipped. Unpaired alignments and alignments whose mate is
/// unmapped are emitted on their own; paired alignments are emitted two at a time and
/// must share a read name. A trailing unmatched mate is dropped.
pub struct ReadPairs<I, T> {
    records: I,
    pending: Vec<T>,
}

impl<I, T> ReadPairs<I, T>
where
    I: Iterator<Item = Result<T>>,
    T: PairingFlags,
{
    pub fn new(records: I) -> Self {
        Self {
            records,
            pending: Vec::with_capacity(2),
        }
    }
}

impl<I, T> Iterator for ReadPairs<I, T>
where
    I: Iterator<Item = Result<T>>,
    T: PairingFlags,
{
    type Item = Result<Vec<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rec = match self.records.next()? {
                Ok(rec) => rec,
                Err(e) => return Some(Err(e)),
            };
            if rec.unmapped() {
                continue;
            }
            if !rec.paired() || rec.mate_unmapped() {
                return Some(Ok(vec![rec]));
            }
            if let Some(first) = self.pending.first() {
                if first.name() != rec.name() {
                    let names = format!(
                        "{} / {}",
                        String::from_utf8_lossy(first.name()),
                        String::from_utf8_lossy(rec.name())
                    );
                    self.pending.clear();
                    return Some(Err(
                        CnvError::malformed("mates of a pair have different names", names).into(),
                    ));
                }
            }
            self.pending.push(rec);
            if self.pending.len() == 2 {
                return Some(Ok(std::mem::take(&mut self.pending)));
            }
        }
    }
}

/// One read as aligned to one cluster: a single record or both mates of a pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPairUnit {
    /// Position of this unit in its cluster's alignment stream for the batch.
    pub ordinal: usize,
    records: Vec<AlignmentRecord>,
}

impl ReadPairUnit {
    pub fn new(
        ordinal: usize,
        records: Vec<AlignmentRecord>,
    ) -> std::result::Result<Self, CnvError> {
        match records.as_slice() {
            [_] => {}
            [first, second] => {
                if first.cluster_id != second.cluster_id {
                    return Err(CnvError::malformed(
                        "mates aligned to different clusters",
                        first.read_id.clone(),
                    ));
                }
            }
            _ => {
                return Err(CnvError::malformed(
                    format!("unit must hold one or two alignments, got {}", records.len()),
                    records
                        .first()
                        .map(|r| r.read_id.clone())
                        .unwrap_or_default(),
                ))
            }
        }
        Ok(Self { ordinal, records })
    }

    pub fn read_id(&self) -> &str {
        &self.records[0].read_id
    }

    pub fn cluster_id(&self) -> &str {
        &self.records[0].cluster_id
    }

    pub fn reference_id(&self) -> &str {
        &self.records[0].reference_id
    }

    pub fn is_full_pair(&self) -> bool {
        self.records.len() == 2
    }

    pub fn records(&self) -> &[AlignmentRecord] {
        &self.records
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;

    pub fn make_record(read_id: &str, cluster_id: &str, len: u32, edit: u32) -> AlignmentRecord {
        AlignmentRecord {
            read_id: read_id.to_string(),
            is_paired: false,
            is_mate_unmapped: false,
            cluster_id: cluster_id.to_string(),
            reference_id: format!("{}_scaffold", cluster_id),
            query_length: len,
            edit_distance: edit,
        }
    }

    pub fn make_mate(read_id: &str, cluster_id: &str, len: u32, edit: u32) -> AlignmentRecord {
        AlignmentRecord {
            is_paired: true,
            ..make_record(read_id, cluster_id, len, edit)
        }
    }

    pub fn single(read_id: &str, cluster_id: &str, len: u32, edit: u32) -> ReadPairUnit {
        ReadPairUnit::new(0, vec![make_record(read_id, cluster_id, len, edit)]).unwrap()
    }
}
