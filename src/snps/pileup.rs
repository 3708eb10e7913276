//! Consensus alleles and reference-allele frequencies from pileup (VCF) lines.
//!

use crate::utils::CnvError;
use std::io::BufRead;

/// Placeholder the pileup tool lists for "any other allele".
const UNOBSERVED_ALLELE: &str = "<X>";
const COUNTS_KEY: &str = "I16";
const NA: &str = "NA";

/// Allele summary of one pileup site.
#[derive(Debug, Clone, PartialEq)]
pub struct AlleleCall {
    pub ref_id: String,
    pub ref_pos: String,
    pub ref_allele: String,
    pub alt_allele: Option<String>,
    pub consensus_allele: Option<String>,
    /// Reference plus listed alternate alleles.
    pub allele_count: usize,
    pub ref_count: u64,
    pub alt_count: u64,
    pub depth: u64,
    pub ref_freq: Option<f64>,
}

impl AlleleCall {
    /// Parses one data line. Reference and all alternates are compared as two groups.
    pub fn from_pileup_line(line: &str) -> Result<Self, CnvError> {
        const MIN_FIELD_COUNT: usize = 8;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_FIELD_COUNT {
            return Err(CnvError::malformed(
                format!(
                    "expected at least {} pileup fields, found {}",
                    MIN_FIELD_COUNT,
                    fields.len()
                ),
                line,
            ));
        }

        let ref_allele = fields[3].to_string();
        let alt_alleles: Vec<&str> = fields[4]
            .split(',')
            .filter(|a| *a != UNOBSERVED_ALLELE)
            .collect();

        let [fwd_ref, rev_ref, fwd_alt, rev_alt] = strand_counts(fields[7])
            .map_err(|reason| CnvError::malformed(reason, line))?;
        let ref_count = fwd_ref + rev_ref;
        let alt_count = fwd_alt + rev_alt;
        let depth = ref_count + alt_count;

        let consensus_allele = if depth == 0 {
            None
        } else if ref_count >= alt_count {
            Some(ref_allele.clone())
        } else {
            // Alternate reads can be counted without any alternate allele being listed
            alt_alleles.first().map(|a| a.to_string())
        };

        Ok(Self {
            ref_id: fields[0].to_string(),
            ref_pos: fields[1].to_string(),
            ref_allele,
            alt_allele: alt_alleles.first().map(|a| a.to_string()),
            consensus_allele,
            allele_count: 1 + alt_alleles.len(),
            ref_count,
            alt_count,
            depth,
            ref_freq: (depth > 0).then(|| ref_count as f64 / depth as f64),
        })
    }

    /// Tab-delimited output row; missing values are written as `NA`.
    pub fn to_row(&self) -> String {
        [
            self.ref_id.clone(),
            self.ref_pos.clone(),
            self.ref_allele.clone(),
            self.alt_allele.clone().unwrap_or_else(|| NA.to_string()),
            self.consensus_allele
                .clone()
                .unwrap_or_else(|| NA.to_string()),
            self.allele_count.to_string(),
            self.ref_count.to_string(),
            self.alt_count.to_string(),
            self.depth.to_string(),
            self.ref_freq
                .map(|f| f.to_string())
                .unwrap_or_else(|| NA.to_string()),
        ]
        .join("\t")
    }
}

/// Forward-ref, reverse-ref, forward-alt and reverse-alt read counts from the info field.
fn strand_counts(info: &str) -> Result<[u64; 4], String> {
    let value = info
        .split(';')
        .find_map(|entry| match entry.split_once('=') {
            Some((key, value)) if key == COUNTS_KEY => Some(value),
            _ => None,
        })
        .ok_or_else(|| format!("missing {} field", COUNTS_KEY))?;

    let mut counts = [0u64; 4];
    let mut values = value.split(',');
    for count in counts.iter_mut() {
        let raw = values
            .next()
            .ok_or_else(|| format!("{} has fewer than 4 values", COUNTS_KEY))?;
        *count = raw
            .parse()
            .map_err(|_| format!("invalid {} count '{}'", COUNTS_KEY, raw))?;
    }
    Ok(counts)
}

/// Lazily parses every data line of a pileup stream, skipping `#` headers and blank lines.
pub fn allele_calls<R: BufRead>(reader: R) -> impl Iterator<Item = Result<AlleleCall, CnvError>> {
    reader.lines().filter_map(|line| match line {
        Err(e) => Some(Err(CnvError::malformed(
            "unreadable pileup",
            e.to_string(),
        ))),
        Ok(line) if line.starts_with('#') || line.trim().is_empty() => None,
        Ok(line) => Some(AlleleCall::from_pileup_line(&line)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn line(alt: &str, counts: &str) -> String {
        format!(
            "scaf1\t15\t.\tA\t{}\t0\t.\tDP=20;I16={},0,0,0,0,0,0,0,0,0,0,0,0;QS=1,0\tPL\t0,3,20",
            alt, counts
        )
    }

    #[test]
    fn reference_majority() {
        let call = AlleleCall::from_pileup_line(&line("T,<X>", "10,8,1,1")).unwrap();
        assert_eq!(call.ref_count, 18);
        assert_eq!(call.alt_count, 2);
        assert_eq!(call.depth, 20);
        assert_eq!(call.consensus_allele.as_deref(), Some("A"));
        assert_eq!(call.alt_allele.as_deref(), Some("T"));
        assert_eq!(call.allele_count, 2);
        assert_eq!(call.ref_freq, Some(0.9));
        assert_eq!(call.to_row(), "scaf1\t15\tA\tT\tA\t2\t18\t2\t20\t0.9");
    }

    #[test]
    fn alternate_majority() {
        let call = AlleleCall::from_pileup_line(&line("G,C", "1,0,3,2")).unwrap();
        assert_eq!(call.consensus_allele.as_deref(), Some("G"));
        assert_eq!(call.allele_count, 3);
        assert_eq!(call.ref_freq, Some(1.0 / 6.0));
    }

    #[test]
    fn tie_goes_to_reference() {
        let call = AlleleCall::from_pileup_line(&line("G", "1,1,2,0")).unwrap();
        assert_eq!(call.consensus_allele.as_deref(), Some("A"));
        assert_eq!(call.ref_freq, Some(0.5));
    }

    #[test]
    fn zero_depth_is_na() {
        let call = AlleleCall::from_pileup_line(&line("<X>", "0,0,0,0")).unwrap();
        assert_eq!(call.depth, 0);
        assert_eq!(call.consensus_allele, None);
        assert_eq!(call.ref_freq, None);
        assert_eq!(call.alt_allele, None);
        assert_eq!(call.allele_count, 1);
        assert_eq!(call.to_row(), "scaf1\t15\tA\tNA\tNA\t1\t0\t0\t0\tNA");
    }

    #[test]
    fn alt_counts_without_listed_alt_is_na() {
        let call = AlleleCall::from_pileup_line(&line("<X>", "0,1,3,3")).unwrap();
        assert_eq!(call.consensus_allele, None);
        assert_eq!(call.alt_count, 6);
        assert_eq!(call.ref_freq, Some(1.0 / 7.0));
    }

    #[test]
    fn missing_counts_are_malformed() {
        let no_i16 = "scaf1\t15\t.\tA\t<X>\t0\t.\tDP=20\tPL\t0";
        assert!(matches!(
            AlleleCall::from_pileup_line(no_i16),
            Err(CnvError::MalformedRecord { .. })
        ));
        let short = "scaf1\t15\t.\tA\t<X>\t0\t.\tI16=1,2,3\tPL\t0";
        assert!(AlleleCall::from_pileup_line(short).is_err());
        let bad = "scaf1\t15\t.\tA\t<X>\t0\t.\tI16=1,x,3,4\tPL\t0";
        assert!(AlleleCall::from_pileup_line(bad).is_err());
        assert!(AlleleCall::from_pileup_line("scaf1\t15").is_err());
    }

    #[test]
    fn stream_skips_headers_and_keeps_order() {
        let data = format!(
            "##fileformat=VCFv4.2\n#CHROM\tPOS\n{}\n\n{}\n",
            line("T", "5,5,0,0"),
            line("<X>", "0,0,0,0").replace("\t15\t", "\t16\t")
        );
        let calls: Vec<AlleleCall> = allele_calls(Cursor::new(data))
            .map(|c| c.unwrap())
            .collect();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].ref_pos, "15");
        assert_eq!(calls[1].ref_pos, "16");
    }
}
