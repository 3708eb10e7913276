use super::alignment::ReadPairUnit;
use crate::utils::CnvError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentScore {
    /// Aligned length minus edits, summed over mates.
    pub score: i64,
    pub percent_identity: f64,
}

/// Scores a single read, half pair or full pair.
///
/// Both values are computed over the summed query length and summed edit distance of
/// every record in the unit, so a full pair is scored as one alignment.
pub fn score_unit(unit: &ReadPairUnit) -> Result<AlignmentScore, CnvError> {
    let (length, edit) = unit.records().iter().fold((0i64, 0i64), |(len, ed), rec| {
        (
            len + i64::from(rec.query_length),
            ed + i64::from(rec.edit_distance),
        )
    });
    if length == 0 {
        return Err(CnvError::malformed(
            "zero query length",
            unit.read_id().to_string(),
        ));
    }
    let score = length - edit;
    Ok(AlignmentScore {
        score,
        percent_identity: 100.0 * score as f64 / length as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reassign::alignment::test_utils::*;

    #[test]
    fn test_single_end_score() {
        let unit = single("r1", "gc1", 100, 2);
        let score = score_unit(&unit).unwrap();
        assert_eq!(score.score, 98);
        assert_eq!(score.percent_identity, 98.0);
    }

    #[test]
    fn test_half_pair_scores_mapped_mate_only() {
        let mut rec = make_mate("r1", "gc1", 150, 3);
        rec.is_mate_unmapped = true;
        let unit = ReadPairUnit::new(0, vec![rec]).unwrap();
        let score = score_unit(&unit).unwrap();
        assert_eq!(score.score, 147);
        assert_eq!(score.percent_identity, 98.0);
    }

    #[test]
    fn test_full_pair_is_additive() {
        let unit = ReadPairUnit::new(
            0,
            vec![
                make_mate("r1", "gc1", 100, 2),
                make_mate("r1", "gc1", 100, 3),
            ],
        )
        .unwrap();
        let score = score_unit(&unit).unwrap();
        assert_eq!(score.score, 195);
        assert_eq!(score.percent_identity, 97.5);
    }

    #[test]
    fn test_zero_length_is_malformed() {
        let unit = single("r1", "gc1", 0, 0);
        assert!(matches!(
            score_unit(&unit),
            Err(CnvError::MalformedRecord { .. })
        ));
    }
}
