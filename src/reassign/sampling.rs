use rand::Rng;

/// Draws an index with probability proportional to its weight.
///
/// Negative and non-finite weights count as zero. When no weight is positive the draw
/// is uniform. Returns `None` only for an empty slice.
pub fn weighted_choice<R: Rng>(weights: &[f64], rng: &mut R) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let clean = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
    let total: f64 = weights.iter().map(|&w| clean(w)).sum();
    if total <= 0.0 {
        return Some(rng.random_range(0..weights.len()));
    }

    let target = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (index, &weight) in weights.iter().enumerate() {
        let weight = clean(weight);
        if weight == 0.0 {
            continue;
        }
        cumulative += weight;
        last_positive = index;
        if target < cumulative {
            return Some(index);
        }
    }
    // Rounding can leave target a hair above the final cumulative sum
    Some(last_positive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_empty_weights() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(weighted_choice(&[], &mut rng), None);
    }

    #[test]
    fn test_zero_weight_never_drawn() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..1000 {
            assert_eq!(weighted_choice(&[0.0, 3.0, -1.0], &mut rng), Some(1));
        }
    }

    #[test]
    fn test_all_zero_weights_are_uniform() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut counts = [0usize; 2];
        for _ in 0..10_000 {
            counts[weighted_choice(&[0.0, 0.0], &mut rng).unwrap()] += 1;
        }
        assert!(counts[0] > 4_500 && counts[1] > 4_500, "{:?}", counts);
    }

    #[test]
    fn test_proportional_draws() {
        let mut rng = StdRng::seed_from_u64(4);
        let trials = 20_000;
        let picked_second = (0..trials)
            .filter(|_| weighted_choice(&[0.25, 0.75], &mut rng) == Some(1))
            .count();
        let frac = picked_second as f64 / trials as f64;
        assert!((frac - 0.75).abs() < 0.02, "fraction {}", frac);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let weights = [0.1, 0.2, 0.3, 0.4];
        let draws = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..50)
                .map(|_| weighted_choice(&weights, &mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(draws(9), draws(9));
    }
}
