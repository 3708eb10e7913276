use std::collections::HashMap;

/// Coverage per pangene for one cluster, accumulated across batches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PangeneCoverage {
    values: HashMap<String, f64>,
}

impl PangeneCoverage {
    /// Adds `amount` to the pangene, inserting it when first seen.
    pub fn add(&mut self, pangene_id: &str, amount: f64) {
        match self.values.get_mut(pangene_id) {
            Some(value) => *value += amount,
            None => {
                self.values.insert(pangene_id.to_string(), amount);
            }
        }
    }

    /// Combines the partial coverage of two sets of batches.
    pub fn merge(mut self, other: PangeneCoverage) -> PangeneCoverage {
        for (pangene_id, amount) in other.values {
            self.add(&pangene_id, amount);
        }
        self
    }

    pub fn get(&self, pangene_id: &str) -> Option<f64> {
        self.values.get(pangene_id).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(id, cov)| (id.as_str(), *cov))
    }
}
