use crate::metrics::Metric;

/// Running arithmetic mean (sum and count).
#[derive(Debug, Clone, Default)]
pub struct Mean {
    total: f64,
    count: usize,
}

impl Mean {
    pub fn new() -> Mean {
        Mean::default()
    }

    pub fn update(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
    }

    /// Same as calling `update` once per value, in one go.
    pub fn update_many(&mut self, values: &[f64]) {
        self.total += values.iter().sum::<f64>();
        self.count += values.len();
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl Metric for Mean {
    /// Mean of every value seen since the last reset; `0.0` when empty.
    fn result(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }

    fn reset(&mut self) {
        *self = Mean::default();
    }
}
