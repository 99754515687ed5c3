use crate::metrics::{argmax, Metric};

/// Sparse categorical accuracy: fraction of samples whose argmax equals the label.
#[derive(Debug, Clone, Default)]
pub struct Accuracy {
    correct: usize,
    total: usize,
}

impl Accuracy {
    pub fn new() -> Accuracy {
        Accuracy::default()
    }

    pub fn update(&mut self, label: usize, probabilities: &[f64]) {
        if argmax(probabilities) == label {
            self.correct += 1;
        }
        self.total += 1;
    }
}

impl Metric for Accuracy {
    fn result(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    fn reset(&mut self) {
        *self = Accuracy::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_argmax_hits() {
        let mut acc = Accuracy::new();
        acc.update(1, &[0.1, 0.8, 0.1]);
        acc.update(0, &[0.1, 0.8, 0.1]);
        acc.update(2, &[0.2, 0.2, 0.6]);
        assert!((acc.result() - 2.0 / 3.0).abs() < 1e-15);
        acc.reset();
        assert_eq!(acc.result(), 0.0);
    }
}
