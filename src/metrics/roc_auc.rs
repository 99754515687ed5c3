use crate::metrics::Metric;

/// Nudges the end thresholds past the [0, 1] range so that predictions of
/// exactly 0 or 1 still fall on the right side.
const THRESHOLD_EPS: f64 = 1e-7;

pub const DEFAULT_NUM_THRESHOLDS: usize = 200;

/// ROC-AUC approximated from confusion counts at fixed thresholds.
///
/// Labels and predictions are flattened: every (class, sample) pair is one
/// binary decision, a prediction counting as positive when it is strictly
/// greater than the threshold. The area is the trapezoidal sum over the
/// resulting (FPR, TPR) points.
#[derive(Debug, Clone)]
pub struct RocAuc {
    thresholds: Vec<f64>,
    true_positives: Vec<f64>,
    false_positives: Vec<f64>,
    true_negatives: Vec<f64>,
    false_negatives: Vec<f64>,
}

impl RocAuc {
    /// # Panics
    /// Panics if `num_thresholds < 2`.
    pub fn new(num_thresholds: usize) -> RocAuc {
        assert!(num_thresholds >= 2, "RocAuc needs at least 2 thresholds, got {}", num_thresholds);
        let mut thresholds = Vec::with_capacity(num_thresholds);
        thresholds.push(-THRESHOLD_EPS);
        for i in 1..num_thresholds - 1 {
            thresholds.push(i as f64 / (num_thresholds - 1) as f64);
        }
        thresholds.push(1.0 + THRESHOLD_EPS);

        RocAuc {
            true_positives: vec![0.0; num_thresholds],
            false_positives: vec![0.0; num_thresholds],
            true_negatives: vec![0.0; num_thresholds],
            false_negatives: vec![0.0; num_thresholds],
            thresholds,
        }
    }

    /// Accumulates element-wise label/prediction pairs. Labels `>= 0.5`
    /// count as positive.
    pub fn update(&mut self, labels: &[f64], predictions: &[f64]) {
        assert_eq!(labels.len(), predictions.len(), "labels and predictions differ in length");
        for (&label, &pred) in labels.iter().zip(predictions.iter()) {
            let positive = label >= 0.5;
            for (i, &threshold) in self.thresholds.iter().enumerate() {
                match (positive, pred > threshold) {
                    (true, true) => self.true_positives[i] += 1.0,
                    (true, false) => self.false_negatives[i] += 1.0,
                    (false, true) => self.false_positives[i] += 1.0,
                    (false, false) => self.true_negatives[i] += 1.0,
                }
            }
        }
    }

    /// Accumulates one sample with an integer label against its class
    /// probabilities (the label is expanded to one-hot).
    pub fn update_sparse(&mut self, label: usize, probabilities: &[f64]) {
        let mut one_hot = vec![0.0; probabilities.len()];
        if let Some(slot) = one_hot.get_mut(label) {
            *slot = 1.0;
        }
        self.update(&one_hot, probabilities);
    }

    pub fn num_thresholds(&self) -> usize {
        self.thresholds.len()
    }
}

impl Default for RocAuc {
    fn default() -> Self {
        RocAuc::new(DEFAULT_NUM_THRESHOLDS)
    }
}

impl Metric for RocAuc {
    fn result(&self) -> f64 {
        let rate = |num: f64, other: f64| if num + other > 0.0 { num / (num + other) } else { 0.0 };
        let tpr: Vec<f64> = self.true_positives.iter().zip(self.false_negatives.iter())
            .map(|(&tp, &fn_)| rate(tp, fn_))
            .collect();
        let fpr: Vec<f64> = self.false_positives.iter().zip(self.true_negatives.iter())
            .map(|(&fp, &tn)| rate(fp, tn))
            .collect();

        // Thresholds ascend, so FPR descends: each segment has width fpr[i] - fpr[i+1].
        (0..tpr.len() - 1)
            .map(|i| (fpr[i] - fpr[i + 1]) * (tpr[i] + tpr[i + 1]) / 2.0)
            .sum()
    }

    fn reset(&mut self) {
        for counts in [
            &mut self.true_positives,
            &mut self.false_positives,
            &mut self.true_negatives,
            &mut self.false_negatives,
        ] {
            counts.iter_mut().for_each(|c| *c = 0.0);
        }
    }
}
