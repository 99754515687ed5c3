use std::fmt;

/// Which pass over the data a metric line describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Training,
    Validation,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Training => write!(f, "Training"),
            Phase::Validation => write!(f, "Validation"),
        }
    }
}

/// `Epoch 007: Training loss: 1.234, ROC AUC: 91.500%`
///
/// `auc` is a fraction and is printed as a percentage.
pub fn epoch_line(epoch: usize, phase: Phase, loss: f64, auc: f64) -> String {
    format!("Epoch {:03}: {} loss: {:.3}, ROC AUC: {:.3}%", epoch, phase, loss, auc * 100.0)
}

/// `Test loss: 1.234, ROC AUC: 91.500%, Accuracy: 70.000%`
pub fn test_line(loss: f64, auc: f64, accuracy: f64) -> String {
    format!(
        "Test loss: {:.3}, ROC AUC: {:.3}%, Accuracy: {:.3}%",
        loss,
        auc * 100.0,
        accuracy * 100.0
    )
}
