pub mod accuracy;
pub mod mean;
pub mod roc_auc;

pub use accuracy::Accuracy;
pub use mean::Mean;
pub use roc_auc::RocAuc;

/// A running aggregate that is reset at the start of every epoch and read
/// once at its end.
pub trait Metric {
    fn result(&self) -> f64;
    fn reset(&mut self);
}

/// Index of the maximum element in a slice (first one on ties, 0 when empty).
pub fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &x)| match best {
            Some((_, b)) if b >= x => best,
            _ => Some((i, x)),
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::argmax;

    #[test]
    fn argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[0.2, 0.5, 0.5]), 1);
        assert_eq!(argmax(&[]), 0);
    }
}
