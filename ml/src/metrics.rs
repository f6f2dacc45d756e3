//! Classification metrics.
//!
//! Zero-division cases (a class never predicted, or absent from the truth)
//! score 0 for that class rather than erroring, matching the evaluation
//! conventions the trainer reports under.

/// Averaging strategy for multi-class precision/recall/F1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Average {
    /// Unweighted mean over classes.
    Macro,
    /// Mean over classes weighted by support.
    Weighted,
}

/// Fraction of predictions that match the truth.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

/// Per-class true positives, false positives, false negatives, support.
fn per_class_counts(
    y_true: &[usize],
    y_pred: &[usize],
    n_classes: usize,
) -> (Vec<usize>, Vec<usize>, Vec<usize>, Vec<usize>) {
    let mut tp = vec![0usize; n_classes];
    let mut fp = vec![0usize; n_classes];
    let mut fn_ = vec![0usize; n_classes];
    let mut support = vec![0usize; n_classes];

    for (&t, &p) in y_true.iter().zip(y_pred) {
        support[t] += 1;
        if t == p {
            tp[t] += 1;
        } else {
            fp[p] += 1;
            fn_[t] += 1;
        }
    }
    (tp, fp, fn_, support)
}

fn averaged(per_class: &[f64], support: &[usize], average: Average) -> f64 {
    match average {
        Average::Macro => {
            if per_class.is_empty() {
                0.0
            } else {
                per_class.iter().sum::<f64>() / per_class.len() as f64
            }
        }
        Average::Weighted => {
            let total: usize = support.iter().sum();
            if total == 0 {
                return 0.0;
            }
            per_class
                .iter()
                .zip(support)
                .map(|(&v, &s)| v * s as f64)
                .sum::<f64>()
                / total as f64
        }
    }
}

pub fn precision(y_true: &[usize], y_pred: &[usize], n_classes: usize, average: Average) -> f64 {
    let (tp, fp, _, support) = per_class_counts(y_true, y_pred, n_classes);
    let per_class: Vec<f64> = (0..n_classes)
        .map(|c| {
            let denom = tp[c] + fp[c];
            if denom == 0 {
                0.0
            } else {
                tp[c] as f64 / denom as f64
            }
        })
        .collect();
    averaged(&per_class, &support, average)
}

pub fn recall(y_true: &[usize], y_pred: &[usize], n_classes: usize, average: Average) -> f64 {
    let (tp, _, fn_, support) = per_class_counts(y_true, y_pred, n_classes);
    let per_class: Vec<f64> = (0..n_classes)
        .map(|c| {
            let denom = tp[c] + fn_[c];
            if denom == 0 {
                0.0
            } else {
                tp[c] as f64 / denom as f64
            }
        })
        .collect();
    averaged(&per_class, &support, average)
}

pub fn f1_score(y_true: &[usize], y_pred: &[usize], n_classes: usize, average: Average) -> f64 {
    let (tp, fp, fn_, support) = per_class_counts(y_true, y_pred, n_classes);
    let per_class: Vec<f64> = (0..n_classes)
        .map(|c| {
            let p_denom = tp[c] + fp[c];
            let r_denom = tp[c] + fn_[c];
            if p_denom == 0 || r_denom == 0 {
                return 0.0;
            }
            let p = tp[c] as f64 / p_denom as f64;
            let r = tp[c] as f64 / r_denom as f64;
            if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
        })
        .collect();
    averaged(&per_class, &support, average)
}

/// Confusion matrix, `[n_classes][n_classes]`; rows are truth, columns are
/// predictions.
pub fn confusion_matrix(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Vec<Vec<usize>> {
    let mut cm = vec![vec![0usize; n_classes]; n_classes];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        cm[t][p] += 1;
    }
    cm
}
