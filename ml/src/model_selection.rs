//! Train/test splitting, stratified k-fold cross-validation, and
//! hyperparameter search.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::debug;

use crate::classifier::{Classifier, ModelParams, ModelType, param_grid};
use crate::error::MlError;
use crate::matrix::Matrix;
use crate::metrics::accuracy;

/// Groups sample indices by class, shuffling each group with `seed`.
fn shuffled_class_indices(y: &[usize], n_classes: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut groups = vec![Vec::new(); n_classes];
    for (i, &label) in y.iter().enumerate() {
        groups[label].push(i);
    }
    let mut rng = StdRng::seed_from_u64(seed);
    for group in &mut groups {
        group.shuffle(&mut rng);
    }
    groups
}

/// Stratified train/test split.
///
/// Each class contributes `round(test_size * |class|)` samples (at least 1,
/// at most all-but-one) to the test set. Classes with fewer than 2 samples
/// cannot be split and produce an error.
pub fn train_test_split_stratified(
    x: &Matrix,
    y: &[usize],
    n_classes: usize,
    test_size: f64,
    seed: u64,
) -> Result<(Matrix, Vec<usize>, Matrix, Vec<usize>), MlError> {
    if y.len() != x.n_rows() {
        return Err(MlError::DimensionMismatch {
            expected: x.n_rows(),
            got: y.len(),
        });
    }
    if n_classes < 2 {
        return Err(MlError::TooFewClasses(n_classes));
    }

    let mut train_idx = Vec::new();
    let mut test_idx = Vec::new();
    for (class, group) in shuffled_class_indices(y, n_classes, seed)
        .into_iter()
        .enumerate()
    {
        if group.len() < 2 {
            return Err(MlError::TooFewSamples {
                class,
                count: group.len(),
            });
        }
        let n_test = ((group.len() as f64 * test_size).round() as usize)
            .max(1)
            .min(group.len() - 1);
        test_idx.extend_from_slice(&group[..n_test]);
        train_idx.extend_from_slice(&group[n_test..]);
    }
    train_idx.sort_unstable();
    test_idx.sort_unstable();

    let x_train = x.select_rows(&train_idx);
    let y_train = train_idx.iter().map(|&i| y[i]).collect();
    let x_test = x.select_rows(&test_idx);
    let y_test = test_idx.iter().map(|&i| y[i]).collect();
    Ok((x_train, y_train, x_test, y_test))
}

/// Stratified K-fold splitter.
///
/// Each class's samples are distributed across folds so every fold keeps
/// roughly the overall class balance.
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    pub n_splits: usize,
    pub seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits, seed: 42 }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Returns (train, test) index pairs, one per fold. Folds that would
    /// have an empty side are dropped.
    pub fn split(&self, y: &[usize], n_classes: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
        let n_splits = self.n_splits.max(2);
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_splits];

        for group in shuffled_class_indices(y, n_classes, self.seed) {
            let base = group.len() / n_splits;
            let remainder = group.len() % n_splits;
            let mut start = 0;
            for (f, fold) in folds.iter_mut().enumerate() {
                let size = base + usize::from(f < remainder);
                fold.extend_from_slice(&group[start..start + size]);
                start += size;
            }
        }

        let mut out = Vec::with_capacity(n_splits);
        for f in 0..n_splits {
            let test = folds[f].clone();
            let mut train: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(g, _)| *g != f)
                .flat_map(|(_, fold)| fold.iter().copied())
                .collect();
            if test.is_empty() || train.is_empty() {
                continue;
            }
            train.sort_unstable();
            let mut test = test;
            test.sort_unstable();
            out.push((train, test));
        }
        out
    }
}

/// Per-fold accuracy scores from cross-validation.
#[derive(Debug, Clone, Serialize)]
pub struct CrossValidationResult {
    pub scores: Vec<f64>,
    pub folds: usize,
}

impl CrossValidationResult {
    pub fn mean(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.iter().sum::<f64>() / self.scores.len() as f64
    }

    pub fn std(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let var = self
            .scores
            .iter()
            .map(|&s| (s - mean).powi(2))
            .sum::<f64>()
            / self.scores.len() as f64;
        var.sqrt()
    }
}

/// Fits a fresh classifier per fold and scores accuracy on the held-out
/// fold.
pub fn cross_validate(
    params: &ModelParams,
    x: &Matrix,
    y: &[usize],
    n_classes: usize,
    kfold: &StratifiedKFold,
) -> Result<CrossValidationResult, MlError> {
    let splits = kfold.split(y, n_classes);
    if splits.is_empty() {
        return Err(MlError::InvalidConfig(
            "cross-validation produced no usable folds".to_string(),
        ));
    }

    let mut scores = Vec::with_capacity(splits.len());
    for (train, test) in &splits {
        let x_train = x.select_rows(train);
        let y_train: Vec<usize> = train.iter().map(|&i| y[i]).collect();
        let x_test = x.select_rows(test);
        let y_test: Vec<usize> = test.iter().map(|&i| y[i]).collect();

        let mut model = Classifier::build(params);
        model.fit(&x_train, &y_train, n_classes)?;
        let pred = model.predict(&x_test)?;
        scores.push(accuracy(&y_test, &pred));
    }

    Ok(CrossValidationResult {
        folds: scores.len(),
        scores,
    })
}

/// How to explore a hyperparameter space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMethod {
    /// Every grid point.
    Grid,
    /// A seeded sample of `n_iter` grid points.
    Random { n_iter: usize },
}

/// Result of a hyperparameter search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best_params: ModelParams,
    pub best_score: f64,
    pub evaluated: usize,
}

/// Cross-validated hyperparameter search over the model family's grid.
///
/// Returns `Ok(None)` when no search space is defined for the family, so
/// the caller can skip tuning with a warning instead of failing.
pub fn hyperparameter_search(
    model_type: ModelType,
    x: &Matrix,
    y: &[usize],
    n_classes: usize,
    method: SearchMethod,
    kfold: &StratifiedKFold,
    seed: u64,
) -> Result<Option<SearchOutcome>, MlError> {
    let mut candidates = param_grid(model_type);
    if candidates.is_empty() {
        return Ok(None);
    }

    if let SearchMethod::Random { n_iter } = method {
        let mut rng = StdRng::seed_from_u64(seed);
        candidates.shuffle(&mut rng);
        candidates.truncate(n_iter.max(1));
    }

    let mut best: Option<(ModelParams, f64)> = None;
    let evaluated = candidates.len();
    for params in candidates {
        let cv = cross_validate(&params, x, y, n_classes, kfold)?;
        let score = cv.mean();
        debug!(model = %model_type, score, ?params, "search candidate scored");
        if best.as_ref().map_or(true, |(_, s)| score > *s) {
            best = Some((params, score));
        }
    }

    let (best_params, best_score) = best.ok_or_else(|| {
        MlError::InvalidConfig("hyperparameter search evaluated no candidates".to_string())
    })?;
    Ok(Some(SearchOutcome {
        best_params,
        best_score,
        evaluated,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svm::SvmParams;

    fn dataset() -> (Matrix, Vec<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..10 {
            let j = i as f32 * 0.1;
            rows.push(vec![0.0 + j, 0.0]);
            labels.push(0);
            rows.push(vec![5.0 - j, 5.0]);
            labels.push(1);
        }
        (Matrix::from_rows(&rows).unwrap(), labels)
    }

    #[test]
    fn split_is_stratified() {
        let (x, y) = dataset();
        let (x_train, y_train, x_test, y_test) =
            train_test_split_stratified(&x, &y, 2, 0.2, 42).unwrap();

        assert_eq!(x_train.n_rows() + x_test.n_rows(), 20);
        // 20% of 10 per class = 2 per class.
        assert_eq!(y_test.iter().filter(|&&c| c == 0).count(), 2);
        assert_eq!(y_test.iter().filter(|&&c| c == 1).count(), 2);
        assert_eq!(y_train.len(), 16);
    }

    #[test]
    fn split_rejects_singleton_class() {
        let x = Matrix::from_rows(&[vec![0.0], vec![1.0], vec![2.0]]).unwrap();
        let y = vec![0, 0, 1];
        let err = train_test_split_stratified(&x, &y, 2, 0.2, 42).unwrap_err();
        assert!(matches!(err, MlError::TooFewSamples { class: 1, count: 1 }));
    }

    #[test]
    fn split_is_reproducible() {
        let (x, y) = dataset();
        let a = train_test_split_stratified(&x, &y, 2, 0.2, 7).unwrap();
        let b = train_test_split_stratified(&x, &y, 2, 0.2, 7).unwrap();
        assert_eq!(a.1, b.1);
        assert_eq!(a.3, b.3);
    }

    #[test]
    fn kfold_covers_every_sample_exactly_once() {
        let (_, y) = dataset();
        let kfold = StratifiedKFold::new(5);
        let splits = kfold.split(&y, 2);
        assert_eq!(splits.len(), 5);

        let mut seen = vec![0usize; y.len()];
        for (train, test) in &splits {
            assert_eq!(train.len() + test.len(), y.len());
            for &i in test {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn kfold_keeps_class_balance() {
        let (_, y) = dataset();
        for (_, test) in StratifiedKFold::new(5).split(&y, 2) {
            let zeros = test.iter().filter(|&&i| y[i] == 0).count();
            let ones = test.len() - zeros;
            assert_eq!(zeros, 2);
            assert_eq!(ones, 2);
        }
    }

    #[test]
    fn cross_validate_scores_every_fold() {
        let (x, y) = dataset();
        let params = ModelParams::Svm(SvmParams::default());
        let cv = cross_validate(&params, &x, &y, 2, &StratifiedKFold::new(5)).unwrap();
        assert_eq!(cv.scores.len(), 5);
        assert!(cv.mean() > 0.8, "separable data should CV well: {:?}", cv.scores);
        assert!(cv.std() >= 0.0);
    }

    #[test]
    fn random_search_respects_budget() {
        let (x, y) = dataset();
        let outcome = hyperparameter_search(
            ModelType::AdaBoost,
            &x,
            &y,
            2,
            SearchMethod::Random { n_iter: 3 },
            &StratifiedKFold::new(3),
            42,
        )
        .unwrap()
        .expect("adaboost has a grid");
        assert_eq!(outcome.evaluated, 3);
        assert!(outcome.best_score > 0.8);
        assert_eq!(outcome.best_params.model_type(), ModelType::AdaBoost);
    }

    #[test]
    fn grid_search_finds_a_winner() {
        let (x, y) = dataset();
        let outcome = hyperparameter_search(
            ModelType::AdaBoost,
            &x,
            &y,
            2,
            SearchMethod::Grid,
            &StratifiedKFold::new(3),
            42,
        )
        .unwrap()
        .expect("adaboost has a grid");
        assert_eq!(outcome.evaluated, 9);
    }
}
