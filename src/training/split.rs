//! Seeded shuffling, rare-class filtering and label-stratified partitioning.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Deterministic permutation of `0..n`.
pub fn shuffled_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut idx: Vec<usize> = (0..n).collect();
    idx.shuffle(&mut rng);
    idx
}

/// Labels occurring exactly once. Stratified splitting cannot place a single
/// example on both sides, so these are dropped before splitting.
pub fn singleton_labels<'a, I>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter(|&(_, c)| c == 1)
        .map(|(l, _)| l.to_string())
        .collect()
}

/// Row positions grouped by class, each group in ascending row order.
fn by_class(y: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (row, &class) in y.iter().enumerate() {
        groups.entry(class).or_default().push(row);
    }
    groups
}

/// Train/test row positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Stratified holdout split. Per class, rows are shuffled with the seed and
/// `round(count * test_fraction)` go to test, always leaving one in train.
/// Both sides are returned in ascending row order.
pub fn stratified_split(y: &[usize], test_fraction: f64, seed: u64) -> Split {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for (_, mut rows) in by_class(y) {
        rows.shuffle(&mut rng);
        let wanted = (rows.len() as f64 * test_fraction).round() as usize;
        let n_test = wanted.min(rows.len().saturating_sub(1));
        test.extend_from_slice(&rows[..n_test]);
        train.extend_from_slice(&rows[n_test..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    Split { train, test }
}

/// Stratified k-fold assignment: the i-th row of a class (in row order)
/// lands in fold `i % k`. Returns one [`Split`] per fold with the fold as test.
pub fn stratified_folds(y: &[usize], k: usize) -> Vec<Split> {
    if k == 0 {
        return Vec::new();
    }
    let mut fold_of = vec![0usize; y.len()];
    for (_, rows) in by_class(y) {
        for (i, row) in rows.into_iter().enumerate() {
            fold_of[row] = i % k;
        }
    }
    (0..k)
        .map(|fold| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..y.len()).partition(|&row| fold_of[row] == fold);
            Split { train, test }
        })
        .filter(|s| !s.test.is_empty() && !s.train.is_empty())
        .collect()
}
