//! Exhaustive hyperparameter search scored by cross-validated micro-F1.
//!
//! Grid cells are independent, so they are evaluated on the rayon pool with
//! the training data shared read-only. The reduction runs in grid order:
//! the best mean score wins and ties go to the earlier cell.

use rayon::prelude::*;

use crate::common::error::{PredictError, PredictResult};
use crate::evaluation::service::f1_micro;

use super::domain::{Classifier, HyperParams, ParamGrid, Trainer};
use super::split::{stratified_folds, Split};

/// Score of one grid cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellScore {
    pub params: HyperParams,
    pub mean_f1_micro: f64,
    pub fold_scores: Vec<f64>,
}

/// Winning cell plus every evaluated cell in grid order.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub best: CellScore,
    pub cells: Vec<CellScore>,
}

fn take_rows(x: &[Vec<f64>], rows: &[usize]) -> Vec<Vec<f64>> {
    rows.iter().map(|&r| x[r].clone()).collect()
}

fn score_cell<T: Trainer>(
    trainer: &T,
    x: &[Vec<f64>],
    y: &[usize],
    n_classes: usize,
    folds: &[Split],
    params: &HyperParams,
) -> PredictResult<CellScore> {
    let mut fold_scores = Vec::with_capacity(folds.len());
    for fold in folds {
        let x_train = take_rows(x, &fold.train);
        let y_train: Vec<usize> = fold.train.iter().map(|&r| y[r]).collect();
        let model = trainer.fit(&x_train, &y_train, n_classes, params)?;

        let y_true: Vec<usize> = fold.test.iter().map(|&r| y[r]).collect();
        let y_pred: Vec<usize> = fold.test.iter().map(|&r| model.predict(&x[r])).collect();
        fold_scores.push(f1_micro(&y_true, &y_pred));
    }
    let mean_f1_micro = fold_scores.iter().sum::<f64>() / fold_scores.len().max(1) as f64;
    Ok(CellScore {
        params: params.clone(),
        mean_f1_micro,
        fold_scores,
    })
}

/// Evaluate every grid cell with stratified `k`-fold CV and pick the best.
pub fn grid_search<T: Trainer>(
    trainer: &T,
    x: &[Vec<f64>],
    y: &[usize],
    n_classes: usize,
    grid: &ParamGrid,
    k: usize,
) -> PredictResult<SearchOutcome> {
    if k < 2 {
        return Err(PredictError::training(format!(
            "cross-validation needs at least 2 folds, got {k}"
        )));
    }
    let folds = stratified_folds(y, k);
    if folds.is_empty() {
        return Err(PredictError::training(
            "not enough rows to build cross-validation folds",
        ));
    }
    let candidates = grid.cells();
    tracing::info!(
        cells = candidates.len(),
        folds = folds.len(),
        "starting grid search"
    );

    let cells = candidates
        .par_iter()
        .map(|params| score_cell(trainer, x, y, n_classes, &folds, params))
        .collect::<PredictResult<Vec<_>>>()?;

    let mut best: Option<&CellScore> = None;
    for cell in &cells {
        tracing::debug!(params = ?cell.params, f1_micro = cell.mean_f1_micro, "grid cell scored");
        if best.map_or(true, |b| cell.mean_f1_micro > b.mean_f1_micro) {
            best = Some(cell);
        }
    }
    let best = best
        .cloned()
        .ok_or_else(|| PredictError::training("hyperparameter grid is empty"))?;
    tracing::info!(params = ?best.params, f1_micro = best.mean_f1_micro, "best grid cell");
    Ok(SearchOutcome { best, cells })
}
