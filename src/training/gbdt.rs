//! Multi-class gradient-boosted regression trees with a softmax link.
//!
//! Each boosting round fits one tree per class on the softmax gradients and
//! hessians (second-order split gain with L2 leaf regularisation). Row
//! subsampling is drawn once per round, column subsampling once per tree,
//! both from a seeded ChaCha RNG so a given seed always yields the same model.
//!
//! Trees are stored as a flat node arena with the root at index 0. A row goes
//! left when `row[feature] < threshold`; NaN therefore always goes right.

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::common::error::{PredictError, PredictResult};

use super::domain::{Classifier, HyperParams, Trainer};

const LAMBDA: f64 = 1.0;
const MIN_CHILD_WEIGHT: f64 = 1.0;
const MIN_HESSIAN: f64 = 1e-6;
const MIN_GAIN: f64 = 1e-12;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        weight: f64,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Leaf weight reached by `row`. Malformed arenas score 0.
    pub fn score(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        // A well-formed tree reaches a leaf in at most `nodes.len()` steps.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx) {
                Some(Node::Leaf { weight }) => return *weight,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(f64::NAN);
                    idx = if value < *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
        0.0
    }

    /// Children must point forward inside the arena, features inside the row.
    fn check(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!(
                        "node {idx} splits on feature {feature}, model has {n_features}"
                    ));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!(
                            "node {idx} points to child {child} outside 1..{}",
                            self.nodes.len()
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(Node::Split { left, right, .. }) => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Fitted boosted ensemble. `rounds[r][k]` is the tree for class `k` in round `r`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GbdtModel {
    n_features: usize,
    n_classes: usize,
    rounds: Vec<Vec<Tree>>,
}

impl GbdtModel {
    pub fn rounds(&self) -> &[Vec<Tree>] {
        &self.rounds
    }

    /// Reject ensembles whose shape disagrees with their own header.
    pub fn validate(&self) -> PredictResult<()> {
        for (r, round) in self.rounds.iter().enumerate() {
            if round.len() != self.n_classes {
                return Err(PredictError::schema(format!(
                    "round {r} holds {} trees for {} classes",
                    round.len(),
                    self.n_classes
                )));
            }
            for (k, tree) in round.iter().enumerate() {
                tree.check(self.n_features).map_err(|msg| {
                    PredictError::schema(format!("round {r}, class {k}: {msg}"))
                })?;
            }
        }
        Ok(())
    }

    fn margins(&self, row: &[f64]) -> Vec<f64> {
        let mut margins = vec![0.0; self.n_classes];
        for round in &self.rounds {
            for (margin, tree) in margins.iter_mut().zip(round) {
                *margin += tree.score(row);
            }
        }
        margins
    }
}

impl Classifier for GbdtModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        softmax(&self.margins(row))
    }

    fn check(&self) -> PredictResult<()> {
        self.validate()
    }
}

/// Numerically stable softmax. Empty input gives an empty vector.
pub fn softmax(margins: &[f64]) -> Vec<f64> {
    let max = margins.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = margins.iter().map(|m| (m - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Fits [`GbdtModel`]s from a fixed seed.
#[derive(Clone, Debug)]
pub struct GbdtTrainer {
    pub seed: u64,
}

impl GbdtTrainer {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Trainer for GbdtTrainer {
    type Model = GbdtModel;

    fn fit(
        &self,
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        params: &HyperParams,
    ) -> PredictResult<GbdtModel> {
        if x.is_empty() || x.len() != y.len() {
            return Err(PredictError::training(format!(
                "need matching non-empty rows and labels, got {} rows and {} labels",
                x.len(),
                y.len()
            )));
        }
        if n_classes == 0 {
            return Err(PredictError::training("no classes to fit"));
        }
        if let Some(bad) = y.iter().find(|&&label| label >= n_classes) {
            return Err(PredictError::training(format!(
                "label {bad} outside class grid of {n_classes}"
            )));
        }
        let n_features = x[0].len();
        if x.iter().any(|row| row.len() != n_features) {
            return Err(PredictError::training("rows have differing widths"));
        }

        let mut model = GbdtModel {
            n_features,
            n_classes,
            rounds: Vec::new(),
        };
        // A single class needs no trees: softmax of one margin is 1.
        if n_classes == 1 || n_features == 0 {
            return Ok(model);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let n = x.len();
        let mut margins = vec![vec![0.0; n_classes]; n];
        let cols_per_tree = ((params.colsample_bytree * n_features as f64).floor() as usize).clamp(1, n_features);

        for _ in 0..params.n_estimators {
            let probs: Vec<Vec<f64>> = margins.iter().map(|m| softmax(m)).collect();
            let rows = sample_rows(&mut rng, n, params.subsample);

            let mut round = Vec::with_capacity(n_classes);
            for k in 0..n_classes {
                let mut grad = vec![0.0; n];
                let mut hess = vec![0.0; n];
                for i in 0..n {
                    let p = probs[i][k];
                    let target = if y[i] == k { 1.0 } else { 0.0 };
                    grad[i] = p - target;
                    hess[i] = (p * (1.0 - p)).max(MIN_HESSIAN);
                }
                let mut columns = index::sample(&mut rng, n_features, cols_per_tree).into_vec();
                columns.sort_unstable();

                let builder = TreeBuilder {
                    x,
                    grad: &grad,
                    hess: &hess,
                    columns: &columns,
                    max_depth: params.max_depth,
                    learning_rate: params.learning_rate,
                };
                round.push(builder.build(rows.clone()));
            }

            for (i, row) in x.iter().enumerate() {
                for (k, tree) in round.iter().enumerate() {
                    margins[i][k] += tree.score(row);
                }
            }
            model.rounds.push(round);
        }

        Ok(model)
    }
}

fn sample_rows(rng: &mut ChaCha8Rng, n: usize, ratio: f64) -> Vec<usize> {
    if ratio >= 1.0 {
        return (0..n).collect();
    }
    let picked: Vec<usize> = (0..n).filter(|_| rng.gen::<f64>() < ratio).collect();
    if picked.is_empty() {
        (0..n).collect()
    } else {
        picked
    }
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    grad: &'a [f64],
    hess: &'a [f64],
    columns: &'a [usize],
    max_depth: usize,
    learning_rate: f64,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl TreeBuilder<'_> {
    fn build(&self, rows: Vec<usize>) -> Tree {
        let mut nodes = Vec::new();
        self.grow(rows, 0, &mut nodes);
        Tree::new(nodes)
    }

    fn grow(&self, rows: Vec<usize>, depth: usize, nodes: &mut Vec<Node>) -> usize {
        let id = nodes.len();
        let (g, h) = self.sums(&rows);
        nodes.push(Node::Leaf {
            weight: -g / (h + LAMBDA) * self.learning_rate,
        });

        if depth >= self.max_depth || h < 2.0 * MIN_CHILD_WEIGHT {
            return id;
        }
        let Some(best) = self.best_split(&rows, g, h) else {
            return id;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&i| self.x[i][best.feature] < best.threshold);
        let left = self.grow(left_rows, depth + 1, nodes);
        let right = self.grow(right_rows, depth + 1, nodes);
        nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }

    fn sums(&self, rows: &[usize]) -> (f64, f64) {
        rows.iter()
            .fold((0.0, 0.0), |(g, h), &i| (g + self.grad[i], h + self.hess[i]))
    }

    fn best_split(&self, rows: &[usize], g: f64, h: f64) -> Option<SplitCandidate> {
        let parent = g * g / (h + LAMBDA);
        let mut best: Option<SplitCandidate> = None;
        let mut order = rows.to_vec();

        for &feature in self.columns {
            order.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));
            let (mut gl, mut hl) = (0.0, 0.0);
            for pair in order.windows(2) {
                let (cur, next) = (pair[0], pair[1]);
                gl += self.grad[cur];
                hl += self.hess[cur];
                let (a, b) = (self.x[cur][feature], self.x[next][feature]);
                if !(a < b) {
                    continue;
                }
                let (gr, hr) = (g - gl, h - hl);
                if hl < MIN_CHILD_WEIGHT || hr < MIN_CHILD_WEIGHT {
                    continue;
                }
                let gain = gl * gl / (hl + LAMBDA) + gr * gr / (hr + LAMBDA) - parent;
                if gain > MIN_GAIN && best.as_ref().map_or(true, |c| gain > c.gain) {
                    let mid = a + (b - a) / 2.0;
                    let threshold = if a < mid { mid } else { b };
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn params() -> HyperParams {
        HyperParams {
            n_estimators: 30,
            max_depth: 3,
            learning_rate: 0.3,
            subsample: 1.0,
            colsample_bytree: 1.0,
        }
    }

    /// Three well separated classes driven by feature 0, feature 1 is noise.
    fn separable() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..30 {
            let class = i % 3;
            x.push(vec![class as f64 * 10.0 + (i % 5) as f64 * 0.1, (i % 7) as f64]);
            y.push(class);
        }
        (x, y)
    }

    #[test]
    fn softmax_is_a_distribution() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        assert_abs_diff_eq!(p.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(p[2] > p[1] && p[1] > p[0]);
        assert_eq!(softmax(&[1000.0, 1000.0]), vec![0.5, 0.5]);
        assert!(softmax(&[]).is_empty());
    }

    #[test]
    fn tree_routes_rows_by_threshold() {
        let tree = Tree::new(vec![
            Node::Split {
                feature: 0,
                threshold: 0.5,
                left: 1,
                right: 2,
            },
            Node::Leaf { weight: -1.0 },
            Node::Leaf { weight: 2.0 },
        ]);
        assert_eq!(tree.score(&[0.0]), -1.0);
        assert_eq!(tree.score(&[1.0]), 2.0);
        assert_eq!(tree.score(&[f64::NAN]), 2.0);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn learns_separable_classes() {
        let (x, y) = separable();
        let model = GbdtTrainer::new(42).fit(&x, &y, 3, &params()).unwrap();
        assert_eq!(model.n_features(), 2);
        assert_eq!(model.n_classes(), 3);
        for (row, &label) in x.iter().zip(&y) {
            assert_eq!(model.predict(row), label);
            let p = model.predict_proba(row);
            assert_abs_diff_eq!(p.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        }
        assert!(model.rounds().iter().flatten().all(|t| t.depth() <= 3));
    }

    #[test]
    fn same_seed_same_model() {
        let (x, y) = separable();
        let p = HyperParams {
            subsample: 0.8,
            colsample_bytree: 0.5,
            ..params()
        };
        let a = GbdtTrainer::new(7).fit(&x, &y, 3, &p).unwrap();
        let b = GbdtTrainer::new(7).fit(&x, &y, 3, &p).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn single_class_predicts_certainty() {
        let x = vec![vec![1.0], vec![2.0]];
        let model = GbdtTrainer::new(1).fit(&x, &[0, 0], 1, &params()).unwrap();
        assert_eq!(model.predict_proba(&[5.0]), vec![1.0]);
    }

    #[test]
    fn rejects_inconsistent_input() {
        let t = GbdtTrainer::new(1);
        assert!(t.fit(&[], &[], 2, &params()).is_err());
        assert!(t.fit(&[vec![1.0]], &[3], 2, &params()).is_err());
        assert!(t.fit(&[vec![1.0], vec![1.0, 2.0]], &[0, 1], 2, &params()).is_err());
    }

    #[test]
    fn fitted_models_are_well_formed() {
        let (x, y) = separable();
        let model = GbdtTrainer::new(5).fit(&x, &y, 3, &params()).unwrap();
        assert!(model.validate().is_ok());
    }

    #[test]
    fn malformed_ensembles_are_rejected() {
        let (x, y) = separable();
        let model = GbdtTrainer::new(5).fit(&x, &y, 3, &params()).unwrap();
        let leaf = Tree::new(vec![Node::Leaf { weight: 0.5 }]);

        let mut extra_tree = model.clone();
        extra_tree.rounds[0].push(leaf.clone());
        assert!(matches!(extra_tree.validate(), Err(PredictError::SchemaMismatch(_))));

        let mut missing_tree = model.clone();
        missing_tree.rounds[0].pop();
        assert!(missing_tree.validate().is_err());

        let wide = Tree::new(vec![
            Node::Split {
                feature: 9,
                threshold: 0.5,
                left: 1,
                right: 2,
            },
            Node::Leaf { weight: -1.0 },
            Node::Leaf { weight: 1.0 },
        ]);
        let mut bad_feature = model.clone();
        bad_feature.rounds[0][0] = wide;
        assert!(bad_feature.validate().is_err());

        let looping = Tree::new(vec![
            Node::Split {
                feature: 0,
                threshold: 0.5,
                left: 0,
                right: 5,
            },
            Node::Leaf { weight: 1.0 },
        ]);
        let mut bad_child = model.clone();
        bad_child.rounds[0][1] = looping;
        assert!(bad_child.validate().is_err());

        let mut empty = model;
        empty.rounds[0][2] = Tree::new(Vec::new());
        assert!(empty.validate().is_err());
    }

    #[test]
    fn model_survives_json_round_trip() {
        let (x, y) = separable();
        let model = GbdtTrainer::new(3).fit(&x, &y, 3, &params()).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let back: GbdtModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back.predict_proba(&x[4]), model.predict_proba(&x[4]));
    }
}
