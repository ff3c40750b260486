//! Top-k ranking of class probabilities and the triage hint.

use std::fmt;

use crate::features::CategoryEncoder;

use super::domain::TopPrediction;

pub const TOP_K: usize = 3;
pub const UNKNOWN_DISEASE: &str = "Unknown Disease";

/// Class indices of the `k` largest probabilities, highest first. Equal
/// probabilities keep ascending index order. NaN sorts below everything.
pub fn top_indices(probs: &[f64], k: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..probs.len()).collect();
    idx.sort_by(|&a, &b| {
        let (pa, pb) = (nan_low(probs[a]), nan_low(probs[b]));
        pb.total_cmp(&pa).then(a.cmp(&b))
    });
    idx.truncate(k);
    idx
}

fn nan_low(p: f64) -> f64 {
    if p.is_nan() {
        f64::NEG_INFINITY
    } else {
        p
    }
}

fn percent(p: f64) -> f64 {
    (p * 100.0 * 100.0).round() / 100.0
}

/// Rank the top `k` classes and name them through the label decoder.
pub fn rank(probs: &[f64], labels: &CategoryEncoder, k: usize) -> Vec<TopPrediction> {
    top_indices(probs, k)
        .into_iter()
        .map(|idx| TopPrediction {
            disease: labels.label(idx).unwrap_or(UNKNOWN_DISEASE).to_string(),
            probability: percent(probs[idx]),
        })
        .collect()
}

/// Coarse triage hint derived from the top prediction only.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Recommendation {
    RestAndHydrate,
    ConsultDoctor,
}

const SELF_CARE: [&str; 3] = ["common cold", "flu", "mild flu"];

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::RestAndHydrate => "Rest and stay hydrated",
            Recommendation::ConsultDoctor => "Consult a doctor",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn recommend(top: &[TopPrediction]) -> Recommendation {
    match top.first() {
        Some(first) if SELF_CARE.contains(&first.disease.to_lowercase().as_str()) => {
            Recommendation::RestAndHydrate
        }
        _ => Recommendation::ConsultDoctor,
    }
}
