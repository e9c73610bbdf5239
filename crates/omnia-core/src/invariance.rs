// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Invariance Aggregator + Fracture Detector
// ─────────────────────────────────────────────────────────────────────
//! Reduces a distance matrix to one invariance score and flags fractures.
//!
//! `invariance = 1 − µ` over the comparable off-diagonal distances. A pair
//! is a fracture when `d > µ + k·σ`, so the cut-off is calibrated on the
//! matrix at hand. With σ = 0 nothing is flagged, whatever µ is.

use serde::{Deserialize, Serialize};

use omnia_types::{clamp_score, Fracture, OmniaError, OmniaResult};

use crate::matrix::DistanceMatrix;

/// σ at or below this counts as "all distances equal".
const DEGENERATE_SPREAD: f64 = 1e-12;

/// Aggregated view of one distance matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvarianceReport {
    /// 1 = perfect agreement, 0 = maximal disagreement.
    pub invariance: f64,
    /// µ of the comparable off-diagonal distances.
    pub mean_distance: f64,
    /// σ (population) of the same distances.
    pub spread: f64,
    pub fractures: Vec<Fracture>,
    pub compared_pairs: usize,
    pub n_views: usize,
}

impl InvarianceReport {
    pub fn fracture_keys(&self) -> Vec<String> {
        self.fractures.iter().map(Fracture::key).collect()
    }
}

/// Mean and population standard deviation.
pub fn mean_and_spread(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|&d| (d - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Aggregate `matrix` with fracture sensitivity `k`.
///
/// Fails with `Validation` when the matrix holds no comparable pair.
pub fn aggregate(matrix: &DistanceMatrix, k: f64) -> OmniaResult<InvarianceReport> {
    let distances = matrix.off_diagonal();
    if distances.is_empty() {
        return Err(OmniaError::Validation(format!(
            "distance matrix over {} representations has no comparable pair",
            matrix.len()
        )));
    }

    let (mean, spread) = mean_and_spread(&distances);
    let invariance = clamp_score(1.0 - mean, 0.0, 1.0);

    let fractures = if spread <= DEGENERATE_SPREAD {
        Vec::new()
    } else {
        let cutoff = mean + k * spread;
        let names = matrix.names();
        matrix
            .pairs()
            .filter(|&(_, _, d)| d > cutoff)
            .map(|(i, j, d)| Fracture {
                pair: (names[i].clone(), names[j].clone()),
                distance: d,
                deviation: d - mean,
            })
            .collect()
    };

    log::debug!(
        "aggregate: n={} pairs={} mean={mean:.4} sigma={spread:.4} fractures={}",
        matrix.len(),
        distances.len(),
        fractures.len()
    );

    Ok(InvarianceReport {
        invariance,
        mean_distance: mean,
        spread,
        fractures,
        compared_pairs: distances.len(),
        n_views: matrix.len(),
    })
}
