// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Pairwise Distance Matrix
// ─────────────────────────────────────────────────────────────────────
//! Symmetric, zero-diagonal distance matrix over one representation set.
//!
//! The upper triangle is the O(n²) cost center. Pairs are independent, so
//! above `parallel_min_pairs` they are evaluated with rayon and written back
//! into disjoint cells; the result is identical to the sequential build.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use omnia_types::{ExcludedPair, OmniaError, OmniaResult};

use crate::distance::distance;
use crate::registry::RepresentationSet;

/// Immutable pairwise distances, row-major n×n.
///
/// `None` marks a pair excluded for lack of a comparator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixParts")]
pub struct DistanceMatrix {
    names: Vec<String>,
    cells: Vec<Option<f64>>,
    excluded: Vec<ExcludedPair>,
}

/// Unchecked serialized form; `DistanceMatrix` is only built from it
/// after the shape and cell checks pass.
#[derive(Deserialize)]
struct MatrixParts {
    names: Vec<String>,
    cells: Vec<Option<f64>>,
    #[serde(default)]
    excluded: Vec<ExcludedPair>,
}

impl TryFrom<MatrixParts> for DistanceMatrix {
    type Error = OmniaError;

    fn try_from(parts: MatrixParts) -> OmniaResult<Self> {
        let n = parts.names.len();
        if parts.cells.len() != n * n {
            return Err(OmniaError::Validation(format!(
                "{n} names need {} cells, got {}",
                n * n,
                parts.cells.len()
            )));
        }
        for i in 0..n {
            if parts.cells[i * n + i] != Some(0.0) {
                return Err(OmniaError::Validation(format!(
                    "diagonal cell ({i}, {i}) must be 0"
                )));
            }
            for j in (i + 1)..n {
                let (upper, lower) = (parts.cells[i * n + j], parts.cells[j * n + i]);
                if upper != lower {
                    return Err(OmniaError::Validation(format!(
                        "cells ({i}, {j}) and ({j}, {i}) differ"
                    )));
                }
                if let Some(d) = upper {
                    if !(0.0..=1.0).contains(&d) {
                        return Err(OmniaError::Validation(format!(
                            "distance {d} at ({i}, {j}) outside [0, 1]"
                        )));
                    }
                }
            }
        }
        Ok(Self {
            names: parts.names,
            cells: parts.cells,
            excluded: parts.excluded,
        })
    }
}

impl DistanceMatrix {
    /// Build the full matrix for `set`.
    pub fn build(set: &RepresentationSet, parallel_min_pairs: usize) -> Self {
        let reps = set.as_slice();
        let n = reps.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();

        let eval = |&(i, j): &(usize, usize)| -> (usize, usize, OmniaResult<f64>) {
            (i, j, distance(&reps[i], &reps[j]))
        };
        let results: Vec<(usize, usize, OmniaResult<f64>)> = if pairs.len() >= parallel_min_pairs {
            pairs.par_iter().map(eval).collect()
        } else {
            pairs.iter().map(eval).collect()
        };

        let mut cells = vec![None; n * n];
        for i in 0..n {
            cells[i * n + i] = Some(0.0);
        }
        let mut excluded = Vec::new();
        for (i, j, outcome) in results {
            match outcome {
                Ok(d) => {
                    cells[i * n + j] = Some(d);
                    cells[j * n + i] = Some(d);
                }
                Err(e) => {
                    log::warn!("pair ({}, {}) excluded: {e}", reps[i].name, reps[j].name);
                    excluded.push(ExcludedPair {
                        pair: (reps[i].name.clone(), reps[j].name.clone()),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Self {
            names: reps.iter().map(|r| r.name.clone()).collect(),
            cells,
            excluded,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn excluded(&self) -> &[ExcludedPair] {
        &self.excluded
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        let n = self.len();
        if i >= n || j >= n {
            return None;
        }
        self.cells[i * n + j]
    }

    /// Distance by representation names.
    pub fn distance(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        self.get(i, j)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Comparable upper-triangle entries `(i, j, d)` in row order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let n = self.len();
        (0..n).flat_map(move |i| {
            ((i + 1)..n).filter_map(move |j| self.cells[i * n + j].map(|d| (i, j, d)))
        })
    }

    /// Comparable off-diagonal distances, each pair once.
    pub fn off_diagonal(&self) -> Vec<f64> {
        self.pairs().map(|(_, _, d)| d).collect()
    }

    /// Number of comparable partners of representation `i`.
    pub fn comparable_partners(&self, i: usize) -> usize {
        (0..self.len())
            .filter(|&j| j != i && self.get(i, j).is_some())
            .count()
    }

    /// Sub-matrix over `indices`, keeping exclusions among retained names.
    pub fn restrict(&self, indices: &[usize]) -> Self {
        let n = self.len();
        let m = indices.len();
        let mut cells = vec![None; m * m];
        for (a, &i) in indices.iter().enumerate() {
            for (b, &j) in indices.iter().enumerate() {
                cells[a * m + b] = self.cells[i * n + j];
            }
        }
        let names: Vec<String> = indices.iter().map(|&i| self.names[i].clone()).collect();
        let excluded = self
            .excluded
            .iter()
            .filter(|e| names.contains(&e.pair.0) && names.contains(&e.pair.1))
            .cloned()
            .collect();
        Self {
            names,
            cells,
            excluded,
        }
    }

    /// Matrix from explicit upper-triangle distances, row order.
    ///
    /// For callers that already hold distances (replays, tests).
    pub fn from_upper(names: Vec<String>, upper: &[f64]) -> OmniaResult<Self> {
        let n = names.len();
        let expected = n * n.saturating_sub(1) / 2;
        if upper.len() != expected {
            return Err(OmniaError::Validation(format!(
                "{n} names need {expected} upper-triangle distances, got {}",
                upper.len()
            )));
        }
        if let Some(bad) = upper.iter().find(|d| !(0.0..=1.0).contains(*d)) {
            return Err(OmniaError::Validation(format!(
                "distance {bad} outside [0, 1]"
            )));
        }
        let mut cells = vec![None; n * n];
        let mut k = 0;
        for i in 0..n {
            cells[i * n + i] = Some(0.0);
            for j in (i + 1)..n {
                cells[i * n + j] = Some(upper[k]);
                cells[j * n + i] = Some(upper[k]);
                k += 1;
            }
        }
        Ok(Self {
            names,
            cells,
            excluded: Vec::new(),
        })
    }
}
