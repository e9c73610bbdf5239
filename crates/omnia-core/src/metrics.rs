// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Metric Core
// ─────────────────────────────────────────────────────────────────────
//! Named scalar diagnostics derived from an invariance report.
//!
//! | metric            | definition                                         | range  |
//! |-------------------|----------------------------------------------------|--------|
//! | `truth_omega`     | µ / max(ε, invariance)                             | ≥ 0    |
//! | `co_plus`         | 1 − invariance                                     | [0, 1] |
//! | `score_plus`      | w_inv·invariance + w_disp·(1 − 2σ)                 | [0, 1] |
//! | `delta_coherence` | σ of the pairwise distances                        | ≥ 0    |
//! | `kappa_alignment` | 1 − distance(a, b), exactly two signals            | [0, 1] |
//! | `epsilon_drift`   | (v₂ − v₁) / max(ε, \|v₁\|), or distance(t₁, t₂)     | signed |
//!
//! All functions are pure. A metric whose inputs are missing fails with
//! `MetricInput`; it is never filled with a default.

use omnia_types::{
    clamp_score, DriftMode, MetricRecord, OmniaConfig, OmniaError, OmniaResult, Representation,
};

use crate::distance::distance;
use crate::invariance::InvarianceReport;
use crate::registry::RepresentationSet;

/// σ of values in [0, 1] never exceeds 0.5; rescale it to [0, 1].
#[inline]
pub fn normalized_dispersion(spread: f64) -> f64 {
    clamp_score(2.0 * spread, 0.0, 1.0)
}

/// Metric derivation with a fixed configuration.
#[derive(Debug, Clone)]
pub struct MetricCore {
    config: OmniaConfig,
}

impl MetricCore {
    pub fn new(config: OmniaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OmniaConfig {
        &self.config
    }

    /// Structural incoherence; grows as disagreement rises and invariance falls.
    pub fn truth_omega(&self, report: &InvarianceReport) -> f64 {
        report.mean_distance / self.config.floor(report.invariance)
    }

    pub fn co_plus(&self, report: &InvarianceReport) -> f64 {
        clamp_score(1.0 - report.invariance, 0.0, 1.0)
    }

    pub fn score_plus(&self, report: &InvarianceReport) -> f64 {
        let blend = self.config.w_invariance * report.invariance
            + self.config.w_dispersion * (1.0 - normalized_dispersion(report.spread));
        clamp_score(blend, 0.0, 1.0)
    }

    /// σ reused from the aggregator.
    pub fn delta_coherence(&self, report: &InvarianceReport) -> f64 {
        report.spread
    }

    /// Similarity of exactly two signals.
    pub fn kappa_alignment(&self, a: &Representation, b: &Representation) -> OmniaResult<f64> {
        let d = distance(a, b)
            .map_err(|e| OmniaError::metric_input("kappa_alignment", e.to_string()))?;
        Ok(clamp_score(1.0 - d, 0.0, 1.0))
    }

    /// `kappa_alignment` inside a set: the named pair, or the only pair.
    pub fn kappa_alignment_in(
        &self,
        set: &RepresentationSet,
        pair: Option<(&str, &str)>,
    ) -> OmniaResult<f64> {
        let (a, b) = match pair {
            Some((a, b)) => {
                if a == b {
                    return Err(OmniaError::metric_input(
                        "kappa_alignment",
                        format!("pair names the same representation '{a}' twice"),
                    ));
                }
                let find = |name: &str| {
                    set.get(name).ok_or_else(|| {
                        OmniaError::metric_input(
                            "kappa_alignment",
                            format!("representation '{name}' not in set"),
                        )
                    })
                };
                (find(a)?, find(b)?)
            }
            None if set.len() == 2 => (&set.as_slice()[0], &set.as_slice()[1]),
            None => {
                return Err(OmniaError::metric_input(
                    "kappa_alignment",
                    format!(
                        "defined for exactly two signals; set has {} and no pair was given",
                        set.len()
                    ),
                ))
            }
        };
        self.kappa_alignment(a, b)
    }

    /// Relative change of a scalar series between two instants.
    pub fn epsilon_drift(&self, value_t1: f64, value_t2: f64) -> OmniaResult<f64> {
        if !value_t1.is_finite() || !value_t2.is_finite() {
            return Err(OmniaError::metric_input(
                "epsilon_drift",
                format!("non-finite sample ({value_t1}, {value_t2})"),
            ));
        }
        let drift = (value_t2 - value_t1) / self.config.floor(value_t1.abs());
        Ok(match self.config.drift_mode {
            DriftMode::Signed => drift,
            DriftMode::Absolute => drift.abs(),
        })
    }

    /// Drift between two temporal representations of a structured series.
    pub fn structural_drift(&self, at_t1: &Representation, at_t2: &Representation) -> OmniaResult<f64> {
        distance(at_t1, at_t2).map_err(|e| OmniaError::metric_input("epsilon_drift", e.to_string()))
    }

    /// Full record for one set evaluation.
    ///
    /// `kappa_pair` selects the pair for `kappa_alignment`; `previous_invariance`
    /// is the reference for `epsilon_drift`. Either may be absent, in which
    /// case the corresponding metric is omitted with its reason.
    pub fn record(
        &self,
        object_id: &str,
        report: &InvarianceReport,
        set: &RepresentationSet,
        kappa_pair: Option<(&str, &str)>,
        previous_invariance: Option<f64>,
    ) -> MetricRecord {
        let mut record = MetricRecord::new(object_id);
        record.set("truth_omega", Ok(self.truth_omega(report)));
        record.set("co_plus", Ok(self.co_plus(report)));
        record.set("score_plus", Ok(self.score_plus(report)));
        record.set("delta_coherence", Ok(self.delta_coherence(report)));
        record.set("kappa_alignment", self.kappa_alignment_in(set, kappa_pair));
        let drift = match previous_invariance {
            Some(prev) => self.epsilon_drift(prev, report.invariance),
            None => Err(OmniaError::metric_input(
                "epsilon_drift",
                "no previous invariance to drift from",
            )),
        };
        record.set("epsilon_drift", drift);
        record
    }
}
