// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Omnia Kernel Output Records
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{OmniaError, OmniaResult};

/// Stable metric field names of a `MetricRecord`.
pub const METRIC_FIELDS: [&str; 6] = [
    "truth_omega",
    "co_plus",
    "score_plus",
    "delta_coherence",
    "kappa_alignment",
    "epsilon_drift",
];

/// Clamp a value to [lo, hi], mapping NaN to lo and Inf to nearest bound.
#[inline]
pub fn clamp_score(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_score: NaN detected, clamping to {lo:.4}");
        return lo;
    }
    if value.is_infinite() {
        let boundary = if value > 0.0 { hi } else { lo };
        log::warn!("clamp_score: Inf detected, clamping to {boundary:.4}");
        return boundary;
    }
    value.clamp(lo, hi)
}

/// A representation pair whose distance is an outlier in its own matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fracture {
    pub pair: (String, String),
    pub distance: f64,
    /// `distance − µ` of the matrix the fracture came from.
    pub deviation: f64,
}

impl Fracture {
    /// `a__b` key used in flat reports.
    pub fn key(&self) -> String {
        format!("{}__{}", self.pair.0, self.pair.1)
    }
}

/// A pair left out of the distance matrix, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedPair {
    pub pair: (String, String),
    pub reason: String,
}

/// A representation removed before or during evaluation, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedRepresentation {
    pub name: String,
    pub reason: String,
}

impl DroppedRepresentation {
    pub fn new(name: impl Into<String>, error: &OmniaError) -> Self {
        Self {
            name: name.into(),
            reason: error.to_string(),
        }
    }
}

/// A metric left out of a record, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmittedMetric {
    pub metric: String,
    pub reason: String,
}

/// Named scalar diagnostics for one evaluation.
///
/// Field names are part of the stable output contract. A `None` metric is
/// always accompanied by an entry in `omitted`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub object_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    /// Structural incoherence, 0 = perfect coherence, unbounded above.
    pub truth_omega: Option<f64>,
    /// Inverse coherence in [0, 1].
    pub co_plus: Option<f64>,
    /// Composite score in [0, 1].
    pub score_plus: Option<f64>,
    /// Dispersion of the pairwise distances (σ), ≥ 0.
    pub delta_coherence: Option<f64>,
    /// Two-signal similarity in [0, 1].
    pub kappa_alignment: Option<f64>,
    /// Relative temporal change.
    pub epsilon_drift: Option<f64>,
    #[serde(default)]
    pub omitted: Vec<OmittedMetric>,
}

impl MetricRecord {
    pub fn new(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            ..Default::default()
        }
    }

    /// Store a metric outcome; an error becomes an `omitted` entry.
    pub fn set(&mut self, metric: &str, outcome: OmniaResult<f64>) {
        let value = match outcome {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("metric '{metric}' omitted for '{}': {e}", self.object_id);
                self.omitted.push(OmittedMetric {
                    metric: metric.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        };
        match metric {
            "truth_omega" => self.truth_omega = value,
            "co_plus" => self.co_plus = value,
            "score_plus" => self.score_plus = value,
            "delta_coherence" => self.delta_coherence = value,
            "kappa_alignment" => self.kappa_alignment = value,
            "epsilon_drift" => self.epsilon_drift = value,
            other => log::warn!("MetricRecord::set: unknown metric '{other}' ignored"),
        }
    }

    /// Look up a metric by its stable field name.
    pub fn get(&self, metric: &str) -> Option<f64> {
        match metric {
            "truth_omega" => self.truth_omega,
            "co_plus" => self.co_plus,
            "score_plus" => self.score_plus,
            "delta_coherence" => self.delta_coherence,
            "kappa_alignment" => self.kappa_alignment,
            "epsilon_drift" => self.epsilon_drift,
            _ => None,
        }
    }

    /// Present metrics as `(name, value)` in contract order.
    pub fn metrics(&self) -> Vec<(&'static str, f64)> {
        METRIC_FIELDS
            .iter()
            .filter_map(|name| self.get(name).map(|v| (*name, v)))
            .collect()
    }

    /// Single-line JSON, one record per line.
    pub fn to_json_line(&self) -> OmniaResult<String> {
        serde_json::to_string(self)
            .map_err(|e| OmniaError::Numerical(format!("record serialization failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_nan() {
        assert_eq!(clamp_score(f64::NAN, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_clamp_pos_inf() {
        assert_eq!(clamp_score(f64::INFINITY, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_clamp_neg_inf() {
        assert_eq!(clamp_score(f64::NEG_INFINITY, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_clamp_normal() {
        assert_eq!(clamp_score(0.75, 0.0, 1.0), 0.75);
        assert_eq!(clamp_score(1.5, 0.0, 1.0), 1.0);
        assert_eq!(clamp_score(-0.3, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_fracture_key() {
        let f = Fracture {
            pair: ("orig".into(), "sha256".into()),
            distance: 0.9,
            deviation: 0.3,
        };
        assert_eq!(f.key(), "orig__sha256");
    }

    #[test]
    fn test_record_set_records_omission() {
        let mut rec = MetricRecord::new("obj-1");
        rec.set("co_plus", Ok(0.25));
        rec.set(
            "kappa_alignment",
            Err(OmniaError::metric_input("kappa_alignment", "3 representations, no pair given")),
        );
        assert_eq!(rec.co_plus, Some(0.25));
        assert_eq!(rec.kappa_alignment, None);
        assert_eq!(rec.omitted.len(), 1);
        assert_eq!(rec.omitted[0].metric, "kappa_alignment");
        assert!(rec.omitted[0].reason.contains("no pair given"));
    }

    #[test]
    fn test_record_metrics_order() {
        let mut rec = MetricRecord::new("x");
        rec.set("epsilon_drift", Ok(-0.1));
        rec.set("truth_omega", Ok(0.5));
        let names: Vec<&str> = rec.metrics().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["truth_omega", "epsilon_drift"]);
    }

    #[test]
    fn test_json_line_field_names() {
        let mut rec = MetricRecord::new("42");
        rec.set("score_plus", Ok(0.5));
        let line = rec.to_json_line().unwrap();
        assert!(!line.contains('\n'));
        let v: serde_json::Value = serde_json::from_str(&line).unwrap();
        for field in METRIC_FIELDS {
            assert!(v.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(v["score_plus"], serde_json::json!(0.5));
        assert!(v["truth_omega"].is_null());
    }
}
