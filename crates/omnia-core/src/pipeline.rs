// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Superposition Pipeline
// ─────────────────────────────────────────────────────────────────────
//! Orchestration of one object (or a batch) through the core:
//! lenses → registry → matrix → aggregator → metric core.
//!
//! Every removal along the way is kept in the `Evaluation` with its reason:
//! failing lenses, duplicate names, audit violations, representations left
//! without a comparable partner, excluded pairs, omitted metrics.

use std::collections::BTreeSet;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use omnia_types::{
    DroppedRepresentation, ExcludedPair, MetricRecord, Object, OmniaConfig, OmniaError,
    OmniaResult, Representation,
};

use crate::invariance::{aggregate, InvarianceReport};
use crate::lens::{Lens, LensCatalog, LensConfig};
use crate::matrix::DistanceMatrix;
use crate::metrics::MetricCore;
use crate::registry::{RepresentationRegistry, RepresentationSet};

/// Optional inputs for the two metrics that need more than the matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Pair for `kappa_alignment` when the set has more than two members.
    pub kappa_pair: Option<(String, String)>,
    /// Invariance of the previous step, reference for `epsilon_drift`.
    pub previous_invariance: Option<f64>,
    pub timestamp_ms: Option<u64>,
}

/// Everything one object evaluation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub object_id: String,
    pub matrix: DistanceMatrix,
    pub report: InvarianceReport,
    pub record: MetricRecord,
    pub dropped: Vec<DroppedRepresentation>,
}

impl Evaluation {
    pub fn invariance(&self) -> f64 {
        self.report.invariance
    }

    pub fn excluded(&self) -> &[ExcludedPair] {
        self.matrix.excluded()
    }
}

/// One object of a batch.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub object: Object,
    pub representations: Vec<Representation>,
    pub request: EvaluationRequest,
}

/// Per-object result of a batch; failures never leave their object.
#[derive(Debug, Clone)]
pub struct ObjectOutcome {
    pub object_id: String,
    pub result: OmniaResult<Evaluation>,
}

/// Stateless superposition service.
#[derive(Clone)]
pub struct SuperpositionPipeline {
    config: OmniaConfig,
    metrics: MetricCore,
    catalog: Option<LensCatalog>,
    lens_config: LensConfig,
}

impl SuperpositionPipeline {
    pub fn new(config: OmniaConfig) -> OmniaResult<Self> {
        config.validate()?;
        Ok(Self {
            metrics: MetricCore::new(config.clone()),
            config,
            catalog: None,
            lens_config: LensConfig::new(),
        })
    }

    /// Lenses used to regenerate representations in audit mode.
    pub fn with_catalog(mut self, catalog: LensCatalog, lens_config: LensConfig) -> Self {
        self.catalog = Some(catalog);
        self.lens_config = lens_config;
        self
    }

    pub fn config(&self) -> &OmniaConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricCore {
        &self.metrics
    }

    /// Run `lenses` over `object`.
    ///
    /// A failing lens drops only its own views. With `dedupe_views` the first
    /// representation of a name wins and later ones are recorded as dropped.
    pub fn collect(
        &self,
        object: &Object,
        lenses: &[Arc<dyn Lens>],
        lens_config: &LensConfig,
    ) -> (Vec<Representation>, Vec<DroppedRepresentation>) {
        let mut reps: Vec<Representation> = Vec::new();
        let mut dropped = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();

        for lens in lenses {
            let set = match lens.generate(object, lens_config) {
                Ok(set) => set,
                Err(e) => {
                    let e = match e {
                        e @ OmniaError::LensGeneration { .. } => e,
                        other => OmniaError::LensGeneration {
                            lens: lens.id().to_string(),
                            reason: other.to_string(),
                        },
                    };
                    log::warn!("lens '{}' dropped for object '{}': {e}", lens.id(), object.id);
                    dropped.push(DroppedRepresentation::new(format!("lens:{}", lens.id()), &e));
                    continue;
                }
            };

            for rep in set.into_inner() {
                let rep = if rep.lens_id().is_some() {
                    rep
                } else {
                    rep.from_lens(lens.id())
                };
                if self.config.dedupe_views && !seen.insert(rep.name.clone()) {
                    let e = OmniaError::Validation(format!(
                        "duplicate representation name '{}' from lens '{}'",
                        rep.name,
                        lens.id()
                    ));
                    log::debug!("dedupe: {e}");
                    dropped.push(DroppedRepresentation::new(&rep.name, &e));
                    continue;
                }
                reps.push(rep);
            }
        }
        (reps, dropped)
    }

    /// Collect from `lenses`, then evaluate.
    pub fn evaluate_with_lenses(
        &self,
        object: &Object,
        lenses: &[Arc<dyn Lens>],
        lens_config: &LensConfig,
        request: &EvaluationRequest,
    ) -> OmniaResult<Evaluation> {
        let (reps, dropped) = self.collect(object, lenses, lens_config);
        if reps.len() < 2 {
            return Err(self.insufficient(object, reps.len(), dropped));
        }
        self.evaluate_inner(object, reps, dropped, lens_config, request)
    }

    /// Evaluate one object's representations.
    ///
    /// In audit mode lenses are replayed with the config given to
    /// `with_catalog`.
    pub fn evaluate(
        &self,
        object: &Object,
        representations: Vec<Representation>,
        request: &EvaluationRequest,
    ) -> OmniaResult<Evaluation> {
        self.evaluate_inner(object, representations, Vec::new(), &self.lens_config, request)
    }

    fn evaluate_inner(
        &self,
        object: &Object,
        representations: Vec<Representation>,
        mut dropped: Vec<DroppedRepresentation>,
        lens_config: &LensConfig,
        request: &EvaluationRequest,
    ) -> OmniaResult<Evaluation> {
        let mut set = RepresentationRegistry::admit(representations)?;

        if self.config.audit {
            let Some(catalog) = &self.catalog else {
                log::error!("audit requested for object '{}' without a lens catalog", object.id);
                return Err(OmniaError::Config(
                    "audit is enabled but no lens catalog is attached".to_string(),
                ));
            };
            let outcome = RepresentationRegistry::audit(&set, object, catalog, lens_config)?;
            dropped.extend(outcome.dropped);
            if outcome.retained.len() < 2 {
                return Err(self.insufficient(object, outcome.retained.len(), dropped));
            }
            set = RepresentationSet::new(outcome.retained)?;
        }

        let full = DistanceMatrix::build(&set, self.config.parallel_min_pairs);

        // A representation with no comparable partner cannot contribute.
        let mut viable = Vec::with_capacity(set.len());
        for (i, rep) in set.iter().enumerate() {
            if full.comparable_partners(i) > 0 {
                viable.push(i);
                continue;
            }
            let reason = full
                .excluded()
                .iter()
                .find(|e| e.pair.0 == rep.name || e.pair.1 == rep.name)
                .map(|e| e.reason.clone())
                .unwrap_or_else(|| "no comparable partner".to_string());
            log::warn!("'{}' of object '{}' has no comparable partner", rep.name, object.id);
            dropped.push(DroppedRepresentation {
                name: rep.name.clone(),
                reason,
            });
        }
        if viable.len() < 2 {
            return Err(self.insufficient(object, viable.len(), dropped));
        }
        let (set, matrix) = if viable.len() == set.len() {
            (set, full)
        } else {
            (set.select(&viable), full.restrict(&viable))
        };

        let report = aggregate(&matrix, self.config.fracture_k)?;
        let kappa_pair = request
            .kappa_pair
            .as_ref()
            .map(|(a, b)| (a.as_str(), b.as_str()));
        let mut record = self.metrics.record(
            &object.id,
            &report,
            &set,
            kappa_pair,
            request.previous_invariance,
        );
        record.timestamp_ms = request.timestamp_ms;

        log::debug!(
            "evaluated '{}': views={} invariance={:.4} fractures={} dropped={}",
            object.id,
            matrix.len(),
            report.invariance,
            report.fractures.len(),
            dropped.len()
        );

        Ok(Evaluation {
            object_id: object.id.clone(),
            matrix,
            report,
            record,
            dropped,
        })
    }

    fn insufficient(
        &self,
        object: &Object,
        viable: usize,
        dropped: Vec<DroppedRepresentation>,
    ) -> OmniaError {
        OmniaError::InsufficientRepresentations {
            object: object.id.clone(),
            viable,
            dropped,
        }
    }

    /// Evaluate independent objects in parallel.
    ///
    /// Output order follows input order; a failure stays with its object.
    pub fn evaluate_batch(&self, items: Vec<BatchItem>) -> Vec<ObjectOutcome> {
        items
            .into_par_iter()
            .map(|item| {
                let result = self.evaluate(&item.object, item.representations, &item.request);
                if let Err(e) = &result {
                    log::error!("object '{}' failed: {e}", item.object.id);
                }
                ObjectOutcome {
                    object_id: item.object.id,
                    result,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lens::ExternalLens;
    use omnia_types::{MetaValue, Payload};

    fn text(name: &str, s: &str) -> Representation {
        Representation::new(name, Payload::Text(s.into()))
    }

    fn pipeline() -> SuperpositionPipeline {
        SuperpositionPipeline::new(OmniaConfig::default()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let cfg = OmniaConfig {
            epsilon_floor: 0.0,
            ..Default::default()
        };
        assert!(SuperpositionPipeline::new(cfg).is_err());
    }

    #[test]
    fn test_two_signal_evaluation() {
        let eval = pipeline()
            .evaluate(
                &Object::new("42"),
                vec![text("base_10", "42"), text("base_2", "101010")],
                &EvaluationRequest::default(),
            )
            .unwrap();
        assert_eq!(eval.report.compared_pairs, 1);
        assert_eq!(eval.record.kappa_alignment, Some(1.0 - eval.report.mean_distance));
        assert!(eval.record.epsilon_drift.is_none());
        assert_eq!(eval.record.omitted.len(), 1);
    }

    #[test]
    fn test_drift_against_previous() {
        let request = EvaluationRequest {
            previous_invariance: Some(0.5),
            timestamp_ms: Some(1_700_000_000_000),
            ..Default::default()
        };
        let eval = pipeline()
            .evaluate(&Object::new("x"), vec![text("a", "ab"), text("b", "ab")], &request)
            .unwrap();
        assert_eq!(eval.invariance(), 1.0);
        assert!((eval.record.epsilon_drift.unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(eval.record.timestamp_ms, Some(1_700_000_000_000));
    }

    #[test]
    fn test_unsupported_member_dropped() {
        let eval = pipeline()
            .evaluate(
                &Object::new("42"),
                vec![
                    text("base_10", "42"),
                    Representation::new("value", Payload::Scalar(42.0)),
                    text("base_16", "2a"),
                ],
                &EvaluationRequest::default(),
            )
            .unwrap();
        assert_eq!(eval.matrix.names(), &["base_10".to_string(), "base_16".to_string()]);
        assert_eq!(eval.dropped.len(), 1);
        assert_eq!(eval.dropped[0].name, "value");
        assert!(eval.dropped[0].reason.contains("unsupported representation pair"));
    }

    #[test]
    fn test_insufficient_after_exclusion() {
        let err = pipeline()
            .evaluate(
                &Object::new("mixed"),
                vec![
                    text("t", "42"),
                    Representation::new("s", Payload::Scalar(42.0)),
                    Representation::new("g", Payload::graph([("a", "b")])),
                ],
                &EvaluationRequest::default(),
            )
            .unwrap_err();
        let (object, viable, dropped) = match err {
            OmniaError::InsufficientRepresentations {
                object,
                viable,
                dropped,
            } => (object, viable, dropped),
            other => panic!("unexpected error {other:?}"),
        };
        assert_eq!(object, "mixed");
        assert_eq!(viable, 0);
        let names: Vec<&str> = dropped.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["t", "s", "g"]);
        assert!(dropped
            .iter()
            .all(|d| d.reason.contains("unsupported representation pair")));
    }

    #[test]
    fn test_insufficient_keeps_lens_drops() {
        let single: Arc<dyn Lens> = Arc::new(ExternalLens::new("single", |obj, _| {
            RepresentationSet::new(vec![text("orig", &obj.id)])
        }));
        let broken: Arc<dyn Lens> = Arc::new(ExternalLens::new("broken", |_, _| {
            Err(OmniaError::Numerical("overflow".into()))
        }));
        let err = pipeline()
            .evaluate_with_lenses(
                &Object::new("x"),
                &[single, broken],
                &LensConfig::new(),
                &EvaluationRequest::default(),
            )
            .unwrap_err();
        match err {
            OmniaError::InsufficientRepresentations { viable, dropped, .. } => {
                assert_eq!(viable, 1);
                assert_eq!(dropped.len(), 1);
                assert_eq!(dropped[0].name, "lens:broken");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_collect_drops_failing_lens_and_duplicates() {
        let orig: Arc<dyn Lens> = Arc::new(ExternalLens::new("orig", |obj, _| {
            RepresentationSet::new(vec![text("orig", &obj.id)])
        }));
        let case: Arc<dyn Lens> = Arc::new(ExternalLens::new("case", |obj, _| {
            RepresentationSet::new(vec![text("orig", &obj.id), text("upper", &obj.id.to_uppercase())])
        }));
        let broken: Arc<dyn Lens> = Arc::new(ExternalLens::new("broken", |_, _| {
            Err(OmniaError::Numerical("overflow".into()))
        }));

        let p = pipeline();
        let (reps, dropped) = p.collect(&Object::new("omnia"), &[orig, case, broken], &LensConfig::new());
        let names: Vec<&str> = reps.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["orig", "upper"]);
        assert_eq!(reps[0].lens_id(), Some("orig"));
        assert_eq!(reps[1].lens_id(), Some("case"));
        assert_eq!(dropped.len(), 2);
        assert_eq!(dropped[0].name, "orig");
        assert_eq!(dropped[1].name, "lens:broken");
        assert!(dropped[1].reason.contains("lens 'broken' generation error"));
    }

    #[test]
    fn test_evaluate_with_lenses_insufficient() {
        let single: Arc<dyn Lens> = Arc::new(ExternalLens::new("single", |obj, _| {
            RepresentationSet::new(vec![text("orig", &obj.id)])
        }));
        let err = pipeline()
            .evaluate_with_lenses(&Object::new("x"), &[single], &LensConfig::new(), &EvaluationRequest::default())
            .unwrap_err();
        assert!(matches!(err, OmniaError::InsufficientRepresentations { viable: 1, .. }));
    }

    #[test]
    fn test_audit_mode_drops_violation() {
        use std::sync::atomic::{AtomicU64, Ordering};
        let ticks = Arc::new(AtomicU64::new(100));
        let t = ticks.clone();
        let clock = ExternalLens::new("clock", move |_, _| {
            let v = t.fetch_add(1, Ordering::SeqCst);
            RepresentationSet::new(vec![text("stamp", &v.to_string()).from_lens("clock")])
        });
        let cfg = OmniaConfig {
            audit: true,
            ..Default::default()
        };
        let p = SuperpositionPipeline::new(cfg)
            .unwrap()
            .with_catalog(LensCatalog::new().with(Arc::new(clock)), LensConfig::new());

        let reps = vec![
            text("stamp", "0").from_lens("clock"),
            text("a", "abc"),
            text("b", "abd"),
        ];
        let eval = p.evaluate(&Object::new("o"), reps, &EvaluationRequest::default()).unwrap();
        assert_eq!(eval.matrix.len(), 2);
        assert_eq!(eval.dropped.len(), 1);
        assert_eq!(eval.dropped[0].name, "stamp");
    }

    #[test]
    fn test_audit_replays_with_generation_config() {
        let radix: Arc<dyn Lens> = Arc::new(ExternalLens::new("radix", |obj, cfg| {
            let n: u64 = obj
                .id
                .parse()
                .map_err(|e| OmniaError::Validation(format!("not a number: {e}")))?;
            let base = match cfg.get("base") {
                Some(MetaValue::Int(b)) => *b,
                _ => 10,
            };
            let digits = match base {
                2 => format!("{n:b}"),
                16 => format!("{n:x}"),
                _ => n.to_string(),
            };
            RepresentationSet::new(vec![
                text(&format!("base_{base}"), &digits),
                text("decimal", &n.to_string()),
            ])
        }));
        let cfg = OmniaConfig {
            audit: true,
            ..Default::default()
        };
        let p = SuperpositionPipeline::new(cfg)
            .unwrap()
            .with_catalog(LensCatalog::new().with(radix.clone()), LensConfig::new());
        let mut lens_config = LensConfig::new();
        lens_config.insert("base".into(), MetaValue::Int(2));

        let eval = p
            .evaluate_with_lenses(&Object::new("42"), &[radix], &lens_config, &EvaluationRequest::default())
            .unwrap();
        assert_eq!(eval.matrix.names(), &["base_2".to_string(), "decimal".to_string()]);
        assert!(eval.dropped.is_empty());
    }

    #[test]
    fn test_audit_without_catalog_is_rejected() {
        let p = SuperpositionPipeline::new(OmniaConfig {
            audit: true,
            ..Default::default()
        })
        .unwrap();
        let err = p
            .evaluate(&Object::new("o"), vec![text("a", "x"), text("b", "y")], &EvaluationRequest::default())
            .unwrap_err();
        assert!(matches!(err, OmniaError::Config(_)));
    }

    #[test]
    fn test_batch_isolates_failures() {
        let items = vec![
            BatchItem {
                object: Object::new("good"),
                representations: vec![text("a", "abc"), text("b", "abd")],
                request: EvaluationRequest::default(),
            },
            BatchItem {
                object: Object::new("bad"),
                representations: vec![text("a", "abc")],
                request: EvaluationRequest::default(),
            },
            BatchItem {
                object: Object::new("also-good"),
                representations: vec![text("a", "x"), text("b", "x"), text("c", "y")],
                request: EvaluationRequest::default(),
            },
        ];
        let out = pipeline().evaluate_batch(items);
        let ids: Vec<&str> = out.iter().map(|o| o.object_id.as_str()).collect();
        assert_eq!(ids, vec!["good", "bad", "also-good"]);
        assert!(out[0].result.is_ok());
        assert!(matches!(out[1].result, Err(OmniaError::Validation(_))));
        assert!(out[2].result.is_ok());
    }
}
