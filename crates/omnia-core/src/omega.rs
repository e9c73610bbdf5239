// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Omega Convergence Estimator
// ─────────────────────────────────────────────────────────────────────
//! Iterative estimate (Ω̂) of the invariant residue of an object.
//!
//! Each step superposes the views of a growing lens set. What survives as
//! more independent lenses are added is the residue; the estimate has
//! converged once the invariance score stops moving by more than `epsilon`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use omnia_types::{DroppedRepresentation, Fracture, Object, OmniaError, OmniaResult};

use crate::lens::{Lens, LensConfig};
use crate::pipeline::{EvaluationRequest, SuperpositionPipeline};

/// One Ω̂ estimation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmegaStep {
    pub invariance: f64,
    /// |invariance − previous invariance|, 0 on the first step.
    pub delta_invariance: f64,
    pub fractures: Vec<Fracture>,
    pub n_views: usize,
    pub dropped: Vec<DroppedRepresentation>,
}

/// Steps of an incremental run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OmegaTrace {
    pub steps: Vec<OmegaStep>,
    /// Index of the step at which convergence was observed.
    pub converged_at: Option<usize>,
}

impl OmegaTrace {
    pub fn last(&self) -> Option<&OmegaStep> {
        self.steps.last()
    }
}

pub struct OmegaEstimator {
    pipeline: SuperpositionPipeline,
    epsilon: f64,
    max_steps: usize,
}

impl OmegaEstimator {
    pub fn new(pipeline: SuperpositionPipeline, epsilon: f64, max_steps: usize) -> OmniaResult<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(OmniaError::Config(format!(
                "omega epsilon must be > 0, got {epsilon}"
            )));
        }
        if max_steps == 0 {
            return Err(OmniaError::Config("omega max_steps must be >= 1".to_string()));
        }
        Ok(Self {
            pipeline,
            epsilon,
            max_steps,
        })
    }

    /// Defaults: epsilon 1e-3, 10 steps.
    pub fn with_defaults(pipeline: SuperpositionPipeline) -> Self {
        Self {
            pipeline,
            epsilon: 1e-3,
            max_steps: 10,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// One estimation step over `lenses`, given the steps so far.
    pub fn estimate(
        &self,
        object: &Object,
        lenses: &[Arc<dyn Lens>],
        lens_config: &LensConfig,
        history: &[OmegaStep],
    ) -> OmniaResult<OmegaStep> {
        let previous = history.last().map(|s| s.invariance);
        let request = EvaluationRequest {
            previous_invariance: previous,
            ..Default::default()
        };
        let eval = self
            .pipeline
            .evaluate_with_lenses(object, lenses, lens_config, &request)?;
        let invariance = eval.report.invariance;
        Ok(OmegaStep {
            invariance,
            delta_invariance: previous.map_or(0.0, |p| (invariance - p).abs()),
            fractures: eval.report.fractures,
            n_views: eval.report.n_views,
            dropped: eval.dropped,
        })
    }

    /// `|inv_k − inv_{k−1}| < epsilon` over the last two steps.
    pub fn converged(&self, history: &[OmegaStep]) -> bool {
        match history {
            [.., prev, last] => (last.invariance - prev.invariance).abs() < self.epsilon,
            _ => false,
        }
    }

    /// Walk `schedule` (lens sets of increasing independence) until the
    /// estimate converges or `max_steps` is reached.
    pub fn estimate_incremental(
        &self,
        object: &Object,
        schedule: &[Vec<Arc<dyn Lens>>],
        lens_config: &LensConfig,
    ) -> OmniaResult<OmegaTrace> {
        let mut trace = OmegaTrace::default();
        for lenses in schedule.iter().take(self.max_steps) {
            let step = self.estimate(object, lenses, lens_config, &trace.steps)?;
            trace.steps.push(step);
            if self.converged(&trace.steps) {
                trace.converged_at = Some(trace.steps.len() - 1);
                break;
            }
        }
        log::debug!(
            "omega '{}': {} steps, converged_at={:?}",
            object.id,
            trace.steps.len(),
            trace.converged_at
        );
        Ok(trace)
    }
}
