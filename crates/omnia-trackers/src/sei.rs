// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Saturation Tracker (SEI)
// ─────────────────────────────────────────────────────────────────────
//! Saturation tracker.
//!
//! `sei = (Δquality + Δuncertainty_reduction) / Δcost`, with Δ taken against
//! the previous observation (or the oldest one in the window, per
//! `DeltaBaseline`). The window is strict FIFO and owned by the caller:
//! `sei_update` consumes a state and returns the next one.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use omnia_types::{DeltaBaseline, OmniaError, OmniaResult, SeiConfig, SeiCostWeights};

/// Raw cost components of one step, before weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostComponents {
    pub tokens: f64,
    pub latency_ms: f64,
    pub iterations: f64,
    pub energy: f64,
}

/// One `(quality, uncertainty_reduction, cost)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeiObservation {
    pub quality: f64,
    pub uncertainty_reduction: f64,
    /// Cumulative cost at this step.
    pub cost: f64,
}

impl SeiObservation {
    pub fn new(quality: f64, uncertainty_reduction: f64, cost: f64) -> Self {
        Self {
            quality,
            uncertainty_reduction,
            cost,
        }
    }

    /// Observation whose cost is the weighted sum of `components`.
    pub fn from_components(
        quality: f64,
        uncertainty_reduction: f64,
        components: &CostComponents,
        weights: &SeiCostWeights,
    ) -> Self {
        Self::new(
            quality,
            uncertainty_reduction,
            weights.aggregate(
                components.tokens,
                components.latency_ms,
                components.iterations,
                components.energy,
            ),
        )
    }

    fn validate(&self) -> OmniaResult<()> {
        for (field, v) in [
            ("quality", self.quality),
            ("uncertainty_reduction", self.uncertainty_reduction),
            ("cost", self.cost),
        ] {
            if !v.is_finite() {
                return Err(OmniaError::Validation(format!(
                    "SEI observation {field} is not finite: {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Result of one update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SeiReading {
    Yield(f64),
    /// Δcost was zero; the ratio is undefined.
    NoMarginalCost,
    /// First observation, nothing to take a delta against.
    Warmup,
}

impl SeiReading {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Yield(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SeiEntry {
    observation: SeiObservation,
    reading: SeiReading,
}

/// Rolling SEI window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeiState {
    capacity: usize,
    baseline: DeltaBaseline,
    entries: VecDeque<SeiEntry>,
    last_trend: Option<f64>,
}

impl SeiState {
    /// Empty window; fails with `Config` when `window < 2`.
    pub fn new(config: &SeiConfig) -> OmniaResult<Self> {
        if config.window < 2 {
            return Err(OmniaError::Config(format!(
                "sei.window must be >= 2, got {}",
                config.window
            )));
        }
        Ok(Self {
            capacity: config.window,
            baseline: config.baseline,
            entries: VecDeque::with_capacity(config.window),
            last_trend: None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Observations in the window, oldest first.
    pub fn observations(&self) -> impl Iterator<Item = &SeiObservation> {
        self.entries.iter().map(|e| &e.observation)
    }

    /// Readings in the window, oldest first.
    pub fn readings(&self) -> impl Iterator<Item = SeiReading> + '_ {
        self.entries.iter().map(|e| e.reading)
    }

    /// Trend computed at the last update.
    pub fn last_trend(&self) -> Option<f64> {
        self.last_trend
    }

    /// Least-squares slope of the yields against their window position.
    ///
    /// `None` with fewer than two yields. A flat or negative slope is data,
    /// not a stop signal.
    pub fn trend(&self) -> Option<f64> {
        let points: Vec<(f64, f64)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.reading.value().map(|y| (i as f64, y)))
            .collect();
        if points.len() < 2 {
            return None;
        }
        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
        let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
        let sxy: f64 = points.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
        Some(sxy / sxx)
    }

    fn reference(&self) -> Option<&SeiObservation> {
        match self.baseline {
            DeltaBaseline::Previous => self.entries.back(),
            DeltaBaseline::WindowFirst => self.entries.front(),
        }
        .map(|e| &e.observation)
    }
}

/// Fold `observation` into `state`.
pub fn sei_update(
    mut state: SeiState,
    observation: SeiObservation,
) -> OmniaResult<(SeiState, SeiReading)> {
    observation.validate()?;

    let reading = match state.reference() {
        None => SeiReading::Warmup,
        Some(base) => {
            let d_cost = observation.cost - base.cost;
            if d_cost == 0.0 {
                SeiReading::NoMarginalCost
            } else {
                let gain = (observation.quality - base.quality)
                    + (observation.uncertainty_reduction - base.uncertainty_reduction);
                SeiReading::Yield(gain / d_cost)
            }
        }
    };

    if state.entries.len() == state.capacity {
        state.entries.pop_front();
    }
    state.entries.push_back(SeiEntry {
        observation,
        reading,
    });
    state.last_trend = state.trend();

    log::debug!(
        "sei_update: reading={reading:?} window={}/{} trend={:?}",
        state.entries.len(),
        state.capacity,
        state.last_trend
    );
    Ok((state, reading))
}
