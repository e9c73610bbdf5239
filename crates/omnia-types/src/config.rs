// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Omnia Kernel Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{OmniaError, OmniaResult};

/// Sign policy for `epsilon_drift`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftMode {
    /// Keep the direction of change.
    Signed,
    /// Report magnitude only.
    Absolute,
}

/// Reference entry for SEI deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaBaseline {
    /// Δ against the previous observation (responsive).
    Previous,
    /// Δ against the oldest observation still in the window (running trend).
    WindowFirst,
}

/// Weights folding the cost components of one step into a single scalar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeiCostWeights {
    pub tokens: f64,
    pub latency_ms: f64,
    pub iterations: f64,
    pub energy: f64,
}

impl Default for SeiCostWeights {
    fn default() -> Self {
        Self {
            tokens: 1.0,
            latency_ms: 0.0,
            iterations: 0.0,
            energy: 0.0,
        }
    }
}

impl SeiCostWeights {
    fn as_array(&self) -> [f64; 4] {
        [self.tokens, self.latency_ms, self.iterations, self.energy]
    }

    /// Weighted sum of the four cost components.
    pub fn aggregate(&self, tokens: f64, latency_ms: f64, iterations: f64, energy: f64) -> f64 {
        self.tokens * tokens
            + self.latency_ms * latency_ms
            + self.iterations * iterations
            + self.energy * energy
    }
}

/// Saturation tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeiConfig {
    /// Rolling window capacity (observations).
    pub window: usize,
    pub baseline: DeltaBaseline,
    pub cost_weights: SeiCostWeights,
}

impl Default for SeiConfig {
    fn default() -> Self {
        Self {
            window: 8,
            baseline: DeltaBaseline::Previous,
            cost_weights: SeiCostWeights::default(),
        }
    }
}

/// Irreversibility tracker configuration.
///
/// The bands only label a report; they never change control flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IriConfig {
    /// IRI at or below this is labelled reversible.
    pub reversible_band: f64,
    /// IRI at or above this is labelled strong hysteresis.
    pub strong_band: f64,
}

impl Default for IriConfig {
    fn default() -> Self {
        Self {
            reversible_band: 0.05,
            strong_band: 0.5,
        }
    }
}

/// Runtime configuration surfaced to the measurement core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OmniaConfig {
    /// Fracture sensitivity: a pair is a fracture when d > µ + k·σ.
    pub fracture_k: f64,

    /// Floor for every denominator that could reach zero.
    pub epsilon_floor: f64,

    /// score_plus weight on the invariance score.
    pub w_invariance: f64,

    /// score_plus weight on (1 − normalized dispersion).
    pub w_dispersion: f64,

    pub drift_mode: DriftMode,

    /// Re-run originating lenses and compare payloads.
    pub audit: bool,

    /// Keep the first representation when lenses emit a duplicate name.
    pub dedupe_views: bool,

    /// Pair count at which the pairwise build goes parallel.
    pub parallel_min_pairs: usize,

    pub sei: SeiConfig,
    pub iri: IriConfig,
}

impl Default for OmniaConfig {
    fn default() -> Self {
        Self {
            fracture_k: 1.5,
            epsilon_floor: 1e-6,
            w_invariance: 0.5,
            w_dispersion: 0.5,
            drift_mode: DriftMode::Signed,
            audit: false,
            dedupe_views: true,
            parallel_min_pairs: 64,
            sei: SeiConfig::default(),
            iri: IriConfig::default(),
        }
    }
}

impl OmniaConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> OmniaResult<()> {
        if !self.fracture_k.is_finite() || self.fracture_k <= 0.0 {
            return Err(OmniaError::Config(format!(
                "fracture_k must be > 0, got {}",
                self.fracture_k
            )));
        }
        if !self.epsilon_floor.is_finite() || self.epsilon_floor <= 0.0 {
            return Err(OmniaError::Config(format!(
                "epsilon_floor must be > 0, got {}",
                self.epsilon_floor
            )));
        }
        if !(0.0..=1.0).contains(&self.w_invariance) || !(0.0..=1.0).contains(&self.w_dispersion)
        {
            return Err(OmniaError::Config(format!(
                "score_plus weights must be in [0, 1], got {} and {}",
                self.w_invariance, self.w_dispersion
            )));
        }
        if (self.w_invariance + self.w_dispersion - 1.0).abs() > 1e-9 {
            return Err(OmniaError::Config(format!(
                "w_invariance + w_dispersion must equal 1.0, got {} + {} = {}",
                self.w_invariance,
                self.w_dispersion,
                self.w_invariance + self.w_dispersion
            )));
        }
        if self.sei.window < 2 {
            return Err(OmniaError::Config(format!(
                "sei.window must be >= 2, got {}",
                self.sei.window
            )));
        }
        let weights = self.sei.cost_weights.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(OmniaError::Config(format!(
                "sei.cost_weights must be finite and >= 0, got {weights:?}"
            )));
        }
        if weights.iter().all(|w| *w == 0.0) {
            return Err(OmniaError::Config(
                "sei.cost_weights must not all be zero".to_string(),
            ));
        }
        if !(self.iri.reversible_band >= 0.0 && self.iri.reversible_band < self.iri.strong_band) {
            return Err(OmniaError::Config(format!(
                "iri bands must satisfy 0 <= reversible_band < strong_band, got {} and {}",
                self.iri.reversible_band, self.iri.strong_band
            )));
        }
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> OmniaResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| OmniaError::Config(format!("JSON parse error: {e}")))
    }

    /// Floor a denominator.
    #[inline]
    pub fn floor(&self, x: f64) -> f64 {
        x.max(self.epsilon_floor)
    }
}
