// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Irreversibility Tracker (IRI)
// ─────────────────────────────────────────────────────────────────────
//! Irreversibility index of a forward transform and its attempted inverse.
//!
//! ```text
//! state ──forward──▶ state' ──inverse──▶ state''
//! forward_distance   = d(state, state')
//! hysteresis_residue = d(state, state'')
//! IRI                = residue / max(ε, forward_distance)
//! ```
//!
//! IRI is not clamped: an inverse that lands further away than the forward
//! step reports IRI > 1 (`Overshoot`).

use serde::{Deserialize, Serialize};

use omnia_core::payload_distance;
use omnia_types::{IriConfig, OmniaConfig, OmniaError, OmniaResult, Payload};

/// Distances of one round trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IriState {
    pub forward_distance: f64,
    pub hysteresis_residue: f64,
}

/// Descriptive label; never alters control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IriBand {
    Reversible,
    Partial,
    StrongHysteresis,
    Overshoot,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IriReport {
    pub state: IriState,
    pub iri: f64,
    pub band: IriBand,
}

/// Stateless IRI evaluator.
#[derive(Debug, Clone)]
pub struct IrreversibilityTracker {
    config: IriConfig,
    epsilon_floor: f64,
}

impl IrreversibilityTracker {
    pub fn new(config: IriConfig, epsilon_floor: f64) -> OmniaResult<Self> {
        if !epsilon_floor.is_finite() || epsilon_floor <= 0.0 {
            return Err(OmniaError::Config(format!(
                "epsilon_floor must be > 0, got {epsilon_floor}"
            )));
        }
        if !(0.0..config.strong_band).contains(&config.reversible_band) {
            return Err(OmniaError::Config(format!(
                "need 0 <= reversible_band < strong_band, got {} / {}",
                config.reversible_band, config.strong_band
            )));
        }
        Ok(Self {
            config,
            epsilon_floor,
        })
    }

    pub fn from_config(config: &OmniaConfig) -> OmniaResult<Self> {
        Self::new(config.iri.clone(), config.epsilon_floor)
    }

    pub fn band(&self, iri: f64) -> IriBand {
        if iri > 1.0 {
            IriBand::Overshoot
        } else if iri <= self.config.reversible_band {
            IriBand::Reversible
        } else if iri >= self.config.strong_band {
            IriBand::StrongHysteresis
        } else {
            IriBand::Partial
        }
    }

    /// IRI from already measured distances.
    pub fn report(&self, state: IriState) -> IriReport {
        let iri = state.hysteresis_residue / state.forward_distance.max(self.epsilon_floor);
        IriReport {
            state,
            iri,
            band: self.band(iri),
        }
    }

    /// One forward/inverse round trip from `state`.
    pub fn evaluate<F, G>(&self, state: &Payload, forward: F, inverse: G) -> OmniaResult<IriReport>
    where
        F: Fn(&Payload) -> OmniaResult<Payload>,
        G: Fn(&Payload) -> OmniaResult<Payload>,
    {
        let projected = forward(state)?;
        let restored = inverse(&projected)?;
        let report = self.report(IriState {
            forward_distance: payload_distance(state, &projected)?,
            hysteresis_residue: payload_distance(state, &restored)?,
        });
        log::debug!(
            "iri: forward={:.4} residue={:.4} iri={:.4} band={:?}",
            report.state.forward_distance,
            report.state.hysteresis_residue,
            report.iri,
            report.band
        );
        Ok(report)
    }

    /// Each step evaluated on its own; a failing step does not affect others.
    pub fn evaluate_trajectory<F, G>(
        &self,
        states: &[Payload],
        forward: F,
        inverse: G,
    ) -> Vec<OmniaResult<IriReport>>
    where
        F: Fn(&Payload) -> OmniaResult<Payload>,
        G: Fn(&Payload) -> OmniaResult<Payload>,
    {
        states
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let out = self.evaluate(s, &forward, &inverse);
                if let Err(e) = &out {
                    log::warn!("iri step {i} failed: {e}");
                }
                out
            })
            .collect()
    }
}
