// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Omnia Trackers
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Trackers over metric streams.
//!
//! - `sei`: saturation (structural yield per unit of marginal cost) over a
//!   caller-owned rolling window.
//! - `iri`: irreversibility of a forward transform and its attempted inverse.
//!
//! Both report numbers and descriptive labels only. Neither one halts,
//! gates, or certifies anything.

pub mod iri;
pub mod sei;

pub use iri::{IriBand, IriReport, IriState, IrreversibilityTracker};
pub use sei::{sei_update, CostComponents, SeiObservation, SeiReading, SeiState};
