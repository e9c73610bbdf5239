// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Omnia Measurement Kernel Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! Omnia structural-measurement kernel.
//!
//! Everything in this crate is a plain value object owned by the caller.
//! Nothing here holds a reference back to the service that produced it.

pub mod config;
pub mod error;
pub mod record;
pub mod representation;

pub use config::{DeltaBaseline, DriftMode, IriConfig, OmniaConfig, SeiConfig, SeiCostWeights};
pub use error::{OmniaError, OmniaResult};
pub use record::{
    clamp_score, DroppedRepresentation, ExcludedPair, Fracture, MetricRecord, OmittedMetric,
    METRIC_FIELDS,
};
pub use representation::{
    Edge, MetaValue, Object, Payload, Representation, ShapeClass, LENS_META_KEY,
};
