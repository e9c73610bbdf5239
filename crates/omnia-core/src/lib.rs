// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Omnia Superposition Core
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Superposition pipeline: representation intake, pairwise structural
//! distance, invariance aggregation, fracture detection, and the metric core.
//!
//! ```text
//! Object → Lens* → Representations → Registry → DistanceMatrix
//!        → InvarianceReport (+ fractures) → MetricRecord
//! ```
//!
//! # Invariants
//!
//! 1. **Determinism**: every stage is a pure function of its inputs. Two
//!    evaluations of the same representations produce identical matrices,
//!    scores, and records, whether or not the pairwise build runs in parallel.
//!
//! 2. **Bounded outputs**: distances, invariance, `co_plus`, `score_plus` and
//!    `kappa_alignment` are clamped to [0, 1]; non-finite intermediates are
//!    mapped through `clamp_score` and logged.
//!
//! 3. **Local failure**: an unsupported pair removes that pair, a failing
//!    lens removes its views, a metric with unmet inputs is omitted. Each
//!    removal is recorded with its reason. Only an object with fewer than
//!    two comparable representations fails as a whole.
//!
//! 4. **No decisions**: the core emits numbers and structural annotations.
//!    It never halts, certifies, or classifies.

pub mod distance;
pub mod invariance;
pub mod lens;
pub mod matrix;
pub mod metrics;
pub mod omega;
pub mod pipeline;
pub mod registry;

pub use distance::{distance, payload_distance};
pub use invariance::{aggregate, InvarianceReport};
pub use lens::{ExternalLens, Lens, LensCatalog, LensConfig};
pub use matrix::DistanceMatrix;
pub use metrics::MetricCore;
pub use omega::{OmegaEstimator, OmegaStep, OmegaTrace};
pub use pipeline::{BatchItem, Evaluation, EvaluationRequest, ObjectOutcome, SuperpositionPipeline};
pub use registry::{AuditOutcome, RepresentationRegistry, RepresentationSet};
