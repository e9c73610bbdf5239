// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Lens Interface
// ─────────────────────────────────────────────────────────────────────
//! Lens capability interface.
//!
//! Concrete lens families (numeric bases, tokenizers, compression,
//! permutation, constraint projection, ...) live outside the kernel and
//! are registered against this single trait.

use std::collections::BTreeMap;
use std::sync::Arc;

use omnia_types::{MetaValue, Object, OmniaResult};

use crate::registry::RepresentationSet;

/// Generation parameters handed to a lens.
pub type LensConfig = BTreeMap<String, MetaValue>;

/// Deterministic generator of representations.
///
/// For a fixed `(object, config)` a lens must return byte-identical
/// representations on every call. Audit mode checks this.
pub trait Lens: Send + Sync {
    fn id(&self) -> &str;

    fn generate(&self, object: &Object, config: &LensConfig) -> OmniaResult<RepresentationSet>;
}

type GenerateFn = Box<dyn Fn(&Object, &LensConfig) -> OmniaResult<RepresentationSet> + Send + Sync>;

/// Lens backed by a caller-supplied function.
pub struct ExternalLens {
    id: String,
    generate_fn: GenerateFn,
}

impl ExternalLens {
    pub fn new(
        id: impl Into<String>,
        generate_fn: impl Fn(&Object, &LensConfig) -> OmniaResult<RepresentationSet>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            generate_fn: Box::new(generate_fn),
        }
    }
}

impl Lens for ExternalLens {
    fn id(&self) -> &str {
        &self.id
    }

    fn generate(&self, object: &Object, config: &LensConfig) -> OmniaResult<RepresentationSet> {
        (self.generate_fn)(object, config)
    }
}

/// Lenses available for audit-mode regeneration, keyed by id.
#[derive(Clone, Default)]
pub struct LensCatalog {
    lenses: BTreeMap<String, Arc<dyn Lens>>,
}

impl LensCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lens; a lens with the same id is replaced.
    pub fn register(&mut self, lens: Arc<dyn Lens>) {
        self.lenses.insert(lens.id().to_string(), lens);
    }

    pub fn with(mut self, lens: Arc<dyn Lens>) -> Self {
        self.register(lens);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Lens>> {
        self.lenses.get(id)
    }

    pub fn len(&self) -> usize {
        self.lenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lenses.is_empty()
    }
}
