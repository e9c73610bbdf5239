// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Representation Registry
// ─────────────────────────────────────────────────────────────────────
//! Validation of representation input and the determinism audit.

use std::collections::{BTreeMap, BTreeSet};

use omnia_types::{
    DroppedRepresentation, Object, OmniaError, OmniaResult, Representation,
};

use crate::lens::{LensCatalog, LensConfig};

/// Ordered views of one object with unique names.
#[derive(Debug, Clone, PartialEq)]
pub struct RepresentationSet {
    reps: Vec<Representation>,
}

impl RepresentationSet {
    /// Build a set of at least one representation with unique names.
    pub fn new(reps: Vec<Representation>) -> OmniaResult<Self> {
        if reps.is_empty() {
            return Err(OmniaError::Validation(
                "representation set is empty".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for rep in &reps {
            if rep.name.is_empty() {
                return Err(OmniaError::Validation(
                    "representation name is empty".to_string(),
                ));
            }
            if !seen.insert(rep.name.as_str()) {
                return Err(OmniaError::Validation(format!(
                    "duplicate representation name '{}'",
                    rep.name
                )));
            }
        }
        Ok(Self { reps })
    }

    pub fn len(&self) -> usize {
        self.reps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reps.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Representation> {
        self.reps.iter().find(|r| r.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.reps.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Representation> {
        self.reps.iter()
    }

    pub fn as_slice(&self) -> &[Representation] {
        &self.reps
    }

    pub fn into_inner(self) -> Vec<Representation> {
        self.reps
    }

    /// Keep only the representations at `indices` (in set order).
    pub(crate) fn select(&self, indices: &[usize]) -> Self {
        Self {
            reps: indices.iter().map(|&i| self.reps[i].clone()).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RepresentationSet {
    type Item = &'a Representation;
    type IntoIter = std::slice::Iter<'a, Representation>;

    fn into_iter(self) -> Self::IntoIter {
        self.reps.iter()
    }
}

/// Result of a determinism audit.
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub retained: Vec<Representation>,
    pub dropped: Vec<DroppedRepresentation>,
}

/// Validation gate in front of the distance engine. Stateless.
pub struct RepresentationRegistry;

impl RepresentationRegistry {
    /// Admit representations for one superposition evaluation.
    ///
    /// Fails with `Validation` on fewer than two members, a duplicate name,
    /// or an empty/unparseable payload. Payloads are never modified.
    pub fn admit(reps: Vec<Representation>) -> OmniaResult<RepresentationSet> {
        if reps.len() < 2 {
            return Err(OmniaError::Validation(format!(
                "at least 2 representations required, got {}",
                reps.len()
            )));
        }
        for rep in &reps {
            rep.payload.validate().map_err(|e| match e {
                OmniaError::Validation(msg) => {
                    OmniaError::Validation(format!("representation '{}': {msg}", rep.name))
                }
                other => other,
            })?;
        }
        RepresentationSet::new(reps)
    }

    /// Regenerate each lens-tagged representation and compare bytes.
    ///
    /// Representations without a lens tag, or whose lens is not in the
    /// catalog, pass unchecked.
    pub fn audit(
        set: &RepresentationSet,
        object: &Object,
        catalog: &LensCatalog,
        lens_config: &LensConfig,
    ) -> OmniaResult<AuditOutcome> {
        let mut regenerated: BTreeMap<String, OmniaResult<RepresentationSet>> = BTreeMap::new();
        let mut retained = Vec::with_capacity(set.len());
        let mut dropped = Vec::new();

        for rep in set {
            let Some(lens_id) = rep.lens_id() else {
                retained.push(rep.clone());
                continue;
            };
            let Some(lens) = catalog.get(lens_id) else {
                retained.push(rep.clone());
                continue;
            };

            let fresh = regenerated
                .entry(lens_id.to_string())
                .or_insert_with(|| lens.generate(object, lens_config));

            let verdict = match fresh {
                Err(e) => Err(OmniaError::LensGeneration {
                    lens: lens_id.to_string(),
                    reason: e.to_string(),
                }),
                Ok(fresh_set) => {
                    let reproducible = match fresh_set.get(&rep.name) {
                        Some(again) if again.lens_id().is_some() => same_bytes(rep, again)?,
                        Some(again) => same_bytes(rep, &again.clone().from_lens(lens_id))?,
                        None => false,
                    };
                    if reproducible {
                        Ok(())
                    } else {
                        Err(OmniaError::DeterminismViolation {
                            representation: rep.name.clone(),
                            lens: lens_id.to_string(),
                        })
                    }
                }
            };

            match verdict {
                Ok(()) => retained.push(rep.clone()),
                Err(e) => {
                    log::warn!("audit dropped '{}' of object '{}': {e}", rep.name, object.id);
                    dropped.push(DroppedRepresentation::new(&rep.name, &e));
                }
            }
        }

        Ok(AuditOutcome { retained, dropped })
    }
}

/// Byte-level comparison of payload and meta.
///
/// Serialized form distinguishes values `PartialEq` conflates (`-0.0`/`0.0`).
fn same_bytes(a: &Representation, b: &Representation) -> OmniaResult<bool> {
    let encode = |r: &Representation| {
        serde_json::to_vec(&(&r.payload, &r.meta))
            .map_err(|e| OmniaError::Numerical(format!("payload encoding failed: {e}")))
    };
    Ok(encode(a)? == encode(b)?)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::lens::ExternalLens;
    use omnia_types::Payload;

    fn text(name: &str, s: &str) -> Representation {
        Representation::new(name, Payload::Text(s.to_string()))
    }

    #[test]
    fn test_admit_ok() {
        let set = RepresentationRegistry::admit(vec![text("base_10", "42"), text("base_2", "101010")])
            .unwrap();
        assert_eq!(set.names(), vec!["base_10", "base_2"]);
    }

    #[test]
    fn test_admit_too_few() {
        let err = RepresentationRegistry::admit(vec![text("only", "x")]).unwrap_err();
        assert!(matches!(err, OmniaError::Validation(_)));
    }

    #[test]
    fn test_admit_duplicate_name() {
        let err = RepresentationRegistry::admit(vec![text("a", "x"), text("a", "y")]).unwrap_err();
        assert!(err.to_string().contains("duplicate representation name 'a'"));
    }

    #[test]
    fn test_admit_empty_payload() {
        let err = RepresentationRegistry::admit(vec![text("a", "x"), text("b", "")]).unwrap_err();
        assert!(err.to_string().contains("representation 'b'"));
    }

    #[test]
    fn test_admit_non_finite_payload() {
        let err = RepresentationRegistry::admit(vec![
            Representation::new("a", Payload::Scalar(1.0)),
            Representation::new("b", Payload::Scalar(f64::NAN)),
        ])
        .unwrap_err();
        assert!(matches!(err, OmniaError::Validation(_)));
    }

    #[test]
    fn test_set_rejects_empty() {
        assert!(RepresentationSet::new(vec![]).is_err());
    }

    #[test]
    fn test_audit_passes_deterministic_lens() {
        let lens = ExternalLens::new("case", |obj, _| {
            RepresentationSet::new(vec![
                text("orig", &obj.id).from_lens("case"),
                text("lower", &obj.id.to_lowercase()).from_lens("case"),
            ])
        });
        let catalog = LensCatalog::new().with(Arc::new(lens));
        let object = Object::new("Omnia");
        let set = catalog
            .get("case")
            .unwrap()
            .generate(&object, &LensConfig::new())
            .unwrap();

        let outcome =
            RepresentationRegistry::audit(&set, &object, &catalog, &LensConfig::new()).unwrap();
        assert_eq!(outcome.retained.len(), 2);
        assert!(outcome.dropped.is_empty());
    }

    #[test]
    fn test_audit_drops_non_reproducible() {
        let counter = Arc::new(AtomicU64::new(0));
        let c = counter.clone();
        let lens = ExternalLens::new("clock", move |_, _| {
            let tick = c.fetch_add(1, Ordering::SeqCst);
            RepresentationSet::new(vec![text("stamp", &tick.to_string()).from_lens("clock")])
        });
        let catalog = LensCatalog::new().with(Arc::new(lens));
        let object = Object::new("x");
        let set = RepresentationSet::new(vec![
            text("stamp", "0").from_lens("clock"),
            text("plain", "x"),
        ])
        .unwrap();

        // Stored "0", regenerated "0" on the first call: reproducible.
        let first = RepresentationRegistry::audit(&set, &object, &catalog, &LensConfig::new()).unwrap();
        assert!(first.dropped.is_empty());

        // Regenerated "1" now: violation.
        let second = RepresentationRegistry::audit(&set, &object, &catalog, &LensConfig::new()).unwrap();
        assert_eq!(second.retained.len(), 1);
        assert_eq!(second.retained[0].name, "plain");
        assert_eq!(second.dropped.len(), 1);
        assert!(second.dropped[0].reason.contains("determinism violation"));
    }

    #[test]
    fn test_audit_untagged_lens_output() {
        // Tag added at collection time, absent from the lens's own output.
        let lens = ExternalLens::new("id", |obj, _| {
            RepresentationSet::new(vec![text("orig", &obj.id)])
        });
        let catalog = LensCatalog::new().with(Arc::new(lens));
        let set = RepresentationSet::new(vec![text("orig", "x").from_lens("id")]).unwrap();
        let outcome =
            RepresentationRegistry::audit(&set, &Object::new("x"), &catalog, &LensConfig::new())
                .unwrap();
        assert_eq!(outcome.retained.len(), 1);
        assert!(outcome.dropped.is_empty());
    }

    #[test]
    fn test_audit_skips_unknown_lens() {
        let set = RepresentationSet::new(vec![text("a", "x").from_lens("elsewhere")]).unwrap();
        let outcome = RepresentationRegistry::audit(
            &set,
            &Object::new("x"),
            &LensCatalog::new(),
            &LensConfig::new(),
        )
        .unwrap();
        assert_eq!(outcome.retained.len(), 1);
    }

    #[test]
    fn test_audit_distinguishes_negative_zero() {
        let a = Representation::new("z", Payload::Scalar(0.0));
        let b = Representation::new("z", Payload::Scalar(-0.0));
        assert_eq!(a, b);
        assert!(!same_bytes(&a, &b).unwrap());
    }
}
