// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Structural Distance Engine
// ─────────────────────────────────────────────────────────────────────
//! Normalized structural distance between two representations.
//!
//! Comparators are selected by payload shape class:
//! - numeric (scalar, series): mean of `|a−b| / max(|a|,|b|)` per position,
//!   capped at 1; an unmatched position counts as 1
//! - text, tokens, bytes: Levenshtein distance / longer length
//! - set: 1 − Jaccard similarity
//! - graph: mismatched edges / edges in the union
//!
//! Every comparator is symmetric and returns 0 exactly when the two
//! payloads are structurally identical. Output is always in [0, 1].

use std::collections::BTreeSet;

use omnia_types::{clamp_score, OmniaError, OmniaResult, Payload, Representation};

/// Distance between two representations, dispatched on payload shape.
pub fn distance(a: &Representation, b: &Representation) -> OmniaResult<f64> {
    payload_distance(&a.payload, &b.payload).map_err(|e| match e {
        OmniaError::UnsupportedRepresentation { reason, .. } => {
            OmniaError::UnsupportedRepresentation {
                left: a.name.clone(),
                right: b.name.clone(),
                reason,
            }
        }
        other => other,
    })
}

/// Distance between two payloads.
///
/// Fails with `UnsupportedRepresentation` when either payload has no
/// comparator or the two belong to different shape classes.
pub fn payload_distance(a: &Payload, b: &Payload) -> OmniaResult<f64> {
    let d = match (a, b) {
        (Payload::Scalar(x), Payload::Scalar(y)) => scalar_distance(*x, *y),
        (Payload::Scalar(x), Payload::Series(ys)) => series_distance(std::slice::from_ref(x), ys),
        (Payload::Series(xs), Payload::Scalar(y)) => series_distance(xs, std::slice::from_ref(y)),
        (Payload::Series(xs), Payload::Series(ys)) => series_distance(xs, ys),
        (Payload::Text(x), Payload::Text(y)) => {
            let xc: Vec<char> = x.chars().collect();
            let yc: Vec<char> = y.chars().collect();
            normalized_edit_distance(&xc, &yc)
        }
        (Payload::Tokens(x), Payload::Tokens(y)) => normalized_edit_distance(x, y),
        (Payload::Bytes(x), Payload::Bytes(y)) => normalized_edit_distance(x, y),
        (Payload::Set(x), Payload::Set(y)) => jaccard_distance(x, y),
        (Payload::Graph(x), Payload::Graph(y)) => edge_mismatch(x, y),
        _ => return Err(unsupported(a, b)),
    };
    Ok(clamp_score(d, 0.0, 1.0))
}

fn unsupported(a: &Payload, b: &Payload) -> OmniaError {
    let reason = if a.shape() == b.shape() {
        format!("no comparator registered for shape '{}'", a.type_tag())
    } else {
        format!(
            "no comparator across shapes '{}' and '{}'",
            a.type_tag(),
            b.type_tag()
        )
    };
    OmniaError::UnsupportedRepresentation {
        left: a.type_tag().to_string(),
        right: b.type_tag().to_string(),
        reason,
    }
}

/// `|a−b|` scaled by the larger magnitude, capped at 1.
#[inline]
pub fn scalar_distance(a: f64, b: f64) -> f64 {
    if a.to_bits() == b.to_bits() || a == b {
        return 0.0;
    }
    if !a.is_finite() || !b.is_finite() {
        return 1.0;
    }
    let scale = a.abs().max(b.abs());
    ((a - b).abs() / scale).min(1.0)
}

/// Position-wise numeric distance; unmatched tail positions count as 1.
pub fn series_distance(a: &[f64], b: &[f64]) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    let matched: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| scalar_distance(x, y))
        .sum();
    let unmatched = (longest - a.len().min(b.len())) as f64;
    (matched + unmatched) / longest as f64
}

/// Levenshtein edit distance (insert, delete, substitute at unit cost).
pub fn levenshtein<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, x) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, y) in b.iter().enumerate() {
            let substitute = prev[j] + usize::from(x != y);
            curr[j + 1] = substitute.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Levenshtein distance divided by the longer sequence's length.
pub fn normalized_edit_distance<T: PartialEq>(a: &[T], b: &[T]) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    levenshtein(a, b) as f64 / longest as f64
}

/// `1 − |A∩B| / |A∪B|`; two empty sets are identical.
pub fn jaccard_distance<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    if union == 0 {
        return 0.0;
    }
    1.0 - shared as f64 / union as f64
}

/// Edges present in exactly one graph over edges in either.
pub fn edge_mismatch<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let mismatched = a.symmetric_difference(b).count();
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    mismatched as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rep(name: &str, payload: Payload) -> Representation {
        Representation::new(name, payload)
    }

    #[test]
    fn test_levenshtein_classic() {
        let a: Vec<char> = "kitten".chars().collect();
        let b: Vec<char> = "sitting".chars().collect();
        assert_eq!(levenshtein(&a, &b), 3);
        assert_eq!(levenshtein::<char>(&[], &b), 7);
    }

    #[test]
    fn test_text_base_encodings() {
        let a = rep("base_10", Payload::Text("42".into()));
        let b = rep("base_2", Payload::Text("101010".into()));
        let d1 = distance(&a, &b).unwrap();
        let d2 = distance(&a, &b).unwrap();
        assert_eq!(d1.to_bits(), d2.to_bits());
        // No shared symbols: 2 substitutions + 4 insertions over 6.
        assert!((d1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_text_partial_overlap() {
        let d = payload_distance(&Payload::Text("abcd".into()), &Payload::Text("abce".into())).unwrap();
        assert!((d - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_text_counts_unicode_scalars() {
        let d = payload_distance(&Payload::Text("héllo".into()), &Payload::Text("hello".into())).unwrap();
        assert!((d - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_scalar_distance() {
        assert_eq!(scalar_distance(0.0, 0.0), 0.0);
        assert!((scalar_distance(10.0, 8.0) - 0.2).abs() < 1e-12);
        assert_eq!(scalar_distance(5.0, -5.0), 1.0);
        assert_eq!(scalar_distance(3.0, 0.0), 1.0);
    }

    #[test]
    fn test_series_length_mismatch() {
        let d = series_distance(&[1.0, 2.0], &[1.0, 2.0, 3.0, 4.0]);
        assert!((d - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_scalar_against_series() {
        let d = payload_distance(&Payload::Scalar(4.0), &Payload::Series(vec![4.0, 1.0])).unwrap();
        assert!((d - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_tokens_distance() {
        let a = Payload::tokens(["the", "sky", "is", "blue"]);
        let b = Payload::tokens(["the", "sky", "is", "green"]);
        let d = payload_distance(&a, &b).unwrap();
        assert!((d - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_bytes_distance() {
        let d = payload_distance(&Payload::Bytes(vec![1, 2, 3]), &Payload::Bytes(vec![1, 2])).unwrap();
        assert!((d - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_set_jaccard() {
        let d = payload_distance(&Payload::set(["a", "b", "c"]), &Payload::set(["b", "c", "d"])).unwrap();
        assert!((d - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_graph_edge_mismatch() {
        let a = Payload::graph([("rain", "wet"), ("wet", "slip")]);
        let b = Payload::graph([("rain", "wet"), ("slip", "wet")]);
        let d = payload_distance(&a, &b).unwrap();
        // union 3 edges, 2 mismatched
        assert!((d - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_symmetry_and_identity() {
        let payloads = vec![
            Payload::Scalar(3.5),
            Payload::Series(vec![1.0, -2.0, 7.5]),
            Payload::Text("structural".into()),
            Payload::tokens(["a", "b"]),
            Payload::Bytes(vec![0, 255, 7]),
            Payload::set(["x", "y"]),
            Payload::graph([("a", "b")]),
        ];
        let others = vec![
            Payload::Scalar(-1.25),
            Payload::Series(vec![1.5, -2.0]),
            Payload::Text("structure".into()),
            Payload::tokens(["b", "a", "c"]),
            Payload::Bytes(vec![255]),
            Payload::set(["y", "z"]),
            Payload::graph([("b", "a")]),
        ];
        for (p, q) in payloads.iter().zip(others.iter()) {
            assert_eq!(payload_distance(p, p).unwrap(), 0.0);
            let pq = payload_distance(p, q).unwrap();
            let qp = payload_distance(q, p).unwrap();
            assert_eq!(pq.to_bits(), qp.to_bits());
            assert!(pq > 0.0 && pq <= 1.0, "{pq} out of (0, 1]");
        }
    }

    #[test]
    fn test_cross_shape_unsupported() {
        let a = rep("digits", Payload::Text("42".into()));
        let b = rep("value", Payload::Scalar(42.0));
        match distance(&a, &b).unwrap_err() {
            OmniaError::UnsupportedRepresentation { left, right, reason } => {
                assert_eq!(left, "digits");
                assert_eq!(right, "value");
                assert!(reason.contains("'text' and 'scalar'"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_opaque_unsupported() {
        let p = Payload::Opaque {
            tag: "spectrogram".into(),
            value: serde_json::json!([0.1, 0.2]),
        };
        let err = payload_distance(&p, &p).unwrap_err();
        assert!(err.to_string().contains("no comparator registered for shape 'spectrogram'"));
    }
}
