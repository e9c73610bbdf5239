// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Omnia Representation Model
// ─────────────────────────────────────────────────────────────────────
//! Objects and their representations ("views").
//!
//! A `Payload` declares its shape through its variant tag. The distance
//! engine selects a comparator by `ShapeClass`; it never looks at the
//! representation name.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{OmniaError, OmniaResult};

/// Meta key naming the lens that produced a representation.
pub const LENS_META_KEY: &str = "lens";

/// The artifact being measured. Opaque to the kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

impl Object {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw: None,
        }
    }

    pub fn with_raw(id: impl Into<String>, raw: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            raw: Some(raw),
        }
    }
}

/// Scalar generation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// Directed edge of a structured (causal/constraint) payload.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Comparator family a payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeClass {
    Numeric,
    Text,
    Tokens,
    Bytes,
    Set,
    Graph,
    Unknown,
}

/// Tagged payload of one representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Payload {
    Scalar(f64),
    Series(Vec<f64>),
    Text(String),
    Tokens(Vec<String>),
    Bytes(Vec<u8>),
    Set(BTreeSet<String>),
    Graph(BTreeSet<Edge>),
    /// A shape no comparator is registered for.
    Opaque { tag: String, value: serde_json::Value },
}

impl Payload {
    pub fn shape(&self) -> ShapeClass {
        match self {
            Self::Scalar(_) | Self::Series(_) => ShapeClass::Numeric,
            Self::Text(_) => ShapeClass::Text,
            Self::Tokens(_) => ShapeClass::Tokens,
            Self::Bytes(_) => ShapeClass::Bytes,
            Self::Set(_) => ShapeClass::Set,
            Self::Graph(_) => ShapeClass::Graph,
            Self::Opaque { .. } => ShapeClass::Unknown,
        }
    }

    /// Declared type tag, as it appears on the wire.
    pub fn type_tag(&self) -> &str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Series(_) => "series",
            Self::Text(_) => "text",
            Self::Tokens(_) => "tokens",
            Self::Bytes(_) => "bytes",
            Self::Set(_) => "set",
            Self::Graph(_) => "graph",
            Self::Opaque { tag, .. } => tag,
        }
    }

    pub fn tokens<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Tokens(items.into_iter().map(Into::into).collect())
    }

    pub fn set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Set(items.into_iter().map(Into::into).collect())
    }

    pub fn graph<I, A, B>(edges: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        Self::Graph(edges.into_iter().map(|(a, b)| Edge::new(a, b)).collect())
    }

    /// Reject empty or unparseable payloads.
    pub fn validate(&self) -> OmniaResult<()> {
        let empty = match self {
            Self::Scalar(v) => {
                if !v.is_finite() {
                    return Err(OmniaError::Validation(format!(
                        "scalar payload is not finite: {v}"
                    )));
                }
                false
            }
            Self::Series(xs) => {
                if let Some(bad) = xs.iter().find(|v| !v.is_finite()) {
                    return Err(OmniaError::Validation(format!(
                        "series payload contains non-finite value {bad}"
                    )));
                }
                xs.is_empty()
            }
            Self::Text(s) => s.is_empty(),
            Self::Tokens(t) => t.is_empty(),
            Self::Bytes(b) => b.is_empty(),
            Self::Set(s) => s.is_empty(),
            Self::Graph(g) => g.is_empty(),
            Self::Opaque { tag, .. } => {
                if tag.trim().is_empty() {
                    return Err(OmniaError::Validation(
                        "opaque payload has an empty type tag".to_string(),
                    ));
                }
                false
            }
        };
        if empty {
            return Err(OmniaError::Validation(format!(
                "{} payload is empty",
                self.type_tag()
            )));
        }
        Ok(())
    }
}

/// One deterministic encoding of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Representation {
    pub name: String,
    pub payload: Payload,
    #[serde(default)]
    pub meta: BTreeMap<String, MetaValue>,
}

impl Representation {
    pub fn new(name: impl Into<String>, payload: Payload) -> Self {
        Self {
            name: name.into(),
            payload,
            meta: BTreeMap::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Tag this representation with the lens that generated it.
    pub fn from_lens(self, lens_id: &str) -> Self {
        self.with_meta(LENS_META_KEY, lens_id)
    }

    pub fn lens_id(&self) -> Option<&str> {
        match self.meta.get(LENS_META_KEY) {
            Some(MetaValue::Text(id)) => Some(id.as_str()),
            _ => None,
        }
    }
}
