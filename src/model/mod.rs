//! Typed analysis-result document returned by the backend `/analyze` endpoint.
//!
//! The backend computes topics and per-store ratios; this module only accepts
//! the shape. Numeric invariants (ratio sums, index alignment between
//! `topics` and `topic_ratios`) are trusted, not checked.
//!
//! Store iteration order matters: the chart's category axis and the insight
//! sentences follow the order in which stores appear in the document, so
//! `stores` is kept as an ordered list of pairs rather than a hash map.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

/// One analysis result, replaced wholesale on every successful request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: Summary,
    pub topics: Vec<Topic>,
    /// Store name → stats, in document order.
    #[serde(
        deserialize_with = "ordered_map::deserialize",
        serialize_with = "ordered_map::serialize"
    )]
    pub stores: Vec<(String, StoreStats)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_wordclouds: Option<BTreeMap<String, WordcloudEntry>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_receipts: u64,
    pub total_products: u64,
    pub n_topics: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub topic_name: String,
    #[serde(default)]
    pub top_products: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Fraction of the store's receipts per topic, index-aligned with `topics`.
    pub topic_ratios: Vec<f64>,
    /// Receipts analyzed for this store, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordcloudEntry {
    /// Pre-rendered image reference, usually a `data:image/png;base64,...` URI.
    pub image: String,
    pub product_count: u64,
    #[serde(default)]
    pub top_products: Vec<ProductCount>,
}

/// A `[name, count]` pair as emitted by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCount(pub String, pub f64);

impl ProductCount {
    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn count(&self) -> f64 {
        self.1
    }
}

impl AnalysisResult {
    /// Look up a store's stats by name.
    pub fn store(&self, name: &str) -> Option<&StoreStats> {
        self.stores
            .iter()
            .find(|(store, _)| store == name)
            .map(|(_, stats)| stats)
    }

    /// Store names in document order.
    pub fn store_names(&self) -> impl Iterator<Item = &str> {
        self.stores.iter().map(|(name, _)| name.as_str())
    }

    /// Word-cloud entry for a store, if the backend produced one.
    pub fn wordcloud(&self, store: &str) -> Option<&WordcloudEntry> {
        self.store_wordclouds.as_ref()?.get(store)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
#[error("unexpected analysis result shape: {0}")]
pub struct ParseError(#[from] serde_json::Error);

/// Parse a response body into an [`AnalysisResult`].
pub fn parse(raw: &str) -> Result<AnalysisResult, ParseError> {
    Ok(serde_json::from_str(raw)?)
}

/// Accept an already-decoded JSON value.
pub fn from_value(raw: serde_json::Value) -> Result<AnalysisResult, ParseError> {
    Ok(serde_json::from_value(raw)?)
}

/// Serde adapters keeping a JSON object's key order as a `Vec` of pairs.
mod ordered_map {
    use super::*;

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct PairsVisitor<V>(std::marker::PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for PairsVisitor<V> {
            type Value = Vec<(String, V)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map keyed by store name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    pairs.push((key, value));
                }
                Ok(pairs)
            }
        }

        deserializer.deserialize_map(PairsVisitor(std::marker::PhantomData))
    }

    pub fn serialize<S, V>(pairs: &[(String, V)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let mut map = serializer.serialize_map(Some(pairs.len()))?;
        for (key, value) in pairs {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
