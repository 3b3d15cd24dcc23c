//! Insight derivation: which topic dominates each store, and which store
//! dominates each topic.
//!
//! Pure function over an [`AnalysisResult`]. Both passes scan linearly and
//! only replace the current maximum on a strictly greater value, so ties
//! always resolve to the earliest topic index or the earliest store in
//! document order.

use std::fmt;

use serde::Serialize;

use crate::model::AnalysisResult;

/// One derived fact about the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InsightFact {
    /// The topic with the largest share of a store's receipts.
    StoreDominantTopic {
        store: String,
        topic: String,
        percent: String,
    },
    /// The store where a topic has its largest share.
    TopicDominantStore {
        topic: String,
        store: String,
        percent: String,
    },
}

impl fmt::Display for InsightFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoreDominantTopic {
                store,
                topic,
                percent,
            } => write!(
                f,
                "{store}店は{topic}が最も多く、全体の{percent}%を占めています"
            ),
            Self::TopicDominantStore {
                topic,
                store,
                percent,
            } => write!(f, "{topic}は{store}店で最も多く、{percent}%の割合です"),
        }
    }
}

/// Format a ratio in `[0, 1]` as a percentage with one decimal (`0.333` → `"33.3"`).
///
/// An exact tie such as `6.25` rounds away from zero (`"6.3"`), the way a
/// browser's `toFixed(1)` does. Rust's `{:.1}` would round it to even.
pub fn format_percent(ratio: f64) -> String {
    let percent = ratio * 100.0;
    let tenths = percent * 10.0;
    // mul_add is exact, so a zero residual means `tenths` lost nothing.
    if tenths.fract().abs() == 0.5 && percent.mul_add(10.0, -tenths) == 0.0 {
        return format!("{:.1}", (tenths + 0.5 * tenths.signum()) / 10.0);
    }
    format!("{percent:.1}")
}

/// Derive all insight facts: per-store facts first, then per-topic facts.
pub fn derive(result: &AnalysisResult) -> Vec<InsightFact> {
    let mut facts = Vec::with_capacity(result.stores.len() + result.topics.len());
    facts.extend(store_dominant_topics(result));
    facts.extend(topic_dominant_stores(result));
    facts
}

/// Index of the first maximum in `values`, or `None` when empty.
fn first_max_index(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &value) in values.iter().enumerate() {
        match best {
            Some((_, max)) if value <= max => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}

fn store_dominant_topics(result: &AnalysisResult) -> impl Iterator<Item = InsightFact> + '_ {
    result.stores.iter().filter_map(|(store, stats)| {
        let index = first_max_index(&stats.topic_ratios)?;
        let topic = result.topics.get(index)?;
        Some(InsightFact::StoreDominantTopic {
            store: store.clone(),
            topic: topic.topic_name.clone(),
            percent: format_percent(stats.topic_ratios[index]),
        })
    })
}

fn topic_dominant_stores(result: &AnalysisResult) -> impl Iterator<Item = InsightFact> + '_ {
    result
        .topics
        .iter()
        .enumerate()
        .filter_map(|(topic_index, topic)| {
            let mut best: Option<(&str, f64)> = None;
            for (store, stats) in &result.stores {
                let Some(&ratio) = stats.topic_ratios.get(topic_index) else {
                    continue;
                };
                match best {
                    Some((_, max)) if ratio <= max => {}
                    _ => best = Some((store.as_str(), ratio)),
                }
            }

            let (store, ratio) = best?;
            Some(InsightFact::TopicDominantStore {
                topic: topic.topic_name.clone(),
                store: store.to_string(),
                percent: format_percent(ratio),
            })
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
