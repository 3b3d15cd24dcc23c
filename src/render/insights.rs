use crate::insights::{self, InsightFact};
use crate::model::AnalysisResult;

use super::markup::{Element, Node};

pub fn render(result: &AnalysisResult) -> Vec<Node> {
    insights::derive(result).iter().map(|f| item(f).into()).collect()
}

fn item(fact: &InsightFact) -> Element {
    let strong = |text: String| Element::new("strong").text(text);
    let el = Element::new("div").class("insight-item");

    match fact {
        InsightFact::StoreDominantTopic {
            store,
            topic,
            percent,
        } => el
            .child(strong(format!("{store}店")))
            .text("は")
            .child(strong(topic.clone()))
            .text("が最も多く、全体の")
            .child(strong(format!("{percent}%")))
            .text("を占めています"),
        InsightFact::TopicDominantStore {
            topic,
            store,
            percent,
        } => el
            .child(strong(topic.clone()))
            .text("は")
            .child(strong(format!("{store}店")))
            .text("で最も多く、")
            .child(strong(format!("{percent}%")))
            .text("の割合です"),
    }
}
