use crate::model::Topic;

use super::markup::{Element, Node};

/// Delimiter between product names.
pub const PRODUCT_DELIMITER: &str = ", ";

pub fn render(topics: &[Topic]) -> Vec<Node> {
    topics
        .iter()
        .map(|topic| {
            Element::new("div")
                .class("topic-card")
                .child(Element::new("h4").text(topic.topic_name.as_str()))
                .child(Element::new("div").class("products").text(format!(
                    "主な商品: {}",
                    topic.top_products.join(PRODUCT_DELIMITER)
                )))
                .into()
        })
        .collect()
}
