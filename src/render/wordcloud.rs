use std::collections::BTreeMap;

use crate::model::WordcloudEntry;

use super::markup::{Element, Node, labelled};
use super::topics::PRODUCT_DELIMITER;

/// Card order. Stores outside this list are never shown.
pub const STORE_ORDER: [&str; 4] = ["中央区", "北区", "東区", "西区"];

/// Number of products listed under each card.
const TOP_PRODUCTS_SHOWN: usize = 3;

pub const NO_DATA_MESSAGE: &str = "ワードクラウドデータがありません";

pub fn render(wordclouds: Option<&BTreeMap<String, WordcloudEntry>>) -> Vec<Node> {
    let Some(wordclouds) = wordclouds.filter(|map| !map.is_empty()) else {
        return vec![
            Element::new("div")
                .class("error-message")
                .text(NO_DATA_MESSAGE)
                .into(),
        ];
    };

    STORE_ORDER
        .iter()
        .filter_map(|store| {
            let entry = wordclouds.get(*store)?;
            Some(card(store, entry).into())
        })
        .collect()
}

fn card(store: &str, entry: &WordcloudEntry) -> Element {
    let top_names: Vec<&str> = entry
        .top_products
        .iter()
        .take(TOP_PRODUCTS_SHOWN)
        .map(|product| product.name())
        .collect();

    Element::new("div")
        .class("wordcloud-card")
        .child(Element::new("h4").text(format!("{store}店")))
        .child(
            Element::new("div").class("wordcloud-image").child(
                Element::new("img")
                    .attr("src", entry.image.as_str())
                    .attr("alt", format!("{store}店のワードクラウド")),
            ),
        )
        .child(
            Element::new("div")
                .class("wordcloud-info")
                .child(labelled("商品種類:", format!("{}種類", entry.product_count)))
                .child(labelled("上位3商品:", top_names.join(PRODUCT_DELIMITER))),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProductCount;
    use crate::render::markup::text_lines;

    fn entry(products: &[(&str, f64)]) -> WordcloudEntry {
        WordcloudEntry {
            image: "data:image/png;base64,AAAA".to_string(),
            product_count: products.len() as u64,
            top_products: products
                .iter()
                .map(|(name, count)| ProductCount(name.to_string(), *count))
                .collect(),
        }
    }

    fn headings(nodes: &[Node]) -> Vec<String> {
        text_lines(nodes)
            .into_iter()
            .filter(|line| line.ends_with('店'))
            .collect()
    }

    #[test]
    fn missing_map_renders_placeholder() {
        let nodes = render(None);
        assert_eq!(text_lines(&nodes), vec![NO_DATA_MESSAGE]);
    }

    #[test]
    fn empty_map_renders_placeholder() {
        let map = BTreeMap::new();
        assert_eq!(text_lines(&render(Some(&map))), vec![NO_DATA_MESSAGE]);
    }

    #[test]
    fn cards_follow_fixed_store_order() {
        let mut map = BTreeMap::new();
        for store in ["西区", "東区", "北区", "中央区"] {
            map.insert(store.to_string(), entry(&[("水", 1.0)]));
        }
        assert_eq!(headings(&render(Some(&map))), vec!["中央区店", "北区店", "東区店", "西区店"]);
    }

    #[test]
    fn absent_and_unknown_stores_are_skipped() {
        let mut map = BTreeMap::new();
        map.insert("西区".to_string(), entry(&[("水", 1.0)]));
        map.insert("南区".to_string(), entry(&[("茶", 1.0)]));
        map.insert("北区".to_string(), entry(&[("パン", 1.0)]));

        let nodes = render(Some(&map));
        assert_eq!(nodes.len(), 2);
        assert_eq!(headings(&nodes), vec!["北区店", "西区店"]);
    }

    #[test]
    fn card_lists_first_three_product_names() {
        let mut map = BTreeMap::new();
        map.insert(
            "中央区".to_string(),
            entry(&[("水", 9.0), ("茶", 7.0), ("パン", 5.0), ("卵", 2.0)]),
        );

        let lines = text_lines(&render(Some(&map)));
        assert_eq!(
            lines,
            vec![
                "中央区店",
                "[中央区店のワードクラウド]",
                "商品種類: 4種類",
                "上位3商品: 水, 茶, パン",
            ]
        );
    }

    #[test]
    fn card_with_short_product_list() {
        let mut map = BTreeMap::new();
        map.insert("東区".to_string(), entry(&[("水", 1.0)]));
        let lines = text_lines(&render(Some(&map)));
        assert!(lines.contains(&"上位3商品: 水".to_string()));
    }
}
