use crate::model::Summary;

use super::markup::{Node, labelled};

pub fn render(summary: &Summary) -> Vec<Node> {
    vec![
        labelled(
            "📋 分析対象:",
            format!("{}件のレシート", summary.total_receipts),
        )
        .into(),
        labelled("🛍️ 商品種類:", format!("{}種類", summary.total_products)).into(),
        labelled("🎯 分析トピック数:", format!("{}トピック", summary.n_topics)).into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::markup::text_lines;

    #[test]
    fn renders_counts_verbatim() {
        let nodes = render(&Summary {
            total_receipts: 120,
            total_products: 45,
            n_topics: 3,
        });
        let lines = text_lines(&nodes);
        assert_eq!(
            lines,
            vec![
                "📋 分析対象: 120件のレシート",
                "🛍️ 商品種類: 45種類",
                "🎯 分析トピック数: 3トピック",
            ]
        );
    }
}
