//! Repair of pipe tables left as paragraph text
//!
//! Some inputs (notably tables nested in list items) reach the tree as a
//! paragraph whose text still holds the table source. Such a paragraph is
//! rendered back to Markdown and parsed again on its own.

use md2zhihu_ast::Node;
use regex::Regex;
use std::sync::LazyLock;

use crate::error::Result;
use crate::parser::parse;
use crate::render::{RenderNode, Renderer};

static TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}\|(.+)\n *\|( *[-:]+[-| :]*)\n((?: *\|.*(?:\n|$))*)\n*")
        .expect("table regex")
});

/// Re-parse table paragraphs at any depth, splicing the result in place
pub fn parse_in_list_tables(nodes: Vec<Node>) -> Result<Vec<Node>> {
    let mut out = Vec::with_capacity(nodes.len());
    for mut node in nodes {
        if let Some(children) = node.children_mut() {
            *children = parse_in_list_tables(std::mem::take(children))?;
        }
        out.extend(convert_paragraph_table(node)?);
    }
    Ok(out)
}

fn convert_paragraph_table(node: Node) -> Result<Vec<Node>> {
    let is_table = matches!(&node, Node::Paragraph(_))
        && node
            .children()
            .first()
            .and_then(Node::as_text)
            .is_some_and(|text| TABLE.is_match(text));

    if !is_table {
        return Ok(vec![node]);
    }

    let source = Renderer::generic()
        .render_children(&RenderNode::root(&node))?
        .concat();
    tracing::debug!(source = %source, "re-parsing table paragraph");

    Ok(parse(&source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use md2zhihu_ast::NodeKind;

    fn table_paragraph() -> Node {
        Node::paragraph(vec![Node::text("| a | b |\n| --- | --- |\n| 1 | 2 |")])
    }

    #[test]
    fn test_table_paragraph_in_list_item() {
        let nodes = vec![Node::list(
            false,
            vec![Node::list_item(vec![table_paragraph()])],
        )];
        let nodes = parse_in_list_tables(nodes).unwrap();

        let item = &nodes[0].children()[0];
        assert_eq!(item.children().len(), 1);
        assert_eq!(item.children()[0].kind(), NodeKind::Table);

        let head = &item.children()[0].children()[0];
        assert_eq!(
            head.children()[0],
            Node::table_cell(None, vec![Node::text("a")])
        );
    }

    #[test]
    fn test_repair_is_idempotent() {
        let once = parse_in_list_tables(vec![table_paragraph()]).unwrap();
        let twice = parse_in_list_tables(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_other_paragraphs_untouched() {
        let nodes = vec![
            Node::paragraph(vec![Node::text("| not a table")]),
            Node::paragraph(vec![Node::strong(vec![Node::text("| a |")])]),
        ];
        assert_eq!(parse_in_list_tables(nodes.clone()).unwrap(), nodes);
    }
}
