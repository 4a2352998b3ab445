//! Math recognition
//!
//! Math is found in text nodes by its dollar delimiters. A `$$` block that
//! contains blank lines is split by the parser into several paragraphs, so
//! the passes run as: extract, join paragraphs around an unclosed `$$`,
//! extract again.

use md2zhihu_ast::Node;
use regex::Regex;
use std::sync::LazyLock;

/// A `$...$` or `$$...$$` span whose content starts with a non-`$`
pub(crate) static MATH_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\$\$([^$].*?)\$\$|\$([^$].*?)\$").expect("math span regex")
});

/// Replace math spans in every text node below `nodes` with math nodes
pub fn parse_math(nodes: Vec<Node>) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|mut node| {
            if let Some(children) = node.children_mut() {
                let parsed = merge_adjacent_texts(parse_math(std::mem::take(children)));
                *children = parsed
                    .into_iter()
                    .flat_map(|child| match child {
                        Node::Text(lit) => extract_math(&lit.text),
                        other => vec![other],
                    })
                    .collect();
            }
            node
        })
        .collect()
}

/// Undo text splits (such as reference spans) so a math span is seen whole
fn merge_adjacent_texts(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let Node::Text(lit) = &node
            && let Some(prev) = out.last_mut().and_then(Node::as_text_mut)
        {
            prev.push_str(&lit.text);
            continue;
        }
        out.push(node);
    }
    out
}

/// Split text into text and math nodes, always ending with a text node
///
/// A span is block math when the text before it is empty or ends with a
/// blank line, and the text after it is empty or starts on a new line.
pub fn extract_math(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut rest = text;

    while let Some(caps) = MATH_SPAN.captures(rest) {
        let Some(whole) = caps.get(0) else { break };
        let inner = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());

        let left = &rest[..whole.start()];
        let right = &rest[whole.end()..];

        let block = (left.is_empty() || left.ends_with("\n\n"))
            && (right.is_empty() || right.starts_with('\n'));

        nodes.push(Node::text(left));
        nodes.push(if block {
            Node::math_block(inner)
        } else {
            Node::math_inline(inner)
        });
        rest = right;
    }

    nodes.push(Node::text(rest));
    nodes
}

/// Merge sibling containers separated inside an open `$$` block
pub fn join_math_block(mut nodes: Vec<Node>) -> Vec<Node> {
    for node in nodes.iter_mut() {
        if let Some(children) = node.children_mut() {
            *children = join_math_block(std::mem::take(children));
        }
    }
    join_math_text(&mut nodes);
    nodes
}

fn join_math_text(nodes: &mut Vec<Node>) {
    let mut i = 0;
    while i + 1 < nodes.len() {
        let open = match (
            nodes[i].children().last().and_then(Node::as_text),
            nodes[i + 1].children().first().and_then(Node::as_text),
        ) {
            (Some(last), Some(_)) => last.contains("$$"),
            _ => false,
        };
        if !open {
            i += 1;
            continue;
        }

        let mut second = nodes.remove(i + 1);
        let mut rest = second.children_mut().map(std::mem::take).unwrap_or_default();
        let head = rest.remove(0);
        let head = head.as_text().unwrap_or_default();
        let closes = head.contains("$$");

        if let Some(children) = nodes[i].children_mut() {
            if let Some(last) = children.last_mut().and_then(Node::as_text_mut) {
                last.push_str("\n\n");
                last.push_str(head);
            }
            children.extend(rest);
        }

        if closes {
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use md2zhihu_ast::NodeKind;

    #[test]
    fn test_extract_inline() {
        let nodes = extract_math("Some $$x^2$$ text.");
        assert_eq!(
            nodes,
            vec![
                Node::text("Some "),
                Node::math_inline("x^2"),
                Node::text(" text."),
            ]
        );

        let nodes = extract_math("a $b$ c");
        assert_eq!(nodes[1], Node::math_inline("b"));
    }

    #[test]
    fn test_extract_block() {
        let nodes = extract_math("$$\nx\n$$");
        assert_eq!(
            nodes,
            vec![Node::text(""), Node::math_block("\nx\n"), Node::text("")]
        );

        let nodes = extract_math("intro\n\n$$a$$\nrest");
        assert_eq!(nodes[1], Node::math_block("a"));
    }

    #[test]
    fn test_extract_decides_per_match() {
        let nodes = extract_math("$a$ and $b$");
        assert_eq!(
            nodes,
            vec![
                Node::text(""),
                Node::math_inline("a"),
                Node::text(" and "),
                Node::math_inline("b"),
                Node::text(""),
            ]
        );
    }

    #[test]
    fn test_extract_without_math() {
        assert_eq!(extract_math("no math"), vec![Node::text("no math")]);
        assert_eq!(extract_math("$$"), vec![Node::text("$$")]);
    }

    #[test]
    fn test_parse_math_nested() {
        let nodes = parse_math(vec![Node::list(
            false,
            vec![Node::list_item(vec![Node::block_text(vec![Node::text(
                "x $y$",
            )])])],
        )]);
        let text = &nodes[0].children()[0].children()[0];
        assert_eq!(
            text.children(),
            &[Node::text("x "), Node::math_inline("y"), Node::text("")]
        );
    }

    #[test]
    fn test_parse_math_sees_split_text() {
        let nodes = parse_math(vec![Node::paragraph(vec![
            Node::text("$a"),
            Node::text("[i]"),
            Node::text("$ b"),
        ])]);
        assert_eq!(
            nodes[0].children(),
            &[Node::text(""), Node::math_inline("a[i]"), Node::text(" b")]
        );
    }

    #[test]
    fn test_join_math_across_paragraphs() {
        let nodes = vec![
            Node::paragraph(vec![Node::text("$$\na")]),
            Node::paragraph(vec![Node::text("b\n$$")]),
            Node::paragraph(vec![Node::text("after")]),
        ];

        let nodes = parse_math(join_math_block(parse_math(nodes)));
        assert_eq!(nodes.len(), 2);

        let maths: Vec<&Node> = nodes[0]
            .children()
            .iter()
            .filter(|n| n.kind() == NodeKind::MathBlock)
            .collect();
        assert_eq!(maths.len(), 1);
        assert_eq!(maths[0].literal(), Some("\na\n\nb\n"));
        assert_eq!(nodes[1], Node::paragraph(vec![Node::text("after")]));
    }

    #[test]
    fn test_join_math_over_three_paragraphs() {
        let nodes = vec![
            Node::paragraph(vec![Node::text("$$\na")]),
            Node::paragraph(vec![Node::text("b")]),
            Node::paragraph(vec![Node::text("c\n$$")]),
        ];
        let nodes = parse_math(join_math_block(parse_math(nodes)));
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].children()[1], Node::math_block("\na\n\nb\n\nc\n"));
    }
}
