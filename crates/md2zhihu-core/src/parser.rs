//! Markdown parsing (comrak AST → md2zhihu AST)
//!
//! The adapter keeps the tree close to what the rest of the pipeline
//! expects:
//! - soft breaks become `\n` inside text, and adjacent text merges
//! - dollar math is turned back into literal `$...$` text; math is
//!   recognized later by the normalizer so that spans broken by blank lines
//!   can be joined first
//! - bracket spans shaped like references (`[x]`, `[x][]`, `[x][y]`) become
//!   their own text nodes, except inside math
//! - paragraphs of tight list items become `block_text`
//! - blank lines before the first block, or after a block quote, become a
//!   `newline` node

use comrak::nodes::{AstNode, ListType, NodeValue, TableAlignment};
use comrak::{Arena, Options, parse_document};
use md2zhihu_ast::{Align, Node};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use crate::transform::math::MATH_SPAN;

static REF_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\[\]\n]*\](?:\[[^\[\]\n]*\])?").expect("reference span regex")
});

/// Comrak options shared by the parser and the html converter
pub(crate) fn comrak_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.footnotes = true;
    options.extension.math_dollars = true;
    options.render.unsafe_ = true;
    options
}

/// Parse Markdown text into a list of top-level nodes
pub fn parse(text: &str) -> Vec<Node> {
    let arena = Arena::new();
    let options = comrak_options();
    let root = parse_document(&arena, text, &options);

    let leading_blank = match root.first_child() {
        Some(first) => first.data.borrow().sourcepos.start.line > 1,
        None => text.contains('\n'),
    };

    let mut nodes = Vec::new();
    if leading_blank {
        nodes.push(Node::Newline);
    }
    nodes.extend(blank_separated_children(root, text.lines().count()));
    nodes
}

fn block_children<'a>(node: &'a AstNode<'a>, tight: bool) -> Vec<Node> {
    node.children()
        .map(|child| convert_node(child, tight))
        .collect()
}

/// Top-level blocks, with a `newline` after each block quote that is
/// followed by blank lines
///
/// `last_line` is the number of lines in the source.
fn blank_separated_children<'a>(root: &'a AstNode<'a>, last_line: usize) -> Vec<Node> {
    let mut nodes = Vec::new();
    for child in root.children() {
        nodes.push(convert_node(child, false));

        if !matches!(child.data.borrow().value, NodeValue::BlockQuote) {
            continue;
        }
        let end = child.data.borrow().sourcepos.end.line;
        let next = child
            .next_sibling()
            .map_or(last_line + 1, |n| n.data.borrow().sourcepos.start.line);
        if next > end + 1 {
            nodes.push(Node::Newline);
        }
    }
    nodes
}

fn inline_children<'a>(node: &'a AstNode<'a>) -> Vec<Node> {
    let nodes = node
        .children()
        .map(|child| convert_node(child, false))
        .collect();
    split_reference_spans(merge_texts(nodes))
}

fn convert_node<'a>(node: &'a AstNode<'a>, tight: bool) -> Node {
    let data = node.data.borrow();

    match &data.value {
        NodeValue::Document => Node::document(block_children(node, false)),

        NodeValue::Paragraph => {
            let children = inline_children(node);
            if tight {
                Node::block_text(children)
            } else {
                Node::paragraph(children)
            }
        }

        NodeValue::Heading(heading) => Node::heading(heading.level, inline_children(node)),

        NodeValue::ThematicBreak => Node::ThematicBreak,

        NodeValue::BlockQuote => Node::block_quote(block_children(node, false)),

        NodeValue::List(list) => {
            let ordered = matches!(list.list_type, ListType::Ordered);
            let items = node
                .children()
                .map(|item| Node::list_item(block_children(item, list.tight)))
                .collect();
            Node::list(ordered, items)
        }

        // Items are handled by their list
        NodeValue::Item(_) => Node::list_item(block_children(node, tight)),

        NodeValue::CodeBlock(code_block) => {
            let info = if code_block.info.is_empty() {
                None
            } else {
                Some(code_block.info.clone())
            };
            Node::block_code(info, code_block.literal.clone())
        }

        NodeValue::HtmlBlock(html) => Node::block_html(html.literal.trim_end_matches('\n')),

        NodeValue::Table(table) => convert_table(node, &table.alignments),

        NodeValue::Text(text) => Node::text(text.clone()),
        NodeValue::SoftBreak => Node::text("\n"),
        NodeValue::LineBreak => Node::Linebreak,
        NodeValue::Code(code) => Node::codespan(code.literal.clone()),
        NodeValue::HtmlInline(html) => Node::inline_html(html.clone()),
        NodeValue::Emph => Node::emphasis(inline_children(node)),
        NodeValue::Strong => Node::strong(inline_children(node)),
        NodeValue::Strikethrough => Node::strikethrough(inline_children(node)),
        NodeValue::Link(link) => Node::link(link.url.clone(), inline_children(node)),

        NodeValue::Image(link) => {
            let mut alt = String::new();
            collect_text(node, &mut alt);
            if link.title.is_empty() {
                Node::image(link.url.clone(), alt)
            } else {
                Node::image_with_title(link.url.clone(), alt, link.title.clone())
            }
        }

        NodeValue::Math(math) => {
            let delim = if math.display_math { "$$" } else { "$" };
            Node::text(format!("{delim}{}{delim}", math.literal))
        }

        NodeValue::FootnoteReference(_) => Node::unknown("footnote_ref", vec![]),
        NodeValue::FootnoteDefinition(_) => {
            Node::unknown("footnote_item", block_children(node, false))
        }

        _ => Node::unknown("unknown", block_children(node, false)),
    }
}

fn convert_table<'a>(node: &'a AstNode<'a>, alignments: &[TableAlignment]) -> Node {
    let mut head = Vec::new();
    let mut rows = Vec::new();

    for row in node.children() {
        let header = matches!(row.data.borrow().value, NodeValue::TableRow(true));
        let cells: Vec<Node> = row
            .children()
            .enumerate()
            .map(|(i, cell)| Node::table_cell(cell_align(alignments.get(i)), inline_children(cell)))
            .collect();

        if header {
            head = cells;
        } else {
            rows.push(Node::table_row(cells));
        }
    }

    let mut children = vec![Node::table_head(head)];
    if !rows.is_empty() {
        children.push(Node::table_body(rows));
    }
    Node::table(children)
}

fn cell_align(align: Option<&TableAlignment>) -> Option<Align> {
    match align {
        Some(TableAlignment::Left) => Some(Align::Left),
        Some(TableAlignment::Center) => Some(Align::Center),
        Some(TableAlignment::Right) => Some(Align::Right),
        _ => None,
    }
}

/// Collect the plain text of an inline subtree (used for image alt text)
fn collect_text<'a>(node: &'a AstNode<'a>, output: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(text) => output.push_str(text),
        NodeValue::Code(code) => output.push_str(&code.literal),
        NodeValue::Math(math) => output.push_str(&math.literal),
        NodeValue::SoftBreak | NodeValue::LineBreak => output.push(' '),
        _ => {
            for child in node.children() {
                collect_text(child, output);
            }
        }
    }
}

fn merge_texts(nodes: Vec<Node>) -> Vec<Node> {
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

fn split_reference_spans(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(lit) => split_text(&lit.text, &mut out),
            other => out.push(other),
        }
    }
    out
}

fn split_text(text: &str, out: &mut Vec<Node>) {
    let math: Vec<Range<usize>> = MATH_SPAN.find_iter(text).map(|m| m.range()).collect();

    let mut last = 0;
    for m in REF_SPAN.find_iter(text) {
        if math.iter().any(|r| m.start() < r.end && r.start < m.end()) {
            continue;
        }
        if m.start() > last {
            out.push(Node::text(&text[last..m.start()]));
        }
        out.push(Node::text(m.as_str()));
        last = m.end();
    }

    if last < text.len() || last == 0 {
        out.push(Node::text(&text[last..]));
    }
}
