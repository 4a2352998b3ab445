//! Markdown AST node types
//!
//! The node set follows the block/inline split of a CommonMark parser, plus a
//! few nodes the pipeline introduces itself (`block_text` for tight list
//! content, `math_block` / `math_inline`, and `unknown` for constructs that
//! are carried through but not rendered).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// Synthetic root of a parsed document
    Document(Container),

    // Block nodes
    Paragraph(Container),
    Heading(Heading),
    ThematicBreak,
    BlockQuote(Container),
    List(List),
    ListItem(Container),
    /// Content of a tight list item
    BlockText(Container),
    BlockCode(BlockCode),
    BlockHtml(Literal),
    Table(Container),
    TableHead(Container),
    TableBody(Container),
    TableRow(Container),
    TableCell(TableCell),
    MathBlock(Literal),
    Newline,

    // Inline nodes
    Text(Literal),
    Emphasis(Container),
    Strong(Container),
    Strikethrough(Container),
    Codespan(Literal),
    Link(Link),
    Image(Image),
    InlineHtml(Literal),
    Linebreak,
    MathInline(Literal),

    /// A construct the pipeline keeps but has no rendering rule for
    Unknown(Unknown),
}

/// Node with an ordered list of children
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub children: Vec<Node>,
}

/// Node carrying literal text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub text: String,
}

/// Heading node (# to ######)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub children: Vec<Node>,
}

/// List node (ordered or bulleted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub ordered: bool,
    pub children: Vec<Node>,
}

/// Fenced or indented code block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockCode {
    /// Fence info string, usually the language
    pub info: Option<String>,
    /// Code text, including the trailing newline
    pub text: String,
}

/// Table cell node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub align: Option<Align>,
    pub children: Vec<Node>,
}

/// Table column alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Link node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub link: String,
    pub children: Vec<Node>,
}

/// Image node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    pub alt: String,
    pub title: Option<String>,
}

/// Unmodelled construct, kept with its parser name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unknown {
    pub name: String,
    pub children: Vec<Node>,
}

/// Fieldless discriminant of [`Node`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Document,
    Paragraph,
    Heading,
    ThematicBreak,
    BlockQuote,
    List,
    ListItem,
    BlockText,
    BlockCode,
    BlockHtml,
    Table,
    TableHead,
    TableBody,
    TableRow,
    TableCell,
    MathBlock,
    Newline,
    Text,
    Emphasis,
    Strong,
    Strikethrough,
    Codespan,
    Link,
    Image,
    InlineHtml,
    Linebreak,
    MathInline,
    Unknown,
}

impl NodeKind {
    pub const ALL: [NodeKind; 28] = [
        NodeKind::Document,
        NodeKind::Paragraph,
        NodeKind::Heading,
        NodeKind::ThematicBreak,
        NodeKind::BlockQuote,
        NodeKind::List,
        NodeKind::ListItem,
        NodeKind::BlockText,
        NodeKind::BlockCode,
        NodeKind::BlockHtml,
        NodeKind::Table,
        NodeKind::TableHead,
        NodeKind::TableBody,
        NodeKind::TableRow,
        NodeKind::TableCell,
        NodeKind::MathBlock,
        NodeKind::Newline,
        NodeKind::Text,
        NodeKind::Emphasis,
        NodeKind::Strong,
        NodeKind::Strikethrough,
        NodeKind::Codespan,
        NodeKind::Link,
        NodeKind::Image,
        NodeKind::InlineHtml,
        NodeKind::Linebreak,
        NodeKind::MathInline,
        NodeKind::Unknown,
    ];

    /// The snake_case type name, as used in serialized nodes and rules
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading => "heading",
            NodeKind::ThematicBreak => "thematic_break",
            NodeKind::BlockQuote => "block_quote",
            NodeKind::List => "list",
            NodeKind::ListItem => "list_item",
            NodeKind::BlockText => "block_text",
            NodeKind::BlockCode => "block_code",
            NodeKind::BlockHtml => "block_html",
            NodeKind::Table => "table",
            NodeKind::TableHead => "table_head",
            NodeKind::TableBody => "table_body",
            NodeKind::TableRow => "table_row",
            NodeKind::TableCell => "table_cell",
            NodeKind::MathBlock => "math_block",
            NodeKind::Newline => "newline",
            NodeKind::Text => "text",
            NodeKind::Emphasis => "emphasis",
            NodeKind::Strong => "strong",
            NodeKind::Strikethrough => "strikethrough",
            NodeKind::Codespan => "codespan",
            NodeKind::Link => "link",
            NodeKind::Image => "image",
            NodeKind::InlineHtml => "inline_html",
            NodeKind::Linebreak => "linebreak",
            NodeKind::MathInline => "math_inline",
            NodeKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized node type name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown node type: {0}")]
pub struct UnknownNodeKind(pub String);

impl FromStr for NodeKind {
    type Err = UnknownNodeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownNodeKind(s.to_string()))
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Document(_) => NodeKind::Document,
            Node::Paragraph(_) => NodeKind::Paragraph,
            Node::Heading(_) => NodeKind::Heading,
            Node::ThematicBreak => NodeKind::ThematicBreak,
            Node::BlockQuote(_) => NodeKind::BlockQuote,
            Node::List(_) => NodeKind::List,
            Node::ListItem(_) => NodeKind::ListItem,
            Node::BlockText(_) => NodeKind::BlockText,
            Node::BlockCode(_) => NodeKind::BlockCode,
            Node::BlockHtml(_) => NodeKind::BlockHtml,
            Node::Table(_) => NodeKind::Table,
            Node::TableHead(_) => NodeKind::TableHead,
            Node::TableBody(_) => NodeKind::TableBody,
            Node::TableRow(_) => NodeKind::TableRow,
            Node::TableCell(_) => NodeKind::TableCell,
            Node::MathBlock(_) => NodeKind::MathBlock,
            Node::Newline => NodeKind::Newline,
            Node::Text(_) => NodeKind::Text,
            Node::Emphasis(_) => NodeKind::Emphasis,
            Node::Strong(_) => NodeKind::Strong,
            Node::Strikethrough(_) => NodeKind::Strikethrough,
            Node::Codespan(_) => NodeKind::Codespan,
            Node::Link(_) => NodeKind::Link,
            Node::Image(_) => NodeKind::Image,
            Node::InlineHtml(_) => NodeKind::InlineHtml,
            Node::Linebreak => NodeKind::Linebreak,
            Node::MathInline(_) => NodeKind::MathInline,
            Node::Unknown(_) => NodeKind::Unknown,
        }
    }

    /// Type name for diagnostics; unknown nodes report their parser name
    pub fn type_name(&self) -> &str {
        match self {
            Node::Unknown(u) => &u.name,
            other => other.kind().as_str(),
        }
    }

    /// Children of a container node; leaves have none
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document(c)
            | Node::Paragraph(c)
            | Node::BlockQuote(c)
            | Node::ListItem(c)
            | Node::BlockText(c)
            | Node::Table(c)
            | Node::TableHead(c)
            | Node::TableBody(c)
            | Node::TableRow(c)
            | Node::Emphasis(c)
            | Node::Strong(c)
            | Node::Strikethrough(c) => &c.children,
            Node::Heading(h) => &h.children,
            Node::List(l) => &l.children,
            Node::TableCell(c) => &c.children,
            Node::Link(l) => &l.children,
            Node::Unknown(u) => &u.children,
            _ => &[],
        }
    }

    /// Mutable children of a container node, `None` for leaves
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Document(c)
            | Node::Paragraph(c)
            | Node::BlockQuote(c)
            | Node::ListItem(c)
            | Node::BlockText(c)
            | Node::Table(c)
            | Node::TableHead(c)
            | Node::TableBody(c)
            | Node::TableRow(c)
            | Node::Emphasis(c)
            | Node::Strong(c)
            | Node::Strikethrough(c) => Some(&mut c.children),
            Node::Heading(h) => Some(&mut h.children),
            Node::List(l) => Some(&mut l.children),
            Node::TableCell(c) => Some(&mut c.children),
            Node::Link(l) => Some(&mut l.children),
            Node::Unknown(u) => Some(&mut u.children),
            _ => None,
        }
    }

    /// Literal text of a leaf node
    pub fn literal(&self) -> Option<&str> {
        match self {
            Node::Text(l)
            | Node::Codespan(l)
            | Node::BlockHtml(l)
            | Node::InlineHtml(l)
            | Node::MathBlock(l)
            | Node::MathInline(l) => Some(&l.text),
            Node::BlockCode(c) => Some(&c.text),
            _ => None,
        }
    }

    /// Text of a `text` node
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(l) => Some(&l.text),
            _ => None,
        }
    }

    /// Mutable text of a `text` node
    pub fn as_text_mut(&mut self) -> Option<&mut String> {
        match self {
            Node::Text(l) => Some(&mut l.text),
            _ => None,
        }
    }
}

// Convenience constructors
impl Node {
    pub fn document(children: Vec<Node>) -> Self {
        Node::Document(Container { children })
    }

    pub fn text(s: impl Into<String>) -> Self {
        Node::Text(Literal { text: s.into() })
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Node::Paragraph(Container { children })
    }

    pub fn heading(level: u8, children: Vec<Node>) -> Self {
        Node::Heading(Heading { level, children })
    }

    pub fn block_quote(children: Vec<Node>) -> Self {
        Node::BlockQuote(Container { children })
    }

    pub fn list(ordered: bool, children: Vec<Node>) -> Self {
        Node::List(List { ordered, children })
    }

    pub fn list_item(children: Vec<Node>) -> Self {
        Node::ListItem(Container { children })
    }

    pub fn block_text(children: Vec<Node>) -> Self {
        Node::BlockText(Container { children })
    }

    pub fn block_code(info: Option<String>, text: impl Into<String>) -> Self {
        Node::BlockCode(BlockCode {
            info,
            text: text.into(),
        })
    }

    pub fn block_html(text: impl Into<String>) -> Self {
        Node::BlockHtml(Literal { text: text.into() })
    }

    pub fn table(children: Vec<Node>) -> Self {
        Node::Table(Container { children })
    }

    pub fn table_head(children: Vec<Node>) -> Self {
        Node::TableHead(Container { children })
    }

    pub fn table_body(children: Vec<Node>) -> Self {
        Node::TableBody(Container { children })
    }

    pub fn table_row(children: Vec<Node>) -> Self {
        Node::TableRow(Container { children })
    }

    pub fn table_cell(align: Option<Align>, children: Vec<Node>) -> Self {
        Node::TableCell(TableCell { align, children })
    }

    pub fn math_block(text: impl Into<String>) -> Self {
        Node::MathBlock(Literal { text: text.into() })
    }

    pub fn math_inline(text: impl Into<String>) -> Self {
        Node::MathInline(Literal { text: text.into() })
    }

    pub fn emphasis(children: Vec<Node>) -> Self {
        Node::Emphasis(Container { children })
    }

    pub fn strong(children: Vec<Node>) -> Self {
        Node::Strong(Container { children })
    }

    pub fn strikethrough(children: Vec<Node>) -> Self {
        Node::Strikethrough(Container { children })
    }

    pub fn codespan(text: impl Into<String>) -> Self {
        Node::Codespan(Literal { text: text.into() })
    }

    pub fn link(link: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Link(Link {
            link: link.into(),
            children,
        })
    }

    pub fn image(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Node::Image(Image {
            src: src.into(),
            alt: alt.into(),
            title: None,
        })
    }

    pub fn image_with_title(
        src: impl Into<String>,
        alt: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Node::Image(Image {
            src: src.into(),
            alt: alt.into(),
            title: Some(title.into()),
        })
    }

    pub fn inline_html(text: impl Into<String>) -> Self {
        Node::InlineHtml(Literal { text: text.into() })
    }

    pub fn unknown(name: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Unknown(Unknown {
            name: name.into(),
            children,
        })
    }
}
