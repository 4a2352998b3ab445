//! md2zhihu-ast: Markdown AST types for md2zhihu
//!
//! ## Example
//!
//! ```rust
//! use md2zhihu_ast::{Node, NodeKind};
//!
//! let doc = Node::document(vec![
//!     Node::heading(1, vec![Node::text("Hello")]),
//!     Node::paragraph(vec![Node::text("World")]),
//! ]);
//!
//! assert_eq!(doc.children()[0].kind(), NodeKind::Heading);
//! ```

pub mod node;

pub use node::{
    Align, BlockCode, Container, Heading, Image, Link, List, Literal, Node, NodeKind, TableCell,
    Unknown, UnknownNodeKind,
};
