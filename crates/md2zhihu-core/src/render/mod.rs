//! AST to platform Markdown rendering
//!
//! Rendering walks [`RenderNode`]s. For each node the feature table of the
//! target platform is consulted first; an action either returns the rendered
//! lines or declines, in which case the universal default rules apply.

mod actions;
pub mod asset;
mod default;
pub mod features;

use md2zhihu_ast::Node;

use crate::config::RenderConfig;
use crate::converter::Converter;
use crate::error::{Error, Result};

pub use features::{Action, Feature, Features, LangActions, Platform, rules_to_features};

/// Rendered output, one entry per line
///
/// Inline nodes produce line fragments that their paragraph joins and
/// re-splits on `\n`.
pub type Lines = Vec<String>;

/// A node being rendered, with its ancestry
#[derive(Debug, Clone, Copy)]
pub struct RenderNode<'a> {
    pub node: &'a Node,
    pub parent: Option<&'a RenderNode<'a>>,
    /// Distance from the synthetic document root
    pub level: usize,
}

impl<'a> RenderNode<'a> {
    pub fn root(node: &'a Node) -> Self {
        Self {
            node,
            parent: None,
            level: 0,
        }
    }

    pub fn child<'b>(&'b self, node: &'b Node) -> RenderNode<'b> {
        RenderNode {
            node,
            parent: Some(self),
            level: self.level + 1,
        }
    }

    /// Path of type names from the root, for diagnostics
    pub fn path(&self) -> String {
        match self.parent {
            Some(p) => format!("{} -> {}", p.path(), self.node.type_name()),
            None => self.node.type_name().to_string(),
        }
    }
}

/// What a renderer needs to produce side effects: where assets go and how
/// diagrams, math and tables are converted
#[derive(Clone, Copy)]
pub struct RenderEnv<'a> {
    pub conf: &'a RenderConfig,
    pub converter: &'a dyn Converter,
}

/// Platform renderer
pub struct Renderer<'a> {
    env: Option<RenderEnv<'a>>,
    features: Features,
}

impl<'a> Renderer<'a> {
    pub fn new(env: RenderEnv<'a>, features: Features) -> Self {
        Self {
            env: Some(env),
            features,
        }
    }

    /// A renderer with no features and no side effects, producing plain
    /// Markdown from the default rules only
    pub fn generic() -> Renderer<'static> {
        Renderer {
            env: None,
            features: Features::default(),
        }
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    pub(crate) fn env(&self) -> Result<RenderEnv<'a>> {
        self.env.ok_or(Error::MissingRenderEnv)
    }

    /// A renderer sharing this one's environment with a different feature table
    pub(crate) fn with_features(&self, features: Features) -> Renderer<'a> {
        Renderer {
            env: self.env,
            features,
        }
    }

    /// Render one node, platform features first
    pub fn render_node(&self, rnode: &RenderNode<'_>) -> Result<Lines> {
        if let Some(action) = self.features.lookup(rnode.node)
            && let Some(lines) = action.apply(self, rnode)?
        {
            return Ok(lines);
        }
        default::render(self, rnode)
    }

    /// Render the children of a node, concatenating their lines
    pub fn render_children(&self, rnode: &RenderNode<'_>) -> Result<Lines> {
        let mut lines = Vec::new();
        for child in rnode.node.children() {
            lines.extend(self.render_node(&rnode.child(child))?);
        }
        Ok(lines)
    }

    /// Render a list of top-level nodes as a document
    pub fn render_document(&self, document: &Node) -> Result<Lines> {
        self.render_children(&RenderNode::root(document))
    }
}

/// Append an empty line unless the block already ends with one
pub(crate) fn add_paragraph_end(mut lines: Lines) -> Lines {
    if lines.last().is_none_or(|l| !l.is_empty()) {
        lines.push(String::new());
    }
    lines
}

/// Drop trailing empty lines
pub(crate) fn strip_paragraph_end(mut lines: Lines) -> Lines {
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_node_levels() {
        let math = Node::math_block("x");
        let para = Node::paragraph(vec![math.clone()]);
        let doc = Node::document(vec![para.clone()]);

        let root = RenderNode::root(&doc);
        let p = root.child(&para);
        let m = p.child(&math);
        assert_eq!(root.level, 0);
        assert_eq!(p.level, 1);
        assert_eq!(m.level, 2);
        assert_eq!(m.path(), "document -> paragraph -> math_block");
    }

    #[test]
    fn test_paragraph_end_helpers() {
        let lines = add_paragraph_end(vec!["a".to_string()]);
        assert_eq!(lines, vec!["a", ""]);
        assert_eq!(add_paragraph_end(lines.clone()), lines);
        assert_eq!(add_paragraph_end(vec![]), vec![""]);

        let lines = strip_paragraph_end(vec!["a".to_string(), String::new(), String::new()]);
        assert_eq!(lines, vec!["a"]);
    }

    #[test]
    fn test_generic_renderer_has_no_env() {
        let renderer = Renderer::generic();
        assert!(matches!(renderer.env(), Err(Error::MissingRenderEnv)));
        assert!(renderer.features().is_empty());
    }
}
