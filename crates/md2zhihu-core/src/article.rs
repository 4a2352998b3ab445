//! The per-document pipeline
//!
//! ```text
//! text ─ front matter, reference definitions ─ parse ─ tables ─ references
//!      ─ math ─ embeds ─ render ─ reference appendix
//! ```

use md2zhihu_ast::{Node, NodeKind};
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::RenderConfig;
use crate::converter::Converter;
use crate::error::{Error, Result};
use crate::extract::{
    FrontMatter, Refs, extract_front_matter, extract_ref_definitions, load_external_refs,
};
use crate::output::{ref_def_lines, render_ref_list};
use crate::parser::parse;
use crate::paths::{absolutize, dirname};
use crate::render::{Lines, RenderEnv, RenderNode, Renderer, add_paragraph_end};
use crate::transform::{
    join_math_block, parse_in_list_tables, parse_math, rebase_url, rebase_url_in_ast,
    replace_ref_with_def,
};

/// How the source is turned into an AST
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Turn resolved references into links; otherwise only record their use
    pub replace_refs: bool,
    /// Image sources matching any of these are embedded documents
    pub embed: Vec<Regex>,
}

impl ParserConfig {
    pub fn new<S: AsRef<str>>(replace_refs: bool, embed: &[S]) -> Result<Self> {
        let embed = embed
            .iter()
            .map(|p| Regex::new(p.as_ref()).map_err(|e| Error::regex(p.as_ref(), e)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            replace_refs,
            embed,
        })
    }
}

/// A parsed and normalized document, ready to render
#[derive(Debug, Clone)]
pub struct Article {
    conf: RenderConfig,
    pub front_matter: Option<FrontMatter>,
    /// Every reference definition visible to the document
    pub refs: Refs,
    /// References actually used, including those of embedded documents
    pub used_refs: Refs,
    /// A `document` node
    pub ast: Node,
}

impl Article {
    pub fn new(parser_conf: &ParserConfig, conf: RenderConfig, text: &str) -> Result<Self> {
        let mut chain = Vec::new();
        Self::load(parser_conf, conf, text, &mut chain)
    }

    /// `chain` holds the absolute paths of the documents currently being
    /// embedded, outermost first
    fn load(
        parser_conf: &ParserConfig,
        conf: RenderConfig,
        text: &str,
        chain: &mut Vec<PathBuf>,
    ) -> Result<Self> {
        let platform = conf.platform.as_str();

        let (text, front_matter) = extract_front_matter(text)?;

        let mut refs = load_external_refs(&conf.ref_files, platform)?;
        if let Some(fm) = &front_matter {
            refs.extend(fm.get_refs(platform));
        }
        let (text, inline_refs) = extract_ref_definitions(&text);
        refs.extend(inline_refs);

        let mut nodes = parse_in_list_tables(parse(&text))?;
        let mut used_refs = replace_ref_with_def(&mut nodes, &refs, parser_conf.replace_refs);

        let nodes = parse_math(join_math_block(parse_math(nodes)));

        tracing::debug!(
            src = %conf.src_path.display(),
            nodes = nodes.len(),
            refs = refs.len(),
            used_refs = used_refs.len(),
            "parsed document"
        );

        chain.push(absolutize(&conf.src_path));
        let embedded = embed_nodes(parser_conf, &conf, nodes, &mut used_refs, chain);
        chain.pop();
        let nodes = embedded?;

        Ok(Self {
            conf,
            front_matter,
            refs,
            used_refs,
            ast: Node::document(nodes),
        })
    }

    pub fn conf(&self) -> &RenderConfig {
        &self.conf
    }

    fn renderer<'a>(&'a self, converter: &'a dyn Converter) -> Renderer<'a> {
        let env = RenderEnv {
            conf: &self.conf,
            converter,
        };
        Renderer::new(env, self.conf.features.clone())
    }

    /// The complete output document
    pub fn render(&self, converter: &dyn Converter) -> Result<Lines> {
        let mut lines = Vec::new();

        if self.conf.keep_meta
            && let Some(fm) = &self.front_matter
        {
            lines.extend(["---".to_string(), fm.text.clone(), "---".to_string(), String::new()]);
        }

        lines.extend(self.renderer(converter).render_document(&self.ast)?);

        if !self.used_refs.is_empty() {
            lines.extend(render_ref_list(&self.used_refs, self.conf.platform));
            lines = add_paragraph_end(lines);
            lines.extend(ref_def_lines(&self.used_refs));
        }

        Ok(lines)
    }

    /// The output split into separately pasteable pieces
    ///
    /// Lists are split per item and followed by a `new_line` chunk. The last
    /// chunk always holds the reference definitions.
    pub fn chunks(&self, converter: &dyn Converter) -> Result<Vec<Chunk>> {
        let renderer = self.renderer(converter);
        let root = RenderNode::root(&self.ast);
        let mut chunks = Vec::new();

        if let Some(fm) = &self.front_matter {
            chunks.push(Chunk::new(ChunkKind::FrontMatter, "", format!("---\n{}\n---", fm.text)));
        }

        for node in self.ast.children() {
            let rnode = root.child(node);

            if node.kind() == NodeKind::List {
                for item in node.children() {
                    let lines = renderer.render_node(&rnode.child(item))?;
                    chunks.push(Chunk::content(item, lines));
                }
                chunks.push(Chunk::new(ChunkKind::Content, "new_line", String::new()));
            } else {
                let lines = renderer.render_node(&rnode)?;
                chunks.push(Chunk::content(node, lines));
            }
        }

        chunks.push(Chunk::new(
            ChunkKind::RefDef,
            "",
            ref_def_lines(&self.used_refs).join("\n"),
        ));

        Ok(chunks)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    FrontMatter,
    Content,
    RefDef,
}

impl ChunkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChunkKind::FrontMatter => "front_matter",
            ChunkKind::Content => "content",
            ChunkKind::RefDef => "ref_def",
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub kind: ChunkKind,
    /// Type of the rendered node; empty for non-content chunks
    pub node_type: String,
    pub text: String,
}

impl Chunk {
    fn new(kind: ChunkKind, node_type: &str, text: String) -> Self {
        Self {
            kind,
            node_type: node_type.to_string(),
            text,
        }
    }

    fn content(node: &Node, lines: Lines) -> Self {
        let text = add_paragraph_end(lines).join("\n");
        Self::new(ChunkKind::Content, node.type_name(), text)
    }
}

/// Replace embed paragraphs below `nodes` with the embedded documents
fn embed_nodes(
    parser_conf: &ParserConfig,
    conf: &RenderConfig,
    nodes: Vec<Node>,
    used_refs: &mut Refs,
    chain: &mut Vec<PathBuf>,
) -> Result<Vec<Node>> {
    let mut out = Vec::with_capacity(nodes.len());

    for mut node in nodes {
        if let Some(src) = embed_target(&node, &parser_conf.embed) {
            let src = src.to_string();
            out.extend(embed_file(parser_conf, conf, &src, used_refs, chain)?);
            continue;
        }

        if let Some(children) = node.children_mut() {
            *children = embed_nodes(parser_conf, conf, std::mem::take(children), used_refs, chain)?;
        }
        out.push(node);
    }

    Ok(out)
}

/// Source of a paragraph holding nothing but an image matching an embed
/// pattern
fn embed_target<'a>(node: &'a Node, patterns: &[Regex]) -> Option<&'a str> {
    let Node::Paragraph(p) = node else {
        return None;
    };
    match p.children.as_slice() {
        [Node::Image(image)] if patterns.iter().any(|re| re.is_match(&image.src)) => {
            Some(&image.src)
        }
        _ => None,
    }
}

fn embed_file(
    parser_conf: &ParserConfig,
    conf: &RenderConfig,
    src: &str,
    used_refs: &mut Refs,
    chain: &mut Vec<PathBuf>,
) -> Result<Vec<Node>> {
    let path = conf.relpath_from_cwd(src);
    if chain.contains(&absolutize(&path)) {
        return Err(Error::CyclicEmbed(path));
    }

    tracing::info!(path = %path.display(), into = %conf.src_path.display(), "embedding document");

    let text = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
    let sub = Article::load(parser_conf, conf.with_src_path(&path), &text, chain)?;

    let from = dirname(&path);
    let to = dirname(&conf.src_path);

    let Node::Document(mut doc) = sub.ast else {
        return Ok(Vec::new());
    };
    rebase_url_in_ast(&from, &to, &mut doc.children);

    for (id, definition) in sub.used_refs {
        used_refs.insert(id, rebase_definition(&from, &to, &definition));
    }

    Ok(doc.children)
}

/// Rebase the URL token of a `<url> [alt...]` definition
fn rebase_definition(from: &Path, to: &Path, definition: &str) -> String {
    let trimmed = definition.trim_start();
    let (url, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((url, rest)) => (url, Some(rest)),
        None => (trimmed, None),
    };
    let url = rebase_url(from, to, url);
    match rest {
        Some(rest) => format!("{url} {rest}"),
        None => url,
    }
}
