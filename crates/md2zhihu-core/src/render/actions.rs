//! Platform actions

use md2zhihu_ast::Node;

use super::asset::{escape, import_image, text_to_jpg};
use super::{Features, Lines, RenderNode, Renderer, strip_paragraph_end};
use crate::converter::{ConvertOptions, SourceKind, TargetFormat};
use crate::error::Result;
use crate::render::Action;

/// Width of code images for languages without a dedicated width
const FIXED_CODE_WIDTH: u32 = 600;

impl Action {
    /// Render `rnode`, or return `None` to fall back to the default rule
    pub(crate) fn apply(self, r: &Renderer<'_>, rnode: &RenderNode<'_>) -> Result<Option<Lines>> {
        let node = rnode.node;

        let lines = match self {
            Action::LocalToRemote => return import_image(r, rnode),

            Action::MathBlockToImgtag => {
                let Some(tex) = math_text(node) else { return Ok(None) };
                vec![convert_text(r, SourceKind::TexBlock, tex, TargetFormat::Imgtag)?]
            }
            Action::MathInlineToImgtag => {
                let Some(tex) = math_text(node) else { return Ok(None) };
                vec![convert_text(r, SourceKind::TexInline, tex, TargetFormat::Imgtag)?]
            }
            Action::MathBlockToJpg => {
                let Some(tex) = math_text(node) else { return Ok(None) };
                text_to_jpg(r, SourceKind::TexBlock, tex, &ConvertOptions::default())?
            }
            Action::MathInlineToJpg => {
                let Some(tex) = math_text(node) else { return Ok(None) };
                text_to_jpg(r, SourceKind::TexInline, tex, &ConvertOptions::default())?
            }
            Action::MathInlineToPlaintext => {
                let Some(tex) = math_text(node) else { return Ok(None) };
                let plain = convert_text(r, SourceKind::TexInline, tex, TargetFormat::Plain)?;
                vec![escape(&plain)]
            }

            // ROOT -> paragraph -> math_block is level 2; deeper math sits in
            // lists or quotes, where multi-line block math does not render.
            Action::MathBlockJoinDollarWhenNested => {
                let Some(tex) = math_text(node) else { return Ok(None) };
                if rnode.level > 2 {
                    vec![format!("$${}$$", tex.trim())]
                } else {
                    vec!["$$".to_string(), tex.to_string(), "$$".to_string()]
                }
            }
            Action::MathInlineSingleDollar => {
                let Some(tex) = math_text(node) else { return Ok(None) };
                vec![format!("${}$", tex.trim())]
            }

            Action::TableToBareHtml => {
                let md = r.with_features(Features::importer()).render_node(rnode)?;
                let html = convert_text(r, SourceKind::Table, &md.join("\n"), TargetFormat::Html)?;
                let mut lines: Lines = html.split('\n').map(str::to_string).collect();
                lines.push(String::new());
                lines
            }
            Action::TableToJpg => {
                let md = r.with_features(Features::new()).render_node(rnode)?;
                let opts = ConvertOptions {
                    asset_base: Some(r.env()?.conf.src_dir()),
                    ..ConvertOptions::default()
                };
                text_to_jpg(r, SourceKind::Md, &md.join("\n"), &opts)?
            }

            Action::ToPlaintext => {
                let Some(text) = node.literal() else { return Ok(None) };
                vec![escape(text)]
            }

            Action::CodeToJpg | Action::CodeToFixedWidthJpg => {
                let Node::BlockCode(code) = node else { return Ok(None) };
                let width = match self {
                    Action::CodeToJpg => r.env()?.conf.code_width,
                    _ => FIXED_CODE_WIDTH,
                };
                let opts = ConvertOptions {
                    width: Some(width),
                    ..ConvertOptions::default()
                };
                let fenced = code_join(code.info.as_deref(), &code.text);
                text_to_jpg(r, SourceKind::Code, &fenced, &opts)?
            }
            Action::MermaidToJpg | Action::GraphvizToJpg => {
                let Node::BlockCode(code) = node else { return Ok(None) };
                let kind = match self {
                    Action::MermaidToJpg => SourceKind::Mermaid,
                    _ => SourceKind::Graphviz,
                };
                text_to_jpg(r, kind, &code.text, &ConvertOptions::default())?
            }

            Action::FlatList | Action::FlatListItem => {
                let mut lines = r.render_children(rnode)?;
                lines.push(String::new());
                lines
            }
            Action::FlatBlockQuote => strip_paragraph_end(r.render_children(rnode)?),
        };

        Ok(Some(lines))
    }
}

fn math_text(node: &Node) -> Option<&str> {
    match node {
        Node::MathBlock(m) | Node::MathInline(m) => Some(&m.text),
        _ => None,
    }
}

fn convert_text(r: &Renderer<'_>, kind: SourceKind, text: &str, target: TargetFormat) -> Result<String> {
    let env = r.env()?;
    Ok(env
        .converter
        .convert(kind, text, target, &ConvertOptions::default())?
        .into_text())
}

/// Fence code again, for the code-to-image converter
fn code_join(info: Option<&str>, text: &str) -> String {
    let body = text.strip_suffix('\n').unwrap_or(text);
    format!("```{}\n{body}\n```\n", info.unwrap_or(""))
}
