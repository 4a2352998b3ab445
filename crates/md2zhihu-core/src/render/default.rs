//! Universal rendering rules, used when no platform feature handles a node

use md2zhihu_ast::{Align, Image, Node};

use super::{Lines, RenderNode, Renderer, add_paragraph_end, strip_paragraph_end};
use crate::error::Result;

pub(super) fn render(r: &Renderer<'_>, rnode: &RenderNode<'_>) -> Result<Lines> {
    let lines = match rnode.node {
        Node::Document(_) | Node::TableBody(_) => r.render_children(rnode)?,

        Node::ThematicBreak => vec!["---".to_string(), String::new()],

        Node::Paragraph(_) => {
            let mut lines = join_split(r.render_children(rnode)?);
            lines.push(String::new());
            lines
        }

        Node::Text(t) => vec![t.text.clone()],

        Node::Strong(_) => wrap(r.render_children(rnode)?, "**", "**"),
        Node::Emphasis(_) => wrap(r.render_children(rnode)?, "*", "*"),
        Node::Strikethrough(_) => wrap(r.render_children(rnode)?, "~~", "~~"),

        Node::MathBlock(m) => vec!["$$".to_string(), m.text.clone(), "$$".to_string()],
        Node::MathInline(m) => vec![format!("$$ {} $$", m.text.trim())],

        Node::Table(_) => {
            let mut lines = r.render_children(rnode)?;
            lines.push(String::new());
            lines
        }

        Node::TableHead(head) => {
            let cells = r.render_children(rnode)?;
            let aligns: Vec<&str> = head
                .children
                .iter()
                .map(|c| match c {
                    Node::TableCell(cell) => align_marker(cell.align),
                    _ => align_marker(None),
                })
                .collect();
            vec![table_line(&cells), table_line(&aligns)]
        }

        Node::TableRow(_) => vec![table_line(&r.render_children(rnode)?)],

        Node::TableCell(_) => vec![r.render_children(rnode)?.concat()],

        Node::BlockCode(code) => {
            let mut lines = vec![format!("```{}", code.info.as_deref().unwrap_or(""))];
            let body = code.text.strip_suffix('\n').unwrap_or(&code.text);
            lines.extend(body.split('\n').map(str::to_string));
            lines.push("```".to_string());
            lines.push(String::new());
            lines
        }

        Node::Codespan(c) => vec![format!("`{}`", c.text)],

        Node::Image(image) => vec![image_line(image)],

        Node::List(_) => add_paragraph_end(r.render_children(rnode)?),

        Node::ListItem(_) => {
            let ordered = matches!(
                rnode.parent.map(|p| p.node),
                Some(Node::List(list)) if list.ordered
            );
            let head = if ordered { "1.  " } else { "-   " };

            let mut lines = pad_first(r.render_children(rnode)?);
            lines[0] = format!("{head}{}", lines[0]);
            for line in lines.iter_mut().skip(1) {
                if !line.is_empty() {
                    line.insert_str(0, "    ");
                }
            }
            lines
        }

        Node::BlockText(_) => join_split(r.render_children(rnode)?),

        Node::BlockQuote(_) => {
            let mut lines: Lines = strip_paragraph_end(r.render_children(rnode)?)
                .into_iter()
                .map(|l| format!("> {l}"))
                .collect();
            lines.push(String::new());
            lines
        }

        Node::Newline => vec![String::new()],

        Node::BlockHtml(html) => add_paragraph_end(vec![html.text.clone()]),

        Node::Link(link) => wrap(r.render_children(rnode)?, "[", &format!("]({})", link.link)),

        Node::Heading(heading) => {
            let mut lines = pad_first(r.render_children(rnode)?);
            lines[0] = format!("{} {}", "#".repeat(heading.level as usize), lines[0]);
            lines.push(String::new());
            lines
        }

        Node::InlineHtml(html) => vec![html.text.clone()],

        Node::Linebreak => vec!["  \n".to_string()],

        Node::Unknown(_) => {
            tracing::warn!(path = %rnode.path(), "no rendering rule for node");
            vec![format!("***:{}", rnode.node.type_name())]
        }
    };

    Ok(lines)
}

/// Markdown for an image node: `![alt](src)` or `![alt](src title)`
pub(crate) fn image_line(image: &Image) -> String {
    match &image.title {
        Some(title) => format!("![{}]({} {})", image.alt, image.src, title),
        None => format!("![{}]({})", image.alt, image.src),
    }
}

fn align_marker(align: Option<Align>) -> &'static str {
    match align {
        Some(Align::Left) => ":--",
        Some(Align::Right) => "--:",
        Some(Align::Center) => ":-:",
        None => "---",
    }
}

fn table_line<S: AsRef<str>>(cells: &[S]) -> String {
    let cells: Vec<&str> = cells.iter().map(AsRef::as_ref).collect();
    format!("| {} |", cells.join(" | "))
}

/// Concatenate fragments and split them back into lines
fn join_split(lines: Lines) -> Lines {
    lines.concat().split('\n').map(str::to_string).collect()
}

/// Ensure there is a first line to prefix
fn pad_first(mut lines: Lines) -> Lines {
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn wrap(lines: Lines, left: &str, right: &str) -> Lines {
    let mut lines = pad_first(lines);
    lines[0].insert_str(0, left);
    if let Some(last) = lines.last_mut() {
        last.push_str(right);
    }
    lines
}
