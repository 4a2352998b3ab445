//! Rebasing relative URLs of an embedded document onto its host document

use md2zhihu_ast::Node;
use std::path::Path;

use crate::paths::{relpath, to_slash};

/// Re-express `url`, relative to `from`, as relative to `to`
///
/// Absolute URLs (`http(s)://`) and root-relative paths are kept.
pub fn rebase_url(from: &Path, to: &Path, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") || url.starts_with('/') {
        return url.to_string();
    }
    to_slash(&relpath(&from.join(url), to))
}

/// Rebase every image source and link target below `nodes`
pub fn rebase_url_in_ast(from: &Path, to: &Path, nodes: &mut [Node]) {
    for node in nodes.iter_mut() {
        match node {
            Node::Image(image) => image.src = rebase_url(from, to, &image.src),
            Node::Link(link) => {
                link.link = rebase_url(from, to, &link.link);
                rebase_url_in_ast(from, to, &mut link.children);
            }
            other => {
                if let Some(children) = other.children_mut() {
                    rebase_url_in_ast(from, to, children);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebase_url() {
        let from = Path::new("doc/sub");
        let to = Path::new("doc");

        assert_eq!(rebase_url(from, to, "a.png"), "sub/a.png");
        assert_eq!(rebase_url(from, to, "../b.png"), "b.png");
        assert_eq!(rebase_url(from, to, "https://x/a.png"), "https://x/a.png");
        assert_eq!(rebase_url(from, to, "/abs/a.png"), "/abs/a.png");
    }

    #[test]
    fn test_rebase_in_ast() {
        let mut nodes = vec![Node::paragraph(vec![
            Node::image("a.png", ""),
            Node::link("c.md", vec![Node::image("d.png", "")]),
        ])];
        rebase_url_in_ast(Path::new("doc/sub"), Path::new("doc"), &mut nodes);

        assert_eq!(
            nodes,
            vec![Node::paragraph(vec![
                Node::image("sub/a.png", ""),
                Node::link("sub/c.md", vec![Node::image("sub/d.png", "")]),
            ])]
        );
    }
}
