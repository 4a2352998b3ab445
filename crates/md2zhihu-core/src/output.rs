//! Reference appendix

use crate::extract::Refs;
use crate::render::{Lines, Platform};

/// The `Reference:` list of used references, sorted by id
///
/// A definition is `<url> [alt...]`; the alt text, quotes stripped, is shown
/// when present, otherwise the id.
pub fn render_ref_list(refs: &Refs, platform: Platform) -> Lines {
    let mut lines = vec![String::new(), "Reference:".to_string(), String::new()];

    for (id, definition) in refs {
        let mut tokens = definition.split_whitespace();
        let url = tokens.next().unwrap_or_default();
        let alt = tokens.collect::<Vec<_>>().join(" ");
        let text = if alt.is_empty() {
            id.as_str()
        } else {
            alt.trim_matches('"').trim_matches('\'')
        };

        lines.push(format!("- {text} : [{url}]({url})"));

        // Weibo renders a blank line between items as separate paragraphs
        if platform != Platform::Weibo {
            lines.push(String::new());
        }
    }

    lines
}

/// `[id]: definition` lines, sorted by id
pub fn ref_def_lines(refs: &Refs) -> Lines {
    refs.iter()
        .map(|(id, definition)| format!("[{id}]: {}", definition.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs() -> Refs {
        Refs::from([
            ("slim".to_string(), " https://slim \"Slim array\"".to_string()),
            ("a".to_string(), "https://a".to_string()),
            ("q".to_string(), "https://q 'quoted'".to_string()),
        ])
    }

    #[test]
    fn test_render_ref_list() {
        let lines = render_ref_list(&refs(), Platform::Zhihu);
        assert_eq!(
            lines,
            vec![
                "",
                "Reference:",
                "",
                "- a : [https://a](https://a)",
                "",
                "- quoted : [https://q](https://q)",
                "",
                "- Slim array : [https://slim](https://slim)",
                "",
            ]
        );
    }

    #[test]
    fn test_render_ref_list_weibo() {
        let lines = render_ref_list(&refs(), Platform::Weibo);
        assert_eq!(lines.len(), 3 + 3);
        assert!(lines[3..].iter().all(|l| l.starts_with("- ")));
    }

    #[test]
    fn test_ref_def_lines() {
        assert_eq!(
            ref_def_lines(&refs()),
            vec![
                "[a]: https://a",
                "[q]: https://q 'quoted'",
                "[slim]: https://slim \"Slim array\"",
            ]
        );
    }
}
