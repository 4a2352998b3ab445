//! Reference resolution: `[text][id]`, `[id][]` and `[id]`

use md2zhihu_ast::Node;
use regex::Regex;
use std::sync::LazyLock;

use crate::extract::Refs;

static REF_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.*?)\](\[([^\]]*?)\])?$").expect("reference regex"));

/// Collect references used below `nodes`, returning id → definition
///
/// With `do_replace`, each resolved reference text node becomes a link to
/// the first whitespace-separated token of its definition. Unknown ids are
/// left as text.
pub fn replace_ref_with_def(nodes: &mut [Node], refs: &Refs, do_replace: bool) -> Refs {
    let mut used = Refs::new();

    for node in nodes.iter_mut() {
        if let Some(children) = node.children_mut() {
            used.extend(replace_ref_with_def(children, refs, do_replace));
        }

        let Some((text, id)) = node.as_text().and_then(parse_ref) else {
            continue;
        };
        let Some(definition) = refs.get(&id) else {
            continue;
        };

        used.insert(id, definition.clone());

        if do_replace {
            let url = definition.split_whitespace().next().unwrap_or_default();
            *node = Node::link(url, vec![Node::text(text)]);
        }
    }

    used
}

/// Display text and id of a reference span
fn parse_ref(text: &str) -> Option<(String, String)> {
    let caps = REF_TEXT.captures(text)?;
    let display = caps.get(1).map_or("", |m| m.as_str());
    let id = match caps.get(3).map(|m| m.as_str()) {
        Some(id) if !id.is_empty() => id,
        _ => display,
    };
    Some((display.to_string(), id.to_string()))
}
