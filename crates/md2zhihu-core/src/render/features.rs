//! Platform feature tables
//!
//! A feature table maps node kinds to the [`Action`] that renders them on a
//! given platform. `block_code` is further keyed by fence language, with
//! `""` for code without a language and `*` as the fallback.

use md2zhihu_ast::{Node, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A platform specific rendering action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Copy a local (or, with download on, remote) image into the asset dir
    LocalToRemote,
    MathBlockToImgtag,
    MathInlineToImgtag,
    MathBlockToJpg,
    MathInlineToJpg,
    MathInlineToPlaintext,
    /// One-line `$$...$$` below the top level, three lines otherwise
    MathBlockJoinDollarWhenNested,
    MathInlineSingleDollar,
    TableToBareHtml,
    TableToJpg,
    /// HTML-escaped literal text
    ToPlaintext,
    /// Code image using the configured code width
    CodeToJpg,
    /// Code image 600 pixels wide
    CodeToFixedWidthJpg,
    MermaidToJpg,
    GraphvizToJpg,
    /// Children followed by a blank line, no markers
    FlatList,
    FlatListItem,
    /// Children with trailing blank lines removed, no `> `
    FlatBlockQuote,
}

/// Actions for `block_code`, keyed by fence language
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LangActions {
    exact: BTreeMap<String, Action>,
    wildcard: Option<Action>,
}

impl LangActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`LangActions::insert`]
    pub fn with(mut self, lang: &str, action: Action) -> Self {
        self.insert(lang, action);
        self
    }

    /// `*` sets the fallback; any other key, including `""`, is exact
    pub fn insert(&mut self, lang: &str, action: Action) {
        if lang == "*" {
            self.wildcard = Some(action);
        } else {
            self.exact.insert(lang.to_string(), action);
        }
    }

    pub fn get(&self, lang: &str) -> Option<Action> {
        self.exact.get(lang).copied().or(self.wildcard)
    }
}

/// How one node kind is handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feature {
    Action(Action),
    ByLang(LangActions),
}

/// A platform's feature table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Features {
    table: BTreeMap<NodeKind, Feature>,
}

impl Features {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: NodeKind, action: Action) -> Self {
        self.table.insert(kind, Feature::Action(action));
        self
    }

    pub fn with_langs(mut self, kind: NodeKind, langs: LangActions) -> Self {
        self.table.insert(kind, Feature::ByLang(langs));
        self
    }

    pub fn get(&self, kind: NodeKind) -> Option<&Feature> {
        self.table.get(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The action registered for `node`, if any
    pub fn lookup(&self, node: &Node) -> Option<Action> {
        match self.table.get(&node.kind())? {
            Feature::Action(action) => Some(*action),
            Feature::ByLang(langs) => {
                let lang = match node {
                    Node::BlockCode(code) => code.info.as_deref().unwrap_or(""),
                    _ => "",
                };
                langs.get(lang)
            }
        }
    }

    /// Image import only, for renderers that produce partial documents
    pub fn importer() -> Self {
        Self::new().with(NodeKind::Image, Action::LocalToRemote)
    }
}

/// Target publishing platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    Zhihu,
    Github,
    Wechat,
    Weibo,
    MinimalMistake,
    Simple,
    Transparent,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl Platform {
    pub const ALL: [Platform; 7] = [
        Platform::Zhihu,
        Platform::Github,
        Platform::Wechat,
        Platform::Weibo,
        Platform::MinimalMistake,
        Platform::Simple,
        Platform::Transparent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Zhihu => "zhihu",
            Platform::Github => "github",
            Platform::Wechat => "wechat",
            Platform::Weibo => "weibo",
            Platform::MinimalMistake => "minimal_mistake",
            Platform::Simple => "simple",
            Platform::Transparent => "transparent",
        }
    }

    /// The built-in feature table of this platform
    pub fn features(self) -> Features {
        let diagrams = LangActions::new()
            .with("mermaid", Action::MermaidToJpg)
            .with("graphviz", Action::GraphvizToJpg);
        let code_images = diagrams
            .clone()
            .with("", Action::CodeToJpg)
            .with("*", Action::CodeToFixedWidthJpg);
        let image = Features::importer();

        match self {
            Platform::Zhihu => image
                .with(NodeKind::MathBlock, Action::MathBlockToImgtag)
                .with(NodeKind::MathInline, Action::MathInlineToImgtag)
                .with(NodeKind::Table, Action::TableToBareHtml)
                .with_langs(NodeKind::BlockCode, diagrams),

            Platform::Github => image
                .with(NodeKind::MathBlock, Action::MathBlockJoinDollarWhenNested)
                .with(NodeKind::MathInline, Action::MathInlineSingleDollar)
                .with_langs(
                    NodeKind::BlockCode,
                    LangActions::new().with("graphviz", Action::GraphvizToJpg),
                ),

            Platform::Wechat => image
                .with(NodeKind::MathBlock, Action::MathBlockToImgtag)
                .with(NodeKind::MathInline, Action::MathInlineToImgtag)
                .with(NodeKind::Table, Action::TableToBareHtml)
                .with_langs(NodeKind::BlockCode, code_images),

            // Weibo does not accept paragraphs inside list items
            Platform::Weibo => image
                .with(NodeKind::MathBlock, Action::MathBlockToImgtag)
                .with(NodeKind::MathInline, Action::MathInlineToPlaintext)
                .with(NodeKind::Table, Action::TableToJpg)
                .with(NodeKind::Codespan, Action::ToPlaintext)
                .with(NodeKind::List, Action::FlatList)
                .with(NodeKind::ListItem, Action::FlatListItem)
                .with(NodeKind::BlockQuote, Action::FlatBlockQuote)
                .with_langs(NodeKind::BlockCode, code_images),

            Platform::MinimalMistake => image.with_langs(NodeKind::BlockCode, diagrams),

            Platform::Simple => image
                .with(NodeKind::MathBlock, Action::MathBlockToJpg)
                .with(NodeKind::MathInline, Action::MathInlineToJpg)
                .with(NodeKind::Table, Action::TableToJpg)
                .with(NodeKind::Codespan, Action::ToPlaintext)
                .with_langs(NodeKind::BlockCode, code_images),

            Platform::Transparent => image,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

/// Build a feature table from `type[/subtype]:action` rules
///
/// ```
/// use md2zhihu_core::render::{Action, rules_to_features};
/// use md2zhihu_ast::Node;
///
/// let features = rules_to_features(&["block_code/:to_jpg"]).unwrap();
/// let code = Node::block_code(None, "x\n");
/// assert_eq!(features.lookup(&code), Some(Action::CodeToJpg));
/// ```
pub fn rules_to_features<S: AsRef<str>>(rules: &[S]) -> Result<Features> {
    let mut features = Features::new();

    for rule in rules {
        let rule = rule.as_ref();
        let unknown = |token: &str| Error::UnknownRule {
            rule: rule.to_string(),
            token: token.to_string(),
        };

        let (path, act) = rule.split_once(':').ok_or_else(|| unknown(rule))?;
        let (typ, lang) = match path.split_once('/') {
            Some((typ, lang)) => (typ, Some(lang)),
            None => (path, None),
        };
        let kind: NodeKind = typ.parse().map_err(|_| unknown(typ))?;

        match (kind, lang) {
            (NodeKind::BlockCode, Some(lang)) => {
                let action = match (lang, act) {
                    ("graphviz", "to_jpg") => Action::GraphvizToJpg,
                    ("mermaid", "to_jpg") => Action::MermaidToJpg,
                    ("", "to_jpg") => Action::CodeToJpg,
                    ("*", "to_jpg") => Action::CodeToFixedWidthJpg,
                    ("graphviz" | "mermaid" | "" | "*", _) => return Err(unknown(act)),
                    _ => return Err(unknown(lang)),
                };
                let mut langs = match features.table.remove(&kind) {
                    Some(Feature::ByLang(langs)) => langs,
                    _ => LangActions::new(),
                };
                langs.insert(lang, action);
                features.table.insert(kind, Feature::ByLang(langs));
            }
            (_, Some(lang)) => return Err(unknown(lang)),
            (kind, None) => {
                let action = match (kind, act) {
                    (NodeKind::Image, "local_to_remote") => Action::LocalToRemote,
                    (NodeKind::MathBlock, "to_imgtag") => Action::MathBlockToImgtag,
                    (NodeKind::MathBlock, "to_jpg") => Action::MathBlockToJpg,
                    (NodeKind::MathInline, "to_imgtag") => Action::MathInlineToImgtag,
                    (NodeKind::MathInline, "to_jpg") => Action::MathInlineToJpg,
                    (NodeKind::MathInline, "to_plaintext") => Action::MathInlineToPlaintext,
                    (NodeKind::Table, "to_barehtml") => Action::TableToBareHtml,
                    (NodeKind::Table, "to_jpg") => Action::TableToJpg,
                    (NodeKind::Codespan, "to_text") => Action::ToPlaintext,
                    (
                        NodeKind::Image
                        | NodeKind::MathBlock
                        | NodeKind::MathInline
                        | NodeKind::Table
                        | NodeKind::Codespan,
                        _,
                    ) => return Err(unknown(act)),
                    _ => return Err(unknown(typ)),
                };
                features.table.insert(kind, Feature::Action(action));
            }
        }
    }

    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_to_features() {
        let features = rules_to_features(&["image:local_to_remote", "block_code/:to_jpg"]).unwrap();

        assert_eq!(
            features.get(NodeKind::Image),
            Some(&Feature::Action(Action::LocalToRemote))
        );
        assert_eq!(
            features.lookup(&Node::block_code(None, "x\n")),
            Some(Action::CodeToJpg)
        );
        assert_eq!(
            features.lookup(&Node::block_code(Some("go".into()), "x\n")),
            None
        );
    }

    #[test]
    fn test_rules_merge_languages() {
        let features =
            rules_to_features(&["block_code/mermaid:to_jpg", "block_code/*:to_jpg"]).unwrap();
        assert_eq!(
            features.lookup(&Node::block_code(Some("mermaid".into()), "")),
            Some(Action::MermaidToJpg)
        );
        assert_eq!(
            features.lookup(&Node::block_code(Some("go".into()), "")),
            Some(Action::CodeToFixedWidthJpg)
        );
    }

    #[test]
    fn test_rules_errors_name_the_token() {
        let token = |rule: &str| match rules_to_features(&[rule]) {
            Err(Error::UnknownRule { token, .. }) => token,
            other => panic!("expected UnknownRule for {rule}, got {other:?}"),
        };

        assert_eq!(token("paragraph:to_jpg"), "paragraph");
        assert_eq!(token("nope:to_jpg"), "nope");
        assert_eq!(token("table:to_png"), "to_png");
        assert_eq!(token("block_code/rust:to_jpg"), "rust");
        assert_eq!(token("block_code/mermaid:to_svg"), "to_svg");
        assert_eq!(token("image"), "image");
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!("minimal_mistake".parse::<Platform>().unwrap(), Platform::MinimalMistake);
        assert!("myspace".parse::<Platform>().is_err());
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn test_platform_tables() {
        let code = |lang: Option<&str>| Node::block_code(lang.map(str::to_string), "x\n");

        let wechat = Platform::Wechat.features();
        assert_eq!(wechat.lookup(&code(None)), Some(Action::CodeToJpg));
        assert_eq!(wechat.lookup(&code(Some("go"))), Some(Action::CodeToFixedWidthJpg));
        assert_eq!(wechat.lookup(&code(Some("mermaid"))), Some(Action::MermaidToJpg));

        let zhihu = Platform::Zhihu.features();
        assert_eq!(zhihu.lookup(&code(Some("go"))), None);
        assert_eq!(zhihu.lookup(&Node::table(vec![])), Some(Action::TableToBareHtml));

        let github = Platform::Github.features();
        assert_eq!(github.lookup(&code(Some("mermaid"))), None);
        assert_eq!(github.lookup(&code(Some("graphviz"))), Some(Action::GraphvizToJpg));

        let transparent = Platform::Transparent.features();
        assert_eq!(transparent, Features::importer());
    }
}
