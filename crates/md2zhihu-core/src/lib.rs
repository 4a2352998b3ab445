//! md2zhihu-core: convert Markdown into Markdown that a publishing platform
//! accepts
//!
//! This crate provides:
//! - front matter and reference definition extraction
//! - Markdown parsing into the [`md2zhihu_ast`] tree
//! - AST normalization: tables in lists, references, math, embedded documents
//! - platform rendering driven by per-node-type feature tables
//! - asset output and publication to a git asset repository
//!
//! ## Example
//!
//! ```rust
//! use md2zhihu_core::{Article, BuiltinConverter, ConfigOptions, ParserConfig, Platform, RenderConfig};
//!
//! let conf = RenderConfig::new(ConfigOptions {
//!     src_path: "doc.md".into(),
//!     platform: Platform::Transparent,
//!     ..ConfigOptions::default()
//! })
//! .unwrap();
//!
//! let parser_conf = ParserConfig::new::<&str>(true, &[]).unwrap();
//! let article = Article::new(&parser_conf, conf, "# Hi\n\nIt is $x$.\n").unwrap();
//! let lines = article.render(&BuiltinConverter::default()).unwrap();
//!
//! assert_eq!(lines, vec!["# Hi", "", "It is $$ x $$.", ""]);
//! ```

pub mod article;
pub mod config;
pub mod converter;
pub mod error;
pub mod extract;
pub mod output;
pub mod parser;
pub mod paths;
pub mod render;
pub mod repo;
pub mod transform;

pub use article::{Article, Chunk, ChunkKind, ParserConfig};
pub use config::{ConfigOptions, RenderConfig, RewriteRule};
pub use converter::{
    BuiltinConverter, ConvertOptions, Converted, Converter, SourceKind, TargetFormat,
};
pub use error::{Error, Result};
pub use extract::{FrontMatter, Refs};
pub use parser::parse;
pub use render::{Action, Features, Platform, Renderer, rules_to_features};
pub use repo::{AssetLocation, AssetRepo, LocalRepo};
