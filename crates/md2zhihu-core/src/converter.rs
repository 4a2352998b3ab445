//! Conversion of math, diagrams, code and tables into other formats
//!
//! Renderers only see the [`Converter`] trait. [`BuiltinConverter`] covers
//! the conversions that produce text; image output is delegated to an
//! external program named by `MD2ZHIHU_CONVERTER`, invoked as
//!
//! ```text
//! <program> <kind> <target> [--width N] [--asset-base PATH]
//! ```
//!
//! with the source on stdin and the result on stdout.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};
use crate::render::asset::escape;

/// Environment variable naming the external converter program
pub const CONVERTER_ENV: &str = "MD2ZHIHU_CONVERTER";

/// What the source text is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    TexBlock,
    TexInline,
    Mermaid,
    Graphviz,
    Code,
    Table,
    Md,
    Html,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::TexBlock => "tex_block",
            SourceKind::TexInline => "tex_inline",
            SourceKind::Mermaid => "mermaid",
            SourceKind::Graphviz => "graphviz",
            SourceKind::Code => "code",
            SourceKind::Table => "table",
            SourceKind::Md => "md",
            SourceKind::Html => "html",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to convert into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Jpg,
    Html,
    /// A single `<img>` tag pointing at a rendering service
    Imgtag,
    Plain,
}

impl TargetFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetFormat::Jpg => "jpg",
            TargetFormat::Html => "html",
            TargetFormat::Imgtag => "imgtag",
            TargetFormat::Plain => "plain",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Page width in pixels, for code images
    pub width: Option<u32>,
    /// Directory relative resources are resolved against, for Markdown
    pub asset_base: Option<PathBuf>,
}

/// Conversion output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Converted {
    Bytes(Vec<u8>),
    Text(String),
}

impl Converted {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Converted::Bytes(b) => b,
            Converted::Text(t) => t.into_bytes(),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Converted::Bytes(b) => String::from_utf8_lossy(&b).into_owned(),
            Converted::Text(t) => t,
        }
    }
}

/// Converts source text of one kind into a target format
pub trait Converter: Send + Sync {
    fn convert(
        &self,
        kind: SourceKind,
        source: &str,
        target: TargetFormat,
        opts: &ConvertOptions,
    ) -> Result<Converted>;
}

/// Native text conversions plus an optional external program for the rest
#[derive(Debug, Clone, Default)]
pub struct BuiltinConverter {
    program: Option<PathBuf>,
}

impl BuiltinConverter {
    /// Use the program named by `MD2ZHIHU_CONVERTER`, if set
    pub fn new() -> Self {
        Self {
            program: std::env::var_os(CONVERTER_ENV)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: Some(program.into()),
        }
    }

    fn run_program(
        &self,
        kind: SourceKind,
        source: &str,
        target: TargetFormat,
        opts: &ConvertOptions,
    ) -> Result<Converted> {
        let fail = |message: String| Error::Convert {
            kind: kind.to_string(),
            target: target.to_string(),
            message,
        };

        let program = self.program.as_ref().ok_or_else(|| {
            fail(format!("no native conversion; set {CONVERTER_ENV} to a converter program"))
        })?;

        let mut cmd = Command::new(program);
        cmd.arg(kind.as_str()).arg(target.as_str());
        if let Some(width) = opts.width {
            cmd.arg("--width").arg(width.to_string());
        }
        if let Some(base) = &opts.asset_base {
            cmd.arg("--asset-base").arg(base);
        }

        tracing::debug!(program = %program.display(), %kind, %target, "running converter");

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| fail(format!("failed to run {}: {e}", program.display())))?;

        // Feed stdin from its own thread while stdout drains. The child is
        // reaped even when the write fails.
        let stdin = child.stdin.take();
        let (written, output) = std::thread::scope(|s| {
            let writer = s.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(source.as_bytes()),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            (written, output)
        });

        let output = output.map_err(|e| fail(format!("failed to wait for converter: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(fail(format!("{}: {}", output.status, stderr.trim())));
        }

        written.map_err(|e| fail(format!("failed to write source: {e}")))?;

        Ok(Converted::Bytes(output.stdout))
    }
}

impl Converter for BuiltinConverter {
    fn convert(
        &self,
        kind: SourceKind,
        source: &str,
        target: TargetFormat,
        opts: &ConvertOptions,
    ) -> Result<Converted> {
        match (kind, target) {
            (SourceKind::TexBlock, TargetFormat::Imgtag) => {
                Ok(Converted::Text(tex_to_imgtag(source, true)))
            }
            (SourceKind::TexInline, TargetFormat::Imgtag) => {
                Ok(Converted::Text(tex_to_imgtag(source, false)))
            }
            (SourceKind::TexBlock | SourceKind::TexInline, TargetFormat::Plain) => {
                Ok(Converted::Text(tex_to_plain(source)))
            }
            (SourceKind::Table | SourceKind::Md | SourceKind::Html, TargetFormat::Html) => {
                Ok(Converted::Text(md_to_html(source)))
            }
            _ => self.run_program(kind, source, target, opts),
        }
    }
}

const EQUATION_URL: &str = "https://www.zhihu.com/equation?tex=";

/// An `<img>` tag rendering `tex` through the zhihu equation service
///
/// Block math is marked by a trailing `\\`, which the service centers.
pub fn tex_to_imgtag(tex: &str, block: bool) -> String {
    let tex = tex.trim().replace('\n', " ");
    let alt = escape(&tex);

    let mut query = tex;
    if block {
        query.push_str("\\\\");
    }
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes())
        .collect::<String>()
        .replace('+', "%20");

    format!(
        r#"<img src="{EQUATION_URL}{encoded}" alt="{alt}" class="ee_img tr_noresize" eeimg="1">"#
    )
}

/// A readable approximation of `tex`: commands lose their backslash and
/// grouping braces are dropped
pub fn tex_to_plain(tex: &str) -> String {
    let text: String = tex
        .trim()
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '\\'))
        .collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn md_to_html(source: &str) -> String {
    comrak::markdown_to_html(source, &crate::parser::comrak_options())
        .trim_end()
        .to_string()
}
