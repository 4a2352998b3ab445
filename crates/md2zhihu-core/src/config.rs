//! Render configuration
//!
//! [`RenderConfig`] is derived once per source file from [`ConfigOptions`]
//! and stays immutable while the document is processed. Embedded documents
//! get a copy pointing at their own source path.

use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::paths::{absolutize, dirname, relpath, to_slash, url_join};
use crate::render::{Features, Platform};
use crate::repo::{AssetLocation, AssetRepo, LocalRepo};

static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d\d\d\d-\d\d-\d\d-(.*)$").expect("date prefix regex"));

/// Options for building a [`RenderConfig`]
#[derive(Debug, Clone)]
pub struct ConfigOptions {
    pub src_path: PathBuf,
    pub platform: Platform,
    /// Replaces the platform's feature table when set
    pub features: Option<Features>,
    /// Root of everything written, and of the pushed git tree
    pub output_dir: PathBuf,
    /// Assets go to `<asset_output_dir>/<article name>/`
    pub asset_output_dir: PathBuf,
    /// Output Markdown path; a trailing `/` makes it a directory
    pub md_output: String,
    /// Remote asset repository; local relative paths when absent
    pub asset_repo: Option<AssetRepo>,
    pub code_width: u32,
    pub keep_meta: bool,
    /// Keep front matter and the `YYYY-MM-DD-` file name prefix
    pub jekyll: bool,
    pub ref_files: Vec<PathBuf>,
    /// `(pattern, replacement)` pairs applied to every asset URL
    pub rewrite: Vec<(String, String)>,
    pub download: bool,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            src_path: PathBuf::new(),
            platform: Platform::default(),
            features: None,
            output_dir: PathBuf::from("_md2"),
            asset_output_dir: PathBuf::from("_md2"),
            md_output: "_md2/".to_string(),
            asset_repo: None,
            code_width: 1000,
            keep_meta: false,
            jekyll: false,
            ref_files: Vec::new(),
            rewrite: Vec::new(),
            download: false,
        }
    }
}

/// A compiled URL rewrite rule
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub pattern: Regex,
    /// Replacement text; `$1` / `${name}` refer to capture groups
    pub replacement: String,
}

impl RewriteRule {
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern).map_err(|e| Error::regex(pattern, e))?,
            replacement: replacement.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub platform: Platform,
    pub features: Features,
    /// The file being processed; differs from `root_src_path` inside embeds
    pub src_path: PathBuf,
    pub root_src_path: PathBuf,
    pub output_dir: PathBuf,
    pub md_output_path: PathBuf,
    /// Directory the output Markdown is written into
    pub md_output_base: PathBuf,
    /// File stem without the date prefix
    pub article_name: String,
    pub asset_output_dir: PathBuf,
    /// `asset_output_dir` relative to `output_dir`
    pub rel_dir: PathBuf,
    pub code_width: u32,
    pub keep_meta: bool,
    pub jekyll: bool,
    pub download: bool,
    pub ref_files: Vec<PathBuf>,
    pub rewrite: Vec<RewriteRule>,
    pub repo: AssetLocation,
}

impl RenderConfig {
    pub fn new(opts: ConfigOptions) -> Result<Self> {
        let file_name = opts
            .src_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let trimmed = DATE_PREFIX
            .captures(&file_name)
            .and_then(|c| c.get(1))
            .map_or(file_name.as_str(), |m| m.as_str())
            .to_string();

        let article_name = match trimmed.rsplit_once('.') {
            Some((stem, _)) => stem.to_string(),
            None => trimmed.clone(),
        };
        let out_name = if opts.jekyll { file_name } else { trimmed };

        let asset_output_dir = opts.asset_output_dir.join(&article_name);
        let rel_dir = relpath(&asset_output_dir, &opts.output_dir);

        let (md_output_path, md_output_base) = if opts.md_output.ends_with('/') {
            let base = PathBuf::from(&opts.md_output);
            (base.join(&out_name), base)
        } else {
            let path = PathBuf::from(&opts.md_output);
            let base = dirname(&absolutize(&path));
            (path, base)
        };

        let repo = match opts.asset_repo {
            Some(repo) => AssetLocation::Remote(repo),
            None => AssetLocation::Local(LocalRepo::new(&md_output_path, &opts.output_dir)),
        };

        let rewrite = opts
            .rewrite
            .iter()
            .map(|(p, r)| RewriteRule::new(p, r))
            .collect::<Result<Vec<_>>>()?;

        let conf = Self {
            platform: opts.platform,
            features: opts.features.unwrap_or_else(|| opts.platform.features()),
            root_src_path: opts.src_path.clone(),
            src_path: opts.src_path,
            output_dir: opts.output_dir,
            md_output_path,
            md_output_base,
            article_name,
            asset_output_dir,
            rel_dir,
            code_width: opts.code_width,
            keep_meta: opts.keep_meta || opts.jekyll,
            jekyll: opts.jekyll,
            download: opts.download,
            ref_files: opts.ref_files,
            rewrite,
            repo,
        };

        tracing::info!(
            src_path = %conf.src_path.display(),
            platform = %conf.platform,
            output_dir = %conf.output_dir.display(),
            asset_output_dir = %conf.asset_output_dir.display(),
            md_output_base = %conf.md_output_base.display(),
            md_output_path = %conf.md_output_path.display(),
            "render config"
        );

        Ok(conf)
    }

    /// The same configuration processing another source file
    pub fn with_src_path(&self, src_path: impl Into<PathBuf>) -> Self {
        Self {
            src_path: src_path.into(),
            ..self.clone()
        }
    }

    /// Public URL of an asset file named `name`
    pub fn img_url(&self, name: &str) -> String {
        let path = url_join(&to_slash(&self.rel_dir), name);
        let mut url = self.repo.path_pattern().replace("{path}", &path);
        for rule in &self.rewrite {
            url = rule
                .pattern
                .replace_all(&url, rule.replacement.as_str())
                .into_owned();
        }
        url
    }

    /// Resolve a path written in the document to one usable from the cwd
    ///
    /// A leading `/` means relative to the cwd; anything else is relative to
    /// the directory of the source file.
    pub fn relpath_from_cwd(&self, p: &str) -> PathBuf {
        if let Some(stripped) = p.strip_prefix('/') {
            return PathBuf::from(stripped);
        }
        let cwd = std::env::current_dir().unwrap_or_default();
        relpath(&dirname(&self.src_path).join(p), &cwd)
    }

    /// Directory of the source file, absolute
    pub fn src_dir(&self) -> PathBuf {
        absolutize(&dirname(&self.src_path))
    }
}
