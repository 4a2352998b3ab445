//! Effective settings: command line flags over `_md2zhihu.toml` over defaults

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use md2zhihu_core::{AssetRepo, ConfigOptions, Features, Platform, rules_to_features};

use crate::Cli;
use crate::config::Config;

const DEFAULT_OUTPUT_DIR: &str = "_md2";
const DEFAULT_EMBED: &str = r"[.]md$";
const DEFAULT_CODE_WIDTH: u32 = 1000;

#[derive(Debug, Clone)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub md_output: String,
    pub asset_output_dir: PathBuf,
    pub platform: Platform,
    /// Replaces the platform's feature table when set
    pub features: Option<Features>,
    pub keep_meta: bool,
    pub jekyll: bool,
    pub refs: Vec<PathBuf>,
    pub rewrite: Vec<(String, String)>,
    pub download: bool,
    pub embed: Vec<String>,
    pub code_width: u32,
    pub repo: Option<String>,
    pub cdn: bool,
}

impl Settings {
    pub fn resolve(cli: &Cli, config: Config) -> Result<Self> {
        let Config {
            output,
            render,
            repo,
        } = config;

        let output_dir = cli
            .output_dir
            .clone()
            .or(output.output_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let md_output = cli
            .md_output
            .clone()
            .or(output.md_output)
            .unwrap_or_else(|| format!("{}/", output_dir.display()));

        let asset_output_dir = cli
            .asset_output_dir
            .clone()
            .or(output.asset_output_dir)
            .unwrap_or_else(|| output_dir.clone());

        let platform = match (cli.platform, render.platform) {
            (Some(p), _) => p,
            (None, Some(name)) => name
                .parse()
                .with_context(|| format!("Invalid platform in config: {name}"))?,
            (None, None) => Platform::default(),
        };

        let features = render
            .rules
            .map(|rules| rules_to_features(&rules))
            .transpose()
            .context("Invalid render rules in config")?;

        let jekyll = cli.jekyll || output.jekyll.unwrap_or(false);
        let keep_meta = jekyll || cli.keep_meta || output.keep_meta.unwrap_or(false);

        let refs = if cli.refs.is_empty() {
            render.refs.unwrap_or_default()
        } else {
            cli.refs.clone()
        };

        let rewrite = if cli.rewrite.is_empty() {
            render
                .rewrite
                .unwrap_or_default()
                .into_iter()
                .map(|r| (r.pattern, r.replacement))
                .collect()
        } else {
            // clap only accepts `--rewrite` with exactly two values
            cli.rewrite
                .chunks_exact(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect()
        };

        let embed = cli
            .embed
            .clone()
            .or(render.embed)
            .unwrap_or_else(|| vec![DEFAULT_EMBED.to_string()]);

        Ok(Self {
            output_dir,
            md_output,
            asset_output_dir,
            platform,
            features,
            keep_meta,
            jekyll,
            refs,
            rewrite,
            download: cli.download || render.download.unwrap_or(false),
            embed,
            code_width: cli
                .code_width
                .or(render.code_width)
                .unwrap_or(DEFAULT_CODE_WIDTH),
            repo: cli.repo.clone().or(repo.url),
            cdn: !cli.no_cdn && repo.cdn.unwrap_or(true),
        })
    }

    /// Options for converting the document at `src`
    pub fn config_options(&self, src: &Path, asset_repo: Option<AssetRepo>) -> ConfigOptions {
        ConfigOptions {
            src_path: src.to_path_buf(),
            platform: self.platform,
            features: self.features.clone(),
            output_dir: self.output_dir.clone(),
            asset_output_dir: self.asset_output_dir.clone(),
            md_output: self.md_output.clone(),
            asset_repo,
            code_width: self.code_width,
            keep_meta: self.keep_meta,
            jekyll: self.jekyll,
            ref_files: self.refs.clone(),
            rewrite: self.rewrite.clone(),
            download: self.download,
        }
    }

    /// `key: value` lines for the asset commit message
    pub fn summary(&self) -> Vec<String> {
        let mut lines = vec![
            format!("platform: {}", self.platform),
            format!("output_dir: {}", self.output_dir.display()),
            format!("md_output: {}", self.md_output),
            format!("asset_output_dir: {}", self.asset_output_dir.display()),
            format!("keep_meta: {}", self.keep_meta),
            format!("jekyll: {}", self.jekyll),
            format!("download: {}", self.download),
            format!("code_width: {}", self.code_width),
            format!("embed: {}", self.embed.join(" ")),
        ];
        if let Some(repo) = &self.repo {
            lines.push(format!("repo: {repo}"));
        }
        lines
    }
}
