//! md2zhihu: CLI tool to convert Markdown into platform compatible Markdown

mod config;
mod push;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use md2zhihu_core::{
    Article, AssetRepo, BuiltinConverter, Converter, ParserConfig, Platform, RenderConfig,
};

use crate::config::Config;
use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "md2zhihu")]
#[command(about = "Convert Markdown into zhihu, wechat, weibo or github compatible Markdown")]
#[command(version)]
#[command(after_help = "Examples:
  md2zhihu post.md                          # Convert to _md2/post.md, assets in _md2/post/
  md2zhihu post.md -p wechat -o out.md      # Convert for wechat into out.md
  md2zhihu a.md b.md -r git@github.com:me/assets.git
                                            # Push assets to a branch of a github repo
  md2zhihu --print-schema                   # Print the JSON schema of _md2zhihu.toml")]
pub struct Cli {
    /// Markdown files to convert
    #[arg(required_unless_present = "print_schema")]
    pub src_path: Vec<PathBuf>,

    /// Output directory; the root of the git repo pushed to the asset repository [default: _md2]
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,

    /// Output Markdown path; a trailing "/" makes it a directory [default: <output-dir>/]
    #[arg(short = 'o', long)]
    pub md_output: Option<String>,

    /// Directory to store assets [default: <output-dir>]
    #[arg(long)]
    pub asset_output_dir: Option<PathBuf>,

    /// Git URL of the asset repository, e.g. git@github.com:me/assets.git[@branch]; "." uses the current repo
    #[arg(short, long)]
    pub repo: Option<String>,

    /// Reference github assets by their raw URL instead of the jsdelivr CDN
    #[arg(long)]
    pub no_cdn: bool,

    /// Target platform [default: zhihu]
    #[arg(short, long)]
    pub platform: Option<Platform>,

    /// Keep the front matter in the output
    #[arg(long)]
    pub keep_meta: bool,

    /// Jekyll mode: implies --keep-meta and keeps the YYYY-MM-DD- file name prefix
    #[arg(long)]
    pub jekyll: bool,

    /// YAML file of reference definitions, keyed by "universal" or platform name
    #[arg(long = "refs", value_name = "FILE")]
    pub refs: Vec<PathBuf>,

    /// Rewrite generated asset URLs matching PATTERN
    #[arg(long, num_args = 2, value_names = ["PATTERN", "REPLACEMENT"])]
    pub rewrite: Vec<String>,

    /// Download remote images into the asset directory
    #[arg(long)]
    pub download: bool,

    /// Regexes of image URLs whose target documents are embedded [default: "[.]md$"]
    #[arg(long, num_args = 1.., value_name = "REGEX")]
    pub embed: Option<Vec<String>>,

    /// Code image width in pixels [default: 1000]
    #[arg(long)]
    pub code_width: Option<u32>,

    /// Number of parallel jobs (defaults to number of CPUs)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Configuration file [default: ./_md2zhihu.toml when present]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the JSON schema of the configuration file and exit
    #[arg(long)]
    pub print_schema: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode - only show errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    if cli.print_schema {
        println!("{}", Config::json_schema_string()?);
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            Config::load_from_dir(&cwd)?.unwrap_or_default()
        }
    };
    let settings = Settings::resolve(&cli, config)?;

    tracing::info!(
        src = ?cli.src_path,
        md_output = %settings.md_output,
        asset_output_dir = %settings.asset_output_dir.display(),
        output_dir = %settings.output_dir.display(),
        repo = settings.repo.as_deref().unwrap_or("-"),
        "build markdown"
    );

    let asset_repo = settings
        .repo
        .as_deref()
        .map(|url| AssetRepo::new(url, settings.cdn))
        .transpose()
        .context("Invalid asset repository")?;

    if let Some(n) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let parser_conf = ParserConfig::new(true, &settings.embed)?;
    let converter = BuiltinConverter::new();

    let skipped = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    let results: Vec<_> = cli
        .src_path
        .par_iter()
        .map(|src| {
            let result = convert_file(src, &settings, asset_repo.as_ref(), &parser_conf, &converter);
            match &result {
                Ok(Some(output)) => {
                    if !cli.quiet {
                        println!("{}", output.display());
                    }
                }
                Ok(None) => {
                    skipped.fetch_add(1, Ordering::Relaxed);
                }
                Err(_) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                }
            }
            (src, result)
        })
        .collect();

    let mut converted = Vec::new();
    for (src, result) in results {
        match result {
            Ok(Some(output)) => converted.push((src.clone(), output)),
            Ok(None) => {}
            Err(e) => tracing::error!("Error converting {}: {:#}", src.display(), e),
        }
    }

    let failed_count = failed.load(Ordering::Relaxed);
    tracing::info!(
        converted = converted.len(),
        skipped = skipped.load(Ordering::Relaxed),
        failed = failed_count,
        "conversion finished"
    );

    if failed_count > 0 {
        anyhow::bail!("{} files failed to convert", failed_count);
    }

    match &asset_repo {
        Some(repo) => push::push_assets(repo, &settings, &converted)?,
        None => tracing::info!("no asset repository specified, assets stay local"),
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise `info`, `debug` with -v, `error` with -q
fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Convert one document, returning the output path
///
/// A missing source file is reported and skipped with `Ok(None)`. The output
/// Markdown is written only once rendering has fully succeeded.
fn convert_file(
    src: &Path,
    settings: &Settings,
    asset_repo: Option<&AssetRepo>,
    parser_conf: &ParserConfig,
    converter: &dyn Converter,
) -> Result<Option<PathBuf>> {
    let text = match fs::read_to_string(src) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("file not found: {}", src.display());
            return Ok(None);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read: {}", src.display()));
        }
    };

    let conf = RenderConfig::new(settings.config_options(src, asset_repo.cloned()))?;

    for dir in [&conf.output_dir, &conf.asset_output_dir, &conf.md_output_base] {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    let article = Article::new(parser_conf, conf, &text)
        .with_context(|| format!("Failed to parse: {}", src.display()))?;
    let lines = article
        .render(converter)
        .with_context(|| format!("Failed to render: {}", src.display()))?;

    let output = article.conf().md_output_path.clone();
    fs::write(&output, lines.join("\n"))
        .with_context(|| format!("Failed to write: {}", output.display()))?;

    tracing::info!(src = %src.display(), output = %output.display(), "done building");

    Ok(Some(output))
}
