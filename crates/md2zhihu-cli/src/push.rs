//! Publishing the output directory to the asset repository

use anyhow::{Context, Result};
use std::path::PathBuf;

use md2zhihu_core::AssetRepo;

use crate::settings::Settings;

/// Push the output directory, which holds every converted asset, to `repo`
pub fn push_assets(repo: &AssetRepo, settings: &Settings, converted: &[(PathBuf, PathBuf)]) -> Result<()> {
    tracing::info!(
        dir = %settings.output_dir.display(),
        url = %repo.url,
        branch = %repo.branch,
        "pushing assets"
    );

    let args: Vec<String> = std::env::args().collect();
    let message = commit_message(&args, settings, converted);

    repo.push(&settings.output_dir, &message).with_context(|| {
        format!(
            "Failed to push {} to {} branch {}",
            settings.output_dir.display(),
            repo.url,
            repo.branch
        )
    })
}

fn commit_message(args: &[String], settings: &Settings, converted: &[(PathBuf, PathBuf)]) -> String {
    let mut lines = vec![
        "Built pages by md2zhihu".to_string(),
        String::new(),
        "CLI args:".to_string(),
        args.join(" "),
        String::new(),
        "Settings:".to_string(),
    ];
    lines.extend(settings.summary());
    lines.push(String::new());
    lines.push("Converted:".to_string());
    lines.extend(
        converted
            .iter()
            .map(|(src, dst)| format!("{} -> {}", src.display(), dst.display())),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use crate::config::Config;
    use clap::Parser;

    #[test]
    fn test_commit_message() {
        let cli = Cli::parse_from(["md2zhihu", "a.md", "-p", "github"]);
        let settings = Settings::resolve(&cli, Config::default()).unwrap();
        let converted = vec![(PathBuf::from("a.md"), PathBuf::from("_md2/a.md"))];

        let message = commit_message(
            &["md2zhihu".to_string(), "a.md".to_string()],
            &settings,
            &converted,
        );

        insta::assert_snapshot!(message, @r"
        Built pages by md2zhihu

        CLI args:
        md2zhihu a.md

        Settings:
        platform: github
        output_dir: _md2
        md_output: _md2/
        asset_output_dir: _md2
        keep_meta: false
        jekyll: false
        download: false
        code_width: 1000
        embed: [.]md$

        Converted:
        a.md -> _md2/a.md
        ");
    }
}
