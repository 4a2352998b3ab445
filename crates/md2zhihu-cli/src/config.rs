//! Configuration file support for the md2zhihu CLI
//!
//! Loads settings from a `_md2zhihu.toml` file in the current directory.
//! Every value is optional; command line flags take precedence.

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "_md2zhihu.toml";

/// Root configuration structure
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where converted documents and assets are written
    #[serde(skip_serializing_if = "OutputConfig::is_empty")]
    pub output: OutputConfig,
    /// How documents are rendered
    #[serde(skip_serializing_if = "RenderConfig::is_empty")]
    pub render: RenderConfig,
    /// Git repository that hosts the assets
    #[serde(skip_serializing_if = "RepoConfig::is_empty")]
    pub repo: RepoConfig,
}

/// Output location configuration
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Root of the output, and of the git repo pushed to the asset repository (default: "_md2")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    /// Output Markdown path; a trailing "/" makes it a directory (default: "<output_dir>/")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md_output: Option<String>,
    /// Directory for assets (default: <output_dir>)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_output_dir: Option<PathBuf>,
    /// Keep the front matter in the output (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_meta: Option<bool>,
    /// Jekyll mode: keep front matter and the date prefix of file names (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jekyll: Option<bool>,
}

impl OutputConfig {
    fn is_empty(&self) -> bool {
        self.output_dir.is_none()
            && self.md_output.is_none()
            && self.asset_output_dir.is_none()
            && self.keep_meta.is_none()
            && self.jekyll.is_none()
    }
}

/// Rendering configuration
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Target platform: zhihu, github, wechat, weibo, minimal_mistake, simple or transparent (default: "zhihu")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Feature rules replacing the platform table, e.g. "image:local_to_remote" or "block_code/mermaid:to_jpg"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<String>>,
    /// Code image width in pixels (default: 1000)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_width: Option<u32>,
    /// Regexes of image URLs whose documents are embedded (default: ["[.]md$"])
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed: Option<Vec<String>>,
    /// Reference definition files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refs: Option<Vec<PathBuf>>,
    /// Download remote images into the asset directory (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<bool>,
    /// Rewrites applied to generated asset URLs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<Vec<RewriteConfig>>,
}

impl RenderConfig {
    fn is_empty(&self) -> bool {
        self.platform.is_none()
            && self.rules.is_none()
            && self.code_width.is_none()
            && self.embed.is_none()
            && self.refs.is_none()
            && self.download.is_none()
            && self.rewrite.is_none()
    }
}

/// One asset URL rewrite
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RewriteConfig {
    /// Regex matched against the URL
    pub pattern: String,
    /// Replacement, `$1` style groups allowed
    pub replacement: String,
}

/// Asset repository configuration
#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Git URL, optionally suffixed with "@branch"; "." uses the remote of the current repo
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Reference github assets through the jsdelivr CDN (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn: Option<bool>,
}

impl RepoConfig {
    fn is_empty(&self) -> bool {
        self.url.is_none() && self.cdn.is_none()
    }
}

impl Config {
    /// Load configuration from a specific file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Try to load configuration from a directory (looks for `_md2zhihu.toml`)
    ///
    /// Returns `Ok(None)` if the config file doesn't exist.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Generate JSON schema for the configuration
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }

    /// Generate JSON schema as a string
    pub fn json_schema_string() -> Result<String> {
        let schema = Self::json_schema();
        serde_json::to_string_pretty(&schema).context("Failed to serialize JSON schema")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.output.is_empty());
        assert!(config.render.is_empty());
        assert!(config.repo.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            [output]
            output_dir = "built"
            md_output = "built/posts/"
            asset_output_dir = "built/assets"
            keep_meta = true
            jekyll = false

            [render]
            platform = "wechat"
            rules = ["image:local_to_remote", "block_code/mermaid:to_jpg"]
            code_width = 600
            embed = ['[.]md$', '[.]markdown$']
            refs = ["refs.yml"]
            download = true
            rewrite = [{ pattern = "^/asset/", replacement = "/resource/" }]

            [repo]
            url = "git@github.com:foo/bar.git@assets"
            cdn = false
            "#,
        )
        .unwrap();

        assert_eq!(config.output.output_dir, Some(PathBuf::from("built")));
        assert_eq!(config.output.md_output.as_deref(), Some("built/posts/"));
        assert_eq!(config.output.keep_meta, Some(true));
        assert_eq!(config.render.platform.as_deref(), Some("wechat"));
        assert_eq!(config.render.rules.as_ref().map(Vec::len), Some(2));
        assert_eq!(config.render.code_width, Some(600));
        assert_eq!(config.render.refs, Some(vec![PathBuf::from("refs.yml")]));
        assert_eq!(
            config.render.rewrite,
            Some(vec![RewriteConfig {
                pattern: "^/asset/".to_string(),
                replacement: "/resource/".to_string(),
            }])
        );
        assert_eq!(
            config.repo.url.as_deref(),
            Some("git@github.com:foo/bar.git@assets")
        );
        assert_eq!(config.repo.cdn, Some(false));
    }

    #[test]
    fn test_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [render]
            platform = "github"
            "#,
        )
        .unwrap();

        assert_eq!(config.render.platform.as_deref(), Some("github"));
        assert!(config.output.is_empty());
        assert!(config.repo.url.is_none());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result: Result<Config, _> = toml::from_str("[render]\nplatfrom = \"zhihu\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[output]\noutput_dir = \"out\"\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.output.output_dir, Some(PathBuf::from("out")));

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[output\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_serialize_skips_empty_sections() {
        let config = Config {
            repo: RepoConfig {
                url: Some(".".to_string()),
                cdn: None,
            },
            ..Config::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        insta::assert_snapshot!(text, @r#"
        [repo]
        url = "."
        "#);
    }

    #[test]
    fn test_json_schema_generation() {
        let schema = Config::json_schema_string().unwrap();
        assert!(schema.contains("\"title\""));
        assert!(schema.contains("RenderConfig"));
        assert!(schema.contains("RewriteConfig"));
    }
}
