//! Where generated assets are published
//!
//! [`LocalRepo`] references assets by a path relative to the output
//! Markdown. [`AssetRepo`] references them through the raw-content URL of a
//! git branch that the output directory is pushed to.

use regex::Regex;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::paths::{dirname, relpath, to_slash, url_join};
use crate::render::asset::md5_hex;

/// Branches the asset push never overwrites
pub const PROTECTED_BRANCHES: [&str; 2] = ["main", "master"];

static SCP_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^git@([^:/@]+):([^/@]+)/([^/@]+?)(?:\.git)?(@.+)?$").expect("scp url regex")
});

static SSH_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ssh://git@([^/@]+)/([^/@]+)/([^/@]+?)(?:\.git)?(@.+)?$").expect("ssh url regex")
});

static HTTPS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://(?:([^:@/]+):([^@/]+)@)?([^/@]+)/([^/@]+)/([^/@]+?)(?:\.git)?(@.+)?$")
        .expect("https url regex")
});

static UNSAFE_BRANCH_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_\-=]+").expect("branch sanitizing regex"));

/// Assets referenced relative to the output Markdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRepo {
    pub path_pattern: String,
}

impl LocalRepo {
    pub fn new(md_path: &Path, asset_dir: &Path) -> Self {
        let rel = relpath(asset_dir, &dirname(md_path));
        let rel = to_slash(&rel);
        let rel = if rel == "." { "" } else { rel.as_str() };
        Self {
            path_pattern: url_join(rel, "{path}"),
        }
    }
}

/// A git repository branch hosting the assets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRepo {
    /// Push URL
    pub url: String,
    pub host: String,
    pub user: String,
    pub repo: String,
    pub branch: String,
    pub cdn: bool,
    pub path_pattern: String,
}

/// Fields of a parsed git URL
struct GitUrl<'a> {
    host: &'a str,
    user: &'a str,
    repo: &'a str,
    /// Including the leading `@`
    branch: Option<&'a str>,
    credentials: Option<(&'a str, &'a str)>,
}

impl<'a> GitUrl<'a> {
    fn parse(url: &'a str) -> Option<Self> {
        if let Some(caps) = SCP_URL.captures(url).or_else(|| SSH_URL.captures(url)) {
            return Some(Self {
                host: caps.get(1)?.as_str(),
                user: caps.get(2)?.as_str(),
                repo: caps.get(3)?.as_str(),
                branch: caps.get(4).map(|m| m.as_str()),
                credentials: None,
            });
        }

        let caps = HTTPS_URL.captures(url)?;
        Some(Self {
            host: caps.get(3)?.as_str(),
            user: caps.get(4)?.as_str(),
            repo: caps.get(5)?.as_str(),
            branch: caps.get(6).map(|m| m.as_str()),
            credentials: caps.get(1).zip(caps.get(2)).map(|(c, t)| (c.as_str(), t.as_str())),
        })
    }

    fn push_url(&self) -> String {
        match self.credentials {
            Some((committer, token)) => format!(
                "https://{committer}:{token}@{}/{}/{}.git",
                self.host, self.user, self.repo
            ),
            None => format!("git@{}:{}/{}.git", self.host, self.user, self.repo),
        }
    }
}

impl AssetRepo {
    /// Resolve `url` (or a remote shortcut) in the current directory
    ///
    /// Besides git URLs, `.` names the remote of the current branch and any
    /// other word names a remote of the current repository; either may be
    /// followed by `@branch`.
    pub fn new(url: &str, cdn: bool) -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|e| Error::io(".", e))?;
        let url = resolve_shortcut(url, &cwd)?;
        Self::parse(&url, cdn, &cwd)
    }

    /// Parse a git URL; the default branch name derives from `cwd`
    pub fn parse(url: &str, cdn: bool, cwd: &Path) -> Result<Self> {
        let git_url = GitUrl::parse(url).ok_or_else(|| Error::InvalidRepoUrl(url.to_string()))?;

        let branch = match git_url.branch {
            Some(b) => b.trim_start_matches('@').to_string(),
            None => default_branch(cwd),
        };

        let (user, repo) = (git_url.user, git_url.repo);
        let path_pattern = match git_url.host {
            "github.com" if cdn => {
                format!("https://cdn.jsdelivr.net/gh/{user}/{repo}@{branch}/{{path}}")
            }
            "github.com" => {
                format!("https://raw.githubusercontent.com/{user}/{repo}/{branch}/{{path}}")
            }
            "gitee.com" => format!("https://gitee.com/{user}/{repo}/raw/{branch}/{{path}}"),
            other => return Err(Error::UnsupportedHost(other.to_string())),
        };

        Ok(Self {
            url: git_url.push_url(),
            host: git_url.host.to_string(),
            user: user.to_string(),
            repo: repo.to_string(),
            branch,
            cdn,
            path_pattern,
        })
    }

    /// Commit everything under `dir` and force push it to the asset branch
    ///
    /// A `.git` created here is removed afterwards.
    pub fn push(&self, dir: &Path, message: &str) -> Result<()> {
        if PROTECTED_BRANCHES.contains(&self.branch.as_str()) {
            return Err(Error::Git(format!(
                "refusing to force push to protected branch {:?}; choose another branch",
                self.branch
            )));
        }

        let git_dir = dir.join(".git");
        let had_git = git_dir.exists();

        let result = (|| -> Result<()> {
            git(dir, &["init"])?;
            git(dir, &["add", "."])?;
            git(
                dir,
                &[
                    "-c",
                    "user.name=md2zhihu",
                    "-c",
                    "user.email=md2zhihu@users.noreply.github.com",
                    "commit",
                    "--allow-empty",
                    "-m",
                    message,
                ],
            )?;
            let refspec = format!("HEAD:refs/heads/{}", self.branch);
            git(dir, &["push", "-f", &self.url, &refspec])?;
            Ok(())
        })();

        if !had_git && git_dir.exists() {
            tracing::info!(path = %git_dir.display(), "removing temporary git dir");
            std::fs::remove_dir_all(&git_dir).map_err(|e| Error::io(&git_dir, e))?;
        }

        result
    }
}

/// `_md2zhihu_<last cwd segment>_<md5(cwd)[:8]>`, restricted to branch-safe
/// characters
pub fn default_branch(cwd: &Path) -> String {
    let full = cwd.to_string_lossy();
    let tail = cwd
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let hash = md5_hex(full.as_bytes());
    let branch = format!("_md2zhihu_{tail}_{}", &hash[..8]);
    UNSAFE_BRANCH_CHARS.replace_all(&branch, "").into_owned()
}

/// Expand `.`/`<remote>` shortcuts, with optional `@branch`, into a git URL
fn resolve_shortcut(url: &str, cwd: &Path) -> Result<String> {
    let (first, branch) = match url.split_once('@') {
        Some((first, branch)) => (first, Some(branch)),
        None => (url, None),
    };

    let remote_url = if first == "." {
        tracing::info!("using the current git repo to store assets");
        Some(current_remote_url(cwd)?)
    } else if !first.contains([':', '/']) && is_remote(cwd, first) {
        tracing::info!(remote = first, "using git remote to store assets");
        Some(git(cwd, &["remote", "get-url", first])?)
    } else {
        None
    };

    Ok(match remote_url {
        Some(mut resolved) => {
            if let Some(branch) = branch {
                resolved.push('@');
                resolved.push_str(branch);
            }
            tracing::info!(shortcut = url, url = %resolved, "resolved repo shortcut");
            resolved
        }
        None => url.to_string(),
    })
}

fn is_remote(cwd: &Path, name: &str) -> bool {
    git(cwd, &["remote"]).is_ok_and(|out| out.lines().any(|l| l.trim() == name))
}

/// URL of the remote tracked by the current branch, else the first remote
fn current_remote_url(cwd: &Path) -> Result<String> {
    let branch = git(cwd, &["symbolic-ref", "--short", "HEAD"])?;
    let remote = match git(cwd, &["config", &format!("branch.{branch}.remote")]) {
        Ok(remote) if !remote.is_empty() => remote,
        _ => git(cwd, &["remote"])?
            .lines()
            .next()
            .map(str::to_string)
            .ok_or_else(|| Error::Git(format!("no git remote in {}", cwd.display())))?,
    };
    git(cwd, &["remote", "get-url", &remote])
}

/// Run git in `cwd`, returning trimmed stdout
fn git(cwd: &Path, args: &[&str]) -> Result<String> {
    tracing::debug!(cwd = %cwd.display(), ?args, "git");

    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|e| Error::Git(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        return Err(Error::Git(format!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Path pattern source for a render configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocation {
    Local(LocalRepo),
    Remote(AssetRepo),
}

impl AssetLocation {
    pub fn path_pattern(&self) -> &str {
        match self {
            AssetLocation::Local(r) => &r.path_pattern,
            AssetLocation::Remote(r) => &r.path_pattern,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, AssetLocation::Local(_))
    }
}
