//! Lexical path helpers
//!
//! Paths here are never touched on disk: relative paths are resolved against
//! the current directory and `.` / `..` are folded textually.

use std::path::{Component, Path, PathBuf};

/// Make `path` absolute against the current directory and fold `.` and `..`
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };
    normalize(&joined)
}

/// Fold `.` and `..` components without consulting the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Relative path from `start` to `path`; `.` when they are the same
pub fn relpath(path: &Path, start: &Path) -> PathBuf {
    let path = absolutize(path);
    let start = absolutize(start);
    match pathdiff::diff_paths(&path, &start) {
        Some(p) if p.as_os_str().is_empty() => PathBuf::from("."),
        Some(p) => p,
        None => path,
    }
}

/// Directory part of `path`, `.` for a bare file name
pub fn dirname(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Render a path with `/` separators, for use inside URLs
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join two URL path fragments with a single `/`; an empty head yields `tail`
pub fn url_join(head: &str, tail: &str) -> String {
    if head.is_empty() || head == "." {
        tail.to_string()
    } else if head.ends_with('/') {
        format!("{head}{tail}")
    } else {
        format!("{head}/{tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize(Path::new("../a")), PathBuf::from("../a"));
    }

    #[test]
    fn test_relpath() {
        assert_eq!(relpath(Path::new("a/b/c"), Path::new("a/b")), PathBuf::from("c"));
        assert_eq!(relpath(Path::new("a"), Path::new("a/b")), PathBuf::from(".."));
        assert_eq!(relpath(Path::new("a/b/"), Path::new("a/b")), PathBuf::from("."));
        assert_eq!(relpath(Path::new("u"), Path::new("a/b")), PathBuf::from("../../u"));
    }

    #[test]
    fn test_dirname() {
        assert_eq!(dirname(Path::new("x.md")), PathBuf::from("."));
        assert_eq!(dirname(Path::new("a/b/x.md")), PathBuf::from("a/b"));
    }

    #[test]
    fn test_url_join() {
        assert_eq!(url_join("", "{path}"), "{path}");
        assert_eq!(url_join(".", "{path}"), "{path}");
        assert_eq!(url_join("../a", "{path}"), "../a/{path}");
        assert_eq!(url_join("https://x/", "y"), "https://x/y");
    }
}
