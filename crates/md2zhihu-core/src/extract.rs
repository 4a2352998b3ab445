//! Front matter and reference definition extraction
//!
//! Both run on the raw text before parsing. Reference definitions can come
//! from reference files, the front matter, and `[id]: url` lines in the body;
//! merging them in that order lets later sources win.

use regex::Regex;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use crate::error::{Error, Result};

/// Reference id → `"<url> <optional alt>"`
pub type Refs = BTreeMap<String, String>;

static FRONT_MATTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^ *--- *\n(.*?)\n---\n").expect("front matter regex"));

static REF_DEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.*?)\]:(.*?)$").expect("reference definition regex"));

/// The YAML block enclosed in `---` lines at the top of a document
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    pub text: String,
    pub data: Value,
}

impl FrontMatter {
    pub fn parse(text: &str) -> Result<Self> {
        let data = serde_yaml::from_str(text).map_err(Error::FrontMatter)?;
        Ok(Self {
            text: text.to_string(),
            data,
        })
    }

    /// References declared under `refs`, overridden by `platform_refs.<platform>`
    pub fn get_refs(&self, platform: &str) -> Refs {
        let mut refs = Refs::new();
        merge_ref_list(&mut refs, self.data.get("refs"));
        if let Some(by_platform) = self.data.get("platform_refs") {
            merge_ref_list(&mut refs, by_platform.get(platform));
        }
        refs
    }
}

/// Split a leading front matter block off `text`
pub fn extract_front_matter(text: &str) -> Result<(String, Option<FrontMatter>)> {
    let Some(caps) = FRONT_MATTER.captures(text) else {
        return Ok((text.to_string(), None));
    };

    let end = caps.get(0).map_or(0, |m| m.end());
    let meta = caps.get(1).map_or("", |m| m.as_str()).trim();
    let front_matter = FrontMatter::parse(meta)?;

    Ok((text[end..].to_string(), Some(front_matter)))
}

/// Remove `[id]: definition` lines, returning the remaining text and the
/// definitions found
pub fn extract_ref_definitions(text: &str) -> (String, Refs) {
    let mut refs = Refs::new();
    let mut kept = Vec::new();

    for line in text.split('\n') {
        match REF_DEF.captures(line) {
            Some(caps) => {
                let id = caps.get(1).map_or("", |m| m.as_str());
                let def = caps.get(2).map_or("", |m| m.as_str());
                refs.insert(id.to_string(), def.to_string());
            }
            None => kept.push(line),
        }
    }

    (kept.join("\n"), refs)
}

/// Load reference files: each one's `universal` list, then its `<platform>`
/// list, files in order
pub fn load_external_refs(paths: &[PathBuf], platform: &str) -> Result<Refs> {
    let mut refs = Refs::new();
    for path in paths {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let data: Value = serde_yaml::from_str(&content).map_err(|source| Error::RefFile {
            path: path.clone(),
            source,
        })?;

        merge_ref_list(&mut refs, data.get("universal"));
        merge_ref_list(&mut refs, data.get(platform));
        tracing::debug!(path = %path.display(), count = refs.len(), "loaded reference file");
    }
    Ok(refs)
}

/// Merge a YAML list of `{id: definition}` maps into `refs`
fn merge_ref_list(refs: &mut Refs, list: Option<&Value>) {
    let Some(Value::Sequence(items)) = list else {
        return;
    };
    for item in items {
        let Value::Mapping(map) = item else { continue };
        for (k, v) in map {
            if let (Some(k), Some(v)) = (scalar_to_string(k), scalar_to_string(v)) {
                refs.insert(k, v);
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_extract_front_matter() {
        let text = "---\ntitle: x\nrefs:\n  - a: http://a\n---\n# Body\n";
        let (body, fm) = extract_front_matter(text).unwrap();
        let fm = fm.unwrap();

        assert_eq!(body, "# Body\n");
        assert_eq!(fm.text, "title: x\nrefs:\n  - a: http://a");
        assert_eq!(fm.data["title"], Value::String("x".into()));
    }

    #[test]
    fn test_no_front_matter() {
        let (body, fm) = extract_front_matter("# Body\n---\n").unwrap();
        assert_eq!(body, "# Body\n---\n");
        assert!(fm.is_none());
    }

    #[test]
    fn test_malformed_front_matter() {
        let result = extract_front_matter("---\na: [unclosed\n---\nbody");
        assert!(matches!(result, Err(Error::FrontMatter(_))));
    }

    #[test]
    fn test_front_matter_refs() {
        let fm = FrontMatter::parse(
            "refs:\n  - a: http://a\n  - b: http://b\nplatform_refs:\n  zhihu:\n    - b: http://zb\n",
        )
        .unwrap();

        let refs = fm.get_refs("zhihu");
        assert_eq!(refs["a"], "http://a");
        assert_eq!(refs["b"], "http://zb");

        let refs = fm.get_refs("github");
        assert_eq!(refs["b"], "http://b");
    }

    #[test]
    fn test_extract_ref_definitions() {
        let (body, refs) = extract_ref_definitions("a\n[x]: http://x \"X\"\nb\n[y]:http://y");
        assert_eq!(body, "a\nb");
        assert_eq!(refs["x"], " http://x \"X\"");
        assert_eq!(refs["y"], "http://y");
    }

    #[test]
    fn test_load_external_refs() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "universal:\n  - a: http://a\n  - b: http://b\nzhihu:\n  - b: http://zb\n"
        )
        .unwrap();

        let refs = load_external_refs(&[file.path().to_path_buf()], "zhihu").unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs["b"], "http://zb");

        let missing = load_external_refs(&[PathBuf::from("/nonexistent/refs.yml")], "zhihu");
        assert!(matches!(missing, Err(Error::Io { .. })));
    }
}
