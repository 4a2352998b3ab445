//! Asset files: imported images and converter output

use md2zhihu_ast::{Image, Node};
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::default::image_line;
use super::{Lines, RenderNode, Renderer};
use crate::converter::{ConvertOptions, SourceKind, TargetFormat};
use crate::error::{Error, Result};

static UNSAFE_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_\-=]+").expect("asset name regex"));

/// HTML-escape `&`, `<`, `>` and `"`
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Content-addressed file name for an asset generated from `text`
///
/// ```
/// use md2zhihu_core::render::asset::asset_fn;
///
/// let name = asset_fn("graph LR; a-->b", "jpg");
/// assert!(name.starts_with("graphLRa--b-"));
/// assert!(name.ends_with(".jpg"));
/// ```
pub fn asset_fn(text: &str, suffix: &str) -> String {
    let hash = md5_hex(text.as_bytes());
    let escaped = UNSAFE_NAME_CHARS.replace_all(text, "");
    let prefix: String = escaped.chars().take(32).collect();
    format!("{prefix}-{}.{suffix}", &hash[..16])
}

/// Write `data` to `dir/name` through a temporary file in the same directory
pub(crate) fn write_asset(dir: &Path, name: &str, data: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    let target = dir.join(name);

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    tmp.write_all(data).map_err(|e| Error::io(tmp.path(), e))?;
    tmp.persist(&target).map_err(|e| Error::io(&target, e.error))?;

    tracing::info!(path = %target.display(), bytes = data.len(), "wrote asset");
    Ok(target)
}

/// Convert `text` to a jpg asset and reference it as an image paragraph
pub(crate) fn text_to_jpg(
    r: &Renderer<'_>,
    kind: SourceKind,
    text: &str,
    opts: &ConvertOptions,
) -> Result<Lines> {
    let env = r.env()?;
    let data = env
        .converter
        .convert(kind, text, TargetFormat::Jpg, opts)?
        .into_bytes();

    let name = asset_fn(text, "jpg");
    write_asset(&env.conf.asset_output_dir, &name, &data)?;

    Ok(vec![format!("![]({})", env.conf.img_url(&name)), String::new()])
}

/// Copy an image into the asset dir and render it with its public URL
///
/// Remote images are only fetched when download is enabled; otherwise the
/// node is left to the default rule.
pub(crate) fn import_image(r: &Renderer<'_>, rnode: &RenderNode<'_>) -> Result<Option<Lines>> {
    let Node::Image(image) = rnode.node else {
        return Ok(None);
    };
    let env = r.env()?;
    let conf = env.conf;

    let name = if image.src.starts_with("http://") || image.src.starts_with("https://") {
        if !conf.download {
            return Ok(None);
        }
        let base = image
            .src
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .split(['#', '?'])
            .next()
            .unwrap_or_default();
        let name = format!("{}-{base}", &md5_hex(image.src.as_bytes())[..16]);

        if conf.asset_output_dir.join(&name).exists() {
            tracing::debug!(url = %image.src, name = %name, "remote image already downloaded");
        } else {
            let data = download(&image.src)?;
            write_asset(&conf.asset_output_dir, &name, &data)?;
        }
        name
    } else {
        let path = conf.relpath_from_cwd(&image.src);
        let data = std::fs::read(&path).map_err(|e| Error::io(&path, e))?;
        let base = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = format!("{}-{base}", &md5_hex(&data)[..16]);
        write_asset(&conf.asset_output_dir, &name, &data)?;
        name
    };

    let imported = Image {
        src: conf.img_url(&name),
        ..image.clone()
    };
    Ok(Some(vec![image_line(&imported)]))
}

#[cfg(feature = "download")]
fn download(url: &str) -> Result<Vec<u8>> {
    let fail = |reason: String| Error::Download {
        url: url.to_string(),
        reason,
    };

    tracing::info!(url, "downloading image");

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| fail(e.to_string()))?;

    let response = client.get(url).send().map_err(|e| fail(e.to_string()))?;

    if !response.status().is_success() {
        return Err(fail(format!("HTTP {}", response.status())));
    }

    response
        .bytes()
        .map(|b| b.to_vec())
        .map_err(|e| fail(e.to_string()))
}

#[cfg(not(feature = "download"))]
fn download(url: &str) -> Result<Vec<u8>> {
    Err(Error::Download {
        url: url.to_string(),
        reason: "built without the `download` feature".to_string(),
    })
}
