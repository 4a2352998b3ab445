//! End-to-end conversion tests: source text in, platform Markdown and
//! asset files out

use md2zhihu_core::converter::{ConvertOptions, Converted, SourceKind, TargetFormat};
use md2zhihu_core::render::asset::{asset_fn, md5_hex};
use md2zhihu_core::{
    Article, BuiltinConverter, ConfigOptions, Converter, ParserConfig, Platform, RenderConfig,
    Result,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Answers every conversion with a placeholder and records the kinds
#[derive(Default)]
struct FakeConverter {
    kinds: Mutex<Vec<SourceKind>>,
}

impl Converter for FakeConverter {
    fn convert(
        &self,
        kind: SourceKind,
        _source: &str,
        target: TargetFormat,
        _opts: &ConvertOptions,
    ) -> Result<Converted> {
        self.kinds.lock().unwrap().push(kind);
        Ok(match target {
            TargetFormat::Jpg => Converted::Bytes(b"jpg".to_vec()),
            _ => Converted::Text(format!("<{kind}>")),
        })
    }
}

fn options(dir: &Path, platform: Platform) -> ConfigOptions {
    ConfigOptions {
        src_path: dir.join("doc.md"),
        platform,
        output_dir: dir.join("out"),
        asset_output_dir: dir.join("out"),
        md_output: format!("{}/", dir.join("out").display()),
        ..ConfigOptions::default()
    }
}

fn convert(opts: ConfigOptions, text: &str, converter: &dyn Converter) -> Vec<String> {
    let conf = RenderConfig::new(opts).unwrap();
    let parser_conf = ParserConfig::new(true, &[r"[.]md$"]).unwrap();
    Article::new(&parser_conf, conf, text)
        .unwrap()
        .render(converter)
        .unwrap()
}

#[test]
fn test_transparent_keeps_markdown() {
    let dir = tempfile::tempdir().unwrap();
    let lines = convert(
        options(dir.path(), Platform::Transparent),
        "# Title\n\nSome $$ x^2 $$ text.\n",
        &BuiltinConverter::default(),
    );
    assert_eq!(lines, vec!["# Title", "", "Some $$ x^2 $$ text.", ""]);
}

#[test]
fn test_github_list_with_math() {
    let dir = tempfile::tempdir().unwrap();
    let lines = convert(
        options(dir.path(), Platform::Github),
        "- a $x$\n- b\n",
        &BuiltinConverter::default(),
    );
    assert_eq!(lines, vec!["-   a $x$", "-   b", ""]);
}

#[test]
fn test_zhihu_document() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("img")).unwrap();
    std::fs::write(dir.path().join("img/p.png"), b"png").unwrap();

    let converter = FakeConverter::default();
    let lines = convert(
        options(dir.path(), Platform::Zhihu),
        "# T\n\nInline $a$ math.\n\n$$\nx\n\ny\n$$\n\n![pic](img/p.png)\n\n```mermaid\ngraph LR\n```\n",
        &converter,
    );

    let image = format!("{}-p.png", &md5_hex(b"png")[..16]);
    let diagram = asset_fn("graph LR\n", "jpg");

    assert_eq!(
        lines,
        vec![
            "# T".to_string(),
            String::new(),
            "Inline <tex_inline> math.".to_string(),
            String::new(),
            "<tex_block>".to_string(),
            String::new(),
            format!("![pic](doc/{image})"),
            String::new(),
            format!("![](doc/{diagram})"),
            String::new(),
        ]
    );

    let asset_dir = dir.path().join("out/doc");
    assert_eq!(std::fs::read(asset_dir.join(&image)).unwrap(), b"png");
    assert_eq!(std::fs::read(asset_dir.join(&diagram)).unwrap(), b"jpg");
    assert_eq!(
        *converter.kinds.lock().unwrap(),
        vec![SourceKind::TexInline, SourceKind::TexBlock, SourceKind::Mermaid]
    );
}

#[test]
fn test_missing_image_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let conf = RenderConfig::new(options(dir.path(), Platform::Zhihu)).unwrap();
    let parser_conf = ParserConfig::new::<&str>(true, &[]).unwrap();
    let article = Article::new(&parser_conf, conf, "![x](nope.png)\n").unwrap();

    let err = article.render(&FakeConverter::default()).unwrap_err();
    assert!(matches!(err, md2zhihu_core::Error::Io { .. }));
}

#[test]
fn test_reference_files_per_platform() {
    let dir = tempfile::tempdir().unwrap();
    let refs: PathBuf = dir.path().join("refs.yml");
    std::fs::write(
        &refs,
        "universal:\n  - a: https://a\n  - b: https://b\nzhihu:\n  - b: https://zhihu-b\n",
    )
    .unwrap();

    let text = "[a] and [b]\n";
    let render = |platform| {
        let opts = ConfigOptions {
            ref_files: vec![refs.clone()],
            ..options(dir.path(), platform)
        };
        convert(opts, text, &FakeConverter::default())
    };

    let zhihu = render(Platform::Zhihu);
    assert_eq!(zhihu[0], "[a](https://a) and [b](https://zhihu-b)");
    assert_eq!(zhihu.last().unwrap(), "[b]: https://zhihu-b");

    let github = render(Platform::Github);
    assert_eq!(github[0], "[a](https://a) and [b](https://b)");
}

#[test]
fn test_embedded_document_assets() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("part/img")).unwrap();
    std::fs::write(dir.path().join("part/img/q.png"), b"q").unwrap();
    std::fs::write(dir.path().join("part/p.md"), "![q](img/q.png)\n").unwrap();

    let lines = convert(
        options(dir.path(), Platform::Zhihu),
        "intro\n\n![](part/p.md)\n",
        &FakeConverter::default(),
    );

    let image = format!("{}-q.png", &md5_hex(b"q")[..16]);
    assert_eq!(
        lines,
        vec![
            "intro".to_string(),
            String::new(),
            format!("![q](doc/{image})"),
            String::new(),
        ]
    );
}

#[test]
fn test_normalized_ast_dump() {
    let dir = tempfile::tempdir().unwrap();
    let conf = RenderConfig::new(options(dir.path(), Platform::Transparent)).unwrap();
    let parser_conf = ParserConfig::new::<&str>(true, &[]).unwrap();
    let article = Article::new(&parser_conf, conf, "$$\nx\n\ny\n$$\n").unwrap();

    let json = serde_json::to_value(&article.ast).unwrap();
    assert_eq!(json["type"], "document");
    assert_eq!(json["children"].as_array().map(Vec::len), Some(1));

    let para = &json["children"][0];
    assert_eq!(para["type"], "paragraph");
    assert_eq!(
        para["children"][1],
        serde_json::json!({"type": "math_block", "text": "\nx\n\ny\n"})
    );
}
