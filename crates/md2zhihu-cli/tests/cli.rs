//! Integration tests for the md2zhihu binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn md2zhihu(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_md2zhihu"))
        .current_dir(cwd)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("MD2ZHIHU_CONVERTER")
        .output()
        .expect("Failed to run md2zhihu")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "md2zhihu failed with status {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_transparent_conversion() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("doc.md"), "# Title\n\nSome $$x^2$$ text.\n").unwrap();

    let output = md2zhihu(dir.path(), &["doc.md", "-p", "transparent"]);
    assert_success(&output);

    let converted = fs::read_to_string(dir.path().join("_md2/doc.md")).unwrap();
    insta::assert_snapshot!(converted, @r"
    # Title

    Some $$ x^2 $$ text.
    ");
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "_md2/doc.md");
}

#[test]
fn test_zhihu_math_and_refs() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("doc.md"),
        "Euler: $e^{i\\pi}$, see [wiki][].\n\n[wiki]: https://wikipedia.org \"Wikipedia\"\n",
    )
    .unwrap();

    let output = md2zhihu(dir.path(), &["doc.md", "-o", "out.md"]);
    assert_success(&output);

    let converted = fs::read_to_string(dir.path().join("out.md")).unwrap();
    insta::assert_snapshot!(converted, @r#"
    Euler: <img src="https://www.zhihu.com/equation?tex=e%5E%7Bi%5Cpi%7D" alt="e^{i\pi}" class="ee_img tr_noresize" eeimg="1">, see [wiki](https://wikipedia.org).


    Reference:

    - Wikipedia : [https://wikipedia.org](https://wikipedia.org)

    [wiki]: https://wikipedia.org "Wikipedia"
    "#);
}

#[test]
fn test_local_image_is_copied() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("pic.png"), b"png").unwrap();
    fs::write(dir.path().join("2021-03-04-post.md"), "![a pic](pic.png)\n").unwrap();

    let output = md2zhihu(dir.path(), &["2021-03-04-post.md", "-d", "built"]);
    assert_success(&output);

    let converted = fs::read_to_string(dir.path().join("built/post.md")).unwrap();
    let assets: Vec<_> = fs::read_dir(dir.path().join("built/post"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();

    assert_eq!(assets.len(), 1);
    assert!(assets[0].ends_with("-pic.png"));
    assert_eq!(converted, format!("![a pic](post/{})\n", assets[0]));
}

#[test]
fn test_jekyll_keeps_name_and_meta() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("2021-03-04-post.md"),
        "---\ntitle: hello\n---\nbody\n",
    )
    .unwrap();

    let output = md2zhihu(dir.path(), &["2021-03-04-post.md", "--jekyll", "-p", "github"]);
    assert_success(&output);

    let converted = fs::read_to_string(dir.path().join("_md2/2021-03-04-post.md")).unwrap();
    assert_eq!(converted, "---\ntitle: hello\n---\n\nbody\n");
}

#[test]
fn test_missing_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("doc.md"), "text\n").unwrap();

    let output = md2zhihu(dir.path(), &["missing.md", "doc.md", "-p", "transparent"]);
    assert_success(&output);

    assert!(dir.path().join("_md2/doc.md").exists());
    assert!(!dir.path().join("_md2/missing.md").exists());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.md"));
}

#[test]
fn test_config_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("_md2zhihu.toml"),
        "[output]\noutput_dir = \"site\"\n\n[render]\nplatform = \"github\"\n",
    )
    .unwrap();
    fs::write(dir.path().join("doc.md"), "- a $x$\n- b\n").unwrap();

    let output = md2zhihu(dir.path(), &["doc.md"]);
    assert_success(&output);

    let converted = fs::read_to_string(dir.path().join("site/doc.md")).unwrap();
    assert_eq!(converted, "-   a $x$\n-   b\n");
}

#[test]
fn test_render_error_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("doc.md"), "![x](nope.png)\n").unwrap();

    let output = md2zhihu(dir.path(), &["doc.md"]);
    assert!(!output.status.success());
    assert!(!dir.path().join("_md2/doc.md").exists());
}

#[test]
fn test_invalid_platform() {
    let dir = tempfile::tempdir().unwrap();
    let output = md2zhihu(dir.path(), &["doc.md", "-p", "myspace"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("myspace"));
}

#[test]
fn test_print_schema() {
    let dir = tempfile::tempdir().unwrap();
    let output = md2zhihu(dir.path(), &["--print-schema"]);
    assert_success(&output);

    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(schema["title"], "Config");
    assert!(schema["properties"]["render"].is_object());
}
