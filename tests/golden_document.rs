use std::fs;
use std::path::PathBuf;

use mdpdf::MarkdownRenderer;
use sha2::{Digest, Sha256};

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("tests/goldens/expected");
    p.push(name);
    p
}

#[test]
fn rendered_document_is_deterministic() {
    let md = fs::read_to_string("tests/goldens/documents/sample.md").expect("read fixture");
    let renderer = MarkdownRenderer::default();

    let first = renderer.render_document(&md);
    let second = renderer.render_document(&md);
    assert_eq!(first.html, second.html);
}

#[test]
fn golden_document_matches_fixture() {
    let md = fs::read_to_string("tests/goldens/documents/sample.md").expect("read fixture");
    let doc = MarkdownRenderer::default().render_document(&md);
    let digest = hex::encode(Sha256::digest(doc.html.as_bytes()));

    let expected_path = golden_path("sample.sha256");
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all("tests/goldens/expected").ok();
        fs::write(&expected_path, &digest).expect("write golden");
        println!("Updated golden: {:?}", expected_path);
        return;
    }

    let expected = fs::read_to_string(&expected_path)
        .unwrap_or_else(|e| panic!("missing golden {:?} ({}); run with UPDATE_GOLDENS=1", expected_path, e));
    assert_eq!(digest, expected.trim(), "rendered document changed; rerun with UPDATE_GOLDENS=1 if intended");
}
