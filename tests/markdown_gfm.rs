//! Structure of the HTML produced for GitHub-flavored Markdown

use mdpdf::{MarkdownOptions, MarkdownRenderer};
use scraper::{Html, Selector};

const SAMPLE: &str = r#"# Release notes

First line of a paragraph
second line of the same paragraph

| Feature | Status |
|---------|--------|
| Tables  | done   |
| ~~Old~~ | gone   |

```rust
fn main() {
    println!("https://example.com inside code");
}
```

- [x] ship it
- [ ] tell everyone at https://example.com/news
"#;

fn count(html: &Html, selector: &str) -> usize {
    let sel = Selector::parse(selector).unwrap();
    html.select(&sel).count()
}

#[test]
fn fragment_has_table_code_and_line_break() {
    let fragment = MarkdownRenderer::default().render_fragment(SAMPLE);
    let html = Html::parse_fragment(&fragment);

    assert_eq!(count(&html, "table"), 1);
    assert_eq!(count(&html, "tbody tr"), 2);
    assert_eq!(count(&html, "pre > code.language-rust"), 1);
    assert_eq!(count(&html, "p > br"), 1);
    assert_eq!(count(&html, "del"), 1);
    assert_eq!(count(&html, "input[type=checkbox]"), 2);
}

#[test]
fn only_prose_urls_are_autolinked() {
    let fragment = MarkdownRenderer::default().render_fragment(SAMPLE);
    let html = Html::parse_fragment(&fragment);

    let links = Selector::parse("a").unwrap();
    let hrefs: Vec<_> = html
        .select(&links)
        .filter_map(|a| a.value().attr("href"))
        .collect();
    assert_eq!(hrefs, vec!["https://example.com/news"]);
}

#[test]
fn plain_commonmark_mode() {
    let renderer = MarkdownRenderer::new(MarkdownOptions {
        gfm: false,
        hard_breaks: false,
        autolink: false,
        ..Default::default()
    });
    let html = Html::parse_fragment(&renderer.render_fragment(SAMPLE));

    assert_eq!(count(&html, "table"), 0);
    assert_eq!(count(&html, "br"), 0);
    assert_eq!(count(&html, "a"), 0);
    // fenced code is CommonMark, not an extension
    assert_eq!(count(&html, "pre > code"), 1);
}

#[test]
fn document_shell_wraps_content() {
    let doc = MarkdownRenderer::default().render_document(SAMPLE);
    let html = Html::parse_document(&doc.html);

    assert_eq!(count(&html, "head > meta[charset]"), 1);
    assert_eq!(count(&html, r#"head > link[rel="stylesheet"]"#), 1);
    assert_eq!(count(&html, "body > main.markdown-body > h1"), 1);
    assert_eq!(count(&html, "main.markdown-body table"), 1);
}

#[test]
fn raw_anchor_text_is_not_relinked() {
    let fragment = MarkdownRenderer::default()
        .render_fragment("See <a href=\"https://example.com\">https://example.com</a> or mail docs@example.com");
    let html = Html::parse_fragment(&fragment);

    assert_eq!(count(&html, "a a"), 0);
    let hrefs: Vec<_> = html
        .select(&Selector::parse("a").unwrap())
        .filter_map(|a| a.value().attr("href"))
        .collect();
    assert_eq!(hrefs, vec!["https://example.com", "mailto:docs@example.com"]);
}
