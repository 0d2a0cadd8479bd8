//! Markdown to HTML rendering and the fixed page shell.
//!
//! Rendering is driven by an explicit [`MarkdownOptions`] value. The fragment
//! produced by pulldown-cmark is inserted verbatim into [`PAGE_TEMPLATE`]; no
//! sanitization happens, the input is trusted.

use crate::{Error, Result};
use pulldown_cmark::{html, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd};
use regex::{Captures, Regex};
use std::path::PathBuf;
use std::sync::OnceLock;
use url::Url;

/// GitHub-style `markdown-body` stylesheet shipped with the binary
pub const BUNDLED_STYLESHEET: &str = include_str!("../assets/github-markdown.css");

/// File name the bundled stylesheet is written under, next to the HTML
pub const BUNDLED_STYLESHEET_NAME: &str = "github-markdown.css";

const STYLESHEET_TOKEN: &str = "{{STYLESHEET}}";
const TITLE_TOKEN: &str = "{{TITLE}}";
const CONTENT_TOKEN: &str = "{{CONTENT}}";

/// HTML5 boilerplate wrapping the rendered fragment
pub const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta http-equiv="X-UA-Compatible" content="ie=edge">
    <title>{{TITLE}}</title>
    {{STYLESHEET}}
</head>
<body>
    <main class="markdown-body">
{{CONTENT}}
    </main>
</body>
</html>
"#;

/// Which stylesheet the page links to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Stylesheet {
    /// The bundled GitHub-style sheet, stored next to the temp HTML
    #[default]
    Bundled,
    /// An absolute path to a local stylesheet
    File(PathBuf),
    /// A stylesheet served over HTTP(S), optionally pinned with an SRI hash
    Remote { url: Url, integrity: Option<String> },
}

impl Stylesheet {
    /// Resolve a local stylesheet to its canonical absolute path.
    pub fn file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let resolved = std::fs::canonicalize(&path).map_err(|e| Error::file(&path, e))?;
        Ok(Stylesheet::File(resolved))
    }

    /// Build from a CLI value: `http...` is a URL, anything else a path.
    pub fn from_location(location: &str, integrity: Option<String>) -> Result<Self> {
        if location.starts_with("http") {
            let url = Url::parse(location)
                .map_err(|e| Error::ConfigError(format!("Invalid stylesheet url {}: {}", location, e)))?;
            Ok(Stylesheet::Remote { url, integrity })
        } else {
            if integrity.is_some() {
                return Err(Error::ConfigError(
                    "An integrity hash only applies to remote stylesheets".into(),
                ));
            }
            Self::file(location)
        }
    }

    fn href(&self) -> String {
        match self {
            Stylesheet::Bundled => BUNDLED_STYLESHEET_NAME.to_string(),
            Stylesheet::File(path) => Url::from_file_path(path)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| path.display().to_string()),
            Stylesheet::Remote { url, .. } => url.to_string(),
        }
    }

    /// The `<link>` element for this stylesheet
    pub fn link_tag(&self) -> String {
        let href = escape_attr(&self.href());
        match self {
            Stylesheet::Remote { integrity: Some(hash), .. } => format!(
                r#"<link rel="stylesheet" href="{}" integrity="{}" crossorigin="anonymous" />"#,
                href,
                escape_attr(hash)
            ),
            _ => format!(r#"<link rel="stylesheet" href="{}" />"#, href),
        }
    }
}

/// Markdown rendering configuration
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// GitHub-flavored extensions: tables, strikethrough, task lists
    pub gfm: bool,
    /// Render single newlines inside paragraphs as `<br />`
    pub hard_breaks: bool,
    /// Turn bare `http(s)://` URLs, `www.` hosts and email addresses into links
    pub autolink: bool,
    /// Document `<title>`
    pub title: String,
    pub stylesheet: Stylesheet,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            hard_breaks: true,
            autolink: true,
            title: "Document".to_string(),
            stylesheet: Stylesheet::Bundled,
        }
    }
}

/// A complete HTML page ready to be loaded by the browser
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub html: String,
    pub stylesheet: Stylesheet,
}

impl RenderedDocument {
    /// Whether the bundled stylesheet must be written next to the page
    pub fn needs_bundled_stylesheet(&self) -> bool {
        self.stylesheet == Stylesheet::Bundled
    }
}

/// Converts Markdown text into HTML
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    options: MarkdownOptions,
}

impl MarkdownRenderer {
    pub fn new(options: MarkdownOptions) -> Self {
        Self { options }
    }

    fn parser_options(&self) -> Options {
        if self.options.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }

    /// Render Markdown to an HTML fragment.
    pub fn render_fragment(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.parser_options());
        let hard_breaks = self.options.hard_breaks;
        let events = parser.map(|event| match event {
            Event::SoftBreak if hard_breaks => Event::HardBreak,
            other => other,
        });

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        if self.options.autolink {
            html::push_html(&mut out, autolink(events).into_iter());
        } else {
            html::push_html(&mut out, events);
        }
        out
    }

    /// Render Markdown into the full page shell.
    pub fn render_document(&self, markdown: &str) -> RenderedDocument {
        let fragment = self.render_fragment(markdown);
        let html = PAGE_TEMPLATE
            .replacen(TITLE_TOKEN, &escape_text(&self.options.title), 1)
            .replacen(STYLESHEET_TOKEN, &self.options.stylesheet.link_tag(), 1)
            // content goes in last so fragment text is never scanned for tokens
            .replacen(CONTENT_TOKEN, &fragment, 1);

        RenderedDocument {
            html,
            stylesheet: self.options.stylesheet.clone(),
        }
    }
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)(?P<url>\b(?:https?://|www\.)[^\s<>]+)|(?P<email>[a-z0-9._+-]+@[a-z0-9_-]+(?:\.[a-z0-9_-]+)+)",
        )
        .expect("autolink pattern is valid")
    })
}

/// Wrap bare URLs found in text in link events.
///
/// Adjacent text events are merged first since the parser may split a URL at
/// characters such as `_`. Text inside code blocks, links, images and raw
/// `<a>` elements is left untouched.
fn autolink<'a>(events: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut out = Vec::new();
    let mut pending = String::new();
    let mut opaque_depth = 0usize;

    for event in events {
        match event {
            Event::Text(text) if opaque_depth == 0 => {
                pending.push_str(&text);
                continue;
            }
            _ => {}
        }

        flush_text(&mut pending, &mut out);
        match &event {
            Event::Start(Tag::CodeBlock(_) | Tag::Link { .. } | Tag::Image { .. }) => opaque_depth += 1,
            Event::End(TagEnd::CodeBlock | TagEnd::Link | TagEnd::Image) => {
                opaque_depth = opaque_depth.saturating_sub(1)
            }
            Event::InlineHtml(html) => match anchor_tag(html) {
                Some(true) => opaque_depth += 1,
                Some(false) => opaque_depth = opaque_depth.saturating_sub(1),
                None => {}
            },
            _ => {}
        }
        out.push(event);
    }
    flush_text(&mut pending, &mut out);
    out
}

fn flush_text<'a>(pending: &mut String, out: &mut Vec<Event<'a>>) {
    if pending.is_empty() {
        return;
    }
    let text = std::mem::take(pending);
    let mut last = 0;

    for caps in url_pattern().captures_iter(&text) {
        let Some((start, candidate, dest, link_type)) = link_target(&caps) else {
            continue;
        };
        let end = start + candidate.len();
        if start > last {
            out.push(Event::Text(CowStr::from(text[last..start].to_string())));
        }

        out.push(Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::from(dest),
            title: CowStr::from(""),
            id: CowStr::from(""),
        }));
        out.push(Event::Text(CowStr::from(candidate.to_string())));
        out.push(Event::End(TagEnd::Link));
        last = end;
    }

    if last < text.len() {
        out.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}

/// Start offset, link text, destination and kind of an autolink match.
fn link_target<'t>(caps: &Captures<'t>) -> Option<(usize, &'t str, String, LinkType)> {
    if let Some(m) = caps.name("email") {
        let email = m.as_str();
        if email.ends_with(['-', '_']) {
            return None;
        }
        // the html writer adds the `mailto:` prefix for email links
        return Some((m.start(), email, email.to_string(), LinkType::Email));
    }

    let m = caps.name("url")?;
    let candidate = trim_url(m.as_str());
    let is_www = candidate
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("www."));
    let dest = if is_www {
        if candidate.len() <= 4 {
            return None;
        }
        format!("http://{}", candidate)
    } else {
        Url::parse(candidate).ok()?.host_str().filter(|h| !h.is_empty())?;
        candidate.to_string()
    };
    Some((m.start(), candidate, dest, LinkType::Autolink))
}

/// `Some(true)` for an opening `<a ...>` tag, `Some(false)` for `</a>`.
fn anchor_tag(html: &str) -> Option<bool> {
    let lower = html.trim_start().to_ascii_lowercase();
    let (rest, open) = match lower.strip_prefix("</a") {
        Some(rest) => (rest, false),
        None => (lower.strip_prefix("<a")?, true),
    };
    match rest.chars().next() {
        Some(c) if c == '>' || c.is_ascii_whitespace() => Some(open),
        _ => None,
    }
}

/// Drop trailing punctuation and unbalanced closing parens from a URL match.
fn trim_url(candidate: &str) -> &str {
    let mut s = candidate;
    loop {
        let Some(c) = s.chars().last() else { break };
        let strip = match c {
            '.' | ',' | ':' | ';' | '!' | '?' | '"' | '\'' | '*' | '_' | '~' => true,
            ')' => s.matches(')').count() > s.matches('(').count(),
            _ => false,
        };
        if !strip {
            break;
        }
        s = &s[..s.len() - c.len_utf8()];
    }
    s
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
