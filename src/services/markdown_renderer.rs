//! Markdown renderer for article content.
//!
//! Converts the restricted markdown dialect produced by the extraction
//! service into HTML. Rendering happens in two stages: every source line is
//! classified and grouped into a block list, then each block is rendered.
//! Inline spans (code, emphasis, links, images) are handled by a single
//! left-to-right scanner, so generated markup is never re-scanned.
//!
//! Rendering never fails. Anything unrecognised comes out as escaped text.
//!
//! Heading extraction for the table of contents is a separate pass over the
//! same source and shares [`slugify`] with the renderer, so TOC anchors and
//! rendered `id`s always agree.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::document::{EscapePolicy, Heading, RenderedDocument};

/// Reading speed used when none is configured.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

/// Nesting limit for links and emphasis inside inline text.
const MAX_INLINE_DEPTH: usize = 32;
/// Longest link label or target, and longest emphasised span, in bytes.
const MAX_INLINE_SCAN: usize = 2048;

static HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(#{1,3})[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$").expect("valid heading regex")
});
static BULLET_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-*+][ \t]+(.*)$").expect("valid bullet item regex"));
static ORDERED_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,9})[.)][ \t]+(.*)$").expect("valid ordered item regex"));
static RULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:-{3,}|\*{3,})$").expect("valid rule regex"));
static PASSTHROUGH_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:</?a(?:\s[^<>]*)?>|<img(?:\s[^<>]*)?/?>)").expect("valid passthrough tag regex")
});
static UNSAFE_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)javascript:|vbscript:|\son[a-z]+\s*=").expect("valid unsafe attribute regex")
});

// ─── Line classification ───

#[derive(Debug, Clone, PartialEq)]
enum Line<'a> {
    Blank,
    Fence(Option<&'a str>),
    Heading(u8, &'a str),
    Rule,
    Quote(&'a str),
    Item { ordered: Option<u32>, text: &'a str },
    Text(&'a str),
}

fn classify(raw: &str) -> Line<'_> {
    let t = raw.trim();
    if t.is_empty() {
        return Line::Blank;
    }
    if let Some(rest) = t.strip_prefix("```") {
        return Line::Fence(fence_language(rest));
    }
    if let Some(caps) = HEADING_RE.captures(t) {
        if let (Some(hashes), Some(text)) = (caps.get(1), caps.get(2)) {
            return Line::Heading(hashes.as_str().len() as u8, text.as_str());
        }
    }
    if RULE_RE.is_match(t) {
        return Line::Rule;
    }
    if let Some(rest) = t.strip_prefix('>') {
        return Line::Quote(rest.strip_prefix(' ').unwrap_or(rest));
    }
    if let Some(caps) = BULLET_ITEM_RE.captures(t) {
        if let Some(text) = caps.get(1) {
            return Line::Item { ordered: None, text: text.as_str() };
        }
    }
    if let Some(caps) = ORDERED_ITEM_RE.captures(t) {
        if let (Some(num), Some(text)) = (caps.get(1), caps.get(2)) {
            let start = num.as_str().parse().unwrap_or(1);
            return Line::Item { ordered: Some(start), text: text.as_str() };
        }
    }
    Line::Text(t)
}

fn fence_language(info: &str) -> Option<&str> {
    let lang = info.split_whitespace().next()?;
    let valid = lang
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#' | '.'));
    if valid {
        Some(lang)
    } else {
        None
    }
}

fn is_fence(raw: &str) -> bool {
    raw.trim_start().starts_with("```")
}

// ─── Block list ───

#[derive(Debug, Clone, PartialEq)]
enum Block<'a> {
    Code { lang: Option<&'a str>, lines: Vec<&'a str> },
    Heading { level: u8, text: &'a str },
    Rule,
    Quote(Vec<&'a str>),
    List { start: Option<u32>, items: Vec<String> },
    Paragraph(Vec<&'a str>),
}

fn parse_blocks(source: &str) -> Vec<Block<'_>> {
    let lines: Vec<&str> = source.lines().collect();
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut i = 0;

    fn flush<'a>(paragraph: &mut Vec<&'a str>, blocks: &mut Vec<Block<'a>>) {
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph(std::mem::take(paragraph)));
        }
    }

    while i < lines.len() {
        match classify(lines[i]) {
            Line::Blank => {
                flush(&mut paragraph, &mut blocks);
                i += 1;
            }
            Line::Fence(lang) => {
                flush(&mut paragraph, &mut blocks);
                i += 1;
                let mut code = Vec::new();
                // An unterminated fence swallows the rest of the document.
                while i < lines.len() && !is_fence(lines[i]) {
                    code.push(lines[i]);
                    i += 1;
                }
                i += 1;
                blocks.push(Block::Code { lang, lines: code });
            }
            Line::Heading(level, text) => {
                flush(&mut paragraph, &mut blocks);
                blocks.push(Block::Heading { level, text });
                i += 1;
            }
            Line::Rule => {
                flush(&mut paragraph, &mut blocks);
                blocks.push(Block::Rule);
                i += 1;
            }
            Line::Quote(_) => {
                flush(&mut paragraph, &mut blocks);
                let mut quoted = Vec::new();
                while let Some(Line::Quote(text)) = lines.get(i).copied().map(classify) {
                    quoted.push(text);
                    i += 1;
                }
                blocks.push(Block::Quote(quoted));
            }
            Line::Item { ordered, .. } => {
                flush(&mut paragraph, &mut blocks);
                let is_ordered = ordered.is_some();
                let mut items: Vec<String> = Vec::new();
                while i < lines.len() {
                    match classify(lines[i]) {
                        Line::Item { ordered: o, text } if o.is_some() == is_ordered => {
                            items.push(text.to_string());
                        }
                        // Indented text right under an item continues it.
                        Line::Text(text)
                            if lines[i].starts_with(|c: char| c.is_whitespace()) =>
                        {
                            if let Some(last) = items.last_mut() {
                                last.push(' ');
                                last.push_str(text);
                            }
                        }
                        _ => break,
                    }
                    i += 1;
                }
                blocks.push(Block::List { start: ordered, items });
            }
            Line::Text(text) => {
                paragraph.push(text);
                i += 1;
            }
        }
    }
    flush(&mut paragraph, &mut blocks);
    blocks
}

// ─── Renderer ───

/// Markdown-to-HTML renderer with a configurable escape policy.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    escape_policy: EscapePolicy,
}

impl MarkdownRenderer {
    pub fn new(escape_policy: EscapePolicy) -> Self {
        Self { escape_policy }
    }

    pub fn escape_policy(&self) -> EscapePolicy {
        self.escape_policy
    }

    /// Renders markdown to an HTML fragment.
    pub fn render(&self, markdown: &str) -> String {
        let blocks = parse_blocks(markdown);
        let mut out = String::with_capacity(markdown.len() + markdown.len() / 4);
        for (n, block) in blocks.iter().enumerate() {
            if n > 0 {
                out.push('\n');
            }
            self.render_block(block, &mut out);
        }
        out
    }

    /// Renders markdown and collects the TOC and reading time in one go.
    pub fn render_document(&self, markdown: &str, words_per_minute: u32) -> RenderedDocument {
        // Headings first: the TOC must be available even if the body is odd.
        let headings = extract_headings(markdown);
        RenderedDocument {
            html: self.render(markdown),
            headings,
            reading_minutes: estimate_minutes(markdown, words_per_minute),
        }
    }

    fn render_block(&self, block: &Block<'_>, out: &mut String) {
        match block {
            Block::Code { lang, lines } => {
                match lang {
                    Some(lang) => {
                        out.push_str("<pre><code class=\"language-");
                        out.push_str(&html_escape::encode_double_quoted_attribute(lang));
                        out.push_str("\">");
                    }
                    None => out.push_str("<pre><code>"),
                }
                out.push_str(&html_escape::encode_text(&lines.join("\n")));
                out.push_str("</code></pre>");
            }
            Block::Heading { level, text } => {
                let text = text.trim();
                out.push_str(&format!("<h{} id=\"{}\">", level, slugify(text)));
                self.render_inline(text, 0, out);
                out.push_str(&format!("</h{}>", level));
            }
            Block::Rule => out.push_str("<hr>"),
            Block::Quote(lines) => {
                out.push_str("<blockquote>");
                for group in lines.split(|l| l.trim().is_empty()).filter(|g| !g.is_empty()) {
                    out.push_str("<p>");
                    self.render_lines(group, out);
                    out.push_str("</p>");
                }
                out.push_str("</blockquote>");
            }
            Block::List { start, items } => {
                let tag = match start {
                    Some(n) if *n != 1 => {
                        out.push_str(&format!("<ol start=\"{}\">\n", n));
                        "ol"
                    }
                    Some(_) => {
                        out.push_str("<ol>\n");
                        "ol"
                    }
                    None => {
                        out.push_str("<ul>\n");
                        "ul"
                    }
                };
                for item in items {
                    out.push_str("<li>");
                    self.render_inline(item, 0, out);
                    out.push_str("</li>\n");
                }
                out.push_str(&format!("</{}>", tag));
            }
            Block::Paragraph(lines) => {
                out.push_str("<p>");
                self.render_lines(lines, out);
                out.push_str("</p>");
            }
        }
    }

    fn render_lines(&self, lines: &[&str], out: &mut String) {
        for (n, line) in lines.iter().enumerate() {
            if n > 0 {
                out.push_str("<br>\n");
            }
            self.render_inline(line.trim(), 0, out);
        }
    }

    /// Single pass over inline text. Output is appended to `out`.
    ///
    /// `depth` counts enclosing links and emphasis; past [`MAX_INLINE_DEPTH`]
    /// brackets and asterisks are emitted as plain text.
    fn render_inline(&self, text: &str, depth: usize, out: &mut String) {
        let nested = depth < MAX_INLINE_DEPTH;
        let mut i = 0;
        while i < text.len() {
            let rest = &text[i..];
            let Some(c) = rest.chars().next() else { break };
            match c {
                '\\' => {
                    if let Some(next) = rest[1..].chars().next() {
                        if "\\`*_[]()#!<>".contains(next) {
                            push_escaped_char(next, out);
                            i += 1 + next.len_utf8();
                            continue;
                        }
                    }
                }
                '`' => {
                    if let Some(end) = rest[1..].find('`') {
                        out.push_str("<code>");
                        out.push_str(&html_escape::encode_text(&rest[1..1 + end]));
                        out.push_str("</code>");
                        i += end + 2;
                        continue;
                    }
                }
                '!' if nested && rest.starts_with("![") => {
                    if let Some(link) = parse_link(&rest[1..]) {
                        out.push_str("<img src=\"");
                        out.push_str(&html_escape::encode_double_quoted_attribute(&safe_url(link.url, true)));
                        out.push_str("\" alt=\"");
                        out.push_str(&html_escape::encode_double_quoted_attribute(link.label));
                        out.push('"');
                        if let Some(title) = link.title {
                            out.push_str(" title=\"");
                            out.push_str(&html_escape::encode_double_quoted_attribute(title));
                            out.push('"');
                        }
                        out.push_str(" loading=\"lazy\">");
                        i += 1 + link.consumed;
                        continue;
                    }
                }
                '[' if nested => {
                    if let Some(link) = parse_link(rest) {
                        out.push_str("<a href=\"");
                        out.push_str(&html_escape::encode_double_quoted_attribute(&safe_url(link.url, false)));
                        out.push('"');
                        if let Some(title) = link.title {
                            out.push_str(" title=\"");
                            out.push_str(&html_escape::encode_double_quoted_attribute(title));
                            out.push('"');
                        }
                        out.push_str(" target=\"_blank\" rel=\"noopener noreferrer\">");
                        self.render_inline(link.label, depth + 1, out);
                        out.push_str("</a>");
                        i += link.consumed;
                        continue;
                    }
                }
                '*' if nested => {
                    let run = rest.bytes().take_while(|b| *b == b'*').count();
                    if let Some((n, inner_len)) = match_emphasis(rest, run) {
                        let inner = &rest[n..n + inner_len];
                        let (open, close) = match n {
                            3 => ("<strong><em>", "</em></strong>"),
                            2 => ("<strong>", "</strong>"),
                            _ => ("<em>", "</em>"),
                        };
                        out.push_str(open);
                        self.render_inline(inner, depth + 1, out);
                        out.push_str(close);
                        i += n + inner_len + n;
                        continue;
                    }
                    // Unmatched run: emit it whole so it can't pair up later.
                    out.push_str(&rest[..run]);
                    i += run;
                    continue;
                }
                '<' => {
                    if self.escape_policy == EscapePolicy::PassThroughLinksAndImages {
                        if let Some(m) = PASSTHROUGH_TAG_RE.find(rest) {
                            let tag = m.as_str();
                            if !UNSAFE_ATTR_RE.is_match(tag) {
                                out.push_str(tag);
                                i += tag.len();
                                continue;
                            }
                        }
                    }
                }
                _ => {}
            }
            push_escaped_char(c, out);
            i += c.len_utf8();
        }
    }
}

fn push_escaped_char(c: char, out: &mut String) {
    match c {
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        _ => out.push(c),
    }
}

struct LinkParts<'a> {
    label: &'a str,
    url: &'a str,
    title: Option<&'a str>,
    /// Bytes from the opening `[` through the closing `)`.
    consumed: usize,
}

/// Parses `[label](url "title")` at the start of `s`.
fn parse_link(s: &str) -> Option<LinkParts<'_>> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'[') {
        return None;
    }

    let mut depth = 0usize;
    let mut label_end = None;
    for (idx, b) in bytes.iter().enumerate().take(MAX_INLINE_SCAN) {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    label_end = Some(idx);
                    break;
                }
            }
            _ => {}
        }
    }
    let label_end = label_end?;
    if bytes.get(label_end + 1) != Some(&b'(') {
        return None;
    }

    let target_start = label_end + 2;
    let mut parens = 1usize;
    let mut target_end = None;
    for (offset, b) in bytes[target_start..].iter().enumerate().take(MAX_INLINE_SCAN) {
        match b {
            b'(' => parens += 1,
            b')' => {
                parens -= 1;
                if parens == 0 {
                    target_end = Some(target_start + offset);
                    break;
                }
            }
            b'\n' => return None,
            _ => {}
        }
    }
    let target_end = target_end?;

    let target = s[target_start..target_end].trim();
    let (url, title) = match target.find(char::is_whitespace) {
        Some(ws) => {
            let title = target[ws..].trim();
            let title = title
                .strip_prefix('"')
                .and_then(|t| t.strip_suffix('"'))
                .filter(|t| !t.is_empty());
            (&target[..ws], title)
        }
        None => (target, None),
    };
    if url.is_empty() {
        return None;
    }

    Some(LinkParts {
        label: &s[1..label_end],
        url,
        title,
        consumed: target_end + 1,
    })
}

/// Finds the closing delimiter for an emphasis run at the start of `s`.
///
/// Tries the longest delimiter first (`***` before `**` before `*`).
/// Returns the delimiter length and the byte length of the enclosed text.
fn match_emphasis(s: &str, run: usize) -> Option<(usize, usize)> {
    for n in (1..=run.min(3)).rev() {
        let body = &s[n..];
        if body.starts_with(char::is_whitespace) || body.is_empty() {
            continue;
        }
        let bytes = body.as_bytes();
        let limit = bytes.len().min(MAX_INLINE_SCAN);
        let mut j = 0;
        while j < limit {
            match bytes[j] {
                b'`' => match body[j + 1..].find('`') {
                    Some(end) => j += end + 2,
                    None => j += 1,
                },
                b'*' => {
                    let m = bytes[j..].iter().take_while(|b| **b == b'*').count();
                    let preceded_by_space = body[..j].ends_with(char::is_whitespace);
                    if m == n && j > 0 && !preceded_by_space {
                        return Some((n, j));
                    }
                    j += m;
                }
                _ => j += 1,
            }
        }
    }
    None
}

/// Neutralises script-capable URL schemes.
fn safe_url(url: &str, is_image: bool) -> String {
    let lowered = url.trim().to_ascii_lowercase();
    let blocked = lowered.starts_with("javascript:")
        || lowered.starts_with("vbscript:")
        || (lowered.starts_with("data:") && !(is_image && lowered.starts_with("data:image/")));
    if blocked {
        "#".to_string()
    } else {
        url.trim().to_string()
    }
}

// ─── Free functions ───

/// Renders with the default escape policy.
pub fn render(markdown: &str) -> String {
    MarkdownRenderer::default().render(markdown)
}

/// Collects `#`, `##` and `###` headings in document order.
///
/// Independent of [`MarkdownRenderer::render`]. Lines inside fenced code
/// blocks are skipped, matching what the renderer turns into headings.
pub fn extract_headings(markdown: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut in_fence = false;
    for line in markdown.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Line::Heading(level, text) = classify(line) {
            let text = text.trim();
            headings.push(Heading {
                level,
                text: plain_text(text),
                slug: slugify(text),
            });
        }
    }
    headings
}

/// Heading text without inline markup characters.
fn plain_text(text: &str) -> String {
    text.chars().filter(|c| *c != '*' && *c != '`').collect()
}

/// Anchor id for a heading.
///
/// Lowercase, drop everything outside `[a-z0-9\s-]`, trim, then collapse
/// runs of whitespace and dashes into a single `-`. Text with nothing left
/// becomes `section`.
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut in_separator = false;
    for c in kept.trim().chars() {
        if c.is_whitespace() || c == '-' {
            if !in_separator {
                slug.push('-');
                in_separator = true;
            }
        } else {
            slug.push(c);
            in_separator = false;
        }
    }

    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

/// Words in `text`, ignoring HTML tags.
pub fn count_words(text: &str) -> usize {
    let mut plain = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                plain.push(' ');
            }
            _ if !in_tag => plain.push(ch),
            _ => {}
        }
    }
    plain
        .split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_alphanumeric()))
        .count()
}

/// Minutes needed to read `text`: `ceil(words / wpm)`, never less than 1.
pub fn estimate_minutes(text: &str, words_per_minute: u32) -> u32 {
    let wpm = if words_per_minute == 0 {
        DEFAULT_WORDS_PER_MINUTE
    } else {
        words_per_minute
    };
    let words = count_words(text) as u64;
    (words.div_ceil(wpm as u64)).max(1) as u32
}
