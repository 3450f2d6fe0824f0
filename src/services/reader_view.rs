//! Reader view for ReadLater.
//!
//! Wraps a rendered article body into a standalone, distraction-free HTML
//! page: typography from [`ReaderSettings`], a metadata line, and a table of
//! contents linking to the heading anchors.

use crate::types::article::Article;
use crate::types::document::{Heading, RenderedDocument};
use crate::types::reader::{FontFamily, ReaderSettings};

/// Trait defining reader view operations.
pub trait ReaderViewTrait {
    fn format_for_display(&self, article: &Article, document: &RenderedDocument) -> String;
    fn table_of_contents(&self, headings: &[Heading]) -> String;
    fn update_settings(&mut self, settings: ReaderSettings);
    fn get_settings(&self) -> &ReaderSettings;
}

pub struct ReaderView {
    settings: ReaderSettings,
}

impl ReaderView {
    pub fn new(settings: ReaderSettings) -> Self {
        Self { settings }
    }

    fn font_stack(family: &FontFamily) -> &'static str {
        match family {
            FontFamily::Serif => "Georgia, 'Times New Roman', serif",
            FontFamily::SansSerif => "-apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif",
            FontFamily::Monospace => "'SF Mono', 'Fira Code', monospace",
        }
    }

    fn meta_line(article: &Article, document: &RenderedDocument) -> String {
        let mut parts = Vec::new();
        if let Some(site) = article.site_name.as_deref().filter(|s| !s.trim().is_empty()) {
            parts.push(html_escape::encode_text(site).to_string());
        }
        if let Some(author) = article.author.as_deref().filter(|s| !s.trim().is_empty()) {
            parts.push(html_escape::encode_text(author).to_string());
        }
        parts.push(format!("{} min read", document.reading_minutes));
        parts.join(" · ")
    }
}

impl Default for ReaderView {
    fn default() -> Self {
        Self::new(ReaderSettings::default())
    }
}

impl ReaderViewTrait for ReaderView {
    fn format_for_display(&self, article: &Article, document: &RenderedDocument) -> String {
        let settings = &self.settings;
        let (background, foreground) = settings.theme.colors();

        format!(
            r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title><style>
body {{ font-family: {font}; font-size: {size}px; line-height: {line_height}; background: {bg}; color: {fg}; max-width: {width}px; margin: 0 auto; padding: 2em; }}
h1.title {{ font-size: 1.8em; margin-bottom: 0.5em; }}
.meta {{ opacity: 0.7; margin-bottom: 2em; }}
nav.toc ul {{ list-style: none; padding-left: 0; }}
nav.toc .level-2 {{ padding-left: 1em; }}
nav.toc .level-3 {{ padding-left: 2em; }}
img {{ max-width: 100%; height: auto; }}
pre {{ overflow-x: auto; }}
</style></head><body>
<h1 class="title">{title}</h1>
<div class="meta">{meta}</div>
{toc}<article class="content">
{body}</article>
</body></html>"#,
            title = html_escape::encode_text(&article.title),
            font = Self::font_stack(&settings.font_family),
            size = settings.font_size,
            line_height = settings.line_height,
            bg = background,
            fg = foreground,
            width = settings.max_width,
            meta = Self::meta_line(article, document),
            toc = self.table_of_contents(&document.headings),
            body = document.html,
        )
    }

    /// Nested-by-indent list of heading links. Empty when there are no headings.
    fn table_of_contents(&self, headings: &[Heading]) -> String {
        if headings.is_empty() {
            return String::new();
        }
        let mut out = String::from("<nav class=\"toc\"><ul>\n");
        for heading in headings {
            out.push_str(&format!(
                "<li class=\"level-{}\"><a href=\"#{}\">{}</a></li>\n",
                heading.level,
                html_escape::encode_double_quoted_attribute(&heading.slug),
                html_escape::encode_text(&heading.text),
            ));
        }
        out.push_str("</ul></nav>\n");
        out
    }

    fn update_settings(&mut self, settings: ReaderSettings) {
        self.settings = settings;
    }

    fn get_settings(&self) -> &ReaderSettings {
        &self.settings
    }
}
