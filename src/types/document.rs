use serde::{Deserialize, Serialize};

/// A heading found in article content, used for the table of contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Heading {
    /// 1 to 3.
    pub level: u8,
    pub text: String,
    /// Anchor id shared with the rendered `<hN id="...">`.
    pub slug: String,
}

/// How raw `<` and `>` in markdown source are treated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EscapePolicy {
    /// Keep `<a ...>`, `</a>` and `<img ...>` tags handed down by the upstream
    /// HTML-to-markdown converter; escape every other angle bracket.
    #[default]
    PassThroughLinksAndImages,
    /// Escape every angle bracket.
    EscapeAll,
}

/// Output of the full render pipeline for one article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderedDocument {
    pub html: String,
    pub headings: Vec<Heading>,
    pub reading_minutes: u32,
}
