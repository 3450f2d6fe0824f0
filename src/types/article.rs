use serde::{Deserialize, Serialize};

/// Metadata of a saved article. The content blob lives in the content store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub id: String,
    pub url: String,
    pub title: String,
    pub author: Option<String>,
    pub site_name: Option<String>,
    pub excerpt: Option<String>,
    pub published_time: Option<String>,
    pub word_count: i64,
    pub added_at: i64,
    pub last_read_at: Option<i64>,
    pub is_read: bool,
    /// Last persisted reading percentage, 0–100.
    pub progress: u8,
}

/// An article together with its content, as returned when opening it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredArticle {
    pub article: Article,
    pub content: String,
}

/// Metadata supplied when an article is first saved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewArticle {
    pub url: String,
    pub title: String,
    pub author: Option<String>,
    pub site_name: Option<String>,
    pub excerpt: Option<String>,
    pub published_time: Option<String>,
}

/// Successful response of the extraction endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub content: String,
    #[serde(default)]
    pub published_time: Option<String>,
}

impl ExtractedArticle {
    /// Splits the extraction result into storable metadata and content.
    pub fn into_parts(self, url: &str) -> (NewArticle, String) {
        let title = if self.title.trim().is_empty() {
            url.to_string()
        } else {
            self.title.trim().to_string()
        };
        let meta = NewArticle {
            url: url.to_string(),
            title,
            author: self.author,
            site_name: self.site_name,
            excerpt: self.excerpt,
            published_time: self.published_time,
        };
        (meta, self.content)
    }
}
