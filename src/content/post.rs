//! Post models

use serde::{Deserialize, Serialize};

use super::richtext::{self, LinkResolver, RichText};
use crate::cms::{Document, Predicate, Query, SearchResponse};
use crate::config::SiteConfig;
use crate::helpers::{post_path, truncate, url_for, DateFormatter};

/// Listing fields of a post document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostSummaryData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A post as shown on the listing page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// URL slug (the document uid)
    pub slug: String,
    pub first_publication_date: Option<String>,
    pub data: PostSummaryData,
}

impl PostSummary {
    /// Build from a listing document; documents without a uid fall back to their id
    pub fn from_document(doc: Document<PostSummaryData>) -> Self {
        let slug = doc.uid.unwrap_or_else(|| {
            tracing::warn!("Post {} has no uid, linking by id", doc.id);
            doc.id
        });
        Self {
            slug,
            first_publication_date: doc.first_publication_date,
            data: doc.data,
        }
    }
}

/// One page of post summaries and the cursor that follows it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostPage {
    pub results: Vec<PostSummary>,
    pub next_page: Option<String>,
}

impl From<SearchResponse<PostSummaryData>> for PostPage {
    fn from(response: SearchResponse<PostSummaryData>) -> Self {
        let next_page = response.cursor().map(str::to_string);
        Self {
            results: response
                .results
                .into_iter()
                .map(PostSummary::from_document)
                .collect(),
            next_page,
        }
    }
}

/// Post banner image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Banner {
    pub url: String,
    pub alt: Option<String>,
}

/// A content section as stored in the content API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSection {
    pub heading: String,
    pub body: RichText,
}

/// Detail fields of a post document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostDetailData {
    pub title: String,
    pub banner: Banner,
    pub author: String,
    pub content: Vec<RawSection>,
}

/// A content section with its body already rendered to HTML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostContent {
    pub title: String,
    pub banner: Banner,
    pub author: String,
    pub content: Vec<Section>,
}

/// A post as shown on its own page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub slug: String,
    pub first_publication_date: Option<String>,
    /// Plain-text opening of the first section, for the page description
    pub excerpt: String,
    pub data: PostContent,
}

impl PostDetail {
    /// Convert a fetched document, rendering every section body once
    pub fn from_document(doc: Document<PostDetailData>, resolver: &LinkResolver) -> Self {
        let slug = doc.uid.unwrap_or(doc.id);
        let data = doc.data;

        let content = data
            .content
            .iter()
            .map(|section| Section {
                heading: section.heading.clone(),
                body: richtext::as_html(&section.body, resolver),
            })
            .collect();

        let excerpt = data
            .content
            .first()
            .map(|section| truncate(richtext::as_text(&section.body).trim(), 160, None))
            .unwrap_or_default();

        Self {
            slug,
            first_publication_date: doc.first_publication_date,
            excerpt,
            data: PostContent {
                title: data.title,
                banner: data.banner,
                author: data.author,
                content,
            },
        }
    }
}

/// Template and JSON projection of a post summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    pub slug: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    /// Formatted publication date, empty when unpublished
    pub date: String,
}

impl PostView {
    pub fn new(post: &PostSummary, config: &SiteConfig, formatter: &DateFormatter) -> Self {
        Self {
            slug: post.slug.clone(),
            path: url_for(config, &post_path(&post.slug)),
            title: post.data.title.clone(),
            subtitle: post.data.subtitle.clone(),
            author: post.data.author.clone(),
            date: display_date(
                post.first_publication_date.as_deref(),
                &config.date_format,
                formatter,
            ),
        }
    }
}

/// Format a publication date for display
///
/// Unpublished posts show nothing; an unparseable date is shown as-is.
pub fn display_date(date: Option<&str>, pattern: &str, formatter: &DateFormatter) -> String {
    let Some(date) = date else {
        return String::new();
    };
    match formatter.format(date, pattern) {
        Ok(formatted) => formatted,
        Err(e) => {
            tracing::warn!("Cannot format publication date {:?}: {}", date, e);
            date.to_string()
        }
    }
}

/// Query for the listing page
pub fn summary_query(config: &SiteConfig) -> Query {
    let t = &config.document_type;
    Query::new()
        .predicate(Predicate::document_type(t))
        .fetch([
            format!("{}.title", t),
            format!("{}.subtitle", t),
            format!("{}.author", t),
            format!("{}.first_publication_date", t),
        ])
        .page_size(config.listing_page_size)
}

/// Query for the pre-rendered detail paths
pub fn paths_query(config: &SiteConfig) -> Query {
    let t = &config.document_type;
    Query::new()
        .predicate(Predicate::document_type(t))
        .fetch([format!("{}.title", t), format!("{}.content", t)])
        .page_size(config.paths_page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_renders_sections_in_order() {
        let doc: Document<PostDetailData> = serde_json::from_value(json!({
            "id": "X",
            "uid": "criando-um-app",
            "type": "posts",
            "first_publication_date": "2021-03-25T19:25:28+0000",
            "data": {
                "title": "Criando um app",
                "banner": {"url": "https://images.prismic.io/banner.png"},
                "author": "Joseph Oliveira",
                "content": [
                    {"heading": "Primeiro", "body": [{"type": "paragraph", "text": "um", "spans": []}]},
                    {"heading": "Segundo", "body": [{"type": "paragraph", "text": "dois", "spans": []}]}
                ]
            }
        }))
        .unwrap();

        let post = PostDetail::from_document(doc, &LinkResolver::default());
        assert_eq!(post.slug, "criando-um-app");
        assert_eq!(post.excerpt, "um");
        assert_eq!(post.data.banner.url, "https://images.prismic.io/banner.png");
        assert_eq!(
            post.data.content,
            vec![
                Section {
                    heading: "Primeiro".to_string(),
                    body: "<p>um</p>".to_string()
                },
                Section {
                    heading: "Segundo".to_string(),
                    body: "<p>dois</p>".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_post_view() {
        let post = PostSummary {
            slug: "hooks".to_string(),
            first_publication_date: Some("2021-03-25T00:00:00Z".to_string()),
            data: PostSummaryData {
                title: "Hooks".to_string(),
                subtitle: "Tudo sobre hooks".to_string(),
                author: "Danilo".to_string(),
            },
        };
        let view = PostView::new(&post, &SiteConfig::default(), &DateFormatter::default());
        assert_eq!(view.path, "/post/hooks/");
        assert_eq!(view.date, "25 mar 2021");
    }

    #[test]
    fn test_display_date_fallbacks() {
        let formatter = DateFormatter::default();
        assert_eq!(display_date(None, "dd MMM y", &formatter), "");
        assert_eq!(display_date(Some("soon"), "dd MMM y", &formatter), "soon");
    }

    #[test]
    fn test_summary_query() {
        let query = summary_query(&SiteConfig::default());
        assert_eq!(query.page_size, Some(1));
        assert_eq!(
            query.fetch,
            vec![
                "posts.title",
                "posts.subtitle",
                "posts.author",
                "posts.first_publication_date"
            ]
        );
        assert_eq!(paths_query(&SiteConfig::default()).page_size, Some(2));
    }
}
