//! Wire types returned by the content API

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::CmsError;

/// A single content API document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document<T = Value> {
    /// Opaque document id
    pub id: String,

    /// Human readable identifier, used as the page slug
    #[serde(default)]
    pub uid: Option<String>,

    /// Custom type name (`posts`)
    #[serde(rename = "type")]
    pub doc_type: String,

    #[serde(default)]
    pub first_publication_date: Option<String>,

    #[serde(default)]
    pub last_publication_date: Option<String>,

    #[serde(default)]
    pub lang: Option<String>,

    /// Custom type fields
    pub data: T,
}

impl Document<Value> {
    /// Decode the untyped `data` block
    pub fn decode<T: DeserializeOwned>(self) -> Result<Document<T>, CmsError> {
        Ok(Document {
            id: self.id,
            uid: self.uid,
            doc_type: self.doc_type,
            first_publication_date: self.first_publication_date,
            last_publication_date: self.last_publication_date,
            lang: self.lang,
            data: serde_json::from_value(self.data)?,
        })
    }
}

/// One page of search results
///
/// `next_page` is the cursor: a URL for the following page, `None` on the
/// last one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse<T = Value> {
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub results_per_page: usize,
    #[serde(default)]
    pub results_size: usize,
    #[serde(default)]
    pub total_results_size: usize,
    #[serde(default)]
    pub total_pages: usize,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub prev_page: Option<String>,
    pub results: Vec<Document<T>>,
}

impl<T> SearchResponse<T> {
    /// Cursor for the next page, with the empty string treated as absent
    pub fn cursor(&self) -> Option<&str> {
        self.next_page.as_deref().filter(|url| !url.is_empty())
    }
}

impl SearchResponse<Value> {
    /// Decode every result's `data` block
    pub fn decode<T: DeserializeOwned>(self) -> Result<SearchResponse<T>, CmsError> {
        let results = self
            .results
            .into_iter()
            .map(Document::decode)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SearchResponse {
            page: self.page,
            results_per_page: self.results_per_page,
            results_size: self.results_size,
            total_results_size: self.total_results_size,
            total_pages: self.total_pages,
            next_page: self.next_page,
            prev_page: self.prev_page,
            results,
        })
    }
}

/// A ref entry from the API root (`GET /api/v2`)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRef {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

/// API root document
#[derive(Debug, Clone, Deserialize)]
pub struct ApiInfo {
    pub refs: Vec<ApiRef>,
}

impl ApiInfo {
    /// The ref serving published content
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}
