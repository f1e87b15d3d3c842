//! Content source: the headless CMS that supplies post documents
//!
//! Everything that talks to the content API goes through [`ContentSource`],
//! so generation and serving take the client as an explicit argument and
//! tests can swap in an in-memory source.

mod client;
mod document;
#[cfg(test)]
pub mod memory;
mod query;

pub use client::PrismicClient;
pub use document::{ApiInfo, ApiRef, Document, SearchResponse};
pub use query::{Predicate, Query};

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Content API errors
#[derive(Error, Debug)]
pub enum CmsError {
    #[error("HTTP error: {0}")]
    Http(#[from] attohttpc::Error),

    #[error("{url} responded with status {status}")]
    Status { status: u16, url: String },

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("No {doc_type} document with uid {uid:?}")]
    NotFound { doc_type: String, uid: String },

    #[error("Content API has no master ref")]
    NoMasterRef,

    #[error("Refusing to follow cursor outside the content API: {0}")]
    ForeignCursor(String),
}

impl CmsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// A source of content API documents
pub trait ContentSource: Send + Sync {
    /// Base URL of the API; cursors must stay under its origin
    fn endpoint(&self) -> &str;

    /// Run a search query
    fn search(&self, query: &Query) -> Result<SearchResponse, CmsError>;

    /// Follow a `next_page` cursor
    fn fetch_page(&self, url: &str) -> Result<SearchResponse, CmsError>;
}

/// Run a search and decode the results' data blocks
pub fn query<T: DeserializeOwned>(
    source: &dyn ContentSource,
    query: &Query,
) -> Result<SearchResponse<T>, CmsError> {
    source.search(query)?.decode()
}

/// Follow a cursor and decode the results' data blocks
pub fn next_page<T: DeserializeOwned>(
    source: &dyn ContentSource,
    cursor: &str,
) -> Result<SearchResponse<T>, CmsError> {
    source.fetch_page(cursor)?.decode()
}

/// Fetch a single document of `doc_type` by uid
pub fn get_by_uid<T: DeserializeOwned>(
    source: &dyn ContentSource,
    doc_type: &str,
    uid: &str,
) -> Result<Document<T>, CmsError> {
    let search = Query::new()
        .predicate(Predicate::uid(doc_type, uid))
        .page_size(1);

    let document = source
        .search(&search)?
        .results
        .into_iter()
        .next()
        .ok_or_else(|| CmsError::NotFound {
            doc_type: doc_type.to_string(),
            uid: uid.to_string(),
        })?;

    document.decode()
}

/// Whether `cursor` points at the same origin as `endpoint`
pub fn is_trusted_cursor(endpoint: &str, cursor: &str) -> bool {
    match (origin(endpoint), origin(cursor)) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

/// `scheme://host[:port]` of an absolute URL
fn origin(url: &str) -> Option<&str> {
    let scheme_end = url.find("://")?;
    let rest = &url[scheme_end + 3..];
    let host_len = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    if host_len == 0 || rest[..host_len].contains('@') {
        return None;
    }
    Some(&url[..scheme_end + 3 + host_len])
}
