//! In-memory content source for tests

use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{is_trusted_cursor, CmsError, ContentSource, Document, Predicate, Query, SearchResponse};

const ENDPOINT: &str = "https://memory.test/api/v2";

/// Serves a fixed list of documents, paginated like the real API
pub struct MemorySource {
    doc_type: String,
    documents: Vec<Document>,
    searches: AtomicUsize,
    page_fetches: AtomicUsize,
    fail_next: AtomicBool,
}

impl MemorySource {
    pub fn new(doc_type: &str) -> Self {
        Self {
            doc_type: doc_type.to_string(),
            documents: Vec::new(),
            searches: AtomicUsize::new(0),
            page_fetches: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn with_post(mut self, uid: &str, published: Option<&str>, data: Value) -> Self {
        let id = format!("doc-{}", self.documents.len());
        self.documents.push(Document {
            id,
            uid: Some(uid.to_string()),
            doc_type: self.doc_type.clone(),
            first_publication_date: published.map(str::to_string),
            last_publication_date: published.map(str::to_string),
            lang: Some("pt-br".to_string()),
            data,
        });
        self
    }

    /// Make the next request fail with a 503
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn page_fetches(&self) -> usize {
        self.page_fetches.load(Ordering::SeqCst)
    }

    fn check_failure(&self, url: &str) -> Result<(), CmsError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(CmsError::Status {
                status: 503,
                url: url.to_string(),
            });
        }
        Ok(())
    }

    fn page(&self, docs: Vec<&Document>, page: usize, page_size: usize) -> SearchResponse {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let total = docs.len();
        let total_pages = total.div_ceil(page_size);

        let results: Vec<Document> = docs
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .cloned()
            .collect();

        let link = |n: usize| {
            format!(
                "{}/documents/search?page={}&pageSize={}",
                ENDPOINT, n, page_size
            )
        };

        SearchResponse {
            page,
            results_per_page: page_size,
            results_size: results.len(),
            total_results_size: total,
            total_pages,
            next_page: (page < total_pages).then(|| link(page + 1)),
            prev_page: (page > 1).then(|| link(page - 1)),
            results,
        }
    }
}

impl ContentSource for MemorySource {
    fn endpoint(&self) -> &str {
        ENDPOINT
    }

    fn search(&self, query: &Query) -> Result<SearchResponse, CmsError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.check_failure(ENDPOINT)?;

        let uid_path = format!("my.{}.uid", self.doc_type);
        let docs: Vec<&Document> = self
            .documents
            .iter()
            .filter(|doc| {
                query.predicates.iter().all(|p| match p {
                    Predicate::At { path, value } if path == "document.type" => {
                        &doc.doc_type == value
                    }
                    Predicate::At { path, value } if *path == uid_path => {
                        doc.uid.as_deref() == Some(value.as_str())
                    }
                    other => panic!("MemorySource cannot evaluate predicate {}", other),
                })
            })
            .collect();

        Ok(self.page(
            docs,
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(20),
        ))
    }

    fn fetch_page(&self, url: &str) -> Result<SearchResponse, CmsError> {
        if !is_trusted_cursor(ENDPOINT, url) {
            return Err(CmsError::ForeignCursor(url.to_string()));
        }
        self.page_fetches.fetch_add(1, Ordering::SeqCst);
        self.check_failure(url)?;

        let param = |name: &str| -> usize {
            url.split('?')
                .nth(1)
                .unwrap_or("")
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(k, _)| *k == name)
                .and_then(|(_, v)| v.parse().ok())
                .unwrap_or(1)
        };

        Ok(self.page(
            self.documents.iter().collect(),
            param("page"),
            param("pageSize"),
        ))
    }
}
