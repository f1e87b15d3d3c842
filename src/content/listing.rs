//! Listing state: loaded post summaries plus the cursor to the next page
//!
//! The listing only ever grows by appending a fetched page to the end, and
//! every fetch replaces the cursor with the one it returned. One load may be in
//! flight at a time; a second request while it is pending is a no-op.

use super::post::{PostPage, PostSummary, PostSummaryData};
use crate::cms::{self, CmsError, ContentSource};

/// A load that has been started and must be completed or aborted
#[derive(Debug)]
#[must_use]
pub struct PendingLoad {
    cursor: String,
    generation: u64,
}

impl PendingLoad {
    /// URL the page must be fetched from
    pub fn cursor(&self) -> &str {
        &self.cursor
    }
}

/// Result of a `load_more` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and this many posts were appended
    Loaded(usize),
    /// Nothing was fetched: no cursor, a load in flight, or the page cap reached
    Exhausted,
}

/// Posts loaded so far on the listing page
#[derive(Debug, Clone)]
pub struct Listing {
    posts: Vec<PostSummary>,
    next_page: Option<String>,
    pages: usize,
    max_pages: Option<usize>,
    in_flight: Option<u64>,
    generation: u64,
}

impl Listing {
    /// Start from the first page fetched at generation time
    pub fn seed(page: PostPage) -> Self {
        Self {
            posts: page.results,
            next_page: page.next_page.filter(|url| !url.is_empty()),
            pages: 1,
            max_pages: None,
            in_flight: None,
            generation: 0,
        }
    }

    /// Continue a listing whose first `loaded` pages live elsewhere (in a browser)
    pub fn resume(cursor: String, loaded: usize) -> Self {
        Self {
            posts: Vec::new(),
            next_page: Some(cursor).filter(|url| !url.is_empty()),
            pages: loaded,
            max_pages: None,
            in_flight: None,
            generation: 0,
        }
    }

    /// Stop offering more pages once `max_pages` pages are loaded
    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn into_posts(self) -> Vec<PostSummary> {
        self.posts
    }

    /// Current cursor, `None` once the last page is loaded
    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    /// Number of pages loaded, the seed included
    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    fn at_cap(&self) -> bool {
        self.max_pages.is_some_and(|max| self.pages >= max)
    }

    /// Whether a "load more" action should be offered
    pub fn has_more(&self) -> bool {
        self.next_page.is_some() && !self.is_loading() && !self.at_cap()
    }

    /// Mark a load as in flight and hand out the cursor to fetch
    pub fn begin_load(&mut self) -> Option<PendingLoad> {
        if !self.has_more() {
            return None;
        }
        let cursor = self.next_page.clone()?;
        self.generation += 1;
        self.in_flight = Some(self.generation);
        Some(PendingLoad {
            cursor,
            generation: self.generation,
        })
    }

    /// Append a fetched page and take its cursor; returns the number of posts appended
    ///
    /// A pending load that is no longer the current one is ignored.
    pub fn complete(&mut self, pending: PendingLoad, page: PostPage) -> usize {
        if self.in_flight != Some(pending.generation) {
            tracing::debug!("Ignoring superseded load of {}", pending.cursor);
            return 0;
        }

        let appended = page.results.len();
        self.posts.extend(page.results);
        self.next_page = page.next_page.filter(|url| !url.is_empty());
        self.pages = self.pages.saturating_add(1);
        self.in_flight = None;
        appended
    }

    /// Give up on a pending load, keeping the cursor for a later retry
    pub fn abort(&mut self, pending: PendingLoad) {
        if self.in_flight == Some(pending.generation) {
            self.in_flight = None;
        }
    }

    /// Fetch the next page through `source` and append it
    pub fn load_more(&mut self, source: &dyn ContentSource) -> Result<LoadOutcome, CmsError> {
        let Some(pending) = self.begin_load() else {
            return Ok(LoadOutcome::Exhausted);
        };

        match cms::next_page::<PostSummaryData>(source, pending.cursor()) {
            Ok(response) => {
                let appended = self.complete(pending, response.into());
                tracing::debug!("Loaded {} more posts (page {})", appended, self.pages);
                Ok(LoadOutcome::Loaded(appended))
            }
            Err(e) => {
                self.abort(pending);
                Err(e)
            }
        }
    }

    /// Follow the cursor until no pages remain (or the page cap is reached)
    pub fn load_all(&mut self, source: &dyn ContentSource) -> Result<usize, CmsError> {
        let mut appended = 0;
        while let LoadOutcome::Loaded(n) = self.load_more(source)? {
            appended += n;
        }
        Ok(appended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::memory::MemorySource;
    use crate::cms::SearchResponse;
    use crate::config::SiteConfig;
    use crate::content::post::summary_query;
    use serde_json::json;

    fn source(count: usize) -> MemorySource {
        (0..count).fold(MemorySource::new("posts"), |source, i| {
            source.with_post(
                &format!("post-{}", i),
                Some("2021-03-25T19:25:28+0000"),
                json!({"title": format!("Post {}", i), "subtitle": "", "author": "A"}),
            )
        })
    }

    fn first_page(source: &MemorySource, page_size: usize) -> PostPage {
        let config = SiteConfig {
            listing_page_size: page_size,
            ..SiteConfig::default()
        };
        let response: SearchResponse<PostSummaryData> =
            cms::query(source, &summary_query(&config)).unwrap();
        response.into()
    }

    fn slugs(listing: &Listing) -> Vec<&str> {
        listing.posts().iter().map(|p| p.slug.as_str()).collect()
    }

    fn summary(slug: &str) -> PostSummary {
        PostSummary {
            slug: slug.to_string(),
            first_publication_date: None,
            data: PostSummaryData::default(),
        }
    }

    #[test]
    fn test_loads_concatenate_in_fetch_order() {
        let source = source(5);
        let mut listing = Listing::seed(first_page(&source, 2));
        assert_eq!(slugs(&listing), vec!["post-0", "post-1"]);

        assert_eq!(listing.load_more(&source).unwrap(), LoadOutcome::Loaded(2));
        assert_eq!(listing.load_more(&source).unwrap(), LoadOutcome::Loaded(1));
        assert_eq!(
            slugs(&listing),
            vec!["post-0", "post-1", "post-2", "post-3", "post-4"]
        );
        assert_eq!(listing.pages(), 3);
    }

    #[test]
    fn test_terminal_cursor_stops_fetching() {
        let source = source(2);
        let mut listing = Listing::seed(first_page(&source, 1));
        assert!(listing.has_more());

        listing.load_more(&source).unwrap();
        assert_eq!(listing.next_page(), None);
        assert!(!listing.has_more());

        assert_eq!(listing.load_more(&source).unwrap(), LoadOutcome::Exhausted);
        assert_eq!(source.page_fetches(), 1);
    }

    #[test]
    fn test_empty_cursor_is_terminal() {
        let listing = Listing::seed(PostPage {
            results: vec![summary("a")],
            next_page: Some(String::new()),
        });
        assert!(!listing.has_more());
    }

    #[test]
    fn test_no_deduplication() {
        let mut listing = Listing::seed(PostPage {
            results: vec![summary("a")],
            next_page: Some("https://memory.test/api/v2/p2".to_string()),
        });
        let pending = listing.begin_load().unwrap();
        listing.complete(
            pending,
            PostPage {
                results: vec![summary("a"), summary("b")],
                next_page: None,
            },
        );
        assert_eq!(slugs(&listing), vec!["a", "a", "b"]);
    }

    #[test]
    fn test_second_load_while_in_flight_is_noop() {
        let mut listing = Listing::seed(PostPage {
            results: vec![summary("a")],
            next_page: Some("https://memory.test/api/v2/p2".to_string()),
        });

        let pending = listing.begin_load().unwrap();
        assert!(listing.is_loading());
        assert!(!listing.has_more());
        assert!(listing.begin_load().is_none());

        let appended = listing.complete(
            pending,
            PostPage {
                results: vec![summary("b")],
                next_page: Some("https://memory.test/api/v2/p3".to_string()),
            },
        );
        assert_eq!(appended, 1);
        assert!(!listing.is_loading());
        assert_eq!(listing.next_page(), Some("https://memory.test/api/v2/p3"));
    }

    #[test]
    fn test_superseded_load_is_ignored() {
        let mut listing = Listing::seed(PostPage {
            results: vec![summary("a")],
            next_page: Some("https://memory.test/api/v2/p2".to_string()),
        });

        let stale = listing.begin_load().unwrap();
        let stale_generation = stale.generation;
        listing.abort(stale);
        let current = listing.begin_load().unwrap();

        let replayed = PendingLoad {
            cursor: "https://memory.test/api/v2/p2".to_string(),
            generation: stale_generation,
        };
        assert_eq!(
            listing.complete(
                replayed,
                PostPage {
                    results: vec![summary("stale")],
                    next_page: None,
                },
            ),
            0
        );
        assert_eq!(slugs(&listing), vec!["a"]);
        assert!(listing.is_loading());
        listing.abort(current);
    }

    #[test]
    fn test_failed_load_keeps_cursor() {
        let source = source(2);
        let mut listing = Listing::seed(first_page(&source, 1));
        let cursor = listing.next_page().map(str::to_string);

        source.fail_next();
        assert!(listing.load_more(&source).is_err());
        assert!(!listing.is_loading());
        assert_eq!(listing.next_page().map(str::to_string), cursor);
        assert_eq!(slugs(&listing), vec!["post-0"]);

        assert_eq!(listing.load_more(&source).unwrap(), LoadOutcome::Loaded(1));
        assert_eq!(slugs(&listing), vec!["post-0", "post-1"]);
    }

    #[test]
    fn test_page_cap() {
        let source = source(5);
        let mut listing = Listing::seed(first_page(&source, 1)).with_max_pages(Some(3));
        assert_eq!(listing.load_all(&source).unwrap(), 2);
        assert_eq!(listing.pages(), 3);
        assert!(listing.next_page().is_some());
        assert!(!listing.has_more());
    }

    #[test]
    fn test_resume_respects_cap() {
        let source = source(3);
        let cursor = first_page(&source, 1).next_page.unwrap();

        let mut listing = Listing::resume(cursor, 1).with_max_pages(Some(2));
        assert_eq!(listing.load_more(&source).unwrap(), LoadOutcome::Loaded(1));
        assert_eq!(slugs(&listing), vec!["post-1"]);
        assert_eq!(listing.pages(), 2);
        assert!(!listing.has_more());
    }

    #[test]
    fn test_resume_with_huge_page_count() {
        let source = source(3);
        let cursor = first_page(&source, 1).next_page.unwrap();

        let mut listing = Listing::resume(cursor, usize::MAX);
        assert_eq!(listing.load_more(&source).unwrap(), LoadOutcome::Loaded(1));
        assert_eq!(listing.pages(), usize::MAX);
        assert!(listing.has_more());
    }

    #[test]
    fn test_load_all() {
        let source = source(4);
        let mut listing = Listing::seed(first_page(&source, 1));
        assert_eq!(listing.load_all(&source).unwrap(), 3);
        assert_eq!(listing.into_posts().len(), 4);
    }
}
