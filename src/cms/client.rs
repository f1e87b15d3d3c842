//! Blocking HTTP client for the Prismic REST API

use serde::de::DeserializeOwned;
use std::time::Duration;

use super::document::{ApiInfo, SearchResponse};
use super::{is_trusted_cursor, CmsError, ContentSource, Query};
use crate::config::SiteConfig;
use crate::helpers::{encode_query_value, strip_query_param};

/// Content API client bound to one repository and its master ref
///
/// Built once per generation run (or once per server) and passed to every
/// function that fetches.
#[derive(Debug, Clone)]
pub struct PrismicClient {
    endpoint: String,
    access_token: Option<String>,
    master_ref: String,
    timeout: Duration,
}

impl PrismicClient {
    /// Connect to the API root and resolve the master ref
    pub fn connect(config: &SiteConfig) -> Result<Self, CmsError> {
        let endpoint = config.api_endpoint.trim_end_matches('/').to_string();
        let timeout = config.request_timeout();
        let access_token = config.access_token.clone().filter(|t| !t.is_empty());

        let mut url = endpoint.clone();
        if let Some(token) = &access_token {
            url.push_str("?access_token=");
            url.push_str(&encode_query_value(token));
        }

        let info: ApiInfo = get_json(&url, timeout)?;
        let master_ref = info.master_ref().ok_or(CmsError::NoMasterRef)?.to_string();
        tracing::debug!("Resolved master ref {} for {}", master_ref, endpoint);

        Ok(Self {
            endpoint,
            access_token,
            master_ref,
            timeout,
        })
    }

    /// The ref every search is pinned to
    pub fn master_ref(&self) -> &str {
        &self.master_ref
    }

    /// Full search URL for a query
    pub fn search_url(&self, query: &Query) -> String {
        let mut params = vec![("ref", self.master_ref.clone())];
        params.extend(query.to_params());
        if let Some(token) = &self.access_token {
            params.push(("access_token", token.clone()));
        }

        let query_string: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, encode_query_value(v)))
            .collect();

        format!("{}/documents/search?{}", self.endpoint, query_string.join("&"))
    }

    /// A cursor with this client's token, whatever token it arrived with
    pub fn cursor_url(&self, cursor: &str) -> String {
        let url = strip_query_param(cursor, "access_token");
        match &self.access_token {
            Some(token) => {
                let separator = if url.contains('?') { '&' } else { '?' };
                format!(
                    "{}{}access_token={}",
                    url,
                    separator,
                    encode_query_value(token)
                )
            }
            None => url,
        }
    }
}

impl ContentSource for PrismicClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn search(&self, query: &Query) -> Result<SearchResponse, CmsError> {
        let url = self.search_url(query);
        tracing::debug!("Searching {:?}", query.q());
        get_json(&url, self.timeout)
    }

    fn fetch_page(&self, url: &str) -> Result<SearchResponse, CmsError> {
        if !is_trusted_cursor(&self.endpoint, url) {
            return Err(CmsError::ForeignCursor(strip_query(url).to_string()));
        }
        tracing::debug!("Following cursor {}", strip_query(url));
        get_json(&self.cursor_url(url), self.timeout)
    }
}

/// GET a URL and decode its JSON body
fn get_json<T: DeserializeOwned>(url: &str, timeout: Duration) -> Result<T, CmsError> {
    let response = attohttpc::get(url)
        .header("Accept", "application/json")
        .timeout(timeout)
        .send()?;

    if !response.is_success() {
        return Err(CmsError::Status {
            status: response.status().as_u16(),
            url: strip_query(url).to_string(),
        });
    }

    let text = response.text()?;
    Ok(serde_json::from_str(&text)?)
}

/// Drop the query string so tokens never reach logs or error messages
fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::Predicate;

    fn client(token: Option<&str>) -> PrismicClient {
        PrismicClient {
            endpoint: "https://blog.cdn.prismic.io/api/v2".to_string(),
            access_token: token.map(str::to_string),
            master_ref: "YH2eBBIAACMAl2Bx".to_string(),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_search_url() {
        let query = Query::new()
            .predicate(Predicate::document_type("posts"))
            .page_size(2);
        assert_eq!(
            client(None).search_url(&query),
            "https://blog.cdn.prismic.io/api/v2/documents/search?ref=YH2eBBIAACMAl2Bx\
             &q=%5B%5Bat%28document%2Etype%2C%22posts%22%29%5D%5D&pageSize=2"
        );
    }

    #[test]
    fn test_search_url_with_token() {
        let url = client(Some("secret")).search_url(&Query::new());
        assert!(url.ends_with("&access_token=secret"));
    }

    #[test]
    fn test_fetch_page_rejects_foreign_cursor() {
        let err = client(None)
            .fetch_page("https://evil.example.com/steal?token=1")
            .unwrap_err();
        match err {
            CmsError::ForeignCursor(url) => assert_eq!(url, "https://evil.example.com/steal"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cursor_url_uses_own_token() {
        let cursor = "https://blog.cdn.prismic.io/api/v2/documents/search?ref=R&page=2";
        assert_eq!(
            client(Some("secret")).cursor_url(cursor),
            format!("{}&access_token=secret", cursor)
        );
        assert_eq!(client(None).cursor_url(cursor), cursor);
        assert_eq!(
            client(None).cursor_url(&format!("{}&access_token=stale", cursor)),
            cursor
        );
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("https://a.b/c?access_token=x"), "https://a.b/c");
        assert_eq!(strip_query("https://a.b/c"), "https://a.b/c");
    }
}
