//! Detail flow: which posts to pre-render, and fetching a single post

use super::post::{paths_query, PostDetail, PostDetailData};
use super::richtext::LinkResolver;
use crate::cms::{self, CmsError, ContentSource};
use crate::config::SiteConfig;

/// Slugs to pre-render at generation time
///
/// Only the first page of the path query is used; every other post is
/// generated on its first request.
pub fn static_paths(
    source: &dyn ContentSource,
    config: &SiteConfig,
) -> Result<Vec<String>, CmsError> {
    let response = cms::query::<serde_json::Value>(source, &paths_query(config))?;

    let slugs = response
        .results
        .into_iter()
        .filter_map(|doc| {
            if doc.uid.is_none() {
                tracing::warn!("Skipping post {} without uid", doc.id);
            }
            doc.uid
        })
        .collect();

    Ok(slugs)
}

/// Fetch a post by slug with its sections rendered to HTML
pub fn fetch_post(
    source: &dyn ContentSource,
    config: &SiteConfig,
    slug: &str,
) -> Result<PostDetail, CmsError> {
    let doc = cms::get_by_uid::<PostDetailData>(source, &config.document_type, slug)?;
    Ok(PostDetail::from_document(doc, &LinkResolver::new(config)))
}
