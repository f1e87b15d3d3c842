//! Blog server: static output plus on-demand post pages and listing pages

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::cms::{self, CmsError, ContentSource};
use crate::content::{Listing, PostView};
use crate::generator::Generator;
use crate::helpers::{is_safe_slug, load_more_url};
use crate::Blog;

/// Server state
pub struct ServerState {
    blog: Blog,
    generator: Generator,
    source: Arc<dyn ContentSource>,
    /// One lock per slug being generated on demand
    generating: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ServerState {
    pub fn new(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            generator: Generator::new(blog)?,
            source,
            generating: Mutex::new(HashMap::new()),
        })
    }

    async fn is_generating(&self, slug: &str) -> bool {
        self.generating.lock().await.contains_key(slug)
    }

    async fn slug_lock(&self, slug: &str) -> Arc<Mutex<()>> {
        let mut locks = self.generating.lock().await;
        locks.entry(slug.to_string()).or_default().clone()
    }

    async fn release_slug_lock(&self, slug: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.generating.lock().await;
        // Map entry plus ours: nobody else is waiting
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(slug);
        }
    }
}

/// Errors returned by the request handlers
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Cms(#[from] CmsError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Cms(CmsError::ForeignCursor(_)) => StatusCode::BAD_REQUEST,
            Self::Cms(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(e) if e.downcast_ref::<CmsError>().is_some() => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {:#}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

/// Query string of `/api/posts`
#[derive(Debug, Deserialize)]
pub struct PostsParams {
    pub cursor: String,
    /// Listing pages the viewer already has
    #[serde(default = "first_page")]
    pub loaded: usize,
}

fn first_page() -> usize {
    1
}

/// One page of summaries for the listing's load-more button
#[derive(Debug, Serialize, PartialEq)]
pub struct PostsPage {
    pub results: Vec<PostView>,
    pub next_page: Option<String>,
}

/// Build the router
pub fn router(state: Arc<ServerState>) -> Router {
    let public_dir = state.blog.public_dir.clone();
    let static_files = ServeDir::new(&public_dir)
        .not_found_service(ServeFile::new(public_dir.join("404.html")));

    Router::new()
        .route("/api/posts", get(posts_handler))
        .route("/post/:slug", get(post_handler))
        .route("/post/:slug/", get(post_handler))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the blog server
pub async fn start(blog: &Blog, source: Arc<dyn ContentSource>, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(ServerState::new(blog, source)?);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn posts_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<PostsParams>,
) -> Result<Json<PostsPage>, ServerError> {
    Ok(Json(load_posts(state, params).await?))
}

/// Follow a listing cursor on behalf of the browser
pub async fn load_posts(
    state: Arc<ServerState>,
    params: PostsParams,
) -> Result<PostsPage, ServerError> {
    if !cms::is_trusted_cursor(state.source.endpoint(), &params.cursor) {
        return Err(CmsError::ForeignCursor(params.cursor).into());
    }

    let page = tokio::task::spawn_blocking(move || {
        let config = &state.blog.config;
        let mut listing = Listing::resume(params.cursor, params.loaded.max(1))
            .with_max_pages(config.max_listing_pages);
        listing.load_more(state.source.as_ref())?;

        let results = listing
            .posts()
            .iter()
            .map(|post| PostView::new(post, config, state.generator.formatter()))
            .collect();
        let next_page = listing
            .next_page()
            .filter(|_| listing.has_more())
            .map(|cursor| load_more_url(config, cursor, listing.pages()));

        Ok::<_, CmsError>(PostsPage { results, next_page })
    })
    .await
    .map_err(anyhow::Error::from)??;

    Ok(page)
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    match serve_post(&state, slug).await {
        Ok(Some(html)) => Html(html).into_response(),
        Ok(None) => not_found(&state).await,
        Err(e) => e.into_response(),
    }
}

/// HTML of a post page, generating it on first request
///
/// Concurrent first requests for one slug generate the page once. While a
/// generation is running, readers wait for it instead of reading the file.
pub async fn serve_post(
    state: &Arc<ServerState>,
    slug: String,
) -> Result<Option<String>, ServerError> {
    if !is_safe_slug(&slug) {
        return Ok(None);
    }

    let path = state.generator.post_output_path(&slug);
    if !state.is_generating(&slug).await {
        if let Ok(html) = tokio::fs::read_to_string(&path).await {
            return Ok(Some(html));
        }
    }

    let lock = state.slug_lock(&slug).await;
    let guard = lock.lock().await;

    // Generated by another request while we waited
    let result = if let Ok(html) = tokio::fs::read_to_string(&path).await {
        Ok(Some(html))
    } else {
        generate_post(state, slug.clone()).await
    };

    drop(guard);
    state.release_slug_lock(&slug, lock).await;
    result
}

async fn generate_post(
    state: &Arc<ServerState>,
    slug: String,
) -> Result<Option<String>, ServerError> {
    tracing::info!("Generating post {:?} on demand", slug);

    let worker = Arc::clone(state);
    let rendered = tokio::task::spawn_blocking(move || {
        worker
            .generator
            .render_post(worker.source.as_ref(), &slug)
    })
    .await
    .map_err(anyhow::Error::from)??;

    match rendered {
        Some(path) => {
            let html = tokio::fs::read_to_string(path)
                .await
                .map_err(anyhow::Error::from)?;
            Ok(Some(html))
        }
        None => Ok(None),
    }
}

async fn not_found(state: &ServerState) -> Response {
    let path = state.blog.public_dir.join("404.html");
    let html = match tokio::fs::read_to_string(&path).await {
        Ok(html) => html,
        Err(_) => match state.generator.render_not_found() {
            Ok(html) => html,
            Err(e) => return ServerError::Internal(e).into_response(),
        },
    };
    (StatusCode::NOT_FOUND, Html(html)).into_response()
}
