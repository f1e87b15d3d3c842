//! Generator module - renders the listing and post pages to static HTML

use anyhow::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tera::Context;
use walkdir::WalkDir;

use crate::cms::{self, ContentSource};
use crate::content::detail::{fetch_post, static_paths};
use crate::content::{summary_query, Listing, PostDetail, PostSummaryData, PostView};
use crate::helpers::{is_safe_slug, load_more_url, DateFormatter};
use crate::templates::{ConfigData, TemplateRenderer};
use crate::Blog;

/// Summary of a generation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    /// Posts on the generated listing page
    pub listed: usize,
    /// Slugs pre-rendered as post pages
    pub rendered: Vec<String>,
}

/// Static site generator using Tera templates
pub struct Generator {
    blog: Blog,
    renderer: TemplateRenderer,
    formatter: DateFormatter,
    config_data: ConfigData,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        let formatter = DateFormatter::new(blog.config.timezone()?);
        let renderer = TemplateRenderer::new(formatter)?;

        Ok(Self {
            blog: blog.clone(),
            renderer,
            formatter,
            config_data: ConfigData::new(&blog.config),
        })
    }

    pub fn formatter(&self) -> &DateFormatter {
        &self.formatter
    }

    /// Generate the entire site
    pub fn generate(&self, source: &dyn ContentSource) -> Result<GenerateReport> {
        fs::create_dir_all(&self.blog.public_dir)?;

        self.copy_static_assets()?;

        let listed = self.generate_index(source)?;
        let rendered = self.generate_post_pages(source)?;
        self.generate_not_found()?;

        Ok(GenerateReport { listed, rendered })
    }

    /// Create a base context with common variables
    fn create_base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("config", &self.config_data);
        context.insert("page_description", "");
        context
    }

    /// Generate the listing page from the first page of posts
    fn generate_index(&self, source: &dyn ContentSource) -> Result<usize> {
        let response = cms::query::<PostSummaryData>(source, &summary_query(&self.blog.config))?;
        let listing =
            Listing::seed(response.into()).with_max_pages(self.blog.config.max_listing_pages);

        let html = self.render_index(&listing)?;
        let output_path = self.blog.public_dir.join("index.html");
        write_page(&output_path, &html)?;

        tracing::info!(
            "Generated listing with {} posts (more: {})",
            listing.posts().len(),
            listing.has_more()
        );
        Ok(listing.posts().len())
    }

    /// Render the listing page for the posts loaded so far
    pub fn render_index(&self, listing: &Listing) -> Result<String> {
        let config = &self.blog.config;
        let posts: Vec<PostView> = listing
            .posts()
            .iter()
            .map(|post| PostView::new(post, config, &self.formatter))
            .collect();

        // The load-more button is only rendered when a page can follow
        let next_page = listing
            .next_page()
            .filter(|_| listing.has_more())
            .map(|cursor| load_more_url(config, cursor, listing.pages()));

        let mut context = self.create_base_context();
        context.insert("posts", &posts);
        context.insert("next_page", &next_page);

        self.renderer.render("index.html", &context)
    }

    /// Pre-render the posts returned by the path query
    fn generate_post_pages(&self, source: &dyn ContentSource) -> Result<Vec<String>> {
        let slugs = static_paths(source, &self.blog.config)?;

        for slug in &slugs {
            if !is_safe_slug(slug) {
                tracing::warn!("Skipping post with unsafe slug {:?}", slug);
                continue;
            }
            let post = fetch_post(source, &self.blog.config, slug)?;
            self.write_post(&post)?;
        }

        Ok(slugs.into_iter().filter(|s| is_safe_slug(s)).collect())
    }

    /// Generate a single post page on demand
    ///
    /// Returns `None` when the content API has no post with this slug.
    pub fn render_post(&self, source: &dyn ContentSource, slug: &str) -> Result<Option<PathBuf>> {
        if !is_safe_slug(slug) {
            return Ok(None);
        }

        match fetch_post(source, &self.blog.config, slug) {
            Ok(post) => Ok(Some(self.write_post(&post)?)),
            Err(e) if e.is_not_found() => {
                tracing::debug!("No post with slug {:?}", slug);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Render a post to HTML
    pub fn render_post_html(&self, post: &PostDetail) -> Result<String> {
        let mut context = self.create_base_context();
        context.insert("post", post);
        context.insert("page_description", &post.excerpt);

        self.renderer.render("post.html", &context)
    }

    fn write_post(&self, post: &PostDetail) -> Result<PathBuf> {
        let html = self.render_post_html(post)?;
        let output_path = self.post_output_path(&post.slug);
        write_page(&output_path, &html)?;

        tracing::debug!(
            "Generated: {:?} ({} sections)",
            output_path,
            post.data.content.len()
        );
        Ok(output_path)
    }

    /// Where a post page is written
    pub fn post_output_path(&self, slug: &str) -> PathBuf {
        self.blog
            .public_dir
            .join("post")
            .join(slug)
            .join("index.html")
    }

    /// Render the not-found page
    pub fn render_not_found(&self) -> Result<String> {
        self.renderer
            .render("not_found.html", &self.create_base_context())
    }

    fn generate_not_found(&self) -> Result<()> {
        let html = self.render_not_found()?;
        write_page(&self.blog.public_dir.join("404.html"), &html)
    }

    /// Copy static assets into the public directory
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = &self.blog.static_dir;
        if !static_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            if path.is_file() {
                let relative = path.strip_prefix(static_dir)?;
                let dest = self.blog.public_dir.join(relative);

                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }

                fs::copy(path, &dest)?;
            }
        }

        Ok(())
    }
}

/// Write a page so readers only ever see the old file or the complete new one
fn write_page(path: &Path, html: &str) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(html.as_bytes())?;
    file.persist(path)?;

    tracing::debug!("Generated: {:?}", path);
    Ok(())
}
