//! Initialize a new blog

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::Blog;

const DEFAULT_CONFIG: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''

# URL
url: http://localhost:3000
root: /

# Directory
public_dir: public
static_dir: static

# Content API
## The access token can also be set with PRISMIC_ACCESS_TOKEN
api_endpoint: https://spacetraveling.cdn.prismic.io/api/v2
access_token:
document_type: posts
request_timeout_secs: 10

# Listing
listing_page_size: 1
max_listing_pages:
load_more_label: Carregar mais posts

# Detail pages
paths_page_size: 2
reading_time: 4 min

# Date / Time format
date_format: dd MMM y
timezone: UTC
"#;

const DEFAULT_STYLE: &str = r#"* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: #1a1d23; color: #d7d7d7; font-family: Inter, sans-serif; }
a { color: inherit; text-decoration: none; }
.app-container, .posts-container, .post-container { max-width: 720px; margin: 0 auto; padding: 0 1rem; }
.header { padding: 3rem 0 4rem; }
.logo { font-size: 1.5rem; font-weight: 700; color: #fff; }
.posts-container ul { list-style: none; }
.post { margin-bottom: 3rem; }
.post h2 { color: #fff; font-size: 1.75rem; }
.post-info { display: flex; gap: 1.5rem; margin-top: 1.5rem; font-size: 0.875rem; }
.banner { display: block; width: 100%; max-height: 400px; object-fit: cover; }
.post-container h1 { color: #fff; font-size: 3rem; margin-top: 5rem; }
.post-section { margin-top: 4rem; }
.post-section h2 { color: #fff; font-size: 2.25rem; }
.post-body { margin-top: 2rem; line-height: 1.6; }
.post-body p + p { margin-top: 1rem; }
#load-more { margin-bottom: 5rem; background: none; border: 0; color: #ff57b2; font-size: 1.125rem; font-weight: 600; cursor: pointer; }
#load-more:disabled { opacity: 0.6; cursor: progress; }
.load-more-error { color: #ff6b6b; }
"#;

/// Initialize a new blog in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("static/css"))?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        tracing::warn!("{:?} already exists, keeping it", config_path);
    } else {
        fs::write(&config_path, DEFAULT_CONFIG)?;
    }

    let style_path = target_dir.join("static/css/style.css");
    if !style_path.exists() {
        fs::write(&style_path, DEFAULT_STYLE)?;
    }

    Ok(())
}

/// Run the init command with an existing blog instance
pub fn run(blog: &Blog) -> Result<()> {
    init_site(&blog.base_dir)
}
