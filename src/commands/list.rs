//! List the posts available in the content API

use anyhow::Result;

use crate::cms::{self, ContentSource};
use crate::content::{display_date, summary_query, Listing, PostSummaryData};
use crate::helpers::DateFormatter;
use crate::Blog;

/// Print every post, following the listing cursor to the last page
pub fn run(blog: &Blog) -> Result<()> {
    let client = blog.connect()?;
    for line in post_lines(blog, &client)? {
        println!("{}", line);
    }
    Ok(())
}

/// One line per post: date, title and slug
pub fn post_lines(blog: &Blog, source: &dyn ContentSource) -> Result<Vec<String>> {
    let config = &blog.config;
    let formatter = DateFormatter::new(config.timezone()?);

    let first = cms::query::<PostSummaryData>(source, &summary_query(config))?;
    let mut listing = Listing::seed(first.into());
    listing.load_all(source)?;

    let posts = listing.into_posts();
    let mut lines = Vec::with_capacity(posts.len() + 1);
    lines.push(format!("Posts ({}):", posts.len()));
    for post in posts {
        let date = display_date(
            post.first_publication_date.as_deref(),
            &config.date_format,
            &formatter,
        );
        lines.push(format!("  {} - {} [{}]", date, post.data.title, post.slug));
    }

    Ok(lines)
}
