//! Generate static files

use anyhow::Result;

use crate::cms::ContentSource;
use crate::generator::{GenerateReport, Generator};
use crate::Blog;

/// Generate the static site from the configured content API
pub fn run(blog: &Blog) -> Result<()> {
    let client = blog.connect()?;
    run_with_source(blog, &client)?;
    Ok(())
}

/// Generate the static site from any content source
pub fn run_with_source(blog: &Blog, source: &dyn ContentSource) -> Result<GenerateReport> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog)?;
    let report = generator.generate(source)?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} listed posts and {} post pages in {:.2}s",
        report.listed,
        report.rendered.len(),
        duration.as_secs_f64()
    );

    Ok(report)
}
