//! Built-in blog templates using the Tera template engine
//!
//! Templates are embedded in the binary; there is no theme directory.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::display_date;
use crate::helpers::{html_escape, url_for, DateFormatter};

/// Template renderer with the embedded blog templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a renderer with all templates loaded
    pub fn new(formatter: DateFormatter) -> Result<Self> {
        let mut tera = Tera::default();

        // Autoescape everything; section bodies are marked `safe` in post.html
        tera.autoescape_on(vec![".html"]);
        tera.set_escape_fn(html_escape);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("blog/layout.html")),
            ("index.html", include_str!("blog/index.html")),
            ("post.html", include_str!("blog/post.html")),
            ("not_found.html", include_str!("blog/not_found.html")),
            (
                "partials/header.html",
                include_str!("blog/partials/header.html"),
            ),
            (
                "partials/post_summary.html",
                include_str!("blog/partials/post_summary.html"),
            ),
        ])?;

        tera.register_filter(
            "date_format",
            move |value: &tera::Value, args: &HashMap<String, tera::Value>| {
                date_format_filter(&formatter, value, args)
            },
        );

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: format a content API date with a date-fns pattern
///
/// `null` renders as an empty string.
fn date_format_filter(
    formatter: &DateFormatter,
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    if value.is_null() {
        return Ok(tera::Value::String(String::new()));
    }
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "dd MMM y".to_string(),
    };

    Ok(tera::Value::String(display_date(
        Some(&s),
        &format,
        formatter,
    )))
}

/// Site-wide values available to every template as `config`
#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub description: String,
    pub root: String,
    pub home: String,
    pub date_format: String,
    pub reading_time: String,
    pub load_more_label: String,
}

impl ConfigData {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            root: config.root.clone(),
            home: url_for(config, "/"),
            date_format: config.date_format.clone(),
            reading_time: config.reading_time.clone(),
            load_more_label: config.load_more_label.clone(),
        }
    }
}
