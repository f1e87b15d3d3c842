//! Rich text to HTML conversion
//!
//! The content API stores rich text as a list of blocks, each with plain text
//! and a list of spans (`strong`, `em`, `hyperlink`, `label`) addressed by
//! UTF-16 offsets into that text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SiteConfig;
use crate::helpers::{html_escape, post_path};

/// A rich text field
pub type RichText = Vec<Block>;

/// A rich text block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    #[serde(rename = "heading1")]
    Heading1(TextBlock),
    #[serde(rename = "heading2")]
    Heading2(TextBlock),
    #[serde(rename = "heading3")]
    Heading3(TextBlock),
    #[serde(rename = "heading4")]
    Heading4(TextBlock),
    #[serde(rename = "heading5")]
    Heading5(TextBlock),
    #[serde(rename = "heading6")]
    Heading6(TextBlock),
    #[serde(rename = "paragraph")]
    Paragraph(TextBlock),
    #[serde(rename = "preformatted")]
    Preformatted(TextBlock),
    #[serde(rename = "list-item")]
    ListItem(TextBlock),
    #[serde(rename = "o-list-item")]
    OrderedListItem(TextBlock),
    #[serde(rename = "image")]
    Image(ImageBlock),
    #[serde(rename = "embed")]
    Embed(EmbedBlock),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(rename = "linkTo", default)]
    pub link_to: Option<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedBlock {
    pub oembed: OEmbed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OEmbed {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
}

/// A formatting span over `[start, end)` of a block's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// A link target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "link_type")]
pub enum Link {
    Web {
        url: String,
        #[serde(default)]
        target: Option<String>,
    },
    Document {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        uid: Option<String>,
        #[serde(rename = "type", default)]
        doc_type: Option<String>,
        #[serde(rename = "isBroken", default)]
        is_broken: bool,
    },
    Media {
        url: String,
        #[serde(default)]
        name: Option<String>,
    },
    #[serde(other)]
    Any,
}

/// Maps links to documents onto site URLs
#[derive(Debug, Clone)]
pub struct LinkResolver {
    root: String,
    post_type: String,
}

impl LinkResolver {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            root: config.root.clone(),
            post_type: config.document_type.clone(),
        }
    }

    /// Resolve a link; `None` for empty or broken links
    pub fn resolve(&self, link: &Link) -> Option<String> {
        match link {
            Link::Web { url, .. } | Link::Media { url, .. } => Some(url.clone()),
            Link::Document {
                uid,
                doc_type,
                is_broken,
                ..
            } => {
                if *is_broken {
                    return None;
                }
                let root = self.root.trim_end_matches('/');
                match (doc_type.as_deref(), uid.as_deref()) {
                    (Some(t), Some(uid)) if t == self.post_type => {
                        Some(format!("{}{}", root, post_path(uid)))
                    }
                    _ => Some(format!("{}/", root)),
                }
            }
            Link::Any => None,
        }
    }
}

impl Default for LinkResolver {
    fn default() -> Self {
        Self::new(&SiteConfig::default())
    }
}

/// Render a rich text field as HTML
pub fn as_html(blocks: &[Block], resolver: &LinkResolver) -> String {
    let mut html = String::new();
    let mut i = 0;

    while i < blocks.len() {
        match &blocks[i] {
            Block::ListItem(_) | Block::OrderedListItem(_) => {
                let ordered = matches!(blocks[i], Block::OrderedListItem(_));
                let tag = if ordered { "ol" } else { "ul" };
                html.push_str(&format!("<{}>", tag));
                while let Some(item) = blocks.get(i).and_then(|b| list_item(b, ordered)) {
                    html.push_str(&text_element("li", item, resolver));
                    i += 1;
                }
                html.push_str(&format!("</{}>", tag));
                continue;
            }
            block => html.push_str(&block_html(block, resolver)),
        }
        i += 1;
    }

    html
}

/// The plain text of a rich text field, blocks joined by spaces
pub fn as_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter_map(|block| match block {
            Block::Heading1(t)
            | Block::Heading2(t)
            | Block::Heading3(t)
            | Block::Heading4(t)
            | Block::Heading5(t)
            | Block::Heading6(t)
            | Block::Paragraph(t)
            | Block::Preformatted(t)
            | Block::ListItem(t)
            | Block::OrderedListItem(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn list_item(block: &Block, ordered: bool) -> Option<&TextBlock> {
    match (block, ordered) {
        (Block::ListItem(t), false) | (Block::OrderedListItem(t), true) => Some(t),
        _ => None,
    }
}

fn block_html(block: &Block, resolver: &LinkResolver) -> String {
    match block {
        Block::Heading1(t) => text_element("h1", t, resolver),
        Block::Heading2(t) => text_element("h2", t, resolver),
        Block::Heading3(t) => text_element("h3", t, resolver),
        Block::Heading4(t) => text_element("h4", t, resolver),
        Block::Heading5(t) => text_element("h5", t, resolver),
        Block::Heading6(t) => text_element("h6", t, resolver),
        Block::Paragraph(t) => text_element("p", t, resolver),
        Block::Preformatted(t) => format!(
            "<pre{}>{}</pre>",
            class_attr(t.label.as_deref()),
            spans_html(&t.text, &t.spans, "\n", resolver)
        ),
        Block::ListItem(t) | Block::OrderedListItem(t) => text_element("li", t, resolver),
        Block::Image(image) => image_html(image, resolver),
        Block::Embed(embed) => embed_html(&embed.oembed),
        Block::Unknown => {
            tracing::debug!("Skipping unknown rich text block");
            String::new()
        }
    }
}

fn class_attr(label: Option<&str>) -> String {
    label
        .map(|l| format!(r#" class="{}""#, html_escape(l)))
        .unwrap_or_default()
}

fn text_element(tag: &str, block: &TextBlock, resolver: &LinkResolver) -> String {
    format!(
        "<{tag}{}>{}</{tag}>",
        class_attr(block.label.as_deref()),
        spans_html(&block.text, &block.spans, "<br />", resolver),
    )
}

fn image_html(image: &ImageBlock, resolver: &LinkResolver) -> String {
    let mut img = format!(
        r#"<img src="{}" alt="{}""#,
        html_escape(&image.url),
        html_escape(image.alt.as_deref().unwrap_or(""))
    );
    if let Some(copyright) = &image.copyright {
        img.push_str(&format!(r#" copyright="{}""#, html_escape(copyright)));
    }
    img.push_str(" />");

    match image.link_to.as_ref().and_then(|l| resolver.resolve(l)) {
        Some(href) => format!(
            r#"<p class="block-img"><a href="{}">{}</a></p>"#,
            html_escape(&href),
            img
        ),
        None => format!(r#"<p class="block-img">{}</p>"#, img),
    }
}

fn embed_html(oembed: &OEmbed) -> String {
    let attr = |name: &str, value: &Option<String>| {
        value
            .as_ref()
            .map(|v| format!(r#" {}="{}""#, name, html_escape(v)))
            .unwrap_or_default()
    };
    format!(
        "<div{}{}{}>{}</div>",
        attr("data-oembed", &oembed.embed_url),
        attr("data-oembed-type", &oembed.kind),
        attr("data-oembed-provider", &oembed.provider_name),
        oembed.html.as_deref().unwrap_or("")
    )
}

fn open_tag(span: &Span, resolver: &LinkResolver) -> String {
    match span.kind.as_str() {
        "strong" => "<strong>".to_string(),
        "em" => "<em>".to_string(),
        "label" => {
            let label = span
                .data
                .as_ref()
                .and_then(|d| d.get("label"))
                .and_then(|l| l.as_str())
                .unwrap_or("");
            format!(r#"<span class="{}">"#, html_escape(label))
        }
        _ => {
            let link: Option<Link> = span
                .data
                .clone()
                .and_then(|d| serde_json::from_value(d).ok());
            let target = match &link {
                Some(Link::Web {
                    target: Some(target),
                    ..
                }) => format!(
                    r#" target="{}" rel="noopener""#,
                    html_escape(target)
                ),
                _ => String::new(),
            };
            let href = link.and_then(|l| resolver.resolve(&l)).unwrap_or_default();
            format!(r#"<a href="{}"{}>"#, html_escape(&href), target)
        }
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        "label" => "</span>",
        _ => "</a>",
    }
}

fn is_known_span(span: &Span) -> bool {
    let known = matches!(span.kind.as_str(), "strong" | "em" | "hyperlink" | "label");
    if !known {
        tracing::debug!("Skipping unknown span type {:?}", span.kind);
    }
    known && span.start < span.end
}

/// Render text with spans applied, writing `line_break` for each newline
///
/// Spans may overlap without nesting; a span that has to close while others
/// opened after it are still open closes them first and reopens them after.
fn spans_html(text: &str, spans: &[Span], line_break: &str, resolver: &LinkResolver) -> String {
    let mut spans: Vec<&Span> = spans.iter().filter(|s| is_known_span(s)).collect();
    // Outer spans first: earlier start, then longer
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut open: Vec<&Span> = Vec::new();
    let mut next = 0;
    // Offsets are UTF-16 code units
    let mut pos = 0usize;

    for ch in text.chars() {
        close_ended(&mut out, &mut open, pos, resolver);
        while next < spans.len() && spans[next].start <= pos {
            if spans[next].end > pos {
                out.push_str(&open_tag(spans[next], resolver));
                open.push(spans[next]);
            }
            next += 1;
        }

        match ch {
            '\n' => out.push_str(line_break),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
        pos += ch.len_utf16();
    }

    while let Some(span) = open.pop() {
        out.push_str(close_tag(span));
    }

    out
}

fn close_ended<'a>(
    out: &mut String,
    open: &mut Vec<&'a Span>,
    pos: usize,
    resolver: &LinkResolver,
) {
    let Some(first_ended) = open.iter().position(|s| s.end <= pos) else {
        return;
    };

    let mut reopen = Vec::new();
    while open.len() > first_ended {
        if let Some(span) = open.pop() {
            out.push_str(close_tag(span));
            if span.end > pos {
                reopen.push(span);
            }
        }
    }
    for span in reopen.into_iter().rev() {
        out.push_str(&open_tag(span, resolver));
        open.push(span);
    }
}
