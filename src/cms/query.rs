//! Search queries and predicates

use std::fmt;

/// A search predicate, rendered in the content API's bracket syntax
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `[at(path,"value")]`
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::At {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Match documents of a custom type
    pub fn document_type(doc_type: &str) -> Self {
        Self::at("document.type", doc_type)
    }

    /// Match a document of `doc_type` by its uid
    pub fn uid(doc_type: &str, uid: &str) -> Self {
        Self::at(format!("my.{}.uid", doc_type), uid)
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At { path, value } => write!(f, "[at({},{})]", path, quote(value)),
        }
    }
}

/// A `documents/search` query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    pub fetch: Vec<String>,
    pub page_size: Option<usize>,
    pub page: Option<usize>,
    pub orderings: Vec<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Restrict the returned fields, e.g. `posts.title`
    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    /// Order by a field, e.g. `document.first_publication_date desc`
    pub fn order_by(mut self, ordering: impl Into<String>) -> Self {
        self.orderings.push(ordering.into());
        self
    }

    /// The `q` parameter: every predicate inside one outer bracket pair
    pub fn q(&self) -> Option<String> {
        if self.predicates.is_empty() {
            return None;
        }
        let inner: String = self.predicates.iter().map(|p| p.to_string()).collect();
        Some(format!("[{}]", inner))
    }

    /// Query string parameters, unencoded
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if let Some(q) = self.q() {
            params.push(("q", q));
        }
        if !self.fetch.is_empty() {
            params.push(("fetch", self.fetch.join(",")));
        }
        if let Some(page_size) = self.page_size {
            params.push(("pageSize", page_size.to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if !self.orderings.is_empty() {
            params.push(("orderings", format!("[{}]", self.orderings.join(","))));
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_display() {
        assert_eq!(
            Predicate::document_type("posts").to_string(),
            r#"[at(document.type,"posts")]"#
        );
        assert_eq!(
            Predicate::uid("posts", "hello").to_string(),
            r#"[at(my.posts.uid,"hello")]"#
        );
        assert_eq!(
            Predicate::at("my.posts.title", r#"say "hi""#).to_string(),
            r#"[at(my.posts.title,"say \"hi\"")]"#
        );
    }

    #[test]
    fn test_query_params() {
        let query = Query::new()
            .predicate(Predicate::document_type("posts"))
            .fetch(["posts.title", "posts.author"])
            .page_size(1)
            .order_by("document.first_publication_date desc");

        assert_eq!(
            query.to_params(),
            vec![
                ("q", r#"[[at(document.type,"posts")]]"#.to_string()),
                ("fetch", "posts.title,posts.author".to_string()),
                ("pageSize", "1".to_string()),
                (
                    "orderings",
                    "[document.first_publication_date desc]".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_empty_query_has_no_q() {
        assert_eq!(Query::new().q(), None);
        assert!(Query::new().to_params().is_empty());
    }
}
