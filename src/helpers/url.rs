//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS, NON_ALPHANUMERIC};

use crate::config::SiteConfig;

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/post/hello/") // -> "/blog/post/hello/"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Site-relative path of a post page (without root)
pub fn post_path(slug: &str) -> String {
    format!("/post/{}/", utf8_percent_encode(slug, SEGMENT))
}

/// Whether a slug can name a directory under the public dir
pub fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('.')
        && slug
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Site URL that follows a content API cursor on behalf of the listing page
///
/// `loaded` is the number of listing pages the viewer already has. Any access
/// token echoed in the cursor is dropped; the server adds its own.
pub fn load_more_url(config: &SiteConfig, cursor: &str, loaded: usize) -> String {
    format!(
        "{}?cursor={}&loaded={}",
        url_for(config, "/api/posts"),
        encode_query_value(&strip_query_param(cursor, "access_token")),
        loaded
    )
}

/// Remove every `name=...` pair from a URL's query string
pub fn strip_query_param(url: &str, name: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty() && pair.split('=').next() != Some(name))
        .collect();

    if kept.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, kept.join("&"))
    }
}

/// Encode a value for use in a query string
pub fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SiteConfig {
        SiteConfig {
            root: "/blog/".to_string(),
            ..SiteConfig::default()
        }
    }

    #[test]
    fn test_url_for() {
        let config = test_config();
        assert_eq!(url_for(&config, "/post/a/"), "/blog/post/a/");
        assert_eq!(url_for(&config, ""), "/blog/");
        assert_eq!(url_for(&SiteConfig::default(), "/api/posts"), "/api/posts");
    }

    #[test]
    fn test_post_path() {
        assert_eq!(post_path("como-utilizar-hooks"), "/post/como-utilizar-hooks/");
        assert_eq!(post_path("a b/c"), "/post/a%20b%2Fc/");
    }

    #[test]
    fn test_load_more_url() {
        assert_eq!(
            load_more_url(&test_config(), "https://a.io/s?page=2", 1),
            "/blog/api/posts?cursor=https%3A%2F%2Fa%2Eio%2Fs%3Fpage%3D2&loaded=1"
        );
    }

    #[test]
    fn test_load_more_url_drops_access_token() {
        let url = load_more_url(
            &SiteConfig::default(),
            "https://a.io/s?page=2&access_token=secret",
            1,
        );
        assert!(!url.contains("secret"));
        assert_eq!(url, "/api/posts?cursor=https%3A%2F%2Fa%2Eio%2Fs%3Fpage%3D2&loaded=1");
    }

    #[test]
    fn test_strip_query_param() {
        assert_eq!(
            strip_query_param("https://a.io/s?access_token=x&page=2", "access_token"),
            "https://a.io/s?page=2"
        );
        assert_eq!(
            strip_query_param("https://a.io/s?access_token=x", "access_token"),
            "https://a.io/s"
        );
        assert_eq!(strip_query_param("https://a.io/s", "access_token"), "https://a.io/s");
    }

    #[test]
    fn test_is_safe_slug() {
        assert!(is_safe_slug("como-utilizar-hooks"));
        assert!(is_safe_slug("versão_2.0"));
        assert!(!is_safe_slug(""));
        assert!(!is_safe_slug(".."));
        assert!(!is_safe_slug("../etc"));
        assert!(!is_safe_slug("a/b"));
        assert!(!is_safe_slug("a b"));
    }

    #[test]
    fn test_encode_query_value() {
        assert_eq!(
            encode_query_value("[[at(document.type,\"posts\")]]"),
            "%5B%5Bat%28document%2Etype%2C%22posts%22%29%5D%5D"
        );
    }
}
