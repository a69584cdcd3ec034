//! URL pattern language for routes.
//!
//! A pattern is an exact URL, or a path template whose `:name` segments
//! each match exactly one non-empty path segment. Patterns may carry a
//! scheme/host prefix and an explicit query string; both are optional.

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    /// `:name` placeholder. The name is kept for display only.
    Param(String),
}

/// Parsed form of a route's `request_url`.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlPattern {
    /// Lowercased `scheme://host[:port]` when the pattern is a full URL.
    scheme_host: Option<String>,
    segments: Vec<Segment>,
    /// Query string the pattern explicitly encodes, if any.
    query: Option<String>,
    empty: bool,
}

impl UrlPattern {
    /// Parse a pattern string. Parsing never fails; the empty pattern is
    /// representable but matches nothing.
    pub fn parse(pattern: &str) -> Self {
        if pattern.is_empty() {
            return Self {
                scheme_host: None,
                segments: Vec::new(),
                query: None,
                empty: true,
            };
        }

        let (scheme_host, path, query) = split_url(pattern);
        let segments = path
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                _ => Segment::Literal(segment.to_string()),
            })
            .collect();

        Self {
            scheme_host,
            segments,
            query: query.map(|q| q.to_string()),
            empty: false,
        }
    }

    /// Whether the pattern contains `:name` placeholders.
    pub fn is_templated(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Param(_)))
    }

    /// Match an observed URL against this pattern.
    ///
    /// Literal segments must match verbatim (case-sensitive); placeholders
    /// match any single non-empty segment. Scheme and host compare
    /// case-insensitively; a path-only pattern ignores the request's
    /// scheme/host entirely. The request's query string is ignored unless
    /// the pattern encodes one, in which case it must match exactly.
    pub fn matches(&self, url: &str) -> bool {
        if self.empty {
            return false;
        }

        let (scheme_host, path, query) = split_url(url);

        if let Some(ref want) = self.scheme_host {
            match scheme_host {
                Some(got) if got == *want => {}
                _ => return false,
            }
        }

        let observed: Vec<&str> = path.split('/').collect();
        if observed.len() != self.segments.len() {
            return false;
        }
        for (segment, got) in self.segments.iter().zip(&observed) {
            match segment {
                Segment::Literal(literal) => {
                    if *got != literal.as_str() {
                        return false;
                    }
                }
                Segment::Param(_) => {
                    if got.is_empty() {
                        return false;
                    }
                }
            }
        }

        match &self.query {
            Some(want) => query == Some(want.as_str()),
            None => true,
        }
    }
}

/// Split a URL or pattern into (lowercased scheme://host, path, query).
/// A missing path after a host is normalized to `/`.
fn split_url(url: &str) -> (Option<String>, &str, Option<&str>) {
    let (scheme_host, rest) = split_scheme_host(url);
    let (path, query) = match rest.find('?') {
        Some(i) => (&rest[..i], Some(&rest[i + 1..])),
        None => (rest, None),
    };
    let path = if path.is_empty() { "/" } else { path };
    (scheme_host, path, query)
}

fn split_scheme_host(url: &str) -> (Option<String>, &str) {
    let Some(pos) = url.find("://") else {
        return (None, url);
    };
    let scheme = &url[..pos];
    let valid_scheme = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid_scheme {
        return (None, url);
    }

    let after = &url[pos + 3..];
    match after.find(['/', '?']) {
        Some(i) => {
            let boundary = pos + 3 + i;
            (Some(url[..boundary].to_ascii_lowercase()), &url[boundary..])
        }
        None => (Some(url.to_ascii_lowercase()), ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_path() {
        let p = UrlPattern::parse("/api/users");
        assert!(!p.is_templated());
        assert!(p.matches("/api/users"));
        assert!(!p.matches("/api/users/1"));
        assert!(!p.matches("/api"));
    }

    #[test]
    fn test_path_is_case_sensitive() {
        let p = UrlPattern::parse("/api/Users");
        assert!(p.matches("/api/Users"));
        assert!(!p.matches("/api/users"));
    }

    #[test]
    fn test_template_segments() {
        let p = UrlPattern::parse("/api/user/:id");
        assert!(p.is_templated());
        assert!(p.matches("/api/user/42"));
        assert!(p.matches("/api/user/alice"));
        assert!(!p.matches("/api/user"));
        assert!(!p.matches("/api/user/42/posts"));
        // A placeholder never matches an empty segment
        assert!(!p.matches("/api/user/"));
    }

    #[test]
    fn test_multiple_placeholders() {
        let p = UrlPattern::parse("/repos/:owner/:name/issues/:number");
        assert!(p.matches("/repos/rust-lang/rust/issues/1"));
        assert!(!p.matches("/repos/rust-lang/rust/pulls/1"));
    }

    #[test]
    fn test_query_ignored_unless_pattern_encodes_one() {
        let p = UrlPattern::parse("/search");
        assert!(p.matches("/search"));
        assert!(p.matches("/search?q=abc"));

        let q = UrlPattern::parse("/search?q=abc");
        assert!(q.matches("/search?q=abc"));
        assert!(!q.matches("/search"));
        assert!(!q.matches("/search?q=def"));
    }

    #[test]
    fn test_scheme_and_host_case_insensitive() {
        let p = UrlPattern::parse("https://API.example.com/v1/ping");
        assert!(p.matches("https://api.example.com/v1/ping"));
        assert!(p.matches("HTTPS://api.EXAMPLE.com/v1/ping"));
        assert!(!p.matches("https://other.example.com/v1/ping"));
        // Path stays case-sensitive even in full-URL patterns
        assert!(!p.matches("https://api.example.com/V1/ping"));
    }

    #[test]
    fn test_path_only_pattern_ignores_request_host() {
        let p = UrlPattern::parse("/v1/ping");
        assert!(p.matches("https://api.example.com/v1/ping"));
        assert!(p.matches("/v1/ping"));
    }

    #[test]
    fn test_full_url_pattern_requires_host() {
        let p = UrlPattern::parse("https://api.example.com/v1/ping");
        assert!(!p.matches("/v1/ping"));
    }

    #[test]
    fn test_host_without_path() {
        let p = UrlPattern::parse("http://example.com");
        assert!(p.matches("http://example.com"));
        assert!(p.matches("http://EXAMPLE.com/"));
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        let p = UrlPattern::parse("");
        assert!(!p.matches(""));
        assert!(!p.matches("/"));
        assert!(!p.matches("/anything"));
    }

    #[test]
    fn test_scheme_inside_query_is_not_a_scheme() {
        let p = UrlPattern::parse("/redirect?to=http://x");
        assert!(p.matches("/redirect?to=http://x"));
        assert!(!p.matches("/redirect"));
    }
}
