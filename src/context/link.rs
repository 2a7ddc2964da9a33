//! RFC 5988 `Link` header for paginated responses.

use axum::http::{header, HeaderValue, Request};
use bytes::Bytes;
use url::{form_urlencoded, Position, Url};

use crate::context::Context;
use crate::http::HttpError;

const PAGE: &str = "page";

/// Page numbers used to build a pagination `Link` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Link {
    pub first: u64,
    pub current: u64,
    pub last: u64,
    /// Base path or absolute URL; defaults to the request path.
    pub path: Option<String>,
}

impl Link {
    pub fn new(first: u64, current: u64, last: u64) -> Self {
        Self {
            first,
            current,
            last,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Header value for `request`: first, current, next, prev, last.
    ///
    /// `next` appears only when `current < last`, `prev` only when
    /// `current > first`.
    pub fn render(&self, request: &Request<Bytes>) -> String {
        let (base, pairs) = self.target(request);

        let mut links = Vec::with_capacity(5);
        links.push(entry(&base, &pairs, self.first, "first"));
        links.push(entry(&base, &pairs, self.current, "current"));
        if self.current < self.last {
            links.push(entry(&base, &pairs, self.current + 1, "next"));
        }
        if self.current > self.first {
            links.push(entry(&base, &pairs, self.current - 1, "prev"));
        }
        links.push(entry(&base, &pairs, self.last, "last"));

        links.join(", ")
    }

    /// Base URL without query, and the query pairs to carry over.
    fn target(&self, request: &Request<Bytes>) -> (String, Vec<(String, String)>) {
        if let Some(path) = self.path.as_deref().filter(|p| is_absolute(p)) {
            if let Ok(url) = Url::parse(path) {
                let pairs = url.query_pairs().into_owned().collect();
                return (url[..Position::AfterPath].to_string(), pairs);
            }
        }

        let uri = request.uri();
        let (path, query) = match self.path.as_deref() {
            Some(supplied) => match supplied.split_once('?') {
                Some((path, query)) => (path, Some(query)),
                None => (supplied, uri.query()),
            },
            None => (uri.path(), uri.query()),
        };

        let origin = match (uri.scheme_str(), uri.authority()) {
            (Some(scheme), Some(authority)) => format!("{scheme}://{authority}"),
            (None, Some(authority)) => format!("http://{authority}"),
            _ => request
                .headers()
                .get(header::HOST)
                .and_then(|h| h.to_str().ok())
                .map(|host| format!("http://{host}"))
                .unwrap_or_default(),
        };

        let pairs = query
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        let separator = if path.starts_with('/') { "" } else { "/" };
        (format!("{origin}{separator}{path}"), pairs)
    }
}

fn is_absolute(path: &str) -> bool {
    let lower = path.get(..6).unwrap_or(path).to_ascii_lowercase();
    lower.starts_with("http:") || lower.starts_with("https:")
}

/// `<url>; rel="name"` with the `page` parameter overwritten in place.
fn entry(base: &str, pairs: &[(String, String)], page: u64, rel: &str) -> String {
    let page = page.to_string();
    let mut replaced = false;
    let mut query = form_urlencoded::Serializer::new(String::new());

    for (key, value) in pairs {
        if key == PAGE {
            if !replaced {
                query.append_pair(key, &page);
                replaced = true;
            }
        } else {
            query.append_pair(key, value);
        }
    }
    if !replaced {
        query.append_pair(PAGE, &page);
    }

    format!("<{base}?{}>; rel=\"{rel}\"", query.finish())
}

impl Context {
    /// Set the `Link` header on the response.
    pub fn set_link_header(&mut self, link: &Link) -> Result<&mut Self, HttpError> {
        let value = link.render(self.request()?);
        let value = HeaderValue::from_str(&value)
            .map_err(|e| HttpError::internal(format!("invalid link header: {e}")))?;
        self.set_header(header::LINK, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Exchange;

    fn request(uri: &str) -> Request<Bytes> {
        Request::builder()
            .uri(uri)
            .header(header::HOST, "example.com")
            .body(Bytes::new())
            .unwrap()
    }

    fn rels(value: &str) -> Vec<(String, String)> {
        value
            .split(", ")
            .map(|part| {
                let (url, rel) = part.split_once("; rel=").unwrap();
                (
                    rel.trim_matches('"').to_string(),
                    url.trim_matches(|c| c == '<' || c == '>').to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn middle_page_has_all_relations() {
        let value = Link::new(1, 3, 5).render(&request("/items?page=3&size=10"));

        assert_eq!(
            rels(&value),
            vec![
                ("first".into(), "http://example.com/items?page=1&size=10".into()),
                ("current".into(), "http://example.com/items?page=3&size=10".into()),
                ("next".into(), "http://example.com/items?page=4&size=10".into()),
                ("prev".into(), "http://example.com/items?page=2&size=10".into()),
                ("last".into(), "http://example.com/items?page=5&size=10".into()),
            ]
        );
    }

    #[test]
    fn single_page_has_no_prev_or_next() {
        let value = Link::new(1, 1, 1).render(&request("/items"));
        let rels = rels(&value);

        let names: Vec<_> = rels.iter().map(|(rel, _)| rel.as_str()).collect();
        assert_eq!(names, ["first", "current", "last"]);
        assert!(rels.iter().all(|(_, url)| url == "http://example.com/items?page=1"));
    }

    #[test]
    fn explicit_relative_path_keeps_request_query() {
        let link = Link::new(1, 2, 2).with_path("/other");
        let value = link.render(&request("/items?filter=x"));

        assert!(value.starts_with("<http://example.com/other?filter=x&page=1>; rel=\"first\""));
        assert!(value.contains("<http://example.com/other?filter=x&page=1>; rel=\"prev\""));
        assert!(!value.contains("rel=\"next\""));
    }

    #[test]
    fn path_without_leading_slash_is_rooted() {
        let link = Link::new(1, 1, 1).with_path("other");
        let value = link.render(&request("/items/list?page=2"));

        assert!(rels(&value)
            .iter()
            .all(|(_, url)| url == "http://example.com/other?page=1"));
    }

    #[test]
    fn absolute_path_is_used_verbatim() {
        let link = Link::new(1, 1, 2).with_path("https://api.example.org/v1/items?page=9&sort=asc");
        let value = link.render(&request("/ignored?x=1"));

        assert_eq!(
            rels(&value)[0],
            ("first".into(), "https://api.example.org/v1/items?page=1&sort=asc".into())
        );
        assert!(!value.contains("x=1"));
    }

    #[test]
    fn context_sets_header() {
        let mut ctx = Context::standalone(Exchange::new(request("/items")));
        ctx.set_link_header(&Link::new(1, 1, 3)).unwrap();

        let ex = ctx.exchange().unwrap();
        let value = ex.response().headers()[header::LINK].to_str().unwrap();
        assert!(value.contains("rel=\"next\""));
    }
}
