//! `X-Total-Count` and RFC 5988 `Link` headers for paged collections.

use axum::http::{HeaderMap, HeaderName, HeaderValue, header};

use crate::page::Page;

pub const X_TOTAL_COUNT: &str = "x-total-count";

fn page_uri(base_url: &str, page: u64, size: u64, query: Option<&str>) -> String {
    match query {
        Some(q) => format!(
            "{base_url}?page={page}&size={size}&query={}",
            urlencoding::encode(q)
        ),
        None => format!("{base_url}?page={page}&size={size}"),
    }
}

/// Build the `Link` header value: `next` and `prev` when they exist, then
/// `last` and `first`.
#[must_use]
pub fn link_header<T>(page: &Page<T>, base_url: &str, query: Option<&str>) -> String {
    let mut links = Vec::with_capacity(4);

    if !page.is_last() {
        links.push(format!(
            "<{}>; rel=\"next\"",
            page_uri(base_url, page.page + 1, page.size, query)
        ));
    }
    if !page.is_first() {
        links.push(format!(
            "<{}>; rel=\"prev\"",
            page_uri(base_url, page.page - 1, page.size, query)
        ));
    }

    let last_page = page.total_pages().saturating_sub(1);
    links.push(format!(
        "<{}>; rel=\"last\"",
        page_uri(base_url, last_page, page.size, query)
    ));
    links.push(format!(
        "<{}>; rel=\"first\"",
        page_uri(base_url, 0, page.size, query)
    ));

    links.join(",")
}

/// Pagination headers for a listing (`query = None`) or a search result.
#[must_use]
pub fn pagination_headers<T>(page: &Page<T>, base_url: &str, query: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(X_TOTAL_COUNT),
        HeaderValue::from(page.total),
    );
    match HeaderValue::from_str(&link_header(page, base_url, query)) {
        Ok(link) => {
            headers.insert(header::LINK, link);
        }
        Err(e) => tracing::debug!(error = %e, "link header is not a valid header value"),
    }
    headers
}
