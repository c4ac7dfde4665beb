//! Offset pagination: page requests parsed from `page`/`size`/`sort` query
//! parameters and the pages returned by repositories and search backends.

use serde::{Deserialize, Serialize};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

/// One sort key, as given by a `sort=field,dir` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub field: String,
    pub dir: SortDir,
}

impl SortOrder {
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: SortDir::Asc,
        }
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: SortDir::Desc,
        }
    }
}

/// Page size bounds applied while parsing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: u64,
    pub max_size: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: 20,
            max_size: 2000,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PageError {
    #[error("invalid value '{value}' for parameter '{param}'")]
    InvalidNumber { param: &'static str, value: String },
    #[error("empty sort parameter")]
    EmptySort,
    #[error("page {page} with size {size} is out of range")]
    OutOfRange { page: u64, size: u64 },
}

/// Largest row offset a request may reach; SQL offsets are signed 64-bit.
pub const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// A 0-based page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
    pub sort: Vec<SortOrder>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::of(0, PageLimits::default().default_size)
    }
}

impl PageRequest {
    #[must_use]
    pub fn of(page: u64, size: u64) -> Self {
        Self {
            page,
            size,
            sort: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_sort(mut self, order: SortOrder) -> Self {
        self.sort.push(order);
        self
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }

    /// Parse `page`, `size` and (repeatable) `sort` from a raw query string.
    ///
    /// A `size` of zero falls back to the default; sizes above the maximum are
    /// clamped. `sort=a,b,desc` sorts by `a` and `b` descending, as Spring does.
    ///
    /// # Errors
    /// Returns [`PageError`] when `page`/`size` are not numbers, a `sort`
    /// parameter is empty, or the page starts beyond [`MAX_OFFSET`].
    pub fn from_query(raw: Option<&str>, limits: PageLimits) -> Result<Self, PageError> {
        let mut request = Self::of(0, limits.default_size);

        for (key, value) in query_pairs(raw) {
            match key.as_str() {
                "page" => request.page = parse_number("page", &value)?,
                "size" => {
                    let size = parse_number("size", &value)?;
                    request.size = if size == 0 {
                        limits.default_size
                    } else {
                        size.min(limits.max_size)
                    };
                }
                "sort" => request.sort.extend(parse_sort(&value)?),
                _ => {}
            }
        }

        if request
            .page
            .checked_mul(request.size)
            .is_none_or(|offset| offset > MAX_OFFSET)
        {
            return Err(PageError::OutOfRange {
                page: request.page,
                size: request.size,
            });
        }

        Ok(request)
    }
}

fn parse_number(param: &'static str, value: &str) -> Result<u64, PageError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| PageError::InvalidNumber {
            param,
            value: value.to_owned(),
        })
}

fn parse_sort(value: &str) -> Result<Vec<SortOrder>, PageError> {
    let mut parts: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let dir = match parts.last().map(|p| p.to_ascii_lowercase()) {
        Some(last) if last == "asc" => {
            parts.pop();
            SortDir::Asc
        }
        Some(last) if last == "desc" => {
            parts.pop();
            SortDir::Desc
        }
        _ => SortDir::Asc,
    };

    if parts.is_empty() {
        return Err(PageError::EmptySort);
    }

    Ok(parts
        .into_iter()
        .map(|field| SortOrder {
            field: field.to_owned(),
            dir,
        })
        .collect())
}

/// Decoded key/value pairs of a raw query string, repeated keys preserved.
#[must_use]
pub fn query_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    })
    .unwrap_or_default()
}

/// First value of `key` in a raw query string.
#[must_use]
pub fn query_param(raw: Option<&str>, key: &str) -> Option<String> {
    query_pairs(raw)
        .into_iter()
        .find_map(|(k, v)| (k == key).then_some(v))
}

/// One page of results together with the total element count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, request: &PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            size: request.size,
            total,
        }
    }

    #[must_use]
    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    #[must_use]
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
        }
    }

    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total.div_ceil(self.size)
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.page == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.page.saturating_add(1) >= self.total_pages()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_query_is_absent() {
        let req = PageRequest::from_query(None, PageLimits::default()).unwrap();
        assert_eq!(req, PageRequest::of(0, 20));
    }

    #[test]
    fn parses_page_size_and_repeated_sort() {
        let req = PageRequest::from_query(
            Some("page=2&size=5&sort=teamName,desc&sort=id"),
            PageLimits::default(),
        )
        .unwrap();
        assert_eq!(req.page, 2);
        assert_eq!(req.size, 5);
        assert_eq!(
            req.sort,
            vec![SortOrder::desc("teamName"), SortOrder::asc("id")]
        );
        assert_eq!(req.offset(), 10);
    }

    #[test]
    fn direction_applies_to_all_preceding_fields() {
        let req =
            PageRequest::from_query(Some("sort=a,b,DESC"), PageLimits::default()).unwrap();
        assert_eq!(req.sort, vec![SortOrder::desc("a"), SortOrder::desc("b")]);
    }

    #[test]
    fn size_is_clamped_and_zero_means_default() {
        let limits = PageLimits {
            default_size: 10,
            max_size: 50,
        };
        assert_eq!(
            PageRequest::from_query(Some("size=500"), limits).unwrap().size,
            50
        );
        assert_eq!(
            PageRequest::from_query(Some("size=0"), limits).unwrap().size,
            10
        );
    }

    #[test]
    fn rejects_non_numeric_and_empty_sort() {
        assert!(matches!(
            PageRequest::from_query(Some("page=abc"), PageLimits::default()),
            Err(PageError::InvalidNumber { param: "page", .. })
        ));
        assert_eq!(
            PageRequest::from_query(Some("sort=,desc"), PageLimits::default()),
            Err(PageError::EmptySort)
        );
    }

    #[test]
    fn pages_beyond_the_largest_offset_are_rejected() {
        assert_eq!(
            PageRequest::from_query(Some("page=18446744073709551615&size=20"), PageLimits::default()),
            Err(PageError::OutOfRange {
                page: u64::MAX,
                size: 20
            })
        );
        let last = MAX_OFFSET / 20;
        let req = PageRequest::from_query(Some(&format!("page={last}&size=20")), PageLimits::default())
            .unwrap();
        assert!(req.offset() <= MAX_OFFSET);
        assert!(
            PageRequest::from_query(Some(&format!("page={}&size=20", last + 1)), PageLimits::default())
                .is_err()
        );
    }

    #[test]
    fn page_bounds() {
        let req = PageRequest::of(1, 10);
        let page: Page<u8> = Page::new(vec![1, 2], &req, 25);
        assert_eq!(page.total_pages(), 3);
        assert!(!page.is_first());
        assert!(!page.is_last());

        let last: Page<u8> = Page::new(vec![1], &PageRequest::of(2, 10), 25);
        assert!(last.is_last());

        let empty: Page<u8> = Page::empty(&PageRequest::of(0, 10));
        assert!(empty.is_first());
        assert!(empty.is_last());
    }

    #[test]
    fn query_param_decodes_values() {
        assert_eq!(
            query_param(Some("query=teamName%3AAAAAA&page=1"), "query").as_deref(),
            Some("teamName:AAAAA")
        );
        assert_eq!(query_param(Some("page=1"), "query"), None);
    }
}
