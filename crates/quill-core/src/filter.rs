//! Query contract of the public post listing: filters, ordering and paging.
//!
//! Parsing happens here so every storage backend applies exactly the same
//! semantics. Backends translate a [`PostFilter`] into their own query
//! language; [`PostFilter::matches`] and [`PostFilter::compare`] are the
//! reference semantics.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::domain::Post;
use crate::validation::{self, ValidationErrors};

pub const AUTHOR_PARAM: &str = "author__name";
pub const TITLE_PARAM: &str = "title";
pub const SEARCH_PARAM: &str = "search";
pub const FROM_PARAM: &str = "published_date__gte";
pub const TO_PARAM: &str = "published_date__lte";
pub const ORDERING_PARAM: &str = "ordering";
pub const PAGE_PARAM: &str = "page";
pub const PAGE_SIZE_PARAM: &str = "page_size";

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;
/// Upper bound on `page`; keeps offsets well inside `u64`.
pub const MAX_PAGE: u64 = u32::MAX as u64;

/// Raw listing parameters, exactly as they arrived in the query string.
#[derive(Debug, Clone, Default)]
pub struct PostListParams {
    pub author_name: Option<String>,
    pub title: Option<String>,
    pub search: Option<String>,
    pub published_from: Option<String>,
    pub published_to: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Sort order of the listing. Ties are always broken by id, descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostOrdering {
    #[default]
    PublishedDesc,
    PublishedAsc,
    TitleAsc,
    TitleDesc,
}

impl FromStr for PostOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "-published_date" => Ok(PostOrdering::PublishedDesc),
            "published_date" => Ok(PostOrdering::PublishedAsc),
            "title" => Ok(PostOrdering::TitleAsc),
            "-title" => Ok(PostOrdering::TitleDesc),
            other => Err(format!(
                "\"{other}\" is not a valid ordering. Use one of: published_date, -published_date, title, -title."
            )),
        }
    }
}

/// End of a published-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEnd {
    /// Timestamps up to and including this instant.
    Inclusive(DateTime<Utc>),
    /// Timestamps strictly before this instant; a bare date maps to the next midnight.
    Before(DateTime<Utc>),
}

/// Published-date range; a missing side is open-ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<RangeEnd>,
}

impl DateRange {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        let after_start = self.start.is_none_or(|start| ts >= start);
        let before_end = match self.end {
            None => true,
            Some(RangeEnd::Inclusive(end)) => ts <= end,
            Some(RangeEnd::Before(end)) => ts < end,
        };
        after_start && before_end
    }

    fn is_empty(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(RangeEnd::Inclusive(end))) => start > end,
            (Some(start), Some(RangeEnd::Before(end))) => start >= end,
            _ => false,
        }
    }
}

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }
}

/// A page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, count: u64, request: PageRequest) -> Self {
        Self {
            items,
            count,
            page: request.page,
            page_size: request.page_size,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Parsed, validated listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    /// Case-insensitive substring of the author's name.
    pub author_name: Option<String>,
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    /// Case-insensitive substring of the title or the author's name.
    pub search: Option<String>,
    pub published: DateRange,
    pub ordering: PostOrdering,
    pub page: PageRequest,
}

impl PostFilter {
    /// Parse raw parameters. Blank values count as absent; malformed ones are errors.
    pub fn parse(params: PostListParams) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let start = non_blank(params.published_from).and_then(|raw| {
            let parsed = validation::parse_timestamp(&raw);
            if parsed.is_none() {
                errors.add(FROM_PARAM, invalid_date(&raw));
            }
            parsed
        });
        let end = non_blank(params.published_to).and_then(|raw| {
            let parsed = parse_range_end(&raw);
            if parsed.is_none() {
                errors.add(TO_PARAM, invalid_date(&raw));
            }
            parsed
        });
        let published = DateRange { start, end };
        if published.is_empty() {
            errors.add(
                FROM_PARAM,
                format!("Lower bound must not be after {TO_PARAM}."),
            );
        }

        let ordering = match non_blank(params.ordering).map(|raw| raw.parse::<PostOrdering>()) {
            None => PostOrdering::default(),
            Some(Ok(ordering)) => ordering,
            Some(Err(message)) => {
                errors.add(ORDERING_PARAM, message);
                PostOrdering::default()
            }
        };

        let page = parse_bounded(&mut errors, PAGE_PARAM, params.page, 1, MAX_PAGE).unwrap_or(1);
        let page_size = parse_bounded(
            &mut errors,
            PAGE_SIZE_PARAM,
            params.page_size,
            1,
            MAX_PAGE_SIZE,
        )
        .unwrap_or(DEFAULT_PAGE_SIZE);

        errors.into_result(Self {
            author_name: non_blank(params.author_name),
            title: non_blank(params.title),
            search: non_blank(params.search),
            published,
            ordering,
            page: PageRequest { page, page_size },
        })
    }

    /// Whether `post`, written by `author_name`, belongs in the listing.
    pub fn matches(&self, post: &Post, author_name: &str) -> bool {
        post.active
            && self
                .author_name
                .as_deref()
                .is_none_or(|needle| contains_ci(author_name, needle))
            && self
                .title
                .as_deref()
                .is_none_or(|needle| contains_ci(&post.title, needle))
            && self.search.as_deref().is_none_or(|needle| {
                contains_ci(&post.title, needle) || contains_ci(author_name, needle)
            })
            && self.published.contains(post.published_date)
    }

    /// Listing order between two posts. Titles compare case-insensitively
    /// by code point.
    pub fn compare(&self, a: &Post, b: &Post) -> Ordering {
        let primary = match self.ordering {
            PostOrdering::PublishedDesc => b.published_date.cmp(&a.published_date),
            PostOrdering::PublishedAsc => a.published_date.cmp(&b.published_date),
            PostOrdering::TitleAsc => title_key(a).cmp(&title_key(b)),
            PostOrdering::TitleDesc => title_key(b).cmp(&title_key(a)),
        };
        primary.then_with(|| b.id.cmp(&a.id))
    }
}

fn parse_range_end(raw: &str) -> Option<RangeEnd> {
    if let Some(date) = validation::parse_date(raw) {
        let next = date.succ_opt()?.and_hms_opt(0, 0, 0)?.and_utc();
        return Some(RangeEnd::Before(next));
    }
    validation::parse_timestamp(raw).map(RangeEnd::Inclusive)
}

fn parse_bounded(
    errors: &mut ValidationErrors,
    field: &str,
    raw: Option<String>,
    min: u64,
    max: u64,
) -> Option<u64> {
    let raw = non_blank(raw)?;
    match raw.parse::<u64>() {
        Ok(value) if (min..=max).contains(&value) => Some(value),
        _ => {
            errors.add(field, format!("Enter a whole number between {min} and {max}."));
            None
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn title_key(post: &Post) -> String {
    post.title.to_lowercase()
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn invalid_date(raw: &str) -> String {
    format!("\"{raw}\" is not a valid date. Use YYYY-MM-DD or an RFC 3339 timestamp.")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use uuid::Uuid;

    use super::*;
    use crate::domain::PostStatus;

    fn post(title: &str, published: DateTime<Utc>, active: bool) -> Post {
        Post {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            title: title.to_string(),
            content: "body".to_string(),
            published_date: published,
            status: PostStatus::Published,
            active,
            created_at: published,
            updated_at: published,
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_params_use_defaults() {
        let filter = PostFilter::parse(PostListParams::default()).unwrap();

        assert_eq!(filter, PostFilter::default());
        assert_eq!(filter.page.offset(), 0);
    }

    #[test]
    fn test_blank_params_are_ignored() {
        let filter = PostFilter::parse(PostListParams {
            author_name: Some("  ".into()),
            published_from: Some(String::new()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(filter.author_name, None);
        assert_eq!(filter.published, DateRange::default());
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        let errors = PostFilter::parse(PostListParams {
            published_from: Some("2025-02-30".into()),
            published_to: Some("soon".into()),
            ordering: Some("author".into()),
            page: Some("0".into()),
            page_size: Some("500".into()),
            ..Default::default()
        })
        .unwrap_err();

        for field in [FROM_PARAM, TO_PARAM, ORDERING_PARAM, PAGE_PARAM, PAGE_SIZE_PARAM] {
            assert!(errors.get(field).is_some(), "expected error on {field}");
        }
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let errors = PostFilter::parse(PostListParams {
            published_from: Some("2025-01-15".into()),
            published_to: Some("2025-01-11".into()),
            ..Default::default()
        })
        .unwrap_err();

        assert!(errors.get(FROM_PARAM).is_some());
    }

    #[test]
    fn test_date_only_upper_bound_covers_whole_day() {
        let filter = PostFilter::parse(PostListParams {
            published_from: Some("2025-01-11".into()),
            published_to: Some("2025-01-15".into()),
            ..Default::default()
        })
        .unwrap();

        assert!(!filter.published.contains(at(10, 23)));
        assert!(filter.published.contains(at(11, 0)));
        assert!(filter.published.contains(at(15, 23)));
        assert!(!filter.published.contains(at(16, 0)));
    }

    #[test]
    fn test_timestamp_upper_bound_is_inclusive() {
        let filter = PostFilter::parse(PostListParams {
            published_to: Some("2025-01-15T12:00:00Z".into()),
            ..Default::default()
        })
        .unwrap();

        assert!(filter.published.contains(at(15, 12)));
        assert!(!filter.published.contains(at(15, 13)));
    }

    #[test]
    fn test_matches_never_accepts_inactive_posts() {
        let filter = PostFilter::default();

        assert!(filter.matches(&post("a", at(10, 0), true), "Ada"));
        assert!(!filter.matches(&post("a", at(10, 0), false), "Ada"));
    }

    #[test]
    fn test_text_filters_are_case_insensitive() {
        let filter = PostFilter {
            author_name: Some("lovel".into()),
            search: Some("RUST".into()),
            ..Default::default()
        };

        assert!(filter.matches(&post("Learning rust", at(10, 0), true), "Ada Lovelace"));
        assert!(!filter.matches(&post("Learning go", at(10, 0), true), "Ada Lovelace"));
        assert!(!filter.matches(&post("Learning rust", at(10, 0), true), "Grace Hopper"));
    }

    #[test]
    fn test_compare_orders_and_breaks_ties_by_id() {
        let filter = PostFilter::default();
        let older = post("b", at(10, 0), true);
        let newer = post("a", at(12, 0), true);
        let mut twin = older.clone();
        twin.id = Uuid::new_v4();

        let mut posts = vec![older.clone(), newer.clone(), twin.clone()];
        posts.sort_by(|a, b| filter.compare(a, b));

        assert_eq!(posts[0].id, newer.id);
        assert_eq!(posts[1].id, older.id.max(twin.id));

        let by_title = PostFilter {
            ordering: PostOrdering::TitleAsc,
            ..Default::default()
        };
        posts.sort_by(|a, b| by_title.compare(a, b));
        assert_eq!(posts[0].id, newer.id);
    }

    #[test]
    fn test_title_order_ignores_case() {
        let filter = PostFilter {
            ordering: PostOrdering::TitleAsc,
            ..Default::default()
        };
        let mut posts = vec![
            post("banana", at(10, 0), true),
            post("Cherry", at(10, 0), true),
            post("apple", at(10, 0), true),
        ];
        posts.sort_by(|a, b| filter.compare(a, b));

        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["apple", "banana", "Cherry"]);
    }
}
