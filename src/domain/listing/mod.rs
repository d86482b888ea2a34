//! Filtering and pagination shared by archive and template listings

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::calendar::{end_of_local_day, start_of_local_day};
use super::DomainError;

/// Query value meaning "none of the predefined options"
pub const OTHER_SENTINEL: &str = "__other__";

pub const TONE_OPTIONS: &[&str] = &["formal", "polite", "casual", "friendly"];
pub const RELATIONSHIP_OPTIONS: &[&str] =
    &["professor", "supervisor", "colleague", "client", "friend"];
pub const PURPOSE_OPTIONS: &[&str] = &["request", "apology", "thank", "inquiry", "report"];

/// Preview shown for items whose content is empty
pub const EMPTY_PREVIEW: &str = "(no content)";

const PREVIEW_MAX_CHARS: usize = 200;
const PREVIEW_KEEP_CHARS: usize = 197;

const DEFAULT_PAGE: u32 = 1;
const MAX_LIMIT: u32 = 100;

/// Content truncated to 197 characters plus `...` when longer than 200
pub fn make_preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_MAX_CHARS {
        let kept: String = content.chars().take(PREVIEW_KEEP_CHARS).collect();
        format!("{}...", kept)
    } else {
        content.to_string()
    }
}

/// Preview for display, falling back to a placeholder
pub fn display_preview(preview: &str) -> String {
    if preview.is_empty() {
        EMPTY_PREVIEW.to_string()
    } else {
        preview.to_string()
    }
}

/// Filter on a categorical field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    Exact(String),
    /// Set and not one of the predefined options
    Other,
}

impl CategoryFilter {
    fn parse(raw: Option<String>) -> Option<Self> {
        let raw = raw?;
        let value = raw.trim();

        if value.is_empty() {
            None
        } else if value == OTHER_SENTINEL {
            Some(Self::Other)
        } else {
            Some(Self::Exact(value.to_string()))
        }
    }

    pub fn matches(&self, value: Option<&str>, predefined: &[&str]) -> bool {
        match (self, value) {
            (Self::Exact(expected), Some(v)) => v == expected,
            (Self::Other, Some(v)) => !predefined.contains(&v),
            (_, None) => false,
        }
    }
}

/// Fields a listing filter inspects
pub trait Listable {
    fn content(&self) -> &str;
    fn title(&self) -> Option<&str>;
    fn tone(&self) -> Option<&str>;
    fn relationship(&self) -> Option<&str>;
    fn purpose(&self) -> Option<&str>;
    fn created_at(&self) -> DateTime<Utc>;
}

/// Raw query string parameters of a listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub q: Option<String>,
    pub tone: Option<String>,
    pub relationship: Option<String>,
    pub purpose: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl ListQuery {
    /// Validate raw parameters into a typed filter
    pub fn validate(self, default_limit: u32) -> Result<ListFilter, DomainError> {
        let page = parse_page(self.page.as_deref())?;
        let limit = parse_limit(self.limit.as_deref(), default_limit)?;

        let from = parse_date("from", self.from.as_deref())?;
        let to = parse_date("to", self.to.as_deref())?;

        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(DomainError::validation(
                    "'from' date must be on or before 'to' date",
                ));
            }
        }

        let search = self
            .q
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());

        Ok(ListFilter {
            page,
            limit,
            search,
            tone: CategoryFilter::parse(self.tone),
            relationship: CategoryFilter::parse(self.relationship),
            purpose: CategoryFilter::parse(self.purpose),
            created_from: from.map(start_of_local_day),
            created_to: to.map(end_of_local_day),
        })
    }
}

/// Validated listing filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub tone: Option<CategoryFilter>,
    pub relationship: Option<CategoryFilter>,
    pub purpose: Option<CategoryFilter>,
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound
    pub created_to: Option<DateTime<Utc>>,
}

impl ListFilter {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            search: None,
            tone: None,
            relationship: None,
            purpose: None,
            created_from: None,
            created_to: None,
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// In-process evaluation of the filter, mirroring the SQL form
    pub fn matches<T: Listable>(&self, item: &T) -> bool {
        if let Some(ref q) = self.search {
            let needle = q.to_lowercase();
            let in_content = item.content().to_lowercase().contains(&needle);
            let in_title = item
                .title()
                .map(|t| t.to_lowercase().contains(&needle))
                .unwrap_or(false);

            if !in_content && !in_title {
                return false;
            }
        }

        let categories = [
            (&self.tone, item.tone(), TONE_OPTIONS),
            (&self.relationship, item.relationship(), RELATIONSHIP_OPTIONS),
            (&self.purpose, item.purpose(), PURPOSE_OPTIONS),
        ];

        for (filter, value, predefined) in categories {
            if let Some(filter) = filter {
                if !filter.matches(value, predefined) {
                    return false;
                }
            }
        }

        if let Some(from) = self.created_from {
            if item.created_at() < from {
                return false;
            }
        }

        if let Some(to) = self.created_to {
            if item.created_at() > to {
                return false;
            }
        }

        true
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}

pub(crate) fn parse_page(raw: Option<&str>) -> Result<u32, DomainError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(DEFAULT_PAGE),
        Some(value) => match value.parse::<u32>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(DomainError::validation("page must be an integer >= 1")),
        },
    }
}

pub(crate) fn parse_limit(raw: Option<&str>, default_limit: u32) -> Result<u32, DomainError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default_limit),
        Some(value) => match value.parse::<u32>() {
            Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(limit),
            _ => Err(DomainError::validation(format!(
                "limit must be an integer between 1 and {}",
                MAX_LIMIT
            ))),
        },
    }
}

fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, DomainError> {
    let Some(value) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(Some(date));
    }

    DateTime::parse_from_rfc3339(value)
        .map(|dt| Some(dt.with_timezone(&chrono::Local).date_naive()))
        .map_err(|_| {
            DomainError::validation(format!("'{}' must be a date in YYYY-MM-DD format", field))
        })
}
