use serde::Deserialize;

use crate::domain::listing::{parse_limit, parse_page};
use crate::domain::DomainError;

use super::ExpressionNote;

const DEFAULT_NOTE_LIMIT: u32 = 10;

/// Ordering of a note listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteSort {
    /// Starred first, then newest
    #[default]
    Latest,
    Oldest,
    TermAsc,
    TermDesc,
}

impl NoteSort {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "latest" => Some(Self::Latest),
            "oldest" => Some(Self::Oldest),
            "term_asc" => Some(Self::TermAsc),
            "term_desc" => Some(Self::TermDesc),
            _ => None,
        }
    }

    /// ORDER BY clause for the SQL backend
    pub fn order_by(&self) -> &'static str {
        match self {
            Self::Latest => "is_starred DESC, created_at DESC",
            Self::Oldest => "created_at ASC",
            Self::TermAsc => "term ASC",
            Self::TermDesc => "term DESC",
        }
    }

    pub fn sort(&self, notes: &mut [ExpressionNote]) {
        match self {
            Self::Latest => notes.sort_by(|a, b| {
                b.is_starred
                    .cmp(&a.is_starred)
                    .then(b.created_at.cmp(&a.created_at))
            }),
            Self::Oldest => notes.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            Self::TermAsc => notes.sort_by(|a, b| a.term.cmp(&b.term)),
            Self::TermDesc => notes.sort_by(|a, b| b.term.cmp(&a.term)),
        }
    }
}

/// Raw query string of a note listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
}

impl NoteQuery {
    pub fn validate(self) -> Result<NoteFilter, DomainError> {
        let page = parse_page(self.page.as_deref())?;
        let limit = parse_limit(self.limit.as_deref(), DEFAULT_NOTE_LIMIT)?;

        let sort = match self.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => NoteSort::default(),
            Some(value) => NoteSort::parse(value).ok_or_else(|| {
                DomainError::validation(
                    "sort must be one of: latest, oldest, term_asc, term_desc",
                )
            })?,
        };

        Ok(NoteFilter {
            page,
            limit,
            search: self
                .q
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
            sort,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFilter {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub sort: NoteSort,
}

impl NoteFilter {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Case-insensitive match over term, description and example
    pub fn matches(&self, note: &ExpressionNote) -> bool {
        let Some(ref q) = self.search else {
            return true;
        };
        let needle = q.to_lowercase();

        [
            Some(note.term.as_str()),
            note.description.as_deref(),
            note.example.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::UserId;
    use chrono::{Duration, Utc};

    #[test]
    fn test_defaults() {
        let filter = NoteQuery::default().validate().unwrap();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, 10);
        assert_eq!(filter.sort, NoteSort::Latest);
    }

    #[test]
    fn test_unknown_sort_rejected() {
        let query = NoteQuery {
            sort: Some("popular".into()),
            ..Default::default()
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_search_fields() {
        let filter = NoteQuery {
            q: Some("ICE".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        let user = UserId::generate();
        assert!(filter.matches(&ExpressionNote::new(user, "break the ice")));
        assert!(filter.matches(
            &ExpressionNote::new(user, "idiom").with_example(Some("Let's break the ice".into()))
        ));
        assert!(!filter.matches(&ExpressionNote::new(user, "follow up")));
    }

    #[test]
    fn test_latest_puts_starred_first() {
        let user = UserId::generate();
        let now = Utc::now();

        let mut old_starred = ExpressionNote::new(user, "a").starred(true);
        old_starred.created_at = now - Duration::days(3);
        let mut newest = ExpressionNote::new(user, "b");
        newest.created_at = now;
        let mut middle = ExpressionNote::new(user, "c");
        middle.created_at = now - Duration::days(1);

        let mut notes = vec![middle, newest, old_starred];
        NoteSort::Latest.sort(&mut notes);

        let terms: Vec<_> = notes.iter().map(|n| n.term.as_str()).collect();
        assert_eq!(terms, vec!["a", "b", "c"]);

        NoteSort::TermDesc.sort(&mut notes);
        let terms: Vec<_> = notes.iter().map(|n| n.term.as_str()).collect();
        assert_eq!(terms, vec!["c", "b", "a"]);
    }
}
