//! crates/reading_list_core/src/search.rs
//!
//! Composes a catalog search out of one primary criterion (author, title or
//! category set) and the viewer's optional status, feedback and tag filters.
//!
//! A [`SearchQuery`] is a plain value. Adapters interpret it: the in-memory
//! adapter through [`SearchQuery::matches`], the PostgreSQL adapter by
//! rendering SQL. Filter dimensions are ANDed together; the tag dimension is an
//! OR over the selected tags.

use std::cmp::Ordering;
use std::str::FromStr;
use uuid::Uuid;

use crate::category::is_within_category;
use crate::domain::{Book, BookView, Feedback, ReadingStatus};
use crate::validation::ValidationError;

/// Value matching every book in the substring modes.
pub const MATCH_ALL: &str = "*";

/// The primary criterion of a search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchMode {
    Author(String),
    Title(String),
    /// Full category paths; a book matches when it sits at or below any of them.
    Categories(Vec<String>),
}

/// How a substring mode constrains its field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatch {
    /// No constraint (`*`).
    Any,
    /// Case-insensitive containment of the lowercased needle.
    Contains(String),
    /// Blank input: nothing matches.
    Nothing,
}

impl TextMatch {
    pub fn from_input(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            TextMatch::Nothing
        } else if trimmed == MATCH_ALL {
            TextMatch::Any
        } else {
            TextMatch::Contains(trimmed.to_lowercase())
        }
    }

    pub fn matches(&self, haystack: &str) -> bool {
        match self {
            TextMatch::Any => true,
            TextMatch::Contains(needle) => haystack.to_lowercase().contains(needle.as_str()),
            TextMatch::Nothing => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Title,
    Author,
    Rating,
}

impl SortColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Title => "title",
            SortColumn::Author => "author",
            SortColumn::Rating => "rating",
        }
    }
}

impl FromStr for SortColumn {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(SortColumn::Title),
            "author" => Ok(SortColumn::Author),
            "rating" => Ok(SortColumn::Rating),
            other => Err(ValidationError::InvalidChoice {
                field: "sortColumn",
                value: other.to_string(),
                allowed: "title, author, rating",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ValidationError::InvalidChoice {
                field: "sortOrder",
                value: other.to_string(),
                allowed: "asc, desc",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: SortColumn,
    pub order: SortOrder,
}

/// A filter on a single-valued per-user attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFilter<T> {
    /// The viewer recorded exactly this value.
    Equals(T),
    /// The viewer recorded nothing.
    Unset,
}

impl<T: PartialEq> ValueFilter<T> {
    pub fn accepts(&self, value: Option<&T>) -> bool {
        match self {
            ValueFilter::Equals(expected) => value == Some(expected),
            ValueFilter::Unset => value.is_none(),
        }
    }

    pub fn from_choice(choice: Option<T>) -> Self {
        match choice {
            Some(v) => ValueFilter::Equals(v),
            None => ValueFilter::Unset,
        }
    }
}

/// Filters that only make sense for a signed-in viewer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilters {
    pub status: Option<ValueFilter<ReadingStatus>>,
    pub feedback: Option<ValueFilter<Feedback>>,
    /// Book must carry at least one of these (viewer-owned) tags. Empty = no constraint.
    pub tag_ids: Vec<Uuid>,
}

impl UserFilters {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.feedback.is_none() && self.tag_ids.is_empty()
    }
}

/// A fully composed search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    mode: SearchMode,
    viewer: Option<Uuid>,
    filters: UserFilters,
    sort: Sort,
}

impl SearchQuery {
    /// Composes a query. Per-user filters are dropped for anonymous viewers,
    /// and the sort defaults to the searched field (title for categories).
    pub fn new(
        mode: SearchMode,
        viewer: Option<Uuid>,
        filters: UserFilters,
        sort: Option<Sort>,
    ) -> Self {
        let filters = if viewer.is_some() {
            let mut filters = filters;
            filters.tag_ids.sort();
            filters.tag_ids.dedup();
            filters
        } else {
            UserFilters::default()
        };
        let sort = sort.unwrap_or(Sort {
            column: match mode {
                SearchMode::Author(_) => SortColumn::Author,
                SearchMode::Title(_) | SearchMode::Categories(_) => SortColumn::Title,
            },
            order: SortOrder::Asc,
        });
        Self {
            mode,
            viewer,
            filters,
            sort,
        }
    }

    pub fn mode(&self) -> &SearchMode {
        &self.mode
    }

    pub fn viewer(&self) -> Option<Uuid> {
        self.viewer
    }

    pub fn filters(&self) -> &UserFilters {
        &self.filters
    }

    pub fn sort(&self) -> Sort {
        self.sort
    }

    /// True when the query can match nothing (blank text, no categories).
    /// Adapters short-circuit on this instead of querying storage.
    pub fn is_vacuous(&self) -> bool {
        match &self.mode {
            SearchMode::Author(v) | SearchMode::Title(v) => {
                TextMatch::from_input(v) == TextMatch::Nothing
            }
            SearchMode::Categories(paths) => paths.is_empty(),
        }
    }

    /// Applies the primary criterion only.
    pub fn matches_book(&self, book: &Book) -> bool {
        match &self.mode {
            SearchMode::Author(v) => TextMatch::from_input(v).matches(&book.author),
            SearchMode::Title(v) => TextMatch::from_input(v).matches(&book.title),
            SearchMode::Categories(selected) => match book.categories_flat.as_deref() {
                Some(path) => selected.iter().any(|s| is_within_category(path, s)),
                None => false,
            },
        }
    }

    /// Applies every dimension to a book seen through the viewer's data.
    pub fn matches(&self, view: &BookView) -> bool {
        if !self.matches_book(&view.book) {
            return false;
        }
        if let Some(status) = &self.filters.status {
            if !status.accepts(view.status.as_ref()) {
                return false;
            }
        }
        if let Some(feedback) = &self.filters.feedback {
            if !feedback.accepts(view.feedback.as_ref()) {
                return false;
            }
        }
        if !self.filters.tag_ids.is_empty()
            && !view
                .tags
                .iter()
                .any(|t| self.filters.tag_ids.contains(&t.id))
        {
            return false;
        }
        true
    }

    /// Total order used for results: the requested column, then book id.
    ///
    /// Text columns compare case-insensitively.
    pub fn compare(&self, a: &Book, b: &Book) -> Ordering {
        let primary = match self.sort.column {
            SortColumn::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortColumn::Author => a.author.to_lowercase().cmp(&b.author.to_lowercase()),
            SortColumn::Rating => a.rating.total_cmp(&b.rating),
        };
        let primary = match self.sort.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }

    /// Filters and orders a set of candidate books in memory.
    pub fn apply(&self, candidates: impl IntoIterator<Item = BookView>) -> Vec<BookView> {
        if self.is_vacuous() {
            return Vec::new();
        }
        let mut results: Vec<BookView> = candidates
            .into_iter()
            .filter(|v| self.matches(v))
            .collect();
        results.sort_by(|a, b| self.compare(&a.book, &b.book));
        results
    }
}
