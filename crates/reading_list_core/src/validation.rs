//! crates/reading_list_core/src/validation.rs
//!
//! Input sanitization and validation shared by every adapter.

use regex::Regex;
use std::sync::OnceLock;

use crate::category::normalize_category_path;
use crate::domain::BookDraft;

pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_AUTHOR_LEN: usize = 255;
pub const MAX_ASIN_LEN: usize = 20;
pub const MAX_CATEGORIES_LEN: usize = 255;
pub const MAX_ISBN_10_LEN: usize = 13;
pub const MAX_ISBN_13_LEN: usize = 17;
pub const MAX_HARDCOVER_LEN: usize = 64;
/// Shared bound for the long free-text fields.
pub const MAX_TEXT_LEN: usize = 4096;
pub const MAX_RATING: f64 = 5.0;

/// Rejections produced while checking user-supplied values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} must be between 0 and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        max: f64,
    },
    #[error("Invalid '{field}' value '{value}'. Allowed values: {allowed}")]
    InvalidChoice {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },
    #[error("{0}")]
    InvalidTagName(&'static str),
    #[error("Unknown tag color '{0}'")]
    UnknownColor(String),
    #[error("Malformed category id '{0}'")]
    InvalidCategoryId(String),
    #[error("Bad search input: {0}")]
    BadSearch(&'static str),
}

fn html_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex is valid"))
}

/// Removes every HTML tag from `input`, keeping the text between them.
pub fn strip_html(input: &str) -> String {
    html_tag_pattern().replace_all(input, "").into_owned()
}

/// Strips markup and surrounding whitespace; blank values collapse to `None`.
pub fn sanitize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| strip_html(&v).trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: &str, field: &'static str, max: usize) -> Result<String, ValidationError> {
    let cleaned = strip_html(value).trim().to_string();
    if cleaned.is_empty() {
        return Err(ValidationError::Required(field));
    }
    if cleaned.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(cleaned)
}

fn bounded(
    value: Option<String>,
    field: &'static str,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong { field, max }),
        other => Ok(other),
    }
}

/// Sanitizes an editor's submission and checks the constraints the catalog relies on.
pub fn validate_book_draft(draft: BookDraft) -> Result<BookDraft, ValidationError> {
    let title = required(&draft.title, "title", MAX_TITLE_LEN)?;
    let author = required(&draft.author, "author", MAX_AUTHOR_LEN)?;

    if !draft.rating.is_finite() || !(0.0..=MAX_RATING).contains(&draft.rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating",
            value: draft.rating,
            max: MAX_RATING,
        });
    }

    let categories_flat = sanitize_optional(draft.categories_flat)
        .and_then(|path| normalize_category_path(&path));
    let description = sanitize_optional(draft.description)
        .map(|d| d.replace('\u{a0}', " "));

    Ok(BookDraft {
        title,
        author,
        asin: bounded(sanitize_optional(draft.asin), "asin", MAX_ASIN_LEN)?,
        link: sanitize_optional(draft.link),
        image: sanitize_optional(draft.image),
        categories_flat: bounded(categories_flat, "categories_flat", MAX_CATEGORIES_LEN)?,
        description: bounded(description, "description", MAX_TEXT_LEN)?,
        rating: draft.rating,
        isbn_13: bounded(sanitize_optional(draft.isbn_13), "isbn_13", MAX_ISBN_13_LEN)?,
        isbn_10: bounded(sanitize_optional(draft.isbn_10), "isbn_10", MAX_ISBN_10_LEN)?,
        hardcover: bounded(
            sanitize_optional(draft.hardcover),
            "hardcover",
            MAX_HARDCOVER_LEN,
        )?,
        bestsellers_rank_flat: bounded(
            sanitize_optional(draft.bestsellers_rank_flat),
            "bestsellers_rank_flat",
            MAX_TEXT_LEN,
        )?,
        specifications_flat: bounded(
            sanitize_optional(draft.specifications_flat),
            "specifications_flat",
            MAX_TEXT_LEN,
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, author: &str) -> BookDraft {
        BookDraft {
            title: title.to_string(),
            author: author.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn strips_markup_from_free_text() {
        assert_eq!(strip_html("<b>Dune</b> <script>x</script>"), "Dune x");
        assert_eq!(sanitize_optional(Some("  <i></i> ".into())), None);
    }

    #[test]
    fn title_and_author_are_required() {
        assert_eq!(
            validate_book_draft(draft(" ", "Herbert")).unwrap_err(),
            ValidationError::Required("title")
        );
        assert_eq!(
            validate_book_draft(draft("Dune", "<p></p>")).unwrap_err(),
            ValidationError::Required("author")
        );
    }

    #[test]
    fn overlong_title_is_rejected() {
        let long = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(matches!(
            validate_book_draft(draft(&long, "A")),
            Err(ValidationError::TooLong { field: "title", .. })
        ));
    }

    #[test]
    fn optional_fields_respect_column_limits() {
        let cases: [(&str, usize, fn(&mut BookDraft, String)); 8] = [
            ("asin", MAX_ASIN_LEN, |d, v| d.asin = Some(v)),
            ("categories_flat", MAX_CATEGORIES_LEN, |d, v| d.categories_flat = Some(v)),
            ("isbn_10", MAX_ISBN_10_LEN, |d, v| d.isbn_10 = Some(v)),
            ("isbn_13", MAX_ISBN_13_LEN, |d, v| d.isbn_13 = Some(v)),
            ("hardcover", MAX_HARDCOVER_LEN, |d, v| d.hardcover = Some(v)),
            ("description", MAX_TEXT_LEN, |d, v| d.description = Some(v)),
            ("bestsellers_rank_flat", MAX_TEXT_LEN, |d, v| d.bestsellers_rank_flat = Some(v)),
            ("specifications_flat", MAX_TEXT_LEN, |d, v| d.specifications_flat = Some(v)),
        ];
        for (field, max, set) in cases {
            let mut at_limit = draft("Dune", "Herbert");
            set(&mut at_limit, "x".repeat(max));
            assert!(validate_book_draft(at_limit).is_ok(), "{field} at limit");

            let mut over = draft("Dune", "Herbert");
            set(&mut over, "x".repeat(max + 1));
            assert_eq!(
                validate_book_draft(over).unwrap_err(),
                ValidationError::TooLong { field, max }
            );
        }
    }

    #[test]
    fn rating_must_be_in_range() {
        let mut d = draft("Dune", "Herbert");
        d.rating = 7.5;
        assert!(matches!(
            validate_book_draft(d),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn category_path_is_normalized() {
        let mut d = draft("Dune", "Herbert");
        d.categories_flat = Some("  Fiction  >  Science Fiction >  > <b>Space</b>".into());
        let cleaned = validate_book_draft(d).unwrap();
        assert_eq!(
            cleaned.categories_flat.as_deref(),
            Some("Fiction > Science Fiction > Space")
        );
    }
}
