//! crates/reading_list_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::validation::ValidationError;

/// A book in the shared catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub asin: Option<String>,
    pub link: Option<String>,
    pub image: Option<String>,
    /// `" > "`-delimited category path, e.g. `Fiction > Horror`.
    pub categories_flat: Option<String>,
    pub description: Option<String>,
    pub rating: f64,
    pub isbn_13: Option<String>,
    pub isbn_10: Option<String>,
    pub hardcover: Option<String>,
    pub bestsellers_rank_flat: Option<String>,
    pub specifications_flat: Option<String>,
}

/// The editable fields of a book, as submitted by an editor.
///
/// Handlers pass drafts through [`crate::validation::validate_book_draft`]
/// before they reach a port.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub asin: Option<String>,
    pub link: Option<String>,
    pub image: Option<String>,
    pub categories_flat: Option<String>,
    pub description: Option<String>,
    pub rating: f64,
    pub isbn_13: Option<String>,
    pub isbn_10: Option<String>,
    pub hardcover: Option<String>,
    pub bestsellers_rank_flat: Option<String>,
    pub specifications_flat: Option<String>,
}

impl BookDraft {
    /// Materializes the draft as a book with the given id.
    pub fn into_book(self, id: Uuid) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            asin: self.asin,
            link: self.link,
            image: self.image,
            categories_flat: self.categories_flat,
            description: self.description,
            rating: self.rating,
            isbn_13: self.isbn_13,
            isbn_10: self.isbn_10,
            hardcover: self.hardcover,
            bestsellers_rank_flat: self.bestsellers_rank_flat,
            specifications_flat: self.specifications_flat,
        }
    }
}

/// A role granting access beyond a plain reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Admin,
    Editor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "editor" => Ok(Role::Editor),
            other => Err(ValidationError::InvalidChoice {
                field: "role",
                value: other.to_string(),
                allowed: "admin, editor",
            }),
        }
    }
}

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<Role>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub active: bool,
}

/// Fields an admin supplies when registering a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub roles: Vec<Role>,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Where a user stands with a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingStatus {
    UpNext,
    Read,
}

impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::UpNext => "up_next",
            ReadingStatus::Read => "read",
        }
    }
}

impl FromStr for ReadingStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up_next" => Ok(ReadingStatus::UpNext),
            "read" => Ok(ReadingStatus::Read),
            other => Err(ValidationError::InvalidChoice {
                field: "status",
                value: other.to_string(),
                allowed: "read, up_next, none",
            }),
        }
    }
}

/// A user's opinion of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feedback {
    Like,
    Dislike,
}

impl Feedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::Like => "like",
            Feedback::Dislike => "dislike",
        }
    }
}

impl FromStr for Feedback {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Feedback::Like),
            "dislike" => Ok(Feedback::Dislike),
            other => Err(ValidationError::InvalidChoice {
                field: "feedback",
                value: other.to_string(),
                allowed: "like, dislike, none",
            }),
        }
    }
}

/// Parses a status/feedback style value where the literal `none` means "no value".
pub fn parse_optional_choice<T>(raw: &str) -> Result<Option<T>, ValidationError>
where
    T: FromStr<Err = ValidationError>,
{
    match raw.trim() {
        "none" => Ok(None),
        value => value.parse().map(Some),
    }
}

/// A user-owned, colored label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub color: String,
}

/// A book together with the viewer's personal data about it.
///
/// For anonymous viewers `status` and `feedback` are `None` and `tags` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct BookView {
    pub book: Book,
    pub status: Option<ReadingStatus>,
    pub feedback: Option<Feedback>,
    pub tags: Vec<Tag>,
}

impl BookView {
    pub fn anonymous(book: Book) -> Self {
        Self {
            book,
            status: None,
            feedback: None,
            tags: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_parses_to_absent_choice() {
        assert_eq!(parse_optional_choice::<ReadingStatus>("none").unwrap(), None);
        assert_eq!(
            parse_optional_choice::<ReadingStatus>("up_next").unwrap(),
            Some(ReadingStatus::UpNext)
        );
        assert_eq!(
            parse_optional_choice::<Feedback>("dislike").unwrap(),
            Some(Feedback::Dislike)
        );
    }

    #[test]
    fn unknown_choice_is_rejected() {
        let err = parse_optional_choice::<Feedback>("meh").unwrap_err();
        assert!(err.to_string().contains("like, dislike, none"));
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Admin, Role::Editor] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }
}
