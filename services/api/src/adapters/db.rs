//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `reading_list_core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reading_list_core::category::CATEGORY_SEPARATOR;
use reading_list_core::domain::{
    Book, BookDraft, BookView, Feedback, NewUser, ReadingStatus, Role, Tag, User, UserCredentials,
};
use reading_list_core::ports::{DatabaseService, PortError, PortResult};
use reading_list_core::search::{
    SearchMode, SearchQuery, SortColumn, SortOrder, TextMatch, ValueFilter,
};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Loads the owner's tags for a set of books, keyed by book, in link order.
    async fn tags_by_book(
        &self,
        owner_id: Uuid,
        book_ids: Vec<Uuid>,
    ) -> PortResult<HashMap<Uuid, Vec<Tag>>> {
        let rows = sqlx::query_as::<_, BookTagRecord>(
            "SELECT tb.book_id, t.id, t.owner_id, t.name, t.color \
             FROM tag_books tb JOIN tags t ON t.id = tb.tag_id \
             WHERE t.owner_id = $1 AND tb.book_id = ANY($2) \
             ORDER BY tb.id ASC",
        )
        .bind(owner_id)
        .bind(book_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let mut by_book: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in rows {
            let (book_id, tag) = row.to_domain();
            by_book.entry(book_id).or_default().push(tag);
        }
        Ok(by_book)
    }

    /// Attaches the viewer's tags to rows that already carry status and feedback.
    async fn into_views(
        &self,
        rows: Vec<BookViewRecord>,
        viewer: Option<Uuid>,
    ) -> PortResult<Vec<BookView>> {
        let mut tags = match viewer {
            Some(owner_id) if !rows.is_empty() => {
                let ids = rows.iter().map(|r| r.book.id).collect();
                self.tags_by_book(owner_id, ids).await?
            }
            _ => HashMap::new(),
        };
        rows.into_iter()
            .map(|row| {
                let book_tags = tags.remove(&row.book.id).unwrap_or_default();
                row.to_domain(book_tags)
            })
            .collect()
    }
}

//=========================================================================================
// SQL helpers
//=========================================================================================

const BOOK_COLUMNS: &str = "b.id, b.title, b.author, b.asin, b.link, b.image, b.categories_flat, \
     b.description, b.rating, b.isbn_13, b.isbn_10, b.hardcover, b.bestsellers_rank_flat, \
     b.specifications_flat";

const USER_COLUMNS: &str = "id, email, roles, active, created_at";

const TAG_COLUMNS: &str = "id, owner_id, name, color";

/// Escapes `LIKE` metacharacters so user input only ever matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Starts a `SELECT` of books joined with the viewer's status and feedback.
fn book_view_select(viewer: Option<Uuid>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {BOOK_COLUMNS}, rs.status AS status, fb.feedback AS feedback FROM books b \
         LEFT JOIN reading_status rs ON rs.book_id = b.id AND rs.user_id = "
    ));
    qb.push_bind(viewer);
    qb.push(" LEFT JOIN feedback fb ON fb.book_id = b.id AND fb.user_id = ");
    qb.push_bind(viewer);
    qb
}

/// Renders a composed search as a single PostgreSQL statement.
pub(crate) fn search_sql(query: &SearchQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = book_view_select(query.viewer());
    qb.push(" WHERE ");

    match query.mode() {
        SearchMode::Author(value) | SearchMode::Title(value) => {
            let column = match query.mode() {
                SearchMode::Author(_) => "b.author",
                _ => "b.title",
            };
            match TextMatch::from_input(value) {
                TextMatch::Any => {
                    qb.push("TRUE");
                }
                TextMatch::Contains(needle) => {
                    qb.push(column);
                    qb.push(" ILIKE ");
                    qb.push_bind(format!("%{}%", escape_like(&needle)));
                }
                TextMatch::Nothing => {
                    qb.push("FALSE");
                }
            }
        }
        SearchMode::Categories(paths) if paths.is_empty() => {
            qb.push("FALSE");
        }
        SearchMode::Categories(paths) => {
            qb.push("(");
            for (i, path) in paths.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push("b.categories_flat = ");
                qb.push_bind(path.clone());
                qb.push(" OR starts_with(b.categories_flat, ");
                qb.push_bind(format!("{path}{CATEGORY_SEPARATOR}"));
                qb.push(")");
            }
            qb.push(")");
        }
    }

    let filters = query.filters();
    match filters.status {
        Some(ValueFilter::Equals(status)) => {
            qb.push(" AND rs.status = ");
            qb.push_bind(status.as_str());
        }
        Some(ValueFilter::Unset) => {
            qb.push(" AND rs.status IS NULL");
        }
        None => {}
    }
    match filters.feedback {
        Some(ValueFilter::Equals(feedback)) => {
            qb.push(" AND fb.feedback = ");
            qb.push_bind(feedback.as_str());
        }
        Some(ValueFilter::Unset) => {
            qb.push(" AND fb.feedback IS NULL");
        }
        None => {}
    }
    if !filters.tag_ids.is_empty() {
        qb.push(
            " AND EXISTS (SELECT 1 FROM tag_books tb JOIN tags t ON t.id = tb.tag_id \
             WHERE tb.book_id = b.id AND t.owner_id = ",
        );
        qb.push_bind(query.viewer());
        qb.push(" AND tb.tag_id = ANY(");
        qb.push_bind(filters.tag_ids.clone());
        qb.push("))");
    }

    let sort = query.sort();
    let direction = match sort.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    let column = match sort.column {
        SortColumn::Title => "lower(b.title)",
        SortColumn::Author => "lower(b.author)",
        SortColumn::Rating => "b.rating",
    };
    qb.push(format!(" ORDER BY {column} {direction}, b.id ASC"));
    qb
}

/// Maps a sqlx failure onto the port vocabulary.
fn port_error(e: sqlx::Error, subject: impl FnOnce() -> String) -> PortError {
    match &e {
        sqlx::Error::RowNotFound => PortError::NotFound(subject()),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict(format!("{} already exists", subject()))
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            PortError::NotFound(subject())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    roles: Vec<String>,
    active: bool,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        let roles = self
            .roles
            .iter()
            .map(|r| r.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                PortError::Unexpected(format!("Corrupt role for user {}: {}", self.id, e))
            })?;
        Ok(User {
            id: self.id,
            email: self.email,
            roles,
            active: self.active,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    hashed_password: String,
    active: bool,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.id,
            email: self.email,
            hashed_password: self.hashed_password,
            active: self.active,
        }
    }
}

#[derive(FromRow)]
struct BookRecord {
    id: Uuid,
    title: String,
    author: String,
    asin: Option<String>,
    link: Option<String>,
    image: Option<String>,
    categories_flat: Option<String>,
    description: Option<String>,
    rating: f64,
    isbn_13: Option<String>,
    isbn_10: Option<String>,
    hardcover: Option<String>,
    bestsellers_rank_flat: Option<String>,
    specifications_flat: Option<String>,
}
impl BookRecord {
    fn to_domain(self) -> Book {
        Book {
            id: self.id,
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

#[derive(FromRow)]
struct BookViewRecord {
    #[sqlx(flatten)]
    book: BookRecord,
    status: Option<String>,
    feedback: Option<String>,
}
impl BookViewRecord {
    fn to_domain(self, tags: Vec<Tag>) -> PortResult<BookView> {
        let status = self
            .status
            .map(|s| s.parse::<ReadingStatus>())
            .transpose()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let feedback = self
            .feedback
            .map(|f| f.parse::<Feedback>())
            .transpose()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(BookView {
            book: self.book.to_domain(),
            status,
            feedback,
            tags,
        })
    }
}

#[derive(FromRow)]
struct TagRecord {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    color: String,
}
impl TagRecord {
    fn to_domain(self) -> Tag {
        Tag {
            id: self.id,
            owner_id: self.owner_id,
            name: self.name,
            color: self.color,
        }
    }
}

#[derive(FromRow)]
struct BookTagRecord {
    book_id: Uuid,
    #[sqlx(flatten)]
    tag: TagRecord,
}
impl BookTagRecord {
    fn to_domain(self) -> (Uuid, Tag) {
        (self.book_id, self.tag.to_domain())
    }
}

fn role_names(roles: &[Role]) -> Vec<String> {
    let mut names: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();
    names.sort();
    names.dedup();
    names
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn ping(&self) -> PortResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, email, hashed_password, roles) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.hashed_password)
        .bind(role_names(&new_user.roles))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("User with email {}", new_user.email)))?;
        record.to_domain()
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("User {} not found", user_id)))?;
        record.to_domain()
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, hashed_password, active FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("User {} not found", email)))?;
        Ok(record.to_domain())
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY lower(email) ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn update_user(&self, user_id: Uuid, roles: Vec<Role>, active: bool) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET roles = $2, active = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(role_names(&roles))
        .bind(active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("User {} not found", user_id)))?;
        record.to_domain()
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT s.user_id FROM auth_sessions s JOIN users u ON u.id = s.user_id \
             WHERE s.id = $1 AND s.expires_at > now() AND u.active",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_book(&self, draft: BookDraft) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(
            "INSERT INTO books (id, title, author, asin, link, image, categories_flat, description, \
             rating, isbn_13, isbn_10, hardcover, bestsellers_rank_flat, specifications_flat) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING id, title, author, asin, link, image, categories_flat, description, rating, \
             isbn_13, isbn_10, hardcover, bestsellers_rank_flat, specifications_flat",
        )
        .bind(Uuid::new_v4())
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(&draft.asin)
        .bind(&draft.link)
        .bind(&draft.image)
        .bind(&draft.categories_flat)
        .bind(&draft.description)
        .bind(draft.rating)
        .bind(&draft.isbn_13)
        .bind(&draft.isbn_10)
        .bind(&draft.hardcover)
        .bind(&draft.bestsellers_rank_flat)
        .bind(&draft.specifications_flat)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Book '{}'", draft.title)))?;
        debug!(book_id = %record.id, "Book created");
        Ok(record.to_domain())
    }

    async fn update_book(&self, book_id: Uuid, draft: BookDraft) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(
            "UPDATE books SET title = $2, author = $3, asin = $4, link = $5, image = $6, \
             categories_flat = $7, description = $8, rating = $9, isbn_13 = $10, isbn_10 = $11, \
             hardcover = $12, bestsellers_rank_flat = $13, specifications_flat = $14 \
             WHERE id = $1 \
             RETURNING id, title, author, asin, link, image, categories_flat, description, rating, \
             isbn_13, isbn_10, hardcover, bestsellers_rank_flat, specifications_flat",
        )
        .bind(book_id)
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(&draft.asin)
        .bind(&draft.link)
        .bind(&draft.image)
        .bind(&draft.categories_flat)
        .bind(&draft.description)
        .bind(draft.rating)
        .bind(&draft.isbn_13)
        .bind(&draft.isbn_10)
        .bind(&draft.hardcover)
        .bind(&draft.bestsellers_rank_flat)
        .bind(&draft.specifications_flat)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Book {} not found", book_id)))?;
        Ok(record.to_domain())
    }

    async fn delete_book(&self, book_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Book {} not found", book_id)));
        }
        Ok(())
    }

    async fn get_book(&self, book_id: Uuid) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books b WHERE b.id = $1"
        ))
        .bind(book_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Book {} not found", book_id)))?;
        Ok(record.to_domain())
    }

    async fn get_book_view(&self, book_id: Uuid, viewer: Option<Uuid>) -> PortResult<BookView> {
        let mut qb = book_view_select(viewer);
        qb.push(" WHERE b.id = ");
        qb.push_bind(book_id);
        let record = qb
            .build_query_as::<BookViewRecord>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| port_error(e, || format!("Book {} not found", book_id)))?;
        let mut views = self.into_views(vec![record], viewer).await?;
        views
            .pop()
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", book_id)))
    }

    async fn list_category_paths(&self) -> PortResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT categories_flat FROM books \
             WHERE categories_flat IS NOT NULL AND categories_flat <> '' \
             ORDER BY categories_flat",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn search_books(&self, query: &SearchQuery) -> PortResult<Vec<BookView>> {
        if query.is_vacuous() {
            return Ok(Vec::new());
        }
        let mut qb = search_sql(query);
        debug!(sql = qb.sql(), "Running book search");
        let rows = qb
            .build_query_as::<BookViewRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        self.into_views(rows, query.viewer()).await
    }

    async fn set_reading_status(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        status: Option<ReadingStatus>,
    ) -> PortResult<()> {
        let result = match status {
            Some(status) => {
                sqlx::query(
                    "INSERT INTO reading_status (user_id, book_id, status) VALUES ($1, $2, $3) \
                     ON CONFLICT (user_id, book_id) DO UPDATE SET status = EXCLUDED.status",
                )
                .bind(user_id)
                .bind(book_id)
                .bind(status.as_str())
                .execute(&self.pool)
                .await
            }
            None => {
                sqlx::query("DELETE FROM reading_status WHERE user_id = $1 AND book_id = $2")
                    .bind(user_id)
                    .bind(book_id)
                    .execute(&self.pool)
                    .await
            }
        };
        result.map_err(|e| port_error(e, || format!("Book {} not found", book_id)))?;
        Ok(())
    }

    async fn set_feedback(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        feedback: Option<Feedback>,
    ) -> PortResult<()> {
        let result = match feedback {
            Some(feedback) => {
                sqlx::query(
                    "INSERT INTO feedback (user_id, book_id, feedback) VALUES ($1, $2, $3) \
                     ON CONFLICT (user_id, book_id) DO UPDATE SET feedback = EXCLUDED.feedback",
                )
                .bind(user_id)
                .bind(book_id)
                .bind(feedback.as_str())
                .execute(&self.pool)
                .await
            }
            None => {
                sqlx::query("DELETE FROM feedback WHERE user_id = $1 AND book_id = $2")
                    .bind(user_id)
                    .bind(book_id)
                    .execute(&self.pool)
                    .await
            }
        };
        result.map_err(|e| port_error(e, || format!("Book {} not found", book_id)))?;
        Ok(())
    }

    async fn get_or_create_tag(&self, owner_id: Uuid, name: &str, color: &str) -> PortResult<Tag> {
        sqlx::query(
            "INSERT INTO tags (id, owner_id, name, color) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (name, owner_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(name)
        .bind(color)
        .execute(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("User {} not found", owner_id)))?;

        self.find_tag(owner_id, name)
            .await?
            .ok_or_else(|| PortError::Unexpected(format!("Tag '{}' vanished after insert", name)))
    }

    async fn find_tag(&self, owner_id: Uuid, name: &str) -> PortResult<Option<Tag>> {
        let record = sqlx::query_as::<_, TagRecord>(&format!(
            "SELECT {TAG_COLUMNS} FROM tags WHERE owner_id = $1 AND name = $2"
        ))
        .bind(owner_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(TagRecord::to_domain))
    }

    async fn get_tag(&self, tag_id: Uuid) -> PortResult<Tag> {
        let record = sqlx::query_as::<_, TagRecord>(&format!(
            "SELECT {TAG_COLUMNS} FROM tags WHERE id = $1"
        ))
        .bind(tag_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Tag {} not found", tag_id)))?;
        Ok(record.to_domain())
    }

    async fn list_user_tags(&self, owner_id: Uuid) -> PortResult<Vec<Tag>> {
        let records = sqlx::query_as::<_, TagRecord>(&format!(
            "SELECT {TAG_COLUMNS} FROM tags WHERE owner_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(TagRecord::to_domain).collect())
    }

    async fn autocomplete_tags(&self, owner_id: Uuid, q: &str) -> PortResult<Vec<Tag>> {
        let records = sqlx::query_as::<_, TagRecord>(&format!(
            "SELECT {TAG_COLUMNS} FROM tags WHERE owner_id = $1 AND name ILIKE $2 \
             ORDER BY lower(name) ASC"
        ))
        .bind(owner_id)
        .bind(format!("%{}%", escape_like(q)))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(TagRecord::to_domain).collect())
    }

    async fn update_tag(&self, tag_id: Uuid, name: &str, color: &str) -> PortResult<Tag> {
        let record = sqlx::query_as::<_, TagRecord>(&format!(
            "UPDATE tags SET name = $2, color = $3 WHERE id = $1 RETURNING {TAG_COLUMNS}"
        ))
        .bind(tag_id)
        .bind(name)
        .bind(color)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Tag '{}'", name)))?;
        Ok(record.to_domain())
    }

    async fn delete_tag(&self, tag_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Tag {} not found", tag_id)));
        }
        Ok(())
    }

    async fn tag_book(&self, tag_id: Uuid, book_id: Uuid) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO tag_books (tag_id, book_id) VALUES ($1, $2) \
             ON CONFLICT (tag_id, book_id) DO NOTHING",
        )
        .bind(tag_id)
        .bind(book_id)
        .execute(&self.pool)
        .await
        .map_err(|e| port_error(e, || format!("Book {} or tag {}", book_id, tag_id)))?;
        Ok(())
    }

    async fn untag_book(&self, tag_id: Uuid, book_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM tag_books WHERE tag_id = $1 AND book_id = $2")
            .bind(tag_id)
            .bind(book_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn tags_for_book(&self, owner_id: Uuid, book_id: Uuid) -> PortResult<Vec<Tag>> {
        let mut by_book = self.tags_by_book(owner_id, vec![book_id]).await?;
        Ok(by_book.remove(&book_id).unwrap_or_default())
    }
}
