//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port. It backs the
//! integration tests and `DATABASE_URL=memory://` local runs. All state lives
//! behind one lock, so every port call is atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reading_list_core::domain::{
    AuthSession, Book, BookDraft, BookView, Feedback, NewUser, ReadingStatus, Role, Tag, User,
    UserCredentials,
};
use reading_list_core::ports::{DatabaseService, PortError, PortResult};
use reading_list_core::search::SearchQuery;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

struct UserRow {
    user: User,
    hashed_password: String,
}

#[derive(Default)]
struct Store {
    users: Vec<UserRow>,
    sessions: HashMap<String, AuthSession>,
    books: BTreeMap<Uuid, Book>,
    statuses: HashMap<(Uuid, Uuid), ReadingStatus>,
    feedback: HashMap<(Uuid, Uuid), Feedback>,
    /// Creation order.
    tags: Vec<Tag>,
    /// `(tag_id, book_id)` in link order.
    tag_books: Vec<(Uuid, Uuid)>,
}

impl Store {
    fn user_row(&self, user_id: Uuid) -> PortResult<&UserRow> {
        self.users
            .iter()
            .find(|row| row.user.id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    fn ensure_book(&self, book_id: Uuid) -> PortResult<&Book> {
        self.books
            .get(&book_id)
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", book_id)))
    }

    fn tags_for_book(&self, owner_id: Uuid, book_id: Uuid) -> Vec<Tag> {
        self.tag_books
            .iter()
            .filter(|(_, b)| *b == book_id)
            .filter_map(|(t, _)| self.tags.iter().find(|tag| tag.id == *t))
            .filter(|tag| tag.owner_id == owner_id)
            .cloned()
            .collect()
    }

    fn view(&self, book: &Book, viewer: Option<Uuid>) -> BookView {
        match viewer {
            Some(user_id) => BookView {
                book: book.clone(),
                status: self.statuses.get(&(user_id, book.id)).copied(),
                feedback: self.feedback.get(&(user_id, book.id)).copied(),
                tags: self.tags_for_book(user_id, book.id),
            },
            None => BookView::anonymous(book.clone()),
        }
    }
}

fn dedup_roles(roles: Vec<Role>) -> Vec<Role> {
    roles.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

/// A `DatabaseService` that keeps everything in memory.
#[derive(Default)]
pub struct MemoryAdapter {
    store: RwLock<Store>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatabaseService for MemoryAdapter {
    async fn ping(&self) -> PortResult<()> {
        Ok(())
    }

    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut store = self.store.write().await;
        let email_taken = store
            .users
            .iter()
            .any(|row| row.user.email.eq_ignore_ascii_case(&new_user.email));
        if email_taken {
            return Err(PortError::Conflict(format!(
                "User with email {} already exists",
                new_user.email
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            roles: dedup_roles(new_user.roles),
            active: true,
            created_at: Utc::now(),
        };
        store.users.push(UserRow {
            user: user.clone(),
            hashed_password: new_user.hashed_password,
        });
        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let store = self.store.read().await;
        Ok(store.user_row(user_id)?.user.clone())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let store = self.store.read().await;
        store
            .users
            .iter()
            .find(|row| row.user.email.eq_ignore_ascii_case(email))
            .map(|row| UserCredentials {
                user_id: row.user.id,
                email: row.user.email.clone(),
                hashed_password: row.hashed_password.clone(),
                active: row.user.active,
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        let store = self.store.read().await;
        let mut users: Vec<User> = store.users.iter().map(|row| row.user.clone()).collect();
        users.sort_by_key(|u| u.email.to_lowercase());
        Ok(users)
    }

    async fn update_user(&self, user_id: Uuid, roles: Vec<Role>, active: bool) -> PortResult<User> {
        let mut store = self.store.write().await;
        let row = store
            .users
            .iter_mut()
            .find(|row| row.user.id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        row.user.roles = dedup_roles(roles);
        row.user.active = active;
        Ok(row.user.clone())
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        let mut store = self.store.write().await;
        store.user_row(user_id)?;
        store.users.retain(|row| row.user.id != user_id);
        store.sessions.retain(|_, s| s.user_id != user_id);
        store.statuses.retain(|(u, _), _| *u != user_id);
        store.feedback.retain(|(u, _), _| *u != user_id);
        let owned: BTreeSet<Uuid> = store
            .tags
            .iter()
            .filter(|t| t.owner_id == user_id)
            .map(|t| t.id)
            .collect();
        store.tags.retain(|t| t.owner_id != user_id);
        store.tag_books.retain(|(t, _)| !owned.contains(t));
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut store = self.store.write().await;
        store.user_row(user_id)?;
        store.sessions.insert(
            session_id.to_string(),
            AuthSession {
                id: session_id.to_string(),
                user_id,
                expires_at,
            },
        );
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let store = self.store.read().await;
        let session = store
            .sessions
            .get(session_id)
            .filter(|s| s.expires_at > Utc::now())
            .ok_or(PortError::Unauthorized)?;
        match store.user_row(session.user_id) {
            Ok(row) if row.user.active => Ok(session.user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.store.write().await.sessions.remove(session_id);
        Ok(())
    }

    async fn create_book(&self, draft: BookDraft) -> PortResult<Book> {
        let book = draft.into_book(Uuid::new_v4());
        self.store.write().await.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update_book(&self, book_id: Uuid, draft: BookDraft) -> PortResult<Book> {
        let mut store = self.store.write().await;
        let slot = store
            .books
            .get_mut(&book_id)
            .ok_or_else(|| PortError::NotFound(format!("Book {} not found", book_id)))?;
        *slot = draft.into_book(book_id);
        Ok(slot.clone())
    }

    async fn delete_book(&self, book_id: Uuid) -> PortResult<()> {
        let mut store = self.store.write().await;
        if store.books.remove(&book_id).is_none() {
            return Err(PortError::NotFound(format!("Book {} not found", book_id)));
        }
        store.statuses.retain(|(_, b), _| *b != book_id);
        store.feedback.retain(|(_, b), _| *b != book_id);
        store.tag_books.retain(|(_, b)| *b != book_id);
        Ok(())
    }

    async fn get_book(&self, book_id: Uuid) -> PortResult<Book> {
        let store = self.store.read().await;
        store.ensure_book(book_id).cloned()
    }

    async fn get_book_view(&self, book_id: Uuid, viewer: Option<Uuid>) -> PortResult<BookView> {
        let store = self.store.read().await;
        let book = store.ensure_book(book_id)?;
        Ok(store.view(book, viewer))
    }

    async fn list_category_paths(&self) -> PortResult<Vec<String>> {
        let store = self.store.read().await;
        let paths: BTreeSet<String> = store
            .books
            .values()
            .filter_map(|b| b.categories_flat.clone())
            .filter(|p| !p.is_empty())
            .collect();
        Ok(paths.into_iter().collect())
    }

    async fn search_books(&self, query: &SearchQuery) -> PortResult<Vec<BookView>> {
        let store = self.store.read().await;
        let candidates = store.books.values().map(|b| store.view(b, query.viewer()));
        Ok(query.apply(candidates))
    }

    async fn set_reading_status(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        status: Option<ReadingStatus>,
    ) -> PortResult<()> {
        let mut store = self.store.write().await;
        store.ensure_book(book_id)?;
        match status {
            Some(status) => {
                store.statuses.insert((user_id, book_id), status);
            }
            None => {
                store.statuses.remove(&(user_id, book_id));
            }
        }
        Ok(())
    }

    async fn set_feedback(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        feedback: Option<Feedback>,
    ) -> PortResult<()> {
        let mut store = self.store.write().await;
        store.ensure_book(book_id)?;
        match feedback {
            Some(feedback) => {
                store.feedback.insert((user_id, book_id), feedback);
            }
            None => {
                store.feedback.remove(&(user_id, book_id));
            }
        }
        Ok(())
    }

    async fn get_or_create_tag(&self, owner_id: Uuid, name: &str, color: &str) -> PortResult<Tag> {
        let mut store = self.store.write().await;
        if let Some(tag) = store
            .tags
            .iter()
            .find(|t| t.owner_id == owner_id && t.name == name)
        {
            return Ok(tag.clone());
        }
        let tag = Tag {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            color: color.to_string(),
        };
        store.tags.push(tag.clone());
        Ok(tag)
    }

    async fn find_tag(&self, owner_id: Uuid, name: &str) -> PortResult<Option<Tag>> {
        let store = self.store.read().await;
        Ok(store
            .tags
            .iter()
            .find(|t| t.owner_id == owner_id && t.name == name)
            .cloned())
    }

    async fn get_tag(&self, tag_id: Uuid) -> PortResult<Tag> {
        let store = self.store.read().await;
        store
            .tags
            .iter()
            .find(|t| t.id == tag_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Tag {} not found", tag_id)))
    }

    async fn list_user_tags(&self, owner_id: Uuid) -> PortResult<Vec<Tag>> {
        let store = self.store.read().await;
        Ok(store
            .tags
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn autocomplete_tags(&self, owner_id: Uuid, q: &str) -> PortResult<Vec<Tag>> {
        let needle = q.to_lowercase();
        let store = self.store.read().await;
        let mut tags: Vec<Tag> = store
            .tags
            .iter()
            .filter(|t| t.owner_id == owner_id && t.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        tags.sort_by_key(|t| t.name.to_lowercase());
        Ok(tags)
    }

    async fn update_tag(&self, tag_id: Uuid, name: &str, color: &str) -> PortResult<Tag> {
        let mut store = self.store.write().await;
        let owner_id = store
            .tags
            .iter()
            .find(|t| t.id == tag_id)
            .map(|t| t.owner_id)
            .ok_or_else(|| PortError::NotFound(format!("Tag {} not found", tag_id)))?;
        let clash = store
            .tags
            .iter()
            .any(|t| t.owner_id == owner_id && t.id != tag_id && t.name == name);
        if clash {
            return Err(PortError::Conflict(format!("Tag '{}' already exists", name)));
        }
        let tag = store
            .tags
            .iter_mut()
            .find(|t| t.id == tag_id)
            .ok_or_else(|| PortError::NotFound(format!("Tag {} not found", tag_id)))?;
        tag.name = name.to_string();
        tag.color = color.to_string();
        Ok(tag.clone())
    }

    async fn delete_tag(&self, tag_id: Uuid) -> PortResult<()> {
        let mut store = self.store.write().await;
        let before = store.tags.len();
        store.tags.retain(|t| t.id != tag_id);
        if store.tags.len() == before {
            return Err(PortError::NotFound(format!("Tag {} not found", tag_id)));
        }
        store.tag_books.retain(|(t, _)| *t != tag_id);
        Ok(())
    }

    async fn tag_book(&self, tag_id: Uuid, book_id: Uuid) -> PortResult<()> {
        let mut store = self.store.write().await;
        store.ensure_book(book_id)?;
        if !store.tags.iter().any(|t| t.id == tag_id) {
            return Err(PortError::NotFound(format!("Tag {} not found", tag_id)));
        }
        if !store.tag_books.contains(&(tag_id, book_id)) {
            store.tag_books.push((tag_id, book_id));
        }
        Ok(())
    }

    async fn untag_book(&self, tag_id: Uuid, book_id: Uuid) -> PortResult<()> {
        self.store
            .write()
            .await
            .tag_books
            .retain(|link| *link != (tag_id, book_id));
        Ok(())
    }

    async fn tags_for_book(&self, owner_id: Uuid, book_id: Uuid) -> PortResult<Vec<Tag>> {
        let store = self.store.read().await;
        Ok(store.tags_for_book(owner_id, book_id))
    }
}
