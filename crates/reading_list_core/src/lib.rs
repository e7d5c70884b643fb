pub mod category;
pub mod domain;
pub mod library;
pub mod ports;
pub mod search;
pub mod tags;
pub mod validation;

pub use category::{build_category_tree, decode_category_id, encode_category_id, CategoryNode};
pub use domain::{
    AuthSession, Book, BookDraft, BookView, Feedback, NewUser, ReadingStatus, Role, Tag, User,
    UserCredentials,
};
pub use ports::{DatabaseService, PortError, PortResult};
pub use search::{SearchMode, SearchQuery, Sort, SortColumn, SortOrder, UserFilters, ValueFilter};
pub use validation::ValidationError;
