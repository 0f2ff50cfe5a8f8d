//! # entityqueue
//!
//! Ordering listings by the position of their rows in an entity queue.
//!
//! - [`query`] - a small SELECT builder with joins and ORDER BY
//! - [`view`] - a listing with its relationships and query
//! - [`sort`] - the "in queue" sort handler

pub mod query;
pub mod sort;
pub mod view;

pub use query::{Join, JoinType, OrderBy, QueryError, SelectQuery, SortOrder};
pub use sort::{
    ADMINISTER_VIEWS, AccountPermissions, InQueueSort, MemoryMessenger, MessageType, Messenger,
    PermissionSet,
};
pub use view::{Relationship, RelationshipKind, SUBQUEUE_ITEMS_TABLE, View};
