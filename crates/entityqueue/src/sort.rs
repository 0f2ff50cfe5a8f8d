//! Sort handler ordering listing rows by their queue.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::query::{QueryError, SortOrder};
use crate::view::View;

/// Permission allowing a user to configure listings.
pub const ADMINISTER_VIEWS: &str = "administer views";

/// Column of the subqueue items table the sort orders by.
const SORT_FIELD: &str = "bundle";

/// Permissions of the account rendering a listing.
pub trait AccountPermissions: Send + Sync {
    fn has_permission(&self, permission: &str) -> bool;
}

/// A fixed set of granted permissions.
#[derive(Debug, Clone, Default)]
pub struct PermissionSet {
    permissions: HashSet<String>,
}

impl PermissionSet {
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// An account without permissions.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl AccountPermissions for PermissionSet {
    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Status,
    Warning,
    Error,
}

/// Sink for messages shown to the user on the next page.
pub trait Messenger: Send + Sync {
    fn add_message(&self, message: String, kind: MessageType);
}

/// Messenger keeping messages in memory.
#[derive(Debug, Default)]
pub struct MemoryMessenger {
    messages: Mutex<Vec<(MessageType, String)>>,
}

impl MemoryMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(MessageType, String)> {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Messenger for MemoryMessenger {
    fn add_message(&self, message: String, kind: MessageType) {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((kind, message));
    }
}

/// Orders rows by the queue they are in.
///
/// Needs an entity queue relationship on the listing; the first one found is
/// used. Without one the sort adds nothing, and accounts that can configure
/// listings are told how to fix it.
#[derive(Debug, Clone)]
pub struct InQueueSort {
    table: String,
    order: SortOrder,
    relationship: Option<String>,
    table_alias: Option<String>,
}

impl InQueueSort {
    /// A sort declared on `table` (usually the listing's base table).
    pub fn new(table: impl Into<String>, order: SortOrder) -> Self {
        Self {
            table: table.into(),
            order,
            relationship: None,
            table_alias: None,
        }
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Id of the relationship the sort attached to.
    pub fn relationship(&self) -> Option<&str> {
        self.relationship.as_deref()
    }

    /// Alias the sort reads from.
    pub fn table_alias(&self) -> Option<&str> {
        self.table_alias.as_deref()
    }

    /// Adds the sort to the listing's query.
    pub fn query(
        &mut self,
        view: &mut View,
        account: &dyn AccountPermissions,
        messenger: &dyn Messenger,
    ) -> Result<(), QueryError> {
        self.table_alias = view.query.ensure_table(&self.table);

        let queue_relationship = view
            .relationships()
            .iter()
            .find(|r| r.is_entity_queue())
            .map(|r| (r.id().to_string(), r.first_alias().map(str::to_string)));

        match queue_relationship {
            Some((id, first_alias)) => {
                let alias = first_alias.ok_or_else(|| QueryError::UnknownAlias(id.clone()))?;
                view.query.add_order_by(&alias, SORT_FIELD, self.order)?;
                tracing::debug!(
                    view = %view.label(),
                    relationship = %id,
                    alias = %alias,
                    order = %self.order,
                    "In-queue sort added"
                );
                self.relationship = Some(id);
                self.table_alias = Some(alias);
            }
            None => {
                tracing::debug!(
                    view = %view.label(),
                    display = %view.current_display(),
                    "In-queue sort skipped, no entity queue relationship"
                );
                if account.has_permission(ADMINISTER_VIEWS) {
                    messenger.add_message(
                        format!(
                            "In order to sort by in queue, you need to add the Entityqueue: Queue relationship on View: {} with display: {}",
                            view.label(),
                            view.current_display()
                        ),
                        MessageType::Error,
                    );
                }
            }
        }

        Ok(())
    }
}
