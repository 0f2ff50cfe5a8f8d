//! Listings and their relationships.

use crate::query::{Join, QueryError, SelectQuery};

/// Table holding the items of every subqueue, one row per queued entity.
pub const SUBQUEUE_ITEMS_TABLE: &str = "entity_subqueue__items";

/// Column of [`SUBQUEUE_ITEMS_TABLE`] referencing the queued entity.
const ITEMS_TARGET_FIELD: &str = "items_target_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationshipKind {
    /// Joins the subqueue items the listed entity is part of.
    EntityQueue,
    /// Any other relationship, joining `table` on `field`.
    Other { table: String, field: String },
}

/// A named relationship handler of a listing.
#[derive(Debug, Clone)]
pub struct Relationship {
    id: String,
    kind: RelationshipKind,
    base_field: String,
    first_alias: Option<String>,
}

impl Relationship {
    /// Relationship to the entity queues the listed entity belongs to.
    ///
    /// `base_field` is the id column of the listed entity.
    pub fn entity_queue(id: impl Into<String>, base_field: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: RelationshipKind::EntityQueue,
            base_field: base_field.into(),
            first_alias: None,
        }
    }

    pub fn other(
        id: impl Into<String>,
        table: impl Into<String>,
        field: impl Into<String>,
        base_field: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: RelationshipKind::Other {
                table: table.into(),
                field: field.into(),
            },
            base_field: base_field.into(),
            first_alias: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &RelationshipKind {
        &self.kind
    }

    pub fn is_entity_queue(&self) -> bool {
        self.kind == RelationshipKind::EntityQueue
    }

    /// Alias of the first table this relationship joined. Set by [`Self::query`].
    pub fn first_alias(&self) -> Option<&str> {
        self.first_alias.as_deref()
    }

    /// Adds this relationship's join to `query`.
    pub fn query(&mut self, query: &mut SelectQuery) -> Result<(), QueryError> {
        let base_alias = query.base_alias().to_string();
        let join = match &self.kind {
            RelationshipKind::EntityQueue => Join::left(
                SUBQUEUE_ITEMS_TABLE,
                ITEMS_TARGET_FIELD,
                base_alias,
                self.base_field.clone(),
            )
            .with_alias(format!("{}_{}", SUBQUEUE_ITEMS_TABLE, self.id)),
            RelationshipKind::Other { table, field } => {
                Join::left(table.clone(), field.clone(), base_alias, self.base_field.clone())
            }
        };

        let alias = query.add_join(join)?;
        tracing::trace!(relationship = %self.id, alias = %alias, "Relationship joined");
        self.first_alias = Some(alias);
        Ok(())
    }
}

/// A listing: a label, the display being rendered, its relationships in
/// configuration order, and the query they build.
#[derive(Debug, Clone)]
pub struct View {
    label: String,
    current_display: String,
    relationships: Vec<Relationship>,
    pub query: SelectQuery,
}

impl View {
    pub fn new(
        label: impl Into<String>,
        current_display: impl Into<String>,
        base_table: impl Into<String>,
    ) -> Result<Self, QueryError> {
        Ok(Self {
            label: label.into(),
            current_display: current_display.into(),
            relationships: Vec::new(),
            query: SelectQuery::new(base_table)?,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn current_display(&self) -> &str {
        &self.current_display
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Adds a relationship and joins it into the query.
    pub fn add_relationship(&mut self, mut relationship: Relationship) -> Result<(), QueryError> {
        relationship.query(&mut self.query)?;
        self.relationships.push(relationship);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_queue_relationship_joins_items() {
        let mut view = View::new("Frontpage", "page_1", "node_field_data").unwrap();
        view.add_relationship(Relationship::entity_queue("entityqueue_relationship", "nid"))
            .unwrap();

        let rel = &view.relationships()[0];
        assert!(rel.is_entity_queue());
        assert_eq!(
            rel.first_alias(),
            Some("entity_subqueue__items_entityqueue_relationship")
        );
        assert_eq!(
            view.query.to_sql(),
            "SELECT node_field_data.* FROM node_field_data node_field_data \
             LEFT JOIN entity_subqueue__items entity_subqueue__items_entityqueue_relationship \
             ON node_field_data.nid = entity_subqueue__items_entityqueue_relationship.items_target_id"
        );
    }

    #[test]
    fn test_other_relationship() {
        let mut view = View::new("Content", "default", "node_field_data").unwrap();
        view.add_relationship(Relationship::other("uid", "users_field_data", "uid", "uid"))
            .unwrap();

        let rel = &view.relationships()[0];
        assert!(!rel.is_entity_queue());
        assert_eq!(rel.first_alias(), Some("users_field_data"));
    }

    #[test]
    fn test_invalid_relationship_not_added() {
        let mut view = View::new("Content", "default", "node_field_data").unwrap();
        let err = view
            .add_relationship(Relationship::other("bad", "users; --", "uid", "uid"))
            .unwrap_err();

        assert!(matches!(err, QueryError::InvalidIdentifier(_)));
        assert!(view.relationships().is_empty());
    }
}
