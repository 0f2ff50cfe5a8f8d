//! SELECT builder for listing queries.
//!
//! Tables are addressed by alias. The base table is registered on
//! construction; relationships add joined tables, and sort handlers add
//! ORDER BY terms against any registered alias.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while building a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Unknown table alias: {0}")]
    UnknownAlias(String),
}

/// Only allows ASCII alphanumerics and underscores, not starting with a digit.
fn validate_identifier(name: &str) -> Result<(), QueryError> {
    if name.is_empty() {
        return Err(QueryError::InvalidIdentifier(
            "Empty identifier".to_string(),
        ));
    }

    let starts_with_digit = name.chars().next().is_some_and(|c| c.is_ascii_digit());
    if starts_with_digit || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(QueryError::InvalidIdentifier(name.to_string()));
    }

    Ok(())
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
}

impl JoinType {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

/// A joined table: `{kind} {table} {alias} ON {left_alias}.{left_field} = {alias}.{field}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub kind: JoinType,
    pub table: String,
    pub alias: String,
    pub field: String,
    pub left_alias: String,
    pub left_field: String,
}

impl Join {
    /// A LEFT JOIN of `table` on `left_alias.left_field = table.field`.
    pub fn left(
        table: impl Into<String>,
        field: impl Into<String>,
        left_alias: impl Into<String>,
        left_field: impl Into<String>,
    ) -> Self {
        let table = table.into();
        Self {
            kind: JoinType::Left,
            alias: table.clone(),
            table,
            field: field.into(),
            left_alias: left_alias.into(),
            left_field: left_field.into(),
        }
    }

    pub fn with_kind(mut self, kind: JoinType) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub table_alias: String,
    pub field: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone)]
pub struct SelectQuery {
    base_table: String,
    base_alias: String,
    joins: Vec<Join>,
    order_by: Vec<OrderBy>,
}

impl SelectQuery {
    /// Creates a query over `base_table`, aliased by its own name.
    pub fn new(base_table: impl Into<String>) -> Result<Self, QueryError> {
        let base_table = base_table.into();
        validate_identifier(&base_table)?;
        Ok(Self {
            base_alias: base_table.clone(),
            base_table,
            joins: Vec::new(),
            order_by: Vec::new(),
        })
    }

    pub fn base_table(&self) -> &str {
        &self.base_table
    }

    pub fn base_alias(&self) -> &str {
        &self.base_alias
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn order_by(&self) -> &[OrderBy] {
        &self.order_by
    }

    /// Returns the alias `table` is reachable under, if it is part of the query.
    pub fn ensure_table(&self, table: &str) -> Option<String> {
        if table == self.base_table {
            return Some(self.base_alias.clone());
        }
        self.joins
            .iter()
            .find(|j| j.table == table)
            .map(|j| j.alias.clone())
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        alias == self.base_alias || self.joins.iter().any(|j| j.alias == alias)
    }

    /// Adds a join and returns the alias it was registered under.
    ///
    /// A taken alias gets a numeric suffix (`items`, `items_1`, ...).
    pub fn add_join(&mut self, mut join: Join) -> Result<String, QueryError> {
        for name in [&join.table, &join.alias, &join.field, &join.left_field] {
            validate_identifier(name)?;
        }
        if !self.has_alias(&join.left_alias) {
            return Err(QueryError::UnknownAlias(join.left_alias));
        }

        let mut alias = join.alias.clone();
        let mut n = 1;
        while self.has_alias(&alias) {
            alias = format!("{}_{n}", join.alias);
            n += 1;
        }
        join.alias = alias.clone();
        self.joins.push(join);
        Ok(alias)
    }

    /// Appends `ORDER BY {table_alias}.{field} {order}`.
    pub fn add_order_by(
        &mut self,
        table_alias: &str,
        field: &str,
        order: SortOrder,
    ) -> Result<(), QueryError> {
        validate_identifier(field)?;
        if !self.has_alias(table_alias) {
            return Err(QueryError::UnknownAlias(table_alias.to_string()));
        }
        self.order_by.push(OrderBy {
            table_alias: table_alias.to_string(),
            field: field.to_string(),
            order,
        });
        Ok(())
    }

    /// Renders the ORDER BY clause, without the keyword. Empty if unsorted.
    pub fn order_clause(&self) -> String {
        self.order_by
            .iter()
            .map(|o| format!("{}.{} {}", o.table_alias, o.field, o.order))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn to_sql(&self) -> String {
        let mut sql = format!(
            "SELECT {alias}.* FROM {table} {alias}",
            alias = self.base_alias,
            table = self.base_table
        );

        for join in &self.joins {
            sql.push_str(&format!(
                " {} {} {} ON {}.{} = {}.{}",
                join.kind.as_sql(),
                join.table,
                join.alias,
                join.left_alias,
                join.left_field,
                join.alias,
                join.field
            ));
        }

        let order_clause = self.order_clause();
        if !order_clause.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order_clause);
        }

        sql
    }
}
