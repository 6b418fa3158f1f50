//! Schema data model.
//!
//! This module provides:
//! - Immutable value records produced by the grammar (tables, columns,
//!   foreign keys)
//! - The foreign-key graph with name resolution and per-table adjacency
//!
//! Parsed records are never mutated after construction; resolution and
//! selection build derived structures (id maps, adjacency, highlight sets)
//! on top of them.

mod graph;

pub use graph::*;

use smallvec::SmallVec;
use std::fmt;

/// Column names on one side of a foreign key; most keys use one or two
pub type ColumnList = SmallVec<[String; 2]>;

/// Unique identifier for a table, in parse order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({})", self.0)
    }
}

/// Unique identifier for a foreign key, in parse order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyId(pub u32);

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", self.0)
    }
}

/// One column of a table definition
///
/// `spec` holds the type/constraint clause as a single display string,
/// whitespace collapsed and already escaped for HTML-like labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub spec: String,
}

/// A parsed CREATE TABLE statement; column order is declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

/// Referential action of an ON UPDATE / ON DELETE clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefAction {
    Cascade,
    Restrict,
    NoAction,
    SetNull,
    SetDefault,
}

impl RefAction {
    /// Parse the SQL spelling, tolerating case and internal whitespace
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_uppercase().as_str() {
            "CASCADE" => Some(RefAction::Cascade),
            "RESTRICT" => Some(RefAction::Restrict),
            "NO ACTION" => Some(RefAction::NoAction),
            "SET NULL" => Some(RefAction::SetNull),
            "SET DEFAULT" => Some(RefAction::SetDefault),
            _ => None,
        }
    }
}

/// A parsed ALTER TABLE .. ADD CONSTRAINT .. FOREIGN KEY statement
///
/// Column lists are positional: `source_columns[i]` references
/// `target_columns[i]`, and both lists always have the same length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDef {
    /// Referencing table name
    pub source_table: String,
    /// Referencing column names
    pub source_columns: ColumnList,
    /// Referenced table name
    pub target_table: String,
    /// Referenced column names
    pub target_columns: ColumnList,
    pub on_update: Option<RefAction>,
    pub on_delete: Option<RefAction>,
}

/// Non-fatal problems found while resolving names against the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphWarning {
    /// A foreign key or filter argument named a table with no CREATE TABLE
    UnknownTable { name: String },
}

impl fmt::Display for GraphWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphWarning::UnknownTable { name } => write!(f, "unknown table '{}'", name),
        }
    }
}
