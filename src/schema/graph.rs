//! Foreign-key graph built from classified statements.
//!
//! Provides:
//! - Graph construction with table-name resolution
//! - Bidirectional adjacency (outgoing and incoming keys per table)
//! - The parse-order item list consumed by the selector and renderers

use super::{ForeignKeyDef, GraphWarning, KeyId, TableDef, TableId};
use crate::grammar::Statement;
use ahash::AHashMap;

/// A statement retained for rendering, in parse order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item {
    Table(TableId),
    Key(KeyId),
}

/// All tables and foreign keys of one dump.
///
/// Adjacency lists carry only the keys whose both endpoints resolved, so
/// traversals never step through a dangling reference. Unresolved keys are
/// still retained in `keys` and `items`.
#[derive(Debug, Default)]
pub struct SchemaGraph {
    /// Table definitions indexed by TableId
    pub tables: Vec<TableDef>,
    /// Foreign key definitions indexed by KeyId
    pub keys: Vec<ForeignKeyDef>,
    /// Map from table name to ID; on duplicate names the last definition wins
    pub by_name: AHashMap<String, TableId>,
    /// Resolved (source, target) per key; None where the name has no table
    pub endpoints: Vec<(Option<TableId>, Option<TableId>)>,
    /// For each table, keys whose source is this table
    pub outgoing: Vec<Vec<KeyId>>,
    /// For each table, keys whose target is this table
    pub incoming: Vec<Vec<KeyId>>,
    /// Tables and keys interleaved in parse order
    pub items: Vec<Item>,
}

impl SchemaGraph {
    /// Build the graph from a classified statement sequence.
    ///
    /// Comments and unrecognized statements are dropped. Returns one
    /// warning per foreign-key endpoint naming an unknown table; such
    /// keys stay out of the adjacency lists but remain in `items`.
    pub fn from_statements<I>(statements: I) -> (Self, Vec<GraphWarning>)
    where
        I: IntoIterator<Item = Statement>,
    {
        let mut graph = SchemaGraph::default();

        for statement in statements {
            match statement {
                Statement::Table(def) => match graph.by_name.get(&def.name).copied() {
                    // A redefinition replaces the earlier table in place,
                    // keeping its original position in `items`.
                    Some(id) => graph.tables[id.0 as usize] = def,
                    None => {
                        let id = TableId(graph.tables.len() as u32);
                        graph.by_name.insert(def.name.clone(), id);
                        graph.tables.push(def);
                        graph.outgoing.push(Vec::new());
                        graph.incoming.push(Vec::new());
                        graph.items.push(Item::Table(id));
                    }
                },
                Statement::ForeignKey(def) => {
                    let id = KeyId(graph.keys.len() as u32);
                    graph.keys.push(def);
                    graph.items.push(Item::Key(id));
                }
                Statement::Comment | Statement::Other => {}
            }
        }

        let warnings = graph.resolve();
        (graph, warnings)
    }

    /// Resolve key endpoints against the name map and fill the adjacency
    /// lists. Runs after all statements are consumed because dumps may
    /// declare a foreign key before the table it references.
    fn resolve(&mut self) -> Vec<GraphWarning> {
        let mut warnings = Vec::new();

        for (index, key) in self.keys.iter().enumerate() {
            let id = KeyId(index as u32);

            let source = self.by_name.get(&key.source_table).copied();
            if source.is_none() {
                warnings.push(GraphWarning::UnknownTable {
                    name: key.source_table.clone(),
                });
            }

            let target = self.by_name.get(&key.target_table).copied();
            if target.is_none() {
                warnings.push(GraphWarning::UnknownTable {
                    name: key.target_table.clone(),
                });
            }

            self.endpoints.push((source, target));
            if let (Some(source), Some(target)) = (source, target) {
                self.outgoing[source.0 as usize].push(id);
                self.incoming[target.0 as usize].push(id);
            }
        }

        warnings
    }

    /// Get a table definition by ID
    pub fn table(&self, id: TableId) -> Option<&TableDef> {
        self.tables.get(id.0 as usize)
    }

    /// Get a foreign key definition by ID
    pub fn key(&self, id: KeyId) -> Option<&ForeignKeyDef> {
        self.keys.get(id.0 as usize)
    }

    /// Look up a table ID by exact name; quoting must already be stripped
    pub fn lookup(&self, name: &str) -> Option<TableId> {
        self.by_name.get(name).copied()
    }

    /// Endpoints of a key, present only when both table names resolved
    pub fn key_endpoints(&self, id: KeyId) -> Option<(TableId, TableId)> {
        match self.endpoints.get(id.0 as usize) {
            Some(&(Some(source), Some(target))) => Some((source, target)),
            _ => None,
        }
    }

    /// The `index`-th key incident to a table: outgoing keys first, then
    /// incoming. A self-referencing key appears once in each list.
    pub fn incident(&self, table: TableId, index: usize) -> Option<KeyId> {
        let outgoing = self.outgoing.get(table.0 as usize)?;
        if index < outgoing.len() {
            return Some(outgoing[index]);
        }
        let incoming = self.incoming.get(table.0 as usize)?;
        incoming.get(index - outgoing.len()).copied()
    }

    /// Get the number of tables in the graph
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Get the number of foreign keys in the graph
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}
