//! JSON output of the selected graph for programmatic consumers.

use serde::Serialize;

use crate::schema::{Item, SchemaGraph};
use crate::select::Selection;

#[derive(Debug, Serialize)]
pub struct GraphJson {
    pub tables: Vec<TableJson>,
    pub relationships: Vec<RelationshipJson>,
    pub stats: GraphStats,
}

#[derive(Debug, Serialize)]
pub struct TableJson {
    pub name: String,
    pub highlighted: bool,
    pub columns: Vec<ColumnJson>,
}

#[derive(Debug, Serialize)]
pub struct ColumnJson {
    pub name: String,
    pub spec: String,
}

/// One entry per referencing/referenced column pair, so composite keys
/// expand the same way they do in dot output.
#[derive(Debug, Serialize)]
pub struct RelationshipJson {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
}

#[derive(Debug, Serialize)]
pub struct GraphStats {
    pub table_count: usize,
    pub relationship_count: usize,
}

pub fn build_graph_json(graph: &SchemaGraph, selection: &Selection) -> GraphJson {
    let mut tables = Vec::new();
    let mut relationships = Vec::new();

    for &item in &selection.items {
        match item {
            Item::Table(id) => {
                if let Some(table) = graph.table(id) {
                    tables.push(TableJson {
                        name: table.name.clone(),
                        highlighted: selection.highlighted.contains(&id),
                        columns: table
                            .columns
                            .iter()
                            .map(|column| ColumnJson {
                                name: column.name.clone(),
                                spec: column.spec.clone(),
                            })
                            .collect(),
                    });
                }
            }
            Item::Key(id) => {
                if let Some(key) = graph.key(id) {
                    for (source_column, target_column) in
                        key.source_columns.iter().zip(&key.target_columns)
                    {
                        relationships.push(RelationshipJson {
                            source_table: key.source_table.clone(),
                            source_column: source_column.clone(),
                            target_table: key.target_table.clone(),
                            target_column: target_column.clone(),
                        });
                    }
                }
            }
        }
    }

    let stats = GraphStats {
        table_count: tables.len(),
        relationship_count: relationships.len(),
    };

    GraphJson {
        tables,
        relationships,
        stats,
    }
}

pub fn to_json(graph: &SchemaGraph, selection: &Selection) -> String {
    let output = build_graph_json(graph, selection);
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}
