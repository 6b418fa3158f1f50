//! Graphviz DOT output with one HTML-like record per table.

use crate::render::{HeaderInfo, Layout};
use crate::schema::{Item, SchemaGraph, TableDef};
use crate::select::Selection;

/// Render the selection as a DOT document.
///
/// Tables become `shape=none` nodes labelled with an HTML-like table,
/// one row per column. The column name doubles as the row's port so
/// edges can anchor on the exact column they reference. Emission order
/// follows `selection.items`.
pub fn to_dot(
    graph: &SchemaGraph,
    selection: &Selection,
    layout: Layout,
    header: Option<&HeaderInfo>,
) -> String {
    let mut output = String::new();

    if let Some(info) = header {
        output.push_str("/*\n");
        output.push_str(&format!(
            " * Schema graph of '{}', created {}\n",
            info.source, info.created
        ));
        output.push_str(&format!(
            " * Generated by schemadot {}\n",
            env!("CARGO_PKG_VERSION")
        ));
        output.push_str(" */\n");
    }

    output.push_str("digraph schema {\n");
    output.push_str(&format!("  graph [ rankdir = \"{}\" ];\n", layout.rankdir()));

    for &item in &selection.items {
        match item {
            Item::Table(id) => {
                if let Some(table) = graph.table(id) {
                    push_table_record(&mut output, table, selection.highlighted.contains(&id));
                }
            }
            Item::Key(id) => {
                if let Some(key) = graph.key(id) {
                    for (source_column, target_column) in
                        key.source_columns.iter().zip(&key.target_columns)
                    {
                        output.push_str(&format!(
                            "  {}:{} -> {}:{}\n",
                            quote_id(&key.source_table),
                            quote_id(source_column),
                            quote_id(&key.target_table),
                            quote_id(target_column)
                        ));
                    }
                }
            }
        }
    }

    output.push_str("}\n");
    output
}

fn push_table_record(output: &mut String, table: &TableDef, highlighted: bool) {
    let color = if highlighted { "red" } else { "lightblue2" };

    output.push('\n');
    output.push_str(&format!("  {} [\n", quote_id(&table.name)));
    output.push_str("    shape=none\n");
    output.push_str("    label=<\n");
    output.push_str("      <table border=\"0\" cellspacing=\"0\" cellborder=\"1\">\n");
    output.push_str(&format!(
        "        <tr><td bgcolor=\"{}\"><font face=\"Times-bold\" point-size=\"20\">{}</font></td></tr>\n",
        color,
        escape_html(&table.name)
    ));
    for column in &table.columns {
        // The spec string is already label-escaped by the grammar.
        output.push_str(&format!(
            "        <tr><td bgcolor=\"grey96\" align=\"left\" port=\"{0}\"><font face=\"Times-bold\">{0}</font>  <font color=\"#535353\">{1}</font></td></tr>\n",
            escape_html(&column.name),
            column.spec
        ));
    }
    output.push_str("      </table>\n");
    output.push_str("    >];\n");
}

/// Always-quoted DOT identifier
fn quote_id(id: &str) -> String {
    format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Escape text for use inside an HTML-like label
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
