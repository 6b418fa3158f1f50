//! End-to-end tests of the scan -> classify -> graph -> select -> render
//! pipeline through the library API.
//!
//! Tests cover:
//! - A realistic pg_dump-shaped schema dump
//! - Forward references and unresolved references
//! - Neighborhood and path selection through the full pipeline
//! - Escaping guarantees of the dot output
//! - Scan failure on unterminated input

use schemadot::grammar::{classify, Statement};
use schemadot::render::{to_dot, to_json, Layout};
use schemadot::scanner::{ScanError, Scanner, SMALL_BUFFER_SIZE};
use schemadot::schema::{GraphWarning, SchemaGraph};
use schemadot::select::Selection;

const PG_DUMP: &str = r#"--
-- PostgreSQL database dump
--

SET statement_timeout = 0;
SET client_encoding = 'UTF8';
SELECT pg_catalog.set_config('search_path', '', false);

CREATE TABLE public.users (
    id integer NOT NULL,
    email character varying(255) DEFAULT ''::character varying NOT NULL,
    created_at timestamp without time zone DEFAULT now()
);

CREATE SEQUENCE public.users_id_seq AS integer START WITH 1 INCREMENT BY 1 NO MINVALUE NO MAXVALUE CACHE 1;

ALTER TABLE ONLY public.users ALTER COLUMN id SET DEFAULT nextval('public.users_id_seq'::regclass);

CREATE TABLE public.orders (
    id integer NOT NULL,
    user_id integer,
    total numeric(10,2)
);

CREATE TABLE public.order_items (
    id integer NOT NULL,
    order_id integer,
    sku text
);

CREATE INDEX idx_orders_user ON public.orders USING btree (user_id);

ALTER TABLE ONLY public.users ADD CONSTRAINT users_pkey PRIMARY KEY (id);

ALTER TABLE ONLY public.orders
    ADD CONSTRAINT orders_user_id_fkey FOREIGN KEY (user_id) REFERENCES public.users(id) ON DELETE CASCADE;

ALTER TABLE ONLY public.order_items
    ADD CONSTRAINT order_items_order_id_fkey FOREIGN KEY (order_id) REFERENCES public.orders(id);
"#;

fn scan(input: &str) -> Vec<Statement> {
    let mut scanner = Scanner::new(input.as_bytes(), SMALL_BUFFER_SIZE);
    let mut statements = Vec::new();
    while let Some(span) = scanner.read_span().unwrap() {
        statements.push(classify(&String::from_utf8_lossy(&span)).unwrap());
    }
    statements
}

fn graph_of(input: &str) -> (SchemaGraph, Vec<GraphWarning>) {
    SchemaGraph::from_statements(scan(input))
}

#[test]
fn test_pg_dump_end_to_end() {
    let (graph, warnings) = graph_of(PG_DUMP);
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    assert_eq!(graph.table_count(), 3);
    assert_eq!(graph.key_count(), 2);

    let selection = Selection::unfiltered(&graph);
    let dot = to_dot(&graph, &selection, Layout::LR, None);

    assert!(dot.starts_with("digraph schema {\n  graph [ rankdir = \"LR\" ];\n"));
    assert!(dot.ends_with("}\n"));
    assert!(dot.contains("  \"public.users\" [\n"));
    assert!(dot.contains("  \"public.orders\" [\n"));
    assert!(dot.contains("  \"public.order_items\" [\n"));
    assert!(dot.contains("  \"public.orders\":\"user_id\" -> \"public.users\":\"id\"\n"));
    assert!(dot.contains("  \"public.order_items\":\"order_id\" -> \"public.orders\":\"id\"\n"));
    assert_eq!(dot.matches(" -> ").count(), 2);

    // Sequences, indexes and the primary-key constraint leave no trace.
    assert!(!dot.contains("users_id_seq"));
    assert!(!dot.contains("idx_orders_user"));
    assert!(!dot.contains("users_pkey"));
}

#[test]
fn test_column_specs_survive_the_pipeline() {
    let (graph, _) = graph_of(PG_DUMP);
    let selection = Selection::unfiltered(&graph);
    let dot = to_dot(&graph, &selection, Layout::LR, None);

    // Quoted default literal stays glued to its cast.
    assert!(dot.contains("character varying (255) DEFAULT ''::character varying NOT NULL"));
    // Parenthesized precision does not split the column.
    assert!(dot.contains("numeric (10,2)"));
    // One header row plus one row per column, per table.
    assert_eq!(dot.matches("<tr>").count(), 3 + 9);
}

#[test]
fn test_forward_reference_resolves() {
    let input = "\
ALTER TABLE articles ADD CONSTRAINT fk1 FOREIGN KEY (author_id) REFERENCES authors (id);
CREATE TABLE articles (id integer, author_id integer);
CREATE TABLE authors (id integer);
";
    let (graph, warnings) = graph_of(input);
    assert!(warnings.is_empty());

    let selection = Selection::unfiltered(&graph);
    let dot = to_dot(&graph, &selection, Layout::LR, None);
    assert!(dot.contains("  \"articles\":\"author_id\" -> \"authors\":\"id\"\n"));
}

#[test]
fn test_unresolved_reference_warns_without_edge() {
    let input = "\
CREATE TABLE posts (id integer, author_id integer);
ALTER TABLE posts ADD CONSTRAINT fk1 FOREIGN KEY (author_id) REFERENCES ghosts (id);
";
    let (graph, warnings) = graph_of(input);
    assert_eq!(
        warnings,
        vec![GraphWarning::UnknownTable {
            name: "ghosts".to_string()
        }]
    );

    let selection = Selection::unfiltered(&graph);
    let dot = to_dot(&graph, &selection, Layout::LR, None);
    assert!(dot.contains("  \"posts\" [\n"));
    assert!(!dot.contains(" -> "));
}

#[test]
fn test_neighborhood_keeps_the_connected_component() {
    let input = format!("{PG_DUMP}\nCREATE TABLE public.audit_log (id integer);\n");
    let (graph, _) = graph_of(&input);

    let (selection, warnings) = Selection::neighborhood(&graph, &["public.users".to_string()]);
    assert!(warnings.is_empty());

    let dot = to_dot(&graph, &selection, Layout::LR, None);
    assert!(dot.contains("  \"public.users\" [\n"));
    assert!(dot.contains("  \"public.orders\" [\n"));
    assert!(dot.contains("  \"public.order_items\" [\n"));
    assert!(!dot.contains("audit_log"));

    // Seed is emphasized, the rest of the component is not.
    assert!(dot.contains(
        "<td bgcolor=\"red\"><font face=\"Times-bold\" point-size=\"20\">public.users</font>"
    ));
    assert!(dot.contains(
        "<td bgcolor=\"lightblue2\"><font face=\"Times-bold\" point-size=\"20\">public.orders</font>"
    ));
}

#[test]
fn test_paths_mode_drops_side_branches() {
    let input = "\
CREATE TABLE a (id integer, b_id integer);
CREATE TABLE b (id integer, c_id integer);
CREATE TABLE c (id integer);
CREATE TABLE d (id integer, b_id integer);
ALTER TABLE a ADD CONSTRAINT fk1 FOREIGN KEY (b_id) REFERENCES b (id);
ALTER TABLE b ADD CONSTRAINT fk2 FOREIGN KEY (c_id) REFERENCES c (id);
ALTER TABLE d ADD CONSTRAINT fk3 FOREIGN KEY (b_id) REFERENCES b (id);
";
    let (graph, _) = graph_of(input);

    let (selection, warnings) =
        Selection::paths(&graph, &["a".to_string(), "c".to_string()]);
    assert!(warnings.is_empty());

    let dot = to_dot(&graph, &selection, Layout::LR, None);
    assert!(dot.contains("  \"a\" [\n"));
    assert!(dot.contains("  \"b\" [\n"));
    assert!(dot.contains("  \"c\" [\n"));
    assert!(!dot.contains("  \"d\" [\n"));
    assert!(dot.contains("  \"a\":\"b_id\" -> \"b\":\"id\"\n"));
    assert!(dot.contains("  \"b\":\"c_id\" -> \"c\":\"id\"\n"));
    assert!(!dot.contains("\"d\":"));

    // Both terminals are emphasized, the intermediate hop is not.
    assert_eq!(dot.matches("bgcolor=\"red\"").count(), 2);
    assert_eq!(dot.matches("bgcolor=\"lightblue2\"").count(), 1);
}

#[test]
fn test_composite_key_renders_one_edge_per_column() {
    let input = "\
CREATE TABLE parts (maker text, model text);
CREATE TABLE stock (maker text, model text, qty integer);
ALTER TABLE stock ADD CONSTRAINT fk1 FOREIGN KEY (maker, model) REFERENCES parts (maker, model);
";
    let (graph, _) = graph_of(input);
    let selection = Selection::unfiltered(&graph);
    let dot = to_dot(&graph, &selection, Layout::LR, None);

    assert!(dot.contains("  \"stock\":\"maker\" -> \"parts\":\"maker\"\n"));
    assert!(dot.contains("  \"stock\":\"model\" -> \"parts\":\"model\"\n"));
    assert_eq!(dot.matches(" -> ").count(), 2);
}

#[test]
fn test_check_constraints_are_label_safe() {
    let input = "CREATE TABLE t (points integer CHECK (points > 0 AND points < 100));";
    let (graph, _) = graph_of(input);
    let selection = Selection::unfiltered(&graph);
    let dot = to_dot(&graph, &selection, Layout::LR, None);

    assert!(dot.contains("integer CHECK (points &gt; 0 AND points &lt; 100)"));
    assert!(!dot.contains("points > 0"));
    assert!(!dot.contains("points < 100"));
}

#[test]
fn test_quoted_semicolons_do_not_split_statements() {
    let input = "CREATE TABLE t (sep text DEFAULT ';'::text, id integer);";
    let (graph, warnings) = graph_of(input);
    assert!(warnings.is_empty());
    assert_eq!(graph.table_count(), 1);

    let table = graph.table(schemadot::schema::TableId(0)).unwrap();
    assert_eq!(table.columns.len(), 2);
    assert_eq!(table.columns[1].name, "id");
}

#[test]
fn test_unterminated_statement_is_fatal() {
    let mut scanner = Scanner::new(&b"CREATE TABLE broken (id integer"[..], SMALL_BUFFER_SIZE);
    let result = scanner.read_span();
    assert!(matches!(result, Err(ScanError::UnterminatedStatement)));
}

#[test]
fn test_unterminated_string_is_fatal() {
    let mut scanner = Scanner::new(
        &b"CREATE TABLE t (name text DEFAULT 'oops);"[..],
        SMALL_BUFFER_SIZE,
    );
    let result = scanner.read_span();
    assert!(matches!(result, Err(ScanError::UnterminatedString)));
}

#[test]
fn test_empty_input_renders_empty_diagram() {
    let (graph, warnings) = graph_of("");
    assert!(warnings.is_empty());

    let selection = Selection::unfiltered(&graph);
    let dot = to_dot(&graph, &selection, Layout::LR, None);
    assert_eq!(dot, "digraph schema {\n  graph [ rankdir = \"LR\" ];\n}\n");
}

#[test]
fn test_comment_only_input_renders_empty_diagram() {
    let input = "-- just a comment\n-- and another one\n";
    let (graph, warnings) = graph_of(input);
    assert!(warnings.is_empty());
    assert_eq!(graph.table_count(), 0);

    let selection = Selection::unfiltered(&graph);
    let dot = to_dot(&graph, &selection, Layout::LR, None);
    assert_eq!(dot, "digraph schema {\n  graph [ rankdir = \"LR\" ];\n}\n");
}

#[test]
fn test_duplicate_definition_renders_once() {
    let input = "\
CREATE TABLE users (id integer);
CREATE TABLE users (id integer, email text);
";
    let (graph, _) = graph_of(input);
    let selection = Selection::unfiltered(&graph);
    let dot = to_dot(&graph, &selection, Layout::LR, None);

    assert_eq!(dot.matches("  \"users\" [\n").count(), 1);
    assert!(dot.contains("port=\"email\""), "last definition wins");
}

#[test]
fn test_json_mirrors_dot_selection() {
    let (graph, _) = graph_of(PG_DUMP);
    let (selection, _) = Selection::neighborhood(&graph, &["public.users".to_string()]);

    let text = to_json(&graph, &selection);
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(value["stats"]["table_count"], 3);
    assert_eq!(value["stats"]["relationship_count"], 2);

    let users = value["tables"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == "public.users")
        .unwrap();
    assert_eq!(users["highlighted"], true);
}

#[test]
fn test_unknown_filter_name_warns_and_continues() {
    let (graph, _) = graph_of(PG_DUMP);
    let (selection, warnings) =
        Selection::neighborhood(&graph, &["nope".to_string(), "public.users".to_string()]);

    assert_eq!(
        warnings,
        vec![GraphWarning::UnknownTable {
            name: "nope".to_string()
        }]
    );
    assert!(!selection.items.is_empty());
}
