//! Graph subset selection: which tables and keys get rendered.
//!
//! Three mutually exclusive modes: everything in parse order, the
//! connected components around seed tables, or only tables lying on a
//! path between terminal tables. Both traversal modes run on explicit
//! work stacks with visited sets, so cyclic and self-referencing schemas
//! terminate regardless of depth.

use crate::schema::{GraphWarning, Item, KeyId, SchemaGraph, TableId};
use ahash::AHashSet;

/// A chosen subset of the graph.
///
/// `items` is in emission order, which the renderers must preserve.
/// `highlighted` marks the user-named tables for emphasized styling.
#[derive(Debug)]
pub struct Selection {
    pub items: Vec<Item>,
    pub highlighted: AHashSet<TableId>,
}

/// Pending work during a neighborhood walk
enum Frame {
    /// Emit a table on first visit, then scan its keys
    Visit(TableId),
    /// Resume scanning a table's incident keys at the given offset
    Scan(TableId, usize),
}

/// One suspended table during a path search
struct PathFrame {
    table: TableId,
    next_key: usize,
    on_path: bool,
    /// Key whose far endpoint is currently being evaluated
    pending: Option<KeyId>,
}

/// What the path driver decided while holding the top frame
enum PathStep {
    Descend(KeyId, TableId),
    Finish,
}

impl Selection {
    /// Every table and every resolvable key, in parse order
    pub fn unfiltered(graph: &SchemaGraph) -> Selection {
        let items = graph
            .items
            .iter()
            .copied()
            .filter(|item| match item {
                Item::Table(_) => true,
                Item::Key(id) => graph.key_endpoints(*id).is_some(),
            })
            .collect();
        Selection {
            items,
            highlighted: AHashSet::new(),
        }
    }

    /// The weakly-connected components containing the seed tables.
    ///
    /// Every resolvable seed is highlighted. Each table is emitted at its
    /// first visit, immediately followed by its first unvisited incident
    /// key and that key's far side, depth-first, until the component is
    /// exhausted. Unknown seed names only warn.
    pub fn neighborhood(graph: &SchemaGraph, seeds: &[String]) -> (Selection, Vec<GraphWarning>) {
        let mut warnings = Vec::new();
        let mut highlighted = AHashSet::new();
        let mut roots = Vec::new();
        for name in seeds {
            match graph.lookup(name) {
                Some(id) => {
                    highlighted.insert(id);
                    roots.push(id);
                }
                None => warnings.push(GraphWarning::UnknownTable { name: name.clone() }),
            }
        }

        let mut items = Vec::new();
        let mut seen_tables = AHashSet::new();
        let mut seen_keys = AHashSet::new();

        for &root in &roots {
            let mut stack = vec![Frame::Visit(root)];
            while let Some(frame) = stack.pop() {
                match frame {
                    Frame::Visit(table) => {
                        if !seen_tables.insert(table) {
                            continue;
                        }
                        items.push(Item::Table(table));
                        stack.push(Frame::Scan(table, 0));
                    }
                    Frame::Scan(table, start) => {
                        let mut index = start;
                        while let Some(key) = graph.incident(table, index) {
                            index += 1;
                            if !seen_keys.insert(key) {
                                continue;
                            }
                            items.push(Item::Key(key));
                            if let Some((source, target)) = graph.key_endpoints(key) {
                                // Source side is explored first; the scan
                                // resumes here once both sides are done
                                stack.push(Frame::Scan(table, index));
                                stack.push(Frame::Visit(target));
                                stack.push(Frame::Visit(source));
                                break;
                            }
                        }
                    }
                }
            }
        }

        (Selection { items, highlighted }, warnings)
    }

    /// Only tables on some path between two of the terminal tables.
    ///
    /// Every resolvable terminal is highlighted. Each terminal starts a
    /// depth-first search along both key directions; a table is kept when
    /// it is itself another terminal or when one of its keys transitively
    /// reaches one. Tables are emitted post-order, keys as soon as their
    /// far side proves to be on a path; one visited set spans all
    /// terminals so nothing is emitted twice.
    pub fn paths(graph: &SchemaGraph, terminals: &[String]) -> (Selection, Vec<GraphWarning>) {
        let mut warnings = Vec::new();
        let mut highlighted = AHashSet::new();
        let mut ends = AHashSet::new();
        let mut roots = Vec::new();
        for name in terminals {
            match graph.lookup(name) {
                Some(id) => {
                    highlighted.insert(id);
                    if ends.insert(id) {
                        roots.push(id);
                    }
                }
                None => warnings.push(GraphWarning::UnknownTable { name: name.clone() }),
            }
        }

        let mut items = Vec::new();
        let mut marks = AHashSet::new();
        let mut seen_keys = AHashSet::new();
        for &root in &roots {
            walk_paths(graph, root, &ends, &mut marks, &mut seen_keys, &mut items);
        }

        (Selection { items, highlighted }, warnings)
    }
}

/// Depth-first path search from one terminal.
///
/// A table revisited through a cycle yields its terminal-membership as
/// the verdict without re-descending; the walk's own root never counts
/// as a far-side terminal, so a trivial cycle back to the start does not
/// fabricate a path.
fn walk_paths(
    graph: &SchemaGraph,
    root: TableId,
    ends: &AHashSet<TableId>,
    marks: &mut AHashSet<TableId>,
    seen_keys: &mut AHashSet<KeyId>,
    items: &mut Vec<Item>,
) {
    if !marks.insert(root) {
        return;
    }

    let mut stack = vec![PathFrame {
        table: root,
        next_key: 0,
        on_path: false,
        pending: None,
    }];
    // Verdict of the most recently completed descent
    let mut verdict = false;

    loop {
        let step = match stack.last_mut() {
            None => break,
            Some(frame) => {
                if let Some(key) = frame.pending.take() {
                    if verdict {
                        frame.on_path = true;
                        if seen_keys.insert(key) {
                            items.push(Item::Key(key));
                        }
                    }
                }
                match graph.incident(frame.table, frame.next_key) {
                    Some(key) => {
                        frame.next_key += 1;
                        frame.pending = Some(key);
                        PathStep::Descend(key, frame.table)
                    }
                    None => PathStep::Finish,
                }
            }
        };

        match step {
            PathStep::Descend(key, near) => {
                let far = match graph.key_endpoints(key) {
                    Some((source, target)) => {
                        if source == near {
                            target
                        } else {
                            source
                        }
                    }
                    None => {
                        verdict = false;
                        continue;
                    }
                };
                if !marks.insert(far) {
                    verdict = far != root && ends.contains(&far);
                } else if far != root && ends.contains(&far) {
                    items.push(Item::Table(far));
                    verdict = true;
                } else {
                    stack.push(PathFrame {
                        table: far,
                        next_key: 0,
                        on_path: false,
                        pending: None,
                    });
                }
            }
            PathStep::Finish => {
                if let Some(frame) = stack.pop() {
                    if frame.on_path {
                        items.push(Item::Table(frame.table));
                    }
                    verdict = frame.on_path;
                }
            }
        }
    }
}
