// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Tree Navigator
//!
//! Query execution and coordinate plumbing over tree-sitter trees. Everything
//! public here speaks CodeHem coordinates: 1-based lines, 1-based byte
//! columns, end column one past the final byte.
//!
//! When a pattern has several captures, the hit exposes them paired in source
//! order (sorted by start byte), never in capture-declaration order.

use codehem_core::{ElementRange, Error, LineIndex, Result};
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor};

/// One query match: capture name to node, in source order.
#[derive(Debug, Clone)]
pub struct QueryHit<'q, 't> {
    captures: Vec<(&'q str, Node<'t>)>,
}

impl<'q, 't> QueryHit<'q, 't> {
    /// The first node captured under `name`, in source order.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<Node<'t>> {
        self.captures
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, node)| *node)
    }

    /// All nodes captured under `name`, in source order.
    pub fn nodes<'s>(&'s self, name: &'s str) -> impl Iterator<Item = Node<'t>> + 's {
        self.captures
            .iter()
            .filter(move |(n, _)| *n == name)
            .map(|(_, node)| *node)
    }

    /// Byte offset the hit starts at (its earliest capture).
    #[must_use]
    pub fn start_byte(&self) -> usize {
        self.captures
            .iter()
            .map(|(_, n)| n.start_byte())
            .min()
            .unwrap_or(0)
    }
}

/// Run a compiled query against `node`, returning hits in source order.
///
/// Text predicates (`#eq?`, `#match?`) are evaluated against `source`.
#[must_use]
pub fn execute_query<'q, 't>(
    query: &'q Query,
    node: Node<'t>,
    source: &[u8],
) -> Vec<QueryHit<'q, 't>> {
    let names = query.capture_names();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, node, source);
    let mut hits = Vec::new();
    while let Some(found) = matches.next() {
        let mut captures: Vec<(&'q str, Node<'t>)> = found
            .captures
            .iter()
            .map(|capture| (names[capture.index as usize], capture.node))
            .collect();
        captures.sort_by_key(|(_, node)| node.start_byte());
        hits.push(QueryHit { captures });
    }
    hits.sort_by_key(QueryHit::start_byte);
    hits
}

/// UTF-8 text of a node.
pub fn node_text<'s>(node: Node<'_>, source: &'s [u8]) -> Result<&'s str> {
    node.utf8_text(source)
        .map_err(|_| Error::validation("source buffer is not valid UTF-8"))
}

/// 1-based inclusive line range of a node.
#[must_use]
pub fn node_line_range(node: Node<'_>) -> (usize, usize) {
    let start = node.start_position().row + 1;
    let end = node.end_position();
    // Nodes whose span ends exactly at a line break report the break's line.
    if end.column == 0 && end.row + 1 > start {
        (start, end.row)
    } else {
        (start, end.row + 1)
    }
}

/// Full 1-based element range of a node, mapped through the line index so the
/// end column lands one past the last byte even when the node span ends at a
/// line break.
#[must_use]
pub fn element_range(node: Node<'_>, index: &LineIndex, source: &str) -> ElementRange {
    let (start_line, start_col) = index.position(node.start_byte());
    let (mut end_line, mut end_col) = index.position(node.end_byte());
    if end_col == 1 && end_line > start_line {
        end_line -= 1;
        end_col = index.line_end(end_line, source) - index.line_start(end_line) + 1;
    }
    ElementRange::new(start_line, start_col, end_line, end_col)
}

/// Closest ancestor whose kind is one of `kinds`.
#[must_use]
pub fn find_first_ancestor<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    let mut current = node.parent();
    while let Some(candidate) = current {
        if kinds.contains(&candidate.kind()) {
            return Some(candidate);
        }
        current = candidate.parent();
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use tree_sitter::Parser;

    const SRC: &str = "class C:\n    def f(self):\n        return 1\n";

    fn parse(source: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn query_hits_arrive_in_source_order() {
        let tree = parse("def b():\n    pass\n\ndef a():\n    pass\n");
        let query = Query::new(
            &tree_sitter_python::LANGUAGE.into(),
            "(function_definition name: (identifier) @name) @element",
        )
        .unwrap();
        let hits = execute_query(&query, tree.root_node(), b"def b():\n    pass\n\ndef a():\n    pass\n");
        let names: Vec<_> = hits
            .iter()
            .map(|hit| {
                node_text(hit.node("name").unwrap(), b"def b():\n    pass\n\ndef a():\n    pass\n")
                    .unwrap()
            })
            .collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn line_ranges_are_one_based() {
        let tree = parse(SRC);
        let query = Query::new(
            &tree_sitter_python::LANGUAGE.into(),
            "(function_definition) @element",
        )
        .unwrap();
        let hits = execute_query(&query, tree.root_node(), SRC.as_bytes());
        let func = hits[0].node("element").unwrap();
        assert_eq!(node_line_range(func), (2, 3));
    }

    #[test]
    fn element_range_is_byte_exact() {
        let index = LineIndex::new(SRC);
        let tree = parse(SRC);
        let query = Query::new(
            &tree_sitter_python::LANGUAGE.into(),
            "(class_definition) @element",
        )
        .unwrap();
        let hits = execute_query(&query, tree.root_node(), SRC.as_bytes());
        let range = element_range(hits[0].node("element").unwrap(), &index, SRC);
        assert_eq!(&SRC[index.span(&range)], SRC.trim_end());
    }

    #[test]
    fn ancestor_search_finds_enclosing_class() {
        let tree = parse(SRC);
        let query = Query::new(
            &tree_sitter_python::LANGUAGE.into(),
            "(function_definition) @element",
        )
        .unwrap();
        let hits = execute_query(&query, tree.root_node(), SRC.as_bytes());
        let func = hits[0].node("element").unwrap();
        let class = find_first_ancestor(func, &["class_definition"]).unwrap();
        assert_eq!(class.kind(), "class_definition");
        assert!(find_first_ancestor(class, &["class_definition"]).is_none());
    }
}
