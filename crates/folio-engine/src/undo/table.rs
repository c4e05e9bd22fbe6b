//! Table sectioning normalization.
//!
//! Parsers wrap bare rows in `<tbody>` and merge adjacent bodies, so a path
//! taken from a live table that still has bare rows would not survive a
//! serialize and parse cycle. Tables are brought into that shape before any
//! path is taken from or resolved inside them.

use crate::dom::{Dom, DomError, NodeId};

/// Wraps runs of bare `<tr>` children in one `<tbody>`, merges adjacent
/// `<tbody>` children and, when the table has a `<thead>`, moves direct
/// `<colgroup>` children into it. Returns whether the tree changed.
pub fn normalize_table(dom: &mut Dom, table: NodeId) -> Result<bool, DomError> {
    let mut changed = false;
    let mut tbody: Option<NodeId> = None;
    let mut current = dom.first_child(table);

    while let Some(child) = current {
        let anchor = match dom.tag_name(child) {
            Some("tr") => {
                let body = match tbody {
                    Some(body) => body,
                    None => {
                        let body = dom.create_element("tbody");
                        dom.insert_before(table, body, Some(child))?;
                        tbody = Some(body);
                        body
                    }
                };
                dom.append_child(body, child)?;
                changed = true;
                body
            }
            Some("tbody") => match tbody {
                Some(body) => {
                    let rows = dom.children(child).to_vec();
                    for row in rows {
                        dom.append_child(body, row)?;
                    }
                    dom.remove(child);
                    changed = true;
                    body
                }
                None => {
                    tbody = Some(child);
                    child
                }
            },
            _ => {
                tbody = None;
                child
            }
        };
        current = dom.next_sibling(anchor);
    }

    let thead = dom
        .children(table)
        .iter()
        .copied()
        .find(|&c| dom.is_tag(c, "thead"));
    if let Some(thead) = thead {
        let colgroups: Vec<NodeId> = dom
            .children(table)
            .iter()
            .copied()
            .filter(|&c| dom.is_tag(c, "colgroup"))
            .collect();
        for colgroup in colgroups {
            dom.append_child(thead, colgroup)?;
            changed = true;
        }
    }

    if changed {
        log::trace!("normalized table {table:?}");
    }
    Ok(changed)
}

/// Normalizes every table from `start` up to and including `root`.
pub fn normalize_table_tree(dom: &mut Dom, start: NodeId, root: NodeId) -> Result<bool, DomError> {
    let mut changed = false;
    let mut current = Some(start);
    while let Some(node) = current.filter(|&n| dom.contains(root, n)) {
        if dom.is_tag(node, "table") {
            changed = normalize_table(dom, node)? || changed;
        }
        current = dom.parent(node);
    }
    Ok(changed)
}

/// Normalizes every table under `root`.
pub fn normalize_all_tables(dom: &mut Dom, root: NodeId) -> Result<bool, DomError> {
    let tables: Vec<NodeId> = dom
        .descendants(root)
        .into_iter()
        .filter(|&n| dom.is_tag(n, "table"))
        .collect();
    let mut changed = false;
    for table in tables {
        changed = normalize_table(dom, table)? || changed;
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::html::inner_html;
    use pretty_assertions::assert_eq;

    fn table_in(html: &str) -> (Dom, NodeId, NodeId) {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        dom.set_inner_html(root, html).unwrap();
        let table = dom.children(root)[0];
        (dom, root, table)
    }

    #[test]
    fn test_bare_rows_are_wrapped_and_bodies_merged() {
        let (mut dom, root, table) = table_in(
            "<table><tr><td>a</td></tr><tbody><tr><td>b</td></tr></tbody><tr><td>c</td></tr></table>",
        );
        assert!(normalize_table(&mut dom, table).unwrap());
        insta::assert_snapshot!(
            inner_html(&dom, root),
            @"<table><tbody><tr><td>a</td></tr><tr><td>b</td></tr><tr><td>c</td></tr></tbody></table>"
        );
        assert!(!normalize_table(&mut dom, table).unwrap());
    }

    #[test]
    fn test_non_row_child_starts_new_body() {
        let (mut dom, root, table) =
            table_in("<table><tr><td>a</td></tr><caption>x</caption><tr><td>b</td></tr></table>");
        normalize_table(&mut dom, table).unwrap();
        assert_eq!(
            inner_html(&dom, root),
            "<table><tbody><tr><td>a</td></tr></tbody><caption>x</caption><tbody><tr><td>b</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_colgroup_moves_into_thead_only_when_present() {
        let (mut dom, root, table) = table_in(
            "<table><colgroup><col></colgroup><thead><tr><th>h</th></tr></thead><tbody><tr><td>a</td></tr></tbody></table>",
        );
        assert!(normalize_table(&mut dom, table).unwrap());
        assert_eq!(
            inner_html(&dom, root),
            "<table><thead><tr><th>h</th></tr><colgroup><col></colgroup></thead><tbody><tr><td>a</td></tr></tbody></table>"
        );

        let (mut dom, _, table) =
            table_in("<table><colgroup><col></colgroup><tbody><tr><td>a</td></tr></tbody></table>");
        assert!(!normalize_table(&mut dom, table).unwrap());
    }

    #[test]
    fn test_tree_normalizes_enclosing_tables() {
        let (mut dom, root, outer) = table_in(
            "<table><tr><td><table><tr><td>x</td></tr></table></td></tr></table>",
        );
        let inner_text = dom
            .descendants(root)
            .into_iter()
            .find(|&n| dom.text(n) == Some("x"))
            .unwrap();
        assert!(normalize_table_tree(&mut dom, inner_text, root).unwrap());
        assert_eq!(dom.tag_name(dom.children(outer)[0]), Some("tbody"));
        assert!(!normalize_all_tables(&mut dom, root).unwrap());
    }
}
