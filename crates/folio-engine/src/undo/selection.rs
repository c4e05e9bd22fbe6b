//! Conversion between live DOM selections and [`SnapshotSelection`].

use uuid::Uuid;

use super::SnapshotSelection;
use super::path::{get_path, get_position_from_path};
use super::table::{normalize_all_tables, normalize_table_tree};
use crate::dom::{Dom, DomPosition, DomRange, DomSelection, NodeId};

/// The id of `element`, assigning a fresh one when it has none.
fn ensure_id(dom: &mut Dom, element: NodeId, prefix: &str) -> String {
    if let Some(id) = dom.id_attribute(element).filter(|id| !id.is_empty()) {
        return id.to_string();
    }
    let id = format!("{prefix}_{}", Uuid::new_v4().simple());
    dom.set_attribute(element, "id", &id);
    id
}

/// What a boundary points at, independent of child indexes that
/// normalization could shift.
#[derive(Debug, Clone, Copy)]
enum Anchor {
    /// Offset inside a text node, which normalization never moves
    Text(DomPosition),
    /// Right before this child
    Before(NodeId),
    /// Right after this child
    After(NodeId),
    /// At the end of this container
    End(NodeId),
}

impl Anchor {
    fn resolve(self, dom: &Dom, root: NodeId) -> Option<DomPosition> {
        let position = match self {
            Self::Text(position) => position,
            Self::Before(child) => DomPosition::before(dom, child)?,
            Self::After(child) => DomPosition::after(dom, child)?,
            Self::End(node) => DomPosition::new(node, dom.node_len(node)),
        };
        dom.contains(root, position.node).then_some(position)
    }
}

/// A boundary as a preferred anchor plus row-level fallbacks for when
/// normalization merges the table section it names into another one.
struct Boundary {
    original: DomPosition,
    anchors: Vec<Anchor>,
}

impl Boundary {
    fn capture(dom: &Dom, position: DomPosition) -> Self {
        let mut anchors = Vec::new();
        if dom.is_text(position.node) {
            anchors.push(Anchor::Text(position));
        } else {
            match dom.child(position.node, position.offset) {
                Some(child) => {
                    anchors.push(Anchor::Before(child));
                    if is_section(dom, child) {
                        match dom.first_child(child) {
                            Some(row) => anchors.push(Anchor::Before(row)),
                            None => anchors.extend(after_previous_rows(dom, child)),
                        }
                    }
                }
                None => {
                    anchors.push(Anchor::End(position.node));
                    if is_section(dom, position.node) {
                        match dom.last_child(position.node) {
                            Some(row) => anchors.push(Anchor::After(row)),
                            None => anchors.extend(after_previous_rows(dom, position.node)),
                        }
                    }
                }
            }
        }
        Self {
            original: position,
            anchors,
        }
    }

    fn resolve(&self, dom: &Dom, root: NodeId) -> DomPosition {
        self.anchors
            .iter()
            .find_map(|anchor| anchor.resolve(dom, root))
            .unwrap_or(self.original)
    }
}

fn is_section(dom: &Dom, node: NodeId) -> bool {
    ["tbody", "thead", "tfoot"]
        .iter()
        .any(|tag| dom.is_tag(node, tag))
}

/// After the last row of the section preceding `section`, if any.
fn after_previous_rows(dom: &Dom, section: NodeId) -> Option<Anchor> {
    let previous = dom.previous_sibling(section).filter(|&n| is_section(dom, n))?;
    dom.last_child(previous).map(Anchor::After)
}

/// Encodes the current selection. Tables on the path of a range boundary are
/// normalized first; when that changes the tree, `selection` is updated to
/// the same logical boundaries in the new tree. Image and table selections
/// give their element an id when it lacks one.
pub fn create_snapshot_selection(
    dom: &mut Dom,
    root: NodeId,
    selection: &mut Option<DomSelection>,
) -> SnapshotSelection {
    match *selection {
        None => SnapshotSelection::default(),
        Some(DomSelection::Image { image }) => SnapshotSelection::Image {
            image_id: ensure_id(dom, image, "image"),
        },
        Some(DomSelection::Table {
            table,
            first_row,
            last_row,
            first_column,
            last_column,
        }) => SnapshotSelection::Table {
            table_id: ensure_id(dom, table, "table"),
            first_row,
            last_row,
            first_column,
            last_column,
        },
        Some(DomSelection::Range { range, is_reverted }) => {
            let start_boundary = Boundary::capture(dom, range.start);
            let end_boundary = Boundary::capture(dom, range.end);

            let mut changed = normalize_boundary_tables(dom, range.start.node, root);
            if range.end.node != range.start.node {
                changed = normalize_boundary_tables(dom, range.end.node, root) || changed;
            }

            let range = if changed {
                let range = DomRange::new(
                    start_boundary.resolve(dom, root),
                    end_boundary.resolve(dom, root),
                );
                *selection = Some(DomSelection::Range { range, is_reverted });
                range
            } else {
                range
            };

            SnapshotSelection::Range {
                start: get_path(dom, Some(range.start.node), range.start.offset, root),
                end: get_path(dom, Some(range.end.node), range.end.offset, root),
                is_reverted,
            }
        }
    }
}

fn normalize_boundary_tables(dom: &mut Dom, node: NodeId, root: NodeId) -> bool {
    normalize_table_tree(dom, node, root).unwrap_or_else(|err| {
        log::warn!("failed to normalize table around selection: {err}");
        false
    })
}

/// Resolves a snapshot selection against the content under `root`.
/// Elements referenced by id that no longer exist yield `None`.
pub fn restore_snapshot_selection(
    dom: &mut Dom,
    root: NodeId,
    selection: &SnapshotSelection,
) -> Option<DomSelection> {
    match selection {
        SnapshotSelection::Range {
            start,
            end,
            is_reverted,
        } => {
            if let Err(err) = normalize_all_tables(dom, root) {
                log::warn!("failed to normalize tables before restoring selection: {err}");
            }
            let range = DomRange::new(
                get_position_from_path(dom, root, start),
                get_position_from_path(dom, root, end),
            );
            Some(DomSelection::Range {
                range,
                is_reverted: *is_reverted,
            })
        }
        SnapshotSelection::Image { image_id } => dom
            .get_element_by_id(root, image_id)
            .map(|image| DomSelection::Image { image }),
        SnapshotSelection::Table {
            table_id,
            first_row,
            last_row,
            first_column,
            last_column,
        } => dom
            .get_element_by_id(root, table_id)
            .map(|table| DomSelection::Table {
                table,
                first_row: *first_row,
                last_row: *last_row,
                first_column: *first_column,
                last_column: *last_column,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::html::inner_html;
    use pretty_assertions::assert_eq;

    fn setup(html: &str) -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        dom.set_inner_html(root, html).unwrap();
        (dom, root)
    }

    fn find_text(dom: &Dom, root: NodeId, text: &str) -> NodeId {
        dom.descendants(root)
            .into_iter()
            .find(|&n| dom.text(n) == Some(text))
            .unwrap()
    }

    #[test]
    fn test_no_selection_is_collapsed_at_start() {
        let (mut dom, root) = setup("<p>x</p>");
        assert_eq!(
            create_snapshot_selection(&mut dom, root, &mut None),
            SnapshotSelection::default()
        );
    }

    #[test]
    fn test_range_round_trip_across_reparse() {
        let (mut dom, root) = setup("<p>hello</p><p>world</p>");
        let hello = find_text(&dom, root, "hello");
        let world = find_text(&dom, root, "world");
        let mut selection = Some(DomSelection::range(
            DomRange::new(DomPosition::new(hello, 2), DomPosition::new(world, 3)),
            true,
        ));
        let snapshot = create_snapshot_selection(&mut dom, root, &mut selection);
        assert_eq!(
            snapshot,
            SnapshotSelection::Range {
                start: vec![0, 0, 2],
                end: vec![1, 0, 3],
                is_reverted: true,
            }
        );

        let (mut copy, copy_root) = setup(&inner_html(&dom, root));
        let restored = restore_snapshot_selection(&mut copy, copy_root, &snapshot).unwrap();
        let (range, is_reverted) = restored.as_range().unwrap();
        assert!(is_reverted);
        assert_eq!(range.start, DomPosition::new(find_text(&copy, copy_root, "hello"), 2));
        assert_eq!(range.end, DomPosition::new(find_text(&copy, copy_root, "world"), 3));
    }

    #[test]
    fn test_range_in_bare_table_row_normalizes_and_repoints() {
        let (mut dom, root) = setup("<table><tr><td>a</td></tr><tr><td>b</td></tr></table>");
        let table = dom.children(root)[0];
        let second_row = dom.children(table)[1];
        let mut selection = Some(DomSelection::caret(DomPosition::new(table, 1)));

        let snapshot = create_snapshot_selection(&mut dom, root, &mut selection);

        let tbody = dom.children(table)[0];
        assert_eq!(dom.tag_name(tbody), Some("tbody"));
        assert_eq!(
            selection,
            Some(DomSelection::caret(DomPosition::new(tbody, 1)))
        );
        assert_eq!(dom.parent(second_row), Some(tbody));
        assert_eq!(
            snapshot,
            SnapshotSelection::Range {
                start: vec![0, 0, 1],
                end: vec![0, 0, 1],
                is_reverted: false,
            }
        );

        let (mut copy, copy_root) = setup(&inner_html(&dom, root));
        let restored = restore_snapshot_selection(&mut copy, copy_root, &snapshot).unwrap();
        let copy_tbody = dom_child_path(&copy, copy_root, &[0, 0]);
        assert_eq!(restored, DomSelection::caret(DomPosition::new(copy_tbody, 1)));
    }

    #[test]
    fn test_caret_before_merged_body_lands_between_rows() {
        let (mut dom, root) = setup(
            "<table><tbody><tr><td>a</td></tr></tbody><tbody><tr><td>b</td></tr></tbody></table>",
        );
        let table = dom.children(root)[0];
        let first_body = dom.children(table)[0];
        let mut selection = Some(DomSelection::caret(DomPosition::new(table, 1)));

        let snapshot = create_snapshot_selection(&mut dom, root, &mut selection);

        assert_eq!(dom.children(table), &[first_body]);
        assert_eq!(
            selection,
            Some(DomSelection::caret(DomPosition::new(first_body, 1)))
        );
        assert_eq!(
            snapshot,
            SnapshotSelection::Range {
                start: vec![0, 0, 1],
                end: vec![0, 0, 1],
                is_reverted: false,
            }
        );
    }

    #[test]
    fn test_range_ending_in_merged_body_keeps_its_rows() {
        let (mut dom, root) = setup(
            "<table><tbody><tr><td>a</td></tr></tbody><tbody><tr><td>b</td></tr><tr><td>c</td></tr></tbody></table>",
        );
        let table = dom.children(root)[0];
        let first_body = dom.children(table)[0];
        let second_body = dom.children(table)[1];
        let mut selection = Some(DomSelection::range(
            DomRange::new(
                DomPosition::new(first_body, 0),
                DomPosition::new(second_body, 2),
            ),
            false,
        ));

        let snapshot = create_snapshot_selection(&mut dom, root, &mut selection);

        assert_eq!(
            selection,
            Some(DomSelection::range(
                DomRange::new(
                    DomPosition::new(first_body, 0),
                    DomPosition::new(first_body, 3),
                ),
                false,
            ))
        );
        assert_eq!(
            snapshot,
            SnapshotSelection::Range {
                start: vec![0, 0, 0],
                end: vec![0, 0, 3],
                is_reverted: false,
            }
        );
    }

    #[test]
    fn test_caret_before_empty_merged_body_follows_previous_rows() {
        let (mut dom, root) =
            setup("<table><tbody><tr><td>a</td></tr></tbody><tbody></tbody><tfoot></tfoot></table>");
        let table = dom.children(root)[0];
        let first_body = dom.children(table)[0];
        let mut selection = Some(DomSelection::caret(DomPosition::new(table, 1)));

        create_snapshot_selection(&mut dom, root, &mut selection);

        assert_eq!(dom.children(table).len(), 2);
        assert_eq!(
            selection,
            Some(DomSelection::caret(DomPosition::new(first_body, 1)))
        );
    }

    #[test]
    fn test_table_selection_encodes_identically_twice() {
        let (mut dom, root) =
            setup("<table><tr><td>a</td></tr><tbody><tr><td>b</td></tr></tbody></table>");
        let a = find_text(&dom, root, "a");
        let b = find_text(&dom, root, "b");
        let mut selection = Some(DomSelection::range(
            DomRange::new(DomPosition::new(a, 0), DomPosition::new(b, 1)),
            false,
        ));

        let first = create_snapshot_selection(&mut dom, root, &mut selection);
        let repointed = selection;
        let second = create_snapshot_selection(&mut dom, root, &mut selection);

        assert_eq!(first, second);
        assert_eq!(selection, repointed);
        assert_eq!(
            first,
            SnapshotSelection::Range {
                start: vec![0, 0, 0, 0, 0, 0],
                end: vec![0, 0, 1, 0, 0, 1],
                is_reverted: false,
            }
        );
    }

    fn dom_child_path(dom: &Dom, root: NodeId, path: &[usize]) -> NodeId {
        path.iter().fold(root, |node, &i| dom.children(node)[i])
    }

    #[test]
    fn test_image_selection_gets_an_id() {
        let (mut dom, root) = setup(r#"<p><img src="a.png"></p>"#);
        let image = dom
            .descendants(root)
            .into_iter()
            .find(|&n| dom.is_tag(n, "img"))
            .unwrap();
        let mut selection = Some(DomSelection::Image { image });
        let snapshot = create_snapshot_selection(&mut dom, root, &mut selection);

        let SnapshotSelection::Image { image_id } = &snapshot else {
            panic!("expected image selection, got {snapshot:?}");
        };
        assert!(image_id.starts_with("image_"));
        assert_eq!(dom.id_attribute(image), Some(image_id.as_str()));
        assert_eq!(
            restore_snapshot_selection(&mut dom, root, &snapshot),
            Some(DomSelection::Image { image })
        );
    }

    #[test]
    fn test_table_selection_keeps_existing_id() {
        let (mut dom, root) = setup(r#"<table id="t1"><tbody><tr><td>a</td></tr></tbody></table>"#);
        let table = dom.children(root)[0];
        let mut selection = Some(DomSelection::Table {
            table,
            first_row: 0,
            last_row: 0,
            first_column: 0,
            last_column: 1,
        });
        let snapshot = create_snapshot_selection(&mut dom, root, &mut selection);
        assert_eq!(
            snapshot,
            SnapshotSelection::Table {
                table_id: "t1".to_string(),
                first_row: 0,
                last_row: 0,
                first_column: 0,
                last_column: 1,
            }
        );
        assert_eq!(restore_snapshot_selection(&mut dom, root, &snapshot), selection);
    }

    #[test]
    fn test_missing_element_restores_nothing() {
        let (mut dom, root) = setup("<p>x</p>");
        let snapshot = SnapshotSelection::Image {
            image_id: "gone".to_string(),
        };
        assert_eq!(restore_snapshot_selection(&mut dom, root, &snapshot), None);
    }
}
