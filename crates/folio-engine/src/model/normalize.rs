use super::selection::has_selection_in_block;
use super::{Block, ContentModelDocument, SegmentKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Everything,
    /// Only blocks holding a selection are visited
    Selection,
}

/// Removes structure left empty by edits: unselected empty text segments,
/// paragraphs without segments and list items or containers without blocks.
/// Table cells may stay empty.
pub fn normalize_content_model(model: &mut ContentModelDocument) {
    normalize_blocks(&mut model.blocks, Scope::Everything);
}

/// Like [`normalize_content_model`], restricted to blocks that hold a
/// selection. Content elsewhere is left as it is, empty or not.
pub fn normalize_selected_content(model: &mut ContentModelDocument) {
    normalize_blocks(&mut model.blocks, Scope::Selection);
}

fn in_scope(block: &Block, scope: Scope) -> bool {
    scope == Scope::Everything || has_selection_in_block(block)
}

fn normalize_blocks(blocks: &mut Vec<Block>, scope: Scope) {
    for block in blocks.iter_mut().filter(|b| in_scope(b, scope)) {
        match block {
            Block::Paragraph(paragraph) => paragraph.segments.retain(|s| {
                s.is_selected || !matches!(&s.kind, SegmentKind::Text { text } if text.is_empty())
            }),
            Block::ListItem(item) => normalize_blocks(&mut item.blocks, scope),
            Block::FormatContainer(container) => normalize_blocks(&mut container.blocks, scope),
            Block::Table(table) => {
                for row in &mut table.rows {
                    for cell in &mut row.cells {
                        normalize_blocks(&mut cell.blocks, scope);
                    }
                }
            }
            Block::Divider(_) | Block::Entity(_) => {}
        }
    }

    blocks.retain(|block| {
        !in_scope(block, scope)
            || match block {
                Block::Paragraph(paragraph) => !paragraph.segments.is_empty(),
                Block::ListItem(item) => !item.blocks.is_empty(),
                Block::FormatContainer(container) => !container.blocks.is_empty(),
                Block::Table(table) => !table.rows.is_empty(),
                Block::Divider(_) | Block::Entity(_) => true,
            }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FormatContainer, ListItem, Segment};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_removes_empty_structure() {
        let mut model = ContentModelDocument::new(vec![
            Block::paragraph(vec![Segment::text("")]),
            Block::FormatContainer(FormatContainer::new(
                "blockquote",
                vec![Block::ListItem(ListItem::new(
                    vec![],
                    vec![Block::paragraph(vec![])],
                ))],
            )),
            Block::paragraph(vec![Segment::text("keep"), Segment::text("")]),
        ]);
        normalize_content_model(&mut model);
        assert_eq!(
            model,
            ContentModelDocument::new(vec![Block::paragraph(vec![Segment::text("keep")])])
        );
    }

    #[test]
    fn test_selected_scope_leaves_other_blocks_alone() {
        let mut model = ContentModelDocument::new(vec![
            Block::paragraph(vec![Segment::text("")]),
            Block::paragraph(vec![
                Segment::text("a").selected(),
                Segment::text(""),
                Segment::text("b"),
            ]),
            Block::ListItem(ListItem::new(vec![], vec![])),
        ]);
        normalize_selected_content(&mut model);
        assert_eq!(
            model,
            ContentModelDocument::new(vec![
                Block::paragraph(vec![Segment::text("")]),
                Block::paragraph(vec![Segment::text("a").selected(), Segment::text("b")]),
                Block::ListItem(ListItem::new(vec![], vec![])),
            ])
        );
    }

    #[test]
    fn test_keeps_selection_marker_paragraph() {
        let mut model =
            ContentModelDocument::new(vec![Block::paragraph(vec![Segment::selection_marker()])]);
        let before = model.clone();
        normalize_content_model(&mut model);
        assert_eq!(model, before);
    }
}
