//! Arrow key handling next to entities.
//!
//! The caret can rest inside the delimiters around an entity. Moving with the
//! arrow keys from there jumps over the entity as a whole instead of
//! entering it.

use super::{is_block_entity_container, is_entity_delimiter};
use crate::dom::style::is_rtl;
use crate::dom::{Dom, DomPosition, DomRange, DomSelection, NodeId};
use crate::editor::{Editor, FormatContentModelOptions};
use crate::model::selection::get_selected_segments;
use crate::model::{Block, ContentModelDocument, Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Left,
    Right,
}

/// Moves (or with `shift_key` extends or shrinks) the selection over an
/// entity adjacent to the caret.
pub fn adjust_selection_around_entity(editor: &mut dyn Editor, key: ArrowKey, shift_key: bool) {
    if editor.is_disposed() {
        return;
    }
    let Some((range, is_reverted)) = editor.get_dom_selection().and_then(|s| s.as_range()) else {
        return;
    };

    let edge = if is_reverted { range.start } else { range.end };
    let dom = editor.dom();
    let Some(edge_element) = (if dom.is_element(edge.node) {
        Some(edge.node)
    } else {
        dom.parent(edge.node)
    }) else {
        return;
    };
    let moving_before = (key == ArrowKey::Left) != is_rtl(dom, edge_element);
    let expected_offset = if moving_before { 0 } else { 1 };
    let at_delimiter = is_entity_delimiter(dom, edge_element) && edge.offset == expected_offset;
    if !at_delimiter && !is_block_entity_container(dom, edge_element) {
        return;
    }

    let is_shrinking = shift_key && !range.is_collapsed() && moving_before != is_reverted;
    let mut wrapper = None;
    editor.format_content_model(
        &mut |model, _context| {
            wrapper = find_entity_wrapper(model, is_reverted, is_shrinking, moving_before);
            false
        },
        FormatContentModelOptions::default(),
    );

    let Some(wrapper) = wrapper else {
        return;
    };
    let Some(paired) = paired_delimiter(editor.dom(), wrapper, moving_before) else {
        return;
    };
    let Some(new_range) = new_range(editor.dom(), range, is_shrinking, moving_before, paired, shift_key)
    else {
        return;
    };
    log::trace!(target: "entity", "moving selection over entity {wrapper:?}");
    editor.set_dom_selection(Some(DomSelection::range(
        new_range,
        !new_range.is_collapsed() && is_reverted,
    )));
}

/// Wrapper of the entity the selection is about to cross
fn find_entity_wrapper(
    model: &ContentModelDocument,
    is_reverted: bool,
    is_shrinking: bool,
    moving_before: bool,
) -> Option<NodeId> {
    let selected = get_selected_segments(model);
    let address = if is_reverted {
        selected.first()
    } else {
        selected.last()
    }?;
    let paragraph = model.paragraph(&address.paragraph)?;

    let neighbour = |index: usize, len: usize| {
        if moving_before {
            index.checked_sub(1)
        } else {
            Some(index + 1).filter(|&i| i < len)
        }
    };

    let segment = if is_shrinking {
        paragraph.segments.get(address.index)
    } else {
        neighbour(address.index, paragraph.segments.len()).and_then(|i| paragraph.segments.get(i))
    };
    if let Some(entity) = segment.and_then(Segment::entity_value) {
        return Some(entity.wrapper);
    }

    let (group, paragraph_index) = address.paragraph.split_last_block()?;
    let blocks = model.group(&group)?;
    match blocks.get(neighbour(paragraph_index, blocks.len())?) {
        Some(Block::Entity(block)) => Some(block.entity.wrapper),
        _ => None,
    }
}

fn paired_delimiter(dom: &Dom, wrapper: NodeId, moving_before: bool) -> Option<NodeId> {
    let sibling = if moving_before {
        dom.previous_element_sibling(wrapper)
    } else {
        dom.next_element_sibling(wrapper)
    }?;
    is_entity_delimiter(dom, sibling).then_some(sibling)
}

fn new_range(
    dom: &Dom,
    original: DomRange,
    is_shrinking: bool,
    moving_before: bool,
    paired: NodeId,
    shift_key: bool,
) -> Option<DomRange> {
    let range = match (is_shrinking, moving_before) {
        (true, true) => DomRange::new(original.start, DomPosition::before(dom, paired)?),
        (true, false) => DomRange::new(DomPosition::after(dom, paired)?, original.end),
        (false, true) => {
            let start = DomPosition::before(dom, paired)?;
            if shift_key {
                DomRange::new(start, original.end)
            } else {
                DomRange::collapsed(start)
            }
        }
        (false, false) => {
            let end = DomPosition::after(dom, paired)?;
            if shift_key {
                DomRange::new(original.start, end)
            } else {
                DomRange::collapsed(end)
            }
        }
    };
    Some(range)
}
