use super::delete_selection::{DeleteResult, DeleteSelectionContext};
use crate::model::path::closest_group_index;
use crate::model::selection::{has_selection_in_block, is_block_empty};
use crate::model::{Block, ContentModelDocument, GroupKind};

/// Delete step that turns the list item holding the caret back into plain
/// content when the deletion swallowed everything up to an empty following
/// block, so no dangling empty bullet is left behind.
pub fn delete_empty_list(model: &mut ContentModelDocument, context: &mut DeleteSelectionContext) {
    if context.delete_result != DeleteResult::Range {
        return;
    }
    let Some(insert_point) = &context.insert_point else {
        return;
    };
    let Some(index) = closest_group_index(
        &insert_point.path,
        &[GroupKind::ListItem],
        &[GroupKind::TableCell],
    ) else {
        return;
    };
    let item_path = &insert_point.path[index].path;
    let Some((group_path, item_index)) = item_path.split_last_block() else {
        return;
    };
    let Some(blocks) = model.group_mut(&group_path) else {
        return;
    };

    let holds_selection = match blocks.get(item_index) {
        Some(item @ Block::ListItem(list_item)) => {
            !list_item.blocks.is_empty() && has_selection_in_block(item)
        }
        _ => false,
    };
    let selected_before = item_index
        .checked_sub(1)
        .and_then(|i| blocks.get(i))
        .is_some_and(has_selection_in_block);
    let next_is_empty = blocks.get(item_index + 1).is_some_and(is_block_empty);

    if holds_selection
        && !selected_before
        && next_is_empty
        && let Some(Block::ListItem(list_item)) = blocks.get_mut(item_index)
    {
        log::debug!(
            "removing {} list level(s) from emptied list item",
            list_item.levels.len()
        );
        list_item.levels.clear();
    }
}
