//! Removing formatting from the selected content.

use std::collections::HashSet;

use super::table_format::apply_table_format;
use crate::editor::{Editor, FormatContentModelOptions};
use crate::model::normalize::normalize_selected_content;
use crate::model::path::closest_group_index;
use crate::model::selection::{
    IterateSelectionsOption, collect_selections, is_whole_block_selected,
};
use crate::model::word::adjust_word_selection;
use crate::model::{
    Block, BlockFormat, ContentModelDocument, FormatContainer, GroupKind, GroupPath, ModelPath,
    PathStep, SegmentAddress, SegmentFormat, TableCellFormat, TableFormat,
};

/// Upper bound of clearing passes; structure nested deeper than this is
/// left for the next call
pub const MAX_CLEAR_FORMAT_LOOP: usize = 3;

/// A touched block and the groups enclosing it, innermost first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedBlock {
    pub path: Vec<GroupPath>,
    pub block: ModelPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedTable {
    pub table: ModelPath,
    pub is_whole_table_selected: bool,
}

/// Everything one clearing pass touched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearFormatTargets {
    pub blocks: Vec<SelectedBlock>,
    pub segments: Vec<SegmentAddress>,
    pub tables: Vec<SelectedTable>,
}

/// Strips segment, block, list, container and table formatting from the
/// editor's selection.
pub fn clear_format(editor: &mut dyn Editor) {
    editor.focus();
    editor.format_content_model(
        &mut |model, _context| clear_format_fixpoint(model),
        FormatContentModelOptions::api("clearFormat"),
    );
}

/// Repeats [`clear_model_format`] until a pass changes nothing, at most
/// [`MAX_CLEAR_FORMAT_LOOP`] times. Returns whether the model changed.
pub fn clear_format_fixpoint(model: &mut ContentModelDocument) -> bool {
    let mut changed = false;
    for pass in 0..MAX_CLEAR_FORMAT_LOOP {
        let before = model.clone();
        clear_model_format(model);
        normalize_selected_content(model);
        if *model == before {
            log::trace!("clear format settled after {pass} pass(es)");
            return changed;
        }
        changed = true;
    }
    log::debug!("clear format stopped at {MAX_CLEAR_FORMAT_LOOP} passes");
    changed
}

/// One clearing pass over the current selection
pub fn clear_model_format(model: &mut ContentModelDocument) -> ClearFormatTargets {
    let mut targets = collect_targets(model);

    let single_caret = targets.blocks.len() == 1
        && targets.segments.len() == 1
        && model
            .segment(&targets.segments[0])
            .is_some_and(|s| s.is_marker());
    let restructure = !single_caret
        && (targets.blocks.len() > 1
            || targets
                .blocks
                .iter()
                .any(|b| model.block(&b.block).is_some_and(is_whole_block_selected)));

    if single_caret {
        expand_to_word(model, &mut targets);
        clear_list_format(model, &targets.blocks[0]);
    }

    clear_segment_formats(model, &targets.segments);
    clear_table_formats(model, &targets.tables);

    if restructure {
        for block in &targets.blocks {
            clear_block_format(model, &block.block);
        }
        restructure_blocks(model, &targets.blocks);
    }
    targets
}

fn collect_targets(model: &ContentModelDocument) -> ClearFormatTargets {
    let mut targets = ClearFormatTargets::default();
    for item in collect_selections(model, IterateSelectionsOption::default()) {
        if let Some(context) = &item.table_context {
            match targets.tables.iter_mut().find(|t| t.table == context.table) {
                Some(table) => table.is_whole_table_selected |= context.is_whole_table_selected,
                None => targets.tables.push(SelectedTable {
                    table: context.table.clone(),
                    is_whole_table_selected: context.is_whole_table_selected,
                }),
            }
        }
        if let Some(block) = item.block {
            if let Some(segments) = item.segments {
                targets.segments.extend(
                    segments
                        .into_iter()
                        .map(|index| SegmentAddress::new(block.clone(), index)),
                );
            }
            targets.blocks.push(SelectedBlock {
                path: item.path,
                block,
            });
        }
    }
    targets
}

fn expand_to_word(model: &mut ContentModelDocument, targets: &mut ClearFormatTargets) {
    let marker = targets.segments[0].clone();
    if let Some(paragraph) = model.paragraph_mut(&marker.paragraph) {
        targets.segments = adjust_word_selection(paragraph, marker.index)
            .into_iter()
            .map(|index| SegmentAddress::new(marker.paragraph.clone(), index))
            .collect();
    }
}

fn clear_list_format(model: &mut ContentModelDocument, block: &SelectedBlock) {
    if let Some(index) =
        closest_group_index(&block.path, &[GroupKind::ListItem], &[GroupKind::TableCell])
        && let Some(item) = model.list_item_mut(&block.path[index].path)
    {
        item.format_holder.format = SegmentFormat::default();
    }
}

fn clear_segment_formats(model: &mut ContentModelDocument, segments: &[SegmentAddress]) {
    let default_format = model.format.clone();
    for address in segments {
        if let Some(segment) = model.segment_mut(address) {
            segment.format = default_format.clone();
            if let Some(link) = &mut segment.link {
                link.format.text_color = None;
            }
            segment.code = None;
        }
    }
}

fn clear_table_formats(model: &mut ContentModelDocument, tables: &[SelectedTable]) {
    for selected in tables {
        let Some(table) = model.table_mut(&selected.table) else {
            continue;
        };
        if selected.is_whole_table_selected {
            table.format = TableFormat {
                use_border_box: table.format.use_border_box,
                border_collapse: table.format.border_collapse,
                ..TableFormat::default()
            };
            table.metadata = None;
        }
        for cell in table.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
            if cell.is_selected {
                cell.is_header = false;
                cell.metadata = None;
                cell.format = TableCellFormat {
                    use_border_box: cell.format.use_border_box,
                    ..TableCellFormat::default()
                };
            }
        }
        apply_table_format(table, None);
    }
}

fn clear_block_format(model: &mut ContentModelDocument, path: &ModelPath) {
    match model.block_mut(path) {
        Some(Block::Paragraph(paragraph)) => {
            paragraph.format = BlockFormat::default();
            paragraph.decorator = None;
            paragraph.segment_format = None;
        }
        Some(Block::Divider(divider)) => divider.format = BlockFormat::default(),
        _ => {}
    }
}

/// Unwraps list items and splits format containers around the touched
/// blocks, last block first so the paths of earlier ones stay valid.
fn restructure_blocks(model: &mut ContentModelDocument, blocks: &[SelectedBlock]) {
    let mut unwrapped: HashSet<ModelPath> = HashSet::new();

    for block in blocks.iter().rev() {
        if block.path.iter().any(|g| unwrapped.contains(&g.path)) {
            continue;
        }
        let Some(index) = closest_group_index(
            &block.path,
            &[GroupKind::ListItem, GroupKind::FormatContainer],
            &[GroupKind::TableCell],
        ) else {
            continue;
        };
        let group = &block.path[index];
        match group.kind {
            GroupKind::ListItem => {
                if unwrap_list_item(model, &group.path) {
                    unwrapped.insert(group.path.clone());
                }
            }
            GroupKind::FormatContainer => split_container(model, &group.path, &block.block),
            GroupKind::Document | GroupKind::TableCell => {}
        }
    }
}

fn unwrap_list_item(model: &mut ContentModelDocument, item_path: &ModelPath) -> bool {
    let Some((parent, index)) = item_path.split_last_block() else {
        return false;
    };
    let Some(siblings) = model.group_mut(&parent) else {
        return false;
    };
    if !matches!(siblings.get(index), Some(Block::ListItem(_))) {
        return false;
    }
    let Block::ListItem(item) = siblings.remove(index) else {
        return false;
    };
    log::trace!("unwrapping list item at {item_path:?}");
    siblings.splice(index..index, item.blocks);
    true
}

/// Moves `block` out of the container at `container_path`. Blocks before it
/// stay in the container; blocks after it go into a copy of the container.
fn split_container(model: &mut ContentModelDocument, container_path: &ModelPath, block: &ModelPath) {
    let Some(&PathStep::Block(child_index)) = block.steps().get(container_path.steps().len()) else {
        return;
    };
    let Some((parent, index)) = container_path.split_last_block() else {
        return;
    };
    let Some(siblings) = model.group_mut(&parent) else {
        return;
    };
    let Some(Block::FormatContainer(container)) = siblings.get_mut(index) else {
        return;
    };
    if child_index >= container.blocks.len() {
        return;
    }

    let tag_name = container.tag_name.clone();
    let format = container.format.clone();
    let mut before = std::mem::take(&mut container.blocks);
    let after = before.split_off(child_index + 1);
    let Some(moved) = before.pop() else {
        return;
    };
    let shell = |blocks: Vec<Block>| {
        Block::FormatContainer(FormatContainer {
            tag_name: tag_name.clone(),
            blocks,
            format: format.clone(),
        })
    };

    let mut replacement = Vec::with_capacity(3);
    if !before.is_empty() {
        replacement.push(shell(before));
    }
    replacement.push(moved);
    if !after.is_empty() {
        replacement.push(shell(after));
    }
    log::trace!("splitting {tag_name} container at {container_path:?}");
    siblings.splice(index..=index, replacement);
}
