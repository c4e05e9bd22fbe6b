//! Walking the selection held in a content model.

use super::path::{GroupKind, GroupPath, ModelPath, SegmentAddress};
use super::{Block, ContentModelDocument, Table};

/// What to report for the content of selected table cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectedCellContent {
    /// Report selected cells and everything inside them
    #[default]
    Include,
    /// Report a wholly selected table as one block; otherwise as `Include`
    IgnoreForTable,
    /// Report a wholly selected table as one block and never descend into selected cells
    IgnoreForTableOrCell,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IterateSelectionsOption {
    pub content_under_selected_cell: SelectedCellContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSelectionContext {
    pub table: ModelPath,
    pub row: usize,
    pub col: usize,
    pub is_whole_table_selected: bool,
}

/// One unit of selection found by [`iterate_selections`].
///
/// - paragraph with selected segments: `block` and `segments` are set
/// - selected divider, entity or (when reported whole) table: only `block`
/// - selected table cell: neither, `table_context` names the cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionItem {
    /// Enclosing groups, innermost first, document last
    pub path: Vec<GroupPath>,
    pub table_context: Option<TableSelectionContext>,
    pub block: Option<ModelPath>,
    /// Indices of selected segments in the paragraph named by `block`
    pub segments: Option<Vec<usize>>,
}

struct Walker<'c> {
    option: IterateSelectionsOption,
    callback: &'c mut dyn FnMut(SelectionItem) -> bool,
}

impl Walker<'_> {
    /// Returns true once the callback asked to stop
    fn walk_group(
        &mut self,
        blocks: &[Block],
        path: &[GroupPath],
        table: Option<&TableSelectionContext>,
        treat_all_as_selected: bool,
    ) -> bool {
        let group_path = &path[0].path;

        for (index, block) in blocks.iter().enumerate() {
            let block_path = group_path.block(index);
            let stop = match block {
                Block::Paragraph(paragraph) => {
                    let selected: Vec<usize> = paragraph
                        .segments
                        .iter()
                        .enumerate()
                        .filter(|(_, s)| treat_all_as_selected || s.is_selected)
                        .map(|(i, _)| i)
                        .collect();
                    !selected.is_empty()
                        && (self.callback)(SelectionItem {
                            path: path.to_vec(),
                            table_context: table.cloned(),
                            block: Some(block_path),
                            segments: Some(selected),
                        })
                }
                Block::Divider(divider) => {
                    (treat_all_as_selected || divider.is_selected)
                        && self.report_block(path, table, block_path)
                }
                Block::Entity(entity) => {
                    (treat_all_as_selected || entity.is_selected)
                        && self.report_block(path, table, block_path)
                }
                Block::ListItem(item) => self.walk_group(
                    &item.blocks,
                    &nested(path, GroupKind::ListItem, block_path),
                    table,
                    treat_all_as_selected,
                ),
                Block::FormatContainer(container) => self.walk_group(
                    &container.blocks,
                    &nested(path, GroupKind::FormatContainer, block_path),
                    table,
                    treat_all_as_selected,
                ),
                Block::Table(t) => self.walk_table(t, path, table, block_path, treat_all_as_selected),
            };
            if stop {
                return true;
            }
        }
        false
    }

    fn report_block(
        &mut self,
        path: &[GroupPath],
        table: Option<&TableSelectionContext>,
        block: ModelPath,
    ) -> bool {
        (self.callback)(SelectionItem {
            path: path.to_vec(),
            table_context: table.cloned(),
            block: Some(block),
            segments: None,
        })
    }

    fn walk_table(
        &mut self,
        table: &Table,
        path: &[GroupPath],
        outer_table: Option<&TableSelectionContext>,
        table_path: ModelPath,
        treat_all_as_selected: bool,
    ) -> bool {
        let is_whole_table_selected = is_whole_table_selected(table);

        if is_whole_table_selected
            && self.option.content_under_selected_cell != SelectedCellContent::Include
        {
            return self.report_block(path, outer_table, table_path);
        }

        for (row, table_row) in table.rows.iter().enumerate() {
            for (col, cell) in table_row.cells.iter().enumerate() {
                let context = TableSelectionContext {
                    table: table_path.clone(),
                    row,
                    col,
                    is_whole_table_selected,
                };
                let cell_path = nested(path, GroupKind::TableCell, table_path.cell(row, col));

                if cell.is_selected {
                    let stop = (self.callback)(SelectionItem {
                        path: cell_path.clone(),
                        table_context: Some(context.clone()),
                        block: None,
                        segments: None,
                    });
                    if stop {
                        return true;
                    }
                    if self.option.content_under_selected_cell
                        != SelectedCellContent::IgnoreForTableOrCell
                        && self.walk_group(&cell.blocks, &cell_path, Some(&context), true)
                    {
                        return true;
                    }
                } else if self.walk_group(
                    &cell.blocks,
                    &cell_path,
                    Some(&context),
                    treat_all_as_selected,
                ) {
                    return true;
                }
            }
        }
        false
    }
}

fn nested(path: &[GroupPath], kind: GroupKind, group: ModelPath) -> Vec<GroupPath> {
    let mut out = Vec::with_capacity(path.len() + 1);
    out.push(GroupPath { kind, path: group });
    out.extend_from_slice(path);
    out
}

fn is_whole_table_selected(table: &Table) -> bool {
    let mut cells = table.cells().peekable();
    cells.peek().is_some() && cells.all(|c| c.is_selected)
}

/// Visits every selected unit in document order until `callback` returns true.
pub fn iterate_selections(
    model: &ContentModelDocument,
    option: IterateSelectionsOption,
    callback: &mut dyn FnMut(SelectionItem) -> bool,
) {
    let mut walker = Walker { option, callback };
    walker.walk_group(&model.blocks, &[GroupPath::root()], None, false);
}

pub fn collect_selections(
    model: &ContentModelDocument,
    option: IterateSelectionsOption,
) -> Vec<SelectionItem> {
    let mut items = Vec::new();
    iterate_selections(model, option, &mut |item| {
        items.push(item);
        false
    });
    items
}

/// Addresses of all selected segments in document order
pub fn get_selected_segments(model: &ContentModelDocument) -> Vec<SegmentAddress> {
    collect_selections(model, IterateSelectionsOption::default())
        .into_iter()
        .filter_map(|item| Some((item.block?, item.segments?)))
        .flat_map(|(paragraph, segments)| {
            segments
                .into_iter()
                .map(move |index| SegmentAddress::new(paragraph.clone(), index))
        })
        .collect()
}

/// Selected segments grouped with the path of the paragraph holding them
pub fn get_selected_paragraphs(model: &ContentModelDocument) -> Vec<(ModelPath, Vec<usize>)> {
    collect_selections(model, IterateSelectionsOption::default())
        .into_iter()
        .filter_map(|item| Some((item.block?, item.segments?)))
        .collect()
}

pub fn has_selection_in_block(block: &Block) -> bool {
    match block {
        Block::Paragraph(p) => p.segments.iter().any(|s| s.is_selected),
        Block::Divider(d) => d.is_selected,
        Block::Entity(e) => e.is_selected,
        Block::ListItem(item) => has_selection_in_group(&item.blocks),
        Block::FormatContainer(c) => has_selection_in_group(&c.blocks),
        Block::Table(t) => t
            .cells()
            .any(|c| c.is_selected || has_selection_in_group(&c.blocks)),
    }
}

pub fn has_selection_in_group(blocks: &[Block]) -> bool {
    blocks.iter().any(has_selection_in_block)
}

/// Whether every part of `block` is selected. A paragraph holding nothing but
/// selection markers does not count.
pub fn is_whole_block_selected(block: &Block) -> bool {
    match block {
        Block::Paragraph(p) => {
            p.segments.iter().any(|s| !s.is_marker()) && p.segments.iter().all(|s| s.is_selected)
        }
        Block::Divider(d) => d.is_selected,
        Block::Entity(e) => e.is_selected,
        Block::Table(t) => is_whole_table_selected(t),
        Block::ListItem(item) => is_whole_group_selected(&item.blocks),
        Block::FormatContainer(c) => is_whole_group_selected(&c.blocks),
    }
}

fn is_whole_group_selected(blocks: &[Block]) -> bool {
    !blocks.is_empty() && blocks.iter().all(is_whole_block_selected)
}

/// A paragraph with nothing renderable, or a group made only of such blocks
pub fn is_block_empty(block: &Block) -> bool {
    use super::SegmentKind;
    match block {
        Block::Paragraph(p) => p.segments.iter().all(|s| match &s.kind {
            SegmentKind::SelectionMarker | SegmentKind::Br => true,
            SegmentKind::Text { text } => text.is_empty(),
            _ => false,
        }),
        Block::ListItem(item) => item.blocks.iter().all(is_block_empty),
        Block::FormatContainer(c) => c.blocks.iter().all(is_block_empty),
        Block::Table(t) => t.rows.is_empty(),
        Block::Divider(_) | Block::Entity(_) => false,
    }
}
