//! Removing the selected content from a model.

use crate::model::selection::{
    IterateSelectionsOption, SelectedCellContent, SelectionItem, TableSelectionContext,
    collect_selections,
};
use crate::model::{
    Block, ContentModelDocument, Entity, GroupPath, ModelPath, Paragraph, Segment, SegmentAddress,
    SegmentFormat, SegmentKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteResult {
    /// There was a selection but nothing besides the caret was removed
    NotDeleted,
    /// Selected content was removed
    Range,
    /// The model holds no selection at all
    NothingToDelete,
}

/// Where the caret ends up after a deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertPoint {
    pub marker: SegmentAddress,
    /// Groups enclosing the paragraph holding the marker, innermost first
    pub path: Vec<GroupPath>,
    pub table_context: Option<TableSelectionContext>,
}

impl InsertPoint {
    pub fn paragraph(&self) -> &ModelPath {
        &self.marker.paragraph
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteSelectionContext {
    pub delete_result: DeleteResult,
    pub insert_point: Option<InsertPoint>,
    pub deleted_entities: Vec<Entity>,
    last_paragraph: Option<ModelPath>,
    last_table_context: Option<TableSelectionContext>,
}

impl DeleteSelectionContext {
    fn new() -> Self {
        Self {
            delete_result: DeleteResult::NotDeleted,
            insert_point: None,
            deleted_entities: Vec::new(),
            last_paragraph: None,
            last_table_context: None,
        }
    }
}

/// Extra behavior run once the selection is gone and an insert point exists
pub type DeleteSelectionStep = fn(&mut ContentModelDocument, &mut DeleteSelectionContext);

fn marker_paragraph(format: &SegmentFormat, trailing: Option<Segment>) -> Paragraph {
    let mut segments = vec![Segment::selection_marker().with_format(format.clone())];
    segments.extend(trailing);
    Paragraph {
        segment_format: (!format.is_empty()).then(|| format.clone()),
        ..Paragraph::new(segments)
    }
}

/// Deletes everything selected and leaves a single selection marker where
/// the first selected content was.
///
/// Wholly selected blocks are removed (the first one is replaced by a
/// paragraph holding the marker), selected table cells are emptied and
/// selected segments are cut out of their paragraphs. `additional_steps` run
/// next; finally the paragraph holding the end of the selection is merged
/// into the one holding the marker. The model is left unnormalized.
pub fn delete_selection(
    model: &mut ContentModelDocument,
    additional_steps: &[DeleteSelectionStep],
) -> DeleteSelectionContext {
    let mut context = DeleteSelectionContext::new();
    let items = collect_selections(
        model,
        IterateSelectionsOption {
            content_under_selected_cell: SelectedCellContent::IgnoreForTableOrCell,
        },
    );
    if items.is_empty() {
        context.delete_result = DeleteResult::NothingToDelete;
        return context;
    }

    let mut removals = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        delete_item(model, item, index == 0, &mut context, &mut removals);
    }

    for removed in removals.iter().rev() {
        if let Some((group, index)) = removed.split_last_block()
            && let Some(blocks) = model.group_mut(&group)
            && index < blocks.len()
        {
            blocks.remove(index);
        }
        if let Some(last) = &mut context.last_paragraph {
            last.adjust_for_removal(removed);
        }
        if let Some(table_context) = &mut context.last_table_context {
            table_context.table.adjust_for_removal(removed);
        }
    }

    for step in additional_steps {
        if context.insert_point.is_some() {
            step(model, &mut context);
        }
    }

    merge_paragraph_after_delete(model, &context);
    log::debug!(
        "delete selection: {:?}, {} entities removed",
        context.delete_result,
        context.deleted_entities.len()
    );
    context
}

fn delete_item(
    model: &mut ContentModelDocument,
    item: SelectionItem,
    is_first: bool,
    context: &mut DeleteSelectionContext,
    removals: &mut Vec<ModelPath>,
) {
    let default_format = model.format.clone();
    match (item.block, item.segments) {
        (Some(paragraph_path), Some(segments)) => {
            let Some(paragraph) = model.paragraph_mut(&paragraph_path) else {
                return;
            };
            let Some(&first) = segments.first() else {
                return;
            };
            let marker_format = paragraph.segments[first].format.clone();
            for &index in segments.iter().rev() {
                let segment = paragraph.segments.remove(index);
                match segment.kind {
                    SegmentKind::SelectionMarker => {}
                    SegmentKind::Entity(entity) => {
                        context.deleted_entities.push(entity);
                        context.delete_result = DeleteResult::Range;
                    }
                    _ => context.delete_result = DeleteResult::Range,
                }
            }
            paragraph.is_implicit = false;
            context.last_paragraph = Some(paragraph_path.clone());
            context.last_table_context = item.table_context.clone();

            if is_first {
                paragraph
                    .segments
                    .insert(first, Segment::selection_marker().with_format(marker_format));
                context.insert_point = Some(InsertPoint {
                    marker: SegmentAddress::new(paragraph_path, first),
                    path: item.path,
                    table_context: item.table_context,
                });
            }
        }
        (Some(block_path), None) => {
            let Some(block) = model.block_mut(&block_path) else {
                return;
            };
            if let Block::Entity(entity) = block {
                context.deleted_entities.push(entity.entity.clone());
            }
            context.delete_result = DeleteResult::Range;

            if is_first {
                *block = Block::Paragraph(marker_paragraph(&default_format, None));
                context.insert_point = Some(InsertPoint {
                    marker: SegmentAddress::new(block_path, 0),
                    path: item.path,
                    table_context: item.table_context,
                });
            } else {
                removals.push(block_path);
            }
        }
        (None, _) => {
            let Some(cell_context) = item.table_context else {
                return;
            };
            let Some(cell) = model
                .table_mut(&cell_context.table)
                .and_then(|t| t.rows.get_mut(cell_context.row))
                .and_then(|r| r.cells.get_mut(cell_context.col))
            else {
                return;
            };
            let br = Segment::br().with_format(default_format.clone());
            cell.blocks = vec![Block::Paragraph(if is_first {
                marker_paragraph(&default_format, Some(br))
            } else {
                Paragraph {
                    segment_format: (!default_format.is_empty()).then(|| default_format.clone()),
                    ..Paragraph::new(vec![br])
                }
            })];
            context.delete_result = DeleteResult::Range;

            if is_first {
                let cell_path = cell_context.table.cell(cell_context.row, cell_context.col);
                context.insert_point = Some(InsertPoint {
                    marker: SegmentAddress::new(cell_path.block(0), 0),
                    path: item.path,
                    table_context: Some(cell_context),
                });
            }
        }
    }
}

/// Moves what is left of the last touched paragraph behind the marker, when
/// the deletion spanned more than one paragraph in the same table cell (or
/// outside tables).
fn merge_paragraph_after_delete(model: &mut ContentModelDocument, context: &DeleteSelectionContext) {
    let Some(insert_point) = &context.insert_point else {
        return;
    };
    let Some(last) = &context.last_paragraph else {
        return;
    };
    if context.delete_result != DeleteResult::Range
        || last == insert_point.paragraph()
        || context.last_table_context != insert_point.table_context
    {
        return;
    }
    let Some(segments) = model
        .paragraph_mut(last)
        .map(|p| std::mem::take(&mut p.segments))
    else {
        return;
    };
    if let Some(target) = model.paragraph_mut(insert_point.paragraph()) {
        target.segments.extend(segments);
    }
}
