/*!
 * # Content model mutations
 *
 * Editing operations expressed against the content model rather than the DOM.
 * They run inside [`crate::editor::Editor::format_content_model`], which
 * writes the result back and records undo snapshots around it.
 *
 * ## Module Structure
 *
 * - **`clear_format`**: strips segment, block, list, container and table formatting
 * - **`delete_selection`**: removes selected content, leaving a caret insert point
 * - **`delete_empty_list`**: delete step demoting a list item emptied by the deletion
 * - **`table_format`**: baseline table borders, banding and header flags
 */

pub mod clear_format;
pub mod delete_empty_list;
pub mod delete_selection;
pub mod table_format;

pub use clear_format::{ClearFormatTargets, clear_format, clear_format_fixpoint, clear_model_format};
pub use delete_empty_list::delete_empty_list;
pub use delete_selection::{
    DeleteResult, DeleteSelectionContext, DeleteSelectionStep, InsertPoint, delete_selection,
};
pub use table_format::apply_table_format;
