pub mod color;
pub mod dom;
pub mod editor;
pub mod entity;
pub mod model;
pub mod mutate;
pub mod undo;

// Re-export key types for easier usage
pub use dom::{Dom, DomError, DomPosition, DomRange, DomSelection, NodeId};
pub use editor::{Editor, EditorCore, EditorOptions, EditorPlugin, PluginEvent};
pub use entity::adjust_selection::{ArrowKey, adjust_selection_around_entity};
pub use model::ContentModelDocument;
pub use mutate::{clear_format, delete_empty_list, delete_selection};
pub use undo::{
    Snapshot, SnapshotSelection, SnapshotsManager, add_undo_snapshot, can_redo, can_undo, redo,
    restore_undo_snapshot, undo,
};
