/*!
 * # Undo / redo
 *
 * Undo works on content snapshots rather than on inverted operations. A
 * [`Snapshot`] records the serialized content root, the color pairs in use,
 * optional entity states, the dark mode flag and a [`SnapshotSelection`]: a
 * position independent encoding of the DOM selection.
 *
 * ## Module Structure
 *
 * - **`path`**: DOM position <-> normalized integer path
 * - **`table`**: table sectioning normalization applied before paths are taken
 * - **`selection`**: DOM selection <-> `SnapshotSelection`
 * - **`snapshots`**: the bounded, truncating snapshot stack
 * - **`reconcile`**: merges snapshot HTML into the live DOM, moving entities
 * - **`colors`**: restores color pairs and dark mode transforms
 * - **`restore`**: `add_undo_snapshot`, `restore_undo_snapshot`, `undo`, `redo`
 */

pub mod colors;
pub mod path;
pub mod reconcile;
pub mod restore;
pub mod selection;
pub mod snapshots;
pub mod table;

use serde::{Deserialize, Serialize};

use crate::color::Colors;

pub use restore::{add_undo_snapshot, can_redo, can_undo, redo, restore_undo_snapshot, undo};
pub use snapshots::SnapshotsManager;

/// Opaque state an entity asked to be kept with a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityState {
    pub id: String,
    pub state: String,
}

/// Serializable encoding of a DOM selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SnapshotSelection {
    Range {
        start: Vec<usize>,
        end: Vec<usize>,
        is_reverted: bool,
    },
    Image {
        image_id: String,
    },
    Table {
        table_id: String,
        first_row: usize,
        last_row: usize,
        first_column: usize,
        last_column: usize,
    },
}

impl Default for SnapshotSelection {
    /// Collapsed at the start of the content root
    fn default() -> Self {
        Self::Range {
            start: Vec::new(),
            end: Vec::new(),
            is_reverted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub html: String,
    pub known_colors: Vec<Colors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_states: Option<Vec<EntityState>>,
    pub is_dark_mode: bool,
    pub selection: SnapshotSelection,
}

impl Snapshot {
    pub fn from_html(html: &str) -> Self {
        Self {
            html: html.to_string(),
            known_colors: Vec::new(),
            entity_states: None,
            is_dark_mode: false,
            selection: SnapshotSelection::default(),
        }
    }
}

/// Undo bookkeeping owned by the editor core
#[derive(Debug)]
pub struct UndoState {
    pub(crate) snapshots: SnapshotsManager,
    pub(crate) is_restoring: bool,
}

impl UndoState {
    pub fn new(snapshots: SnapshotsManager) -> Self {
        Self {
            snapshots,
            is_restoring: false,
        }
    }

    pub fn snapshots(&self) -> &SnapshotsManager {
        &self.snapshots
    }

    pub fn is_restoring(&self) -> bool {
        self.is_restoring
    }
}
