/*!
 * # Editor
 *
 * The editor owns the live DOM, the content root inside it, the current DOM
 * selection, the entity map, dark mode state and undo history. Operations
 * that need an editor take `&mut dyn Editor` so hosts can supply their own
 * implementation; [`EditorCore`] is the one provided here.
 *
 * Converting between DOM and content model is not done here. A host that
 * wants `format_content_model` to write its result back to the DOM installs
 * a [`ContentModelBridge`].
 */

mod editor_core;

use serde::{Deserialize, Serialize};

use crate::dom::{Dom, DomSelection, NodeId, Selector};
use crate::entity::EntityMarker;
use crate::model::{ContentModelDocument, Entity, SegmentFormat};
use crate::undo::EntityState;
use crate::undo::snapshots::DEFAULT_MAX_SNAPSHOTS;

pub use editor_core::EditorCore;

/// Where a content change came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSource {
    Format,
    SetContent,
    SwitchToDarkMode,
    SwitchToLightMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityOperation {
    /// The entity was removed because a selection covering it was deleted
    Overwrite,
    /// The entity is no longer attached under the content root
    Removed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PluginEvent {
    BeforeSetContent {
        new_content: String,
    },
    ContentChanged {
        source: ChangeSource,
        api_name: Option<String>,
        entity_states: Option<Vec<EntityState>>,
    },
    EntityOperation {
        operation: EntityOperation,
        entity_id: String,
        marker: Option<EntityMarker>,
    },
}

/// Receives every event the editor triggers, in registration order
pub trait EditorPlugin {
    fn name(&self) -> &str;

    fn on_plugin_event(&mut self, event: &PluginEvent);
}

/// Converts between the live DOM and the content model
pub trait ContentModelBridge {
    /// Builds the content model for the children of `root`, with selection
    /// markers where `selection` lies.
    fn create_content_model(
        &mut self,
        dom: &Dom,
        root: NodeId,
        selection: Option<&DomSelection>,
    ) -> ContentModelDocument;

    /// Replaces the children of `root` with the rendering of `model` and
    /// returns the DOM selection matching the model's selection markers.
    fn set_content_model(
        &mut self,
        dom: &mut Dom,
        root: NodeId,
        model: &ContentModelDocument,
    ) -> Option<DomSelection>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedEntity {
    pub entity: Entity,
    pub operation: EntityOperation,
}

/// Side channel a formatter fills while it mutates the model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatContext {
    pub deleted_entities: Vec<DeletedEntity>,
    /// The resulting snapshot may be coalesced with the next auto-completeable one
    pub is_auto_completeable: bool,
    /// Write the change back without taking an undo snapshot
    pub skip_undo_snapshot: bool,
    pub entity_states: Option<Vec<EntityState>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatContentModelOptions {
    /// Name of the public operation, reported with the change event
    pub api_name: Option<String>,
    pub change_source: Option<ChangeSource>,
}

impl FormatContentModelOptions {
    pub fn api(name: &str) -> Self {
        Self {
            api_name: Some(name.to_string()),
            change_source: None,
        }
    }
}

/// Formatter callback: mutates the model and returns whether it changed it
pub type ContentModelFormatter<'a> =
    dyn FnMut(&mut ContentModelDocument, &mut FormatContext) -> bool + 'a;

pub trait Editor {
    fn dom(&self) -> &Dom;

    fn content_root(&self) -> NodeId;

    fn get_dom_selection(&self) -> Option<DomSelection>;

    fn set_dom_selection(&mut self, selection: Option<DomSelection>);

    /// Hands the content model to `formatter`. When it reports a change the
    /// model is written back, surrounded by undo snapshots, and a
    /// `ContentChanged` event is triggered.
    fn format_content_model(
        &mut self,
        formatter: &mut ContentModelFormatter<'_>,
        options: FormatContentModelOptions,
    );

    fn trigger_event(&mut self, event: PluginEvent);

    /// Closest ancestor of `node` (itself included) matching `selector`,
    /// staying inside the content root
    fn find_closest_element_ancestor(&self, node: NodeId, selector: &Selector) -> Option<NodeId>;

    fn focus(&mut self);

    fn has_focus(&self) -> bool;

    fn is_disposed(&self) -> bool;
}

/// User facing editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    /// Most snapshots kept in the undo history
    pub undo_max_snapshots: usize,
    /// Upper bound for the summed HTML length of all snapshots, in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undo_max_total_html_len: Option<usize>,
    pub is_dark_mode: bool,
    /// Format new content falls back to; cleared text takes this format
    pub default_segment_format: SegmentFormat,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            undo_max_snapshots: DEFAULT_MAX_SNAPSHOTS,
            undo_max_total_html_len: None,
            is_dark_mode: false,
            default_segment_format: SegmentFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_options_fill_missing_fields_with_defaults() {
        let options: EditorOptions = serde_json::from_str(r#"{"is_dark_mode":true}"#).unwrap();
        assert_eq!(
            options,
            EditorOptions {
                is_dark_mode: true,
                ..EditorOptions::default()
            }
        );
        assert_eq!(options.undo_max_snapshots, 100);
    }
}
