use super::colors::restore_snapshot_colors;
use super::reconcile::restore_snapshot_html;
use super::selection::{create_snapshot_selection, restore_snapshot_selection};
use super::{EntityState, Snapshot};
use crate::dom::html::inner_html;
use crate::editor::{ChangeSource, Editor, EditorCore, PluginEvent};

/// Captures the current content and selection into the history.
///
/// Returns `None` without recording anything while a snapshot is being
/// restored.
pub fn add_undo_snapshot(
    core: &mut EditorCore,
    is_auto_completeable: bool,
    entity_states: Option<Vec<EntityState>>,
) -> Option<Snapshot> {
    if core.undo.is_restoring {
        return None;
    }

    let root = core.content_root;
    let selection = create_snapshot_selection(&mut core.dom, root, &mut core.selection);
    let snapshot = Snapshot {
        html: inner_html(&core.dom, root),
        known_colors: core.dark_color_handler.known_colors(),
        entity_states,
        is_dark_mode: core.is_dark_mode,
        selection,
    };
    core.undo
        .snapshots
        .add_snapshot(snapshot.clone(), is_auto_completeable);
    core.undo.snapshots.set_has_new_content(false);
    Some(snapshot)
}

/// Puts the content, colors and selection of `snapshot` back into the editor.
pub fn restore_undo_snapshot(core: &mut EditorCore, snapshot: &Snapshot) {
    core.trigger_event(PluginEvent::BeforeSetContent {
        new_content: snapshot.html.clone(),
    });
    core.undo.is_restoring = true;

    let root = core.content_root;
    let html = core.sanitize(&snapshot.html);
    if let Err(err) = restore_snapshot_html(&mut core.dom, root, &html, &core.entity_map) {
        log::warn!("failed to restore snapshot html: {err}");
    }
    restore_snapshot_colors(core, snapshot);
    core.selection = restore_snapshot_selection(&mut core.dom, root, &snapshot.selection);
    core.sync_entities();
    core.refresh_model();
    core.undo.snapshots.set_has_new_content(false);

    core.trigger_event(PluginEvent::ContentChanged {
        source: ChangeSource::SetContent,
        api_name: None,
        entity_states: snapshot.entity_states.clone(),
    });
    core.undo.is_restoring = false;
}

pub fn can_undo(core: &EditorCore) -> bool {
    core.undo.snapshots.has_new_content() || core.undo.snapshots.can_move(-1)
}

pub fn can_redo(core: &EditorCore) -> bool {
    core.undo.snapshots.can_move(1)
}

/// Steps back one snapshot. Unsaved live changes are captured first so they
/// can be redone.
pub fn undo(core: &mut EditorCore) {
    core.focus();
    if core.undo.snapshots.has_new_content() {
        add_undo_snapshot(core, false, None);
    }
    match core.undo.snapshots.move_by(-1) {
        Some(snapshot) => {
            log::debug!("undo to snapshot {:?}", core.undo.snapshots.current_index());
            restore_undo_snapshot(core, &snapshot);
        }
        None => log::trace!("nothing to undo"),
    }
}

pub fn redo(core: &mut EditorCore) {
    core.focus();
    match core.undo.snapshots.move_by(1) {
        Some(snapshot) => {
            log::debug!("redo to snapshot {:?}", core.undo.snapshots.current_index());
            restore_undo_snapshot(core, &snapshot);
        }
        None => log::trace!("nothing to redo"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DomPosition, DomSelection};
    use crate::editor::EditorOptions;
    use crate::undo::SnapshotSelection;
    use pretty_assertions::assert_eq;

    fn text_node(core: &EditorCore, text: &str) -> crate::dom::NodeId {
        core.dom
            .descendants(core.content_root)
            .into_iter()
            .find(|&n| core.dom.text(n) == Some(text))
            .unwrap()
    }

    #[test]
    fn test_undo_redo_restores_content_and_selection() {
        let mut core = EditorCore::with_content(&EditorOptions::default(), "<p>one</p>").unwrap();
        let one = text_node(&core, "one");
        core.selection = Some(DomSelection::caret(DomPosition::new(one, 2)));
        add_undo_snapshot(&mut core, false, None);

        core.dom.set_inner_html(core.content_root, "<p>two</p>").unwrap();
        core.mark_new_content();
        assert!(can_undo(&core));

        undo(&mut core);
        assert_eq!(core.get_content(), "<p>one</p>");
        let one = text_node(&core, "one");
        assert_eq!(core.selection, Some(DomSelection::caret(DomPosition::new(one, 2))));
        assert!(can_redo(&core));

        redo(&mut core);
        assert_eq!(core.get_content(), "<p>two</p>");
        assert!(!can_redo(&core));
    }

    #[test]
    fn test_no_snapshot_while_restoring() {
        let mut core = EditorCore::new(&EditorOptions::default());
        core.undo.is_restoring = true;
        assert_eq!(add_undo_snapshot(&mut core, false, None), None);
        assert!(core.undo.snapshots.is_empty());
    }

    #[test]
    fn test_undo_at_start_is_noop() {
        let mut core = EditorCore::with_content(&EditorOptions::default(), "<p>x</p>").unwrap();
        undo(&mut core);
        assert_eq!(core.get_content(), "<p>x</p>");
        assert!(core.has_focus());
    }

    #[test]
    fn test_snapshot_taken_in_light_mode_restores_dark() {
        let mut core = EditorCore::with_content(
            &EditorOptions::default(),
            r#"<p style="color: #ffffff;">x</p>"#,
        )
        .unwrap();
        let light = add_undo_snapshot(&mut core, false, None).unwrap();
        assert_eq!(light.selection, SnapshotSelection::default());

        core.set_dark_mode(true);
        restore_undo_snapshot(&mut core, &light);
        assert_eq!(core.get_content(), r#"<p style="color: rgb(0, 0, 0);">x</p>"#);
    }

    #[test]
    fn test_snapshot_taken_in_dark_mode_restores_light() {
        let mut core = EditorCore::with_content(&EditorOptions::default(), "<p>y</p>").unwrap();
        let dark = crate::undo::Snapshot {
            known_colors: vec![crate::color::Colors::new("#ffffff", "rgb(0, 0, 0)")],
            is_dark_mode: true,
            ..crate::undo::Snapshot::from_html(r#"<p style="color: rgb(0, 0, 0);">x</p>"#)
        };

        restore_undo_snapshot(&mut core, &dark);

        assert!(!core.is_dark_mode());
        assert_eq!(core.get_content(), r#"<p style="color: #ffffff;">x</p>"#);
        assert_eq!(core.dark_color_handler().known_colors(), dark.known_colors);
    }

    #[test]
    fn test_undo_redo_cycles_reuse_arena_slots() {
        let mut core = EditorCore::with_content(&EditorOptions::default(), "<p>one</p>").unwrap();
        core.dom.set_inner_html(core.content_root, "<p>two</p>").unwrap();
        add_undo_snapshot(&mut core, false, None);
        undo(&mut core);
        redo(&mut core);
        let len = core.dom.arena_len();

        for _ in 0..1000 {
            undo(&mut core);
            redo(&mut core);
        }

        assert_eq!(core.get_content(), "<p>two</p>");
        assert_eq!(core.dom.arena_len(), len);
        assert_eq!(core.dom.live_node_count(), 3);
    }
}
