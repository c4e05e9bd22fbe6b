use super::Snapshot;
use crate::color::{ColorTransformDirection, transform_color};
use crate::editor::EditorCore;

/// Re-registers the snapshot's color pairs and, when the snapshot was taken
/// in the other color mode, converts the restored content to the current one.
pub fn restore_snapshot_colors(core: &mut EditorCore, snapshot: &Snapshot) {
    let is_dark_mode = core.is_dark_mode;
    for colors in &snapshot.known_colors {
        core.dark_color_handler
            .update_known_color(&mut core.dom, is_dark_mode, colors);
    }

    if snapshot.is_dark_mode != is_dark_mode {
        let direction = if is_dark_mode {
            ColorTransformDirection::LightToDark
        } else {
            ColorTransformDirection::DarkToLight
        };
        log::debug!(target: "color", "snapshot color mode differs, transforming {direction:?}");
        transform_color(
            &mut core.dom,
            core.content_root,
            false,
            direction,
            &mut core.dark_color_handler,
        );
    }
}
