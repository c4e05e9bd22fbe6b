use crate::color::{ColorTransformDirection, DarkColorHandler, transform_color};
use crate::dom::html::inner_html;
use crate::dom::{Dom, DomError, DomSelection, NodeId, Selector};
use crate::entity::{EntityMap, retained_entity_nodes, sync_entity_map};
use crate::model::{ContentModelDocument, SegmentFormat};
use crate::undo::{SnapshotsManager, UndoState, add_undo_snapshot};

use super::{
    ChangeSource, ContentModelBridge, ContentModelFormatter, Editor, EditorOptions, EditorPlugin,
    EntityOperation, FormatContentModelOptions, FormatContext, PluginEvent,
};

/// Sanitizes HTML before it is put into the content root
pub type TrustedHtmlHandler = Box<dyn Fn(&str) -> String>;

/// The editor implementation: an owned DOM with a `contenteditable` root.
pub struct EditorCore {
    pub(crate) dom: Dom,
    pub(crate) content_root: NodeId,
    pub(crate) selection: Option<DomSelection>,
    /// Last known content model; rebuilt from the DOM when a bridge is installed
    pub(crate) model: ContentModelDocument,
    pub(crate) undo: UndoState,
    pub(crate) entity_map: EntityMap,
    pub(crate) dark_color_handler: DarkColorHandler,
    pub(crate) is_dark_mode: bool,
    pub(crate) trusted_html_handler: Option<TrustedHtmlHandler>,
    bridge: Option<Box<dyn ContentModelBridge>>,
    plugins: Vec<Box<dyn EditorPlugin>>,
    default_segment_format: SegmentFormat,
    has_focus: bool,
    is_disposed: bool,
}

impl EditorCore {
    pub fn new(options: &EditorOptions) -> Self {
        let mut dom = Dom::new();
        let content_root = dom.create_element_with(
            "div",
            vec![("contenteditable".to_string(), "true".to_string())],
        );
        Self {
            dom,
            content_root,
            selection: None,
            model: ContentModelDocument {
                format: options.default_segment_format.clone(),
                ..ContentModelDocument::default()
            },
            undo: UndoState::new(SnapshotsManager::new(
                options.undo_max_snapshots,
                options.undo_max_total_html_len,
            )),
            entity_map: EntityMap::new(),
            dark_color_handler: DarkColorHandler::new(content_root),
            is_dark_mode: options.is_dark_mode,
            trusted_html_handler: None,
            bridge: None,
            plugins: Vec::new(),
            default_segment_format: options.default_segment_format.clone(),
            has_focus: false,
            is_disposed: false,
        }
    }

    /// Creates an editor showing `html` (authored in light mode colors).
    pub fn with_content(options: &EditorOptions, html: &str) -> Result<Self, DomError> {
        let mut editor = Self::new(options);
        editor.set_content(html)?;
        Ok(editor)
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn model(&self) -> &ContentModelDocument {
        &self.model
    }

    /// Replaces the cached model, for hosts that maintain it themselves
    pub fn set_model(&mut self, mut model: ContentModelDocument) {
        if model.format.is_empty() {
            model.format = self.default_segment_format.clone();
        }
        self.model = model;
    }

    pub fn set_bridge(&mut self, bridge: Box<dyn ContentModelBridge>) {
        self.bridge = Some(bridge);
    }

    pub fn set_trusted_html_handler(&mut self, handler: TrustedHtmlHandler) {
        self.trusted_html_handler = Some(handler);
    }

    pub fn add_plugin(&mut self, plugin: Box<dyn EditorPlugin>) {
        log::debug!(target: "editor", "adding plugin {}", plugin.name());
        self.plugins.push(plugin);
    }

    pub fn entity_map(&self) -> &EntityMap {
        &self.entity_map
    }

    pub fn dark_color_handler(&self) -> &DarkColorHandler {
        &self.dark_color_handler
    }

    pub fn is_dark_mode(&self) -> bool {
        self.is_dark_mode
    }

    pub fn undo_state(&self) -> &UndoState {
        &self.undo
    }

    /// Marks the live content as changed outside of `format_content_model`,
    /// e.g. by typing that the host applied to the DOM directly.
    pub fn mark_new_content(&mut self) {
        self.undo.snapshots.set_has_new_content(true);
    }

    /// Serialized content of the root
    pub fn get_content(&self) -> String {
        inner_html(&self.dom, self.content_root)
    }

    pub(crate) fn sanitize(&self, html: &str) -> String {
        match &self.trusted_html_handler {
            Some(handler) => handler(html),
            None => html.to_string(),
        }
    }

    /// Replaces the whole content. The previous content stays reachable
    /// through undo.
    pub fn set_content(&mut self, html: &str) -> Result<(), DomError> {
        self.trigger_event(PluginEvent::BeforeSetContent {
            new_content: html.to_string(),
        });
        if self.undo.snapshots.has_new_content() {
            add_undo_snapshot(self, false, None);
        }

        let html = self.sanitize(html);
        let retained = retained_entity_nodes(&self.dom, &self.entity_map);
        self.dom
            .set_inner_html_retaining(self.content_root, &html, |n| retained.contains(&n))?;
        if self.is_dark_mode {
            self.transform_content_colors(ColorTransformDirection::LightToDark);
        }
        self.selection = None;
        self.sync_entities();
        self.refresh_model();

        add_undo_snapshot(self, false, None);
        self.trigger_event(PluginEvent::ContentChanged {
            source: ChangeSource::SetContent,
            api_name: None,
            entity_states: None,
        });
        Ok(())
    }

    /// Switches every inline color of the content between its light and dark
    /// form.
    pub fn set_dark_mode(&mut self, is_dark_mode: bool) {
        if is_dark_mode == self.is_dark_mode {
            return;
        }
        let (direction, source) = if is_dark_mode {
            (ColorTransformDirection::LightToDark, ChangeSource::SwitchToDarkMode)
        } else {
            (ColorTransformDirection::DarkToLight, ChangeSource::SwitchToLightMode)
        };
        self.transform_content_colors(direction);
        self.is_dark_mode = is_dark_mode;
        log::info!(target: "color", "dark mode {}", if is_dark_mode { "on" } else { "off" });
        self.trigger_event(PluginEvent::ContentChanged {
            source,
            api_name: None,
            entity_states: None,
        });
    }

    fn transform_content_colors(&mut self, direction: ColorTransformDirection) {
        transform_color(
            &mut self.dom,
            self.content_root,
            false,
            direction,
            &mut self.dark_color_handler,
        );
        if direction == ColorTransformDirection::LightToDark {
            for colors in self.dark_color_handler.known_colors() {
                self.dark_color_handler
                    .update_known_color(&mut self.dom, true, &colors);
            }
        }
    }

    /// Re-registers the entity wrappers under the root. Entities that
    /// disappeared are reported and kept in the map as deleted.
    pub(crate) fn sync_entities(&mut self) -> Vec<String> {
        let removed = sync_entity_map(&self.dom, self.content_root, &mut self.entity_map);
        for id in &removed {
            self.trigger_event(PluginEvent::EntityOperation {
                operation: EntityOperation::Removed,
                entity_id: id.clone(),
                marker: None,
            });
        }
        removed
    }

    pub(crate) fn refresh_model(&mut self) {
        if let Some(bridge) = &mut self.bridge {
            let model =
                bridge.create_content_model(&self.dom, self.content_root, self.selection.as_ref());
            self.set_model(model);
        }
    }

    pub fn blur(&mut self) {
        self.has_focus = false;
    }

    /// Drops plugins and stops reacting to operations
    pub fn dispose(&mut self) {
        self.plugins.clear();
        self.bridge = None;
        self.is_disposed = true;
    }
}

impl Editor for EditorCore {
    fn dom(&self) -> &Dom {
        &self.dom
    }

    fn content_root(&self) -> NodeId {
        self.content_root
    }

    fn get_dom_selection(&self) -> Option<DomSelection> {
        self.selection
    }

    fn set_dom_selection(&mut self, selection: Option<DomSelection>) {
        self.selection = selection;
    }

    fn format_content_model(
        &mut self,
        formatter: &mut ContentModelFormatter<'_>,
        options: FormatContentModelOptions,
    ) {
        if self.is_disposed {
            return;
        }
        self.refresh_model();

        let mut context = FormatContext::default();
        let mut model = std::mem::take(&mut self.model);
        if !formatter(&mut model, &mut context) {
            self.model = model;
            return;
        }

        let take_snapshots = !context.skip_undo_snapshot;
        if take_snapshots
            && (self.undo.snapshots.has_new_content() || self.undo.snapshots.is_empty())
        {
            add_undo_snapshot(self, false, None);
        }

        if let Some(bridge) = &mut self.bridge {
            self.selection = bridge.set_content_model(&mut self.dom, self.content_root, &model);
        }
        self.model = model;

        for deleted in &context.deleted_entities {
            if let Some(id) = &deleted.entity.marker.id {
                self.trigger_event(PluginEvent::EntityOperation {
                    operation: deleted.operation,
                    entity_id: id.clone(),
                    marker: Some(deleted.entity.marker.clone()),
                });
            }
        }
        self.sync_entities();

        if take_snapshots {
            add_undo_snapshot(self, context.is_auto_completeable, context.entity_states.clone());
        } else {
            self.undo.snapshots.set_has_new_content(true);
        }

        log::debug!(
            target: "editor",
            "content changed by {}",
            options.api_name.as_deref().unwrap_or("format")
        );
        self.trigger_event(PluginEvent::ContentChanged {
            source: options.change_source.unwrap_or(ChangeSource::Format),
            api_name: options.api_name,
            entity_states: context.entity_states,
        });
    }

    fn trigger_event(&mut self, event: PluginEvent) {
        if self.is_disposed {
            return;
        }
        log::trace!(target: "editor", "event {event:?}");
        for plugin in &mut self.plugins {
            plugin.on_plugin_event(&event);
        }
    }

    fn find_closest_element_ancestor(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        self.dom.closest(node, self.content_root, selector)
    }

    fn focus(&mut self) {
        self.has_focus = true;
    }

    fn has_focus(&self) -> bool {
        self.has_focus
    }

    fn is_disposed(&self) -> bool {
        self.is_disposed
    }
}
