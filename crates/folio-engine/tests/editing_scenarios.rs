use std::cell::RefCell;
use std::rc::Rc;

use folio_engine::model::{
    Block, FormatContainer, ListItem, ListLevel, ListType, Segment, SegmentFormat,
};
use folio_engine::undo::path::{get_path, get_position_from_path};
use folio_engine::undo::selection::{create_snapshot_selection, restore_snapshot_selection};
use folio_engine::undo::table::normalize_all_tables;
use folio_engine::*;
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Recorder {
    events: Rc<RefCell<Vec<PluginEvent>>>,
}

impl EditorPlugin for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn on_plugin_event(&mut self, event: &PluginEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

fn dom_with(html: &str) -> (Dom, NodeId) {
    let mut dom = Dom::new();
    let root = dom.create_element("div");
    dom.set_inner_html(root, html).unwrap();
    (dom, root)
}

#[test]
fn path_survives_text_node_merging() {
    init_logging();
    let (mut split_dom, split_root) = dom_with("<p>ab</p>");
    let paragraph = split_dom.children(split_root)[0];
    let tail = split_dom.create_text("cd");
    split_dom.append_child(paragraph, tail).unwrap();
    let path = get_path(&split_dom, Some(tail), 1, split_root);

    let (merged_dom, merged_root) = dom_with("<p>abcd</p>");
    let merged_text = merged_dom.children(merged_dom.children(merged_root)[0])[0];
    assert_eq!(
        get_position_from_path(&merged_dom, merged_root, &path),
        DomPosition::new(merged_text, 3)
    );
}

#[test]
fn table_normalization_is_idempotent() {
    init_logging();
    let (mut dom, root) = dom_with(
        "<table><colgroup><col></colgroup><thead><tr><th>h</th></tr></thead><tr><td>a</td></tr><tbody><tr><td>b</td></tr></tbody></table>",
    );
    assert!(normalize_all_tables(&mut dom, root).unwrap());
    let once = dom::html::inner_html(&dom, root);
    assert!(!normalize_all_tables(&mut dom, root).unwrap());
    assert_eq!(dom::html::inner_html(&dom, root), once);
}

#[test]
fn undo_history_is_bounded_and_truncated_by_new_changes() {
    init_logging();
    let options = EditorOptions {
        undo_max_snapshots: 3,
        ..EditorOptions::default()
    };
    let mut editor = EditorCore::with_content(&options, "<p>0</p>").unwrap();
    let root = editor.content_root();
    for i in 1..=4 {
        editor
            .dom_mut()
            .set_inner_html(root, &format!("<p>{i}</p>"))
            .unwrap();
        add_undo_snapshot(&mut editor, false, None);
    }
    assert_eq!(editor.undo_state().snapshots().len(), 3);
    assert_eq!(editor.undo_state().snapshots().current_index(), Some(2));

    undo(&mut editor);
    undo(&mut editor);
    assert_eq!(editor.get_content(), "<p>2</p>");
    assert!(!can_undo(&editor));
    assert!(can_redo(&editor));

    editor.dom_mut().set_inner_html(root, "<p>x</p>").unwrap();
    add_undo_snapshot(&mut editor, false, None);
    assert!(!can_redo(&editor));
    assert_eq!(editor.undo_state().snapshots().len(), 2);
}

#[test]
fn undo_and_redo_keep_entity_elements() {
    init_logging();
    let mut editor = EditorCore::with_content(
        &EditorOptions::default(),
        concat!(
            "<p><span class=\"_Entity _EType_A _EId_e1\">1</span>",
            "<span class=\"_Entity _EType_A _EId_e2\">2</span></p>"
        ),
    )
    .unwrap();
    let root = editor.content_root();
    let paragraph = editor.dom().children(root)[0];
    let [first, second] = editor.dom().children(paragraph).to_vec()[..] else {
        panic!("two entity wrappers expected");
    };

    editor
        .dom_mut()
        .insert_before(paragraph, second, Some(first))
        .unwrap();
    editor.mark_new_content();

    undo(&mut editor);
    let paragraph = editor.dom().children(root)[0];
    assert_eq!(editor.dom().children(paragraph), &[first, second]);

    redo(&mut editor);
    let paragraph = editor.dom().children(root)[0];
    assert_eq!(editor.dom().children(paragraph), &[second, first]);
    assert!(!editor.entity_map()["e1"].is_deleted);
}

#[test]
fn dark_mode_round_trip_keeps_known_colors_stable() {
    init_logging();
    let html = r#"<p style="color: #336699; background-color: #ffffff;">x</p>"#;
    let mut editor = EditorCore::with_content(&EditorOptions::default(), html).unwrap();

    editor.set_dark_mode(true);
    assert_ne!(editor.get_content(), html);
    let known = editor.dark_color_handler().known_colors().len();

    editor.set_dark_mode(false);
    editor.set_dark_mode(true);
    editor.set_dark_mode(false);
    assert_eq!(editor.get_content(), html);
    assert_eq!(editor.dark_color_handler().known_colors().len(), known);
}

#[test]
fn missing_selection_encodes_as_empty_range() {
    init_logging();
    let (mut dom, root) = dom_with("<p>a</p>");
    let mut selection = None;
    let encoded = create_snapshot_selection(&mut dom, root, &mut selection);
    assert_eq!(
        encoded,
        SnapshotSelection::Range {
            start: vec![],
            end: vec![],
            is_reverted: false,
        }
    );
    assert_eq!(
        restore_snapshot_selection(&mut dom, root, &encoded),
        Some(DomSelection::caret(DomPosition::new(root, 0)))
    );
}

#[test]
fn clear_format_through_editor_reports_change() {
    init_logging();
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut editor = EditorCore::with_content(&EditorOptions::default(), "<p>x</p>").unwrap();
    editor.add_plugin(Box::new(Recorder {
        events: events.clone(),
    }));
    let bold = SegmentFormat {
        font_weight: Some("bold".to_string()),
        ..SegmentFormat::default()
    };
    editor.set_model(ContentModelDocument::new(vec![Block::FormatContainer(
        FormatContainer::new(
            "blockquote",
            vec![Block::ListItem(ListItem::new(
                vec![ListLevel::new(ListType::Ordered)],
                vec![Block::paragraph(vec![
                    Segment::text("test1").with_format(bold).selected(),
                ])],
            ))],
        ),
    )]));

    clear_format(&mut editor);

    assert!(editor.has_focus());
    assert_eq!(
        editor.model().blocks,
        vec![Block::paragraph(vec![Segment::text("test1").selected()])]
    );
    assert_eq!(
        *events.borrow(),
        vec![PluginEvent::ContentChanged {
            source: folio_engine::editor::ChangeSource::Format,
            api_name: Some("clearFormat".to_string()),
            entity_states: None,
        }]
    );

    events.borrow_mut().clear();
    clear_format(&mut editor);
    assert!(events.borrow().is_empty());
}

#[test]
fn arrow_right_jumps_over_inline_entity() {
    init_logging();
    let mut editor = EditorCore::with_content(
        &EditorOptions::default(),
        concat!(
            "<p>a<span class=\"entityDelimiterBefore\">\u{200B}</span>",
            "<span class=\"_Entity _EType_T _EId_e1 _EReadonly_1\" contenteditable=\"false\">e</span>",
            "<span class=\"entityDelimiterAfter\">\u{200B}</span>b</p>"
        ),
    )
    .unwrap();
    let paragraph = editor.dom().children(editor.content_root())[0];
    let children = editor.dom().children(paragraph).to_vec();
    let wrapper = children[2];
    let marker = entity::parse_entity_marker(editor.dom(), wrapper).unwrap();
    editor.set_model(ContentModelDocument::new(vec![Block::paragraph(vec![
        Segment::text("a"),
        Segment::selection_marker(),
        Segment::entity(model::Entity { wrapper, marker }),
        Segment::text("b"),
    ])]));
    editor.set_dom_selection(Some(DomSelection::caret(DomPosition::new(children[1], 1))));

    adjust_selection_around_entity(&mut editor, ArrowKey::Right, false);

    assert_eq!(
        editor.get_dom_selection(),
        Some(DomSelection::Range {
            range: DomRange::collapsed(DomPosition::new(paragraph, 4)),
            is_reverted: false,
        })
    );
}
