/*!
 * # Entities
 *
 * Entities are opaque embedded units (widgets, components) that live inside
 * editable content. In the DOM they are wrapper elements tagged through class
 * names; everywhere else in the crate they are described by the typed
 * [`EntityMarker`]. Class strings are only read and written here.
 *
 * Wire format:
 *
 * - wrapper: `_Entity _EType_<type> _EId_<id> _EReadonly_<0|1>`
 * - block level container around a wrapper and its delimiters: `_E_EBlockEntityContainer`
 * - delimiters: `<span class="entityDelimiterBefore">` / `entityDelimiterAfter`
 *   holding a single zero width space, giving the caret a place to land
 */

pub mod adjust_selection;

use std::collections::{HashMap, HashSet};

use crate::dom::{Dom, DomError, NodeId};

pub const ENTITY_INFO_NAME: &str = "_Entity";
pub const ENTITY_TYPE_PREFIX: &str = "_EType_";
pub const ENTITY_ID_PREFIX: &str = "_EId_";
pub const ENTITY_READONLY_PREFIX: &str = "_EReadonly_";
pub const BLOCK_ENTITY_CONTAINER: &str = "_E_EBlockEntityContainer";
pub const DELIMITER_BEFORE: &str = "entityDelimiterBefore";
pub const DELIMITER_AFTER: &str = "entityDelimiterAfter";
pub const ZERO_WIDTH_SPACE: &str = "\u{200B}";

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EntityMarker {
    pub entity_type: String,
    pub id: Option<String>,
    pub is_readonly: bool,
    pub is_block: bool,
}

impl EntityMarker {
    pub fn new(entity_type: &str, id: &str) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            id: Some(id.to_string()),
            is_readonly: true,
            is_block: false,
        }
    }
}

/// A live entity wrapper known to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownEntity {
    pub element: NodeId,
    pub can_persist: bool,
    /// The wrapper is currently not attached under the content root. It is
    /// kept so that undo can bring the same element back.
    pub is_deleted: bool,
}

impl KnownEntity {
    pub fn new(element: NodeId) -> Self {
        Self {
            element,
            can_persist: true,
            is_deleted: false,
        }
    }
}

/// Entity id to the wrapper last attached for it
pub type EntityMap = HashMap<String, KnownEntity>;

/// Brings `map` in line with the wrappers under `root`: found wrappers are
/// (re)registered, known entities that are gone are flagged as deleted.
/// Returns the ids that became deleted.
pub fn sync_entity_map(dom: &Dom, root: NodeId, map: &mut EntityMap) -> Vec<String> {
    let mut seen = HashSet::new();
    for wrapper in find_all_entity_wrappers(dom, root) {
        let Some(id) = entity_id(dom, wrapper) else {
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }
        map.entry(id)
            .and_modify(|known| {
                known.element = wrapper;
                known.is_deleted = false;
            })
            .or_insert_with(|| KnownEntity::new(wrapper));
    }

    let mut deleted: Vec<String> = map
        .iter_mut()
        .filter(|(id, known)| !known.is_deleted && !seen.contains(*id))
        .map(|(id, known)| {
            known.is_deleted = true;
            id.clone()
        })
        .collect();
    deleted.sort();
    deleted
}

/// Nodes that must outlive any content replacement: every known wrapper and,
/// for block entities, the container around it.
pub fn retained_entity_nodes(dom: &Dom, map: &EntityMap) -> HashSet<NodeId> {
    let mut nodes = HashSet::new();
    for known in map.values() {
        nodes.insert(known.element);
        if let Some(container) = dom
            .parent(known.element)
            .filter(|&p| is_block_entity_container(dom, p))
        {
            nodes.insert(container);
        }
    }
    nodes
}

fn is_entity_class(class: &str) -> bool {
    class == ENTITY_INFO_NAME
        || class.starts_with(ENTITY_TYPE_PREFIX)
        || class.starts_with(ENTITY_ID_PREFIX)
        || class.starts_with(ENTITY_READONLY_PREFIX)
}

pub fn is_entity_wrapper(dom: &Dom, node: NodeId) -> bool {
    dom.is_element(node) && dom.has_class(node, ENTITY_INFO_NAME)
}

/// Reads the marker of an entity wrapper; `None` for anything else.
pub fn parse_entity_marker(dom: &Dom, node: NodeId) -> Option<EntityMarker> {
    if !is_entity_wrapper(dom, node) {
        return None;
    }
    let mut marker = EntityMarker::default();
    for class in dom.classes(node) {
        if let Some(value) = class.strip_prefix(ENTITY_TYPE_PREFIX) {
            marker.entity_type = value.to_string();
        } else if let Some(value) = class.strip_prefix(ENTITY_ID_PREFIX) {
            marker.id = Some(value.to_string());
        } else if let Some(value) = class.strip_prefix(ENTITY_READONLY_PREFIX) {
            marker.is_readonly = value == "1";
        }
    }
    marker.is_block = dom
        .parent(node)
        .is_some_and(|p| is_block_entity_container(dom, p))
        || dom.tag_name(node) == Some("div");
    Some(marker)
}

/// Writes `marker` onto `wrapper`, keeping unrelated classes.
pub fn apply_entity_marker(dom: &mut Dom, wrapper: NodeId, marker: &EntityMarker) {
    let mut classes: Vec<String> = dom
        .classes(wrapper)
        .filter(|c| !is_entity_class(c))
        .map(str::to_string)
        .collect();
    classes.push(ENTITY_INFO_NAME.to_string());
    if !marker.entity_type.is_empty() {
        classes.push(format!("{ENTITY_TYPE_PREFIX}{}", marker.entity_type));
    }
    if let Some(id) = &marker.id {
        classes.push(format!("{ENTITY_ID_PREFIX}{id}"));
    }
    classes.push(format!(
        "{ENTITY_READONLY_PREFIX}{}",
        if marker.is_readonly { 1 } else { 0 }
    ));
    dom.set_attribute(wrapper, "class", &classes.join(" "));
    if marker.is_readonly {
        dom.set_attribute(wrapper, "contenteditable", "false");
    } else {
        dom.remove_attribute(wrapper, "contenteditable");
    }
}

pub fn entity_id(dom: &Dom, node: NodeId) -> Option<String> {
    parse_entity_marker(dom, node)?.id
}

pub fn is_block_entity_container(dom: &Dom, node: NodeId) -> bool {
    dom.is_element(node) && dom.has_class(node, BLOCK_ENTITY_CONTAINER)
}

/// A delimiter span holding exactly one zero width space
pub fn is_entity_delimiter(dom: &Dom, node: NodeId) -> bool {
    dom.is_tag(node, "span")
        && (dom.has_class(node, DELIMITER_BEFORE) || dom.has_class(node, DELIMITER_AFTER))
        && dom.text_content(node) == ZERO_WIDTH_SPACE
}

pub fn is_delimiter_before(dom: &Dom, node: NodeId) -> bool {
    is_entity_delimiter(dom, node) && dom.has_class(node, DELIMITER_BEFORE)
}

pub fn is_delimiter_after(dom: &Dom, node: NodeId) -> bool {
    is_entity_delimiter(dom, node) && dom.has_class(node, DELIMITER_AFTER)
}

/// Every entity wrapper under `root` in document order
pub fn find_all_entity_wrappers(dom: &Dom, root: NodeId) -> Vec<NodeId> {
    dom.descendants(root)
        .into_iter()
        .filter(|&n| is_entity_wrapper(dom, n))
        .collect()
}

fn create_delimiter(dom: &mut Dom, class: &str) -> Result<NodeId, DomError> {
    let span = dom.create_element_with("span", vec![("class".to_string(), class.to_string())]);
    let text = dom.create_text(ZERO_WIDTH_SPACE);
    dom.append_child(span, text)?;
    Ok(span)
}

/// Surrounds an attached wrapper with delimiters unless they are already there.
pub fn add_delimiters(dom: &mut Dom, wrapper: NodeId) -> Result<(NodeId, NodeId), DomError> {
    let parent = dom.parent(wrapper).ok_or(DomError::NotAContainer(wrapper))?;

    let before = match dom.previous_sibling(wrapper) {
        Some(node) if is_delimiter_before(dom, node) => node,
        _ => {
            let node = create_delimiter(dom, DELIMITER_BEFORE)?;
            dom.insert_before(parent, node, Some(wrapper))?;
            node
        }
    };
    let after = match dom.next_sibling(wrapper) {
        Some(node) if is_delimiter_after(dom, node) => node,
        next => {
            let node = create_delimiter(dom, DELIMITER_AFTER)?;
            dom.insert_before(parent, node, next)?;
            node
        }
    };
    Ok((before, after))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::html::{inner_html, parse_fragment};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_entity_marker() {
        let mut dom = Dom::new();
        let fragment = parse_fragment(
            &mut dom,
            r#"<span class="x _Entity _EType_Mention _EId_m1 _EReadonly_1"></span>"#,
        );
        let wrapper = dom.children(fragment)[0];
        assert_eq!(
            parse_entity_marker(&dom, wrapper),
            Some(EntityMarker {
                entity_type: "Mention".to_string(),
                id: Some("m1".to_string()),
                is_readonly: true,
                is_block: false,
            })
        );
    }

    #[test]
    fn test_block_marker_from_container() {
        let mut dom = Dom::new();
        let fragment = parse_fragment(
            &mut dom,
            r#"<div class="_E_EBlockEntityContainer"><span class="_Entity _EId_b"></span></div>"#,
        );
        let container = dom.children(fragment)[0];
        let wrapper = dom.children(container)[0];
        assert!(is_block_entity_container(&dom, container));
        assert!(parse_entity_marker(&dom, wrapper).is_some_and(|m| m.is_block));
    }

    #[test]
    fn test_apply_marker_replaces_entity_classes() {
        let mut dom = Dom::new();
        let wrapper =
            dom.create_element_with("span", vec![("class".to_string(), "keep _EId_old".to_string())]);
        apply_entity_marker(&mut dom, wrapper, &EntityMarker::new("Chart", "c7"));
        assert_eq!(
            dom.attribute(wrapper, "class"),
            Some("keep _Entity _EType_Chart _EId_c7 _EReadonly_1")
        );
        assert_eq!(dom.attribute(wrapper, "contenteditable"), Some("false"));
        assert_eq!(entity_id(&dom, wrapper).as_deref(), Some("c7"));
    }

    #[test]
    fn test_delimiter_requires_zero_width_space() {
        let mut dom = Dom::new();
        let fragment = parse_fragment(
            &mut dom,
            "<span class=\"entityDelimiterBefore\">\u{200B}</span><span class=\"entityDelimiterAfter\">x</span>",
        );
        let children = dom.children(fragment).to_vec();
        assert!(is_delimiter_before(&dom, children[0]));
        assert!(!is_entity_delimiter(&dom, children[1]));
    }

    #[test]
    fn test_add_delimiters_is_idempotent() {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        let wrapper = dom.create_element("span");
        apply_entity_marker(&mut dom, wrapper, &EntityMarker::new("A", "B"));
        dom.append_child(root, wrapper).unwrap();

        let first = add_delimiters(&mut dom, wrapper).unwrap();
        let second = add_delimiters(&mut dom, wrapper).unwrap();
        assert_eq!(first, second);
        assert_eq!(dom.children(root), &[first.0, wrapper, first.1]);
        assert_eq!(find_all_entity_wrappers(&dom, root), vec![wrapper]);
        assert!(inner_html(&dom, root).starts_with("<span class=\"entityDelimiterBefore\">"));
    }

    #[test]
    fn test_sync_entity_map_flags_detached_entities() {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        dom.set_inner_html(
            root,
            r#"<span class="_Entity _EId_a"></span><span class="_Entity _EId_b"></span>"#,
        )
        .unwrap();
        let mut map = EntityMap::new();
        assert_eq!(sync_entity_map(&dom, root, &mut map), Vec::<String>::new());
        assert_eq!(map.len(), 2);

        let b = dom.children(root)[1];
        dom.remove(b);
        assert_eq!(sync_entity_map(&dom, root, &mut map), vec!["b".to_string()]);
        assert!(map["b"].is_deleted);
        assert_eq!(map["b"].element, b);

        dom.append_child(root, b).unwrap();
        sync_entity_map(&dom, root, &mut map);
        assert!(!map["b"].is_deleted);
    }
}
