//! Restoring snapshot HTML into the live content root.
//!
//! Everything is replaced by freshly parsed nodes except entities: wherever
//! the snapshot contains a wrapper (or block entity container) whose id is
//! known, the live element is moved into place instead, so the embedded
//! component keeps its state and identity.

use std::collections::HashSet;

use crate::dom::html::parse_fragment;
use crate::dom::{Dom, DomError, NodeId};
use crate::entity::{
    EntityMap, entity_id, find_all_entity_wrappers, is_block_entity_container, is_entity_wrapper,
    retained_entity_nodes,
};

/// Insertion point inside the content root. Nodes still after the cursor
/// when restoration ends are stale and get removed.
struct InsertionCursor {
    parent: NodeId,
    next: Option<NodeId>,
}

impl InsertionCursor {
    fn new(dom: &Dom, parent: NodeId) -> Self {
        Self {
            parent,
            next: dom.first_child(parent),
        }
    }

    /// Puts `node` at the cursor. A node already sitting at the cursor is
    /// kept where it is and the cursor steps past it.
    fn place(&mut self, dom: &mut Dom, node: NodeId) -> Result<(), DomError> {
        if self.next == Some(node) {
            self.next = dom.next_sibling(node);
            Ok(())
        } else {
            dom.insert_before(self.parent, node, self.next)
        }
    }

    /// Must run before `node` is moved anywhere other than the cursor, so the
    /// cursor never follows a node out of the root.
    fn release(&mut self, dom: &Dom, node: NodeId) {
        if self.next == Some(node) {
            self.next = dom.next_sibling(node);
        }
    }

    /// Removes and releases every remaining stale node. Retained nodes
    /// inside them are only detached.
    fn finish(self, dom: &mut Dom, retained: &HashSet<NodeId>) -> usize {
        let mut released = 0;
        let mut next = self.next;
        while let Some(node) = next {
            next = dom.next_sibling(node);
            released += dom.release(node, |n| retained.contains(&n));
        }
        released
    }
}

struct Reconciler<'a> {
    entity_map: &'a EntityMap,
    used_ids: HashSet<String>,
    /// Parsed copies replaced by live elements
    discarded: Vec<NodeId>,
}

impl Reconciler<'_> {
    /// The live element to use in place of parsed `node`, claiming its id.
    /// Each id is claimed at most once per restoration.
    fn claim_live_element(&mut self, dom: &Dom, node: NodeId) -> Option<NodeId> {
        if is_entity_wrapper(dom, node) {
            let id = entity_id(dom, node)?;
            if self.used_ids.contains(&id) {
                return None;
            }
            let live = self.entity_map.get(&id)?.element;
            self.used_ids.insert(id);
            Some(live)
        } else if is_block_entity_container(dom, node) {
            let wrapper = find_all_entity_wrappers(dom, node).into_iter().next()?;
            let id = entity_id(dom, wrapper)?;
            if self.used_ids.contains(&id) {
                return None;
            }
            let live_container = dom
                .parent(self.entity_map.get(&id)?.element)
                .filter(|&p| is_block_entity_container(dom, p))?;
            self.used_ids.insert(id);
            Some(live_container)
        } else {
            None
        }
    }

    /// Swaps known entities nested inside the freshly inserted `node`.
    fn swap_nested(
        &mut self,
        dom: &mut Dom,
        node: NodeId,
        cursor: &mut InsertionCursor,
    ) -> Result<(), DomError> {
        let mut worklist = vec![node];
        while let Some(parent) = worklist.pop() {
            let children = dom.children(parent).to_vec();
            let mut descend = Vec::new();
            for child in children {
                match self.claim_live_element(dom, child) {
                    Some(live) => {
                        log::trace!(target: "entity", "reusing nested entity element {live:?}");
                        cursor.release(dom, live);
                        dom.replace_child(parent, live, child)?;
                        self.discarded.push(child);
                    }
                    None if dom.is_element(child) => descend.push(child),
                    None => {}
                }
            }
            worklist.extend(descend.into_iter().rev());
        }
        Ok(())
    }
}

/// Replaces the content of `root` with `html`, reusing the live elements of
/// known entities. Parsed copies of those entities are discarded.
pub fn restore_snapshot_html(
    dom: &mut Dom,
    root: NodeId,
    html: &str,
    entity_map: &EntityMap,
) -> Result<(), DomError> {
    let retained = retained_entity_nodes(dom, entity_map);
    let fragment = parse_fragment(dom, html);
    let mut cursor = InsertionCursor::new(dom, root);
    let mut reconciler = Reconciler {
        entity_map,
        used_ids: HashSet::new(),
        discarded: Vec::new(),
    };

    let top_level = dom.children(fragment).to_vec();
    for node in top_level {
        match reconciler.claim_live_element(dom, node) {
            Some(live) => {
                log::trace!(target: "entity", "reusing entity element {live:?}");
                cursor.place(dom, live)?;
            }
            None => {
                cursor.place(dom, node)?;
                if dom.is_element(node) {
                    reconciler.swap_nested(dom, node, &mut cursor)?;
                }
            }
        }
    }

    let mut released = cursor.finish(dom, &retained);
    for node in std::mem::take(&mut reconciler.discarded) {
        released += dom.release(node, |n| retained.contains(&n));
    }
    // Whatever is left in the fragment are parsed copies of top level entities
    released += dom.release(fragment, |n| retained.contains(&n));
    log::debug!(
        "restored snapshot html, {} entities reused, {released} nodes released",
        reconciler.used_ids.len()
    );
    Ok(())
}
