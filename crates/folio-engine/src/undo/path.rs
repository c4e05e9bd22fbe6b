//! Encoding of DOM positions as integer paths from the content root.
//!
//! Paths count children the way they would exist after the content is
//! serialized and parsed again: a run of adjacent text nodes is one child and
//! empty text nodes are not counted at all. A text position's last step is a
//! char offset measured from the start of its text run.

use crate::dom::{Dom, DomPosition, NodeId};

/// One child as seen after normalization
struct Slot {
    /// First node of the slot; for text runs the first non-empty text node
    first: NodeId,
    /// Raw index of `first` among the parent's children
    raw_index: usize,
}

fn is_empty_text(dom: &Dom, node: NodeId) -> bool {
    dom.text(node).is_some_and(str::is_empty)
}

fn normalized_children(dom: &Dom, parent: NodeId) -> Vec<Slot> {
    let mut slots = Vec::new();
    let mut in_text_run = false;
    for (raw_index, &child) in dom.children(parent).iter().enumerate() {
        if dom.is_text(child) {
            if is_empty_text(dom, child) || in_text_run {
                continue;
            }
            in_text_run = true;
        } else {
            in_text_run = false;
        }
        slots.push(Slot {
            first: child,
            raw_index,
        });
    }
    slots
}

/// Number of normalized slots among the children of `parent` before `stop`
/// (all of them when `stop` is `None`).
fn normalized_index(dom: &Dom, parent: NodeId, stop: Option<NodeId>) -> usize {
    let mut count = 0;
    let mut in_text_run = false;
    for &child in dom.children(parent) {
        if Some(child) == stop {
            break;
        }
        if dom.is_text(child) {
            if is_empty_text(dom, child) || in_text_run {
                continue;
            }
            in_text_run = true;
        } else {
            in_text_run = false;
        }
        count += 1;
    }
    count
}

/// Encodes `(node, offset)` relative to `root`. Positions outside `root`
/// encode as the empty path.
pub fn get_path(dom: &Dom, node: Option<NodeId>, offset: usize, root: NodeId) -> Vec<usize> {
    let mut result = Vec::new();
    let Some(mut node) = node.filter(|&n| dom.contains(root, n)) else {
        return result;
    };

    let (mut parent, mut current) = if dom.is_text(node) {
        let mut offset = offset;
        while let Some(previous) = dom.previous_sibling(node).filter(|&p| dom.is_text(p)) {
            offset += dom.node_len(previous);
            node = previous;
        }
        result.push(offset);
        (dom.parent(node), Some(node))
    } else {
        (Some(node), dom.child(node, offset))
    };

    while let Some(p) = parent {
        result.push(normalized_index(dom, p, current));
        if p == root {
            break;
        }
        current = Some(p);
        parent = dom.parent(p);
    }

    result.reverse();
    result
}

/// Resolves a char offset inside the text run starting at `first`.
fn resolve_text_offset(dom: &Dom, first: NodeId, offset: usize) -> DomPosition {
    let mut current = first;
    let mut remaining = offset;
    loop {
        let len = dom.node_len(current);
        if remaining <= len {
            return DomPosition::new(current, remaining);
        }
        match dom.next_sibling(current).filter(|&n| dom.is_text(n)) {
            Some(next) => {
                remaining -= len;
                current = next;
            }
            None => return DomPosition::new(current, len),
        }
    }
}

/// Decodes a path produced by [`get_path`]. A path that no longer fits the
/// tree stops at the deepest node it can reach, with the offset clamped to
/// that node.
pub fn get_position_from_path(dom: &Dom, root: NodeId, path: &[usize]) -> DomPosition {
    let Some((&last, steps)) = path.split_last() else {
        return DomPosition::new(root, 0);
    };

    let mut node = root;
    for &index in steps {
        if dom.is_text(node) {
            return DomPosition::new(node, index.min(dom.node_len(node)));
        }
        match normalized_children(dom, node).get(index) {
            Some(slot) => node = slot.first,
            None => return DomPosition::new(node, dom.node_len(node)),
        }
    }

    if dom.is_text(node) {
        resolve_text_offset(dom, node, last)
    } else {
        let offset = normalized_children(dom, node)
            .get(last)
            .map(|slot| slot.raw_index)
            .unwrap_or_else(|| dom.node_len(node));
        DomPosition::new(node, offset)
    }
}
