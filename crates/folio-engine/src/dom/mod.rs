/*!
 * # DOM arena
 *
 * A small owned DOM used as the live content tree of the editor. Nodes live in
 * an arena and are addressed by [`NodeId`]; a node keeps its identity until it
 * is explicitly released, even while detached. Two handles refer to the same
 * node exactly when the ids are equal, which is what entity reconciliation
 * relies on when it moves live wrappers around.
 *
 * [`Dom::release`] hands the slots of a detached subtree back to the arena for
 * reuse. Ids of released nodes must not be used afterwards.
 *
 * Text offsets everywhere in this crate are counted in `char`s.
 */

pub mod html;
pub mod range;
pub mod selector;
pub mod style;

pub use range::{DomPosition, DomRange, DomSelection};
pub use selector::Selector;

/// Stable handle of a node inside a [`Dom`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercase tag name
    pub tag: String,
    /// Attributes in source order; names are lowercase
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Fragment,
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    released: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DomError {
    #[error("cannot insert {node:?} into {parent:?}: it would become its own ancestor")]
    HierarchyRequest { parent: NodeId, node: NodeId },
    #[error("{reference:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, reference: NodeId },
    #[error("{0:?} cannot have children")]
    NotAContainer(NodeId),
}

#[derive(Debug, Clone, Default)]
pub struct Dom {
    nodes: Vec<NodeData>,
    free: Vec<NodeId>,
}

impl Dom {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let data = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            released: false,
        };
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = data;
                id
            }
            None => {
                let id = NodeId(self.nodes.len());
                self.nodes.push(data);
                id
            }
        }
    }

    /// Number of slots in the arena, live or free
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes that have not been released
    pub fn live_node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    // ============ Node creation ============

    pub fn create_fragment(&mut self) -> NodeId {
        self.push(NodeKind::Fragment)
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_element_with(tag, Vec::new())
    }

    pub fn create_element_with(&mut self, tag: &str, attributes: Vec<(String, String)>) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attributes,
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Comment(text.to_string()))
    }

    // ============ Node inspection ============

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node.0].kind
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(self.kind(node), NodeKind::Element(_))
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.kind(node), NodeKind::Text(_))
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match self.kind(node) {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag.as_str())
    }

    pub fn is_tag(&self, node: NodeId, tag: &str) -> bool {
        self.tag_name(node) == Some(tag)
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.kind(node) {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Replaces the data of a text or comment node. Other nodes are left alone.
    pub fn set_text(&mut self, node: NodeId, value: &str) {
        match &mut self.nodes[node.0].kind {
            NodeKind::Text(text) | NodeKind::Comment(text) => *text = value.to_string(),
            _ => {}
        }
    }

    /// Length of a node in DOM offset units: chars for character data,
    /// number of children for containers.
    pub fn node_len(&self, node: NodeId) -> usize {
        match self.kind(node) {
            NodeKind::Text(text) | NodeKind::Comment(text) => text.chars().count(),
            _ => self.nodes[node.0].children.len(),
        }
    }

    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match self.kind(node) {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Comment(_) => {}
            _ => {
                for &child in self.children(node) {
                    self.collect_text(child, out);
                }
            }
        }
    }

    // ============ Attributes ============

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            match element.attributes.iter_mut().find(|(n, _)| n == name) {
                Some(entry) => entry.1 = value.to_string(),
                None => element
                    .attributes
                    .push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(element) = self.element_mut(node) {
            element.attributes.retain(|(n, _)| n != name);
        }
    }

    pub fn id_attribute(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, "id").filter(|id| !id.is_empty())
    }

    pub fn classes(&self, node: NodeId) -> impl Iterator<Item = &str> {
        self.attribute(node, "class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.classes(node).any(|c| c == class)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let mut classes: Vec<String> = self.classes(node).map(str::to_string).collect();
        classes.push(class.to_string());
        self.set_attribute(node, "class", &classes.join(" "));
    }

    // ============ Tree navigation ============

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.children(node).get(index).copied()
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).first().copied()
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).last().copied()
    }

    pub fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&c| c == node)
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.index_in_parent(node)?;
        self.child(parent, index + 1)
    }

    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.index_in_parent(node)?;
        index.checked_sub(1).and_then(|i| self.child(parent, i))
    }

    pub fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let mut current = self.next_sibling(node);
        while let Some(candidate) = current {
            if self.is_element(candidate) {
                return Some(candidate);
            }
            current = self.next_sibling(candidate);
        }
        None
    }

    pub fn previous_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let mut current = self.previous_sibling(node);
        while let Some(candidate) = current {
            if self.is_element(candidate) {
                return Some(candidate);
            }
            current = self.previous_sibling(candidate);
        }
        None
    }

    /// Inclusive: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// All descendants of `root` in document order, `root` excluded.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    pub fn get_element_by_id(&self, root: NodeId, id: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&n| self.attribute(n, "id") == Some(id))
    }

    pub fn query_selector_all(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&n| selector.matches(self, n))
            .collect()
    }

    /// Closest element matching `selector`, starting at `node` (or its parent
    /// for non-elements) and stopping before `root`.
    pub fn closest(&self, node: NodeId, root: NodeId, selector: &Selector) -> Option<NodeId> {
        if !self.contains(root, node) {
            return None;
        }
        let mut current = if self.is_element(node) {
            Some(node)
        } else {
            self.parent(node)
        };
        while let Some(n) = current {
            if n == root {
                return None;
            }
            if selector.matches(self, n) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    // ============ Tree edits ============

    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, node, None)
    }

    /// Inserts `node` into `parent` before `reference` (or at the end). A
    /// fragment inserts its children instead of itself, like the DOM does.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        if matches!(self.kind(parent), NodeKind::Text(_) | NodeKind::Comment(_)) {
            return Err(DomError::NotAContainer(parent));
        }
        if let Some(reference) = reference
            && self.parent(reference) != Some(parent)
        {
            return Err(DomError::NotAChild { parent, reference });
        }
        if reference == Some(node) {
            return Ok(());
        }

        if matches!(self.kind(node), NodeKind::Fragment) {
            let children = self.children(node).to_vec();
            for child in children {
                self.insert_before(parent, child, reference)?;
            }
            return Ok(());
        }

        if self.contains(node, parent) {
            return Err(DomError::HierarchyRequest { parent, node });
        }

        self.remove(node);
        let index = match reference {
            Some(reference) => self
                .children(parent)
                .iter()
                .position(|&c| c == reference)
                .ok_or(DomError::NotAChild { parent, reference })?,
            None => self.children(parent).len(),
        };
        self.nodes[parent.0].children.insert(index, node);
        self.nodes[node.0].parent = Some(parent);
        Ok(())
    }

    /// Detaches `node` from its parent. The node stays valid and can be reinserted.
    pub fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    pub fn remove_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<(), DomError> {
        if self.parent(old_child) != Some(parent) {
            return Err(DomError::NotAChild {
                parent,
                reference: old_child,
            });
        }
        if new_child == old_child {
            return Ok(());
        }
        self.insert_before(parent, new_child, Some(old_child))?;
        self.remove(old_child);
        Ok(())
    }

    /// Detaches `node` and frees its whole subtree, except nodes for which
    /// `keep` returns true: those (with their own subtrees) are only detached.
    /// Returns how many nodes were freed.
    pub fn release(&mut self, node: NodeId, keep: impl Fn(NodeId) -> bool) -> usize {
        self.remove(node);
        let mut freed = 0;
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if keep(current) {
                self.nodes[current.0].parent = None;
                continue;
            }
            let data = &mut self.nodes[current.0];
            if data.released {
                continue;
            }
            stack.extend(std::mem::take(&mut data.children));
            data.kind = NodeKind::Fragment;
            data.parent = None;
            data.released = true;
            self.free.push(current);
            freed += 1;
        }
        freed
    }

    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> NodeId {
        let kind = self.kind(node).clone();
        let copy = self.push(kind);
        if deep {
            let children = self.children(node).to_vec();
            for child in children {
                let child_copy = self.clone_node(child, true);
                self.nodes[copy.0].children.push(child_copy);
                self.nodes[child_copy.0].parent = Some(copy);
            }
        }
        copy
    }
}
