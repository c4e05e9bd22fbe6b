use super::{Dom, NodeId};

/// A boundary point: a node and an offset inside it (chars for text, child
/// index for containers).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DomPosition {
    pub node: NodeId,
    pub offset: usize,
}

impl DomPosition {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// The position right before `node` in its parent
    pub fn before(dom: &Dom, node: NodeId) -> Option<Self> {
        let parent = dom.parent(node)?;
        Some(Self::new(parent, dom.index_in_parent(node)?))
    }

    /// The position right after `node` in its parent
    pub fn after(dom: &Dom, node: NodeId) -> Option<Self> {
        let parent = dom.parent(node)?;
        Some(Self::new(parent, dom.index_in_parent(node)? + 1))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DomRange {
    pub start: DomPosition,
    pub end: DomPosition,
}

impl DomRange {
    pub fn new(start: DomPosition, end: DomPosition) -> Self {
        Self { start, end }
    }

    pub fn collapsed(at: DomPosition) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// The three kinds of selection the editor can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomSelection {
    Range {
        range: DomRange,
        /// Focus sits before the anchor
        is_reverted: bool,
    },
    Image {
        image: NodeId,
    },
    Table {
        table: NodeId,
        first_row: usize,
        last_row: usize,
        first_column: usize,
        last_column: usize,
    },
}

impl DomSelection {
    pub fn range(range: DomRange, is_reverted: bool) -> Self {
        Self::Range { range, is_reverted }
    }

    pub fn caret(at: DomPosition) -> Self {
        Self::Range {
            range: DomRange::collapsed(at),
            is_reverted: false,
        }
    }

    pub fn as_range(&self) -> Option<(DomRange, bool)> {
        match self {
            Self::Range { range, is_reverted } => Some((*range, *is_reverted)),
            _ => None,
        }
    }
}
