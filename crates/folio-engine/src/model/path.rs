//! Positional addressing into the content model.
//!
//! A [`ModelPath`] is a list of steps from the document root. `Block(i)`
//! selects block `i` of the current group; when that block is a table the
//! next step must be `Cell { row, col }`, which enters the cell's blocks.
//! A path names a block group when it is empty (the document), ends with a
//! `Cell` step, or ends on a list item / format container; otherwise it names
//! a plain block.

use super::{Block, ContentModelDocument, ListItem, Paragraph, Segment, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathStep {
    Block(usize),
    Cell { row: usize, col: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelPath(pub Vec<PathStep>);

impl ModelPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn block(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Block(index));
        Self(steps)
    }

    pub fn cell(&self, row: usize, col: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Cell { row, col });
        Self(steps)
    }

    /// Splits a block path into its group path and index in that group
    pub fn split_last_block(&self) -> Option<(ModelPath, usize)> {
        match self.0.split_last()? {
            (PathStep::Block(index), rest) => Some((ModelPath(rest.to_vec()), *index)),
            _ => None,
        }
    }

    pub fn starts_with(&self, prefix: &ModelPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Keeps the path pointing at the same block after the block at
    /// `removed` was taken out of its group.
    pub fn adjust_for_removal(&mut self, removed: &ModelPath) {
        let Some((group, removed_index)) = removed.split_last_block() else {
            return;
        };
        let depth = group.0.len();
        if !self.starts_with(&group) {
            return;
        }
        if let Some(PathStep::Block(index)) = self.0.get_mut(depth)
            && *index > removed_index
        {
            *index -= 1;
        }
    }
}

impl<const N: usize> From<[PathStep; N]> for ModelPath {
    fn from(steps: [PathStep; N]) -> Self {
        Self(steps.to_vec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Document,
    ListItem,
    FormatContainer,
    TableCell,
}

/// A block group together with its kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupPath {
    pub kind: GroupKind,
    pub path: ModelPath,
}

impl GroupPath {
    pub fn root() -> Self {
        Self {
            kind: GroupKind::Document,
            path: ModelPath::root(),
        }
    }
}

/// Index of the closest group of one of `kinds` in an innermost-first group
/// path, not looking past any group of `stop_at`.
pub fn closest_group_index(
    path: &[GroupPath],
    kinds: &[GroupKind],
    stop_at: &[GroupKind],
) -> Option<usize> {
    for (index, group) in path.iter().enumerate() {
        if kinds.contains(&group.kind) {
            return Some(index);
        }
        if stop_at.contains(&group.kind) {
            return None;
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentAddress {
    pub paragraph: ModelPath,
    pub index: usize,
}

impl SegmentAddress {
    pub fn new(paragraph: ModelPath, index: usize) -> Self {
        Self { paragraph, index }
    }
}

fn group_blocks<'a>(blocks: &'a Vec<Block>, steps: &[PathStep]) -> Option<&'a Vec<Block>> {
    match steps {
        [] => Some(blocks),
        [PathStep::Block(i), PathStep::Cell { row, col }, rest @ ..] => match blocks.get(*i)? {
            Block::Table(table) => group_blocks(&table.cell(*row, *col)?.blocks, rest),
            _ => None,
        },
        [PathStep::Block(i), rest @ ..] => group_blocks(blocks.get(*i)?.child_blocks()?, rest),
        [PathStep::Cell { .. }, ..] => None,
    }
}

fn group_blocks_mut<'a>(
    blocks: &'a mut Vec<Block>,
    steps: &[PathStep],
) -> Option<&'a mut Vec<Block>> {
    match steps {
        [] => Some(blocks),
        [PathStep::Block(i), PathStep::Cell { row, col }, rest @ ..] => {
            match blocks.get_mut(*i)? {
                Block::Table(table) => group_blocks_mut(
                    &mut table.rows.get_mut(*row)?.cells.get_mut(*col)?.blocks,
                    rest,
                ),
                _ => None,
            }
        }
        [PathStep::Block(i), rest @ ..] => match blocks.get_mut(*i)? {
            Block::ListItem(item) => group_blocks_mut(&mut item.blocks, rest),
            Block::FormatContainer(container) => group_blocks_mut(&mut container.blocks, rest),
            _ => None,
        },
        [PathStep::Cell { .. }, ..] => None,
    }
}

impl ContentModelDocument {
    /// Blocks of the group at `path`
    pub fn group(&self, path: &ModelPath) -> Option<&Vec<Block>> {
        group_blocks(&self.blocks, path.steps())
    }

    pub fn group_mut(&mut self, path: &ModelPath) -> Option<&mut Vec<Block>> {
        group_blocks_mut(&mut self.blocks, path.steps())
    }

    pub fn block(&self, path: &ModelPath) -> Option<&Block> {
        let (group, index) = path.split_last_block()?;
        self.group(&group)?.get(index)
    }

    pub fn block_mut(&mut self, path: &ModelPath) -> Option<&mut Block> {
        let (group, index) = path.split_last_block()?;
        self.group_mut(&group)?.get_mut(index)
    }

    pub fn paragraph(&self, path: &ModelPath) -> Option<&Paragraph> {
        self.block(path)?.as_paragraph()
    }

    pub fn paragraph_mut(&mut self, path: &ModelPath) -> Option<&mut Paragraph> {
        self.block_mut(path)?.as_paragraph_mut()
    }

    pub fn list_item_mut(&mut self, path: &ModelPath) -> Option<&mut ListItem> {
        match self.block_mut(path)? {
            Block::ListItem(item) => Some(item),
            _ => None,
        }
    }

    pub fn table_mut(&mut self, path: &ModelPath) -> Option<&mut Table> {
        match self.block_mut(path)? {
            Block::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn segment(&self, address: &SegmentAddress) -> Option<&Segment> {
        self.paragraph(&address.paragraph)?
            .segments
            .get(address.index)
    }

    pub fn segment_mut(&mut self, address: &SegmentAddress) -> Option<&mut Segment> {
        self.paragraph_mut(&address.paragraph)?
            .segments
            .get_mut(address.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FormatContainer, ListItem, TableCell};

    fn sample() -> ContentModelDocument {
        ContentModelDocument::new(vec![
            Block::paragraph(vec![Segment::text("a")]),
            Block::FormatContainer(FormatContainer::new(
                "blockquote",
                vec![Block::ListItem(ListItem::new(
                    vec![],
                    vec![Block::paragraph(vec![Segment::text("b")])],
                ))],
            )),
            Block::Table(Table::new(vec![vec![
                TableCell::new(vec![]),
                TableCell::new(vec![Block::paragraph(vec![Segment::text("c")])]),
            ]])),
        ])
    }

    #[test]
    fn test_nested_paragraph_lookup() {
        let model = sample();
        let path = ModelPath::root().block(1).block(0).block(0);
        let address = SegmentAddress::new(path, 0);
        assert_eq!(
            model.segment(&address).and_then(Segment::text_value),
            Some("b")
        );
    }

    #[test]
    fn test_table_cell_lookup() {
        let model = sample();
        let path = ModelPath::root().block(2).cell(0, 1).block(0);
        assert!(model.paragraph(&path).is_some());
        assert!(model.group(&ModelPath::root().block(2).cell(0, 0)).is_some());
        assert!(model.group(&ModelPath::root().block(2).cell(1, 0)).is_none());
    }

    #[test]
    fn test_invalid_paths_resolve_to_none() {
        let mut model = sample();
        assert!(model.group(&ModelPath::root().block(0).block(0)).is_none());
        assert!(model.block_mut(&ModelPath::root().block(9)).is_none());
        assert!(model.block(&ModelPath::root()).is_none());
    }

    #[test]
    fn test_closest_group_index_stops_at_cell() {
        let path = vec![
            GroupPath {
                kind: GroupKind::TableCell,
                path: ModelPath::root().block(0).cell(0, 0),
            },
            GroupPath {
                kind: GroupKind::ListItem,
                path: ModelPath::root().block(0),
            },
            GroupPath::root(),
        ];
        assert_eq!(
            closest_group_index(&path, &[GroupKind::ListItem], &[GroupKind::TableCell]),
            None
        );
        assert_eq!(closest_group_index(&path, &[GroupKind::ListItem], &[]), Some(1));
    }

    #[test]
    fn test_adjust_for_removal() {
        let removed = ModelPath::root().block(1).block(0);
        let mut later = ModelPath::root().block(1).block(2).block(0);
        later.adjust_for_removal(&removed);
        assert_eq!(later, ModelPath::root().block(1).block(1).block(0));

        let mut earlier = ModelPath::root().block(0);
        earlier.adjust_for_removal(&removed);
        assert_eq!(earlier, ModelPath::root().block(0));

        let mut elsewhere = ModelPath::root().block(2).block(3);
        elsewhere.adjust_for_removal(&removed);
        assert_eq!(elsewhere, ModelPath::root().block(2).block(3));
    }
}
