/*!
 * # Content model
 *
 * The structured, DOM independent description of editable content:
 *
 * - **Document**: root group holding ordered blocks plus the default segment format
 * - **Block groups**: list items, format containers (e.g. blockquote) and table cells
 * - **Blocks**: paragraphs, tables, dividers and block level entities
 * - **Segments**: text, images, inline entities, selection markers, line breaks
 *
 * Selection lives in the model itself: every segment, divider, entity and
 * table cell carries an `is_selected` flag, and a [`SegmentKind::SelectionMarker`]
 * anchors a collapsed caret. Nodes are addressed by position through
 * [`path::ModelPath`].
 */

pub mod format;
pub mod normalize;
pub mod path;
pub mod selection;
pub mod word;

pub use format::*;
pub use path::{GroupKind, GroupPath, ModelPath, PathStep, SegmentAddress};

use crate::dom::NodeId;
use crate::entity::EntityMarker;

/// An embedded opaque unit: the live DOM wrapper plus its typed marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub wrapper: NodeId,
    pub marker: EntityMarker,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SegmentKind {
    Text { text: String },
    Image { src: String, id: Option<String> },
    Entity(Entity),
    SelectionMarker,
    Br,
    General,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub format: SegmentFormat,
    pub is_selected: bool,
    pub link: Option<Link>,
    pub code: Option<Code>,
}

impl Segment {
    fn with_kind(kind: SegmentKind) -> Self {
        Self {
            kind,
            format: SegmentFormat::default(),
            is_selected: false,
            link: None,
            code: None,
        }
    }

    pub fn text(text: &str) -> Self {
        Self::with_kind(SegmentKind::Text {
            text: text.to_string(),
        })
    }

    /// A selected selection marker, i.e. a caret
    pub fn selection_marker() -> Self {
        Self {
            is_selected: true,
            ..Self::with_kind(SegmentKind::SelectionMarker)
        }
    }

    pub fn br() -> Self {
        Self::with_kind(SegmentKind::Br)
    }

    pub fn image(src: &str) -> Self {
        Self::with_kind(SegmentKind::Image {
            src: src.to_string(),
            id: None,
        })
    }

    pub fn entity(entity: Entity) -> Self {
        Self::with_kind(SegmentKind::Entity(entity))
    }

    pub fn selected(mut self) -> Self {
        self.is_selected = true;
        self
    }

    pub fn with_format(mut self, format: SegmentFormat) -> Self {
        self.format = format;
        self
    }

    pub fn is_marker(&self) -> bool {
        matches!(self.kind, SegmentKind::SelectionMarker)
    }

    pub fn text_value(&self) -> Option<&str> {
        match &self.kind {
            SegmentKind::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn entity_value(&self) -> Option<&Entity> {
        match &self.kind {
            SegmentKind::Entity(entity) => Some(entity),
            _ => None,
        }
    }
}

/// Heading or other tag that decorates a paragraph
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphDecorator {
    pub tag_name: String,
    pub format: SegmentFormat,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub segments: Vec<Segment>,
    pub format: BlockFormat,
    pub segment_format: Option<SegmentFormat>,
    pub decorator: Option<ParagraphDecorator>,
    /// Created by the model, not backed by a block element in the DOM
    pub is_implicit: bool,
}

impl Paragraph {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub blocks: Vec<Block>,
    pub levels: Vec<ListLevel>,
    /// Carries list marker formatting apart from the item's content
    pub format_holder: Segment,
    pub format: BlockFormat,
}

impl ListItem {
    pub fn new(levels: Vec<ListLevel>, blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            levels,
            format_holder: Segment {
                is_selected: false,
                ..Segment::with_kind(SegmentKind::SelectionMarker)
            },
            format: BlockFormat::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormatContainer {
    pub tag_name: String,
    pub blocks: Vec<Block>,
    pub format: BlockFormat,
}

impl FormatContainer {
    pub fn new(tag_name: &str, blocks: Vec<Block>) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            blocks,
            format: BlockFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCell {
    pub blocks: Vec<Block>,
    pub format: TableCellFormat,
    pub is_selected: bool,
    pub is_header: bool,
    pub span_left: bool,
    pub span_above: bool,
    pub metadata: Option<TableCellMetadata>,
}

impl TableCell {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    pub height: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<TableRow>,
    pub widths: Vec<f32>,
    pub format: TableFormat,
    pub metadata: Option<TableMetadata>,
}

impl Table {
    pub fn new(rows: Vec<Vec<TableCell>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|cells| TableRow { cells, height: 0.0 })
                .collect(),
            ..Self::default()
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.rows.get(row)?.cells.get(col)
    }

    pub fn cells(&self) -> impl Iterator<Item = &TableCell> {
        self.rows.iter().flat_map(|r| r.cells.iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Divider {
    pub tag_name: String,
    pub format: BlockFormat,
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockEntity {
    pub entity: Entity,
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    ListItem(ListItem),
    FormatContainer(FormatContainer),
    Table(Table),
    Divider(Divider),
    Entity(BlockEntity),
}

impl Block {
    pub fn paragraph(segments: Vec<Segment>) -> Self {
        Block::Paragraph(Paragraph::new(segments))
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    /// Child blocks when this block is itself a block group
    pub fn child_blocks(&self) -> Option<&Vec<Block>> {
        match self {
            Block::ListItem(item) => Some(&item.blocks),
            Block::FormatContainer(container) => Some(&container.blocks),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentModelDocument {
    pub blocks: Vec<Block>,
    /// Default segment format new and cleared content falls back to
    pub format: SegmentFormat,
    pub has_reverted_range_selection: bool,
}

impl ContentModelDocument {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            ..Self::default()
        }
    }
}
