//! Format records carried by content model nodes.

use serde::{Deserialize, Serialize};

/// Character level formatting of a segment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SegmentFormat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<String>,
}

impl SegmentFormat {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

/// Block level formatting shared by paragraphs, containers, list items and dividers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockFormat {
    pub direction: Option<Direction>,
    pub text_align: Option<String>,
    pub background_color: Option<String>,
    pub line_height: Option<String>,
    pub margin_top: Option<String>,
    pub margin_bottom: Option<String>,
    pub margin_left: Option<String>,
    pub margin_right: Option<String>,
    pub padding_left: Option<String>,
    pub text_indent: Option<String>,
    pub white_space: Option<String>,
    pub border_left: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkFormat {
    pub href: String,
    pub target: Option<String>,
    pub title: Option<String>,
    pub underline: Option<bool>,
    /// Color the renderer derives for the anchor element
    pub text_color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Link {
    pub format: LinkFormat,
    pub dataset: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Code {
    pub font_family: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListType {
    Ordered,
    #[default]
    Unordered,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListLevel {
    pub list_type: ListType,
    pub start_number: Option<u32>,
    pub list_style_type: Option<String>,
    pub format: BlockFormat,
}

impl ListLevel {
    pub fn new(list_type: ListType) -> Self {
        Self {
            list_type,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFormat {
    pub use_border_box: Option<bool>,
    pub border_collapse: Option<bool>,
    pub background_color: Option<String>,
    pub width: Option<String>,
    pub margin_left: Option<String>,
    pub margin_right: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCellFormat {
    pub use_border_box: Option<bool>,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    pub border_top: Option<String>,
    pub border_bottom: Option<String>,
    pub border_left: Option<String>,
    pub border_right: Option<String>,
    pub vertical_align: Option<String>,
    pub text_align: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableBorderFormat {
    #[default]
    Default,
    ListWithSideBorders,
    FirstColumnHeaderExternal,
    NoSideBorders,
    NoBorders,
}

/// Table level styling preferences, stored alongside the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    pub top_border_color: Option<String>,
    pub bottom_border_color: Option<String>,
    pub vertical_border_color: Option<String>,
    pub has_header_row: bool,
    pub has_first_column: bool,
    pub has_banded_rows: bool,
    pub has_banded_columns: bool,
    pub bg_color_even: Option<String>,
    pub bg_color_odd: Option<String>,
    pub header_row_color: Option<String>,
    pub table_border_format: TableBorderFormat,
}

impl Default for TableMetadata {
    fn default() -> Self {
        Self {
            top_border_color: Some("#ABABAB".to_string()),
            bottom_border_color: Some("#ABABAB".to_string()),
            vertical_border_color: Some("#ABABAB".to_string()),
            has_header_row: false,
            has_first_column: false,
            has_banded_rows: false,
            has_banded_columns: false,
            bg_color_even: None,
            bg_color_odd: Some("#ABABAB20".to_string()),
            header_row_color: Some("#ABABAB".to_string()),
            table_border_format: TableBorderFormat::Default,
        }
    }
}

/// Per cell overrides that survive reapplying table formatting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCellMetadata {
    pub bg_color_override: bool,
    pub border_override: bool,
}
