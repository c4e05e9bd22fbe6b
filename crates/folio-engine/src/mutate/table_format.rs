use crate::model::{Table, TableBorderFormat, TableMetadata};

fn border(color: &Option<String>) -> Option<String> {
    Some(format!(
        "1px solid {}",
        color.as_deref().unwrap_or("transparent")
    ))
}

/// Re-derives cell borders, backgrounds and header flags from the table's
/// metadata (or `new_metadata`, which is then stored). Tables without
/// metadata get the default look. Cells flagged with overrides keep their
/// own borders or background.
pub fn apply_table_format(table: &mut Table, new_metadata: Option<&TableMetadata>) {
    let metadata = new_metadata
        .cloned()
        .or_else(|| table.metadata.clone())
        .unwrap_or_default();
    let last_row = table.rows.len().saturating_sub(1);

    for (row_index, row) in table.rows.iter_mut().enumerate() {
        let last_col = row.cells.len().saturating_sub(1);
        for (col_index, cell) in row.cells.iter_mut().enumerate() {
            let overrides = cell.metadata.clone().unwrap_or_default();
            let is_header_row = metadata.has_header_row && row_index == 0;
            cell.is_header = is_header_row;

            if !overrides.border_override {
                let format = &mut cell.format;
                format.border_top = border(&metadata.top_border_color);
                format.border_bottom = border(&metadata.bottom_border_color);
                format.border_left = border(&metadata.vertical_border_color);
                format.border_right = border(&metadata.vertical_border_color);

                match metadata.table_border_format {
                    TableBorderFormat::Default => {}
                    TableBorderFormat::NoBorders => {
                        format.border_top = None;
                        format.border_bottom = None;
                        format.border_left = None;
                        format.border_right = None;
                    }
                    TableBorderFormat::NoSideBorders => {
                        if col_index == 0 {
                            format.border_left = None;
                        }
                        if col_index == last_col {
                            format.border_right = None;
                        }
                    }
                    TableBorderFormat::ListWithSideBorders => {
                        if row_index > 0 {
                            format.border_top = None;
                        }
                        if row_index < last_row {
                            format.border_bottom = None;
                        }
                    }
                    TableBorderFormat::FirstColumnHeaderExternal => {
                        if col_index > 0 {
                            format.border_left = None;
                        }
                        if row_index > 0 && row_index < last_row {
                            format.border_top = None;
                        }
                    }
                }
            }

            if !overrides.bg_color_override {
                cell.format.background_color = if is_header_row {
                    metadata.header_row_color.clone()
                } else if metadata.has_banded_rows {
                    if row_index % 2 == 0 {
                        metadata.bg_color_even.clone()
                    } else {
                        metadata.bg_color_odd.clone()
                    }
                } else if metadata.has_banded_columns {
                    if col_index % 2 == 0 {
                        metadata.bg_color_even.clone()
                    } else {
                        metadata.bg_color_odd.clone()
                    }
                } else {
                    None
                };
            }
        }
    }

    table.format.border_collapse = Some(true);
    table.format.use_border_box = Some(true);
    table.metadata = Some(metadata);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TableCell, TableCellMetadata};
    use pretty_assertions::assert_eq;

    fn grid(rows: usize, cols: usize) -> Table {
        Table::new(
            (0..rows)
                .map(|_| (0..cols).map(|_| TableCell::new(vec![])).collect())
                .collect(),
        )
    }

    #[test]
    fn test_default_metadata_is_applied() {
        let mut table = grid(2, 2);
        apply_table_format(&mut table, None);
        assert_eq!(table.metadata, Some(TableMetadata::default()));
        for cell in table.cells() {
            assert_eq!(cell.format.border_top.as_deref(), Some("1px solid #ABABAB"));
            assert_eq!(cell.format.background_color, None);
            assert!(!cell.is_header);
        }
        assert_eq!(table.format.border_collapse, Some(true));
    }

    #[test]
    fn test_header_and_banding() {
        let mut table = grid(3, 1);
        let metadata = TableMetadata {
            has_header_row: true,
            has_banded_rows: true,
            bg_color_even: Some("white".to_string()),
            ..TableMetadata::default()
        };
        apply_table_format(&mut table, Some(&metadata));
        let backgrounds: Vec<Option<&str>> = table
            .cells()
            .map(|c| c.format.background_color.as_deref())
            .collect();
        assert_eq!(backgrounds, vec![Some("#ABABAB"), Some("#ABABAB20"), Some("white")]);
        assert!(table.rows[0].cells[0].is_header);
        assert!(!table.rows[1].cells[0].is_header);
    }

    #[test]
    fn test_overrides_are_kept() {
        let mut table = grid(1, 2);
        let cell = &mut table.rows[0].cells[1];
        cell.format.background_color = Some("red".to_string());
        cell.format.border_top = Some("2px dashed blue".to_string());
        cell.metadata = Some(TableCellMetadata {
            bg_color_override: true,
            border_override: true,
        });
        apply_table_format(&mut table, None);
        let cell = &table.rows[0].cells[1];
        assert_eq!(cell.format.background_color.as_deref(), Some("red"));
        assert_eq!(cell.format.border_top.as_deref(), Some("2px dashed blue"));
    }

    #[test]
    fn test_no_side_borders() {
        let mut table = grid(1, 2);
        let metadata = TableMetadata {
            table_border_format: TableBorderFormat::NoSideBorders,
            ..TableMetadata::default()
        };
        apply_table_format(&mut table, Some(&metadata));
        assert_eq!(table.rows[0].cells[0].format.border_left, None);
        assert!(table.rows[0].cells[0].format.border_right.is_some());
        assert_eq!(table.rows[0].cells[1].format.border_right, None);
    }
}
