//! XLSX decoding. Every worksheet becomes one cell grid; cell values are
//! rendered to strings and typed downstream by the validator.

use std::io::Cursor;

use calamine::{Data, Reader};

use super::{CellGrid, LoaderError, StructuredView};

pub(super) fn load(bytes: &[u8]) -> Result<StructuredView, LoaderError> {
    let mut workbook = calamine::Xlsx::new(Cursor::new(bytes))
        .map_err(|e| LoaderError::CorruptDocument(e.to_string()))?;

    let names = workbook.sheet_names().to_vec();
    let mut grids = Vec::new();
    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| LoaderError::CorruptDocument(e.to_string()))?;
        let grid = grid_from_range(&name, &range);
        if !grid.rows.is_empty() {
            grids.push(grid);
        }
    }

    Ok(StructuredView {
        text_blocks: Vec::new(),
        grids,
    })
}

fn grid_from_range(name: &str, range: &calamine::Range<Data>) -> CellGrid {
    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    CellGrid {
        name: name.to_string(),
        rows,
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_cells_render_to_strings() {
        let mut range = calamine::Range::<Data>::new((0, 0), (1, 2));
        range.set_value((0, 0), Data::String("Velocity".into()));
        range.set_value((0, 1), Data::Float(42.0));
        range.set_value((0, 2), Data::String("pts".into()));
        range.set_value((1, 0), Data::String("Budget Total".into()));
        range.set_value((1, 1), Data::String("€ 1.234,56".into()));

        let grid = grid_from_range("Sheet1", &range);
        assert_eq!(grid.name, "Sheet1");
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[0][0], "Velocity");
        assert_eq!(grid.rows[0][2], "pts");
        assert_eq!(grid.rows[1][1], "€ 1.234,56");
        // trailing unset cell renders empty, keeping the grid rectangular
        assert_eq!(grid.rows[1][2], "");
    }

    #[test]
    fn non_xlsx_bytes_are_corrupt() {
        assert!(matches!(
            load(b"not a workbook").unwrap_err(),
            LoaderError::CorruptDocument(_)
        ));
    }
}
