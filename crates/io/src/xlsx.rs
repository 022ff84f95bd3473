// Excel import (xlsx, xlsm, xls, xlsb, ods) and xlsx export

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use erafix_engine::CellValue;
use rust_xlsxwriter::Workbook;

use crate::error::IoError;
use crate::sheet::RawSheet;

/// Read every sheet, in workbook order.
///
/// Cells keep their absolute position: a range starting below A1 is padded
/// with empty rows and columns so untouched sheets are written back in place.
pub fn import(path: &Path) -> Result<Vec<RawSheet>, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| IoError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(IoError::NoSheets(path.to_path_buf()));
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in &sheet_names {
        let range = workbook.worksheet_range(sheet_name).map_err(|e| IoError::Read {
            path: path.to_path_buf(),
            message: format!("sheet '{sheet_name}': {e}"),
        })?;

        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];

        for row in range.rows() {
            let mut cells = vec![CellValue::Empty; start_col as usize];
            cells.extend(row.iter().map(convert));
            rows.push(cells);
        }

        log::debug!("read sheet '{sheet_name}': {} row(s)", rows.len());
        sheets.push(RawSheet::new(sheet_name.clone(), rows));
    }

    Ok(sheets)
}

fn convert(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from_input(s),
        Data::Float(n) => CellValue::from_number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::text(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => CellValue::text(format!("#{e:?}")),
        // Serial number; no date columns are interpreted here.
        Data::DateTime(dt) => CellValue::from_number(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::from_input(s),
        Data::DurationIso(s) => CellValue::from_input(s),
    }
}

/// Write `sheets` to a new xlsx file, in order.
pub fn export(sheets: &[RawSheet], path: &Path) -> Result<(), IoError> {
    let write_err = |message: String| IoError::Write {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = Workbook::new();

    for sheet in sheets {
        let worksheet = workbook
            .add_worksheet()
            .set_name(&sheet.name)
            .map_err(|e| write_err(format!("sheet '{}': {e}", sheet.name)))?;

        for (row, cells) in sheet.rows.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                let (row32, col16) = (row as u32, col as u16);
                match cell {
                    CellValue::Empty => {}
                    CellValue::Text(s) => {
                        worksheet
                            .write_string(row32, col16, s)
                            .map_err(|e| write_err(format!("cell ({row}, {col}): {e}")))?;
                    }
                    CellValue::Number(n) => {
                        worksheet
                            .write_number(row32, col16, *n)
                            .map_err(|e| write_err(format!("cell ({row}, {col}): {e}")))?;
                    }
                }
            }
        }
    }

    workbook
        .save(path)
        .map_err(|e| write_err(e.to_string()))?;

    log::debug!("wrote {} sheet(s) to {}", sheets.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn export_then_import_keeps_sheets_and_types() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");

        let sheets = vec![
            RawSheet::new(
                "Outputs",
                vec![
                    vec![CellValue::text("ERA_18_FOR1"), CellValue::text("HANDLED")],
                    vec![CellValue::text("0206"), CellValue::Number(1.0)],
                    vec![CellValue::Empty, CellValue::text("ClawbackNeeded")],
                ],
            ),
            RawSheet::new("Notes", vec![vec![CellValue::text("keep me")]]),
        ];
        export(&sheets, &path).unwrap();

        let back = import(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].name, "Outputs");
        assert_eq!(back[0].rows[1][0], CellValue::text("0206"));
        assert_eq!(back[0].rows[1][1], CellValue::Number(1.0));
        assert_eq!(back[0].rows[2][0], CellValue::Empty);
        assert_eq!(back[1].rows[0][0], CellValue::text("keep me"));
    }

    #[test]
    fn import_missing_file_is_open_error() {
        let dir = tempdir().unwrap();
        let err = import(&dir.path().join("nope.xlsx")).unwrap_err();
        assert!(matches!(err, IoError::Open { .. }));
    }

    #[test]
    fn bad_sheet_name_is_write_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.xlsx");
        let sheets = vec![RawSheet::new("a/b", vec![])];
        assert!(matches!(export(&sheets, &path), Err(IoError::Write { .. })));
    }
}
