use super::{Cell, Table};
use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;
use std::path::Path;

/// Single-sheet workbook: header row, then one row per table row.
pub fn table_workbook(table: &Table) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in table.columns.iter().enumerate() {
        sheet.write_string(0, column(col)?, name)?;
    }
    for (n, row) in table.rows.iter().enumerate() {
        let line = u32::try_from(n + 1).context("too many rows for a worksheet")?;
        for (col, cell) in row.iter().enumerate() {
            let col = column(col)?;
            match cell {
                Cell::Integer(value) => sheet.write_number(line, col, *value as f64)?,
                Cell::Real(value) => sheet.write_number(line, col, *value)?,
                Cell::Text(value) => sheet.write_string(line, col, value)?,
            };
        }
    }
    Ok(workbook.save_to_buffer()?)
}

fn column(index: usize) -> Result<u16> {
    u16::try_from(index).context("too many columns for a worksheet")
}

pub async fn write_table(path: &Path, table: &Table) -> Result<()> {
    let bytes = table_workbook(table)?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))
}
