use super::{Cell, Table};
use anyhow::{Context, Result};
use std::path::Path;

pub fn table_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(Cell::render))?;
    }
    writer.into_inner().context("flushing csv buffer")
}

pub async fn write_table(path: &Path, table: &Table) -> Result<()> {
    let bytes = table_bytes(table)?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))
}

pub fn read_table(path: &Path) -> Result<Table> {
    let mut reader = ::csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let columns = reader.headers()?.iter().map(str::to_string).collect();
    let mut table = Table {
        columns,
        rows: Vec::new(),
    };
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading {} row {}", path.display(), line + 1))?;
        table.push(record.iter().map(Cell::parse).collect())?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn written_table_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datos.csv");
        let mut table = Table::new(&["latitude", "longitude", "sensor_id", "altitude_terrain"]);
        table
            .push(vec![
                Cell::Real(-39.163552),
                Cell::Real(-67.038406),
                Cell::Text("S_001".into()),
                Cell::Real(262.0),
            ])
            .unwrap();
        write_table(&path, &table).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            raw,
            "latitude,longitude,sensor_id,altitude_terrain\n-39.163552,-67.038406,S_001,262\n"
        );

        let back = read_table(&path).unwrap();
        assert_eq!(back.columns, table.columns);
        assert_eq!(back.rows[0][3], Cell::Integer(262));
        assert_eq!(back.rows[0][0], Cell::Real(-39.163552));
    }

    #[test]
    fn empty_table_is_just_the_header() {
        let table = Table::new(&["latitude", "longitude"]);
        assert_eq!(table_bytes(&table).unwrap(), b"latitude,longitude\n");
    }

    #[tokio::test]
    async fn missing_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("datos.csv");
        let err = write_table(&path, &Table::new(&["latitude"])).await.unwrap_err();
        assert!(err.to_string().starts_with("writing "));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "latitude,longitude\n1.0,2.0\n3.0\n").unwrap();
        assert!(read_table(&path).is_err());
    }
}
