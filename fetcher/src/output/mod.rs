pub mod csv;
pub mod geojson;
pub mod kepler;
pub mod xlsx;

use anyhow::{Result, anyhow};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(value) => Some(*value as f64),
            Cell::Real(value) => Some(*value),
            Cell::Text(_) => None,
        }
    }

    /// Integers first, then floats, anything else stays text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return Cell::Integer(value);
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Cell::Real(value),
            _ => Cell::Text(raw.to_string()),
        }
    }

    pub fn render(&self) -> String {
        match self {
            Cell::Integer(value) => value.to_string(),
            Cell::Real(value) => value.to_string(),
            Cell::Text(value) => value.clone(),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Real(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<u8> for Cell {
    fn from(value: u8) -> Self {
        Cell::Integer(i64::from(value))
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Real,
    String,
}

/// Column-ordered rows shared by the CSV, GeoJSON and Kepler writers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(anyhow!(
                "row has {} cells, table has {} columns",
                row.len(),
                self.columns.len()
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| anyhow!("column '{name}' not found"))
    }

    pub fn field_type(&self, index: usize) -> FieldType {
        let mut kind = FieldType::Integer;
        for row in &self.rows {
            match row.get(index) {
                Some(Cell::Integer(_)) | None => {}
                Some(Cell::Real(_)) => kind = FieldType::Real,
                Some(Cell::Text(_)) => return FieldType::String,
            }
        }
        kind
    }

    pub fn numeric(&self, index: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows
            .iter()
            .filter_map(move |row| row.get(index).and_then(Cell::as_f64))
    }

    pub fn mean(&self, name: &str) -> Option<f64> {
        let index = self.column_index(name)?;
        let (sum, count) = self
            .numeric(index)
            .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
        (count > 0).then(|| sum / count as f64)
    }

    pub fn range(&self, name: &str) -> Option<(f64, f64)> {
        let index = self.column_index(name)?;
        self.numeric(index).fold(None, |acc, value| match acc {
            None => Some((value, value)),
            Some((min, max)) => Some((min.min(value), max.max(value))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        let mut table = Table::new(&["latitude", "longitude", "sensor_id", "flag"]);
        table
            .push(vec![Cell::Real(-39.1), Cell::Real(-67.0), Cell::Text("S_001".into()), Cell::Integer(1)])
            .unwrap();
        table
            .push(vec![Cell::Real(-39.3), Cell::Real(-67.2), Cell::Text("S_002".into()), Cell::Integer(0)])
            .unwrap();
        table
    }

    #[test]
    fn parse_prefers_integers() {
        assert_eq!(Cell::parse("12"), Cell::Integer(12));
        assert_eq!(Cell::parse("-39.163552"), Cell::Real(-39.163552));
        assert_eq!(Cell::parse("S_001"), Cell::Text("S_001".into()));
        assert_eq!(Cell::parse("NaN"), Cell::Text("NaN".into()));
    }

    #[test]
    fn push_checks_width() {
        let mut table = table();
        assert!(table.push(vec![Cell::Real(1.0)]).is_err());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn field_types_follow_cells() {
        let table = table();
        assert_eq!(table.field_type(0), FieldType::Real);
        assert_eq!(table.field_type(2), FieldType::String);
        assert_eq!(table.field_type(3), FieldType::Integer);
    }

    #[test]
    fn mean_and_range() {
        let table = table();
        assert!((table.mean("latitude").unwrap() + 39.2).abs() < 1e-9);
        assert_eq!(table.range("longitude"), Some((-67.2, -67.0)));
        assert_eq!(table.mean("missing"), None);
    }
}
