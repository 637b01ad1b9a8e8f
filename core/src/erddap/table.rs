use std::io::Read;

use chrono::{DateTime, Utc};

use crate::prelude::{PipelineError, PipelineResult};

/// Column-major table as returned by a tabledap `.csv` request.
///
/// Cells are kept as text; typing happens when a table becomes a series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    units: Vec<String>,
    columns: Vec<Vec<String>>,
}

impl Table {
    pub fn new(
        names: Vec<String>,
        units: Vec<String>,
        columns: Vec<Vec<String>>,
    ) -> PipelineResult<Self> {
        if names.len() != units.len() || names.len() != columns.len() {
            return Err(PipelineError::MalformedTable(format!(
                "{} names, {} units, {} columns",
                names.len(),
                units.len(),
                columns.len()
            )));
        }
        if let Some(first) = columns.first() {
            if columns.iter().any(|c| c.len() != first.len()) {
                return Err(PipelineError::MalformedTable(
                    "columns differ in length".into(),
                ));
            }
        }
        Ok(Self {
            names,
            units,
            columns,
        })
    }

    /// Parse the ERDDAP CSV layout: a row of column names, a row of units,
    /// then one row per observation.
    pub fn from_erddap_csv<R: Read>(reader: R) -> PipelineResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = csv_reader.records();

        let names: Vec<String> = match records.next() {
            Some(record) => record?.iter().map(str::to_string).collect(),
            None => return Err(PipelineError::MalformedTable("missing header row".into())),
        };
        let units: Vec<String> = match records.next() {
            Some(record) => record?.iter().map(str::to_string).collect(),
            None => return Err(PipelineError::MalformedTable("missing units row".into())),
        };

        let mut columns = vec![Vec::new(); names.len()];
        for record in records {
            let record = record?;
            for (column, cell) in columns.iter_mut().zip(record.iter()) {
                column.push(cell.to_string());
            }
        }

        Self::new(names, units, columns)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.position(name).map(|idx| self.columns[idx].as_slice())
    }

    pub fn unit(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.units[idx].as_str())
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// Parse a numeric cell. Empty cells and ERDDAP's `NaN` are missing values.
pub fn parse_number(cell: &str) -> Option<f64> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    cell.parse::<f64>().ok()
}

/// Parse a time cell into seconds since the Unix epoch.
///
/// Accepts ISO-8601 / RFC 3339 strings and plain epoch seconds.
pub fn parse_timestamp(cell: &str) -> PipelineResult<f64> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(cell) {
        let utc = parsed.with_timezone(&Utc);
        return Ok(utc.timestamp_millis() as f64 / 1000.0);
    }
    match cell.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() => Ok(seconds),
        _ => Err(PipelineError::InvalidTimestamp(cell.to_string())),
    }
}
