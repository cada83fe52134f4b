//! Orders file loading.
//!
//! [`load()`] reads a delimited text file into an [`OrderTable`]: the file is
//! decoded (UTF-8, falling back to ISO-8859-1), headers are normalized, every
//! column gets a declared [`ColumnKind`] from a full scan of its values, and an
//! `order_date` column, when present, is parsed into date-times. Individual
//! dates that cannot be parsed become missing cells instead of failing the load.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    data::{Value, is_missing_token, normalize_column_name, parse_order_datetime},
    error::DataLoadError,
    io_utils::{self, SourceEncoding},
};

/// Normalized name of the column parsed as order timestamps.
pub const ORDER_DATE_COLUMN: &str = "order_date";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
    DateTime,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Text => "text",
            ColumnKind::DateTime => "datetime",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

pub type Row = Vec<Option<Value>>;

/// In-memory orders table with normalized column names and typed cells.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTable {
    source: PathBuf,
    encoding: SourceEncoding,
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl OrderTable {
    /// Builds a table from already-typed parts. Rows shorter than the column
    /// list are padded with missing cells.
    pub fn from_parts(
        source: impl Into<PathBuf>,
        encoding: SourceEncoding,
        columns: Vec<Column>,
        mut rows: Vec<Row>,
    ) -> Self {
        for row in &mut rows {
            row.resize(columns.len(), None);
        }
        Self {
            source: source.into(),
            encoding,
            columns,
            rows,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Name of the encoding the file was decoded with.
    pub fn encoding(&self) -> &'static str {
        self.encoding.name()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<&Row> {
        self.rows.get(idx)
    }

    pub fn head(&self, n: usize) -> &[Row] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Present values of the named column, in row order.
    pub fn values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Value> + use<'a> {
        let idx = self.column_index(name);
        self.rows
            .iter()
            .filter_map(move |row| idx.and_then(|i| row[i].as_ref()))
    }

    /// Present numeric values of the named column; non-numeric cells are skipped.
    pub fn numeric_values<'a>(&'a self, name: &str) -> impl Iterator<Item = f64> + use<'a> {
        self.values(name).filter_map(Value::as_f64)
    }
}

/// Reads `path` into an [`OrderTable`], using `delimiter` between fields.
pub fn load(path: &Path, delimiter: u8) -> Result<OrderTable, DataLoadError> {
    if !path.exists() {
        return Err(DataLoadError::Missing {
            path: path.to_path_buf(),
        });
    }
    let bytes = fs::read(path).map_err(|source| DataLoadError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let (text, encoding) = io_utils::decode_with_fallback(&bytes);
    if encoding != SourceEncoding::Utf8 {
        info!("{path:?} is not valid UTF-8; decoded as {encoding}");
    }
    parse_text(path, &text, delimiter, encoding)
}

/// Parses decoded CSV text. Exposed separately so callers holding text in
/// memory can skip the file system.
pub fn parse_text(
    path: &Path,
    text: &str,
    delimiter: u8,
    encoding: SourceEncoding,
) -> Result<OrderTable, DataLoadError> {
    let malformed = |line: u64, message: String| DataLoadError::Malformed {
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut reader = io_utils::open_csv_reader(text.as_bytes(), delimiter);
    let headers = reader
        .headers()
        .map_err(|err| malformed(error_line(&err), err.to_string()))?
        .iter()
        .map(normalize_column_name)
        .collect::<Vec<_>>();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(malformed(1, "no columns to parse".to_string()));
    }

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| malformed(error_line(&err), err.to_string()))?;
        raw_rows.push(record.iter().map(str::to_string).collect());
    }

    let mut columns = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| Column {
            name: name.clone(),
            kind: infer_kind(raw_rows.iter().map(|row| row[idx].as_str())),
        })
        .collect::<Vec<_>>();

    let mut rows = raw_rows
        .iter()
        .map(|raw| {
            raw.iter()
                .zip(&columns)
                .map(|(value, column)| parse_cell(value, column.kind))
                .collect::<Row>()
        })
        .collect::<Vec<_>>();

    if let Some(date_idx) = headers.iter().position(|h| h == ORDER_DATE_COLUMN) {
        let mut unparsed = 0usize;
        for (row, raw) in rows.iter_mut().zip(&raw_rows) {
            let value = raw[date_idx].as_str();
            row[date_idx] = if is_missing_token(value) {
                None
            } else {
                match parse_order_datetime(value) {
                    Ok(parsed) => Some(Value::DateTime(parsed)),
                    Err(err) => {
                        debug!("{err}");
                        unparsed += 1;
                        None
                    }
                }
            };
        }
        columns[date_idx].kind = ColumnKind::DateTime;
        if unparsed > 0 {
            warn!("{unparsed} {ORDER_DATE_COLUMN} value(s) could not be parsed and were treated as missing");
        }
    }

    info!(
        "Loaded {} row(s) across {} column(s) from {:?}",
        rows.len(),
        columns.len(),
        path
    );
    Ok(OrderTable::from_parts(path, encoding, columns, rows))
}

fn error_line(err: &csv::Error) -> u64 {
    err.position().map(|pos| pos.line()).unwrap_or(1)
}

/// Declared type of a column from every raw value it holds. A column with no
/// rows at all is text.
fn infer_kind<'a, I>(values: I) -> ColumnKind
where
    I: Iterator<Item = &'a str>,
{
    let mut seen = false;
    let mut any_missing = false;
    let mut all_integer = true;
    for value in values {
        seen = true;
        if is_missing_token(value) {
            any_missing = true;
            continue;
        }
        let trimmed = value.trim();
        if trimmed.parse::<i64>().is_ok() {
            continue;
        }
        all_integer = false;
        if trimmed.parse::<f64>().is_err() {
            return ColumnKind::Text;
        }
    }
    if !seen {
        ColumnKind::Text
    } else if all_integer && !any_missing {
        ColumnKind::Integer
    } else {
        ColumnKind::Float
    }
}

fn parse_cell(value: &str, kind: ColumnKind) -> Option<Value> {
    if is_missing_token(value) {
        return None;
    }
    let trimmed = value.trim();
    match kind {
        ColumnKind::Integer => trimmed.parse().ok().map(Value::Integer),
        ColumnKind::Float => trimmed.parse().ok().map(Value::Float),
        ColumnKind::Text | ColumnKind::DateTime => Some(Value::Text(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn parse(text: &str) -> OrderTable {
        parse_text(Path::new("orders.csv"), text, b',', SourceEncoding::Utf8)
            .expect("parse")
    }

    #[test]
    fn headers_are_normalized() {
        let table = parse("Order Date,Sales, Ship Mode \n2024-01-15,100,First\n");
        assert_eq!(table.headers(), vec!["order_date", "sales", "ship_mode"]);
    }

    #[test]
    fn kinds_follow_full_column_scan() {
        let table = parse("a,b,c,d,e\n1,1.5,x,1,\n2,2,3,,\n");
        let kinds = table.columns().iter().map(|c| c.kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Integer,
                ColumnKind::Float,
                ColumnKind::Text,
                ColumnKind::Float,
                ColumnKind::Float,
            ]
        );
        assert_eq!(table.row(1).unwrap()[3], None);
    }

    #[test]
    fn unparseable_order_dates_become_missing() {
        let table = parse("order_date,sales\n2024-01-15,1\nnot a date,2\n,3\n");
        let idx = table.column_index(ORDER_DATE_COLUMN).unwrap();
        assert_eq!(table.columns()[idx].kind, ColumnKind::DateTime);
        assert_eq!(
            table.row(0).unwrap()[idx]
                .as_ref()
                .and_then(Value::as_datetime)
                .map(|dt| dt.date()),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert_eq!(table.row(1).unwrap()[idx], None);
        assert_eq!(table.row(2).unwrap()[idx], None);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn header_only_columns_are_text() {
        let table = parse("Sales,Category,Order Date\n");
        assert!(table.is_empty());
        let kinds = table.columns().iter().map(|c| c.kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![ColumnKind::Text, ColumnKind::Text, ColumnKind::DateTime]
        );
    }

    #[test]
    fn ragged_rows_are_malformed() {
        let err = parse_text(
            Path::new("x.csv"),
            "a,b\n1,2\n3\n",
            b',',
            SourceEncoding::Utf8,
        )
        .unwrap_err();
        match err {
            DataLoadError::Malformed { line, .. } => assert_eq!(line, 3),
            other => panic!("expected malformed error, got {other:?}"),
        }
    }

    #[test]
    fn empty_input_is_malformed() {
        let err = parse_text(Path::new("x.csv"), "", b',', SourceEncoding::Utf8).unwrap_err();
        assert!(matches!(err, DataLoadError::Malformed { .. }));
    }

    #[test]
    fn numeric_values_skip_missing_cells() {
        let table = parse("sales\n10\nNA\n2.5\n");
        let values = table.numeric_values("sales").collect::<Vec<_>>();
        assert_eq!(values, vec![10.0, 2.5]);
        assert_eq!(table.numeric_values("absent").count(), 0);
    }

    #[test]
    fn head_clamps_to_length() {
        let table = parse("a\n1\n2\n");
        assert_eq!(table.head(100).len(), 2);
        assert_eq!(table.head(1).len(), 1);
    }
}
