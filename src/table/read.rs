use std::{fs::File, io::Cursor, path::Path};

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader};
use polars::{io::mmap::MmapBytesReader, prelude::*};

use crate::{table::{Cell, Table}, PipelineError};

/// Supported input formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Spreadsheet,
}

impl TableFormat {
    /// Pick a format from a file name, case-insensitively.
    pub fn from_file_name(name: &str) -> Result<Self, PipelineError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" | "txt" => Ok(TableFormat::Csv),
            "tsv" => Ok(TableFormat::Tsv),
            "xls" | "xlsx" | "xlsm" | "ods" => Ok(TableFormat::Spreadsheet),
            _ => Err(PipelineError::InputFormat(format!(
                "unsupported file type {name:?}; upload a CSV, TSV, XLS or XLSX file"
            ))),
        }
    }

    #[inline]
    fn separator(self) -> u8 {
        match self { TableFormat::Tsv => b'\t', _ => b',' }
    }
}

/// Read a table from disk, dispatching on the file extension.
pub fn read_table(path: &Path) -> Result<Table, PipelineError> {
    let format = TableFormat::from_file_name(&path.to_string_lossy())?;
    tracing::debug!("[table] reading {} as {format:?}", path.display());

    match format {
        TableFormat::Spreadsheet => {
            let mut workbook = open_workbook_auto(path)
                .map_err(|e| unreadable(&path.display().to_string(), e))?;
            let range = workbook.worksheet_range_at(0)
                .ok_or_else(|| PipelineError::InputFormat(format!("{} has no worksheets", path.display())))?
                .map_err(|e| unreadable(&path.display().to_string(), e))?;
            Ok(table_from_range(&range))
        }
        delimited => {
            let file = File::open(path).map_err(|e| unreadable(&path.display().to_string(), e))?;
            let df = read_delimited(file, delimited.separator())
                .map_err(|e| unreadable(&path.display().to_string(), e))?;
            table_from_dataframe(&df).map_err(|e| unreadable(&path.display().to_string(), e))
        }
    }
}

/// Read a table from an uploaded byte buffer; `name` only selects the format.
pub fn read_table_from_bytes(name: &str, bytes: Vec<u8>) -> Result<Table, PipelineError> {
    match TableFormat::from_file_name(name)? {
        TableFormat::Spreadsheet => {
            let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
                .map_err(|e| unreadable(name, e))?;
            let range = workbook.worksheet_range_at(0)
                .ok_or_else(|| PipelineError::InputFormat(format!("{name} has no worksheets")))?
                .map_err(|e| unreadable(name, e))?;
            Ok(table_from_range(&range))
        }
        delimited => {
            let df = read_delimited(Cursor::new(bytes), delimited.separator())
                .map_err(|e| unreadable(name, e))?;
            table_from_dataframe(&df).map_err(|e| unreadable(name, e))
        }
    }
}

fn unreadable(name: &str, err: impl std::fmt::Display) -> PipelineError {
    PipelineError::InputFormat(format!("could not read {name}: {err}"))
}

/// Parse delimited text with a header row into a DataFrame.
fn read_delimited<R: MmapBytesReader>(reader: R, separator: u8) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|options| options.with_separator(separator))
        .into_reader_with_file_handle(reader)
        .finish()
}

/// Convert a DataFrame to a Table, keeping numeric columns numeric.
fn table_from_dataframe(df: &DataFrame) -> PolarsResult<Table> {
    let headers = df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let mut rows = vec![Vec::with_capacity(df.width()); df.height()];
    for column in df.get_columns() {
        for (i, row) in rows.iter_mut().enumerate() {
            row.push(cell_from_any_value(column.get(i)?));
        }
    }

    Ok(Table::new(headers, rows))
}

fn cell_from_any_value(value: AnyValue<'_>) -> Cell {
    match value {
        AnyValue::Null => Cell::Empty,
        AnyValue::Boolean(b) => Cell::Bool(b),
        AnyValue::Float64(v) => Cell::Number(v),
        AnyValue::Float32(v) => Cell::Number(v as f64),
        AnyValue::Int64(v) => Cell::Number(v as f64),
        AnyValue::Int32(v) => Cell::Number(v as f64),
        AnyValue::UInt64(v) => Cell::Number(v as f64),
        AnyValue::UInt32(v) => Cell::Number(v as f64),
        AnyValue::String(s) => Cell::Text(s.to_string()),
        AnyValue::StringOwned(s) => Cell::Text(s.to_string()),
        other => Cell::Text(other.to_string()),
    }
}

/// Convert the first worksheet to a Table; the first row holds the headers.
fn table_from_range(range: &Range<Data>) -> Table {
    let mut rows = range.rows();
    let headers = rows.next()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .unwrap_or_default();

    let rows = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    Table::new(headers, rows)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Bool(b) => Cell::Bool(*b),
        Data::Float(v) => Cell::Number(*v),
        Data::Int(v) => Cell::Number(*v as f64),
        Data::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn unsupported_extensions_are_rejected() {
        for name in ["sites.json", "sites", "map.shp"] {
            assert!(matches!(TableFormat::from_file_name(name), Err(PipelineError::InputFormat(_))), "{name}");
        }
        assert_eq!(TableFormat::from_file_name("Sites.CSV").unwrap(), TableFormat::Csv);
        assert_eq!(TableFormat::from_file_name("sites.xlsx").unwrap(), TableFormat::Spreadsheet);
    }

    #[test]
    fn csv_keeps_numbers_and_text_apart() {
        let csv = "Site, Lat ,Lon\nA,9.9732,76.2821\nB,10.1,\"76°16'56\"\"E\"\n";
        let table = read_table_from_bytes("upload.csv", csv.as_bytes().to_vec()).unwrap();

        assert_eq!(table.headers(), ["Site", "Lat", "Lon"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][1], Cell::Number(9.9732));
        assert_eq!(table.rows()[1][2], Cell::Text("76°16'56\"E".into()));
    }

    #[test]
    fn tsv_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        writeln!(file, "name\tlatitude\tlongitude").unwrap();
        writeln!(file, "Kochi\t9.93\t76.26").unwrap();

        let table = read_table(file.path()).unwrap();
        assert_eq!(table.headers(), ["name", "latitude", "longitude"]);
        assert_eq!(table.rows()[0][0], Cell::Text("Kochi".into()));
        assert_eq!(table.rows()[0][2], Cell::Number(76.26));
    }

    #[test]
    fn garbage_spreadsheet_is_an_input_error() {
        let err = read_table_from_bytes("sites.xlsx", b"not a workbook".to_vec()).unwrap_err();
        assert!(matches!(err, PipelineError::InputFormat(_)));
    }
}
