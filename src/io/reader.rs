//! Upload ingestion: spreadsheet, delimited text and Parquet into a `RawTable`.

use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use bytes::Bytes;
use calamine::{Data, Reader, Xlsx};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::io::Cursor;
use std::path::Path;

use super::table::{Cell, RawTable};
use crate::error::FunnelError;

/// File formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Xlsx,
    Csv,
    Tsv,
    Parquet,
}

impl UploadFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Result<Self, FunnelError> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" | "xlsm" => Ok(UploadFormat::Xlsx),
            "csv" | "txt" => Ok(UploadFormat::Csv),
            "tsv" => Ok(UploadFormat::Tsv),
            "parquet" | "pq" => Ok(UploadFormat::Parquet),
            other => Err(FunnelError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Detect the format from a file path.
    pub fn from_path(path: &Path) -> Result<Self, FunnelError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }
}

/// One uploaded file: its display name, detected format and raw bytes.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub format: UploadFormat,
    pub bytes: Bytes,
}

impl Upload {
    /// Read an upload from the local filesystem.
    pub fn from_path(path: &Path) -> Result<Self, FunnelError> {
        let format = UploadFormat::from_path(path)?;
        let bytes = Bytes::from(std::fs::read(path)?);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, format, bytes })
    }

    /// Parse the upload into a table.
    pub fn read_table(&self) -> Result<RawTable, FunnelError> {
        let table = read_table(self.bytes.clone(), self.format)?;
        tracing::info!(
            "Loaded {} rows x {} columns from {}",
            table.len(),
            table.headers().len(),
            self.name
        );
        Ok(table)
    }
}

/// Parse raw bytes of the given format into a table.
pub fn read_table(bytes: Bytes, format: UploadFormat) -> Result<RawTable, FunnelError> {
    match format {
        UploadFormat::Xlsx => read_xlsx(bytes),
        UploadFormat::Csv => read_delimited(bytes, b','),
        UploadFormat::Tsv => read_delimited(bytes, b'\t'),
        UploadFormat::Parquet => read_parquet(bytes),
    }
}

/// Convenience wrapper: read and parse a file in one step.
pub fn load_table(path: &Path) -> Result<RawTable, FunnelError> {
    Upload::from_path(path)?.read_table()
}

/// Read the first worksheet; its first row is the header.
///
/// The header is sheet row 1 and the first column is sheet column A, even when
/// the used range starts further in. A blank first row gives blank headers.
fn read_xlsx(bytes: Bytes) -> Result<RawTable, FunnelError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(FunnelError::EmptyWorkbook)??;

    let (last_row, last_col) = range.end().ok_or(FunnelError::MissingHeader)?;
    let cell_at = |row: u32, col: u32| match range.get_value((row, col)) {
        Some(data) => spreadsheet_cell(data),
        None => Cell::Empty,
    };

    let headers: Vec<String> = (0..=last_col).map(|col| cell_at(0, col).to_text()).collect();
    let data: Vec<Vec<Cell>> = (1..=last_row)
        .map(|row| (0..=last_col).map(|col| cell_at(row, col)).collect())
        .collect();

    Ok(RawTable::new(headers, data))
}

fn spreadsheet_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Bool(b) => Cell::Bool(*b),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::String(s) => Cell::text(s.as_str()),
        other => Cell::text(other.to_string()),
    }
}

/// Read CSV/TSV with a header row.
///
/// Types are inferred per column: a column whose non-empty values all parse as
/// integers becomes `Int`, else as floats becomes `Float`, otherwise `Text`.
fn read_delimited(bytes: Bytes, delimiter: u8) -> Result<RawTable, FunnelError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes.as_ref());

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() {
        return Err(FunnelError::MissingHeader);
    }

    let n_cols = headers.len();
    let mut columns: Vec<Vec<String>> = vec![Vec::new(); n_cols];
    for result in rdr.records() {
        let record = result?;
        for (j, column) in columns.iter_mut().enumerate() {
            column.push(record.get(j).unwrap_or("").to_string());
        }
    }

    let typed: Vec<Vec<Cell>> = columns.into_iter().map(infer_column).collect();
    let n_rows = typed.first().map_or(0, |c| c.len());
    let rows = (0..n_rows)
        .map(|i| typed.iter().map(|col| col[i].clone()).collect())
        .collect();

    Ok(RawTable::new(headers, rows))
}

fn infer_column(values: Vec<String>) -> Vec<Cell> {
    let non_empty = || values.iter().filter(|s| !s.is_empty());
    let has_values = non_empty().next().is_some();
    let all_int = has_values && non_empty().all(|s| s.parse::<i64>().is_ok());
    let all_float = has_values && non_empty().all(|s| s.parse::<f64>().is_ok());

    values
        .iter()
        .map(|s| {
            if s.is_empty() {
                Cell::Empty
            } else if all_int {
                s.parse::<i64>().map(Cell::Int).unwrap_or(Cell::Empty)
            } else if all_float {
                s.parse::<f64>().map(Cell::Float).unwrap_or(Cell::Empty)
            } else {
                Cell::Text(s.clone())
            }
        })
        .collect()
}

/// Read every record batch of a Parquet file.
fn read_parquet(bytes: Bytes) -> Result<RawTable, FunnelError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let columns = batch
            .columns()
            .iter()
            .map(column_cells)
            .collect::<Result<Vec<_>, _>>()?;
        for i in 0..batch.num_rows() {
            rows.push(columns.iter().map(|col| col[i].clone()).collect());
        }
    }

    Ok(RawTable::new(headers, rows))
}

/// Convert one Arrow column to cells, normalizing numeric widths.
fn column_cells(array: &ArrayRef) -> Result<Vec<Cell>, FunnelError> {
    let cell_at = |i: usize, f: &dyn Fn(usize) -> Cell| {
        if array.is_null(i) {
            Cell::Empty
        } else {
            f(i)
        }
    };

    let cells = match array.data_type() {
        DataType::Boolean => {
            let arr = array.as_any().downcast_ref::<BooleanArray>();
            match arr {
                Some(arr) => (0..arr.len())
                    .map(|i| cell_at(i, &|i| Cell::Bool(arr.value(i))))
                    .collect(),
                None => display_cells(array)?,
            }
        }
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => {
            let cast = arrow::compute::cast(array.as_ref(), &DataType::Int64)?;
            match cast.as_any().downcast_ref::<Int64Array>() {
                Some(arr) => (0..arr.len())
                    .map(|i| cell_at(i, &|i| Cell::Int(arr.value(i))))
                    .collect(),
                None => display_cells(array)?,
            }
        }
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            let cast = arrow::compute::cast(array.as_ref(), &DataType::Float64)?;
            match cast.as_any().downcast_ref::<Float64Array>() {
                Some(arr) => (0..arr.len())
                    .map(|i| cell_at(i, &|i| Cell::Float(arr.value(i))))
                    .collect(),
                None => display_cells(array)?,
            }
        }
        DataType::Utf8 | DataType::LargeUtf8 => {
            let cast = arrow::compute::cast(array.as_ref(), &DataType::Utf8)?;
            match cast.as_any().downcast_ref::<StringArray>() {
                Some(arr) => (0..arr.len())
                    .map(|i| cell_at(i, &|i| Cell::text(arr.value(i))))
                    .collect(),
                None => display_cells(array)?,
            }
        }
        _ => display_cells(array)?,
    };

    Ok(cells)
}

fn display_cells(array: &ArrayRef) -> Result<Vec<Cell>, FunnelError> {
    (0..array.len())
        .map(|i| {
            if array.is_null(i) {
                Ok(Cell::Empty)
            } else {
                Ok(Cell::text(arrow::util::display::array_value_to_string(array, i)?))
            }
        })
        .collect()
}
