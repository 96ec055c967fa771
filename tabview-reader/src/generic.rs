use std::fmt;

use arrow::array::{Array, RecordBatch};
use arrow::datatypes::SchemaRef;
use arrow::util::display::array_value_to_string;
use tabview_result::{Error, Result};
use tabview_types::TypeDescriptor;

use crate::factory::{RowReader, RowReaderFactory};
use crate::row::RowRef;
use crate::value::ColumnValue;

/// Untyped row with every column of the source, addressable by name.
///
/// Backed by a one-row slice of the source batch, so building one shares
/// the column buffers instead of copying cell values.
#[derive(Clone, PartialEq)]
pub struct GenericRow {
    cells: RecordBatch,
}

impl GenericRow {
    fn from_row(row: RowRef<'_>) -> Self {
        Self {
            cells: row.batch().slice(row.index(), 1),
        }
    }

    pub fn schema(&self) -> SchemaRef {
        self.cells.schema()
    }

    pub fn len(&self) -> usize {
        self.cells.num_columns()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.num_columns() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.cells
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.schema().index_of(column).is_ok()
    }

    pub fn is_null(&self, column: &str) -> Result<bool> {
        let idx = self.position(column)?;
        Ok(RowRef::new(&self.cells, 0).is_null(idx))
    }

    /// Decode `column` as `T`.
    pub fn get<T: ColumnValue>(&self, column: &str) -> Result<T> {
        let idx = self.position(column)?;
        RowRef::new(&self.cells, 0).get_at(idx, column)
    }

    /// Decode the cell at column position `idx` as `T`.
    pub fn get_at<T: ColumnValue>(&self, idx: usize) -> Result<T> {
        if idx >= self.cells.num_columns() {
            return Err(Error::InvalidArgumentError(format!(
                "column index {idx} out of range for row of {} columns",
                self.cells.num_columns()
            )));
        }
        let schema = self.cells.schema();
        RowRef::new(&self.cells, 0).get_at(idx, schema.field(idx).name())
    }

    pub fn get_string(&self, column: &str) -> Result<String> {
        self.get(column)
    }

    pub fn get_i32(&self, column: &str) -> Result<i32> {
        self.get(column)
    }

    pub fn get_i64(&self, column: &str) -> Result<i64> {
        self.get(column)
    }

    pub fn get_f64(&self, column: &str) -> Result<f64> {
        self.get(column)
    }

    pub fn get_bool(&self, column: &str) -> Result<bool> {
        self.get(column)
    }

    fn position(&self, column: &str) -> Result<usize> {
        self.cells
            .schema()
            .index_of(column)
            .map_err(|_| Error::InvalidArgumentError(format!("row has no column '{column}'")))
    }
}

impl fmt::Debug for GenericRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for GenericRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let schema = self.cells.schema();
        f.write_str("GenericRow{")?;
        for (idx, field) in schema.fields().iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            let column = self.cells.column(idx);
            let cell = if column.is_null(0) {
                "null".to_string()
            } else {
                array_value_to_string(column.as_ref(), 0).map_err(|_| fmt::Error)?
            };
            write!(f, "{}: {}", field.name(), cell)?;
        }
        f.write_str("}")
    }
}

/// Decodes every column of a row into a [`GenericRow`].
///
/// Requires no columns, so it binds to any schema. This is the default
/// factory when a table is opened without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericRowReaderFactory;

impl RowReaderFactory for GenericRowReaderFactory {
    type Target = GenericRow;
    type Reader = GenericRowReader;

    fn target_type(&self) -> TypeDescriptor {
        TypeDescriptor::of::<GenericRow>()
    }

    fn required_columns(&self) -> Vec<String> {
        Vec::new()
    }

    fn new_reader(&self, _schema: &SchemaRef) -> Result<Self::Reader> {
        Ok(GenericRowReader)
    }

    fn describe(&self) -> String {
        "generic row reader".to_string()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GenericRowReader;

impl RowReader for GenericRowReader {
    type Target = GenericRow;

    fn decode(&self, row: RowRef<'_>) -> Result<GenericRow> {
        Ok(GenericRow::from_row(row))
    }
}
