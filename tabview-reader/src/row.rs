use std::sync::Arc;

use arrow::array::{Array, ArrayRef, RecordBatch};
use arrow::datatypes::Schema;
use rustc_hash::FxHashMap;
use tabview_result::{Error, Result};

use crate::value::ColumnValue;

/// One raw row: a borrowed position inside an Arrow [`RecordBatch`].
///
/// `RowRef` is `Copy` and only hands out shared references, so a reader can
/// never mutate the row it decodes.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    batch: &'a RecordBatch,
    row: usize,
}

impl<'a> RowRef<'a> {
    /// Reference row `row` of `batch`.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds for `batch`. See
    /// [`try_new`](Self::try_new) for the checked form.
    pub fn new(batch: &'a RecordBatch, row: usize) -> Self {
        assert!(
            row < batch.num_rows(),
            "row {row} out of bounds for batch of {} rows",
            batch.num_rows()
        );
        Self { batch, row }
    }

    /// Reference row `row` of `batch`, failing if it is out of bounds.
    pub fn try_new(batch: &'a RecordBatch, row: usize) -> Result<Self> {
        if row >= batch.num_rows() {
            return Err(Error::InvalidArgumentError(format!(
                "row {row} out of bounds for batch of {} rows",
                batch.num_rows()
            )));
        }
        Ok(Self { batch, row })
    }

    pub fn batch(&self) -> &'a RecordBatch {
        self.batch
    }

    /// Position of this row inside its batch.
    pub fn index(&self) -> usize {
        self.row
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn column(&self, idx: usize) -> &'a ArrayRef {
        self.batch.column(idx)
    }

    pub fn is_null(&self, idx: usize) -> bool {
        self.batch.column(idx).is_null(self.row)
    }

    /// Decode the cell at column position `idx` as `T`, reporting failures
    /// against `column_name`.
    pub fn get_at<T: ColumnValue>(&self, idx: usize, column_name: &str) -> Result<T> {
        T::from_array(self.batch.column(idx).as_ref(), self.row)
            .map_err(|cause| Error::decode(column_name, T::descriptor().short_name(), cause))
    }
}

/// Column name to position lookup resolved once per bound schema.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    positions: Arc<FxHashMap<String, usize>>,
}

impl ColumnIndex {
    pub fn from_schema(schema: &Schema) -> Self {
        let positions: FxHashMap<String, usize> = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(idx, field)| (field.name().clone(), idx))
            .collect();
        Self {
            positions: Arc::new(positions),
        }
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Row accessor that resolves columns by name.
///
/// Handed to [`FromRow::from_row`](crate::FromRow::from_row); lookups go
/// through the [`ColumnIndex`] built when the reader was bound, so no schema
/// scan happens per row.
#[derive(Debug, Clone, Copy)]
pub struct NamedRow<'a> {
    row: RowRef<'a>,
    columns: &'a ColumnIndex,
}

impl<'a> NamedRow<'a> {
    pub fn new(row: RowRef<'a>, columns: &'a ColumnIndex) -> Self {
        Self { row, columns }
    }

    pub fn row(&self) -> RowRef<'a> {
        self.row
    }

    /// Decode `column` as `T`.
    pub fn get<T: ColumnValue>(&self, column: &str) -> Result<T> {
        let idx = self
            .columns
            .position(column)
            .ok_or_else(|| Error::SchemaMismatch {
                missing: vec![column.to_string()],
                required_by: "named row accessor".to_string(),
            })?;
        self.row.get_at(idx, column)
    }

    pub fn is_null(&self, column: &str) -> bool {
        self.columns
            .position(column)
            .is_some_and(|idx| self.row.is_null(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, StringArray};
    use arrow::datatypes::{DataType, Field};

    fn batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("word", DataType::Utf8, false),
            Field::new("count", DataType::Int32, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["foo", "bar"])),
                Arc::new(Int32Array::from(vec![Some(20), None])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn named_row_resolves_columns() {
        let batch = batch();
        let index = ColumnIndex::from_schema(&batch.schema());
        let row = NamedRow::new(RowRef::new(&batch, 0), &index);
        assert_eq!(row.get::<String>("word").unwrap(), "foo");
        assert_eq!(row.get::<i32>("count").unwrap(), 20);
    }

    #[test]
    fn unknown_column_is_a_schema_mismatch() {
        let batch = batch();
        let index = ColumnIndex::from_schema(&batch.schema());
        let row = NamedRow::new(RowRef::new(&batch, 0), &index);
        let err = row.get::<i64>("missing").unwrap_err();
        assert_eq!(err.missing_columns(), Some(vec!["missing".to_string()]));
    }

    #[test]
    fn null_cell_is_reported_against_column() {
        let batch = batch();
        let index = ColumnIndex::from_schema(&batch.schema());
        let row = NamedRow::new(RowRef::new(&batch, 1), &index);
        assert!(row.is_null("count"));
        assert_eq!(row.get::<Option<i32>>("count").unwrap(), None);
        let err = row.get::<i32>("count").unwrap_err();
        assert!(matches!(err, Error::Decode { ref column, .. } if column == "count"));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn row_ref_rejects_out_of_bounds() {
        let batch = batch();
        let _ = RowRef::new(&batch, 2);
    }

    #[test]
    fn checked_row_ref_reports_out_of_bounds() {
        let batch = batch();
        assert_eq!(RowRef::try_new(&batch, 1).unwrap().index(), 1);
        let err = RowRef::try_new(&batch, 2).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidArgumentError(ref msg) if msg.contains("out of bounds")
        ));
    }
}
