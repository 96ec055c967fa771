use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use arrow::datatypes::SchemaRef;
use tabview_result::{Error, Result};
use tabview_types::TypeDescriptor;

use crate::factory::{RowReader, RowReaderFactory};
use crate::row::RowRef;
use crate::value::ColumnValue;

/// Decodes one named column into `T`.
pub struct ColumnReaderFactory<T> {
    column: Arc<str>,
    _target: PhantomData<fn() -> T>,
}

/// Factory that reads `name` as `T`.
///
/// ```
/// use tabview_reader::{RowReaderFactory, column};
///
/// let words = column::<String>("word");
/// assert_eq!(words.required_columns(), vec!["word".to_string()]);
/// assert!(words.target_type().is::<String>());
/// ```
pub fn column<T: ColumnValue>(name: impl Into<String>) -> ColumnReaderFactory<T> {
    ColumnReaderFactory::new(name)
}

impl<T: ColumnValue> ColumnReaderFactory<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            column: Arc::from(name.into()),
            _target: PhantomData,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }
}

impl<T> Clone for ColumnReaderFactory<T> {
    fn clone(&self) -> Self {
        Self {
            column: Arc::clone(&self.column),
            _target: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ColumnReaderFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnReaderFactory")
            .field("column", &self.column)
            .field("target", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: ColumnValue> RowReaderFactory for ColumnReaderFactory<T> {
    type Target = T;
    type Reader = ColumnReader<T>;

    fn target_type(&self) -> TypeDescriptor {
        T::descriptor()
    }

    fn required_columns(&self) -> Vec<String> {
        vec![self.column.to_string()]
    }

    fn new_reader(&self, schema: &SchemaRef) -> Result<Self::Reader> {
        let position = schema
            .index_of(&self.column)
            .map_err(|_| Error::SchemaMismatch {
                missing: vec![self.column.to_string()],
                required_by: self.describe(),
            })?;
        Ok(ColumnReader {
            column: Arc::clone(&self.column),
            position,
            _target: PhantomData,
        })
    }

    fn describe(&self) -> String {
        format!("column reader '{}' as {}", self.column, T::descriptor())
    }
}

/// Reader bound to one column position.
pub struct ColumnReader<T> {
    column: Arc<str>,
    position: usize,
    _target: PhantomData<fn() -> T>,
}

impl<T> ColumnReader<T> {
    pub fn position(&self) -> usize {
        self.position
    }
}

impl<T: ColumnValue> RowReader for ColumnReader<T> {
    type Target = T;

    #[inline]
    fn decode(&self, row: RowRef<'_>) -> Result<T> {
        row.get_at(self.position, &self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, RecordBatch, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};

    fn word_count_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("word", DataType::Utf8, false),
            Field::new("count", DataType::Int32, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["foo", "bar"])),
                Arc::new(Int32Array::from(vec![20, 7])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn reads_bound_column_by_position() {
        let batch = word_count_batch();
        let reader = column::<i64>("count").new_reader(&batch.schema()).unwrap();
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.decode(RowRef::new(&batch, 0)).unwrap(), 20);
        assert_eq!(reader.decode(RowRef::new(&batch, 1)).unwrap(), 7);
    }

    #[test]
    fn missing_column_fails_at_bind_time() {
        let batch = word_count_batch();
        let err = column::<String>("year")
            .new_reader(&batch.schema())
            .err()
            .expect("bind must fail");
        assert_eq!(err.missing_columns(), Some(vec!["year".to_string()]));
        assert!(err.to_string().contains("column reader 'year' as String"));
    }

    #[test]
    fn target_type_is_stable() {
        let factory = column::<Option<i32>>("count");
        assert_eq!(factory.target_type(), factory.target_type());
        assert_eq!(factory.target_type(), factory.clone().target_type());
    }
}
