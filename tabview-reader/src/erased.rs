//! Object-safe view of a [`RowReaderFactory`].
//!
//! Engines are written once for every target type, so they cannot name
//! `F::Target`. [`erase`] wraps a typed factory into an
//! [`ErasedRowReaderFactory`] whose readers box each decoded value as
//! [`AnyValue`]. The [`TypeDescriptor`] reported next to it is what lets the
//! typed side downcast the values again.

use std::any::Any;
use std::sync::Arc;

use arrow::datatypes::SchemaRef;
use tabview_result::Result;
use tabview_types::TypeDescriptor;

use crate::factory::{RowReader, RowReaderFactory};
use crate::row::RowRef;

/// A decoded value with its static type erased.
pub type AnyValue = Box<dyn Any + Send>;

pub trait ErasedRowReader: Send + Sync {
    fn decode(&self, row: RowRef<'_>) -> Result<AnyValue>;
}

pub trait ErasedRowReaderFactory: Send + Sync {
    fn target_type(&self) -> TypeDescriptor;

    fn required_columns(&self) -> Vec<String>;

    fn new_reader(&self, schema: &SchemaRef) -> Result<Box<dyn ErasedRowReader>>;

    fn describe(&self) -> String;
}

struct ErasedFactory<F>(F);

struct ErasedReader<R>(R);

/// Erase the target type of `factory`.
pub fn erase<F>(factory: F) -> Arc<dyn ErasedRowReaderFactory>
where
    F: RowReaderFactory + 'static,
    F::Target: Send + 'static,
{
    Arc::new(ErasedFactory(factory))
}

impl<F> ErasedRowReaderFactory for ErasedFactory<F>
where
    F: RowReaderFactory,
    F::Target: Send + 'static,
{
    fn target_type(&self) -> TypeDescriptor {
        self.0.target_type()
    }

    fn required_columns(&self) -> Vec<String> {
        self.0.required_columns()
    }

    fn new_reader(&self, schema: &SchemaRef) -> Result<Box<dyn ErasedRowReader>> {
        Ok(Box::new(ErasedReader(self.0.new_reader(schema)?)))
    }

    fn describe(&self) -> String {
        self.0.describe()
    }
}

impl<R> ErasedRowReader for ErasedReader<R>
where
    R: RowReader,
    R::Target: Send + 'static,
{
    #[inline]
    fn decode(&self, row: RowRef<'_>) -> Result<AnyValue> {
        self.0.decode(row).map(|value| Box::new(value) as AnyValue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::column;
    use crate::key_value::KeyValueRowReaderFactory;
    use arrow::array::{Int32Array, RecordBatch, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};

    #[test]
    fn erased_values_downcast_to_reported_type() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("word", DataType::Utf8, false),
            Field::new("count", DataType::Int32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["foo"])),
                Arc::new(Int32Array::from(vec![20])),
            ],
        )
        .unwrap();

        let erased = erase(KeyValueRowReaderFactory::new(
            column::<String>("word"),
            column::<i32>("count"),
        ));
        assert!(erased.target_type().is::<(String, i32)>());
        assert_eq!(erased.required_columns(), vec!["word", "count"]);

        let reader = erased.new_reader(&schema).unwrap();
        let value = reader.decode(RowRef::new(&batch, 0)).unwrap();
        let pair = value.downcast::<(String, i32)>().unwrap();
        assert_eq!(*pair, ("foo".to_string(), 20));
    }

    #[test]
    fn erased_bind_keeps_schema_mismatch() {
        let schema = Arc::new(Schema::new(vec![Field::new("word", DataType::Utf8, false)]));
        let erased = erase(column::<i32>("count"));
        let err = erased.new_reader(&schema).err().unwrap();
        assert_eq!(err.missing_columns(), Some(vec!["count".to_string()]));
    }
}
