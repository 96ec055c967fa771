use std::fmt;
use std::marker::PhantomData;

use arrow::datatypes::SchemaRef;
use tabview_result::Result;
use tabview_types::TypeDescriptor;

use crate::factory::{RowReader, RowReaderFactory, require_columns};
use crate::row::{ColumnIndex, NamedRow, RowRef};

/// A domain record that can be built from a row.
///
/// ```
/// use tabview_reader::{FromRow, NamedRow};
/// use tabview_result::Result;
///
/// #[derive(Debug, PartialEq)]
/// struct WordCount {
///     word: String,
///     count: i32,
/// }
///
/// impl FromRow for WordCount {
///     const COLUMNS: &'static [&'static str] = &["word", "count"];
///
///     fn from_row(row: &NamedRow<'_>) -> Result<Self> {
///         Ok(WordCount {
///             word: row.get("word")?,
///             count: row.get("count")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized + Send + 'static {
    /// Columns `from_row` reads. Checked when the reader is bound.
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &NamedRow<'_>) -> Result<Self>;

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>()
    }
}

/// Factory that maps rows onto a [`FromRow`] record.
pub struct RecordReaderFactory<R> {
    _target: PhantomData<fn() -> R>,
}

pub fn record<R: FromRow>() -> RecordReaderFactory<R> {
    RecordReaderFactory::new()
}

impl<R: FromRow> RecordReaderFactory<R> {
    pub fn new() -> Self {
        Self {
            _target: PhantomData,
        }
    }
}

impl<R: FromRow> Default for RecordReaderFactory<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for RecordReaderFactory<R> {
    fn clone(&self) -> Self {
        Self {
            _target: PhantomData,
        }
    }
}

impl<R> fmt::Debug for RecordReaderFactory<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordReaderFactory")
            .field("target", &std::any::type_name::<R>())
            .finish()
    }
}

impl<R: FromRow> RowReaderFactory for RecordReaderFactory<R> {
    type Target = R;
    type Reader = RecordReader<R>;

    fn target_type(&self) -> TypeDescriptor {
        R::descriptor()
    }

    fn required_columns(&self) -> Vec<String> {
        R::COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn new_reader(&self, schema: &SchemaRef) -> Result<Self::Reader> {
        require_columns(schema, &self.required_columns(), || self.describe())?;
        Ok(RecordReader {
            columns: ColumnIndex::from_schema(schema),
            _target: PhantomData,
        })
    }

    fn describe(&self) -> String {
        format!("record {}", R::descriptor())
    }
}

pub struct RecordReader<R> {
    columns: ColumnIndex,
    _target: PhantomData<fn() -> R>,
}

impl<R: FromRow> RowReader for RecordReader<R> {
    type Target = R;

    fn decode(&self, row: RowRef<'_>) -> Result<R> {
        R::from_row(&NamedRow::new(row, &self.columns))
    }
}
