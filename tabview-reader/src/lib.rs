//! Row reader factories.
//!
//! A [`RowReaderFactory`] is a capability with two operations: report the
//! [`TypeDescriptor`](tabview_types::TypeDescriptor) of what it produces, and,
//! given the schema of a bound dataset, build a [`RowReader`] that turns one
//! raw row into one value. Every decoding strategy in this crate is an
//! independent implementer of that interface:
//!
//! - [`ColumnReaderFactory`]: one column into any [`ColumnValue`]
//! - [`RecordReaderFactory`]: a set of columns into a [`FromRow`] record
//! - [`GenericRowReaderFactory`]: every column into a [`GenericRow`]
//! - [`KeyValueRowReaderFactory`]: two factories into a `(K, V)` pair
//! - [`TupleRowReaderFactory3`] / [`TupleRowReaderFactory4`]: wider tuples
//!
//! The [`erased`] module adapts any factory into the object-safe form an
//! engine consumes without knowing the target type.

pub mod column;
pub mod erased;
pub mod factory;
pub mod generic;
pub mod key_value;
pub mod record;
pub mod row;
pub mod tuple;
pub mod value;

pub use column::{ColumnReader, ColumnReaderFactory, column};
pub use erased::{AnyValue, ErasedRowReader, ErasedRowReaderFactory, erase};
pub use factory::{RowReader, RowReaderFactory, missing_columns, require_columns};
pub use generic::{GenericRow, GenericRowReader, GenericRowReaderFactory};
pub use key_value::{KeyValueRowReader, KeyValueRowReaderFactory};
pub use record::{FromRow, RecordReader, RecordReaderFactory, record};
pub use row::{ColumnIndex, NamedRow, RowRef};
pub use tuple::{TupleRowReader3, TupleRowReader4, TupleRowReaderFactory3, TupleRowReaderFactory4};
pub use value::{ColumnValue, ValueError};
