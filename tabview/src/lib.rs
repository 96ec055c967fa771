//! tabview: typed views over partitioned tabular datasets
//!
//! This crate is the entrypoint for the tabview workspace. It re-exports the
//! row reader factories, the typed views, and the engine boundary from the
//! underlying `tabview-*` crates.
//!
//! # Quick Start
//!
//! Register a table with the in-memory engine and read it as key/value
//! pairs:
//!
//! ```rust
//! use std::sync::Arc;
//! use arrow::array::{Int32Array, RecordBatch, StringArray};
//! use arrow::datatypes::{DataType, Field, Schema};
//! use tabview::{DatasetViewBuilder, MemEngine, TableLocation, column};
//!
//! let schema = Arc::new(Schema::new(vec![
//!     Field::new("word", DataType::Utf8, false),
//!     Field::new("count", DataType::Int32, false),
//! ]));
//! let batch = RecordBatch::try_new(
//!     schema.clone(),
//!     vec![
//!         Arc::new(StringArray::from(vec!["foo"])),
//!         Arc::new(Int32Array::from(vec![20])),
//!     ],
//! )
//! .unwrap();
//!
//! let engine = MemEngine::new();
//! engine.register_table(("test", "words"), schema, vec![batch]).unwrap();
//!
//! let views = DatasetViewBuilder::new(engine);
//! let pairs = views
//!     .open_pair_view(
//!         TableLocation::new("test", "words"),
//!         column::<String>("word"),
//!         column::<i32>("count"),
//!     )
//!     .unwrap();
//! assert_eq!(pairs.collect().unwrap(), vec![("foo".to_string(), 20)]);
//! ```
//!
//! # Architecture
//!
//! - **Types** (`tabview-types`): [`TypeDescriptor`], [`TableLocation`], [`Side`].
//! - **Readers** (`tabview-reader`): the [`RowReaderFactory`] capability, its
//!   column, record, generic-row, key/value and tuple implementations, and
//!   the erased form engines consume.
//! - **Engine** (`tabview-engine`): the [`DatasetEngine`] boundary, erased
//!   [`EngineHandle`]s, and the in-memory [`MemEngine`].
//! - **Views** (`tabview-view`): [`DatasetViewBuilder`] and the typed
//!   [`DistributedDatasetView`] / [`PairDatasetView`] facades.
//! - **Errors** (`tabview-result`): the shared [`Error`] and [`Result`].

pub use tabview_result::{Error, Result};
pub use tabview_types::{Side, TableLocation, TypeDescriptor};

pub use tabview_reader::{
    ColumnReaderFactory, ColumnValue, FromRow, GenericRow, GenericRowReaderFactory,
    KeyValueRowReaderFactory, NamedRow, RecordReaderFactory, RowReader, RowReaderFactory, RowRef,
    TupleRowReaderFactory3, TupleRowReaderFactory4, column, record,
};

pub use tabview_view::{DatasetViewBuilder, DistributedDatasetView, PairDatasetView};

pub mod engine {
    //! Engine boundary and the in-memory engine.

    pub use tabview_engine::{
        CsvReadOptions, DatasetEngine, EngineHandle, ErasedDataset, ErasedRowIter, MemEngine,
        MemEngineConfig, RowErrorPolicy, ScanOptions,
    };
}

pub use engine::{DatasetEngine, EngineHandle, MemEngine, ScanOptions};

pub mod erased {
    //! Object-safe factory and reader forms.

    pub use tabview_reader::{AnyValue, ErasedRowReader, ErasedRowReaderFactory, erase};
}
