//! Engine boundary for tabview.
//!
//! The distributed execution engine is an external collaborator. This crate
//! fixes the interface tabview consumes from it and ships an in-memory
//! implementation used by tests and examples:
//!
//! - [`DatasetEngine`]: opens a dataset at a [`TableLocation`](tabview_types::TableLocation)
//!   given an erased row reader factory and the descriptor of its target type.
//! - [`EngineHandle`]: opaque, cheaply clonable handle over an
//!   [`ErasedDataset`] of partitioned, lazily decoded elements.
//! - [`MemEngine`]: catalog of Arrow record batches held in memory.

pub mod config;
pub mod engine;
pub mod handle;
pub mod mem_engine;

pub use config::{CsvReadOptions, MemEngineConfig, RowErrorPolicy};
pub use engine::{DatasetEngine, ScanOptions};
pub use handle::{EngineHandle, ErasedDataset, ErasedFilterFn, ErasedMapFn, ErasedRowIter};
pub use mem_engine::MemEngine;
