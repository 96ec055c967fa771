//! Typed views over engine datasets.
//!
//! [`DatasetViewBuilder`] binds a row reader factory to a table through a
//! [`DatasetEngine`](tabview_engine::DatasetEngine) and wraps the erased
//! handle it gets back into a [`DistributedDatasetView`] or
//! [`PairDatasetView`]. Views are lazy; actions hand the work to the engine,
//! which scans partitions in parallel.

pub mod builder;
pub mod pair;
pub mod view;

pub use builder::DatasetViewBuilder;
pub use pair::PairDatasetView;
pub use view::DistributedDatasetView;
