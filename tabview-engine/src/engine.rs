use std::sync::Arc;

use tabview_reader::ErasedRowReaderFactory;
use tabview_result::Result;
use tabview_types::{TableLocation, TypeDescriptor};

use crate::handle::EngineHandle;

/// Options pushed down to the engine when a dataset is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Restrict the bound schema to these columns, in this order. The
    /// factory's requirements are checked against the projected schema.
    pub columns: Option<Vec<String>>,
}

impl ScanOptions {
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: Some(columns.into_iter().map(Into::into).collect()),
        }
    }
}

/// Distributed tabular dataset engine.
///
/// `open` resolves `location`, binds a reader from `factory` against the
/// location's schema, and returns a handle that decodes rows lazily.
/// Implementations report a missing location as
/// [`Error::SourceNotFound`](tabview_result::Error::SourceNotFound) and
/// propagate the factory's
/// [`Error::SchemaMismatch`](tabview_result::Error::SchemaMismatch) from the
/// bind.
pub trait DatasetEngine: Send + Sync {
    fn open(
        &self,
        location: &TableLocation,
        element_type: &TypeDescriptor,
        factory: Arc<dyn ErasedRowReaderFactory>,
        options: &ScanOptions,
    ) -> Result<EngineHandle>;
}

impl<E: DatasetEngine + ?Sized> DatasetEngine for Arc<E> {
    fn open(
        &self,
        location: &TableLocation,
        element_type: &TypeDescriptor,
        factory: Arc<dyn ErasedRowReaderFactory>,
        options: &ScanOptions,
    ) -> Result<EngineHandle> {
        (**self).open(location, element_type, factory, options)
    }
}
