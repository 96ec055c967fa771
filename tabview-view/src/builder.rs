use tabview_engine::{DatasetEngine, EngineHandle, ScanOptions};
use tabview_reader::{
    GenericRow, GenericRowReaderFactory, KeyValueRowReaderFactory, RowReaderFactory, erase,
};
use tabview_result::{Error, Result};
use tabview_types::{TableLocation, TypeDescriptor};

use crate::pair::PairDatasetView;
use crate::view::DistributedDatasetView;

/// Entry point for typed views over an engine's datasets.
///
/// Opening a view is one synchronous step: take the factory's target
/// descriptor, ask the engine for a handle bound to the factory, and wrap
/// the handle. Rows are decoded later, when an action scans the view.
///
/// ```
/// use std::sync::Arc;
/// use arrow::array::{Int32Array, RecordBatch, StringArray};
/// use arrow::datatypes::{DataType, Field, Schema};
/// use tabview_engine::MemEngine;
/// use tabview_reader::column;
/// use tabview_types::TableLocation;
/// use tabview_view::DatasetViewBuilder;
///
/// let schema = Arc::new(Schema::new(vec![
///     Field::new("word", DataType::Utf8, false),
///     Field::new("count", DataType::Int32, false),
/// ]));
/// let batch = RecordBatch::try_new(
///     schema.clone(),
///     vec![
///         Arc::new(StringArray::from(vec!["foo", "bar"])),
///         Arc::new(Int32Array::from(vec![20, 3])),
///     ],
/// )
/// .unwrap();
///
/// let engine = MemEngine::new();
/// engine.register_table(("test", "words"), schema, vec![batch]).unwrap();
///
/// let builder = DatasetViewBuilder::new(engine);
/// let counts = builder
///     .open_pair_view(
///         TableLocation::new("test", "words"),
///         column::<String>("word"),
///         column::<i32>("count"),
///     )
///     .unwrap();
/// assert_eq!(counts.lookup(&"foo".to_string()).unwrap(), vec![20]);
/// ```
#[derive(Debug, Clone)]
pub struct DatasetViewBuilder<E> {
    engine: E,
}

impl<E: DatasetEngine> DatasetViewBuilder<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Open `location` with every column decoded into a [`GenericRow`].
    pub fn open_table(
        &self,
        location: impl Into<TableLocation>,
    ) -> Result<DistributedDatasetView<GenericRow>> {
        self.open_view(location, GenericRowReaderFactory)
    }

    /// Open `location` as a view of whatever `factory` produces.
    ///
    /// Fails with [`Error::SourceNotFound`] when the engine has no such
    /// location and with [`Error::SchemaMismatch`] when the factory's
    /// columns are absent. Both come from the engine unchanged.
    pub fn open_view<F>(
        &self,
        location: impl Into<TableLocation>,
        factory: F,
    ) -> Result<DistributedDatasetView<F::Target>>
    where
        F: RowReaderFactory + 'static,
        F::Target: Send + 'static,
    {
        self.open_view_with(location, factory, &ScanOptions::default())
    }

    /// [`open_view`](Self::open_view) with scan options pushed to the engine.
    pub fn open_view_with<F>(
        &self,
        location: impl Into<TableLocation>,
        factory: F,
        options: &ScanOptions,
    ) -> Result<DistributedDatasetView<F::Target>>
    where
        F: RowReaderFactory + 'static,
        F::Target: Send + 'static,
    {
        let location = location.into();
        let element_type = factory.target_type();
        tracing::debug!(
            table = %location,
            element_type = %element_type,
            reader = %factory.describe(),
            "opening dataset view"
        );
        let handle = self
            .engine
            .open(&location, &element_type, erase(factory), options)?;
        Ok(DistributedDatasetView::from_handle(handle, element_type))
    }

    /// Open `location` as `(K, V)` pairs decoded from the same row by
    /// `key` and `value`.
    pub fn open_pair_view<KF, VF>(
        &self,
        location: impl Into<TableLocation>,
        key: KF,
        value: VF,
    ) -> Result<PairDatasetView<KF::Target, VF::Target>>
    where
        KF: RowReaderFactory + 'static,
        VF: RowReaderFactory + 'static,
        KF::Target: Send + 'static,
        VF::Target: Send + 'static,
    {
        self.open_pair_view_with(location, key, value, &ScanOptions::default())
    }

    pub fn open_pair_view_with<KF, VF>(
        &self,
        location: impl Into<TableLocation>,
        key: KF,
        value: VF,
        options: &ScanOptions,
    ) -> Result<PairDatasetView<KF::Target, VF::Target>>
    where
        KF: RowReaderFactory + 'static,
        VF: RowReaderFactory + 'static,
        KF::Target: Send + 'static,
        VF::Target: Send + 'static,
    {
        let key_type = key.target_type();
        let value_type = value.target_type();
        let factory = KeyValueRowReaderFactory::new(key, value);
        let view = self.open_view_with(location, factory, options)?;
        Ok(PairDatasetView::from_view(view, key_type, value_type))
    }

    /// Relabel an open handle as a view of `T`.
    ///
    /// Nothing is checked: if the handle does not actually hold `T`, reads
    /// fail with [`Error::Decode`] on column `*`. Use
    /// [`try_adapt_view`](Self::try_adapt_view) to compare against the
    /// element type the engine recorded.
    pub fn adapt_view<T: Send + 'static>(
        &self,
        handle: EngineHandle,
        element_type: TypeDescriptor,
    ) -> DistributedDatasetView<T> {
        tracing::debug!(
            element_type = %element_type,
            recorded = %handle.element_type(),
            "adapting engine handle"
        );
        DistributedDatasetView::from_handle(handle, element_type)
    }

    /// Relabel an open handle as a view of `(K, V)` pairs. Unchecked, like
    /// [`adapt_view`](Self::adapt_view).
    pub fn adapt_pair_view<K, V>(
        &self,
        handle: EngineHandle,
        key_type: TypeDescriptor,
        value_type: TypeDescriptor,
    ) -> PairDatasetView<K, V>
    where
        K: Send + 'static,
        V: Send + 'static,
    {
        let pair_type = TypeDescriptor::pair::<K, V>(key_type.clone(), value_type.clone());
        let view = self.adapt_view(handle, pair_type);
        PairDatasetView::from_view(view, key_type, value_type)
    }

    /// Like [`adapt_view`](Self::adapt_view), but fail up front unless
    /// `element_type` denotes `T` and equals the handle's recorded type.
    pub fn try_adapt_view<T: Send + 'static>(
        &self,
        handle: EngineHandle,
        element_type: TypeDescriptor,
    ) -> Result<DistributedDatasetView<T>> {
        check_adaptation::<T>(&handle, &element_type)?;
        Ok(self.adapt_view(handle, element_type))
    }

    pub fn try_adapt_pair_view<K, V>(
        &self,
        handle: EngineHandle,
        key_type: TypeDescriptor,
        value_type: TypeDescriptor,
    ) -> Result<PairDatasetView<K, V>>
    where
        K: Send + 'static,
        V: Send + 'static,
    {
        check_denotes::<K>(&key_type)?;
        check_denotes::<V>(&value_type)?;
        let pair_type = TypeDescriptor::pair::<K, V>(key_type.clone(), value_type.clone());
        check_adaptation::<(K, V)>(&handle, &pair_type)?;
        let view = self.adapt_view(handle, pair_type);
        Ok(PairDatasetView::from_view(view, key_type, value_type))
    }
}

fn check_denotes<T: 'static>(descriptor: &TypeDescriptor) -> Result<()> {
    if descriptor.is::<T>() {
        return Ok(());
    }
    Err(Error::element_mismatch(
        descriptor.name(),
        format!("descriptor does not denote {}", std::any::type_name::<T>()),
    ))
}

/// Error messages use full type names: distinct types may share a short one.
fn check_adaptation<T: 'static>(
    handle: &EngineHandle,
    element_type: &TypeDescriptor,
) -> Result<()> {
    check_denotes::<T>(element_type)?;
    let held = handle.element_type();
    if held != element_type {
        return Err(Error::element_mismatch(
            element_type.name(),
            format!("handle holds {}", held.name()),
        ));
    }
    Ok(())
}
