use std::any::Any;
use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use tabview_reader::AnyValue;
use tabview_result::{Error, Result};
use tabview_types::{TableLocation, TypeDescriptor};

/// Per-partition stream of erased elements.
pub type ErasedRowIter<'a> = Box<dyn Iterator<Item = Result<AnyValue>> + Send + 'a>;

/// Element-wise transformation over erased values.
pub type ErasedMapFn = Arc<dyn Fn(AnyValue) -> Result<AnyValue> + Send + Sync>;

/// Element-wise predicate over erased values.
pub type ErasedFilterFn = Arc<dyn Fn(&(dyn Any + Send)) -> Result<bool> + Send + Sync>;

/// Partitioned, lazily evaluated dataset whose element type is erased.
///
/// Partitions are independent: an engine may scan them from several threads
/// at once.
pub trait ErasedDataset: Send + Sync {
    fn num_partitions(&self) -> usize;

    /// Stream the elements of `partition`. A failing element is yielded as
    /// `Err` without ending the stream.
    fn scan_partition(&self, partition: usize) -> Result<ErasedRowIter<'_>>;
}

/// Opaque reference to an engine dataset.
///
/// Cloning shares the underlying dataset. The handle records the element
/// type the engine was asked to produce, but values are only checked
/// against it when a typed view downcasts them.
#[derive(Clone)]
pub struct EngineHandle {
    dataset: Arc<dyn ErasedDataset>,
    element_type: TypeDescriptor,
    source: Option<TableLocation>,
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("element_type", &self.element_type)
            .field("source", &self.source)
            .field("partitions", &self.dataset.num_partitions())
            .finish()
    }
}

impl EngineHandle {
    pub fn new(dataset: Arc<dyn ErasedDataset>, element_type: TypeDescriptor) -> Self {
        Self {
            dataset,
            element_type,
            source: None,
        }
    }

    pub fn with_source(mut self, location: TableLocation) -> Self {
        self.source = Some(location);
        self
    }

    /// Element type the engine recorded when the handle was produced.
    pub fn element_type(&self) -> &TypeDescriptor {
        &self.element_type
    }

    /// Table the handle was opened on, if it came straight from an engine.
    pub fn source(&self) -> Option<&TableLocation> {
        self.source.as_ref()
    }

    pub fn num_partitions(&self) -> usize {
        self.dataset.num_partitions()
    }

    pub fn scan_partition(&self, partition: usize) -> Result<ErasedRowIter<'_>> {
        let partitions = self.dataset.num_partitions();
        if partition >= partitions {
            return Err(Error::InvalidArgumentError(format!(
                "partition {partition} out of range for dataset of {partitions} partitions"
            )));
        }
        self.dataset.scan_partition(partition)
    }

    /// Lazily apply `f` to every element; the result holds
    /// `output_type` values.
    pub fn map(&self, output_type: TypeDescriptor, f: ErasedMapFn) -> EngineHandle {
        EngineHandle {
            dataset: Arc::new(MappedDataset {
                parent: Arc::clone(&self.dataset),
                f,
            }),
            element_type: output_type,
            source: self.source.clone(),
        }
    }

    /// Lazily keep the elements `predicate` accepts.
    pub fn filter(&self, predicate: ErasedFilterFn) -> EngineHandle {
        EngineHandle {
            dataset: Arc::new(FilteredDataset {
                parent: Arc::clone(&self.dataset),
                predicate,
            }),
            element_type: self.element_type.clone(),
            source: self.source.clone(),
        }
    }

    /// Evaluate every partition in parallel, failing on the first element
    /// error. Partition order is preserved.
    pub fn collect_partitions(&self) -> Result<Vec<Vec<AnyValue>>> {
        (0..self.num_partitions())
            .into_par_iter()
            .map(|partition| self.scan_partition(partition)?.collect::<Result<Vec<_>>>())
            .collect()
    }

    /// Evaluate every partition in parallel, keeping each element's outcome.
    pub fn collect_partition_results(&self) -> Result<Vec<Vec<Result<AnyValue>>>> {
        (0..self.num_partitions())
            .into_par_iter()
            .map(|partition| -> Result<Vec<Result<AnyValue>>> {
                Ok(self.scan_partition(partition)?.collect())
            })
            .collect()
    }

    /// Number of elements, failing on the first element error.
    pub fn count(&self) -> Result<usize> {
        (0..self.num_partitions())
            .into_par_iter()
            .map(|partition| -> Result<usize> {
                let mut n = 0usize;
                for item in self.scan_partition(partition)? {
                    item?;
                    n += 1;
                }
                Ok(n)
            })
            .try_reduce(|| 0, |a, b| Ok(a + b))
    }
}

struct MappedDataset {
    parent: Arc<dyn ErasedDataset>,
    f: ErasedMapFn,
}

impl ErasedDataset for MappedDataset {
    fn num_partitions(&self) -> usize {
        self.parent.num_partitions()
    }

    fn scan_partition(&self, partition: usize) -> Result<ErasedRowIter<'_>> {
        let f = Arc::clone(&self.f);
        let rows = self.parent.scan_partition(partition)?;
        Ok(Box::new(rows.map(move |item| item.and_then(|value| f(value)))))
    }
}

struct FilteredDataset {
    parent: Arc<dyn ErasedDataset>,
    predicate: ErasedFilterFn,
}

impl ErasedDataset for FilteredDataset {
    fn num_partitions(&self) -> usize {
        self.parent.num_partitions()
    }

    fn scan_partition(&self, partition: usize) -> Result<ErasedRowIter<'_>> {
        let predicate = Arc::clone(&self.predicate);
        let rows = self.parent.scan_partition(partition)?;
        Ok(Box::new(rows.filter_map(move |item| match item {
            Ok(value) => match predicate(&*value) {
                Ok(true) => Some(Ok(value)),
                Ok(false) => None,
                Err(err) => Some(Err(err)),
            },
            Err(err) => Some(Err(err)),
        })))
    }
}
