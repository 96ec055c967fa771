use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tabview_engine::{EngineHandle, ErasedFilterFn, ErasedMapFn};
use tabview_reader::AnyValue;
use tabview_result::{Error, Result};
use tabview_types::TypeDescriptor;

use crate::pair::PairDatasetView;

/// Recover a `T` from an engine element.
///
/// Fails with a decode error on the whole element when the engine holds
/// something else, which only happens after an unchecked adaptation.
pub(crate) fn downcast<T: 'static>(value: AnyValue, expected: &TypeDescriptor) -> Result<T> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| element_mismatch(expected))
}

fn downcast_ref<'v, T: 'static>(
    value: &'v (dyn Any + Send),
    expected: &TypeDescriptor,
) -> Result<&'v T> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| element_mismatch(expected))
}

fn element_mismatch(expected: &TypeDescriptor) -> Error {
    Error::element_mismatch(
        expected.to_string(),
        "dataset element holds a different type",
    )
}

/// Typed facade over an engine dataset of `T`.
///
/// A view is an immutable description: transformations return new views and
/// nothing runs until an action (`collect`, `count`, `first`, ...) asks the
/// engine to scan. Views are cheap to clone and can be shared across
/// threads.
pub struct DistributedDatasetView<T> {
    handle: EngineHandle,
    element_type: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for DistributedDatasetView<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            element_type: self.element_type.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for DistributedDatasetView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributedDatasetView")
            .field("element_type", &self.element_type)
            .field("handle", &self.handle)
            .finish()
    }
}

impl<T: Send + 'static> DistributedDatasetView<T> {
    pub(crate) fn from_handle(handle: EngineHandle, element_type: TypeDescriptor) -> Self {
        Self {
            handle,
            element_type,
            _marker: PhantomData,
        }
    }

    pub fn element_type(&self) -> &TypeDescriptor {
        &self.element_type
    }

    /// The engine handle behind this view, for passing to engine APIs that
    /// take erased datasets.
    pub fn handle(&self) -> &EngineHandle {
        &self.handle
    }

    pub fn into_handle(self) -> EngineHandle {
        self.handle
    }

    pub fn num_partitions(&self) -> usize {
        self.handle.num_partitions()
    }

    /// Keep the elements for which `predicate` holds.
    pub fn filter<P>(&self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let expected = self.element_type.clone();
        let predicate: ErasedFilterFn = Arc::new(move |value: &(dyn Any + Send)| {
            downcast_ref::<T>(value, &expected).map(&predicate)
        });
        Self::from_handle(self.handle.filter(predicate), self.element_type.clone())
    }

    /// Transform every element. The new element type is `U` with no
    /// generic arguments; use [`map_with_type`](Self::map_with_type) to keep
    /// a richer descriptor.
    pub fn map<U, F>(&self, f: F) -> DistributedDatasetView<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.map_with_type(TypeDescriptor::of::<U>(), f)
    }

    /// Transform every element, recording `output_type` as the descriptor of
    /// the result.
    pub fn map_with_type<U, F>(
        &self,
        output_type: TypeDescriptor,
        f: F,
    ) -> DistributedDatasetView<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let expected = self.element_type.clone();
        let f: ErasedMapFn = Arc::new(move |value: AnyValue| -> Result<AnyValue> {
            let value = downcast::<T>(value, &expected)?;
            Ok(Box::new(f(value)))
        });
        DistributedDatasetView::from_handle(self.handle.map(output_type.clone(), f), output_type)
    }

    /// Pair every element with a key computed from it.
    pub fn key_by<K, F>(&self, f: F) -> PairDatasetView<K, T>
    where
        K: Send + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        let key_type = TypeDescriptor::of::<K>();
        let pair_type = TypeDescriptor::pair::<K, T>(key_type.clone(), self.element_type.clone());
        let pairs = self.map_with_type(pair_type, move |value: T| (f(&value), value));
        PairDatasetView::from_view(pairs, key_type, self.element_type.clone())
    }

    /// Stream the elements of one partition.
    pub fn iter_partition(
        &self,
        partition: usize,
    ) -> Result<impl Iterator<Item = Result<T>> + Send + '_> {
        let rows = self.handle.scan_partition(partition)?;
        let expected = &self.element_type;
        Ok(rows.map(move |item| item.and_then(|value| downcast::<T>(value, expected))))
    }

    /// Every element, in partition order. Fails on the first element error.
    pub fn collect(&self) -> Result<Vec<T>> {
        let partitions = self.handle.collect_partitions()?;
        let mut out = Vec::with_capacity(partitions.iter().map(Vec::len).sum());
        for value in partitions.into_iter().flatten() {
            out.push(downcast::<T>(value, &self.element_type)?);
        }
        Ok(out)
    }

    /// Every element's outcome, in partition order. Per-row failures do not
    /// stop the others from being decoded.
    pub fn collect_results(&self) -> Result<Vec<Result<T>>> {
        let partitions = self.handle.collect_partition_results()?;
        Ok(partitions
            .into_iter()
            .flatten()
            .map(|item| item.and_then(|value| downcast::<T>(value, &self.element_type)))
            .collect())
    }

    pub fn count(&self) -> Result<usize> {
        self.handle.count()
    }

    /// First element in partition order, scanning only as far as needed.
    pub fn first(&self) -> Result<Option<T>> {
        Ok(self.take(1)?.pop())
    }

    /// Up to `n` elements in partition order, scanning only as far as needed.
    pub fn take(&self, n: usize) -> Result<Vec<T>> {
        let mut out = Vec::with_capacity(n);
        if n == 0 {
            return Ok(out);
        }
        for partition in 0..self.num_partitions() {
            for item in self.iter_partition(partition)? {
                out.push(item?);
                if out.len() == n {
                    return Ok(out);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabview_engine::ErasedDataset;
    use tabview_engine::ErasedRowIter;

    /// Two partitions of `u32`s; `0` stands in for a row that fails.
    struct Numbers;

    impl ErasedDataset for Numbers {
        fn num_partitions(&self) -> usize {
            2
        }

        fn scan_partition(&self, partition: usize) -> Result<ErasedRowIter<'_>> {
            let values: &'static [u32] = if partition == 0 { &[1, 2, 3] } else { &[4, 0, 6] };
            Ok(Box::new(values.iter().map(|&v| {
                if v == 0 {
                    Err(Error::decode("n", "u32", "zero"))
                } else {
                    Ok(Box::new(v) as AnyValue)
                }
            })))
        }
    }

    fn numbers() -> DistributedDatasetView<u32> {
        let handle = EngineHandle::new(Arc::new(Numbers), TypeDescriptor::of::<u32>());
        DistributedDatasetView::from_handle(handle, TypeDescriptor::of::<u32>())
    }

    #[test]
    fn actions_respect_partition_order() {
        let view = numbers().filter(|n| *n != 0);
        assert_eq!(view.take(4).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(view.first().unwrap(), Some(1));
        assert!(view.take(0).unwrap().is_empty());
    }

    #[test]
    fn failing_rows_are_reported_not_dropped() {
        let view = numbers();
        assert!(view.collect().is_err());
        assert!(view.count().is_err());

        let results = view.collect_results().unwrap();
        assert_eq!(results.len(), 6);
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
        assert_eq!(results[5].as_ref().unwrap(), &6);
    }

    #[test]
    fn map_changes_element_type() {
        let strings = numbers().filter(|n| n % 2 == 1).map(|n| format!("#{n}"));
        assert!(strings.element_type().is::<String>());
        let first: Vec<String> = strings.iter_partition(0).unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(first, vec!["#1", "#3"]);
    }

    #[test]
    fn wrong_element_type_surfaces_on_read() {
        let handle = numbers().into_handle();
        let view: DistributedDatasetView<String> =
            DistributedDatasetView::from_handle(handle, TypeDescriptor::of::<String>());
        let err = view.first().unwrap_err();
        assert!(matches!(
            err,
            Error::Decode { ref column, ref expected, .. } if column == "*" && expected == "String"
        ));
    }
}
