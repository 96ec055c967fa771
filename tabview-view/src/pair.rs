use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap;
use tabview_engine::EngineHandle;
use tabview_result::Result;
use tabview_types::TypeDescriptor;

use crate::view::DistributedDatasetView;

/// Typed facade over an engine dataset of `(K, V)` pairs.
///
/// Wraps a [`DistributedDatasetView`] of tuples and keeps the key and value
/// descriptors apart, so pair operations can report each side's type
/// without unpacking the pair descriptor.
pub struct PairDatasetView<K, V> {
    view: DistributedDatasetView<(K, V)>,
    key_type: TypeDescriptor,
    value_type: TypeDescriptor,
}

impl<K, V> Clone for PairDatasetView<K, V> {
    fn clone(&self) -> Self {
        Self {
            view: self.view.clone(),
            key_type: self.key_type.clone(),
            value_type: self.value_type.clone(),
        }
    }
}

impl<K, V> fmt::Debug for PairDatasetView<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairDatasetView")
            .field("key_type", &self.key_type)
            .field("value_type", &self.value_type)
            .field("view", &self.view)
            .finish()
    }
}

impl<K, V> PairDatasetView<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    pub(crate) fn from_view(
        view: DistributedDatasetView<(K, V)>,
        key_type: TypeDescriptor,
        value_type: TypeDescriptor,
    ) -> Self {
        Self {
            view,
            key_type,
            value_type,
        }
    }

    pub fn key_type(&self) -> &TypeDescriptor {
        &self.key_type
    }

    pub fn value_type(&self) -> &TypeDescriptor {
        &self.value_type
    }

    /// Descriptor of the `(K, V)` element.
    pub fn element_type(&self) -> &TypeDescriptor {
        self.view.element_type()
    }

    pub fn handle(&self) -> &EngineHandle {
        self.view.handle()
    }

    pub fn num_partitions(&self) -> usize {
        self.view.num_partitions()
    }

    pub fn as_view(&self) -> &DistributedDatasetView<(K, V)> {
        &self.view
    }

    pub fn into_view(self) -> DistributedDatasetView<(K, V)> {
        self.view
    }

    pub fn keys(&self) -> DistributedDatasetView<K> {
        self.view.map_with_type(self.key_type.clone(), |(key, _)| key)
    }

    pub fn values(&self) -> DistributedDatasetView<V> {
        self.view.map_with_type(self.value_type.clone(), |(_, value)| value)
    }

    /// Transform values, keeping keys.
    pub fn map_values<W, F>(&self, f: F) -> PairDatasetView<K, W>
    where
        W: Send + 'static,
        F: Fn(V) -> W + Send + Sync + 'static,
    {
        let value_type = TypeDescriptor::of::<W>();
        let pair_type = TypeDescriptor::pair::<K, W>(self.key_type.clone(), value_type.clone());
        let view = self
            .view
            .map_with_type(pair_type, move |(key, value): (K, V)| (key, f(value)));
        PairDatasetView::from_view(view, self.key_type.clone(), value_type)
    }

    pub fn filter<P>(&self, predicate: P) -> Self
    where
        P: Fn(&K, &V) -> bool + Send + Sync + 'static,
    {
        Self::from_view(
            self.view.filter(move |(key, value)| predicate(key, value)),
            self.key_type.clone(),
            self.value_type.clone(),
        )
    }

    pub fn collect(&self) -> Result<Vec<(K, V)>> {
        self.view.collect()
    }

    pub fn count(&self) -> Result<usize> {
        self.view.count()
    }

    pub fn first(&self) -> Result<Option<(K, V)>> {
        self.view.first()
    }

    /// Values stored under `key`, in partition order.
    pub fn lookup(&self, key: &K) -> Result<Vec<V>>
    where
        K: PartialEq + Clone + Sync,
    {
        let wanted = key.clone();
        self.filter(move |k, _| *k == wanted).values().collect()
    }

    /// Collect into a map. When a key repeats, the last pair in partition
    /// order wins.
    pub fn collect_as_map(&self) -> Result<FxHashMap<K, V>>
    where
        K: Eq + Hash,
    {
        Ok(self.view.collect()?.into_iter().collect())
    }

    /// Collect the values of each key, in partition order.
    pub fn group_by_key(&self) -> Result<FxHashMap<K, Vec<V>>>
    where
        K: Eq + Hash,
    {
        let mut groups: FxHashMap<K, Vec<V>> = FxHashMap::default();
        for (key, value) in self.view.collect()? {
            groups.entry(key).or_default().push(value);
        }
        Ok(groups)
    }
}
