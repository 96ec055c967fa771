//! Reified target-type descriptors.
//!
//! A [`TypeDescriptor`] travels next to every factory and view so that code
//! on the far side of a type-erased boundary (the engine only ever sees
//! `Box<dyn Any>`) can still name, compare, and check the element type it
//! is carrying.
//!
//! ```
//! use tabview_types::TypeDescriptor;
//!
//! let key = TypeDescriptor::of::<String>();
//! let value = TypeDescriptor::of::<i32>();
//! let pair = TypeDescriptor::pair::<String, i32>(key.clone(), value.clone());
//!
//! assert!(pair.is::<(String, i32)>());
//! assert_eq!(pair.pair_parts(), Some((&key, &value)));
//! assert_eq!(pair.to_string(), "(String, i32)");
//! ```

use rustc_hash::FxHashMap;
use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock, RwLock};

/// Comparable capture of a concrete type and its ordered type arguments.
///
/// Cloning is an `Arc` bump. Two descriptors are equal iff they denote the
/// same concrete type. The arguments are a decomposition of that type for
/// callers that inspect it, so a leaf built by [`TypeDescriptor::of`] equals
/// the argument-carrying descriptor of the same type.
#[derive(Clone)]
pub struct TypeDescriptor {
    inner: Arc<DescriptorInner>,
}

struct DescriptorInner {
    id: TypeId,
    name: &'static str,
    args: Vec<TypeDescriptor>,
}

fn leaf_cache() -> &'static RwLock<FxHashMap<TypeId, TypeDescriptor>> {
    static LEAVES: OnceLock<RwLock<FxHashMap<TypeId, TypeDescriptor>>> = OnceLock::new();
    LEAVES.get_or_init(|| RwLock::new(FxHashMap::default()))
}

impl TypeDescriptor {
    /// Descriptor for a non-generic type (or a generic one whose arguments
    /// the caller does not need to inspect).
    ///
    /// Leaf descriptors are memoised per process, so repeated calls for the
    /// same `T` share one allocation.
    pub fn of<T: ?Sized + 'static>() -> Self {
        let id = TypeId::of::<T>();
        if let Some(found) = leaf_cache().read().ok().and_then(|m| m.get(&id).cloned()) {
            return found;
        }
        let fresh = Self::build(id, type_name::<T>(), Vec::new());
        match leaf_cache().write() {
            Ok(mut cache) => cache.entry(id).or_insert(fresh).clone(),
            // A poisoned cache only costs the sharing.
            Err(_) => fresh,
        }
    }

    /// Descriptor for `T` with explicit type-argument descriptors.
    pub fn generic<T: ?Sized + 'static>(args: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        let args: Vec<TypeDescriptor> = args.into_iter().collect();
        if args.is_empty() {
            return Self::of::<T>();
        }
        Self::build(TypeId::of::<T>(), type_name::<T>(), args)
    }

    /// Descriptor for the pair `(K, V)` built from the key and value
    /// descriptors.
    ///
    /// The arguments are taken as given; nothing checks that they denote
    /// `K` and `V`.
    pub fn pair<K: 'static, V: 'static>(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::generic::<(K, V)>([key, value])
    }

    fn build(id: TypeId, name: &'static str, args: Vec<TypeDescriptor>) -> Self {
        Self {
            inner: Arc::new(DescriptorInner { id, name, args }),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.inner.id
    }

    /// Fully qualified name as reported by [`std::any::type_name`].
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Name with module paths stripped, e.g. `Option<String>`.
    pub fn short_name(&self) -> String {
        short_type_name(self.inner.name)
    }

    pub fn args(&self) -> &[TypeDescriptor] {
        &self.inner.args
    }

    /// Whether this descriptor denotes `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.inner.id == TypeId::of::<T>()
    }

    /// Key and value descriptors when this describes a two-argument type
    /// built through [`TypeDescriptor::pair`].
    pub fn pair_parts(&self) -> Option<(&TypeDescriptor, &TypeDescriptor)> {
        match self.inner.args.as_slice() {
            [key, value] => Some((key, value)),
            _ => None,
        }
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.id == other.inner.id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("TypeDescriptor");
        out.field("name", &self.inner.name);
        if !self.inner.args.is_empty() {
            out.field("args", &self.inner.args);
        }
        out.finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// Drop every `path::` prefix from a `type_name` string while keeping
/// generic and tuple punctuation.
fn short_type_name(full: &str) -> String {
    let bytes = full.as_bytes();
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b':' && bytes.get(i + 1) == Some(&b':') {
            out.truncate(segment_start);
            i += 2;
            continue;
        }
        out.push(b as char);
        if matches!(
            b,
            b'<' | b'>' | b',' | b'(' | b')' | b'[' | b']' | b';' | b'&' | b' ' | b'*'
        ) {
            segment_start = out.len();
        }
        i += 1;
    }
    out
}
