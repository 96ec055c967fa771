use std::sync::Arc;

use arrow::datatypes::{Schema, SchemaRef};
use tabview_result::{Error, Result};
use tabview_types::TypeDescriptor;

use crate::row::RowRef;

/// Schema-bound decoder from one raw row to one value.
///
/// Readers are shared across partitions that an engine may decode in
/// parallel, so `decode` takes `&self` and must not keep state between
/// calls.
pub trait RowReader: Send + Sync {
    type Target;

    /// Decode `row`. A failure affects this row only; the engine decides
    /// what happens to the rest of the dataset.
    fn decode(&self, row: RowRef<'_>) -> Result<Self::Target>;
}

/// Capability that builds [`RowReader`]s for a schema and reports the type
/// they produce.
///
/// Factories are configuration only. They are not tied to one dataset and
/// can bind any number of readers, concurrently.
pub trait RowReaderFactory: Send + Sync {
    type Target;
    type Reader: RowReader<Target = Self::Target> + 'static;

    /// Descriptor of [`Self::Target`]. Stable across calls.
    fn target_type(&self) -> TypeDescriptor;

    /// Columns the bound schema must contain, in declaration order.
    fn required_columns(&self) -> Vec<String>;

    /// Bind a reader to `schema`.
    ///
    /// Fails with [`Error::SchemaMismatch`] when any of
    /// [`required_columns`](Self::required_columns) is absent, before a single
    /// row is decoded.
    fn new_reader(&self, schema: &SchemaRef) -> Result<Self::Reader>;

    /// Description used when reporting an unmet requirement.
    fn describe(&self) -> String {
        format!("reader factory for {}", self.target_type())
    }
}

impl<F: RowReaderFactory + ?Sized> RowReaderFactory for Arc<F> {
    type Target = F::Target;
    type Reader = F::Reader;

    fn target_type(&self) -> TypeDescriptor {
        (**self).target_type()
    }

    fn required_columns(&self) -> Vec<String> {
        (**self).required_columns()
    }

    fn new_reader(&self, schema: &SchemaRef) -> Result<Self::Reader> {
        (**self).new_reader(schema)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Columns from `required` absent in `schema`, in the order given.
pub fn missing_columns(schema: &Schema, required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|name| schema.index_of(name).is_err())
        .cloned()
        .collect()
}

/// Fail with [`Error::SchemaMismatch`] unless `schema` has every column in
/// `required`.
pub fn require_columns(
    schema: &Schema,
    required: &[String],
    required_by: impl FnOnce() -> String,
) -> Result<()> {
    let missing = missing_columns(schema, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::SchemaMismatch {
            missing,
            required_by: required_by(),
        })
    }
}

/// Append the columns of `more` not already in `into`.
pub(crate) fn extend_unique(into: &mut Vec<String>, more: Vec<String>) {
    for column in more {
        if !into.contains(&column) {
            into.push(column);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{DataType, Field};

    #[test]
    fn require_columns_reports_all_missing_in_order() {
        let schema = Schema::new(vec![Field::new("word", DataType::Utf8, false)]);
        let required = vec!["count".to_string(), "word".to_string(), "year".to_string()];
        let err = require_columns(&schema, &required, || "test".into()).unwrap_err();
        match err {
            Error::SchemaMismatch {
                missing,
                required_by,
            } => {
                assert_eq!(missing, vec!["count".to_string(), "year".to_string()]);
                assert_eq!(required_by, "test");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn extend_unique_keeps_first_occurrence() {
        let mut cols = vec!["a".to_string(), "b".to_string()];
        extend_unique(&mut cols, vec!["b".into(), "c".into(), "a".into()]);
        assert_eq!(cols, vec!["a", "b", "c"]);
    }
}
