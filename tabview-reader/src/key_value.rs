use arrow::datatypes::SchemaRef;
use tabview_result::{Error, Result};
use tabview_types::{Side, TypeDescriptor};

use crate::factory::{RowReader, RowReaderFactory, extend_unique, missing_columns};
use crate::row::RowRef;

/// Decodes one row into a key and a value at the same time.
///
/// Wraps a key factory and a value factory. Decoding through the pair is the
/// same as decoding the row separately with each factory; the composition
/// only adds [`Side`] tags to failures.
#[derive(Debug, Clone)]
pub struct KeyValueRowReaderFactory<KF, VF> {
    key: KF,
    value: VF,
}

impl<KF, VF> KeyValueRowReaderFactory<KF, VF> {
    pub fn new(key: KF, value: VF) -> Self {
        Self { key, value }
    }

    pub fn key_factory(&self) -> &KF {
        &self.key
    }

    pub fn value_factory(&self) -> &VF {
        &self.value
    }

    pub fn into_parts(self) -> (KF, VF) {
        (self.key, self.value)
    }
}

/// The [`Error::SchemaMismatch`] for `factory` when it needs columns missing
/// from `schema`. Callers add the [`Side`] tag.
pub(crate) fn unmet_columns<F: RowReaderFactory>(factory: &F, schema: &SchemaRef) -> Option<Error> {
    let missing = missing_columns(schema, &factory.required_columns());
    if missing.is_empty() {
        return None;
    }
    Some(Error::SchemaMismatch {
        missing,
        required_by: factory.describe(),
    })
}

/// Keep the failed components of a composed operation, in component order.
pub(crate) fn failed_sides<const N: usize>(
    outcomes: [(Side, Option<Error>); N],
) -> Vec<(Side, Error)> {
    outcomes
        .into_iter()
        .filter_map(|(side, err)| err.map(|err| (side, err)))
        .collect()
}

impl<KF, VF> RowReaderFactory for KeyValueRowReaderFactory<KF, VF>
where
    KF: RowReaderFactory,
    VF: RowReaderFactory,
    KF::Target: 'static,
    VF::Target: 'static,
{
    type Target = (KF::Target, VF::Target);
    type Reader = KeyValueRowReader<KF::Reader, VF::Reader>;

    fn target_type(&self) -> TypeDescriptor {
        TypeDescriptor::pair::<KF::Target, VF::Target>(
            self.key.target_type(),
            self.value.target_type(),
        )
    }

    fn required_columns(&self) -> Vec<String> {
        let mut columns = self.key.required_columns();
        extend_unique(&mut columns, self.value.required_columns());
        columns
    }

    fn new_reader(&self, schema: &SchemaRef) -> Result<Self::Reader> {
        // Validate both sides before binding either reader.
        let unmet = failed_sides([
            (Side::Key, unmet_columns(&self.key, schema)),
            (Side::Value, unmet_columns(&self.value, schema)),
        ]);
        if !unmet.is_empty() {
            return Err(Error::on_sides(unmet));
        }
        match (self.key.new_reader(schema), self.value.new_reader(schema)) {
            (Ok(key), Ok(value)) => {
                tracing::trace!(
                    key = %self.key.describe(),
                    value = %self.value.describe(),
                    "bound key/value reader"
                );
                Ok(KeyValueRowReader { key, value })
            }
            (key, value) => Err(Error::on_sides(failed_sides([
                (Side::Key, key.err()),
                (Side::Value, value.err()),
            ]))),
        }
    }

    fn describe(&self) -> String {
        format!(
            "key/value reader ({} => {})",
            self.key.describe(),
            self.value.describe()
        )
    }
}

/// Reader produced by [`KeyValueRowReaderFactory`].
#[derive(Debug)]
pub struct KeyValueRowReader<KR, VR> {
    key: KR,
    value: VR,
}

impl<KR: RowReader, VR: RowReader> RowReader for KeyValueRowReader<KR, VR> {
    type Target = (KR::Target, VR::Target);

    fn decode(&self, row: RowRef<'_>) -> Result<Self::Target> {
        // Both sides see the row exactly once, even when the key fails.
        match (self.key.decode(row), self.value.decode(row)) {
            (Ok(k), Ok(v)) => Ok((k, v)),
            (key, value) => Err(Error::on_sides(failed_sides([
                (Side::Key, key.err()),
                (Side::Value, value.err()),
            ]))),
        }
    }
}
