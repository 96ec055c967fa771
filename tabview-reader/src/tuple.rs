//! Composition of N factories into a factory of N-tuples.
//!
//! Same contract as [`KeyValueRowReaderFactory`](crate::KeyValueRowReaderFactory),
//! with failures tagged by [`Side::Element`] position instead of key/value.

use arrow::datatypes::SchemaRef;
use tabview_result::{Error, Result};
use tabview_types::{Side, TypeDescriptor};

use crate::factory::{RowReader, RowReaderFactory, extend_unique};
use crate::key_value::{failed_sides, unmet_columns};
use crate::row::RowRef;

macro_rules! tuple_reader_factory {
    ($factory:ident, $reader:ident; $($idx:tt => $F:ident / $R:ident / $v:ident),+ $(,)?) => {
        #[derive(Debug, Clone)]
        pub struct $factory<$($F),+> {
            factories: ($($F,)+),
        }

        impl<$($F),+> $factory<$($F),+> {
            pub fn new(factories: ($($F,)+)) -> Self {
                Self { factories }
            }

            pub fn into_inner(self) -> ($($F,)+) {
                self.factories
            }
        }

        impl<$($F),+> RowReaderFactory for $factory<$($F),+>
        where
            $($F: RowReaderFactory, $F::Target: 'static,)+
        {
            type Target = ($($F::Target,)+);
            type Reader = $reader<$($F::Reader),+>;

            fn target_type(&self) -> TypeDescriptor {
                TypeDescriptor::generic::<Self::Target>([
                    $(self.factories.$idx.target_type()),+
                ])
            }

            fn required_columns(&self) -> Vec<String> {
                let mut columns = Vec::new();
                $(extend_unique(&mut columns, self.factories.$idx.required_columns());)+
                columns
            }

            fn new_reader(&self, schema: &SchemaRef) -> Result<Self::Reader> {
                let unmet = failed_sides([
                    $((Side::Element($idx), unmet_columns(&self.factories.$idx, schema))),+
                ]);
                if !unmet.is_empty() {
                    return Err(Error::on_sides(unmet));
                }
                match ($(self.factories.$idx.new_reader(schema),)+) {
                    ($(Ok($v),)+) => Ok($reader { readers: ($($v,)+) }),
                    ($($v,)+) => Err(Error::on_sides(failed_sides([
                        $((Side::Element($idx), $v.err())),+
                    ]))),
                }
            }
        }

        pub struct $reader<$($R),+> {
            readers: ($($R,)+),
        }

        impl<$($R: RowReader),+> RowReader for $reader<$($R),+> {
            type Target = ($($R::Target,)+);

            fn decode(&self, row: RowRef<'_>) -> Result<Self::Target> {
                // Every element is decoded so each failure is reported.
                match ($(self.readers.$idx.decode(row),)+) {
                    ($(Ok($v),)+) => Ok(($($v,)+)),
                    ($($v,)+) => Err(Error::on_sides(failed_sides([
                        $((Side::Element($idx), $v.err())),+
                    ]))),
                }
            }
        }
    };
}

tuple_reader_factory!(TupleRowReaderFactory3, TupleRowReader3;
    0 => A / RA / a,
    1 => B / RB / b,
    2 => C / RC / c,
);

tuple_reader_factory!(TupleRowReaderFactory4, TupleRowReader4;
    0 => A / RA / a,
    1 => B / RB / b,
    2 => C / RC / c,
    3 => D / RD / d,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::column;
    use arrow::array::{Float64Array, Int64Array, RecordBatch, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("word", DataType::Utf8, false),
            Field::new("count", DataType::Int64, true),
            Field::new("score", DataType::Float64, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["foo", "bar"])),
                Arc::new(Int64Array::from(vec![Some(20), None])),
                Arc::new(Float64Array::from(vec![0.5, 1.0])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn three_tuple_decodes_each_position() {
        let batch = batch();
        let factory = TupleRowReaderFactory3::new((
            column::<String>("word"),
            column::<i64>("count"),
            column::<f64>("score"),
        ));
        let desc = factory.target_type();
        assert!(desc.is::<(String, i64, f64)>());
        assert_eq!(desc.args().len(), 3);

        let reader = factory.new_reader(&batch.schema()).unwrap();
        assert_eq!(
            reader.decode(RowRef::new(&batch, 0)).unwrap(),
            ("foo".to_string(), 20, 0.5)
        );
        let err = reader.decode(RowRef::new(&batch, 1)).unwrap_err();
        assert_eq!(err.side(), Some(Side::Element(1)));
    }

    #[test]
    fn four_tuple_dedups_required_columns() {
        let factory = TupleRowReaderFactory4::new((
            column::<String>("word"),
            column::<Option<i64>>("count"),
            column::<String>("word"),
            column::<f64>("score"),
        ));
        assert_eq!(factory.required_columns(), vec!["word", "count", "score"]);

        let batch = batch();
        let reader = factory.new_reader(&batch.schema()).unwrap();
        let (w, c, w2, s) = reader.decode(RowRef::new(&batch, 1)).unwrap();
        assert_eq!((w.as_str(), c, w2.as_str(), s), ("bar", None, "bar", 1.0));
    }

    #[test]
    fn missing_column_names_its_position() {
        let schema = Arc::new(Schema::new(vec![Field::new("word", DataType::Utf8, false)]));
        let err = TupleRowReaderFactory3::new((
            column::<String>("word"),
            column::<String>("word"),
            column::<i64>("count"),
        ))
        .new_reader(&schema)
        .err()
        .unwrap();
        assert_eq!(err.side(), Some(Side::Element(2)));
    }

    #[test]
    fn every_failing_position_is_reported() {
        let batch = batch();
        let reader = TupleRowReaderFactory3::new((
            column::<i64>("word"),
            column::<i64>("count"),
            column::<f64>("score"),
        ))
        .new_reader(&batch.schema())
        .unwrap();

        let err = reader.decode(RowRef::new(&batch, 1)).unwrap_err();
        assert_eq!(err.sides(), vec![Side::Element(0), Side::Element(1)]);
        let columns: Vec<_> = err
            .failures()
            .iter()
            .map(|failure| match failure.root() {
                Error::Decode { column, .. } => column.clone(),
                other => panic!("expected a decode error, got {other:?}"),
            })
            .collect();
        assert_eq!(columns, vec!["word", "count"]);
    }

    #[test]
    fn every_unmet_position_is_reported() {
        let schema = Arc::new(Schema::new(vec![Field::new("word", DataType::Utf8, false)]));
        let err = TupleRowReaderFactory3::new((
            column::<i64>("count"),
            column::<String>("word"),
            column::<f64>("score"),
        ))
        .new_reader(&schema)
        .err()
        .unwrap();
        assert_eq!(err.sides(), vec![Side::Element(0), Side::Element(2)]);
        assert_eq!(
            err.missing_columns(),
            Some(vec!["count".to_string(), "score".to_string()])
        );
    }
}
