//! Helpers shared by tabview test binaries.

use std::sync::{Arc, Once};

use arrow::array::{ArrayRef, Int32Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};

static INIT: Once = Once::new();

/// Initialize tracing for test binaries. Safe to call multiple times.
///
/// Honors `RUST_LOG`; defaults to `warn` so skipped-row warnings show up in
/// failing test output.
pub fn init_tracing_for_tests() {
    INIT.call_once(|| {
        use tracing_subscriber::filter::EnvFilter;
        use tracing_subscriber::fmt;
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        // A second subscriber may already be installed by another helper.
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

/// Schema of the `(word, count)` table used across the test suites.
pub fn words_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("word", DataType::Utf8, false),
        Field::new("count", DataType::Int32, true),
    ]))
}

/// One batch of the words table.
pub fn words_batch(rows: &[(&str, Option<i32>)]) -> RecordBatch {
    let words: ArrayRef = Arc::new(StringArray::from_iter_values(rows.iter().map(|(w, _)| *w)));
    let counts: ArrayRef = Arc::new(Int32Array::from_iter(rows.iter().map(|(_, c)| *c)));
    RecordBatch::try_new(words_schema(), vec![words, counts]).expect("words batch")
}

/// A batch whose `count` column is physically text, as a table loaded without
/// type inference would hold it. Declared against [`words_schema`] it
/// reproduces a source that stores integers as strings.
pub fn words_batch_as_text(rows: &[(&str, &str)]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("word", DataType::Utf8, false),
        Field::new("count", DataType::Utf8, true),
    ]));
    let words: ArrayRef = Arc::new(StringArray::from_iter_values(rows.iter().map(|(w, _)| *w)));
    let counts: ArrayRef = Arc::new(StringArray::from_iter_values(rows.iter().map(|(_, c)| *c)));
    RecordBatch::try_new(schema, vec![words, counts]).expect("text words batch")
}
