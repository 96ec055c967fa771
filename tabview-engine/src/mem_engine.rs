//! In-memory [`DatasetEngine`] over Arrow record batches.

use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::{Arc, RwLock};

use arrow::array::RecordBatch;
use arrow::csv::reader::ReaderBuilder;
use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use rustc_hash::FxHashMap;
use tabview_reader::{ErasedRowReader, ErasedRowReaderFactory, RowRef};
use tabview_result::{Error, Result};
use tabview_types::{TableLocation, TypeDescriptor};

use crate::config::{CsvReadOptions, MemEngineConfig, RowErrorPolicy};
use crate::engine::{DatasetEngine, ScanOptions};
use crate::handle::{EngineHandle, ErasedDataset, ErasedRowIter};

/// Registered table: the declared schema and its partitions.
///
/// Partitions keep their own physical schema. Column names and order match
/// the declared schema, but the physical types may not, which is how a
/// store with inconsistent declared types is modelled.
struct MemTable {
    schema: SchemaRef,
    partitions: Vec<RecordBatch>,
}

impl MemTable {
    fn project(&self, options: &ScanOptions) -> Result<(SchemaRef, Vec<RecordBatch>)> {
        let Some(columns) = options.columns.as_ref() else {
            return Ok((Arc::clone(&self.schema), self.partitions.clone()));
        };

        let mut indices = Vec::with_capacity(columns.len());
        let mut missing = Vec::new();
        for name in columns {
            match self.schema.index_of(name) {
                Ok(idx) => indices.push(idx),
                Err(_) => missing.push(name.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(Error::SchemaMismatch {
                missing,
                required_by: "scan projection".to_string(),
            });
        }

        let schema = Arc::new(self.schema.project(&indices)?);
        let partitions = self
            .partitions
            .iter()
            .map(|batch| batch.project(&indices))
            .collect::<std::result::Result<Vec<_>, ArrowError>>()?;
        Ok((schema, partitions))
    }
}

/// Catalog of in-memory tables.
///
/// Each registered batch becomes at least one partition; batches longer than
/// [`MemEngineConfig::max_partition_rows`] are sliced. Partitions are decoded
/// lazily when a handle is scanned.
pub struct MemEngine {
    tables: RwLock<FxHashMap<TableLocation, Arc<MemTable>>>,
    config: MemEngineConfig,
}

impl Default for MemEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemEngine {
    pub fn new() -> Self {
        Self::with_config(MemEngineConfig::default())
    }

    pub fn with_config(config: MemEngineConfig) -> Self {
        Self {
            tables: RwLock::new(FxHashMap::default()),
            config,
        }
    }

    pub fn config(&self) -> &MemEngineConfig {
        &self.config
    }

    /// Register `batches` under `location` with the declared `schema`.
    ///
    /// Every batch must carry the declared column names in the declared
    /// order. Empty batches are dropped. Fails if the location is taken.
    pub fn register_table(
        &self,
        location: impl Into<TableLocation>,
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
    ) -> Result<()> {
        let location = location.into();
        for (idx, batch) in batches.iter().enumerate() {
            let batch_schema = batch.schema();
            let declared = schema.fields().iter().map(|f| f.name());
            let actual = batch_schema.fields().iter().map(|f| f.name());
            if !declared.eq(actual) {
                return Err(Error::InvalidArgumentError(format!(
                    "batch {idx} for table {location} does not match the declared columns"
                )));
            }
        }

        let partitions = self.partition(batches);
        let rows: usize = partitions.iter().map(RecordBatch::num_rows).sum();

        let mut tables = self
            .tables
            .write()
            .map_err(|_| Error::Internal("mem engine catalog lock poisoned".into()))?;
        if tables.contains_key(&location) {
            return Err(Error::InvalidArgumentError(format!(
                "table {location} is already registered"
            )));
        }
        tracing::debug!(
            table = %location,
            partitions = partitions.len(),
            rows,
            "registered in-memory table"
        );
        tables.insert(location, Arc::new(MemTable { schema, partitions }));
        Ok(())
    }

    /// Load a CSV file into a new table, inferring its schema.
    ///
    /// Returns the inferred schema.
    pub fn register_csv(
        &self,
        location: impl Into<TableLocation>,
        path: &Path,
        options: &CsvReadOptions,
    ) -> Result<SchemaRef> {
        let mut file = File::open(path)?;
        let format = options.to_format();
        let (schema, _) = format.infer_schema(&mut file, options.max_read_records)?;
        file.rewind()?;

        let schema = Arc::new(schema);
        let mut builder = ReaderBuilder::new(Arc::clone(&schema)).with_format(format);
        if let Some(batch_size) = options.batch_size {
            builder = builder.with_batch_size(batch_size);
        }
        let batches = builder
            .build(file)?
            .collect::<std::result::Result<Vec<_>, ArrowError>>()?;

        self.register_table(location, Arc::clone(&schema), batches)?;
        Ok(schema)
    }

    /// Remove a table. Handles already opened on it keep their partitions.
    pub fn drop_table(&self, location: &TableLocation) -> Result<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| Error::Internal("mem engine catalog lock poisoned".into()))?;
        match tables.remove(location) {
            Some(_) => Ok(()),
            None => Err(Error::SourceNotFound(location.to_string())),
        }
    }

    pub fn table_schema(&self, location: &TableLocation) -> Result<SchemaRef> {
        Ok(Arc::clone(&self.table(location)?.schema))
    }

    /// Registered locations, sorted.
    pub fn tables(&self) -> Result<Vec<TableLocation>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| Error::Internal("mem engine catalog lock poisoned".into()))?;
        let mut locations: Vec<_> = tables.keys().cloned().collect();
        locations.sort();
        Ok(locations)
    }

    fn table(&self, location: &TableLocation) -> Result<Arc<MemTable>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| Error::Internal("mem engine catalog lock poisoned".into()))?;
        tables
            .get(location)
            .cloned()
            .ok_or_else(|| Error::SourceNotFound(location.to_string()))
    }

    fn partition(&self, batches: Vec<RecordBatch>) -> Vec<RecordBatch> {
        let limit = self.config.max_partition_rows.filter(|&n| n > 0);
        let mut partitions = Vec::with_capacity(batches.len());
        for batch in batches {
            let rows = batch.num_rows();
            if rows == 0 {
                continue;
            }
            match limit {
                Some(limit) if rows > limit => {
                    let mut offset = 0;
                    while offset < rows {
                        let len = limit.min(rows - offset);
                        partitions.push(batch.slice(offset, len));
                        offset += len;
                    }
                }
                _ => partitions.push(batch),
            }
        }
        partitions
    }
}

impl DatasetEngine for MemEngine {
    fn open(
        &self,
        location: &TableLocation,
        element_type: &TypeDescriptor,
        factory: Arc<dyn ErasedRowReaderFactory>,
        options: &ScanOptions,
    ) -> Result<EngineHandle> {
        let table = self.table(location)?;

        let produced = factory.target_type();
        if &produced != element_type {
            return Err(Error::InvalidArgumentError(format!(
                "{} produces {produced}, not the requested {element_type}",
                factory.describe()
            )));
        }

        let (schema, partitions) = table.project(options)?;
        let reader = factory.new_reader(&schema)?;
        tracing::debug!(
            table = %location,
            element_type = %element_type,
            reader = %factory.describe(),
            partitions = partitions.len(),
            "opened in-memory dataset"
        );

        let dataset = MemDataset {
            location: location.clone(),
            partitions,
            reader,
            policy: self.config.row_error_policy,
        };
        Ok(EngineHandle::new(Arc::new(dataset), element_type.clone()).with_source(location.clone()))
    }
}

struct MemDataset {
    location: TableLocation,
    partitions: Vec<RecordBatch>,
    reader: Box<dyn ErasedRowReader>,
    policy: RowErrorPolicy,
}

impl ErasedDataset for MemDataset {
    fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    fn scan_partition(&self, partition: usize) -> Result<ErasedRowIter<'_>> {
        let batch = self.partitions.get(partition).ok_or_else(|| {
            Error::InvalidArgumentError(format!(
                "partition {partition} out of range for {}",
                self.location
            ))
        })?;
        tracing::trace!(
            table = %self.location,
            partition,
            rows = batch.num_rows(),
            "scanning partition"
        );

        let reader = self.reader.as_ref();
        let policy = self.policy;
        let location = &self.location;
        Ok(Box::new((0..batch.num_rows()).filter_map(move |row| {
            match reader.decode(RowRef::new(batch, row)) {
                Ok(value) => Some(Ok(value)),
                Err(err) => match policy {
                    RowErrorPolicy::Fail => Some(Err(err)),
                    RowErrorPolicy::Skip => {
                        tracing::warn!(
                            table = %location,
                            partition,
                            row,
                            error = %err,
                            "skipping row that failed to decode"
                        );
                        None
                    }
                },
            }
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tabview_reader::{AnyValue, GenericRow, GenericRowReaderFactory, column, erase};
    use tabview_test_utils::{
        init_tracing_for_tests, words_batch, words_batch_as_text, words_schema,
    };
    use tempfile::NamedTempFile;

    fn loc() -> TableLocation {
        TableLocation::new("test", "words")
    }

    fn strings(parts: Vec<Vec<AnyValue>>) -> Vec<Vec<String>> {
        parts
            .into_iter()
            .map(|p| p.into_iter().map(|v| *v.downcast::<String>().unwrap()).collect())
            .collect()
    }

    #[test]
    fn open_decodes_each_partition_lazily() {
        init_tracing_for_tests();
        let engine = MemEngine::new();
        engine
            .register_table(
                loc(),
                words_schema(),
                vec![
                    words_batch(&[("foo", Some(20)), ("bar", Some(1))]),
                    words_batch(&[]),
                    words_batch(&[("baz", None)]),
                ],
            )
            .unwrap();

        let factory = erase(column::<String>("word"));
        let handle = engine
            .open(&loc(), &factory.target_type(), factory, &ScanOptions::default())
            .unwrap();
        assert_eq!(handle.source(), Some(&loc()));
        // The empty batch does not become a partition.
        assert_eq!(handle.num_partitions(), 2);
        assert_eq!(
            strings(handle.collect_partitions().unwrap()),
            vec![vec!["foo", "bar"], vec!["baz"]]
        );
    }

    #[test]
    fn large_batches_are_sliced() {
        let engine = MemEngine::with_config(MemEngineConfig::default().with_max_partition_rows(2));
        let rows: Vec<(&str, Option<i32>)> = vec![
            ("a", Some(1)),
            ("b", Some(2)),
            ("c", Some(3)),
            ("d", Some(4)),
            ("e", Some(5)),
        ];
        engine
            .register_table(loc(), words_schema(), vec![words_batch(&rows)])
            .unwrap();

        let factory = erase(column::<i32>("count"));
        let handle = engine
            .open(&loc(), &factory.target_type(), factory, &ScanOptions::default())
            .unwrap();
        assert_eq!(handle.num_partitions(), 3);
        assert_eq!(handle.count().unwrap(), 5);
    }

    #[test]
    fn unknown_location_is_source_not_found() {
        let engine = MemEngine::new();
        let factory = erase(GenericRowReaderFactory);
        let err = engine
            .open(&loc(), &factory.target_type(), factory, &ScanOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(ref l) if l == "test.words"));
    }

    #[test]
    fn bind_failure_fails_the_open() {
        let engine = MemEngine::new();
        engine
            .register_table(loc(), words_schema(), vec![words_batch(&[("foo", Some(1))])])
            .unwrap();
        let factory = erase(column::<i32>("year"));
        let err = engine
            .open(&loc(), &factory.target_type(), factory, &ScanOptions::default())
            .unwrap_err();
        assert_eq!(err.missing_columns(), Some(vec!["year".to_string()]));
    }

    #[test]
    fn descriptor_must_match_factory() {
        let engine = MemEngine::new();
        engine
            .register_table(loc(), words_schema(), vec![words_batch(&[("foo", Some(1))])])
            .unwrap();
        let factory = erase(column::<String>("word"));
        let err = engine
            .open(&loc(), &TypeDescriptor::of::<i64>(), factory, &ScanOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgumentError(_)));
    }

    #[test]
    fn projection_restricts_the_bound_schema() {
        let engine = MemEngine::new();
        engine
            .register_table(loc(), words_schema(), vec![words_batch(&[("foo", Some(1))])])
            .unwrap();

        let factory = erase(GenericRowReaderFactory);
        let handle = engine
            .open(
                &loc(),
                &factory.target_type(),
                factory,
                &ScanOptions::with_columns(["count"]),
            )
            .unwrap();
        let rows = handle.collect_partitions().unwrap();
        let row = rows[0][0].downcast_ref::<GenericRow>().unwrap();
        assert_eq!(row.column_names(), vec!["count"]);

        // A reader that needs a column outside the projection cannot bind.
        let factory = erase(column::<String>("word"));
        let err = engine
            .open(
                &loc(),
                &factory.target_type(),
                factory,
                &ScanOptions::with_columns(["count"]),
            )
            .unwrap_err();
        assert_eq!(err.missing_columns(), Some(vec!["word".to_string()]));

        let factory = erase(GenericRowReaderFactory);
        let err = engine
            .open(
                &loc(),
                &factory.target_type(),
                factory,
                &ScanOptions::with_columns(["score"]),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaMismatch { ref required_by, .. } if required_by == "scan projection"
        ));
    }

    #[test]
    fn row_error_policy_controls_bad_rows() {
        init_tracing_for_tests();
        let batch = words_batch_as_text(&[("foo", "20"), ("bar", "not-a-number"), ("baz", "3")]);

        let failing = MemEngine::new();
        failing
            .register_table(loc(), words_schema(), vec![batch.clone()])
            .unwrap();
        let factory = erase(column::<i32>("count"));
        let handle = failing
            .open(&loc(), &factory.target_type(), factory, &ScanOptions::default())
            .unwrap();
        let results = handle.collect_partition_results().unwrap();
        assert_eq!(results[0].len(), 3);
        assert!(matches!(
            results[0][1],
            Err(Error::Decode { ref column, .. }) if column == "count"
        ));
        assert!(results[0][2].is_ok());

        let skipping = MemEngine::with_config(
            MemEngineConfig::default().with_row_error_policy(RowErrorPolicy::Skip),
        );
        skipping
            .register_table(loc(), words_schema(), vec![batch])
            .unwrap();
        let factory = erase(column::<i32>("count"));
        let handle = skipping
            .open(&loc(), &factory.target_type(), factory, &ScanOptions::default())
            .unwrap();
        assert_eq!(handle.count().unwrap(), 2);
    }

    #[test]
    fn catalog_operations() {
        let engine = MemEngine::new();
        let other = TableLocation::new("test", "other");
        engine.register_table(loc(), words_schema(), vec![]).unwrap();
        engine.register_table(other.clone(), words_schema(), vec![]).unwrap();

        assert_eq!(engine.tables().unwrap(), vec![other.clone(), loc()]);
        assert_eq!(engine.table_schema(&loc()).unwrap(), words_schema());

        let err = engine.register_table(loc(), words_schema(), vec![]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgumentError(_)));

        engine.drop_table(&other).unwrap();
        assert!(matches!(
            engine.drop_table(&other),
            Err(Error::SourceNotFound(_))
        ));
        assert_eq!(engine.tables().unwrap(), vec![loc()]);
    }

    #[test]
    fn batches_must_match_declared_columns() {
        let engine = MemEngine::new();
        let swapped = words_batch(&[("foo", Some(1))])
            .project(&[1, 0])
            .unwrap();
        let err = engine
            .register_table(loc(), words_schema(), vec![swapped])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgumentError(_)));
    }

    #[test]
    fn csv_tables_infer_their_schema() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "word,count").unwrap();
        writeln!(tmp, "foo,20").unwrap();
        writeln!(tmp, "bar,3").unwrap();
        tmp.flush().unwrap();

        let engine = MemEngine::new();
        let schema = engine
            .register_csv(loc(), tmp.path(), &CsvReadOptions::default())
            .unwrap();
        assert_eq!(schema.field(0).name(), "word");
        assert_eq!(schema.field(1).name(), "count");

        let factory = erase(column::<i64>("count"));
        let handle = engine
            .open(&loc(), &factory.target_type(), factory, &ScanOptions::default())
            .unwrap();
        let total: i64 = handle
            .collect_partitions()
            .unwrap()
            .into_iter()
            .flatten()
            .map(|v| *v.downcast::<i64>().unwrap())
            .sum();
        assert_eq!(total, 23);
    }
}
