use arrow::csv::reader::Format;

/// What the engine does with a row whose decode fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowErrorPolicy {
    /// Yield the error in place of the row and keep scanning.
    #[default]
    Fail,
    /// Log the error and drop the row.
    Skip,
}

/// Run-time configuration for [`MemEngine`](crate::MemEngine).
#[derive(Debug, Clone, Default)]
pub struct MemEngineConfig {
    /// Upper bound on rows per partition. Registered batches larger than
    /// this are sliced; `None` keeps one partition per batch.
    pub max_partition_rows: Option<usize>,
    pub row_error_policy: RowErrorPolicy,
}

impl MemEngineConfig {
    pub fn with_max_partition_rows(mut self, rows: usize) -> Self {
        self.max_partition_rows = Some(rows);
        self
    }

    pub fn with_row_error_policy(mut self, policy: RowErrorPolicy) -> Self {
        self.row_error_policy = policy;
        self
    }
}

#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    pub has_header: bool,
    pub delimiter: u8,
    pub max_read_records: Option<usize>,
    pub batch_size: Option<usize>,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            max_read_records: None,
            batch_size: None,
        }
    }
}

impl CsvReadOptions {
    pub(crate) fn to_format(&self) -> Format {
        let mut format = Format::default().with_header(self.has_header);
        if self.delimiter != b',' {
            format = format.with_delimiter(self.delimiter);
        }
        format
    }
}
