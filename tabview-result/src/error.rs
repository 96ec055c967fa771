use std::{fmt, io};
use tabview_types::Side;
use thiserror::Error;

/// Unified error type for all tabview operations.
///
/// Errors are reported to the caller of the failing operation. Nothing in
/// this workspace recovers locally or substitutes a default value: a schema
/// that lacks a column fails the open call, a row that cannot be converted
/// fails that row, and a composed reader keeps the origin of the failure
/// visible through [`Error::Side`].
///
/// # Thread Safety
///
/// `Error` is `Send` and `Sync`, so per-row failures produced while an engine
/// decodes partitions in parallel can be handed back to the calling thread.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading a source file (for example during CSV
    /// ingestion into the in-memory engine).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Arrow library error while slicing, projecting, or parsing batches.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// A factory requires columns that the bound schema does not contain.
    ///
    /// Detected when a reader is created, so the view-open call fails before
    /// a single row is read. Retrying cannot help unless the factory or the
    /// location changes.
    #[error(
        "schema mismatch: missing column(s) [{}] required by {required_by}",
        .missing.join(", ")
    )]
    SchemaMismatch {
        /// Every required column that was absent, in declaration order.
        missing: Vec<String>,
        /// Human readable description of the requirement's owner.
        required_by: String,
    },

    /// A single row failed type conversion.
    ///
    /// Carries the column, the type the reader expected, and the underlying
    /// cause. Decoding is deterministic, so this error is never retried.
    #[error("failed to decode column '{column}' as {expected}: {cause}")]
    Decode {
        column: String,
        expected: String,
        cause: String,
    },

    /// Failure of one component of a composed reader.
    ///
    /// The key/value and tuple readers wrap whatever their inner reader
    /// reported so the caller can tell which projection failed.
    #[error("{side} reader failed: {source}")]
    Side {
        side: Side,
        #[source]
        source: Box<Error>,
    },

    /// Several components of a composed reader failed on the same row or
    /// schema.
    ///
    /// Every entry is an [`Error::Side`], in component order. Composed
    /// readers build this through [`Error::on_sides`], which keeps a single
    /// failure as a plain [`Error::Side`].
    #[error("{}", join_failures(.0))]
    Sides(Vec<Error>),

    /// The engine has no dataset at the requested location.
    #[error("source not found: {0}")]
    SourceNotFound(String),

    /// Invalid user input or API parameter.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Internal error indicating a bug or unexpected state.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

/// Column name used by [`Error::Decode`] when the whole element, rather than a
/// single column, failed to convert.
pub const ELEMENT_COLUMN: &str = "*";

fn join_failures(failures: &[Error]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a decode error for `column`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tabview_result::Error;
    ///
    /// let err = Error::decode("count", "i32", "invalid digit found in string");
    /// assert_eq!(
    ///     err.to_string(),
    ///     "failed to decode column 'count' as i32: invalid digit found in string"
    /// );
    /// ```
    #[inline]
    pub fn decode(
        column: impl Into<String>,
        expected: impl Into<String>,
        cause: impl fmt::Display,
    ) -> Self {
        Error::Decode {
            column: column.into(),
            expected: expected.into(),
            cause: cause.to_string(),
        }
    }

    /// Report that an erased element does not hold the type the caller
    /// asserted for it.
    #[inline]
    pub fn element_mismatch(expected: impl Into<String>, cause: impl fmt::Display) -> Self {
        Error::decode(ELEMENT_COLUMN, expected, cause)
    }

    /// Tag `err` with the component of a composed reader it came from.
    #[inline]
    pub fn on_side(side: Side, err: Error) -> Self {
        Error::Side {
            side,
            source: Box::new(err),
        }
    }

    /// Tag each failure with its component and combine them.
    ///
    /// One failure stays a single [`Error::Side`]; several become
    /// [`Error::Sides`] so none of them is lost.
    pub fn on_sides(failures: Vec<(Side, Error)>) -> Self {
        let mut tagged: Vec<Error> = failures
            .into_iter()
            .map(|(side, err)| Error::on_side(side, err))
            .collect();
        match tagged.len() {
            0 => Error::Internal("composed reader reported a failure without a cause".into()),
            1 => tagged.remove(0),
            _ => Error::Sides(tagged),
        }
    }

    /// Outermost component tag, if this error came out of a composed reader.
    /// When several components failed, this is the first of them.
    pub fn side(&self) -> Option<Side> {
        match self {
            Error::Side { side, .. } => Some(*side),
            Error::Sides(failures) => failures.first().and_then(Error::side),
            _ => None,
        }
    }

    /// Every component tag at the outermost level, in component order.
    ///
    /// ```
    /// use tabview_result::Error;
    /// use tabview_types::Side;
    ///
    /// let err = Error::on_sides(vec![
    ///     (Side::Key, Error::decode("word", "i64", "invalid digit found in string")),
    ///     (Side::Value, Error::decode("count", "i32", "invalid digit found in string")),
    /// ]);
    /// assert_eq!(err.sides(), vec![Side::Key, Side::Value]);
    /// assert!(err.to_string().contains("'word'"));
    /// assert!(err.to_string().contains("'count'"));
    /// ```
    pub fn sides(&self) -> Vec<Side> {
        match self {
            Error::Sides(failures) => failures.iter().filter_map(Error::side).collect(),
            other => other.side().into_iter().collect(),
        }
    }

    /// The individual failures: the entries of [`Error::Sides`], or `self`.
    pub fn failures(&self) -> &[Error] {
        match self {
            Error::Sides(failures) => failures,
            other => std::slice::from_ref(other),
        }
    }

    /// Innermost error once every [`Error::Side`] tag is stripped. For
    /// [`Error::Sides`] this follows the first failure; use
    /// [`failures`](Self::failures) to reach the others.
    ///
    /// ```
    /// use tabview_result::Error;
    /// use tabview_types::Side;
    ///
    /// let inner = Error::decode("count", "i32", "null value");
    /// let tagged = Error::on_side(Side::Value, inner);
    /// assert_eq!(tagged.side(), Some(Side::Value));
    /// assert!(matches!(tagged.root(), Error::Decode { column, .. } if column == "count"));
    /// ```
    pub fn root(&self) -> &Error {
        let mut current = self;
        loop {
            match current {
                Error::Side { source, .. } => current = source.as_ref(),
                Error::Sides(failures) => match failures.first() {
                    Some(first) => current = first,
                    None => return current,
                },
                _ => return current,
            }
        }
    }

    /// Every missing column reported by schema mismatches in this error, in
    /// component order, or `None` if no failure is a schema mismatch.
    pub fn missing_columns(&self) -> Option<Vec<String>> {
        let mut missing = Vec::new();
        let mut any = false;
        for failure in self.failures() {
            if let Error::SchemaMismatch { missing: cols, .. } = failure.root() {
                any = true;
                missing.extend(cols.iter().cloned());
            }
        }
        any.then_some(missing)
    }

    #[inline]
    pub fn internal<E: fmt::Display>(err: E) -> Self {
        Error::Internal(err.to_string())
    }
}
