use std::fmt;

/// Logical address of a table in the backing store.
///
/// The namespace plays the role of a keyspace or schema; the table is the
/// collection inside it. Both parts compare case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableLocation {
    namespace: String,
    table: String,
}

impl TableLocation {
    pub fn new(namespace: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            table: table.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl fmt::Display for TableLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.table)
    }
}

impl<N: Into<String>, T: Into<String>> From<(N, T)> for TableLocation {
    fn from((namespace, table): (N, T)) -> Self {
        Self::new(namespace, table)
    }
}
