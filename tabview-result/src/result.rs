use crate::error::Error;

/// Result type alias used throughout tabview.
///
/// Every fallible operation in the workspace (opening a view, binding a
/// reader, decoding a row) returns this type.
pub type Result<T> = std::result::Result<T, Error>;
