use std::fmt;

/// Component of a composed reader.
///
/// Key/value readers tag failures with [`Side::Key`] or [`Side::Value`];
/// wider tuple readers use [`Side::Element`] with the zero-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Key,
    Value,
    Element(usize),
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Key => f.write_str("key"),
            Side::Value => f.write_str("value"),
            Side::Element(idx) => write!(f, "element {idx}"),
        }
    }
}
