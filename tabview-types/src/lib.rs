//! Types shared across tabview crates.
//!
//! These live in `tabview-types` so the result, reader, engine, and view
//! crates can exchange them without depending on one another.

pub mod descriptor;
pub mod location;
pub mod side;

pub use descriptor::TypeDescriptor;
pub use location::TableLocation;
pub use side::Side;
