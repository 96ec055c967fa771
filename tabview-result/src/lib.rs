//! Error types and result definitions shared by every tabview crate.
//!
//! All crates return [`Result<T>`] and report failures through the single
//! [`Error`] enum, so errors cross crate boundaries with `?` and callers can
//! match on the variant that matters to them.
//!
//! # Error Categories
//!
//! - **Binding errors** ([`Error::SchemaMismatch`]): a factory needs columns the
//!   bound schema does not have. Raised when a reader is created, before any
//!   row is processed.
//! - **Per-row errors** ([`Error::Decode`]): one row could not be converted to
//!   the target type. The engine decides whether the rest of the dataset keeps
//!   flowing.
//! - **Composition tags** ([`Error::Side`]): wraps an inner failure of a
//!   composed reader with the component (key, value, tuple element) it came
//!   from.
//! - **Lookup failures** ([`Error::SourceNotFound`]): the engine has no table
//!   at the requested location.
//! - **Data format errors** ([`Error::Io`], [`Error::Arrow`]).
//! - **User input errors** ([`Error::InvalidArgumentError`]).
//! - **Internal errors** ([`Error::Internal`]).

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
