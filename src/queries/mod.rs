//! Query modules.
//!
//! Each module provides a query struct that borrows from a
//! [`Connection`](crate::connection::Connection) and exposes methods
//! returning `Result<T>`.

pub mod aggregate;
pub mod mobility;

pub use aggregate::AggregateQuery;
pub use mobility::MobilityQuery;
