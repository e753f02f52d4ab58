//! Shared helpers outside the domain layer.

pub mod testing;
