//! Storage abstraction for the birthday list.
//!
//! The domain layer only sees the `BirthdayStorage` trait; the CSV module
//! provides the concrete file-backed implementation.

pub mod csv;
pub mod traits;

pub use csv::{BirthdayRepository, CsvConnection};
pub use traits::BirthdayStorage;
