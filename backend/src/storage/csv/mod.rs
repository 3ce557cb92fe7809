//! CSV-based storage for the birthday tracker.
//!
//! One `birthdays.csv` under the data directory holds every entry, archived
//! ones included. Writes go through a temp file and an atomic rename so a
//! crash mid-write never leaves a torn file behind.

pub mod birthday_repository;
pub mod connection;

pub use birthday_repository::BirthdayRepository;
pub use connection::CsvConnection;
