use anyhow::Result;

use crate::domain::models::birthday::Birthday;

/// Interface for birthday persistence.
///
/// Abstracts the storage backend away from the domain layer; the bundled
/// implementation writes CSV files, but anything honoring these semantics
/// (including a managed document store) can stand in.
pub trait BirthdayStorage: Send + Sync {
    /// Store a new birthday entry
    fn store_birthday(&self, birthday: &Birthday) -> Result<()>;

    /// Retrieve a specific birthday by ID
    fn get_birthday(&self, birthday_id: &str) -> Result<Option<Birthday>>;

    /// List all birthday entries, archived ones included
    fn list_birthdays(&self) -> Result<Vec<Birthday>>;

    /// Update an existing birthday entry
    fn update_birthday(&self, birthday: &Birthday) -> Result<()>;

    /// Delete a birthday by ID; returns false when the ID was not found
    fn delete_birthday(&self, birthday_id: &str) -> Result<bool>;
}
