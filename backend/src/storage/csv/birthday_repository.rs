use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use shared::Gender;

use super::connection::CsvConnection;
use crate::domain::models::birthday::Birthday;
use crate::storage::traits::BirthdayStorage;

const BIRTHDAYS_FILE: &str = "birthdays.csv";

/// Flat CSV row for a birthday. Dates and timestamps travel as strings;
/// optional fields use the empty string for "none".
#[derive(Debug, Serialize, Deserialize)]
struct BirthdayRecord {
    id: String,
    first_name: String,
    last_name: String,
    birth_date: String,
    after_sunset: bool,
    gender: String,
    hebrew_date: String,
    next_birthday: String,
    age: u32,
    archived: bool,
    created_at: String,
    updated_at: String,
}

impl BirthdayRecord {
    fn from_domain(birthday: &Birthday) -> Self {
        Self {
            id: birthday.id.clone(),
            first_name: birthday.first_name.clone(),
            last_name: birthday.last_name.clone(),
            birth_date: birthday.birth_date.format("%Y-%m-%d").to_string(),
            after_sunset: birthday.after_sunset,
            gender: birthday.gender.to_string(),
            hebrew_date: birthday.hebrew_date.clone().unwrap_or_default(),
            next_birthday: birthday
                .next_birthday
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            age: birthday.age,
            archived: birthday.archived,
            created_at: birthday.created_at.to_rfc3339(),
            updated_at: birthday.updated_at.to_rfc3339(),
        }
    }

    fn into_domain(self) -> Result<Birthday> {
        let gender = match self.gender.as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Unknown,
        };

        Ok(Birthday {
            birth_date: NaiveDate::parse_from_str(&self.birth_date, "%Y-%m-%d")
                .with_context(|| format!("Invalid birth_date in record {}", self.id))?,
            hebrew_date: if self.hebrew_date.is_empty() {
                None
            } else {
                Some(self.hebrew_date)
            },
            next_birthday: if self.next_birthday.is_empty() {
                None
            } else {
                Some(
                    NaiveDate::parse_from_str(&self.next_birthday, "%Y-%m-%d")
                        .with_context(|| format!("Invalid next_birthday in record {}", self.id))?,
                )
            },
            created_at: DateTime::parse_from_rfc3339(&self.created_at)
                .with_context(|| format!("Invalid created_at in record {}", self.id))?
                .with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339(&self.updated_at)
                .with_context(|| format!("Invalid updated_at in record {}", self.id))?
                .with_timezone(&Utc),
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            after_sunset: self.after_sunset,
            gender,
            age: self.age,
            archived: self.archived,
        })
    }
}

/// CSV-backed birthday repository. All entries live in one file; every write
/// rewrites the file atomically.
#[derive(Clone)]
pub struct BirthdayRepository {
    connection: Arc<CsvConnection>,
}

impl BirthdayRepository {
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self { connection }
    }

    fn load_all(&self) -> Result<Vec<Birthday>> {
        let path = self.connection.data_file(BIRTHDAYS_FILE);
        if !path.exists() {
            debug!("No birthdays file yet, returning empty list");
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("Failed to open {:?}", path))?;
        let mut birthdays = Vec::new();
        for record in reader.deserialize::<BirthdayRecord>() {
            match record.context("Malformed birthday record").and_then(BirthdayRecord::into_domain) {
                Ok(birthday) => birthdays.push(birthday),
                Err(e) => warn!("Skipping unreadable birthday row: {:#}", e),
            }
        }
        Ok(birthdays)
    }

    fn save_all(&self, birthdays: &[Birthday]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for birthday in birthdays {
            writer.serialize(BirthdayRecord::from_domain(birthday))?;
        }
        let bytes = writer.into_inner().context("Failed to flush CSV writer")?;
        self.connection.write_atomic(BIRTHDAYS_FILE, &bytes)
    }
}

impl BirthdayStorage for BirthdayRepository {
    fn store_birthday(&self, birthday: &Birthday) -> Result<()> {
        let mut birthdays = self.load_all()?;
        if birthdays.iter().any(|b| b.id == birthday.id) {
            return Err(anyhow!("Birthday already exists: {}", birthday.id));
        }
        birthdays.push(birthday.clone());
        self.save_all(&birthdays)?;
        info!("Stored birthday {}", birthday.id);
        Ok(())
    }

    fn get_birthday(&self, birthday_id: &str) -> Result<Option<Birthday>> {
        Ok(self
            .load_all()?
            .into_iter()
            .find(|b| b.id == birthday_id))
    }

    fn list_birthdays(&self) -> Result<Vec<Birthday>> {
        self.load_all()
    }

    fn update_birthday(&self, birthday: &Birthday) -> Result<()> {
        let mut birthdays = self.load_all()?;
        let slot = birthdays
            .iter_mut()
            .find(|b| b.id == birthday.id)
            .ok_or_else(|| anyhow!("Birthday not found for update: {}", birthday.id))?;
        *slot = birthday.clone();
        self.save_all(&birthdays)?;
        info!("Updated birthday {}", birthday.id);
        Ok(())
    }

    fn delete_birthday(&self, birthday_id: &str) -> Result<bool> {
        let mut birthdays = self.load_all()?;
        let before = birthdays.len();
        birthdays.retain(|b| b.id != birthday_id);
        if birthdays.len() == before {
            warn!("Attempted to delete a non-existent birthday: {}", birthday_id);
            return Ok(false);
        }
        self.save_all(&birthdays)?;
        info!("Deleted birthday {}", birthday_id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (BirthdayRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        (BirthdayRepository::new(Arc::new(connection)), temp_dir)
    }

    fn sample(id: &str) -> Birthday {
        let now = Utc::now();
        Birthday {
            id: id.to_string(),
            first_name: "Noam".to_string(),
            last_name: "Katz".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2015, 6, 15).unwrap(),
            after_sunset: true,
            gender: Gender::Male,
            hebrew_date: Some("28th of Sivan, 5775".to_string()),
            next_birthday: Some(NaiveDate::from_ymd_opt(2026, 6, 13).unwrap()),
            age: 10,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_store_and_get_round_trip() {
        let (repo, _dir) = setup();
        let birthday = sample("birthday::1");
        repo.store_birthday(&birthday).unwrap();

        let loaded = repo.get_birthday("birthday::1").unwrap().unwrap();
        assert_eq!(loaded.first_name, "Noam");
        assert_eq!(loaded.birth_date, birthday.birth_date);
        assert_eq!(loaded.hebrew_date, birthday.hebrew_date);
        assert_eq!(loaded.next_birthday, birthday.next_birthday);
        assert!(loaded.after_sunset);
    }

    #[test]
    fn test_optional_fields_survive_empty() {
        let (repo, _dir) = setup();
        let mut birthday = sample("birthday::2");
        birthday.hebrew_date = None;
        birthday.next_birthday = None;
        repo.store_birthday(&birthday).unwrap();

        let loaded = repo.get_birthday("birthday::2").unwrap().unwrap();
        assert_eq!(loaded.hebrew_date, None);
        assert_eq!(loaded.next_birthday, None);
    }

    #[test]
    fn test_duplicate_store_is_rejected() {
        let (repo, _dir) = setup();
        let birthday = sample("birthday::3");
        repo.store_birthday(&birthday).unwrap();
        assert!(repo.store_birthday(&birthday).is_err());
    }

    #[test]
    fn test_update_replaces_record() {
        let (repo, _dir) = setup();
        let mut birthday = sample("birthday::4");
        repo.store_birthday(&birthday).unwrap();

        birthday.archived = true;
        birthday.age = 11;
        repo.update_birthday(&birthday).unwrap();

        let loaded = repo.get_birthday("birthday::4").unwrap().unwrap();
        assert!(loaded.archived);
        assert_eq!(loaded.age, 11);
        assert_eq!(repo.list_birthdays().unwrap().len(), 1);
    }

    #[test]
    fn test_update_missing_record_fails() {
        let (repo, _dir) = setup();
        assert!(repo.update_birthday(&sample("birthday::5")).is_err());
    }

    #[test]
    fn test_delete_reports_found_state() {
        let (repo, _dir) = setup();
        repo.store_birthday(&sample("birthday::6")).unwrap();

        assert!(repo.delete_birthday("birthday::6").unwrap());
        assert!(!repo.delete_birthday("birthday::6").unwrap());
        assert!(repo.list_birthdays().unwrap().is_empty());
    }

    #[test]
    fn test_data_survives_new_repository_instance() {
        let temp_dir = TempDir::new().unwrap();
        {
            let connection = CsvConnection::new(temp_dir.path()).unwrap();
            let repo = BirthdayRepository::new(Arc::new(connection));
            repo.store_birthday(&sample("birthday::7")).unwrap();
        }

        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        let repo = BirthdayRepository::new(Arc::new(connection));
        let loaded = repo.get_birthday("birthday::7").unwrap();
        assert!(loaded.is_some());
    }
}
