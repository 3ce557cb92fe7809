//! Birthday CRUD and Hebrew-date enrichment.
//!
//! Storage sits behind `BirthdayStorage` and the calendar conversion behind
//! `HebrewCalendar`; this service owns validation, enrichment orchestration
//! and the list filtering/sorting rules. A failed collaborator call surfaces
//! its error and leaves stored state untouched.

use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use log::{info, warn};
use thiserror::Error;

use shared::{SortBy, SortOrder, Timeframe};

use crate::domain::commands::birthday::{
    BirthdayListQuery, CreateBirthdayCommand, DeleteBirthdaysCommand, DeleteBirthdaysResult,
    UpdateBirthdayCommand,
};
use crate::domain::hebcal::HebrewCalendar;
use crate::domain::models::birthday::Birthday;
use crate::storage::traits::BirthdayStorage;

/// Validation rejections for birthday mutations. Kept as a typed enum so the
/// REST layer can tell a bad request apart from a failed collaborator or
/// storage call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BirthdayValidationError {
    #[error("{field} must be at least 2 characters")]
    NameTooShort { field: &'static str },
    #[error("{field} cannot exceed 100 characters")]
    NameTooLong { field: &'static str },
    #[error("Invalid birth date: '{raw}' (expected YYYY-MM-DD)")]
    InvalidBirthDate { raw: String },
    #[error("Birthday not found: {0}")]
    NotFound(String),
}

/// Service for managing the birthday list.
#[derive(Clone)]
pub struct BirthdayService {
    repository: Arc<dyn BirthdayStorage>,
    calendar: Arc<dyn HebrewCalendar>,
}

impl BirthdayService {
    pub fn new(repository: Arc<dyn BirthdayStorage>, calendar: Arc<dyn HebrewCalendar>) -> Self {
        Self {
            repository,
            calendar,
        }
    }

    /// Create a new birthday entry, enriched with its Hebrew date.
    pub async fn create_birthday(&self, command: CreateBirthdayCommand) -> Result<Birthday> {
        info!(
            "Creating birthday: {} {} ({})",
            command.first_name, command.last_name, command.birth_date
        );

        let first_name = validate_name(&command.first_name, "First name")?;
        let last_name = validate_name(&command.last_name, "Last name")?;
        let birth_date = parse_birth_date(&command.birth_date)?;

        let enrichment = self
            .calendar
            .enrich(birth_date, command.after_sunset)
            .await
            .context("Hebrew calendar enrichment failed")?;

        let now = Utc::now();
        let birthday = Birthday {
            id: Birthday::generate_id(now.timestamp_millis() as u64),
            first_name,
            last_name,
            birth_date,
            after_sunset: command.after_sunset,
            gender: command.gender,
            hebrew_date: enrichment.hebrew_date,
            next_birthday: enrichment.next_birthday,
            age: Birthday::age_for(birth_date, now.date_naive()),
            archived: false,
            created_at: now,
            updated_at: now,
        };

        self.repository.store_birthday(&birthday)?;
        info!("Created birthday {} for {}", birthday.id, birthday.full_name());
        Ok(birthday)
    }

    /// Update an existing entry; the Hebrew enrichment is refreshed when the
    /// birth date or the after-sunset flag changes.
    pub async fn update_birthday(
        &self,
        birthday_id: &str,
        command: UpdateBirthdayCommand,
    ) -> Result<Birthday> {
        info!("Updating birthday: {}", birthday_id);

        let mut birthday = self
            .repository
            .get_birthday(birthday_id)?
            .ok_or_else(|| BirthdayValidationError::NotFound(birthday_id.to_string()))?;

        if let Some(ref first_name) = command.first_name {
            birthday.first_name = validate_name(first_name, "First name")?;
        }
        if let Some(ref last_name) = command.last_name {
            birthday.last_name = validate_name(last_name, "Last name")?;
        }

        let mut needs_enrichment = false;
        if let Some(ref birth_date) = command.birth_date {
            let parsed = parse_birth_date(birth_date)?;
            if parsed != birthday.birth_date {
                birthday.birth_date = parsed;
                needs_enrichment = true;
            }
        }
        if let Some(after_sunset) = command.after_sunset {
            if after_sunset != birthday.after_sunset {
                birthday.after_sunset = after_sunset;
                needs_enrichment = true;
            }
        }
        if let Some(gender) = command.gender {
            birthday.gender = gender;
        }

        if needs_enrichment {
            let enrichment = self
                .calendar
                .enrich(birthday.birth_date, birthday.after_sunset)
                .await
                .context("Hebrew calendar enrichment failed")?;
            birthday.hebrew_date = enrichment.hebrew_date;
            birthday.next_birthday = enrichment.next_birthday;
        }

        let now = Utc::now();
        birthday.age = birthday.age_on(now.date_naive());
        birthday.updated_at = now;

        self.repository.update_birthday(&birthday)?;
        Ok(birthday)
    }

    /// List birthdays with the given filters and sort order.
    pub fn list_birthdays(&self, query: BirthdayListQuery) -> Result<Vec<Birthday>> {
        let birthdays = self.repository.list_birthdays()?;
        Ok(filter_birthdays(
            birthdays,
            &query,
            Utc::now().date_naive(),
        ))
    }

    /// Archive an entry. Archived birthdays stay stored but drop out of the
    /// default list and of gelt imports.
    pub fn archive_birthday(&self, birthday_id: &str) -> Result<Birthday> {
        info!("Archiving birthday: {}", birthday_id);
        let mut birthday = self
            .repository
            .get_birthday(birthday_id)?
            .ok_or_else(|| BirthdayValidationError::NotFound(birthday_id.to_string()))?;
        birthday.archived = true;
        birthday.updated_at = Utc::now();
        self.repository.update_birthday(&birthday)?;
        Ok(birthday)
    }

    /// Delete multiple entries; unknown ids are reported, not fatal.
    pub fn delete_birthdays(&self, command: DeleteBirthdaysCommand) -> Result<DeleteBirthdaysResult> {
        let mut deleted_count = 0;
        let mut not_found_ids = Vec::new();

        for id in &command.birthday_ids {
            if self.repository.delete_birthday(id)? {
                deleted_count += 1;
            } else {
                warn!("Birthday not found during batch delete: {}", id);
                not_found_ids.push(id.clone());
            }
        }

        Ok(DeleteBirthdaysResult {
            deleted_count,
            success_message: format!("Deleted {} birthday(s)", deleted_count),
            not_found_ids,
        })
    }
}

fn validate_name(name: &str, field: &'static str) -> Result<String, BirthdayValidationError> {
    let trimmed = name.trim();
    if trimmed.chars().count() < 2 {
        return Err(BirthdayValidationError::NameTooShort { field });
    }
    if trimmed.len() > 100 {
        return Err(BirthdayValidationError::NameTooLong { field });
    }
    Ok(trimmed.to_string())
}

fn parse_birth_date(raw: &str) -> Result<NaiveDate, BirthdayValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        BirthdayValidationError::InvalidBirthDate {
            raw: raw.to_string(),
        }
    })
}

/// Apply search/gender/timeframe filters and the requested sort.
///
/// Timeframe filtering compares the month of the next birthday against
/// `today`; entries without a next birthday pass the filter rather than
/// disappearing.
fn filter_birthdays(
    birthdays: Vec<Birthday>,
    query: &BirthdayListQuery,
    today: NaiveDate,
) -> Vec<Birthday> {
    let search = query
        .search_term
        .as_deref()
        .map(str::to_lowercase)
        .filter(|s| !s.is_empty());

    let mut result: Vec<Birthday> = birthdays
        .into_iter()
        .filter(|b| query.include_archived || !b.archived)
        .filter(|b| match &search {
            Some(term) => b.full_name().to_lowercase().contains(term),
            None => true,
        })
        .filter(|b| match query.gender {
            Some(gender) => b.gender == gender,
            None => true,
        })
        .filter(|b| match (query.timeframe, b.next_birthday) {
            (Timeframe::All, _) | (_, None) => true,
            (Timeframe::ThisMonth, Some(next)) => next.month() == today.month(),
            (Timeframe::NextMonth, Some(next)) => next.month() == today.month() % 12 + 1,
        })
        .collect();

    result.sort_by(|a, b| {
        let ordering = match query.sort_by {
            SortBy::Name => a
                .full_name()
                .to_lowercase()
                .cmp(&b.full_name().to_lowercase()),
            SortBy::Date => a.birth_date.cmp(&b.birth_date),
            SortBy::Age => a.age.cmp(&b.age),
            SortBy::NextBirthday => match (a.next_birthday, b.next_birthday) {
                // Missing next birthdays sort last regardless of direction
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Greater,
                (Some(_), None) => return Ordering::Less,
                (Some(a_next), Some(b_next)) => a_next.cmp(&b_next),
            },
        };
        match query.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    result
}
