use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::Gender;

/// Domain model for a tracked birthday.
///
/// `hebrew_date` and `next_birthday` are enrichment fields filled in by the
/// Hebrew-calendar collaborator; they stay `None` when the collaborator is
/// unavailable so a stored birthday is never blocked on the conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Birthday {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    /// Born after sunset: the Hebrew date rolls forward one day
    pub after_sunset: bool,
    pub gender: Gender,
    pub hebrew_date: Option<String>,
    pub next_birthday: Option<NaiveDate>,
    pub age: u32,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Birthday {
    /// Generate a unique birthday ID
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("birthday::{}", epoch_millis)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Age in calendar years, floored at zero.
    pub fn age_for(birth_date: NaiveDate, today: NaiveDate) -> u32 {
        use chrono::Datelike;
        (today.year() - birth_date.year()).max(0) as u32
    }

    /// Age in calendar years as of `today`.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        Self::age_for(self.birth_date, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(birth_date: NaiveDate) -> Birthday {
        let now = Utc::now();
        Birthday {
            id: Birthday::generate_id(1702516122000),
            first_name: "Noam".to_string(),
            last_name: "Katz".to_string(),
            birth_date,
            after_sunset: false,
            gender: Gender::Male,
            hebrew_date: None,
            next_birthday: None,
            age: 0,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_age_on_uses_calendar_years() {
        let b = sample(NaiveDate::from_ymd_opt(2015, 6, 15).unwrap());
        assert_eq!(b.age_on(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()), 10);
        assert_eq!(b.age_on(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()), 10);
    }

    #[test]
    fn test_age_never_negative() {
        let b = sample(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        assert_eq!(b.age_on(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()), 0);
    }

    #[test]
    fn test_generate_id_format() {
        assert_eq!(Birthday::generate_id(42), "birthday::42");
    }
}
