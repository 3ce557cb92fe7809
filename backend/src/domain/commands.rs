//! Domain-level command and query types.
//!
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer maps the public DTOs defined
//! in the `shared` crate to these internal types.

pub mod gelt {
    /// Input for editing an age group's band, amount and inclusion flag.
    #[derive(Debug, Clone)]
    pub struct UpdateAgeGroupCommand {
        pub group_id: String,
        pub min_age: u32,
        pub max_age: u32,
        pub amount_per_child: u32,
        pub is_included: bool,
    }

    /// Partial budget-config update; `None` keeps the current value.
    #[derive(Debug, Clone, Default)]
    pub struct UpdateBudgetConfigCommand {
        pub participants: Option<u32>,
        pub allowed_overflow_percentage: Option<u32>,
    }

    /// Input for overriding a child's age.
    #[derive(Debug, Clone)]
    pub struct SetChildAgeCommand {
        pub child_id: String,
        pub age: u32,
    }

    /// Input for toggling a child's inclusion in the calculation.
    #[derive(Debug, Clone)]
    pub struct SetChildIncludedCommand {
        pub child_id: String,
        pub included: bool,
    }
}

pub mod birthday {
    use shared::{Gender, SortBy, SortOrder, Timeframe};

    /// Input for creating a new birthday entry.
    #[derive(Debug, Clone)]
    pub struct CreateBirthdayCommand {
        pub first_name: String,
        pub last_name: String,
        /// ISO 8601 date (YYYY-MM-DD)
        pub birth_date: String,
        pub after_sunset: bool,
        pub gender: Gender,
    }

    /// Input for updating an existing birthday; `None` fields are unchanged.
    #[derive(Debug, Clone, Default)]
    pub struct UpdateBirthdayCommand {
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        pub birth_date: Option<String>,
        pub after_sunset: Option<bool>,
        pub gender: Option<Gender>,
    }

    /// Filter and sort parameters for listing birthdays.
    #[derive(Debug, Clone)]
    pub struct BirthdayListQuery {
        pub search_term: Option<String>,
        pub gender: Option<Gender>,
        pub timeframe: Timeframe,
        pub sort_by: SortBy,
        pub sort_order: SortOrder,
        pub include_archived: bool,
    }

    impl Default for BirthdayListQuery {
        fn default() -> Self {
            Self {
                search_term: None,
                gender: None,
                timeframe: Timeframe::All,
                sort_by: SortBy::Name,
                sort_order: SortOrder::Asc,
                include_archived: false,
            }
        }
    }

    /// Command for deleting multiple birthdays.
    #[derive(Debug, Clone)]
    pub struct DeleteBirthdaysCommand {
        pub birthday_ids: Vec<String>,
    }

    /// Result of deleting birthdays.
    #[derive(Debug, Clone)]
    pub struct DeleteBirthdaysResult {
        pub deleted_count: usize,
        pub not_found_ids: Vec<String>,
        pub success_message: String,
    }
}
