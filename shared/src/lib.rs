use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A child in the gelt distribution roster.
///
/// `original_age` is only present while the age has been manually overridden;
/// the backend keeps the override state as an explicit enum and flattens it
/// into this optional field at the API boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeltChild {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub original_age: Option<u32>,
}

impl GeltChild {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// An inclusive age band with a per-child gelt amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeGroup {
    pub id: String,
    /// Display name, regenerated as "{min_age}-{max_age}" on every accepted edit
    pub name: String,
    pub min_age: u32,
    pub max_age: u32,
    /// Whole shekels; snapped to the nearest multiple of 5 at edit time
    pub amount_per_child: u32,
    pub is_included: bool,
}

/// Budget configuration for the gelt pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Number of people splitting the required total
    pub participants: u32,
    /// Allowed excess over the required total, in whole percent
    pub allowed_overflow_percentage: u32,
}

/// Per-group slice of the budget calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub children_count: u32,
    pub total: u32,
}

/// The derived budget figures. Always replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCalculation {
    pub total_required: u32,
    /// `ceil(total_required / participants)`, or 0 when participants is 0
    pub amount_per_participant: u32,
    /// `total_required * (1 + overflow / 100)`, kept exact
    pub max_allowed: f64,
    /// Keyed by age-group id; only groups with `is_included == true` appear
    pub group_totals: BTreeMap<String, GroupTotal>,
}

impl Default for BudgetCalculation {
    fn default() -> Self {
        Self {
            total_required: 0,
            amount_per_participant: 0,
            max_allowed: 0.0,
            group_totals: BTreeMap::new(),
        }
    }
}

/// Full gelt session state as exposed to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeltStateResponse {
    pub children: Vec<GeltChild>,
    pub age_groups: Vec<AgeGroup>,
    pub budget_config: BudgetConfig,
    pub calculation: BudgetCalculation,
    pub included_children: Vec<String>,
    pub has_custom_settings: bool,
}

/// Request to replace an age group's editable fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateAgeGroupRequest {
    pub min_age: u32,
    pub max_age: u32,
    pub amount_per_child: u32,
    pub is_included: bool,
}

/// Partial budget-config update; absent fields keep their current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBudgetConfigRequest {
    pub participants: Option<u32>,
    pub allowed_overflow_percentage: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetChildAgeRequest {
    pub age: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetChildIncludedRequest {
    pub included: bool,
}

/// CSV import payload. The file content travels as text; parsing happens
/// server-side so rejected rows can be reported per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportCsvRequest {
    pub csv_content: String,
}

/// One rejected import row with the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// 1-based line number in the uploaded file (header is line 1)
    pub line: usize,
    pub reason: String,
}

/// Outcome of a roster import: how many rows made it in, and why the rest
/// did not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportChildrenResponse {
    pub accepted_count: usize,
    pub rejected_count: usize,
    pub rejected_rows: Vec<RejectedRow>,
    pub state: GeltStateResponse,
}

/// Export snapshot: budget section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBudget {
    pub total: u32,
    pub per_participant: u32,
    pub participants: u32,
    pub allowed_overflow: u32,
}

/// Export snapshot: one age group with its calculated slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportAgeGroup {
    pub name: String,
    pub min_age: u32,
    pub max_age: u32,
    pub amount_per_child: u32,
    pub is_included: bool,
    pub children_count: u32,
    pub total: u32,
}

/// Export snapshot: one child with its modified-age flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportChild {
    pub name: String,
    pub age: u32,
    pub age_modified: bool,
    pub original_age: Option<u32>,
}

/// The full export snapshot, serializable to JSON or two tabular sheets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeltExportSnapshot {
    pub budget: ExportBudget,
    pub age_groups: Vec<ExportAgeGroup>,
    pub children: Vec<ExportChild>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportToPathRequest {
    pub format: ExportFormat,
    pub custom_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportToPathResponse {
    pub success: bool,
    pub message: String,
    pub file_paths: Vec<String>,
}

/// Gender as recorded on a birthday entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
            Gender::Unknown => write!(f, "unknown"),
        }
    }
}

/// A tracked birthday with its Hebrew-calendar enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Birthday {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// ISO 8601 date (YYYY-MM-DD)
    pub birth_date: String,
    /// Born after sunset: the Hebrew date rolls to the next day
    pub after_sunset: bool,
    pub gender: Gender,
    /// Hebrew date display string from the calendar collaborator
    pub hebrew_date: Option<String>,
    /// Next occurrence of the Hebrew birthday (ISO 8601 date)
    pub next_birthday: Option<String>,
    pub age: u32,
    pub archived: bool,
    /// RFC 3339 timestamps
    pub created_at: String,
    pub updated_at: String,
}

/// Request for creating a new birthday entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBirthdayRequest {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
    #[serde(default)]
    pub after_sunset: bool,
    pub gender: Gender,
}

/// Request for updating an existing birthday; absent fields are unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBirthdayRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<String>,
    pub after_sunset: Option<bool>,
    pub gender: Option<Gender>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthdayResponse {
    pub birthday: Birthday,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthdayListResponse {
    pub birthdays: Vec<Birthday>,
}

/// Request for deleting multiple birthdays at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteBirthdaysRequest {
    pub birthday_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteBirthdaysResponse {
    pub deleted_count: usize,
    pub not_found_ids: Vec<String>,
    pub success_message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Timeframe {
    All,
    ThisMonth,
    NextMonth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Name,
    Date,
    Age,
    NextBirthday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl Birthday {
    /// Generate a birthday ID from a millisecond timestamp
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("birthday::{}", epoch_millis)
    }

    /// Parse a birthday ID back to its timestamp
    pub fn parse_id(id: &str) -> Result<u64, BirthdayIdError> {
        let parts: Vec<&str> = id.split("::").collect();
        if parts.len() != 2 || parts[0] != "birthday" {
            return Err(BirthdayIdError::InvalidFormat);
        }

        parts[1]
            .parse::<u64>()
            .map_err(|_| BirthdayIdError::InvalidTimestamp)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BirthdayIdError {
    InvalidFormat,
    InvalidTimestamp,
}

impl fmt::Display for BirthdayIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BirthdayIdError::InvalidFormat => write!(f, "Invalid birthday ID format"),
            BirthdayIdError::InvalidTimestamp => write!(f, "Invalid timestamp in birthday ID"),
        }
    }
}

impl std::error::Error for BirthdayIdError {}
