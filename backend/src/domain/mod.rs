//! Domain layer: gelt budgeting, birthday management, import/export and the
//! Hebrew-calendar seam.

pub mod birthday_service;
pub mod budget;
pub mod commands;
pub mod export_service;
pub mod gelt_service;
pub mod hebcal;
pub mod import_service;
pub mod models;

pub use birthday_service::{BirthdayService, BirthdayValidationError};
pub use budget::calculate_budget;
pub use export_service::ExportService;
pub use gelt_service::{GeltService, GeltValidationError};
pub use hebcal::{HebcalClient, HebrewCalendar, NullHebrewCalendar};
pub use import_service::ImportService;
