//! Backend for the gelt distribution tracker.
//!
//! Ties the domain services to CSV storage and the Hebrew-calendar client,
//! and exposes them over HTTP (see [`rest`]). The gelt session is in-memory
//! per process; birthdays persist under the data directory.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use log::info;
use tokio::sync::Mutex;

pub mod domain;
pub mod rest;
pub mod storage;

use domain::hebcal::HebrewCalendar;
use domain::{BirthdayService, ExportService, GeltService, ImportService};
use storage::csv::{BirthdayRepository, CsvConnection};

/// All backend services wired together.
pub struct Backend {
    pub birthday_service: BirthdayService,
    /// Gelt session state; mutations lock, recalc and unlock.
    pub gelt: Mutex<GeltService>,
    pub import_service: ImportService,
    pub export_service: ExportService,
}

impl Backend {
    /// Wire the backend against a data directory and a calendar collaborator.
    pub fn new(data_dir: impl AsRef<Path>, calendar: Arc<dyn HebrewCalendar>) -> Result<Self> {
        let connection = Arc::new(CsvConnection::new(data_dir)?);
        let repository = Arc::new(BirthdayRepository::new(connection));
        info!("Backend initialized");

        Ok(Self {
            birthday_service: BirthdayService::new(repository, calendar),
            gelt: Mutex::new(GeltService::new()),
            import_service: ImportService::new(),
            export_service: ExportService::new(),
        })
    }
}
