//! Export of the gelt distribution state.
//!
//! Produces a snapshot of the current budget, age groups and children, and
//! writes it out as JSON or as two tabular CSV sheets (budget summary plus
//! children with modified-age flags). Output only; nothing here is read back
//! by the import path.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{error, info};

use shared::{
    ExportAgeGroup, ExportBudget, ExportChild, ExportFormat, ExportToPathResponse,
    GeltExportSnapshot,
};

use crate::domain::gelt_service::GeltService;

const EXPORT_BASENAME: &str = "gelt-distribution-export";

/// Service that turns gelt session state into export artifacts.
#[derive(Clone, Default)]
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    /// Capture the current session state as an export snapshot.
    pub fn build_snapshot(&self, gelt: &GeltService) -> GeltExportSnapshot {
        let calculation = gelt.calculation();
        let config = gelt.budget_config();

        let age_groups = gelt
            .age_groups()
            .iter()
            .map(|group| {
                let slice = calculation.group_totals.get(&group.id);
                ExportAgeGroup {
                    name: group.name.clone(),
                    min_age: group.min_age,
                    max_age: group.max_age,
                    amount_per_child: group.amount_per_child,
                    is_included: group.is_included,
                    children_count: slice.map(|s| s.children_count).unwrap_or(0),
                    total: slice.map(|s| s.total).unwrap_or(0),
                }
            })
            .collect();

        let children = gelt
            .children()
            .iter()
            .map(|child| ExportChild {
                name: child.full_name(),
                age: child.age,
                age_modified: child.is_age_modified(),
                original_age: child.original_age(),
            })
            .collect();

        GeltExportSnapshot {
            budget: ExportBudget {
                total: calculation.total_required,
                per_participant: calculation.amount_per_participant,
                participants: config.participants,
                allowed_overflow: config.allowed_overflow_percentage,
            },
            age_groups,
            children,
        }
    }

    pub fn to_json(&self, snapshot: &GeltExportSnapshot) -> Result<String> {
        serde_json::to_string_pretty(snapshot).context("Failed to serialize export snapshot")
    }

    /// First sheet: budget summary plus the per-group breakdown.
    pub fn budget_sheet_csv(&self, snapshot: &GeltExportSnapshot) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        writer.write_record(["Budget Summary"])?;
        writer.write_record([
            "Total Required".to_string(),
            format!("₪{}", snapshot.budget.total),
        ])?;
        writer.write_record([
            "Amount per Participant".to_string(),
            format!("₪{}", snapshot.budget.per_participant),
        ])?;
        writer.write_record([
            "Number of Participants".to_string(),
            snapshot.budget.participants.to_string(),
        ])?;
        writer.write_record([
            "Allowed Overflow".to_string(),
            format!("{}%", snapshot.budget.allowed_overflow),
        ])?;
        writer.write_record([""])?;
        writer.write_record(["Age Groups"])?;
        writer.write_record([
            "Age Range",
            "Amount per Child",
            "Children Count",
            "Total Amount",
            "Included",
        ])?;
        for group in &snapshot.age_groups {
            writer.write_record([
                format!("{}-{}", group.min_age, group.max_age),
                format!("₪{}", group.amount_per_child),
                group.children_count.to_string(),
                format!("₪{}", group.total),
                if group.is_included { "Yes" } else { "No" }.to_string(),
            ])?;
        }

        let bytes = writer.into_inner().context("Failed to flush CSV writer")?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Second sheet: children with their modified-age flags.
    pub fn children_sheet_csv(&self, snapshot: &GeltExportSnapshot) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer.write_record(["Name", "Age", "Modified Age", "Original Age"])?;
        for child in &snapshot.children {
            writer.write_record([
                child.name.clone(),
                child.age.to_string(),
                if child.age_modified { "Yes" } else { "No" }.to_string(),
                child
                    .original_age
                    .map(|a| a.to_string())
                    .unwrap_or_default(),
            ])?;
        }

        let bytes = writer.into_inner().context("Failed to flush CSV writer")?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Write the snapshot to disk, defaulting to the Documents directory.
    ///
    /// File-system problems are reported in the response rather than as an
    /// error so the caller can show the message as-is.
    pub fn export_to_path(
        &self,
        snapshot: &GeltExportSnapshot,
        format: ExportFormat,
        custom_path: Option<&str>,
    ) -> Result<ExportToPathResponse> {
        let export_dir = match custom_path {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path.trim()),
            _ => dirs::document_dir()
                .or_else(dirs::home_dir)
                .context("Could not determine default export directory")?,
        };

        if let Err(e) = fs::create_dir_all(&export_dir) {
            error!("Failed to create export directory {:?}: {}", export_dir, e);
            return Ok(ExportToPathResponse {
                success: false,
                message: format!("Failed to create export directory: {}", e),
                file_paths: Vec::new(),
            });
        }

        let files: Vec<(PathBuf, String)> = match format {
            ExportFormat::Json => vec![(
                export_dir.join(format!("{}.json", EXPORT_BASENAME)),
                self.to_json(snapshot)?,
            )],
            ExportFormat::Csv => vec![
                (
                    export_dir.join(format!("{}-budget.csv", EXPORT_BASENAME)),
                    self.budget_sheet_csv(snapshot)?,
                ),
                (
                    export_dir.join(format!("{}-children.csv", EXPORT_BASENAME)),
                    self.children_sheet_csv(snapshot)?,
                ),
            ],
        };

        let mut file_paths = Vec::new();
        for (path, content) in &files {
            if let Err(e) = fs::write(path, content) {
                error!("Failed to write export file {:?}: {}", path, e);
                return Ok(ExportToPathResponse {
                    success: false,
                    message: format!("Failed to write export file: {}", e),
                    file_paths,
                });
            }
            file_paths.push(path.to_string_lossy().to_string());
        }

        info!("Exported gelt snapshot to {:?}", file_paths);
        Ok(ExportToPathResponse {
            success: true,
            message: format!("Exported {} file(s)", file_paths.len()),
            file_paths,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::gelt::{SetChildAgeCommand, UpdateBudgetConfigCommand};
    use crate::domain::models::child::Child;

    fn sample_gelt() -> GeltService {
        let mut gelt = GeltService::new();
        gelt.set_children(vec![
            Child::new("Avi", "Mizrahi", 5),
            Child::new("Batya", "Mizrahi", 15),
        ]);
        gelt.update_budget_config(UpdateBudgetConfigCommand {
            participants: Some(2),
            allowed_overflow_percentage: None,
        });
        gelt
    }

    #[test]
    fn test_snapshot_mirrors_calculation() {
        let gelt = sample_gelt();
        let snapshot = ExportService::new().build_snapshot(&gelt);

        assert_eq!(snapshot.budget.total, 35);
        assert_eq!(snapshot.budget.per_participant, 18);
        assert_eq!(snapshot.budget.participants, 2);
        assert_eq!(snapshot.children.len(), 2);
        assert_eq!(snapshot.age_groups.len(), 6);

        let band_3_6 = snapshot
            .age_groups
            .iter()
            .find(|g| g.name == "3-6")
            .unwrap();
        assert_eq!(band_3_6.children_count, 1);
        assert_eq!(band_3_6.total, 5);
    }

    #[test]
    fn test_snapshot_marks_modified_ages() {
        let mut gelt = sample_gelt();
        let child_id = gelt.children()[0].id.clone();
        gelt.set_child_age(SetChildAgeCommand {
            child_id,
            age: 8,
        })
        .unwrap();

        let snapshot = ExportService::new().build_snapshot(&gelt);
        let child = &snapshot.children[0];
        assert!(child.age_modified);
        assert_eq!(child.age, 8);
        assert_eq!(child.original_age, Some(5));
    }

    #[test]
    fn test_json_round_trips() {
        let gelt = sample_gelt();
        let service = ExportService::new();
        let snapshot = service.build_snapshot(&gelt);

        let json = service.to_json(&snapshot).unwrap();
        let parsed: shared::GeltExportSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn test_budget_sheet_layout() {
        let gelt = sample_gelt();
        let service = ExportService::new();
        let sheet = service.budget_sheet_csv(&service.build_snapshot(&gelt)).unwrap();

        let lines: Vec<&str> = sheet.lines().collect();
        assert_eq!(lines[0], "Budget Summary");
        assert_eq!(lines[1], "Total Required,₪35");
        assert!(lines.iter().any(|l| l.starts_with("3-6,₪5,1,₪5,Yes")));
    }

    #[test]
    fn test_children_sheet_layout() {
        let gelt = sample_gelt();
        let service = ExportService::new();
        let sheet = service
            .children_sheet_csv(&service.build_snapshot(&gelt))
            .unwrap();

        let lines: Vec<&str> = sheet.lines().collect();
        assert_eq!(lines[0], "Name,Age,Modified Age,Original Age");
        assert_eq!(lines[1], "Avi Mizrahi,5,No,");
    }

    #[test]
    fn test_export_to_path_writes_both_csv_sheets() {
        let gelt = sample_gelt();
        let service = ExportService::new();
        let snapshot = service.build_snapshot(&gelt);
        let dir = tempfile::tempdir().unwrap();

        let response = service
            .export_to_path(
                &snapshot,
                ExportFormat::Csv,
                Some(dir.path().to_str().unwrap()),
            )
            .unwrap();

        assert!(response.success);
        assert_eq!(response.file_paths.len(), 2);
        for path in &response.file_paths {
            assert!(std::path::Path::new(path).exists());
        }
    }

    #[test]
    fn test_export_to_path_writes_json() {
        let gelt = sample_gelt();
        let service = ExportService::new();
        let snapshot = service.build_snapshot(&gelt);
        let dir = tempfile::tempdir().unwrap();

        let response = service
            .export_to_path(
                &snapshot,
                ExportFormat::Json,
                Some(dir.path().to_str().unwrap()),
            )
            .unwrap();

        assert!(response.success);
        let content = fs::read_to_string(&response.file_paths[0]).unwrap();
        let parsed: shared::GeltExportSnapshot = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
