//! Gelt session state and its mutation rules.
//!
//! All roster/config/calculation state lives in one explicit container owned
//! by the application shell. Every mutation runs synchronously and ends with
//! a full recalculation, so `calculation()` is always consistent with the
//! inputs and is replaced wholesale, never patched field by field.

use std::collections::HashSet;

use log::{info, warn};
use thiserror::Error;

use shared::{AgeGroup, BudgetCalculation, BudgetConfig};

use crate::domain::budget::calculate_budget;
use crate::domain::commands::gelt::{
    SetChildAgeCommand, SetChildIncludedCommand, UpdateAgeGroupCommand, UpdateBudgetConfigCommand,
};
use crate::domain::models::child::Child;

/// The built-in age bands: six bands covering ages 0-21 with decreasing
/// per-child amounts.
pub fn default_age_groups() -> Vec<AgeGroup> {
    let bands: [(u32, u32, u32); 6] = [
        (18, 21, 40),
        (13, 17, 30),
        (10, 12, 20),
        (7, 9, 10),
        (3, 6, 5),
        (0, 2, 0),
    ];

    bands
        .iter()
        .enumerate()
        .map(|(i, &(min_age, max_age, amount))| AgeGroup {
            id: (i + 1).to_string(),
            name: format!("{}-{}", min_age, max_age),
            min_age,
            max_age,
            amount_per_child: amount,
            is_included: true,
        })
        .collect()
}

pub fn default_budget_config() -> BudgetConfig {
    BudgetConfig {
        participants: 10,
        allowed_overflow_percentage: 10,
    }
}

/// Snap an amount to the nearest multiple of 5 (edit-time policy for
/// `amount_per_child`; the calculation itself never rounds this field).
pub fn snap_to_five(amount: u32) -> u32 {
    ((amount + 2) / 5) * 5
}

/// Validation rejections for gelt mutations. These block the mutation and
/// leave prior state untouched; the REST layer maps them to 422.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeltValidationError {
    #[error("Minimum age ({min_age}) must be less than maximum age ({max_age})")]
    InvalidAgeBounds { min_age: u32, max_age: u32 },
    #[error("Age range {min_age}-{max_age} overlaps existing group {other_name}")]
    OverlappingAgeRange {
        min_age: u32,
        max_age: u32,
        other_name: String,
    },
    #[error("Age group not found: {0}")]
    GroupNotFound(String),
    #[error("Child not found: {0}")]
    ChildNotFound(String),
}

/// In-memory gelt session state plus its derived calculation.
#[derive(Debug, Clone)]
pub struct GeltService {
    children: Vec<Child>,
    age_groups: Vec<AgeGroup>,
    budget_config: BudgetConfig,
    custom_group_settings: Option<Vec<AgeGroup>>,
    included_children: HashSet<String>,
    calculation: BudgetCalculation,
}

impl GeltService {
    pub fn new() -> Self {
        let mut service = Self {
            children: Vec::new(),
            age_groups: default_age_groups(),
            budget_config: default_budget_config(),
            custom_group_settings: None,
            included_children: HashSet::new(),
            calculation: BudgetCalculation::default(),
        };
        service.recalculate();
        service
    }

    // Read accessors

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    pub fn age_groups(&self) -> &[AgeGroup] {
        &self.age_groups
    }

    pub fn budget_config(&self) -> &BudgetConfig {
        &self.budget_config
    }

    pub fn calculation(&self) -> &BudgetCalculation {
        &self.calculation
    }

    pub fn included_children(&self) -> &HashSet<String> {
        &self.included_children
    }

    pub fn has_custom_settings(&self) -> bool {
        self.custom_group_settings.is_some()
    }

    /// Replace the roster. Inclusion resets to "everyone counted".
    pub fn set_children(&mut self, children: Vec<Child>) {
        info!("Replacing gelt roster with {} children", children.len());
        self.included_children = children.iter().map(|c| c.id.clone()).collect();
        self.children = children;
        self.recalculate();
    }

    /// Edit an age group's band, amount and inclusion flag.
    ///
    /// Bounds and overlap are validated here, at edit time; on acceptance the
    /// group is renamed to "{min}-{max}" and the amount snaps to the nearest
    /// multiple of 5.
    pub fn update_age_group(
        &mut self,
        command: UpdateAgeGroupCommand,
    ) -> Result<AgeGroup, GeltValidationError> {
        if command.min_age >= command.max_age {
            warn!(
                "Rejected age group edit: min {} >= max {}",
                command.min_age, command.max_age
            );
            return Err(GeltValidationError::InvalidAgeBounds {
                min_age: command.min_age,
                max_age: command.max_age,
            });
        }

        let position = self
            .age_groups
            .iter()
            .position(|g| g.id == command.group_id)
            .ok_or_else(|| GeltValidationError::GroupNotFound(command.group_id.clone()))?;

        // Inclusive bands overlap when they share any integer age.
        if let Some(other) = self.age_groups.iter().find(|g| {
            g.id != command.group_id
                && command.min_age <= g.max_age
                && command.max_age >= g.min_age
        }) {
            warn!(
                "Rejected age group edit: {}-{} overlaps group {}",
                command.min_age, command.max_age, other.name
            );
            return Err(GeltValidationError::OverlappingAgeRange {
                min_age: command.min_age,
                max_age: command.max_age,
                other_name: other.name.clone(),
            });
        }

        let group = &mut self.age_groups[position];
        group.min_age = command.min_age;
        group.max_age = command.max_age;
        group.name = format!("{}-{}", command.min_age, command.max_age);
        group.amount_per_child = snap_to_five(command.amount_per_child);
        group.is_included = command.is_included;
        let updated = group.clone();

        info!("Updated age group {} ({})", updated.id, updated.name);
        self.recalculate();
        Ok(updated)
    }

    /// Merge a partial budget-config update.
    pub fn update_budget_config(&mut self, command: UpdateBudgetConfigCommand) {
        if let Some(participants) = command.participants {
            self.budget_config.participants = participants;
        }
        if let Some(overflow) = command.allowed_overflow_percentage {
            self.budget_config.allowed_overflow_percentage = overflow;
        }
        info!(
            "Updated budget config: participants={}, overflow={}%",
            self.budget_config.participants, self.budget_config.allowed_overflow_percentage
        );
        self.recalculate();
    }

    /// Override a child's age for the calculation.
    pub fn set_child_age(
        &mut self,
        command: SetChildAgeCommand,
    ) -> Result<(), GeltValidationError> {
        let child = self
            .children
            .iter_mut()
            .find(|c| c.id == command.child_id)
            .ok_or(GeltValidationError::ChildNotFound(command.child_id))?;
        child.set_age(command.age);
        self.recalculate();
        Ok(())
    }

    /// Undo a child's age override; no-op when never overridden.
    pub fn reset_child_age(&mut self, child_id: &str) -> Result<(), GeltValidationError> {
        let child = self
            .children
            .iter_mut()
            .find(|c| c.id == child_id)
            .ok_or_else(|| GeltValidationError::ChildNotFound(child_id.to_string()))?;
        child.reset_age();
        self.recalculate();
        Ok(())
    }

    /// Toggle whether a child is counted. Exclusion never removes the child
    /// from the roster.
    pub fn set_child_included(
        &mut self,
        command: SetChildIncludedCommand,
    ) -> Result<(), GeltValidationError> {
        if !self.children.iter().any(|c| c.id == command.child_id) {
            return Err(GeltValidationError::ChildNotFound(command.child_id));
        }
        if command.included {
            self.included_children.insert(command.child_id);
        } else {
            self.included_children.remove(&command.child_id);
        }
        self.recalculate();
        Ok(())
    }

    /// Snapshot the current age groups as the user's custom settings.
    pub fn save_custom_settings(&mut self) {
        info!("Saving custom age group settings");
        self.custom_group_settings = Some(self.age_groups.clone());
    }

    /// Discard the custom snapshot and restore the built-in age groups.
    pub fn clear_custom_settings(&mut self) {
        info!("Clearing custom age group settings");
        self.custom_group_settings = None;
        self.age_groups = default_age_groups();
        self.recalculate();
    }

    /// Full session reset: empty roster, default groups and config, no
    /// custom settings, empty inclusion set.
    pub fn reset_to_defaults(&mut self) {
        info!("Resetting gelt state to defaults");
        self.children.clear();
        self.age_groups = default_age_groups();
        self.budget_config = default_budget_config();
        self.custom_group_settings = None;
        self.included_children.clear();
        self.recalculate();
    }

    /// Recompute the derived calculation and replace it atomically.
    fn recalculate(&mut self) {
        self.calculation = calculate_budget(
            &self.children,
            &self.age_groups,
            &self.budget_config,
            &self.included_children,
        );
    }
}

impl Default for GeltService {
    fn default() -> Self {
        Self::new()
    }
}
