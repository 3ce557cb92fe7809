use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Override state of a child's age.
///
/// Kept as an explicit enum so that "no override" and "overridden back to the
/// same value" remain distinguishable states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgeOverride {
    /// Age is as imported
    Original,
    /// Age was edited by hand; the pre-override value is kept for reset
    Overridden { original_age: u32 },
}

/// Domain model for a child in the gelt distribution roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub age_override: AgeOverride,
}

impl Child {
    /// Create a new roster child with a fresh id and no override.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>, age: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            age,
            age_override: AgeOverride::Original,
        }
    }

    /// Override the age, capturing the pre-override value exactly once.
    ///
    /// Subsequent overrides keep the first captured `original_age` so a later
    /// reset always returns to the value the child was imported with.
    pub fn set_age(&mut self, new_age: u32) {
        if self.age_override == AgeOverride::Original {
            self.age_override = AgeOverride::Overridden {
                original_age: self.age,
            };
        }
        self.age = new_age;
    }

    /// Undo an age override. Returns false when the age was never overridden.
    pub fn reset_age(&mut self) -> bool {
        match self.age_override {
            AgeOverride::Overridden { original_age } => {
                self.age = original_age;
                self.age_override = AgeOverride::Original;
                true
            }
            AgeOverride::Original => false,
        }
    }

    pub fn is_age_modified(&self) -> bool {
        matches!(self.age_override, AgeOverride::Overridden { .. })
    }

    pub fn original_age(&self) -> Option<u32> {
        match self.age_override {
            AgeOverride::Overridden { original_age } => Some(original_age),
            AgeOverride::Original => None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_age_captures_original_once() {
        let mut child = Child::new("Dina", "Levi", 8);
        child.set_age(9);
        assert_eq!(child.age, 9);
        assert_eq!(child.original_age(), Some(8));

        // A second override must not clobber the captured value
        child.set_age(12);
        assert_eq!(child.age, 12);
        assert_eq!(child.original_age(), Some(8));
    }

    #[test]
    fn test_reset_age_restores_pre_override_value() {
        let mut child = Child::new("Dina", "Levi", 8);
        child.set_age(11);
        assert!(child.reset_age());
        assert_eq!(child.age, 8);
        assert!(!child.is_age_modified());
        assert_eq!(child.original_age(), None);
    }

    #[test]
    fn test_reset_age_is_noop_without_override() {
        let mut child = Child::new("Dina", "Levi", 8);
        assert!(!child.reset_age());
        assert_eq!(child.age, 8);
    }

    #[test]
    fn test_override_to_same_value_still_counts_as_modified() {
        let mut child = Child::new("Dina", "Levi", 8);
        child.set_age(8);
        assert!(child.is_age_modified());
        assert_eq!(child.original_age(), Some(8));
    }
}
