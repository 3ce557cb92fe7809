//! Pure gelt budget calculation.
//!
//! Everything here is a total function over its inputs: any roster, any set
//! of age bands, any config produces a `BudgetCalculation` (an all-zero one
//! for empty inputs). Mutation and validation live in the gelt service; this
//! module only derives figures.

use std::collections::{BTreeMap, HashSet};

use shared::{AgeGroup, BudgetCalculation, BudgetConfig, GroupTotal};

use crate::domain::models::child::Child;

/// Derive the budget figures from the current session state.
///
/// Group totals carry an entry for every group with `is_included == true`,
/// including an explicit `{0, 0}` entry when no child falls in the band.
/// Excluded groups get no entry at all. Children outside the inclusion set
/// contribute to nothing; a child whose age matches two overlapping bands is
/// counted in both (band overlap is rejected at edit time, not here).
pub fn calculate_budget(
    children: &[Child],
    age_groups: &[AgeGroup],
    config: &BudgetConfig,
    included_children: &HashSet<String>,
) -> BudgetCalculation {
    let mut group_totals = BTreeMap::new();
    let mut total_required: u32 = 0;

    for group in age_groups.iter().filter(|g| g.is_included) {
        let children_count = children
            .iter()
            .filter(|child| {
                included_children.contains(&child.id)
                    && child.age >= group.min_age
                    && child.age <= group.max_age
            })
            .count() as u32;

        let total = children_count * group.amount_per_child;
        group_totals.insert(
            group.id.clone(),
            GroupTotal {
                children_count,
                total,
            },
        );
        total_required += total;
    }

    // Ceiling division: the pool must never be under-collected.
    let amount_per_participant = if config.participants > 0 {
        total_required.div_ceil(config.participants)
    } else {
        0
    };

    // Integer multiply before the division keeps the result exact for
    // whole-percent overflows.
    let max_allowed = (u64::from(total_required)
        * u64::from(100 + config.allowed_overflow_percentage)) as f64
        / 100.0;

    BudgetCalculation {
        total_required,
        amount_per_participant,
        max_allowed,
        group_totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gelt_service::default_age_groups;

    fn child(name: &str, age: u32) -> Child {
        Child::new(name, "Test", age)
    }

    fn all_ids(children: &[Child]) -> HashSet<String> {
        children.iter().map(|c| c.id.clone()).collect()
    }

    fn config(participants: u32, overflow: u32) -> BudgetConfig {
        BudgetConfig {
            participants,
            allowed_overflow_percentage: overflow,
        }
    }

    /// Ages 5, 5, 15 against the default bands.
    #[test]
    fn test_default_groups_scenario() {
        let children = vec![child("A", 5), child("B", 5), child("C", 15)];
        let included = all_ids(&children);
        let groups = default_age_groups();

        let calc = calculate_budget(&children, &groups, &config(2, 10), &included);

        assert_eq!(calc.total_required, 40);
        assert_eq!(calc.amount_per_participant, 20);
        assert_eq!(calc.max_allowed, 44.0);

        // 3-6 band (id "5" in the defaults) has the two five-year-olds
        assert_eq!(
            calc.group_totals.get("5"),
            Some(&GroupTotal {
                children_count: 2,
                total: 10
            })
        );
        // 13-17 band (id "2") has the fifteen-year-old
        assert_eq!(
            calc.group_totals.get("2"),
            Some(&GroupTotal {
                children_count: 1,
                total: 30
            })
        );
        // Every included group has an entry, even the empty ones
        assert_eq!(calc.group_totals.len(), groups.len());
        assert_eq!(
            calc.group_totals.get("3"),
            Some(&GroupTotal {
                children_count: 0,
                total: 0
            })
        );
    }

    /// Excluding a child zeroes its contribution but keeps the group entry.
    #[test]
    fn test_excluded_child_leaves_zero_entry() {
        let children = vec![child("A", 5), child("B", 5), child("C", 15)];
        let mut included = all_ids(&children);
        included.remove(&children[2].id);
        let groups = default_age_groups();

        let calc = calculate_budget(&children, &groups, &config(2, 10), &included);

        assert_eq!(calc.total_required, 10);
        assert_eq!(calc.amount_per_participant, 5);
        assert_eq!(calc.max_allowed, 11.0);
        // The 13-17 group stays included, so the entry must be {0, 0},
        // not absent
        assert_eq!(
            calc.group_totals.get("2"),
            Some(&GroupTotal {
                children_count: 0,
                total: 0
            })
        );
    }

    #[test]
    fn test_zero_participants_gives_zero_per_participant() {
        let children = vec![child("A", 5), child("B", 15)];
        let included = all_ids(&children);
        let calc = calculate_budget(&children, &default_age_groups(), &config(0, 10), &included);

        assert!(calc.total_required > 0);
        assert_eq!(calc.amount_per_participant, 0);
    }

    #[test]
    fn test_per_participant_rounds_up() {
        // 3 children aged 5 -> 15 shekels over 2 participants = 7.5, ceil 8
        let children = vec![child("A", 5), child("B", 5), child("C", 5)];
        let included = all_ids(&children);
        let calc = calculate_budget(&children, &default_age_groups(), &config(2, 0), &included);

        assert_eq!(calc.total_required, 15);
        assert_eq!(calc.amount_per_participant, 8);
        assert_eq!(calc.max_allowed, 15.0);
    }

    #[test]
    fn test_total_required_is_sum_of_group_totals() {
        let children: Vec<Child> = (0..30).map(|i| child("X", i % 25)).collect();
        let included = all_ids(&children);
        let calc = calculate_budget(&children, &default_age_groups(), &config(7, 15), &included);

        let sum: u32 = calc.group_totals.values().map(|g| g.total).sum();
        assert_eq!(calc.total_required, sum);
    }

    #[test]
    fn test_excluded_group_gets_no_entry() {
        let children = vec![child("A", 5)];
        let included = all_ids(&children);
        let mut groups = default_age_groups();
        let toggled_off = groups
            .iter_mut()
            .find(|g| g.min_age == 3 && g.max_age == 6)
            .unwrap();
        toggled_off.is_included = false;
        let toggled_id = toggled_off.id.clone();

        let calc = calculate_budget(&children, &groups, &config(2, 10), &included);

        assert!(!calc.group_totals.contains_key(&toggled_id));
        assert_eq!(calc.total_required, 0);
    }

    #[test]
    fn test_child_outside_every_band_is_invisible() {
        let children = vec![child("A", 99)];
        let included = all_ids(&children);
        let calc = calculate_budget(&children, &default_age_groups(), &config(2, 10), &included);

        assert_eq!(calc.total_required, 0);
        let count: u32 = calc.group_totals.values().map(|g| g.children_count).sum();
        assert_eq!(count, 0);
    }

    /// Overlapping bands double-count: the calculation does not re-validate
    /// the non-overlap invariant the edit path enforces.
    #[test]
    fn test_overlapping_bands_count_child_in_both() {
        let children = vec![child("A", 5)];
        let included = all_ids(&children);
        let groups = vec![
            AgeGroup {
                id: "g1".to_string(),
                name: "0-10".to_string(),
                min_age: 0,
                max_age: 10,
                amount_per_child: 10,
                is_included: true,
            },
            AgeGroup {
                id: "g2".to_string(),
                name: "5-8".to_string(),
                min_age: 5,
                max_age: 8,
                amount_per_child: 20,
                is_included: true,
            },
        ];

        let calc = calculate_budget(&children, &groups, &config(1, 0), &included);

        assert_eq!(calc.group_totals["g1"].children_count, 1);
        assert_eq!(calc.group_totals["g2"].children_count, 1);
        assert_eq!(calc.total_required, 30);
    }

    #[test]
    fn test_empty_inputs_give_all_zero_result() {
        let calc = calculate_budget(&[], &[], &config(10, 10), &HashSet::new());
        assert_eq!(calc, BudgetCalculation::default());
    }

    #[test]
    fn test_recalculation_is_idempotent() {
        let children = vec![child("A", 4), child("B", 12), child("C", 19)];
        let included = all_ids(&children);
        let groups = default_age_groups();
        let cfg = config(3, 25);

        let first = calculate_budget(&children, &groups, &cfg, &included);
        let second = calculate_budget(&children, &groups, &cfg, &included);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fractional_max_allowed_is_exact() {
        // 5 shekels with 10% overflow -> 5.5 exactly
        let children = vec![child("A", 5)];
        let included = all_ids(&children);
        let calc = calculate_budget(&children, &default_age_groups(), &config(1, 10), &included);

        assert_eq!(calc.total_required, 5);
        assert_eq!(calc.max_allowed, 5.5);
    }
}
