//! Ordered, validated collection of migration records.

use super::types::{MigrationDirection, MigrationError, MigrationPlan, MigrationRecord, MigrationSource};
use super::validation::{check_sequence, ValidationReport};
use async_trait::async_trait;

/// Dense sequence of records where index `i` holds order number `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSet {
    records: Vec<MigrationRecord>,
}

impl MigrationSet {
    /// Build a set from records in any order.
    ///
    /// Records are sorted by order number; duplicates or gaps are rejected.
    pub fn from_records(mut records: Vec<MigrationRecord>) -> Result<Self, MigrationError> {
        records.sort_by_key(|r| r.order_number);

        let issues = check_sequence(records.iter().map(|r| (r.order_number, r.name.as_str())));
        ValidationReport::new(issues).into_result()?;

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest reachable schema version, i.e. the number of records.
    pub fn last_version(&self) -> u32 {
        self.records.len() as u32
    }

    pub fn records(&self) -> &[MigrationRecord] {
        &self.records
    }

    /// Look up a record by its order number.
    pub fn get(&self, order_number: u32) -> Option<&MigrationRecord> {
        let index = order_number.checked_sub(1)? as usize;
        self.records.get(index)
    }

    /// Get the steps needed to go from one schema version to another.
    ///
    /// Forward plans hold the next `target - current` records in ascending
    /// order. Backward plans hold the last `current - target` applied records,
    /// most recent first. Equal versions give an empty plan.
    pub fn resolve(&self, current: u32, target: u32) -> Result<MigrationPlan, MigrationError> {
        let last = self.last_version();
        for version in [current, target] {
            if version > last {
                return Err(MigrationError::VersionOutOfRange { version, last });
            }
        }

        let direction = MigrationDirection::between(current, target);
        let steps = match direction {
            MigrationDirection::Up => self.records[current as usize..target as usize].to_vec(),
            MigrationDirection::Down => self.records[target as usize..current as usize]
                .iter()
                .rev()
                .cloned()
                .collect(),
        };

        Ok(MigrationPlan { direction, steps })
    }
}

#[async_trait]
impl MigrationSource for MigrationSet {
    async fn load(&self) -> Result<MigrationSet, MigrationError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(order: u32) -> MigrationRecord {
        MigrationRecord::new(
            order,
            format!("{order}-a.sql"),
            format!("up {order}"),
            format!("down {order}"),
        )
    }

    fn set_of(n: u32) -> MigrationSet {
        MigrationSet::from_records((1..=n).map(record).collect()).unwrap()
    }

    #[test]
    fn test_empty_set() {
        let set = MigrationSet::default();
        assert_eq!(set.last_version(), 0);
        let plan = set.resolve(0, 0).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_from_records_sorts() {
        let set = MigrationSet::from_records(vec![record(3), record(1), record(2)]).unwrap();
        let orders: Vec<u32> = set.records().iter().map(|r| r.order_number).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(set.get(2).unwrap().name, "2-a.sql");
        assert!(set.get(0).is_none());
        assert!(set.get(4).is_none());
    }

    #[test]
    fn test_from_records_rejects_gaps() {
        let result = MigrationSet::from_records(vec![record(1), record(3)]);
        assert!(matches!(result, Err(MigrationError::Validation(_))));
    }

    #[test]
    fn test_from_records_rejects_duplicates() {
        let result = MigrationSet::from_records(vec![record(1), record(1)]);
        assert!(matches!(result, Err(MigrationError::Validation(_))));
    }

    #[test]
    fn test_scenario_forward_and_backward_order() {
        let set = set_of(4);
        assert_eq!(set.resolve(0, 4).unwrap().order_numbers(), vec![1, 2, 3, 4]);
        assert_eq!(set.resolve(4, 0).unwrap().order_numbers(), vec![4, 3, 2, 1]);
        assert_eq!(set.resolve(1, 3).unwrap().order_numbers(), vec![2, 3]);
        assert_eq!(set.resolve(3, 1).unwrap().order_numbers(), vec![3, 2]);
        assert_eq!(set.resolve(1, 0).unwrap().order_numbers(), vec![1]);
        assert_eq!(set.resolve(3, 4).unwrap().order_numbers(), vec![4]);
    }

    #[test]
    fn test_directions() {
        let set = set_of(4);
        assert_eq!(set.resolve(0, 2).unwrap().direction, MigrationDirection::Up);
        assert_eq!(set.resolve(2, 0).unwrap().direction, MigrationDirection::Down);
    }

    #[test]
    fn test_step_count_for_every_pair() {
        let set = set_of(5);
        for a in 0..=5u32 {
            for b in 0..=5u32 {
                let plan = set.resolve(a, b).unwrap();
                assert_eq!(plan.len() as u32, a.abs_diff(b), "resolve({a}, {b})");
            }
        }
    }

    #[test]
    fn test_plans_are_strictly_monotonic() {
        let set = set_of(6);
        for a in 0..=6u32 {
            for b in 0..=6u32 {
                let orders = set.resolve(a, b).unwrap().order_numbers();
                let ordered = if b > a {
                    orders.windows(2).all(|w| w[0] < w[1])
                } else {
                    orders.windows(2).all(|w| w[0] > w[1])
                };
                assert!(ordered, "resolve({a}, {b}) gave {orders:?}");
            }
        }
    }

    #[test]
    fn test_backward_plan_reverses_forward_plan() {
        let set = set_of(5);
        let forward = set.resolve(1, 4).unwrap();
        let backward = set.resolve(4, 1).unwrap();

        let mut reversed = forward.steps.clone();
        reversed.reverse();
        assert_eq!(reversed, backward.steps);

        let undo: Vec<&str> = backward
            .steps
            .iter()
            .map(|s| s.script(backward.direction))
            .collect();
        assert_eq!(undo, vec!["down 4", "down 3", "down 2"]);
    }

    #[test]
    fn test_out_of_range_versions() {
        let set = set_of(3);
        assert!(matches!(
            set.resolve(0, 4),
            Err(MigrationError::VersionOutOfRange { version: 4, last: 3 })
        ));
        assert!(matches!(
            set.resolve(5, 1),
            Err(MigrationError::VersionOutOfRange { version: 5, last: 3 })
        ));
    }

    #[tokio::test]
    async fn test_set_as_migration_source() {
        let set = set_of(3);
        let source: &dyn MigrationSource = &set;
        assert_eq!(source.last_version().await.unwrap(), 3);
        assert_eq!(source.resolve(3, 1).await.unwrap().order_numbers(), vec![3, 2]);
    }
}
