use std::collections::BTreeSet;

use crate::roster::Roster;
use crate::stats::Aggregate;

/// Member ids that took part but are missing from the roster.
pub fn unregistered_ids(roster: &Roster, aggregate: &Aggregate) -> BTreeSet<i64> {
    aggregate.ids().filter(|&id| !roster.contains(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_ids() {
        let roster: Roster = [(1, "A"), (2, "B")].into_iter().collect();
        let aggregate: Aggregate = [(1, 2), (3, 1), (8, 4)].into_iter().collect();

        let missing = unregistered_ids(&roster, &aggregate);
        assert_eq!(missing.into_iter().collect::<Vec<_>>(), vec![3, 8]);
    }

    #[test]
    fn test_everyone_registered() {
        let roster: Roster = [(1, "A")].into_iter().collect();
        let aggregate: Aggregate = [(1, 5)].into_iter().collect();
        assert!(unregistered_ids(&roster, &aggregate).is_empty());
    }
}
