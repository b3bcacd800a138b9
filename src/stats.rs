use serde::Serialize;
use std::collections::BTreeMap;

/// Per-member participation counts accumulated over a run.
///
/// Keys stay ordered by member id so everything derived from the aggregate is
/// deterministic regardless of the order files were read in.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    counts: BTreeMap<i64, u32>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one participation for `member_id`.
    pub fn record(&mut self, member_id: i64) {
        *self.counts.entry(member_id).or_insert(0) += 1;
    }

    /// Adds every count from `other` into `self`.
    pub fn merge(&mut self, other: &Aggregate) {
        for (&id, &count) in &other.counts {
            *self.counts.entry(id).or_insert(0) += count;
        }
    }

    pub fn get(&self, member_id: i64) -> u32 {
        self.counts.get(&member_id).copied().unwrap_or(0)
    }

    /// Number of distinct participating members.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all participation counts.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    /// Iterates `(member_id, count)` in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, u32)> + '_ {
        self.counts.iter().map(|(&id, &count)| (id, count))
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.counts.keys().copied()
    }
}

impl FromIterator<(i64, u32)> for Aggregate {
    fn from_iter<T: IntoIterator<Item = (i64, u32)>>(iter: T) -> Self {
        let mut aggregate = Aggregate::new();
        for (id, count) in iter {
            *aggregate.counts.entry(id).or_insert(0) += count;
        }
        aggregate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_increments_only_that_member() {
        let mut agg = Aggregate::new();
        agg.record(1);
        agg.record(1);
        agg.record(3);

        assert_eq!(agg.get(1), 2);
        assert_eq!(agg.get(3), 1);
        assert_eq!(agg.get(2), 0);
        assert_eq!(agg.len(), 2);
        assert_eq!(agg.total(), 3);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let a: Aggregate = [(1, 2), (2, 1)].into_iter().collect();
        let b: Aggregate = [(1, 1), (3, 4)].into_iter().collect();

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);

        assert_eq!(ab, ba);
        assert_eq!(ab.get(1), 3);
        assert_eq!(ab.total(), 8);
    }

    #[test]
    fn test_iter_is_sorted_by_id() {
        let agg: Aggregate = [(9, 1), (2, 5), (4, 1)].into_iter().collect();
        let ids: Vec<_> = agg.ids().collect();
        assert_eq!(ids, vec![2, 4, 9]);
    }

    #[test]
    fn test_empty_aggregate() {
        let agg = Aggregate::default();
        assert!(agg.is_empty());
        assert_eq!(agg.total(), 0);
    }
}
