use std::collections::BTreeMap;

use crate::model::Transaction;

/// Transactions of one side bucketed by integer-cent amount. Values are
/// positions into the side's input slice, in input order.
#[derive(Debug)]
pub struct AmountIndex {
    buckets: BTreeMap<i64, Vec<usize>>,
}

impl AmountIndex {
    pub fn build(side: &[Transaction]) -> Self {
        let mut buckets: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (i, txn) in side.iter().enumerate() {
            buckets.entry(txn.amount_cents).or_default().push(i);
        }
        Self { buckets }
    }

    /// Positions with amount within `tolerance_cents` of `target_cents`,
    /// in ascending amount order, input order within a bucket.
    pub fn near(&self, target_cents: i64, tolerance_cents: i64) -> impl Iterator<Item = usize> + '_ {
        self.buckets
            .range(target_cents - tolerance_cents..=target_cents + tolerance_cents)
            .flat_map(|(_, positions)| positions.iter().copied())
    }

    /// Positions with amount at most `limit_cents`, same ordering contract
    /// as `near`. Feeds the subset-sum candidate pool.
    pub fn at_most(&self, limit_cents: i64) -> impl Iterator<Item = usize> + '_ {
        self.buckets
            .range(..=limit_cents)
            .flat_map(|(_, positions)| positions.iter().copied())
    }
}
