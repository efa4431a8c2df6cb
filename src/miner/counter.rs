use indexmap::IndexMap;
use rayon::prelude::*;

use crate::{
    miner::{
        itemset::{Item, Itemset, SupportTable},
        transaction::TransactionSet,
    },
    utils::bit_map::BitMap,
};

/// Support counting strategy
///
/// `prepare` runs once per mining run over the cleaned transactions, `count`
/// runs once per level. Implementations only differ in speed: a candidate is
/// counted in every transaction it is a subset of, and candidates that never
/// occur are left out of the returned table.
pub trait SupportCounter<I: Item>: Sized {
    fn prepare(transactions: &TransactionSet<I>) -> Self;

    /// support count of a single candidate
    fn count_one(&self, transactions: &TransactionSet<I>, candidate: &Itemset<I>) -> u64;

    /// Count all `candidates` (all of size `cardinality`)
    /// With `parallel` the candidates are split across the rayon pool.
    fn count(
        &self,
        transactions: &TransactionSet<I>,
        candidates: &[Itemset<I>],
        cardinality: usize,
        parallel: bool,
    ) -> SupportTable<I>
    where
        Self: Sync,
    {
        let counted: Vec<(Itemset<I>, u64)> = if parallel {
            candidates
                .par_iter()
                .filter_map(|candidate| {
                    let n = self.count_one(transactions, candidate);
                    (n > 0).then(|| (candidate.clone(), n))
                })
                .collect()
        } else {
            candidates
                .iter()
                .filter_map(|candidate| {
                    let n = self.count_one(transactions, candidate);
                    (n > 0).then(|| (candidate.clone(), n))
                })
                .collect()
        };
        SupportTable::from_counts(cardinality, counted.into_iter().collect::<IndexMap<_, _>>())
    }
}

/// Direct subset test against every transaction
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanCounter;

impl<I: Item> SupportCounter<I> for ScanCounter {
    fn prepare(_transactions: &TransactionSet<I>) -> Self {
        ScanCounter
    }

    fn count_one(&self, transactions: &TransactionSet<I>, candidate: &Itemset<I>) -> u64 {
        transactions
            .iter()
            .filter(|(_, items)| candidate.is_subset_of(items))
            .count() as u64
    }
}

/// Inverted index item -> transaction id bitmap
/// A candidate's count is the popcount of the AND of its items' bitmaps.
#[derive(Debug, Clone)]
pub struct BitmapCounter<I> {
    index: IndexMap<I, BitMap>,
}

impl<I: Item> BitmapCounter<I> {
    /// transactions containing `item`
    pub fn occurrences(&self, item: &I) -> Option<&BitMap> {
        self.index.get(item)
    }
}

impl<I: Item> SupportCounter<I> for BitmapCounter<I> {
    fn prepare(transactions: &TransactionSet<I>) -> Self {
        let size = transactions.len();
        let mut index: IndexMap<I, BitMap> = IndexMap::new();
        for (tid, items) in transactions.iter() {
            for item in items {
                index
                    .entry(item.clone())
                    .or_insert_with(|| BitMap::new(size))
                    .set(tid);
            }
        }
        Self { index }
    }

    fn count_one(&self, _transactions: &TransactionSet<I>, candidate: &Itemset<I>) -> u64 {
        let mut maps = Vec::with_capacity(candidate.len());
        for item in candidate {
            match self.index.get(item) {
                Some(map) => maps.push(map),
                // item never seen in any transaction
                None => return 0,
            }
        }
        match maps.as_slice() {
            [] => 0,
            [only] => only.count_ones(),
            [first, second] => first.and_count(second),
            [first, rest @ ..] => {
                let mut acc = (*first).clone();
                for map in rest {
                    acc.and_assign(map);
                }
                acc.count_ones()
            }
        }
    }
}
