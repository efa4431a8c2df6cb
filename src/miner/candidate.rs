use itertools::Itertools;

use crate::miner::itemset::{Item, Itemset, SupportTable};

/// Every k-subset of the items seen in `previous`
///
/// No pruning happens here: the result has C(|universe|, k) entries, in
/// lexicographic order of the sorted universe. An empty universe, `k == 0`
/// or `k` larger than the universe gives an empty list.
pub fn generate_candidates<I: Item>(previous: &SupportTable<I>, k: usize) -> Vec<Itemset<I>> {
    let universe = previous.universe();
    if k == 0 || k > universe.len() {
        return Vec::new();
    }
    universe
        .into_iter()
        .combinations(k)
        .map(Itemset::from_sorted_unchecked)
        .collect()
}
